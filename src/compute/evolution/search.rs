//! Generational genetic algorithm driving the rule search.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use rand::prelude::*;
use rand::seq::index::sample;
use rayon::prelude::*;

use crate::schema::{
    CandidateSnapshot, EvolutionConfig, EvolutionConfigError, EvolutionHistory, EvolutionProgress,
    EvolutionResult, EvolutionStats, SelectionMethod, StopReason,
};

use super::genome::{Genotype, Problem};

/// An individual in the population.
#[derive(Debug, Clone)]
pub struct Candidate<G> {
    /// Unique identifier.
    pub id: u64,
    /// The genome.
    pub genome: G,
    /// Fitness, filled in once when the candidate is first scored.
    pub fitness: Option<f64>,
    /// Generation created.
    pub generation: usize,
    /// Parent IDs.
    pub parents: Vec<u64>,
}

impl<G: Clone> Candidate<G> {
    /// Fitness for ranking; unscored candidates rank last.
    #[inline]
    pub fn score(&self) -> f64 {
        self.fitness.unwrap_or(f64::NEG_INFINITY)
    }

    /// Convert to snapshot for serialization.
    pub fn to_snapshot(&self) -> CandidateSnapshot<G> {
        CandidateSnapshot {
            id: self.id,
            fitness: self.score(),
            genome: self.genome.clone(),
            generation: self.generation,
            parents: self.parents.clone(),
        }
    }
}

/// Errors that abort a run.
#[derive(Debug, thiserror::Error)]
pub enum EvolutionError {
    #[error("Invalid evolution config: {0}")]
    Config(#[from] EvolutionConfigError),
    #[error("Evaluating candidate {candidate} failed: {source}")]
    Evaluation {
        candidate: u64,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Population is empty")]
    EmptyPopulation,
}

/// Evolution engine that runs the search over a shared, read-only problem.
pub struct EvolutionEngine<'a, P: Problem> {
    problem: &'a P,
    config: EvolutionConfig,
    rng: StdRng,
    population: Vec<Candidate<P::Genome>>,
    best: Option<Candidate<P::Genome>>,
    history: EvolutionHistory,
    generation: usize,
    best_fitness: f64,
    stagnation_count: usize,
    evaluations: u64,
    next_id: u64,
    started: Option<Instant>,
    cancelled: Arc<AtomicBool>,
}

impl<'a, P: Problem> EvolutionEngine<'a, P> {
    /// Create a new evolution engine.
    pub fn new(problem: &'a P, config: EvolutionConfig) -> Result<Self, EvolutionError> {
        config.validate()?;
        let rng = match config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            problem,
            config,
            rng,
            population: Vec::new(),
            best: None,
            history: EvolutionHistory::default(),
            generation: 0,
            best_fitness: f64::NEG_INFINITY,
            stagnation_count: 0,
            evaluations: 0,
            next_id: 0,
            started: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Get cancellation handle. Cancellation is honoured between generations.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    /// Current population.
    pub fn population(&self) -> &[Candidate<P::Genome>] {
        &self.population
    }

    /// Best candidate seen so far.
    pub fn best(&self) -> Option<&Candidate<P::Genome>> {
        self.best.as_ref()
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Fill the population with random genomes.
    pub fn initialize(&mut self) {
        self.population.clear();
        self.best = None;
        self.history = EvolutionHistory::default();
        self.generation = 0;
        self.best_fitness = f64::NEG_INFINITY;
        self.stagnation_count = 0;
        self.evaluations = 0;

        for _ in 0..self.config.population.size {
            let genome = self.problem.random_genome(&mut self.rng);
            let id = self.next_id();
            self.population.push(Candidate {
                id,
                genome,
                fitness: None,
                generation: 0,
                parents: Vec::new(),
            });
        }
    }

    /// Score every candidate that has not been scored yet.
    fn evaluate_population(&mut self) -> Result<(), EvolutionError> {
        let problem = self.problem;
        let pending = self
            .population
            .iter()
            .filter(|c| c.fitness.is_none())
            .count() as u64;

        let score = |candidate: &mut Candidate<P::Genome>| -> Result<(), EvolutionError> {
            let fitness =
                problem
                    .fitness(&candidate.genome)
                    .map_err(|e| EvolutionError::Evaluation {
                        candidate: candidate.id,
                        source: Box::new(e),
                    })?;
            candidate.fitness = Some(fitness);
            Ok(())
        };

        if self.config.parallel {
            self.population
                .par_iter_mut()
                .filter(|c| c.fitness.is_none())
                .try_for_each(score)?;
        } else {
            self.population
                .iter_mut()
                .filter(|c| c.fitness.is_none())
                .try_for_each(score)?;
        }

        self.evaluations += pending;
        Ok(())
    }

    /// Update best-so-far tracking and history after a scored generation.
    fn record_generation(&mut self) -> Result<(), EvolutionError> {
        let mut gen_best: Option<&Candidate<P::Genome>> = None;
        for candidate in &self.population {
            if gen_best.is_none_or(|b| candidate.score() > b.score()) {
                gen_best = Some(candidate);
            }
        }
        let gen_best = gen_best.ok_or(EvolutionError::EmptyPopulation)?;
        let gen_best_fitness = gen_best.score();

        if gen_best_fitness > self.best_fitness {
            if self.best.is_some() {
                info!(
                    "Generation {}: new best fitness {:.3} (candidate {})",
                    self.generation, gen_best_fitness, gen_best.id
                );
            }
            self.best_fitness = gen_best_fitness;
            self.best = Some(gen_best.clone());
            self.stagnation_count = 0;
        } else {
            self.stagnation_count += 1;
        }

        let n = self.population.len() as f64;
        let avg_fitness = self.population.iter().map(|c| c.score()).sum::<f64>() / n;
        let variance = self
            .population
            .iter()
            .map(|c| (c.score() - avg_fitness).powi(2))
            .sum::<f64>()
            / n;

        self.history.best_fitness.push(gen_best_fitness);
        self.history.avg_fitness.push(avg_fitness);
        self.history.fitness_std.push(variance.sqrt());

        debug!(
            "Generation {}: best {:.3}, avg {:.3}, std {:.3}, stagnation {}",
            self.generation,
            gen_best_fitness,
            avg_fitness,
            variance.sqrt(),
            self.stagnation_count
        );
        Ok(())
    }

    /// Breed the next generation from the current (scored) population.
    fn step_generation(&mut self) {
        // Stable sort: equal scores keep their population order.
        self.population.sort_by(|a, b| b.score().total_cmp(&a.score()));

        let size = self.config.population.size;
        let ga = self.config.genetic.clone();
        let mut next_gen = Vec::with_capacity(size);

        // Elitism: keep best individuals with their memoized fitness
        let elites = self.config.elite_count().min(self.population.len());
        next_gen.extend(self.population[..elites].iter().cloned());

        while next_gen.len() < size {
            let idx1 = self.select_index(&ga.selection);
            let idx2 = self.select_index(&ga.selection);
            let parent1 = &self.population[idx1];
            let parent2 = &self.population[idx2];
            let parents = vec![parent1.id, parent2.id];

            let (genome1, genome2, crossed) = if self.rng.gen_bool(ga.crossover_rate) {
                let swap_rate = ga.crossover_swap_rate;
                let (c1, c2) = parent1
                    .genome
                    .crossover(&parent2.genome, swap_rate, &mut self.rng);
                (c1, c2, true)
            } else {
                (parent1.genome.clone(), parent2.genome.clone(), false)
            };
            let inherited = [parent1.fitness, parent2.fitness];

            for (genome, inherited_fitness) in [genome1, genome2].into_iter().zip(inherited) {
                if next_gen.len() >= size {
                    break;
                }
                let (genome, fitness) = if self.rng.gen_bool(ga.mutation_rate) {
                    (self.problem.mutate(&genome, &mut self.rng), None)
                } else if crossed {
                    (genome, None)
                } else {
                    // Untouched copy of a parent: reuse its score.
                    (genome, inherited_fitness)
                };

                let id = self.next_id();
                next_gen.push(Candidate {
                    id,
                    genome,
                    fitness,
                    generation: self.generation + 1,
                    parents: parents.clone(),
                });
            }
        }

        self.population = next_gen;
        self.generation += 1;
    }

    /// Select a parent index using the specified method.
    fn select_index(&mut self, method: &SelectionMethod) -> usize {
        match method {
            SelectionMethod::Tournament { size } => {
                let arity = (*size).min(self.population.len());
                let drawn = sample(&mut self.rng, self.population.len(), arity);
                let mut best: Option<usize> = None;
                for idx in drawn.iter() {
                    let fitness = self.population[idx].score();
                    if best.is_none_or(|b| fitness > self.population[b].score()) {
                        best = Some(idx);
                    }
                }
                best.unwrap_or(0)
            }
        }
    }

    fn avg_fitness(&self) -> f64 {
        if self.population.is_empty() {
            0.0
        } else {
            self.population.iter().map(|c| c.score()).sum::<f64>() / self.population.len() as f64
        }
    }

    fn elapsed(&self) -> Duration {
        self.started.map(|s| s.elapsed()).unwrap_or_default()
    }

    /// Get current progress.
    pub fn progress(&self) -> EvolutionProgress {
        EvolutionProgress {
            generation: self.generation,
            max_generations: self.config.population.max_generations,
            elapsed_seconds: self.elapsed().as_secs_f64(),
            best_fitness: self.best_fitness,
            generation_best: self
                .history
                .best_fitness
                .last()
                .copied()
                .unwrap_or(f64::NEG_INFINITY),
            avg_fitness: self.avg_fitness(),
            stagnation_count: self.stagnation_count,
            evaluations: self.evaluations,
        }
    }

    /// Check if evolution should stop.
    fn should_stop(&self) -> Option<StopReason> {
        if self.cancelled.load(Ordering::Relaxed) {
            return Some(StopReason::Cancelled);
        }

        if let Some(max) = self.config.population.max_generations
            && self.generation >= max
        {
            return Some(StopReason::MaxGenerations);
        }

        if let Some(budget) = self.config.population.time_budget_secs
            && self.elapsed().as_secs_f64() >= budget
        {
            return Some(StopReason::TimeBudget);
        }

        if let Some(target) = self.config.population.target_fitness
            && self.best_fitness >= target
        {
            return Some(StopReason::TargetReached);
        }

        if let Some(limit) = self.config.population.stagnation_limit
            && self.stagnation_count >= limit
        {
            return Some(StopReason::Stagnation);
        }

        None
    }

    /// Run evolution with progress callback.
    pub fn run_with_callback<F>(
        &mut self,
        mut callback: F,
    ) -> Result<EvolutionResult<P::Genome>, EvolutionError>
    where
        F: FnMut(&EvolutionProgress),
    {
        self.started = Some(Instant::now());

        // Initialize
        self.initialize();
        info!(
            "Starting evolution: population {}, {} genes per genome",
            self.population.len(),
            self.population.first().map_or(0, |c| c.genome.gene_count())
        );

        // Evaluate initial population
        self.evaluate_population()?;
        self.record_generation()?;
        callback(&self.progress());

        // Evolution loop
        let stop_reason = loop {
            if let Some(reason) = self.should_stop() {
                break reason;
            }

            self.step_generation();
            self.evaluate_population()?;
            self.record_generation()?;
            callback(&self.progress());
        };

        if stop_reason == StopReason::Stagnation {
            warn!(
                "Stopping after {} generations without improvement",
                self.stagnation_count
            );
        }

        let elapsed = self.elapsed().as_secs_f64();
        let best = self
            .best
            .as_ref()
            .map(Candidate::to_snapshot)
            .ok_or(EvolutionError::EmptyPopulation)?;

        info!(
            "Evolution finished after {} generations ({:?}): best fitness {:.3}",
            self.generation, stop_reason, best.fitness
        );

        Ok(EvolutionResult {
            best,
            stats: EvolutionStats {
                generations: self.generation,
                total_evaluations: self.evaluations,
                best_fitness: self.best_fitness,
                final_avg_fitness: self.avg_fitness(),
                elapsed_seconds: elapsed,
                evaluations_per_second: if elapsed > 0.0 {
                    self.evaluations as f64 / elapsed
                } else {
                    0.0
                },
                stop_reason,
            },
            history: self.history.clone(),
        })
    }

    /// Run evolution (blocking).
    pub fn run(&mut self) -> Result<EvolutionResult<P::Genome>, EvolutionError> {
        self.run_with_callback(|_| {})
    }
}
