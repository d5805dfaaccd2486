//! Evolution configuration types for substitution rule search.
//!
//! This module provides the search parameters handed to the evolution engine
//! and the progress/result types it reports back.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Top-level configuration for an evolutionary search run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Population and termination settings.
    #[serde(default)]
    pub population: PopulationConfig,
    /// Genetic operator settings.
    #[serde(default)]
    pub genetic: GeneticAlgorithmConfig,
    /// Random seed for reproducibility. `None` seeds from entropy.
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Score each generation on the rayon thread pool.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population: PopulationConfig::default(),
            genetic: GeneticAlgorithmConfig::default(),
            random_seed: None,
            parallel: default_parallel(),
        }
    }
}

fn default_parallel() -> bool {
    true
}

/// Genetic algorithm operator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneticAlgorithmConfig {
    /// Selection method.
    #[serde(default)]
    pub selection: SelectionMethod,
    /// Probability that a selected pair is recombined (0.0-1.0).
    #[serde(default = "default_crossover_rate")]
    pub crossover_rate: f64,
    /// Per-gene swap probability inside uniform crossover (0.0-1.0).
    #[serde(default = "default_crossover_swap_rate")]
    pub crossover_swap_rate: f64,
    /// Probability that an offspring receives a single-gene mutation (0.0-1.0).
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
    /// Fraction of the population copied unchanged into the next generation.
    #[serde(default = "default_elitism_rate")]
    pub elitism_rate: f64,
}

impl Default for GeneticAlgorithmConfig {
    fn default() -> Self {
        Self {
            selection: SelectionMethod::default(),
            crossover_rate: default_crossover_rate(),
            crossover_swap_rate: default_crossover_swap_rate(),
            mutation_rate: default_mutation_rate(),
            elitism_rate: default_elitism_rate(),
        }
    }
}

fn default_crossover_rate() -> f64 {
    0.9
}
fn default_crossover_swap_rate() -> f64 {
    0.5
}
fn default_mutation_rate() -> f64 {
    0.03
}
fn default_elitism_rate() -> f64 {
    0.1
}

/// Parent selection method.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "method")]
pub enum SelectionMethod {
    /// Best of `size` individuals drawn without replacement.
    Tournament {
        #[serde(default = "default_tournament_size")]
        size: usize,
    },
}

impl Default for SelectionMethod {
    fn default() -> Self {
        Self::Tournament {
            size: default_tournament_size(),
        }
    }
}

fn default_tournament_size() -> usize {
    2
}

/// Population and termination settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of individuals in population.
    #[serde(default = "default_population_size")]
    pub size: usize,
    /// Stop after this many generations.
    #[serde(default)]
    pub max_generations: Option<usize>,
    /// Stop once this much wall-clock time has elapsed (checked between generations).
    #[serde(default = "default_time_budget")]
    pub time_budget_secs: Option<f64>,
    /// Target fitness to stop early.
    #[serde(default)]
    pub target_fitness: Option<f64>,
    /// Stagnation limit: stop if no improvement for N generations.
    #[serde(default)]
    pub stagnation_limit: Option<usize>,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: default_population_size(),
            max_generations: None,
            time_budget_secs: default_time_budget(),
            target_fitness: None,
            stagnation_limit: None,
        }
    }
}

fn default_population_size() -> usize {
    37
}
fn default_time_budget() -> Option<f64> {
    Some(60.0)
}

// ============================================================================
// Progress and Result Types
// ============================================================================

/// Progress update emitted after every scored generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionProgress {
    /// Current generation number (0 = initial population).
    pub generation: usize,
    /// Generation budget, if any.
    pub max_generations: Option<usize>,
    /// Wall-clock time since the run started.
    pub elapsed_seconds: f64,
    /// Best fitness seen so far.
    pub best_fitness: f64,
    /// Best fitness in the current generation.
    pub generation_best: f64,
    /// Average fitness of current population.
    pub avg_fitness: f64,
    /// Generations since last improvement.
    pub stagnation_count: usize,
    /// Fitness evaluations performed so far.
    pub evaluations: u64,
}

/// Snapshot of a scored individual.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateSnapshot<G> {
    /// Unique identifier.
    pub id: u64,
    /// Fitness score (larger is better).
    pub fitness: f64,
    /// The genome.
    pub genome: G,
    /// Generation this candidate was created.
    pub generation: usize,
    /// Parent IDs (for genealogy).
    pub parents: Vec<u64>,
}

/// Evolution history for plotting.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EvolutionHistory {
    /// Best fitness per generation.
    pub best_fitness: Vec<f64>,
    /// Average fitness per generation.
    pub avg_fitness: Vec<f64>,
    /// Standard deviation per generation.
    pub fitness_std: Vec<f64>,
}

/// Final result of an evolution run.
#[derive(Debug, Clone, Serialize)]
pub struct EvolutionResult<G> {
    /// Best candidate seen during the whole run.
    pub best: CandidateSnapshot<G>,
    /// Statistics from the run.
    pub stats: EvolutionStats,
    /// Full history for analysis.
    pub history: EvolutionHistory,
}

/// Statistics from evolution run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionStats {
    /// Generations bred after the initial population.
    pub generations: usize,
    /// Total fitness evaluations performed.
    pub total_evaluations: u64,
    /// Best fitness achieved.
    pub best_fitness: f64,
    /// Average fitness of final population.
    pub final_avg_fitness: f64,
    /// Time taken (in seconds).
    pub elapsed_seconds: f64,
    /// Evaluations per second.
    pub evaluations_per_second: f64,
    /// Reason for stopping.
    pub stop_reason: StopReason,
}

/// Reason evolution stopped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// Reached maximum generations.
    MaxGenerations,
    /// Wall-clock budget exhausted.
    TimeBudget,
    /// Reached target fitness.
    TargetReached,
    /// Stagnation limit hit.
    Stagnation,
    /// Cancelled through the engine's cancel handle.
    Cancelled,
}

// ============================================================================
// Validation
// ============================================================================

/// Evolution configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum EvolutionConfigError {
    #[error("Population size must be at least 2")]
    PopulationTooSmall,
    #[error("Invalid rate: {name} = {value} (expected 0.0-1.0)")]
    InvalidRate { name: &'static str, value: f64 },
    #[error("Tournament size {size} must be between 1 and the population size {population}")]
    InvalidTournamentSize { size: usize, population: usize },
    #[error("No termination budget: set max_generations or time_budget_secs")]
    Unbounded,
    #[error("Time budget must be positive and finite, got {0}")]
    InvalidTimeBudget(f64),
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl EvolutionConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, EvolutionConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, EvolutionConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Number of individuals carried over unchanged each generation.
    pub fn elite_count(&self) -> usize {
        let count = (self.genetic.elitism_rate * self.population.size as f64).floor() as usize;
        count.min(self.population.size)
    }

    /// Validate evolution configuration.
    pub fn validate(&self) -> Result<(), EvolutionConfigError> {
        if self.population.size < 2 {
            return Err(EvolutionConfigError::PopulationTooSmall);
        }

        let check_rate = |value: f64, name: &'static str| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(EvolutionConfigError::InvalidRate { name, value })
            }
        };

        check_rate(self.genetic.crossover_rate, "crossover_rate")?;
        check_rate(self.genetic.crossover_swap_rate, "crossover_swap_rate")?;
        check_rate(self.genetic.mutation_rate, "mutation_rate")?;
        check_rate(self.genetic.elitism_rate, "elitism_rate")?;

        match self.genetic.selection {
            SelectionMethod::Tournament { size } => {
                if size == 0 || size > self.population.size {
                    return Err(EvolutionConfigError::InvalidTournamentSize {
                        size,
                        population: self.population.size,
                    });
                }
            }
        }

        if self.population.max_generations.is_none() && self.population.time_budget_secs.is_none()
        {
            return Err(EvolutionConfigError::Unbounded);
        }

        if let Some(budget) = self.population.time_budget_secs
            && !(budget.is_finite() && budget > 0.0)
        {
            return Err(EvolutionConfigError::InvalidTimeBudget(budget));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_valid() {
        let config = EvolutionConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_serialization() {
        let config = EvolutionConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: EvolutionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.population.size, config.population.size);
        assert_eq!(parsed.genetic.selection, config.genetic.selection);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EvolutionConfig::from_json_str(
            r#"{ "population": { "size": 10, "max_generations": 5, "time_budget_secs": null } }"#,
        )
        .unwrap();
        assert_eq!(config.population.size, 10);
        assert_eq!(config.population.max_generations, Some(5));
        assert_eq!(config.population.time_budget_secs, None);
        assert_eq!(config.genetic.crossover_swap_rate, 0.5);
        assert_eq!(
            config.genetic.selection,
            SelectionMethod::Tournament { size: 2 }
        );
    }

    #[test]
    fn test_unbounded_rejected() {
        let mut config = EvolutionConfig::default();
        config.population.time_budget_secs = None;
        config.population.max_generations = None;
        assert!(matches!(
            config.validate(),
            Err(EvolutionConfigError::Unbounded)
        ));
    }

    #[test]
    fn test_invalid_rates_rejected() {
        let mut config = EvolutionConfig::default();
        config.genetic.mutation_rate = 1.5;
        assert!(matches!(
            config.validate(),
            Err(EvolutionConfigError::InvalidRate {
                name: "mutation_rate",
                ..
            })
        ));

        let mut config = EvolutionConfig::default();
        config.genetic.elitism_rate = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tournament_size_bounds() {
        let mut config = EvolutionConfig::default();
        config.genetic.selection = SelectionMethod::Tournament { size: 0 };
        assert!(config.validate().is_err());

        config.genetic.selection = SelectionMethod::Tournament {
            size: config.population.size + 1,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_time_budget_must_be_positive() {
        let mut config = EvolutionConfig::default();
        config.population.time_budget_secs = Some(0.0);
        assert!(matches!(
            config.validate(),
            Err(EvolutionConfigError::InvalidTimeBudget(_))
        ));
    }

    #[test]
    fn test_elite_count() {
        let mut config = EvolutionConfig::default();
        config.population.size = 37;
        config.genetic.elitism_rate = 0.1;
        assert_eq!(config.elite_count(), 3);
        config.genetic.elitism_rate = 1.0;
        assert_eq!(config.elite_count(), 37);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "population": {{ "size": 8, "max_generations": 3 }}, "random_seed": 7 }}"#
        )
        .unwrap();

        let config = EvolutionConfig::load(file.path()).unwrap();
        assert_eq!(config.population.size, 8);
        assert_eq!(config.random_seed, Some(7));
    }

    #[test]
    fn test_load_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "population": {{ "size": 1 }} }}"#).unwrap();
        assert!(matches!(
            EvolutionConfig::load(file.path()),
            Err(EvolutionConfigError::PopulationTooSmall)
        ));

        assert!(matches!(
            EvolutionConfig::load("/nonexistent/voxel-fractal.json"),
            Err(EvolutionConfigError::Io(_))
        ));
    }
}
