//! Genome contract and genetic operators for substitution rules.
//!
//! The engine only needs what the [`Genotype`] and [`Problem`] traits expose;
//! [`SubstitutionRule`] and [`EvaluationContext`] are the concrete pair used
//! for voxel fractal search.

use rand::Rng;

use crate::compute::{ContextError, EvaluationContext, SubstitutionRule};
use crate::schema::ColorPalette;

/// A fixed-length genome that can be recombined.
pub trait Genotype: Clone + Send + Sync {
    /// Number of genes.
    fn gene_count(&self) -> usize;

    /// Produce two children of the same length as the parents.
    fn crossover<R: Rng + ?Sized>(&self, other: &Self, swap_rate: f64, rng: &mut R)
    -> (Self, Self);
}

/// A search problem: how to create, mutate and score genomes.
///
/// Implementations must be safe to share between threads; `fitness` is
/// called concurrently on distinct genomes.
pub trait Problem: Sync {
    type Genome: Genotype;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Genome with every gene drawn uniformly at random.
    fn random_genome<R: Rng + ?Sized>(&self, rng: &mut R) -> Self::Genome;

    /// New genome differing from `genome` in one resampled gene.
    fn mutate<R: Rng + ?Sized>(&self, genome: &Self::Genome, rng: &mut R) -> Self::Genome;

    /// Score to maximize.
    fn fitness(&self, genome: &Self::Genome) -> Result<f64, Self::Error>;
}

/// Copy `rule` with one uniformly chosen gene replaced by a uniformly random palette color.
///
/// The replacement may coincide with the old value.
pub fn mutate<R: Rng + ?Sized>(
    rule: &SubstitutionRule,
    palette: &ColorPalette,
    rng: &mut R,
) -> SubstitutionRule {
    mutate_traced(rule, palette, rng).0
}

/// Like [`mutate`], also returning the resampled gene index.
pub fn mutate_traced<R: Rng + ?Sized>(
    rule: &SubstitutionRule,
    palette: &ColorPalette,
    rng: &mut R,
) -> (SubstitutionRule, usize) {
    let mut genes = rule.genes().to_vec();
    let index = rng.gen_range(0..genes.len());
    genes[index] = palette.random_color(rng);
    (SubstitutionRule::from_genes_unchecked(genes), index)
}

/// Uniform crossover: each gene position is swapped between the parents with probability `swap_rate`.
pub fn uniform_crossover<R: Rng + ?Sized>(
    a: &SubstitutionRule,
    b: &SubstitutionRule,
    swap_rate: f64,
    rng: &mut R,
) -> (SubstitutionRule, SubstitutionRule) {
    debug_assert_eq!(a.len(), b.len());
    let mut first = a.genes().to_vec();
    let mut second = b.genes().to_vec();
    for (x, y) in first.iter_mut().zip(second.iter_mut()) {
        if rng.gen_bool(swap_rate) {
            std::mem::swap(x, y);
        }
    }
    (
        SubstitutionRule::from_genes_unchecked(first),
        SubstitutionRule::from_genes_unchecked(second),
    )
}

impl Genotype for SubstitutionRule {
    fn gene_count(&self) -> usize {
        self.len()
    }

    fn crossover<R: Rng + ?Sized>(
        &self,
        other: &Self,
        swap_rate: f64,
        rng: &mut R,
    ) -> (Self, Self) {
        uniform_crossover(self, other, swap_rate, rng)
    }
}

impl Problem for EvaluationContext {
    type Genome = SubstitutionRule;
    type Error = ContextError;

    fn random_genome<R: Rng + ?Sized>(&self, rng: &mut R) -> SubstitutionRule {
        SubstitutionRule::random(self.palette(), rng)
    }

    fn mutate<R: Rng + ?Sized>(&self, genome: &SubstitutionRule, rng: &mut R) -> SubstitutionRule {
        mutate(genome, self.palette(), rng)
    }

    fn fitness(&self, genome: &SubstitutionRule) -> Result<f64, ContextError> {
        EvaluationContext::fitness(self, genome)
    }
}
