//! Evolutionary search for substitution rules.
//!
//! # Overview
//!
//! - **Genome Operations** (`genome`): the [`Genotype`]/[`Problem`] contract,
//!   single-gene mutation and uniform crossover
//! - **Search Algorithm** (`search`): generational GA with tournament selection,
//!   elitism and lazily memoized fitness
//!
//! # Example
//!
//! ```rust,no_run
//! use voxel_fractal::compute::evolution::EvolutionEngine;
//! use voxel_fractal::compute::{EvaluationContext, VoxelGrid};
//! use voxel_fractal::schema::{ColorPalette, EvolutionConfig, FULL_RGB};
//!
//! let context = EvaluationContext::new(
//!     ColorPalette::binary(),
//!     VoxelGrid::empty(9).unwrap(),
//!     VoxelGrid::filled(9, FULL_RGB).unwrap(),
//!     2,
//! )
//! .unwrap();
//!
//! let mut engine = EvolutionEngine::new(&context, EvolutionConfig::default()).unwrap();
//! let result = engine
//!     .run_with_callback(|progress| {
//!         println!(
//!             "Generation {}: best fitness = {:.3}",
//!             progress.generation, progress.best_fitness
//!         );
//!     })
//!     .unwrap();
//!
//! let grid = context.render(&result.best.genome).unwrap();
//! println!("Lit cells: {}", grid.count_matching(FULL_RGB));
//! ```

mod genome;
mod search;

pub use genome::{Genotype, Problem, mutate, mutate_traced, uniform_crossover};
pub use search::{Candidate, EvolutionEngine, EvolutionError};
