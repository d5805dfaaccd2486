//! Voxel Fractal - Evolutionary search for recursive 3x3x3 substitution rules.
//!
//! A substitution rule assigns every palette color a 27-cell paint pattern.
//! Expanding a start grid splits each cube into 3x3x3 sub-cubes, paints them
//! with the pattern chosen by the parent cube's color, and recurses to a fixed
//! depth. A genetic algorithm searches for the rule whose expansion lies
//! closest to a target grid.
//!
//! # Architecture
//!
//! - `schema`: Color palettes and evolution configuration
//! - `compute`: Voxel grids, rules, expansion, fitness and the search engine
//!
//! # Example
//!
//! ```rust,no_run
//! use voxel_fractal::{
//!     compute::{EvaluationContext, VoxelGrid, evolution::EvolutionEngine},
//!     schema::{ColorPalette, EvolutionConfig, FULL_RGB},
//! };
//!
//! // Grow a filled 27^3 cube from an empty one
//! let context = EvaluationContext::new(
//!     ColorPalette::binary(),
//!     VoxelGrid::empty(27).unwrap(),
//!     VoxelGrid::filled(27, FULL_RGB).unwrap(),
//!     3,
//! )
//! .unwrap();
//!
//! let config = EvolutionConfig::from_json_str(
//!     r#"{ "population": { "size": 37, "max_generations": 200 }, "random_seed": 42 }"#,
//! )
//! .unwrap();
//!
//! let mut engine = EvolutionEngine::new(&context, config).unwrap();
//! let result = engine.run().unwrap();
//!
//! println!("Best fitness: {}", result.best.fitness);
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::evolution::{EvolutionEngine, EvolutionError};
pub use compute::{EvaluationContext, MAX_SCORE, SubstitutionRule, VoxelGrid, expand};
pub use schema::{ColorPalette, EvolutionConfig, Rgb};
