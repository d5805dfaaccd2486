//! Compute module - Voxel grids, substitution rules and their evaluation.

mod context;
mod fractal;
mod grid;
mod rule;

pub mod evolution;

pub use context::*;
pub use fractal::expand;
pub use grid::*;
pub use rule::*;
