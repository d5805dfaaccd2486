//! Schema module - Palettes and search configuration.

mod evolution;
mod palette;

pub use evolution::*;
pub use palette::*;
