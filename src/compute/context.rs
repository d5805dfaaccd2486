//! Read-only evaluation context and the fitness function built on it.

use crate::schema::{ColorPalette, PaletteError, Rgb};

use super::fractal::{check_rule, expand_unchecked};
use super::{GridError, RepresentationError, SUB_CUBES, SubstitutionRule, VoxelGrid};

/// Score of a rule that reproduces the target exactly.
///
/// Finite and large enough that `MAX_SCORE - distance` keeps full precision
/// for any grid up to side 729 (depth 6) with 24-bit colors.
pub const MAX_SCORE: f64 = 1.0e12;

/// Everything a fitness evaluation reads: palette, start and target grids, depth.
///
/// Built once per run and shared immutably between all evaluations, so
/// independent runs and parallel evaluations never observe each other.
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    palette: ColorPalette,
    start: VoxelGrid,
    target: VoxelGrid,
    depth: u32,
}

impl EvaluationContext {
    /// Validate and bundle the inputs of a run.
    ///
    /// Start and target must have the same side, and that side must split
    /// into thirds `depth` times.
    pub fn new(
        palette: ColorPalette,
        start: VoxelGrid,
        target: VoxelGrid,
        depth: u32,
    ) -> Result<Self, ContextError> {
        if start.side() != target.side() {
            return Err(GridError::ShapeMismatch {
                expected: target.side(),
                actual: start.side(),
            }
            .into());
        }
        start.check_depth(depth)?;
        Ok(Self {
            palette,
            start,
            target,
            depth,
        })
    }

    #[inline]
    pub fn palette(&self) -> &ColorPalette {
        &self.palette
    }

    #[inline]
    pub fn start(&self) -> &VoxelGrid {
        &self.start
    }

    #[inline]
    pub fn target(&self) -> &VoxelGrid {
        &self.target
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Number of genes a rule for this context must have.
    pub fn rule_len(&self) -> usize {
        self.palette.len() * SUB_CUBES
    }

    /// Build a rule for this context's palette.
    pub fn rule(&self, genes: Vec<Rgb>) -> Result<SubstitutionRule, ContextError> {
        Ok(SubstitutionRule::new(genes, &self.palette)?)
    }

    /// Expand `rule` from the start grid: the grid handed to export collaborators.
    pub fn render(&self, rule: &SubstitutionRule) -> Result<VoxelGrid, ContextError> {
        check_rule(rule, &self.palette)?;
        Ok(expand_unchecked(rule, &self.palette, &self.start, self.depth))
    }

    /// Euclidean distance between the expanded rule and the target.
    pub fn distance(&self, rule: &SubstitutionRule) -> Result<f64, ContextError> {
        let end = self.render(rule)?;
        Ok(self.target.distance(&end)?)
    }

    /// `MAX_SCORE - distance`: larger is better, an exact match scores `MAX_SCORE`.
    pub fn fitness(&self, rule: &SubstitutionRule) -> Result<f64, ContextError> {
        Ok(MAX_SCORE - self.distance(rule)?)
    }
}

/// Errors raised while building or using an evaluation context.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Representation(#[from] RepresentationError),
    #[error(transparent)]
    Palette(#[from] PaletteError),
}
