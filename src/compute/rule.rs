//! Substitution rule: the chromosome encoding one 3x3x3 paint pattern per palette color.

use rand::Rng;
use serde::Serialize;

use crate::schema::{ColorPalette, MAX_RGB, Rgb};

/// Number of sub-cubes a cube is split into (3x3x3).
pub const SUB_CUBES: usize = 27;

/// Immutable gene sequence of length `palette.len() * 27`.
///
/// Gene `color_index * 27 + offset` is the color painted into sub-cube
/// `offset` when the parent cube's nearest palette entry is `color_index`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SubstitutionRule {
    genes: Vec<Rgb>,
}

impl SubstitutionRule {
    /// Build a rule for `palette`, rejecting any length other than `palette.len() * 27`.
    pub fn new(genes: Vec<Rgb>, palette: &ColorPalette) -> Result<Self, RepresentationError> {
        let expected = palette.len() * SUB_CUBES;
        if genes.len() != expected {
            return Err(RepresentationError::InvalidLength {
                expected,
                actual: genes.len(),
            });
        }
        if let Some((index, &color)) = genes.iter().enumerate().find(|(_, c)| **c > MAX_RGB) {
            return Err(RepresentationError::ColorOutOfRange { index, color });
        }
        Ok(Self { genes })
    }

    /// Rule whose genes are drawn independently and uniformly from `palette`.
    pub fn random<R: Rng + ?Sized>(palette: &ColorPalette, rng: &mut R) -> Self {
        let genes = (0..palette.len() * SUB_CUBES)
            .map(|_| palette.random_color(rng))
            .collect();
        Self { genes }
    }

    /// Rule painting every sub-cube of every palette color with `color`.
    pub fn uniform(palette: &ColorPalette, color: Rgb) -> Result<Self, RepresentationError> {
        Self::new(vec![color; palette.len() * SUB_CUBES], palette)
    }

    /// Constructor for operators that already preserve length and color range.
    pub(crate) fn from_genes_unchecked(genes: Vec<Rgb>) -> Self {
        debug_assert!(genes.len() % SUB_CUBES == 0);
        Self { genes }
    }

    /// Full gene sequence.
    #[inline]
    pub fn genes(&self) -> &[Rgb] {
        &self.genes
    }

    /// Number of genes.
    #[inline]
    pub fn len(&self) -> usize {
        self.genes.len()
    }

    /// True only for a rule over an empty palette, which cannot be constructed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Number of palette colors this rule covers.
    #[inline]
    pub fn color_count(&self) -> usize {
        self.genes.len() / SUB_CUBES
    }

    /// The 27 sub-cube colors used when the parent matches palette entry `color_index`.
    #[inline]
    pub fn pattern(&self, color_index: usize) -> &[Rgb] {
        let start = color_index * SUB_CUBES;
        &self.genes[start..start + SUB_CUBES]
    }

    /// Number of positions at which the two rules differ.
    pub fn hamming_distance(&self, other: &SubstitutionRule) -> usize {
        self.genes
            .iter()
            .zip(&other.genes)
            .filter(|(a, b)| a != b)
            .count()
            + self.genes.len().abs_diff(other.genes.len())
    }
}

/// Rule construction errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepresentationError {
    #[error("Invalid representation: expected {expected} genes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("Gene {index} holds color {color:#x}, which exceeds 24 bits")]
    ColorOutOfRange { index: usize, color: Rgb },
}
