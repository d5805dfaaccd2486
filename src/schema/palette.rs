//! Color palette: the finite alphabet of colors a substitution rule can paint.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A 24-bit RGB color packed as `0xRRGGBB`.
pub type Rgb = u32;

/// Color of an empty voxel.
pub const EMPTY_RGB: Rgb = 0x000000;

/// Color of the brightest voxel.
pub const FULL_RGB: Rgb = 0xFFFFFF;

/// Largest representable color value.
pub const MAX_RGB: Rgb = 0xFFFFFF;

/// Ordered set of distinct colors, fixed for the duration of a run.
///
/// By convention index 0 holds the empty color and the last index holds the
/// full-intensity color, but only non-emptiness and distinctness are enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Rgb>", into = "Vec<Rgb>")]
pub struct ColorPalette {
    colors: Vec<Rgb>,
}

impl ColorPalette {
    /// Create a palette from an ordered list of colors.
    pub fn new(colors: Vec<Rgb>) -> Result<Self, PaletteError> {
        if colors.is_empty() {
            return Err(PaletteError::Empty);
        }
        for (i, &color) in colors.iter().enumerate() {
            if color > MAX_RGB {
                return Err(PaletteError::ColorOutOfRange { index: i, color });
            }
            if colors[..i].contains(&color) {
                return Err(PaletteError::DuplicateColor { index: i, color });
            }
        }
        Ok(Self { colors })
    }

    /// Two-color palette: empty and full intensity.
    pub fn binary() -> Self {
        Self {
            colors: vec![EMPTY_RGB, FULL_RGB],
        }
    }

    /// Evenly spaced greys from empty to full intensity.
    pub fn grayscale(levels: usize) -> Result<Self, PaletteError> {
        if !(2..=256).contains(&levels) {
            return Err(PaletteError::InvalidLevels(levels));
        }
        let colors = (0..levels)
            .map(|i| {
                let v = ((i * 255) as f64 / (levels - 1) as f64).round() as Rgb;
                (v << 16) | (v << 8) | v
            })
            .collect();
        Self::new(colors)
    }

    /// Number of colors.
    #[inline]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always false; kept for API symmetry with `len`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Colors in palette order.
    #[inline]
    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    /// Color at `index`, if any.
    #[inline]
    pub fn get(&self, index: usize) -> Option<Rgb> {
        self.colors.get(index).copied()
    }

    /// The empty sentinel (first entry).
    pub fn empty(&self) -> Rgb {
        self.colors[0]
    }

    /// The full-intensity sentinel (last entry).
    pub fn full(&self) -> Rgb {
        self.colors[self.colors.len() - 1]
    }

    /// Whether `color` is one of the palette entries.
    pub fn contains(&self, color: Rgb) -> bool {
        self.colors.contains(&color)
    }

    /// Index of the palette color numerically closest to `color`.
    ///
    /// Distance is the absolute difference of the packed values, not a
    /// perceptual metric. Ties go to the lowest index.
    pub fn nearest_index(&self, color: Rgb) -> usize {
        let mut best = 0;
        let mut best_distance = color.abs_diff(self.colors[0]);
        for (i, &candidate) in self.colors.iter().enumerate().skip(1) {
            let distance = color.abs_diff(candidate);
            if distance < best_distance {
                best = i;
                best_distance = distance;
            }
        }
        best
    }

    /// Palette color numerically closest to `color`.
    pub fn nearest(&self, color: Rgb) -> Rgb {
        self.colors[self.nearest_index(color)]
    }

    /// Uniformly random palette color.
    pub fn random_color<R: Rng + ?Sized>(&self, rng: &mut R) -> Rgb {
        self.colors[rng.gen_range(0..self.colors.len())]
    }
}

impl TryFrom<Vec<Rgb>> for ColorPalette {
    type Error = PaletteError;

    fn try_from(colors: Vec<Rgb>) -> Result<Self, Self::Error> {
        Self::new(colors)
    }
}

impl From<ColorPalette> for Vec<Rgb> {
    fn from(palette: ColorPalette) -> Self {
        palette.colors
    }
}

/// Palette validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaletteError {
    #[error("Palette must contain at least one color")]
    Empty,
    #[error("Palette color {color:#08x} at index {index} appears more than once")]
    DuplicateColor { index: usize, color: Rgb },
    #[error("Palette color {color:#x} at index {index} exceeds 24 bits")]
    ColorOutOfRange { index: usize, color: Rgb },
    #[error("Grayscale palette needs between 2 and 256 levels, got {0}")]
    InvalidLevels(usize),
}
