//! Cubic voxel grid stored as a flat buffer.

use std::ops::{Index, IndexMut};

use crate::schema::{EMPTY_RGB, MAX_RGB, Rgb};

/// Cubic 3D grid of 24-bit colors.
///
/// Cells are stored x-major: `(x * side + y) * side + z`, so the innermost
/// run along z is contiguous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoxelGrid {
    side: usize,
    cells: Vec<Rgb>,
}

impl VoxelGrid {
    /// Grid of side `side` with every cell set to `color`.
    pub fn filled(side: usize, color: Rgb) -> Result<Self, GridError> {
        if side == 0 {
            return Err(GridError::InvalidDimensions);
        }
        if color > MAX_RGB {
            return Err(GridError::ColorOutOfRange { index: 0, color });
        }
        let len = side
            .checked_pow(3)
            .ok_or(GridError::InvalidDimensions)?;
        Ok(Self {
            side,
            cells: vec![color; len],
        })
    }

    /// Grid of side `side` cleared to the empty color.
    pub fn empty(side: usize) -> Result<Self, GridError> {
        Self::filled(side, EMPTY_RGB)
    }

    /// Grid of side `3^depth` filled with `color`.
    pub fn for_depth(depth: u32, color: Rgb) -> Result<Self, GridError> {
        let side = 3usize
            .checked_pow(depth)
            .ok_or(GridError::DegenerateRecursion { side: 0, depth })?;
        Self::filled(side, color)
    }

    /// Grid built from `side^3` cells in x-major order.
    pub fn from_cells(side: usize, cells: Vec<Rgb>) -> Result<Self, GridError> {
        if side == 0 || side.checked_pow(3) != Some(cells.len()) {
            return Err(GridError::InvalidDimensions);
        }
        if let Some((index, &color)) = cells.iter().enumerate().find(|(_, c)| **c > MAX_RGB) {
            return Err(GridError::ColorOutOfRange { index, color });
        }
        Ok(Self { side, cells })
    }

    /// Edge length.
    #[inline]
    pub fn side(&self) -> usize {
        self.side
    }

    /// Total number of cells (`side^3`).
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false: a grid has at least one cell.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cells in x-major order.
    #[inline]
    pub fn cells(&self) -> &[Rgb] {
        &self.cells
    }

    #[inline]
    fn offset(&self, x: usize, y: usize, z: usize) -> usize {
        (x * self.side + y) * self.side + z
    }

    /// Color at `(x, y, z)`, or `None` outside the grid.
    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<Rgb> {
        if x < self.side && y < self.side && z < self.side {
            Some(self.cells[self.offset(x, y, z)])
        } else {
            None
        }
    }

    /// Overwrite the cell at `(x, y, z)`.
    pub fn set(&mut self, x: usize, y: usize, z: usize, color: Rgb) -> Result<(), GridError> {
        if x >= self.side || y >= self.side || z >= self.side {
            return Err(GridError::OutOfBounds {
                position: [x, y, z],
                side: self.side,
            });
        }
        let offset = self.offset(x, y, z);
        if color > MAX_RGB {
            return Err(GridError::ColorOutOfRange {
                index: offset,
                color,
            });
        }
        self.cells[offset] = color;
        Ok(())
    }

    /// Number of cells holding exactly `color`.
    pub fn count_matching(&self, color: Rgb) -> usize {
        self.cells.iter().filter(|&&c| c == color).count()
    }

    /// Paint the cube of edge `extent` starting at `origin`.
    pub(crate) fn fill_region(&mut self, origin: [usize; 3], extent: usize, color: Rgb) {
        let [ox, oy, oz] = origin;
        for x in ox..ox + extent {
            for y in oy..oy + extent {
                let start = self.offset(x, y, oz);
                self.cells[start..start + extent].fill(color);
            }
        }
    }

    /// Check that the side can be split into thirds `depth` times.
    pub fn check_depth(&self, depth: u32) -> Result<(), GridError> {
        let degenerate = GridError::DegenerateRecursion {
            side: self.side,
            depth,
        };
        let divisor = 3usize.checked_pow(depth).ok_or(degenerate.clone())?;
        if self.side % divisor != 0 {
            return Err(degenerate);
        }
        Ok(())
    }

    /// Euclidean distance between the grids viewed as flat vectors of color values.
    ///
    /// Grids of different sides are rejected rather than compared over their overlap.
    pub fn distance(&self, other: &VoxelGrid) -> Result<f64, GridError> {
        if self.side != other.side {
            return Err(GridError::ShapeMismatch {
                expected: self.side,
                actual: other.side,
            });
        }
        let sum: f64 = self
            .cells
            .iter()
            .zip(&other.cells)
            .map(|(&a, &b)| {
                let d = f64::from(a) - f64::from(b);
                d * d
            })
            .sum();
        Ok(sum.sqrt())
    }
}

impl Index<[usize; 3]> for VoxelGrid {
    type Output = Rgb;

    fn index(&self, [x, y, z]: [usize; 3]) -> &Rgb {
        assert!(
            x < self.side && y < self.side && z < self.side,
            "voxel ({x}, {y}, {z}) outside grid of side {}",
            self.side
        );
        &self.cells[self.offset(x, y, z)]
    }
}

impl IndexMut<[usize; 3]> for VoxelGrid {
    fn index_mut(&mut self, [x, y, z]: [usize; 3]) -> &mut Rgb {
        assert!(
            x < self.side && y < self.side && z < self.side,
            "voxel ({x}, {y}, {z}) outside grid of side {}",
            self.side
        );
        let offset = self.offset(x, y, z);
        &mut self.cells[offset]
    }
}

/// Grid construction and comparison errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("Grid side must be non-zero and side^3 must match the cell count")]
    InvalidDimensions,
    #[error("Grid color {color:#x} at cell {index} exceeds 24 bits")]
    ColorOutOfRange { index: usize, color: Rgb },
    #[error("Grid side {actual} does not match expected side {expected}")]
    ShapeMismatch { expected: usize, actual: usize },
    #[error("Voxel {position:?} lies outside grid of side {side}")]
    OutOfBounds { position: [usize; 3], side: usize },
    #[error("Grid side {side} cannot be split into thirds {depth} times")]
    DegenerateRecursion { side: usize, depth: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FULL_RGB;
    use proptest::prelude::*;

    #[test]
    fn test_for_depth_side() {
        let grid = VoxelGrid::for_depth(3, EMPTY_RGB).unwrap();
        assert_eq!(grid.side(), 27);
        assert_eq!(grid.len(), 27 * 27 * 27);
        assert_eq!(grid.count_matching(EMPTY_RGB), grid.len());
    }

    #[test]
    fn test_invalid_dimensions() {
        assert_eq!(VoxelGrid::empty(0), Err(GridError::InvalidDimensions));
        assert_eq!(
            VoxelGrid::from_cells(2, vec![0; 7]),
            Err(GridError::InvalidDimensions)
        );
        assert!(matches!(
            VoxelGrid::from_cells(1, vec![0x1000000]),
            Err(GridError::ColorOutOfRange { index: 0, .. })
        ));
    }

    #[test]
    fn test_indexing_is_x_major() {
        let cells: Vec<Rgb> = (0..27).collect();
        let grid = VoxelGrid::from_cells(3, cells).unwrap();
        assert_eq!(grid[[0, 0, 1]], 1);
        assert_eq!(grid[[0, 1, 0]], 3);
        assert_eq!(grid[[1, 0, 0]], 9);
        assert_eq!(grid.get(2, 2, 2), Some(26));
        assert_eq!(grid.get(3, 0, 0), None);
    }

    #[test]
    fn test_set_checks_bounds_and_color() {
        let mut grid = VoxelGrid::empty(3).unwrap();
        grid.set(1, 2, 0, FULL_RGB).unwrap();
        assert_eq!(grid.get(1, 2, 0), Some(FULL_RGB));
        assert_eq!(
            grid.set(0, 3, 0, FULL_RGB),
            Err(GridError::OutOfBounds {
                position: [0, 3, 0],
                side: 3
            })
        );
        assert!(matches!(
            grid.set(0, 0, 0, 0x1000000),
            Err(GridError::ColorOutOfRange { .. })
        ));
        assert_eq!(grid.count_matching(FULL_RGB), 1);
    }

    #[test]
    fn test_fill_region() {
        let mut grid = VoxelGrid::empty(9).unwrap();
        grid.fill_region([3, 6, 0], 3, FULL_RGB);
        assert_eq!(grid.count_matching(FULL_RGB), 27);
        assert_eq!(grid[[3, 6, 0]], FULL_RGB);
        assert_eq!(grid[[5, 8, 2]], FULL_RGB);
        assert_eq!(grid[[2, 6, 0]], EMPTY_RGB);
        assert_eq!(grid[[5, 8, 3]], EMPTY_RGB);
    }

    #[test]
    fn test_check_depth() {
        let grid = VoxelGrid::empty(27).unwrap();
        assert!(grid.check_depth(0).is_ok());
        assert!(grid.check_depth(3).is_ok());
        assert_eq!(
            grid.check_depth(4),
            Err(GridError::DegenerateRecursion { side: 27, depth: 4 })
        );

        let grid = VoxelGrid::empty(18).unwrap();
        assert!(grid.check_depth(2).is_ok());
        assert!(grid.check_depth(3).is_err());
    }

    #[test]
    fn test_distance_single_cell() {
        let a = VoxelGrid::filled(3, FULL_RGB).unwrap();
        let mut b = a.clone();
        b[[0, 0, 0]] = EMPTY_RGB;
        let d = a.distance(&b).unwrap();
        assert!((d - f64::from(FULL_RGB)).abs() < 1e-6);
    }

    #[test]
    fn test_distance_shape_mismatch() {
        let a = VoxelGrid::empty(3).unwrap();
        let b = VoxelGrid::empty(9).unwrap();
        assert_eq!(
            a.distance(&b),
            Err(GridError::ShapeMismatch {
                expected: 3,
                actual: 9
            })
        );
    }

    proptest! {
        #[test]
        fn distance_to_self_is_zero(cells in proptest::collection::vec(0u32..=MAX_RGB, 27)) {
            let grid = VoxelGrid::from_cells(3, cells).unwrap();
            prop_assert_eq!(grid.distance(&grid).unwrap(), 0.0);
        }

        #[test]
        fn distance_is_symmetric(
            a in proptest::collection::vec(0u32..=MAX_RGB, 27),
            b in proptest::collection::vec(0u32..=MAX_RGB, 27),
        ) {
            let a = VoxelGrid::from_cells(3, a).unwrap();
            let b = VoxelGrid::from_cells(3, b).unwrap();
            prop_assert_eq!(a.distance(&b).unwrap(), b.distance(&a).unwrap());
        }
    }
}
