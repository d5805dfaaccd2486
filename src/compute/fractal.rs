//! Recursive 3x3x3 substitution that grows a voxel fractal from a start grid.
//!
//! At every level the current cube is split into 27 equal sub-cubes. The
//! parent cube's color (quantized to the nearest palette entry) selects one
//! 27-gene pattern of the rule, and sub-cube `o` is painted with gene `o` of
//! that pattern before being subdivided in turn.

use crate::schema::ColorPalette;

use super::{ContextError, RepresentationError, SUB_CUBES, SubstitutionRule, VoxelGrid};

/// Expand `start` by applying `rule` `depth` times.
///
/// `start` is left untouched; the returned grid has the same side. Fails if
/// the rule was built for a palette of a different size or if the grid side
/// cannot be split into thirds `depth` times.
pub fn expand(
    rule: &SubstitutionRule,
    palette: &ColorPalette,
    start: &VoxelGrid,
    depth: u32,
) -> Result<VoxelGrid, ContextError> {
    check_rule(rule, palette)?;
    start.check_depth(depth)?;
    Ok(expand_unchecked(rule, palette, start, depth))
}

/// Expansion for inputs already validated by the caller.
pub(crate) fn expand_unchecked(
    rule: &SubstitutionRule,
    palette: &ColorPalette,
    start: &VoxelGrid,
    depth: u32,
) -> VoxelGrid {
    let mut end = start.clone();
    let side = end.side();
    substitute(&mut end, rule, palette, depth, [0, 0, 0], side);
    end
}

pub(crate) fn check_rule(
    rule: &SubstitutionRule,
    palette: &ColorPalette,
) -> Result<(), RepresentationError> {
    let expected = palette.len() * SUB_CUBES;
    if rule.len() != expected {
        return Err(RepresentationError::InvalidLength {
            expected,
            actual: rule.len(),
        });
    }
    Ok(())
}

fn substitute(
    grid: &mut VoxelGrid,
    rule: &SubstitutionRule,
    palette: &ColorPalette,
    level: u32,
    origin: [usize; 3],
    extent: usize,
) {
    if level == 0 {
        return;
    }

    let step = extent / 3;
    // Sampled once: painting sub-cube 0 overwrites the parent's first cell.
    let parent = grid[origin];
    let pattern = rule.pattern(palette.nearest_index(parent));

    let [ox, oy, oz] = origin;
    let mut offset = 0;
    for i in 0..3 {
        for j in 0..3 {
            for k in 0..3 {
                let sub = [ox + i * step, oy + j * step, oz + k * step];
                grid.fill_region(sub, step, pattern[offset]);
                substitute(grid, rule, palette, level - 1, sub, step);
                offset += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::GridError;
    use crate::schema::{EMPTY_RGB, FULL_RGB, MAX_RGB, Rgb};
    use proptest::prelude::*;

    fn rule_from_patterns(palette: &ColorPalette, patterns: &[[Rgb; 27]]) -> SubstitutionRule {
        let genes = patterns.iter().flatten().copied().collect();
        SubstitutionRule::new(genes, palette).unwrap()
    }

    #[test]
    fn test_fills_target_in_one_step() {
        let palette = ColorPalette::binary();
        let rule = rule_from_patterns(&palette, &[[FULL_RGB; 27], [EMPTY_RGB; 27]]);
        let start = VoxelGrid::empty(3).unwrap();

        let end = expand(&rule, &palette, &start, 1).unwrap();
        assert_eq!(end.count_matching(FULL_RGB), 27);
        assert_eq!(start.count_matching(EMPTY_RGB), 27);
    }

    #[test]
    fn test_offsets_follow_x_y_z_order() {
        let palette = ColorPalette::binary();
        let mut pattern = [0; 27];
        for (o, gene) in pattern.iter_mut().enumerate() {
            *gene = 0x100 + o as Rgb;
        }
        let rule = rule_from_patterns(&palette, &[pattern, [EMPTY_RGB; 27]]);
        let start = VoxelGrid::empty(3).unwrap();

        let end = expand(&rule, &palette, &start, 1).unwrap();
        assert_eq!(end.cells(), &pattern);
        assert_eq!(end[[1, 0, 0]], 0x100 + 9);
        assert_eq!(end[[0, 1, 0]], 0x100 + 3);
    }

    #[test]
    fn test_two_levels_of_substitution() {
        // Empty cubes get a lit center, lit cubes stay fully lit.
        let palette = ColorPalette::binary();
        let mut hollow = [EMPTY_RGB; 27];
        hollow[13] = FULL_RGB;
        let rule = rule_from_patterns(&palette, &[hollow, [FULL_RGB; 27]]);
        let start = VoxelGrid::empty(9).unwrap();

        let end = expand(&rule, &palette, &start, 2).unwrap();
        assert_eq!(end.count_matching(FULL_RGB), 26 + 27);
        assert_eq!(end[[4, 4, 4]], FULL_RGB);
        assert_eq!(end[[3, 3, 3]], FULL_RGB);
        assert_eq!(end[[1, 1, 1]], FULL_RGB);
        assert_eq!(end[[0, 0, 0]], EMPTY_RGB);
        assert_eq!(end[[2, 2, 2]], EMPTY_RGB);
    }

    #[test]
    fn test_parent_color_sampled_before_painting() {
        let palette = ColorPalette::new(vec![EMPTY_RGB, 0x808080, FULL_RGB]).unwrap();
        let rule = rule_from_patterns(
            &palette,
            &[[FULL_RGB; 27], [EMPTY_RGB; 27], [0x808080; 27]],
        );
        let mut start = VoxelGrid::empty(3).unwrap();
        start[[0, 0, 0]] = 0xF0F0F0;

        let end = expand(&rule, &palette, &start, 1).unwrap();
        assert_eq!(end.count_matching(0x808080), 27);
    }

    #[test]
    fn test_depth_smaller_than_grid() {
        let palette = ColorPalette::binary();
        let rule = rule_from_patterns(&palette, &[[FULL_RGB; 27], [FULL_RGB; 27]]);
        let start = VoxelGrid::empty(9).unwrap();

        let end = expand(&rule, &palette, &start, 1).unwrap();
        assert_eq!(end.count_matching(FULL_RGB), 729);
    }

    #[test]
    fn test_degenerate_depth_rejected() {
        let palette = ColorPalette::binary();
        let rule = SubstitutionRule::uniform(&palette, FULL_RGB).unwrap();
        let start = VoxelGrid::empty(9).unwrap();

        assert!(matches!(
            expand(&rule, &palette, &start, 3),
            Err(ContextError::Grid(GridError::DegenerateRecursion {
                side: 9,
                depth: 3
            }))
        ));
    }

    #[test]
    fn test_rule_for_other_palette_rejected() {
        let rule = SubstitutionRule::uniform(&ColorPalette::binary(), FULL_RGB).unwrap();
        let palette = ColorPalette::grayscale(3).unwrap();
        let start = VoxelGrid::empty(3).unwrap();

        assert!(matches!(
            expand(&rule, &palette, &start, 1),
            Err(ContextError::Representation(
                RepresentationError::InvalidLength {
                    expected: 81,
                    actual: 54
                }
            ))
        ));
    }

    #[test]
    fn test_expand_is_deterministic() {
        use rand::{SeedableRng, rngs::StdRng};

        let palette = ColorPalette::grayscale(4).unwrap();
        let rule = SubstitutionRule::random(&palette, &mut StdRng::seed_from_u64(3));
        let start = VoxelGrid::empty(27).unwrap();

        let a = expand(&rule, &palette, &start, 3).unwrap();
        let b = expand(&rule, &palette, &start, 3).unwrap();
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn zero_depth_is_identity(
            cells in proptest::collection::vec(0u32..=MAX_RGB, 27),
            fill in 0u32..=MAX_RGB,
        ) {
            let palette = ColorPalette::binary();
            let rule = SubstitutionRule::uniform(&palette, fill).unwrap();
            let start = VoxelGrid::from_cells(3, cells).unwrap();
            prop_assert_eq!(expand(&rule, &palette, &start, 0).unwrap(), start);
        }
    }
}
