//! Probability that a patch's radiometry matches a known image-quad
//! geometry.

use super::quad::QuadTarget;
use crate::geom::vec2::{outer, Spot};
use crate::grid::Grid;
use crate::stats::RunningStats;

/// Half-width (in pixels) of the dead band around the quad axes where the
/// rendered transition makes the expected sign ambiguous.
const AXIS_BAND: f64 = 0.5;

/// Pseudo-probability in [0, 1] that `src_grid` contains a quad target
/// with the given image geometry.
///
/// Each cell is mapped into quad-local axis coordinates; away from the
/// axes the pattern predicts bright where the coordinate product is
/// positive and dark where it is negative. Cells vote with their contrast
/// against the patch mean, and the result is the vote fraction in
/// agreement. Returns 0.5 (neutral) when there is no usable evidence and
/// NaN for invalid geometry.
pub fn quad_likeness(src_grid: &Grid<f32>, quad: &QuadTarget) -> f64 {
    if !quad.is_valid() {
        return f64::NAN;
    }
    let axes_det = outer(quad.dir_x, quad.dir_y);
    if axes_det.abs() <= f64::EPSILON {
        return f64::NAN;
    }

    let stats = RunningStats::from_samples(src_grid.iter().map(|&v| v as f64));
    if !stats.is_valid() {
        return 0.5;
    }
    let mean = stats.mean();

    let mut agree_sum = 0.;
    let mut total_sum = 0.;
    for row in 0..src_grid.high() {
        for col in 0..src_grid.wide() {
            let value = *src_grid.get(row, col) as f64;
            if !value.is_finite() {
                continue;
            }
            let cell_center = Spot::new(row as f64 + 0.5, col as f64 + 0.5);
            let off = cell_center - quad.center;
            // coordinates of the offset in the (possibly skewed) axis frame
            let coord_x = outer(off, quad.dir_y) / axes_det;
            let coord_y = outer(quad.dir_x, off) / axes_det;
            if coord_x.abs() < AXIS_BAND || coord_y.abs() < AXIS_BAND {
                continue;
            }

            let expect_bright = 0. < coord_x * coord_y;
            let is_bright = mean < value;
            let vote = (value - mean).abs();
            if expect_bright == is_bright {
                agree_sum += vote;
            }
            total_sum += vote;
        }
    }

    if total_sum <= 0. {
        return 0.5;
    }
    agree_sum / total_sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Vec2;
    use crate::grid::SizeHW;
    use crate::sim;

    #[test]
    fn ideal_render_with_true_geometry_is_quadlike() {
        let (grid, quad) = sim::render_face_on(8, 1);
        let prob = quad_likeness(&grid, &quad);
        assert!(0.5 < prob, "prob {prob}");
    }

    #[test]
    fn quarter_turn_geometry_anti_matches() {
        // rotating the claimed axes a quarter turn swaps bright and dark
        let (grid, quad) = sim::render_face_on(8, 1);
        let turned = QuadTarget::new(quad.center, quad.dir_y, -quad.dir_x);
        let prob = quad_likeness(&grid, &turned);
        assert!(prob < 0.5, "prob {prob}");
    }

    #[test]
    fn uniform_patch_is_neutral() {
        let grid = Grid::filled(SizeHW::new(8, 8), 3.0f32);
        let quad = QuadTarget::new(Spot::new(4., 4.), Vec2::new(1., 0.), Vec2::new(0., 1.));
        let prob = quad_likeness(&grid, &quad);
        assert!((prob - 0.5).abs() < 1e-12);
    }

    #[test]
    fn invalid_geometry_is_invalid() {
        let grid = Grid::filled(SizeHW::new(8, 8), 3.0f32);
        let degenerate = QuadTarget::new(Spot::new(4., 4.), Vec2::new(1., 0.), Vec2::new(1., 0.));
        assert!(quad_likeness(&grid, &degenerate).is_nan());
        let null = QuadTarget::new(Spot::NULL, Vec2::new(1., 0.), Vec2::new(0., 1.));
        assert!(quad_likeness(&grid, &null).is_nan());
    }
}
