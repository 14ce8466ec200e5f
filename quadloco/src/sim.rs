//! Deterministic synthetic quad imagery for tests and benchmarks.
//!
//! Detection never depends on random state, so neither does this
//! renderer: oversampling integrates the ideal signal over a regular
//! sub-pixel grid instead of jittered samples.

use crate::detect::QuadTarget;
use crate::geom::{Spot, Vec2};
use crate::grid::{Grid, SizeHW};

/// Ideal radiometric model of a face-on quad target: two bright and two
/// dark quadrants meeting at the origin of its local frame.
#[derive(Debug, Clone, Copy)]
pub struct QuadSignal {
    /// Side length of the square target in its own units.
    pub edge_mag: f64,
}

impl QuadSignal {
    pub const BLACK: f64 = 0.;
    pub const WHITE: f64 = 1.;

    pub fn new(edge_mag: f64) -> Self {
        Self { edge_mag }
    }

    /// Signal value at a location in the target frame; NaN outside the
    /// (half-open) target square.
    pub fn signal_at(&self, loc: Spot) -> f64 {
        let half = 0.5 * self.edge_mag;
        if !(-half <= loc.row && loc.row < half && -half <= loc.col && loc.col < half) {
            return f64::NAN;
        }
        if 0. < loc.row * loc.col {
            Self::WHITE
        } else {
            Self::BLACK
        }
    }
}

/// Render a face-on quad filling a square raster of `num_pix` cells per
/// side.
///
/// Each pixel integrates the signal over `samps_per_axis`^2 regularly
/// spaced sub-samples (1 = a single sample at the cell center). Returns
/// the raster together with the true image-space geometry: center at
/// (num_pix/2, num_pix/2), axes along +row and +col.
pub fn render_face_on(num_pix: usize, samps_per_axis: usize) -> (Grid<f32>, QuadTarget) {
    let signal = QuadSignal::new(1.);
    let n = num_pix as f64;
    let samps = samps_per_axis.max(1);

    let mut grid = Grid::filled(SizeHW::new(num_pix, num_pix), 0.0f32);
    for row in 0..num_pix {
        for col in 0..num_pix {
            let mut sum = 0.;
            let mut count = 0.;
            for sub_row in 0..samps {
                for sub_col in 0..samps {
                    let spot = Spot::new(
                        row as f64 + (sub_row as f64 + 0.5) / samps as f64,
                        col as f64 + (sub_col as f64 + 0.5) / samps as f64,
                    );
                    // map the raster square onto the target square
                    let loc = Spot::new(
                        (spot.row / n - 0.5) * signal.edge_mag,
                        (spot.col / n - 0.5) * signal.edge_mag,
                    );
                    let value = signal.signal_at(loc);
                    if value.is_finite() {
                        sum += value;
                        count += 1.;
                    }
                }
            }
            *grid.get_mut(row, col) = if 0. < count { (sum / count) as f32 } else { f32::NAN };
        }
    }

    let quad = QuadTarget::new(
        Spot::new(0.5 * n, 0.5 * n),
        Vec2::new(1., 0.),
        Vec2::new(0., 1.),
    );
    (grid, quad)
}
