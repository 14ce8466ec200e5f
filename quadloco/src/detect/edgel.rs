//! Edge elements and their extraction from a gradient grid.

use crate::geom::vec2::{dot, Grad, Spot};
use crate::grid::{Grid, RowCol, SizeHW};

/// A point sample of an edge: raster location plus gradient, with the
/// gradient magnitude cached.
#[derive(Debug, Clone, Copy)]
pub struct Edgel {
    location: Spot,
    gradient: Grad,
    magnitude: f64,
}

impl Edgel {
    pub fn new(location: Spot, gradient: Grad) -> Self {
        Self {
            location,
            gradient,
            magnitude: gradient.magnitude(),
        }
    }

    /// Edgel at a raster cell, located at the cell's geometric center —
    /// the point the cell's gradient sample actually describes.
    pub fn at_rc(rc: RowCol, gradient: Grad) -> Self {
        Self::new(rc.center_spot(), gradient)
    }

    pub fn is_valid(&self) -> bool {
        self.location.is_valid() && self.gradient.is_valid()
    }

    #[inline]
    pub fn location(&self) -> Spot {
        self.location
    }

    #[inline]
    pub fn gradient(&self) -> Grad {
        self.gradient
    }

    #[inline]
    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    /// Unit gradient direction (the edge normal).
    #[inline]
    pub fn direction(&self) -> Grad {
        self.gradient.direction()
    }

    #[inline]
    pub fn angle(&self) -> f64 {
        self.gradient.angle()
    }
}

/// Every interior cell with a valid non-zero gradient, with no
/// corroboration filter. Used by diagnostics and the symmetry modules.
pub fn all_edgels_from(grad_grid: &Grid<Grad>) -> Vec<Edgel> {
    let mut edgels = Vec::with_capacity(grad_grid.size() / 4);
    for row in 0..grad_grid.high() {
        for col in 0..grad_grid.wide() {
            let grad = *grad_grid.get(row, col);
            if grad.is_valid() && f64::EPSILON < grad.magnitude() {
                edgels.push(Edgel::at_rc(RowCol::new(row, col), grad));
            }
        }
    }
    edgels
}

/// Edgels whose 8-neighborhood corroborates their gradient direction.
///
/// A cell is emitted iff `dot(g_sum, g)/|g| > threshold * |g|` where
/// `g_sum` is the cell gradient plus all eight neighbor gradients. Any
/// invalid neighbor disqualifies the cell. The threshold is
/// `support_ratio`, halved for cells in the outermost two-cell band of the
/// evaluated interior so real edges survive near the image border.
pub fn linked_edgels_from(grad_grid: &Grid<Grad>, support_ratio: f64) -> Vec<Edgel> {
    let high = grad_grid.high();
    let wide = grad_grid.wide();
    if high < 3 || wide < 3 {
        return Vec::new();
    }

    let mut edgels = Vec::with_capacity(grad_grid.size() / 4);
    for row in 1..(high - 1) {
        for col in 1..(wide - 1) {
            let grad_center = *grad_grid.get(row, col);
            if !grad_center.is_valid() {
                continue;
            }
            let grad_mag = grad_center.magnitude();
            if grad_mag <= f64::EPSILON {
                continue;
            }

            let near_border =
                row <= 2 || col <= 2 || high <= row + 3 || wide <= col + 3;
            let min_proj = if near_border {
                0.5 * support_ratio
            } else {
                support_ratio
            };

            let hood_sum = *grad_grid.get(row - 1, col - 1)
                + *grad_grid.get(row - 1, col)
                + *grad_grid.get(row - 1, col + 1)
                + *grad_grid.get(row, col - 1)
                + *grad_grid.get(row, col + 1)
                + *grad_grid.get(row + 1, col - 1)
                + *grad_grid.get(row + 1, col)
                + *grad_grid.get(row + 1, col + 1);
            if !hood_sum.is_valid() {
                continue;
            }

            let proj = dot(hood_sum + grad_center, grad_center) / grad_mag;
            if min_proj * grad_mag < proj {
                edgels.push(Edgel::at_rc(RowCol::new(row, col), grad_center));
            }
        }
    }
    edgels
}

/// Raster of edgel gradient magnitudes at the first `num_to_use` edgel
/// locations (diagnostic dump).
pub fn edge_mag_grid_for(hw: SizeHW, edgels: &[Edgel], num_to_use: usize) -> Grid<f32> {
    let mut grid = Grid::filled(hw, 0.0f32);
    for edgel in edgels.iter().take(num_to_use) {
        if let Some(rc) = RowCol::from_spot(edgel.location()) {
            *grid.at_mut(rc) = edgel.magnitude() as f32;
        }
    }
    grid
}

/// Raster of edgel gradient angles (diagnostic dump); cells without an
/// edgel carry `background_bias` so the [-pi, pi) angle values stand out.
pub fn edge_angle_grid_for(
    hw: SizeHW,
    edgels: &[Edgel],
    num_to_use: usize,
    background_bias: f32,
) -> Grid<f32> {
    let mut grid = Grid::filled(hw, background_bias);
    for edgel in edgels.iter().take(num_to_use) {
        if let Some(rc) = RowCol::from_spot(edgel.location()) {
            *grid.at_mut(rc) = edgel.angle() as f32;
        }
    }
    grid
}
