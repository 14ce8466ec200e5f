//! Alpha/delta chord parameterization of edgel lines against a bounding
//! circle (Hough-style line space).

use super::edgel::Edgel;
use crate::ang::{atan2, TWO_PI};
use crate::geom::circle::{Circle, CircleIntersector};
use crate::geom::vec2::{Spot, Vec2};

/// A line encoded by the two angles at which it crosses a bounding circle:
/// `alpha` is the angle (about the circle center) of the first crossing,
/// `delta` the angular sweep from there to the second crossing.
#[derive(Debug, Clone, Copy)]
pub struct ParmAD {
    pub alpha: f64,
    pub delta: f64,
}

impl ParmAD {
    pub fn is_valid(&self) -> bool {
        self.alpha.is_finite() && self.delta.is_finite()
    }

    /// Angle about the circle center of a spot on the circle.
    fn alpha_for(spot_on_circle: Spot, circle: &Circle) -> f64 {
        let diff = spot_on_circle - circle.center;
        atan2(diff.col, diff.row)
    }

    /// Angular sweep from `alpha` to a second circle spot, in [0, 2*pi).
    fn delta_for(spot_on_circle: Spot, circle: &Circle, alpha: f64) -> f64 {
        let diff = spot_on_circle - circle.center;
        let mut delta = atan2(diff.col, diff.row) - alpha;
        if delta < 0. {
            delta += TWO_PI;
        }
        if TWO_PI <= delta {
            delta -= TWO_PI;
        }
        delta
    }

    /// Parameters of the line through `edgel`'s location running
    /// perpendicular to its gradient (the physical edge direction).
    pub fn from_edgel(edgel: &Edgel, circle: &Circle) -> Self {
        let line_dir = edgel.gradient().ccw_perp();
        let cut = CircleIntersector { circle: *circle };
        let (spot_beg, spot_end) = cut.intersections(edgel.location(), line_dir);
        if !(spot_beg.is_valid() && spot_end.is_valid()) {
            return Self {
                alpha: f64::NAN,
                delta: f64::NAN,
            };
        }
        let alpha = Self::alpha_for(spot_beg, circle);
        let delta = Self::delta_for(spot_end, circle, alpha);
        Self { alpha, delta }
    }

    /// The two circle crossings named by (alpha, delta).
    pub fn circle_spots(&self, circle: &Circle) -> (Spot, Spot) {
        let at = |angle: f64| circle.center + circle.radius * Vec2::from_angle(angle);
        (at(self.alpha), at(self.alpha + self.delta))
    }

    /// Same parameters within `tol`, with alpha compared on the unit
    /// circle to absorb the +/- pi seam.
    pub fn nearly_equals(&self, other: &ParmAD, tol: f64) -> bool {
        crate::ang::nearly_same_angle(self.alpha, other.alpha, tol)
            && (self.delta - other.delta).abs() <= tol
    }
}
