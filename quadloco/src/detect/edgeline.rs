//! Radial lines from a candidate center through edge-ray start points.

use super::quad::NdxWgt;
use crate::geom::ray::Ray;
use crate::geom::vec2::{outer, Spot, Vec2};

/// Minimum |turn moment| for a line to count as a usable radial edge.
pub const MIN_MOMENT_MAG: f64 = 0.75;

/// The line from a candidate center through an edge ray's start.
///
/// `angle_of_line` is the direction from the center to the ray start; the
/// turn moment `outer(line_dir, ray_dir)` in [-1, +1] tells which way the
/// edge gradient turns across the line.
#[derive(Debug, Clone, Copy)]
pub struct EdgeLine {
    start_spot: Spot,
    edge_ray: Ray,
    angle: f64,
    moment: f64,
}

impl EdgeLine {
    pub fn from(start_spot: Spot, edge_ray: Ray) -> Self {
        let line_dir = (edge_ray.start() - start_spot).direction();
        let angle = line_dir.angle();
        let moment = outer(line_dir, edge_ray.direction());
        Self {
            start_spot,
            edge_ray,
            angle,
            moment,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.angle.is_finite() && self.moment.is_finite()
    }

    #[inline]
    pub fn start_spot(&self) -> Spot {
        self.start_spot
    }

    #[inline]
    pub fn edge_ray(&self) -> &Ray {
        &self.edge_ray
    }

    #[inline]
    pub fn angle_of_line(&self) -> f64 {
        self.angle
    }

    /// Unit vector at `angle_of_line` (a point on the unit circle).
    #[inline]
    pub fn line_direction(&self) -> Vec2 {
        Vec2::from_angle(self.angle)
    }

    #[inline]
    pub fn turn_moment(&self) -> f64 {
        self.moment
    }

    pub fn has_good_moment(&self, min_moment_mag: f64) -> bool {
        min_moment_mag < self.moment.abs()
    }

    pub fn is_turn_dir_opposite_to(&self, other: &EdgeLine) -> bool {
        self.moment * other.moment < 0.
    }

    pub fn is_turn_dir_same_as(&self, other: &EdgeLine) -> bool {
        !self.is_turn_dir_opposite_to(other)
    }

    /// Index of the line in `others` most nearly opposing this one
    /// (closest on the unit circle to this line's antipode), restricted to
    /// lines with the same turning direction and a significant moment.
    ///
    /// The weight is a Gaussian in the unit-circle distance with the given
    /// angular sigma. Invalid when no qualifying line exists.
    pub fn opposing_ndx_wgt(
        &self,
        others: &[EdgeLine],
        ndx_curr: usize,
        ang_sigma: f64,
    ) -> NdxWgt {
        if !self.has_good_moment(MIN_MOMENT_MAG) {
            return NdxWgt::new(usize::MAX, f64::NAN);
        }
        let anti_dir = -self.line_direction();

        let mut ndx_min = usize::MAX;
        let mut dist_min = f64::MAX;
        for (ndx, other) in others.iter().enumerate() {
            if ndx == ndx_curr {
                continue;
            }
            if !(other.has_good_moment(MIN_MOMENT_MAG) && self.is_turn_dir_same_as(other)) {
                continue;
            }
            let dist = (anti_dir - other.line_direction()).magnitude();
            if dist < dist_min {
                ndx_min = ndx;
                dist_min = dist;
            }
        }

        if ndx_min == usize::MAX {
            return NdxWgt::new(usize::MAX, f64::NAN);
        }
        // for small distances the chord length approximates the angle gap
        let arg = dist_min / ang_sigma;
        NdxWgt::new(ndx_min, (-arg * arg).exp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_at(center: Spot, angle: f64, ray_dir: Vec2) -> EdgeLine {
        let start = center + 5. * Vec2::from_angle(angle);
        EdgeLine::from(center, Ray::new(start, ray_dir))
    }

    #[test]
    fn angle_and_moment_of_tangent_ray() {
        let center = Spot::new(10., 10.);
        // ray start directly "east" of center, gradient pointing "north":
        // line dir (0,1), ray dir (-1,0) -> moment = outer((0,1),(-1,0)) = +1
        let line = line_at(center, std::f64::consts::FRAC_PI_2, Vec2::new(-1., 0.));
        assert!((line.angle_of_line() - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert!((line.turn_moment() - 1.).abs() < 1e-12);
        assert!(line.has_good_moment(MIN_MOMENT_MAG));
    }

    #[test]
    fn radially_aligned_gradient_has_zero_moment() {
        let center = Spot::new(0., 0.);
        let line = line_at(center, 0., Vec2::new(1., 0.));
        assert!(line.turn_moment().abs() < 1e-12);
        assert!(!line.has_good_moment(MIN_MOMENT_MAG));
    }

    #[test]
    fn opposite_turn_directions_detected() {
        let center = Spot::new(0., 0.);
        let pos = line_at(center, 0.3, Vec2::from_angle(0.3 + std::f64::consts::FRAC_PI_2));
        let neg = line_at(center, 1.8, Vec2::from_angle(1.8 - std::f64::consts::FRAC_PI_2));
        assert!(pos.is_turn_dir_opposite_to(&neg));
        assert!(pos.is_turn_dir_same_as(&pos));
    }

    #[test]
    fn opposing_line_is_nearest_antipode_with_same_turn() {
        let center = Spot::new(0., 0.);
        let quarter = std::f64::consts::FRAC_PI_2;
        // four radial lines, gradients all turned the same way so every
        // line qualifies as an opposing candidate for every other
        let lines = vec![
            line_at(center, 0., Vec2::from_angle(quarter)),
            line_at(center, quarter, Vec2::from_angle(2. * quarter)),
            line_at(center, 2. * quarter, Vec2::from_angle(3. * quarter)),
            line_at(center, 3. * quarter, Vec2::from_angle(4. * quarter)),
        ];
        let nw = lines[0].opposing_ndx_wgt(&lines, 0, 0.5);
        assert!(nw.is_valid());
        assert_eq!(nw.item, 2);
        assert!(0.99 < nw.weight);

        let nw1 = lines[1].opposing_ndx_wgt(&lines, 1, 0.5);
        assert_eq!(nw1.item, 3);
    }

    #[test]
    fn no_qualifying_opposite_is_invalid() {
        let center = Spot::new(0., 0.);
        let lone = line_at(center, 0., Vec2::from_angle(std::f64::consts::FRAC_PI_2));
        let weak = line_at(center, 3., Vec2::from_angle(3.));
        let lines = vec![lone, weak];
        let nw = lines[0].opposing_ndx_wgt(&lines, 0, 0.5);
        assert!(!nw.is_valid());
    }
}
