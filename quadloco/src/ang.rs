//! Angle helpers and the circular bin ring shared by the angle histogram
//! and azimuth sampling.

use std::f64::consts::PI;

/// Full turn.
pub const TWO_PI: f64 = 2. * PI;

/// atan2 pinned to the half-open interval [-pi, +pi).
///
/// `f64::atan2` can return +pi for points on the negative real axis; the
/// half-open convention maps that single value to -pi so downstream binning
/// never sees an out-of-range angle.
#[inline]
pub fn atan2(y: f64, x: f64) -> f64 {
    let angle = y.atan2(x);
    if angle == PI {
        -PI
    } else {
        angle
    }
}

/// Any angle reduced to the principal range [-pi, +pi).
#[inline]
pub fn principal_angle(any_angle: f64) -> f64 {
    atan2(any_angle.sin(), any_angle.cos())
}

/// Any angle reduced to the non-negative range [0, 2*pi).
#[inline]
pub fn non_negative_angle(any_angle: f64) -> f64 {
    let angle = principal_angle(any_angle);
    if angle < 0. {
        angle + TWO_PI
    } else {
        angle
    }
}

/// True when the two angles name (nearly) the same point on the unit circle.
pub fn nearly_same_angle(a1: f64, a2: f64, tol: f64) -> bool {
    (a1.cos() - a2.cos()).abs() <= tol && (a1.sin() - a2.sin()).abs() <= tol
}

/// Circular index/angle map: N equal bins covering [-pi, +pi).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ring {
    num_bins: usize,
}

impl Ring {
    pub fn new(num_bins: usize) -> Self {
        Self { num_bins }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        0 < self.num_bins
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.num_bins
    }

    /// Angular width of one bin.
    #[inline]
    pub fn angle_delta(&self) -> f64 {
        TWO_PI / self.num_bins as f64
    }

    /// Bin containing `angle` (any real value; wrapped to principal range).
    #[inline]
    pub fn index_for(&self, angle: f64) -> usize {
        let delta = principal_angle(angle) + PI; // [0, 2*pi)
        let bin = (delta / self.angle_delta()).floor() as usize;
        // guard the rounding edge where delta/width lands exactly on N
        bin.min(self.num_bins - 1)
    }

    /// Angle at the *start* of bin `ndx`.
    #[inline]
    pub fn angle_at(&self, ndx: usize) -> f64 {
        self.angle_delta() * ndx as f64 - PI
    }

    /// Index `delta_ndx` bins away (either sign), wrapped circularly.
    #[inline]
    pub fn index_relative_to(&self, ref_ndx: usize, delta_ndx: isize) -> usize {
        let n = self.num_bins as isize;
        let raw = ref_ndx as isize + delta_ndx.rem_euclid(n);
        (raw % n) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atan2_never_returns_plus_pi() {
        let a = atan2(0., -1.);
        assert!((a + PI).abs() < 1e-15);
    }

    #[test]
    fn principal_angle_wraps_large_angles() {
        assert!((principal_angle(2.5 * PI) - 0.5 * PI).abs() < 1e-12);
        assert!((principal_angle(-3.5 * PI) - 0.5 * PI).abs() < 1e-12);
        assert!((principal_angle(-0.5) + 0.5).abs() < 1e-12);
    }

    #[test]
    fn ring_index_brackets_angle() {
        // angle_at(index_for(a)) <= principal(a) < angle_at(...) + delta
        let ring = Ring::new(32);
        let delta = ring.angle_delta();
        for k in 0..200 {
            let angle = -7. + 0.07 * k as f64;
            let ndx = ring.index_for(angle);
            assert!(ndx < ring.size());
            let lo = ring.angle_at(ndx);
            let main = principal_angle(angle);
            assert!(lo <= main + 1e-12, "angle {angle}: {lo} <= {main}");
            assert!(main < lo + delta + 1e-12, "angle {angle}");
        }
    }

    #[test]
    fn ring_relative_indexing_wraps_both_ways() {
        let ring = Ring::new(8);
        assert_eq!(ring.index_relative_to(7, 1), 0);
        assert_eq!(ring.index_relative_to(0, -1), 7);
        assert_eq!(ring.index_relative_to(3, -11), 0);
        assert_eq!(ring.index_relative_to(3, 16), 3);
    }

    #[test]
    fn ring_angle_at_starts_at_minus_pi() {
        let ring = Ring::new(4);
        assert!((ring.angle_at(0) + PI).abs() < 1e-15);
        assert!((ring.angle_at(2) - 0.).abs() < 1e-15);
    }
}
