use super::vec2::{dot, Vec2};

/// A circle in raster coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f64,
}

impl Circle {
    pub fn new(center: Vec2, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Circle circumscribing an high x wide raster: centered at (h/2, w/2)
    /// with radius half the diagonal.
    pub fn circumscribing(high: usize, wide: usize) -> Self {
        let corner = Vec2::new(high as f64, wide as f64);
        Self {
            center: 0.5 * corner,
            radius: 0.5 * corner.magnitude(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.center.is_valid() && self.radius.is_finite() && 0. < self.radius
    }
}

/// Intersections of a line with a circle.
pub struct CircleIntersector {
    pub circle: Circle,
}

impl CircleIntersector {
    /// Both intersection spots of the line through `line_pnt` along
    /// `line_dir`, ordered along the (normalized) direction. Returns null
    /// spots when the line misses the circle.
    pub fn intersections(&self, line_pnt: Vec2, line_dir: Vec2) -> (Vec2, Vec2) {
        let dir = line_dir.direction();
        if !dir.is_valid() {
            return (Vec2::NULL, Vec2::NULL);
        }

        // unit direction suppresses the quadratic coefficient
        let wvec = line_pnt - self.circle.center;
        let beta = dot(wvec, dir);
        let gamma = dot(wvec, wvec) - self.circle.radius * self.circle.radius;
        let radicand = beta * beta - gamma;
        if radicand < 0. {
            return (Vec2::NULL, Vec2::NULL);
        }

        let root = radicand.sqrt();
        let lam_neg = -beta - root;
        let lam_pos = -beta + root;
        (line_pnt + lam_neg * dir, line_pnt + lam_pos * dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circumscribing_covers_corners() {
        let circle = Circle::circumscribing(6, 8);
        assert!(circle.center.nearly_equals(&Vec2::new(3., 4.), 1e-12));
        assert!((circle.radius - 5.).abs() < 1e-12);
    }

    #[test]
    fn chord_through_center_hits_antipodes() {
        let circle = Circle::new(Vec2::new(0., 0.), 2.);
        let cut = CircleIntersector { circle };
        let (a, b) = cut.intersections(Vec2::new(0., 0.), Vec2::new(0., 1.));
        assert!(a.nearly_equals(&Vec2::new(0., -2.), 1e-12));
        assert!(b.nearly_equals(&Vec2::new(0., 2.), 1e-12));
    }

    #[test]
    fn miss_returns_null_spots() {
        let circle = Circle::new(Vec2::new(0., 0.), 1.);
        let cut = CircleIntersector { circle };
        let (a, b) = cut.intersections(Vec2::new(5., 0.), Vec2::new(0., 1.));
        assert!(!a.is_valid());
        assert!(!b.is_valid());
    }

    #[test]
    fn tangent_line_yields_double_root() {
        let circle = Circle::new(Vec2::new(0., 0.), 1.);
        let cut = CircleIntersector { circle };
        let (a, b) = cut.intersections(Vec2::new(1., 0.), Vec2::new(0., 1.));
        assert!(a.nearly_equals(&b, 1e-9));
        assert!(a.nearly_equals(&Vec2::new(1., 0.), 1e-9));
    }
}
