use super::vec2::{dot, outer, Vec2};

/// A ray: start point plus unit direction.
///
/// For edge rays the direction is the image gradient direction, i.e. the
/// normal of the physical edge, so `distance_along` of a point measures how
/// far the point sits off the edge line.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Ray {
    start: Vec2,
    dir: Vec2,
}

impl Ray {
    pub const NULL: Ray = Ray {
        start: Vec2::NULL,
        dir: Vec2::NULL,
    };

    /// Construct from a start point and any (not necessarily unit) direction.
    pub fn new(start: Vec2, dir_vec: Vec2) -> Self {
        Self {
            start,
            dir: dir_vec.direction(),
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.start.is_valid() && self.dir.is_valid()
    }

    #[inline]
    pub fn start(&self) -> Vec2 {
        self.start
    }

    #[inline]
    pub fn direction(&self) -> Vec2 {
        self.dir
    }

    /// Quarter-turn (CCW) of the ray direction.
    #[inline]
    pub fn ortho_direction(&self) -> Vec2 {
        self.dir.ccw_perp()
    }

    /// Signed distance of the projection of `pnt` along the ray direction.
    #[inline]
    pub fn distance_along(&self, pnt: Vec2) -> f64 {
        dot(pnt - self.start, self.dir)
    }

    /// Signed perpendicular distance of `pnt` from the ray line.
    #[inline]
    pub fn distance_from(&self, pnt: Vec2) -> f64 {
        outer(self.dir, pnt - self.start)
    }

    /// Component of `pnt - start` parallel to the ray.
    #[inline]
    pub fn projection_of(&self, pnt: Vec2) -> Vec2 {
        self.distance_along(pnt) * self.dir
    }

    /// True when `pnt` projects at non-negative distance along the ray.
    #[inline]
    pub fn is_ahead(&self, pnt: Vec2) -> bool {
        !self.is_behind(pnt)
    }

    #[inline]
    pub fn is_behind(&self, pnt: Vec2) -> bool {
        self.distance_along(pnt) < 0.
    }
}

/// True when each ray's start lies within `tol` of the other ray's line.
pub fn nearly_collinear(ray1: &Ray, ray2: &Ray, tol: f64) -> bool {
    let d12 = ray1.distance_along(ray2.start()).abs();
    let d21 = ray2.distance_along(ray1.start()).abs();
    d12.max(d21) < tol
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_is_normalized() {
        let ray = Ray::new(Vec2::new(1., 2.), Vec2::new(0., 5.));
        assert!((ray.direction().magnitude() - 1.).abs() < 1e-12);
    }

    #[test]
    fn along_and_from_decompose_offset() {
        // |project|^2 + |reject|^2 == |p - start|^2
        let ray = Ray::new(Vec2::new(3., -2.), Vec2::new(1., 2.));
        for (pr, pc) in [(0., 0.), (5., 1.), (-4., 7.5), (3., -2.)] {
            let p = Vec2::new(pr, pc);
            let along = ray.distance_along(p);
            let from = ray.distance_from(p);
            let off = p - ray.start();
            let lhs = along * along + from * from;
            let rhs = dot(off, off);
            assert!((lhs - rhs).abs() < 1e-9, "p = {p:?}");
        }
    }

    #[test]
    fn ahead_behind_split_at_start() {
        let ray = Ray::new(Vec2::new(0., 0.), Vec2::new(1., 0.));
        assert!(ray.is_ahead(Vec2::new(2., 3.)));
        assert!(ray.is_behind(Vec2::new(-0.1, 3.)));
        assert!(ray.is_ahead(Vec2::new(0., -9.)));
    }

    #[test]
    fn invalid_parts_make_invalid_ray() {
        assert!(!Ray::new(Vec2::NULL, Vec2::new(1., 0.)).is_valid());
        assert!(!Ray::new(Vec2::new(0., 0.), Vec2::new(0., 0.)).is_valid());
    }

    #[test]
    fn collinear_rays_detected() {
        let r1 = Ray::new(Vec2::new(0., 0.), Vec2::new(0., 1.));
        let r2 = Ray::new(Vec2::new(0., 5.), Vec2::new(0., 1.));
        // r2 starts on r1's line only if distance along gradient is small;
        // here both rays run along +col so each start projects 5 ahead.
        assert!(!nearly_collinear(&r1, &r2, 2.));
        let r3 = Ray::new(Vec2::new(5., 0.), Vec2::new(0., 1.));
        // r3 start is sideways from r1: zero distance along r1 direction.
        assert!(nearly_collinear(&r1, &r3, 2.));
    }
}
