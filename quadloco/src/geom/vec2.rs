use std::ops::{Add, Mul, Neg, Sub};

/// A 2-D vector in raster coordinates: component 0 is row, component 1 is col.
///
/// The null (invalid) value has NaN components; every operation propagates
/// NaN, so invalid inputs produce invalid outputs without special casing.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Vec2 {
    pub row: f64,
    pub col: f64,
}

/// Location in image coordinates (integer values name the top-left corner
/// of the indexed cell; the cell center sits at +0.5 in each axis).
pub type Spot = Vec2;

/// Image gradient; magnitude and direction are edge strength and normal.
pub type Grad = Vec2;

impl Vec2 {
    /// The invalid sentinel (both components NaN).
    pub const NULL: Vec2 = Vec2 {
        row: f64::NAN,
        col: f64::NAN,
    };

    #[inline]
    pub fn new(row: f64, col: f64) -> Self {
        Self { row, col }
    }

    /// True when both components are finite.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.row.is_finite() && self.col.is_finite()
    }

    #[inline]
    pub fn magnitude(&self) -> f64 {
        self.row.hypot(self.col)
    }

    /// Unit vector along self, or the null vector for zero/invalid input.
    #[inline]
    pub fn direction(&self) -> Vec2 {
        let mag = self.magnitude();
        if mag.is_finite() && 0. < mag {
            (1. / mag) * *self
        } else {
            Vec2::NULL
        }
    }

    /// Counter-clockwise quarter turn: (-col, row).
    #[inline]
    pub fn ccw_perp(&self) -> Vec2 {
        Vec2::new(-self.col, self.row)
    }

    /// Angle of this vector via atan2(col, row), in [-pi, +pi).
    #[inline]
    pub fn angle(&self) -> f64 {
        crate::ang::atan2(self.col, self.row)
    }

    /// Unit vector at the given angle.
    #[inline]
    pub fn from_angle(angle: f64) -> Vec2 {
        Vec2::new(angle.cos(), angle.sin())
    }

    /// Componentwise closeness, NaN-rejecting.
    pub fn nearly_equals(&self, other: &Vec2, tol: f64) -> bool {
        (self.row - other.row).abs() <= tol && (self.col - other.col).abs() <= tol
    }
}

/// Scalar dot product.
#[inline]
pub fn dot(a: Vec2, b: Vec2) -> f64 {
    a.row * b.row + a.col * b.col
}

/// 2-D outer product: `a.row*b.col - a.col*b.row` (wedge analog).
#[inline]
pub fn outer(a: Vec2, b: Vec2) -> f64 {
    a.row * b.col - a.col * b.row
}

impl Add for Vec2 {
    type Output = Vec2;
    #[inline]
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.row + rhs.row, self.col + rhs.col)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    #[inline]
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.row - rhs.row, self.col - rhs.col)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    #[inline]
    fn neg(self) -> Vec2 {
        Vec2::new(-self.row, -self.col)
    }
}

impl Mul<Vec2> for f64 {
    type Output = Vec2;
    #[inline]
    fn mul(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self * rhs.row, self * rhs.col)
    }
}
