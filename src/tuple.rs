use std::fmt;
use std::ops::{ Add, Sub, Neg, Mul, Div };

use crate::feq;

/// A homogeneous coordinate.
///
/// Points carry `w == 1.0` and vectors carry `w == 0.0`. The arithmetic
/// operators act on all four components, so the `w` of a result follows the
/// usual affine rules: point - point is a vector, point + vector is a point,
/// and vector +/- vector stays a vector.
///
/// # Examples
///
/// ```
/// # use tracer::tuple::Tuple4D;
/// let from = Tuple4D::point(3.0, 2.0, 1.0);
/// let to = Tuple4D::point(5.0, 6.0, 7.0);
/// assert!((to - from).is_vector());
/// assert!((from + (to - from)).is_point());
/// ```
#[derive(Debug, Default, Copy, Clone)]
pub struct Tuple4D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

/// Component-wise equality within `FEQ_EPSILON`.
impl PartialEq for Tuple4D {
    fn eq(&self, other: &Tuple4D) -> bool {
        feq(self.x, other.x)
            && feq(self.y, other.y)
            && feq(self.z, other.z)
            && feq(self.w, other.w)
    }
}

impl Tuple4D {
    pub fn tuple(x: f64, y: f64, z: f64, w: f64) -> Tuple4D {
        Tuple4D { x, y, z, w }
    }

    pub fn point(x: f64, y: f64, z: f64) -> Tuple4D {
        Tuple4D { x, y, z, w: 1.0 }
    }

    pub fn vector(x: f64, y: f64, z: f64) -> Tuple4D {
        Tuple4D { x, y, z, w: 0.0 }
    }

    /// The point at the origin.
    pub fn origin() -> Tuple4D {
        Tuple4D::point(0.0, 0.0, 0.0)
    }

    pub fn is_point(&self) -> bool {
        self.w == 1.0
    }

    pub fn is_vector(&self) -> bool {
        self.w == 0.0
    }

    /// Returns a copy with `w` forced to `0.0`.
    pub fn as_vector(&self) -> Tuple4D {
        Tuple4D { w: 0.0, ..*self }
    }

    /// Returns a copy with `w` forced to `1.0`.
    pub fn as_point(&self) -> Tuple4D {
        Tuple4D { w: 1.0, ..*self }
    }

    pub fn magnitude(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Scales the tuple to unit length.
    ///
    /// A zero-length tuple produces non-finite components; callers that can
    /// meet one (e.g. a degenerate cross product) check for it themselves.
    pub fn normalize(&self) -> Tuple4D {
        *self / self.magnitude()
    }

    pub fn dot(&self, other: &Tuple4D) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w
    }

    /// Cross product of the `xyz` parts. Always yields a vector.
    pub fn cross(&self, other: &Tuple4D) -> Tuple4D {
        Tuple4D::vector(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Reflects a vector across a normal.
    pub fn reflect(&self, normal: &Tuple4D) -> Tuple4D {
        *self - *normal * (2.0 * self.dot(normal))
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
            && self.z.is_finite() && self.w.is_finite()
    }
}

macro_rules! componentwise {
    ($tr:ident, $method:ident, $op:tt) => {
        impl $tr for Tuple4D {
            type Output = Tuple4D;

            fn $method(self, rhs: Tuple4D) -> Tuple4D {
                Tuple4D {
                    x: self.x $op rhs.x,
                    y: self.y $op rhs.y,
                    z: self.z $op rhs.z,
                    w: self.w $op rhs.w,
                }
            }
        }
    };
}

componentwise!(Add, add, +);
componentwise!(Sub, sub, -);

impl Neg for Tuple4D {
    type Output = Tuple4D;

    fn neg(self) -> Tuple4D {
        self * -1.0
    }
}

impl Mul<f64> for Tuple4D {
    type Output = Tuple4D;

    fn mul(self, s: f64) -> Tuple4D {
        Tuple4D::tuple(self.x * s, self.y * s, self.z * s, self.w * s)
    }
}

/// Scalar left-multiplication, so `t * s == s * t`.
///
/// ```
/// # use tracer::tuple::Tuple4D;
/// let t = Tuple4D::tuple(1.0, 2.0, 3.0, 4.0);
/// assert_eq!(5.0 * t, t * 5.0);
/// ```
impl Mul<Tuple4D> for f64 {
    type Output = Tuple4D;

    fn mul(self, t: Tuple4D) -> Tuple4D {
        t * self
    }
}

impl Div<f64> for Tuple4D {
    type Output = Tuple4D;

    fn div(self, s: f64) -> Tuple4D {
        Tuple4D::tuple(self.x / s, self.y / s, self.z / s, self.w / s)
    }
}

impl fmt::Display for Tuple4D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x, self.y, self.z, self.w)
    }
}

#[test]
fn point_and_vector_tags() {
    let p = Tuple4D::point(4.3, -4.2, 3.1);
    let v = Tuple4D::vector(4.3, -4.2, 3.1);

    assert!(p.is_point() && !p.is_vector());
    assert!(v.is_vector() && !v.is_point());
}

#[test]
fn point_plus_vector_is_point() {
    let p = Tuple4D::point(3.0, -2.0, 5.0);
    let v = Tuple4D::vector(-2.0, 3.0, 1.0);

    let sum = p + v;
    assert!(sum.is_point());
    assert_eq!(sum, Tuple4D::point(1.0, 1.0, 6.0));
}

#[test]
fn point_minus_point_is_vector() {
    let a = Tuple4D::point(3.0, 2.0, 1.0);
    let b = Tuple4D::point(5.0, 6.0, 7.0);

    assert_eq!(a - b, Tuple4D::vector(-2.0, -4.0, -6.0));
}

#[test]
fn point_minus_vector_is_point() {
    let p = Tuple4D::point(3.0, 2.0, 1.0);
    let v = Tuple4D::vector(5.0, 6.0, 7.0);

    assert_eq!(p - v, Tuple4D::point(-2.0, -4.0, -6.0));
}

#[test]
fn negate_and_scale() {
    let a = Tuple4D::tuple(1.0, -2.0, 3.0, -4.0);

    assert_eq!(-a, Tuple4D::tuple(-1.0, 2.0, -3.0, 4.0));
    assert_eq!(a * 3.5, Tuple4D::tuple(3.5, -7.0, 10.5, -14.0));
    assert_eq!(a / 2.0, Tuple4D::tuple(0.5, -1.0, 1.5, -2.0));
}

#[test]
fn magnitude_and_normalize() {
    let v = Tuple4D::vector(1.0, 2.0, 3.0);
    let root = 14.0f64.sqrt();

    assert!(crate::feq(v.magnitude(), root));
    assert!(crate::feq((-v).magnitude(), root));
    assert_eq!(v.normalize(),
        Tuple4D::vector(1.0 / root, 2.0 / root, 3.0 / root));
    assert!(crate::feq(v.normalize().magnitude(), 1.0));
}

#[test]
fn dot_and_cross() {
    let a = Tuple4D::vector(1.0, 2.0, 3.0);
    let b = Tuple4D::vector(2.0, 3.0, 4.0);

    assert_eq!(a.dot(&b), 20.0);
    assert_eq!(a.cross(&b), Tuple4D::vector(-1.0, 2.0, -1.0));
    assert_eq!(b.cross(&a), Tuple4D::vector(1.0, -2.0, 1.0));
}

#[test]
fn reflect_approaching_at_45() {
    let v = Tuple4D::vector(1.0, -1.0, 0.0);
    let n = Tuple4D::vector(0.0, 1.0, 0.0);

    assert_eq!(v.reflect(&n), Tuple4D::vector(1.0, 1.0, 0.0));
}

#[test]
fn reflect_off_slanted_surface() {
    let v = Tuple4D::vector(0.0, -1.0, 0.0);
    let half = 2.0f64.sqrt() / 2.0;
    let n = Tuple4D::vector(half, half, 0.0);

    assert_eq!(v.reflect(&n), Tuple4D::vector(1.0, 0.0, 0.0));
}
