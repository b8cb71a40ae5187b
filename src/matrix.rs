use std::fmt;
use std::ops::{ Index, IndexMut, Mul };

use crate::feq;
use crate::consts::FEQ_EPSILON;
use crate::error::{ Error, Result };
use crate::tuple::Tuple4D;

/// A square `N`-by-`N` matrix of floats.
///
/// Transformations in the tracer are always `Matrix4D` (`Matrix<4>`); the
/// smaller sizes exist for cofactor expansion. Because the dimension is part
/// of the type, multiplying matrices whose inner dimensions disagree is a
/// compile error rather than a runtime failure.
///
/// Equality through `==` is exact. Use `approx_eq` when comparing the result
/// of a floating point computation.
///
/// # Examples
///
/// ```
/// # use tracer::matrix::Matrix4D;
/// let m = Matrix4D::translation(1.0, 2.0, 3.0) * Matrix4D::scaling(2.0, 2.0, 2.0);
/// let inv = m.inverse().unwrap();
/// assert!((m * inv).approx_eq(&Matrix4D::identity()));
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Matrix<const N: usize> {
    rows: [[f64; N]; N],
}

/// The 4x4 matrix used for every affine transform.
pub type Matrix4D = Matrix<4>;

impl<const N: usize> Default for Matrix<N> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<const N: usize> From<[[f64; N]; N]> for Matrix<N> {
    fn from(rows: [[f64; N]; N]) -> Self {
        Matrix { rows }
    }
}

impl<const N: usize> Index<(usize, usize)> for Matrix<N> {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        &self.rows[row][col]
    }
}

impl<const N: usize> IndexMut<(usize, usize)> for Matrix<N> {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
        &mut self.rows[row][col]
    }
}

impl<const N: usize> Matrix<N> {
    /// A matrix with every element set to `0.0`.
    pub fn zero() -> Self {
        Matrix { rows: [[0.0; N]; N] }
    }

    pub fn identity() -> Self {
        let mut m = Self::zero();
        for i in 0..N {
            m[(i, i)] = 1.0;
        }

        m
    }

    /// Returns the transpose; element `(r, c)` moves to `(c, r)`.
    pub fn transpose(&self) -> Self {
        let mut t = Self::zero();
        for r in 0..N {
            for c in 0..N {
                t[(c, r)] = self[(r, c)];
            }
        }

        t
    }

    /// Element-wise comparison within `FEQ_EPSILON`.
    pub fn approx_eq(&self, other: &Self) -> bool {
        self.rows.iter().flatten()
            .zip(other.rows.iter().flatten())
            .all(|(a, b)| feq(*a, *b))
    }
}

impl Matrix<2> {
    pub fn determinant(&self) -> f64 {
        self[(0, 0)] * self[(1, 1)] - self[(0, 1)] * self[(1, 0)]
    }
}

// Cofactor expansion for an N-by-N matrix whose submatrices are M-by-M.
macro_rules! cofactor_expansion {
    ($n:literal => $m:literal) => {
        impl Matrix<$n> {
            /// Copies the matrix with `row` and `col` removed.
            pub fn submatrix(&self, row: usize, col: usize) -> Matrix<$m> {
                let mut sub = Matrix::<$m>::zero();
                let rows = (0..$n).filter(|&r| r != row);
                for (sr, r) in rows.enumerate() {
                    let cols = (0..$n).filter(|&c| c != col);
                    for (sc, c) in cols.enumerate() {
                        sub[(sr, sc)] = self[(r, c)];
                    }
                }

                sub
            }

            /// Determinant of the submatrix at `row`, `col`.
            pub fn minor(&self, row: usize, col: usize) -> f64 {
                self.submatrix(row, col).determinant()
            }

            /// The minor, negated when `row + col` is odd.
            pub fn cofactor(&self, row: usize, col: usize) -> f64 {
                let minor = self.minor(row, col);
                if (row + col) % 2 == 0 { minor } else { -minor }
            }

            /// Expands along the first row.
            pub fn determinant(&self) -> f64 {
                (0..$n).map(|c| self[(0, c)] * self.cofactor(0, c)).sum()
            }

            pub fn is_invertible(&self) -> bool {
                self.determinant() != 0.0
            }

            /// Inverts the matrix through its cofactors.
            ///
            /// Writing each cofactor to the transposed position performs the
            /// adjugate transpose and the division by the determinant in one
            /// pass. A zero determinant yields `Error::NonInvertible`.
            pub fn inverse(&self) -> Result<Matrix<$n>> {
                let determinant = self.determinant();
                if determinant == 0.0 {
                    return Err(Error::NonInvertible { determinant });
                }

                let mut inv = Matrix::<$n>::zero();
                for r in 0..$n {
                    for c in 0..$n {
                        inv[(c, r)] = self.cofactor(r, c) / determinant;
                    }
                }

                Ok(inv)
            }
        }
    };
}

cofactor_expansion!(3 => 2);
cofactor_expansion!(4 => 3);

impl Matrix4D {
    /// Offsets points by `x`, `y` and `z`. Vectors are unaffected.
    pub fn translation(x: f64, y: f64, z: f64) -> Matrix4D {
        let mut m = Self::identity();
        m[(0, 3)] = x;
        m[(1, 3)] = y;
        m[(2, 3)] = z;

        m
    }

    pub fn scaling(x: f64, y: f64, z: f64) -> Matrix4D {
        let mut m = Self::identity();
        m[(0, 0)] = x;
        m[(1, 1)] = y;
        m[(2, 2)] = z;

        m
    }

    /// Rotation about the X axis by `r` radians.
    ///
    /// ```
    /// # use tracer::tuple::Tuple4D;
    /// # use tracer::matrix::Matrix4D;
    /// let m = Matrix4D::rotation_x(std::f64::consts::FRAC_PI_2);
    /// assert_eq!(m * Tuple4D::point(0.0, 1.0, 0.0), Tuple4D::point(0.0, 0.0, 1.0));
    /// ```
    pub fn rotation_x(r: f64) -> Matrix4D {
        let (sin, cos) = r.sin_cos();
        [
            [1.0, 0.0,  0.0, 0.0],
            [0.0, cos, -sin, 0.0],
            [0.0, sin,  cos, 0.0],
            [0.0, 0.0,  0.0, 1.0],
        ].into()
    }

    /// Rotation about the Y axis by `r` radians.
    pub fn rotation_y(r: f64) -> Matrix4D {
        let (sin, cos) = r.sin_cos();
        [
            [ cos, 0.0, sin, 0.0],
            [ 0.0, 1.0, 0.0, 0.0],
            [-sin, 0.0, cos, 0.0],
            [ 0.0, 0.0, 0.0, 1.0],
        ].into()
    }

    /// Rotation about the Z axis by `r` radians.
    pub fn rotation_z(r: f64) -> Matrix4D {
        let (sin, cos) = r.sin_cos();
        [
            [cos, -sin, 0.0, 0.0],
            [sin,  cos, 0.0, 0.0],
            [0.0,  0.0, 1.0, 0.0],
            [0.0,  0.0, 0.0, 1.0],
        ].into()
    }

    /// A shear, where each parameter moves the first axis in proportion to
    /// the second; `xy` moves `x` in proportion to `y`, and so on.
    ///
    /// ```
    /// # use tracer::tuple::Tuple4D;
    /// # use tracer::matrix::Matrix4D;
    /// let m = Matrix4D::shearing(1.0, 0.0, 0.0, 0.0, 0.0, 0.0);
    /// assert_eq!(m * Tuple4D::point(2.0, 3.0, 4.0), Tuple4D::point(5.0, 3.0, 4.0));
    /// ```
    pub fn shearing(xy: f64, xz: f64, yx: f64, yz: f64, zx: f64, zy: f64)
        -> Matrix4D {
        [
            [1.0,  xy,  xz, 0.0],
            [ yx, 1.0,  yz, 0.0],
            [ zx,  zy, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ].into()
    }

    /// Applies `next` after `self`.
    ///
    /// Transforms read in the order they happen:
    /// `scaling(..).then(rotation_y(..)).then(translation(..))` is
    /// `translation * rotation * scaling`.
    pub fn then(self, next: Matrix4D) -> Matrix4D {
        next * self
    }

    /// Generates a view transformation.
    ///
    /// `from` is the eye, `to` is the point being looked at and `up` roughly
    /// points up. The result moves the *world* relative to the eye.
    ///
    /// If `up` is parallel to the view direction (or `from == to`) there is
    /// no well defined orientation, and `Error::DegenerateView` is returned.
    pub fn view_transform(from: Tuple4D, to: Tuple4D, up: Tuple4D)
        -> Result<Matrix4D> {
        let forward = (to - from).normalize();
        let left = forward.cross(&up.normalize());

        // Also rejects NaN from a zero-length forward or up.
        if !(left.magnitude() > FEQ_EPSILON) {
            return Err(Error::DegenerateView);
        }

        let true_up = left.cross(&forward);
        let orientation: Matrix4D = [
            [    left.x,     left.y,     left.z, 0.0],
            [ true_up.x,  true_up.y,  true_up.z, 0.0],
            [-forward.x, -forward.y, -forward.z, 0.0],
            [       0.0,        0.0,        0.0, 1.0],
        ].into();

        Ok(orientation * Matrix4D::translation(-from.x, -from.y, -from.z))
    }
}

/// Matrix product. Not commutative in general.
impl<const N: usize> Mul<Matrix<N>> for Matrix<N> {
    type Output = Matrix<N>;

    fn mul(self, other: Matrix<N>) -> Matrix<N> {
        let mut res = Matrix::<N>::zero();
        for r in 0..N {
            for c in 0..N {
                res[(r, c)] = (0..N).map(|k| self[(r, k)] * other[(k, c)]).sum();
            }
        }

        res
    }
}

/// Multiplies the tuple as a 4x1 column on the right.
impl Mul<Tuple4D> for Matrix4D {
    type Output = Tuple4D;

    fn mul(self, t: Tuple4D) -> Tuple4D {
        let row = |r: usize| {
            self[(r, 0)] * t.x + self[(r, 1)] * t.y
                + self[(r, 2)] * t.z + self[(r, 3)] * t.w
        };

        Tuple4D::tuple(row(0), row(1), row(2), row(3))
    }
}

impl<const N: usize> fmt::Display for Matrix<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.rows.iter().enumerate() {
            write!(f, "|")?;
            for v in row.iter() {
                write!(f, " {} |", v)?;
            }

            // No trailing newline after the last row
            if i + 1 != N {
                writeln!(f)?;
            }
        }

        Ok(())
    }
}

#[test]
fn identity_is_neutral() {
    let a: Matrix4D = [
        [0.0, 1.0,  2.0,  4.0],
        [1.0, 2.0,  4.0,  8.0],
        [2.0, 4.0,  8.0, 16.0],
        [4.0, 8.0, 16.0, 32.0],
    ].into();

    assert_eq!(Matrix4D::identity() * a, a);
    assert_eq!(a * Matrix4D::identity(), a);
}

#[test]
fn multiply_matrices() {
    let a: Matrix4D = [
        [1.0, 2.0, 3.0, 4.0],
        [5.0, 6.0, 7.0, 8.0],
        [9.0, 8.0, 7.0, 6.0],
        [5.0, 4.0, 3.0, 2.0],
    ].into();
    let b: Matrix4D = [
        [-2.0, 1.0, 2.0,  3.0],
        [ 3.0, 2.0, 1.0, -1.0],
        [ 4.0, 3.0, 6.0,  5.0],
        [ 1.0, 2.0, 7.0,  8.0],
    ].into();
    let p: Matrix4D = [
        [20.0, 22.0,  50.0,  48.0],
        [44.0, 54.0, 114.0, 108.0],
        [40.0, 58.0, 110.0, 102.0],
        [16.0, 26.0,  46.0,  42.0],
    ].into();

    assert_eq!(a * b, p);
}

#[test]
fn multiply_matrix_by_tuple() {
    let a: Matrix4D = [
        [1.0, 2.0, 3.0, 4.0],
        [2.0, 4.0, 4.0, 2.0],
        [8.0, 6.0, 4.0, 1.0],
        [0.0, 0.0, 0.0, 1.0],
    ].into();

    assert_eq!(a * Tuple4D::tuple(1.0, 2.0, 3.0, 1.0),
        Tuple4D::tuple(18.0, 24.0, 33.0, 1.0));
}

#[test]
fn transpose_round_trips() {
    let a: Matrix4D = [
        [0.0, 9.0, 3.0, 0.0],
        [9.0, 8.0, 0.0, 8.0],
        [1.0, 8.0, 5.0, 3.0],
        [0.0, 0.0, 5.0, 8.0],
    ].into();
    let t: Matrix4D = [
        [0.0, 9.0, 1.0, 0.0],
        [9.0, 8.0, 8.0, 0.0],
        [3.0, 0.0, 5.0, 5.0],
        [0.0, 8.0, 3.0, 8.0],
    ].into();

    assert_eq!(a.transpose(), t);
    assert_eq!(t.transpose(), a);
    assert_eq!(Matrix4D::identity().transpose(), Matrix4D::identity());
}

#[test]
fn determinant_2x2() {
    let a: Matrix<2> = [[1.0, 5.0], [-3.0, 2.0]].into();
    assert_eq!(a.determinant(), 17.0);
}

#[test]
fn submatrices() {
    let a: Matrix<3> = [
        [ 1.0, 5.0,  0.0],
        [-3.0, 2.0,  7.0],
        [ 0.0, 6.0, -3.0],
    ].into();
    let s: Matrix<2> = [[-3.0, 2.0], [0.0, 6.0]].into();
    assert_eq!(a.submatrix(0, 2), s);

    let b: Matrix4D = [
        [-6.0, 1.0,  1.0, 6.0],
        [-8.0, 5.0,  8.0, 6.0],
        [-1.0, 0.0,  8.0, 2.0],
        [-7.0, 1.0, -1.0, 1.0],
    ].into();
    let s: Matrix<3> = [
        [-6.0,  1.0, 6.0],
        [-8.0,  8.0, 6.0],
        [-7.0, -1.0, 1.0],
    ].into();
    assert_eq!(b.submatrix(2, 1), s);
}

#[test]
fn minors_and_cofactors_3x3() {
    let a: Matrix<3> = [
        [3.0,  5.0,  0.0],
        [2.0, -1.0, -7.0],
        [6.0, -1.0,  5.0],
    ].into();

    assert_eq!(a.minor(0, 0), -12.0);
    assert_eq!(a.cofactor(0, 0), -12.0);
    assert_eq!(a.minor(1, 0), 25.0);
    assert_eq!(a.cofactor(1, 0), -25.0);
}

#[test]
fn determinant_3x3() {
    let a: Matrix<3> = [
        [ 1.0, 2.0,  6.0],
        [-5.0, 8.0, -4.0],
        [ 2.0, 6.0,  4.0],
    ].into();

    assert_eq!(a.cofactor(0, 0), 56.0);
    assert_eq!(a.cofactor(0, 1), 12.0);
    assert_eq!(a.cofactor(0, 2), -46.0);
    assert_eq!(a.determinant(), -196.0);
}

#[test]
fn determinant_4x4() {
    let a: Matrix4D = [
        [-2.0, -8.0,  3.0,  5.0],
        [-3.0,  1.0,  7.0,  3.0],
        [ 1.0,  2.0, -9.0,  6.0],
        [-6.0,  7.0,  7.0, -9.0],
    ].into();

    assert_eq!(a.cofactor(0, 0), 690.0);
    assert_eq!(a.cofactor(0, 1), 447.0);
    assert_eq!(a.cofactor(0, 2), 210.0);
    assert_eq!(a.cofactor(0, 3), 51.0);
    assert_eq!(a.determinant(), -4071.0);
}

#[test]
fn singular_matrix_is_not_invertible() {
    let a: Matrix4D = [
        [-4.0,  2.0, -2.0, -3.0],
        [ 9.0,  6.0,  2.0,  6.0],
        [ 0.0, -5.0,  1.0, -5.0],
        [ 0.0,  0.0,  0.0,  0.0],
    ].into();

    assert!(!a.is_invertible());
    assert!(matches!(a.inverse(), Err(Error::NonInvertible { .. })));
}

#[test]
fn inverse_4x4() {
    let a: Matrix4D = [
        [ 8.0, -5.0,  9.0,  2.0],
        [ 7.0,  5.0,  6.0,  1.0],
        [-6.0,  0.0,  9.0,  6.0],
        [-3.0,  0.0, -9.0, -4.0],
    ].into();
    let i: Matrix4D = [
        [-0.15385, -0.15385, -0.28205, -0.53846],
        [-0.07692,  0.12308,  0.02564,  0.03077],
        [ 0.35897,  0.35897,  0.43590,  0.92308],
        [-0.69231, -0.69231, -0.76923, -1.92308],
    ].into();

    assert!(a.inverse().unwrap().approx_eq(&i));
}

#[test]
fn inverse_undoes_product_and_itself() {
    let a: Matrix4D = [
        [ 3.0, -9.0,  7.0,  3.0],
        [ 3.0,  8.0,  2.0, -9.0],
        [-4.0,  4.0,  4.0,  1.0],
        [-6.0,  5.0, -1.0,  1.0],
    ].into();
    let b: Matrix4D = [
        [8.0,  2.0, 2.0, 2.0],
        [3.0, -1.0, 7.0, 0.0],
        [7.0,  0.0, 5.0, 4.0],
        [6.0, -2.0, 0.0, 5.0],
    ].into();

    let b_inv = b.inverse().unwrap();
    assert!((a * b * b_inv).approx_eq(&a));
    assert!((b * b_inv).approx_eq(&Matrix4D::identity()));
    assert!(b_inv.inverse().unwrap().approx_eq(&b));
}

#[test]
fn translation_moves_points_not_vectors() {
    let t = Matrix4D::translation(5.0, -3.0, 2.0);
    let p = Tuple4D::point(-3.0, 4.0, 5.0);
    let v = Tuple4D::vector(-3.0, 4.0, 5.0);

    assert_eq!(t * p, Tuple4D::point(2.0, 1.0, 7.0));
    assert_eq!(t.inverse().unwrap() * p, Tuple4D::point(-8.0, 7.0, 3.0));
    assert_eq!(t * v, v);
}

#[test]
fn scaling_and_its_inverse() {
    let s = Matrix4D::scaling(2.0, 3.0, 4.0);
    let v = Tuple4D::vector(-4.0, 6.0, 8.0);

    assert_eq!(s * v, Tuple4D::vector(-8.0, 18.0, 32.0));
    assert_eq!(s.inverse().unwrap() * v, Tuple4D::vector(-2.0, 2.0, 2.0));
    assert_eq!(Matrix4D::scaling(-1.0, 1.0, 1.0) * Tuple4D::point(2.0, 3.0, 4.0),
        Tuple4D::point(-2.0, 3.0, 4.0));
}

#[test]
fn rotations() {
    use std::f64::consts::{ FRAC_PI_2, FRAC_PI_4 };
    let half = 2.0f64.sqrt() / 2.0;

    let p = Tuple4D::point(0.0, 1.0, 0.0);
    assert_eq!(Matrix4D::rotation_x(FRAC_PI_4) * p, Tuple4D::point(0.0, half, half));
    assert_eq!(Matrix4D::rotation_x(FRAC_PI_2) * p, Tuple4D::point(0.0, 0.0, 1.0));
    assert_eq!(Matrix4D::rotation_x(FRAC_PI_4).inverse().unwrap() * p,
        Tuple4D::point(0.0, half, -half));

    let p = Tuple4D::point(0.0, 0.0, 1.0);
    assert_eq!(Matrix4D::rotation_y(FRAC_PI_4) * p, Tuple4D::point(half, 0.0, half));
    assert_eq!(Matrix4D::rotation_y(FRAC_PI_2) * p, Tuple4D::point(1.0, 0.0, 0.0));

    let p = Tuple4D::point(0.0, 1.0, 0.0);
    assert_eq!(Matrix4D::rotation_z(FRAC_PI_4) * p, Tuple4D::point(-half, half, 0.0));
    assert_eq!(Matrix4D::rotation_z(FRAC_PI_2) * p, Tuple4D::point(-1.0, 0.0, 0.0));
}

#[test]
fn shearing_each_axis() {
    let p = Tuple4D::point(2.0, 3.0, 4.0);

    assert_eq!(Matrix4D::shearing(0.0, 1.0, 0.0, 0.0, 0.0, 0.0) * p,
        Tuple4D::point(6.0, 3.0, 4.0));
    assert_eq!(Matrix4D::shearing(0.0, 0.0, 1.0, 0.0, 0.0, 0.0) * p,
        Tuple4D::point(2.0, 5.0, 4.0));
    assert_eq!(Matrix4D::shearing(0.0, 0.0, 0.0, 1.0, 0.0, 0.0) * p,
        Tuple4D::point(2.0, 7.0, 4.0));
    assert_eq!(Matrix4D::shearing(0.0, 0.0, 0.0, 0.0, 1.0, 0.0) * p,
        Tuple4D::point(2.0, 3.0, 6.0));
    assert_eq!(Matrix4D::shearing(0.0, 0.0, 0.0, 0.0, 0.0, 1.0) * p,
        Tuple4D::point(2.0, 3.0, 7.0));
}

#[test]
fn chained_transforms_apply_right_to_left() {
    let a = Matrix4D::rotation_x(std::f64::consts::FRAC_PI_2);
    let b = Matrix4D::scaling(5.0, 5.0, 5.0);
    let c = Matrix4D::translation(10.0, 5.0, 7.0);
    let p = Tuple4D::point(1.0, 0.0, 1.0);

    assert_eq!(c * b * a * p, Tuple4D::point(15.0, 0.0, 7.0));
    assert_eq!(a.then(b).then(c), c * b * a);
}

#[test]
fn default_view_is_identity() {
    let t = Matrix4D::view_transform(
        Tuple4D::point(0.0, 0.0, 0.0),
        Tuple4D::point(0.0, 0.0, -1.0),
        Tuple4D::vector(0.0, 1.0, 0.0),
    ).unwrap();

    assert!(t.approx_eq(&Matrix4D::identity()));
}

#[test]
fn view_looking_down_positive_z() {
    let t = Matrix4D::view_transform(
        Tuple4D::point(0.0, 0.0, 0.0),
        Tuple4D::point(0.0, 0.0, 1.0),
        Tuple4D::vector(0.0, 1.0, 0.0),
    ).unwrap();

    assert!(t.approx_eq(&Matrix4D::scaling(-1.0, 1.0, -1.0)));
}

#[test]
fn view_moves_world() {
    let t = Matrix4D::view_transform(
        Tuple4D::point(0.0, 0.0, 8.0),
        Tuple4D::point(0.0, 0.0, 0.0),
        Tuple4D::vector(0.0, 1.0, 0.0),
    ).unwrap();

    assert!(t.approx_eq(&Matrix4D::translation(0.0, 0.0, -8.0)));
}

#[test]
fn arbitrary_view() {
    let t = Matrix4D::view_transform(
        Tuple4D::point(1.0, 3.0, 2.0),
        Tuple4D::point(4.0, -2.0, 8.0),
        Tuple4D::vector(1.0, 1.0, 0.0),
    ).unwrap();
    let expected: Matrix4D = [
        [-0.50709, 0.50709,  0.67612, -2.36643],
        [ 0.76772, 0.60609,  0.12122, -2.82843],
        [-0.35857, 0.59761, -0.71714,  0.00000],
        [ 0.00000, 0.00000,  0.00000,  1.00000],
    ].into();

    assert!(t.approx_eq(&expected));
}

#[test]
fn view_with_up_parallel_to_forward_fails() {
    let res = Matrix4D::view_transform(
        Tuple4D::point(0.0, 0.0, 0.0),
        Tuple4D::point(0.0, 5.0, 0.0),
        Tuple4D::vector(0.0, 1.0, 0.0),
    );

    assert!(matches!(res, Err(Error::DegenerateView)));
}
