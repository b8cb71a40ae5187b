use std::cmp::Ordering;
use std::ops::Deref;

use crate::consts::{ SURFACE_EPSILON, VACUUM_RI };
use crate::tuple::Tuple4D;
use crate::ray::Ray4D;
use crate::shape::Shape;

/// An intersection.
///
/// `t` is the distance along the ray, and `what` is the shape that was hit.
/// Intersections borrow their shape, so they live no longer than the world
/// being traced.
#[derive(Copy, Clone, Debug)]
pub struct Intersection<'a> {
    pub t: f64,
    pub what: &'a Shape,
}

/// Two intersections are equal when their offsets match and they refer to
/// the *same* shape (pointer equality, not value equality).
impl<'a> PartialEq for Intersection<'a> {
    fn eq(&self, other: &Intersection<'a>) -> bool {
        self.t == other.t && std::ptr::eq(self.what, other.what)
    }
}

impl<'a> Intersection<'a> {
    pub fn new(t: f64, what: &'a Shape) -> Intersection<'a> {
        Intersection { t, what }
    }
}

/// A collection of intersections for a single ray.
#[derive(Clone, Debug, Default)]
pub struct Intersections<'a> {
    pub intersections: Vec<Intersection<'a>>,
}

impl<'a> From<Vec<Intersection<'a>>> for Intersections<'a> {
    fn from(intersections: Vec<Intersection<'a>>) -> Intersections<'a> {
        Intersections { intersections }
    }
}

impl<'a> Deref for Intersections<'a> {
    type Target = [Intersection<'a>];

    fn deref(&self) -> &Self::Target {
        &self.intersections
    }
}

impl<'a> Intersections<'a> {
    pub fn new() -> Intersections<'a> {
        Intersections { intersections: Vec::new() }
    }

    /// Moves every intersection of `other` into this collection.
    pub fn append(&mut self, mut other: Intersections<'a>) {
        self.intersections.append(&mut other.intersections);
    }

    /// Sorts by ascending `t`.
    pub fn sort(&mut self) {
        self.intersections.sort_by(|a, b|
            a.t.partial_cmp(&b.t).unwrap_or(Ordering::Equal)
        );
    }

    /// The visible intersection: the one with the smallest non-negative `t`.
    ///
    /// Returns `None` when the collection is empty or every intersection is
    /// behind the ray origin. An intersection at exactly `t == 0.0` counts.
    /// Non-finite offsets never win.
    pub fn hit(&self) -> Option<Intersection<'a>> {
        self.intersections.iter()
            .filter(|i| i.t >= 0.0 && i.t.is_finite())
            .min_by(|a, b| a.t.partial_cmp(&b.t).unwrap_or(Ordering::Equal))
            .copied()
    }
}

/// State precomputed for shading a single hit.
#[derive(Clone, Debug)]
pub struct IntersectionComputation<'a> {
    /// The distance along the ray to the hit.
    pub t: f64,

    /// The object being intersected.
    pub obj: &'a Shape,

    /// The world-space point where the hit occurs.
    pub point: Tuple4D,

    /// `point` nudged along the normal. Shadow and reflection rays start here
    /// so the surface cannot shadow itself ("acne").
    pub over_point: Tuple4D,

    /// `point` nudged against the normal. Refraction rays start here.
    pub under_point: Tuple4D,

    /// Points back toward the ray origin.
    pub eyev: Tuple4D,

    /// The surface normal, flipped to face the eye when the hit is inside.
    pub normalv: Tuple4D,

    /// The ray direction reflected about the normal.
    pub reflectv: Tuple4D,

    /// Whether the ray origin is inside the object.
    pub inside: bool,

    /// Refractive index of the medium being exited.
    pub n1: f64,

    /// Refractive index of the medium being entered.
    pub n2: f64,
}

impl<'a> IntersectionComputation<'a> {
    /// Precomputes shading state for `hit` along `r`.
    ///
    /// `xs` is the full, ascending list of intersections for `r` (which must
    /// contain `hit`); it is walked to find the refractive indices on either
    /// side of the hit.
    pub fn new(r: &Ray4D, hit: &Intersection<'a>, xs: &[Intersection<'a>])
        -> IntersectionComputation<'a> {
        let t = hit.t;
        let obj = hit.what;
        let point = r.position(t);
        let eyev = -r.direction;
        let mut normalv = obj.normal_at(point);

        let inside = normalv.dot(&eyev) < 0.0;
        if inside {
            normalv = -normalv;
        }

        let over_point = point + normalv * SURFACE_EPSILON;
        let under_point = point - normalv * SURFACE_EPSILON;
        let reflectv = r.direction.reflect(&normalv);
        let (n1, n2) = Self::refraction_indices(hit, xs);

        IntersectionComputation {
            t, obj,
            point, over_point, under_point,
            eyev, normalv, reflectv,
            inside,
            n1, n2,
        }
    }

    /// Walks the intersections in order, tracking which objects the ray is
    /// currently inside. An object is entered at its first intersection and
    /// left at its next one.
    fn refraction_indices(hit: &Intersection<'a>, xs: &[Intersection<'a>])
        -> (f64, f64) {
        let mut containers: Vec<&'a Shape> = Vec::new();
        let innermost = |containers: &[&Shape]| {
            containers.last()
                .map_or(VACUUM_RI, |s| s.material.refractive_index)
        };

        for i in xs.iter() {
            let n1 = innermost(&containers);

            let entered = containers.iter()
                .position(|&s| std::ptr::eq(s, i.what));
            match entered {
                Some(j) => { containers.remove(j); },
                None => containers.push(i.what),
            }

            if i == hit {
                return (n1, innermost(&containers));
            }
        }

        (VACUUM_RI, VACUUM_RI)
    }

    /// Fraction of light reflected at this hit (Schlick's approximation to
    /// the Fresnel equations).
    ///
    /// Moving into a less dense medium past the critical angle gives total
    /// internal reflection, and exactly `1.0`.
    pub fn schlick(&self) -> f64 {
        let mut cos = self.eyev.dot(&self.normalv);

        if self.n1 > self.n2 {
            let n = self.n1 / self.n2;
            let sin2_t = n.powi(2) * (1.0 - cos.powi(2));
            if sin2_t > 1.0 {
                return 1.0;
            }

            // Use cos(theta_t) when leaving the denser medium
            cos = (1.0 - sin2_t).sqrt();
        }

        let r0 = ((self.n1 - self.n2) / (self.n1 + self.n2)).powi(2);
        r0 + (1.0 - r0) * (1.0 - cos).powi(5)
    }
}

#[test]
fn hit_with_all_positive() {
    let s = Shape::sphere();
    let i1 = Intersection::new(1.0, &s);
    let i2 = Intersection::new(2.0, &s);
    let xs: Intersections = vec![i2, i1].into();

    assert_eq!(xs.hit(), Some(i1));
}

#[test]
fn hit_with_some_negative() {
    let s = Shape::sphere();
    let i1 = Intersection::new(-1.0, &s);
    let i2 = Intersection::new(1.0, &s);
    let xs: Intersections = vec![i2, i1].into();

    assert_eq!(xs.hit(), Some(i2));
}

#[test]
fn hit_with_all_negative() {
    let s = Shape::sphere();
    let xs: Intersections = vec![
        Intersection::new(-2.0, &s),
        Intersection::new(-1.0, &s),
    ].into();

    assert_eq!(xs.hit(), None);
}

#[test]
fn hit_on_empty_list() {
    assert_eq!(Intersections::new().hit(), None);
}

#[test]
fn hit_is_lowest_nonnegative() {
    let s = Shape::sphere();
    let i1 = Intersection::new(5.0, &s);
    let i2 = Intersection::new(7.0, &s);
    let i3 = Intersection::new(-3.0, &s);
    let i4 = Intersection::new(2.0, &s);
    let xs: Intersections = vec![i1, i2, i3, i4].into();

    assert_eq!(xs.hit(), Some(i4));
}

#[test]
fn hit_at_zero_counts() {
    let s = Shape::sphere();
    let i1 = Intersection::new(0.0, &s);
    let i2 = Intersection::new(3.0, &s);
    let xs: Intersections = vec![i2, i1].into();

    assert_eq!(xs.hit(), Some(i1));
}

#[test]
fn precompute_outside_intersection() {
    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, -5.0),
        Tuple4D::vector(0.0, 0.0, 1.0),
    );
    let shape = Shape::sphere();
    let i = Intersection::new(4.0, &shape);

    let comps = IntersectionComputation::new(&r, &i, &[i]);

    assert!(std::ptr::eq(comps.obj, i.what));
    assert_eq!(comps.t, i.t);
    assert_eq!(comps.point, Tuple4D::point(0.0, 0.0, -1.0));
    assert_eq!(comps.eyev, Tuple4D::vector(0.0, 0.0, -1.0));
    assert_eq!(comps.normalv, Tuple4D::vector(0.0, 0.0, -1.0));
    assert!(!comps.inside);
}

#[test]
fn precompute_inside_intersection() {
    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, 0.0),
        Tuple4D::vector(0.0, 0.0, 1.0),
    );
    let shape = Shape::sphere();
    let i = Intersection::new(1.0, &shape);

    let comps = IntersectionComputation::new(&r, &i, &[i]);

    assert!(comps.inside);
    assert_eq!(comps.point, Tuple4D::point(0.0, 0.0, 1.0));
    assert_eq!(comps.eyev, Tuple4D::vector(0.0, 0.0, -1.0));
    // Flipped to face the eye
    assert_eq!(comps.normalv, Tuple4D::vector(0.0, 0.0, -1.0));
}

#[test]
fn precompute_reflection_vector() {
    use crate::matrix::Matrix4D;

    let half = 2.0f64.sqrt() / 2.0;
    let shape = Shape::plane();
    let r = Ray4D::new(
        Tuple4D::point(0.0, 1.0, -1.0),
        Tuple4D::vector(0.0, -half, half),
    );
    let i = Intersection::new(2.0f64.sqrt(), &shape);

    let comps = IntersectionComputation::new(&r, &i, &[i]);
    assert_eq!(comps.reflectv, Tuple4D::vector(0.0, half, half));
    assert_eq!(*shape.transform(), Matrix4D::identity());
}

#[test]
fn over_point_sits_above_surface() {
    use crate::matrix::Matrix4D;

    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, -5.0),
        Tuple4D::vector(0.0, 0.0, 1.0),
    );
    let shape = Shape::sphere()
        .with_transform(Matrix4D::translation(0.0, 0.0, 1.0))
        .unwrap();
    let i = Intersection::new(5.0, &shape);

    let comps = IntersectionComputation::new(&r, &i, &[i]);
    assert!(comps.over_point.z < -SURFACE_EPSILON / 2.0);
    assert!(comps.point.z > comps.over_point.z);
}

#[test]
fn under_point_sits_below_surface() {
    use crate::matrix::Matrix4D;

    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, -5.0),
        Tuple4D::vector(0.0, 0.0, 1.0),
    );
    let shape = Shape::glass_sphere()
        .with_transform(Matrix4D::translation(0.0, 0.0, 1.0))
        .unwrap();
    let i = Intersection::new(5.0, &shape);

    let comps = IntersectionComputation::new(&r, &i, &[i]);
    assert!(comps.under_point.z > SURFACE_EPSILON / 2.0);
    assert!(comps.point.z < comps.under_point.z);
}

#[test]
fn refractive_indices_for_nested_spheres() {
    use crate::matrix::Matrix4D;

    let mut a = Shape::glass_sphere()
        .with_transform(Matrix4D::scaling(2.0, 2.0, 2.0))
        .unwrap();
    a.material.refractive_index = 1.5;

    let mut b = Shape::glass_sphere()
        .with_transform(Matrix4D::translation(0.0, 0.0, -0.25))
        .unwrap();
    b.material.refractive_index = 2.0;

    let mut c = Shape::glass_sphere()
        .with_transform(Matrix4D::translation(0.0, 0.0, 0.25))
        .unwrap();
    c.material.refractive_index = 2.5;

    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, -4.0),
        Tuple4D::vector(0.0, 0.0, 1.0),
    );
    let xs = vec![
        Intersection::new(2.0, &a),
        Intersection::new(2.75, &b),
        Intersection::new(3.25, &c),
        Intersection::new(4.75, &b),
        Intersection::new(5.25, &c),
        Intersection::new(6.0, &a),
    ];
    let expected = [
        (1.0, 1.5), (1.5, 2.0), (2.0, 2.5),
        (2.5, 2.5), (2.5, 1.5), (1.5, 1.0),
    ];

    for (i, (n1, n2)) in xs.iter().zip(expected.iter()) {
        let comps = IntersectionComputation::new(&r, i, &xs);
        assert_eq!(comps.n1, *n1);
        assert_eq!(comps.n2, *n2);
    }
}

#[test]
fn schlick_under_total_internal_reflection() {
    let half = 2.0f64.sqrt() / 2.0;
    let shape = Shape::glass_sphere();
    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, half),
        Tuple4D::vector(0.0, 1.0, 0.0),
    );
    let xs = vec![
        Intersection::new(-half, &shape),
        Intersection::new(half, &shape),
    ];

    let comps = IntersectionComputation::new(&r, &xs[1], &xs);
    assert_eq!(comps.schlick(), 1.0);
}

#[test]
fn schlick_with_perpendicular_ray() {
    let shape = Shape::glass_sphere();
    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, 0.0),
        Tuple4D::vector(0.0, 1.0, 0.0),
    );
    let xs = vec![
        Intersection::new(-1.0, &shape),
        Intersection::new(1.0, &shape),
    ];

    let comps = IntersectionComputation::new(&r, &xs[1], &xs);
    assert!(crate::feq(comps.schlick(), 0.04));
}

#[test]
fn schlick_with_small_angle_and_denser_second_medium() {
    let shape = Shape::glass_sphere();
    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.99, -2.0),
        Tuple4D::vector(0.0, 0.0, 1.0),
    );
    let xs = vec![Intersection::new(1.8589, &shape)];

    let comps = IntersectionComputation::new(&r, &xs[0], &xs);
    assert!(crate::feq(comps.schlick(), 0.48873));
}
