use crate::tuple::Tuple4D;
use crate::matrix::Matrix4D;
use crate::shape::Shape;
use crate::intersect::Intersections;

/// A ray with an origin point and a direction vector.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Ray4D {
    pub origin: Tuple4D,
    pub direction: Tuple4D,
}

impl Ray4D {
    /// Creates a ray. The `w` components are forced so that `origin` is a
    /// point and `direction` is a vector.
    pub fn new(origin: Tuple4D, direction: Tuple4D) -> Ray4D {
        Ray4D {
            origin: origin.as_point(),
            direction: direction.as_vector(),
        }
    }

    /// The point at distance `t` along the ray.
    pub fn position(&self, t: f64) -> Tuple4D {
        self.origin + self.direction * t
    }

    pub fn transform(&self, m: &Matrix4D) -> Ray4D {
        Ray4D {
            origin: *m * self.origin,
            direction: *m * self.direction,
        }
    }

    /// Intersects this ray with a shape, in the shape's object space.
    pub fn intersects<'a>(&self, shape: &'a Shape) -> Intersections<'a> {
        shape.local_intersect(&self.transform(shape.inverse_transform()))
    }
}

#[test]
fn ray_position() {
    let r = Ray4D::new(
        Tuple4D::point(2.0, 3.0, 4.0),
        Tuple4D::vector(1.0, 0.0, 0.0),
    );

    assert_eq!(r.position(0.0), Tuple4D::point(2.0, 3.0, 4.0));
    assert_eq!(r.position(1.0), Tuple4D::point(3.0, 3.0, 4.0));
    assert_eq!(r.position(-1.0), Tuple4D::point(1.0, 3.0, 4.0));
    assert_eq!(r.position(2.5), Tuple4D::point(4.5, 3.0, 4.0));
}

#[test]
fn ray_translation() {
    let r = Ray4D::new(
        Tuple4D::point(1.0, 2.0, 3.0),
        Tuple4D::vector(0.0, 1.0, 0.0),
    );
    let t = r.transform(&Matrix4D::translation(3.0, 4.0, 5.0));

    assert_eq!(t.origin, Tuple4D::point(4.0, 6.0, 8.0));
    assert_eq!(t.direction, Tuple4D::vector(0.0, 1.0, 0.0));
}

#[test]
fn ray_scaling() {
    let r = Ray4D::new(
        Tuple4D::point(1.0, 2.0, 3.0),
        Tuple4D::vector(0.0, 1.0, 0.0),
    );
    let t = r.transform(&Matrix4D::scaling(2.0, 3.0, 4.0));

    assert_eq!(t.origin, Tuple4D::point(2.0, 6.0, 12.0));
    assert_eq!(t.direction, Tuple4D::vector(0.0, 3.0, 0.0));
}

#[test]
fn intersect_scaled_sphere() {
    let mut s = Shape::sphere();
    s.set_transform(Matrix4D::scaling(2.0, 2.0, 2.0)).unwrap();
    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, -5.0),
        Tuple4D::vector(0.0, 0.0, 1.0),
    );

    let xs = r.intersects(&s);
    assert_eq!(xs.len(), 2);
    assert_eq!(xs[0].t, 3.0);
    assert_eq!(xs[1].t, 7.0);
}

#[test]
fn intersect_translated_sphere() {
    let mut s = Shape::sphere();
    s.set_transform(Matrix4D::translation(5.0, 0.0, 0.0)).unwrap();
    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, -5.0),
        Tuple4D::vector(0.0, 0.0, 1.0),
    );

    assert!(r.intersects(&s).is_empty());
}
