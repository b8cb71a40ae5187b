use crate::consts::{ PLANE_EPSILON, GLASS_RI };
use crate::error::Result;
use crate::tuple::Tuple4D;
use crate::matrix::Matrix4D;
use crate::ray::Ray4D;
use crate::light::Material;
use crate::intersect::{ Intersection, Intersections };

/// The geometric primitives a `Shape` can be.
///
/// Each variant answers the same two questions in object space: where does a
/// ray hit it (`Shape::local_intersect`) and what is the surface normal at a
/// point (`Shape::local_normal_at`). New primitives are added here.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ShapeKind {
    /// A unit sphere with its center at the object-space origin.
    Sphere,

    /// The object-space XZ plane, with its normal pointing up along Y.
    Plane,
}

/// A primitive placed in the world.
///
/// The transform maps object space to world space. Its inverse is computed
/// once when the transform is assigned; a non-invertible transform is
/// rejected there, so intersecting and shading never have to handle it.
#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    pub kind: ShapeKind,
    pub material: Material,

    transform: Matrix4D,
    inverse: Matrix4D,
}

impl Shape {
    /// Creates a shape with identity transform and default material.
    pub fn new(kind: ShapeKind) -> Shape {
        Shape {
            kind,
            material: Default::default(),
            transform: Matrix4D::identity(),
            inverse: Matrix4D::identity(),
        }
    }

    pub fn sphere() -> Shape {
        Shape::new(ShapeKind::Sphere)
    }

    pub fn plane() -> Shape {
        Shape::new(ShapeKind::Plane)
    }

    /// A fully transparent unit sphere with the refractive index of glass.
    pub fn glass_sphere() -> Shape {
        let mut s = Shape::sphere();
        s.material.transparency = 1.0;
        s.material.refractive_index = GLASS_RI;

        s
    }

    /// Builder form of `set_transform`.
    pub fn with_transform(mut self, transform: Matrix4D) -> Result<Shape> {
        self.set_transform(transform)?;
        Ok(self)
    }

    /// Scales the shape uniformly about its origin.
    ///
    /// The inverse is written out directly rather than solved for, so this
    /// cannot fail for a non-zero `factor`.
    pub(crate) fn with_scaling(mut self, factor: f64) -> Shape {
        debug_assert!(factor != 0.0, "cannot scale a shape to nothing");

        self.transform = Matrix4D::scaling(factor, factor, factor);
        self.inverse = Matrix4D::scaling(1.0 / factor, 1.0 / factor, 1.0 / factor);
        self
    }

    pub fn with_material(mut self, material: Material) -> Shape {
        self.material = material;
        self
    }

    pub fn transform(&self) -> &Matrix4D {
        &self.transform
    }

    /// The cached world-to-object matrix.
    pub fn inverse_transform(&self) -> &Matrix4D {
        &self.inverse
    }

    /// Sets the object-to-world transform.
    ///
    /// Fails with `Error::NonInvertible` and leaves the shape unchanged if
    /// `transform` has no inverse.
    pub fn set_transform(&mut self, transform: Matrix4D) -> Result<()> {
        self.inverse = transform.inverse()?;
        self.transform = transform;

        Ok(())
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn material_mut(&mut self) -> &mut Material {
        &mut self.material
    }

    /// Converts a point from world to object space.
    pub fn world_to_object(&self, point: Tuple4D) -> Tuple4D {
        self.inverse * point
    }

    /// Converts an object-space normal to a world-space unit normal.
    ///
    /// Normals are carried by the transpose of the inverse so they stay
    /// perpendicular under non-uniform scaling. The translation column of
    /// that matrix can leak into `w`, which is reset before normalizing.
    pub fn normal_to_world(&self, normal: Tuple4D) -> Tuple4D {
        (self.inverse.transpose() * normal).as_vector().normalize()
    }

    /// The world-space surface normal at a world-space point.
    pub fn normal_at(&self, world_point: Tuple4D) -> Tuple4D {
        let local_point = self.world_to_object(world_point);
        self.normal_to_world(self.local_normal_at(&local_point))
    }

    /// Intersects an object-space ray with this shape.
    ///
    /// Intersections are returned unfiltered (negative `t` included) in
    /// ascending order of `t`.
    pub fn local_intersect(&self, ray: &Ray4D) -> Intersections {
        match self.kind {
            ShapeKind::Sphere => self.intersect_sphere(ray),
            ShapeKind::Plane => self.intersect_plane(ray),
        }
    }

    /// The object-space normal at an object-space point.
    pub fn local_normal_at(&self, at: &Tuple4D) -> Tuple4D {
        match self.kind {
            // The sphere sits at the origin, so the normal is the point itself.
            ShapeKind::Sphere => (*at - Tuple4D::origin()).as_vector(),
            ShapeKind::Plane => Tuple4D::vector(0.0, 1.0, 0.0),
        }
    }

    /// Two intersections when the ray meets the sphere (equal when it is
    /// tangent), none otherwise.
    fn intersect_sphere(&self, ray: &Ray4D) -> Intersections {
        let sphere_to_ray = ray.origin - Tuple4D::origin();

        let a = ray.direction.dot(&ray.direction);
        let b = 2.0 * ray.direction.dot(&sphere_to_ray);
        let c = sphere_to_ray.dot(&sphere_to_ray) - 1.0;

        let discriminant = b.powi(2) - 4.0 * a * c;
        if discriminant < 0.0 {
            return Intersections::new();
        }

        let root = discriminant.sqrt();
        let t1 = (-b - root) / (2.0 * a);
        let t2 = (-b + root) / (2.0 * a);

        vec![Intersection::new(t1, self), Intersection::new(t2, self)].into()
    }

    /// A ray with (almost) no Y component is parallel to the plane or lies
    /// in it; either way it is treated as a miss.
    fn intersect_plane(&self, ray: &Ray4D) -> Intersections {
        if ray.direction.y.abs() < PLANE_EPSILON {
            return Intersections::new();
        }

        let t = -ray.origin.y / ray.direction.y;
        vec![Intersection::new(t, self)].into()
    }
}

/// Intersects a world-space ray with a shape.
pub fn intersect<'a>(shape: &'a Shape, ray: &Ray4D) -> Intersections<'a> {
    ray.intersects(shape)
}

#[test]
fn default_shape_state() {
    let s = Shape::sphere();

    assert_eq!(*s.transform(), Matrix4D::identity());
    assert_eq!(s.material, Material::default());
}

#[test]
fn singular_transform_is_rejected() {
    let mut s = Shape::sphere();
    s.set_transform(Matrix4D::translation(2.0, 3.0, 4.0)).unwrap();

    assert!(s.set_transform(Matrix4D::scaling(0.0, 1.0, 1.0)).is_err());
    assert_eq!(*s.transform(), Matrix4D::translation(2.0, 3.0, 4.0));
}

#[test]
fn uniform_scaling_matches_solved_inverse() {
    let s = Shape::sphere().with_scaling(0.5);
    let solved = Shape::sphere()
        .with_transform(Matrix4D::scaling(0.5, 0.5, 0.5))
        .unwrap();

    assert_eq!(s.transform(), solved.transform());
    assert!(s.inverse_transform().approx_eq(solved.inverse_transform()));
}

#[test]
fn ray_intersects_sphere_at_two_points() {
    let s = Shape::sphere();
    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, -5.0),
        Tuple4D::vector(0.0, 0.0, 1.0),
    );

    let xs = r.intersects(&s);
    assert_eq!(xs.len(), 2);
    assert_eq!(xs[0].t, 4.0);
    assert_eq!(xs[1].t, 6.0);
    assert!(std::ptr::eq(xs[0].what, &s));
}

#[test]
fn ray_is_tangent_to_sphere() {
    let s = Shape::sphere();
    let r = Ray4D::new(
        Tuple4D::point(0.0, 1.0, -5.0),
        Tuple4D::vector(0.0, 0.0, 1.0),
    );

    let xs = r.intersects(&s);
    assert_eq!(xs.len(), 2);
    assert_eq!(xs[0].t, 5.0);
    assert_eq!(xs[1].t, 5.0);
}

#[test]
fn ray_misses_sphere() {
    let s = Shape::sphere();
    let r = Ray4D::new(
        Tuple4D::point(0.0, 2.0, -5.0),
        Tuple4D::vector(0.0, 0.0, 1.0),
    );

    assert!(r.intersects(&s).is_empty());
}

#[test]
fn ray_is_inside_sphere() {
    let s = Shape::sphere();
    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, 0.0),
        Tuple4D::vector(0.0, 0.0, 1.0),
    );

    let xs = s.local_intersect(&r);
    assert_eq!(xs.len(), 2);
    assert_eq!(xs[0].t, -1.0);
    assert_eq!(xs[1].t, 1.0);
}

#[test]
fn sphere_is_behind_ray() {
    let s = Shape::sphere();
    let r = Ray4D::new(
        Tuple4D::point(0.0, 0.0, 5.0),
        Tuple4D::vector(0.0, 0.0, 1.0),
    );

    let xs = r.intersects(&s);
    assert_eq!(xs.len(), 2);
    assert_eq!(xs[0].t, -6.0);
    assert_eq!(xs[1].t, -4.0);
}

#[test]
fn plane_ignores_parallel_and_coplanar_rays() {
    let p = Shape::plane();
    let parallel = Ray4D::new(
        Tuple4D::point(0.0, 10.0, 0.0),
        Tuple4D::vector(0.0, 0.0, 1.0),
    );
    let coplanar = Ray4D::new(
        Tuple4D::point(0.0, 0.0, 0.0),
        Tuple4D::vector(0.0, 0.0, 1.0),
    );

    assert!(p.local_intersect(&parallel).is_empty());
    assert!(p.local_intersect(&coplanar).is_empty());
}

#[test]
fn ray_intersecting_plane_from_above_and_below() {
    let p = Shape::plane();
    let above = Ray4D::new(
        Tuple4D::point(0.0, 1.0, 0.0),
        Tuple4D::vector(0.0, -1.0, 0.0),
    );
    let below = Ray4D::new(
        Tuple4D::point(0.0, -1.0, 0.0),
        Tuple4D::vector(0.0, 1.0, 0.0),
    );

    let xs = p.local_intersect(&above);
    assert_eq!(xs.len(), 1);
    assert_eq!(xs[0].t, 1.0);

    let xs = p.local_intersect(&below);
    assert_eq!(xs.len(), 1);
    assert_eq!(xs[0].t, 1.0);
}

#[test]
fn plane_normal_is_constant() {
    let p = Shape::plane();
    let up = Tuple4D::vector(0.0, 1.0, 0.0);

    assert_eq!(p.local_normal_at(&Tuple4D::point(0.0, 0.0, 0.0)), up);
    assert_eq!(p.local_normal_at(&Tuple4D::point(10.0, 0.0, -10.0)), up);
    assert_eq!(p.local_normal_at(&Tuple4D::point(-5.0, 0.0, 150.0)), up);
}

#[test]
fn normals_on_unit_sphere() {
    let s = Shape::sphere();
    let k = 3.0f64.sqrt() / 3.0;

    assert_eq!(s.normal_at(Tuple4D::point(1.0, 0.0, 0.0)),
        Tuple4D::vector(1.0, 0.0, 0.0));
    assert_eq!(s.normal_at(Tuple4D::point(0.0, 1.0, 0.0)),
        Tuple4D::vector(0.0, 1.0, 0.0));
    assert_eq!(s.normal_at(Tuple4D::point(0.0, 0.0, 1.0)),
        Tuple4D::vector(0.0, 0.0, 1.0));

    let n = s.normal_at(Tuple4D::point(k, k, k));
    assert_eq!(n, Tuple4D::vector(k, k, k));
    assert_eq!(n, n.normalize());
}

#[test]
fn normal_on_translated_sphere() {
    let s = Shape::sphere()
        .with_transform(Matrix4D::translation(0.0, 1.0, 0.0))
        .unwrap();
    let n = s.normal_at(Tuple4D::point(0.0, 1.70711, -0.70711));

    assert_eq!(n, Tuple4D::vector(0.0, 0.70711, -0.70711));
    assert!(n.is_vector());
}

#[test]
fn normal_on_scaled_and_rotated_sphere() {
    let half = 2.0f64.sqrt() / 2.0;
    let s = Shape::sphere()
        .with_transform(Matrix4D::scaling(1.0, 0.5, 1.0)
            * Matrix4D::rotation_z(std::f64::consts::PI / 5.0))
        .unwrap();
    let n = s.normal_at(Tuple4D::point(0.0, half, -half));

    assert_eq!(n, Tuple4D::vector(0.0, 0.97014, -0.24254));
}

#[test]
fn normal_on_transformed_plane() {
    let p = Shape::plane()
        .with_transform(Matrix4D::rotation_z(std::f64::consts::FRAC_PI_2))
        .unwrap();

    assert_eq!(p.normal_at(Tuple4D::point(0.0, 0.0, 0.0)),
        Tuple4D::vector(-1.0, 0.0, 0.0));
}
