use crate::consts::MAX_DEPTH;
use crate::ray::Ray4D;
use crate::tuple::Tuple4D;
use crate::color::Color;
use crate::light::{ PointLight, Material };
use crate::shape::{ self, Shape };
use crate::intersect::{ Intersection, Intersections, IntersectionComputation };

/// A world with objects and lights.
///
/// Worlds collect everything needed to shade a ray. Once built, a world is
/// only read during rendering, so a single instance can be shared between
/// render workers.
#[derive(Clone, Debug, PartialEq)]
pub struct World {
    pub objects: Vec<Shape>,
    pub lights: Vec<PointLight>,
}

/// The default world: two concentric spheres lit from the upper left.
impl Default for World {
    fn default() -> World {
        let s1 = Shape::sphere().with_material(Material {
            color: Color::rgb(0.8, 1.0, 0.6),
            diffuse: 0.7,
            specular: 0.2,
            shininess: 50.0,
            ..Default::default()
        });
        let s2 = Shape::sphere().with_scaling(0.5);

        World {
            objects: vec![s1, s2],
            lights: vec![PointLight::default()],
        }
    }
}

impl World {
    /// Creates a default world with two spheres.
    pub fn new() -> World {
        Default::default()
    }

    /// Creates a world with no objects and no lights.
    pub fn empty() -> World {
        World { objects: Vec::new(), lights: Vec::new() }
    }

    pub fn add_object(&mut self, object: Shape) {
        self.objects.push(object);
    }

    pub fn add_light(&mut self, light: PointLight) {
        self.lights.push(light);
    }

    /// Intersects a ray against all objects, sorted by ascending `t`.
    pub fn intersect(&self, r: &Ray4D) -> Intersections {
        let mut intersections = Intersections::new();
        for obj in self.objects.iter() {
            intersections.append(shape::intersect(obj, r));
        }

        intersections.sort();
        intersections
    }

    /// Precomputes shading state for a hit; `xs` is every intersection
    /// along `r`, in order.
    pub fn prepare_computations<'a>(&self, hit: &Intersection<'a>, r: &Ray4D,
        xs: &[Intersection<'a>]) -> IntersectionComputation<'a> {
        IntersectionComputation::new(r, hit, xs)
    }

    /// Determines whether something lies between a point and a light.
    pub fn is_shadowed(&self, p: Tuple4D, light: &PointLight) -> bool {
        let v = light.position - p;
        let distance = v.magnitude();
        let r = Ray4D::new(p, v.normalize());

        match self.intersect(&r).hit() {
            Some(i) => i.t < distance,
            None => false,
        }
    }

    /// The color at a hit: direct light from every light source, plus the
    /// reflected and refracted contributions.
    pub fn shade_hit(&self, comps: &IntersectionComputation, remaining: usize)
        -> Color {
        let material = comps.obj.material();

        let surface: Color = self.lights.iter()
            .map(|light| material.lighting(
                light,
                comps.over_point,
                comps.eyev,
                comps.normalv,
                self.is_shadowed(comps.over_point, light),
                comps.obj.inverse_transform(),
            ))
            .sum();

        let reflected = self.reflected_color(comps, remaining);
        let refracted = self.refracted_color(comps, remaining);

        if material.reflective > 0.0 && material.transparency > 0.0 {
            let reflectance = comps.schlick();
            surface + reflected * reflectance + refracted * (1.0 - reflectance)
        } else {
            surface + reflected + refracted
        }
    }

    /// The color seen along the mirror direction, scaled by reflectivity.
    pub fn reflected_color(&self, comps: &IntersectionComputation,
        remaining: usize) -> Color {
        let reflective = comps.obj.material().reflective;
        if remaining == 0 || reflective == 0.0 {
            return Color::black();
        }

        let reflect_ray = Ray4D::new(comps.over_point, comps.reflectv);
        self.color_at_depth(&reflect_ray, remaining - 1) * reflective
    }

    /// The color seen through the surface, bent by Snell's law and scaled by
    /// transparency. Black under total internal reflection.
    pub fn refracted_color(&self, comps: &IntersectionComputation,
        remaining: usize) -> Color {
        let transparency = comps.obj.material().transparency;
        if remaining == 0 || transparency == 0.0 {
            return Color::black();
        }

        let n_ratio = comps.n1 / comps.n2;
        let cos_i = comps.eyev.dot(&comps.normalv);
        let sin2_t = n_ratio.powi(2) * (1.0 - cos_i.powi(2));
        if sin2_t > 1.0 {
            return Color::black();
        }

        let cos_t = (1.0 - sin2_t).sqrt();
        let direction = comps.normalv * (n_ratio * cos_i - cos_t)
            - comps.eyev * n_ratio;

        let refract_ray = Ray4D::new(comps.under_point, direction);
        self.color_at_depth(&refract_ray, remaining - 1) * transparency
    }

    /// The color seen along a primary ray.
    pub fn color_at(&self, r: &Ray4D) -> Color {
        self.color_at_depth(r, MAX_DEPTH)
    }

    /// The color seen along a ray with `remaining` bounces left. Black once
    /// the bounces run out or when nothing is hit.
    pub fn color_at_depth(&self, r: &Ray4D, remaining: usize) -> Color {
        if remaining == 0 {
            return Color::black();
        }

        let xs = self.intersect(r);
        match xs.hit() {
            None => Color::black(),
            Some(hit) => {
                let comps = self.prepare_computations(&hit, r, &xs);
                self.shade_hit(&comps, remaining)
            },
        }
    }
}

#[cfg(test)]
use crate::matrix::Matrix4D;

#[cfg(test)]
const HALF_SQRT_2: f64 = std::f64::consts::FRAC_1_SQRT_2;

#[cfg(test)]
fn ray(origin: Tuple4D, direction: Tuple4D) -> Ray4D {
    Ray4D::new(origin, direction)
}

#[test]
fn default_world_contents() {
    let w = World::default();

    assert_eq!(w.objects.len(), 2);
    assert_eq!(w.lights,
        vec![PointLight::new(Color::white(), Tuple4D::point(-10.0, 10.0, -10.0))]);
    assert_eq!(w.objects[0].material, Material {
        color: Color::rgb(0.8, 1.0, 0.6),
        diffuse: 0.7,
        specular: 0.2,
        shininess: 50.0,
        ..Default::default()
    });
    assert_eq!(w.objects[1].material, Material::default());
    assert_eq!(*w.objects[1].transform(), Matrix4D::scaling(0.5, 0.5, 0.5));
}

#[test]
fn intersect_default_world_with_ray() {
    let w = World::default();
    let r = ray(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));

    let xs = w.intersect(&r);

    assert_eq!(xs.len(), 4);
    assert_eq!(xs[0].t, 4.0);
    assert_eq!(xs[1].t, 4.5);
    assert_eq!(xs[2].t, 5.5);
    assert_eq!(xs[3].t, 6.0);
}

#[test]
fn shade_intersection_from_outside() {
    let w = World::default();
    let r = ray(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));
    let i = Intersection::new(4.0, &w.objects[0]);

    let comps = w.prepare_computations(&i, &r, &[i]);
    assert_eq!(w.shade_hit(&comps, MAX_DEPTH),
        Color::rgb(0.38066, 0.47583, 0.2855));
}

#[test]
fn shade_intersection_from_inside() {
    let mut w = World::default();
    w.lights = vec![
        PointLight::new(Color::white(), Tuple4D::point(0.0, 0.25, 0.0)),
    ];
    let r = ray(Tuple4D::point(0.0, 0.0, 0.0), Tuple4D::vector(0.0, 0.0, 1.0));
    let i = Intersection::new(0.5, &w.objects[1]);

    let comps = w.prepare_computations(&i, &r, &[i]);
    assert_eq!(w.shade_hit(&comps, MAX_DEPTH),
        Color::rgb(0.90498, 0.90498, 0.90498));
}

#[test]
fn shade_intersection_in_shadow() {
    let mut w = World::empty();
    w.add_light(PointLight::new(Color::white(), Tuple4D::point(0.0, 0.0, -10.0)));
    w.add_object(Shape::sphere());
    w.add_object(Shape::sphere()
        .with_transform(Matrix4D::translation(0.0, 0.0, 10.0))
        .unwrap());

    let r = ray(Tuple4D::point(0.0, 0.0, 5.0), Tuple4D::vector(0.0, 0.0, 1.0));
    let i = Intersection::new(4.0, &w.objects[1]);

    let comps = w.prepare_computations(&i, &r, &[i]);
    assert_eq!(w.shade_hit(&comps, MAX_DEPTH), Color::rgb(0.1, 0.1, 0.1));
}

#[test]
fn every_light_contributes() {
    let mut w = World::default();
    let one = {
        let r = ray(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));
        w.color_at(&r)
    };

    w.add_light(PointLight::default());
    let r = ray(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));
    assert_eq!(w.color_at(&r), one * 2.0);
}

#[test]
fn color_ray_miss() {
    let w = World::default();
    let r = ray(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 1.0, 0.0));

    assert_eq!(w.color_at(&r), Color::black());
}

#[test]
fn color_ray_hit() {
    let w = World::default();
    let r = ray(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));

    assert_eq!(w.color_at(&r), Color::rgb(0.38066, 0.47583, 0.2855));
}

#[test]
fn color_with_intersection_behind_ray() {
    let mut w = World::default();
    w.objects[0].material_mut().ambient = 1.0;
    w.objects[1].material_mut().ambient = 1.0;

    let r = ray(Tuple4D::point(0.0, 0.0, 0.75), Tuple4D::vector(0.0, 0.0, -1.0));
    assert_eq!(w.color_at(&r), w.objects[1].material.color);
}

#[test]
fn color_with_no_bounces_left_is_black() {
    let w = World::default();
    let r = ray(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));

    assert_eq!(w.color_at_depth(&r, 0), Color::black());
}

#[test]
fn shadow_collinear_point_and_light() {
    let w = World::default();
    assert!(!w.is_shadowed(Tuple4D::point(0.0, 10.0, 0.0), &w.lights[0]));
}

#[test]
fn shadow_object_between_point_and_light() {
    let w = World::default();
    assert!(w.is_shadowed(Tuple4D::point(10.0, -10.0, 10.0), &w.lights[0]));
}

#[test]
fn shadow_object_behind_light() {
    let w = World::default();
    assert!(!w.is_shadowed(Tuple4D::point(-20.0, 20.0, -20.0), &w.lights[0]));
}

#[test]
fn shadow_object_behind_point() {
    let w = World::default();
    assert!(!w.is_shadowed(Tuple4D::point(-2.0, 2.0, -2.0), &w.lights[0]));
}

#[test]
fn reflected_color_for_nonreflective_material() {
    let mut w = World::default();
    w.objects[1].material_mut().ambient = 1.0;

    let r = ray(Tuple4D::point(0.0, 0.0, 0.0), Tuple4D::vector(0.0, 0.0, 1.0));
    let i = Intersection::new(1.0, &w.objects[1]);

    let comps = w.prepare_computations(&i, &r, &[i]);
    assert_eq!(w.reflected_color(&comps, MAX_DEPTH), Color::black());
}

#[cfg(test)]
fn world_with_mirror_floor() -> World {
    let mut w = World::default();
    let mut floor = Shape::plane()
        .with_transform(Matrix4D::translation(0.0, -1.0, 0.0))
        .unwrap();
    floor.material.reflective = 0.5;
    w.add_object(floor);

    w
}

#[test]
fn reflected_color_for_reflective_material() {
    let w = world_with_mirror_floor();
    let r = ray(Tuple4D::point(0.0, 0.0, -3.0),
        Tuple4D::vector(0.0, -HALF_SQRT_2, HALF_SQRT_2));
    let i = Intersection::new(2.0f64.sqrt(), &w.objects[2]);

    let comps = w.prepare_computations(&i, &r, &[i]);
    assert_eq!(w.reflected_color(&comps, MAX_DEPTH),
        Color::rgb(0.19032, 0.2379, 0.14274));
}

#[test]
fn shade_hit_with_reflective_material() {
    let w = world_with_mirror_floor();
    let r = ray(Tuple4D::point(0.0, 0.0, -3.0),
        Tuple4D::vector(0.0, -HALF_SQRT_2, HALF_SQRT_2));
    let i = Intersection::new(2.0f64.sqrt(), &w.objects[2]);

    let comps = w.prepare_computations(&i, &r, &[i]);
    assert_eq!(w.shade_hit(&comps, MAX_DEPTH),
        Color::rgb(0.87677, 0.92436, 0.82918));
}

#[test]
fn reflected_color_with_no_bounces_left() {
    let w = world_with_mirror_floor();
    let r = ray(Tuple4D::point(0.0, 0.0, -3.0),
        Tuple4D::vector(0.0, -HALF_SQRT_2, HALF_SQRT_2));
    let i = Intersection::new(2.0f64.sqrt(), &w.objects[2]);

    let comps = w.prepare_computations(&i, &r, &[i]);
    assert_eq!(w.reflected_color(&comps, 0), Color::black());
}

#[test]
fn mutually_reflective_surfaces_terminate() {
    let mut w = World::empty();
    w.add_light(PointLight::new(Color::white(), Tuple4D::origin()));

    let mut lower = Shape::plane()
        .with_transform(Matrix4D::translation(0.0, -1.0, 0.0))
        .unwrap();
    lower.material.reflective = 1.0;
    let mut upper = Shape::plane()
        .with_transform(Matrix4D::translation(0.0, 1.0, 0.0))
        .unwrap();
    upper.material.reflective = 1.0;
    w.add_object(lower);
    w.add_object(upper);

    let r = ray(Tuple4D::origin(), Tuple4D::vector(0.0, 1.0, 0.0));
    assert!(w.color_at(&r).is_finite());
}

#[test]
fn refracted_color_of_opaque_surface() {
    let w = World::default();
    let r = ray(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));
    let xs = vec![
        Intersection::new(4.0, &w.objects[0]),
        Intersection::new(6.0, &w.objects[0]),
    ];

    let comps = w.prepare_computations(&xs[0], &r, &xs);
    assert_eq!(w.refracted_color(&comps, MAX_DEPTH), Color::black());
}

#[test]
fn refracted_color_with_no_bounces_left() {
    let mut w = World::default();
    w.objects[0].material.transparency = 1.0;
    w.objects[0].material.refractive_index = 1.5;

    let r = ray(Tuple4D::point(0.0, 0.0, -5.0), Tuple4D::vector(0.0, 0.0, 1.0));
    let xs = vec![
        Intersection::new(4.0, &w.objects[0]),
        Intersection::new(6.0, &w.objects[0]),
    ];

    let comps = w.prepare_computations(&xs[0], &r, &xs);
    assert_eq!(w.refracted_color(&comps, 0), Color::black());
}

#[test]
fn refracted_color_under_total_internal_reflection() {
    let mut w = World::default();
    w.objects[0].material.transparency = 1.0;
    w.objects[0].material.refractive_index = 1.5;

    let r = ray(Tuple4D::point(0.0, 0.0, HALF_SQRT_2),
        Tuple4D::vector(0.0, 1.0, 0.0));
    let xs = vec![
        Intersection::new(-HALF_SQRT_2, &w.objects[0]),
        Intersection::new(HALF_SQRT_2, &w.objects[0]),
    ];

    // Inside the sphere, so look at the second intersection
    let comps = w.prepare_computations(&xs[1], &r, &xs);
    assert_eq!(w.refracted_color(&comps, MAX_DEPTH), Color::black());
}

#[test]
fn refracted_color_with_refracted_ray() {
    use crate::pattern::Pattern;

    let mut w = World::default();
    w.objects[0].material.ambient = 1.0;
    w.objects[0].material.pattern = Some(Pattern::position());
    w.objects[1].material.transparency = 1.0;
    w.objects[1].material.refractive_index = 1.5;

    let r = ray(Tuple4D::point(0.0, 0.0, 0.1), Tuple4D::vector(0.0, 1.0, 0.0));
    let xs = vec![
        Intersection::new(-0.9899, &w.objects[0]),
        Intersection::new(-0.4899, &w.objects[1]),
        Intersection::new(0.4899, &w.objects[1]),
        Intersection::new(0.9899, &w.objects[0]),
    ];

    // Leaving the inner glass sphere; the bent ray lands on the outer
    // sphere, whose color is the object-space point it hit
    let comps = w.prepare_computations(&xs[2], &r, &xs);
    assert_eq!(w.refracted_color(&comps, MAX_DEPTH),
        Color::rgb(0.0, 0.99878, 0.04724));
}

#[cfg(test)]
fn world_with_glass_floor_and_ball() -> World {
    let mut w = World::default();

    let mut floor = Shape::plane()
        .with_transform(Matrix4D::translation(0.0, -1.0, 0.0))
        .unwrap();
    floor.material.transparency = 0.5;
    floor.material.refractive_index = 1.5;

    let mut ball = Shape::sphere()
        .with_transform(Matrix4D::translation(0.0, -3.5, -0.5))
        .unwrap();
    ball.material.color = Color::rgb(1.0, 0.0, 0.0);
    ball.material.ambient = 0.5;

    w.add_object(floor);
    w.add_object(ball);
    w
}

#[test]
fn shade_hit_with_transparent_material() {
    let w = world_with_glass_floor_and_ball();
    let r = ray(Tuple4D::point(0.0, 0.0, -3.0),
        Tuple4D::vector(0.0, -HALF_SQRT_2, HALF_SQRT_2));
    let xs = vec![Intersection::new(2.0f64.sqrt(), &w.objects[2])];

    let comps = w.prepare_computations(&xs[0], &r, &xs);
    assert_eq!(w.shade_hit(&comps, MAX_DEPTH),
        Color::rgb(0.93642, 0.68642, 0.68642));
}

#[test]
fn shade_hit_with_reflective_transparent_material() {
    let mut w = world_with_glass_floor_and_ball();
    w.objects[2].material.reflective = 0.5;

    let r = ray(Tuple4D::point(0.0, 0.0, -3.0),
        Tuple4D::vector(0.0, -HALF_SQRT_2, HALF_SQRT_2));
    let xs = vec![Intersection::new(2.0f64.sqrt(), &w.objects[2])];

    let comps = w.prepare_computations(&xs[0], &r, &xs);
    assert_eq!(w.shade_hit(&comps, MAX_DEPTH),
        Color::rgb(0.93391, 0.69643, 0.69243));
}
