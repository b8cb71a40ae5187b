use crate::color::Color;
use crate::pattern::Pattern;
use crate::tuple::Tuple4D;
use crate::matrix::Matrix4D;

/// A point light.
///
/// Light is emitted with the same `intensity` in every direction from a
/// single `position`. There is no falloff with distance.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointLight {
    pub intensity: Color,
    pub position: Tuple4D,
}

impl Default for PointLight {
    fn default() -> PointLight {
        PointLight::new(Color::white(), Tuple4D::point(-10.0, 10.0, -10.0))
    }
}

impl PointLight {
    /// Creates a point light. `position` is forced to be a point.
    pub fn new(intensity: Color, position: Tuple4D) -> PointLight {
        PointLight { intensity, position: position.as_point() }
    }
}

/// A material record.
///
/// The surface attributes of the Phong reflection model (ambient, diffuse,
/// specular and shininess), plus how much light is mirrored (`reflective`),
/// how much passes through (`transparency`), and how strongly it bends when
/// it does (`refractive_index`).
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub color: Color,
    pub pattern: Option<Pattern>,

    pub ambient: f64,
    pub diffuse: f64,
    pub specular: f64,
    pub shininess: f64,

    pub reflective: f64,
    pub transparency: f64,
    pub refractive_index: f64,
}

impl Default for Material {
    fn default() -> Material {
        Material {
            color: Color::white(),
            pattern: None,

            ambient: 0.1,
            diffuse: 0.9,
            specular: 0.9,
            shininess: 200.0,

            reflective: 0.0,
            transparency: 0.0,
            refractive_index: 1.0,
        }
    }
}

impl Material {
    /// The surface color at a world-space point, before any lighting.
    ///
    /// `object_inverse` is the world-to-object transform of the shape the
    /// material is on; it only matters when a pattern is set.
    pub fn color_at(&self, object_inverse: &Matrix4D, point: Tuple4D) -> Color {
        match self.pattern {
            Some(ref pattern) => pattern.pattern_at_object(object_inverse, point),
            None => self.color,
        }
    }

    /// Shades a point lit by a single light with the Phong model.
    ///
    /// `eyev` points toward the viewer and `normalv` is the surface normal,
    /// both unit vectors. When `in_shadow` is set only the ambient term is
    /// returned. The sum is not clamped.
    pub fn lighting(&self, light: &PointLight, point: Tuple4D, eyev: Tuple4D,
        normalv: Tuple4D, in_shadow: bool, object_inverse: &Matrix4D) -> Color {
        let effective_color = self.color_at(object_inverse, point) * light.intensity;
        let ambient = effective_color * self.ambient;
        if in_shadow {
            return ambient;
        }

        let lightv = (light.position - point).normalize();

        // Negative means the light is on the other side of the surface
        let light_dot_normal = lightv.dot(&normalv);
        if light_dot_normal < 0.0 {
            return ambient;
        }

        let diffuse = effective_color * self.diffuse * light_dot_normal;

        let reflectv = (-lightv).reflect(&normalv);
        let reflect_dot_eye = reflectv.dot(&eyev);
        let specular = if reflect_dot_eye <= 0.0 {
            Color::black()
        } else {
            light.intensity * self.specular * reflect_dot_eye.powf(self.shininess)
        };

        ambient + diffuse + specular
    }
}

#[cfg(test)]
fn light_at(x: f64, y: f64, z: f64) -> PointLight {
    PointLight::new(Color::white(), Tuple4D::point(x, y, z))
}

#[test]
fn eye_between_light_and_surface() {
    let m = Material::default();
    let eyev = Tuple4D::vector(0.0, 0.0, -1.0);
    let normalv = Tuple4D::vector(0.0, 0.0, -1.0);

    let res = m.lighting(&light_at(0.0, 0.0, -10.0), Tuple4D::origin(),
        eyev, normalv, false, &Matrix4D::identity());
    assert_eq!(res, Color::rgb(1.9, 1.9, 1.9));
}

#[test]
fn eye_offset_45_degrees() {
    let m = Material::default();
    let half = 2.0f64.sqrt() / 2.0;
    let eyev = Tuple4D::vector(0.0, half, -half);
    let normalv = Tuple4D::vector(0.0, 0.0, -1.0);

    let res = m.lighting(&light_at(0.0, 0.0, -10.0), Tuple4D::origin(),
        eyev, normalv, false, &Matrix4D::identity());
    assert_eq!(res, Color::rgb(1.0, 1.0, 1.0));
}

#[test]
fn light_offset_45_degrees() {
    let m = Material::default();
    let eyev = Tuple4D::vector(0.0, 0.0, -1.0);
    let normalv = Tuple4D::vector(0.0, 0.0, -1.0);

    let res = m.lighting(&light_at(0.0, 10.0, -10.0), Tuple4D::origin(),
        eyev, normalv, false, &Matrix4D::identity());
    assert_eq!(res, Color::rgb(0.7364, 0.7364, 0.7364));
}

#[test]
fn eye_in_path_of_reflection() {
    let m = Material::default();
    let half = 2.0f64.sqrt() / 2.0;
    let eyev = Tuple4D::vector(0.0, -half, -half);
    let normalv = Tuple4D::vector(0.0, 0.0, -1.0);

    let res = m.lighting(&light_at(0.0, 10.0, -10.0), Tuple4D::origin(),
        eyev, normalv, false, &Matrix4D::identity());
    assert_eq!(res, Color::rgb(1.6364, 1.6364, 1.6364));
}

#[test]
fn light_behind_surface() {
    let m = Material::default();
    let eyev = Tuple4D::vector(0.0, 0.0, -1.0);
    let normalv = Tuple4D::vector(0.0, 0.0, -1.0);

    let res = m.lighting(&light_at(0.0, 0.0, 10.0), Tuple4D::origin(),
        eyev, normalv, false, &Matrix4D::identity());
    assert_eq!(res, Color::rgb(0.1, 0.1, 0.1));
}

#[test]
fn surface_in_shadow() {
    let m = Material::default();
    let eyev = Tuple4D::vector(0.0, 0.0, -1.0);
    let normalv = Tuple4D::vector(0.0, 0.0, -1.0);

    let res = m.lighting(&light_at(0.0, 0.0, -10.0), Tuple4D::origin(),
        eyev, normalv, true, &Matrix4D::identity());
    assert_eq!(res, Color::rgb(0.1, 0.1, 0.1));
}

#[test]
fn lighting_with_stripe_pattern() {
    // Only ambient light, so the pattern color comes through unchanged
    let m = Material {
        color: Color::rgb(0.5, 0.5, 0.5),
        pattern: Some(Pattern::stripe(Color::white(), Color::black())),
        ambient: 1.0,
        diffuse: 0.0,
        specular: 0.0,
        ..Default::default()
    };
    let eyev = Tuple4D::vector(0.0, 0.0, -1.0);
    let normalv = Tuple4D::vector(0.0, 0.0, -1.0);
    let light = light_at(0.0, 0.0, -10.0);
    let identity = Matrix4D::identity();

    assert_eq!(
        m.lighting(&light, Tuple4D::point(0.9, 0.0, 0.0),
            eyev, normalv, false, &identity),
        Color::white()
    );
    assert_eq!(
        m.lighting(&light, Tuple4D::point(1.1, 0.0, 0.0),
            eyev, normalv, false, &identity),
        Color::black()
    );
}
