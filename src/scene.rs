//! Scene descriptions.
//!
//! A scene is a JSON document holding a camera, optional named colors and
//! materials, a list of point lights and a list of shapes. See
//! `Scene::from_json_str` for the layout.

use std::collections::HashMap;
use std::fs;
use std::iter::Peekable;
use std::path::Path;
use std::str::Chars;

use log::debug;
use serde::Deserialize;

use crate::consts::{ DEFAULT_HSIZE, DEFAULT_VSIZE };
use crate::error::{ Error, Result };
use crate::tuple::Tuple4D;
use crate::matrix::Matrix4D;
use crate::color::Color;
use crate::pattern::Pattern;
use crate::light::{ PointLight, Material };
use crate::shape::Shape;
use crate::world::World;
use crate::camera::Camera;

/// A world together with the camera that views it.
#[derive(Clone, Debug)]
pub struct Scene {
    pub world: World,
    pub camera: Camera,
}

impl Scene {
    /// Builds a scene from its JSON description.
    ///
    /// ```
    /// # use tracer::scene::Scene;
    /// let scene = Scene::from_json_str(r#"{
    ///     "camera": {
    ///         "hsize": 100, "vsize": 50, "field_of_view": "pi / 3",
    ///         "view_transform": {
    ///             "from": [0, 1.5, -5], "to": [0, 1, 0], "up": [0, 1, 0]
    ///         }
    ///     },
    ///     "colors": { "red": { "rgb": [255, 0, 0] } },
    ///     "materials": { "glass": { "color": "red", "transparency": 0.9 } },
    ///     "lights": [ { "position": [-10, 10, -10] } ],
    ///     "shapes": [
    ///         { "type": "sphere", "material": "glass",
    ///           "transforms": [ { "translation": [0, 1, 0] } ] },
    ///         { "type": "plane",
    ///           "material": { "pattern": { "stripes": [ "red", { "hex": "FFFFFF" } ] } } }
    ///     ]
    /// }"#).unwrap();
    ///
    /// assert_eq!(scene.world.objects.len(), 2);
    /// assert_eq!(scene.camera.hsize, 100);
    /// ```
    pub fn from_json_str(json: &str) -> Result<Scene> {
        let description: SceneJson = serde_json::from_str(json)?;
        let scene = description.build()?;

        debug!("loaded scene: {} shapes, {} lights, {}x{} camera",
            scene.world.objects.len(), scene.world.lights.len(),
            scene.camera.hsize, scene.camera.vsize);

        Ok(scene)
    }

    /// Reads and builds a scene from a JSON file.
    pub fn load(path: &Path) -> Result<Scene> {
        debug!("reading scene from {}", path.display());
        let json = fs::read_to_string(path)?;

        Scene::from_json_str(&json)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SceneJson {
    camera: CameraJson,

    #[serde(default)]
    colors: HashMap<String, ColorJson>,

    #[serde(default)]
    materials: HashMap<String, MaterialJson>,

    #[serde(default)]
    lights: Vec<LightJson>,

    #[serde(default)]
    shapes: Vec<ShapeJson>,
}

impl SceneJson {
    fn build(&self) -> Result<Scene> {
        // Named colors must be literal; they cannot refer to each other
        let no_names = HashMap::new();
        let mut colors = HashMap::with_capacity(self.colors.len());
        for (name, spec) in self.colors.iter() {
            colors.insert(name.clone(), spec.resolve(&no_names)?);
        }

        let mut materials = HashMap::with_capacity(self.materials.len());
        for (name, spec) in self.materials.iter() {
            materials.insert(name.clone(), spec.build(&colors)?);
        }

        let mut world = World::empty();
        for light in self.lights.iter() {
            world.add_light(light.build(&colors)?);
        }
        for shape in self.shapes.iter() {
            world.add_object(shape.build(&colors, &materials)?);
        }

        let camera = self.camera.build()?;

        Ok(Scene { world, camera })
    }
}

/// A number, or an arithmetic expression over `pi` such as `"-pi / 2"`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Number {
    Value(f64),
    Expr(String),
}

impl Number {
    fn value(&self) -> Result<f64> {
        match self {
            Number::Value(v) => Ok(*v),
            Number::Expr(e) => eval_expr(e),
        }
    }
}

fn values<const N: usize>(numbers: &[Number; N]) -> Result<[f64; N]> {
    let mut out = [0.0; N];
    for (o, n) in out.iter_mut().zip(numbers.iter()) {
        *o = n.value()?;
    }

    Ok(out)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ColorJson {
    /// Channels in 0..=255.
    Rgb { rgb: [f64; 3] },
    Hex { hex: String },
    Named(String),
}

impl ColorJson {
    fn resolve(&self, colors: &HashMap<String, Color>) -> Result<Color> {
        match self {
            ColorJson::Rgb { rgb } =>
                Ok(Color::rgb(rgb[0] / 255.0, rgb[1] / 255.0, rgb[2] / 255.0)),
            ColorJson::Hex { hex } => Color::from_hex(hex),
            ColorJson::Named(name) => colors.get(name).copied().ok_or_else(||
                Error::Scene(format!("undefined color {:?}", name))
            ),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum TransformJson {
    Scaling([Number; 3]),
    Translation([Number; 3]),
    RotationX(Number),
    RotationY(Number),
    RotationZ(Number),
    Shearing([Number; 6]),
}

impl TransformJson {
    fn matrix(&self) -> Result<Matrix4D> {
        Ok(match self {
            TransformJson::Scaling(v) => {
                let [x, y, z] = values(v)?;
                Matrix4D::scaling(x, y, z)
            },
            TransformJson::Translation(v) => {
                let [x, y, z] = values(v)?;
                Matrix4D::translation(x, y, z)
            },
            TransformJson::RotationX(r) => Matrix4D::rotation_x(r.value()?),
            TransformJson::RotationY(r) => Matrix4D::rotation_y(r.value()?),
            TransformJson::RotationZ(r) => Matrix4D::rotation_z(r.value()?),
            TransformJson::Shearing(v) => {
                let [xy, xz, yx, yz, zx, zy] = values(v)?;
                Matrix4D::shearing(xy, xz, yx, yz, zx, zy)
            },
        })
    }
}

/// Composes transforms listed in the order they are applied.
fn compose(transforms: &[TransformJson]) -> Result<Matrix4D> {
    transforms.iter().try_fold(Matrix4D::identity(), |acc, t| {
        Ok(acc.then(t.matrix()?))
    })
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PatternJson {
    stripes: Vec<ColorJson>,

    #[serde(default)]
    transforms: Vec<TransformJson>,
}

impl PatternJson {
    fn build(&self, colors: &HashMap<String, Color>) -> Result<Pattern> {
        let stripes = self.stripes.iter()
            .map(|c| c.resolve(colors))
            .collect::<Result<Vec<Color>>>()?;

        Pattern::stripes(stripes)?.with_transform(compose(&self.transforms)?)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct MaterialJson {
    color: Option<ColorJson>,
    pattern: Option<PatternJson>,
    ambient: Option<f64>,
    diffuse: Option<f64>,
    specular: Option<f64>,
    shininess: Option<f64>,
    reflective: Option<f64>,
    transparency: Option<f64>,
    refractive_index: Option<f64>,
}

impl MaterialJson {
    fn build(&self, colors: &HashMap<String, Color>) -> Result<Material> {
        let defaults = Material::default();

        let color = match self.color {
            Some(ref c) => c.resolve(colors)?,
            None => defaults.color,
        };
        let pattern = match self.pattern {
            Some(ref p) => Some(p.build(colors)?),
            None => None,
        };

        Ok(Material {
            color,
            pattern,
            ambient: self.ambient.unwrap_or(defaults.ambient),
            diffuse: self.diffuse.unwrap_or(defaults.diffuse),
            specular: self.specular.unwrap_or(defaults.specular),
            shininess: self.shininess.unwrap_or(defaults.shininess),
            reflective: self.reflective.unwrap_or(defaults.reflective),
            transparency: self.transparency.unwrap_or(defaults.transparency),
            refractive_index: self.refractive_index
                .unwrap_or(defaults.refractive_index),
        })
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MaterialRef {
    Named(String),
    Inline(MaterialJson),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ShapeJson {
    #[serde(rename = "type")]
    kind: String,

    material: Option<MaterialRef>,

    #[serde(default)]
    transforms: Vec<TransformJson>,
}

impl ShapeJson {
    fn build(&self, colors: &HashMap<String, Color>,
        materials: &HashMap<String, Material>) -> Result<Shape> {
        let mut shape = match self.kind.as_str() {
            "sphere" => Shape::sphere(),
            "plane" => Shape::plane(),
            other => return Err(
                Error::Geometry(format!("unknown shape type {:?}", other))
            ),
        };

        shape.material = match self.material {
            Some(MaterialRef::Named(ref name)) => materials.get(name)
                .cloned()
                .ok_or_else(|| Error::Scene(format!("undefined material {:?}", name)))?,
            Some(MaterialRef::Inline(ref spec)) => spec.build(colors)?,
            None => Material::default(),
        };
        shape.set_transform(compose(&self.transforms)?)?;

        Ok(shape)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct LightJson {
    position: [Number; 3],
    intensity: Option<ColorJson>,
}

impl LightJson {
    fn build(&self, colors: &HashMap<String, Color>) -> Result<PointLight> {
        let [x, y, z] = values(&self.position)?;
        let intensity = match self.intensity {
            Some(ref c) => c.resolve(colors)?,
            None => Color::white(),
        };

        Ok(PointLight::new(intensity, Tuple4D::point(x, y, z)))
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ViewJson {
    from: [Number; 3],
    to: [Number; 3],
    up: [Number; 3],
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CameraJson {
    hsize: Option<usize>,
    vsize: Option<usize>,
    field_of_view: Option<Number>,
    view_transform: Option<ViewJson>,
}

impl CameraJson {
    fn build(&self) -> Result<Camera> {
        let hsize = self.hsize.unwrap_or(DEFAULT_HSIZE);
        let vsize = self.vsize.unwrap_or(DEFAULT_VSIZE);
        if hsize == 0 || vsize == 0 {
            return Err(Error::Scene(
                format!("camera size must be non-zero, got {}x{}", hsize, vsize)
            ));
        }

        let field_of_view = match self.field_of_view {
            Some(ref fov) => fov.value()?,
            None => std::f64::consts::FRAC_PI_2,
        };

        let transform = match self.view_transform {
            Some(ref view) => {
                let [fx, fy, fz] = values(&view.from)?;
                let [tx, ty, tz] = values(&view.to)?;
                let [ux, uy, uz] = values(&view.up)?;

                Matrix4D::view_transform(
                    Tuple4D::point(fx, fy, fz),
                    Tuple4D::point(tx, ty, tz),
                    Tuple4D::vector(ux, uy, uz),
                )?
            },
            None => Matrix4D::identity(),
        };

        Camera::new(hsize, vsize, field_of_view).with_transform(transform)
    }
}

/// Evaluates an arithmetic expression over numbers and `pi`.
///
/// Supports `+ - * /`, unary minus and parentheses with the usual
/// precedence.
pub fn eval_expr(src: &str) -> Result<f64> {
    let mut parser = ExprParser { chars: src.chars().peekable(), src };
    let value = parser.expr()?;

    if parser.peek().is_some() || !value.is_finite() {
        return Err(parser.error());
    }

    Ok(value)
}

struct ExprParser<'a> {
    chars: Peekable<Chars<'a>>,
    src: &'a str,
}

impl<'a> ExprParser<'a> {
    fn error(&self) -> Error {
        Error::Scene(format!("invalid numeric expression {:?}", self.src))
    }

    fn peek(&mut self) -> Option<char> {
        while let Some(&c) = self.chars.peek() {
            if !c.is_whitespace() {
                return Some(c);
            }
            self.chars.next();
        }

        None
    }

    fn take_while<F: Fn(char) -> bool>(&mut self, pred: F) -> String {
        let mut taken = String::new();
        while let Some(&c) = self.chars.peek() {
            if !pred(c) {
                break;
            }
            taken.push(c);
            self.chars.next();
        }

        taken
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<f64> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some('+') => { self.chars.next(); value += self.term()?; },
                Some('-') => { self.chars.next(); value -= self.term()?; },
                _ => return Ok(value),
            }
        }
    }

    // term := factor (('*' | '/') factor)*
    fn term(&mut self) -> Result<f64> {
        let mut value = self.factor()?;
        loop {
            match self.peek() {
                Some('*') => { self.chars.next(); value *= self.factor()?; },
                Some('/') => { self.chars.next(); value /= self.factor()?; },
                _ => return Ok(value),
            }
        }
    }

    // factor := '-' factor | '(' expr ')' | number | "pi"
    fn factor(&mut self) -> Result<f64> {
        match self.peek() {
            Some('-') => {
                self.chars.next();
                Ok(-self.factor()?)
            },
            Some('(') => {
                self.chars.next();
                let value = self.expr()?;
                if self.peek() != Some(')') {
                    return Err(self.error());
                }
                self.chars.next();

                Ok(value)
            },
            Some(c) if c.is_ascii_digit() || c == '.' => {
                self.take_while(|c| c.is_ascii_digit() || c == '.')
                    .parse::<f64>()
                    .map_err(|_| self.error())
            },
            Some(c) if c.is_ascii_alphabetic() => {
                match self.take_while(|c| c.is_ascii_alphanumeric()).as_str() {
                    "pi" => Ok(std::f64::consts::PI),
                    _ => Err(self.error()),
                }
            },
            _ => Err(self.error()),
        }
    }
}

#[cfg(test)]
use std::f64::consts::PI;

#[cfg(test)]
const CAMERA: &str = r#""camera": { "hsize": 10, "vsize": 10 }"#;

#[test]
fn expressions_over_pi() {
    assert_eq!(eval_expr("pi").unwrap(), PI);
    assert_eq!(eval_expr("pi/2").unwrap(), PI / 2.0);
    assert_eq!(eval_expr("-pi / 2").unwrap(), -PI / 2.0);
    assert_eq!(eval_expr("2 * pi / 3").unwrap(), 2.0 * PI / 3.0);
    assert_eq!(eval_expr("(1 + 1) * 0.5").unwrap(), 1.0);
    assert_eq!(eval_expr(" 3 - 1 - 1 ").unwrap(), 1.0);
}

#[test]
fn malformed_expressions_are_rejected() {
    for bad in ["", "tau", "pi pi", "(pi", "1 / 0", "2 *"].iter() {
        assert!(eval_expr(bad).is_err(), "{:?} should not evaluate", bad);
    }
}

#[test]
fn transforms_apply_in_listed_order() {
    let transforms: Vec<TransformJson> = serde_json::from_str(
        r#"[ { "scaling": [1, 2, 1] }, { "rotation_z": "pi/2" } ]"#
    ).unwrap();

    let expected = Matrix4D::rotation_z(PI / 2.0) * Matrix4D::scaling(1.0, 2.0, 1.0);
    assert!(compose(&transforms).unwrap().approx_eq(&expected));
}

#[test]
fn empty_transform_list_is_identity() {
    assert_eq!(compose(&[]).unwrap(), Matrix4D::identity());
}

#[test]
fn each_transform_kind() {
    let cases = [
        (r#"{ "scaling": [2, 2, 2] }"#, Matrix4D::scaling(2.0, 2.0, 2.0)),
        (r#"{ "translation": [1, 2, 3] }"#, Matrix4D::translation(1.0, 2.0, 3.0)),
        (r#"{ "rotation_x": "pi/2" }"#, Matrix4D::rotation_x(PI / 2.0)),
        (r#"{ "rotation_y": "pi/4" }"#, Matrix4D::rotation_y(PI / 4.0)),
        (r#"{ "rotation_z": 1.5 }"#, Matrix4D::rotation_z(1.5)),
        (r#"{ "shearing": [1, 2, 3, 4, 5, 6] }"#,
            Matrix4D::shearing(1.0, 2.0, 3.0, 4.0, 5.0, 6.0)),
    ];

    for (json, expected) in cases.iter() {
        let t: TransformJson = serde_json::from_str(json).unwrap();
        assert!(t.matrix().unwrap().approx_eq(expected), "{}", json);
    }
}

#[test]
fn colors_by_rgb_hex_and_name() {
    let scene = Scene::from_json_str(&format!(r#"{{ {},
        "colors": {{ "lime": {{ "rgb": [0, 255, 0] }}, "white": {{ "hex": "ffffff" }} }},
        "lights": [ {{ "position": [0, 0, -10], "intensity": "lime" }} ],
        "shapes": [ {{ "type": "sphere", "material": {{ "color": "white" }} }} ]
    }}"#, CAMERA)).unwrap();

    assert_eq!(scene.world.lights[0].intensity, Color::rgb(0.0, 1.0, 0.0));
    assert_eq!(scene.world.objects[0].material.color, Color::white());
}

#[test]
fn named_material_is_shared() {
    let scene = Scene::from_json_str(&format!(r#"{{ {},
        "materials": {{ "mirror": {{ "reflective": 1.0, "shininess": 100 }} }},
        "shapes": [
            {{ "type": "sphere", "material": "mirror" }},
            {{ "type": "plane", "material": "mirror" }}
        ]
    }}"#, CAMERA)).unwrap();

    let expected = Material {
        reflective: 1.0,
        shininess: 100.0,
        ..Default::default()
    };
    assert_eq!(scene.world.objects[0].material, expected);
    assert_eq!(scene.world.objects[1].material, expected);
    assert_eq!(*scene.world.objects[1].transform(), Matrix4D::identity());
}

#[test]
fn striped_material() {
    let scene = Scene::from_json_str(&format!(r#"{{ {},
        "shapes": [ {{ "type": "plane", "material": {{
            "pattern": {{
                "stripes": [ {{ "hex": "FFFFFF" }}, {{ "rgb": [0, 0, 0] }} ],
                "transforms": [ {{ "scaling": [2, 2, 2] }} ]
            }}
        }} }} ]
    }}"#, CAMERA)).unwrap();

    let pattern = scene.world.objects[0].material.pattern.as_ref().unwrap();
    assert_eq!(pattern.colors(), &[Color::white(), Color::black()][..]);
    assert_eq!(*pattern.transform(), Matrix4D::scaling(2.0, 2.0, 2.0));
}

#[test]
fn light_intensity_defaults_to_white() {
    let scene = Scene::from_json_str(&format!(r#"{{ {},
        "lights": [ {{ "position": [1, 2, 3] }} ]
    }}"#, CAMERA)).unwrap();

    assert_eq!(scene.world.lights,
        vec![PointLight::new(Color::white(), Tuple4D::point(1.0, 2.0, 3.0))]);
}

#[test]
fn unknown_shape_type_is_a_geometry_error() {
    let result = Scene::from_json_str(&format!(r#"{{ {},
        "shapes": [ {{ "type": "teapot" }} ]
    }}"#, CAMERA));

    match result {
        Err(Error::Geometry(_)) => {},
        other => panic!("expected a geometry error, got {:?}", other),
    }
}

#[test]
fn undefined_names_are_scene_errors() {
    let missing_material = Scene::from_json_str(&format!(r#"{{ {},
        "shapes": [ {{ "type": "sphere", "material": "nothing" }} ]
    }}"#, CAMERA));
    let missing_color = Scene::from_json_str(&format!(r#"{{ {},
        "shapes": [ {{ "type": "sphere", "material": {{ "color": "nothing" }} }} ]
    }}"#, CAMERA));

    assert!(matches!(missing_material, Err(Error::Scene(_))));
    assert!(matches!(missing_color, Err(Error::Scene(_))));
}

#[test]
fn singular_shape_transform_is_rejected() {
    let result = Scene::from_json_str(&format!(r#"{{ {},
        "shapes": [ {{ "type": "sphere", "transforms": [ {{ "scaling": [0, 1, 1] }} ] }} ]
    }}"#, CAMERA));

    assert!(matches!(result, Err(Error::NonInvertible { .. })));
}

#[test]
fn malformed_json_is_reported() {
    assert!(matches!(Scene::from_json_str("{ \"camera\": "), Err(Error::Json(_))));
}

#[test]
fn loaded_scene_renders_like_default_world() {
    let scene = Scene::from_json_str(r#"{
        "camera": {
            "hsize": 11, "vsize": 11, "field_of_view": "pi / 2",
            "view_transform": { "from": [0, 0, -5], "to": [0, 0, 0], "up": [0, 1, 0] }
        },
        "lights": [ { "position": [-10, 10, -10] } ],
        "shapes": [
            { "type": "sphere", "material": {
                "color": { "rgb": [204, 255, 153] }, "diffuse": 0.7, "specular": 0.2,
                "shininess": 50
            } },
            { "type": "sphere", "transforms": [ { "scaling": [0.5, 0.5, 0.5] } ] }
        ]
    }"#).unwrap();

    assert_eq!(scene.world, World::default());

    let image = scene.camera.render(&scene.world).unwrap();
    assert_eq!(image.read_pixel(5, 5).unwrap(),
        Color::rgb(0.38066, 0.47583, 0.2855));
}
