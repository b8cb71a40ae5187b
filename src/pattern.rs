use crate::error::{ Error, Result };
use crate::tuple::Tuple4D;
use crate::matrix::Matrix4D;
use crate::color::Color;

/// An alternating stripe pattern applied across the pattern-space X axis.
///
/// For a point `(x, y, z)`, the color used is `colors[floor(x) mod n]`, so
/// with two colors the first covers `0 <= x < 1`, the second `1 <= x < 2`,
/// and so on in both directions. The pattern has its own transform, applied
/// on top of the transform of the shape it is painted on.
#[derive(Clone, Debug, PartialEq)]
pub struct Pattern {
    paint: Paint,
    transform: Matrix4D,
    inverse: Matrix4D,
}

#[derive(Clone, Debug, PartialEq)]
enum Paint {
    Stripes(Vec<Color>),

    /// Paints the pattern-space coordinates themselves, so a test can tell
    /// exactly where a ray landed.
    #[cfg(test)]
    Position,
}

impl Pattern {
    /// Two-color stripes.
    pub fn stripe(primary: Color, secondary: Color) -> Pattern {
        Pattern::new(Paint::Stripes(vec![primary, secondary]))
    }

    /// Stripes cycling through `colors` in order. At least one color is
    /// required.
    pub fn stripes(colors: Vec<Color>) -> Result<Pattern> {
        if colors.is_empty() {
            return Err(Error::Scene("stripe pattern needs at least one color".into()));
        }

        Ok(Pattern::new(Paint::Stripes(colors)))
    }

    /// A pattern whose color at `(x, y, z)` is `rgb(x, y, z)`.
    #[cfg(test)]
    pub(crate) fn position() -> Pattern {
        Pattern::new(Paint::Position)
    }

    fn new(paint: Paint) -> Pattern {
        Pattern {
            paint,
            transform: Matrix4D::identity(),
            inverse: Matrix4D::identity(),
        }
    }

    /// The colors the stripes cycle through.
    pub fn colors(&self) -> &[Color] {
        match self.paint {
            Paint::Stripes(ref colors) => colors.as_slice(),
            #[cfg(test)]
            Paint::Position => &[],
        }
    }

    pub fn transform(&self) -> &Matrix4D {
        &self.transform
    }

    /// Sets the object-to-pattern transform, rejecting singular matrices.
    pub fn set_transform(&mut self, transform: Matrix4D) -> Result<()> {
        self.inverse = transform.inverse()?;
        self.transform = transform;

        Ok(())
    }

    pub fn with_transform(mut self, transform: Matrix4D) -> Result<Pattern> {
        self.set_transform(transform)?;
        Ok(self)
    }

    /// The color at a point already in pattern space.
    pub fn pattern_at(&self, p: Tuple4D) -> Color {
        match self.paint {
            Paint::Stripes(ref colors) => {
                let n = colors.len();
                let idx = p.x.floor().rem_euclid(n as f64) as usize;

                // rem_euclid can round up to exactly `n` for tiny negative inputs
                colors[idx.min(n - 1)]
            },
            #[cfg(test)]
            Paint::Position => Color::rgb(p.x, p.y, p.z),
        }
    }

    /// The color at a world-space point on a shape.
    ///
    /// `object_inverse` is the shape's world-to-object transform; the point
    /// is then carried into pattern space by this pattern's own inverse.
    pub fn pattern_at_object(&self, object_inverse: &Matrix4D,
        world_point: Tuple4D) -> Color {
        let object_point = *object_inverse * world_point;
        self.pattern_at(self.inverse * object_point)
    }
}

#[test]
fn position_pattern_follows_both_transforms() {
    let pattern = Pattern::position()
        .with_transform(Matrix4D::translation(0.5, 1.0, 1.5))
        .unwrap();
    let object = Matrix4D::scaling(2.0, 2.0, 2.0);

    assert_eq!(
        pattern.pattern_at_object(&object.inverse().unwrap(),
            Tuple4D::point(2.5, 3.0, 3.5)),
        Color::rgb(0.75, 0.5, 0.25)
    );
}

#[test]
fn stripe_pattern_is_constant_along_y_and_z() {
    let pattern = Pattern::stripe(Color::white(), Color::black());

    for &(y, z) in [(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (0.0, 1.0), (0.0, 2.0)].iter() {
        assert_eq!(pattern.pattern_at(Tuple4D::point(0.0, y, z)), Color::white());
    }
}

#[test]
fn stripe_pattern_alternates_along_x() {
    let pattern = Pattern::stripe(Color::white(), Color::black());
    let at = |x: f64| pattern.pattern_at(Tuple4D::point(x, 0.0, 0.0));

    assert_eq!(at(0.0), Color::white());
    assert_eq!(at(0.9), Color::white());
    assert_eq!(at(1.0), Color::black());
    assert_eq!(at(-0.1), Color::black());
    assert_eq!(at(-1.0), Color::black());
    assert_eq!(at(-1.1), Color::white());
}

#[test]
fn three_color_stripes_cycle() {
    let pattern = Pattern::stripes(
        vec![Color::red(), Color::green(), Color::blue()]
    ).unwrap();
    let at = |x: f64| pattern.pattern_at(Tuple4D::point(x, 0.0, 0.0));

    assert_eq!(at(0.5), Color::red());
    assert_eq!(at(1.5), Color::green());
    assert_eq!(at(2.5), Color::blue());
    assert_eq!(at(3.5), Color::red());
    assert_eq!(at(-0.5), Color::blue());
}

#[test]
fn empty_stripes_are_rejected() {
    assert!(Pattern::stripes(Vec::new()).is_err());
}

#[test]
fn stripes_with_object_transform() {
    let pattern = Pattern::stripe(Color::white(), Color::black());
    let object = Matrix4D::scaling(2.0, 2.0, 2.0);

    assert_eq!(
        pattern.pattern_at_object(&object.inverse().unwrap(),
            Tuple4D::point(1.5, 0.0, 0.0)),
        Color::white()
    );
}

#[test]
fn stripes_with_pattern_transform() {
    let pattern = Pattern::stripe(Color::white(), Color::black())
        .with_transform(Matrix4D::scaling(2.0, 2.0, 2.0))
        .unwrap();

    assert_eq!(
        pattern.pattern_at_object(&Matrix4D::identity(),
            Tuple4D::point(1.5, 0.0, 0.0)),
        Color::white()
    );
}

#[test]
fn stripes_with_object_and_pattern_transform() {
    let pattern = Pattern::stripe(Color::white(), Color::black())
        .with_transform(Matrix4D::translation(0.5, 0.0, 0.0))
        .unwrap();
    let object = Matrix4D::scaling(2.0, 2.0, 2.0);

    assert_eq!(
        pattern.pattern_at_object(&object.inverse().unwrap(),
            Tuple4D::point(2.5, 0.0, 0.0)),
        Color::white()
    );
}
