use std::ops::{ Add, Sub, Mul };

use crate::feq;
use crate::error::{ Error, Result };

/// A color.
///
/// Represented with red, green and blue channels. Channels are nominally in
/// `0.0..=1.0`, but lighting sums are not clamped; clamping happens when the
/// color is encoded (see `Canvas::write_ppm`).
///
/// # Examples
///
/// ```
/// # use tracer::color::Color;
/// let yellow = Color::rgb(1.0, 1.0, 0.0);
/// let purple = Color::rgb(1.0, 0.0, 1.0);
/// assert_eq!(yellow * purple, Color::red());
/// ```
#[derive(Copy, Clone, Debug, Default)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// Channel-wise equality within `FEQ_EPSILON`.
impl PartialEq for Color {
    fn eq(&self, other: &Color) -> bool {
        feq(self.r, other.r) && feq(self.g, other.g) && feq(self.b, other.b)
    }
}

impl Color {
    pub fn rgb(r: f64, g: f64, b: f64) -> Color {
        Color { r, g, b }
    }

    pub fn black() -> Color {
        Color::rgb(0.0, 0.0, 0.0)
    }

    pub fn white() -> Color {
        Color::rgb(1.0, 1.0, 1.0)
    }

    pub fn red() -> Color {
        Color::rgb(1.0, 0.0, 0.0)
    }

    pub fn green() -> Color {
        Color::rgb(0.0, 1.0, 0.0)
    }

    pub fn blue() -> Color {
        Color::rgb(0.0, 0.0, 1.0)
    }

    /// Parses a six digit hex string such as `"FF0066"` (a leading `#` is
    /// accepted).
    ///
    /// ```
    /// # use tracer::color::Color;
    /// let c = Color::from_hex("#FF0066").unwrap();
    /// assert_eq!(c, Color::rgb(1.0, 0.0, 0.4));
    /// ```
    pub fn from_hex(hex: &str) -> Result<Color> {
        let digits = hex.trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(Error::Scene(format!("invalid hex color {:?}", hex)));
        }

        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map(|v| f64::from(v) / 255.0)
                .map_err(|_| Error::Scene(format!("invalid hex color {:?}", hex)))
        };

        Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// The Hadamard (channel-wise) product. Same as `c1 * c2`.
    pub fn hadamard(c1: &Color, c2: &Color) -> Color {
        Color::rgb(c1.r * c2.r, c1.g * c2.g, c1.b * c2.b)
    }

    pub fn is_finite(&self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite()
    }
}

impl Add<Color> for Color {
    type Output = Color;

    fn add(self, other: Color) -> Color {
        Color::rgb(self.r + other.r, self.g + other.g, self.b + other.b)
    }
}

impl Sub<Color> for Color {
    type Output = Color;

    fn sub(self, other: Color) -> Color {
        Color::rgb(self.r - other.r, self.g - other.g, self.b - other.b)
    }
}

impl Mul<f64> for Color {
    type Output = Color;

    fn mul(self, s: f64) -> Color {
        Color::rgb(self.r * s, self.g * s, self.b * s)
    }
}

impl Mul<Color> for f64 {
    type Output = Color;

    fn mul(self, c: Color) -> Color {
        c * self
    }
}

/// Shorthand for `Color::hadamard`.
impl Mul<Color> for Color {
    type Output = Color;

    fn mul(self, other: Color) -> Color {
        Color::hadamard(&self, &other)
    }
}

impl std::iter::Sum for Color {
    fn sum<I: Iterator<Item = Color>>(iter: I) -> Color {
        iter.fold(Color::black(), |acc, c| acc + c)
    }
}

#[test]
fn add_and_subtract_colors() {
    let c1 = Color::rgb(0.9, 0.6, 0.75);
    let c2 = Color::rgb(0.7, 0.1, 0.25);

    assert_eq!(c1 + c2, Color::rgb(1.6, 0.7, 1.0));
    assert_eq!(c1 - c2, Color::rgb(0.2, 0.5, 0.5));
}

#[test]
fn scale_color() {
    let c = Color::rgb(0.2, 0.3, 0.4);

    assert_eq!(c * 2.0, Color::rgb(0.4, 0.6, 0.8));
    assert_eq!(2.0 * c, c * 2.0);
}

#[test]
fn multiply_colors() {
    let c1 = Color::rgb(1.0, 0.2, 0.4);
    let c2 = Color::rgb(0.9, 1.0, 0.1);

    assert_eq!(c1 * c2, Color::rgb(0.9, 0.2, 0.04));
}

#[test]
fn sum_of_colors() {
    let total: Color = vec![Color::red(), Color::green(), Color::blue()]
        .into_iter()
        .sum();

    assert_eq!(total, Color::white());
}

#[test]
fn bad_hex_colors_are_rejected() {
    assert!(Color::from_hex("12345").is_err());
    assert!(Color::from_hex("GG0000").is_err());
    assert_eq!(Color::from_hex("000000").unwrap(), Color::black());
}
