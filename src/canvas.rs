use std::io::{ self, BufWriter, Write };
use std::fs::File;
use std::path::Path;

use crate::error::Result;
use crate::color::Color;

// PPM readers are only required to accept lines up to this length
const PPM_LINE_WIDTH: usize = 70;

/// A canvas for drawing pixels.
///
/// The canvas stores the resultant color for each camera ray. Once a render
/// finishes, it can be written out as a plain-text PPM image.
#[derive(Clone, Default, Debug, PartialEq)]
pub struct Canvas {
    /// The width of the canvas, in pixels.
    pub width: usize,

    /// The height of the canvas, in pixels.
    pub height: usize,

    /// The pixels of the canvas, stored as a flattened row-major vector.
    pixels: Vec<Color>,
}

impl Canvas {
    /// Creates a black canvas with specified width and height.
    pub fn new(width: usize, height: usize) -> Canvas {
        Canvas {
            width,
            height,
            pixels: vec![Color::black(); width * height]
        }
    }

    /// Writes a color to a location on the `Canvas`.
    ///
    /// Out-of-bounds pixels are ignored. `y` is the row of the pixel and `x`
    /// is the column; both are zero-indexed.
    ///
    /// # Examples
    ///
    /// Writing a pixel to the fourth column, second row on an 8-by-8 canvas:
    ///
    /// ```
    /// # use tracer::color::Color;
    /// # use tracer::canvas::Canvas;
    /// let purple = Color::rgb(1.0, 0.0, 1.0);
    /// let mut canvas = Canvas::new(8, 8);
    /// canvas.write_pixel(4, 2, &purple);
    /// assert_eq!(canvas.read_pixel(4, 2).unwrap(), purple);
    /// ```
    pub fn write_pixel(&mut self, x: usize, y: usize, pixel: &Color) {
        if x >= self.width || y >= self.height {
            return;
        }

        self.pixels[(y * self.width) + x] = *pixel;
    }

    /// Reads a color from a location on the `Canvas`, or `None` if the
    /// location is out-of-bounds.
    pub fn read_pixel(&self, x: usize, y: usize) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None
        }

        Some(self.pixels[(y * self.width) + x])
    }

    /// Encodes the canvas as a plain (P3) PPM image.
    ///
    /// Channels are scaled to 0..=255. Every pixel row starts on a new line,
    /// and long rows are wrapped so no line exceeds 70 columns.
    pub fn write_ppm<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "P3")?;
        writeln!(out, "{} {}", self.width, self.height)?;
        writeln!(out, "255")?;

        for row in self.pixels.chunks(self.width.max(1)) {
            let mut line = String::with_capacity(PPM_LINE_WIDTH);

            for pixel in row {
                for &channel in [pixel.r, pixel.g, pixel.b].iter() {
                    let token = scale_channel(channel).to_string();

                    if line.is_empty() {
                        line.push_str(&token);
                    } else if line.len() + 1 + token.len() > PPM_LINE_WIDTH {
                        writeln!(out, "{}", line)?;
                        line.clear();
                        line.push_str(&token);
                    } else {
                        line.push(' ');
                        line.push_str(&token);
                    }
                }
            }

            writeln!(out, "{}", line)?;
        }

        out.flush()
    }

    /// Saves the canvas to a PPM file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        self.write_ppm(&mut out)?;

        Ok(())
    }
}

/// Maps a channel from the nominal 0.0..=1.0 range to 0..=255, rounding and
/// clamping.
fn scale_channel(c: f64) -> u8 {
    (c * 255.0).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
fn ppm_string(canvas: &Canvas) -> String {
    let mut out = Vec::new();
    canvas.write_ppm(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn new_canvas_is_black() {
    let c = Canvas::new(10, 20);

    assert_eq!(c.width, 10);
    assert_eq!(c.height, 20);
    for y in 0..20 {
        for x in 0..10 {
            assert_eq!(c.read_pixel(x, y), Some(Color::black()));
        }
    }
}

#[test]
fn out_of_bounds_pixels() {
    let mut c = Canvas::new(4, 3);
    c.write_pixel(4, 0, &Color::red());
    c.write_pixel(0, 3, &Color::red());

    assert_eq!(c, Canvas::new(4, 3));
    assert_eq!(c.read_pixel(4, 0), None);
    assert_eq!(c.read_pixel(0, 3), None);
}

#[test]
fn ppm_header() {
    let ppm = ppm_string(&Canvas::new(5, 3));
    let lines: Vec<&str> = ppm.lines().take(3).collect();

    assert_eq!(lines, vec!["P3", "5 3", "255"]);
}

#[test]
fn ppm_pixel_data() {
    let mut c = Canvas::new(5, 3);
    c.write_pixel(0, 0, &Color::rgb(1.5, 0.0, 0.0));
    c.write_pixel(2, 1, &Color::rgb(0.0, 0.5, 0.0));
    c.write_pixel(4, 2, &Color::rgb(-0.5, 0.0, 1.0));

    let ppm = ppm_string(&c);
    let lines: Vec<&str> = ppm.lines().skip(3).collect();

    assert_eq!(lines, vec![
        "255 0 0 0 0 0 0 0 0 0 0 0 0 0 0",
        "0 0 0 0 0 0 0 128 0 0 0 0 0 0 0",
        "0 0 0 0 0 0 0 0 0 0 0 0 0 0 255",
    ]);
}

#[test]
fn ppm_long_lines_are_wrapped() {
    let mut c = Canvas::new(10, 2);
    for y in 0..2 {
        for x in 0..10 {
            c.write_pixel(x, y, &Color::rgb(1.0, 0.8, 0.6));
        }
    }

    let ppm = ppm_string(&c);
    let lines: Vec<&str> = ppm.lines().skip(3).collect();

    let first = "255 204 153 255 204 153 255 204 153 255 204 153 255 204 153 255 204";
    let second = "153 255 204 153 255 204 153 255 204 153 255 204 153";
    assert_eq!(lines, vec![first, second, first, second]);
    assert!(lines.iter().all(|l| l.len() <= 70));
}

#[test]
fn ppm_ends_with_newline() {
    assert!(ppm_string(&Canvas::new(5, 3)).ends_with('\n'));
}
