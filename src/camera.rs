use log::{ info, warn };

use crate::error::{ Error, Result };
use crate::ray::Ray4D;
use crate::tuple::Tuple4D;
use crate::matrix::Matrix4D;
use crate::world::World;
use crate::canvas::Canvas;

/// A camera record for generating a canvas.
///
/// This record gives a "frame" of the world. The canvas sits one unit in
/// front of the camera, and `field_of_view` decides how much of the world it
/// covers. The transform orients the world relative to the camera (typically
/// a view transformation); its inverse is kept alongside it.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    /// The horizontal size of the resultant canvas.
    pub hsize: usize,

    /// The vertical size of the resultant canvas.
    pub vsize: usize,

    /// The angle describing "how much" the camera can see.
    pub field_of_view: f64,

    transform: Matrix4D,
    inverse: Matrix4D,

    half_width: f64,
    half_height: f64,
    pixel_size: f64,
}

impl Camera {
    /// Creates a camera with the identity view transform.
    pub fn new(hsize: usize, vsize: usize, field_of_view: f64) -> Camera {
        let mut camera = Camera {
            hsize,
            vsize,
            field_of_view,
            transform: Matrix4D::identity(),
            inverse: Matrix4D::identity(),
            half_width: 0.0,
            half_height: 0.0,
            pixel_size: 0.0,
        };
        camera.compute_pixel_size();

        camera
    }

    /// Changes the canvas dimensions, keeping the field of view.
    pub fn set_size(&mut self, hsize: usize, vsize: usize) {
        self.hsize = hsize;
        self.vsize = vsize;
        self.compute_pixel_size();
    }

    fn compute_pixel_size(&mut self) {
        let half_view = (self.field_of_view / 2.0).tan();
        let aspect = (self.hsize as f64) / (self.vsize as f64);

        if aspect >= 1.0 {
            self.half_width = half_view;
            self.half_height = half_view / aspect;
        } else {
            self.half_width = half_view * aspect;
            self.half_height = half_view;
        }

        self.pixel_size = self.half_width * 2.0 / (self.hsize as f64);
    }

    pub fn transform(&self) -> &Matrix4D {
        &self.transform
    }

    pub fn pixel_size(&self) -> f64 {
        self.pixel_size
    }

    /// Sets the world-to-camera transform, rejecting singular matrices.
    pub fn set_transform(&mut self, transform: Matrix4D) -> Result<()> {
        self.inverse = transform.inverse()?;
        self.transform = transform;

        Ok(())
    }

    pub fn with_transform(mut self, transform: Matrix4D) -> Result<Camera> {
        self.set_transform(transform)?;
        Ok(self)
    }

    /// The ray from the camera through the center of a pixel.
    pub fn ray_for_pixel(&self, px: usize, py: usize) -> Ray4D {
        // Offsets from the edge of the canvas to the pixel's center
        let xoffset = (px as f64 + 0.5) * self.pixel_size;
        let yoffset = (py as f64 + 0.5) * self.pixel_size;

        // The untransformed coordinates of the pixel in world space
        let world_x = self.half_width - xoffset;
        let world_y = self.half_height - yoffset;

        let pixel = self.inverse * Tuple4D::point(world_x, world_y, -1.0);
        let origin = self.inverse * Tuple4D::origin();
        let direction = (pixel - origin).normalize();

        Ray4D::new(origin, direction)
    }

    /// Renders a world on the calling thread.
    ///
    /// Stops at the first pixel whose color is not finite.
    pub fn render(&self, w: &World) -> Result<Canvas> {
        info!("rendering {}x{} on the calling thread", self.hsize, self.vsize);
        let mut image = Canvas::new(self.hsize, self.vsize);

        for y in 0..self.vsize {
            for x in 0..self.hsize {
                let color = w.color_at(&self.ray_for_pixel(x, y));
                if !color.is_finite() {
                    warn!("aborting render: pixel ({}, {}) is not finite", x, y);
                    return Err(Error::NonFinitePixel { x, y });
                }

                image.write_pixel(x, y, &color);
            }
        }

        Ok(image)
    }
}

#[test]
fn camera_construction() {
    let c = Camera::new(160, 120, std::f64::consts::FRAC_PI_2);

    assert_eq!(c.hsize, 160);
    assert_eq!(c.vsize, 120);
    assert_eq!(c.field_of_view, std::f64::consts::FRAC_PI_2);
    assert_eq!(*c.transform(), Matrix4D::identity());
}

#[test]
fn pixel_size_for_horizontal_canvas() {
    let c = Camera::new(200, 125, std::f64::consts::FRAC_PI_2);
    assert!(crate::feq(c.pixel_size(), 0.01));
}

#[test]
fn pixel_size_for_vertical_canvas() {
    let c = Camera::new(125, 200, std::f64::consts::FRAC_PI_2);
    assert!(crate::feq(c.pixel_size(), 0.01));
}

#[test]
fn resizing_recomputes_pixel_size() {
    let mut c = Camera::new(100, 100, std::f64::consts::FRAC_PI_2);
    c.set_size(200, 125);

    assert_eq!((c.hsize, c.vsize), (200, 125));
    assert!(crate::feq(c.pixel_size(), 0.01));
}

#[test]
fn ray_through_center() {
    let c = Camera::new(201, 101, std::f64::consts::PI / 2.0);
    let r = c.ray_for_pixel(100, 50);

    assert_eq!(r.origin, Tuple4D::point(0.0, 0.0, 0.0));
    assert_eq!(r.direction, Tuple4D::vector(0.0, 0.0, -1.0));
}

#[test]
fn ray_through_corner() {
    let c = Camera::new(201, 101, std::f64::consts::PI / 2.0);
    let r = c.ray_for_pixel(0, 0);

    assert_eq!(r.origin, Tuple4D::point(0.0, 0.0, 0.0));
    assert_eq!(r.direction, Tuple4D::vector(0.66519, 0.33259, -0.66851));
}

#[test]
fn ray_when_camera_transformed() {
    let c = Camera::new(201, 101, std::f64::consts::PI / 2.0)
        .with_transform(Matrix4D::rotation_y(std::f64::consts::PI / 4.0)
            * Matrix4D::translation(0.0, -2.0, 5.0))
        .unwrap();
    let r = c.ray_for_pixel(100, 50);

    assert_eq!(r.origin, Tuple4D::point(0.0, 2.0, -5.0));
    assert_eq!(r.direction,
        Tuple4D::vector(2.0f64.sqrt() / 2.0, 0.0, -(2.0f64.sqrt() / 2.0)));
}

#[test]
fn singular_camera_transform_is_rejected() {
    let mut c = Camera::new(10, 10, std::f64::consts::FRAC_PI_2);
    assert!(c.set_transform(Matrix4D::zero()).is_err());
    assert_eq!(*c.transform(), Matrix4D::identity());
}

#[test]
fn render_world_with_camera() {
    use crate::color::Color;

    let w = World::default();
    let from = Tuple4D::point(0.0, 0.0, -5.0);
    let to = Tuple4D::point(0.0, 0.0, 0.0);
    let up = Tuple4D::vector(0.0, 1.0, 0.0);
    let c = Camera::new(11, 11, std::f64::consts::PI / 2.0)
        .with_transform(Matrix4D::view_transform(from, to, up).unwrap())
        .unwrap();

    let image = c.render(&w).unwrap();
    assert_eq!(image.read_pixel(5, 5).unwrap(),
        Color::rgb(0.38066, 0.47583, 0.2855));
}
