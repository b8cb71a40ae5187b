pub mod consts;
pub mod error;

pub mod tuple;
pub mod matrix;
pub mod color;

pub mod ray;
pub mod shape;
pub mod intersect;

pub mod pattern;
pub mod light;

pub mod world;
pub mod camera;
pub mod parallel;

pub mod canvas;
pub mod scene;

pub use error::{ Error, Result };

use consts::FEQ_EPSILON;

/// Compares two floats, allowing for accumulated rounding error.
pub fn feq(left: f64, right: f64) -> bool {
    (left - right).abs() < FEQ_EPSILON
}
