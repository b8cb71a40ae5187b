//! Error types shared by the tracer.

use thiserror::Error;

/// Result type for tracer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building a scene or rendering it.
///
/// Hitting the reflection/refraction depth limit is not an error; those
/// paths return black.
#[derive(Error, Debug)]
pub enum Error {
    /// A transform was required to be invertible but its determinant is zero.
    #[error("matrix is not invertible (determinant {determinant})")]
    NonInvertible { determinant: f64 },

    /// A view transform was requested with `up` parallel to the view direction.
    #[error("view transform is degenerate: up vector is parallel to the view direction")]
    DegenerateView,

    /// Unknown shape kind or malformed shape specification.
    #[error("invalid shape: {0}")]
    Geometry(String),

    /// Malformed scene description (bad names, values or structure).
    #[error("invalid scene: {0}")]
    Scene(String),

    /// A pixel came out as NaN or infinite.
    #[error("pixel ({x}, {y}) produced a non-finite color")]
    NonFinitePixel { x: usize, y: usize },

    /// A render worker thread panicked before finishing its work.
    #[error("render worker panicked")]
    WorkerPanicked,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
