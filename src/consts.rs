// Floating point comparisons
pub const FEQ_EPSILON: f64 = 0.0001;

// Offset applied along the surface normal for over/under points
pub const SURFACE_EPSILON: f64 = 0.0001;

// Rays with a smaller local Y component are treated as parallel to a plane
pub const PLANE_EPSILON: f64 = 0.0001;

// Maximum number of reflection/refraction bounces per primary ray
pub const MAX_DEPTH: usize = 5;

// Number of pixel coordinates handed to a render worker at once
pub const PIXEL_BATCH_SIZE: usize = 500;

// Camera defaults when a scene omits them
pub const DEFAULT_HSIZE: usize = 160;
pub const DEFAULT_VSIZE: usize = 120;

// Environment variable overriding the render worker count
pub const NUM_THREADS_ENV: &str = "TRACER_NUM_THREADS";

// Common refraction indices
pub const VACUUM_RI: f64 = 1.0;
pub const GLASS_RI: f64 = 1.5;
