// Re-export glam for convenience
pub use glam::*;

// Lumina math types
mod ray;
mod rng;
mod transform;
mod vector;

pub use ray::Ray;
pub use rng::{create_onb, Pcg, PcgSample};
pub use transform::{TransformError, Transformation};
pub use vector::{Color, ColorExt, Normal3, Point3, BLACK, WHITE};
