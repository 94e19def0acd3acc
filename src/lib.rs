//! Wavefront path tracer.
//!
//! Paths live in a fixed pool and advance one bounce at a time through
//! intersection, optional material sorting, shading and compaction; finished
//! paths are accumulated per pixel and the averaged image can be denoised.

pub mod aabb;
pub mod affine;
pub mod aliases;
pub mod camera;
pub mod compact;
pub mod config;
pub mod denoise;
pub mod error;
pub mod film;
pub mod geometry;
pub mod hit_record;
pub mod intersect;
pub mod material;
pub mod obj_file;
pub mod onb;
pub mod path;
pub mod ray;
pub mod render;
pub mod sampling;
pub mod scatter_record;
pub mod scene;
pub mod shade;
pub mod sort;
pub mod util;

pub use config::{DenoiseMode, RenderSettings};
pub use error::{Error, Result};
pub use film::Frame;
pub use render::{IterationReport, RenderSession};
pub use scene::Scene;
