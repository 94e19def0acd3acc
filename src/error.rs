//! Error types for scene loading and image output.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised before rendering starts or while writing results.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid scene document: {0}")]
    Json(#[from] serde_json::Error),

    /// An object references a material name that is not defined.
    #[error("Object #{object} references unknown material '{name}'")]
    UnknownMaterial { object: usize, name: String },

    /// A type-specific field is missing or out of range.
    #[error("Material '{material}': {reason}")]
    InvalidMaterial { material: String, reason: String },

    #[error("Object #{object}: {reason}")]
    InvalidObject { object: usize, reason: String },

    #[error("Camera: {0}")]
    InvalidCamera(String),

    #[error("Mesh file {path}: {source}")]
    Mesh {
        path: PathBuf,
        #[source]
        source: crate::obj_file::Error,
    },

    #[error("Failed to write image: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, Error>;
