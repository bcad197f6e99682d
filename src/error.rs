// error.rs - errors for the peripheral, fallible paths (config files, image decode)

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PanoError {
    #[error("IO error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parsing error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("Invalid {name}: {value} (must be finite and > 0)")]
    InvalidRate { name: &'static str, value: f32 },

    #[error("Failed to decode image '{path}': {message}")]
    Image { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, PanoError>;

impl PanoError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PanoError::Io {
            path: path.into(),
            source,
        }
    }
}
