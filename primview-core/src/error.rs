//! Error types for primview

use thiserror::Error;

/// Main error type for primview operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Malformed mesh at face {face}: {reason}")]
    MalformedMesh { face: usize, reason: String },

    #[error("Scene error: {0}")]
    Scene(String),

    #[error("GPU error: {0}")]
    Gpu(String),

    #[error("Visualization error: {0}")]
    Visualization(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl Error {
    pub(crate) fn malformed(face: usize, reason: impl Into<String>) -> Self {
        Error::MalformedMesh {
            face,
            reason: reason.into(),
        }
    }
}
