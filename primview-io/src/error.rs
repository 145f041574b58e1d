//! Error types for I/O operations

use thiserror::Error;

/// Errors that can occur while reading a scene
#[derive(Error, Debug)]
pub enum IoError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid file format: {format}")]
    InvalidFormat { format: String },

    #[error("Parse error at {line}:{column}: {message}")]
    ParseError {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("OBJ error: {0}")]
    Obj(#[from] obj::ObjError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IoError {
    pub(crate) fn parse(line: usize, column: usize, message: impl Into<String>) -> Self {
        IoError::ParseError {
            line,
            column,
            message: message.into(),
        }
    }
}

impl From<IoError> for primview_core::Error {
    fn from(e: IoError) -> Self {
        match e {
            IoError::Io(io) => primview_core::Error::Io(io),
            IoError::InvalidFormat { format } => primview_core::Error::UnsupportedFormat(format),
            other => primview_core::Error::Scene(other.to_string()),
        }
    }
}
