//! Codec error types.

use thiserror::Error;

use crate::frame::FrameError;

/// Errors raised by attribute codecs.
#[derive(Error, Debug)]
pub enum Error {
    /// The codec does not implement an operation
    #[error("Codec {codec} does not support {operation}")]
    Unsupported {
        codec: &'static str,
        operation: &'static str,
    },

    /// The codec can only load when given the model type
    #[error("Codec {codec} needs a model type to load")]
    ModelRequired { codec: &'static str },

    /// The value handed to save is not a shape the codec writes
    #[error("Codec {codec} expected {expected}, got {actual}")]
    ValueMismatch {
        codec: &'static str,
        expected: &'static str,
        actual: &'static str,
    },

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Safetensors error
    #[error("Safetensors error: {0}")]
    SafeTensors(#[from] safetensors::SafeTensorError),

    /// Array shape error
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// Frame construction error
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),

    /// Malformed frame or series encoding
    #[error("Invalid frame data: {0}")]
    InvalidFrame(String),

    /// A document does not satisfy its model schema
    #[error("Validation failed for {model}: {message}")]
    Validation { model: String, message: String },

    /// I/O error on the entry stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic codec error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an invalid frame error.
    pub fn invalid_frame(msg: impl Into<String>) -> Self {
        Self::InvalidFrame(msg.into())
    }
}

/// Result type alias for codec operations.
pub type Result<T> = std::result::Result<T, Error>;
