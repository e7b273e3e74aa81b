use std::path::PathBuf;
use thiserror::Error;

/// Structured error types for the dataset cleaning application.
///
/// Each variant captures context specific to its error domain (filesystem,
/// image processing, model operations, etc.), providing diagnostic detail
/// without requiring callers to parse error strings.
#[derive(Error, Debug)]
pub enum CleanError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Filesystem error: {operation} failed for {path:?}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Image processing error: {operation} failed (file: {path})")]
    ImageProcessing {
        path: String,
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Model error: {operation} failed")]
    Model {
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {field} {reason}")]
    Validation { field: String, reason: String },

    /// The user declined the destination-overwrite confirmation. A normal
    /// termination path, not a processing failure.
    #[error("aborted: destination overwrite declined")]
    Aborted,
}

pub type Result<T> = std::result::Result<T, CleanError>;

/// Convert I/O errors to filesystem errors.
///
/// Some I/O errors occur without specific path/operation context. Code that
/// has context should construct `CleanError::FileSystem` directly with the
/// specific path and operation.
impl From<std::io::Error> for CleanError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("unknown"),
            operation: "unknown".to_string(),
            source: err,
        }
    }
}

/// Convert image crate errors to image processing errors.
impl From<image::ImageError> for CleanError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageProcessing {
            path: "unknown".to_string(),
            operation: "image processing".to_string(),
            source: Box::new(err),
        }
    }
}

/// Convert ONNX Runtime errors to model errors.
impl From<ort::Error> for CleanError {
    fn from(err: ort::Error) -> Self {
        Self::Model {
            operation: "ort operation".to_string(),
            source: Box::new(err),
        }
    }
}

/// Convert ndarray shape errors to model errors.
///
/// Shape errors occur during tensor operations which are part of model
/// inference, so they are categorized as model errors rather than getting a
/// separate tensor error type.
impl From<ndarray::ShapeError> for CleanError {
    fn from(err: ndarray::ShapeError) -> Self {
        Self::Model {
            operation: "tensor shape conversion".to_string(),
            source: Box::new(err),
        }
    }
}
