use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Failed to load frame {}: {reason}", path.display())]
    LoadError { path: PathBuf, reason: String },

    #[error("Invalid raster: {0}")]
    InvalidRaster(String),

    #[error("Failed to resize frame: {0}")]
    ResizeError(String),

    #[error("Failed to quantize frame: {0}")]
    QuantizeError(String),

    #[error("No input frames found: {0}")]
    EmptySequenceError(String),

    #[error("Failed to encode animation: {0}")]
    EncodeError(String),

    #[error("Invalid configuration: {0}")]
    ConfigValidationError(String),

    #[error("Conversion cancelled")]
    Cancelled,

    #[error("Conversion worker panicked")]
    WorkerPanicked,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ConversionError {
    pub(crate) fn load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ConversionError::LoadError {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConversionError>;
