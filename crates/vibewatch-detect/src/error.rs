//! Error types for the detection core

use thiserror::Error;

/// Detection pipeline errors
#[derive(Debug, Error)]
pub enum DetectError {
    /// Malformed or incomplete ingestion payload
    #[error("Validation error: {0}")]
    Validation(String),

    /// Feature vector does not match the model dimension
    #[error("Feature dimension mismatch: expected {expected}, got {actual}")]
    FeatureDimension { expected: usize, actual: usize },

    /// Model parameters are internally inconsistent
    #[error("Invalid model: {0}")]
    ModelShape(String),

    /// Model file could not be read
    #[error("Model IO error: {0}")]
    ModelIo(#[from] std::io::Error),

    /// Model file is not valid JSON
    #[error("Model parse error: {0}")]
    ModelParse(#[from] serde_json::Error),
}

/// Result type alias for detection operations
pub type DetectResult<T> = Result<T, DetectError>;
