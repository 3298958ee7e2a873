//! Error types shared across the chemref crates

use thiserror::Error;

/// Result type alias for chemref operations
pub type Result<T> = std::result::Result<T, ChemrefError>;

/// Main error type for chemref
#[derive(Error, Debug)]
pub enum ChemrefError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Decompression error: {0}")]
    Decompression(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl ChemrefError {
    /// Create a cache error
    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache(msg.into())
    }
}
