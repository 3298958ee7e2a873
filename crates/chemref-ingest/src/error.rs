//! Error types for dataset ingestion

use crate::hierarchy::HierarchyError;
use chemref_common::ChemrefError;

/// Result type for ingest operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Error types for fetching, parsing and caching reference datasets
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Download error: {0}")]
    Download(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Common(#[from] ChemrefError),

    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl IngestError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn fetch(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.into(),
        }
    }
}
