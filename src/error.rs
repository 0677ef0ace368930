//! Error types for the risk pipeline
//!
//! ## Table of Contents
//! - **PipelineError**: Main error enum covering all failure modes
//! - **Result**: Type alias for `Result<T, PipelineError>`

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Main error type for pipeline operations
///
/// Per-record problems (malformed rows, unmapped chemicals, missing
/// coordinates) are handled in place and never surface here; these
/// variants cover run-fatal conditions only.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Configuration error during pipeline setup
    #[error("configuration error: {0}")]
    Config(String),

    /// Input file cannot be read as a release inventory at all
    #[error("ingest error: {0}")]
    Ingest(String),

    /// Export artifact could not be produced
    #[error("export error: {0}")]
    Export(String),

    /// Generic IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV format error
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an ingest error
    pub fn ingest(msg: impl Into<String>) -> Self {
        Self::Ingest(msg.into())
    }

    /// Create an export error
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }
}
