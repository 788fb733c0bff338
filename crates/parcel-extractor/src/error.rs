//! Error types for the Extractor

use thiserror::Error;

/// Document-level errors
///
/// Per-feature failures never surface here; they become diagnostics on the
/// extraction report.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The feature schema has no entries
    #[error("Feature schema is empty")]
    EmptySchema,

    /// The retrieval backend holds no chunks for the document
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// Every feature failed for backend reasons, or the backend could not be reached
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// The per-document timeout expired before any feature completed
    #[error("Extraction timeout")]
    Timeout,
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::JsonParse(e.to_string())
    }
}
