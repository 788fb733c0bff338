//! Error taxonomy of the external backends
//!
//! The extractor decides retry behaviour from these variants alone, so every
//! backend implementation must map its failures onto them.

use std::time::Duration;
use thiserror::Error;

/// Why a generation call failed permanently
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalKind {
    /// Credentials rejected
    Authentication,
    /// The request itself is invalid (bad parameters, prompt too long)
    MalformedRequest,
    /// The requested model does not exist or is not available to the caller
    ModelNotAvailable,
    /// The backend answered, but not in a shape we can read
    InvalidResponse,
}

/// Errors returned by a generation backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    /// Network or server-side failure that may succeed on retry
    #[error("Transient generation failure: {0}")]
    Transient(String),

    /// The provider throttled the call
    #[error("Rate limit exceeded")]
    RateLimited {
        /// Delay suggested by the provider, if any
        retry_after: Option<Duration>,
    },

    /// Failure that will not go away on retry
    #[error("Fatal generation failure ({kind:?}): {message}")]
    Fatal {
        /// Failure class
        kind: FatalKind,
        /// Provider message
        message: String,
    },
}

impl GenerationError {
    /// Shorthand for a fatal error
    pub fn fatal(kind: FatalKind, message: impl Into<String>) -> Self {
        GenerationError::Fatal {
            kind,
            message: message.into(),
        }
    }

    /// True for the classes the retry policy may retry
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::Transient(_) | GenerationError::RateLimited { .. }
        )
    }
}

/// Errors returned by a retrieval backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RetrievalError {
    /// Backend cannot be reached
    #[error("Retrieval backend unavailable: {0}")]
    Unavailable(String),

    /// The query was rejected
    #[error("Invalid query: {0}")]
    Query(String),

    /// The query could not be embedded
    #[error("Embedding error: {0}")]
    Embedding(String),
}
