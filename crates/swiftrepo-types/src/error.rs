use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid byte size {input:?}: {reason}")]
    InvalidByteSize { input: String, reason: String },

    #[error("invalid blob path segment {0:?}")]
    InvalidPathSegment(String),
}
