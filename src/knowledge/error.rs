//! Knowledge base error types.

use std::path::PathBuf;

/// Errors raised inside the knowledge base.
///
/// Public manager operations log these and convert them to sentinels; they
/// only surface directly from lower-level helpers.
#[derive(thiserror::Error, Debug)]
pub enum KnowledgeError {
    /// The registry is misconfigured.
    #[error("Invalid registry: {0}")]
    InvalidRegistry(String),

    /// A file that should exist on disk does not.
    #[error("File not found: {path}")]
    NotFound { path: PathBuf },

    /// Payload was expected to be JSON but did not parse.
    #[error("Invalid JSON in {path}: {reason}")]
    InvalidJson { path: PathBuf, reason: String },

    /// Specification document is valid JSON but not an object.
    #[error("Specification at {path} is not a JSON object")]
    NotAnObject { path: PathBuf },

    /// Failed to write a file.
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl KnowledgeError {
    /// Whether this error means the file simply is not there yet.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
