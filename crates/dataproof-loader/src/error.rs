//! Error types for document loading.

use thiserror::Error;

/// Errors a document loader can report.
///
/// Any of these is fatal to the canonicalization call that triggered the
/// load.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// No document is known for the reference.
    #[error("document not found: {0}")]
    NotFound(String),

    /// The reference cannot be mapped to a location.
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// The document was found but is not a usable JSON-LD document.
    #[error("malformed document at {url}: {reason}")]
    Malformed { url: String, reason: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;
