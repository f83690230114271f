//! Error types for selective disclosure.

use dataproof_core::CoreError;
use dataproof_rdf::RdfError;
use thiserror::Error;

/// Errors that can occur while selecting, grouping or encoding disclosures.
#[derive(Debug, Error)]
pub enum DisclosureError {
    /// A JSON pointer is not syntactically valid.
    #[error("invalid JSON pointer {0:?}")]
    InvalidPointer(String),

    /// A JSON pointer does not match anything in the document.
    #[error("JSON pointer {0:?} does not match the document")]
    PointerNotFound(String),

    /// A blank node has no entry in the label map.
    #[error("blank node {0} has no label")]
    MissingLabel(String),

    /// Selected statements contain blank nodes whose identity cannot be kept.
    #[error("selection contains an anonymous blank node {0} (list or graph container)")]
    AnonymousBlankNode(String),

    /// A proof value is not a well-formed base or derived envelope.
    #[error("invalid proof value: {0}")]
    InvalidProofValue(String),

    /// CBOR encoding or decoding failed.
    #[error("CBOR error: {0}")]
    Cbor(String),

    /// Canonicalization error.
    #[error("canonicalization error: {0}")]
    Rdf(#[from] RdfError),

    /// Core error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
}

/// Result type for selective disclosure operations.
pub type Result<T> = std::result::Result<T, DisclosureError>;
