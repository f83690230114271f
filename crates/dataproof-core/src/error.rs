//! Error types for Dataproof Core.

use thiserror::Error;

/// Core errors raised by key handling, codecs, and document plumbing.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A key of the wrong length was handed to the signature engine. This is a
    /// caller bug, not a verification outcome.
    #[error("invalid {algorithm} key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        algorithm: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("unsupported multicodec header: {0}")]
    UnsupportedMulticodec(String),

    #[error("decoding error: {0}")]
    Decode(String),

    #[error("malformed document: {0}")]
    MalformedDocument(String),

    #[error("malformed proof: {0}")]
    MalformedProof(String),
}

/// Validation errors for proof options.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("proof type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("cryptosuite mismatch: expected {expected}, got {got}")]
    CryptosuiteMismatch { expected: String, got: String },

    #[error("missing required proof option: {0}")]
    MissingField(&'static str),

    #[error("invalid {field} timestamp: {value}")]
    InvalidTimestamp { field: &'static str, value: String },

    #[error("proof expired at {0}")]
    Expired(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
