//! Error types for canonicalization.

use dataproof_loader::LoaderError;
use thiserror::Error;

/// Errors raised while turning a document into a canonical form.
#[derive(Debug, Error)]
pub enum RdfError {
    /// A remote context could not be resolved.
    #[error("context resolution failed: {0}")]
    ContextResolution(String),

    /// A term in the document does not expand to an absolute IRI.
    #[error("unresolvable term: {0}")]
    UndefinedTerm(String),

    /// A context is structurally invalid (bad term definition, protected
    /// term redefinition, recursive inclusion).
    #[error("invalid context: {0}")]
    InvalidContext(String),

    /// The document loader failed for a referenced context.
    #[error("failed to load {url}: {source}")]
    Loader {
        url: String,
        #[source]
        source: LoaderError,
    },

    /// A value cannot be represented as RDF without dropping data.
    #[error("malformed value: {0}")]
    MalformedValue(String),

    /// A JSON-LD feature outside the supported subset.
    #[error("unsupported JSON-LD feature: {0}")]
    Unsupported(String),

    /// Blank node labeling needed more work than allowed.
    #[error("canonicalization work limit exceeded: {limit} deep iterations for one blank node")]
    WorkLimitExceeded { limit: usize },
}

impl RdfError {
    /// Whether the error follows from the content of the document itself,
    /// as opposed to loading or resource limits.
    pub fn is_content_error(&self) -> bool {
        matches!(
            self,
            Self::UndefinedTerm(_)
                | Self::InvalidContext(_)
                | Self::MalformedValue(_)
                | Self::Unsupported(_)
        )
    }
}

/// Result type for canonicalization.
pub type Result<T> = std::result::Result<T, RdfError>;
