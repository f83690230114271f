//! Error types for the proof pipeline.

use std::fmt;

use dataproof_core::CoreError;
use dataproof_rdf::RdfError;
use dataproof_sd::DisclosureError;
use thiserror::Error;

/// Errors that can occur while creating, deriving or verifying proofs.
#[derive(Debug, Error)]
pub enum ProofError {
    /// Proof options do not fit the invoked cryptosuite, or a required field
    /// is missing.
    #[error("proof generation error: {0}")]
    ProofGeneration(String),

    /// The same checks failed during the transform phase, or the input does
    /// not carry a proof this suite can process.
    #[error("proof transformation error: {0}")]
    ProofTransformation(String),

    /// Malformed multibase or CBOR on a path where it is a caller bug.
    #[error("decode error: {0}")]
    Decode(String),

    /// The document is not structurally usable.
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// Canonicalization error.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] RdfError),

    /// Selective disclosure error.
    #[error("selective disclosure error: {0}")]
    Disclosure(#[from] DisclosureError),

    /// Core error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
}

/// The error taxonomy exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ContextResolution,
    ProofGeneration,
    ProofTransformation,
    Decode,
    Loader,
    MalformedDocument,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ContextResolution => "CONTEXT_RESOLUTION_ERROR",
            Self::ProofGeneration => "PROOF_GENERATION_ERROR",
            Self::ProofTransformation => "PROOF_TRANSFORMATION_ERROR",
            Self::Decode => "DECODE_ERROR",
            Self::Loader => "LOADER_ERROR",
            Self::MalformedDocument => "MALFORMED_DOCUMENT",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ProofError {
    /// The taxonomy code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::ProofGeneration(_) => ErrorCode::ProofGeneration,
            Self::ProofTransformation(_) => ErrorCode::ProofTransformation,
            Self::Decode(_) => ErrorCode::Decode,
            Self::MalformedDocument(_) => ErrorCode::MalformedDocument,
            Self::Canonicalization(e) => rdf_code(e),
            Self::Disclosure(e) => disclosure_code(e),
            Self::Core(e) => core_code(e),
        }
    }

    /// Whether the error follows from the content of the document being
    /// checked. On verification these mean the document no longer matches
    /// its proof; loader failures and resource limits do not.
    pub fn is_content_error(&self) -> bool {
        match self {
            Self::Canonicalization(e) | Self::Disclosure(DisclosureError::Rdf(e)) => {
                e.is_content_error()
            }
            Self::Disclosure(e) => matches!(
                e,
                DisclosureError::MissingLabel(_)
                    | DisclosureError::PointerNotFound(_)
                    | DisclosureError::AnonymousBlankNode(_)
            ),
            _ => false,
        }
    }
}

fn rdf_code(error: &RdfError) -> ErrorCode {
    match error {
        RdfError::ContextResolution(_)
        | RdfError::InvalidContext(_)
        | RdfError::UndefinedTerm(_) => ErrorCode::ContextResolution,
        RdfError::Loader { .. } => ErrorCode::Loader,
        RdfError::MalformedValue(_)
        | RdfError::Unsupported(_)
        | RdfError::WorkLimitExceeded { .. } => ErrorCode::MalformedDocument,
    }
}

fn disclosure_code(error: &DisclosureError) -> ErrorCode {
    match error {
        DisclosureError::InvalidPointer(_) | DisclosureError::PointerNotFound(_) => {
            ErrorCode::ProofGeneration
        }
        DisclosureError::MissingLabel(_) | DisclosureError::AnonymousBlankNode(_) => {
            ErrorCode::ProofTransformation
        }
        DisclosureError::InvalidProofValue(_) | DisclosureError::Cbor(_) => ErrorCode::Decode,
        DisclosureError::Rdf(e) => rdf_code(e),
        DisclosureError::Core(e) => core_code(e),
    }
}

fn core_code(error: &CoreError) -> ErrorCode {
    match error {
        CoreError::Decode(_) | CoreError::UnsupportedMulticodec(_) => ErrorCode::Decode,
        CoreError::MalformedDocument(_) | CoreError::MalformedProof(_) => {
            ErrorCode::MalformedDocument
        }
        CoreError::InvalidKeyLength { .. } | CoreError::InvalidPrivateKey(_) => {
            ErrorCode::ProofGeneration
        }
    }
}

/// Result type for proof operations.
pub type Result<T> = std::result::Result<T, ProofError>;

#[cfg(test)]
mod tests {
    use super::*;
    use dataproof_loader::LoaderError;

    #[test]
    fn test_codes() {
        assert_eq!(
            ProofError::ProofGeneration("x".into()).code().as_str(),
            "PROOF_GENERATION_ERROR"
        );
        assert_eq!(
            ProofError::from(RdfError::ContextResolution("t".into())).code(),
            ErrorCode::ContextResolution
        );
        let loader = RdfError::Loader {
            url: "urn:x".into(),
            source: LoaderError::NotFound("urn:x".into()),
        };
        assert_eq!(ProofError::from(loader).code(), ErrorCode::Loader);
        assert_eq!(
            ProofError::from(DisclosureError::Core(CoreError::Decode("bad".into()))).code(),
            ErrorCode::Decode
        );
        assert_eq!(
            ProofError::from(CoreError::MalformedProof("no proof".into())).code(),
            ErrorCode::MalformedDocument
        );
    }

    #[test]
    fn test_content_errors() {
        let loader = RdfError::Loader {
            url: "urn:x".into(),
            source: LoaderError::NotFound("urn:x".into()),
        };
        assert!(!ProofError::from(loader).is_content_error());
        assert!(!ProofError::from(RdfError::ContextResolution("timed out".into())).is_content_error());
        assert!(!ProofError::from(RdfError::WorkLimitExceeded { limit: 1 }).is_content_error());

        assert!(ProofError::from(RdfError::MalformedValue("bad iri".into())).is_content_error());
        let undefined = ProofError::from(RdfError::UndefinedTerm("@d".into()));
        assert!(undefined.is_content_error());
        assert_eq!(undefined.code(), ErrorCode::ContextResolution);
        assert!(ProofError::from(DisclosureError::Rdf(RdfError::Unsupported("x".into())))
            .is_content_error());
        assert!(!ProofError::from(DisclosureError::Cbor("x".into())).is_content_error());
    }
}
