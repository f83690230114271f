//! DocumentLoader trait: the injected capability for resolving references.
//!
//! Canonicalization never touches the network or the filesystem directly.
//! Everything it needs to resolve a remote `@context` goes through this trait.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// A document returned by a loader.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteDocument {
    /// The parsed document.
    pub document: Value,
    /// A context linked from the response (HTTP `Link` header), if any.
    pub context_url: Option<String>,
    /// The final URL of the document after any redirects.
    pub document_url: String,
}

impl RemoteDocument {
    /// A document served at `url` with no linked context.
    pub fn new(url: impl Into<String>, document: Value) -> Self {
        Self {
            document,
            context_url: None,
            document_url: url.into(),
        }
    }
}

/// The DocumentLoader trait: async resolution of a reference to a document.
///
/// # Design Notes
///
/// - **No retries**: a failed load is reported once; retry policy belongs to
///   the implementation.
/// - **No caching contract**: callers cache per operation. Implementations may
///   cache across operations but must return consistent documents.
/// - **Cancellation**: callers may drop the future at any await point (for
///   example on timeout).
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Load the document identified by `reference`.
    async fn load(&self, reference: &str) -> Result<RemoteDocument>;
}

#[async_trait]
impl<L: DocumentLoader + ?Sized> DocumentLoader for Arc<L> {
    async fn load(&self, reference: &str) -> Result<RemoteDocument> {
        (**self).load(reference).await
    }
}

#[async_trait]
impl<L: DocumentLoader + ?Sized> DocumentLoader for Box<L> {
    async fn load(&self, reference: &str) -> Result<RemoteDocument> {
        (**self).load(reference).await
    }
}
