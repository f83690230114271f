//! The document canonicalizer: prefetch, expansion, toRDF, labeling.

use std::sync::Arc;

use dataproof_core::Document;
use dataproof_loader::DocumentLoader;
use serde_json::Value;
use tracing::debug;

use crate::canon::{canonicalize_quads, CanonicalForm, CanonicalizationOptions};
use crate::error::Result;
use crate::expand::expand_document;
use crate::prefetch::{prefetch, ContextOptions};
use crate::quad::Quad;
use crate::to_rdf;

/// Turns JSON-LD documents into canonical N-Quads.
///
/// Cheap to clone; the loader is shared. Each call fetches its remote
/// contexts afresh, so results only depend on the document and what the
/// loader returns.
#[derive(Clone)]
pub struct Canonicalizer {
    loader: Arc<dyn DocumentLoader>,
    options: CanonicalizationOptions,
    context_options: ContextOptions,
}

impl Canonicalizer {
    pub fn new(loader: Arc<dyn DocumentLoader>, options: CanonicalizationOptions) -> Self {
        Self {
            loader,
            options,
            context_options: ContextOptions::default(),
        }
    }

    /// Replace the remote context limits.
    pub fn context_options(mut self, context_options: ContextOptions) -> Self {
        self.context_options = context_options;
        self
    }

    pub fn options(&self) -> &CanonicalizationOptions {
        &self.options
    }

    pub fn loader(&self) -> &Arc<dyn DocumentLoader> {
        &self.loader
    }

    /// Canonicalize a document.
    pub async fn canonicalize(&self, document: &Document) -> Result<CanonicalForm> {
        let quads = self.to_quads(document).await?;
        canonicalize_quads(&quads, &self.options)
    }

    /// Canonicalize a document under `context` instead of its own `@context`.
    pub async fn canonicalize_with_context(
        &self,
        document: &Document,
        context: &Value,
    ) -> Result<CanonicalForm> {
        let mut document = document.clone();
        document.insert("@context".to_string(), context.clone());
        self.canonicalize(&document).await
    }

    /// Expand and convert to quads without relabeling blank nodes.
    pub async fn to_quads(&self, document: &Document) -> Result<Vec<Quad>> {
        let root = Value::Object(document.clone());
        let contexts = prefetch(self.loader.as_ref(), &[&root], &self.context_options).await?;
        debug!(remote_contexts = contexts.len(), "contexts resolved");

        let expanded = expand_document(document, &contexts)?;
        to_rdf::to_quads(&expanded)
    }
}

impl std::fmt::Debug for Canonicalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canonicalizer")
            .field("options", &self.options)
            .field("context_options", &self.context_options)
            .finish_non_exhaustive()
    }
}
