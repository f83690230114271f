//! In-memory implementation of the DocumentLoader trait.
//!
//! Serves documents registered ahead of time. No network, no filesystem.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::bundled;
use crate::error::{LoaderError, Result};
use crate::traits::{DocumentLoader, RemoteDocument};

/// In-memory loader keyed by exact reference string.
///
/// Thread-safe via RwLock; documents can be added while the loader is shared.
#[derive(Default)]
pub struct StaticLoader {
    documents: RwLock<HashMap<String, Value>>,
}

impl StaticLoader {
    /// Create an empty loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader preloaded with the bundled context snapshots.
    pub fn bundled() -> Result<Self> {
        let mut documents = HashMap::new();
        for (url, document) in bundled::contexts()? {
            documents.insert(url.to_string(), document);
        }
        Ok(Self {
            documents: RwLock::new(documents),
        })
    }

    /// Register a document (builder form, before the loader is shared).
    pub fn with_document(mut self, url: impl Into<String>, document: Value) -> Self {
        self.documents.get_mut().insert(url.into(), document);
        self
    }

    /// Register a document on a shared loader.
    pub async fn insert(&self, url: impl Into<String>, document: Value) {
        self.documents.write().await.insert(url.into(), document);
    }

    /// Number of registered documents.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl DocumentLoader for StaticLoader {
    async fn load(&self, reference: &str) -> Result<RemoteDocument> {
        let documents = self.documents.read().await;
        documents
            .get(reference)
            .map(|document| RemoteDocument::new(reference, document.clone()))
            .ok_or_else(|| LoaderError::NotFound(reference.to_string()))
    }
}
