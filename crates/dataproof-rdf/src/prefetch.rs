//! Remote context prefetch.
//!
//! Loading is the only suspension point of canonicalization. Every remote
//! context reachable from the input is fetched up front, once, so expansion
//! itself can run as a pure synchronous pass over [`ContextSet`].

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use dataproof_loader::DocumentLoader;
use serde_json::Value;
use tracing::debug;

use crate::error::{RdfError, Result};

/// Default limit on distinct remote contexts per canonicalization call.
pub const DEFAULT_MAX_REMOTE_CONTEXTS: usize = 32;

/// Limits applied while resolving remote contexts.
#[derive(Debug, Clone)]
pub struct ContextOptions {
    /// Per-fetch timeout. `None` waits indefinitely.
    pub loader_timeout: Option<Duration>,
    /// Maximum number of distinct remote contexts one call may load.
    pub max_remote_contexts: usize,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            loader_timeout: Some(Duration::from_secs(10)),
            max_remote_contexts: DEFAULT_MAX_REMOTE_CONTEXTS,
        }
    }
}

/// The remote contexts loaded for one canonicalization call, by URL.
#[derive(Debug, Clone, Default)]
pub struct ContextSet {
    documents: HashMap<String, Value>,
}

impl ContextSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The loaded document for `url`.
    pub fn get(&self, url: &str) -> Option<&Value> {
        self.documents.get(url)
    }

    pub fn insert(&mut self, url: impl Into<String>, document: Value) {
        self.documents.insert(url.into(), document);
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Load every remote context reachable from `roots`.
///
/// Each URL is fetched at most once. A loader failure, a timeout, or more
/// than `max_remote_contexts` distinct URLs aborts the whole call.
pub async fn prefetch(
    loader: &dyn DocumentLoader,
    roots: &[&Value],
    options: &ContextOptions,
) -> Result<ContextSet> {
    let mut queue = VecDeque::new();
    for root in roots {
        collect_references(root, &mut queue);
    }

    let mut contexts = ContextSet::new();
    while let Some(url) = queue.pop_front() {
        if contexts.get(&url).is_some() {
            continue;
        }
        if contexts.len() >= options.max_remote_contexts {
            return Err(RdfError::ContextResolution(format!(
                "more than {} remote contexts referenced",
                options.max_remote_contexts
            )));
        }

        debug!(url = %url, "loading remote context");
        let fetch = loader.load(&url);
        let loaded = match options.loader_timeout {
            Some(limit) => tokio::time::timeout(limit, fetch).await.map_err(|_| {
                RdfError::ContextResolution(format!("timed out after {limit:?} loading {url}"))
            })?,
            None => fetch.await,
        };
        let remote = loaded.map_err(|source| RdfError::Loader {
            url: url.clone(),
            source,
        })?;

        collect_references(&remote.document, &mut queue);
        contexts.insert(url, remote.document);
    }
    Ok(contexts)
}

/// Find every remote context URL a document can pull in: its top-level and
/// node-level `@context` entries and the scoped contexts of their term
/// definitions. Value objects are literal data and are not searched.
fn collect_references(value: &Value, out: &mut VecDeque<String>) {
    match value {
        Value::Object(map) if map.contains_key("@value") => {}
        Value::Object(map) => {
            for (key, child) in map {
                if key == "@context" {
                    collect_from_context(child, out);
                } else {
                    collect_references(child, out);
                }
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect_references(item, out)),
        _ => {}
    }
}

fn collect_from_context(context: &Value, out: &mut VecDeque<String>) {
    match context {
        Value::String(url) => out.push_back(url.clone()),
        Value::Array(items) => items.iter().for_each(|item| collect_from_context(item, out)),
        Value::Object(map) => {
            let scoped = map
                .iter()
                .filter(|(term, _)| !term.starts_with('@'))
                .filter_map(|(_, definition)| definition.get("@context"));
            scoped.for_each(|child| collect_from_context(child, out));
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataproof_loader::{LoaderError, RemoteDocument, StaticLoader};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLoader {
        inner: StaticLoader,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl DocumentLoader for CountingLoader {
        async fn load(&self, reference: &str) -> dataproof_loader::Result<RemoteDocument> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.load(reference).await
        }
    }

    struct StalledLoader;

    #[async_trait::async_trait]
    impl DocumentLoader for StalledLoader {
        async fn load(&self, _reference: &str) -> dataproof_loader::Result<RemoteDocument> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(LoaderError::NotFound("never".into()))
        }
    }

    #[tokio::test]
    async fn test_fetch_once_including_nested() {
        let loader = CountingLoader {
            inner: StaticLoader::new()
                .with_document("urn:ctx:a", json!({"@context": ["urn:ctx:b", {"x": "urn:x"}]}))
                .with_document(
                    "urn:ctx:b",
                    json!({"@context": {"T": {"@id": "urn:T", "@context": "urn:ctx:a"}}}),
                ),
            calls: AtomicUsize::new(0),
        };
        let document = json!({
            "@context": ["urn:ctx:a", "urn:ctx:a"],
            "nested": {"@context": "urn:ctx:b"}
        });

        let contexts = prefetch(&loader, &[&document], &ContextOptions::default())
            .await
            .unwrap();
        assert_eq!(contexts.len(), 2);
        assert_eq!(loader.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_literal_data_is_not_searched() {
        let loader = CountingLoader {
            inner: StaticLoader::new().with_document(
                "urn:ctx:scoped",
                json!({"@context": {"@vocab": "urn:v#"}}),
            ),
            calls: AtomicUsize::new(0),
        };
        let document = json!({
            "@context": {
                "@vocab": "urn:v#",
                "@base": "urn:ctx:base",
                "Badge": {"@id": "urn:Badge", "@context": "urn:ctx:scoped"},
                "note": {"@id": "urn:note", "@type": "urn:t", "extra": {"@context": "urn:ctx:term-field"}}
            },
            "note": {"@value": "x", "@context": "urn:ctx:in-value"},
            "items": [{"@value": {"@context": "urn:ctx:in-value"}}]
        });

        let contexts = prefetch(&loader, &[&document], &ContextOptions::default())
            .await
            .unwrap();
        assert_eq!(contexts.len(), 1);
        assert!(contexts.get("urn:ctx:scoped").is_some());
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_context_is_loader_error() {
        let document = json!({"@context": "https://example.com/missing"});
        let result = prefetch(&StaticLoader::new(), &[&document], &ContextOptions::default()).await;
        assert!(matches!(result, Err(RdfError::Loader { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_context_resolution_error() {
        let document = json!({"@context": "https://example.com/slow"});
        let options = ContextOptions {
            loader_timeout: Some(Duration::from_millis(50)),
            ..Default::default()
        };
        let result = prefetch(&StalledLoader, &[&document], &options).await;
        assert!(matches!(result, Err(RdfError::ContextResolution(_))));
    }

    #[tokio::test]
    async fn test_context_limit() {
        let loader = StaticLoader::new()
            .with_document("urn:ctx:1", json!({"@context": {}}))
            .with_document("urn:ctx:2", json!({"@context": {}}));
        let document = json!({"@context": ["urn:ctx:1", "urn:ctx:2"]});
        let options = ContextOptions {
            max_remote_contexts: 1,
            ..Default::default()
        };
        let result = prefetch(&loader, &[&document], &options).await;
        assert!(matches!(result, Err(RdfError::ContextResolution(_))));
    }
}
