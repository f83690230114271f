//! Filesystem-backed DocumentLoader.
//!
//! A reference `scheme://host/a/b` is served from `<root>/host/a/b.jsonld`.
//! Only the scheme is dropped; `..` segments and empty references are
//! rejected so a reference can never escape the root directory.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::error::{LoaderError, Result};
use crate::traits::{DocumentLoader, RemoteDocument};

/// File extension appended to every mapped path.
pub const EXTENSION: &str = "jsonld";

/// Loads documents from a directory tree mirroring their URLs.
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    root: PathBuf,
}

impl DirectoryLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory documents are served from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a reference to the file that would serve it.
    pub fn path_for(&self, reference: &str) -> Result<PathBuf> {
        let rest = match reference.split_once("://") {
            Some((_, rest)) => rest,
            None => reference.split_once(':').map(|(_, rest)| rest).unwrap_or(reference),
        };
        let rest = rest.split(['?', '#']).next().unwrap_or_default();
        let rest = rest.trim_end_matches('/');
        if rest.is_empty() {
            return Err(LoaderError::InvalidReference(reference.to_string()));
        }

        let relative = Path::new(rest);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes {
            return Err(LoaderError::InvalidReference(reference.to_string()));
        }

        let mut path = self.root.join(relative).into_os_string();
        path.push(".");
        path.push(EXTENSION);
        Ok(PathBuf::from(path))
    }
}

#[async_trait]
impl DocumentLoader for DirectoryLoader {
    async fn load(&self, reference: &str) -> Result<RemoteDocument> {
        let path = self.path_for(reference)?;
        debug!(reference, path = %path.display(), "loading document from directory");

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LoaderError::NotFound(reference.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let document = serde_json::from_slice(&bytes).map_err(|e| LoaderError::Malformed {
            url: reference.to_string(),
            reason: e.to_string(),
        })?;
        Ok(RemoteDocument::new(reference, document))
    }
}
