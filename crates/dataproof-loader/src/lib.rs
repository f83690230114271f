//! # Dataproof Loader
//!
//! The document loader capability consumed by canonicalization, with
//! in-memory and directory-backed implementations.
//!
//! ## Key Types
//!
//! - [`DocumentLoader`] - The async trait every loader implements
//! - [`RemoteDocument`] - A loaded document plus its URLs
//! - [`StaticLoader`] - In-memory documents, including the bundled contexts
//! - [`DirectoryLoader`] - Documents read from a directory tree
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dataproof_loader::{bundled, DocumentLoader, StaticLoader};
//!
//! async fn example() {
//!     let loader = StaticLoader::bundled().unwrap();
//!     let remote = loader.load(bundled::CREDENTIALS_V2).await.unwrap();
//!     assert!(remote.document["@context"].is_object());
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Fatal failures**: any loader error aborts the canonicalization that
//!   requested the document
//! - **No retries**: retry policy belongs to the loader implementation

pub mod bundled;
pub mod directory;
pub mod error;
pub mod memory;
pub mod traits;

pub use directory::DirectoryLoader;
pub use error::{LoaderError, Result};
pub use memory::StaticLoader;
pub use traits::{DocumentLoader, RemoteDocument};
