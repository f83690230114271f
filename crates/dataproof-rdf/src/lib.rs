//! # Dataproof RDF
//!
//! Deterministic canonical serialization of JSON-LD documents.
//!
//! A document goes through four stages:
//!
//! 1. **Prefetch** - every remote context is loaded once through the
//!    injected [`DocumentLoader`](dataproof_loader::DocumentLoader)
//! 2. **Expansion** - a JSON-LD 1.1 subset, strict about anything it cannot
//!    represent
//! 3. **toRDF** - expanded nodes become [`Quad`]s
//! 4. **Labeling** - RDFC-1.0 assigns canonical blank node labels and the
//!    quads are serialized as sorted N-Quads
//!
//! Only the first stage suspends. Everything after it is synchronous and
//! pure.
//!
//! ## Key Types
//!
//! - [`Canonicalizer`] - Document in, [`CanonicalForm`] out
//! - [`CanonicalForm`] - Canonically labeled, sorted quads
//! - [`canonicalize_quads`] - Labeling alone, for quads built elsewhere

pub mod canon;
pub mod canonicalizer;
pub mod context;
pub mod error;
pub mod expand;
mod iri;
pub mod prefetch;
pub mod quad;
pub mod to_rdf;

pub use canon::{
    canonicalize_quads, CanonicalForm, CanonicalizationAlgorithm, CanonicalizationOptions,
    IdentifierIssuer, CANONICAL_PREFIX,
};
pub use canonicalizer::Canonicalizer;
pub use error::{RdfError, Result};
pub use prefetch::{ContextOptions, DEFAULT_MAX_REMOTE_CONTEXTS};
pub use quad::{parse_nquads, to_nquads, Escaping, Literal, Object, Quad, Subject};
