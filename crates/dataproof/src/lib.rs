//! # Dataproof
//!
//! Data Integrity proofs for JSON-LD documents: canonicalize, hash, sign,
//! verify.
//!
//! ## Overview
//!
//! A proof binds a document and a set of proof options to a key:
//!
//! - **Canonicalization**: the document and the proof configuration are each
//!   turned into canonical N-Quads (RDFC-1.0)
//! - **Hashing**: `hashData = SHA-256(config) ‖ SHA-256(document)`
//! - **Signing**: the issuer key signs `hashData`; the signature is
//!   multibase-encoded into `proofValue`
//!
//! Verification repeats the first two steps on the secured document with its
//! `proofValue` stripped and checks the signature.
//!
//! ## Cryptosuites
//!
//! - `eddsa-rdfc-2022`: Ed25519
//! - `ecdsa-rdfc-2019`: ECDSA P-256
//! - `ecdsa-sd-2023`: ECDSA P-256 with selective disclosure. The issuer
//!   creates a base proof, the holder derives a proof over a subset of the
//!   statements, the verifier checks the derived proof.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use dataproof::core::{document_from_value, KeyAlgorithm, Keypair, ProofOptions};
//! use dataproof::loader::StaticLoader;
//! use dataproof::Cryptosuite;
//!
//! async fn example() {
//!     let loader = Arc::new(StaticLoader::bundled().unwrap());
//!     let suite = Cryptosuite::eddsa_rdfc_2022(loader);
//!     let keypair = Keypair::generate(KeyAlgorithm::Ed25519);
//!
//!     let document = document_from_value(serde_json::json!({
//!         "@context": ["https://www.w3.org/ns/credentials/v2"],
//!         "type": ["VerifiableCredential"],
//!         "issuer": "did:example:1",
//!         "credentialSubject": "did:example:2"
//!     }))
//!     .unwrap();
//!
//!     let options = ProofOptions::new("eddsa-rdfc-2022", keypair.public_key().to_did_key())
//!         .created_now();
//!     let secured = suite.add_proof(&document, &options, &keypair).await.unwrap();
//!
//!     let result = suite
//!         .verify_proof(&secured, &keypair.public_key())
//!         .await
//!         .unwrap();
//!     assert!(result.verified);
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `dataproof::core` - Digests, keys, multibase, proof options
//! - `dataproof::loader` - Document loaders and bundled contexts
//! - `dataproof::rdf` - JSON-LD to RDF and canonicalization
//! - `dataproof::sd` - Selective disclosure building blocks

mod disclosure;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod suite;

// Re-export component crates
pub use dataproof_core as core;
pub use dataproof_loader as loader;
pub use dataproof_rdf as rdf;
pub use dataproof_sd as sd;

// Re-export main types for convenience
pub use config::SuiteConfig;
pub use error::{ErrorCode, ProofError, Result};
pub use pipeline::PipelineState;
pub use suite::{Cryptosuite, CryptosuiteKind, SuiteId, VerificationResult};

// Re-export commonly used core types
pub use dataproof_core::{
    Document, KeyAlgorithm, Keypair, Proof, ProofOptions, PublicKey, Signature,
};
