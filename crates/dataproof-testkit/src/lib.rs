//! # Dataproof Testkit
//!
//! Testing utilities for Dataproof.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known documents with their expected canonical N-Quads
//!   and a fixed `eddsa-rdfc-2022` proof
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Keys, loaders and sample credentials for test scenarios
//!
//! ## Golden Vectors
//!
//! Golden vectors ensure deterministic canonicalization across implementations:
//!
//! ```rust
//! use dataproof_testkit::vectors::all_vectors;
//!
//! for vector in all_vectors() {
//!     let document = vector.document();
//!     println!("{}: {} members", vector.name, document.len());
//! }
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use dataproof_testkit::generators::{credential_from_params, reversed, CredentialParams};
//!
//! proptest! {
//!     #[test]
//!     fn member_order_is_irrelevant(params: CredentialParams) {
//!         let document = credential_from_params(&params);
//!         let shuffled = reversed(&document);
//!         // canonicalize both and compare
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! Quickly set up test scenarios:
//!
//! ```rust
//! use dataproof_core::KeyAlgorithm;
//! use dataproof_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new(KeyAlgorithm::Ed25519);
//! let options = fixture.options("eddsa-rdfc-2022");
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{
    bundled_loader, employee_credential, multi_party_fixtures, sample_credential,
    scenario_options, CountingLoader, StalledLoader, TestFixture, CREATED,
};
pub use generators::{credential_from_params, reversed, BlankGraph, CredentialParams};
pub use vectors::{all_vectors, scenario_proof_vector, GoldenVector, ProofVector};
