//! # Dataproof Core
//!
//! Pure primitives for Data Integrity proofs: digests, key material,
//! signatures, multibase encoding, and the proof option data model.
//!
//! This crate contains no I/O, no document loading, no canonicalization. It is
//! pure computation over byte strings and JSON values.
//!
//! ## Key Types
//!
//! - [`Sha256Hash`] - Fixed-length digest used to build the signed message
//! - [`Keypair`] / [`PublicKey`] - Ed25519 and P-256 key material
//! - [`Signature`] - A 64-byte signature (Ed25519 or fixed-width ECDSA)
//! - [`ProofOptions`] / [`Proof`] - How a proof is made, and the made proof
//!
//! ## Multibase
//!
//! Proof values and public keys travel as self-describing text. See the
//! [`multibase`] module.

pub mod crypto;
pub mod digest;
pub mod document;
pub mod error;
pub mod multibase;
pub mod proof;
pub mod validation;

pub use crypto::{KeyAlgorithm, Keypair, PublicKey, Signature};
pub use digest::{HashAlgorithm, Sha256Hash};
pub use document::{attach_proof, document_from_value, split_proof, Document};
pub use error::{CoreError, Result, ValidationError};
pub use multibase::Base;
pub use proof::{Proof, ProofOptions, ASSERTION_METHOD, DATA_INTEGRITY_PROOF};
pub use validation::{check_expiry, validate_proof_options};
