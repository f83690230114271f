//! # Dataproof Selective Disclosure
//!
//! Building blocks for cryptosuites where a holder reveals only some of the
//! statements an issuer signed.
//!
//! ## Overview
//!
//! The issuer signs every statement of a credential separately. The holder
//! later picks which statements to reveal, and the verifier checks the
//! revealed ones without learning anything about the rest, including how
//! many blank nodes the full credential had.
//!
//! ## Key Concepts
//!
//! - **Pointer selection**: JSON pointers pick the revealed parts of a
//!   compacted document ([`select_json_ld`])
//! - **Skolemization**: blank nodes get temporary IRIs so selections can be
//!   matched back to the full dataset ([`skolemize`])
//! - **Label maps**: canonical blank node labels are replaced by HMAC-derived
//!   labels ([`HmacLabeler`])
//! - **Groups**: statements split into matching / non-matching sets per
//!   pointer list ([`canonicalize_and_group`])
//! - **Proof values**: CBOR envelopes for base and derived proofs
//!   ([`BaseProofValue`], [`DerivedProofValue`])

pub mod cbor;
pub mod error;
pub mod group;
pub mod label;
pub mod pointer;
pub mod proof_value;
pub mod skolem;

pub use error::{DisclosureError, Result};
pub use group::{canonicalize_and_group, hash_statements, Group, GroupedDocument};
pub use label::{
    label_replacement_canonicalize, relabel, DisclosedLabels, HmacLabeler, LabelMap,
    LabelMapFactory,
};
pub use pointer::{parse_pointer, select_json_ld};
pub use proof_value::{
    proof_value_kind, BaseProofValue, DerivedProofValue, ProofValueKind, BASE_PROOF_HEADER,
    DERIVED_PROOF_HEADER,
};
pub use skolem::{deskolemize, skolemize, SKOLEM_PREFIX};
