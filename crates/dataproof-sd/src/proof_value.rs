//! Base and derived proof value envelopes.
//!
//! Both are multibase base64url (`u`) text over a three-byte header followed
//! by one CBOR array:
//!
//! ```text
//! base:    d9 5d 00 || [baseSignature, publicKey, hmacKey, signatures, mandatoryPointers]
//! derived: d9 5d 01 || [baseSignature, publicKey, signatures, labelMap, mandatoryIndexes]
//! ```

use ciborium::value::Value as Cbor;
use dataproof_core::multibase::{self, Base};

use crate::cbor;
use crate::error::{DisclosureError, Result};
use crate::label::{compress_label_map, decompress_label_map, LabelMap};

/// Header of a base proof value.
pub const BASE_PROOF_HEADER: [u8; 3] = [0xd9, 0x5d, 0x00];

/// Header of a derived proof value.
pub const DERIVED_PROOF_HEADER: [u8; 3] = [0xd9, 0x5d, 0x01];

/// Which envelope a proof value holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofValueKind {
    Base,
    Derived,
}

/// Read the envelope kind without parsing the body.
pub fn proof_value_kind(proof_value: &str) -> Result<ProofValueKind> {
    let bytes = multibase::decode_expected(Base::Base64UrlNoPad, proof_value)?;
    match bytes.get(..3) {
        Some(header) if header == BASE_PROOF_HEADER => Ok(ProofValueKind::Base),
        Some(header) if header == DERIVED_PROOF_HEADER => Ok(ProofValueKind::Derived),
        _ => Err(DisclosureError::InvalidProofValue("unknown proof value header".into())),
    }
}

/// What the issuer hands the holder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseProofValue {
    pub base_signature: Vec<u8>,
    /// Ephemeral public key, multicodec-prefixed.
    pub public_key: Vec<u8>,
    pub hmac_key: Vec<u8>,
    /// One signature per non-mandatory statement, in statement order.
    pub signatures: Vec<Vec<u8>>,
    pub mandatory_pointers: Vec<String>,
}

impl BaseProofValue {
    pub fn encode(&self) -> Result<String> {
        let body = Cbor::Array(vec![
            Cbor::Bytes(self.base_signature.clone()),
            Cbor::Bytes(self.public_key.clone()),
            Cbor::Bytes(self.hmac_key.clone()),
            Cbor::Array(self.signatures.iter().cloned().map(Cbor::Bytes).collect()),
            Cbor::Array(self.mandatory_pointers.iter().cloned().map(Cbor::Text).collect()),
        ]);
        envelope(BASE_PROOF_HEADER, &body)
    }

    pub fn decode(proof_value: &str) -> Result<Self> {
        let items = open(BASE_PROOF_HEADER, proof_value)?;
        let [base_signature, public_key, hmac_key, signatures, mandatory_pointers] =
            <[Cbor; 5]>::try_from(items).map_err(|items| {
                DisclosureError::InvalidProofValue(format!(
                    "base proof has {} components, expected 5",
                    items.len()
                ))
            })?;

        Ok(Self {
            base_signature: bytes(base_signature, "baseSignature")?,
            public_key: bytes(public_key, "publicKey")?,
            hmac_key: bytes(hmac_key, "hmacKey")?,
            signatures: array(signatures, "signatures")?
                .into_iter()
                .map(|s| bytes(s, "signature"))
                .collect::<Result<_>>()?,
            mandatory_pointers: array(mandatory_pointers, "mandatoryPointers")?
                .into_iter()
                .map(|p| match p {
                    Cbor::Text(text) => Ok(text),
                    _ => Err(DisclosureError::InvalidProofValue(
                        "mandatory pointer is not text".into(),
                    )),
                })
                .collect::<Result<_>>()?,
        })
    }
}

/// What the holder hands the verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedProofValue {
    pub base_signature: Vec<u8>,
    pub public_key: Vec<u8>,
    /// Signatures of the disclosed non-mandatory statements.
    pub signatures: Vec<Vec<u8>>,
    /// Canonical label to HMAC label for every disclosed blank node.
    pub label_map: LabelMap,
    /// Positions of the mandatory statements among the disclosed ones.
    pub mandatory_indexes: Vec<usize>,
}

impl DerivedProofValue {
    pub fn encode(&self) -> Result<String> {
        let body = Cbor::Array(vec![
            Cbor::Bytes(self.base_signature.clone()),
            Cbor::Bytes(self.public_key.clone()),
            Cbor::Array(self.signatures.iter().cloned().map(Cbor::Bytes).collect()),
            compress_label_map(&self.label_map)?,
            Cbor::Array(
                self.mandatory_indexes
                    .iter()
                    .map(|&i| Cbor::Integer((i as u64).into()))
                    .collect(),
            ),
        ]);
        envelope(DERIVED_PROOF_HEADER, &body)
    }

    pub fn decode(proof_value: &str) -> Result<Self> {
        let items = open(DERIVED_PROOF_HEADER, proof_value)?;
        let [base_signature, public_key, signatures, label_map, mandatory_indexes] =
            <[Cbor; 5]>::try_from(items).map_err(|items| {
                DisclosureError::InvalidProofValue(format!(
                    "derived proof has {} components, expected 5",
                    items.len()
                ))
            })?;

        Ok(Self {
            base_signature: bytes(base_signature, "baseSignature")?,
            public_key: bytes(public_key, "publicKey")?,
            signatures: array(signatures, "signatures")?
                .into_iter()
                .map(|s| bytes(s, "signature"))
                .collect::<Result<_>>()?,
            label_map: decompress_label_map(&label_map)?,
            mandatory_indexes: array(mandatory_indexes, "mandatoryIndexes")?
                .into_iter()
                .map(|i| match i {
                    Cbor::Integer(n) => usize::try_from(i128::from(n)).map_err(|_| {
                        DisclosureError::InvalidProofValue("mandatory index out of range".into())
                    }),
                    _ => Err(DisclosureError::InvalidProofValue(
                        "mandatory index is not an integer".into(),
                    )),
                })
                .collect::<Result<_>>()?,
        })
    }
}

fn envelope(header: [u8; 3], body: &Cbor) -> Result<String> {
    let mut bytes = header.to_vec();
    bytes.extend_from_slice(&cbor::encode(body)?);
    Ok(multibase::encode(Base::Base64UrlNoPad, bytes))
}

fn open(header: [u8; 3], proof_value: &str) -> Result<Vec<Cbor>> {
    let bytes = multibase::decode_expected(Base::Base64UrlNoPad, proof_value)?;
    let body = bytes
        .strip_prefix(header.as_slice())
        .ok_or_else(|| DisclosureError::InvalidProofValue("unexpected proof value header".into()))?;
    match cbor::decode(body)? {
        Cbor::Array(items) => Ok(items),
        _ => Err(DisclosureError::InvalidProofValue("proof value body is not an array".into())),
    }
}

fn bytes(value: Cbor, field: &str) -> Result<Vec<u8>> {
    match value {
        Cbor::Bytes(bytes) => Ok(bytes),
        _ => Err(DisclosureError::InvalidProofValue(format!("{field} is not a byte string"))),
    }
}

fn array(value: Cbor, field: &str) -> Result<Vec<Cbor>> {
    match value {
        Cbor::Array(items) => Ok(items),
        _ => Err(DisclosureError::InvalidProofValue(format!("{field} is not an array"))),
    }
}
