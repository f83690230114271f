//! Blank node label maps.
//!
//! Canonical labels (`c14n0`, `c14n1`, ...) leak the shape of the full
//! dataset, so the issuer replaces them with HMAC-derived labels before
//! signing statements. Holders pass verifiers only the labels of the blank
//! nodes they reveal.

use std::collections::HashMap;

use ciborium::value::Value as Cbor;
use dataproof_core::multibase::{self, Base};
use dataproof_rdf::{canonicalize_quads, CanonicalizationOptions, Quad, CANONICAL_PREFIX};
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;

use crate::error::{DisclosureError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Blank node label to replacement label, both without `_:`.
pub type LabelMap = HashMap<String, String>;

/// Produces replacement labels from a canonical identifier map.
pub trait LabelMapFactory: Send + Sync {
    /// `canonical_ids` holds `(input label, canonical label)` pairs. The
    /// result maps each input label to its replacement.
    fn label_map(&self, canonical_ids: &[(String, String)]) -> Result<LabelMap>;
}

/// Issuer and holder side: labels are `u` + base64url(HMAC-SHA-256(key,
/// canonical label)).
#[derive(Clone)]
pub struct HmacLabeler {
    key: [u8; 32],
}

impl HmacLabeler {
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// A labeler with a fresh random key.
    pub fn generate() -> Self {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        Self { key }
    }

    pub fn key(&self) -> &[u8; 32] {
        &self.key
    }

    /// The replacement for one canonical label.
    pub fn label(&self, canonical: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| DisclosureError::InvalidProofValue(format!("HMAC key: {e}")))?;
        mac.update(canonical.as_bytes());
        Ok(multibase::encode(Base::Base64UrlNoPad, mac.finalize().into_bytes()))
    }
}

impl std::fmt::Debug for HmacLabeler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("HmacLabeler(..)")
    }
}

impl LabelMapFactory for HmacLabeler {
    fn label_map(&self, canonical_ids: &[(String, String)]) -> Result<LabelMap> {
        canonical_ids
            .iter()
            .map(|(input, canonical)| Ok((input.clone(), self.label(canonical)?)))
            .collect()
    }
}

/// Verifier side: replacement labels come from the disclosed map, keyed by
/// canonical label.
#[derive(Debug, Clone, Copy)]
pub struct DisclosedLabels<'a> {
    by_canonical: &'a LabelMap,
}

impl<'a> DisclosedLabels<'a> {
    pub fn new(by_canonical: &'a LabelMap) -> Self {
        Self { by_canonical }
    }
}

impl LabelMapFactory for DisclosedLabels<'_> {
    fn label_map(&self, canonical_ids: &[(String, String)]) -> Result<LabelMap> {
        canonical_ids
            .iter()
            .map(|(input, canonical)| {
                let label = self
                    .by_canonical
                    .get(canonical)
                    .ok_or_else(|| DisclosureError::MissingLabel(canonical.clone()))?;
                Ok((input.clone(), label.clone()))
            })
            .collect()
    }
}

/// Canonicalize, then swap canonical labels for `factory`'s labels.
///
/// Returns the relabeled N-Quads lines in sorted order, and the map from
/// input labels to replacement labels.
pub fn label_replacement_canonicalize(
    quads: &[Quad],
    options: &CanonicalizationOptions,
    factory: &dyn LabelMapFactory,
) -> Result<(Vec<String>, LabelMap)> {
    let form = canonicalize_quads(quads, options)?;
    let label_map = factory.label_map(form.issued())?;

    let mut by_canonical = HashMap::new();
    for (input, canonical) in form.issued() {
        let label = label_map
            .get(input)
            .ok_or_else(|| DisclosureError::MissingLabel(input.clone()))?;
        by_canonical.insert(canonical.clone(), label.clone());
    }

    let escaping = options.algorithm.escaping();
    let mut lines: Vec<String> = relabel(form.quads(), &by_canonical)?
        .iter()
        .map(|quad| quad.to_nquad(escaping))
        .collect();
    lines.sort();
    Ok((lines, label_map))
}

/// Replace every blank node label through `labels`. Unknown labels fail.
pub fn relabel(quads: &[Quad], labels: &LabelMap) -> Result<Vec<Quad>> {
    for quad in quads {
        if let Some(missing) = quad.blank_labels().find(|l| !labels.contains_key(*l)) {
            return Err(DisclosureError::MissingLabel(missing.to_string()));
        }
    }
    Ok(quads
        .iter()
        .map(|quad| {
            quad.map_blank_labels(|label| {
                labels.get(label).cloned().unwrap_or_else(|| label.to_string())
            })
        })
        .collect())
}

/// Compact a canonical-label map for a derived proof: `c14nN` keys become
/// the integer `N`, `u`-prefixed labels become their raw bytes.
pub fn compress_label_map(by_canonical: &LabelMap) -> Result<Cbor> {
    let mut entries = Vec::with_capacity(by_canonical.len());
    for (canonical, label) in by_canonical {
        let index: u64 = canonical
            .strip_prefix(CANONICAL_PREFIX)
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| {
                DisclosureError::InvalidProofValue(format!("not a canonical label: {canonical}"))
            })?;
        let bytes = multibase::decode_expected(Base::Base64UrlNoPad, label)?;
        entries.push((Cbor::Integer(index.into()), Cbor::Bytes(bytes)));
    }
    Ok(Cbor::Map(entries))
}

/// Inverse of [`compress_label_map`].
pub fn decompress_label_map(compressed: &Cbor) -> Result<LabelMap> {
    let Cbor::Map(entries) = compressed else {
        return Err(DisclosureError::InvalidProofValue("label map is not a map".into()));
    };
    entries
        .iter()
        .map(|(key, value)| match (key, value) {
            (Cbor::Integer(index), Cbor::Bytes(bytes)) => {
                let index: i128 = (*index).into();
                if index < 0 {
                    return Err(DisclosureError::InvalidProofValue(
                        "negative label index".into(),
                    ));
                }
                Ok((
                    format!("{CANONICAL_PREFIX}{index}"),
                    multibase::encode(Base::Base64UrlNoPad, bytes),
                ))
            }
            _ => Err(DisclosureError::InvalidProofValue(
                "label map entry is not integer to bytes".into(),
            )),
        })
        .collect()
}
