//! Bundled context snapshots.
//!
//! Offline copies of the contexts every Data Integrity document uses. Serving
//! these locally keeps canonicalization deterministic and network-free.

use serde_json::Value;

use crate::error::{LoaderError, Result};

/// W3C Verifiable Credentials Data Model v2.0 context.
pub const CREDENTIALS_V2: &str = "https://www.w3.org/ns/credentials/v2";

/// Data Integrity v2 context.
pub const DATA_INTEGRITY_V2: &str = "https://w3id.org/security/data-integrity/v2";

/// Multikey v1 context.
pub const MULTIKEY_V1: &str = "https://w3id.org/security/multikey/v1";

const SNAPSHOTS: [(&str, &str); 3] = [
    (CREDENTIALS_V2, include_str!("../contexts/credentials-v2.jsonld")),
    (DATA_INTEGRITY_V2, include_str!("../contexts/data-integrity-v2.jsonld")),
    (MULTIKEY_V1, include_str!("../contexts/multikey-v1.jsonld")),
];

/// Parse every bundled snapshot, paired with its URL.
pub fn contexts() -> Result<Vec<(&'static str, Value)>> {
    SNAPSHOTS
        .iter()
        .map(|(url, text)| {
            let document = serde_json::from_str(text).map_err(|e| LoaderError::Malformed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
            Ok((*url, document))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshots_parse() {
        let contexts = contexts().unwrap();
        assert_eq!(contexts.len(), 3);
    }

    #[test]
    fn test_shared_definitions_identical() {
        // Both contexts define DataIntegrityProof as a protected term, so the
        // definitions must match exactly for them to be used together.
        let contexts = contexts().unwrap();
        let find = |url: &str| {
            contexts
                .iter()
                .find(|(u, _)| *u == url)
                .map(|(_, doc)| doc["@context"]["DataIntegrityProof"].clone())
                .unwrap()
        };
        assert_eq!(find(CREDENTIALS_V2), find(DATA_INTEGRITY_V2));
    }
}
