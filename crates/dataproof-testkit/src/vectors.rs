//! Golden test vectors for deterministic verification.
//!
//! These vectors pin the canonical N-Quads and the signed bytes, so any
//! change to expansion, labeling or hashing shows up as a vector mismatch.

use dataproof_core::{document_from_value, Document};
use serde_json::Value;

/// A golden canonicalization vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// The input document as JSON text.
    pub document: &'static str,
    /// Expected canonical N-Quads.
    pub expected_nquads: &'static str,
}

impl GoldenVector {
    /// Parse the input document.
    pub fn document(&self) -> Document {
        let value: Value = serde_json::from_str(self.document).expect("vector JSON parses");
        document_from_value(value).expect("vector is an object")
    }
}

/// Get all golden canonicalization vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "Scenario credential",
            document: r#"{
                "@context": ["https://www.w3.org/ns/credentials/v2"],
                "id": "urn:test:1",
                "type": ["VerifiableCredential"],
                "issuer": "did:example:1",
                "credentialSubject": "did:example:2"
            }"#,
            expected_nquads: concat!(
                "<urn:test:1> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <https://www.w3.org/2018/credentials#VerifiableCredential> .\n",
                "<urn:test:1> <https://www.w3.org/2018/credentials#credentialSubject> <did:example:2> .\n",
                "<urn:test:1> <https://www.w3.org/2018/credentials#issuer> <did:example:1> .\n",
            ),
        },
        GoldenVector {
            name: "Scenario proof configuration",
            document: r#"{
                "@context": ["https://www.w3.org/ns/credentials/v2"],
                "type": "DataIntegrityProof",
                "cryptosuite": "eddsa-rdfc-2022",
                "created": "2024-01-01T00:00:00Z",
                "verificationMethod": "did:example:1#key-1",
                "proofPurpose": "assertionMethod"
            }"#,
            expected_nquads: concat!(
                "_:c14n0 <http://purl.org/dc/terms/created> \"2024-01-01T00:00:00Z\"^^<http://www.w3.org/2001/XMLSchema#dateTime> .\n",
                "_:c14n0 <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <https://w3id.org/security#DataIntegrityProof> .\n",
                "_:c14n0 <https://w3id.org/security#cryptosuite> \"eddsa-rdfc-2022\"^^<https://w3id.org/security#cryptosuiteString> .\n",
                "_:c14n0 <https://w3id.org/security#proofPurpose> <https://w3id.org/security#assertionMethod> .\n",
                "_:c14n0 <https://w3id.org/security#verificationMethod> <did:example:1#key-1> .\n",
            ),
        },
        GoldenVector {
            name: "Nested blank node",
            document: r#"{
                "@context": {"@vocab": "https://example.org/vocab#"},
                "name": "outer",
                "child": {"name": "inner", "count": 2}
            }"#,
            expected_nquads: concat!(
                "_:c14n0 <https://example.org/vocab#count> \"2\"^^<http://www.w3.org/2001/XMLSchema#integer> .\n",
                "_:c14n0 <https://example.org/vocab#name> \"inner\" .\n",
                "_:c14n1 <https://example.org/vocab#child> _:c14n0 .\n",
                "_:c14n1 <https://example.org/vocab#name> \"outer\" .\n",
            ),
        },
    ]
}

/// A golden `eddsa-rdfc-2022` proof: Ed25519 signatures are deterministic,
/// so the whole proof value is fixed.
#[derive(Debug, Clone)]
pub struct ProofVector {
    pub name: &'static str,
    /// Ed25519 seed of the issuer key.
    pub seed: [u8; 32],
    /// Expected Multikey of the issuer public key.
    pub public_multikey: &'static str,
    /// Expected `hashData`, hex.
    pub hash_data: &'static str,
    /// Expected `proofValue`.
    pub proof_value: &'static str,
}

/// The scenario credential signed with the `0x42` seed and scenario options.
pub fn scenario_proof_vector() -> ProofVector {
    ProofVector {
        name: "Scenario credential, eddsa-rdfc-2022",
        seed: [0x42; 32],
        public_multikey: "z6MkghLt1e8m1fmANsdJJco3aCLV8Xnigr5UWwC3u5iZFPd3",
        hash_data: concat!(
            "2d7028507c3e9f816ac6985af9bfe88c34e1b7ca33b17a627945aac9ba8a7347",
            "8add7c4aa063ea89f767b43d3c9a39c304fd1e3ab0aad81c74eae525cfb86b5b",
        ),
        proof_value: "zgQDfXb8EF1xep4tZ3wU9BiF8tpQ6B26fiUtqEpYC7dwQqYUqYUWUmyFZcZ2sXRGrtUNw29HkUscX3vtYj1pvwrW",
    }
}
