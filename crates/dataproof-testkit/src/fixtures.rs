//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use dataproof_core::{
    document_from_value, Document, KeyAlgorithm, Keypair, ProofOptions, PublicKey,
};
use dataproof_loader::{
    bundled, DocumentLoader, RemoteDocument, Result as LoaderResult, StaticLoader,
};
use serde_json::json;

/// `created` timestamp used by every fixture proof.
pub const CREATED: &str = "2024-01-01T00:00:00Z";

/// A test fixture with a keypair and a loader serving the bundled contexts.
pub struct TestFixture {
    pub keypair: Keypair,
    pub loader: Arc<StaticLoader>,
}

impl TestFixture {
    /// Create a new test fixture with a random keypair.
    pub fn new(algorithm: KeyAlgorithm) -> Self {
        Self {
            keypair: Keypair::generate(algorithm),
            loader: bundled_loader(),
        }
    }

    /// Create with a deterministic keypair from seed.
    pub fn with_seed(algorithm: KeyAlgorithm, seed: [u8; 32]) -> Self {
        Self {
            keypair: Keypair::from_seed(algorithm, &seed).expect("seed is a valid secret key"),
            loader: bundled_loader(),
        }
    }

    /// Get the keypair's public key.
    pub fn public_key(&self) -> PublicKey {
        self.keypair.public_key()
    }

    /// The loader as a trait object, ready to hand to a cryptosuite.
    pub fn loader(&self) -> Arc<dyn DocumentLoader> {
        self.loader.clone()
    }

    /// `did:key` verification method of the fixture key.
    pub fn verification_method(&self) -> String {
        self.public_key().to_did_key()
    }

    /// Proof options for `cryptosuite` with a fixed `created`.
    pub fn options(&self, cryptosuite: &str) -> ProofOptions {
        ProofOptions::new(cryptosuite, self.verification_method()).created(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
                .single()
                .expect("valid timestamp"),
        )
    }
}

/// Create multiple test fixtures for multi-party tests.
pub fn multi_party_fixtures(count: usize, algorithm: KeyAlgorithm) -> Vec<TestFixture> {
    (0..count)
        .map(|i| TestFixture::with_seed(algorithm, [i as u8 + 1; 32]))
        .collect()
}

/// A loader serving the bundled context snapshots.
pub fn bundled_loader() -> Arc<StaticLoader> {
    Arc::new(StaticLoader::bundled().expect("bundled contexts parse"))
}

/// Options for the scenario credential: `did:example:1#key-1`, fixed
/// `created`.
pub fn scenario_options(cryptosuite: &str) -> ProofOptions {
    let mut options = ProofOptions::new(cryptosuite, "did:example:1#key-1");
    options.created = Some(CREATED.to_string());
    options
}

/// The minimal credential used by the end-to-end scenarios.
pub fn sample_credential() -> Document {
    document_from_value(json!({
        "@context": [bundled::CREDENTIALS_V2],
        "id": "urn:test:1",
        "type": ["VerifiableCredential"],
        "issuer": "did:example:1",
        "credentialSubject": "did:example:2"
    }))
    .expect("object literal")
}

/// A credential with nested blank nodes and arrays, for selective
/// disclosure.
pub fn employee_credential() -> Document {
    document_from_value(json!({
        "@context": [
            bundled::CREDENTIALS_V2,
            {"@vocab": "https://example.org/vocab#"}
        ],
        "type": ["VerifiableCredential", "EmployeeCredential"],
        "issuer": "did:example:issuer",
        "validFrom": "2024-01-01T00:00:00Z",
        "credentialSubject": {
            "name": "Pat Doe",
            "jobTitle": "Engineer",
            "employer": {
                "name": "Example Corp",
                "location": {"city": "Springfield", "country": "US"}
            },
            "skills": [
                {"skill": "rust", "level": 4},
                {"skill": "cryptography", "level": 3}
            ]
        }
    }))
    .expect("object literal")
}

// ─────────────────────────────────────────────────────────────────────────────
// Loaders
// ─────────────────────────────────────────────────────────────────────────────

/// Wraps a loader and counts loads per reference.
pub struct CountingLoader<L> {
    inner: L,
    counts: Mutex<HashMap<String, usize>>,
}

impl<L: DocumentLoader> CountingLoader<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            counts: Mutex::new(HashMap::new()),
        }
    }

    /// How many times `reference` was loaded.
    pub fn count(&self, reference: &str) -> usize {
        self.counts
            .lock()
            .expect("counter lock")
            .get(reference)
            .copied()
            .unwrap_or(0)
    }

    /// Loads across all references.
    pub fn total(&self) -> usize {
        self.counts.lock().expect("counter lock").values().sum()
    }
}

#[async_trait]
impl<L: DocumentLoader> DocumentLoader for CountingLoader<L> {
    async fn load(&self, reference: &str) -> LoaderResult<RemoteDocument> {
        *self
            .counts
            .lock()
            .expect("counter lock")
            .entry(reference.to_string())
            .or_default() += 1;
        self.inner.load(reference).await
    }
}

/// A loader that never answers.
pub struct StalledLoader;

#[async_trait]
impl DocumentLoader for StalledLoader {
    async fn load(&self, _reference: &str) -> LoaderResult<RemoteDocument> {
        std::future::pending().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_fixtures_are_stable() {
        let a = TestFixture::with_seed(KeyAlgorithm::Ed25519, [7; 32]);
        let b = TestFixture::with_seed(KeyAlgorithm::Ed25519, [7; 32]);
        assert_eq!(a.public_key(), b.public_key());
        assert!(a.verification_method().starts_with("did:key:z6Mk"));
    }

    #[test]
    fn test_multi_party() {
        let parties = multi_party_fixtures(3, KeyAlgorithm::P256);

        // Each party has unique keys
        let pks: Vec<_> = parties.iter().map(|p| p.public_key()).collect();
        assert_ne!(pks[0], pks[1]);
        assert_ne!(pks[1], pks[2]);
        assert_ne!(pks[0], pks[2]);
    }

    #[test]
    fn test_options_have_fixed_created() {
        let fixture = TestFixture::new(KeyAlgorithm::Ed25519);
        let options = fixture.options("eddsa-rdfc-2022");
        assert_eq!(options.created.as_deref(), Some(CREATED));
        assert_eq!(scenario_options("eddsa-rdfc-2022").created.as_deref(), Some(CREATED));
    }

    #[tokio::test]
    async fn test_counting_loader() {
        let loader = CountingLoader::new(StaticLoader::bundled().unwrap());
        loader.load(bundled::CREDENTIALS_V2).await.unwrap();
        loader.load(bundled::CREDENTIALS_V2).await.unwrap();
        assert!(loader.load("urn:missing").await.is_err());
        assert_eq!(loader.count(bundled::CREDENTIALS_V2), 2);
        assert_eq!(loader.total(), 3);
    }
}
