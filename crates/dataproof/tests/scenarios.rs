//! End-to-end create / verify scenarios.

use std::sync::Arc;
use std::time::Duration;

use dataproof::core::{document_from_value, multibase, Base};
use dataproof::loader::{bundled, StaticLoader};
use dataproof::{
    Cryptosuite, Document, ErrorCode, KeyAlgorithm, Keypair, ProofError, SuiteConfig, SuiteId,
};
use dataproof_testkit::generators::{credential_from_params, reversed, CredentialParams};
use dataproof_testkit::{
    bundled_loader, multi_party_fixtures, scenario_options, CountingLoader, StalledLoader,
    TestFixture,
};
use proptest::prelude::*;
use serde_json::{json, Value};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// The credential from the reference scenario.
fn scenario_document() -> Document {
    document_from_value(json!({
        "@context": ["https://www.w3.org/ns/credentials/v2"],
        "id": "urn:test:1",
        "type": ["VerifiableCredential"],
        "issuer": "did:example:1",
        "credentialSubject": {"id": "did:example:2"}
    }))
    .unwrap()
}

fn eddsa() -> Cryptosuite {
    Cryptosuite::eddsa_rdfc_2022(bundled_loader())
}

// ─────────────────────────────────────────────────────────────────────────────
// Concrete scenarios
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_sign_and_verify_scenario() {
    init_tracing();
    let suite = eddsa();
    let keypair = Keypair::generate(KeyAlgorithm::Ed25519);
    let document = scenario_document();
    let options = scenario_options("eddsa-rdfc-2022");

    let proof = suite.create_proof(&document, &options, &keypair).await.unwrap();
    assert!(proof.proof_value.starts_with('z'));
    assert_eq!(proof.options, options);

    let secured = suite.add_proof(&document, &options, &keypair).await.unwrap();
    let result = suite
        .verify_proof(&secured, &keypair.public_key())
        .await
        .unwrap();
    assert!(result.verified);
    assert_eq!(result.verified_document, Some(document));
}

#[tokio::test]
async fn test_unrelated_key_does_not_verify() {
    let suite = eddsa();
    let signer = Keypair::generate(KeyAlgorithm::Ed25519);
    let stranger = Keypair::generate(KeyAlgorithm::Ed25519);
    let secured = suite
        .add_proof(&scenario_document(), &scenario_options("eddsa-rdfc-2022"), &signer)
        .await
        .unwrap();

    let result = suite
        .verify_proof(&secured, &stranger.public_key())
        .await
        .unwrap();
    assert!(!result.verified);
    assert_eq!(result.verified_document, None);
}

#[tokio::test]
async fn test_wrong_suite_fails_generation() {
    let keypair = Keypair::generate(KeyAlgorithm::Ed25519);
    let options = scenario_options("wrong-suite");

    let err = eddsa()
        .create_proof(&scenario_document(), &options, &keypair)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ProofGeneration);
    assert_eq!(err.code().as_str(), "PROOF_GENERATION_ERROR");
}

#[tokio::test]
async fn test_wrong_type_fails_generation() {
    let keypair = Keypair::generate(KeyAlgorithm::Ed25519);
    let mut options = scenario_options("eddsa-rdfc-2022");
    options.type_ = "Ed25519Signature2020".into();

    let err = eddsa()
        .create_proof(&scenario_document(), &options, &keypair)
        .await
        .unwrap_err();
    assert!(matches!(err, ProofError::ProofGeneration(_)));
}

// ─────────────────────────────────────────────────────────────────────────────
// Tamper sensitivity
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_tampered_subject_does_not_verify() {
    let suite = eddsa();
    let fixture = TestFixture::with_seed(KeyAlgorithm::Ed25519, [9; 32]);
    let document = document_from_value(json!({
        "@context": [bundled::CREDENTIALS_V2, {"@vocab": "https://example.org/vocab#"}],
        "type": ["VerifiableCredential"],
        "issuer": "did:example:1",
        "credentialSubject": {"id": "did:example:2", "name": "Alice", "age": 42}
    }))
    .unwrap();
    let secured = suite
        .add_proof(&document, &fixture.options("eddsa-rdfc-2022"), &fixture.keypair)
        .await
        .unwrap();

    let tampered_subjects = [
        json!({"id": "did:example:2", "name": "Alicf", "age": 42}),
        json!({"id": "did:example:2", "name": "Alice", "age": 43}),
        json!({"id": "did:example:3", "name": "Alice", "age": 42}),
    ];
    for subject in tampered_subjects {
        let mut tampered = secured.clone();
        tampered.insert("credentialSubject".into(), subject);
        let result = suite
            .verify_proof(&tampered, &fixture.public_key())
            .await
            .unwrap();
        assert!(!result.verified);
        assert!(result.verified_document.is_none());
    }
}

/// Every variant of `text` with one byte replaced by a character that tends
/// to break IRIs or term expansion.
fn single_byte_flips(text: &str) -> Vec<String> {
    let mut flips = Vec::new();
    for (i, original) in text.bytes().enumerate() {
        for replacement in *b";@ x#" {
            if replacement == original {
                continue;
            }
            let mut bytes = text.as_bytes().to_vec();
            bytes[i] = replacement;
            if let Ok(flipped) = String::from_utf8(bytes) {
                flips.push(flipped);
            }
        }
    }
    flips
}

#[tokio::test]
async fn test_every_single_byte_subject_flip_is_rejected() {
    init_tracing();
    let suite = eddsa();
    let fixture = TestFixture::with_seed(KeyAlgorithm::Ed25519, [4; 32]);
    let secured = suite
        .add_proof(&scenario_document(), &fixture.options("eddsa-rdfc-2022"), &fixture.keypair)
        .await
        .unwrap();
    let subject = secured["credentialSubject"].as_object().unwrap().clone();

    let mut tampered_subjects = Vec::new();
    for (key, value) in &subject {
        for flipped in single_byte_flips(key) {
            let mut tampered = subject.clone();
            tampered.remove(key);
            tampered.insert(flipped.clone(), value.clone());
            tampered_subjects.push((format!("key {flipped:?}"), tampered));
        }
        for flipped in single_byte_flips(value.as_str().unwrap()) {
            let mut tampered = subject.clone();
            tampered.insert(key.clone(), json!(flipped));
            tampered_subjects.push((format!("value {flipped:?}"), tampered));
        }
    }
    assert_eq!(tampered_subjects.len(), 74);

    for (label, subject) in tampered_subjects {
        let mut tampered = secured.clone();
        tampered.insert("credentialSubject".into(), Value::Object(subject));
        let result = suite
            .verify_proof(&tampered, &fixture.public_key())
            .await
            .unwrap_or_else(|e| panic!("{label} raised {e}"));
        assert!(!result.verified, "{label} verified");
        assert!(result.verified_document.is_none());
    }
}

#[tokio::test]
async fn test_tampered_proof_options_do_not_verify() {
    let suite = eddsa();
    let fixture = TestFixture::new(KeyAlgorithm::Ed25519);
    let mut secured = suite
        .add_proof(&scenario_document(), &fixture.options("eddsa-rdfc-2022"), &fixture.keypair)
        .await
        .unwrap();
    secured["proof"]["created"] = json!("2025-01-01T00:00:00Z");

    let result = suite
        .verify_proof(&secured, &fixture.public_key())
        .await
        .unwrap();
    assert!(!result.verified);
}

#[tokio::test]
async fn test_garbage_proof_value_is_not_an_error() {
    let suite = eddsa();
    let fixture = TestFixture::new(KeyAlgorithm::Ed25519);
    let mut secured = suite
        .add_proof(&scenario_document(), &fixture.options("eddsa-rdfc-2022"), &fixture.keypair)
        .await
        .unwrap();

    for garbage in ["", "not-multibase", "z0OIl", "uAAAA"] {
        secured["proof"]["proofValue"] = json!(garbage);
        let result = suite
            .verify_proof(&secured, &fixture.public_key())
            .await
            .unwrap();
        assert!(!result.verified, "{garbage:?} verified");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Proof value exclusion
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_proof_value_excluded_from_hash_data() {
    let suite = eddsa();
    let fixture = TestFixture::new(KeyAlgorithm::Ed25519);
    let secured = suite
        .add_proof(&scenario_document(), &fixture.options("eddsa-rdfc-2022"), &fixture.keypair)
        .await
        .unwrap();

    let mut garbage = secured.clone();
    garbage["proof"]["proofValue"] = json!("zGarbageGarbageGarbage");

    let valid_hash = suite.hash_data(&secured).await.unwrap();
    let garbage_hash = suite.hash_data(&garbage).await.unwrap();
    assert_eq!(valid_hash, garbage_hash);
    assert_eq!(valid_hash.len(), 64);
}

// ─────────────────────────────────────────────────────────────────────────────
// Structural errors
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_structural_errors_are_thrown() {
    let suite = eddsa();
    let key = Keypair::generate(KeyAlgorithm::Ed25519).public_key();

    // No proof at all.
    let err = suite
        .verify_proof(&scenario_document(), &key)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::MalformedDocument);

    // A proof that is not an object.
    let mut secured = scenario_document();
    secured.insert("proof".into(), json!("zabc"));
    let err = suite.verify_proof(&secured, &key).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::MalformedDocument);

    // A proof from another suite only.
    let mut secured = scenario_document();
    secured.insert(
        "proof".into(),
        json!({
            "type": "DataIntegrityProof",
            "cryptosuite": "ecdsa-rdfc-2019",
            "verificationMethod": "did:example:1#key-1",
            "proofPurpose": "assertionMethod",
            "proofValue": "zabc"
        }),
    );
    let err = suite.verify_proof(&secured, &key).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::ProofTransformation);
}

#[tokio::test]
async fn test_undefined_term_is_context_resolution_error() {
    let keypair = Keypair::generate(KeyAlgorithm::Ed25519);
    // The credentials context maps unknown terms through its @vocab.
    let mut document = scenario_document();
    document.insert(
        "@context".into(),
        json!([bundled::CREDENTIALS_V2, {"@vocab": null}]),
    );
    document.insert("favouriteColour".into(), json!("blue"));

    let err = eddsa()
        .create_proof(&document, &scenario_options("eddsa-rdfc-2022"), &keypair)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ContextResolution);
}

#[tokio::test]
async fn test_unknown_context_is_loader_error() {
    let keypair = Keypair::generate(KeyAlgorithm::Ed25519);
    let mut document = scenario_document();
    document.insert("@context".into(), json!(["https://example.com/missing/v1"]));

    let err = eddsa()
        .create_proof(&document, &scenario_options("eddsa-rdfc-2022"), &keypair)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Loader);
}

// ─────────────────────────────────────────────────────────────────────────────
// Loader behavior
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_loader_timeout_aborts_pipeline() {
    let config = SuiteConfig::default().loader_timeout(Some(Duration::from_millis(50)));
    let suite = Cryptosuite::new(SuiteId::EddsaRdfc2022, Arc::new(StalledLoader), config);
    let keypair = Keypair::generate(KeyAlgorithm::Ed25519);

    let err = suite
        .create_proof(&scenario_document(), &scenario_options("eddsa-rdfc-2022"), &keypair)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ContextResolution);
}

#[tokio::test(start_paused = true)]
async fn test_loader_timeout_on_verify_is_raised() {
    let keypair = Keypair::generate(KeyAlgorithm::Ed25519);
    let secured = eddsa()
        .add_proof(&scenario_document(), &scenario_options("eddsa-rdfc-2022"), &keypair)
        .await
        .unwrap();

    let config = SuiteConfig::default().loader_timeout(Some(Duration::from_millis(50)));
    let suite = Cryptosuite::new(SuiteId::EddsaRdfc2022, Arc::new(StalledLoader), config);
    let err = suite
        .verify_proof(&secured, &keypair.public_key())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ContextResolution);
    assert!(!err.is_content_error());
}

#[tokio::test]
async fn test_context_fetched_once_per_canonicalization() {
    let loader = Arc::new(CountingLoader::new(StaticLoader::bundled().unwrap()));
    let suite = Cryptosuite::eddsa_rdfc_2022(loader.clone());
    let keypair = Keypair::generate(KeyAlgorithm::Ed25519);

    // The same context listed twice.
    let mut document = scenario_document();
    document.insert(
        "@context".into(),
        json!([bundled::CREDENTIALS_V2, bundled::CREDENTIALS_V2]),
    );
    suite
        .create_proof(&document, &scenario_options("eddsa-rdfc-2022"), &keypair)
        .await
        .unwrap();

    // One fetch for the proof configuration, one for the document.
    assert_eq!(loader.count(bundled::CREDENTIALS_V2), 2);
}

// ─────────────────────────────────────────────────────────────────────────────
// Other suites and proof sets
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ecdsa_rdfc_2019_round_trip() {
    let suite = Cryptosuite::ecdsa_rdfc_2019(bundled_loader());
    let fixture = TestFixture::new(KeyAlgorithm::P256);
    let secured = suite
        .add_proof(&scenario_document(), &fixture.options("ecdsa-rdfc-2019"), &fixture.keypair)
        .await
        .unwrap();
    assert_eq!(secured["proof"]["cryptosuite"], "ecdsa-rdfc-2019");

    let result = suite
        .verify_proof(&secured, &fixture.public_key())
        .await
        .unwrap();
    assert!(result.verified);

    // An Ed25519 key never verifies a P-256 proof.
    let ed = Keypair::generate(KeyAlgorithm::Ed25519).public_key();
    assert!(!suite.verify_proof(&secured, &ed).await.unwrap().verified);
}

#[tokio::test]
async fn test_proof_set_verifies_if_any_proof_does() {
    let suite = eddsa();
    let parties = multi_party_fixtures(2, KeyAlgorithm::Ed25519);
    let document = scenario_document();

    let once = suite
        .add_proof(&document, &parties[0].options("eddsa-rdfc-2022"), &parties[0].keypair)
        .await
        .unwrap();
    let twice = suite
        .add_proof(&once, &parties[1].options("eddsa-rdfc-2022"), &parties[1].keypair)
        .await
        .unwrap();
    assert_eq!(twice["proof"].as_array().map(Vec::len), Some(2));

    for party in &parties {
        let result = suite.verify_proof(&twice, &party.public_key()).await.unwrap();
        assert!(result.verified);
        assert_eq!(result.verified_document.as_ref(), Some(&document));
    }
    let stranger = Keypair::generate(KeyAlgorithm::Ed25519).public_key();
    assert!(!suite.verify_proof(&twice, &stranger).await.unwrap().verified);
}

#[tokio::test]
async fn test_proof_set_ignores_other_suites() {
    let fixture = TestFixture::new(KeyAlgorithm::Ed25519);
    let p256 = TestFixture::new(KeyAlgorithm::P256);
    let ecdsa = Cryptosuite::ecdsa_rdfc_2019(bundled_loader());

    let once = ecdsa
        .add_proof(&scenario_document(), &p256.options("ecdsa-rdfc-2019"), &p256.keypair)
        .await
        .unwrap();
    let twice = eddsa()
        .add_proof(&once, &fixture.options("eddsa-rdfc-2022"), &fixture.keypair)
        .await
        .unwrap();

    let result = eddsa()
        .verify_proof(&twice, &fixture.public_key())
        .await
        .unwrap();
    assert!(result.verified);
    assert!(ecdsa.verify_proof(&twice, &p256.public_key()).await.unwrap().verified);
}

#[tokio::test]
async fn test_signature_decodes_to_64_bytes() {
    let keypair = Keypair::generate(KeyAlgorithm::Ed25519);
    let proof = eddsa()
        .create_proof(&scenario_document(), &scenario_options("eddsa-rdfc-2022"), &keypair)
        .await
        .unwrap();
    let bytes = multibase::decode_expected(Base::Base58Btc, &proof.proof_value).unwrap();
    assert_eq!(bytes.len(), 64);
}

#[tokio::test]
async fn test_concurrent_calls_share_a_suite() {
    let suite = Arc::new(eddsa());
    let keypair = Arc::new(Keypair::generate(KeyAlgorithm::Ed25519));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let suite = suite.clone();
            let keypair = keypair.clone();
            tokio::spawn(async move {
                let mut document = scenario_document();
                document.insert("id".into(), json!(format!("urn:test:{i}")));
                let secured = suite
                    .add_proof(&document, &scenario_options("eddsa-rdfc-2022"), &keypair)
                    .await
                    .unwrap();
                suite
                    .verify_proof(&secured, &keypair.public_key())
                    .await
                    .unwrap()
                    .verified
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap());
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Properties
// ─────────────────────────────────────────────────────────────────────────────

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn test_canonical_form_ignores_member_order(params: CredentialParams) {
        let document = credential_from_params(&params);
        let suite = eddsa();
        let rt = runtime();
        let a = rt.block_on(suite.canonicalizer().canonicalize(&document)).unwrap();
        let b = rt.block_on(suite.canonicalizer().canonicalize(&reversed(&document))).unwrap();
        prop_assert_eq!(a.to_nquads(), b.to_nquads());
    }

    #[test]
    fn test_signed_credentials_verify(params: CredentialParams, seed in any::<[u8; 32]>()) {
        let document = credential_from_params(&params);
        let keypair = Keypair::from_seed(KeyAlgorithm::Ed25519, &seed).unwrap();
        let suite = eddsa();
        let rt = runtime();
        let secured = rt
            .block_on(suite.add_proof(&document, &scenario_options("eddsa-rdfc-2022"), &keypair))
            .unwrap();
        let result = rt.block_on(suite.verify_proof(&secured, &keypair.public_key())).unwrap();
        prop_assert!(result.verified);
        prop_assert_eq!(result.verified_document, Some(document));
    }
}
