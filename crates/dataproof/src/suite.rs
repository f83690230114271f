//! Cryptosuites: the create / verify protocol over the shared components.

use std::fmt;
use std::sync::Arc;

use dataproof_core::multibase::{self, Base};
use dataproof_core::{
    attach_proof, split_proof, validate_proof_options, Document, HashAlgorithm, KeyAlgorithm,
    Keypair, Proof, ProofOptions, PublicKey, DATA_INTEGRITY_PROOF,
};
use dataproof_loader::DocumentLoader;
use dataproof_rdf::Canonicalizer;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::SuiteConfig;
use crate::error::{ProofError, Result};
use crate::pipeline::{Pipeline, PipelineState};

// ─────────────────────────────────────────────────────────────────────────────
// Identifiers
// ─────────────────────────────────────────────────────────────────────────────

/// The cryptosuites this crate implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SuiteId {
    /// Ed25519 over RDFC-1.0 canonical N-Quads.
    EddsaRdfc2022,
    /// ECDSA P-256 over RDFC-1.0 canonical N-Quads.
    EcdsaRdfc2019,
    /// ECDSA P-256 with selective disclosure.
    EcdsaSd2023,
}

impl SuiteId {
    pub const ALL: [SuiteId; 3] = [Self::EddsaRdfc2022, Self::EcdsaRdfc2019, Self::EcdsaSd2023];

    /// The `cryptosuite` string of proofs made by this suite.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EddsaRdfc2022 => "eddsa-rdfc-2022",
            Self::EcdsaRdfc2019 => "ecdsa-rdfc-2019",
            Self::EcdsaSd2023 => "ecdsa-sd-2023",
        }
    }

    /// Look up a suite by its exact `cryptosuite` string.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|suite| suite.as_str() == name)
    }

    /// The key algorithm of the issuer key.
    pub fn key_algorithm(self) -> KeyAlgorithm {
        match self {
            Self::EddsaRdfc2022 => KeyAlgorithm::Ed25519,
            Self::EcdsaRdfc2019 | Self::EcdsaSd2023 => KeyAlgorithm::P256,
        }
    }

    /// The operations this suite offers.
    pub fn kinds(self) -> &'static [CryptosuiteKind] {
        match self {
            Self::EddsaRdfc2022 | Self::EcdsaRdfc2019 => &[CryptosuiteKind::Base],
            Self::EcdsaSd2023 => &[
                CryptosuiteKind::Disclose,
                CryptosuiteKind::Derive,
                CryptosuiteKind::Confirm,
            ],
        }
    }
}

impl fmt::Display for SuiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline variants sharing canonicalization, digests and signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CryptosuiteKind {
    /// Sign and verify whole documents.
    Base,
    /// Issue a base proof that a holder can later derive from.
    Disclose,
    /// Derive a proof over a subset of statements.
    Derive,
    /// Verify a derived proof.
    Confirm,
}

/// Outcome of a verification.
///
/// `verified_document` is only ever set together with `verified == true`.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationResult {
    pub verified: bool,
    pub verified_document: Option<Document>,
}

impl VerificationResult {
    pub(crate) fn success(document: Document) -> Self {
        Self {
            verified: true,
            verified_document: Some(document),
        }
    }

    pub(crate) fn failure() -> Self {
        Self {
            verified: false,
            verified_document: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cryptosuite
// ─────────────────────────────────────────────────────────────────────────────

/// A cryptosuite bound to a document loader.
///
/// Cheap to clone and safe to share across tasks: every call works on its own
/// copies of the inputs.
#[derive(Clone, Debug)]
pub struct Cryptosuite {
    suite: SuiteId,
    canonicalizer: Canonicalizer,
    config: SuiteConfig,
}

impl Cryptosuite {
    pub fn new(suite: SuiteId, loader: Arc<dyn DocumentLoader>, config: SuiteConfig) -> Self {
        let canonicalizer = Canonicalizer::new(loader, config.canonicalization)
            .context_options(config.context_options());
        Self {
            suite,
            canonicalizer,
            config,
        }
    }

    /// `eddsa-rdfc-2022` with default configuration.
    pub fn eddsa_rdfc_2022(loader: Arc<dyn DocumentLoader>) -> Self {
        Self::new(SuiteId::EddsaRdfc2022, loader, SuiteConfig::default())
    }

    /// `ecdsa-rdfc-2019` with default configuration.
    pub fn ecdsa_rdfc_2019(loader: Arc<dyn DocumentLoader>) -> Self {
        Self::new(SuiteId::EcdsaRdfc2019, loader, SuiteConfig::default())
    }

    /// `ecdsa-sd-2023` with default configuration.
    pub fn ecdsa_sd_2023(loader: Arc<dyn DocumentLoader>) -> Self {
        Self::new(SuiteId::EcdsaSd2023, loader, SuiteConfig::default())
    }

    pub fn suite(&self) -> SuiteId {
        self.suite
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    pub fn canonicalizer(&self) -> &Canonicalizer {
        &self.canonicalizer
    }

    pub fn supports(&self, kind: CryptosuiteKind) -> bool {
        self.suite.kinds().contains(&kind)
    }

    pub(crate) fn require(&self, kind: CryptosuiteKind) -> Result<()> {
        if self.supports(kind) {
            Ok(())
        } else {
            Err(ProofError::ProofGeneration(format!(
                "{} does not support {kind:?} operations",
                self.suite
            )))
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Create
    // ─────────────────────────────────────────────────────────────────────────

    /// Sign `document` and return the proof.
    ///
    /// Fails on the first error; no partial proof is ever returned.
    pub async fn create_proof(
        &self,
        document: &Document,
        options: &ProofOptions,
        keypair: &Keypair,
    ) -> Result<Proof> {
        let mut pipeline = Pipeline::new(self.suite, CryptosuiteKind::Base);
        let result = self.create_base(&mut pipeline, document, options, keypair).await;
        pipeline.finish(result)
    }

    /// Sign `document` and return it with the proof attached. An existing
    /// proof turns into a proof set; every proof in a set covers the
    /// document without its proofs.
    pub async fn add_proof(
        &self,
        document: &Document,
        options: &ProofOptions,
        keypair: &Keypair,
    ) -> Result<Document> {
        let mut unsecured = document.clone();
        unsecured.remove("proof");
        let proof = self.create_proof(&unsecured, options, keypair).await?;
        Ok(attach_proof(document, proof.to_value()?))
    }

    async fn create_base(
        &self,
        pipeline: &mut Pipeline,
        document: &Document,
        options: &ProofOptions,
        keypair: &Keypair,
    ) -> Result<Proof> {
        self.require(CryptosuiteKind::Base)?;

        // 1. Configure
        pipeline.enter(PipelineState::ConfiguringProof);
        self.check_options(options)
            .map_err(|e| ProofError::ProofGeneration(e.to_string()))?;
        self.check_keypair(keypair)?;
        let config_hash = self.config_hash(options, document).await?;

        // 2. Transform
        pipeline.enter(PipelineState::Transforming);
        self.check_options(options)
            .map_err(|e| ProofError::ProofTransformation(e.to_string()))?;
        let canonical = self.canonicalizer.canonicalize(document).await?;

        // 3. Hash
        pipeline.enter(PipelineState::Hashing);
        let hash_data = concat_hashes(&config_hash, canonical.to_nquads().as_bytes());

        // 4. Serialize
        pipeline.enter(PipelineState::Serializing);
        let signature = keypair.sign(&hash_data);
        let proof_value = multibase::encode(Base::Base58Btc, signature);
        debug!(
            suite = %self.suite,
            statements = canonical.len(),
            "created proof"
        );

        Ok(Proof::new(options.clone(), proof_value))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Verify
    // ─────────────────────────────────────────────────────────────────────────

    /// Verify the proofs of `secured` made by this suite.
    ///
    /// With a proof set, the result is verified when any matching proof
    /// verifies. Bad encodings and signature mismatches give
    /// `verified: false`; a missing or malformed `proof` member, or no proof
    /// from this suite, is an error.
    pub async fn verify_proof(
        &self,
        secured: &Document,
        public_key: &PublicKey,
    ) -> Result<VerificationResult> {
        if self.supports(CryptosuiteKind::Confirm) {
            return self.confirm_proof(secured, public_key).await;
        }
        self.require(CryptosuiteKind::Base)?;

        let (unsecured, proofs) = self.matching_proofs(secured)?;
        for proof in &proofs {
            let mut pipeline = Pipeline::new(self.suite, CryptosuiteKind::Base);
            let result = self
                .verify_base(&mut pipeline, &unsecured, proof, public_key)
                .await;
            if pipeline.finish(result)? {
                return Ok(VerificationResult::success(unsecured));
            }
        }
        Ok(VerificationResult::failure())
    }

    async fn verify_base(
        &self,
        pipeline: &mut Pipeline,
        unsecured: &Document,
        proof: &Proof,
        public_key: &PublicKey,
    ) -> Result<bool> {
        // 1. Configure: decode the signature before any canonicalization.
        pipeline.enter(PipelineState::ConfiguringProof);
        if let Err(e) = self.check_options(&proof.options) {
            warn!(suite = %self.suite, error = %e, "proof options rejected");
            return Ok(false);
        }
        let signature = match multibase::decode_expected(Base::Base58Btc, &proof.proof_value) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(suite = %self.suite, error = %e, "proofValue failed to decode");
                return Ok(false);
            }
        };
        let config_hash = self.config_hash(&proof.options, unsecured).await;
        let Some(config_hash) = or_mismatch(self.suite, config_hash)? else {
            return Ok(false);
        };

        // 2. Transform
        pipeline.enter(PipelineState::Transforming);
        let canonical = self.canonicalizer.canonicalize(unsecured).await;
        let Some(canonical) = or_mismatch(self.suite, canonical.map_err(ProofError::from))? else {
            return Ok(false);
        };

        // 3. Hash
        pipeline.enter(PipelineState::Hashing);
        let hash_data = concat_hashes(&config_hash, canonical.to_nquads().as_bytes());

        // 4. Verify
        pipeline.enter(PipelineState::Verifying);
        let verified = public_key.verify(&hash_data, &signature);
        debug!(suite = %self.suite, verified, "checked proof");
        Ok(verified)
    }

    /// Recompute `hashData` for the first proof of this suite on `secured`:
    /// the configuration digest followed by the document digest.
    ///
    /// `proofValue` never takes part.
    pub async fn hash_data(&self, secured: &Document) -> Result<Vec<u8>> {
        self.require(CryptosuiteKind::Base)?;
        let (unsecured, proofs) = self.matching_proofs(secured)?;
        let proof = proofs.first().ok_or_else(|| {
            ProofError::ProofTransformation(format!("no {} proof", self.suite))
        })?;
        let config_hash = self.config_hash(&proof.options, &unsecured).await?;
        let canonical = self.canonicalizer.canonicalize(&unsecured).await?;
        Ok(concat_hashes(&config_hash, canonical.to_nquads().as_bytes()))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Shared steps
    // ─────────────────────────────────────────────────────────────────────────

    pub(crate) fn check_options(
        &self,
        options: &ProofOptions,
    ) -> std::result::Result<(), dataproof_core::ValidationError> {
        validate_proof_options(options, DATA_INTEGRITY_PROOF, self.suite.as_str())
    }

    pub(crate) fn check_keypair(&self, keypair: &Keypair) -> Result<()> {
        let expected = self.suite.key_algorithm();
        if keypair.algorithm() != expected {
            return Err(ProofError::ProofGeneration(format!(
                "{} signs with {expected} keys, got {}",
                self.suite,
                keypair.algorithm()
            )));
        }
        Ok(())
    }

    /// Split `secured` and parse the proofs whose `type` and `cryptosuite`
    /// name this suite. At least one must exist.
    pub(crate) fn matching_proofs(&self, secured: &Document) -> Result<(Document, Vec<Proof>)> {
        let (unsecured, proofs) = split_proof(secured)?;
        let matching = proofs
            .iter()
            .filter(|proof| self.names_this_suite(proof))
            .map(Proof::from_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        if matching.is_empty() {
            return Err(ProofError::ProofTransformation(format!(
                "document carries no {DATA_INTEGRITY_PROOF} proof for {}",
                self.suite
            )));
        }
        debug!(
            suite = %self.suite,
            proofs = proofs.len(),
            matching = matching.len(),
            "split secured document"
        );
        Ok((unsecured, matching))
    }

    fn names_this_suite(&self, proof: &Value) -> bool {
        proof.get("type").and_then(Value::as_str) == Some(DATA_INTEGRITY_PROOF)
            && proof.get("cryptosuite").and_then(Value::as_str) == Some(self.suite.as_str())
    }

    /// Digest of the canonical proof configuration: the options, minus any
    /// `proofValue`, under the document's `@context`.
    pub(crate) async fn config_hash(
        &self,
        options: &ProofOptions,
        document: &Document,
    ) -> Result<Vec<u8>> {
        let mut config = options.to_object()?;
        config.remove("proofValue");
        if let Some(context) = document.get("@context") {
            config.insert("@context".to_string(), context.clone());
        }
        let canonical = self.canonicalizer.canonicalize(&config).await?;
        Ok(HashAlgorithm::Sha256.digest(canonical.to_nquads().as_bytes()))
    }
}

/// On verification, a document that no longer canonicalizes does not match
/// its proof. Loader failures and resource limits are still raised.
pub(crate) fn or_mismatch<T>(suite: SuiteId, result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_content_error() => {
            warn!(suite = %suite, code = %e.code(), error = %e, "document does not match its proof");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn concat_hashes(config_hash: &[u8], canonical_document: &[u8]) -> Vec<u8> {
    let mut hash_data = config_hash.to_vec();
    hash_data.extend_from_slice(&HashAlgorithm::Sha256.digest(canonical_document));
    hash_data
}
