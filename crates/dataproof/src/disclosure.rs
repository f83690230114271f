//! Selective disclosure flows for `ecdsa-sd-2023`.
//!
//! ```text
//! issuer:   create_base_proof(doc, mandatory pointers)  -> base proof
//! holder:   derive_proof(secured, selective pointers)    -> reveal document
//! verifier: verify_proof(reveal document)                -> VerificationResult
//! ```

use std::collections::BTreeMap;

use dataproof_core::{
    attach_proof, Document, KeyAlgorithm, Keypair, Proof, ProofOptions, PublicKey,
};
use dataproof_rdf::canonicalize_quads;
use dataproof_sd::{
    canonicalize_and_group, hash_statements, label_replacement_canonicalize, proof_value_kind,
    select_json_ld, BaseProofValue, DerivedProofValue, DisclosedLabels, DisclosureError,
    HmacLabeler, LabelMap, ProofValueKind,
};
use tracing::{debug, warn};

use crate::error::{ProofError, Result};
use crate::pipeline::{Pipeline, PipelineState};
use crate::suite::{or_mismatch, Cryptosuite, CryptosuiteKind, VerificationResult};

const MANDATORY: &str = "mandatory";
const SELECTIVE: &str = "selective";
const COMBINED: &str = "combined";

impl Cryptosuite {
    // ─────────────────────────────────────────────────────────────────────────
    // Disclose (issuer)
    // ─────────────────────────────────────────────────────────────────────────

    /// Issue a base proof. Statements selected by `mandatory_pointers` will
    /// be revealed by every derived proof.
    pub async fn create_base_proof(
        &self,
        document: &Document,
        options: &ProofOptions,
        keypair: &Keypair,
        mandatory_pointers: &[String],
    ) -> Result<Proof> {
        let mut pipeline = Pipeline::new(self.suite(), CryptosuiteKind::Disclose);
        let result = self
            .disclose(&mut pipeline, document, options, keypair, mandatory_pointers)
            .await;
        pipeline.finish(result)
    }

    async fn disclose(
        &self,
        pipeline: &mut Pipeline,
        document: &Document,
        options: &ProofOptions,
        keypair: &Keypair,
        mandatory_pointers: &[String],
    ) -> Result<Proof> {
        self.require(CryptosuiteKind::Disclose)?;

        // 1. Configure
        pipeline.enter(PipelineState::ConfiguringProof);
        self.check_options(options)
            .map_err(|e| ProofError::ProofGeneration(e.to_string()))?;
        self.check_keypair(keypair)?;
        let proof_hash = self.config_hash(options, document).await?;

        // 2. Transform
        pipeline.enter(PipelineState::Transforming);
        let labeler = HmacLabeler::generate();
        let grouped = canonicalize_and_group(
            self.canonicalizer(),
            document,
            &labeler,
            &[(MANDATORY, mandatory_pointers)],
        )
        .await?;
        let mandatory = grouped.group(MANDATORY)?;

        // 3. Hash
        pipeline.enter(PipelineState::Hashing);
        let mandatory_hash = hash_statements(mandatory.matching.values());

        // 4. Serialize
        pipeline.enter(PipelineState::Serializing);
        let ephemeral = Keypair::generate(KeyAlgorithm::P256);
        let signatures: Vec<Vec<u8>> = mandatory
            .non_matching
            .values()
            .map(|statement| ephemeral.sign(statement.as_bytes()).as_bytes().to_vec())
            .collect();
        let public_key = ephemeral.public_key().to_multicodec_bytes();
        let base_signature = keypair.sign(&signed_message(
            &proof_hash,
            &public_key,
            mandatory_hash.as_bytes(),
        ));

        debug!(
            statements = grouped.nquads.len(),
            mandatory = mandatory.matching.len(),
            "created base proof"
        );

        let proof_value = BaseProofValue {
            base_signature: base_signature.as_bytes().to_vec(),
            public_key,
            hmac_key: labeler.key().to_vec(),
            signatures,
            mandatory_pointers: mandatory_pointers.to_vec(),
        }
        .encode()?;
        Ok(Proof::new(options.clone(), proof_value))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Derive (holder)
    // ─────────────────────────────────────────────────────────────────────────

    /// Derive a reveal document from a document carrying a base proof.
    ///
    /// The reveal document holds the mandatory statements plus the ones
    /// `selective_pointers` select, and a derived proof over them.
    pub async fn derive_proof(
        &self,
        secured: &Document,
        selective_pointers: &[String],
    ) -> Result<Document> {
        let mut pipeline = Pipeline::new(self.suite(), CryptosuiteKind::Derive);
        let result = self.derive(&mut pipeline, secured, selective_pointers).await;
        pipeline.finish(result)
    }

    async fn derive(
        &self,
        pipeline: &mut Pipeline,
        secured: &Document,
        selective_pointers: &[String],
    ) -> Result<Document> {
        self.require(CryptosuiteKind::Derive)?;

        // 1. Configure: read the base proof.
        pipeline.enter(PipelineState::ConfiguringProof);
        let (unsecured, proofs) = self.matching_proofs(secured)?;
        let proof = first_of_kind(proofs, ProofValueKind::Base)?;
        let base = BaseProofValue::decode(&proof.proof_value)?;
        let hmac_key: [u8; 32] = base.hmac_key.as_slice().try_into().map_err(|_| {
            ProofError::Decode(format!("HMAC key is {} bytes, expected 32", base.hmac_key.len()))
        })?;

        // 2. Transform
        pipeline.enter(PipelineState::Transforming);
        let mut combined_pointers = base.mandatory_pointers.clone();
        combined_pointers.extend_from_slice(selective_pointers);
        let grouped = canonicalize_and_group(
            self.canonicalizer(),
            &unsecured,
            &HmacLabeler::new(hmac_key),
            &[
                (MANDATORY, base.mandatory_pointers.as_slice()),
                (SELECTIVE, selective_pointers),
                (COMBINED, combined_pointers.as_slice()),
            ],
        )
        .await?;
        let mandatory = grouped.group(MANDATORY)?;
        let selective = grouped.group(SELECTIVE)?;
        let combined = grouped.group(COMBINED)?;

        // Positions of mandatory statements among the revealed ones.
        let mandatory_indexes: Vec<usize> = combined
            .matching
            .keys()
            .enumerate()
            .filter(|(_, index)| mandatory.matching.contains_key(*index))
            .map(|(relative, _)| relative)
            .collect();

        // Keep the signatures of revealed non-mandatory statements. Base
        // signatures are in order of non-mandatory statement index.
        let signatures = filter_signatures(
            &base.signatures,
            &mandatory.matching,
            &selective.matching,
        )?;

        let reveal = select_json_ld(&combined_pointers, &unsecured)?.ok_or_else(|| {
            ProofError::ProofGeneration("no statements selected for disclosure".into())
        })?;

        // The verifier sees canonical labels of the reveal document only.
        let form = canonicalize_quads(&combined.deskolemized, self.canonicalizer().options())?;
        let mut label_map = LabelMap::new();
        for (input, canonical) in form.issued() {
            let label = grouped
                .label_map
                .get(input)
                .ok_or_else(|| DisclosureError::MissingLabel(input.clone()))?;
            label_map.insert(canonical.clone(), label.clone());
        }

        // 3. Serialize
        pipeline.enter(PipelineState::Serializing);
        debug!(
            revealed = combined.matching.len(),
            mandatory = mandatory_indexes.len(),
            signatures = signatures.len(),
            "derived proof"
        );
        let proof_value = DerivedProofValue {
            base_signature: base.base_signature,
            public_key: base.public_key,
            signatures,
            label_map,
            mandatory_indexes,
        }
        .encode()?;
        let derived = Proof::new(proof.options, proof_value);
        Ok(attach_proof(&reveal, derived.to_value()?))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Confirm (verifier)
    // ─────────────────────────────────────────────────────────────────────────

    /// Verify a reveal document. Base proofs are rejected here; holders
    /// check those with [`Cryptosuite::verify_base_proof`].
    pub(crate) async fn confirm_proof(
        &self,
        secured: &Document,
        public_key: &PublicKey,
    ) -> Result<VerificationResult> {
        let (unsecured, proofs) = self.matching_proofs(secured)?;
        for proof in &proofs {
            let mut pipeline = Pipeline::new(self.suite(), CryptosuiteKind::Confirm);
            let result = self
                .confirm(&mut pipeline, &unsecured, proof, public_key)
                .await;
            if pipeline.finish(result)? {
                return Ok(VerificationResult::success(unsecured));
            }
        }
        Ok(VerificationResult::failure())
    }

    async fn confirm(
        &self,
        pipeline: &mut Pipeline,
        unsecured: &Document,
        proof: &Proof,
        public_key: &PublicKey,
    ) -> Result<bool> {
        // 1. Configure
        pipeline.enter(PipelineState::ConfiguringProof);
        match proof_value_kind(&proof.proof_value) {
            Ok(ProofValueKind::Derived) => {}
            Ok(ProofValueKind::Base) => {
                return Err(ProofError::ProofTransformation(
                    "base proofs are checked with verify_base_proof".into(),
                ))
            }
            Err(e) => {
                warn!(error = %e, "proofValue failed to decode");
                return Ok(false);
            }
        }
        if let Err(e) = self.check_options(&proof.options) {
            warn!(error = %e, "proof options rejected");
            return Ok(false);
        }
        let derived = match DerivedProofValue::decode(&proof.proof_value) {
            Ok(derived) => derived,
            Err(e) => {
                warn!(error = %e, "derived proof failed to decode");
                return Ok(false);
            }
        };
        let Ok(ephemeral) = PublicKey::from_multicodec_bytes(&derived.public_key) else {
            warn!("derived proof carries an unusable ephemeral key");
            return Ok(false);
        };

        // 2. Transform
        pipeline.enter(PipelineState::Transforming);
        let quads = self.canonicalizer().to_quads(unsecured).await;
        let Some(quads) = or_mismatch(self.suite(), quads.map_err(ProofError::from))? else {
            return Ok(false);
        };
        let statements = match label_replacement_canonicalize(
            &quads,
            self.canonicalizer().options(),
            &DisclosedLabels::new(&derived.label_map),
        ) {
            Ok((statements, _)) => statements,
            Err(DisclosureError::MissingLabel(label)) => {
                warn!(label = %label, "label map does not cover the reveal document");
                return Ok(false);
            }
            Err(e) => match or_mismatch(self.suite(), Err(e.into()))? {
                Some(statements) => statements,
                None => return Ok(false),
            },
        };
        let Some((mandatory, non_mandatory)) = split_by_index(&statements, &derived.mandatory_indexes)
        else {
            warn!("mandatory index out of range");
            return Ok(false);
        };

        // 3. Hash
        pipeline.enter(PipelineState::Hashing);
        let proof_hash = self.config_hash(&proof.options, unsecured).await;
        let Some(proof_hash) = or_mismatch(self.suite(), proof_hash)? else {
            return Ok(false);
        };
        let mandatory_hash = hash_statements(mandatory);

        // 4. Verify
        pipeline.enter(PipelineState::Verifying);
        if derived.signatures.len() != non_mandatory.len() {
            warn!(
                signatures = derived.signatures.len(),
                statements = non_mandatory.len(),
                "signature count does not match disclosed statements"
            );
            return Ok(false);
        }
        let message = signed_message(&proof_hash, &derived.public_key, mandatory_hash.as_bytes());
        if !public_key.verify(&message, &derived.base_signature) {
            return Ok(false);
        }
        let verified = non_mandatory
            .iter()
            .zip(&derived.signatures)
            .all(|(statement, signature)| ephemeral.verify(statement.as_bytes(), signature));
        debug!(
            verified,
            statements = statements.len(),
            "checked derived proof"
        );
        Ok(verified)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Base proof check (holder)
    // ─────────────────────────────────────────────────────────────────────────

    /// Check a base proof before deriving from it.
    pub async fn verify_base_proof(
        &self,
        secured: &Document,
        public_key: &PublicKey,
    ) -> Result<VerificationResult> {
        self.require(CryptosuiteKind::Disclose)?;
        let (unsecured, proofs) = self.matching_proofs(secured)?;
        let proof = first_of_kind(proofs, ProofValueKind::Base)?;

        let mut pipeline = Pipeline::new(self.suite(), CryptosuiteKind::Disclose);
        let result = self
            .check_base(&mut pipeline, &unsecured, &proof, public_key)
            .await;
        Ok(if pipeline.finish(result)? {
            VerificationResult::success(unsecured)
        } else {
            VerificationResult::failure()
        })
    }

    async fn check_base(
        &self,
        pipeline: &mut Pipeline,
        unsecured: &Document,
        proof: &Proof,
        public_key: &PublicKey,
    ) -> Result<bool> {
        // 1. Configure
        pipeline.enter(PipelineState::ConfiguringProof);
        if let Err(e) = self.check_options(&proof.options) {
            warn!(error = %e, "proof options rejected");
            return Ok(false);
        }
        let base = match BaseProofValue::decode(&proof.proof_value) {
            Ok(base) => base,
            Err(e) => {
                warn!(error = %e, "base proof failed to decode");
                return Ok(false);
            }
        };
        let (Ok(hmac_key), Ok(ephemeral)) = (
            <[u8; 32]>::try_from(base.hmac_key.as_slice()),
            PublicKey::from_multicodec_bytes(&base.public_key),
        ) else {
            warn!("base proof carries unusable key material");
            return Ok(false);
        };

        // 2. Transform
        pipeline.enter(PipelineState::Transforming);
        let grouped = match canonicalize_and_group(
            self.canonicalizer(),
            unsecured,
            &HmacLabeler::new(hmac_key),
            &[(MANDATORY, base.mandatory_pointers.as_slice())],
        )
        .await
        {
            Ok(grouped) => grouped,
            Err(DisclosureError::PointerNotFound(pointer)) => {
                warn!(pointer = %pointer, "mandatory pointer no longer matches");
                return Ok(false);
            }
            Err(e) => match or_mismatch(self.suite(), Err(e.into()))? {
                Some(grouped) => grouped,
                None => return Ok(false),
            },
        };
        let mandatory = grouped.group(MANDATORY)?;

        // 3. Hash
        pipeline.enter(PipelineState::Hashing);
        let proof_hash = self.config_hash(&proof.options, unsecured).await;
        let Some(proof_hash) = or_mismatch(self.suite(), proof_hash)? else {
            return Ok(false);
        };
        let mandatory_hash = hash_statements(mandatory.matching.values());

        // 4. Verify
        pipeline.enter(PipelineState::Verifying);
        if base.signatures.len() != mandatory.non_matching.len() {
            return Ok(false);
        }
        let message = signed_message(&proof_hash, &base.public_key, mandatory_hash.as_bytes());
        if !public_key.verify(&message, &base.base_signature) {
            return Ok(false);
        }
        Ok(mandatory
            .non_matching
            .values()
            .zip(&base.signatures)
            .all(|(statement, signature)| ephemeral.verify(statement.as_bytes(), signature)))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// `proofHash ‖ publicKey ‖ mandatoryHash`, the message of the base signature.
fn signed_message(proof_hash: &[u8], public_key: &[u8], mandatory_hash: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(proof_hash.len() + public_key.len() + mandatory_hash.len());
    message.extend_from_slice(proof_hash);
    message.extend_from_slice(public_key);
    message.extend_from_slice(mandatory_hash);
    message
}

fn first_of_kind(proofs: Vec<Proof>, kind: ProofValueKind) -> Result<Proof> {
    proofs
        .into_iter()
        .find(|proof| proof_value_kind(&proof.proof_value).ok() == Some(kind))
        .ok_or_else(|| ProofError::ProofTransformation(format!("no {kind:?} proof value found")))
}

/// Pick the signatures of selected non-mandatory statements.
///
/// `signatures[i]` belongs to the i-th non-mandatory statement; walking the
/// statement indexes while skipping mandatory ones recovers its position.
fn filter_signatures(
    signatures: &[Vec<u8>],
    mandatory: &BTreeMap<usize, String>,
    selective: &BTreeMap<usize, String>,
) -> Result<Vec<Vec<u8>>> {
    let mut filtered = Vec::new();
    let mut index = 0;
    for signature in signatures {
        while mandatory.contains_key(&index) {
            index += 1;
        }
        if selective.contains_key(&index) {
            filtered.push(signature.clone());
        }
        index += 1;
    }
    if let Some(missing) = selective
        .keys()
        .copied()
        .find(|i| !mandatory.contains_key(i) && *i >= index)
    {
        return Err(ProofError::ProofTransformation(format!(
            "no signature for statement {missing}"
        )));
    }
    Ok(filtered)
}

/// Split statements into (mandatory, non-mandatory) by relative index.
/// `None` when an index is out of range.
fn split_by_index<'a>(
    statements: &'a [String],
    mandatory_indexes: &[usize],
) -> Option<(Vec<&'a String>, Vec<&'a String>)> {
    if mandatory_indexes.iter().any(|&i| i >= statements.len()) {
        return None;
    }
    let (mandatory, non_mandatory): (Vec<_>, Vec<_>) = statements
        .iter()
        .enumerate()
        .partition(|(i, _)| mandatory_indexes.contains(i));
    Some((
        mandatory.into_iter().map(|(_, s)| s).collect(),
        non_mandatory.into_iter().map(|(_, s)| s).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statements(indexes: &[usize]) -> BTreeMap<usize, String> {
        indexes.iter().map(|&i| (i, format!("s{i}"))).collect()
    }

    #[test]
    fn test_filter_signatures_skips_mandatory_positions() {
        // Statements 0..5; 1 and 3 mandatory, so signatures cover 0, 2, 4.
        let signatures = vec![vec![0], vec![2], vec![4]];
        let filtered =
            filter_signatures(&signatures, &statements(&[1, 3]), &statements(&[3, 4])).unwrap();
        assert_eq!(filtered, vec![vec![4]]);

        let filtered =
            filter_signatures(&signatures, &statements(&[1, 3]), &statements(&[0, 2])).unwrap();
        assert_eq!(filtered, vec![vec![0], vec![2]]);
    }

    #[test]
    fn test_filter_signatures_missing() {
        let err = filter_signatures(&[vec![0]], &statements(&[]), &statements(&[5])).unwrap_err();
        assert!(matches!(err, ProofError::ProofTransformation(_)));
    }

    #[test]
    fn test_split_by_index() {
        let lines: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let (mandatory, rest) = split_by_index(&lines, &[0, 2]).unwrap();
        assert_eq!(mandatory, vec!["a", "c"]);
        assert_eq!(rest, vec!["b"]);
        assert!(split_by_index(&lines, &[3]).is_none());
    }

    #[test]
    fn test_signed_message_layout() {
        let message = signed_message(&[1; 32], &[2; 35], &[3; 32]);
        assert_eq!(message.len(), 99);
        assert_eq!(message[32], 2);
        assert_eq!(message[98], 3);
    }
}
