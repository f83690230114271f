//! Proof options and proofs.
//!
//! [`ProofOptions`] describes how a proof is made (every proof field except
//! `proofValue`). A [`Proof`] is options plus the encoded signature.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreError, Result};

/// The proof `type` shared by every cryptosuite here.
pub const DATA_INTEGRITY_PROOF: &str = "DataIntegrityProof";

/// The default proof purpose.
pub const ASSERTION_METHOD: &str = "assertionMethod";

/// Proof options: the proof object minus its `proofValue`.
///
/// Timestamps are kept as the exact strings that appear in the document so
/// that canonicalization sees the same bytes at creation and verification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofOptions {
    #[serde(rename = "@context", default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "type", default)]
    pub type_: String,

    #[serde(default)]
    pub cryptosuite: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,

    #[serde(default)]
    pub verification_method: String,

    #[serde(default)]
    pub proof_purpose: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,

    /// A string or an array of strings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    /// A string or an array of strings naming earlier proofs in a chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_proof: Option<Value>,

    /// Any other members, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProofOptions {
    /// Options for `cryptosuite` with the usual defaults:
    /// `DataIntegrityProof` and `assertionMethod`.
    pub fn new(cryptosuite: impl Into<String>, verification_method: impl Into<String>) -> Self {
        Self {
            type_: DATA_INTEGRITY_PROOF.to_string(),
            cryptosuite: cryptosuite.into(),
            verification_method: verification_method.into(),
            proof_purpose: ASSERTION_METHOD.to_string(),
            ..Default::default()
        }
    }

    /// Set `created` as an RFC 3339 UTC timestamp with second precision.
    pub fn created(mut self, at: DateTime<Utc>) -> Self {
        self.created = Some(format_timestamp(at));
        self
    }

    /// Set `created` to now.
    pub fn created_now(self) -> Self {
        self.created(Utc::now())
    }

    pub fn expires(mut self, at: DateTime<Utc>) -> Self {
        self.expires = Some(format_timestamp(at));
        self
    }

    pub fn proof_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.proof_purpose = purpose.into();
        self
    }

    pub fn challenge(mut self, challenge: impl Into<String>) -> Self {
        self.challenge = Some(challenge.into());
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(Value::String(domain.into()));
        self
    }

    pub fn nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    /// Render as a JSON object.
    pub fn to_object(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(CoreError::MalformedProof("proof options are not an object".into())),
            Err(e) => Err(CoreError::MalformedProof(e.to_string())),
        }
    }
}

/// A proof: options plus the multibase-encoded `proofValue`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    #[serde(flatten)]
    pub options: ProofOptions,
    pub proof_value: String,
}

impl Proof {
    pub fn new(options: ProofOptions, proof_value: String) -> Self {
        Self { options, proof_value }
    }

    /// Parse a proof from a JSON value.
    ///
    /// A missing or non-string `proofValue` is a [`CoreError::MalformedProof`].
    pub fn from_value(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| CoreError::MalformedProof("proof is not an object".into()))?;
        match object.get("proofValue") {
            Some(Value::String(_)) => {}
            Some(_) => return Err(CoreError::MalformedProof("proofValue is not a string".into())),
            None => return Err(CoreError::MalformedProof("missing proofValue".into())),
        }
        serde_json::from_value(value.clone()).map_err(|e| CoreError::MalformedProof(e.to_string()))
    }

    /// Render as a JSON value.
    pub fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(|e| CoreError::MalformedProof(e.to_string()))
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_builder_defaults() {
        let options = ProofOptions::new("eddsa-rdfc-2022", "did:example:1#key-1");
        assert_eq!(options.type_, DATA_INTEGRITY_PROOF);
        assert_eq!(options.proof_purpose, ASSERTION_METHOD);
        assert!(options.created.is_none());
    }

    #[test]
    fn test_created_format() {
        let at = Utc.with_ymd_and_hms(2023, 2, 24, 23, 36, 38).unwrap();
        let options = ProofOptions::new("eddsa-rdfc-2022", "did:example:1#key-1").created(at);
        assert_eq!(options.created.as_deref(), Some("2023-02-24T23:36:38Z"));
    }

    #[test]
    fn test_serialization_shape() {
        let options = ProofOptions::new("eddsa-rdfc-2022", "did:example:1#key-1")
            .challenge("abc")
            .domain("example.org");
        let object = options.to_object().unwrap();
        assert_eq!(object["type"], "DataIntegrityProof");
        assert_eq!(object["verificationMethod"], "did:example:1#key-1");
        assert_eq!(object["proofPurpose"], "assertionMethod");
        assert_eq!(object["challenge"], "abc");
        assert_eq!(object["domain"], "example.org");
        assert!(!object.contains_key("created"));
        assert!(!object.contains_key("@context"));
    }

    #[test]
    fn test_proof_parse_preserves_unknown_members() {
        let value = json!({
            "type": "DataIntegrityProof",
            "cryptosuite": "eddsa-rdfc-2022",
            "verificationMethod": "did:example:1#key-1",
            "proofPurpose": "assertionMethod",
            "created": "2023-02-24T23:36:38Z",
            "proofValue": "z123",
            "x-custom": 7
        });
        let proof = Proof::from_value(&value).unwrap();
        assert_eq!(proof.proof_value, "z123");
        assert_eq!(proof.options.extra["x-custom"], 7);
        assert_eq!(proof.to_value().unwrap(), value);
    }

    #[test]
    fn test_proof_missing_value() {
        let value = json!({"type": "DataIntegrityProof"});
        assert!(matches!(
            Proof::from_value(&value),
            Err(CoreError::MalformedProof(_))
        ));
        assert!(Proof::from_value(&json!({"proofValue": 3})).is_err());
    }
}
