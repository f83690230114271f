//! Secured and unsecured documents.
//!
//! Documents are JSON objects. The `proof` member holds either a single proof
//! object or an array of proofs (a proof set).

use serde_json::{Map, Value};

use crate::error::{CoreError, Result};

/// A JSON-LD document: always a JSON object at the top level.
pub type Document = Map<String, Value>;

/// Interpret a JSON value as a document.
pub fn document_from_value(value: Value) -> Result<Document> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(CoreError::MalformedDocument(format!(
            "document must be a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

/// Split a secured document into the unsecured document and its proofs.
///
/// Fails if `proof` is absent or is neither an object nor a non-empty array
/// of objects.
pub fn split_proof(secured: &Document) -> Result<(Document, Vec<Value>)> {
    let mut unsecured = secured.clone();
    let proofs = match unsecured.remove("proof") {
        None => return Err(CoreError::MalformedProof("document has no proof".into())),
        Some(Value::Object(proof)) => vec![Value::Object(proof)],
        Some(Value::Array(items)) if !items.is_empty() => {
            if let Some(bad) = items.iter().find(|item| !item.is_object()) {
                return Err(CoreError::MalformedProof(format!(
                    "proof set entry must be an object, got {}",
                    json_kind(bad)
                )));
            }
            items
        }
        Some(Value::Array(_)) => return Err(CoreError::MalformedProof("empty proof set".into())),
        Some(other) => {
            return Err(CoreError::MalformedProof(format!(
                "proof must be an object or array, got {}",
                json_kind(&other)
            )))
        }
    };
    Ok((unsecured, proofs))
}

/// Attach a proof to a document, forming a proof set if one is already there.
pub fn attach_proof(document: &Document, proof: Value) -> Document {
    let mut secured = document.clone();
    let merged = match secured.remove("proof") {
        None => proof,
        Some(Value::Array(mut items)) => {
            items.push(proof);
            Value::Array(items)
        }
        Some(existing) => Value::Array(vec![existing, proof]),
    };
    secured.insert("proof".to_string(), merged);
    secured
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        document_from_value(value).unwrap()
    }

    #[test]
    fn test_document_must_be_object() {
        assert!(document_from_value(json!([1, 2])).is_err());
        assert!(document_from_value(json!({"a": 1})).is_ok());
    }

    #[test]
    fn test_split_single_proof() {
        let secured = doc(json!({"id": "urn:x", "proof": {"type": "DataIntegrityProof"}}));
        let (unsecured, proofs) = split_proof(&secured).unwrap();
        assert!(!unsecured.contains_key("proof"));
        assert_eq!(unsecured["id"], "urn:x");
        assert_eq!(proofs.len(), 1);
    }

    #[test]
    fn test_split_proof_set() {
        let secured = doc(json!({"proof": [{"a": 1}, {"b": 2}]}));
        let (_, proofs) = split_proof(&secured).unwrap();
        assert_eq!(proofs.len(), 2);
    }

    #[test]
    fn test_split_rejects_bad_shapes() {
        assert!(split_proof(&doc(json!({"id": "urn:x"}))).is_err());
        assert!(split_proof(&doc(json!({"proof": []}))).is_err());
        assert!(split_proof(&doc(json!({"proof": "z123"}))).is_err());
        assert!(split_proof(&doc(json!({"proof": [{"a": 1}, 2]}))).is_err());
    }

    #[test]
    fn test_attach_forms_set() {
        let unsecured = doc(json!({"id": "urn:x"}));
        let once = attach_proof(&unsecured, json!({"n": 1}));
        assert!(once["proof"].is_object());
        let twice = attach_proof(&once, json!({"n": 2}));
        assert_eq!(twice["proof"], json!([{"n": 1}, {"n": 2}]));
        let thrice = attach_proof(&twice, json!({"n": 3}));
        assert_eq!(thrice["proof"].as_array().unwrap().len(), 3);
    }
}
