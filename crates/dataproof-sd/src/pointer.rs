//! JSON pointer selection.
//!
//! Builds the smallest document that keeps everything a set of RFC 6901
//! pointers reaches. Every object on the way to a selected value keeps its
//! `id` and `type` so the selected statements still attach to the right
//! subjects.

use std::collections::BTreeMap;

use dataproof_core::Document;
use serde_json::{Map, Value};

use crate::error::{DisclosureError, Result};

/// Split a pointer into unescaped reference tokens. `""` is the whole
/// document.
pub fn parse_pointer(pointer: &str) -> Result<Vec<String>> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    let rest = pointer
        .strip_prefix('/')
        .ok_or_else(|| DisclosureError::InvalidPointer(pointer.to_string()))?;

    rest.split('/')
        .map(|token| {
            let mut out = String::with_capacity(token.len());
            let mut chars = token.chars();
            while let Some(c) = chars.next() {
                if c != '~' {
                    out.push(c);
                    continue;
                }
                match chars.next() {
                    Some('0') => out.push('~'),
                    Some('1') => out.push('/'),
                    _ => return Err(DisclosureError::InvalidPointer(pointer.to_string())),
                }
            }
            Ok(out)
        })
        .collect()
}

/// Select the parts of `document` reached by `pointers`.
///
/// Returns `None` for an empty pointer list. The result carries the
/// document's `@context`. Arrays keep only selected elements, in their
/// original order.
pub fn select_json_ld(pointers: &[String], document: &Document) -> Result<Option<Document>> {
    if pointers.is_empty() {
        return Ok(None);
    }
    let root = Value::Object(document.clone());
    let mut selection = Selected::initial(&root);
    for pointer in pointers {
        select_pointer(pointer, &root, &mut selection)?;
    }

    let mut selected = match selection.into_value() {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    if let Some(context) = document.get("@context") {
        selected.insert("@context".to_string(), context.clone());
    }
    Ok(Some(selected))
}

/// A partially selected value.
#[derive(Debug, Clone, PartialEq)]
enum Selected {
    /// Selected in full.
    Whole(Value),
    Object(BTreeMap<String, Selected>),
    /// Sparse: only the selected indexes are present.
    Array(BTreeMap<usize, Selected>),
}

impl Selected {
    fn initial(value: &Value) -> Self {
        match value {
            Value::Array(_) => Self::Array(BTreeMap::new()),
            Value::Object(map) => {
                let mut entries = BTreeMap::new();
                for key in ["id", "@id"] {
                    if let Some(Value::String(id)) = map.get(key) {
                        if !id.starts_with("_:") {
                            entries.insert(key.to_string(), Self::Whole(Value::String(id.clone())));
                        }
                    }
                }
                for key in ["type", "@type"] {
                    if let Some(types) = map.get(key) {
                        entries.insert(key.to_string(), Self::Whole(types.clone()));
                    }
                }
                Self::Object(entries)
            }
            scalar => Self::Whole(scalar.clone()),
        }
    }

    fn into_value(self) -> Value {
        match self {
            Self::Whole(value) => value,
            Self::Object(entries) => Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, value.into_value()))
                    .collect(),
            ),
            Self::Array(entries) => {
                Value::Array(entries.into_values().map(Self::into_value).collect())
            }
        }
    }
}

fn select_pointer(pointer: &str, root: &Value, selection: &mut Selected) -> Result<()> {
    let path = parse_pointer(pointer)?;
    if path.is_empty() {
        *selection = Selected::Whole(root.clone());
        return Ok(());
    }

    let mut value = root;
    let mut selected = selection;
    for (i, segment) in path.iter().enumerate() {
        let child = match value {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
        .ok_or_else(|| DisclosureError::PointerNotFound(pointer.to_string()))?;

        let last = i + 1 == path.len();
        selected = match descend(selected, segment, child, last) {
            Some(next) => next,
            // An ancestor is already selected in full.
            None => return Ok(()),
        };
        value = child;
    }
    Ok(())
}

fn descend<'s>(
    selected: &'s mut Selected,
    segment: &str,
    child: &Value,
    last: bool,
) -> Option<&'s mut Selected> {
    let fresh = || {
        if last {
            Selected::Whole(child.clone())
        } else {
            Selected::initial(child)
        }
    };
    let slot = match selected {
        Selected::Whole(_) => return None,
        Selected::Object(entries) => entries.entry(segment.to_string()).or_insert_with(fresh),
        Selected::Array(entries) => entries.entry(segment.parse().ok()?).or_insert_with(fresh),
    };
    if last {
        *slot = Selected::Whole(child.clone());
    }
    Some(slot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    fn credential() -> Document {
        doc(json!({
            "@context": ["https://www.w3.org/ns/credentials/v2"],
            "id": "urn:test:1",
            "type": ["VerifiableCredential"],
            "issuer": "did:example:1",
            "credentialSubject": {
                "id": "did:example:2",
                "name": "Alice",
                "age": 30,
                "boats": [
                    {"name": "Kestrel", "year": 2009},
                    {"name": "Tern", "year": 2019},
                    {"name": "Wren", "year": 2021}
                ]
            }
        }))
    }

    #[test]
    fn test_parse_pointer() {
        assert!(parse_pointer("").unwrap().is_empty());
        assert_eq!(parse_pointer("/a/b").unwrap(), vec!["a", "b"]);
        assert_eq!(parse_pointer("/a~1b/c~0d").unwrap(), vec!["a/b", "c~d"]);
        assert_eq!(parse_pointer("/").unwrap(), vec![""]);
        assert!(parse_pointer("a").is_err());
        assert!(parse_pointer("/a~2").is_err());
    }

    #[test]
    fn test_empty_pointer_list() {
        assert_eq!(select_json_ld(&[], &credential()).unwrap(), None);
    }

    #[test]
    fn test_select_nested_value() {
        let selected = select_json_ld(&["/credentialSubject/name".into()], &credential())
            .unwrap()
            .unwrap();
        assert_eq!(
            Value::Object(selected),
            json!({
                "@context": ["https://www.w3.org/ns/credentials/v2"],
                "id": "urn:test:1",
                "type": ["VerifiableCredential"],
                "credentialSubject": {"id": "did:example:2", "name": "Alice"}
            })
        );
    }

    #[test]
    fn test_sparse_array_selection() {
        let pointers = vec![
            "/credentialSubject/boats/2/name".to_string(),
            "/credentialSubject/boats/0/year".to_string(),
        ];
        let selected = select_json_ld(&pointers, &credential()).unwrap().unwrap();
        assert_eq!(
            selected["credentialSubject"]["boats"],
            json!([{"year": 2009}, {"name": "Wren"}])
        );
    }

    #[test]
    fn test_whole_ancestor_wins() {
        let pointers = vec![
            "/credentialSubject".to_string(),
            "/credentialSubject/name".to_string(),
        ];
        let selected = select_json_ld(&pointers, &credential()).unwrap().unwrap();
        assert_eq!(selected["credentialSubject"], credential()["credentialSubject"]);
    }

    #[test]
    fn test_blank_ids_not_copied() {
        let document = doc(json!({
            "id": "_:b0",
            "holder": {"id": "_:b1", "name": "x"}
        }));
        let selected = select_json_ld(&["/holder/name".into()], &document)
            .unwrap()
            .unwrap();
        assert_eq!(Value::Object(selected), json!({"holder": {"name": "x"}}));
    }

    #[test]
    fn test_unmatched_pointer() {
        let result = select_json_ld(&["/credentialSubject/missing".into()], &credential());
        assert!(matches!(result, Err(DisclosureError::PointerNotFound(_))));

        let result = select_json_ld(&["/credentialSubject/boats/7".into()], &credential());
        assert!(matches!(result, Err(DisclosureError::PointerNotFound(_))));
    }

    #[test]
    fn test_root_pointer_selects_everything() {
        let selected = select_json_ld(&["".into()], &credential()).unwrap().unwrap();
        assert_eq!(selected, credential());
    }
}
