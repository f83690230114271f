//! Canonicalize a document once and sort its statements into groups.

use std::collections::{BTreeMap, HashMap, HashSet};

use dataproof_core::{Document, Sha256Hash};
use dataproof_rdf::{Canonicalizer, Quad};
use tracing::debug;

use crate::error::{DisclosureError, Result};
use crate::label::{label_replacement_canonicalize, relabel, LabelMap, LabelMapFactory};
use crate::pointer::select_json_ld;
use crate::skolem::{deskolemize, is_skolem_label, skolemize};

/// The statements of one group, keyed by their index in the full sorted
/// statement list.
#[derive(Debug, Clone, Default)]
pub struct Group {
    pub matching: BTreeMap<usize, String>,
    pub non_matching: BTreeMap<usize, String>,
    /// The selection's own quads, with skolem labels.
    pub deskolemized: Vec<Quad>,
}

/// A document's relabeled statements plus every requested group.
#[derive(Debug, Clone)]
pub struct GroupedDocument {
    pub groups: HashMap<String, Group>,
    pub skolemized: Document,
    pub deskolemized: Vec<Quad>,
    /// Skolem label to replacement label.
    pub label_map: LabelMap,
    /// Relabeled N-Quads lines, sorted.
    pub nquads: Vec<String>,
}

impl GroupedDocument {
    pub fn group(&self, name: &str) -> Result<&Group> {
        self.groups
            .get(name)
            .ok_or_else(|| DisclosureError::InvalidPointer(format!("no group named {name}")))
    }
}

/// Canonicalize `document` with replacement labels from `factory`, then
/// split its statements by each named pointer list.
pub async fn canonicalize_and_group(
    canonicalizer: &Canonicalizer,
    document: &Document,
    factory: &dyn LabelMapFactory,
    definitions: &[(&str, &[String])],
) -> Result<GroupedDocument> {
    let skolemized = skolemize(document);
    let deskolemized = deskolemize(&canonicalizer.to_quads(&skolemized).await?);
    let (nquads, label_map) =
        label_replacement_canonicalize(&deskolemized, canonicalizer.options(), factory)?;

    let mut groups = HashMap::new();
    for (name, pointers) in definitions {
        let (selected_quads, selected_lines) =
            select_canonical(canonicalizer, pointers, &skolemized, &label_map).await?;
        let selected: HashSet<&String> = selected_lines.iter().collect();

        let mut group = Group {
            deskolemized: selected_quads,
            ..Default::default()
        };
        for (index, line) in nquads.iter().enumerate() {
            if selected.contains(line) {
                group.matching.insert(index, line.clone());
            } else {
                group.non_matching.insert(index, line.clone());
            }
        }
        debug!(
            group = %name,
            matching = group.matching.len(),
            non_matching = group.non_matching.len(),
            "grouped statements"
        );
        groups.insert(name.to_string(), group);
    }

    Ok(GroupedDocument {
        groups,
        skolemized,
        deskolemized,
        label_map,
        nquads,
    })
}

/// The relabeled statements a pointer list selects from a skolemized
/// document.
async fn select_canonical(
    canonicalizer: &Canonicalizer,
    pointers: &[String],
    skolemized: &Document,
    label_map: &LabelMap,
) -> Result<(Vec<Quad>, Vec<String>)> {
    let Some(selection) = select_json_ld(pointers, skolemized)? else {
        return Ok((Vec::new(), Vec::new()));
    };
    let quads = deskolemize(&canonicalizer.to_quads(&selection).await?);
    if let Some(anonymous) = quads
        .iter()
        .flat_map(Quad::blank_labels)
        .find(|label| !is_skolem_label(label))
    {
        return Err(DisclosureError::AnonymousBlankNode(anonymous.to_string()));
    }

    let escaping = canonicalizer.options().algorithm.escaping();
    let lines = relabel(&quads, label_map)?
        .iter()
        .map(|quad| quad.to_nquad(escaping))
        .collect();
    Ok((quads, lines))
}

/// SHA-256 over the concatenation of statements, in order.
pub fn hash_statements<'a>(statements: impl IntoIterator<Item = &'a String>) -> Sha256Hash {
    let joined: String = statements.into_iter().map(String::as_str).collect();
    Sha256Hash::hash(joined.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::HmacLabeler;
    use dataproof_core::document_from_value;
    use dataproof_loader::{bundled, StaticLoader};
    use dataproof_rdf::CanonicalizationOptions;
    use serde_json::json;
    use std::sync::Arc;

    fn canonicalizer() -> Canonicalizer {
        Canonicalizer::new(
            Arc::new(StaticLoader::bundled().unwrap()),
            CanonicalizationOptions::default(),
        )
    }

    fn credential() -> Document {
        document_from_value(json!({
            "@context": [bundled::CREDENTIALS_V2, {"@vocab": "https://example.org/vocab#"}],
            "type": ["VerifiableCredential"],
            "issuer": "did:example:issuer",
            "credentialSubject": {
                "name": "Alice",
                "degree": {"level": "master", "field": "physics"}
            }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_groups_partition_statements() {
        let mandatory = vec!["/issuer".to_string()];
        let selective = vec!["/credentialSubject/degree/level".to_string()];
        let grouped = canonicalize_and_group(
            &canonicalizer(),
            &credential(),
            &HmacLabeler::new([5u8; 32]),
            &[("mandatory", mandatory.as_slice()), ("selective", selective.as_slice())],
        )
        .await
        .unwrap();

        for name in ["mandatory", "selective"] {
            let group = grouped.group(name).unwrap();
            assert_eq!(
                group.matching.len() + group.non_matching.len(),
                grouped.nquads.len()
            );
            assert!(!group.matching.is_empty());
        }

        let mandatory = grouped.group("mandatory").unwrap();
        assert!(mandatory
            .matching
            .values()
            .any(|line| line.contains("<did:example:issuer>")));
        assert!(mandatory
            .non_matching
            .values()
            .any(|line| line.contains("\"Alice\"")));

        // Every statement uses HMAC labels, never skolem IRIs.
        assert!(grouped.nquads.iter().all(|l| !l.contains("urn:bnid:")));
    }

    #[tokio::test]
    async fn test_empty_pointer_list_matches_nothing() {
        let grouped = canonicalize_and_group(
            &canonicalizer(),
            &credential(),
            &HmacLabeler::new([5u8; 32]),
            &[("mandatory", &[] as &[String])],
        )
        .await
        .unwrap();
        assert!(grouped.group("mandatory").unwrap().matching.is_empty());
        assert!(grouped.group("other").is_err());
    }

    #[test]
    fn test_hash_statements_is_concatenation() {
        let lines = vec!["a .\n".to_string(), "b .\n".to_string()];
        assert_eq!(hash_statements(&lines), Sha256Hash::hash(b"a .\nb .\n"));
    }
}
