//! Skolemization: giving every node object a stable IRI.
//!
//! Selective disclosure selects JSON subtrees and then has to find the same
//! blank nodes again in the full dataset. Before selection, each node object
//! without an identifier (and each blank node identifier) is replaced by a
//! `urn:bnid:` IRI; after conversion to quads those IRIs turn back into
//! blank nodes with the same label everywhere.

use std::collections::HashMap;

use dataproof_core::Document;
use dataproof_rdf::{Object, Quad, Subject};
use serde_json::{Map, Value};

/// IRI prefix of skolemized blank nodes.
pub const SKOLEM_PREFIX: &str = "urn:bnid:";

/// Label prefix of skolemized blank nodes. Never used by expansion.
const LABEL_PREFIX: char = 'k';

/// Give every node object in a compacted document an identifier.
///
/// Value objects, lists, sets and embedded contexts are left alone. Existing
/// blank node identifiers are replaced consistently.
pub fn skolemize(document: &Document) -> Document {
    let mut skolemizer = Skolemizer::default();
    skolemizer.node(document)
}

/// Turn `urn:bnid:` IRIs back into blank nodes.
pub fn deskolemize(quads: &[Quad]) -> Vec<Quad> {
    quads
        .iter()
        .map(|quad| Quad {
            subject: deskolemize_subject(&quad.subject),
            predicate: quad.predicate.clone(),
            object: match &quad.object {
                Object::Iri(iri) => match iri.strip_prefix(SKOLEM_PREFIX) {
                    Some(label) => Object::Blank(label.to_string()),
                    None => Object::Iri(iri.clone()),
                },
                other => other.clone(),
            },
            graph: quad.graph.as_ref().map(deskolemize_subject),
        })
        .collect()
}

/// Whether a blank node label came from [`deskolemize`].
pub fn is_skolem_label(label: &str) -> bool {
    label.starts_with(LABEL_PREFIX)
}

fn deskolemize_subject(subject: &Subject) -> Subject {
    match subject {
        Subject::Iri(iri) => match iri.strip_prefix(SKOLEM_PREFIX) {
            Some(label) => Subject::Blank(label.to_string()),
            None => Subject::Iri(iri.clone()),
        },
        blank => blank.clone(),
    }
}

#[derive(Default)]
struct Skolemizer {
    counter: usize,
    blank_ids: HashMap<String, String>,
}

impl Skolemizer {
    fn fresh(&mut self) -> String {
        let iri = format!("{SKOLEM_PREFIX}{LABEL_PREFIX}{}", self.counter);
        self.counter += 1;
        iri
    }

    fn rename(&mut self, blank: &str) -> String {
        if let Some(iri) = self.blank_ids.get(blank) {
            return iri.clone();
        }
        let iri = self.fresh();
        self.blank_ids.insert(blank.to_string(), iri.clone());
        iri
    }

    fn node(&mut self, map: &Map<String, Value>) -> Map<String, Value> {
        let mut out = Map::new();
        let mut has_id = false;
        for (key, value) in map {
            let value = match key.as_str() {
                "@context" => value.clone(),
                "id" | "@id" => {
                    has_id = true;
                    match value {
                        Value::String(id) if id.starts_with("_:") => Value::String(self.rename(id)),
                        other => other.clone(),
                    }
                }
                _ => self.value(value),
            };
            out.insert(key.clone(), value);
        }
        if !has_id {
            out.insert("@id".to_string(), Value::String(self.fresh()));
        }
        out
    }

    fn value(&mut self, value: &Value) -> Value {
        match value {
            Value::Array(items) => Value::Array(items.iter().map(|item| self.value(item)).collect()),
            Value::Object(map) if map.contains_key("@value") => value.clone(),
            Value::Object(map) if map.contains_key("@list") || map.contains_key("@set") => {
                Value::Object(
                    map.iter()
                        .map(|(key, inner)| {
                            let inner = match key.as_str() {
                                "@list" | "@set" => self.value(inner),
                                _ => inner.clone(),
                            };
                            (key.clone(), inner)
                        })
                        .collect(),
                )
            }
            Value::Object(map) => Value::Object(self.node(map)),
            scalar => scalar.clone(),
        }
    }
}
