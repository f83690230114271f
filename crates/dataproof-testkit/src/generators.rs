//! Proptest generators for property-based testing.

use proptest::prelude::*;

use dataproof_core::{document_from_value, Document, KeyAlgorithm, Keypair};
use dataproof_loader::bundled;
use serde_json::{json, Map, Value};

/// Generate a random keypair.
///
/// P-256 seeds outside the scalar field are skipped.
pub fn keypair(algorithm: KeyAlgorithm) -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_filter_map("seed is not a valid secret key", move |seed| {
        Keypair::from_seed(algorithm, &seed).ok()
    })
}

/// Generate message bytes of specified max length.
pub fn message(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate a term name usable under `@vocab`.
pub fn term() -> impl Strategy<Value = String> {
    "[a-z][a-zA-Z0-9]{0,11}".prop_map(String::from)
}

/// Generate a JSON scalar that maps onto an RDF literal.
pub fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[ -~]{0,24}".prop_map(Value::from),
        any::<i32>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
    ]
}

/// Parameters for generating a credential.
#[derive(Debug, Clone)]
pub struct CredentialParams {
    pub issuer: String,
    /// Claims about the subject, in insertion order.
    pub claims: Vec<(String, Value)>,
    /// Claims nested one level down, under `details`.
    pub nested: Vec<(String, Value)>,
}

impl Arbitrary for CredentialParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: ()) -> Self::Strategy {
        (
            "did:example:[a-z0-9]{1,12}",
            prop::collection::vec((term(), scalar()), 1..6),
            prop::collection::vec((term(), scalar()), 0..4),
        )
            .prop_map(|(issuer, claims, nested)| CredentialParams {
                issuer,
                claims,
                nested,
            })
            .boxed()
    }
}

/// Build the credential described by `params`.
///
/// Terms are prefixed so they never collide with the credentials context.
pub fn credential_from_params(params: &CredentialParams) -> Document {
    let mut subject = Map::new();
    for (name, value) in &params.claims {
        subject.insert(format!("x{name}"), value.clone());
    }
    if !params.nested.is_empty() {
        let details: Map<String, Value> = params
            .nested
            .iter()
            .map(|(name, value)| (format!("x{name}"), value.clone()))
            .collect();
        subject.insert("xdetails".into(), Value::Object(details));
    }

    document_from_value(json!({
        "@context": [bundled::CREDENTIALS_V2, {"@vocab": "https://example.org/vocab#"}],
        "type": ["VerifiableCredential"],
        "issuer": params.issuer,
        "credentialSubject": subject
    }))
    .expect("object literal")
}

/// The same document with every object's members in reverse order.
pub fn reversed(document: &Document) -> Document {
    fn reverse(value: &Value) -> Value {
        match value {
            Value::Object(map) => Value::Object(
                map.iter()
                    .rev()
                    .map(|(k, v)| (k.clone(), reverse(v)))
                    .collect(),
            ),
            Value::Array(items) => Value::Array(items.iter().map(reverse).collect()),
            other => other.clone(),
        }
    }
    document
        .iter()
        .rev()
        .map(|(k, v)| (k.clone(), reverse(v)))
        .collect()
}

/// A small dataset of blank nodes, described without labels.
#[derive(Debug, Clone)]
pub struct BlankGraph {
    pub nodes: usize,
    /// `(subject, object)` node indexes.
    pub edges: Vec<(usize, usize)>,
    /// `(subject, value)` literal statements.
    pub literals: Vec<(usize, String)>,
}

impl BlankGraph {
    /// N-Quads for the graph, naming node `i` as `_:{labels[i]}`.
    pub fn to_nquads(&self, labels: &[String]) -> String {
        let mut out = String::new();
        for (s, o) in &self.edges {
            out.push_str(&format!("_:{} <urn:ex:knows> _:{} .\n", labels[*s], labels[*o]));
        }
        for (s, value) in &self.literals {
            out.push_str(&format!("_:{} <urn:ex:name> \"{value}\" .\n", labels[*s]));
        }
        out
    }

    /// Labels `n0`, `n1`, ... in node order.
    pub fn default_labels(&self) -> Vec<String> {
        (0..self.nodes).map(|i| format!("n{i}")).collect()
    }
}

/// Generate a blank node graph with up to `max_nodes` nodes.
pub fn blank_graph(max_nodes: usize) -> impl Strategy<Value = BlankGraph> {
    (1..=max_nodes.max(1)).prop_flat_map(|nodes| {
        (
            prop::collection::vec((0..nodes, 0..nodes), 0..nodes * 2),
            prop::collection::vec((0..nodes, "[a-z]{1,4}"), 0..nodes + 1),
        )
            .prop_map(move |(edges, literals)| BlankGraph {
                nodes,
                edges,
                literals,
            })
    })
}

/// Generate a graph together with a shuffled relabeling of its nodes.
pub fn relabeled_blank_graph(
    max_nodes: usize,
) -> impl Strategy<Value = (BlankGraph, Vec<String>)> {
    blank_graph(max_nodes).prop_flat_map(|graph| {
        let labels: Vec<String> = (0..graph.nodes).map(|i| format!("r{i}")).collect();
        (Just(graph), Just(labels).prop_shuffle())
    })
}
