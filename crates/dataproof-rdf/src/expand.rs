//! JSON-LD expansion over a prefetched [`ContextSet`].
//!
//! Produces a typed expanded form instead of expanded JSON. The supported
//! subset covers what Data Integrity documents use; anything outside it is
//! reported as [`RdfError::Unsupported`] rather than silently dropped.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};

use serde_json::{Map, Number, Value};

use crate::context::ActiveContext;
use crate::error::{RdfError, Result};
use crate::iri::{is_absolute_iri, is_keyword};
use crate::prefetch::ContextSet;

/// An element of the expanded form.
#[derive(Debug, Clone, PartialEq)]
pub enum Expanded {
    Node(NodeObject),
    Value(ValueObject),
    List(Vec<Expanded>),
}

/// A node object. Graph objects are node objects with `graph` set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeObject {
    pub id: Option<String>,
    pub types: Vec<String>,
    pub properties: BTreeMap<String, Vec<Expanded>>,
    pub graph: Option<Vec<Expanded>>,
}

impl NodeObject {
    fn is_empty(&self) -> bool {
        self.types.is_empty() && self.properties.is_empty() && self.graph.is_none()
    }
}

/// A value object.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueObject {
    pub value: Scalar,
    pub datatype: Option<String>,
    pub language: Option<String>,
}

/// A native JSON scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(String),
    Boolean(bool),
    Number(Number),
}

impl Scalar {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::String(s.clone())),
            Value::Bool(b) => Some(Self::Boolean(*b)),
            Value::Number(n) => Some(Self::Number(n.clone())),
            _ => None,
        }
    }
}

/// Expand a document. The result is the list of top-level node objects.
pub fn expand_document(document: &Map<String, Value>, remote: &ContextSet) -> Result<Vec<Expanded>> {
    let expander = Expander { remote };
    let mut items = expander.expand_object(&ActiveContext::new(), None, document)?;

    // A top-level object holding only @graph stands for its contents.
    if let [Expanded::Node(node)] = items.as_mut_slice() {
        if node.id.is_none() && node.types.is_empty() && node.properties.is_empty() {
            if let Some(graph) = node.graph.take() {
                return Ok(graph);
            }
        }
    }
    Ok(items)
}

struct Expander<'a> {
    remote: &'a ContextSet,
}

fn is_free_floating(property: Option<&str>) -> bool {
    matches!(property, None | Some("@graph"))
}

impl<'a> Expander<'a> {
    fn expand_element(
        &self,
        active: &ActiveContext,
        property: Option<&str>,
        element: &Value,
    ) -> Result<Vec<Expanded>> {
        match element {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.extend(self.expand_element(active, property, item)?);
                }
                Ok(out)
            }
            Value::Object(map) => self.expand_object(active, property, map),
            scalar => {
                let Some(property) = property.filter(|p| *p != "@graph") else {
                    return Err(RdfError::MalformedValue(format!("free-floating scalar {scalar}")));
                };
                let scoped = self.property_scoped(active, property)?;
                Ok(vec![expand_value(&scoped, property, scalar)?])
            }
        }
    }

    fn property_scoped<'c>(&self, active: &'c ActiveContext, property: &str) -> Result<Cow<'c, ActiveContext>> {
        match active.term(property).and_then(|d| d.context.as_ref()) {
            Some(scoped) => Ok(Cow::Owned(active.process(scoped, self.remote, true, true)?)),
            None => Ok(Cow::Borrowed(active)),
        }
    }

    fn expand_object(
        &self,
        active: &ActiveContext,
        property: Option<&str>,
        map: &Map<String, Value>,
    ) -> Result<Vec<Expanded>> {
        // Non-propagated contexts do not apply inside nested node objects.
        let expands_to = |key: &str, keyword: &str| active.expand_iri(key, false, true).as_deref() == Some(keyword);
        let has_value = map.keys().any(|k| expands_to(k, "@value"));
        let only_id = map.len() == 1 && map.keys().all(|k| expands_to(k, "@id"));
        let property_scoped = property
            .and_then(|p| active.term(p))
            .and_then(|d| d.context.as_ref());

        let mut ctx = match active.previous() {
            Some(previous) if !has_value && !only_id => previous.clone(),
            _ => active.clone(),
        };
        if let Some(scoped) = property_scoped {
            ctx = ctx.process(scoped, self.remote, true, true)?;
        }
        if let Some(local) = map.get("@context") {
            ctx = ctx.process(local, self.remote, false, true)?;
        }

        // Type-scoped contexts, looked up in the context before any of them
        // applied.
        let type_scoped = ctx.clone();
        let mut type_keys: Vec<&String> = map
            .keys()
            .filter(|k| type_scoped.expand_iri(k, false, true).as_deref() == Some("@type"))
            .collect();
        type_keys.sort();
        for key in type_keys {
            let mut terms: Vec<&str> = match &map[key.as_str()] {
                Value::String(term) => vec![term.as_str()],
                Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
                _ => Vec::new(),
            };
            terms.sort_unstable();
            for term in terms {
                if let Some(scoped) = type_scoped.term(term).and_then(|d| d.context.as_ref()) {
                    ctx = ctx.process(scoped, self.remote, false, false)?;
                }
            }
        }

        let mut node = NodeObject::default();
        let mut seen = HashSet::new();
        let mut value: Option<&Value> = None;
        let mut language: Option<String> = None;
        let mut list: Option<Vec<Expanded>> = None;
        let mut set: Option<Vec<Expanded>> = None;

        let mut keys: Vec<&String> = map.keys().collect();
        keys.sort();
        for key in keys {
            if key == "@context" {
                continue;
            }
            let element = &map[key.as_str()];
            let expanded_property = ctx.expand_iri(key, false, true).ok_or_else(|| {
                RdfError::UndefinedTerm(format!("term `{key}` could not be resolved"))
            })?;

            if !is_keyword(&expanded_property) {
                if !expanded_property.contains(':') {
                    return Err(RdfError::UndefinedTerm(format!(
                        "term `{key}` does not expand to an absolute IRI"
                    )));
                }
                if element.is_null() {
                    continue;
                }
                let values = self.expand_property(&ctx, key, element)?;
                node.properties.entry(expanded_property).or_default().extend(values);
                continue;
            }

            if !seen.insert(expanded_property.clone()) && expanded_property != "@type" {
                return Err(RdfError::MalformedValue(format!("colliding keywords: {expanded_property}")));
            }
            match expanded_property.as_str() {
                "@id" => {
                    let id = element
                        .as_str()
                        .ok_or_else(|| RdfError::MalformedValue("@id value must be a string".into()))?;
                    node.id = Some(ctx.expand_iri(id, true, false).ok_or_else(|| {
                        RdfError::MalformedValue(format!("invalid @id value {id}"))
                    })?);
                }
                "@type" => {
                    let types: Vec<&str> = match element {
                        Value::String(t) => vec![t.as_str()],
                        Value::Array(items) => items
                            .iter()
                            .map(|t| {
                                t.as_str().ok_or_else(|| {
                                    RdfError::MalformedValue("@type values must be strings".into())
                                })
                            })
                            .collect::<Result<_>>()?,
                        _ => return Err(RdfError::MalformedValue("invalid @type value".into())),
                    };
                    for t in types {
                        node.types.push(type_scoped.expand_iri(t, true, true).ok_or_else(|| {
                            RdfError::MalformedValue(format!("invalid @type value {t}"))
                        })?);
                    }
                }
                "@graph" => {
                    node.graph = Some(self.expand_element(&ctx, Some("@graph"), element)?);
                }
                "@value" => {
                    if element.is_array() || element.is_object() {
                        return Err(RdfError::MalformedValue("@value must be a scalar or null".into()));
                    }
                    value = Some(element);
                }
                "@language" => {
                    let tag = element.as_str().ok_or_else(|| {
                        RdfError::MalformedValue("@language value must be a string".into())
                    })?;
                    language = Some(tag.to_string());
                }
                "@index" => {
                    if !element.is_string() {
                        return Err(RdfError::MalformedValue("@index value must be a string".into()));
                    }
                }
                "@list" => {
                    let items = self.expand_element(&ctx, property, element)?;
                    if items.iter().any(|item| matches!(item, Expanded::List(_))) {
                        return Err(RdfError::Unsupported("lists of lists".into()));
                    }
                    list = Some(items);
                }
                "@set" => {
                    set = Some(self.expand_element(&ctx, property, element)?);
                }
                "@reverse" | "@nest" | "@included" | "@direction" | "@json" => {
                    return Err(RdfError::Unsupported(expanded_property));
                }
                other => {
                    return Err(RdfError::MalformedValue(format!("unexpected keyword {other}")));
                }
            }
        }

        if let Some(raw) = value {
            if node.id.is_some() || !node.properties.is_empty() || node.graph.is_some() || list.is_some() || set.is_some() {
                return Err(RdfError::MalformedValue("invalid value object".into()));
            }
            if node.types.len() > 1 || (!node.types.is_empty() && language.is_some()) {
                return Err(RdfError::MalformedValue("invalid typed value".into()));
            }
            let Some(scalar) = Scalar::from_json(raw) else {
                return Ok(Vec::new());
            };
            if language.is_some() && !matches!(scalar, Scalar::String(_)) {
                return Err(RdfError::MalformedValue("language-tagged value must be a string".into()));
            }
            let datatype = node.types.pop();
            if let Some(datatype) = &datatype {
                if !is_absolute_iri(datatype) {
                    return Err(RdfError::MalformedValue(format!("invalid datatype {datatype}")));
                }
            }
            if is_free_floating(property) {
                return Err(RdfError::MalformedValue("free-floating value object".into()));
            }
            return Ok(vec![Expanded::Value(ValueObject {
                value: scalar,
                datatype,
                language,
            })]);
        }

        if language.is_some() {
            return Err(RdfError::MalformedValue("@language outside a value object".into()));
        }

        if let Some(items) = list {
            if node.id.is_some() || !node.is_empty() || set.is_some() {
                return Err(RdfError::MalformedValue("invalid list object".into()));
            }
            if is_free_floating(property) {
                return Err(RdfError::MalformedValue("free-floating list object".into()));
            }
            return Ok(vec![Expanded::List(items)]);
        }

        if let Some(items) = set {
            if node.id.is_some() || !node.is_empty() {
                return Err(RdfError::MalformedValue("invalid set object".into()));
            }
            return Ok(items);
        }

        // A free-floating node with nothing but an identifier says nothing.
        if is_free_floating(property) && node.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![Expanded::Node(node)])
    }

    /// Expand the value of a property and apply its container mapping.
    fn expand_property(&self, ctx: &ActiveContext, key: &str, element: &Value) -> Result<Vec<Expanded>> {
        let container = ctx.term(key).map(|d| d.container).unwrap_or_default();
        let mut values = self.expand_element(ctx, Some(key), element)?;

        if container.list && !matches!(values.as_slice(), [Expanded::List(_)]) {
            if values.iter().any(|v| matches!(v, Expanded::List(_))) {
                return Err(RdfError::Unsupported("lists of lists".into()));
            }
            values = vec![Expanded::List(values)];
        }
        if container.graph {
            values = values
                .into_iter()
                .map(|value| {
                    Expanded::Node(NodeObject {
                        graph: Some(vec![value]),
                        ..Default::default()
                    })
                })
                .collect();
        }
        Ok(values)
    }
}

/// Value expansion: apply the term's type coercion or language.
fn expand_value(ctx: &ActiveContext, property: &str, scalar: &Value) -> Result<Expanded> {
    let definition = ctx.term(property);
    let type_mapping = definition.and_then(|d| d.type_mapping.as_deref());

    if let (Some(coercion @ ("@id" | "@vocab")), Value::String(reference)) = (type_mapping, scalar) {
        let id = ctx
            .expand_iri(reference, true, coercion == "@vocab")
            .ok_or_else(|| RdfError::MalformedValue(format!("invalid IRI reference {reference}")))?;
        return Ok(Expanded::Node(NodeObject {
            id: Some(id),
            ..Default::default()
        }));
    }

    let value = Scalar::from_json(scalar)
        .ok_or_else(|| RdfError::MalformedValue(format!("not a scalar: {scalar}")))?;
    let mut expanded = ValueObject {
        value,
        datatype: None,
        language: None,
    };
    match type_mapping {
        Some(datatype) if !matches!(datatype, "@id" | "@vocab" | "@none") => {
            expanded.datatype = Some(datatype.to_string());
        }
        _ if matches!(expanded.value, Scalar::String(_)) => {
            expanded.language = match definition.and_then(|d| d.language.clone()) {
                Some(language) => language,
                None => ctx.language.clone(),
            };
        }
        _ => {}
    }
    Ok(Expanded::Value(expanded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn expand(document: Value) -> Result<Vec<Expanded>> {
        let Value::Object(map) = document else {
            panic!("test document must be an object")
        };
        expand_document(&map, &ContextSet::new())
    }

    fn single_node(items: Vec<Expanded>) -> NodeObject {
        match items.as_slice() {
            [Expanded::Node(node)] => node.clone(),
            other => panic!("expected one node, got {other:?}"),
        }
    }

    #[test]
    fn test_expand_basic_node() {
        let node = single_node(
            expand(json!({
                "@context": {"@vocab": "urn:v#", "id": "@id", "type": "@type"},
                "id": "urn:x",
                "type": "Thing",
                "name": "Alice",
                "age": 42
            }))
            .unwrap(),
        );
        assert_eq!(node.id.as_deref(), Some("urn:x"));
        assert_eq!(node.types, vec!["urn:v#Thing"]);
        assert_eq!(
            node.properties["urn:v#name"],
            vec![Expanded::Value(ValueObject {
                value: Scalar::String("Alice".into()),
                datatype: None,
                language: None
            })]
        );
        assert!(node.properties.contains_key("urn:v#age"));
    }

    #[test]
    fn test_unresolvable_term_is_error() {
        let result = expand(json!({"@context": {"name": "urn:name"}, "unknown": 1}));
        assert!(matches!(result, Err(RdfError::UndefinedTerm(_))));

        let keyword_like = expand(json!({"@context": {"@vocab": "urn:v#"}, "@d": 1}));
        assert!(matches!(keyword_like, Err(RdfError::UndefinedTerm(_))));
    }

    #[test]
    fn test_type_coercion() {
        let node = single_node(
            expand(json!({
                "@context": {
                    "knows": {"@id": "urn:knows", "@type": "@id"},
                    "when": {"@id": "urn:when", "@type": "urn:dt"}
                },
                "knows": "urn:bob",
                "when": "2024"
            }))
            .unwrap(),
        );
        assert_eq!(
            node.properties["urn:knows"],
            vec![Expanded::Node(NodeObject {
                id: Some("urn:bob".into()),
                ..Default::default()
            })]
        );
        match &node.properties["urn:when"][0] {
            Expanded::Value(v) => assert_eq!(v.datatype.as_deref(), Some("urn:dt")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_list_container_and_graph_container() {
        let node = single_node(
            expand(json!({
                "@context": {
                    "items": {"@id": "urn:items", "@container": "@list"},
                    "claims": {"@id": "urn:claims", "@container": "@graph"},
                    "p": "urn:p"
                },
                "items": [1, 2],
                "claims": {"p": "x"}
            }))
            .unwrap(),
        );
        assert!(matches!(&node.properties["urn:items"][..], [Expanded::List(items)] if items.len() == 2));
        match &node.properties["urn:claims"][..] {
            [Expanded::Node(graph)] => assert_eq!(graph.graph.as_ref().unwrap().len(), 1),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_type_scoped_context_does_not_propagate() {
        let node = single_node(
            expand(json!({
                "@context": {
                    "@vocab": "urn:outer#",
                    "Person": {"@id": "urn:Person", "@context": {"name": "urn:scoped-name"}}
                },
                "@type": "Person",
                "name": "top",
                "friend": {"name": "nested"}
            }))
            .unwrap(),
        );
        assert!(node.properties.contains_key("urn:scoped-name"));
        match &node.properties["urn:outer#friend"][0] {
            Expanded::Node(friend) => assert!(friend.properties.contains_key("urn:outer#name")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_property_scoped_context_overrides_protected() {
        let node = single_node(
            expand(json!({
                "@context": {
                    "@protected": true,
                    "@vocab": "urn:v#",
                    "label": "urn:label",
                    "inner": {"@id": "urn:inner", "@context": {"label": "urn:inner-label"}}
                },
                "inner": {"label": "x"}
            }))
            .unwrap(),
        );
        match &node.properties["urn:inner"][0] {
            Expanded::Node(inner) => assert!(inner.properties.contains_key("urn:inner-label")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_top_level_graph_unwrapped() {
        let items = expand(json!({
            "@context": {"@vocab": "urn:v#"},
            "@graph": [{"@id": "urn:a", "p": 1}, {"@id": "urn:b", "p": 2}]
        }))
        .unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_unsupported_keywords() {
        let result = expand(json!({"@context": {"@vocab": "urn:v#"}, "@reverse": {"p": "urn:x"}}));
        assert!(matches!(result, Err(RdfError::Unsupported(_))));
    }

    #[test]
    fn test_null_values_dropped() {
        let node = single_node(
            expand(json!({"@context": {"@vocab": "urn:v#"}, "@id": "urn:x", "a": null, "b": 1}))
                .unwrap(),
        );
        assert!(!node.properties.contains_key("urn:v#a"));
        assert!(node.properties.contains_key("urn:v#b"));
    }
}
