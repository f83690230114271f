//! Expanded form to RDF quads.

use std::collections::{HashMap, HashSet};

use serde_json::Number;

use crate::error::{RdfError, Result};
use crate::expand::{Expanded, NodeObject, Scalar, ValueObject};
use crate::iri::{is_blank, is_valid_iri};
use crate::quad::{
    Literal, Object, Quad, Subject, RDF_FIRST, RDF_LANG_STRING, RDF_NIL, RDF_REST, RDF_TYPE,
    XSD_BOOLEAN, XSD_DOUBLE, XSD_INTEGER, XSD_STRING,
};

/// Convert expanded top-level nodes into a duplicate-free list of quads.
///
/// Document blank node labels are replaced by fresh `b<n>` labels, and nodes
/// without `@id` get one too. Invalid or relative IRIs are errors.
pub fn to_quads(items: &[Expanded]) -> Result<Vec<Quad>> {
    let mut writer = Writer::default();
    for item in items {
        match item {
            Expanded::Node(node) => {
                writer.write_node(node, &None)?;
            }
            _ => return Err(RdfError::MalformedValue("top-level item is not a node".into())),
        }
    }
    Ok(writer.quads)
}

#[derive(Default)]
struct Writer {
    labels: HashMap<String, String>,
    counter: usize,
    quads: Vec<Quad>,
    seen: HashSet<Quad>,
}

impl Writer {
    fn fresh(&mut self) -> String {
        let label = format!("b{}", self.counter);
        self.counter += 1;
        label
    }

    fn blank(&mut self, id: &str) -> String {
        if let Some(label) = self.labels.get(id) {
            return label.clone();
        }
        let label = self.fresh();
        self.labels.insert(id.to_string(), label.clone());
        label
    }

    fn emit(&mut self, quad: Quad) {
        if self.seen.insert(quad.clone()) {
            self.quads.push(quad);
        }
    }

    fn subject_for(&mut self, id: Option<&str>) -> Result<Subject> {
        match id {
            None => Ok(Subject::Blank(self.fresh())),
            Some(id) if is_blank(id) => Ok(Subject::Blank(self.blank(id))),
            Some(iri) => Ok(Subject::Iri(checked_iri(iri)?)),
        }
    }

    fn write_node(&mut self, node: &NodeObject, graph: &Option<Subject>) -> Result<Subject> {
        let subject = self.subject_for(node.id.as_deref())?;

        for type_ in &node.types {
            let object = if is_blank(type_) {
                Object::Blank(self.blank(type_))
            } else {
                Object::Iri(checked_iri(type_)?)
            };
            self.emit(Quad::new(subject.clone(), RDF_TYPE, object, graph.clone()));
        }

        for (property, values) in &node.properties {
            if is_blank(property) {
                return Err(RdfError::MalformedValue(format!(
                    "blank node predicate {property}"
                )));
            }
            let predicate = checked_iri(property)?;
            for value in values {
                let object = self.write_object(value, graph)?;
                self.emit(Quad::new(subject.clone(), predicate.clone(), object, graph.clone()));
            }
        }

        if let Some(members) = &node.graph {
            let name = Some(subject.clone());
            for member in members {
                match member {
                    Expanded::Node(inner) => {
                        self.write_node(inner, &name)?;
                    }
                    _ => {
                        return Err(RdfError::MalformedValue(
                            "named graph member is not a node".into(),
                        ))
                    }
                }
            }
        }

        Ok(subject)
    }

    fn write_object(&mut self, value: &Expanded, graph: &Option<Subject>) -> Result<Object> {
        match value {
            Expanded::Node(node) => Ok(self.write_node(node, graph)?.into()),
            Expanded::Value(value) => Ok(Object::Literal(literal(value)?)),
            Expanded::List(items) => self.write_list(items, graph),
        }
    }

    fn write_list(&mut self, items: &[Expanded], graph: &Option<Subject>) -> Result<Object> {
        if items.is_empty() {
            return Ok(Object::Iri(RDF_NIL.to_string()));
        }
        let heads: Vec<String> = items.iter().map(|_| self.fresh()).collect();
        for (i, item) in items.iter().enumerate() {
            let node = Subject::Blank(heads[i].clone());
            let first = self.write_object(item, graph)?;
            self.emit(Quad::new(node.clone(), RDF_FIRST, first, graph.clone()));
            let rest = match heads.get(i + 1) {
                Some(next) => Object::Blank(next.clone()),
                None => Object::Iri(RDF_NIL.to_string()),
            };
            self.emit(Quad::new(node, RDF_REST, rest, graph.clone()));
        }
        Ok(Object::Blank(heads[0].clone()))
    }
}

fn checked_iri(iri: &str) -> Result<String> {
    if is_valid_iri(iri) {
        Ok(iri.to_string())
    } else {
        Err(RdfError::MalformedValue(format!("invalid or relative IRI {iri:?}")))
    }
}

/// Convert a value object to a literal.
fn literal(value: &ValueObject) -> Result<Literal> {
    let datatype = value.datatype.as_deref();
    if let Some(datatype) = datatype {
        checked_iri(datatype)?;
    }

    let (lexical, default_datatype) = match &value.value {
        Scalar::Boolean(flag) => (flag.to_string(), XSD_BOOLEAN),
        Scalar::Number(number) => number_lexical(number, datatype == Some(XSD_DOUBLE))?,
        Scalar::String(text) => {
            if let Some(language) = &value.language {
                return Ok(Literal::lang(text.clone(), language.clone()));
            }
            (text.clone(), XSD_STRING)
        }
    };
    let datatype = datatype.unwrap_or(default_datatype);
    if datatype == RDF_LANG_STRING {
        return Err(RdfError::MalformedValue("rdf:langString without a language".into()));
    }
    Ok(Literal::typed(lexical, datatype))
}

/// Lexical form and default datatype for a JSON number.
fn number_lexical(number: &Number, force_double: bool) -> Result<(String, &'static str)> {
    if !force_double {
        if let Some(i) = number.as_i64() {
            return Ok((i.to_string(), XSD_INTEGER));
        }
        if let Some(u) = number.as_u64() {
            return Ok((u.to_string(), XSD_INTEGER));
        }
    }
    let float = number
        .as_f64()
        .filter(|f| f.is_finite())
        .ok_or_else(|| RdfError::MalformedValue(format!("unrepresentable number {number}")))?;
    if !force_double && float.fract() == 0.0 && float.abs() < 1e21 {
        return Ok((format!("{float:.0}"), XSD_INTEGER));
    }
    Ok((canonical_double(float), XSD_DOUBLE))
}

/// `xsd:double` canonical form: `1.1E0`, `-5.0E-7`.
fn canonical_double(value: f64) -> String {
    let formatted = format!("{value:.15e}");
    let (mantissa, exponent) = formatted.split_once('e').unwrap_or((formatted.as_str(), "0"));
    let mut mantissa = mantissa.trim_end_matches('0').to_string();
    if mantissa.ends_with('.') {
        mantissa.push('0');
    }
    format!("{mantissa}E{exponent}")
}
