//! The quad model and N-Quads text form.
//!
//! Blank node labels are stored without the `_:` prefix.

use std::fmt::{self, Write as _};

use crate::error::{RdfError, Result};

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDF_FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
pub const RDF_REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
pub const RDF_NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";
pub const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";

/// A quad subject or graph name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Subject {
    Iri(String),
    Blank(String),
}

impl Subject {
    pub fn blank_label(&self) -> Option<&str> {
        match self {
            Self::Blank(label) => Some(label),
            Self::Iri(_) => None,
        }
    }
}

/// A literal value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal {
    pub value: String,
    pub datatype: String,
    pub language: Option<String>,
}

impl Literal {
    /// A plain `xsd:string` literal.
    pub fn string(value: impl Into<String>) -> Self {
        Self::typed(value, XSD_STRING)
    }

    pub fn typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: datatype.into(),
            language: None,
        }
    }

    /// An `rdf:langString` literal.
    pub fn lang(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: RDF_LANG_STRING.to_string(),
            language: Some(language.into()),
        }
    }
}

/// A quad object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Object {
    Iri(String),
    Blank(String),
    Literal(Literal),
}

impl Object {
    pub fn blank_label(&self) -> Option<&str> {
        match self {
            Self::Blank(label) => Some(label),
            _ => None,
        }
    }
}

impl From<Subject> for Object {
    fn from(subject: Subject) -> Self {
        match subject {
            Subject::Iri(iri) => Self::Iri(iri),
            Subject::Blank(label) => Self::Blank(label),
        }
    }
}

/// An RDF quad. `graph: None` is the default graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Quad {
    pub subject: Subject,
    pub predicate: String,
    pub object: Object,
    pub graph: Option<Subject>,
}

impl Quad {
    pub fn new(subject: Subject, predicate: impl Into<String>, object: Object, graph: Option<Subject>) -> Self {
        Self {
            subject,
            predicate: predicate.into(),
            object,
            graph,
        }
    }

    /// Blank node labels in subject, object, graph order (may repeat).
    pub fn blank_labels(&self) -> impl Iterator<Item = &str> {
        self.subject
            .blank_label()
            .into_iter()
            .chain(self.object.blank_label())
            .chain(self.graph.as_ref().and_then(Subject::blank_label))
    }

    /// Apply `relabel` to every blank node label.
    pub fn map_blank_labels(&self, mut relabel: impl FnMut(&str) -> String) -> Self {
        let subject = match &self.subject {
            Subject::Blank(label) => Subject::Blank(relabel(label)),
            other => other.clone(),
        };
        let object = match &self.object {
            Object::Blank(label) => Object::Blank(relabel(label)),
            other => other.clone(),
        };
        let graph = match &self.graph {
            Some(Subject::Blank(label)) => Some(Subject::Blank(relabel(label))),
            other => other.clone(),
        };
        Self {
            subject,
            predicate: self.predicate.clone(),
            object,
            graph,
        }
    }

    /// Render as one N-Quads line, including the trailing newline.
    pub fn to_nquad(&self, escaping: Escaping) -> String {
        let mut line = String::new();
        write_subject(&mut line, &self.subject);
        line.push(' ');
        write_iri(&mut line, &self.predicate);
        line.push(' ');
        match &self.object {
            Object::Iri(iri) => write_iri(&mut line, iri),
            Object::Blank(label) => write_blank(&mut line, label),
            Object::Literal(literal) => write_literal(&mut line, literal, escaping),
        }
        if let Some(graph) = &self.graph {
            line.push(' ');
            write_subject(&mut line, graph);
        }
        line.push_str(" .\n");
        line
    }
}

impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_nquad(Escaping::Canonical).trim_end_matches('\n'))
    }
}

/// String literal escaping rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escaping {
    /// RDF 1.2 canonical N-Quads: `\b \t \n \f \r \" \\` as ECHAR, other
    /// control characters and DEL as `\uXXXX`.
    Canonical,
    /// RDF 1.1 form: only `\" \\ \n \r` are escaped.
    Legacy,
}

fn write_iri(out: &mut String, iri: &str) {
    out.push('<');
    out.push_str(iri);
    out.push('>');
}

fn write_blank(out: &mut String, label: &str) {
    out.push_str("_:");
    out.push_str(label);
}

fn write_subject(out: &mut String, subject: &Subject) {
    match subject {
        Subject::Iri(iri) => write_iri(out, iri),
        Subject::Blank(label) => write_blank(out, label),
    }
}

fn write_literal(out: &mut String, literal: &Literal, escaping: Escaping) {
    out.push('"');
    escape_into(out, &literal.value, escaping);
    out.push('"');
    if let Some(language) = &literal.language {
        out.push('@');
        out.push_str(language);
    } else if literal.datatype != XSD_STRING {
        out.push_str("^^");
        write_iri(out, &literal.datatype);
    }
}

fn escape_into(out: &mut String, value: &str, escaping: Escaping) {
    for c in value.chars() {
        match (c, escaping) {
            ('"', _) => out.push_str("\\\""),
            ('\\', _) => out.push_str("\\\\"),
            ('\n', _) => out.push_str("\\n"),
            ('\r', _) => out.push_str("\\r"),
            (_, Escaping::Legacy) => out.push(c),
            ('\u{8}', Escaping::Canonical) => out.push_str("\\b"),
            ('\t', Escaping::Canonical) => out.push_str("\\t"),
            ('\u{c}', Escaping::Canonical) => out.push_str("\\f"),
            ('\u{0}'..='\u{1f}' | '\u{7f}', Escaping::Canonical) => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            _ => out.push(c),
        }
    }
}

/// Render quads as N-Quads, in the given order.
pub fn to_nquads(quads: &[Quad], escaping: Escaping) -> String {
    quads.iter().map(|q| q.to_nquad(escaping)).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Parsing
// ─────────────────────────────────────────────────────────────────────────────

/// Parse N-Quads text. Blank lines and `#` comment lines are skipped.
pub fn parse_nquads(text: &str) -> Result<Vec<Quad>> {
    let mut quads = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let quad = LineParser::new(trimmed)
            .quad()
            .map_err(|reason| RdfError::MalformedValue(format!("N-Quads line {}: {reason}", index + 1)))?;
        quads.push(quad);
    }
    Ok(quads)
}

enum Term {
    Iri(String),
    Blank(String),
    Literal(Literal),
}

struct LineParser<'a> {
    rest: &'a str,
}

impl<'a> LineParser<'a> {
    fn new(line: &'a str) -> Self {
        Self { rest: line }
    }

    fn quad(mut self) -> std::result::Result<Quad, String> {
        let subject = match self.term()? {
            Term::Iri(iri) => Subject::Iri(iri),
            Term::Blank(label) => Subject::Blank(label),
            Term::Literal(_) => return Err("literal in subject position".into()),
        };
        let predicate = match self.term()? {
            Term::Iri(iri) => iri,
            _ => return Err("predicate must be an IRI".into()),
        };
        let object = match self.term()? {
            Term::Iri(iri) => Object::Iri(iri),
            Term::Blank(label) => Object::Blank(label),
            Term::Literal(literal) => Object::Literal(literal),
        };
        self.skip_ws();
        let graph = if self.rest.starts_with('.') {
            None
        } else {
            match self.term()? {
                Term::Iri(iri) => Some(Subject::Iri(iri)),
                Term::Blank(label) => Some(Subject::Blank(label)),
                Term::Literal(_) => return Err("literal in graph position".into()),
            }
        };
        self.skip_ws();
        if self.rest != "." {
            return Err(format!("expected '.', found {:?}", self.rest));
        }
        Ok(Quad {
            subject,
            predicate,
            object,
            graph,
        })
    }

    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start_matches([' ', '\t']);
    }

    fn term(&mut self) -> std::result::Result<Term, String> {
        self.skip_ws();
        if let Some(rest) = self.rest.strip_prefix('<') {
            let end = rest.find('>').ok_or("unterminated IRI")?;
            let iri = unescape(&rest[..end])?;
            self.rest = &rest[end + 1..];
            Ok(Term::Iri(iri))
        } else if let Some(rest) = self.rest.strip_prefix("_:") {
            let end = rest.find([' ', '\t']).unwrap_or(rest.len());
            if end == 0 {
                return Err("empty blank node label".into());
            }
            self.rest = &rest[end..];
            Ok(Term::Blank(rest[..end].to_string()))
        } else if let Some(rest) = self.rest.strip_prefix('"') {
            let end = closing_quote(rest).ok_or("unterminated literal")?;
            let value = unescape(&rest[..end])?;
            self.rest = &rest[end + 1..];
            if let Some(rest) = self.rest.strip_prefix('@') {
                let end = rest.find([' ', '\t']).unwrap_or(rest.len());
                self.rest = &rest[end..];
                Ok(Term::Literal(Literal::lang(value, &rest[..end])))
            } else if let Some(rest) = self.rest.strip_prefix("^^") {
                self.rest = rest;
                match self.term()? {
                    Term::Iri(datatype) => Ok(Term::Literal(Literal::typed(value, datatype))),
                    _ => Err("datatype must be an IRI".into()),
                }
            } else {
                Ok(Term::Literal(Literal::string(value)))
            }
        } else {
            Err(format!("unexpected input {:?}", self.rest))
        }
    }
}

fn closing_quote(text: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return Some(i),
            _ => {}
        }
    }
    None
}

fn unescape(text: &str) -> std::result::Result<String, String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = match chars.next() {
            Some('t') => '\t',
            Some('b') => '\u{8}',
            Some('n') => '\n',
            Some('r') => '\r',
            Some('f') => '\u{c}',
            Some('"') => '"',
            Some('\'') => '\'',
            Some('\\') => '\\',
            Some(kind @ ('u' | 'U')) => {
                let len = if kind == 'u' { 4 } else { 8 };
                let hex: String = chars.by_ref().take(len).collect();
                u32::from_str_radix(&hex, 16)
                    .ok()
                    .filter(|_| hex.len() == len)
                    .and_then(char::from_u32)
                    .ok_or_else(|| format!("invalid \\{kind} escape"))?
            }
            other => return Err(format!("invalid escape \\{}", other.unwrap_or(' '))),
        };
        out.push(escaped);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iri(s: &str) -> Subject {
        Subject::Iri(s.into())
    }

    #[test]
    fn test_render_default_graph() {
        let quad = Quad::new(
            iri("urn:test:1"),
            RDF_TYPE,
            Object::Iri("urn:Type".into()),
            None,
        );
        assert_eq!(
            quad.to_nquad(Escaping::Canonical),
            "<urn:test:1> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <urn:Type> .\n"
        );
    }

    #[test]
    fn test_render_literals() {
        let plain = Quad::new(Subject::Blank("b0".into()), "urn:p", Object::Literal(Literal::string("x")), None);
        assert_eq!(plain.to_nquad(Escaping::Canonical), "_:b0 <urn:p> \"x\" .\n");

        let lang = Quad::new(iri("urn:s"), "urn:p", Object::Literal(Literal::lang("hi", "en")), None);
        assert_eq!(lang.to_nquad(Escaping::Canonical), "<urn:s> <urn:p> \"hi\"@en .\n");

        let typed = Quad::new(
            iri("urn:s"),
            "urn:p",
            Object::Literal(Literal::typed("1", XSD_INTEGER)),
            Some(Subject::Blank("g".into())),
        );
        assert_eq!(
            typed.to_nquad(Escaping::Canonical),
            "<urn:s> <urn:p> \"1\"^^<http://www.w3.org/2001/XMLSchema#integer> _:g .\n"
        );
    }

    #[test]
    fn test_canonical_escaping() {
        let mut out = String::new();
        escape_into(&mut out, "a\"b\\c\nd\re\tf\u{8}g\u{c}h\u{0}i\u{b}j\u{7f}k\u{1f}", Escaping::Canonical);
        assert_eq!(out, r#"a\"b\\c\nd\re\tf\bg\fh\u0000i\u000Bj\u007Fk\u001F"#);

        let mut legacy = String::new();
        escape_into(&mut legacy, "a\tb\"\n", Escaping::Legacy);
        assert_eq!(legacy, "a\tb\\\"\\n");
    }

    #[test]
    fn test_non_ascii_is_not_escaped() {
        let mut out = String::new();
        escape_into(&mut out, "héllo ✓", Escaping::Canonical);
        assert_eq!(out, "héllo ✓");
    }

    #[test]
    fn test_parse_roundtrip() {
        let text = concat!(
            "<urn:s> <urn:p> \"a \\\"quoted\\\" \\u0001 value\" .\n",
            "_:b0 <urn:p> \"hi\"@en-us _:g1 .\n",
            "_:b0 <urn:q> \"5\"^^<http://www.w3.org/2001/XMLSchema#integer> <urn:g> .\n",
        );
        let quads = parse_nquads(text).unwrap();
        assert_eq!(quads.len(), 3);
        assert_eq!(quads[1].graph, Some(Subject::Blank("g1".into())));
        assert_eq!(to_nquads(&quads, Escaping::Canonical), text);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_nquads("<urn:s> <urn:p> .").is_err());
        assert!(parse_nquads("\"lit\" <urn:p> <urn:o> .").is_err());
        assert!(parse_nquads("<urn:s> <urn:p> <urn:o>").is_err());
        assert!(parse_nquads("<urn:s> <urn:p> \"open .").is_err());
    }

    #[test]
    fn test_relabel() {
        let quad = Quad::new(
            Subject::Blank("a".into()),
            "urn:p",
            Object::Blank("b".into()),
            Some(Subject::Blank("a".into())),
        );
        let labels: Vec<_> = quad.blank_labels().collect();
        assert_eq!(labels, vec!["a", "b", "a"]);

        let renamed = quad.map_blank_labels(|l| format!("x{l}"));
        assert_eq!(renamed.subject, Subject::Blank("xa".into()));
        assert_eq!(renamed.object, Object::Blank("xb".into()));
    }
}
