//! JSON-LD context processing.
//!
//! Builds an [`ActiveContext`] from local and remote contexts. Remote
//! contexts must already be in the [`ContextSet`]; nothing here performs I/O.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{RdfError, Result};
use crate::iri::{is_absolute_iri, is_blank, is_keyword, looks_like_keyword, resolve, split_compact};
use crate::prefetch::ContextSet;

/// Maximum nesting of remote context references.
const MAX_REMOTE_DEPTH: usize = 32;

/// Keys of a local context that are not term definitions.
const CONTEXT_KEYWORDS: &[&str] = &[
    "@base",
    "@direction",
    "@import",
    "@language",
    "@propagate",
    "@protected",
    "@version",
    "@vocab",
];

/// Keys allowed inside an expanded term definition.
const DEFINITION_KEYS: &[&str] = &[
    "@container",
    "@context",
    "@direction",
    "@id",
    "@index",
    "@language",
    "@nest",
    "@prefix",
    "@protected",
    "@reverse",
    "@type",
];

/// Supported `@container` values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Container {
    pub list: bool,
    pub set: bool,
    pub graph: bool,
}

/// A processed term definition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermDefinition {
    /// Expanded IRI or keyword. `None` when the term is explicitly unmapped.
    pub iri: Option<String>,
    pub prefix: bool,
    pub protected: bool,
    /// `@id`, `@vocab`, `@none`, or a datatype IRI.
    pub type_mapping: Option<String>,
    pub container: Container,
    /// `Some(None)` when the term explicitly resets the language to null.
    pub language: Option<Option<String>>,
    /// Scoped context, processed when the term is used.
    pub context: Option<Value>,
}

impl TermDefinition {
    /// Equal in everything except the protected flag.
    fn same_as(&self, other: &Self) -> bool {
        self.iri == other.iri
            && self.prefix == other.prefix
            && self.type_mapping == other.type_mapping
            && self.container == other.container
            && self.language == other.language
            && self.context == other.context
    }
}

/// The active context: term definitions plus defaults.
#[derive(Debug, Clone, Default)]
pub struct ActiveContext {
    terms: HashMap<String, TermDefinition>,
    pub vocab: Option<String>,
    pub base: Option<String>,
    pub language: Option<String>,
    /// The context to revert to when entering a new node object, set by
    /// non-propagated (type-scoped) contexts.
    previous: Option<Box<ActiveContext>>,
}

impl ActiveContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn term(&self, term: &str) -> Option<&TermDefinition> {
        self.terms.get(term)
    }

    pub fn previous(&self) -> Option<&ActiveContext> {
        self.previous.as_deref()
    }

    fn has_protected_terms(&self) -> bool {
        self.terms.values().any(|d| d.protected)
    }

    /// Process `local` on top of this context.
    pub fn process(
        &self,
        local: &Value,
        remote: &ContextSet,
        override_protected: bool,
        propagate: bool,
    ) -> Result<ActiveContext> {
        let processor = Processor { remote };
        processor.process(self, local, override_protected, propagate, &mut Vec::new())
    }

    /// IRI expansion against this context.
    ///
    /// `vocab` selects vocabulary-relative expansion (properties, types);
    /// `document_relative` allows resolution against `@base`.
    pub fn expand_iri(&self, value: &str, document_relative: bool, vocab: bool) -> Option<String> {
        if is_keyword(value) {
            return Some(value.to_string());
        }
        if looks_like_keyword(value) {
            return None;
        }
        if vocab {
            if let Some(definition) = self.terms.get(value) {
                return definition.iri.clone();
            }
        }
        if let Some((prefix, suffix)) = split_compact(value) {
            if prefix == "_" || suffix.starts_with("//") {
                return Some(value.to_string());
            }
            if let Some(definition) = self.terms.get(prefix) {
                if let (true, Some(iri)) = (definition.prefix, &definition.iri) {
                    return Some(format!("{iri}{suffix}"));
                }
            }
            if is_absolute_iri(value) {
                return Some(value.to_string());
            }
        }
        if vocab {
            if let Some(vocab) = &self.vocab {
                return Some(format!("{vocab}{value}"));
            }
        }
        if document_relative {
            if let Some(resolved) = self.base.as_deref().and_then(|base| resolve(base, value)) {
                return Some(resolved);
            }
        }
        Some(value.to_string())
    }
}

struct Processor<'a> {
    remote: &'a ContextSet,
}

impl<'a> Processor<'a> {
    fn process(
        &self,
        active: &ActiveContext,
        local: &Value,
        override_protected: bool,
        propagate: bool,
        remote_stack: &mut Vec<String>,
    ) -> Result<ActiveContext> {
        let mut result = active.clone();

        let mut propagate = propagate;
        if let Some(value) = local.as_object().and_then(|m| m.get("@propagate")) {
            propagate = value
                .as_bool()
                .ok_or_else(|| RdfError::InvalidContext("@propagate must be a boolean".into()))?;
        }
        if !propagate && result.previous.is_none() {
            result.previous = Some(Box::new(active.clone()));
        }

        let contexts: Vec<&Value> = match local {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };

        for context in contexts {
            match context {
                Value::Null => {
                    if !override_protected && result.has_protected_terms() {
                        return Err(RdfError::InvalidContext(
                            "cannot nullify a context with protected terms".into(),
                        ));
                    }
                    let before = std::mem::take(&mut result);
                    if !propagate {
                        result.previous = Some(Box::new(before));
                    }
                }
                Value::String(url) => {
                    if remote_stack.contains(url) {
                        return Err(RdfError::InvalidContext(format!(
                            "recursive inclusion of {url}"
                        )));
                    }
                    if remote_stack.len() >= MAX_REMOTE_DEPTH {
                        return Err(RdfError::InvalidContext("remote contexts nested too deeply".into()));
                    }
                    let document = self.remote.get(url).ok_or_else(|| {
                        RdfError::ContextResolution(format!("remote context {url} was not loaded"))
                    })?;
                    let loaded = document
                        .as_object()
                        .and_then(|d| d.get("@context"))
                        .ok_or_else(|| {
                            RdfError::InvalidContext(format!("{url} does not contain @context"))
                        })?;
                    remote_stack.push(url.clone());
                    result = self.process(&result, loaded, false, true, remote_stack)?;
                    remote_stack.pop();
                }
                Value::Object(map) => {
                    self.apply_local(&mut result, map, override_protected, remote_stack.is_empty())?;
                }
                other => {
                    return Err(RdfError::InvalidContext(format!(
                        "invalid local context: {other}"
                    )))
                }
            }
        }
        Ok(result)
    }

    fn apply_local(
        &self,
        result: &mut ActiveContext,
        map: &Map<String, Value>,
        override_protected: bool,
        allow_base: bool,
    ) -> Result<()> {
        if let Some(version) = map.get("@version") {
            if version.as_f64() != Some(1.1) {
                return Err(RdfError::InvalidContext(format!("invalid @version {version}")));
            }
        }
        if map.contains_key("@import") {
            return Err(RdfError::Unsupported("@import".into()));
        }
        if map.contains_key("@direction") {
            return Err(RdfError::Unsupported("@direction".into()));
        }

        if let (true, Some(base)) = (allow_base, map.get("@base")) {
            result.base = match base {
                Value::Null => None,
                Value::String(iri) if is_absolute_iri(iri) => Some(iri.clone()),
                Value::String(_) => return Err(RdfError::Unsupported("relative @base".into())),
                _ => return Err(RdfError::InvalidContext("invalid @base".into())),
            };
        }

        if let Some(vocab) = map.get("@vocab") {
            result.vocab = match vocab {
                Value::Null => None,
                Value::String(value) => match result.expand_iri(value, true, true) {
                    Some(iri) if is_absolute_iri(&iri) || is_blank(&iri) => Some(iri),
                    _ => {
                        return Err(RdfError::InvalidContext(format!(
                            "invalid vocabulary mapping {value}"
                        )))
                    }
                },
                _ => return Err(RdfError::InvalidContext("invalid @vocab".into())),
            };
        }

        if let Some(language) = map.get("@language") {
            result.language = match language {
                Value::Null => None,
                Value::String(tag) => Some(tag.clone()),
                _ => return Err(RdfError::InvalidContext("invalid default language".into())),
            };
        }

        let protected = match map.get("@protected") {
            None => false,
            Some(Value::Bool(flag)) => *flag,
            Some(_) => return Err(RdfError::InvalidContext("@protected must be a boolean".into())),
        };

        let mut definer = TermDefiner {
            local: map,
            defined: HashMap::new(),
            protected,
            override_protected,
        };
        for term in map.keys() {
            if CONTEXT_KEYWORDS.contains(&term.as_str()) {
                continue;
            }
            definer.define(result, term)?;
        }
        Ok(())
    }
}

/// Creates term definitions for one local context, resolving dependencies
/// between its terms.
struct TermDefiner<'a> {
    local: &'a Map<String, Value>,
    /// `false` while a definition is in progress, `true` once done.
    defined: HashMap<String, bool>,
    protected: bool,
    override_protected: bool,
}

impl<'a> TermDefiner<'a> {
    fn define(&mut self, active: &mut ActiveContext, term: &str) -> Result<()> {
        match self.defined.get(term) {
            Some(true) => return Ok(()),
            Some(false) => {
                return Err(RdfError::InvalidContext(format!("cyclic IRI mapping for {term}")))
            }
            None => {}
        }
        if term.is_empty() {
            return Err(RdfError::InvalidContext("empty term".into()));
        }
        if term == "@type" {
            return Err(RdfError::Unsupported("@type term definitions".into()));
        }
        if is_keyword(term) {
            return Err(RdfError::InvalidContext(format!("keyword redefinition: {term}")));
        }
        if looks_like_keyword(term) {
            warn!(term, "ignoring reserved term");
            self.defined.insert(term.to_string(), true);
            return Ok(());
        }
        let Some(value) = self.local.get(term) else {
            return Ok(());
        };

        self.defined.insert(term.to_string(), false);
        let previous = active.terms.remove(term);

        let (entry, simple) = match value {
            Value::Null => {
                let mut entry = Map::new();
                entry.insert("@id".into(), Value::Null);
                (entry, false)
            }
            Value::String(id) => {
                let mut entry = Map::new();
                entry.insert("@id".into(), Value::String(id.clone()));
                (entry, true)
            }
            Value::Object(entry) => (entry.clone(), false),
            _ => {
                return Err(RdfError::InvalidContext(format!(
                    "invalid term definition for {term}"
                )))
            }
        };

        if let Some(key) = entry.keys().find(|k| !DEFINITION_KEYS.contains(&k.as_str())) {
            return Err(RdfError::InvalidContext(format!(
                "invalid term definition for {term}: unexpected {key}"
            )));
        }
        for unsupported in ["@reverse", "@nest", "@index", "@direction"] {
            if entry.contains_key(unsupported) {
                return Err(RdfError::Unsupported(format!("{unsupported} in term definition")));
            }
        }

        let mut definition = TermDefinition {
            protected: match entry.get("@protected") {
                None => self.protected,
                Some(Value::Bool(flag)) => *flag,
                Some(_) => {
                    return Err(RdfError::InvalidContext(format!("invalid @protected for {term}")))
                }
            },
            ..Default::default()
        };

        if let Some(type_value) = entry.get("@type") {
            let type_str = type_value
                .as_str()
                .ok_or_else(|| RdfError::InvalidContext(format!("invalid type mapping for {term}")))?;
            definition.type_mapping = match self.expand_iri(active, type_str)?.as_deref() {
                Some(keyword @ ("@id" | "@vocab" | "@none")) => Some(keyword.to_string()),
                Some("@json") => return Err(RdfError::Unsupported("@json".into())),
                Some(iri) if is_absolute_iri(iri) => Some(iri.to_string()),
                _ => {
                    return Err(RdfError::InvalidContext(format!(
                        "invalid type mapping {type_str} for {term}"
                    )))
                }
            };
        }

        match entry.get("@id") {
            Some(id_value) if id_value.as_str() != Some(term) => match id_value {
                Value::Null => definition.iri = None,
                Value::String(id) if !is_keyword(id) && looks_like_keyword(id) => {
                    warn!(term, id = %id, "ignoring term mapped to a reserved value");
                    definition.iri = None;
                }
                Value::String(id) => {
                    let iri = match self.expand_iri(active, id)? {
                        Some(iri) if is_keyword(&iri) || is_absolute_iri(&iri) || is_blank(&iri) => iri,
                        _ => {
                            return Err(RdfError::InvalidContext(format!(
                                "invalid IRI mapping {id} for {term}"
                            )))
                        }
                    };
                    if iri == "@context" {
                        return Err(RdfError::InvalidContext("@context cannot be aliased".into()));
                    }
                    definition.prefix = simple
                        && !term.contains([':', '/'])
                        && (iri.ends_with([':', '/', '?', '#', '[', ']', '@']) || is_blank(&iri));
                    definition.iri = Some(iri);
                }
                _ => {
                    return Err(RdfError::InvalidContext(format!("invalid @id for {term}")))
                }
            },
            _ => {
                definition.iri = Some(self.implicit_iri(active, term)?);
            }
        }

        if let Some(container) = entry.get("@container") {
            definition.container = parse_container(term, container)?;
        }
        if let Some(scoped) = entry.get("@context") {
            definition.context = Some(scoped.clone());
        }
        if !entry.contains_key("@type") {
            if let Some(language) = entry.get("@language") {
                definition.language = Some(match language {
                    Value::Null => None,
                    Value::String(tag) => Some(tag.clone()),
                    _ => {
                        return Err(RdfError::InvalidContext(format!("invalid @language for {term}")))
                    }
                });
            }
        }
        if let Some(prefix) = entry.get("@prefix") {
            if term.contains([':', '/']) {
                return Err(RdfError::InvalidContext(format!("{term} cannot be a prefix")));
            }
            definition.prefix = prefix
                .as_bool()
                .ok_or_else(|| RdfError::InvalidContext(format!("invalid @prefix for {term}")))?;
        }

        if let Some(previous) = previous {
            if previous.protected && !self.override_protected {
                if !previous.same_as(&definition) {
                    return Err(RdfError::InvalidContext(format!(
                        "protected term redefinition: {term}"
                    )));
                }
                definition = previous;
            }
        }

        active.terms.insert(term.to_string(), definition);
        self.defined.insert(term.to_string(), true);
        Ok(())
    }

    /// IRI for a term without an explicit `@id`.
    fn implicit_iri(&mut self, active: &mut ActiveContext, term: &str) -> Result<String> {
        if let Some((prefix, suffix)) = split_compact(term) {
            if self.local.contains_key(prefix) {
                self.define(active, prefix)?;
            }
            return Ok(match active.terms.get(prefix).and_then(|d| d.iri.as_ref()) {
                Some(iri) => format!("{iri}{suffix}"),
                None => term.to_string(),
            });
        }
        if term.contains('/') {
            if is_absolute_iri(term) {
                return Ok(term.to_string());
            }
            return Err(RdfError::InvalidContext(format!("invalid IRI mapping for {term}")));
        }
        match &active.vocab {
            Some(vocab) => Ok(format!("{vocab}{term}")),
            None => Err(RdfError::InvalidContext(format!(
                "term {term} has no IRI mapping and no @vocab"
            ))),
        }
    }

    /// Vocabulary-relative expansion that first defines any terms of this
    /// local context the value depends on.
    fn expand_iri(&mut self, active: &mut ActiveContext, value: &str) -> Result<Option<String>> {
        if self.local.contains_key(value) && self.defined.get(value) != Some(&true) {
            self.define(active, value)?;
        }
        if let Some((prefix, _)) = split_compact(value) {
            if self.local.contains_key(prefix) && self.defined.get(prefix) != Some(&true) {
                self.define(active, prefix)?;
            }
        }
        Ok(active.expand_iri(value, false, true))
    }
}

fn parse_container(term: &str, value: &Value) -> Result<Container> {
    let items: Vec<&str> = match value {
        Value::String(item) => vec![item.as_str()],
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .ok_or_else(|| RdfError::InvalidContext(format!("invalid @container for {term}")))
            })
            .collect::<Result<_>>()?,
        _ => return Err(RdfError::InvalidContext(format!("invalid @container for {term}"))),
    };

    let mut container = Container::default();
    for item in items {
        match item {
            "@list" => container.list = true,
            "@set" => container.set = true,
            "@graph" => container.graph = true,
            "@index" | "@language" | "@id" | "@type" => {
                return Err(RdfError::Unsupported(format!("{item} container")))
            }
            other => {
                return Err(RdfError::InvalidContext(format!(
                    "invalid container {other} for {term}"
                )))
            }
        }
    }
    if container.list && (container.set || container.graph) {
        return Err(RdfError::InvalidContext(format!("invalid container combination for {term}")));
    }
    Ok(container)
}
