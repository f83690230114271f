//! IRI and keyword helpers shared by context processing, expansion and toRDF.

/// Every JSON-LD 1.1 keyword.
const KEYWORDS: &[&str] = &[
    "@base",
    "@container",
    "@context",
    "@default",
    "@direction",
    "@embed",
    "@explicit",
    "@graph",
    "@id",
    "@import",
    "@included",
    "@index",
    "@json",
    "@language",
    "@list",
    "@nest",
    "@none",
    "@omitDefault",
    "@prefix",
    "@preserve",
    "@propagate",
    "@protected",
    "@requireAll",
    "@reverse",
    "@set",
    "@type",
    "@value",
    "@version",
    "@vocab",
];

pub(crate) fn is_keyword(value: &str) -> bool {
    KEYWORDS.contains(&value)
}

/// `@` followed by ASCII letters only. Such strings are reserved and ignored.
pub(crate) fn looks_like_keyword(value: &str) -> bool {
    value
        .strip_prefix('@')
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphabetic()))
}

/// Split `prefix:suffix` when the colon is not the first character.
pub(crate) fn split_compact(value: &str) -> Option<(&str, &str)> {
    match value.find(':') {
        Some(0) | None => None,
        Some(i) => Some((&value[..i], &value[i + 1..])),
    }
}

/// Has a syntactically valid scheme.
pub(crate) fn is_absolute_iri(value: &str) -> bool {
    let Some((scheme, _)) = value.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Absolute, and free of characters N-Quads cannot carry inside `<...>`.
pub(crate) fn is_valid_iri(value: &str) -> bool {
    is_absolute_iri(value)
        && !value.chars().any(|c| {
            c <= ' ' || matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\')
        })
}

pub(crate) fn is_blank(value: &str) -> bool {
    value.starts_with("_:")
}

/// Resolve a reference against an absolute base IRI.
///
/// Handles fragment, query, absolute-path and plain relative references.
/// Dot segments are not removed; references containing them are returned
/// unresolved.
pub(crate) fn resolve(base: &str, reference: &str) -> Option<String> {
    if is_absolute_iri(reference) {
        return Some(reference.to_string());
    }
    if reference.split('/').any(|seg| seg == "." || seg == "..") {
        return None;
    }
    let base_no_fragment = base.split('#').next().unwrap_or(base);
    if reference.is_empty() {
        return Some(base_no_fragment.to_string());
    }
    if reference.starts_with('#') {
        return Some(format!("{base_no_fragment}{reference}"));
    }
    let base_no_query = base_no_fragment.split('?').next().unwrap_or(base_no_fragment);
    if reference.starts_with('?') {
        return Some(format!("{base_no_query}{reference}"));
    }

    let (scheme, rest) = base_no_query.split_once(':')?;
    if let Some(authority_path) = rest.strip_prefix("//") {
        if let Some(network_path) = reference.strip_prefix("//") {
            return Some(format!("{scheme}://{network_path}"));
        }
        let (authority, path) = match authority_path.find('/') {
            Some(i) => authority_path.split_at(i),
            None => (authority_path, ""),
        };
        if reference.starts_with('/') {
            return Some(format!("{scheme}://{authority}{reference}"));
        }
        let dir = match path.rfind('/') {
            Some(i) => &path[..=i],
            None => "/",
        };
        return Some(format!("{scheme}://{authority}{dir}{reference}"));
    }
    let dir = match rest.rfind('/') {
        Some(i) => &rest[..=i],
        None => "",
    };
    Some(format!("{scheme}:{dir}{reference}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords() {
        assert!(is_keyword("@id"));
        assert!(!is_keyword("id"));
        assert!(looks_like_keyword("@foo"));
        assert!(!looks_like_keyword("@"));
        assert!(!looks_like_keyword("@foo1"));
    }

    #[test]
    fn test_absolute_iri() {
        assert!(is_absolute_iri("https://example.com/a"));
        assert!(is_absolute_iri("urn:test:1"));
        assert!(is_absolute_iri("did:example:1#key-1"));
        assert!(!is_absolute_iri("relative/path"));
        assert!(!is_absolute_iri("1abc:def"));
        assert!(!is_valid_iri("https://example.com/a b"));
        assert!(!is_valid_iri("https://example.com/<a>"));
    }

    #[test]
    fn test_split_compact() {
        assert_eq!(split_compact("schema:name"), Some(("schema", "name")));
        assert_eq!(split_compact(":name"), None);
        assert_eq!(split_compact("name"), None);
    }

    #[test]
    fn test_resolve() {
        let base = "https://example.com/a/b?q#f";
        assert_eq!(resolve(base, "c").as_deref(), Some("https://example.com/a/c"));
        assert_eq!(resolve(base, "/c").as_deref(), Some("https://example.com/c"));
        assert_eq!(resolve(base, "#x").as_deref(), Some("https://example.com/a/b?q#x"));
        assert_eq!(resolve(base, "?z").as_deref(), Some("https://example.com/a/b?z"));
        assert_eq!(resolve(base, "//other.org/x").as_deref(), Some("https://other.org/x"));
        assert_eq!(resolve(base, "urn:x").as_deref(), Some("urn:x"));
        assert_eq!(resolve(base, "../c"), None);
    }
}
