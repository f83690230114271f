//! RDFC-1.0 blank node labeling and canonical N-Quads.
//!
//! Blank nodes are distinguished by hashing their surroundings. Nodes whose
//! first-degree hash is unique get canonical labels straight away; the rest
//! are separated by N-degree hashing, which explores permutations of related
//! nodes and is bounded by a per-node work limit.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use dataproof_core::HashAlgorithm;
use tracing::debug;

use crate::error::{RdfError, Result};
use crate::quad::{Escaping, Quad};

/// Prefix of canonical blank node labels.
pub const CANONICAL_PREFIX: &str = "c14n";

/// Canonicalization algorithm identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CanonicalizationAlgorithm {
    /// RDF Dataset Canonicalization 1.0.
    #[default]
    Rdfc10,
    /// The predecessor draft. Same labeling, RDF 1.1 literal escaping.
    Urdna2015,
}

impl CanonicalizationAlgorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rdfc10 => "RDFC-1.0",
            Self::Urdna2015 => "URDNA2015",
        }
    }

    pub fn escaping(self) -> Escaping {
        match self {
            Self::Rdfc10 => Escaping::Canonical,
            Self::Urdna2015 => Escaping::Legacy,
        }
    }
}

impl fmt::Display for CanonicalizationAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tuning for [`canonicalize_quads`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalizationOptions {
    pub algorithm: CanonicalizationAlgorithm,
    /// Hash used for blank node hashing. URDNA2015 only allows SHA-256.
    pub hash: HashAlgorithm,
    /// Each blank node may be N-degree hashed at most `n^max_work_factor`
    /// times, where `n` is the number of blank nodes.
    pub max_work_factor: u32,
}

impl Default for CanonicalizationOptions {
    fn default() -> Self {
        Self {
            algorithm: CanonicalizationAlgorithm::Rdfc10,
            hash: HashAlgorithm::Sha256,
            max_work_factor: 2,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Canonical form
// ─────────────────────────────────────────────────────────────────────────────

/// A canonically labeled dataset.
///
/// Quads are kept in the order of their serialized lines. Two forms are only
/// equal when produced by the same algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalForm {
    algorithm: CanonicalizationAlgorithm,
    quads: Vec<Quad>,
    issued: Vec<(String, String)>,
}

impl CanonicalForm {
    pub fn algorithm(&self) -> CanonicalizationAlgorithm {
        self.algorithm
    }

    /// Relabeled quads in canonical order.
    pub fn quads(&self) -> &[Quad] {
        &self.quads
    }

    /// `(input label, canonical label)` pairs in issue order, without `_:`.
    pub fn issued(&self) -> &[(String, String)] {
        &self.issued
    }

    /// The canonical label assigned to an input blank node label.
    pub fn canonical_label(&self, input: &str) -> Option<&str> {
        self.issued
            .iter()
            .find(|(existing, _)| existing == input)
            .map(|(_, label)| label.as_str())
    }

    /// One serialized line per quad, newline included.
    pub fn lines(&self) -> Vec<String> {
        let escaping = self.algorithm.escaping();
        self.quads.iter().map(|q| q.to_nquad(escaping)).collect()
    }

    pub fn to_nquads(&self) -> String {
        self.lines().concat()
    }

    pub fn len(&self) -> usize {
        self.quads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }
}

impl fmt::Display for CanonicalForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_nquads())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Identifier issuer
// ─────────────────────────────────────────────────────────────────────────────

/// Issues `prefix0`, `prefix1`, ... to existing labels in first-seen order.
#[derive(Debug, Clone)]
pub struct IdentifierIssuer {
    prefix: String,
    counter: usize,
    issued: Vec<(String, String)>,
    by_existing: HashMap<String, String>,
}

impl IdentifierIssuer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: 0,
            issued: Vec::new(),
            by_existing: HashMap::new(),
        }
    }

    /// The label for `existing`, issuing a new one if needed.
    pub fn issue(&mut self, existing: &str) -> String {
        if let Some(label) = self.by_existing.get(existing) {
            return label.clone();
        }
        let label = format!("{}{}", self.prefix, self.counter);
        self.counter += 1;
        self.by_existing.insert(existing.to_string(), label.clone());
        self.issued.push((existing.to_string(), label.clone()));
        label
    }

    pub fn get(&self, existing: &str) -> Option<&str> {
        self.by_existing.get(existing).map(String::as_str)
    }

    pub fn has(&self, existing: &str) -> bool {
        self.by_existing.contains_key(existing)
    }

    pub fn issued(&self) -> &[(String, String)] {
        &self.issued
    }

    pub fn into_issued(self) -> Vec<(String, String)> {
        self.issued
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Labeling
// ─────────────────────────────────────────────────────────────────────────────

/// Canonicalize an existing quad set.
///
/// Duplicate quads collapse to one line. Fails with
/// [`RdfError::WorkLimitExceeded`] when a blank node needs more N-degree
/// hashing than the options allow.
pub fn canonicalize_quads(
    quads: &[Quad],
    options: &CanonicalizationOptions,
) -> Result<CanonicalForm> {
    if options.algorithm == CanonicalizationAlgorithm::Urdna2015
        && options.hash != HashAlgorithm::Sha256
    {
        return Err(RdfError::Unsupported(format!(
            "{} requires SHA-256",
            options.algorithm
        )));
    }

    let mut state = LabelState::new(quads, options);
    state.assign_labels()?;

    let escaping = options.algorithm.escaping();
    let canonical = &state.canonical;
    let mut lines: Vec<(String, Quad)> = quads
        .iter()
        .map(|quad| {
            let relabeled = quad.map_blank_labels(|label| {
                canonical
                    .get(label)
                    .map_or_else(|| label.to_string(), str::to_string)
            });
            (relabeled.to_nquad(escaping), relabeled)
        })
        .collect();
    lines.sort_by(|a, b| a.0.cmp(&b.0));
    lines.dedup_by(|a, b| a.0 == b.0);

    debug!(
        algorithm = %options.algorithm,
        quads = lines.len(),
        blank_nodes = state.blanks.len(),
        "canonicalized dataset"
    );

    Ok(CanonicalForm {
        algorithm: options.algorithm,
        quads: lines.into_iter().map(|(_, quad)| quad).collect(),
        issued: state.canonical.into_issued(),
    })
}

struct LabelState<'a> {
    quads: &'a [Quad],
    escaping: Escaping,
    hash: HashAlgorithm,
    /// Blank labels in first-appearance order.
    blanks: Vec<String>,
    blank_quads: HashMap<String, Vec<usize>>,
    canonical: IdentifierIssuer,
    first_degree: HashMap<String, String>,
    deep_iterations: HashMap<String, usize>,
    max_deep_iterations: usize,
}

impl<'a> LabelState<'a> {
    fn new(quads: &'a [Quad], options: &CanonicalizationOptions) -> Self {
        let mut blanks = Vec::new();
        let mut blank_quads: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, quad) in quads.iter().enumerate() {
            let mut seen = HashSet::new();
            for label in quad.blank_labels() {
                if !seen.insert(label) {
                    continue;
                }
                let entry = blank_quads.entry(label.to_string()).or_insert_with(|| {
                    blanks.push(label.to_string());
                    Vec::new()
                });
                entry.push(index);
            }
        }

        let max_deep_iterations = blanks.len().saturating_pow(options.max_work_factor);
        Self {
            quads,
            escaping: options.algorithm.escaping(),
            hash: options.hash,
            blanks,
            blank_quads,
            canonical: IdentifierIssuer::new(CANONICAL_PREFIX),
            first_degree: HashMap::new(),
            deep_iterations: HashMap::new(),
            max_deep_iterations,
        }
    }

    fn assign_labels(&mut self) -> Result<()> {
        let mut by_hash: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for blank in self.blanks.clone() {
            let hash = self.hash_first_degree(&blank);
            by_hash.entry(hash).or_default().push(blank);
        }

        let mut shared = Vec::new();
        for nodes in by_hash.into_values() {
            match nodes.as_slice() {
                [only] => {
                    self.canonical.issue(only);
                }
                _ => shared.push(nodes),
            }
        }

        for nodes in shared {
            let mut results = Vec::new();
            for node in &nodes {
                if self.canonical.has(node) {
                    continue;
                }
                let mut temporary = IdentifierIssuer::new("b");
                temporary.issue(node);
                results.push(self.hash_n_degree(node, temporary)?);
            }
            results.sort_by(|a, b| a.0.cmp(&b.0));
            for (_, issuer) in results {
                for (existing, _) in issuer.issued() {
                    self.canonical.issue(existing);
                }
            }
        }
        Ok(())
    }

    fn hash_first_degree(&mut self, id: &str) -> String {
        if let Some(hash) = self.first_degree.get(id) {
            return hash.clone();
        }
        let quads = self.quads;
        let mut lines: Vec<String> = self
            .blank_quads
            .get(id)
            .map(|indices| {
                indices
                    .iter()
                    .map(|&i| {
                        quads[i]
                            .map_blank_labels(|label| (if label == id { "a" } else { "z" }).to_string())
                            .to_nquad(self.escaping)
                    })
                    .collect()
            })
            .unwrap_or_default();
        lines.sort();
        let hash = self.hash.hex_digest(lines.concat().as_bytes());
        self.first_degree.insert(id.to_string(), hash.clone());
        hash
    }

    fn hash_related(
        &mut self,
        related: &str,
        quad: &Quad,
        issuer: &IdentifierIssuer,
        position: char,
    ) -> String {
        let id = match self.canonical.get(related).or_else(|| issuer.get(related)) {
            Some(label) => format!("_:{label}"),
            None => self.hash_first_degree(related),
        };
        let mut input = String::from(position);
        if position != 'g' {
            input.push('<');
            input.push_str(&quad.predicate);
            input.push('>');
        }
        input.push_str(&id);
        self.hash.hex_digest(input.as_bytes())
    }

    fn hash_to_related(
        &mut self,
        id: &str,
        issuer: &IdentifierIssuer,
    ) -> BTreeMap<String, Vec<String>> {
        let quads = self.quads;
        let indices = self.blank_quads.get(id).cloned().unwrap_or_default();
        let mut related: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for i in indices {
            let quad = &quads[i];
            let components = [
                (quad.subject.blank_label(), 's'),
                (quad.object.blank_label(), 'o'),
                (quad.graph.as_ref().and_then(|g| g.blank_label()), 'g'),
            ];
            for (label, position) in components {
                let Some(label) = label else { continue };
                if label == id {
                    continue;
                }
                let hash = self.hash_related(label, quad, issuer, position);
                related.entry(hash).or_default().push(label.to_string());
            }
        }
        related
    }

    fn hash_n_degree(
        &mut self,
        id: &str,
        mut issuer: IdentifierIssuer,
    ) -> Result<(String, IdentifierIssuer)> {
        let count = self.deep_iterations.entry(id.to_string()).or_insert(0);
        *count += 1;
        if *count > self.max_deep_iterations {
            return Err(RdfError::WorkLimitExceeded {
                limit: self.max_deep_iterations,
            });
        }

        let mut data = String::new();
        for (related_hash, nodes) in self.hash_to_related(id, &issuer) {
            data.push_str(&related_hash);

            let mut chosen_path = String::new();
            let mut chosen_issuer = None;
            let mut order: Vec<usize> = (0..nodes.len()).collect();
            loop {
                if let Some((path, candidate)) =
                    self.explore_permutation(&order, &nodes, &issuer, &chosen_path)?
                {
                    if chosen_path.is_empty() || path < chosen_path {
                        chosen_path = path;
                        chosen_issuer = Some(candidate);
                    }
                }
                if !next_permutation(&mut order) {
                    break;
                }
            }

            data.push_str(&chosen_path);
            if let Some(chosen) = chosen_issuer {
                issuer = chosen;
            }
        }

        Ok((self.hash.hex_digest(data.as_bytes()), issuer))
    }

    /// Build the path for one ordering of related nodes. `None` when it can
    /// no longer beat `chosen_path`.
    fn explore_permutation(
        &mut self,
        order: &[usize],
        nodes: &[String],
        issuer: &IdentifierIssuer,
        chosen_path: &str,
    ) -> Result<Option<(String, IdentifierIssuer)>> {
        let mut candidate = issuer.clone();
        let mut path = String::new();
        let mut recursion = Vec::new();

        for &i in order {
            let related = &nodes[i];
            path.push_str("_:");
            match self.canonical.get(related) {
                Some(label) => path.push_str(label),
                None => {
                    if !candidate.has(related) {
                        recursion.push(related.clone());
                    }
                    path.push_str(&candidate.issue(related));
                }
            }
            if worse_than(&path, chosen_path) {
                return Ok(None);
            }
        }

        for related in recursion {
            let (hash, next) = self.hash_n_degree(&related, candidate)?;
            candidate = next;
            path.push_str("_:");
            path.push_str(&candidate.issue(&related));
            path.push('<');
            path.push_str(&hash);
            path.push('>');
            if worse_than(&path, chosen_path) {
                return Ok(None);
            }
        }

        Ok(Some((path, candidate)))
    }
}

fn worse_than(path: &str, chosen: &str) -> bool {
    !chosen.is_empty() && path.len() >= chosen.len() && path > chosen
}

/// Advance to the next lexicographic permutation. `false` once wrapped.
fn next_permutation(order: &mut [usize]) -> bool {
    if order.len() < 2 {
        return false;
    }
    let Some(pivot) = (0..order.len() - 1).rev().find(|&i| order[i] < order[i + 1]) else {
        return false;
    };
    let Some(successor) = (pivot + 1..order.len()).rev().find(|&j| order[j] > order[pivot]) else {
        return false;
    };
    order.swap(pivot, successor);
    order[pivot + 1..].reverse();
    true
}
