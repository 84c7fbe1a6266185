//! align
//!
//! Progressive alignment of witnesses into a [`VariantGraph`].
//!
//! # Pipeline
//!
//! Merging one witness runs, in order:
//!
//! 1. **Validate** - shape and size checks; nothing is mutated on failure
//! 2. **Match** - [`matcher`] builds candidate clusters against the graph's
//!    vertex order, using a [`repeats::RepeatIndex`] on each side
//! 3. **Search** - [`search`] picks the cheapest consistent match set
//! 4. **Classify** - [`classify`] splits it into an order-preserving
//!    backbone, transpositions and gaps
//! 5. **Update** - backbone tokens join their vertices, every other token
//!    gets a new vertex, the witness path is linked and transpositions are
//!    recorded
//!
//! Witnesses are merged strictly one after another; the order shapes the
//! graph but not its correctness.
//!
//! # Example
//!
//! ```
//! use collatio::align::Collator;
//! use collatio::core::config::CollationConfig;
//! use collatio::core::types::{Sigil, Witness};
//!
//! let a = Witness::from_text(Sigil::new("A").unwrap(), "the black cat");
//! let b = Witness::from_text(Sigil::new("B").unwrap(), "the white cat");
//!
//! let mut collator = Collator::new(CollationConfig::default());
//! let alignments = collator.collate([&a, &b]).unwrap();
//!
//! assert_eq!(alignments[1].matches.len(), 2);
//! assert_eq!(alignments[1].replacements().count(), 1);
//! assert_eq!(collator.graph().vertex_count(), 4);
//! ```

pub mod classify;
pub mod distance;
pub mod matcher;
pub mod repeats;
pub mod search;

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use thiserror::Error;

use crate::core::config::CollationConfig;
use crate::core::graph::{Transposition, VariantGraph, VertexId};
use crate::core::types::{Sigil, Witness};

use classify::{Classifier, Difference, Span};
use matcher::{Column, MatchKind, Matcher};
use repeats::RepeatIndex;
use search::{DecisionSearch, SearchCost};

/// Errors from merging witnesses.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CollationError {
    #[error("invalid witness '{sigil}': {reason}")]
    InvalidWitness { sigil: Sigil, reason: String },

    #[error("witness '{sigil}' exceeds the {what} limit: {actual} > {limit}")]
    OversizeInput {
        sigil: Sigil,
        what: &'static str,
        limit: usize,
        actual: usize,
    },

    #[error("internal error: match search exhausted while merging witness '{sigil}'")]
    SearchExhausted { sigil: Sigil },
}

/// An accepted match, resolved to its graph vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AlignedMatch {
    pub witness_position: u32,
    pub vertex: VertexId,
    pub cost: u32,
    pub kind: MatchKind,
    /// Whether the token joined the vertex (it kept its order).
    pub folded: bool,
}

/// What merging one witness did.
///
/// The graph is the primary result; this report is derived from the same
/// decisions for callers that want the differences spelled out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alignment {
    pub witness: Sigil,
    /// Every match accepted by the search, in witness order.
    pub matches: Vec<AlignedMatch>,
    /// Differences in witness order.
    pub differences: Vec<Difference>,
    /// Total cost of the chosen decisions.
    pub cost: SearchCost,
}

impl Alignment {
    fn of_kind<'a>(
        &'a self,
        pick: impl Fn(&'a Difference) -> bool + 'a,
    ) -> impl Iterator<Item = &'a Span> + 'a {
        self.differences
            .iter()
            .filter(move |d| pick(*d))
            .map(Difference::span)
    }

    pub fn additions(&self) -> impl Iterator<Item = &Span> + '_ {
        self.of_kind(|d| matches!(d, Difference::Addition(_)))
    }

    pub fn omissions(&self) -> impl Iterator<Item = &Span> + '_ {
        self.of_kind(|d| matches!(d, Difference::Omission(_)))
    }

    pub fn replacements(&self) -> impl Iterator<Item = &Span> + '_ {
        self.of_kind(|d| matches!(d, Difference::Replacement(_)))
    }

    pub fn transpositions(&self) -> impl Iterator<Item = &Span> + '_ {
        self.of_kind(|d| matches!(d, Difference::Transposition { .. }))
    }

    /// Matches accepted despite differing keys.
    pub fn near_matches(&self) -> impl Iterator<Item = &AlignedMatch> {
        self.matches.iter().filter(|m| m.kind == MatchKind::Near)
    }
}

/// Merge `witness` into `graph`.
///
/// # Errors
///
/// - `InvalidWitness` / `OversizeInput` before the graph is touched
/// - `SearchExhausted` if the match search fails (a defect)
pub fn merge(
    graph: &mut VariantGraph,
    witness: &Witness,
    config: &CollationConfig,
) -> Result<Alignment, CollationError> {
    check_shape(witness)?;
    if graph.contains_witness(witness.sigil()) {
        return Err(invalid(witness, "sigil already merged into this graph"));
    }
    check_limits(witness, graph_char_count(graph), config)?;

    merge_checked(graph, witness, config)
}

fn merge_checked(
    graph: &mut VariantGraph,
    witness: &Witness,
    config: &CollationConfig,
) -> Result<Alignment, CollationError> {
    let sigil = witness.sigil();
    let columns: Vec<Column> = graph
        .vertex_order()
        .into_iter()
        .map(|vertex| Column {
            vertex,
            keys: graph
                .vertex(vertex)
                .keys()
                .into_iter()
                .map(str::to_string)
                .collect(),
        })
        .collect();

    let graph_index = Matcher::index_columns(&columns);
    let witness_index = RepeatIndex::for_witness(witness);
    let clusters =
        Matcher::new(config).candidates(&columns, witness, &graph_index, &witness_index);
    tracing::debug!(
        witness = %sigil,
        tokens = witness.len(),
        columns = columns.len(),
        repeating = witness_index.repeating_keys().count(),
        "candidate clusters built"
    );

    let outcome = DecisionSearch::new(&clusters)
        .run()
        .ok_or_else(|| CollationError::SearchExhausted {
            sigil: sigil.clone(),
        })?;
    tracing::debug!(
        witness = %sigil,
        accepted = outcome.matches.len(),
        cost = %outcome.cost,
        expanded = outcome.expanded,
        "match search finished"
    );

    let classification =
        Classifier::new(&columns, witness, config.transposition_limit).classify(&outcome.matches);

    // Update the graph.
    graph.register_witness(sigil.clone());

    let folded: BTreeMap<u32, u32> = classification
        .backbone
        .iter()
        .map(|m| (m.witness_position, m.graph_position))
        .collect();
    let mut created: BTreeMap<u32, VertexId> = BTreeMap::new();
    let mut path = Vec::with_capacity(witness.len() + 1);

    for token in witness.tokens() {
        let vertex = match folded.get(&token.position()) {
            Some(&position) => {
                let vertex = columns[position as usize].vertex;
                graph.add_token(vertex, token.clone());
                vertex
            }
            None => {
                let vertex = graph.add_vertex(token.clone());
                created.insert(token.position(), vertex);
                vertex
            }
        };
        path.push(vertex);
    }

    path.push(graph.end());
    let mut previous = graph.start();
    for &vertex in &path {
        graph.connect(previous, vertex, sigil);
        previous = vertex;
    }

    for phrase in &classification.transposed {
        let vertices: BTreeSet<VertexId> = phrase
            .matches
            .iter()
            .flat_map(|m| {
                let original = columns[m.graph_position as usize].vertex;
                std::iter::once(original).chain(created.get(&m.witness_position).copied())
            })
            .collect();
        graph.add_transposition(Transposition::new(vertices));
    }

    tracing::debug!(
        witness = %sigil,
        folded = folded.len(),
        created = created.len(),
        transpositions = classification.transposed.len(),
        "witness merged"
    );

    let matches = outcome
        .matches
        .iter()
        .map(|m| AlignedMatch {
            witness_position: m.witness_position,
            vertex: columns[m.graph_position as usize].vertex,
            cost: m.cost,
            kind: m.kind,
            folded: folded.contains_key(&m.witness_position),
        })
        .collect();

    Ok(Alignment {
        witness: sigil.clone(),
        matches,
        differences: classification.differences,
        cost: outcome.cost,
    })
}

fn invalid(witness: &Witness, reason: impl Into<String>) -> CollationError {
    CollationError::InvalidWitness {
        sigil: witness.sigil().clone(),
        reason: reason.into(),
    }
}

/// Structural checks that do not depend on the graph.
fn check_shape(witness: &Witness) -> Result<(), CollationError> {
    if witness.is_empty() {
        return Err(invalid(witness, "witness has no tokens"));
    }
    for (idx, token) in witness.tokens().iter().enumerate() {
        if token.witness() != witness.sigil() {
            return Err(invalid(
                witness,
                format!("token {} belongs to witness '{}'", idx, token.witness()),
            ));
        }
        if token.position() as usize != idx {
            return Err(invalid(
                witness,
                format!("token {} has position {}", idx, token.position()),
            ));
        }
        if token.key().is_empty() {
            return Err(invalid(witness, format!("token {} has an empty key", idx)));
        }
    }
    Ok(())
}

fn check_limits(
    witness: &Witness,
    chars_before: usize,
    config: &CollationConfig,
) -> Result<(), CollationError> {
    if let Some(limit) = config.witness_token_limit() {
        if witness.len() > limit {
            return Err(CollationError::OversizeInput {
                sigil: witness.sigil().clone(),
                what: "witness token",
                limit,
                actual: witness.len(),
            });
        }
    }
    if let Some(limit) = config.collation_size_limit() {
        let actual = chars_before + witness.char_count();
        if actual > limit {
            return Err(CollationError::OversizeInput {
                sigil: witness.sigil().clone(),
                what: "collation size",
                limit,
                actual,
            });
        }
    }
    Ok(())
}

fn graph_char_count(graph: &VariantGraph) -> usize {
    graph
        .vertices()
        .flat_map(|(_, vertex)| vertex.tokens().values())
        .map(|token| token.display().chars().count())
        .sum()
}

/// Owns a graph and merges witnesses into it in order.
#[derive(Debug, Clone, Default)]
pub struct Collator {
    config: CollationConfig,
    graph: VariantGraph,
}

impl Collator {
    /// Create a collator with an empty graph.
    pub fn new(config: CollationConfig) -> Self {
        Self {
            config,
            graph: VariantGraph::new(),
        }
    }

    pub fn config(&self) -> &CollationConfig {
        &self.config
    }

    /// Merge one witness.
    pub fn merge(&mut self, witness: &Witness) -> Result<Alignment, CollationError> {
        merge(&mut self.graph, witness, &self.config)
    }

    /// Validate witnesses about to be merged in order, applying the size
    /// limits to the whole collation.
    pub fn check<'w, I>(&self, witnesses: I) -> Result<(), CollationError>
    where
        I: IntoIterator<Item = &'w Witness>,
    {
        let mut seen: BTreeSet<&Sigil> = self.graph.witnesses().iter().collect();
        let mut chars = graph_char_count(&self.graph);
        for witness in witnesses {
            check_shape(witness)?;
            if !seen.insert(witness.sigil()) {
                return Err(invalid(witness, "sigil already merged into this graph"));
            }
            check_limits(witness, chars, &self.config)?;
            chars += witness.char_count();
        }
        Ok(())
    }

    /// Merge several witnesses in order.
    ///
    /// Every witness is validated, and the size limits applied to the whole
    /// collation, before the first one is merged.
    pub fn collate<'w, I>(&mut self, witnesses: I) -> Result<Vec<Alignment>, CollationError>
    where
        I: IntoIterator<Item = &'w Witness>,
    {
        let witnesses: Vec<&Witness> = witnesses.into_iter().collect();
        self.check(witnesses.iter().copied())?;

        witnesses
            .into_iter()
            .map(|witness| merge_checked(&mut self.graph, witness, &self.config))
            .collect()
    }

    pub fn graph(&self) -> &VariantGraph {
        &self.graph
    }

    pub fn into_graph(self) -> VariantGraph {
        self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Token;

    fn sigil(s: &str) -> Sigil {
        Sigil::new(s).unwrap()
    }

    fn witness(s: &str, text: &str) -> Witness {
        Witness::from_text(sigil(s), text)
    }

    #[test]
    fn first_witness_builds_a_chain() {
        let mut graph = VariantGraph::new();
        let alignment = merge(&mut graph, &witness("A", "a b c"), &CollationConfig::default()).unwrap();
        assert!(alignment.matches.is_empty());
        assert_eq!(alignment.additions().count(), 1);
        assert_eq!(graph.vertex_count(), 3);
        assert_eq!(graph.edge_count(), 4);
        assert_eq!(graph.witness_path(&sigil("A")).len(), 3);
    }

    #[test]
    fn empty_witness_rejected() {
        let mut graph = VariantGraph::new();
        let result = merge(&mut graph, &witness("A", "   "), &CollationConfig::default());
        assert!(matches!(result, Err(CollationError::InvalidWitness { .. })));
        assert!(graph.witnesses().is_empty());
    }

    #[test]
    fn duplicate_sigil_rejected() {
        let mut graph = VariantGraph::new();
        let config = CollationConfig::default();
        merge(&mut graph, &witness("A", "a b"), &config).unwrap();
        let before = graph.fingerprint();

        let result = merge(&mut graph, &witness("A", "a c"), &config);
        assert!(matches!(result, Err(CollationError::InvalidWitness { .. })));
        assert_eq!(graph.fingerprint(), before);
    }

    #[test]
    fn malformed_positions_rejected() {
        let a = sigil("A");
        let tokens = vec![
            Token::new(a.clone(), 0, "a", "a"),
            Token::new(a.clone(), 2, "b", "b"),
        ];
        let result = merge(
            &mut VariantGraph::new(),
            &Witness::new(a, tokens),
            &CollationConfig::default(),
        );
        match result {
            Err(CollationError::InvalidWitness { reason, .. }) => {
                assert!(reason.contains("position 2"))
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn foreign_token_rejected() {
        let tokens = vec![Token::new(sigil("B"), 0, "a", "a")];
        let result = merge(
            &mut VariantGraph::new(),
            &Witness::new(sigil("A"), tokens),
            &CollationConfig::default(),
        );
        assert!(matches!(result, Err(CollationError::InvalidWitness { .. })));
    }

    #[test]
    fn token_limit_enforced() {
        let config = CollationConfig {
            max_witness_tokens: 2,
            ..Default::default()
        };
        let mut graph = VariantGraph::new();
        let result = merge(&mut graph, &witness("A", "a b c"), &config);
        assert_eq!(
            result.unwrap_err(),
            CollationError::OversizeInput {
                sigil: sigil("A"),
                what: "witness token",
                limit: 2,
                actual: 3,
            }
        );
        assert_eq!(graph.vertex_count(), 0);
    }

    #[test]
    fn collation_size_checked_before_any_merge() {
        let config = CollationConfig {
            max_collation_size: 10,
            ..Default::default()
        };
        let mut collator = Collator::new(config);
        let a = witness("A", "abc def");
        let b = witness("B", "ghi jkl");

        let result = collator.collate([&a, &b]);
        assert!(matches!(
            result,
            Err(CollationError::OversizeInput { what: "collation size", actual: 12, .. })
        ));
        assert!(collator.graph().witnesses().is_empty());
    }

    #[test]
    fn collate_rejects_repeated_sigil() {
        let mut collator = Collator::new(CollationConfig::default());
        let a = witness("A", "x");
        let again = witness("A", "y");
        assert!(collator.collate([&a, &again]).is_err());
        assert_eq!(collator.graph().vertex_count(), 0);
    }

    #[test]
    fn near_match_reported() {
        let mut collator = Collator::new(CollationConfig::default());
        let alignments = collator
            .collate([&witness("A", "near matching yeah"), &witness("B", "nar matching")])
            .unwrap();

        let second = &alignments[1];
        assert_eq!(second.matches.len(), 2);
        assert_eq!(second.near_matches().count(), 1);
        assert!(second.matches.iter().all(|m| m.folded));
        assert_eq!(second.omissions().count(), 1);
    }

    #[test]
    fn swap_records_transposition_between_two_vertices() {
        let mut collator = Collator::new(CollationConfig::default());
        let alignments = collator
            .collate([&witness("A", "a b"), &witness("B", "b a")])
            .unwrap();

        let graph = collator.graph();
        assert_eq!(graph.transpositions().len(), 1);
        assert_eq!(graph.transpositions()[0].vertices().len(), 2);
        assert_eq!(alignments[1].transpositions().count(), 1);
        assert!(graph.is_acyclic());
    }

    #[test]
    fn matched_tokens_share_vertices() {
        let mut collator = Collator::new(CollationConfig::default());
        collator
            .collate([&witness("A", "no transposition"), &witness("B", "no transposition")])
            .unwrap();

        let graph = collator.graph();
        assert_eq!(graph.vertex_count(), 2);
        for (_, vertex) in graph.vertices().skip(2) {
            assert_eq!(vertex.tokens().len(), 2);
        }
        assert!(graph.transpositions().is_empty());
    }

    #[test]
    fn error_messages() {
        let err = CollationError::OversizeInput {
            sigil: sigil("A"),
            what: "witness token",
            limit: 2,
            actual: 3,
        };
        assert_eq!(err.to_string(), "witness 'A' exceeds the witness token limit: 3 > 2");
    }
}
