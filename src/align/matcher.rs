//! align::matcher
//!
//! Candidate match generation between a witness and the graph.
//!
//! # Phases
//!
//! 1. **Exact**: every graph column carrying the witness token's key is a
//!    candidate of cost 0. A key that is unique on both sides yields a
//!    *unique* cluster, which the search places without branching.
//!    Repeating keys keep all their candidates and the search decides.
//! 2. **Near**: tokens without an exact candidate are compared, by bounded
//!    edit distance, with the columns in a window around their projected
//!    graph position. Each near candidate costs its distance.
//!
//! A token with no candidate at all is an addition; that is the default
//! outcome, not an error.

use serde::Serialize;

use super::distance::bounded_edit_distance;
use super::repeats::RepeatIndex;
use crate::core::config::CollationConfig;
use crate::core::graph::VertexId;
use crate::core::types::Witness;

/// One graph position as seen by the matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// The vertex at this position.
    pub vertex: VertexId,
    /// Distinct keys of the vertex's tokens.
    pub keys: Vec<String>,
}

/// How a candidate was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Exact,
    Near,
}

/// A possible pairing of a witness token with a graph position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    /// Position in the graph's vertex order.
    pub graph_position: u32,
    /// 0 for exact matches, the edit distance for near matches.
    pub cost: u32,
    pub kind: MatchKind,
}

/// A candidate accepted by the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Match {
    pub witness_position: u32,
    pub graph_position: u32,
    pub cost: u32,
    pub kind: MatchKind,
}

/// All candidates of one witness token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub witness_position: u32,
    /// Candidates in ascending graph position.
    pub candidates: Vec<Candidate>,
    /// Exactly one exact candidate whose key occurs once in the graph and
    /// once in the witness.
    pub unique: bool,
}

impl Cluster {
    /// Whether any candidate is an exact match.
    pub fn has_exact(&self) -> bool {
        self.candidates.iter().any(|c| c.kind == MatchKind::Exact)
    }
}

/// Produces candidate clusters, one per witness token, in witness order.
#[derive(Debug, Clone, Copy)]
pub struct Matcher<'a> {
    config: &'a CollationConfig,
}

impl<'a> Matcher<'a> {
    /// Create a matcher for the given configuration.
    pub fn new(config: &'a CollationConfig) -> Self {
        Self { config }
    }

    /// Build the repeat index over graph columns.
    pub fn index_columns(columns: &[Column]) -> RepeatIndex {
        RepeatIndex::build(columns.iter().enumerate().flat_map(|(position, column)| {
            column
                .keys
                .iter()
                .map(move |key| (position as u32, key.as_str()))
        }))
    }

    /// Compute candidate clusters for `witness` against `columns`.
    pub fn candidates(
        &self,
        columns: &[Column],
        witness: &Witness,
        graph_index: &RepeatIndex,
        witness_index: &RepeatIndex,
    ) -> Vec<Cluster> {
        let mut clusters: Vec<Cluster> = witness
            .tokens()
            .iter()
            .map(|token| {
                let candidates: Vec<Candidate> = graph_index
                    .occurrences(token.key())
                    .iter()
                    .map(|&graph_position| Candidate {
                        graph_position,
                        cost: 0,
                        kind: MatchKind::Exact,
                    })
                    .collect();
                let unique = candidates.len() == 1
                    && !graph_index.is_repeating(token.key())
                    && !witness_index.is_repeating(token.key());
                Cluster {
                    witness_position: token.position(),
                    candidates,
                    unique,
                }
            })
            .collect();

        if self.config.near_match_threshold > 0 && !columns.is_empty() {
            for idx in 0..clusters.len() {
                if !clusters[idx].candidates.is_empty() {
                    continue;
                }
                let center = Self::projected_position(&clusters, idx, columns.len(), witness.len());
                let key = witness.tokens()[idx].key();
                clusters[idx].candidates = self.near_candidates(columns, key, center);
            }
        }

        clusters
    }

    /// Where witness token `idx` would fall in the graph: one step past the
    /// closest preceding unique match per intervening token, or the
    /// proportional position when there is none.
    fn projected_position(
        clusters: &[Cluster],
        idx: usize,
        graph_len: usize,
        witness_len: usize,
    ) -> usize {
        let anchor = clusters[..idx]
            .iter()
            .enumerate()
            .rev()
            .find(|(_, c)| c.unique);

        match anchor {
            Some((anchor_idx, cluster)) => {
                cluster.candidates[0].graph_position as usize + (idx - anchor_idx)
            }
            None => idx * graph_len / witness_len.max(1),
        }
    }

    fn near_candidates(&self, columns: &[Column], key: &str, center: usize) -> Vec<Candidate> {
        let window = self.config.near_match_window;
        let low = center.saturating_sub(window);
        let high = center.saturating_add(window).min(columns.len() - 1);
        if low > high {
            return Vec::new();
        }

        let key_len = key.chars().count();
        (low..=high)
            .filter_map(|position| {
                columns[position]
                    .keys
                    .iter()
                    .filter_map(|other| {
                        let allowance = self.allowance(key_len, other.chars().count());
                        if allowance == 0 {
                            return None;
                        }
                        bounded_edit_distance(key, other, allowance).filter(|d| *d > 0)
                    })
                    .min()
                    .map(|distance| Candidate {
                        graph_position: position as u32,
                        cost: distance as u32,
                        kind: MatchKind::Near,
                    })
            })
            .collect()
    }

    /// Edits tolerated between two tokens: one per three characters of the
    /// shorter one, capped by the configured threshold.
    fn allowance(&self, a_len: usize, b_len: usize) -> usize {
        (a_len.min(b_len) / 3).min(self.config.near_match_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Sigil;

    fn columns(text: &str) -> Vec<Column> {
        text.split_whitespace()
            .enumerate()
            .map(|(idx, key)| Column {
                vertex: VertexId::from_index(idx + 2),
                keys: vec![key.to_string()],
            })
            .collect()
    }

    fn clusters(graph: &str, witness: &str, config: &CollationConfig) -> Vec<Cluster> {
        let columns = columns(graph);
        let witness = Witness::from_text(Sigil::new("B").unwrap(), witness);
        let graph_index = Matcher::index_columns(&columns);
        let witness_index = RepeatIndex::for_witness(&witness);
        Matcher::new(config).candidates(&columns, &witness, &graph_index, &witness_index)
    }

    #[test]
    fn exact_unique_candidates() {
        let config = CollationConfig::default();
        let result = clusters("a b c", "c a", &config);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].candidates[0].graph_position, 2);
        assert!(result[0].unique);
        assert!(result[1].unique);
    }

    #[test]
    fn repeating_key_in_graph_is_ambiguous() {
        let config = CollationConfig::default();
        let result = clusters("the cat the dog", "the dog", &config);
        assert!(!result[0].unique);
        let positions: Vec<u32> = result[0].candidates.iter().map(|c| c.graph_position).collect();
        assert_eq!(positions, vec![0, 2]);
        assert!(result[1].unique);
    }

    #[test]
    fn repeating_key_in_witness_is_ambiguous() {
        let config = CollationConfig::default();
        let result = clusters("a b", "a a", &config);
        assert!(!result[0].unique);
        assert!(!result[1].unique);
        assert_eq!(result[1].candidates.len(), 1);
    }

    #[test]
    fn near_match_found() {
        let config = CollationConfig::default();
        let result = clusters("near matching yeah", "nar matching", &config);
        assert_eq!(result[0].candidates.len(), 1);
        assert_eq!(result[0].candidates[0].kind, MatchKind::Near);
        assert_eq!(result[0].candidates[0].cost, 1);
        assert_eq!(result[0].candidates[0].graph_position, 0);
        assert_eq!(result[1].candidates[0].kind, MatchKind::Exact);
    }

    #[test]
    fn short_tokens_never_near_match() {
        let config = CollationConfig::default();
        let result = clusters("a b", "c a", &config);
        assert!(result[0].candidates.is_empty());
    }

    #[test]
    fn near_matching_disabled() {
        let config = CollationConfig {
            near_match_threshold: 0,
            ..Default::default()
        };
        let result = clusters("near matching", "nar matching", &config);
        assert!(result[0].candidates.is_empty());
    }

    #[test]
    fn near_match_outside_window_ignored() {
        let config = CollationConfig {
            near_match_window: 1,
            ..Default::default()
        };
        let result = clusters("start x y z w v colour", "start colur", &config);
        // "colur" projects to position 1; "colour" sits at 6.
        assert!(result[1].candidates.is_empty());

        let wide = CollationConfig::default();
        let result = clusters("start x y z w v colour", "start colur", &wide);
        assert_eq!(result[1].candidates.len(), 1);
        assert_eq!(result[1].candidates[0].graph_position, 6);
        assert_eq!(result[1].candidates[0].kind, MatchKind::Near);
    }

    #[test]
    fn allowance_scales_with_length() {
        let config = CollationConfig::default();
        let matcher = Matcher::new(&config);
        assert_eq!(matcher.allowance(2, 5), 0);
        assert_eq!(matcher.allowance(3, 4), 1);
        assert_eq!(matcher.allowance(9, 9), 2);
    }

    #[test]
    fn empty_graph_gives_empty_clusters() {
        let config = CollationConfig::default();
        let result = clusters("", "a b", &config);
        assert!(result.iter().all(|c| c.candidates.is_empty()));
    }
}
