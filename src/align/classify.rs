//! align::classify
//!
//! Gap and transposition classification of an accepted match set.
//!
//! # Backbone
//!
//! The accepted matches are read in witness order and in graph order. The
//! longest chain increasing in both is the *backbone*: those matches keep
//! their order and will share graph vertices. Ties are broken by, in turn:
//!
//! 1. smaller total displacement `|graph position - witness position|`
//! 2. lexicographically smaller key sequence
//! 3. smaller graph positions
//!
//! None of these depend on which side is the graph, so collating two
//! witnesses in either order selects the same tokens.
//!
//! # Transpositions
//!
//! Matches off the backbone are grouped into phrases, runs consecutive in
//! both orders. A phrase's distance is the number of graph tokens between
//! the slot the witness puts it in (right after its preceding backbone
//! match) and where the graph has it. Phrases within `transposition_limit`
//! are confirmed; longer moves become an omission plus an addition.
//!
//! # Gaps
//!
//! Between consecutive backbone matches (and the sentinels) the unmatched
//! material is an addition, an omission or a replacement depending on which
//! sides are non-empty. Tokens of confirmed transpositions never appear in
//! a gap.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::Serialize;

use super::matcher::{Column, Match};
use crate::core::graph::VertexId;
use crate::core::types::Witness;

/// The material of one difference on each side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Span {
    /// Graph vertices involved, in graph order.
    pub graph: Vec<VertexId>,
    /// Witness token positions involved, ascending.
    pub witness: Vec<u32>,
}

/// A classified difference between the witness and the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Difference {
    /// Witness tokens with no graph counterpart.
    Addition(Span),
    /// Graph tokens the witness lacks.
    Omission(Span),
    /// Both sides have unmatched material at the same place.
    Replacement(Span),
    /// Matched tokens in a different order, `distance` graph tokens away.
    Transposition { span: Span, distance: usize },
}

impl Difference {
    /// The span of this difference.
    pub fn span(&self) -> &Span {
        match self {
            Difference::Addition(span)
            | Difference::Omission(span)
            | Difference::Replacement(span)
            | Difference::Transposition { span, .. } => span,
        }
    }

    /// Lowercase name of the category.
    pub fn kind(&self) -> &'static str {
        match self {
            Difference::Addition(_) => "addition",
            Difference::Omission(_) => "omission",
            Difference::Replacement(_) => "replacement",
            Difference::Transposition { .. } => "transposition",
        }
    }
}

/// A run of off-backbone matches, consecutive in witness and graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phrase {
    pub matches: Vec<Match>,
    /// Graph tokens between the phrase and its slot in witness order.
    pub distance: usize,
}

impl Phrase {
    fn graph_positions(&self) -> impl Iterator<Item = u32> + '_ {
        self.matches.iter().map(|m| m.graph_position)
    }

    fn witness_positions(&self) -> impl Iterator<Item = u32> + '_ {
        self.matches.iter().map(|m| m.witness_position)
    }
}

/// Result of classifying one witness against the graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    /// Order-preserving matches, in witness order.
    pub backbone: Vec<Match>,
    /// Confirmed transpositions, in witness order.
    pub transposed: Vec<Phrase>,
    /// Every difference, in witness order.
    pub differences: Vec<Difference>,
}

/// Classifies accepted matches of one witness.
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'a> {
    columns: &'a [Column],
    witness: &'a Witness,
    transposition_limit: usize,
}

impl<'a> Classifier<'a> {
    pub fn new(columns: &'a [Column], witness: &'a Witness, transposition_limit: usize) -> Self {
        Self {
            columns,
            witness,
            transposition_limit,
        }
    }

    /// Classify `matches` (any order; each witness and graph position at
    /// most once).
    pub fn classify(&self, matches: &[Match]) -> Classification {
        let mut matches = matches.to_vec();
        matches.sort_by_key(|m| m.witness_position);

        let on_backbone: BTreeSet<usize> = self.backbone(&matches).into_iter().collect();
        let backbone: Vec<Match> = on_backbone.iter().map(|&idx| matches[idx]).collect();

        // Phrases beyond the limit stay in the gaps on both sides.
        let transposed: Vec<Phrase> = self
            .phrases(&matches, &on_backbone, &backbone)
            .into_iter()
            .filter(|phrase| phrase.distance <= self.transposition_limit)
            .collect();

        let differences = self.differences(&backbone, &transposed);

        Classification {
            backbone,
            transposed,
            differences,
        }
    }

    /// Indices (into `matches`, sorted by witness position) of the backbone.
    fn backbone(&self, matches: &[Match]) -> Vec<usize> {
        let n = matches.len();
        if n == 0 {
            return Vec::new();
        }

        let displacement =
            |m: &Match| (i64::from(m.graph_position) - i64::from(m.witness_position)).unsigned_abs();

        let mut length = vec![1usize; n];
        let mut total = vec![0u64; n];
        let mut previous: Vec<Option<usize>> = vec![None; n];

        for j in 0..n {
            total[j] = displacement(&matches[j]);
            for i in 0..j {
                if matches[i].graph_position >= matches[j].graph_position {
                    continue;
                }
                let candidate = (length[i] + 1, total[i] + displacement(&matches[j]));
                let current = previous[j];
                let better = match current {
                    _ if candidate.0 != length[j] => candidate.0 > length[j],
                    _ if candidate.1 != total[j] => candidate.1 < total[j],
                    Some(current) => self.compare_chains(matches, &previous, i, current).is_lt(),
                    None => true,
                };
                if better {
                    length[j] = candidate.0;
                    total[j] = candidate.1;
                    previous[j] = Some(i);
                }
            }
        }

        let mut best = 0;
        for j in 1..n {
            let ordering = length[j]
                .cmp(&length[best])
                .reverse()
                .then(total[j].cmp(&total[best]))
                .then_with(|| self.compare_chains(matches, &previous, j, best));
            if ordering.is_lt() {
                best = j;
            }
        }

        chain(&previous, best)
    }

    /// Compare the chains ending at `a` and `b`: keys first, then graph
    /// positions.
    fn compare_chains(
        &self,
        matches: &[Match],
        previous: &[Option<usize>],
        a: usize,
        b: usize,
    ) -> Ordering {
        let a = chain(previous, a);
        let b = chain(previous, b);
        let keys = |c: &[usize]| -> Vec<&str> {
            c.iter()
                .map(|&idx| self.witness.tokens()[matches[idx].witness_position as usize].key())
                .collect()
        };
        let positions =
            |c: &[usize]| -> Vec<u32> { c.iter().map(|&idx| matches[idx].graph_position).collect() };

        keys(&a)
            .cmp(&keys(&b))
            .then_with(|| positions(&a).cmp(&positions(&b)))
    }

    fn phrases(
        &self,
        matches: &[Match],
        on_backbone: &BTreeSet<usize>,
        backbone: &[Match],
    ) -> Vec<Phrase> {
        let mut runs: Vec<Vec<Match>> = Vec::new();
        for (idx, m) in matches.iter().enumerate() {
            if on_backbone.contains(&idx) {
                continue;
            }
            let extends = runs.last().and_then(|run| run.last()).is_some_and(|last| {
                last.witness_position + 1 == m.witness_position
                    && last.graph_position + 1 == m.graph_position
            });
            if extends {
                if let Some(run) = runs.last_mut() {
                    run.push(*m);
                }
            } else {
                runs.push(vec![*m]);
            }
        }

        runs.into_iter()
            .map(|run| {
                let first = run[0];
                let anchor = backbone
                    .iter()
                    .rev()
                    .find(|b| b.witness_position < first.witness_position)
                    .map_or(-1, |b| i64::from(b.graph_position));
                let position = i64::from(first.graph_position);
                let distance = if position > anchor {
                    position - anchor - 1
                } else {
                    anchor - position
                };
                Phrase {
                    matches: run,
                    distance: distance as usize,
                }
            })
            .collect()
    }

    fn differences(&self, backbone: &[Match], transposed: &[Phrase]) -> Vec<Difference> {
        let moved_graph: BTreeSet<u32> = transposed.iter().flat_map(Phrase::graph_positions).collect();
        let moved_witness: BTreeSet<u32> =
            transposed.iter().flat_map(Phrase::witness_positions).collect();

        let mut bounds: Vec<(i64, i64)> = vec![(-1, -1)];
        bounds.extend(
            backbone
                .iter()
                .map(|m| (i64::from(m.witness_position), i64::from(m.graph_position))),
        );
        bounds.push((self.witness.len() as i64, self.columns.len() as i64));

        let mut ordered: Vec<(i64, Difference)> = Vec::new();
        for pair in bounds.windows(2) {
            let (left, right) = (pair[0], pair[1]);
            let witness: Vec<u32> = (left.0 + 1..right.0)
                .map(|w| w as u32)
                .filter(|w| !moved_witness.contains(w))
                .collect();
            let graph: Vec<VertexId> = (left.1 + 1..right.1)
                .map(|g| g as u32)
                .filter(|g| !moved_graph.contains(g))
                .map(|g| self.columns[g as usize].vertex)
                .collect();

            let span = Span { graph, witness };
            let difference = match (span.graph.is_empty(), span.witness.is_empty()) {
                (true, true) => continue,
                (true, false) => Difference::Addition(span),
                (false, true) => Difference::Omission(span),
                (false, false) => Difference::Replacement(span),
            };
            ordered.push((left.0 + 1, difference));
        }

        for phrase in transposed {
            let span = Span {
                graph: phrase
                    .graph_positions()
                    .map(|g| self.columns[g as usize].vertex)
                    .collect(),
                witness: phrase.witness_positions().collect(),
            };
            ordered.push((
                i64::from(phrase.matches[0].witness_position),
                Difference::Transposition {
                    span,
                    distance: phrase.distance,
                },
            ));
        }

        ordered.sort_by_key(|(anchor, _)| *anchor);
        ordered.into_iter().map(|(_, d)| d).collect()
    }
}

/// Indices of the chain ending at `end`, first to last.
fn chain(previous: &[Option<usize>], end: usize) -> Vec<usize> {
    let mut indices = vec![end];
    let mut current = end;
    while let Some(prev) = previous[current] {
        indices.push(prev);
        current = prev;
    }
    indices.reverse();
    indices
}
