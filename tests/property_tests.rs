//! Property-based tests for collation invariants.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated witnesses. A small vocabulary keeps repeated tokens,
//! near matches and moves frequent.

use std::collections::BTreeSet;

use proptest::prelude::*;

use collatio::align::Collator;
use collatio::core::config::CollationConfig;
use collatio::core::table::AlignmentTable;
use collatio::core::types::{Sigil, Token, TokenRef, Witness};

/// Strategy for one word from a small vocabulary with near-miss spellings.
fn word() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "the", "cat", "black", "blak", "white", "sat", "mat", "and", ",", "so",
    ])
}

/// Strategy for the text of one witness.
fn witness_text() -> impl Strategy<Value = String> {
    prop::collection::vec(word(), 1..8).prop_map(|words| words.join(" "))
}

/// Strategy for two to four witnesses with sigils W1..Wn.
fn witnesses() -> impl Strategy<Value = Vec<Witness>> {
    prop::collection::vec(witness_text(), 2..5).prop_map(|texts| {
        texts
            .iter()
            .enumerate()
            .map(|(idx, text)| {
                Witness::from_text(Sigil::new(format!("W{}", idx + 1)).unwrap(), text)
            })
            .collect()
    })
}

/// Strategy for a witness of distinct one-character words in any order.
///
/// Every shared word is then unique on both sides, and one-character words
/// get no near-match allowance.
fn distinct_letters() -> impl Strategy<Value = String> {
    prop::sample::subsequence(vec!["a", "b", "c", "d", "e", "f", "g", ","], 1..=7)
        .prop_shuffle()
        .prop_map(|words| words.join(" "))
}

fn transposed_tokens(collator: &Collator) -> BTreeSet<BTreeSet<TokenRef>> {
    let graph = collator.graph();
    graph.transpositions().iter().map(|t| t.tokens(graph)).collect()
}

fn collate(witnesses: &[Witness]) -> Collator {
    let mut collator = Collator::new(CollationConfig::default());
    collator.collate(witnesses).unwrap();
    collator
}

proptest! {
    /// The same witnesses in the same order give the same graph.
    #[test]
    fn collation_is_deterministic(w in witnesses()) {
        let first = collate(&w);
        let second = collate(&w);
        prop_assert_eq!(first.graph().fingerprint(), second.graph().fingerprint());
    }

    /// Merge order does not change which tokens are transposed.
    #[test]
    fn transpositions_ignore_merge_order(first in distinct_letters(), second in distinct_letters()) {
        let a = Witness::from_text(Sigil::new("A").unwrap(), &first);
        let b = Witness::from_text(Sigil::new("B").unwrap(), &second);

        let forward = collate(&[a.clone(), b.clone()]);
        let backward = collate(&[b, a]);
        prop_assert_eq!(transposed_tokens(&forward), transposed_tokens(&backward));
    }

    /// The graph never has a cycle.
    #[test]
    fn graph_stays_acyclic(w in witnesses()) {
        let collator = collate(&w);
        prop_assert!(collator.graph().is_acyclic());
    }

    /// Flattening a table row gives back the witness.
    #[test]
    fn table_rows_reproduce_witnesses(w in witnesses()) {
        let collator = collate(&w);
        let table = AlignmentTable::from_graph(collator.graph());
        for witness in &w {
            let flattened: Vec<&Token> = table.witness_tokens(witness.sigil());
            let original: Vec<&Token> = witness.tokens().iter().collect();
            prop_assert_eq!(flattened, original);
        }
    }

    /// Every token of every witness is held by exactly one vertex.
    #[test]
    fn every_token_placed_once(w in witnesses()) {
        let collator = collate(&w);
        let graph = collator.graph();

        let mut placed: Vec<TokenRef> = graph
            .vertices()
            .flat_map(|(_, v)| v.tokens().values().map(Token::reference))
            .collect();
        let total = placed.len();
        placed.sort();
        placed.dedup();
        prop_assert_eq!(placed.len(), total);

        let expected: usize = w.iter().map(Witness::len).sum();
        prop_assert_eq!(total, expected);
    }

    /// Merging never shrinks the graph.
    #[test]
    fn vertex_count_never_decreases(w in witnesses()) {
        let mut collator = Collator::new(CollationConfig::default());
        let mut previous = collator.graph().vertex_count();
        for witness in &w {
            collator.merge(witness).unwrap();
            let now = collator.graph().vertex_count();
            prop_assert!(now >= previous);
            previous = now;
        }
    }

    /// A witness collated with itself only shares vertices.
    #[test]
    fn self_collation_has_no_variation(text in witness_text()) {
        let a = Witness::from_text(Sigil::new("A").unwrap(), &text);
        let b = Witness::from_text(Sigil::new("B").unwrap(), &text);
        let mut collator = Collator::new(CollationConfig::default());
        let alignments = collator.collate([&a, &b]).unwrap();

        prop_assert!(alignments[1].differences.is_empty());
        prop_assert!(collator.graph().transpositions().is_empty());
        prop_assert_eq!(collator.graph().vertex_count(), a.len());
    }

    /// Transposed tokens always belong to at least two witnesses.
    #[test]
    fn transpositions_link_witnesses(w in witnesses()) {
        let collator = collate(&w);
        let graph = collator.graph();
        for transposition in graph.transpositions() {
            let sigils: BTreeSet<Sigil> = transposition
                .tokens(graph)
                .into_iter()
                .map(|t| t.witness)
                .collect();
            prop_assert!(sigils.len() >= 2);
        }
    }
}
