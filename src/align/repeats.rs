//! align::repeats
//!
//! Repeat detection over a key sequence using a suffix array.
//!
//! # Construction
//!
//! Keys are interned to integer symbols (in lexicographic key order) and a
//! suffix array is built by prefix doubling, followed by Kasai's LCP pass.
//! Suffixes that start with the same symbol are contiguous in the suffix
//! array and joined by LCP ≥ 1, which yields every key's occurrence list in
//! O(n log² n) instead of pairwise comparison.
//!
//! The index is read-only; the engine builds one for the witness and one for
//! the graph at each merge step and drops both afterwards.

use std::collections::BTreeMap;

use crate::core::types::Witness;

/// Occurrence index over a sequence of normalized keys.
#[derive(Debug, Clone, Default)]
pub struct RepeatIndex {
    symbol_of: BTreeMap<String, usize>,
    occurrences: Vec<Vec<u32>>,
    longest_repeat: usize,
}

impl RepeatIndex {
    /// Build an index from `(owner position, key)` entries in sequence
    /// order.
    ///
    /// Several entries may share an owner position (a graph vertex holding
    /// differently keyed tokens); occurrences are reported per owner.
    ///
    /// # Example
    ///
    /// ```
    /// use collatio::align::repeats::RepeatIndex;
    ///
    /// let index = RepeatIndex::build([(0, "the"), (1, "cat"), (2, "and"), (3, "the"), (4, "dog")]);
    /// assert!(index.is_repeating("the"));
    /// assert!(!index.is_repeating("cat"));
    /// assert_eq!(index.occurrences("the"), &[0, 3]);
    /// assert!(index.occurrences("bird").is_empty());
    /// ```
    pub fn build<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (u32, &'a str)>,
    {
        let entries: Vec<(u32, &str)> = entries.into_iter().collect();

        let mut symbol_of: BTreeMap<String, usize> = entries
            .iter()
            .map(|(_, key)| ((*key).to_string(), 0))
            .collect();
        for (symbol, slot) in symbol_of.values_mut().enumerate() {
            *slot = symbol;
        }

        let symbols: Vec<usize> = entries.iter().map(|(_, key)| symbol_of[*key]).collect();
        let suffix_array = suffix_array(&symbols);
        let lcp = lcp_array(&symbols, &suffix_array);

        let mut occurrences = vec![Vec::new(); symbol_of.len()];
        let mut group = 0;
        for (rank, &suffix) in suffix_array.iter().enumerate() {
            if rank == 0 || lcp[rank] == 0 {
                group = symbols[suffix];
            }
            occurrences[group].push(entries[suffix].0);
        }
        for owners in &mut occurrences {
            owners.sort_unstable();
            owners.dedup();
        }

        Self {
            symbol_of,
            occurrences,
            longest_repeat: lcp.iter().copied().max().unwrap_or(0),
        }
    }

    /// Index the tokens of a witness by position.
    pub fn for_witness(witness: &Witness) -> Self {
        Self::build(witness.tokens().iter().map(|t| (t.position(), t.key())))
    }

    /// Whether `key` occurs at more than one position.
    pub fn is_repeating(&self, key: &str) -> bool {
        self.occurrences(key).len() > 1
    }

    /// Positions at which `key` occurs, ascending.
    pub fn occurrences(&self, key: &str) -> &[u32] {
        self.symbol_of
            .get(key)
            .map(|symbol| self.occurrences[*symbol].as_slice())
            .unwrap_or(&[])
    }

    /// Keys occurring at more than one position, in key order.
    pub fn repeating_keys(&self) -> impl Iterator<Item = &str> {
        self.symbol_of
            .iter()
            .filter(|(_, symbol)| self.occurrences[**symbol].len() > 1)
            .map(|(key, _)| key.as_str())
    }

    /// Length, in keys, of the longest phrase occurring more than once.
    pub fn longest_repeat(&self) -> usize {
        self.longest_repeat
    }
}

/// Suffix array by prefix doubling.
fn suffix_array(symbols: &[usize]) -> Vec<usize> {
    let n = symbols.len();
    let mut sa: Vec<usize> = (0..n).collect();
    if n == 0 {
        return sa;
    }

    let mut rank: Vec<usize> = symbols.to_vec();
    let mut next = vec![0usize; n];
    let mut width = 1;

    loop {
        let sort_key = |i: usize, rank: &[usize]| {
            let second = if i + width < n { rank[i + width] + 1 } else { 0 };
            (rank[i], second)
        };
        sa.sort_by_key(|&i| sort_key(i, &rank));

        next[sa[0]] = 0;
        for w in 1..n {
            let step = usize::from(sort_key(sa[w - 1], &rank) < sort_key(sa[w], &rank));
            next[sa[w]] = next[sa[w - 1]] + step;
        }
        std::mem::swap(&mut rank, &mut next);

        if rank[sa[n - 1]] == n - 1 || width >= n {
            break;
        }
        width *= 2;
    }

    sa
}

/// Kasai LCP: `lcp[r]` is the common prefix of suffixes `sa[r - 1]` and
/// `sa[r]`; `lcp[0]` is 0.
fn lcp_array(symbols: &[usize], sa: &[usize]) -> Vec<usize> {
    let n = symbols.len();
    let mut rank_of = vec![0usize; n];
    for (r, &suffix) in sa.iter().enumerate() {
        rank_of[suffix] = r;
    }

    let mut lcp = vec![0usize; n];
    let mut h = 0usize;
    for i in 0..n {
        if rank_of[i] == 0 {
            h = 0;
            continue;
        }
        let j = sa[rank_of[i] - 1];
        while i + h < n && j + h < n && symbols[i + h] == symbols[j + h] {
            h += 1;
        }
        lcp[rank_of[i]] = h;
        h = h.saturating_sub(1);
    }
    lcp
}
