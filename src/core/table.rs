//! core::table
//!
//! Alignment table: a row/column projection of a variant graph.
//!
//! One row per witness, one column per rank. A witness's cell in a column
//! holds its token from the vertex at that rank, or nothing when its path
//! skips the rank. The table is derived on demand and never stored.
//!
//! # Example
//!
//! ```
//! use collatio::align::Collator;
//! use collatio::core::config::CollationConfig;
//! use collatio::core::table::AlignmentTable;
//! use collatio::core::types::{Sigil, Witness};
//!
//! let a = Witness::from_text(Sigil::new("A").unwrap(), "the black cat");
//! let b = Witness::from_text(Sigil::new("B").unwrap(), "the cat");
//!
//! let mut collator = Collator::new(CollationConfig::default());
//! collator.collate([&a, &b]).unwrap();
//!
//! let table = AlignmentTable::from_graph(collator.graph());
//! assert_eq!(table.row_keys(a.sigil()).unwrap(), "|the|black|cat|");
//! assert_eq!(table.row_keys(b.sigil()).unwrap(), "|the| |cat|");
//! ```

use serde::Serialize;

use super::graph::VariantGraph;
use super::types::{Sigil, Token};

/// One witness's cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    pub sigil: Sigil,
    pub cells: Vec<Option<Token>>,
}

impl Row {
    /// Tokens present in the row, in column order.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.cells.iter().flatten()
    }

    fn render(&self, text: impl Fn(&Token) -> &str) -> String {
        let mut out = String::from("|");
        for cell in &self.cells {
            out.push_str(cell.as_ref().map_or(" ", &text));
            out.push('|');
        }
        out
    }
}

/// Row/column view of a graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlignmentTable {
    columns: usize,
    rows: Vec<Row>,
}

impl AlignmentTable {
    /// Project `graph` into a table, rows in merge order.
    pub fn from_graph(graph: &VariantGraph) -> Self {
        let ranks = graph.ranks();
        let columns = ranks[graph.end().index()] - 1;

        let rows = graph
            .witnesses()
            .iter()
            .map(|sigil| {
                let mut cells = vec![None; columns];
                for vertex in graph.witness_path(sigil) {
                    cells[ranks[vertex.index()] - 1] = graph.vertex(vertex).token(sigil).cloned();
                }
                Row {
                    sigil: sigil.clone(),
                    cells,
                }
            })
            .collect();

        Self { columns, rows }
    }

    /// Number of columns.
    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, sigil: &Sigil) -> Option<&Row> {
        self.rows.iter().find(|row| &row.sigil == sigil)
    }

    /// The row of `sigil` rendered with normalized keys, e.g. `|the| |cat|`.
    pub fn row_keys(&self, sigil: &Sigil) -> Option<String> {
        self.row(sigil).map(|row| row.render(Token::key))
    }

    /// The row of `sigil` rendered with display forms.
    pub fn row_display(&self, sigil: &Sigil) -> Option<String> {
        self.row(sigil).map(|row| row.render(Token::display))
    }

    /// The row of `sigil` flattened back to its token sequence.
    pub fn witness_tokens(&self, sigil: &Sigil) -> Vec<&Token> {
        self.row(sigil)
            .map(|row| row.tokens().collect())
            .unwrap_or_default()
    }

    /// Whether the witnesses disagree in `column`: a witness is absent or
    /// the keys differ.
    pub fn is_variant(&self, column: usize) -> bool {
        let mut keys = self
            .rows
            .iter()
            .map(|row| row.cells.get(column).and_then(Option::as_ref).map(Token::key));
        match keys.next() {
            Some(first) => keys.any(|key| key != first),
            None => false,
        }
    }

    /// Number of columns where the witnesses disagree.
    pub fn variant_columns(&self) -> usize {
        (0..self.columns).filter(|c| self.is_variant(*c)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::Collator;
    use crate::core::config::CollationConfig;
    use crate::core::types::Witness;

    fn collate(texts: &[(&str, &str)]) -> (Vec<Witness>, AlignmentTable) {
        let witnesses: Vec<Witness> = texts
            .iter()
            .map(|(s, t)| Witness::from_text(Sigil::new(*s).unwrap(), t))
            .collect();
        let mut collator = Collator::new(CollationConfig::default());
        collator.collate(&witnesses).unwrap();
        let table = AlignmentTable::from_graph(collator.graph());
        (witnesses, table)
    }

    #[test]
    fn empty_graph_has_empty_table() {
        let table = AlignmentTable::from_graph(&VariantGraph::new());
        assert_eq!(table.columns(), 0);
        assert!(table.rows().is_empty());
        assert!(table.row_keys(&Sigil::new("A").unwrap()).is_none());
    }

    #[test]
    fn single_witness_fills_every_column() {
        let (witnesses, table) = collate(&[("A", "a b c")]);
        assert_eq!(table.columns(), 3);
        assert_eq!(table.row_keys(witnesses[0].sigil()).unwrap(), "|a|b|c|");
        assert_eq!(table.variant_columns(), 0);
    }

    #[test]
    fn display_forms_kept() {
        let (witnesses, table) = collate(&[("A", "The Cat"), ("B", "the cat")]);
        assert_eq!(table.row_display(witnesses[0].sigil()).unwrap(), "|The|Cat|");
        assert_eq!(table.row_keys(witnesses[0].sigil()).unwrap(), "|the|cat|");
        assert_eq!(table.variant_columns(), 0);
    }

    #[test]
    fn replacement_shares_a_column() {
        let (witnesses, table) = collate(&[("A", "the black cat"), ("B", "the white cat")]);
        assert_eq!(table.columns(), 3);
        assert_eq!(table.row_keys(witnesses[1].sigil()).unwrap(), "|the|white|cat|");
        assert!(table.is_variant(1));
        assert!(!table.is_variant(0));
    }

    #[test]
    fn flattened_rows_reproduce_witnesses() {
        let (witnesses, table) = collate(&[
            ("A", "the white and black cat"),
            ("B", "The black cat"),
            ("C", "the black and white cat"),
        ]);
        for witness in &witnesses {
            let flattened: Vec<&Token> = table.witness_tokens(witness.sigil());
            let original: Vec<&Token> = witness.tokens().iter().collect();
            assert_eq!(flattened, original);
        }
    }
}
