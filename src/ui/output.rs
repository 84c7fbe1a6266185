//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Output is formatted consistently and respects the quiet flag.
//! When `--format json` is chosen, output is machine-readable JSON.

use std::fmt::Display;

use crate::core::table::AlignmentTable;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print a debug message (only in debug mode).
pub fn debug(message: impl Display, verbosity: Verbosity) {
    if verbosity == Verbosity::Debug {
        eprintln!("[debug] {}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Print a success message (respects quiet mode).
pub fn success(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Format a list of items.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", prefix, item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format an alignment table as a padded grid of display forms.
///
/// Empty cells render as `-`. Each row starts with the sigil.
pub fn format_table(table: &AlignmentTable) -> String {
    const GAP: &str = "-";

    let sigil_width = table
        .rows()
        .iter()
        .map(|row| row.sigil.as_str().chars().count())
        .max()
        .unwrap_or(0);

    let mut widths = vec![GAP.len(); table.columns()];
    for row in table.rows() {
        for (width, cell) in widths.iter_mut().zip(&row.cells) {
            if let Some(token) = cell {
                *width = (*width).max(token.display().chars().count());
            }
        }
    }

    table
        .rows()
        .iter()
        .map(|row| {
            let mut line = format!("{:<w$} |", row.sigil.as_str(), w = sigil_width);
            for (width, cell) in widths.iter().zip(&row.cells) {
                let text = cell.as_ref().map_or(GAP, |t| t.display());
                line.push_str(&format!(" {:<w$} |", text, w = *width));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::Collator;
    use crate::core::config::CollationConfig;
    use crate::core::types::{Sigil, Witness};

    #[test]
    fn verbosity_from_flags() {
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Debug);
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
    }

    #[test]
    fn list_prefixed() {
        assert_eq!(format_list(&["a", "b"], "  - "), "  - a\n  - b");
    }

    #[test]
    fn table_padded_with_gaps() {
        let a = Witness::from_text(Sigil::new("A").unwrap(), "the black cat");
        let bb = Witness::from_text(Sigil::new("BB").unwrap(), "the cat");
        let mut collator = Collator::new(CollationConfig::default());
        collator.collate([&a, &bb]).unwrap();

        let rendered = format_table(&AlignmentTable::from_graph(collator.graph()));
        assert_eq!(
            rendered,
            "A  | the | black | cat |\nBB | the | -     | cat |"
        );
    }
}
