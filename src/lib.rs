//! collatio - Variant-graph collation of textual witnesses
//!
//! collatio aligns several versions ("witnesses") of the same text. Each
//! witness is tokenized and merged into a directed acyclic variant graph in
//! which tokens that agree share a vertex. Short moves of text are recorded
//! as transpositions instead of being split into an omission and an
//! addition.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Runs whole collations, alone or as a bounded batch
//! - [`align`] - Matching, search and classification for one witness merge
//! - [`core`] - Domain types, the variant graph, tables and configuration
//! - [`ui`] - Terminal output
//!
//! # Correctness Invariants
//!
//! collatio maintains the following invariants:
//!
//! 1. The graph is acyclic after every merge
//! 2. Every witness's path visits its tokens in their original order
//! 3. A rejected witness leaves the graph unchanged
//! 4. The same witnesses in the same order produce the same graph

pub mod align;
pub mod cli;
pub mod core;
pub mod engine;
pub mod ui;
