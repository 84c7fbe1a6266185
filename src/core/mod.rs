//! core
//!
//! Core domain types and the variant graph.
//!
//! # Modules
//!
//! - [`types`] - Strong types: Sigil, Token, Witness, Fingerprint
//! - [`tokenize`] - Splitting text into tokens and normalizing keys
//! - [`graph`] - The variant graph and its transpositions
//! - [`table`] - Alignment table projection of a graph
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - The graph is only mutated by the aligner
//! - All derived views are deterministic

pub mod config;
pub mod graph;
pub mod table;
pub mod tokenize;
pub mod types;
