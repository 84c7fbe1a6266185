//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! All terminal output of the CLI goes through this module so that the
//! quiet flag is honored in one place. Log events go through `tracing`
//! instead and are never printed from here.

pub mod output;
