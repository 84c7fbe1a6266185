//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Resolves configuration (files, then flags)
//! 2. Reads the witnesses and calls the engine
//! 3. Formats and displays output
//!
//! # Async Commands
//!
//! `batch` runs collations on a tokio runtime it creates itself; the
//! dispatch function stays synchronous.

mod batch;
mod collate;
mod completion;
mod config_cmd;

// Re-export command functions for testing and direct invocation
pub use batch::batch;
pub use collate::{collate, report, CollationReport};
pub use completion::completion;
pub use config_cmd::{get as config_get, list as config_list, set as config_set};

use crate::cli::args::{CollationOverrides, Command, ConfigAction};
use crate::core::config::{CollationConfig, Config};
use crate::engine::Context;
use anyhow::{Context as _, Result};

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Collate {
            files,
            sigils,
            format,
            overrides,
        } => collate::collate(ctx, &files, &sigils, format, &overrides),
        Command::Batch {
            dirs,
            max_parallel,
            timeout,
            overrides,
        } => batch::batch(ctx, &dirs, max_parallel, timeout, &overrides),
        Command::Config { action } => match action {
            ConfigAction::Get { key } => config_cmd::get(ctx, &key),
            ConfigAction::Set { key, value } => config_cmd::set(ctx, &key, &value),
            ConfigAction::List => config_cmd::list(ctx),
        },
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Load the configuration for the working directory and apply flag overrides.
pub(crate) fn resolve_config(
    ctx: &Context,
    overrides: &CollationOverrides,
) -> Result<CollationConfig> {
    let cwd = ctx
        .working_dir()
        .context("Failed to determine working directory")?;
    let config = Config::load(Some(&cwd)).context("Failed to load config")?;
    if let Some(path) = config.project_config_loaded_from() {
        tracing::debug!(path = %path.display(), "project config loaded");
    }

    let mut collation = config.collation();
    if let Some(threshold) = overrides.near_threshold {
        collation.near_match_threshold = threshold;
    }
    if let Some(limit) = overrides.transposition_limit {
        collation.transposition_limit = limit;
    }
    if let Some(limit) = overrides.max_witness_tokens {
        collation.max_witness_tokens = limit;
    }
    if let Some(limit) = overrides.max_collation_size {
        collation.max_collation_size = limit;
    }
    Ok(collation)
}
