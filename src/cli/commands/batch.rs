//! batch command - Run several collations concurrently

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context as _, Result};

use super::resolve_config;
use crate::cli::args::CollationOverrides;
use crate::engine::{job_from_dir, run_batch, Context};
use crate::ui::output::{self, Verbosity};

/// Collate each directory as its own job.
pub fn batch(
    ctx: &Context,
    dirs: &[PathBuf],
    max_parallel: Option<usize>,
    timeout: Option<u64>,
    overrides: &CollationOverrides,
) -> Result<()> {
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);
    let mut config = resolve_config(ctx, overrides)?;
    if let Some(limit) = max_parallel {
        config.max_parallel_collations = limit;
    }
    if let Some(secs) = timeout {
        if secs == 0 {
            bail!("--timeout must be at least 1 second");
        }
        config.timeout = Some(Duration::from_secs(secs));
    }
    config.validate().context("Invalid batch settings")?;

    let jobs = dirs
        .iter()
        .map(|dir| job_from_dir(dir))
        .collect::<Result<Vec<_>, _>>()?;
    output::debug(
        format!(
            "running {} collations, {} at a time",
            jobs.len(),
            config.max_parallel_collations
        ),
        verbosity,
    );

    let rt = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let outcomes = rt.block_on(run_batch(jobs, &config));

    let mut failed = Vec::new();
    for outcome in &outcomes {
        match &outcome.result {
            Ok(result) => output::success(
                format!(
                    "ok      {}  {} witnesses, {} columns, {} transpositions ({:?})",
                    outcome.name,
                    result.graph.witnesses().len(),
                    result.table().columns(),
                    result.graph.transpositions().len(),
                    result.elapsed
                ),
                verbosity,
            ),
            Err(err) => {
                failed.push(outcome.name.as_str());
                output::error(format!("{}: {}", outcome.name, err));
            }
        }
    }

    if !failed.is_empty() {
        bail!(
            "{} of {} collations failed:\n{}",
            failed.len(),
            outcomes.len(),
            output::format_list(&failed, "  - ")
        );
    }
    output::print(format!("{} collations finished", outcomes.len()), verbosity);
    Ok(())
}
