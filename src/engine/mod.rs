//! engine
//!
//! Runs whole collations on behalf of the CLI.
//!
//! # Architecture
//!
//! A collation is a [`CollationJob`]: a name and an ordered list of
//! witnesses. [`run_collation`] merges the witnesses one after another into
//! a fresh graph; nothing is shared between jobs.
//!
//! [`batch::run_batch`] runs several jobs concurrently, each on a blocking
//! worker thread, with at most `max_parallel_collations` in flight. A job
//! that panics or times out is reported as failed; the others are
//! unaffected.
//!
//! # Timeouts
//!
//! The merge of one witness has no cancellation point, so a deadline is
//! checked between witnesses. The async side also stops waiting at the
//! deadline so the batch report is not held up by a long merge.
//!
//! Match search time grows quickly with witness length when a few words
//! repeat often; two 1,600-token witnesses over a 20-word vocabulary take
//! seconds. `max_witness_tokens` is the bound to set for untrusted input.

pub mod batch;
pub mod input;

pub use batch::{run_batch, BatchError, JobOutcome};
pub use input::{job_from_dir, job_from_files, InputError};

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::align::{Alignment, Collator};
use crate::core::config::CollationConfig;
use crate::core::graph::VariantGraph;
use crate::core::table::AlignmentTable;
use crate::core::types::Witness;

/// Execution context for commands.
///
/// Contains global settings derived from CLI flags that affect command behavior.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Working directory override.
    pub cwd: Option<PathBuf>,
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
}

impl Context {
    /// The directory commands operate in.
    pub fn working_dir(&self) -> std::io::Result<PathBuf> {
        match &self.cwd {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir(),
        }
    }
}

/// Witnesses to collate together, in merge order.
#[derive(Debug, Clone)]
pub struct CollationJob {
    pub name: String,
    pub witnesses: Vec<Witness>,
}

/// A finished collation.
#[derive(Debug, Clone)]
pub struct CollationOutput {
    pub name: String,
    pub graph: VariantGraph,
    /// One report per witness, in merge order.
    pub alignments: Vec<Alignment>,
    pub elapsed: Duration,
}

impl CollationOutput {
    /// Table view of the graph.
    pub fn table(&self) -> AlignmentTable {
        AlignmentTable::from_graph(&self.graph)
    }
}

/// Collate `job` without a deadline.
pub fn run_collation(
    job: &CollationJob,
    config: &CollationConfig,
) -> Result<CollationOutput, BatchError> {
    run_collation_until(job, config, None)
}

/// Collate `job`, giving up between witnesses once `deadline` has passed.
pub(crate) fn run_collation_until(
    job: &CollationJob,
    config: &CollationConfig,
    deadline: Option<Instant>,
) -> Result<CollationOutput, BatchError> {
    let started = Instant::now();
    let _span = tracing::info_span!("collation", job = %job.name).entered();
    tracing::debug!(witnesses = job.witnesses.len(), "collation started");

    let mut collator = Collator::new(config.clone());
    collator.check(&job.witnesses)?;

    let mut alignments = Vec::with_capacity(job.witnesses.len());
    for witness in &job.witnesses {
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                return Err(BatchError::TimedOut {
                    job: job.name.clone(),
                    after: started.elapsed(),
                });
            }
        }
        alignments.push(collator.merge(witness)?);
    }

    let graph = collator.into_graph();
    tracing::info!(
        vertices = graph.vertex_count(),
        transpositions = graph.transpositions().len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "collation finished"
    );

    Ok(CollationOutput {
        name: job.name.clone(),
        graph,
        alignments,
        elapsed: started.elapsed(),
    })
}
