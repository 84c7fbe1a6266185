//! collate command - Collate witness files into a variant graph

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context as _, Result};
use serde::Serialize;

use super::resolve_config;
use crate::align::Alignment;
use crate::cli::args::{CollationOverrides, OutputFormat};
use crate::core::table::AlignmentTable;
use crate::core::types::{Fingerprint, Sigil, TokenRef};
use crate::engine::{job_from_files, run_collation, CollationOutput, Context};
use crate::ui::output::{self, Verbosity};

/// Machine-readable result of one collation.
#[derive(Debug, Serialize)]
pub struct CollationReport<'a> {
    pub name: &'a str,
    pub witnesses: &'a [Sigil],
    pub fingerprint: Fingerprint,
    pub table: AlignmentTable,
    pub alignments: &'a [Alignment],
    /// Tokens linked by each recorded transposition.
    pub transpositions: Vec<BTreeSet<TokenRef>>,
}

/// Build the JSON report of a finished collation.
pub fn report(output: &CollationOutput) -> CollationReport<'_> {
    CollationReport {
        name: &output.name,
        witnesses: output.graph.witnesses(),
        fingerprint: output.graph.fingerprint(),
        table: output.table(),
        alignments: &output.alignments,
        transpositions: output
            .graph
            .transpositions()
            .iter()
            .map(|t| t.tokens(&output.graph))
            .collect(),
    }
}

/// Collate witness files.
pub fn collate(
    ctx: &Context,
    files: &[PathBuf],
    sigils: &[String],
    format: OutputFormat,
    overrides: &CollationOverrides,
) -> Result<()> {
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);
    let config = resolve_config(ctx, overrides)?;

    let sigils = sigils
        .iter()
        .map(|s| Sigil::new(s.as_str()).with_context(|| format!("Invalid sigil '{}'", s)))
        .collect::<Result<Vec<_>>>()?;

    let job = job_from_files("collate", files, &sigils)?;
    output::debug(
        format!("collating {} witnesses", job.witnesses.len()),
        verbosity,
    );
    let result = run_collation(&job, &config)?;
    for alignment in result.alignments.iter().skip(1) {
        if alignment.matches.is_empty() {
            output::warn(
                format!(
                    "witness '{}' shares no tokens with the witnesses before it",
                    alignment.witness
                ),
                verbosity,
            );
        }
    }

    match format {
        OutputFormat::Table => {
            println!("{}", output::format_table(&result.table()));
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report(&result))
                .context("Failed to serialize report")?;
            println!("{}", json);
        }
        OutputFormat::Summary => print_summary(&result),
    }

    output::debug(format!("finished in {:?}", result.elapsed), verbosity);
    Ok(())
}

fn print_summary(result: &CollationOutput) {
    let table = result.table();
    println!("Witnesses:       {}", result.graph.witnesses().len());
    println!("Columns:         {}", table.columns());
    println!("Variant columns: {}", table.variant_columns());
    println!("Transpositions:  {}", result.graph.transpositions().len());
    println!("Fingerprint:     {}", result.graph.fingerprint());

    for alignment in result.alignments.iter().skip(1) {
        println!(
            "{}: {} matched ({} near), {} added, {} omitted, {} replaced, {} transposed",
            alignment.witness,
            alignment.matches.len(),
            alignment.near_matches().count(),
            alignment.additions().count(),
            alignment.omissions().count(),
            alignment.replacements().count(),
            alignment.transpositions().count(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::CollationConfig;
    use crate::core::types::Witness;
    use crate::engine::CollationJob;

    #[test]
    fn report_lists_transposed_tokens() {
        let job = CollationJob {
            name: "swap".to_string(),
            witnesses: vec![
                Witness::from_text(Sigil::new("A").unwrap(), "a b"),
                Witness::from_text(Sigil::new("B").unwrap(), "b a"),
            ],
        };
        let output = run_collation(&job, &CollationConfig::default()).unwrap();
        let report = report(&output);

        assert_eq!(report.transpositions.len(), 1);
        assert_eq!(report.transpositions[0].len(), 2);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["name"], "swap");
        assert_eq!(json["witnesses"][1], "B");
        assert!(json["fingerprint"].is_string());
        assert_eq!(json["alignments"].as_array().unwrap().len(), 2);
    }
}
