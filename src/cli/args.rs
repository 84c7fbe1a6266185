//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// collatio - Variant-graph collation of textual witnesses
#[derive(Parser, Debug)]
#[command(name = "collatio")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if collatio was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Collation settings that override the config files for one run.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct CollationOverrides {
    /// Maximum edit distance of a near match (0 disables near matching)
    #[arg(long, value_name = "N")]
    pub near_threshold: Option<usize>,

    /// Maximum distance, in graph tokens, of a confirmed transposition
    #[arg(long, value_name = "N")]
    pub transposition_limit: Option<usize>,

    /// Maximum tokens per witness (0 = unlimited)
    #[arg(long, value_name = "N")]
    pub max_witness_tokens: Option<usize>,

    /// Maximum characters across all witnesses of a collation (0 = unlimited)
    #[arg(long, value_name = "N")]
    pub max_collation_size: Option<usize>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Collate witness files into a variant graph
    #[command(
        name = "collate",
        long_about = "Collate witness files into a variant graph.\n\n\
            Each file holds one witness. Witnesses are merged in the order given: \
            the first one lays out the graph, every later one is aligned against \
            everything merged before it. Matching tokens share a column; moved \
            tokens are reported as transpositions when they moved a short distance \
            and as an omission plus an addition otherwise.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Collate two witnesses, sigils taken from the file names
    collatio collate A.txt B.txt

    # Choose sigils explicitly
    collatio collate paris.txt london.txt --sigil P --sigil L

    # Machine-readable report
    collatio collate A.txt B.txt C.txt --format json

    # Strict matching: no near matches, only adjacent transpositions
    collatio collate A.txt B.txt --near-threshold 0 --transposition-limit 1"
    )]
    Collate {
        /// Witness files, in merge order
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,

        /// Sigil for each file, in the same order (default: file stem)
        #[arg(long = "sigil", value_name = "SIGIL")]
        sigils: Vec<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        #[command(flatten)]
        overrides: CollationOverrides,
    },

    /// Run several collations concurrently
    #[command(
        name = "batch",
        long_about = "Run several independent collations concurrently.\n\n\
            Each directory is one collation: its *.txt files are the witnesses, \
            merged in file name order. Collations run in parallel up to the \
            configured limit. A failing collation is reported and does not stop \
            the others; the command fails if any collation failed.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Collate every chapter directory
    collatio batch chapters/*

    # Four at a time, at most a minute each
    collatio batch chapters/* --max-parallel 4 --timeout 60"
    )]
    Batch {
        /// Collation directories
        #[arg(required = true, value_name = "DIR")]
        dirs: Vec<PathBuf>,

        /// Collations run at the same time
        #[arg(long, value_name = "N")]
        max_parallel: Option<usize>,

        /// Per-collation timeout in seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        #[command(flatten)]
        overrides: CollationOverrides,
    },

    /// Get, set, or list configuration values
    #[command(
        name = "config",
        long_about = "Read and write the project configuration.\n\n\
            Values are stored in collatio.toml in the working directory and override \
            the global configuration. `list` shows the effective values.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Show the effective configuration
    collatio config list

    # Allow longer transpositions for this edition
    collatio config set transpositions.limit 12

    # Read a single value
    collatio config get matching.near_threshold"
    )]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        long_about = "Generate shell completion scripts for tab-completion.\n\n\
            Outputs a completion script for the specified shell. Add the output \
            to your shell's configuration to enable tab-completion for collatio commands.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Bash (add to ~/.bashrc)
    collatio completion bash >> ~/.bashrc

    # Zsh (add to ~/.zshrc)
    collatio completion zsh >> ~/.zshrc

    # Fish
    collatio completion fish > ~/.config/fish/completions/collatio.fish

    # PowerShell
    collatio completion powershell >> $PROFILE"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Value to set
        value: String,
    },
    /// List all configuration values
    List,
}

/// Report formats of `collate`
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Alignment table, one row per witness
    #[default]
    Table,
    /// Full report as JSON
    Json,
    /// Counts only
    Summary,
}

/// Supported shells for completion
#[derive(ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn collate_flags() {
        let cli = Cli::try_parse_from([
            "collatio",
            "collate",
            "a.txt",
            "b.txt",
            "--sigil",
            "A",
            "--sigil",
            "B",
            "--format",
            "json",
            "--transposition-limit",
            "3",
        ])
        .unwrap();

        match cli.command {
            Command::Collate {
                files,
                sigils,
                format,
                overrides,
            } => {
                assert_eq!(files.len(), 2);
                assert_eq!(sigils, vec!["A", "B"]);
                assert_eq!(format, OutputFormat::Json);
                assert_eq!(overrides.transposition_limit, Some(3));
                assert_eq!(overrides.near_threshold, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn collate_requires_files() {
        assert!(Cli::try_parse_from(["collatio", "collate"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["collatio", "batch", "dir", "--debug", "-q"]).unwrap();
        assert!(cli.debug);
        assert!(cli.quiet);
    }
}
