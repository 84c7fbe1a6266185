//! config command - Get, set, or list configuration values

use crate::core::config::schema::{LimitsConfig, MatchingConfig, TranspositionConfig};
use crate::core::config::{CollationConfig, Config, ConfigFile};
use crate::engine::Context;
use anyhow::{bail, Context as _, Result};

/// Keys understood by `get` and `set`, in listing order.
pub const KEYS: &[&str] = &[
    "matching.near_threshold",
    "matching.near_window",
    "transpositions.limit",
    "limits.max_witness_tokens",
    "limits.max_collation_size",
    "limits.max_parallel_collations",
    "limits.timeout_secs",
];

fn load(ctx: &Context) -> Result<(std::path::PathBuf, Config)> {
    let cwd = ctx
        .working_dir()
        .context("Failed to determine working directory")?;
    let config = Config::load(Some(&cwd)).context("Failed to load config")?;
    Ok((cwd, config))
}

/// Effective value of `key`, `None` when it has no value.
fn value_of(collation: &CollationConfig, key: &str) -> Result<Option<String>> {
    let value = match key {
        "matching.near_threshold" => collation.near_match_threshold.to_string(),
        "matching.near_window" => collation.near_match_window.to_string(),
        "transpositions.limit" => collation.transposition_limit.to_string(),
        "limits.max_witness_tokens" => collation.max_witness_tokens.to_string(),
        "limits.max_collation_size" => collation.max_collation_size.to_string(),
        "limits.max_parallel_collations" => collation.max_parallel_collations.to_string(),
        "limits.timeout_secs" => match collation.timeout {
            Some(timeout) => timeout.as_secs().to_string(),
            None => return Ok(None),
        },
        _ => bail!("Unknown configuration key: {}", key),
    };
    Ok(Some(value))
}

/// Get a configuration value.
pub fn get(ctx: &Context, key: &str) -> Result<()> {
    let (_, config) = load(ctx)?;
    // Key exists but has no value - exit silently
    if let Some(value) = value_of(&config.collation(), key)? {
        println!("{}", value);
    }
    Ok(())
}

/// Store `value` under `key` in `file`.
fn apply(file: &mut ConfigFile, key: &str, value: &str) -> Result<()> {
    if !KEYS.contains(&key) {
        bail!("Unknown configuration key: {}", key);
    }
    let number: u64 = value
        .parse()
        .with_context(|| format!("Invalid value for {}: expected a non-negative integer", key))?;
    let size = usize::try_from(number)
        .with_context(|| format!("Value for {} is too large", key))?;

    match key {
        "matching.near_threshold" | "matching.near_window" => {
            let matching = file.matching.get_or_insert_with(MatchingConfig::default);
            if key == "matching.near_threshold" {
                matching.near_threshold = Some(size);
            } else {
                matching.near_window = Some(size);
            }
        }
        "transpositions.limit" => {
            file.transpositions
                .get_or_insert_with(TranspositionConfig::default)
                .limit = Some(size);
        }
        _ => {
            let limits = file.limits.get_or_insert_with(LimitsConfig::default);
            match key {
                "limits.max_witness_tokens" => limits.max_witness_tokens = Some(size),
                "limits.max_collation_size" => limits.max_collation_size = Some(size),
                "limits.max_parallel_collations" => limits.max_parallel_collations = Some(size),
                _ => limits.timeout_secs = Some(number),
            }
        }
    }
    Ok(())
}

/// Set a configuration value in the project config.
pub fn set(ctx: &Context, key: &str, value: &str) -> Result<()> {
    let (cwd, config) = load(ctx)?;
    let mut project = config.project.unwrap_or_default();
    apply(&mut project, key, value)?;

    Config::write_project(&cwd, &project).context("Failed to write config")?;

    if !ctx.quiet {
        println!("Set {} = {}", key, value);
    }

    Ok(())
}

/// List all configuration values.
pub fn list(ctx: &Context) -> Result<()> {
    let (_, config) = load(ctx)?;
    let collation = config.collation();

    println!("# Effective Configuration");
    if let Some(path) = config.global_config_loaded_from() {
        println!("# global:  {}", path.display());
    }
    if let Some(path) = config.project_config_loaded_from() {
        println!("# project: {}", path.display());
    }

    for key in KEYS {
        let value = value_of(&collation, key)?.unwrap_or_else(|| "(not set)".to_string());
        println!("{} = {}", key, value);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_key_has_a_value() {
        let collation = CollationConfig {
            timeout: Some(std::time::Duration::from_secs(30)),
            ..Default::default()
        };
        for key in KEYS {
            assert!(value_of(&collation, key).unwrap().is_some(), "{}", key);
        }
        assert!(value_of(&collation, "matching.unknown").is_err());
    }

    #[test]
    fn apply_sets_nested_values() {
        let mut file = ConfigFile::default();
        apply(&mut file, "transpositions.limit", "12").unwrap();
        apply(&mut file, "matching.near_window", "4").unwrap();
        apply(&mut file, "limits.timeout_secs", "60").unwrap();

        assert_eq!(file.transpositions.unwrap().limit, Some(12));
        assert_eq!(file.matching.unwrap().near_window, Some(4));
        assert_eq!(file.limits.unwrap().timeout_secs, Some(60));
    }

    #[test]
    fn apply_rejects_bad_input() {
        let mut file = ConfigFile::default();
        assert!(apply(&mut file, "trunk.branch", "1").is_err());
        assert!(apply(&mut file, "transpositions.limit", "-1").is_err());
        assert!(apply(&mut file, "transpositions.limit", "many").is_err());
        assert_eq!(file, ConfigFile::default());
    }
}
