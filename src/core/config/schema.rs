//! core::config::schema
//!
//! Configuration file schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$COLLATIO_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/collatio/config.toml`
//! 3. `~/.collatio/config.toml` (canonical write location)
//!
//! # Project Config
//!
//! Located at `collatio.toml` in the working directory.
//!
//! Both scopes share one schema; project values override global ones field
//! by field.
//!
//! # Validation
//!
//! Config values are validated after parsing so that a bad file fails the
//! run before any witness is read.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// A configuration file (global or project scope).
///
/// # Example
///
/// ```toml
/// [matching]
/// near_threshold = 2
/// near_window = 10
///
/// [transpositions]
/// limit = 8
///
/// [limits]
/// max_witness_tokens = 50000
/// max_collation_size = 0
/// max_parallel_collations = 4
/// timeout_secs = 120
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Token matching settings
    pub matching: Option<MatchingConfig>,

    /// Transposition detection settings
    pub transpositions: Option<TranspositionConfig>,

    /// Input size and concurrency limits
    pub limits: Option<LimitsConfig>,
}

impl ConfigFile {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(limits) = &self.limits {
            limits.validate()?;
        }
        Ok(())
    }

    /// Overlay `other` on top of `self`, field by field.
    pub fn overlay(&self, other: &ConfigFile) -> ConfigFile {
        ConfigFile {
            matching: merge_section(&self.matching, &other.matching, |a, b| MatchingConfig {
                near_threshold: b.near_threshold.or(a.near_threshold),
                near_window: b.near_window.or(a.near_window),
            }),
            transpositions: merge_section(&self.transpositions, &other.transpositions, |a, b| {
                TranspositionConfig {
                    limit: b.limit.or(a.limit),
                }
            }),
            limits: merge_section(&self.limits, &other.limits, |a, b| LimitsConfig {
                max_witness_tokens: b.max_witness_tokens.or(a.max_witness_tokens),
                max_collation_size: b.max_collation_size.or(a.max_collation_size),
                max_parallel_collations: b.max_parallel_collations.or(a.max_parallel_collations),
                timeout_secs: b.timeout_secs.or(a.timeout_secs),
            }),
        }
    }
}

fn merge_section<T: Clone>(
    base: &Option<T>,
    over: &Option<T>,
    merge: impl Fn(&T, &T) -> T,
) -> Option<T> {
    match (base, over) {
        (Some(a), Some(b)) => Some(merge(a, b)),
        (None, Some(b)) => Some(b.clone()),
        (Some(a), None) => Some(a.clone()),
        (None, None) => None,
    }
}

/// Token matching settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MatchingConfig {
    /// Maximum edit distance for a near match (0 disables near matching)
    pub near_threshold: Option<usize>,

    /// Graph positions searched on either side of a token for near matches
    pub near_window: Option<usize>,
}

/// Transposition detection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TranspositionConfig {
    /// Maximum distance, in graph tokens, of a confirmed transposition
    pub limit: Option<usize>,
}

/// Input size and concurrency limits.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum tokens per witness (0 = unlimited)
    pub max_witness_tokens: Option<usize>,

    /// Maximum characters across all witnesses of one collation (0 = unlimited)
    pub max_collation_size: Option<usize>,

    /// Collations run at the same time by `batch`
    pub max_parallel_collations: Option<usize>,

    /// Per-collation timeout in seconds
    pub timeout_secs: Option<u64>,
}

impl LimitsConfig {
    /// Validate the limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_parallel_collations == Some(0) {
            return Err(ConfigError::InvalidValue(
                "max_parallel_collations must be at least 1".to_string(),
            ));
        }
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ConfigFile::default();
        assert!(config.matching.is_none());
        assert!(config.transpositions.is_none());
        assert!(config.limits.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_parallelism_rejected() {
        let config = ConfigFile {
            limits: Some(LimitsConfig {
                max_parallel_collations: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_timeout_rejected() {
        let limits = LimitsConfig {
            timeout_secs: Some(0),
            ..Default::default()
        };
        assert!(limits.validate().is_err());
    }

    #[test]
    fn roundtrip() {
        let config = ConfigFile {
            matching: Some(MatchingConfig {
                near_threshold: Some(1),
                near_window: Some(4),
            }),
            transpositions: Some(TranspositionConfig { limit: Some(12) }),
            limits: Some(LimitsConfig {
                max_witness_tokens: Some(1000),
                max_collation_size: Some(0),
                max_parallel_collations: Some(3),
                timeout_secs: Some(30),
            }),
        };

        let toml = toml::to_string_pretty(&config).unwrap();
        let parsed: ConfigFile = toml::from_str(&toml).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn reject_unknown_fields() {
        let toml = r#"
            [matching]
            near_threshold = 1
            unknown_field = true
        "#;

        let result: Result<ConfigFile, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn overlay_prefers_later_scope() {
        let global = ConfigFile {
            matching: Some(MatchingConfig {
                near_threshold: Some(1),
                near_window: Some(4),
            }),
            ..Default::default()
        };
        let project = ConfigFile {
            matching: Some(MatchingConfig {
                near_threshold: Some(3),
                near_window: None,
            }),
            transpositions: Some(TranspositionConfig { limit: Some(2) }),
            ..Default::default()
        };

        let merged = global.overlay(&project);
        let matching = merged.matching.unwrap();
        assert_eq!(matching.near_threshold, Some(3));
        assert_eq!(matching.near_window, Some(4));
        assert_eq!(merged.transpositions.unwrap().limit, Some(2));
        assert!(merged.limits.is_none());
    }
}
