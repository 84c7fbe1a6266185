//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! The collation engine never reads configuration itself: every run takes a
//! [`CollationConfig`] of plain values. This module resolves that value
//! from the configuration files for callers that want file-based defaults.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Project config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$COLLATIO_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/collatio/config.toml`
//! 3. `~/.collatio/config.toml` (canonical write location)
//!
//! # Example
//!
//! ```no_run
//! use collatio::core::config::Config;
//! use std::path::Path;
//!
//! let config = Config::load(Some(Path::new("/path/to/edition"))).unwrap();
//! let collation = config.collation();
//! println!("Transposition limit: {}", collation.transposition_limit);
//! ```

pub mod schema;

pub use schema::ConfigFile;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// File name of the project config.
pub const PROJECT_CONFIG_FILE: &str = "collatio.toml";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Plain configuration values for one collation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollationConfig {
    /// Maximum edit distance accepted for a near match. 0 disables near
    /// matching.
    pub near_match_threshold: usize,
    /// Graph positions searched on either side of a token's projected
    /// position during near matching.
    pub near_match_window: usize,
    /// Maximum distance, in graph tokens, of a confirmed transposition.
    pub transposition_limit: usize,
    /// Maximum tokens per witness (0 = unlimited).
    pub max_witness_tokens: usize,
    /// Maximum characters across all witnesses of one collation
    /// (0 = unlimited).
    pub max_collation_size: usize,
    /// Collations run at the same time by [`crate::engine::run_batch`].
    pub max_parallel_collations: usize,
    /// Wall-clock limit for one collation job.
    pub timeout: Option<Duration>,
}

impl CollationConfig {
    /// Default near-match edit distance.
    pub const DEFAULT_NEAR_MATCH_THRESHOLD: usize = 2;
    /// Default near-match window.
    pub const DEFAULT_NEAR_MATCH_WINDOW: usize = 10;
    /// Default transposition distance limit.
    pub const DEFAULT_TRANSPOSITION_LIMIT: usize = 8;
    /// Default number of parallel collations.
    pub const DEFAULT_MAX_PARALLEL_COLLATIONS: usize = 2;

    /// Validate the values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for a zero parallelism limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_parallel_collations == 0 {
            return Err(ConfigError::InvalidValue(
                "max_parallel_collations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Token limit, if one is set.
    pub fn witness_token_limit(&self) -> Option<usize> {
        (self.max_witness_tokens > 0).then_some(self.max_witness_tokens)
    }

    /// Character limit, if one is set.
    pub fn collation_size_limit(&self) -> Option<usize> {
        (self.max_collation_size > 0).then_some(self.max_collation_size)
    }
}

impl Default for CollationConfig {
    fn default() -> Self {
        Self {
            near_match_threshold: Self::DEFAULT_NEAR_MATCH_THRESHOLD,
            near_match_window: Self::DEFAULT_NEAR_MATCH_WINDOW,
            transposition_limit: Self::DEFAULT_TRANSPOSITION_LIMIT,
            max_witness_tokens: 0,
            max_collation_size: 0,
            max_parallel_collations: Self::DEFAULT_MAX_PARALLEL_COLLATIONS,
            timeout: None,
        }
    }
}

/// Merged configuration from all sources.
///
/// Accessors apply precedence rules automatically: project config
/// overrides global config.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: ConfigFile,
    /// Project configuration (if found)
    pub project: Option<ConfigFile>,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
    /// Path to the project config file (if loaded)
    project_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `project_dir` is provided, also loads `collatio.toml` from it.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or hold
    /// invalid values. Missing config files are not an error.
    pub fn load(project_dir: Option<&Path>) -> Result<Config, ConfigError> {
        let (global, global_path) = Self::load_global()?;

        let (project, project_path) = match project_dir {
            Some(dir) => {
                let path = Self::project_config_path(dir);
                if path.exists() {
                    (Some(Self::read_config(&path)?), Some(path))
                } else {
                    (None, None)
                }
            }
            None => (None, None),
        };

        global.validate()?;
        if let Some(ref p) = project {
            p.validate()?;
        }

        Ok(Config {
            global,
            project,
            global_path,
            project_path,
        })
    }

    fn load_global() -> Result<(ConfigFile, Option<PathBuf>), ConfigError> {
        // 1. $COLLATIO_CONFIG
        if let Ok(path) = std::env::var("COLLATIO_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        // 2. $XDG_CONFIG_HOME/collatio/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("collatio/config.toml");
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        // 3. ~/.collatio/config.toml
        if let Some(home) = dirs::home_dir() {
            let path = home.join(".collatio/config.toml");
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        Ok((ConfigFile::default(), None))
    }

    /// Read and parse a config file.
    fn read_config(path: &Path) -> Result<ConfigFile, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get the canonical path for global config.
    ///
    /// Returns `~/.collatio/config.toml`.
    pub fn global_config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".collatio/config.toml"))
    }

    /// Get the path of the project config in `dir`.
    pub fn project_config_path(dir: &Path) -> PathBuf {
        dir.join(PROJECT_CONFIG_FILE)
    }

    /// Write project config atomically.
    pub fn write_project(dir: &Path, config: &ConfigFile) -> Result<PathBuf, ConfigError> {
        config.validate()?;
        let path = Self::project_config_path(dir);
        Self::write_config_atomic(&path, config)?;
        Ok(path)
    }

    /// Write a config file atomically (temp file, then rename).
    fn write_config_atomic<T: Serialize>(path: &Path, config: &T) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let mut file = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        file.write_all(contents.as_bytes())
            .map_err(|e| ConfigError::WriteError {
                path: temp_path.clone(),
                source: e,
            })?;

        file.sync_all().map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Global and project files overlaid.
    pub fn effective(&self) -> ConfigFile {
        match &self.project {
            Some(project) => self.global.overlay(project),
            None => self.global.clone(),
        }
    }

    /// Resolve the values for one collation run.
    pub fn collation(&self) -> CollationConfig {
        let effective = self.effective();
        let defaults = CollationConfig::default();
        let matching = effective.matching.unwrap_or_default();
        let transpositions = effective.transpositions.unwrap_or_default();
        let limits = effective.limits.unwrap_or_default();

        CollationConfig {
            near_match_threshold: matching
                .near_threshold
                .unwrap_or(defaults.near_match_threshold),
            near_match_window: matching.near_window.unwrap_or(defaults.near_match_window),
            transposition_limit: transpositions.limit.unwrap_or(defaults.transposition_limit),
            max_witness_tokens: limits
                .max_witness_tokens
                .unwrap_or(defaults.max_witness_tokens),
            max_collation_size: limits
                .max_collation_size
                .unwrap_or(defaults.max_collation_size),
            max_parallel_collations: limits
                .max_parallel_collations
                .unwrap_or(defaults.max_parallel_collations),
            timeout: limits.timeout_secs.map(Duration::from_secs),
        }
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded project config file.
    pub fn project_config_loaded_from(&self) -> Option<&Path> {
        self.project_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema::{LimitsConfig, MatchingConfig, TranspositionConfig};
    use tempfile::TempDir;

    #[test]
    fn defaults_without_files() {
        let config = Config::default();
        let collation = config.collation();
        assert_eq!(collation, CollationConfig::default());
        assert_eq!(collation.near_match_threshold, 2);
        assert_eq!(collation.max_parallel_collations, 2);
        assert!(collation.witness_token_limit().is_none());
        assert!(collation.collation_size_limit().is_none());
    }

    #[test]
    fn load_project_config() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(PROJECT_CONFIG_FILE),
            r#"
            [transpositions]
            limit = 3

            [limits]
            max_witness_tokens = 100
            timeout_secs = 5
            "#,
        )
        .unwrap();

        let config = Config::load(Some(temp.path())).unwrap();
        let collation = config.collation();

        assert_eq!(collation.transposition_limit, 3);
        assert_eq!(collation.witness_token_limit(), Some(100));
        assert_eq!(collation.timeout, Some(Duration::from_secs(5)));
        assert!(config.project_config_loaded_from().is_some());
    }

    #[test]
    fn invalid_project_value_rejected() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(PROJECT_CONFIG_FILE),
            "[limits]\nmax_parallel_collations = 0\n",
        )
        .unwrap();

        assert!(Config::load(Some(temp.path())).is_err());
    }

    #[test]
    fn unknown_fields_rejected() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(PROJECT_CONFIG_FILE),
            "near_threshold = 1\n",
        )
        .unwrap();

        let result = Config::load(Some(temp.path()));
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn write_project_config_atomic() {
        let temp = TempDir::new().unwrap();
        let file = ConfigFile {
            matching: Some(MatchingConfig {
                near_threshold: Some(1),
                ..Default::default()
            }),
            ..Default::default()
        };

        let path = Config::write_project(temp.path(), &file).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("toml.tmp").exists());

        let loaded = Config::load(Some(temp.path())).unwrap();
        assert_eq!(loaded.collation().near_match_threshold, 1);
    }

    #[test]
    fn precedence_project_overrides_global() {
        let config = Config {
            global: ConfigFile {
                transpositions: Some(TranspositionConfig { limit: Some(20) }),
                limits: Some(LimitsConfig {
                    max_parallel_collations: Some(8),
                    ..Default::default()
                }),
                ..Default::default()
            },
            project: Some(ConfigFile {
                transpositions: Some(TranspositionConfig { limit: Some(4) }),
                ..Default::default()
            }),
            global_path: None,
            project_path: None,
        };

        let collation = config.collation();
        assert_eq!(collation.transposition_limit, 4);
        assert_eq!(collation.max_parallel_collations, 8);
    }

    #[test]
    fn zero_parallelism_invalid() {
        let config = CollationConfig {
            max_parallel_collations: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
