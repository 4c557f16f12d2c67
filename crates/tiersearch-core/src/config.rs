//! `tiersearch` Configuration Module
//!
//! Provides configuration file support via `tiersearch.toml`, environment
//! variables, and runtime overrides.
//!
//! # Priority (highest to lowest)
//!
//! 1. Runtime overrides (API, CLI)
//! 2. Environment variables (`TIERSEARCH_*`, `__` between section and key)
//! 3. Configuration file (`tiersearch.toml`)
//! 4. Default values

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to parse configuration.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue {
        /// Configuration key that failed validation.
        key: String,
        /// Validation error message.
        message: String,
    },
}

/// When a leaf folds freshly written words into its autocomplete structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebuildMode {
    /// Rebuild before `add_document` returns; new words are searchable at once.
    #[default]
    Inline,
    /// Hand the rebuild to the background maintainer; `add_document`
    /// returns as soon as postings are updated.
    Deferred,
}

/// Shape of the shard tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    /// Shard-level engines pre-created under the top-level node engine.
    pub node_fanout: usize,
    /// Leaf indexes pre-created under each shard-level engine.
    pub shard_fanout: usize,
    /// Distinct words a leaf absorbs before it is frozen.
    pub leaf_capacity: usize,
    /// Active-children count at which the node level freezes a shard engine.
    /// `None` disables freezing at the node level.
    pub shard_capacity: Option<usize>,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            node_fanout: 10,
            shard_fanout: 10,
            leaf_capacity: 100,
            shard_capacity: None,
        }
    }
}

/// Query fan-out configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Suggestion limit used when the caller gives none.
    pub default_suggest_limit: usize,
    /// Worker threads per level pool (0 = available parallelism).
    pub fanout_threads: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_suggest_limit: crate::entry::DEFAULT_SUGGEST_LIMIT,
            fanout_threads: 0,
        }
    }
}

/// Background autocomplete maintenance section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MaintainerConfig {
    /// Rebuild policy for leaf indexes.
    pub rebuild: RebuildMode,
    /// Worker threads (0 = available parallelism).
    pub workers: usize,
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace.
    pub level: String,
    /// Log format: text or json.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Main `tiersearch` configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TierConfig {
    /// Shard tree shape.
    pub topology: TopologyConfig,
    /// Query fan-out settings.
    pub search: SearchConfig,
    /// Background maintainer settings.
    pub maintainer: MaintainerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl TierConfig {
    /// Loads configuration from default sources.
    ///
    /// Priority: defaults < file < environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("tiersearch.toml")
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("TIERSEARCH_").split("__"));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Creates a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::string(toml_str));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("topology.node_fanout", self.topology.node_fanout),
            ("topology.shard_fanout", self.topology.shard_fanout),
            ("topology.leaf_capacity", self.topology.leaf_capacity),
            (
                "search.default_suggest_limit",
                self.search.default_suggest_limit,
            ),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "value must be greater than 0".to_string(),
                });
            }
        }

        if self.topology.shard_capacity == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "topology.shard_capacity".to_string(),
                message: "value must be greater than 0 (omit it to disable freezing)".to_string(),
            });
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                message: format!(
                    "value '{}' is invalid, expected one of: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.format".to_string(),
                message: format!(
                    "value '{}' is invalid, expected one of: {:?}",
                    self.logging.format, valid_formats
                ),
            });
        }

        Ok(())
    }

    /// Serializes the configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

/// Resolves a `0 = auto` thread count.
#[must_use]
pub fn effective_threads(requested: usize) -> usize {
    if requested > 0 {
        return requested;
    }
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
}
