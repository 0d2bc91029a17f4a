//! Statistics configuration.
//!
//! Provides configuration file support via `velesdb-stats.toml`, environment
//! variables, and runtime overrides.
//!
//! # Priority (highest to lowest)
//!
//! 1. Environment variables (`VELESDB_STATS_<SECTION>__<KEY>`)
//! 2. Configuration file (`velesdb-stats.toml`)
//! 3. Default values

use crate::selectivity::{
    EstimationFactors, DEFAULT_GOOD_COND_FACTOR, DEFAULT_NORMAL_COND_FACTOR,
    DEFAULT_UNKNOWN_COND_FACTOR, EQUALITY_CARDINALITY_THRESHOLD, TYPICAL_RANGE_THRESHOLD,
};
use crate::summary::{DEFAULT_COUNT_MIN_DEPTH, DEFAULT_COUNT_MIN_WIDTH, DEFAULT_MAX_CENTROIDS};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "velesdb-stats.toml";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to parse configuration file.
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

/// Estimation section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimationConfig {
    /// Factor for predicates assumed to filter well.
    pub good_selectivity: f64,
    /// Factor for predicates with no better information.
    pub normal_selectivity: f64,
    /// Factor for columns without statistics.
    pub unknown_selectivity: f64,
    /// Numeric literals with an absolute value up to this are in the typical range.
    pub typical_range_threshold: f64,
    /// Distinct-count limit under which the t-digest answers equality.
    pub equality_cardinality_threshold: u64,
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self {
            good_selectivity: DEFAULT_GOOD_COND_FACTOR,
            normal_selectivity: DEFAULT_NORMAL_COND_FACTOR,
            unknown_selectivity: DEFAULT_UNKNOWN_COND_FACTOR,
            typical_range_threshold: TYPICAL_RANGE_THRESHOLD,
            equality_cardinality_threshold: EQUALITY_CARDINALITY_THRESHOLD,
        }
    }
}

/// Defaults for statistics kinds declared without parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryDefaults {
    /// Centroid budget of `tdigest`.
    pub tdigest_max_centroids: usize,
    /// Cells per row of `count_min`.
    pub count_min_width: usize,
    /// Rows of `count_min`.
    pub count_min_depth: usize,
}

impl Default for SummaryDefaults {
    fn default() -> Self {
        Self {
            tdigest_max_centroids: DEFAULT_MAX_CENTROIDS,
            count_min_width: DEFAULT_COUNT_MIN_WIDTH,
            count_min_depth: DEFAULT_COUNT_MIN_DEPTH,
        }
    }
}

/// Logging section.
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

/// Main statistics configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StatsConfig {
    /// Estimation factors.
    pub estimation: EstimationConfig,
    /// Statistics kind defaults.
    pub summaries: SummaryDefaults,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl StatsConfig {
    /// Loads configuration from default sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(DEFAULT_CONFIG_FILE)
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
            .merge(Env::prefixed("VELESDB_STATS_").split("__"));

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
        let factors = [
            ("estimation.good_selectivity", self.estimation.good_selectivity),
            ("estimation.normal_selectivity", self.estimation.normal_selectivity),
            ("estimation.unknown_selectivity", self.estimation.unknown_selectivity),
        ];
        for (key, value) in factors {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("value {value} is out of range [0, 1]"),
                });
            }
        }

        let threshold = self.estimation.typical_range_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "estimation.typical_range_threshold".to_string(),
                message: format!("value {threshold} must be a finite non-negative number"),
            });
        }

        if !(16..=65_536).contains(&self.summaries.tdigest_max_centroids) {
            return Err(ConfigError::InvalidValue {
                key: "summaries.tdigest_max_centroids".to_string(),
                message: format!(
                    "value {} is out of range [16, 65536]",
                    self.summaries.tdigest_max_centroids
                ),
            });
        }

        if !(16..=1_048_576).contains(&self.summaries.count_min_width) {
            return Err(ConfigError::InvalidValue {
                key: "summaries.count_min_width".to_string(),
                message: format!(
                    "value {} is out of range [16, 1048576]",
                    self.summaries.count_min_width
                ),
            });
        }

        if !(1..=32).contains(&self.summaries.count_min_depth) {
            return Err(ConfigError::InvalidValue {
                key: "summaries.count_min_depth".to_string(),
                message: format!(
                    "value {} is out of range [1, 32]",
                    self.summaries.count_min_depth
                ),
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

    /// Estimation factors derived from the `[estimation]` section.
    #[must_use]
    pub fn estimation_factors(&self) -> EstimationFactors {
        EstimationFactors {
            good: self.estimation.good_selectivity,
            normal: self.estimation.normal_selectivity,
            unknown: self.estimation.unknown_selectivity,
            typical_range_threshold: self.estimation.typical_range_threshold,
            equality_cardinality_threshold: self.estimation.equality_cardinality_threshold,
        }
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
