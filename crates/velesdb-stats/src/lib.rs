//! # `VelesDB` Stats
//!
//! Per-column statistics (synopses) for `VelesDB` table parts and the
//! selectivity estimates the query optimizer derives from them.
//!
//! Each column may declare a set of statistics kinds. While a part is
//! written, a [`ColumnStatistics`] container is fed the column values; it is
//! persisted next to the part and restored when the part is reopened. The
//! optimizer asks the container for row-count estimates of `x < v`, `x > v`
//! and `x = v`.
//!
//! ## Statistics kinds
//!
//! - `tdigest`: quantile sketch, answers range questions
//! - `uniq`: distinct-count sketch (`HyperLogLog`)
//! - `count_min`: frequency sketch, answers equality questions
//!   (feature `count-min-sketch`, on by default)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use velesdb_stats::{
//!     initialize_registry, ColumnSummaryDescription, DataType, StatsConfig, Value,
//! };
//!
//! let registry = initialize_registry(&StatsConfig::load()?)?;
//!
//! let description = ColumnSummaryDescription::from_kind_names(
//!     "price",
//!     DataType::Float64,
//!     &["tdigest", "uniq"],
//! )?;
//! registry.validate(&description, description.data_type())?;
//!
//! let mut stats = registry.get(&description)?;
//! stats.update(&[Value::from(9.5), Value::from(12.0)]);
//! let bytes = stats.to_bytes()?;
//!
//! let mut restored = registry.get(&description)?;
//! restored.deserialize_from_slice(&bytes)?;
//! let rows_below_ten = restored.estimate_less(&Value::from(10))?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
// =============================================================================
// NUMERIC CAST LINTS
// =============================================================================
// Estimates are f64 row counts derived from u64 counters; precision loss on
// counts above 2^53 is acceptable.
// =============================================================================
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
// =============================================================================
// STYLISTIC LINTS
// =============================================================================
#![allow(clippy::option_if_let_else)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::suboptimal_flops)]
#![allow(clippy::derive_partial_eq_without_eq)]
#![allow(clippy::redundant_pub_crate)]
#![allow(clippy::use_self)]
#![allow(clippy::float_cmp)]

pub mod column_statistics;
#[cfg(test)]
mod column_statistics_tests;
pub mod config;
pub mod description;
pub mod error;
pub mod estimator;
pub mod registry;
pub mod selectivity;
pub mod summary;
pub mod value;

pub use column_statistics::{
    ColumnStatistics, PayloadHeader, StatisticsFileVersion, STATS_FILE_PREFIX, STATS_FILE_SUFFIX,
};
pub use config::{ConfigError, StatsConfig, SummaryDefaults};
pub use description::{ColumnSummaryDescription, SingleSummaryDescriptor};
pub use error::{Error, ErrorClass, Result};
pub use estimator::{ConditionSelectivityEstimator, Predicate};
pub use registry::{
    initialize_registry, is_registry_initialized, registry, StatisticsRegistry,
};
pub use selectivity::{
    EstimationFactors, DEFAULT_GOOD_COND_FACTOR, DEFAULT_NORMAL_COND_FACTOR,
    DEFAULT_UNKNOWN_COND_FACTOR, EQUALITY_CARDINALITY_THRESHOLD, TYPICAL_RANGE_THRESHOLD,
};
pub use summary::{Capability, Summary, SummaryKind};
pub use value::{
    try_convert_to_f64, try_convert_to_string, DataType, ParseWideIntError, Value, I256, U256,
};
