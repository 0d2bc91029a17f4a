//! Table-level selectivity estimation over per-part column statistics.
//!
//! A table is split into parts, each carrying its own [`ColumnStatistics`]
//! for some of its columns. The estimator sums the per-part answers for a
//! column and charges rows of parts without statistics for that column with
//! the unknown factor.

use crate::column_statistics::ColumnStatistics;
use crate::error::Result;
use crate::selectivity::EstimationFactors;
use crate::value::Value;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Simple comparison of a column against a literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// `column = value`
    Equal(Value),
    /// `column != value`
    NotEqual(Value),
    /// `column < value`
    Less(Value),
    /// `column > value`
    Greater(Value),
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (op, value) = match self {
            Self::Equal(v) => ("=", v),
            Self::NotEqual(v) => ("!=", v),
            Self::Less(v) => ("<", v),
            Self::Greater(v) => (">", v),
        };
        write!(f, "{op} {value:?}")
    }
}

impl Predicate {
    fn estimate(&self, stats: &ColumnStatistics) -> Result<f64> {
        match self {
            Self::Equal(v) => stats.estimate_equal(v),
            Self::NotEqual(v) => Ok(stats.row_count() as f64 - stats.estimate_equal(v)?),
            Self::Less(v) => stats.estimate_less(v),
            Self::Greater(v) => stats.estimate_greater(v),
        }
    }
}

/// Statistics of one column, one entry per part that carries them.
#[derive(Debug, Default, Clone)]
struct ColumnParts {
    parts: Vec<(String, ColumnStatistics)>,
    rows: u64,
}

/// Combines column statistics of many parts into table-level estimates.
#[derive(Debug, Clone)]
pub struct ConditionSelectivityEstimator {
    columns: FxHashMap<String, ColumnParts>,
    total_rows: u64,
    factors: EstimationFactors,
}

impl Default for ConditionSelectivityEstimator {
    fn default() -> Self {
        Self::new(EstimationFactors::default())
    }
}

impl ConditionSelectivityEstimator {
    /// Creates an estimator for an empty table.
    #[must_use]
    pub fn new(factors: EstimationFactors) -> Self {
        Self {
            columns: FxHashMap::default(),
            total_rows: 0,
            factors,
        }
    }

    /// Accounts for the rows of one more part.
    ///
    /// Called once per part, whether or not the part has statistics.
    pub fn increment_row_count(&mut self, rows: u64) {
        self.total_rows = self.total_rows.saturating_add(rows);
    }

    /// Registers the statistics of one column in one part.
    pub fn add_statistics(&mut self, part_name: impl Into<String>, stats: ColumnStatistics) {
        let part_name = part_name.into();
        let entry = self
            .columns
            .entry(stats.column_name().to_string())
            .or_default();
        entry.rows = entry.rows.saturating_add(stats.row_count());
        tracing::trace!(
            part = %part_name,
            column = stats.column_name(),
            rows = stats.row_count(),
            "added part statistics"
        );
        entry.parts.push((part_name, stats));
    }

    /// Rows across all parts.
    #[must_use]
    pub fn total_rows(&self) -> u64 {
        self.total_rows
    }

    /// Names of the parts carrying statistics for `column`.
    pub fn parts_for(&self, column: &str) -> impl Iterator<Item = &str> {
        self.columns
            .get(column)
            .into_iter()
            .flat_map(|c| c.parts.iter().map(|(name, _)| name.as_str()))
    }

    /// Estimated number of rows matching `column <predicate>`.
    ///
    /// # Errors
    ///
    /// Propagates internal errors of the part containers.
    pub fn estimate_row_count(&self, column: &str, predicate: &Predicate) -> Result<f64> {
        let (mut estimate, covered) = match self.columns.get(column) {
            Some(parts) => {
                let mut sum = 0.0;
                for (_, stats) in &parts.parts {
                    sum += predicate.estimate(stats)?;
                }
                (sum, parts.rows)
            }
            None => (0.0, 0),
        };
        let uncovered = self.total_rows.saturating_sub(covered);
        estimate += uncovered as f64 * self.factors.unknown;

        tracing::debug!(column, %predicate, estimate, uncovered, "estimated row count");
        Ok(estimate.clamp(0.0, self.total_rows.max(covered) as f64))
    }

    /// Estimated fraction of rows matching `column <predicate>`.
    ///
    /// Returns 1.0 for an empty table.
    ///
    /// # Errors
    ///
    /// Propagates internal errors of the part containers.
    pub fn estimate_selectivity(&self, column: &str, predicate: &Predicate) -> Result<f64> {
        if self.total_rows == 0 {
            return Ok(1.0);
        }
        let rows = self.estimate_row_count(column, predicate)?;
        Ok((rows / self.total_rows as f64).clamp(0.0, 1.0))
    }
}
