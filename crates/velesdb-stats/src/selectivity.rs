//! Default selectivity factors used when no statistics can answer a question.
//!
//! Factors are expressed as a fraction of the rows in a part. The equality
//! fallback treats literals in the small-number range around zero, where
//! flag-like and enum-like columns concentrate their values, as matching
//! few rows.

use crate::value::{try_convert_to_f64, Value};
use serde::{Deserialize, Serialize};

/// Factor for predicates assumed to filter well.
pub const DEFAULT_GOOD_COND_FACTOR: f64 = 0.1;

/// Factor for predicates with no better information.
pub const DEFAULT_NORMAL_COND_FACTOR: f64 = 0.5;

/// Factor for predicates on columns without any statistics.
pub const DEFAULT_UNKNOWN_COND_FACTOR: f64 = 1.0;

/// Numeric literals with an absolute value up to this are in the typical range.
pub const TYPICAL_RANGE_THRESHOLD: f64 = 2.0;

/// Below this distinct-count estimate the t-digest keeps one centroid per
/// distinct value and can answer point-equality questions.
///
/// Matches the default t-digest centroid budget.
pub const EQUALITY_CARDINALITY_THRESHOLD: u64 = 2048;

/// Estimation factors handed to every column statistics container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimationFactors {
    /// See [`DEFAULT_GOOD_COND_FACTOR`].
    pub good: f64,
    /// See [`DEFAULT_NORMAL_COND_FACTOR`].
    pub normal: f64,
    /// See [`DEFAULT_UNKNOWN_COND_FACTOR`].
    pub unknown: f64,
    /// See [`TYPICAL_RANGE_THRESHOLD`].
    pub typical_range_threshold: f64,
    /// See [`EQUALITY_CARDINALITY_THRESHOLD`].
    pub equality_cardinality_threshold: u64,
}

impl Default for EstimationFactors {
    fn default() -> Self {
        Self {
            good: DEFAULT_GOOD_COND_FACTOR,
            normal: DEFAULT_NORMAL_COND_FACTOR,
            unknown: DEFAULT_UNKNOWN_COND_FACTOR,
            typical_range_threshold: TYPICAL_RANGE_THRESHOLD,
            equality_cardinality_threshold: EQUALITY_CARDINALITY_THRESHOLD,
        }
    }
}

impl EstimationFactors {
    /// Returns true if `value` lies in the typical numeric range.
    ///
    /// True iff `value` normalizes to a finite `f64` with
    /// `|v| <= threshold`; the boundary itself is inside. Non-numeric
    /// literals, NaN and infinities are outside.
    #[must_use]
    pub fn is_in_typical_range(&self, value: &Value) -> bool {
        try_convert_to_f64(value)
            .is_some_and(|v| v.is_finite() && v.abs() <= self.typical_range_threshold)
    }

    /// Fallback factor for `column = value` when no statistics apply.
    #[must_use]
    pub fn equality_fallback(&self, value: &Value) -> f64 {
        if self.is_in_typical_range(value) {
            self.good
        } else {
            self.normal
        }
    }
}
