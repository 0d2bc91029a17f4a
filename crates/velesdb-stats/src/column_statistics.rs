//! Per-column statistics container.
//!
//! A [`ColumnStatistics`] owns the statistics objects declared on one column
//! of one table part, together with the row count they were built over.
//! All estimation is performed here rather than in the individual kinds:
//! each kind natively answers one kind of question, and several kinds can be
//! combined to answer questions none of them handles well alone.
//!
//! # Persisted Format
//!
//! ```text
//! [Version: u16 LE]           currently 0
//! [Presence mask: u64 LE]     bit i set <=> kind with tag i was written
//! [Row count: u64 LE]
//! [Kind payloads]             one per set bit, ascending tag order
//! ```

use crate::description::ColumnSummaryDescription;
use crate::error::{Error, Result};
use crate::selectivity::EstimationFactors;
use crate::summary::{Summary, SummaryKind};
use crate::value::{numeric_point, Value};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::collections::BTreeMap;
use std::fmt;

/// Prefix of the per-column statistics file inside a part.
pub const STATS_FILE_PREFIX: &str = "statistics_";

/// Extension of the per-column statistics file.
pub const STATS_FILE_SUFFIX: &str = ".stats";

/// Persisted format versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum StatisticsFileVersion {
    /// Initial format.
    V0 = 0,
}

impl StatisticsFileVersion {
    /// Version written by this build.
    pub const CURRENT: Self = Self::V0;

    fn from_u16(version: u16) -> Option<Self> {
        match version {
            0 => Some(Self::V0),
            _ => None,
        }
    }
}

/// Fixed-size header of a persisted statistics payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadHeader {
    /// Format version.
    pub version: StatisticsFileVersion,
    /// Kinds present at write time.
    pub presence_mask: u64,
    /// Rows observed at write time.
    pub row_count: u64,
}

impl PayloadHeader {
    /// Encoded size in bytes.
    pub const SIZE: usize = 2 + 8 + 8;

    /// Reads and checks a header.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownFormatVersion`] for an unknown version and
    /// [`Error::Corrupted`] if the buffer is too short.
    pub fn read(buf: &mut dyn Buf) -> Result<Self> {
        if buf.remaining() < 2 {
            return Err(Error::Corrupted("statistics header is truncated".to_string()));
        }
        let raw_version = buf.get_u16_le();
        let version = StatisticsFileVersion::from_u16(raw_version)
            .ok_or(Error::UnknownFormatVersion(raw_version))?;

        if buf.remaining() < Self::SIZE - 2 {
            return Err(Error::Corrupted("statistics header is truncated".to_string()));
        }
        Ok(Self {
            version,
            presence_mask: buf.get_u64_le(),
            row_count: buf.get_u64_le(),
        })
    }

    /// Writes the header.
    pub fn write(&self, buf: &mut dyn BufMut) {
        buf.put_u16_le(self.version as u16);
        buf.put_u64_le(self.presence_mask);
        buf.put_u64_le(self.row_count);
    }

    /// Kinds present in the payload, ascending.
    pub fn kinds(&self) -> impl Iterator<Item = SummaryKind> {
        SummaryKind::from_mask(self.presence_mask)
    }
}

/// Statistics of one column in one table part.
///
/// Built empty by the [`StatisticsRegistry`](crate::StatisticsRegistry),
/// filled by [`update`](Self::update) during a single write pass, then
/// read-only. Restored parts go through [`deserialize`](Self::deserialize).
///
/// # Invariants
///
/// - `row_count()` is the number of values passed to `update` (or the count
///   restored by `deserialize`), whatever kinds are present.
/// - `estimate_greater(v) + estimate_less(v) == row_count()`.
/// - `estimate_equal(v)` and `estimate_less(v)` lie in `[0, row_count()]`.
#[derive(Clone)]
pub struct ColumnStatistics {
    description: ColumnSummaryDescription,
    summaries: BTreeMap<SummaryKind, Box<dyn Summary>>,
    rows: u64,
    factors: EstimationFactors,
}

impl fmt::Debug for ColumnStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnStatistics")
            .field("column", &self.description.column_name())
            .field("kinds", &self.summaries.keys().collect::<Vec<_>>())
            .field("rows", &self.rows)
            .finish_non_exhaustive()
    }
}

impl ColumnStatistics {
    /// Creates a container without statistics objects.
    #[must_use]
    pub fn new(description: ColumnSummaryDescription, factors: EstimationFactors) -> Self {
        Self {
            description,
            summaries: BTreeMap::new(),
            rows: 0,
            factors,
        }
    }

    /// Adds a statistics object, replacing one of the same kind.
    pub(crate) fn insert_summary(&mut self, summary: Box<dyn Summary>) {
        self.summaries.insert(summary.kind(), summary);
    }

    /// Feeds a batch of column values to every statistics object.
    pub fn update(&mut self, batch: &[Value]) {
        self.rows += batch.len() as u64;
        for summary in self.summaries.values_mut() {
            summary.update(batch);
        }
    }

    /// Estimated number of rows with `column < value`.
    ///
    /// Uses the histogram when present and `value` is numeric, otherwise a
    /// default fraction of the rows.
    ///
    /// # Errors
    ///
    /// Propagates internal errors of the histogram.
    pub fn estimate_less(&self, value: &Value) -> Result<f64> {
        if let Some(histogram) = self.summary(SummaryKind::Histogram) {
            if numeric_point(value).is_some() {
                return Ok(self.clamp(histogram.estimate_less(value)?));
            }
        }
        Ok(self.row_count_f64() * self.factors.normal)
    }

    /// Estimated number of rows with `column > value`.
    ///
    /// Complement of [`estimate_less`](Self::estimate_less); rows equal to
    /// `value` are assumed negligible.
    ///
    /// # Errors
    ///
    /// Propagates internal errors of the histogram.
    pub fn estimate_greater(&self, value: &Value) -> Result<f64> {
        Ok(self.row_count_f64() - self.estimate_less(value)?)
    }

    /// Estimated number of rows with `column = value`.
    ///
    /// 1. If `value` is numeric, a distinct count and a histogram are present,
    ///    and the distinct count is below both the equality threshold and
    ///    the histogram's bucket budget, the histogram holds one centroid per
    ///    value and answers directly.
    /// 2. Otherwise a frequency sketch answers if present.
    /// 3. Otherwise a default fraction applies: the good factor for numeric
    ///    literals in the typical range, the normal factor for everything
    ///    else.
    ///
    /// # Errors
    ///
    /// Propagates internal errors of the statistics objects.
    pub fn estimate_equal(&self, value: &Value) -> Result<f64> {
        if numeric_point(value).is_some() {
            if let (Some(uniq), Some(histogram)) = (
                self.summary(SummaryKind::DistinctCount),
                self.summary(SummaryKind::Histogram),
            ) {
                let threshold = histogram.resolution().map_or(
                    self.factors.equality_cardinality_threshold,
                    |budget| budget.min(self.factors.equality_cardinality_threshold),
                );
                if uniq.estimate_cardinality()? < threshold {
                    return Ok(self.clamp(histogram.estimate_equal(value)?));
                }
            }
        }

        #[cfg(feature = "count-min-sketch")]
        {
            if let Some(sketch) = self.summary(SummaryKind::FrequencySketch) {
                return Ok(self.clamp(sketch.estimate_equal(value)?));
            }
        }

        Ok(self.row_count_f64() * self.factors.equality_fallback(value))
    }

    /// Estimated number of distinct values, if a distinct count is present.
    ///
    /// # Errors
    ///
    /// Propagates internal errors of the distinct count.
    pub fn estimate_cardinality(&self) -> Result<Option<u64>> {
        self.summary(SummaryKind::DistinctCount)
            .map(|uniq| uniq.estimate_cardinality())
            .transpose()
    }

    /// Writes the persisted form of this container.
    ///
    /// # Errors
    ///
    /// Returns an error if a statistics object fails to encode.
    pub fn serialize(&self, buf: &mut dyn BufMut) -> Result<()> {
        let header = PayloadHeader {
            version: StatisticsFileVersion::CURRENT,
            presence_mask: self.presence_mask(),
            row_count: self.rows,
        };
        header.write(buf);
        for summary in self.summaries.values() {
            summary.serialize(buf)?;
        }
        Ok(())
    }

    /// Returns the persisted form of this container.
    ///
    /// # Errors
    ///
    /// Returns an error if a statistics object fails to encode.
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(PayloadHeader::SIZE);
        self.serialize(&mut buf)?;
        Ok(buf.freeze())
    }

    /// Restores state from a persisted payload.
    ///
    /// The container must have been built from the column's *current*
    /// description. Kinds declared now but absent from the payload are
    /// dropped; kinds present in the payload but no longer declared are
    /// skipped. On error the container is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownFormatVersion`] for an unknown version and
    /// [`Error::Corrupted`] for a truncated or malformed payload.
    pub fn deserialize(&mut self, buf: &mut dyn Buf) -> Result<()> {
        let header = PayloadHeader::read(buf)?;

        let mut restored: BTreeMap<SummaryKind, Box<dyn Summary>> = BTreeMap::new();
        for kind in SummaryKind::ALL {
            let persisted = header.presence_mask & kind.bit() != 0;
            match (self.summaries.get(&kind), persisted) {
                (Some(current), true) => {
                    let mut summary = current.clone_box();
                    summary.deserialize(buf)?;
                    restored.insert(kind, summary);
                }
                (Some(_), false) => {
                    tracing::debug!(
                        column = self.column_name(),
                        %kind,
                        "statistics missing from persisted payload, dropping"
                    );
                }
                (None, true) => {
                    tracing::warn!(
                        column = self.column_name(),
                        %kind,
                        "persisted statistics no longer declared, skipping"
                    );
                    kind.skip_payload(buf)?;
                }
                (None, false) => {}
            }
        }

        self.summaries = restored;
        self.rows = header.row_count;
        Ok(())
    }

    /// Restores state from a byte slice. See [`deserialize`](Self::deserialize).
    ///
    /// # Errors
    ///
    /// Same as [`deserialize`](Self::deserialize).
    pub fn deserialize_from_slice(&mut self, mut data: &[u8]) -> Result<()> {
        self.deserialize(&mut data)
    }

    /// Name of the statistics file of this column inside a part.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{STATS_FILE_PREFIX}{}", self.column_name())
    }

    /// Column name.
    #[must_use]
    pub fn column_name(&self) -> &str {
        self.description.column_name()
    }

    /// Number of rows observed.
    #[must_use]
    pub fn row_count(&self) -> u64 {
        self.rows
    }

    /// Description this container was built from.
    #[must_use]
    pub fn description(&self) -> &ColumnSummaryDescription {
        &self.description
    }

    /// Kinds currently held, ascending.
    pub fn kinds(&self) -> impl Iterator<Item = SummaryKind> + '_ {
        self.summaries.keys().copied()
    }

    /// Returns true if a statistics object of `kind` is held.
    #[must_use]
    pub fn has_kind(&self, kind: SummaryKind) -> bool {
        self.summaries.contains_key(&kind)
    }

    /// Factors used for fallback estimates.
    #[must_use]
    pub fn factors(&self) -> &EstimationFactors {
        &self.factors
    }

    fn summary(&self, kind: SummaryKind) -> Option<&dyn Summary> {
        self.summaries.get(&kind).map(|summary| &**summary)
    }

    fn presence_mask(&self) -> u64 {
        self.summaries.keys().fold(0, |mask, kind| mask | kind.bit())
    }

    fn row_count_f64(&self) -> f64 {
        self.rows as f64
    }

    fn clamp(&self, estimate: f64) -> f64 {
        if estimate.is_nan() {
            return 0.0;
        }
        // +0.0 folds a negative zero
        estimate.clamp(0.0, self.row_count_f64()) + 0.0
    }
}
