//! Statistics kinds and the capability interface they implement.
//!
//! Each statistics object natively supports certain questions:
//!
//! | Kind | DDL name | Native question |
//! |------|----------|-----------------|
//! | [`SummaryKind::Histogram`] | `tdigest` | `x < v` |
//! | [`SummaryKind::DistinctCount`] | `uniq` | `count(distinct x)` |
//! | [`SummaryKind::FrequencySketch`] | `count_min` | `x = v` |
//!
//! The container combines them centrally (see
//! [`ColumnStatistics`](crate::ColumnStatistics)); a summary never looks at its
//! siblings.

mod count_min;
mod hashing;
mod tdigest;
mod uniq;


pub use count_min::{CountMinSummary, DEFAULT_COUNT_MIN_DEPTH, DEFAULT_COUNT_MIN_WIDTH};
pub use tdigest::{TDigestSummary, DEFAULT_MAX_CENTROIDS};
pub use uniq::{UniqSummary, UNIQ_PRECISION};

use crate::error::{Error, Result};
use crate::value::Value;
use bytes::{Buf, BufMut};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifies a statistics implementation.
///
/// The discriminant is the bit position in the persisted presence mask and
/// must never be reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum SummaryKind {
    /// Quantile sketch (t-digest).
    Histogram = 0,
    /// Distinct-count sketch (HyperLogLog).
    DistinctCount = 1,
    /// Frequency sketch (count-min).
    FrequencySketch = 2,
}

const _: () = assert!(SummaryKind::ALL.len() <= u64::BITS as usize);

impl SummaryKind {
    /// All kinds in ascending tag order.
    pub const ALL: [SummaryKind; 3] = [
        SummaryKind::Histogram,
        SummaryKind::DistinctCount,
        SummaryKind::FrequencySketch,
    ];

    /// Tag value of this kind.
    #[must_use]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Bit of this kind in the presence mask.
    #[must_use]
    pub const fn bit(self) -> u64 {
        1 << self.tag()
    }

    /// Name used in column statistics declarations.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Histogram => "tdigest",
            Self::DistinctCount => "uniq",
            Self::FrequencySketch => "count_min",
        }
    }

    /// Kinds whose bit is set in `mask`, ascending.
    pub fn from_mask(mask: u64) -> impl Iterator<Item = SummaryKind> {
        Self::ALL.into_iter().filter(move |kind| mask & kind.bit() != 0)
    }

    /// Decodes and discards one persisted payload of this kind.
    ///
    /// Used to step over statistics that are no longer declared on a column
    /// while keeping the following payloads aligned.
    pub(crate) fn skip_payload(self, buf: &mut dyn Buf) -> Result<()> {
        match self {
            Self::Histogram => tdigest::skip(buf),
            Self::DistinctCount => uniq::skip(buf),
            Self::FrequencySketch => count_min::skip(buf),
        }
    }
}

impl fmt::Display for SummaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SummaryKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| Error::UnknownStatisticsKind {
                kind: s.trim().to_string(),
                available: Self::ALL
                    .iter()
                    .map(|k| format!("'{k}'"))
                    .collect::<Vec<_>>()
                    .join(" "),
            })
    }
}

/// Estimation capability a summary may or may not support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Distinct-value count.
    Cardinality,
    /// `x = v` row count.
    Equality,
    /// `x < v` row count.
    LessThan,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cardinality => "Cardinality",
            Self::Equality => "Equality",
            Self::LessThan => "Less-than",
        })
    }
}

/// Operations every statistics kind implements.
///
/// Estimates are expressed in rows, not as fractions. Capabilities a kind does
/// not support keep the default implementation, which reports
/// [`Error::UnsupportedEstimate`].
pub trait Summary: fmt::Debug + Send + Sync {
    /// Kind of this summary.
    fn kind(&self) -> SummaryKind;

    /// Feeds a batch of column values.
    ///
    /// Splitting the same values across several calls must not bias the
    /// resulting estimates.
    fn update(&mut self, batch: &[Value]);

    /// Approximate number of distinct values.
    fn estimate_cardinality(&self) -> Result<u64> {
        Err(Error::unsupported(self.kind(), Capability::Cardinality))
    }

    /// Approximate number of rows equal to `value`.
    fn estimate_equal(&self, value: &Value) -> Result<f64> {
        let _ = value;
        Err(Error::unsupported(self.kind(), Capability::Equality))
    }

    /// Approximate number of rows less than `value`.
    fn estimate_less(&self, value: &Value) -> Result<f64> {
        let _ = value;
        Err(Error::unsupported(self.kind(), Capability::LessThan))
    }

    /// Number of distinct values this summary keeps exactly, if bounded.
    ///
    /// Histograms report their bucket budget; equality answers are only
    /// trusted while the column has fewer distinct values than this.
    fn resolution(&self) -> Option<u64> {
        None
    }

    /// Writes the kind-private state.
    fn serialize(&self, buf: &mut dyn BufMut) -> Result<()>;

    /// Replaces the state with one read from `buf`, consuming exactly the
    /// bytes written by [`Summary::serialize`].
    fn deserialize(&mut self, buf: &mut dyn Buf) -> Result<()>;

    /// Clones into a new box.
    fn clone_box(&self) -> Box<dyn Summary>;
}

impl Clone for Box<dyn Summary> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Writes a serde state struct with bincode.
pub(crate) fn encode_state<T: Serialize>(buf: &mut dyn BufMut, state: &T) -> Result<()> {
    let writer = <&mut dyn BufMut as BufMut>::writer(buf);
    bincode::serialize_into(writer, state).map_err(|e| Error::Serialization(e.to_string()))
}

/// Reads a serde state struct written by [`encode_state`].
pub(crate) fn decode_state<T: DeserializeOwned>(buf: &mut dyn Buf) -> Result<T> {
    let reader = <&mut dyn Buf as Buf>::reader(buf);
    Ok(bincode::deserialize_from(reader)?)
}
