//! Histogram statistics backed by a merging t-digest.
//!
//! Incoming values are buffered and periodically merged into a sorted list of
//! centroids `(mean, count)`. Centroids with equal means always merge, so as
//! long as the column has no more distinct values than the centroid budget
//! every distinct value keeps its own exact centroid. Above the budget,
//! neighbouring centroids are merged with a size bound that is tight at the
//! tails and loose in the middle, as in the classic t-digest.

use super::{decode_state, encode_state, Summary, SummaryKind};
use crate::error::{Error, Result};
use crate::value::{numeric_point, Value};
use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cmp::Ordering;

/// Default centroid budget.
pub const DEFAULT_MAX_CENTROIDS: usize = 2048;

/// Buffered values per centroid of budget before a merge is forced.
const BUFFER_FACTOR: usize = 4;

/// Passes of the scaled merge before falling back to fixed-size groups.
const MAX_COMPRESS_PASSES: u32 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct Centroid {
    mean: f64,
    count: f64,
}

impl Centroid {
    fn absorb(&mut self, other: Centroid) {
        let count = self.count + other.count;
        if self.mean != other.mean {
            self.mean += (other.mean - self.mean) * other.count / count;
        }
        self.count = count;
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TDigestState {
    max_centroids: u32,
    centroids: Vec<Centroid>,
}

/// Histogram-kind statistics (`tdigest`).
#[derive(Debug, Clone)]
pub struct TDigestSummary {
    max_centroids: usize,
    /// Sorted by mean, no duplicate means.
    centroids: Vec<Centroid>,
    pending: Vec<f64>,
}

impl Default for TDigestSummary {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CENTROIDS)
    }
}

impl TDigestSummary {
    /// Creates an empty digest keeping at most `max_centroids` centroids.
    #[must_use]
    pub fn new(max_centroids: usize) -> Self {
        Self {
            max_centroids: max_centroids.max(1),
            centroids: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Total weight of all values seen.
    #[must_use]
    pub fn count(&self) -> f64 {
        self.centroids.iter().map(|c| c.count).sum::<f64>() + self.pending.len() as f64
    }

    /// Number of centroids after merging pending values.
    #[must_use]
    pub fn centroid_count(&self) -> usize {
        self.merged().len()
    }

    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.pending);
        let centroids = std::mem::take(&mut self.centroids);
        self.centroids = merge(centroids, &pending, self.max_centroids);
    }

    /// Centroids including pending values, without mutating `self`.
    fn merged(&self) -> Cow<'_, [Centroid]> {
        if self.pending.is_empty() {
            Cow::Borrowed(&self.centroids)
        } else {
            Cow::Owned(merge(self.centroids.clone(), &self.pending, self.max_centroids))
        }
    }

    fn numeric_literal(&self, value: &Value) -> Result<f64> {
        numeric_point(value).ok_or_else(|| {
            Error::Internal(format!(
                "statistics '{}' cannot estimate non-numeric literal {value:?}",
                self.kind()
            ))
        })
    }
}

impl Summary for TDigestSummary {
    fn kind(&self) -> SummaryKind {
        SummaryKind::Histogram
    }

    fn update(&mut self, batch: &[Value]) {
        for value in batch {
            if let Some(v) = numeric_point(value).filter(|v| v.is_finite()) {
                // -0.0 and 0.0 share a centroid
                self.pending.push(v + 0.0);
                if self.pending.len() >= self.max_centroids * BUFFER_FACTOR {
                    self.flush();
                }
            }
        }
    }

    fn estimate_equal(&self, value: &Value) -> Result<f64> {
        let v = self.numeric_literal(value)? + 0.0;
        let centroids = self.merged();
        let found = centroids
            .binary_search_by(|c| c.mean.total_cmp(&v))
            .map_or(0.0, |idx| centroids[idx].count);
        Ok(found)
    }

    fn estimate_less(&self, value: &Value) -> Result<f64> {
        let v = self.numeric_literal(value)?;
        let centroids = self.merged();
        let end = centroids.partition_point(|c| c.mean < v);
        Ok(centroids[..end].iter().map(|c| c.count).sum::<f64>() + 0.0)
    }

    fn resolution(&self) -> Option<u64> {
        Some(self.max_centroids as u64)
    }

    fn serialize(&self, buf: &mut dyn BufMut) -> Result<()> {
        let state = TDigestState {
            max_centroids: u32::try_from(self.max_centroids).unwrap_or(u32::MAX),
            centroids: self.merged().into_owned(),
        };
        encode_state(buf, &state)
    }

    fn deserialize(&mut self, buf: &mut dyn Buf) -> Result<()> {
        let state: TDigestState = decode_state(buf)?;
        let sorted = state
            .centroids
            .windows(2)
            .all(|w| w[0].mean <= w[1].mean);
        let valid = state
            .centroids
            .iter()
            .all(|c| c.mean.is_finite() && c.count.is_finite() && c.count > 0.0);
        if !sorted || !valid || state.max_centroids == 0 {
            return Err(Error::Corrupted(
                "tdigest centroids are not sorted positive finite values".to_string(),
            ));
        }
        self.max_centroids = state.max_centroids as usize;
        self.centroids = state.centroids;
        self.pending.clear();
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn Summary> {
        Box::new(self.clone())
    }
}

/// Steps over one persisted digest.
pub(super) fn skip(buf: &mut dyn Buf) -> Result<()> {
    decode_state::<TDigestState>(buf).map(|_| ())
}

/// Merges `pending` values into sorted `centroids` and compresses the result
/// to at most `max_centroids`.
fn merge(mut centroids: Vec<Centroid>, pending: &[f64], max_centroids: usize) -> Vec<Centroid> {
    centroids.extend(pending.iter().map(|&mean| Centroid { mean, count: 1.0 }));
    centroids.sort_by(|a, b| a.mean.total_cmp(&b.mean));

    let mut distinct: Vec<Centroid> = Vec::with_capacity(centroids.len());
    for c in centroids {
        match distinct.last_mut() {
            Some(last) if last.mean.total_cmp(&c.mean) == Ordering::Equal => last.count += c.count,
            _ => distinct.push(c),
        }
    }

    if distinct.len() <= max_centroids {
        return distinct;
    }
    compress(&distinct, max_centroids)
}

fn compress(centroids: &[Centroid], max_centroids: usize) -> Vec<Centroid> {
    let total: f64 = centroids.iter().map(|c| c.count).sum();
    let mut scale = 1.0;

    for _ in 0..MAX_COMPRESS_PASSES {
        let mut out: Vec<Centroid> = Vec::with_capacity(max_centroids);
        let mut before = 0.0;
        let mut current = centroids[0];
        for &next in &centroids[1..] {
            let q = (before + (current.count + next.count) / 2.0) / total;
            let limit = 4.0 * total * q * (1.0 - q) * scale / max_centroids as f64;
            if current.count + next.count <= limit.max(1.0) {
                current.absorb(next);
            } else {
                before += current.count;
                out.push(current);
                current = next;
            }
        }
        out.push(current);

        if out.len() <= max_centroids {
            return out;
        }
        scale *= 2.0;
    }

    // fixed-size groups always fit the budget
    let group = centroids.len().div_ceil(max_centroids);
    centroids
        .chunks(group)
        .map(|chunk| {
            let mut merged = chunk[0];
            for &c in &chunk[1..] {
                merged.absorb(c);
            }
            merged
        })
        .collect()
}
