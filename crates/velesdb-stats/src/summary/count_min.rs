//! Frequency statistics backed by a count-min sketch.
//!
//! Each row of the sketch uses an independent cell index derived by double
//! hashing one 64-bit value hash. The point estimate is the minimum over rows
//! and never underestimates.

use super::hashing::{fmix64, hash_value};
use super::{decode_state, encode_state, Summary, SummaryKind};
use crate::error::{Error, Result};
use crate::value::Value;
use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

/// Default cells per row.
pub const DEFAULT_COUNT_MIN_WIDTH: usize = 2048;

/// Default number of rows (hash functions).
pub const DEFAULT_COUNT_MIN_DEPTH: usize = 8;

#[derive(Debug, Serialize, Deserialize)]
struct CountMinState {
    width: u32,
    depth: u32,
    counters: Vec<u64>,
}

/// Frequency-sketch-kind statistics (`count_min`).
#[derive(Debug, Clone)]
pub struct CountMinSummary {
    width: usize,
    depth: usize,
    /// Row-major `depth x width` matrix.
    counters: Vec<u64>,
}

impl Default for CountMinSummary {
    fn default() -> Self {
        Self::new(DEFAULT_COUNT_MIN_WIDTH, DEFAULT_COUNT_MIN_DEPTH)
    }
}

impl CountMinSummary {
    /// Creates an empty sketch of `depth` rows by `width` cells.
    #[must_use]
    pub fn new(width: usize, depth: usize) -> Self {
        let width = width.max(1);
        let depth = depth.max(1);
        Self {
            width,
            depth,
            counters: vec![0; width * depth],
        }
    }

    fn cells(&self, hash: u64) -> impl Iterator<Item = usize> {
        cell_indices(self.width, self.depth, hash)
    }
}

fn cell_indices(width: usize, depth: usize, hash: u64) -> impl Iterator<Item = usize> {
    let h1 = hash;
    // odd step so that rows never collapse onto the same cell sequence
    let h2 = fmix64(hash ^ 0x5851_F42D_4C95_7F2D) | 1;
    (0..depth).map(move |row| {
        let cell = h1.wrapping_add((row as u64).wrapping_mul(h2)) % width as u64;
        row * width + cell as usize
    })
}

impl Summary for CountMinSummary {
    fn kind(&self) -> SummaryKind {
        SummaryKind::FrequencySketch
    }

    fn update(&mut self, batch: &[Value]) {
        for hash in batch.iter().filter_map(hash_value) {
            for cell in cell_indices(self.width, self.depth, hash) {
                self.counters[cell] = self.counters[cell].saturating_add(1);
            }
        }
    }

    fn estimate_equal(&self, value: &Value) -> Result<f64> {
        let Some(hash) = hash_value(value) else {
            // NULL never compares equal
            return Ok(0.0);
        };
        let estimate = self
            .cells(hash)
            .map(|cell| self.counters[cell])
            .min()
            .unwrap_or(0);
        Ok(estimate as f64)
    }

    fn serialize(&self, buf: &mut dyn BufMut) -> Result<()> {
        let state = CountMinState {
            width: u32::try_from(self.width)
                .map_err(|_| Error::Serialization("count_min width overflows u32".to_string()))?,
            depth: u32::try_from(self.depth)
                .map_err(|_| Error::Serialization("count_min depth overflows u32".to_string()))?,
            counters: self.counters.clone(),
        };
        encode_state(buf, &state)
    }

    fn deserialize(&mut self, buf: &mut dyn Buf) -> Result<()> {
        let state: CountMinState = decode_state(buf)?;
        let width = state.width as usize;
        let depth = state.depth as usize;
        if width == 0 || depth == 0 || state.counters.len() != width * depth {
            return Err(Error::Corrupted(format!(
                "count_min sketch {depth}x{width} does not match {} counters",
                state.counters.len()
            )));
        }
        self.width = width;
        self.depth = depth;
        self.counters = state.counters;
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn Summary> {
        Box::new(self.clone())
    }
}

/// Steps over one persisted sketch.
pub(super) fn skip(buf: &mut dyn Buf) -> Result<()> {
    decode_state::<CountMinState>(buf).map(|_| ())
}
