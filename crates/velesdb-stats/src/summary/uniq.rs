//! Distinct-count statistics backed by HyperLogLog.

use super::hashing::hash_value;
use super::{decode_state, encode_state, Summary, SummaryKind};
use crate::error::{Error, Result};
use crate::value::Value;
use bytes::{Buf, BufMut};
use serde::{Deserialize, Serialize};

/// Number of index bits (2^12 registers, ~1.6% standard error).
pub const UNIQ_PRECISION: u32 = 12;

const REGISTER_COUNT: usize = 1 << UNIQ_PRECISION;

/// Largest rank a register can hold for a 64-bit hash.
const MAX_RANK: u8 = (u64::BITS - UNIQ_PRECISION + 1) as u8;

#[derive(Debug, Serialize, Deserialize)]
struct UniqState {
    registers: Vec<u8>,
}

/// Distinct-count-kind statistics (`uniq`).
#[derive(Debug, Clone)]
pub struct UniqSummary {
    registers: Vec<u8>,
}

impl Default for UniqSummary {
    fn default() -> Self {
        Self::new()
    }
}

impl UniqSummary {
    /// Creates an empty sketch.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registers: vec![0; REGISTER_COUNT],
        }
    }

    fn insert_hash(&mut self, hash: u64) {
        let index = (hash >> (u64::BITS - UNIQ_PRECISION)) as usize;
        let rest = hash << UNIQ_PRECISION;
        let rank = if rest == 0 {
            MAX_RANK
        } else {
            (rest.leading_zeros() + 1).min(u32::from(MAX_RANK)) as u8
        };
        if rank > self.registers[index] {
            self.registers[index] = rank;
        }
    }

    fn raw_estimate(&self) -> f64 {
        let m = REGISTER_COUNT as f64;
        let alpha = 0.7213 / (1.0 + 1.079 / m);
        let harmonic: f64 = self
            .registers
            .iter()
            .map(|&r| 2f64.powi(-i32::from(r)))
            .sum();
        let estimate = alpha * m * m / harmonic;

        let zeros = self.registers.iter().filter(|&&r| r == 0).count();
        if estimate <= 2.5 * m && zeros > 0 {
            // linear counting in the small range
            m * (m / zeros as f64).ln()
        } else {
            estimate
        }
    }
}

impl Summary for UniqSummary {
    fn kind(&self) -> SummaryKind {
        SummaryKind::DistinctCount
    }

    fn update(&mut self, batch: &[Value]) {
        for hash in batch.iter().filter_map(hash_value) {
            self.insert_hash(hash);
        }
    }

    fn estimate_cardinality(&self) -> Result<u64> {
        Ok(self.raw_estimate().round() as u64)
    }

    fn serialize(&self, buf: &mut dyn BufMut) -> Result<()> {
        encode_state(
            buf,
            &UniqState {
                registers: self.registers.clone(),
            },
        )
    }

    fn deserialize(&mut self, buf: &mut dyn Buf) -> Result<()> {
        let state: UniqState = decode_state(buf)?;
        if state.registers.len() != REGISTER_COUNT
            || state.registers.iter().any(|&r| r > MAX_RANK)
        {
            return Err(Error::Corrupted(format!(
                "uniq sketch expects {REGISTER_COUNT} registers of rank <= {MAX_RANK}"
            )));
        }
        self.registers = state.registers;
        Ok(())
    }

    fn clone_box(&self) -> Box<dyn Summary> {
        Box::new(self.clone())
    }
}

/// Steps over one persisted sketch.
pub(super) fn skip(buf: &mut dyn Buf) -> Result<()> {
    decode_state::<UniqState>(buf).map(|_| ())
}
