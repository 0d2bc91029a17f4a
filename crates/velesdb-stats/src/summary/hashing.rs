//! Stable 64-bit hashing of column values for the sketches.
//!
//! Numeric values hash through their `f64` form so that equal numbers carried
//! by different integer widths land in the same sketch cells. Hashes are
//! persisted implicitly (sketch cell positions), so this function must stay
//! stable across releases.

use crate::value::{try_convert_to_f64, try_convert_to_string, Value};
use rustc_hash::FxHasher;
use std::hash::Hasher;

/// Domain separator for string hashes.
const STRING_DOMAIN: u64 = 0x9E37_79B9_7F4A_7C15;

/// Hashes a value, or returns `None` for NULL.
pub(crate) fn hash_value(value: &Value) -> Option<u64> {
    if let Some(v) = try_convert_to_f64(value) {
        return Some(hash_f64(v));
    }
    if let Some(s) = try_convert_to_string(value) {
        return Some(hash_str(s));
    }
    match value {
        Value::Bool(b) => Some(hash_f64(f64::from(u8::from(*b)))),
        _ => None,
    }
}

fn hash_f64(v: f64) -> u64 {
    let bits = if v == 0.0 {
        // +0.0 and -0.0 compare equal
        0
    } else if v.is_nan() {
        f64::NAN.to_bits()
    } else {
        v.to_bits()
    };
    fmix64(bits)
}

fn hash_str(s: &str) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write_u64(STRING_DOMAIN);
    hasher.write(s.as_bytes());
    hasher.write_usize(s.len());
    fmix64(hasher.finish())
}

/// MurmurHash3 64-bit finalizer.
pub(crate) fn fmix64(mut k: u64) -> u64 {
    k ^= k >> 33;
    k = k.wrapping_mul(0xff51_afd7_ed55_8ccd);
    k ^= k >> 33;
    k = k.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    k ^= k >> 33;
    k
}
