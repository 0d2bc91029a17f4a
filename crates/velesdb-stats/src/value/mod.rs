//! Column values, logical data types and literal normalization.
//!
//! [`Value`] is the tagged literal handed to the estimators by the planner and
//! the unit in which column batches are fed to statistics. Estimation code
//! never inspects its variants directly: it asks the normalizer
//! ([`try_convert_to_f64`], [`try_convert_to_string`]) instead.

mod convert;
mod data_type;

#[cfg(test)]
mod tests;

pub use convert::{try_convert_to_f64, try_convert_to_string};
pub(crate) use convert::numeric_point;
pub use data_type::DataType;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 2^128 as a float, used to fold wide integers into `f64`.
const TWO_POW_128: f64 = 340_282_366_920_938_463_463_374_607_431_768_211_456.0;

/// Signed 256-bit integer stored as two's complement halves.
///
/// The value is `hi * 2^128 + lo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct I256 {
    /// High 128 bits (carries the sign).
    pub hi: i128,
    /// Low 128 bits.
    pub lo: u128,
}

impl I256 {
    /// Builds a value from its halves.
    #[must_use]
    pub const fn from_parts(hi: i128, lo: u128) -> Self {
        Self { hi, lo }
    }

    /// Nearest `f64` to this value.
    #[must_use]
    pub fn to_f64(self) -> f64 {
        let low = self.lo as i128;
        // values that fit in i128 would lose their sign to rounding below
        if (self.hi == 0 && low >= 0) || (self.hi == -1 && low < 0) {
            return low as f64;
        }
        self.hi as f64 * TWO_POW_128 + self.lo as f64
    }
}

impl From<i128> for I256 {
    fn from(v: i128) -> Self {
        // sign-extend into the high half
        Self {
            hi: if v < 0 { -1 } else { 0 },
            lo: v as u128,
        }
    }
}

/// Unsigned 256-bit integer stored as two halves.
///
/// The value is `hi * 2^128 + lo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct U256 {
    /// High 128 bits.
    pub hi: u128,
    /// Low 128 bits.
    pub lo: u128,
}

impl U256 {
    /// Builds a value from its halves.
    #[must_use]
    pub const fn from_parts(hi: u128, lo: u128) -> Self {
        Self { hi, lo }
    }

    /// Nearest `f64` to this value.
    #[must_use]
    pub fn to_f64(self) -> f64 {
        self.hi as f64 * TWO_POW_128 + self.lo as f64
    }
}

impl From<u128> for U256 {
    fn from(v: u128) -> Self {
        Self { hi: 0, lo: v }
    }
}

/// Error for text that is not a decimal integer in range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid 256-bit integer literal '{0}'")]
pub struct ParseWideIntError(String);

/// Parses an unsigned decimal magnitude into `(hi, lo)` halves.
fn parse_magnitude(digits: &str) -> Option<(u128, u128)> {
    const LOW_MASK: u128 = u64::MAX as u128;
    if digits.is_empty() {
        return None;
    }
    digits.bytes().try_fold((0_u128, 0_u128), |(hi, lo), byte| {
        let digit = char::from(byte).to_digit(10)?;
        // lo * 10 split at 64 bits so the carry into hi is exact
        let low_part = (lo & LOW_MASK) * 10;
        let high_part = (lo >> 64) * 10;
        let (sum, c1) = low_part.overflowing_add(high_part << 64);
        let (sum, c2) = sum.overflowing_add(u128::from(digit));
        let carry = (high_part >> 64) + u128::from(c1) + u128::from(c2);
        let hi = hi.checked_mul(10)?.checked_add(carry)?;
        Some((hi, sum))
    })
}

impl FromStr for U256 {
    type Err = ParseWideIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix('+').unwrap_or(s);
        parse_magnitude(digits)
            .map(|(hi, lo)| Self { hi, lo })
            .ok_or_else(|| ParseWideIntError(s.to_string()))
    }
}

impl FromStr for I256 {
    type Err = ParseWideIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const SIGN_BIT: u128 = 1 << 127;
        let err = || ParseWideIntError(s.to_string());
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let (hi, lo) = parse_magnitude(digits).ok_or_else(err)?;

        if !negative {
            if hi >= SIGN_BIT {
                return Err(err());
            }
            return Ok(Self { hi: hi as i128, lo });
        }
        if hi > SIGN_BIT || (hi == SIGN_BIT && lo != 0) {
            return Err(err());
        }
        // two's complement negation across both halves
        let lo = (!lo).wrapping_add(1);
        let hi = (!hi).wrapping_add(u128::from(lo == 0));
        Ok(Self { hi: hi as i128, lo })
    }
}

/// A tagged column value or predicate literal.
///
/// Narrow integer types are widened into the 64-bit variants.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Value {
    /// SQL NULL.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer up to 64 bits.
    Int64(i64),
    /// Unsigned integer up to 64 bits.
    UInt64(u64),
    /// Signed 128-bit integer.
    Int128(i128),
    /// Unsigned 128-bit integer.
    UInt128(u128),
    /// Signed 256-bit integer.
    Int256(I256),
    /// Unsigned 256-bit integer.
    UInt256(U256),
    /// Floating point number.
    Float64(f64),
    /// UTF-8 string.
    String(String),
}

impl Value {
    /// Returns true for [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

macro_rules! impl_from_value {
    ($variant:ident, $target:ty, $($source:ty),+) => {
        $(
            impl From<$source> for Value {
                fn from(v: $source) -> Self {
                    Self::$variant(<$target>::from(v))
                }
            }
        )+
    };
}

impl_from_value!(Int64, i64, i8, i16, i32, i64);
impl_from_value!(UInt64, u64, u8, u16, u32, u64);
impl_from_value!(Float64, f64, f32, f64);
impl_from_value!(Int128, i128, i128);
impl_from_value!(UInt128, u128, u128);
impl_from_value!(Int256, I256, I256);
impl_from_value!(UInt256, U256, U256);
impl_from_value!(Bool, bool, bool);
impl_from_value!(String, String, String, &str);

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
