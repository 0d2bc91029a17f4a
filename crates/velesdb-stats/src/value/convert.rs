//! Literal normalization used by every estimation path.

use super::Value;

/// Converts a numeric literal to `f64`.
///
/// Succeeds for every integer width and for floats; returns `None` for null,
/// booleans and strings. Wide integers round to the nearest `f64`.
#[must_use]
pub fn try_convert_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Int64(v) => Some(*v as f64),
        Value::UInt64(v) => Some(*v as f64),
        Value::Int128(v) => Some(*v as f64),
        Value::UInt128(v) => Some(*v as f64),
        Value::Int256(v) => Some(v.to_f64()),
        Value::UInt256(v) => Some(v.to_f64()),
        Value::Float64(v) => Some(*v),
        Value::Null | Value::Bool(_) | Value::String(_) => None,
    }
}

/// Position of a value on a numeric axis.
///
/// Like [`try_convert_to_f64`], but booleans count as 0 and 1, matching how
/// they hash. Histograms use this for both column values and literals.
pub(crate) fn numeric_point(value: &Value) -> Option<f64> {
    match value {
        Value::Bool(b) => Some(f64::from(u8::from(*b))),
        other => try_convert_to_f64(other),
    }
}

/// Borrows the string payload of a string literal.
#[must_use]
pub fn try_convert_to_string(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s.as_str()),
        _ => None,
    }
}
