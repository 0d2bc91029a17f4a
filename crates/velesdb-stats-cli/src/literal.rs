//! Parsing of textual column values into statistics literals.

use thiserror::Error;
use velesdb_stats::{DataType, Value, I256, U256};

/// Error for a value that does not fit the column type.
#[derive(Debug, Error)]
#[error("cannot parse '{text}' as {data_type}")]
pub struct LiteralError {
    text: String,
    data_type: String,
}

/// Parses one value of `data_type`.
///
/// `NULL` and `\N` are null for every type; an empty line is null unless
/// the column is string-like.
pub fn parse_literal(text: &str, data_type: &DataType) -> Result<Value, LiteralError> {
    let inner = data_type.inner();
    if text == "NULL" || text == "\\N" || (text.is_empty() && !inner.is_string_like()) {
        return Ok(Value::Null);
    }

    let err = || LiteralError {
        text: text.to_string(),
        data_type: data_type.to_string(),
    };
    let trimmed = text.trim();

    let value = match inner {
        DataType::String | DataType::FixedString(_) => Value::from(text),
        DataType::Bool => match trimmed {
            "true" | "1" => Value::Bool(true),
            "false" | "0" => Value::Bool(false),
            _ => return Err(err()),
        },
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::Date
        | DataType::DateTime => Value::from(trimmed.parse::<i64>().map_err(|_| err())?),
        DataType::Int128 => Value::from(trimmed.parse::<i128>().map_err(|_| err())?),
        DataType::Int256 => Value::from(trimmed.parse::<I256>().map_err(|_| err())?),
        DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => {
            Value::from(trimmed.parse::<u64>().map_err(|_| err())?)
        }
        DataType::UInt128 => Value::from(trimmed.parse::<u128>().map_err(|_| err())?),
        DataType::UInt256 => Value::from(trimmed.parse::<U256>().map_err(|_| err())?),
        DataType::Float32 | DataType::Float64 => {
            Value::from(trimmed.parse::<f64>().map_err(|_| err())?)
        }
        DataType::Nullable(_) | DataType::LowCardinality(_) => return Err(err()),
    };
    Ok(value)
}
