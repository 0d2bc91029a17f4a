//! Logical column data types as seen by statistics validators.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Logical data type of a column.
///
/// Only the properties that statistics care about are modelled: whether the
/// value is represented by a number, whether it is string-like, and the
/// `Nullable` / `LowCardinality` wrappers that validators look through.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Boolean stored as `UInt8`.
    Bool,
    /// 8-bit signed integer.
    Int8,
    /// 16-bit signed integer.
    Int16,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 128-bit signed integer.
    Int128,
    /// 256-bit signed integer.
    Int256,
    /// 8-bit unsigned integer.
    UInt8,
    /// 16-bit unsigned integer.
    UInt16,
    /// 32-bit unsigned integer.
    UInt32,
    /// 64-bit unsigned integer.
    UInt64,
    /// 128-bit unsigned integer.
    UInt128,
    /// 256-bit unsigned integer.
    UInt256,
    /// 32-bit float.
    Float32,
    /// 64-bit float.
    Float64,
    /// Days since epoch.
    Date,
    /// Seconds since epoch.
    DateTime,
    /// Variable-length string.
    String,
    /// Fixed-length string of N bytes.
    FixedString(usize),
    /// Nullable wrapper.
    Nullable(Box<DataType>),
    /// Dictionary-encoded wrapper.
    LowCardinality(Box<DataType>),
}

impl DataType {
    /// Strips any `Nullable` and `LowCardinality` wrappers.
    #[must_use]
    pub fn inner(&self) -> &DataType {
        match self {
            Self::Nullable(inner) | Self::LowCardinality(inner) => inner.inner(),
            other => other,
        }
    }

    /// Returns true if values of this type are stored as numbers.
    #[must_use]
    pub fn is_value_represented_by_number(&self) -> bool {
        matches!(
            self.inner(),
            Self::Bool
                | Self::Int8
                | Self::Int16
                | Self::Int32
                | Self::Int64
                | Self::Int128
                | Self::Int256
                | Self::UInt8
                | Self::UInt16
                | Self::UInt32
                | Self::UInt64
                | Self::UInt128
                | Self::UInt256
                | Self::Float32
                | Self::Float64
                | Self::Date
                | Self::DateTime
        )
    }

    /// Returns true for `String` and `FixedString(N)`.
    #[must_use]
    pub fn is_string_like(&self) -> bool {
        matches!(self.inner(), Self::String | Self::FixedString(_))
    }

    /// Returns true if the type is wrapped in `Nullable`.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        match self {
            Self::Nullable(_) => true,
            Self::LowCardinality(inner) => inner.is_nullable(),
            _ => false,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FixedString(n) => write!(f, "FixedString({n})"),
            Self::Nullable(inner) => write!(f, "Nullable({inner})"),
            Self::LowCardinality(inner) => write!(f, "LowCardinality({inner})"),
            other => {
                let name = match other {
                    Self::Bool => "Bool",
                    Self::Int8 => "Int8",
                    Self::Int16 => "Int16",
                    Self::Int32 => "Int32",
                    Self::Int64 => "Int64",
                    Self::Int128 => "Int128",
                    Self::Int256 => "Int256",
                    Self::UInt8 => "UInt8",
                    Self::UInt16 => "UInt16",
                    Self::UInt32 => "UInt32",
                    Self::UInt64 => "UInt64",
                    Self::UInt128 => "UInt128",
                    Self::UInt256 => "UInt256",
                    Self::Float32 => "Float32",
                    Self::Float64 => "Float64",
                    Self::Date => "Date",
                    Self::DateTime => "DateTime",
                    _ => "String",
                };
                f.write_str(name)
            }
        }
    }
}

impl FromStr for DataType {
    type Err = Error;

    /// Parses type names such as `Int64`, `Nullable(String)` or
    /// `LowCardinality(Nullable(FixedString(16)))`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let unknown = || Error::UnknownDataType(s.to_string());

        if let Some((wrapper, rest)) = s.split_once('(') {
            let arg = rest.strip_suffix(')').ok_or_else(unknown)?;
            return match wrapper.trim() {
                "Nullable" => Ok(Self::Nullable(Box::new(arg.parse()?))),
                "LowCardinality" => Ok(Self::LowCardinality(Box::new(arg.parse()?))),
                "FixedString" => arg
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .map(Self::FixedString)
                    .ok_or_else(unknown),
                _ => Err(unknown()),
            };
        }

        let data_type = match s {
            "Bool" => Self::Bool,
            "Int8" => Self::Int8,
            "Int16" => Self::Int16,
            "Int32" => Self::Int32,
            "Int64" => Self::Int64,
            "Int128" => Self::Int128,
            "Int256" => Self::Int256,
            "UInt8" => Self::UInt8,
            "UInt16" => Self::UInt16,
            "UInt32" => Self::UInt32,
            "UInt64" => Self::UInt64,
            "UInt128" => Self::UInt128,
            "UInt256" => Self::UInt256,
            "Float32" => Self::Float32,
            "Float64" => Self::Float64,
            "Date" => Self::Date,
            "DateTime" => Self::DateTime,
            "String" => Self::String,
            _ => return Err(unknown()),
        };
        Ok(data_type)
    }
}
