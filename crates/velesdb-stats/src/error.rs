//! Error types for `VelesDB` column statistics.
//!
//! Errors fall into two disjoint classes (see [`ErrorClass`]):
//!
//! - **Internal**: a logic defect, such as asking a statistics kind for an
//!   estimate it cannot produce or registering a kind twice. These abort the
//!   current operation and should be reported.
//! - **User**: bad input from live schema operations or persisted data, such as
//!   an unknown statistics kind or an unknown file format version. The caller
//!   decides whether to reject the whole operation or skip the column.

use crate::summary::{Capability, SummaryKind};
use thiserror::Error;

/// Result type alias for statistics operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Class of an [`Error`], used by callers to tell defects from bad input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Programming error or broken internal invariant.
    Internal,
    /// Rejected request or unreadable persisted data.
    User,
}

/// Errors that can occur in statistics operations.
///
/// Error codes follow the pattern `STATS-XXX`.
#[derive(Error, Debug)]
pub enum Error {
    /// Statistics kind not known to the registry (STATS-001).
    #[error("[STATS-001] Unknown statistics kind '{kind}'. Available kinds: {available}")]
    UnknownStatisticsKind {
        /// Requested kind name.
        kind: String,
        /// Registered kinds, quoted and space-separated.
        available: String,
    },

    /// Statistics kind cannot be built over the column type (STATS-002).
    #[error("[STATS-002] Statistics of kind '{kind}' do not support type {data_type}")]
    IllegalStatistics {
        /// Statistics kind.
        kind: SummaryKind,
        /// Offending column data type.
        data_type: String,
    },

    /// Invalid statistics parameter (STATS-003).
    #[error("[STATS-003] Invalid parameter for statistics '{kind}': {message}")]
    InvalidParameter {
        /// Statistics kind.
        kind: SummaryKind,
        /// Validation message.
        message: String,
    },

    /// Statistics kind declared twice on a column (STATS-004).
    #[error("[STATS-004] Statistics kind '{kind}' already exists on column '{column}'")]
    DuplicateStatisticsKind {
        /// Column name.
        column: String,
        /// Duplicated kind.
        kind: SummaryKind,
    },

    /// Unknown column data type name (STATS-005).
    #[error("[STATS-005] Unknown data type '{0}'")]
    UnknownDataType(String),

    /// Persisted statistics use an unknown format version (STATS-006).
    #[error("[STATS-006] Unknown statistics file format version: {0}")]
    UnknownFormatVersion(u16),

    /// Persisted statistics are truncated or malformed (STATS-007).
    #[error("[STATS-007] Corrupted statistics payload: {0}")]
    Corrupted(String),

    /// Encoding a statistics payload failed (STATS-008).
    #[error("[STATS-008] Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (STATS-009).
    #[error("[STATS-009] Configuration error: {0}")]
    Config(String),

    /// IO error (STATS-010).
    #[error("[STATS-010] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Estimate requested from a kind lacking the capability (STATS-011).
    ///
    /// The container only calls capabilities a kind declares, so this
    /// indicates a logic defect.
    #[error("[STATS-011] {capability} estimation is not implemented for statistics '{kind}'")]
    UnsupportedEstimate {
        /// Statistics kind.
        kind: SummaryKind,
        /// Requested capability.
        capability: Capability,
    },

    /// A statistics kind was registered twice (STATS-012).
    #[error("[STATS-012] Statistics {role} for kind '{kind}' is not unique")]
    DuplicateRegistration {
        /// Statistics kind.
        kind: SummaryKind,
        /// "creator" or "validator".
        role: &'static str,
    },

    /// Internal error (STATS-013).
    ///
    /// Indicates an unexpected internal error. Please report if encountered.
    #[error("[STATS-013] Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns the error code (e.g., "STATS-001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UnknownStatisticsKind { .. } => "STATS-001",
            Self::IllegalStatistics { .. } => "STATS-002",
            Self::InvalidParameter { .. } => "STATS-003",
            Self::DuplicateStatisticsKind { .. } => "STATS-004",
            Self::UnknownDataType(_) => "STATS-005",
            Self::UnknownFormatVersion(_) => "STATS-006",
            Self::Corrupted(_) => "STATS-007",
            Self::Serialization(_) => "STATS-008",
            Self::Config(_) => "STATS-009",
            Self::Io(_) => "STATS-010",
            Self::UnsupportedEstimate { .. } => "STATS-011",
            Self::DuplicateRegistration { .. } => "STATS-012",
            Self::Internal(_) => "STATS-013",
        }
    }

    /// Returns the class of this error.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::UnsupportedEstimate { .. }
            | Self::DuplicateRegistration { .. }
            | Self::Internal(_) => ErrorClass::Internal,
            _ => ErrorClass::User,
        }
    }

    /// Returns true if this error is recoverable.
    ///
    /// Internal errors are never recoverable.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self.class(), ErrorClass::User)
    }

    pub(crate) fn unsupported(kind: SummaryKind, capability: Capability) -> Self {
        Self::UnsupportedEstimate { kind, capability }
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        match *err {
            bincode::ErrorKind::Io(io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
                Self::Corrupted("unexpected end of statistics payload".to_string())
            }
            other => Self::Corrupted(other.to_string()),
        }
    }
}

impl From<crate::config::ConfigError> for Error {
    fn from(err: crate::config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
