//! Statistics registry: validation and construction of statistics kinds.
//!
//! The registry maps each [`SummaryKind`] to a validator (run by the schema
//! pipeline when statistics are declared) and a creator (run when a part is
//! written or reopened).
//!
//! # Process-wide instance
//!
//! Services call [`initialize_registry`] once during startup, before any
//! concurrent use. Afterwards [`registry`] hands out a shared, immutable
//! reference that any number of threads may query without locking.
//!
//! ```rust,ignore
//! use velesdb_stats::{initialize_registry, registry, StatsConfig};
//!
//! initialize_registry(&StatsConfig::default())?;
//! let stats = registry()?.get(&description)?;
//! ```

use crate::column_statistics::ColumnStatistics;
use crate::config::{StatsConfig, SummaryDefaults};
use crate::description::{ColumnSummaryDescription, SingleSummaryDescriptor};
use crate::error::{Error, Result};
use crate::selectivity::EstimationFactors;
#[cfg(feature = "count-min-sketch")]
use crate::summary::CountMinSummary;
use crate::summary::{Summary, SummaryKind, TDigestSummary, UniqSummary};
use crate::value::DataType;
use rustc_hash::FxHashMap;
use std::sync::OnceLock;

/// Checks a statistics declaration against the column type.
pub type Validator = fn(&SingleSummaryDescriptor, &DataType) -> Result<()>;

/// Builds an empty statistics object for a declaration.
pub type Creator =
    fn(&SingleSummaryDescriptor, &DataType, &SummaryDefaults) -> Result<Box<dyn Summary>>;

static REGISTRY: OnceLock<StatisticsRegistry> = OnceLock::new();

/// Builds the process-wide registry with every built-in kind.
///
/// Idempotent: later calls return the instance built by the first one and
/// ignore their `config`.
///
/// # Errors
///
/// Returns an internal error if the built-in kinds fail to register.
pub fn initialize_registry(config: &StatsConfig) -> Result<&'static StatisticsRegistry> {
    if let Some(registry) = REGISTRY.get() {
        tracing::debug!("statistics registry already initialized");
        return Ok(registry);
    }
    let built = StatisticsRegistry::with_builtin_kinds(config)?;
    let registry = REGISTRY.get_or_init(|| built);
    tracing::info!(
        kinds = %registry.available_kinds(),
        "statistics registry initialized"
    );
    Ok(registry)
}

/// Returns the process-wide registry.
///
/// # Errors
///
/// Returns an internal error if [`initialize_registry`] has not run yet.
pub fn registry() -> Result<&'static StatisticsRegistry> {
    REGISTRY.get().ok_or_else(|| {
        Error::Internal("statistics registry used before initialize_registry()".to_string())
    })
}

/// Returns true once [`initialize_registry`] has completed.
#[must_use]
pub fn is_registry_initialized() -> bool {
    REGISTRY.get().is_some()
}

/// Registry of statistics kinds.
#[derive(Debug, Clone)]
pub struct StatisticsRegistry {
    creators: FxHashMap<SummaryKind, Creator>,
    validators: FxHashMap<SummaryKind, Validator>,
    defaults: SummaryDefaults,
    factors: EstimationFactors,
}

impl StatisticsRegistry {
    /// Creates a registry without any kind.
    #[must_use]
    pub fn new(config: &StatsConfig) -> Self {
        Self {
            creators: FxHashMap::default(),
            validators: FxHashMap::default(),
            defaults: config.summaries,
            factors: config.estimation_factors(),
        }
    }

    /// Creates a registry with every built-in kind of this build.
    ///
    /// # Errors
    ///
    /// Returns an internal error if a kind registers twice.
    pub fn with_builtin_kinds(config: &StatsConfig) -> Result<Self> {
        let mut registry = Self::new(config);

        registry.register_validator(SummaryKind::Histogram, tdigest_validator)?;
        registry.register_creator(SummaryKind::Histogram, tdigest_creator)?;

        registry.register_validator(SummaryKind::DistinctCount, uniq_validator)?;
        registry.register_creator(SummaryKind::DistinctCount, uniq_creator)?;

        #[cfg(feature = "count-min-sketch")]
        {
            registry.register_validator(SummaryKind::FrequencySketch, count_min_validator)?;
            registry.register_creator(SummaryKind::FrequencySketch, count_min_creator)?;
        }

        Ok(registry)
    }

    /// Registers the creator of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateRegistration`] if `kind` already has one.
    pub fn register_creator(&mut self, kind: SummaryKind, creator: Creator) -> Result<()> {
        if self.creators.contains_key(&kind) {
            return Err(Error::DuplicateRegistration {
                kind,
                role: "creator",
            });
        }
        self.creators.insert(kind, creator);
        Ok(())
    }

    /// Registers the validator of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateRegistration`] if `kind` already has one.
    pub fn register_validator(&mut self, kind: SummaryKind, validator: Validator) -> Result<()> {
        if self.validators.contains_key(&kind) {
            return Err(Error::DuplicateRegistration {
                kind,
                role: "validator",
            });
        }
        self.validators.insert(kind, validator);
        Ok(())
    }

    /// Validates every kind declared in `description` against `data_type`.
    ///
    /// # Errors
    ///
    /// Returns the validator's user error for a rejected declaration, or an
    /// internal error for a kind without validator (declarations are checked
    /// against the registry before reaching this point).
    pub fn validate(
        &self,
        description: &ColumnSummaryDescription,
        data_type: &DataType,
    ) -> Result<()> {
        for descriptor in description.descriptors() {
            let validator = self.validators.get(&descriptor.kind()).ok_or_else(|| {
                Error::Internal(format!("Unknown statistics kind '{}'", descriptor.kind()))
            })?;
            validator(descriptor, data_type)?;
        }
        Ok(())
    }

    /// Builds an empty container for `description`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownStatisticsKind`] for a kind this registry does
    /// not know, or the creator's error.
    pub fn get(&self, description: &ColumnSummaryDescription) -> Result<ColumnStatistics> {
        let mut stats = ColumnStatistics::new(description.clone(), self.factors);
        for descriptor in description.descriptors() {
            let creator =
                self.creators
                    .get(&descriptor.kind())
                    .ok_or_else(|| Error::UnknownStatisticsKind {
                        kind: descriptor.kind().to_string(),
                        available: self.available_kinds(),
                    })?;
            stats.insert_summary(creator(descriptor, description.data_type(), &self.defaults)?);
        }
        tracing::debug!(
            column = description.column_name(),
            kinds = stats.kinds().count(),
            "built column statistics"
        );
        Ok(stats)
    }

    /// Builds one container per column declaring statistics, in column order.
    ///
    /// # Errors
    ///
    /// Returns the first error of [`get`](Self::get).
    pub fn get_many(&self, columns: &[ColumnSummaryDescription]) -> Result<Vec<ColumnStatistics>> {
        columns
            .iter()
            .filter(|column| !column.is_empty())
            .map(|column| self.get(column))
            .collect()
    }

    /// Returns true if `kind` can be built.
    #[must_use]
    pub fn contains(&self, kind: SummaryKind) -> bool {
        self.creators.contains_key(&kind)
    }

    /// Estimation factors handed to built containers.
    #[must_use]
    pub fn factors(&self) -> &EstimationFactors {
        &self.factors
    }

    /// Registered kinds as `'name'` list, ascending.
    #[must_use]
    pub fn available_kinds(&self) -> String {
        SummaryKind::ALL
            .iter()
            .filter(|kind| self.creators.contains_key(kind))
            .map(|kind| format!("'{kind}'"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn check_params(
    descriptor: &SingleSummaryDescriptor,
    allowed: &[(&str, u64, u64)],
) -> Result<()> {
    for (name, value) in descriptor.params() {
        let Some((_, min, max)) = allowed.iter().find(|(allowed, _, _)| allowed == name) else {
            return Err(Error::InvalidParameter {
                kind: descriptor.kind(),
                message: format!("unknown parameter '{name}'"),
            });
        };
        if !(*min..=*max).contains(value) {
            return Err(Error::InvalidParameter {
                kind: descriptor.kind(),
                message: format!("'{name}' = {value} is out of range [{min}, {max}]"),
            });
        }
    }
    Ok(())
}

fn param_or(descriptor: &SingleSummaryDescriptor, name: &str, default: usize) -> usize {
    descriptor
        .param(name)
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(default)
}

fn illegal(descriptor: &SingleSummaryDescriptor, data_type: &DataType) -> Error {
    Error::IllegalStatistics {
        kind: descriptor.kind(),
        data_type: data_type.to_string(),
    }
}

const TDIGEST_PARAMS: &[(&str, u64, u64)] = &[("max_centroids", 16, 65_536)];
const COUNT_MIN_PARAMS: &[(&str, u64, u64)] = &[("width", 16, 1_048_576), ("depth", 1, 32)];

fn tdigest_validator(descriptor: &SingleSummaryDescriptor, data_type: &DataType) -> Result<()> {
    if !data_type.is_value_represented_by_number() {
        return Err(illegal(descriptor, data_type));
    }
    check_params(descriptor, TDIGEST_PARAMS)
}

fn tdigest_creator(
    descriptor: &SingleSummaryDescriptor,
    _data_type: &DataType,
    defaults: &SummaryDefaults,
) -> Result<Box<dyn Summary>> {
    let max_centroids = param_or(descriptor, "max_centroids", defaults.tdigest_max_centroids);
    Ok(Box::new(TDigestSummary::new(max_centroids)))
}

fn uniq_validator(descriptor: &SingleSummaryDescriptor, data_type: &DataType) -> Result<()> {
    if !data_type.is_value_represented_by_number() && !data_type.is_string_like() {
        return Err(illegal(descriptor, data_type));
    }
    check_params(descriptor, &[])
}

fn uniq_creator(
    _descriptor: &SingleSummaryDescriptor,
    _data_type: &DataType,
    _defaults: &SummaryDefaults,
) -> Result<Box<dyn Summary>> {
    Ok(Box::new(UniqSummary::new()))
}

#[cfg(feature = "count-min-sketch")]
fn count_min_validator(descriptor: &SingleSummaryDescriptor, data_type: &DataType) -> Result<()> {
    if !data_type.is_value_represented_by_number() && !data_type.is_string_like() {
        return Err(illegal(descriptor, data_type));
    }
    check_params(descriptor, COUNT_MIN_PARAMS)
}

#[cfg(feature = "count-min-sketch")]
fn count_min_creator(
    descriptor: &SingleSummaryDescriptor,
    _data_type: &DataType,
    defaults: &SummaryDefaults,
) -> Result<Box<dyn Summary>> {
    let width = param_or(descriptor, "width", defaults.count_min_width);
    let depth = param_or(descriptor, "depth", defaults.count_min_depth);
    Ok(Box::new(CountMinSummary::new(width, depth)))
}
