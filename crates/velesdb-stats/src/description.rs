//! Declarative statistics descriptions attached to columns.
//!
//! A [`ColumnSummaryDescription`] is what the schema layer stores for a
//! column declared with e.g. `STATISTICS(tdigest, uniq)`. It lives as long as
//! the schema and is the input the registry builds containers from.

use crate::error::{Error, Result};
use crate::summary::SummaryKind;
use crate::value::DataType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration of one statistics kind on one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleSummaryDescriptor {
    kind: SummaryKind,
    params: BTreeMap<String, u64>,
}

impl SingleSummaryDescriptor {
    /// Creates a descriptor with no parameters.
    #[must_use]
    pub fn new(kind: SummaryKind) -> Self {
        Self {
            kind,
            params: BTreeMap::new(),
        }
    }

    /// Sets a kind-specific parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: u64) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    /// Statistics kind.
    #[must_use]
    pub fn kind(&self) -> SummaryKind {
        self.kind
    }

    /// Value of a parameter, if set.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<u64> {
        self.params.get(name).copied()
    }

    /// All parameters by name.
    #[must_use]
    pub fn params(&self) -> &BTreeMap<String, u64> {
        &self.params
    }
}

/// Statistics declared on one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSummaryDescription {
    column_name: String,
    data_type: DataType,
    kinds: BTreeMap<SummaryKind, SingleSummaryDescriptor>,
}

impl ColumnSummaryDescription {
    /// Creates a description without statistics.
    #[must_use]
    pub fn new(column_name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            column_name: column_name.into(),
            data_type,
            kinds: BTreeMap::new(),
        }
    }

    /// Builds a description from declaration names such as `["tdigest", "uniq"]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownStatisticsKind`] for an unknown name and
    /// [`Error::DuplicateStatisticsKind`] for a repeated one.
    pub fn from_kind_names<S: AsRef<str>>(
        column_name: impl Into<String>,
        data_type: DataType,
        names: &[S],
    ) -> Result<Self> {
        let mut description = Self::new(column_name, data_type);
        for name in names {
            let kind = name.as_ref().parse::<SummaryKind>()?;
            description.add_kind(SingleSummaryDescriptor::new(kind))?;
        }
        Ok(description)
    }

    /// Adds a kind, builder style. A repeated kind replaces the previous one.
    #[must_use]
    pub fn with_kind(mut self, descriptor: SingleSummaryDescriptor) -> Self {
        self.kinds.insert(descriptor.kind(), descriptor);
        self
    }

    /// Adds a kind.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateStatisticsKind`] if the kind is already declared.
    pub fn add_kind(&mut self, descriptor: SingleSummaryDescriptor) -> Result<()> {
        let kind = descriptor.kind();
        if self.kinds.contains_key(&kind) {
            return Err(Error::DuplicateStatisticsKind {
                column: self.column_name.clone(),
                kind,
            });
        }
        self.kinds.insert(kind, descriptor);
        Ok(())
    }

    /// Merges the kinds of `other` into `self` (`ALTER ... ADD STATISTICS`).
    ///
    /// With `if_not_exists`, kinds already declared are kept as they are;
    /// otherwise they are an error and nothing is merged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateStatisticsKind`] on conflict.
    pub fn merge(&mut self, other: &ColumnSummaryDescription, if_not_exists: bool) -> Result<()> {
        if !if_not_exists {
            if let Some(kind) = other.kinds.keys().find(|k| self.kinds.contains_key(k)) {
                return Err(Error::DuplicateStatisticsKind {
                    column: self.column_name.clone(),
                    kind: *kind,
                });
            }
        }
        for (kind, descriptor) in &other.kinds {
            self.kinds
                .entry(*kind)
                .or_insert_with(|| descriptor.clone());
        }
        Ok(())
    }

    /// Removes a kind, returning its descriptor if it was declared.
    pub fn remove_kind(&mut self, kind: SummaryKind) -> Option<SingleSummaryDescriptor> {
        self.kinds.remove(&kind)
    }

    /// Column name.
    #[must_use]
    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    /// Column data type.
    #[must_use]
    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Declared kinds in ascending tag order.
    pub fn descriptors(&self) -> impl Iterator<Item = &SingleSummaryDescriptor> {
        self.kinds.values()
    }

    /// Returns true if `kind` is declared.
    #[must_use]
    pub fn contains(&self, kind: SummaryKind) -> bool {
        self.kinds.contains_key(&kind)
    }

    /// Returns true if no kind is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}
