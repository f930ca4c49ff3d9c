//! Flat legacy record consumed by the scenario calculator

use crate::error::RehydrateError;
use dd_params::Leaf;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Reporting window of a calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportYears {
    start: i32,
    end: i32,
}

impl ReportYears {
    /// Create a reporting window
    ///
    /// # Errors
    /// Returns [`RehydrateError::InvalidYears`] unless `start < end`
    pub fn new(start: i32, end: i32) -> Result<Self, RehydrateError> {
        if start < end {
            Ok(Self { start, end })
        } else {
            Err(RehydrateError::InvalidYears { start, end })
        }
    }

    #[inline]
    #[must_use]
    pub const fn start(&self) -> i32 {
        self.start
    }

    #[inline]
    #[must_use]
    pub const fn end(&self) -> i32 {
        self.end
    }
}

/// Rehydrated parameters of one technology
///
/// Serializes flat: the legacy fields sit next to `technology` and the
/// report years, which is the shape the calculator reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnologyRecord {
    pub technology: String,
    pub report_start_year: i32,
    pub report_end_year: i32,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Leaf>,
}

impl TechnologyRecord {
    /// Create a record with no fields
    #[must_use]
    pub fn new(technology: impl Into<String>, years: ReportYears) -> Self {
        Self {
            technology: technology.into(),
            report_start_year: years.start(),
            report_end_year: years.end(),
            fields: BTreeMap::new(),
        }
    }

    /// Check whether no legacy field was found
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Legacy field value
    #[inline]
    #[must_use]
    pub fn get(&self, legacy: &str) -> Option<&Leaf> {
        self.fields.get(legacy)
    }

    /// Set a legacy field, replacing any previous value
    pub fn insert(&mut self, legacy: impl Into<String>, value: Leaf) {
        self.fields.insert(legacy.into(), value);
    }

    /// Copy of the record without the named fields
    #[must_use]
    pub fn without(&self, excluded: &BTreeSet<String>) -> Self {
        Self {
            technology: self.technology.clone(),
            report_start_year: self.report_start_year,
            report_end_year: self.report_end_year,
            fields: self
                .fields
                .iter()
                .filter(|(name, _)| !excluded.contains(*name))
                .map(|(name, leaf)| (name.clone(), leaf.clone()))
                .collect(),
        }
    }
}
