//! Error types for catalog loading and rehydration

use dd_params::PathTemplate;

/// Errors raised while loading or checking a catalog
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Catalog document is not valid YAML for the catalog schema
    #[error("catalog parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Two entries of one scope produce the same legacy field
    #[error("duplicate legacy field '{legacy}' in {scope} catalog")]
    DuplicateField { scope: &'static str, legacy: String },

    /// Entry is malformed (no shapes, bad technology restriction, ...)
    #[error("invalid {scope} catalog entry '{legacy}': {reason}")]
    InvalidEntry {
        scope: &'static str,
        legacy: String,
        reason: String,
    },

    /// Rule (or basis selector) points at a path no entry declares
    #[error("rule path '{path}' has no {scope} catalog entry")]
    UnknownRulePath {
        scope: &'static str,
        path: PathTemplate,
    },

    /// Enumeration constraint with no accepted values
    #[error("rule for '{0}' declares an empty value set")]
    EmptyValues(PathTemplate),
}

impl CatalogError {
    /// Create invalid entry error
    pub fn invalid_entry(
        scope: &'static str,
        legacy: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidEntry {
            scope,
            legacy: legacy.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by the legacy rehydrator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RehydrateError {
    /// Reporting window is empty or inverted
    #[error("invalid report years: start {start} must be before end {end}")]
    InvalidYears { start: i32, end: i32 },
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;
