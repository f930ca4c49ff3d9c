//! Error types for the calculation core
//!
//! Resource failures abort a whole request and map to a client error.
//! Validation rejections are not errors at all; see
//! [`dd_validation::ValidationOutcome`].

use dd_cache::CacheError;
use dd_catalog::{CatalogError, RehydrateError};
use dd_params::TreeError;
use std::path::PathBuf;

/// Main core error type
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Resource absent at the given path
    #[error("{what} not found: {path}")]
    NotFound { what: &'static str, path: String },

    /// Resource present but not of the expected shape
    #[error("invalid {what} at {path}: {message}")]
    InvalidResource {
        what: &'static str,
        path: String,
        message: String,
    },

    /// Fetch backend failed
    #[error("fetch failed for {path}: {message}")]
    Fetch { path: String, message: String },

    /// Parameter tree malformed
    #[error("parameter tree error: {0}")]
    Tree(#[from] TreeError),

    /// Rehydration input rejected
    #[error("rehydration error: {0}")]
    Rehydrate(#[from] RehydrateError),

    /// Catalog failed to load
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Cache read or write failed
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    /// Scenario calculator failed for a technology
    #[error("calculation failed for {technology}: {message}")]
    Calculation { technology: String, message: String },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl CoreError {
    /// Create not-found error
    pub fn not_found(what: &'static str, path: impl Into<String>) -> Self {
        Self::NotFound {
            what,
            path: path.into(),
        }
    }

    /// Create invalid-resource error
    pub fn invalid_resource(
        what: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidResource {
            what,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create calculation error
    pub fn calculation(technology: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Calculation {
            technology: technology.into(),
            message: message.into(),
        }
    }

    /// Check if the caller supplied something missing or malformed
    #[inline]
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::InvalidResource { .. }
                | Self::Tree(_)
                | Self::Rehydrate(_)
        )
    }

    /// Transport status: 400 for client errors, 500 otherwise
    #[inline]
    #[must_use]
    pub fn status_code(&self) -> u16 {
        if self.is_client_error() {
            400
        } else {
            500
        }
    }
}

/// Failure to read one data field of a scenario
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SerializationError {
    /// Field is not among the scenario's data fields
    #[error("unknown data field '{0}'")]
    UnknownField(String),

    /// Reading the field failed
    #[error("failed to read '{field}': {message}")]
    Unreadable { field: String, message: String },
}

impl SerializationError {
    /// Create unreadable-field error
    pub fn unreadable(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unreadable {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config text is not valid TOML for the config schema
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;
