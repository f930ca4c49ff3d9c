//! Error types for cache operations

use dd_params::HashError;

/// Errors raised by cache stores and the typed cache layer
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Backing store failed
    #[error("cache backend error: {0}")]
    Backend(String),

    /// Value could not be encoded for storage
    #[error("failed to encode cache value for {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Stored value is not what the reader expected
    #[error("failed to decode cache value for {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Cache key could not be computed
    #[error("cache key error: {0}")]
    Key(#[from] HashError),
}

impl CacheError {
    /// Create backend error
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;
