//! Core configuration
//!
//! Authored as TOML; every key is optional.
//!
//! ```toml
//! cache_capacity = 50000
//! cache_ttl_secs = 86400
//! excluded_technologies = ["fossilfuelelectricity"]
//! default_regions = ["World", "OECD90", "China"]
//! exempt_fields = ["ref_adoption_data"]
//! ```

use crate::error::ConfigError;
use dd_cache::{CacheStore, ContentCache, MokaStore};
use dd_catalog::Catalog;
use dd_params::{Branch, Node, Region};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Baseline technology every calculation skips
pub const DISPLACED_BASELINE: &str = "fossilfuelelectricity";

/// Core configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Maximum cached entries
    pub cache_capacity: u64,
    /// Entry lifetime; `None` keeps entries until evicted
    pub cache_ttl_secs: Option<u64>,
    /// Technologies never calculated
    pub excluded_technologies: BTreeSet<String>,
    /// Regions reported when a workbook names none
    pub default_regions: Vec<Region>,
    /// Legacy fields left out of cache keys, on top of the catalog's own
    pub exempt_fields: BTreeSet<String>,
}

impl CoreConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse TOML configuration
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] if the text is not valid config TOML
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load TOML configuration from a file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// With cache capacity
    #[inline]
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// With cache entry lifetime
    #[inline]
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl_secs = Some(ttl.as_secs());
        self
    }

    /// With one more excluded technology
    #[inline]
    #[must_use]
    pub fn with_excluded_technology(mut self, technology: impl Into<String>) -> Self {
        self.excluded_technologies.insert(technology.into());
        self
    }

    /// With default regions
    #[inline]
    #[must_use]
    pub fn with_default_regions(mut self, regions: Vec<Region>) -> Self {
        self.default_regions = regions;
        self
    }

    #[inline]
    #[must_use]
    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs.map(Duration::from_secs)
    }

    /// Check whether a technology is skipped by calculations
    #[inline]
    #[must_use]
    pub fn is_excluded(&self, technology: &str) -> bool {
        self.excluded_technologies.contains(technology)
    }

    /// Technologies listed in a scenario tree, minus excluded ones
    #[must_use]
    pub fn calculated_technologies<'a>(&self, scenario: &'a Branch) -> Vec<&'a str> {
        match scenario.get("technologies") {
            Some(Node::Branch(technologies)) => technologies
                .keys()
                .map(String::as_str)
                .filter(|t| !self.is_excluded(t))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Build the in-process store these settings describe
    #[must_use]
    pub fn build_store(&self) -> Arc<dyn CacheStore> {
        match self.cache_ttl() {
            Some(ttl) => Arc::new(MokaStore::with_ttl(self.cache_capacity, ttl)),
            None => Arc::new(MokaStore::new(self.cache_capacity)),
        }
    }

    /// Content cache over `store`, exempting catalog and configured fields
    #[must_use]
    pub fn content_cache(&self, store: Arc<dyn CacheStore>, catalog: &Catalog) -> ContentCache {
        ContentCache::new(store)
            .with_exempt_fields(catalog.cache_exempt_fields())
            .with_exempt_fields(self.exempt_fields.iter().cloned())
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 10_000,
            cache_ttl_secs: None,
            excluded_technologies: BTreeSet::from([DISPLACED_BASELINE.to_string()]),
            default_regions: vec![Region::World],
            exempt_fields: BTreeSet::new(),
        }
    }
}
