//! Content-addressed result cache
//!
//! Results are keyed by a digest of the technology record that produced
//! them, so identical inputs share one entry. There is no per-key lock: two
//! concurrent misses on one key both compute and both write, and since the
//! result is a pure function of the record the second write is identical to
//! the first.

use crate::error::{CacheError, CacheResult};
use crate::store::CacheStore;
use crate::wire::{CachedResult, Manifest, RESULT_PATH_PREFIX};
use dd_catalog::TechnologyRecord;
use dd_params::CacheKey;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of entries in the backing store
    pub entry_count: u64,
    /// Reads that found a value
    pub hits: u64,
    /// Reads that found nothing
    pub misses: u64,
}

/// Typed cache of technology results and commit manifests
#[derive(Debug)]
pub struct ContentCache {
    store: Arc<dyn CacheStore>,
    exempt_fields: BTreeSet<String>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ContentCache {
    /// Create cache over a store
    #[must_use]
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            exempt_fields: BTreeSet::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Leave these legacy fields out of record keys
    #[must_use]
    pub fn with_exempt_fields(mut self, fields: impl IntoIterator<Item = String>) -> Self {
        self.exempt_fields.extend(fields);
        self
    }

    /// Backing store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Fields excluded from record keys
    #[inline]
    #[must_use]
    pub fn exempt_fields(&self) -> &BTreeSet<String> {
        &self.exempt_fields
    }

    /// Digest of a record, ignoring exempt fields
    ///
    /// Fields are serialized in sorted order, so the key does not depend on
    /// the order they were inserted in.
    ///
    /// # Errors
    /// Returns error if the record cannot be serialized
    pub fn key_for(&self, record: &TechnologyRecord) -> CacheResult<CacheKey> {
        let canonical = record.without(&self.exempt_fields);
        Ok(CacheKey::compute_serializable(&canonical)?)
    }

    /// Key of a workbook commit's manifest
    #[must_use]
    pub fn commit_key(workbook_id: &str, commit: &str) -> CacheKey {
        CacheKey::compute(format!("workbook/{workbook_id}/commit/{commit}").as_bytes())
    }

    /// Resource path a cached result is served from
    #[must_use]
    pub fn result_path(key: &CacheKey) -> String {
        format!("{RESULT_PATH_PREFIX}/{key}")
    }

    /// Key a result path was built from, if `path` is one
    #[must_use]
    pub fn result_key(path: &str) -> Option<CacheKey> {
        path.strip_prefix(RESULT_PATH_PREFIX)?
            .strip_prefix('/')?
            .parse()
            .ok()
    }

    /// Check that every result a manifest points at is still stored
    ///
    /// A store with capacity or TTL eviction can drop results while the
    /// manifest naming them survives.
    ///
    /// # Errors
    /// Returns error if the store fails
    pub async fn manifest_is_live(&self, manifest: &Manifest) -> CacheResult<bool> {
        for entry in manifest {
            let Some(key) = Self::result_key(&entry.path) else {
                return Ok(false);
            };
            if self.store.get(&key.to_string()).await?.is_none() {
                trace!(path = %entry.path, "manifest entry no longer stored");
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Read a technology result
    ///
    /// # Errors
    /// Returns error if the store fails or the stored value does not decode
    pub async fn get_result(&self, key: &CacheKey) -> CacheResult<Option<CachedResult>> {
        self.get_json(key).await
    }

    /// Store a technology result
    ///
    /// # Errors
    /// Returns error if the store fails
    pub async fn set_result(&self, key: &CacheKey, result: &CachedResult) -> CacheResult<()> {
        self.set_json(key, result).await
    }

    /// Read a commit manifest
    ///
    /// # Errors
    /// Returns error if the store fails or the stored value does not decode
    pub async fn get_manifest(&self, key: &CacheKey) -> CacheResult<Option<Manifest>> {
        self.get_json(key).await
    }

    /// Store a commit manifest
    ///
    /// # Errors
    /// Returns error if the store fails
    pub async fn set_manifest(&self, key: &CacheKey, manifest: &Manifest) -> CacheResult<()> {
        self.set_json(key, manifest).await
    }

    /// Get cache statistics
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.store.entry_count(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &CacheKey) -> CacheResult<Option<T>> {
        let key = key.to_string();
        let Some(raw) = self.store.get(&key).await? else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            trace!(key = %key, "cache miss");
            return Ok(None);
        };
        self.hits.fetch_add(1, Ordering::Relaxed);
        trace!(key = %key, "cache hit");
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| CacheError::Decode { key, source })
    }

    async fn set_json<T: Serialize + ?Sized>(&self, key: &CacheKey, value: &T) -> CacheResult<()> {
        let key = key.to_string();
        let raw = serde_json::to_string(value).map_err(|source| CacheError::Encode {
            key: key.clone(),
            source,
        })?;
        self.store.set(&key, raw).await
    }
}
