//! Key-value stores behind the content cache
//!
//! The cache talks to its backing store only through [`CacheStore`]: plain
//! string keys, UTF-8 JSON values. Individual operations are assumed to be
//! serialized by the store; nothing spans two operations.

use crate::error::CacheResult;
use async_trait::async_trait;
use dashmap::DashMap;
use moka::future::Cache;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Shared string key-value store
#[async_trait]
pub trait CacheStore: Send + Sync + Debug {
    /// Read a value
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Write a value, replacing any previous one
    async fn set(&self, key: &str, value: String) -> CacheResult<()>;

    /// Approximate number of stored entries
    fn entry_count(&self) -> u64;
}

/// In-process store with bounded capacity and optional expiry
#[derive(Debug, Clone)]
pub struct MokaStore {
    inner: Cache<String, Arc<str>>,
}

impl MokaStore {
    /// Create store with max capacity
    #[inline]
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::new(max_capacity),
        }
    }

    /// Create store with time-based expiration
    #[inline]
    #[must_use]
    pub fn with_ttl(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Flush pending maintenance so `entry_count` is current
    pub async fn sync(&self) {
        self.inner.run_pending_tasks().await;
    }
}

impl Default for MokaStore {
    /// Create store with default capacity (10,000 entries)
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl CacheStore for MokaStore {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self.inner.get(key).await.map(|v| v.to_string()))
    }

    async fn set(&self, key: &str, value: String) -> CacheResult<()> {
        self.inner.insert(key.to_string(), Arc::from(value)).await;
        Ok(())
    }

    fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

/// Unbounded store that also counts writes
///
/// Never evicts; useful where every write must stay observable.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
    writes: AtomicU64,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set` calls so far
    #[must_use]
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Stored keys, sorted
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: String) -> CacheResult<()> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn entry_count(&self) -> u64 {
        self.entries.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn moka_set_and_get() {
        let store = MokaStore::new(100);
        store.set("k", "v".to_string()).await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn moka_entry_count_after_sync() {
        let store = MokaStore::default();
        for i in 0..5 {
            store.set(&format!("k{i}"), i.to_string()).await.unwrap();
        }
        store.sync().await;
        assert_eq!(store.entry_count(), 5);
    }

    #[tokio::test]
    async fn moka_ttl_expires() {
        let store = MokaStore::with_ttl(100, Duration::from_millis(50));
        store.set("k", "v".to_string()).await.unwrap();
        assert!(store.get("k").await.unwrap().is_some());
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(store.get("k").await.unwrap().is_none());
    }

    #[test]
    fn memory_store_counts_writes() {
        let store = MemoryStore::new();
        tokio_test::block_on(async {
            store.set("a", "1".into()).await.unwrap();
            store.set("a", "1".into()).await.unwrap();
            store.set("b", "2".into()).await.unwrap();
        });
        assert_eq!(store.writes(), 3);
        assert_eq!(store.entry_count(), 2);
        assert_eq!(store.keys(), vec!["a", "b"]);
    }
}
