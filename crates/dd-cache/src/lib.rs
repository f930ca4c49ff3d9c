//! Content-addressed cache for scenario calculations
//!
//! Technology results are stored under a digest of the record that produced
//! them; commit manifests under a digest of the workbook commit. The backing
//! store is anything implementing [`CacheStore`].
//!
//! # Core Concepts
//!
//! - [`CacheStore`]: async string key-value store ([`MokaStore`], [`MemoryStore`])
//! - [`ContentCache`]: record keys and typed get/set of results and manifests
//! - [`CachedResult`] / [`ManifestEntry`]: cached value shapes

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod content;
mod error;
mod store;
mod wire;

// Re-exports
pub use content::{CacheStats, ContentCache};
pub use error::{CacheError, CacheResult};
pub use store::{CacheStore, MemoryStore, MokaStore};
pub use wire::{CachedResult, Manifest, ManifestEntry, RESULT_PATH_PREFIX};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
