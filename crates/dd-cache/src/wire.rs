//! Cached value shapes

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Serialized result of one technology's scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedResult {
    /// Scenario name
    pub name: String,
    /// Data field name → serialized output
    pub data: Map<String, Value>,
}

/// Where one technology's result is stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub technology: String,
    /// Display name from the technology registry
    pub technology_full: String,
    /// Resource path of the cached result, `calculation/<key>`
    pub path: String,
}

/// Result locations of one workbook commit
pub type Manifest = Vec<ManifestEntry>;

/// Resource path prefix of cached results
pub const RESULT_PATH_PREFIX: &str = "calculation";
