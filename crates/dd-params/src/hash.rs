//! Content digests for cache addressing
//!
//! Provides [`CacheKey`], a strongly-typed 32-byte Blake3 digest of a
//! canonical serialization. Keys render as lowercase hex on the wire.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// A 32-byte content digest (Blake3)
///
/// Immutable and cheap to clone (Copy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    /// Create a key from raw bytes
    #[inline]
    #[must_use]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Compute Blake3 digest of arbitrary data
    #[inline]
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        Self::new(*blake3::hash(data).as_bytes())
    }

    /// Compute digest of a serializable value (JSON encoding)
    ///
    /// Only canonical when `value` serializes maps with sorted keys, which
    /// holds for every `BTreeMap`-backed type in this workspace.
    ///
    /// # Errors
    /// Returns error if serialization fails
    #[inline]
    pub fn compute_serializable<T>(value: &T) -> Result<Self, HashError>
    where
        T: serde::Serialize,
    {
        let json = serde_json::to_vec(value)?;
        Ok(Self::compute(&json))
    }

    /// Short string representation (first 16 hex chars)
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for CacheKey {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        let actual = bytes.len();
        let bytes: [u8; 32] = bytes.try_into().map_err(|_| HashError::InvalidLength {
            expected: 32,
            actual,
        })?;
        Ok(Self(bytes))
    }
}

/// Errors that can occur when working with cache keys
#[derive(Debug, thiserror::Error)]
pub enum HashError {
    /// Invalid digest length
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Hex encoding error
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn cache_key_compute_deterministic() {
        assert_eq!(CacheKey::compute(b"hello"), CacheKey::compute(b"hello"));
        assert_ne!(CacheKey::compute(b"data1"), CacheKey::compute(b"data2"));
    }

    #[test]
    fn cache_key_parse_rejects_short_digest() {
        let result = "ab".repeat(31).parse::<CacheKey>();
        assert!(matches!(
            result,
            Err(HashError::InvalidLength {
                expected: 32,
                actual: 31
            })
        ));
        assert!(matches!(
            "zz".parse::<CacheKey>(),
            Err(HashError::HexDecode(_))
        ));
    }

    #[test]
    fn cache_key_display_and_parse() {
        let key = CacheKey::compute(b"test");
        let s = key.to_string();
        assert_eq!(s.len(), 64);
        assert_eq!(s.parse::<CacheKey>().unwrap(), key);
        assert!(s.starts_with(&key.short()));
    }

    #[test]
    fn compute_serializable_ignores_insertion_order() {
        let mut a = BTreeMap::new();
        a.insert("b", 1);
        a.insert("a", 2);
        let mut b = BTreeMap::new();
        b.insert("a", 2);
        b.insert("b", 1);
        assert_eq!(
            CacheKey::compute_serializable(&a).unwrap(),
            CacheKey::compute_serializable(&b).unwrap()
        );
    }
}
