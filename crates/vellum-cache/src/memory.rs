//! In-memory cache implementation.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::{Cache, CacheBucket};

/// Stored entries of one bucket: key to `(etag, value)`.
type Entries = HashMap<String, (String, Vec<u8>)>;

/// Process-local [`Cache`].
///
/// Clones share storage, and so do repeated `bucket` calls with the same name.
#[derive(Clone, Default)]
pub struct MemoryCache {
    buckets: Arc<RwLock<HashMap<String, Arc<RwLock<Entries>>>>>,
}

impl MemoryCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cache for MemoryCache {
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket> {
        let mut buckets = self
            .buckets
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let entries = buckets.entry(name.to_owned()).or_default();
        Box::new(MemoryCacheBucket {
            entries: Arc::clone(entries),
        })
    }
}

struct MemoryCacheBucket {
    entries: Arc<RwLock<Entries>>,
}

impl CacheBucket for MemoryCacheBucket {
    fn get(&self, key: &str, etag: &str) -> Option<Vec<u8>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let (stored_etag, value) = entries.get(key)?;
        if !etag.is_empty() && stored_etag != etag {
            return None;
        }
        Some(value.clone())
    }

    fn set(&self, key: &str, etag: &str, value: &[u8]) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), (etag.to_owned(), value.to_vec()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_bucket_set_and_get() {
        let cache = MemoryCache::new();
        let bucket = cache.bucket("display");

        bucket.set("key", "etag1", b"value");
        assert_eq!(bucket.get("key", "etag1"), Some(b"value".to_vec()));
        assert_eq!(bucket.get("key", "etag2"), None);
        assert_eq!(bucket.get("key", ""), Some(b"value".to_vec()));
    }

    #[test]
    fn test_memory_buckets_share_by_name() {
        let cache = MemoryCache::new();
        cache.bucket("display").set("key", "v", b"shared");

        let clone = cache.clone();
        assert_eq!(clone.bucket("display").get("key", "v"), Some(b"shared".to_vec()));
        assert_eq!(clone.bucket("other").get("key", "v"), None);
    }
}
