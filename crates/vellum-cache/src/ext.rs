//! JSON helpers over raw cache buckets.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::CacheBucket;

/// Typed JSON access for any [`CacheBucket`].
///
/// Kept off [`CacheBucket`] itself so the trait stays object-safe and
/// implementors only deal with raw bytes.
///
/// # Example
///
/// ```
/// use vellum_cache::{Cache, CacheBucketExt, MemoryCache};
///
/// let bucket = MemoryCache::new().bucket("display");
/// bucket.set_json("key", "v1", &vec!["a", "b"]);
/// let value: Option<Vec<String>> = bucket.get_json("key", "v1");
/// assert_eq!(value, Some(vec!["a".to_owned(), "b".to_owned()]));
/// ```
pub trait CacheBucketExt: CacheBucket {
    /// Decode the entry under `key` as JSON.
    ///
    /// An entry that no longer decodes counts as a miss.
    fn get_json<T: DeserializeOwned>(&self, key: &str, etag: &str) -> Option<T> {
        let bytes = self.get(key, etag)?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    /// Encode `value` as JSON and store it.
    fn set_json<T: Serialize>(&self, key: &str, etag: &str, value: &T) {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.set(key, etag, &bytes),
            Err(e) => tracing::warn!(key, error = %e, "Failed to serialize cache entry"),
        }
    }
}

impl<B: CacheBucket + ?Sized> CacheBucketExt for B {}
