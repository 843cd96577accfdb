//! Storage for rendered content trees.
//!
//! The display pipeline sees a [`Cache`] handing out named [`CacheBucket`]s.
//! Each entry carries an etag and is only returned while the caller's etag
//! still matches.
//!
//! [`NullCache`] never hits. [`MemoryCache`] keeps entries for the life of
//! the process, while [`FileCache`] persists them under a versioned directory.
//!
//! # Example
//!
//! ```
//! use vellum_cache::{Cache, MemoryCache};
//!
//! let cache = MemoryCache::new();
//! let bucket = cache.bucket("display");
//! bucket.set(r#"["display","document"]"#, "1.1", b"{}");
//! assert_eq!(bucket.get(r#"["display","document"]"#, "1.1"), Some(b"{}".to_vec()));
//! assert_eq!(bucket.get(r#"["display","document"]"#, "1.2"), None);
//! ```

mod ext;
mod file;
mod memory;

pub use ext::CacheBucketExt;
pub use file::FileCache;
pub use memory::MemoryCache;

/// A named partition within a [`Cache`].
///
/// Values are invalidated by an etag chosen by the caller (a document
/// version, a content hash). A hit requires both key and etag to match.
pub trait CacheBucket: Send + Sync {
    /// Value stored under `key`, if its etag equals `etag`.
    ///
    /// An empty `etag` accepts any stored etag.
    fn get(&self, key: &str, etag: &str) -> Option<Vec<u8>>;

    /// Store `value` under `key`, replacing what was there.
    fn set(&self, key: &str, etag: &str, value: &[u8]);
}

/// Source of named [`CacheBucket`]s.
///
/// Buckets with different names never see each other's entries.
pub trait Cache: Send + Sync {
    /// Bucket called `name`, created on first use.
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket>;
}

/// Bucket that forgets everything.
pub struct NullCacheBucket;

impl CacheBucket for NullCacheBucket {
    fn get(&self, _key: &str, _etag: &str) -> Option<Vec<u8>> {
        None
    }

    fn set(&self, _key: &str, _etag: &str, _value: &[u8]) {}
}

/// [`Cache`] used when caching is switched off.
pub struct NullCache;

impl Cache for NullCache {
    fn bucket(&self, _name: &str) -> Box<dyn CacheBucket> {
        Box::new(NullCacheBucket)
    }
}
