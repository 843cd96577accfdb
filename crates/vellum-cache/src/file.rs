//! Render cache on disk.
//!
//! Every bucket is a directory under the cache root and every entry a file
//! named by the hex SHA-256 of its key, since render keys are JSON arrays
//! that do not make valid file names. An entry file holds the hex-encoded
//! etag on its first line and the cached bytes after it.
//!
//! The root carries a `VERSION` marker. Opening a [`FileCache`] with any
//! other version discards everything under the root.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::{Cache, CacheBucket};

const VERSION_FILE: &str = "VERSION";

/// [`Cache`] persisted under a root directory.
///
/// ```text
/// {root}/
/// +-- VERSION
/// +-- display/
///     +-- 3f9a...e1
/// ```
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    /// Open the cache at `root` for format `version`.
    ///
    /// A missing or different `VERSION` marker resets the directory. Failing
    /// to reset only costs cache hits, so it is logged and otherwise ignored.
    #[must_use]
    pub fn new(root: PathBuf, version: &str) -> Self {
        if let Err(e) = prepare_root(&root, version) {
            tracing::warn!(root = %root.display(), error = %e, "Cache directory unusable");
        }
        Self { root }
    }

    /// Directory holding the buckets.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Cache for FileCache {
    fn bucket(&self, name: &str) -> Box<dyn CacheBucket> {
        Box::new(DirBucket {
            dir: self.root.join(name),
        })
    }
}

/// Reset `root` unless it already holds entries of `version`.
fn prepare_root(root: &Path, version: &str) -> io::Result<()> {
    let marker = root.join(VERSION_FILE);
    match fs::read_to_string(&marker) {
        Ok(stored) if stored == version => return Ok(()),
        Ok(stored) => tracing::info!(%stored, current = version, "Discarding stale render cache"),
        Err(_) => tracing::debug!(root = %root.display(), "Initializing render cache"),
    }

    if root.exists() {
        fs::remove_dir_all(root)?;
    }
    fs::create_dir_all(root)?;
    fs::write(marker, version)
}

fn entry_name(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

/// Split a stored entry into its etag line and payload.
fn split_entry(raw: &[u8]) -> Option<(&[u8], &[u8])> {
    let newline = raw.iter().position(|&b| b == b'\n')?;
    Some((&raw[..newline], &raw[newline + 1..]))
}

struct DirBucket {
    dir: PathBuf,
}

impl CacheBucket for DirBucket {
    fn get(&self, key: &str, etag: &str) -> Option<Vec<u8>> {
        let raw = fs::read(self.dir.join(entry_name(key))).ok()?;
        let (stored, payload) = split_entry(&raw)?;
        if !etag.is_empty() && stored != hex::encode(etag).as_bytes() {
            tracing::debug!(key, "Cache entry is stale");
            return None;
        }
        Some(payload.to_vec())
    }

    fn set(&self, key: &str, etag: &str, value: &[u8]) {
        // Hex keeps the etag line free of newlines whatever the etag holds.
        let etag = hex::encode(etag);
        let mut entry = Vec::with_capacity(etag.len() + 1 + value.len());
        entry.extend_from_slice(etag.as_bytes());
        entry.push(b'\n');
        entry.extend_from_slice(value);

        let path = self.dir.join(entry_name(key));
        let staging = path.with_extension("partial");
        // Readers only ever open the final name.
        let written = fs::create_dir_all(&self.dir)
            .and_then(|()| fs::write(&staging, &entry))
            .and_then(|()| fs::rename(&staging, &path));
        if let Err(e) = written {
            tracing::warn!(key, error = %e, "Failed to store cache entry");
        }
    }
}
