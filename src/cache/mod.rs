//! Feature block cache.
//!
//! Computed [`FeatureBlock`]s are memoized under a [`CacheKey`] of
//! `(prefix, generator name)`. The prefix namespaces an experiment or run;
//! the name is the generator's stable identity.
//!
//! ```text
//! <root>/
//!   default/
//!     degree_undirected.bin
//!     log10-pagerank_d0.85.bin
//!   run_600/
//!     neighbouring_conductance_r2.bin
//! ```
//!
//! Entries never expire and carry no fingerprint of the graph they were
//! computed from: two different graphs sharing a prefix and generator name
//! read each other's entries. Use a distinct prefix per input graph.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{FeatureError, Result};
use crate::primitives::FeatureBlock;

/// Identity of one cached block.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Namespace, e.g. an experiment or run identifier
    pub prefix: String,
    /// Generator name
    pub name: String,
}

impl CacheKey {
    /// Create a key from a prefix and a generator name.
    #[must_use]
    pub fn new(prefix: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.prefix, self.name)
    }
}

/// Storage backend for computed feature blocks.
///
/// `get` returns `Ok(None)` for a missing entry and `Err` for an entry that
/// exists but cannot be read; callers treat both as a miss.
pub trait FeatureCache: Send + Sync + fmt::Debug {
    /// Look up a block.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry exists but cannot be read or decoded.
    fn get(&self, key: &CacheKey) -> Result<Option<FeatureBlock>>;

    /// Store a block, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be written.
    fn put(&self, key: &CacheKey, block: &FeatureBlock) -> Result<()>;
}

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessStats {
    /// Number of cache hits
    pub hit_count: u64,
    /// Number of cache misses
    pub miss_count: u64,
    /// Number of stored blocks
    pub put_count: u64,
}

impl AccessStats {
    /// Get hit rate (0.0 - 1.0)
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}

/// On-disk cache: one bincode file per key.
#[derive(Debug, Clone)]
pub struct DiskCache {
    root: PathBuf,
}

impl DiskCache {
    /// Cache rooted at `root`. Nothing is created until the first `put`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing `key`: `<root>/<prefix>/<name>.bin`, with both
    /// components percent-encoded.
    #[must_use]
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.root
            .join(encode_component(&key.prefix))
            .join(format!("{}.bin", encode_component(&key.name)))
    }
}

/// Percent-encode a key component into a file name.
///
/// The mapping is injective: `%` itself is encoded, so `run/600` and
/// `run_600` land in different directories. `.` and `..` become `%2E` and
/// `%2E%2E`, and an empty component becomes `%`.
fn encode_component(component: &str) -> String {
    match component {
        "" => "%".to_string(),
        "." => "%2E".to_string(),
        ".." => "%2E%2E".to_string(),
        _ => urlencoding::encode(component).into_owned(),
    }
}

impl FeatureCache for DiskCache {
    fn get(&self, key: &CacheKey) -> Result<Option<FeatureBlock>> {
        let path = self.path_for(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let block: FeatureBlock = bincode::deserialize(&bytes)?;
        if block.as_slice().len() != block.n_rows() * block.n_cols() {
            return Err(FeatureError::Serialization(format!(
                "{}: payload length disagrees with shape {:?}",
                path.display(),
                block.shape()
            )));
        }
        Ok(Some(block))
    }

    fn put(&self, key: &CacheKey, block: &FeatureBlock) -> Result<()> {
        let path = self.path_for(key);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let bytes = bincode::serialize(block)?;
        fs::write(&path, bytes)?;
        tracing::debug!(path = %path.display(), shape = ?block.shape(), "wrote cache entry");
        Ok(())
    }
}

/// In-process cache, mainly for tests and single-run composition.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<CacheKey, FeatureBlock>>,
    stats: Mutex<AccessStats>,
}

impl MemoryCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map_or(0, |entries| entries.len())
    }

    /// True when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if `key` is stored.
    #[must_use]
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries
            .lock()
            .is_ok_and(|entries| entries.contains_key(key))
    }

    /// Snapshot of the access counters.
    #[must_use]
    pub fn stats(&self) -> AccessStats {
        self.stats.lock().map(|s| *s).unwrap_or_default()
    }

    fn record(&self, update: impl FnOnce(&mut AccessStats)) {
        if let Ok(mut stats) = self.stats.lock() {
            update(&mut stats);
        }
    }
}

impl FeatureCache for MemoryCache {
    fn get(&self, key: &CacheKey) -> Result<Option<FeatureBlock>> {
        let found = self
            .entries
            .lock()
            .map_err(|_| FeatureError::Other("memory cache lock poisoned".into()))?
            .get(key)
            .cloned();
        self.record(|s| {
            if found.is_some() {
                s.hit_count += 1;
            } else {
                s.miss_count += 1;
            }
        });
        Ok(found)
    }

    fn put(&self, key: &CacheKey, block: &FeatureBlock) -> Result<()> {
        self.entries
            .lock()
            .map_err(|_| FeatureError::Other("memory cache lock poisoned".into()))?
            .insert(key.clone(), block.clone());
        self.record(|s| s.put_count += 1);
        Ok(())
    }
}
