use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::AbiResult;
use crate::parser::{parse_abi, ParsedAbi};

/// The default number of parsed ABIs kept by an [`AbiCache`].
pub const DEFAULT_ABI_CACHE_CAPACITY: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbiCacheConfig {
    /// Maximum number of entries. Zero disables caching.
    pub capacity: usize,
}

impl Default for AbiCacheConfig {
    fn default() -> Self {
        Self { capacity: DEFAULT_ABI_CACHE_CAPACITY }
    }
}

/// Memoizes [`parse_abi`] per ABI object.
///
/// Entries are keyed by the address of the shared ABI value, not by its content, so two equal
/// but separately allocated ABIs are parsed separately. Each entry holds a weak reference back to
/// its source, which is checked on lookup: once the source is dropped its slot can be reused by
/// a new allocation without the stale parse ever being returned.
#[derive(Clone)]
pub struct AbiCache {
    inner: Arc<AbiCacheInner>,
}

struct AbiCacheInner {
    config: AbiCacheConfig,
    entries: RwLock<IndexMap<usize, CacheEntry>>,
}

struct CacheEntry {
    source: Weak<Value>,
    parsed: Arc<ParsedAbi>,
}

impl CacheEntry {
    fn get(&self, abi: &Arc<Value>) -> Option<Arc<ParsedAbi>> {
        let source = self.source.upgrade()?;
        Arc::ptr_eq(&source, abi).then(|| Arc::clone(&self.parsed))
    }
}

impl AbiCache {
    pub fn new(config: AbiCacheConfig) -> Self {
        Self {
            inner: Arc::new(AbiCacheInner { config, entries: RwLock::new(IndexMap::new()) }),
        }
    }

    /// Returns the parsed form of `abi`, parsing it on first use.
    ///
    /// Parse failures are returned and never cached.
    pub fn get_or_parse(&self, abi: &Arc<Value>) -> AbiResult<Arc<ParsedAbi>> {
        let key = Arc::as_ptr(abi) as usize;

        // Fast path: read lock
        if let Some(parsed) = self.inner.entries.read().get(&key).and_then(|e| e.get(abi)) {
            debug!(target: "abi::cache", key, "Cache hit.");
            return Ok(parsed);
        }

        debug!(target: "abi::cache", key, "Cache miss.");
        let parsed = Arc::new(parse_abi(abi)?);

        let capacity = self.inner.config.capacity;
        if capacity == 0 {
            return Ok(parsed);
        }

        // Slow path: write lock to insert
        let mut entries = self.inner.entries.write();

        // Double-check after acquiring write lock
        if let Some(existing) = entries.get(&key).and_then(|e| e.get(abi)) {
            return Ok(existing);
        }

        // A stale entry for a dropped source is replaced in place of being evicted.
        entries.shift_remove(&key);
        entries.retain(|_, entry| entry.source.strong_count() > 0);
        while entries.len() >= capacity {
            entries.shift_remove_index(0);
        }

        let entry = CacheEntry { source: Arc::downgrade(abi), parsed: Arc::clone(&parsed) };
        entries.insert(key, entry);
        Ok(parsed)
    }

    pub fn config(&self) -> &AbiCacheConfig {
        &self.inner.config
    }

    /// Returns the number of cached entries.
    pub fn len(&self) -> usize {
        self.inner.entries.read().len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.inner.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.inner.entries.write().clear();
    }
}

impl Default for AbiCache {
    fn default() -> Self {
        Self::new(AbiCacheConfig::default())
    }
}

impl std::fmt::Debug for AbiCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbiCache")
            .field("capacity", &self.inner.config.capacity)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
