//! Scan result cache implementation.

use mediagate_core::{ResultKey, ScanResult};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Storage for finalized scan results.
///
/// Implementations must be safe to share between tasks. Reads never block
/// on a pipeline in progress.
pub trait ResultCache: Send + Sync {
    /// Cached result for `key`, if any.
    fn get(&self, key: &ResultKey) -> Option<ScanResult>;

    /// Store `result` under `key`, replacing any earlier entry.
    fn set(&self, key: ResultKey, result: ScanResult);

    /// Drop every entry.
    fn clear(&self);

    /// Number of cached entries.
    fn len(&self) -> usize;

    /// Whether the cache holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Unbounded process-local result cache.
///
/// Entries live until [`ResultCache::clear`] is called or the process exits.
///
/// # Example
///
/// ```
/// use mediagate_cache::{InMemoryResultCache, ResultCache};
/// use mediagate_core::{ResultKey, ScanResult, Verdict};
/// use std::collections::BTreeMap;
///
/// let cache = InMemoryResultCache::new();
/// let key = ResultKey::derive("https://hs.example/x", None).unwrap();
/// let verdict = Verdict { clean: true, info: "File is clean".into(), exit_code: 0 };
///
/// cache.set(key, ScanResult::from_verdict(verdict, "/tmp/x", BTreeMap::new()));
/// assert!(cache.get(&key).unwrap().clean);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryResultCache {
    entries: RwLock<HashMap<ResultKey, ScanResult>>,
}

impl InMemoryResultCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        tracing::debug!("Creating new InMemoryResultCache");
        Self::default()
    }
}

impl ResultCache for InMemoryResultCache {
    fn get(&self, key: &ResultKey) -> Option<ScanResult> {
        let entry = self.entries.read().get(key).cloned();
        tracing::debug!(%key, cache_hit = entry.is_some(), "Result cache lookup");
        entry
    }

    fn set(&self, key: ResultKey, result: ScanResult) {
        let mut entries = self.entries.write();
        let replaced = entries.insert(key, result).is_some();
        tracing::debug!(%key, replaced, cache_size = entries.len(), "Stored scan result");
    }

    fn clear(&self) {
        let mut entries = self.entries.write();
        let removed = entries.len();
        entries.clear();
        tracing::info!(removed, "Cleared result cache");
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }
}
