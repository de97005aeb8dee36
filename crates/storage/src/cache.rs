// SPDX-License-Identifier: MIT

//! Bounded, LRU-evicting cache for extracted metadata, keyed by
//! `(path, content digest)`.

use hotswap_bytecode::ClassMetadata;
use indexmap::IndexMap;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub path: PathBuf,
    pub digest: String,
}

struct Entry {
    metadata: ClassMetadata,
    inserted_at_ms: u64,
}

/// A cache entry that survived both the TTL and LRU-capacity checks.
pub struct CacheHit {
    pub metadata: ClassMetadata,
}

pub struct MetadataCache {
    entries: IndexMap<CacheKey, Entry>,
    max_entries: usize,
    ttl_ms: u64,
}

impl MetadataCache {
    pub fn new(max_entries: usize, ttl_ms: u64) -> Self {
        Self {
            entries: IndexMap::new(),
            max_entries: max_entries.max(1),
            ttl_ms,
        }
    }

    /// Look up a cached extraction. Expired entries are evicted lazily
    /// on access rather than via a background sweep.
    pub fn get(&mut self, key: &CacheKey, now_ms: u64) -> Option<CacheHit> {
        let expired = match self.entries.get(key) {
            Some(entry) => now_ms.saturating_sub(entry.inserted_at_ms) > self.ttl_ms,
            None => return None,
        };
        if expired {
            self.entries.shift_remove(key);
            return None;
        }
        // Move to the back (most-recently-used end) without touching
        // the stored value's age; a cache hit is not a re-insertion.
        let (k, v) = self.entries.shift_remove_entry(key)?;
        let metadata = v.metadata.clone();
        self.entries.insert(k, v);
        Some(CacheHit { metadata })
    }

    /// Insert or refresh an entry, evicting the least-recently-used
    /// entry first if the cache is at capacity.
    pub fn insert(&mut self, key: CacheKey, metadata: ClassMetadata, now_ms: u64) {
        if self.entries.len() >= self.max_entries && !self.entries.contains_key(&key) {
            self.entries.shift_remove_index(0);
        }
        self.entries.shift_remove(&key);
        self.entries.insert(
            key,
            Entry {
                metadata,
                inserted_at_ms: now_ms,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;