// SPDX-License-Identifier: MIT

use super::*;
use hotswap_bytecode::ClassMetadata;

fn meta(name: &str) -> ClassMetadata {
    ClassMetadata {
        class_name: name.into(),
        supertype_name: None,
        interfaces: vec![],
        fields: vec![],
        methods: vec![],
    }
}

fn key(n: u8) -> CacheKey {
    CacheKey {
        path: PathBuf::from(format!("/w/a/B{n}.class")),
        digest: format!("d{n}"),
    }
}

#[test]
fn hit_returns_the_stored_metadata() {
    let mut cache = MetadataCache::new(8, 30 * 60_000);
    cache.insert(key(1), meta("a.B1"), 0);
    let hit = cache.get(&key(1), 1_000).expect("should hit");
    assert_eq!(hit.metadata.class_name, "a.B1");
}

#[test]
fn entry_expires_after_the_ttl() {
    let mut cache = MetadataCache::new(8, 1_000);
    cache.insert(key(1), meta("a.B1"), 0);
    assert!(cache.get(&key(1), 500).is_some());
    assert!(cache.get(&key(1), 5_000).is_none());
    assert!(cache.is_empty());
}

#[test]
fn capacity_eviction_drops_the_least_recently_used_entry() {
    let mut cache = MetadataCache::new(2, 30 * 60_000);
    cache.insert(key(1), meta("a.B1"), 0);
    cache.insert(key(2), meta("a.B2"), 0);
    // Touch key 1 so key 2 becomes the least-recently-used entry.
    assert!(cache.get(&key(1), 10).is_some());
    cache.insert(key(3), meta("a.B3"), 20);
    assert!(cache.get(&key(2), 20).is_none());
    assert!(cache.get(&key(1), 20).is_some());
    assert!(cache.get(&key(3), 20).is_some());
}

#[test]
fn miss_on_unknown_key() {
    let mut cache = MetadataCache::new(8, 30 * 60_000);
    assert!(cache.get(&key(9), 0).is_none());
}