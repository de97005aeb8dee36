// SPDX-License-Identifier: MIT

//! Metadata Extractor: a pure, deterministic parse of a `ClassArtifact`
//! into its structural summary, backed by a bounded, TTL-evicting cache
//! keyed on `(path, digest)`.

use crate::event::{Event, ExtractionFailureReason, Payload};
use hotswap_bytecode::ClassArtifact;
use hotswap_core::{Clock, MetadataConfig};
use hotswap_storage::cache::{CacheKey, MetadataCache};
use parking_lot::Mutex;

pub struct MetadataExtractor {
    cache: Mutex<MetadataCache>,
    config: MetadataConfig,
}

impl MetadataExtractor {
    pub fn new(config: MetadataConfig) -> Self {
        Self {
            cache: Mutex::new(MetadataCache::new(
                config.cache_max_entries,
                config.cache_ttl_minutes * 60_000,
            )),
            config,
        }
    }

    /// Extract (or recall from cache) the structural metadata of an
    /// artifact, returning the one `Event` that resulted.
    pub fn extract(&self, artifact: &ClassArtifact, clock: &dyn Clock) -> Event {
        let now = clock.epoch_ms();

        if artifact.len > self.config.max_artifact_bytes {
            return Event::new(
                now,
                Payload::ExtractionFailed {
                    path: artifact.path.clone(),
                    reason: ExtractionFailureReason::TooLarge,
                },
            );
        }

        let key = CacheKey {
            path: artifact.path.clone(),
            digest: artifact.digest.clone(),
        };

        if let Some(hit) = self.cache.lock().get(&key, now) {
            return Event::new(
                now,
                Payload::MetadataExtracted {
                    class_name: hit.metadata.class_name.clone(),
                    metadata: hit.metadata,
                    from_cache: true,
                },
            );
        }

        match hotswap_bytecode::parse(&artifact.bytes) {
            Ok(metadata) => {
                self.cache.lock().insert(key, metadata.clone(), now);
                Event::new(
                    now,
                    Payload::MetadataExtracted {
                        class_name: metadata.class_name.clone(),
                        metadata,
                        from_cache: false,
                    },
                )
            }
            Err(reason) => Event::new(
                now,
                Payload::ExtractionFailed {
                    path: artifact.path.clone(),
                    reason: reason.into(),
                },
            ),
        }
    }

    pub fn cached_entry_count(&self) -> usize {
        self.cache.lock().len()
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;