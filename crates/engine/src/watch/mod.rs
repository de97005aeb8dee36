// SPDX-License-Identifier: MIT

//! Watch Session: turns raw filesystem notifications into deduplicated
//! `ArtifactChanged` events.

pub mod probe;

use crate::event::{Event, Payload};
use hotswap_bytecode::digest_hex;
use hotswap_core::{Clock, WatchConfig, WatchId};
use hotswap_ports::{FsEventKind, RawFsEvent};
use probe::ArtifactProbe;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Paused,
    Terminating,
    Terminated,
}

#[derive(Debug, thiserror::Error)]
#[error("watch directory does not exist or is not readable: {0}")]
pub struct InvalidPath(pub PathBuf);

struct Registration {
    directory: PathBuf,
    #[allow(dead_code)]
    glob: Option<String>,
    #[allow(dead_code)]
    recursive: bool,
}

#[derive(Default)]
struct PathHistory {
    last_mtime: Option<u64>,
    last_size: Option<u64>,
    last_emitted_digest: Option<String>,
    last_redefined_digest: Option<String>,
}

struct PendingBurst {
    count: u32,
    last_seen_instant: Instant,
    mtime: u64,
    size: u64,
    digest: String,
}

/// Owns one or more watched directories for a single agent lifetime.
pub struct WatchSession {
    pub id: WatchId,
    state: SessionState,
    watches: HashMap<WatchId, Registration>,
    history: HashMap<PathBuf, PathHistory>,
    pending: HashMap<PathBuf, PendingBurst>,
    paused_queue: VecDeque<RawFsEvent>,
    config: WatchConfig,
    probe: Arc<dyn ArtifactProbe>,
}

impl WatchSession {
    pub fn new(config: WatchConfig, probe: Arc<dyn ArtifactProbe>) -> Self {
        Self {
            id: WatchId::new(),
            state: SessionState::Active,
            watches: HashMap::new(),
            history: HashMap::new(),
            pending: HashMap::new(),
            paused_queue: VecDeque::new(),
            config,
            probe,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn register(
        &mut self,
        directory: impl Into<PathBuf>,
        glob: Option<String>,
        recursive: bool,
    ) -> Result<WatchId, InvalidPath> {
        let directory = directory.into();
        let meta = std::fs::metadata(&directory).map_err(|_| InvalidPath(directory.clone()))?;
        if !meta.is_dir() {
            return Err(InvalidPath(directory));
        }
        let id = WatchId::new();
        self.watches.insert(
            id,
            Registration {
                directory,
                glob,
                recursive,
            },
        );
        Ok(id)
    }

    /// Idempotent: unregistering an unknown id is a no-op.
    pub fn unregister(&mut self, id: WatchId) {
        self.watches.remove(&id);
    }

    pub fn pause(&mut self) {
        if self.state == SessionState::Active {
            self.state = SessionState::Paused;
        }
    }

    pub fn resume(&mut self, clock: &dyn Clock) -> Vec<Event> {
        if self.state != SessionState::Paused {
            return Vec::new();
        }
        self.state = SessionState::Active;
        let queued: Vec<_> = self.paused_queue.drain(..).collect();
        let mut out = Vec::new();
        for raw in queued {
            out.extend(self.ingest(raw, clock));
        }
        out
    }

    pub fn begin_terminating(&mut self) {
        if matches!(self.state, SessionState::Active | SessionState::Paused) {
            self.state = SessionState::Terminating;
        }
    }

    pub fn terminate(&mut self) {
        self.state = SessionState::Terminated;
    }

    /// Ingest a single raw filesystem notification. Never blocks: all
    /// file I/O is a direct, synchronous probe call, and emission of
    /// debounced/bursted changes happens separately via [`Self::quiesce`].
    pub fn ingest(&mut self, raw: RawFsEvent, clock: &dyn Clock) -> Vec<Event> {
        match self.state {
            SessionState::Terminating | SessionState::Terminated => Vec::new(),
            SessionState::Paused => {
                if self.paused_queue.len() >= self.config.queue_capacity {
                    let dropped = self.paused_queue.pop_front();
                    self.paused_queue.push_back(raw);
                    if let Some(dropped) = dropped {
                        return vec![Event::new(
                            clock.epoch_ms(),
                            Payload::DroppedEvent {
                                path: dropped.path,
                                reason: "paused queue at capacity".into(),
                            },
                        )];
                    }
                } else {
                    self.paused_queue.push_back(raw);
                }
                Vec::new()
            }
            SessionState::Active => self.ingest_active(raw, clock),
        }
    }

    fn ingest_active(&mut self, raw: RawFsEvent, clock: &dyn Clock) -> Vec<Event> {
        if raw.kind == FsEventKind::Deleted {
            self.history.remove(&raw.path);
            self.pending.remove(&raw.path);
            return Vec::new();
        }

        let (mtime, size, bytes) = match self.probe.probe(&raw.path) {
            Ok(v) => v,
            Err(e) => {
                return vec![Event::new(
                    clock.epoch_ms(),
                    Payload::WatchDegraded {
                        path: raw.path,
                        error: e.to_string(),
                    },
                )]
            }
        };

        let history = self.history.entry(raw.path.clone()).or_default();
        if history.last_mtime == Some(mtime) && history.last_size == Some(size) {
            return Vec::new();
        }
        history.last_mtime = Some(mtime);
        history.last_size = Some(size);

        let digest = digest_hex(&bytes);
        let count = self.pending.get(&raw.path).map(|p| p.count + 1).unwrap_or(1);
        self.pending.insert(
            raw.path,
            PendingBurst {
                count,
                last_seen_instant: clock.now(),
                mtime,
                size,
                digest,
            },
        );
        Vec::new()
    }

    /// Flush any pending burst that has been quiet for at least the
    /// configured debounce window, emitting one `ArtifactChanged` per
    /// path (or none, if the digest matches the last one emitted).
    pub fn quiesce(&mut self, clock: &dyn Clock) -> Vec<Event> {
        let window = std::time::Duration::from_millis(self.config.debounce_window_ms);
        let now = clock.now();
        let ready: Vec<PathBuf> = self
            .pending
            .iter()
            .filter(|(_, p)| now.duration_since(p.last_seen_instant) >= window)
            .map(|(path, _)| path.clone())
            .collect();

        let mut out = Vec::new();
        for path in ready {
            let Some(burst) = self.pending.remove(&path) else {
                continue;
            };
            let history = self.history.entry(path.clone()).or_default();
            if history.last_emitted_digest.as_deref() == Some(burst.digest.as_str()) {
                continue;
            }
            let likely_meaningful = burst.size > MEANINGFUL_SIZE_THRESHOLD_BYTES
                || history.last_redefined_digest.as_deref() != Some(burst.digest.as_str());
            history.last_emitted_digest = Some(burst.digest.clone());
            out.push(Event::new(
                clock.epoch_ms(),
                Payload::ArtifactChanged {
                    path,
                    size: burst.size,
                    digest: burst.digest,
                    likely_meaningful,
                },
            ));
        }
        out
    }

    /// Record that a path's digest has been successfully redefined, for
    /// the `likely_meaningful` heuristic on future changes.
    pub fn mark_redefined(&mut self, path: &std::path::Path, digest: &str) {
        let history = self.history.entry(path.to_path_buf()).or_default();
        history.last_redefined_digest = Some(digest.to_string());
    }

    pub fn watch_ids(&self) -> impl Iterator<Item = &WatchId> {
        self.watches.keys()
    }

    pub fn watched_directories(&self) -> impl Iterator<Item = &PathBuf> {
        self.watches.values().map(|r| &r.directory)
    }
}

/// Mirrors `hotswap_core::MetadataConfig::meaningful_size_threshold_bytes`'s
/// default; the Watch Session only applies its own advisory heuristic, the
/// configured value belongs to whichever component consumes the flag.
const MEANINGFUL_SIZE_THRESHOLD_BYTES: u64 = 100;

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;