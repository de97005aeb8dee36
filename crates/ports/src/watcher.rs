// SPDX-License-Identifier: MIT

//! The abstract filesystem watcher. Delivers raw `(path, kind)`
//! notifications to a channel; the Watch Session debounces and
//! classifies them into `ArtifactChanged` events.

use hotswap_core::WatchId;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsEventKind {
    Created,
    Modified,
    Deleted,
}

#[derive(Debug, Clone)]
pub struct RawFsEvent {
    pub path: PathBuf,
    pub kind: FsEventKind,
}

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("path does not exist or is not readable: {0}")]
    InvalidPath(PathBuf),
    #[error("underlying watcher error: {0}")]
    Backend(String),
}

/// An abstract watcher: register a directory, receive raw events on a
/// channel, unregister when done.
pub trait FilesystemWatcher: Send + Sync + 'static {
    fn watch(
        &self,
        directory: &Path,
        recursive: bool,
        tx: mpsc::Sender<RawFsEvent>,
    ) -> Result<WatchId, WatchError>;

    fn unwatch(&self, id: WatchId);
}

/// Production watcher backed by the `notify` crate. Bridges its
/// synchronous callback API to an async channel the same way a blocking
/// `tx.blocking_send` hop is used elsewhere to cross the sync/async
/// boundary.
pub struct NotifyFsWatcher {
    watchers: parking_lot::Mutex<std::collections::HashMap<String, notify::RecommendedWatcher>>,
}

impl Default for NotifyFsWatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyFsWatcher {
    pub fn new() -> Self {
        Self {
            watchers: parking_lot::Mutex::new(std::collections::HashMap::new()),
        }
    }
}

impl FilesystemWatcher for NotifyFsWatcher {
    fn watch(
        &self,
        directory: &Path,
        recursive: bool,
        tx: mpsc::Sender<RawFsEvent>,
    ) -> Result<WatchId, WatchError> {
        use notify::{RecursiveMode, Watcher};

        if !directory.exists() {
            return Err(WatchError::InvalidPath(directory.to_path_buf()));
        }

        let mode = if recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };

        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
            let Ok(event) = res else { return };
            let kind = match event.kind {
                notify::EventKind::Create(_) => FsEventKind::Created,
                notify::EventKind::Modify(_) => FsEventKind::Modified,
                notify::EventKind::Remove(_) => FsEventKind::Deleted,
                _ => return,
            };
            for path in event.paths {
                let _ = tx.blocking_send(RawFsEvent {
                    path,
                    kind,
                });
            }
        })
        .map_err(|e| WatchError::Backend(e.to_string()))?;

        watcher
            .watch(directory, mode)
            .map_err(|e| WatchError::Backend(e.to_string()))?;

        let id = WatchId::new();
        self.watchers.lock().insert(id.as_str().to_string(), watcher);
        Ok(id)
    }

    fn unwatch(&self, id: WatchId) {
        self.watchers.lock().remove(id.as_str());
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeState {
        registrations: std::collections::HashMap<String, (PathBuf, mpsc::Sender<RawFsEvent>)>,
    }

    /// A watcher that never touches the real filesystem; tests call
    /// [`FakeFilesystemWatcher::inject`] to simulate raw fs notifications.
    #[derive(Clone, Default)]
    pub struct FakeFilesystemWatcher {
        inner: Arc<Mutex<FakeState>>,
    }

    impl FakeFilesystemWatcher {
        pub fn new() -> Self {
            Self::default()
        }

        /// Simulate a raw notification for every registered watch whose
        /// directory is a prefix of `path`.
        pub fn inject(&self, path: &Path, kind: FsEventKind) {
            let inner = self.inner.lock();
            for (dir, tx) in inner.registrations.values() {
                if path.starts_with(dir) {
                    let _ = tx.try_send(RawFsEvent {
                        path: path.to_path_buf(),
                        kind,
                    });
                }
            }
        }

        pub fn active_watch_count(&self) -> usize {
            self.inner.lock().registrations.len()
        }
    }

    impl FilesystemWatcher for FakeFilesystemWatcher {
        fn watch(
            &self,
            directory: &Path,
            _recursive: bool,
            tx: mpsc::Sender<RawFsEvent>,
        ) -> Result<WatchId, WatchError> {
            let id = WatchId::new();
            self.inner
                .lock()
                .registrations
                .insert(id.as_str().to_string(), (directory.to_path_buf(), tx));
            Ok(id)
        }

        fn unwatch(&self, id: WatchId) {
            self.inner.lock().registrations.remove(id.as_str());
        }
    }
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;