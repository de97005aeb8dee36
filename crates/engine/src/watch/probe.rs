// SPDX-License-Identifier: MIT

//! Reading an artifact's current (mtime, size, bytes) off disk. This is
//! the Watch Session's own file I/O suspension point, separate from the
//! raw notification delivery modeled by `hotswap_ports::FilesystemWatcher`.

use std::path::Path;

#[derive(Debug, thiserror::Error)]
#[error("failed to read artifact at {path}: {source}")]
pub struct ProbeError {
    pub path: std::path::PathBuf,
    #[source]
    pub source: std::io::Error,
}

pub trait ArtifactProbe: Send + Sync + 'static {
    fn probe(&self, path: &Path) -> Result<(u64, u64, Vec<u8>), ProbeError>;
}

pub struct FsArtifactProbe;

impl ArtifactProbe for FsArtifactProbe {
    fn probe(&self, path: &Path) -> Result<(u64, u64, Vec<u8>), ProbeError> {
        let bytes = std::fs::read(path).map_err(|source| ProbeError {
            path: path.to_path_buf(),
            source,
        })?;
        let metadata = std::fs::metadata(path).map_err(|source| ProbeError {
            path: path.to_path_buf(),
            source,
        })?;
        let modified_ms = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Ok((modified_ms, bytes.len() as u64, bytes))
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    pub struct InMemoryArtifactProbe {
        files: Arc<Mutex<HashMap<PathBuf, (u64, u64, Vec<u8>)>>>,
    }

    impl InMemoryArtifactProbe {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn put(&self, path: impl Into<PathBuf>, modified_ms: u64, bytes: Vec<u8>) {
            let len = bytes.len() as u64;
            self.files.lock().insert(path.into(), (modified_ms, len, bytes));
        }

        pub fn remove(&self, path: &Path) {
            self.files.lock().remove(path);
        }
    }

    impl ArtifactProbe for InMemoryArtifactProbe {
        fn probe(&self, path: &Path) -> Result<(u64, u64, Vec<u8>), ProbeError> {
            self.files.lock().get(path).cloned().ok_or_else(|| ProbeError {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not in fake probe"),
            })
        }
    }
}