// SPDX-License-Identifier: MIT

//! [`ClassArtifact`]: a compiled class file on disk, as seen by the Watch
//! Session. Never mutated once constructed; referenced by every downstream
//! event for the attempt it belongs to.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassArtifact {
    pub path: PathBuf,
    pub modified_ms: u64,
    pub len: u64,
    pub digest: String,
    pub bytes: Vec<u8>,
}

impl ClassArtifact {
    pub fn new(path: impl Into<PathBuf>, modified_ms: u64, bytes: Vec<u8>) -> Self {
        let digest = digest_hex(&bytes);
        Self {
            path: path.into(),
            modified_ms,
            len: bytes.len() as u64,
            digest,
            bytes,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A stable hex digest over raw bytes, used both for the artifact's content
/// digest and for debounce comparisons.
pub fn digest_hex(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let out = hasher.finalize();
    let mut s = String::with_capacity(out.len() * 2);
    for byte in out {
        use std::fmt::Write;
        let _ = write!(s, "{byte:02x}");
    }
    s
}

#[cfg(test)]
#[path = "artifact_tests.rs"]
mod tests;