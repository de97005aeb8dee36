// SPDX-License-Identifier: MIT

//! Pre-image snapshots captured before a redefinition attempt, and the
//! bounded, oldest-first-evicting chain that holds them per class.

use hotswap_core::SnapshotId;
use hotswap_ports::{FieldState, InstanceKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: SnapshotId,
    pub class_name: String,
    pub original_bytecode: Vec<u8>,
    pub instance_state: BTreeMap<InstanceKey, FieldState>,
    pub created_at_ms: u64,
    /// The snapshot this one chains from, if any.
    pub previous: Option<SnapshotId>,
    pub validated: bool,
    /// Set once a later rollback has consumed this snapshot; retained for
    /// forensics rather than removed.
    pub consumed: bool,
}

impl Snapshot {
    pub fn new(
        id: SnapshotId,
        class_name: impl Into<String>,
        original_bytecode: Vec<u8>,
        instance_state: BTreeMap<InstanceKey, FieldState>,
        created_at_ms: u64,
        previous: Option<SnapshotId>,
    ) -> Self {
        Self {
            id,
            class_name: class_name.into(),
            original_bytecode,
            instance_state,
            created_at_ms,
            previous,
            validated: true,
            consumed: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("snapshot chain would contain a cycle")]
    Cycle,
}

/// Per-class snapshot chain, most-recent first, bounded in length with
/// oldest-first eviction once the configured maximum is reached.
#[derive(Debug, Default)]
pub struct SnapshotChain {
    entries: std::collections::VecDeque<Snapshot>,
    max_length: usize,
}

impl SnapshotChain {
    pub fn new(max_length: usize) -> Self {
        Self {
            entries: std::collections::VecDeque::new(),
            max_length: max_length.max(1),
        }
    }

    /// Append a new snapshot as the head of the chain. If the chain is at
    /// capacity, the oldest entry is evicted first; this never fails.
    pub fn push(&mut self, snapshot: Snapshot) -> Result<(), ChainError> {
        if let Some(prev) = &snapshot.previous {
            if self.entries.iter().any(|s| &s.id == prev) {
                // fine: previous must already exist in the chain, not form a cycle
            } else if !self.entries.is_empty() {
                return Err(ChainError::Cycle);
            }
        }
        if self.entries.len() >= self.max_length {
            self.entries.pop_back();
        }
        self.entries.push_front(snapshot);
        Ok(())
    }

    /// The most recent snapshot, i.e. the rollback target.
    pub fn head(&self) -> Option<&Snapshot> {
        self.entries.front()
    }

    pub fn head_mut(&mut self) -> Option<&mut Snapshot> {
        self.entries.front_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.entries.iter()
    }

    pub fn get(&self, id: &SnapshotId) -> Option<&Snapshot> {
        self.entries.iter().find(|s| &s.id == id)
    }

    pub fn get_mut(&mut self, id: &SnapshotId) -> Option<&mut Snapshot> {
        self.entries.iter_mut().find(|s| &s.id == id)
    }

    /// Remove a specific snapshot outright, e.g. when a VM rejection at
    /// redefine time means the captured pre-image will never be needed.
    pub fn discard(&mut self, id: &SnapshotId) -> Option<Snapshot> {
        let pos = self.entries.iter().position(|s| &s.id == id)?;
        self.entries.remove(pos)
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;