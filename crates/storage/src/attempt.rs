// SPDX-License-Identifier: MIT

//! [`RedefinitionAttempt`]: the running state of a single redefinition,
//! and the per-class registry enforcing "at most one non-terminal
//! attempt per class name at any instant".

use hotswap_bytecode::ClassArtifact;
use hotswap_core::{AttemptId, SnapshotId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptState {
    Pending,
    Validating,
    Snapshotting,
    Redefining,
    Reconciling,
    Succeeded,
    Failed,
    RollingBack,
    RolledBack,
    RollbackFailed,
}

impl AttemptState {
    /// A terminal state is one consumers see as the final outcome of an
    /// attempt: `Succeeded`, `Failed` (when no rollback follows),
    /// `RolledBack`, or `RollbackFailed`.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::Failed | Self::RolledBack | Self::RollbackFailed
        )
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid attempt transition: {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: AttemptState,
    pub to: AttemptState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedefinitionAttempt {
    pub id: AttemptId,
    pub class_name: String,
    pub artifact: ClassArtifact,
    pub snapshot_id: Option<SnapshotId>,
    pub state: AttemptState,
    pub deadline_ms: u64,
}

impl RedefinitionAttempt {
    pub fn new(id: AttemptId, class_name: impl Into<String>, artifact: ClassArtifact, deadline_ms: u64) -> Self {
        Self {
            id,
            class_name: class_name.into(),
            artifact,
            snapshot_id: None,
            state: AttemptState::Pending,
            deadline_ms,
        }
    }

    /// Move to `to`, validating against the attempt state machine:
    /// `Pending -> Validating -> Snapshotting -> Redefining -> Reconciling
    /// -> {Succeeded | Failed}`, with `Failed -> RollingBack ->
    /// {RolledBack | RollbackFailed}` as an optional continuation.
    pub fn transition(&mut self, to: AttemptState) -> Result<(), InvalidTransition> {
        use AttemptState::*;
        let allowed = matches!(
            (self.state, to),
            (Pending, Validating)
                | (Validating, Snapshotting)
                | (Validating, Failed)
                | (Snapshotting, Redefining)
                | (Redefining, Reconciling)
                | (Redefining, Failed)
                | (Reconciling, Succeeded)
                | (Reconciling, Failed)
                | (Failed, RollingBack)
                | (RollingBack, RolledBack)
                | (RollingBack, RollbackFailed)
        );
        if !allowed {
            return Err(InvalidTransition {
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }
}

/// Tracks the single non-terminal attempt, if any, for each class name.
#[derive(Debug, Default)]
pub struct AttemptRegistry {
    non_terminal: HashMap<String, RedefinitionAttempt>,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("a redefinition attempt is already in progress for {0}")]
    AlreadyInProgress(String),
}

impl AttemptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit a new attempt for a class. If one is already non-terminal:
    /// when `coalesce` is true and the existing attempt is still
    /// `Pending`, it is replaced; otherwise `AlreadyInProgress` is
    /// returned (default policy is coalesce).
    pub fn submit(
        &mut self,
        attempt: RedefinitionAttempt,
        coalesce: bool,
    ) -> Result<(), SubmitError> {
        if let Some(existing) = self.non_terminal.get(&attempt.class_name) {
            if coalesce && existing.state == AttemptState::Pending {
                self.non_terminal.insert(attempt.class_name.clone(), attempt);
                return Ok(());
            }
            return Err(SubmitError::AlreadyInProgress(attempt.class_name));
        }
        self.non_terminal.insert(attempt.class_name.clone(), attempt);
        Ok(())
    }

    pub fn get(&self, class_name: &str) -> Option<&RedefinitionAttempt> {
        self.non_terminal.get(class_name)
    }

    pub fn get_mut(&mut self, class_name: &str) -> Option<&mut RedefinitionAttempt> {
        self.non_terminal.get_mut(class_name)
    }

    /// Mark the class's attempt complete once it reaches a terminal
    /// state, freeing the slot for a future submission.
    pub fn retire(&mut self, class_name: &str) -> Option<RedefinitionAttempt> {
        match self.non_terminal.get(class_name) {
            Some(a) if a.state.is_terminal() => self.non_terminal.remove(class_name),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "attempt_tests.rs"]
mod tests;