// SPDX-License-Identifier: MIT

//! Redefinition Coordinator: drives a validated change through
//! snapshot capture and the VM's atomic redefinition call. At most one
//! non-terminal attempt per class name at any instant.
//!
//! Reconciliation and rollback are owned by their own components; this
//! type only carries the attempt as far as `Reconciling` and exposes
//! [`Self::finish_reconciliation`]/[`Self::begin_rollback`] so the
//! orchestrating layer can fold their outcomes back into the same state
//! machine.

use crate::event::{Event, FailureCategory, Payload};
use hotswap_bytecode::ClassArtifact;
use hotswap_core::{AttemptId, Clock, CoordinatorConfig, SnapshotConfig, SnapshotId};
use hotswap_ports::{RedefineError, VmPrimitive};
use hotswap_storage::{AttemptRegistry, AttemptState, RedefinitionAttempt, Snapshot, SnapshotChain, SubmitError};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};

/// What `run` accomplished, for the orchestrator to continue with
/// reconciliation (on success) or skip straight to reporting (on failure).
pub struct RedefineOutcome {
    pub events: Vec<Event>,
    pub succeeded: bool,
    pub generation: u64,
    pub affected_instances: usize,
}

pub struct RedefinitionCoordinator<V> {
    vm: V,
    registry: Mutex<AttemptRegistry>,
    chains: Mutex<HashMap<String, SnapshotChain>>,
    generations: Mutex<HashMap<String, u64>>,
    config: CoordinatorConfig,
    snapshot_config: SnapshotConfig,
}

impl<V: VmPrimitive> RedefinitionCoordinator<V> {
    pub fn new(vm: V, config: CoordinatorConfig, snapshot_config: SnapshotConfig) -> Self {
        Self {
            vm,
            registry: Mutex::new(AttemptRegistry::new()),
            chains: Mutex::new(HashMap::new()),
            generations: Mutex::new(HashMap::new()),
            config,
            snapshot_config,
        }
    }

    /// Non-blocking: records the attempt and returns its id immediately.
    pub fn submit(
        &self,
        class_name: &str,
        artifact: ClassArtifact,
        clock: &dyn Clock,
    ) -> Result<AttemptId, SubmitError> {
        let id = AttemptId::new();
        let deadline_ms = clock.epoch_ms() + self.config.deadline().as_millis() as u64;
        let attempt = RedefinitionAttempt::new(id, class_name, artifact, deadline_ms);
        self.registry.lock().submit(attempt, self.config.coalesce_pending)?;
        Ok(id)
    }

    pub fn status(&self, class_name: &str) -> Option<AttemptState> {
        self.registry.lock().get(class_name).map(|a| a.state)
    }

    /// Exposed for callers that need to validate against the currently
    /// loaded class ahead of `submit`/`run`, e.g. the top-level pipeline.
    pub async fn vm_find_loaded(&self, class_name: &str) -> Option<hotswap_ports::LoadedClass> {
        self.vm.find_loaded(class_name).await
    }

    /// Drive the attempt from `Pending` through the VM redefinition call.
    /// Returns no events (and leaves the attempt untouched) if there is
    /// no pending attempt for this class.
    pub async fn run(
        &self,
        class_name: &str,
        new_bytecode: Vec<u8>,
        clock: &dyn Clock,
    ) -> Option<RedefineOutcome> {
        let mut events = Vec::new();

        // The VM is a single process-wide collaborator; while it reports
        // itself unavailable the attempt just stays `Pending` for a later
        // `run` call to pick back up, rather than failing outright.
        if !self.vm.supports_redefine().await {
            self.registry.lock().get(class_name)?;
            tracing::warn!(class_name, "VM redefinition primitive unavailable, pausing attempt");
            return Some(RedefineOutcome {
                events: vec![Event::new(
                    clock.epoch_ms(),
                    Payload::VmUnavailable {
                        class_name: class_name.to_string(),
                    },
                )],
                succeeded: false,
                generation: 0,
                affected_instances: 0,
            });
        }

        {
            let mut registry = self.registry.lock();
            let attempt = registry.get_mut(class_name)?;
            attempt.transition(AttemptState::Validating).ok()?;
        }

        let deadline_ms = {
            let registry = self.registry.lock();
            registry.get(class_name)?.deadline_ms
        };
        if clock.epoch_ms() >= deadline_ms {
            let mut registry = self.registry.lock();
            if let Some(attempt) = registry.get_mut(class_name) {
                let _ = attempt.transition(AttemptState::Failed);
            }
            registry.retire(class_name);
            events.push(Event::new(
                clock.epoch_ms(),
                Payload::RedefinitionFailed {
                    class_name: class_name.to_string(),
                    category: FailureCategory::Timeout,
                    detail: "deadline exceeded before redefining started".into(),
                },
            ));
            return Some(RedefineOutcome {
                events,
                succeeded: false,
                generation: 0,
                affected_instances: 0,
            });
        }

        let Some(loaded) = self.vm.find_loaded(class_name).await else {
            let mut registry = self.registry.lock();
            if let Some(attempt) = registry.get_mut(class_name) {
                let _ = attempt.transition(AttemptState::Failed);
            }
            registry.retire(class_name);
            events.push(Event::new(
                clock.epoch_ms(),
                Payload::RedefinitionFailed {
                    class_name: class_name.to_string(),
                    category: FailureCategory::NotLoaded,
                    detail: "class not loaded at snapshot time".into(),
                },
            ));
            return Some(RedefineOutcome {
                events,
                succeeded: false,
                generation: 0,
                affected_instances: 0,
            });
        };

        let instance_keys = self.vm.enumerate_instances(class_name).await;
        let mut instance_state = BTreeMap::new();
        for key in &instance_keys {
            if let Some(state) = self.vm.read_instance_state(key).await {
                instance_state.insert(key.clone(), state);
            }
        }

        let previous_head = {
            let chains = self.chains.lock();
            chains.get(class_name).and_then(|c| c.head()).map(|s| s.id)
        };
        let snapshot = Snapshot::new(
            SnapshotId::new(),
            class_name,
            loaded.bytecode.clone(),
            instance_state,
            clock.epoch_ms(),
            previous_head,
        );
        let snapshot_id = snapshot.id;

        {
            let mut chains = self.chains.lock();
            let chain = chains
                .entry(class_name.to_string())
                .or_insert_with(|| SnapshotChain::new(self.snapshot_config.chain_max_length));
            // An eviction-driven chain never fails to push; a cycle could
            // only arise from a corrupted previous-id, which can't happen
            // here since `previous_head` was just read from this chain.
            let _ = chain.push(snapshot);
        }

        {
            let mut registry = self.registry.lock();
            if let Some(attempt) = registry.get_mut(class_name) {
                attempt.snapshot_id = Some(snapshot_id);
                let _ = attempt.transition(AttemptState::Snapshotting);
                let _ = attempt.transition(AttemptState::Redefining);
            }
        }

        events.push(Event::new(
            clock.epoch_ms(),
            Payload::RedefinitionStarted {
                class_name: class_name.to_string(),
            },
        ));

        let started_ms = clock.epoch_ms();
        match self.vm.redefine(class_name, &new_bytecode).await {
            Ok(()) => {
                let generation = {
                    let mut generations = self.generations.lock();
                    let next = generations.get(class_name).copied().unwrap_or(loaded.generation) + 1;
                    generations.insert(class_name.to_string(), next);
                    next
                };
                {
                    let mut registry = self.registry.lock();
                    if let Some(attempt) = registry.get_mut(class_name) {
                        let _ = attempt.transition(AttemptState::Reconciling);
                    }
                }
                tracing::info!(class_name, generation, affected = instance_keys.len(), "redefinition succeeded");
                events.push(Event::new(
                    clock.epoch_ms(),
                    Payload::RedefinitionSucceeded {
                        class_name: class_name.to_string(),
                        affected_instances: instance_keys.len(),
                        duration_ms: clock.epoch_ms().saturating_sub(started_ms),
                    },
                ));
                Some(RedefineOutcome {
                    events,
                    succeeded: true,
                    generation,
                    affected_instances: instance_keys.len(),
                })
            }
            Err(e) => {
                let category = match &e {
                    RedefineError::Rejected { .. } => FailureCategory::VmRejected,
                    RedefineError::NotLoaded { .. } => FailureCategory::NotLoaded,
                    RedefineError::Internal { .. } => FailureCategory::Internal,
                };
                if !matches!(e, RedefineError::Internal { .. }) {
                    self.chains
                        .lock()
                        .get_mut(class_name)
                        .and_then(|c| c.discard(&snapshot_id));
                }
                {
                    let mut registry = self.registry.lock();
                    if let Some(attempt) = registry.get_mut(class_name) {
                        let _ = attempt.transition(AttemptState::Failed);
                    }
                    registry.retire(class_name);
                }
                tracing::warn!(class_name, ?category, detail = %e, "redefinition failed");
                events.push(Event::new(
                    clock.epoch_ms(),
                    Payload::RedefinitionFailed {
                        class_name: class_name.to_string(),
                        category,
                        detail: e.to_string(),
                    },
                ));
                Some(RedefineOutcome {
                    events,
                    succeeded: false,
                    generation: 0,
                    affected_instances: 0,
                })
            }
        }
    }

    /// Fold the reconciler's outcome back into the attempt's state
    /// machine. On success this reaches the terminal `Succeeded` state and
    /// retires the attempt; on failure it stops at `Failed` without
    /// retiring, so a caller can still `begin_rollback` against it.
    pub fn finish_reconciliation(&self, class_name: &str, reconciliation_ok: bool, clock: &dyn Clock) {
        let mut registry = self.registry.lock();
        if let Some(attempt) = registry.get_mut(class_name) {
            let to = if reconciliation_ok {
                AttemptState::Succeeded
            } else {
                AttemptState::Failed
            };
            let _ = attempt.transition(to);
        }
        if reconciliation_ok {
            registry.retire(class_name);
        }
        let _ = clock;
    }

    /// Move a `Failed` attempt into rollback, for the orchestrator to
    /// then drive with a `RollbackManager`.
    pub fn begin_rollback(&self, class_name: &str) -> bool {
        let mut registry = self.registry.lock();
        match registry.get_mut(class_name) {
            Some(attempt) => attempt.transition(AttemptState::RollingBack).is_ok(),
            None => false,
        }
    }

    pub fn finish_rollback(&self, class_name: &str, rolled_back: bool) {
        let mut registry = self.registry.lock();
        if let Some(attempt) = registry.get_mut(class_name) {
            let to = if rolled_back {
                AttemptState::RolledBack
            } else {
                AttemptState::RollbackFailed
            };
            let _ = attempt.transition(to);
        }
        registry.retire(class_name);
    }

    pub fn snapshot_chain_len(&self, class_name: &str) -> usize {
        self.chains.lock().get(class_name).map(SnapshotChain::len).unwrap_or(0)
    }

    pub fn take_chain(&self, class_name: &str) -> Option<SnapshotChain> {
        self.chains.lock().remove(class_name)
    }

    pub fn put_chain(&self, class_name: &str, chain: SnapshotChain) {
        self.chains.lock().insert(class_name.to_string(), chain);
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;