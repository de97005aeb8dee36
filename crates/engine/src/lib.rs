// SPDX-License-Identifier: MIT

//! hotswap-engine: the six pipeline components wired together over the
//! Event Bus. Each component is independently usable; [`Pipeline`] is
//! the reference wiring that drives one class's artifact change all the
//! way from a filesystem notification to a terminal event.
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod bus;
pub mod coordinator;
pub mod event;
pub mod extractor;
pub mod reconciler;
pub mod rollback;
pub mod validator;
pub mod watch;

pub use bus::{run_sink_relay, EventBus};
pub use coordinator::{RedefineOutcome, RedefinitionCoordinator};
pub use event::{Event, ExtractionFailureReason, FailureCategory, Payload, RejectionReason};
pub use extractor::MetadataExtractor;
pub use reconciler::InstanceReconciler;
pub use rollback::RollbackManager;
pub use validator::CompatibilityValidator;
pub use watch::{probe, SessionState, WatchSession};

use hotswap_bytecode::ClassArtifact;
use hotswap_core::{Clock, Config};
use hotswap_ports::VmPrimitive;
use hotswap_storage::AttemptState;

/// Reference end-to-end wiring of all six components for a single class
/// name. Real embeddings are free to run the components independently
/// (e.g. across an actor-per-component dispatcher); this type exists so
/// there's one obvious place to drive an end-to-end scenario from.
pub struct Pipeline<V> {
    pub extractor: MetadataExtractor,
    pub validator: CompatibilityValidator,
    pub coordinator: RedefinitionCoordinator<V>,
    pub reconciler: InstanceReconciler<V>,
    pub rollback: RollbackManager<V>,
    config: Config,
}

impl<V: VmPrimitive> Pipeline<V> {
    pub fn new(vm: V, config: Config) -> Self {
        Self {
            extractor: MetadataExtractor::new(config.metadata),
            validator: CompatibilityValidator::new(),
            coordinator: RedefinitionCoordinator::new(vm.clone(), config.coordinator, config.snapshot),
            reconciler: InstanceReconciler::new(vm.clone()),
            rollback: RollbackManager::new(vm),
            config,
        }
    }

    /// Carry one artifact change all the way through the pipeline,
    /// returning every event emitted along the way in causal order.
    pub async fn handle_artifact_change(&self, artifact: ClassArtifact, clock: &dyn Clock) -> Vec<Event> {
        let mut events = Vec::new();

        let extracted = self.extractor.extract(&artifact, clock);
        let (class_name, new_metadata, new_bytecode) = match &extracted.payload {
            Payload::MetadataExtracted { class_name, metadata, .. } => {
                (class_name.clone(), metadata.clone(), artifact.bytes.clone())
            }
            _ => {
                events.push(extracted);
                return events;
            }
        };
        events.push(extracted);

        let loaded = self.coordinator.vm_find_loaded(&class_name).await;
        let validated = self
            .validator
            .validate(&new_metadata, new_bytecode.clone(), loaded.as_ref(), clock);
        let was_validated = matches!(validated.payload, Payload::Validated { .. });
        events.push(validated);
        if !was_validated {
            return events;
        }

        let Ok(_attempt_id) = self.coordinator.submit(&class_name, artifact, clock) else {
            return events;
        };

        let Some(outcome) = self.coordinator.run(&class_name, new_bytecode, clock).await else {
            return events;
        };
        events.extend(outcome.events);
        if !outcome.succeeded {
            return events;
        }

        let reconcile_event = self
            .reconciler
            .reconcile(
                &class_name,
                self.config.reconciler.default_strategy,
                outcome.generation,
                clock,
            )
            .await;
        let reconciled_ok = matches!(reconcile_event.payload, Payload::InstancesUpdated { .. });
        events.push(reconcile_event);
        self.coordinator.finish_reconciliation(&class_name, reconciled_ok, clock);

        if reconciled_ok {
            return events;
        }

        if !self.coordinator.begin_rollback(&class_name) {
            return events;
        }
        let Some(mut chain) = self.coordinator.take_chain(&class_name) else {
            return events;
        };
        let rollback_events = self
            .rollback
            .cascade(
                &class_name,
                &mut chain,
                self.config.rollback.bytecode_conflict,
                self.config.rollback.instance_conflict,
                clock,
            )
            .await;
        let rolled_back = rollback_events
            .last()
            .map(|e| matches!(e.payload, Payload::RolledBack { .. }))
            .unwrap_or(false);
        self.coordinator.put_chain(&class_name, chain);
        self.coordinator.finish_rollback(&class_name, rolled_back);
        events.extend(rollback_events);

        events
    }

    pub fn attempt_state(&self, class_name: &str) -> Option<AttemptState> {
        self.coordinator.status(class_name)
    }
}