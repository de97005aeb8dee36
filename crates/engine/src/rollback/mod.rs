// SPDX-License-Identifier: MIT

//! Rollback Manager: restores a class (and, on request, a whole
//! snapshot chain) to a prior pre-image. Bytecode is staged before
//! instances; a failure partway through is reported as partial.

use crate::event::{Event, Payload};
use hotswap_core::{Clock, ConflictStrategy};
use hotswap_ports::VmPrimitive;
use hotswap_storage::{Snapshot, SnapshotChain};

pub struct RollbackManager<V> {
    vm: V,
}

impl<V: VmPrimitive> RollbackManager<V> {
    pub fn new(vm: V) -> Self {
        Self { vm }
    }

    /// Roll a single snapshot back: VM bytecode first, then per-instance
    /// reflective restore. `bytecode_conflict`/`instance_conflict` pick
    /// how to react when either stage can't simply proceed.
    pub async fn rollback(
        &self,
        class_name: &str,
        snapshot: &mut Snapshot,
        bytecode_conflict: ConflictStrategy,
        instance_conflict: ConflictStrategy,
        clock: &dyn Clock,
    ) -> Event {
        let now = clock.epoch_ms();

        if let Err(e) = self.vm.redefine(class_name, &snapshot.original_bytecode).await {
            if bytecode_conflict == ConflictStrategy::ManualResolution {
                return Event::new(
                    now,
                    Payload::ManualInterventionRequired {
                        class_name: class_name.to_string(),
                        detail: e.to_string(),
                    },
                );
            }
            return Event::new(
                now,
                Payload::RollbackFailed {
                    class_name: class_name.to_string(),
                    reason: e.to_string(),
                    partial: false,
                },
            );
        }

        let mut conflict: Option<String> = None;
        for (instance, state) in &snapshot.instance_state {
            if let Err(e) = self.vm.write_instance_state(instance, state).await {
                match instance_conflict {
                    ConflictStrategy::ManualResolution => {
                        return Event::new(
                            now,
                            Payload::ManualInterventionRequired {
                                class_name: class_name.to_string(),
                                detail: e.0,
                            },
                        );
                    }
                    ConflictStrategy::PreferCurrent => continue,
                    _ => {
                        if conflict.is_none() {
                            conflict = Some(e.0);
                        }
                    }
                }
            }
        }

        snapshot.consumed = true;
        match conflict {
            Some(reason) => Event::new(
                now,
                Payload::RollbackFailed {
                    class_name: class_name.to_string(),
                    reason,
                    partial: true,
                },
            ),
            None => Event::new(
                now,
                Payload::RolledBack {
                    class_name: class_name.to_string(),
                    partial: false,
                },
            ),
        }
    }

    /// Roll back an entire chain, most-recent snapshot first, stopping at
    /// the first snapshot that fails or requires manual intervention.
    pub async fn cascade(
        &self,
        class_name: &str,
        chain: &mut SnapshotChain,
        bytecode_conflict: ConflictStrategy,
        instance_conflict: ConflictStrategy,
        clock: &dyn Clock,
    ) -> Vec<Event> {
        let ids: Vec<_> = chain.iter().map(|s| s.id).collect();
        let mut events = Vec::with_capacity(ids.len());
        for id in ids {
            let Some(snapshot) = chain.get_mut(&id) else {
                continue;
            };
            let event = self
                .rollback(class_name, snapshot, bytecode_conflict, instance_conflict, clock)
                .await;
            let stop = matches!(
                event.payload,
                Payload::RollbackFailed { .. } | Payload::ManualInterventionRequired { .. }
            );
            events.push(event);
            if stop {
                break;
            }
        }
        events
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;