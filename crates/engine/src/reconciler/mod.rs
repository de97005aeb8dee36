// SPDX-License-Identifier: MIT

//! Instance Reconciler: brings already-constructed instances in line
//! with a class's new bytecode. Best-effort per instance; the aggregate
//! only counts as success when every instance updated cleanly.

use crate::event::{Event, Payload};
use hotswap_core::{Clock, ReconcileStrategy};
use hotswap_ports::{FieldState, VmPrimitive};
use hotswap_storage::Snapshot;
use parking_lot::Mutex;
use std::collections::HashMap;

pub struct InstanceReconciler<V> {
    vm: V,
    /// Last generation successfully reconciled per class, for idempotence.
    reconciled: Mutex<HashMap<String, u64>>,
}

impl<V: VmPrimitive> InstanceReconciler<V> {
    pub fn new(vm: V) -> Self {
        Self {
            vm,
            reconciled: Mutex::new(HashMap::new()),
        }
    }

    /// Reconcile all live instances of `class_name` against its new
    /// bytecode/generation. Calling this twice with an unchanged
    /// generation is a no-op on the second call.
    pub async fn reconcile(
        &self,
        class_name: &str,
        strategy: ReconcileStrategy,
        generation: u64,
        clock: &dyn Clock,
    ) -> Event {
        let now = clock.epoch_ms();
        if self.reconciled.lock().get(class_name).copied() == Some(generation) {
            return Event::new(
                now,
                Payload::InstancesUpdated {
                    class_name: class_name.to_string(),
                    count: 0,
                },
            );
        }

        let instances = self.vm.enumerate_instances(class_name).await;
        let mut succeeded = 0usize;
        let mut first_error: Option<String> = None;

        for instance in &instances {
            let outcome = match strategy {
                ReconcileStrategy::NoUpdate => Ok(()),
                ReconcileStrategy::FactoryReset => {
                    self.vm.write_instance_state(instance, &FieldState::new()).await
                }
                ReconcileStrategy::ReflectiveRestore
                | ReconcileStrategy::ProxyRefresh
                | ReconcileStrategy::Automatic => match self.vm.read_instance_state(instance).await {
                    Some(state) => self.vm.write_instance_state(instance, &state).await,
                    None => Ok(()),
                },
            };
            match outcome {
                Ok(()) => succeeded += 1,
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e.0);
                    }
                }
            }
        }

        if let Some(first_error) = first_error {
            return Event::new(
                now,
                Payload::InstanceUpdateFailed {
                    class_name: class_name.to_string(),
                    partial_success: succeeded,
                    first_error,
                },
            );
        }

        self.reconciled.lock().insert(class_name.to_string(), generation);
        Event::new(
            now,
            Payload::InstancesUpdated {
                class_name: class_name.to_string(),
                count: succeeded,
            },
        )
    }
}

/// Restore instance field state from a snapshot taken before a failed
/// redefinition, used by the Rollback Manager after bytecode is restored.
pub async fn restore_from_snapshot<V: VmPrimitive>(vm: &V, snapshot: &Snapshot) -> Result<usize, String> {
    let mut restored = 0usize;
    for (instance, state) in &snapshot.instance_state {
        vm.write_instance_state(instance, state)
            .await
            .map_err(|e| e.0)?;
        restored += 1;
    }
    Ok(restored)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;