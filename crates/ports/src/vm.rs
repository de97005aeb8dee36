// SPDX-License-Identifier: MIT

//! The abstract VM redefinition primitive. The core never talks to a
//! concrete VM; it talks to this trait, which a host embedding provides.

use crate::loaded_class::{FieldState, InstanceKey, LoadedClass};
use async_trait::async_trait;

#[derive(Debug, Clone, thiserror::Error)]
pub enum RedefineError {
    /// VM deemed the change incompatible despite core validation.
    #[error("VM rejected redefinition of {class_name}: {detail}")]
    Rejected { class_name: String, detail: String },
    /// VM reports the class is not currently loaded.
    #[error("VM reports {class_name} is not loaded")]
    NotLoaded { class_name: String },
    /// Any other VM-reported error.
    #[error("VM internal error redefining {class_name}: {detail}")]
    Internal { class_name: String, detail: String },
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("instance operation failed: {0}")]
pub struct InstanceError(pub String);

/// The VM-provided atomic operation boundary. Implementors must make
/// `redefine` atomic across the whole call: either the bytecode is fully
/// installed or nothing changes.
#[async_trait]
pub trait VmPrimitive: Clone + Send + Sync + 'static {
    async fn supports_redefine(&self) -> bool;
    async fn supports_retransform(&self) -> bool;
    async fn is_modifiable(&self, class_name: &str) -> bool;
    async fn enumerate_loaded_classes(&self) -> Vec<String>;
    async fn find_loaded(&self, class_name: &str) -> Option<LoadedClass>;

    /// Install new bytecode for an already-loaded class.
    async fn redefine(&self, class_name: &str, new_bytecode: &[u8]) -> Result<(), RedefineError>;

    /// Best-effort enumeration of live instances of a loaded class.
    async fn enumerate_instances(&self, class_name: &str) -> Vec<InstanceKey>;

    /// Reflective read of an instance's field state.
    async fn read_instance_state(&self, instance: &InstanceKey) -> Option<FieldState>;

    /// Reflective write of an instance's field state.
    async fn write_instance_state(
        &self,
        instance: &InstanceKey,
        state: &FieldState,
    ) -> Result<(), InstanceError>;

    /// Advisory; implementors may return `None` if the VM cannot answer.
    async fn instance_size(&self, _instance: &InstanceKey) -> Option<u64> {
        None
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum RedefineBehavior {
        Succeed,
        Reject,
        NotLoaded,
        Internal,
    }

    struct FakeVmState {
        loaded: HashMap<String, LoadedClass>,
        instances: HashMap<String, Vec<InstanceKey>>,
        instance_state: HashMap<InstanceKey, FieldState>,
        behavior: HashMap<String, RedefineBehavior>,
        redefine_calls: Vec<(String, Vec<u8>)>,
        supports_redefine: bool,
        failing_writes: std::collections::HashSet<InstanceKey>,
    }

    impl Default for FakeVmState {
        fn default() -> Self {
            Self {
                loaded: HashMap::new(),
                instances: HashMap::new(),
                instance_state: HashMap::new(),
                behavior: HashMap::new(),
                redefine_calls: Vec::new(),
                supports_redefine: true,
                failing_writes: std::collections::HashSet::new(),
            }
        }
    }

    /// An in-memory stand-in for a managed VM, for deterministic tests.
    #[derive(Clone, Default)]
    pub struct FakeVmPrimitive {
        inner: Arc<Mutex<FakeVmState>>,
    }

    impl FakeVmPrimitive {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn load_class(&self, class: LoadedClass) {
            self.inner.lock().loaded.insert(class.class_name.clone(), class);
        }

        pub fn add_instance(&self, class_name: &str, instance: InstanceKey, state: FieldState) {
            let mut inner = self.inner.lock();
            inner
                .instances
                .entry(class_name.to_string())
                .or_default()
                .push(instance.clone());
            inner.instance_state.insert(instance, state);
        }

        pub fn set_redefine_behavior(&self, class_name: &str, behavior: RedefineBehavior) {
            self.inner
                .lock()
                .behavior
                .insert(class_name.to_string(), behavior);
        }

        pub fn set_supports_redefine(&self, supported: bool) {
            self.inner.lock().supports_redefine = supported;
        }

        /// Force the next `write_instance_state` call for this instance to
        /// fail, even though its state is otherwise known. The failure is
        /// one-shot: it fires once, then the instance behaves normally
        /// again, for tests that need a deterministic transient
        /// per-instance write failure (e.g. reconciliation fails but a
        /// later rollback restore of the same instance succeeds).
        pub fn fail_next_write_for(&self, instance: InstanceKey) {
            self.inner.lock().failing_writes.insert(instance);
        }

        pub fn redefine_call_count(&self, class_name: &str) -> usize {
            self.inner
                .lock()
                .redefine_calls
                .iter()
                .filter(|(name, _)| name == class_name)
                .count()
        }
    }

    #[async_trait]
    impl VmPrimitive for FakeVmPrimitive {
        async fn supports_redefine(&self) -> bool {
            self.inner.lock().supports_redefine
        }

        async fn supports_retransform(&self) -> bool {
            true
        }

        async fn is_modifiable(&self, class_name: &str) -> bool {
            self.inner.lock().loaded.contains_key(class_name)
        }

        async fn enumerate_loaded_classes(&self) -> Vec<String> {
            self.inner.lock().loaded.keys().cloned().collect()
        }

        async fn find_loaded(&self, class_name: &str) -> Option<LoadedClass> {
            self.inner.lock().loaded.get(class_name).cloned()
        }

        async fn redefine(&self, class_name: &str, new_bytecode: &[u8]) -> Result<(), RedefineError> {
            let mut inner = self.inner.lock();
            inner
                .redefine_calls
                .push((class_name.to_string(), new_bytecode.to_vec()));
            match inner.behavior.get(class_name).copied() {
                Some(RedefineBehavior::Reject) => Err(RedefineError::Rejected {
                    class_name: class_name.to_string(),
                    detail: "fake VM configured to reject".into(),
                }),
                Some(RedefineBehavior::NotLoaded) => Err(RedefineError::NotLoaded {
                    class_name: class_name.to_string(),
                }),
                Some(RedefineBehavior::Internal) => Err(RedefineError::Internal {
                    class_name: class_name.to_string(),
                    detail: "fake VM internal failure".into(),
                }),
                Some(RedefineBehavior::Succeed) | None => {
                    if let Some(class) = inner.loaded.get_mut(class_name) {
                        class.bytecode = new_bytecode.to_vec();
                        Ok(())
                    } else {
                        Err(RedefineError::NotLoaded {
                            class_name: class_name.to_string(),
                        })
                    }
                }
            }
        }

        async fn enumerate_instances(&self, class_name: &str) -> Vec<InstanceKey> {
            self.inner
                .lock()
                .instances
                .get(class_name)
                .cloned()
                .unwrap_or_default()
        }

        async fn read_instance_state(&self, instance: &InstanceKey) -> Option<FieldState> {
            self.inner.lock().instance_state.get(instance).cloned()
        }

        async fn write_instance_state(
            &self,
            instance: &InstanceKey,
            state: &FieldState,
        ) -> Result<(), InstanceError> {
            let mut inner = self.inner.lock();
            if inner.failing_writes.remove(instance) {
                return Err(InstanceError(format!("write rejected for {instance:?}")));
            }
            if !inner.instance_state.contains_key(instance) {
                return Err(InstanceError(format!("unknown instance {instance:?}")));
            }
            inner.instance_state.insert(instance.clone(), state.clone());
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "vm_tests.rs"]
mod tests;