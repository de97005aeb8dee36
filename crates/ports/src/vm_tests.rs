// SPDX-License-Identifier: MIT

#![allow(clippy::unwrap_used)]

use super::fake::{FakeVmPrimitive, RedefineBehavior};
use super::*;
use hotswap_bytecode::{ClassMetadata, MethodDescriptor};

fn meta(name: &str) -> ClassMetadata {
    ClassMetadata {
        class_name: name.into(),
        supertype_name: None,
        interfaces: vec![],
        fields: vec![],
        methods: vec![MethodDescriptor {
            name: "run".into(),
            parameter_types: vec![],
            return_type: "V".into(),
        }],
    }
}

#[tokio::test]
async fn redefine_succeeds_by_default() {
    let vm = FakeVmPrimitive::new();
    vm.load_class(LoadedClass::new(meta("a.B"), vec![1, 2, 3]));
    vm.redefine("a.B", &[4, 5, 6]).await.unwrap();
    let loaded = vm.find_loaded("a.B").await.unwrap();
    assert_eq!(loaded.bytecode, vec![4, 5, 6]);
    assert_eq!(vm.redefine_call_count("a.B"), 1);
}

#[tokio::test]
async fn redefine_on_unloaded_class_reports_not_loaded() {
    let vm = FakeVmPrimitive::new();
    let err = vm.redefine("a.Missing", &[1]).await.unwrap_err();
    assert!(matches!(err, RedefineError::NotLoaded { .. }));
}

#[tokio::test]
async fn configured_rejection_is_reported_as_rejected() {
    let vm = FakeVmPrimitive::new();
    vm.load_class(LoadedClass::new(meta("a.B"), vec![1]));
    vm.set_redefine_behavior("a.B", RedefineBehavior::Reject);
    let err = vm.redefine("a.B", &[2]).await.unwrap_err();
    assert!(matches!(err, RedefineError::Rejected { .. }));
}

#[tokio::test]
async fn instance_state_round_trips_through_write_then_read() {
    use crate::loaded_class::{FieldValue, InstanceKey};
    let vm = FakeVmPrimitive::new();
    let key = InstanceKey {
        identity_hash: 1,
        type_tag: "a.B".into(),
    };
    let mut state = FieldState::new();
    state.insert("count".into(), FieldValue::Int(1));
    vm.add_instance("a.B", key.clone(), state.clone());

    let mut new_state = state.clone();
    new_state.insert("count".into(), FieldValue::Int(2));
    vm.write_instance_state(&key, &new_state).await.unwrap();

    let read_back = vm.read_instance_state(&key).await.unwrap();
    assert_eq!(read_back, new_state);
}