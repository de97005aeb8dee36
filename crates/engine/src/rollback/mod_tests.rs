// SPDX-License-Identifier: MIT

use super::*;
use hotswap_core::SystemClock;
use hotswap_ports::{FakeVmPrimitive, InstanceKey, LoadedClass, RedefineBehavior};
use std::collections::BTreeMap;

fn instance(n: u64) -> InstanceKey {
    InstanceKey {
        identity_hash: n,
        type_tag: "Widget".into(),
    }
}

fn snapshot_for(vm: &FakeVmPrimitive, class_name: &str, original_bytecode: Vec<u8>) -> Snapshot {
    vm.load_class(LoadedClass::new(
        hotswap_bytecode::ClassMetadata {
            class_name: class_name.into(),
            supertype_name: None,
            interfaces: vec![],
            fields: vec![],
            methods: vec![],
        },
        original_bytecode.clone(),
    ));
    Snapshot::new(
        hotswap_core::SnapshotId::new(),
        class_name,
        original_bytecode,
        BTreeMap::new(),
        0,
        None,
    )
}

#[tokio::test]
async fn rollback_restores_bytecode_and_reports_success() {
    let vm = FakeVmPrimitive::new();
    let mut snapshot = snapshot_for(&vm, "Widget", vec![1, 2, 3]);
    let manager = RollbackManager::new(vm.clone());

    let event = manager
        .rollback(
            "Widget",
            &mut snapshot,
            ConflictStrategy::ForceRollback,
            ConflictStrategy::AbortOnConflict,
            &SystemClock,
        )
        .await;

    assert_eq!(
        event.payload,
        Payload::RolledBack {
            class_name: "Widget".into(),
            partial: false,
        }
    );
    assert!(snapshot.consumed);
    assert_eq!(vm.redefine_call_count("Widget"), 1);
}

#[tokio::test]
async fn a_vm_rejection_during_rollback_is_reported_as_rollback_failed() {
    let vm = FakeVmPrimitive::new();
    let mut snapshot = snapshot_for(&vm, "Widget", vec![1, 2, 3]);
    vm.set_redefine_behavior("Widget", RedefineBehavior::Reject);
    let manager = RollbackManager::new(vm);

    let event = manager
        .rollback(
            "Widget",
            &mut snapshot,
            ConflictStrategy::ForceRollback,
            ConflictStrategy::AbortOnConflict,
            &SystemClock,
        )
        .await;

    match event.payload {
        Payload::RollbackFailed { partial, .. } => assert!(!partial),
        other => panic!("expected RollbackFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn manual_resolution_on_bytecode_conflict_requests_intervention() {
    let vm = FakeVmPrimitive::new();
    let mut snapshot = snapshot_for(&vm, "Widget", vec![1, 2, 3]);
    vm.set_redefine_behavior("Widget", RedefineBehavior::Internal);
    let manager = RollbackManager::new(vm);

    let event = manager
        .rollback(
            "Widget",
            &mut snapshot,
            ConflictStrategy::ManualResolution,
            ConflictStrategy::AbortOnConflict,
            &SystemClock,
        )
        .await;

    assert!(matches!(event.payload, Payload::ManualInterventionRequired { .. }));
}

#[tokio::test]
async fn cascade_stops_at_the_first_failure() {
    let vm = FakeVmPrimitive::new();
    let mut chain = SnapshotChain::new(4);
    let s1 = snapshot_for(&vm, "Widget", vec![1]);
    chain.push(s1).expect("push head");
    vm.set_redefine_behavior("Widget", RedefineBehavior::Reject);

    let manager = RollbackManager::new(vm);
    let events = manager
        .cascade(
            "Widget",
            &mut chain,
            ConflictStrategy::ForceRollback,
            ConflictStrategy::AbortOnConflict,
            &SystemClock,
        )
        .await;

    assert_eq!(events.len(), 1);
    assert!(matches!(events[0].payload, Payload::RollbackFailed { .. }));
}

#[yare::parameterized(
    abort_on_conflict = { ConflictStrategy::AbortOnConflict },
    merge_changes = { ConflictStrategy::MergeChanges },
    prefer_rollback = { ConflictStrategy::PreferRollback },
    force_rollback = { ConflictStrategy::ForceRollback },
)]
fn instance_conflict_strategy_reports_partial_failure_on_unknown_instance(instance_conflict: ConflictStrategy) {
    tokio::runtime::Runtime::new().unwrap().block_on(async {
        let vm = FakeVmPrimitive::new();
        vm.load_class(LoadedClass::new(
            hotswap_bytecode::ClassMetadata {
                class_name: "Widget".into(),
                supertype_name: None,
                interfaces: vec![],
                fields: vec![],
                methods: vec![],
            },
            vec![1],
        ));
        let mut instance_state = BTreeMap::new();
        instance_state.insert(instance(1), hotswap_ports::FieldState::new());
        let mut snapshot = Snapshot::new(hotswap_core::SnapshotId::new(), "Widget", vec![1], instance_state, 0, None);

        let manager = RollbackManager::new(vm);
        let event = manager
            .rollback("Widget", &mut snapshot, ConflictStrategy::ForceRollback, instance_conflict, &SystemClock)
            .await;

        // Every non-ManualResolution, non-PreferCurrent strategy treats an
        // unresolvable per-instance write the same way: a partial failure.
        match event.payload {
            Payload::RollbackFailed { partial, .. } => assert!(partial),
            other => panic!("expected RollbackFailed for {instance_conflict:?}, got {other:?}"),
        }
    });
}

#[tokio::test]
async fn prefer_current_on_instance_conflict_skips_the_write_and_still_succeeds() {
    let vm = FakeVmPrimitive::new();
    vm.load_class(LoadedClass::new(
        hotswap_bytecode::ClassMetadata {
            class_name: "Widget".into(),
            supertype_name: None,
            interfaces: vec![],
            fields: vec![],
            methods: vec![],
        },
        vec![1],
    ));
    let mut instance_state = BTreeMap::new();
    instance_state.insert(instance(1), hotswap_ports::FieldState::new());
    let mut snapshot = Snapshot::new(hotswap_core::SnapshotId::new(), "Widget", vec![1], instance_state, 0, None);

    let manager = RollbackManager::new(vm);
    let event = manager
        .rollback(
            "Widget",
            &mut snapshot,
            ConflictStrategy::ForceRollback,
            ConflictStrategy::PreferCurrent,
            &SystemClock,
        )
        .await;

    assert!(matches!(event.payload, Payload::RolledBack { .. }));
}

#[tokio::test]
async fn instance_write_failure_with_abort_on_conflict_yields_partial_rollback_failed() {
    let vm = FakeVmPrimitive::new();
    vm.load_class(LoadedClass::new(
        hotswap_bytecode::ClassMetadata {
            class_name: "Widget".into(),
            supertype_name: None,
            interfaces: vec![],
            fields: vec![],
            methods: vec![],
        },
        vec![1],
    ));
    let mut instance_state = BTreeMap::new();
    instance_state.insert(instance(1), hotswap_ports::FieldState::new());
    let mut snapshot = Snapshot::new(hotswap_core::SnapshotId::new(), "Widget", vec![1], instance_state, 0, None);

    let manager = RollbackManager::new(vm);
    let event = manager
        .rollback(
            "Widget",
            &mut snapshot,
            ConflictStrategy::ForceRollback,
            ConflictStrategy::AbortOnConflict,
            &SystemClock,
        )
        .await;

    // instance(1) was never registered via add_instance, so the write fails.
    match event.payload {
        Payload::RollbackFailed { partial, .. } => assert!(partial),
        other => panic!("expected RollbackFailed, got {other:?}"),
    }
}