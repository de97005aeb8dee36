// SPDX-License-Identifier: MIT

//! End-to-end scenarios driven through `Pipeline` with the fake VM so
//! outcomes are deterministic.
#![allow(clippy::unwrap_used)]

use hotswap_bytecode::{encode, ClassArtifact, ClassMetadata, FieldDescriptor, MethodDescriptor};
use hotswap_core::{Config, ConflictStrategy, ReconcileStrategy, SystemClock};
use hotswap_engine::{Event, Payload, Pipeline};
use hotswap_ports::{FakeVmPrimitive, RedefineBehavior};
use hotswap_ports::{FieldState, InstanceKey, LoadedClass};

fn base_metadata(name: &str) -> ClassMetadata {
    ClassMetadata {
        class_name: name.into(),
        supertype_name: None,
        interfaces: vec![],
        fields: vec![FieldDescriptor {
            name: "count".into(),
            type_descriptor: "int".into(),
        }],
        methods: vec![MethodDescriptor {
            name: "increment".into(),
            parameter_types: vec![],
            return_type: "void".into(),
        }],
    }
}

fn instance(tag: &str, hash: u64) -> InstanceKey {
    InstanceKey {
        identity_hash: hash,
        type_tag: tag.into(),
    }
}

fn artifact_for(meta: &ClassMetadata) -> ClassArtifact {
    ClassArtifact::new(format!("/classes/{}.hwc", meta.class_name), 1, encode(meta))
}

fn pipeline_with_loaded(meta: ClassMetadata, bytecode: Vec<u8>) -> (Pipeline<FakeVmPrimitive>, FakeVmPrimitive) {
    let vm = FakeVmPrimitive::new();
    vm.load_class(LoadedClass::new(meta, bytecode));
    let pipeline = Pipeline::new(vm.clone(), Config::default());
    (pipeline, vm)
}

fn has(events: &[Event], f: impl Fn(&Payload) -> bool) -> bool {
    events.iter().any(|e| f(&e.payload))
}

#[tokio::test]
async fn scenario_1_happy_path_redefinition() {
    let meta = base_metadata("a.Widget");
    let (pipeline, vm) = pipeline_with_loaded(meta.clone(), encode(&meta));
    vm.add_instance("a.Widget", instance("a.Widget", 1), FieldState::new());

    let new_meta = meta.clone(); // shape unchanged, only bytecode differs
    let events = pipeline
        .handle_artifact_change(artifact_for(&new_meta), &SystemClock)
        .await;

    assert!(has(&events, |p| matches!(p, Payload::MetadataExtracted { .. })));
    assert!(has(&events, |p| matches!(p, Payload::Validated { .. })));
    assert!(has(&events, |p| matches!(p, Payload::RedefinitionSucceeded { .. })));
    assert!(has(&events, |p| matches!(p, Payload::InstancesUpdated { count: 1, .. })));
    assert!(vm.redefine_call_count("a.Widget") >= 1);
}

#[tokio::test]
async fn scenario_2_validation_rejection_field_added() {
    let meta = base_metadata("a.Widget");
    let (pipeline, _vm) = pipeline_with_loaded(meta.clone(), encode(&meta));

    let mut changed = meta.clone();
    changed.fields.push(FieldDescriptor {
        name: "x".into(),
        type_descriptor: "int".into(),
    });

    let events = pipeline
        .handle_artifact_change(artifact_for(&changed), &SystemClock)
        .await;

    assert!(has(&events, |p| matches!(p, Payload::MetadataExtracted { .. })));
    match events.last().unwrap().payload {
        Payload::ValidationRejected { ref reasons, .. } => {
            assert!(reasons
                .iter()
                .any(|r| matches!(r, hotswap_engine::RejectionReason::FieldAdded { name } if name == "x")));
        }
        ref other => panic!("expected ValidationRejected, got {other:?}"),
    }
    assert!(!has(&events, |p| matches!(p, Payload::RedefinitionStarted { .. })));
}

#[tokio::test]
async fn scenario_3_vm_rejection_during_redefinition() {
    let meta = base_metadata("a.Widget");
    let (pipeline, vm) = pipeline_with_loaded(meta.clone(), encode(&meta));
    vm.set_redefine_behavior("a.Widget", RedefineBehavior::Reject);

    let events = pipeline
        .handle_artifact_change(artifact_for(&meta), &SystemClock)
        .await;

    assert!(has(&events, |p| matches!(p, Payload::Validated { .. })));
    assert!(has(&events, |p| matches!(p, Payload::RedefinitionStarted { .. })));
    match events.last().unwrap().payload {
        Payload::RedefinitionFailed { category, .. } => {
            assert_eq!(category, hotswap_engine::FailureCategory::VmRejected)
        }
        ref other => panic!("expected RedefinitionFailed, got {other:?}"),
    }
    assert_eq!(pipeline.coordinator.snapshot_chain_len("a.Widget"), 0);
}

#[tokio::test]
async fn scenario_4_reconciler_failure_triggers_rollback() {
    let meta = base_metadata("a.Widget");
    let vm = FakeVmPrimitive::new();
    vm.load_class(LoadedClass::new(meta.clone(), encode(&meta)));
    // Two instances; the second's reflective write fails exactly once
    // during reconciliation (after the pre-redefine snapshot already
    // captured its state), so reconciliation reports a partial failure
    // and rollback follows. The one-shot failure is consumed by then, so
    // the rollback's own restore write of the same instance succeeds.
    let failing = instance("a.Widget", 2);
    vm.add_instance("a.Widget", instance("a.Widget", 1), FieldState::new());
    vm.add_instance("a.Widget", failing.clone(), FieldState::new());

    let mut config = Config::default();
    config.reconciler.default_strategy = ReconcileStrategy::ReflectiveRestore;
    config.rollback.instance_conflict = ConflictStrategy::AbortOnConflict;
    config.rollback.bytecode_conflict = ConflictStrategy::ForceRollback;
    let pipeline = Pipeline::new(vm.clone(), config);

    vm.fail_next_write_for(failing);
    let events = pipeline
        .handle_artifact_change(artifact_for(&meta), &SystemClock)
        .await;

    assert!(has(&events, |p| matches!(p, Payload::RedefinitionSucceeded { .. })));
    match events
        .iter()
        .find(|e| matches!(e.payload, Payload::InstanceUpdateFailed { .. }))
        .map(|e| &e.payload)
    {
        Some(Payload::InstanceUpdateFailed { partial_success, .. }) => assert_eq!(*partial_success, 1),
        other => panic!("expected InstanceUpdateFailed, got {other:?}"),
    }
    assert!(has(&events, |p| matches!(p, Payload::RolledBack { .. })));
}

#[tokio::test]
async fn scenario_5_debouncing_collapses_a_burst() {
    use hotswap_core::WatchConfig;
    use hotswap_engine::watch::probe::fake::InMemoryArtifactProbe;
    use hotswap_engine::WatchSession;
    use hotswap_ports::{FsEventKind, RawFsEvent};
    use std::sync::Arc;

    let dir = tempfile::tempdir().unwrap();
    let probe = Arc::new(InMemoryArtifactProbe::new());
    let path = dir.path().join("B.hwc");
    probe.put(&path, 1, vec![1, 2, 3]);

    let config = WatchConfig {
        directories: vec![dir.path().to_path_buf()],
        debounce_window_ms: 50,
        ..Default::default()
    };
    let mut session = WatchSession::new(config, probe);
    session.register(dir.path(), None, false).unwrap();

    for _ in 0..6 {
        session.ingest(
            RawFsEvent {
                path: path.clone(),
                kind: FsEventKind::Modified,
            },
            &SystemClock,
        );
    }
    std::thread::sleep(std::time::Duration::from_millis(60));
    let events = session.quiesce(&SystemClock);

    assert_eq!(
        events.iter().filter(|e| matches!(e.payload, Payload::ArtifactChanged { .. })).count(),
        1
    );
}

#[tokio::test]
async fn scenario_6_per_class_serialization_of_two_attempts() {
    let meta = base_metadata("a.B");
    let (pipeline, vm) = pipeline_with_loaded(meta.clone(), encode(&meta));

    let first = artifact_for(&meta);
    let events_1 = pipeline.handle_artifact_change(first, &SystemClock).await;
    assert!(has(&events_1, |p| matches!(p, Payload::RedefinitionSucceeded { .. })));
    assert_eq!(vm.redefine_call_count("a.B"), 1);

    let second = artifact_for(&meta);
    let events_2 = pipeline.handle_artifact_change(second, &SystemClock).await;
    assert!(has(&events_2, |p| matches!(p, Payload::RedefinitionSucceeded { .. })));
    assert_eq!(vm.redefine_call_count("a.B"), 2);
}