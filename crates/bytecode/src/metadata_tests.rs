// SPDX-License-Identifier: MIT

use super::*;

fn sample() -> ClassMetadata {
    ClassMetadata {
        class_name: "a.B".into(),
        supertype_name: Some("java.lang.Object".into()),
        interfaces: vec!["a.Runnable".into(), "a.Closeable".into()],
        fields: vec![FieldDescriptor {
            name: "count".into(),
            type_descriptor: "I".into(),
        }],
        methods: vec![MethodDescriptor {
            name: "run".into(),
            parameter_types: vec![],
            return_type: "V".into(),
        }],
    }
}

#[test]
fn fingerprint_is_deterministic() {
    let m = sample();
    assert_eq!(m.schema_fingerprint(), m.schema_fingerprint());
}

#[test]
fn fingerprint_ignores_interface_order() {
    let mut a = sample();
    let mut b = sample();
    b.interfaces.reverse();
    assert_eq!(a.schema_fingerprint(), b.schema_fingerprint());
    a.interfaces.clear();
    assert_ne!(a.schema_fingerprint(), b.schema_fingerprint());
}

#[test]
fn fingerprint_changes_when_a_field_is_added() {
    let a = sample();
    let mut b = sample();
    b.fields.push(FieldDescriptor {
        name: "x".into(),
        type_descriptor: "I".into(),
    });
    assert_ne!(a.schema_fingerprint(), b.schema_fingerprint());
}

#[test]
fn method_signature_ignores_the_body_by_construction() {
    // MethodDescriptor has no body field at all: two methods with the
    // same name/params/return are indistinguishable, which is exactly
    // the redefinability rule the validator relies on.
    let a = MethodDescriptor {
        name: "run".into(),
        parameter_types: vec![],
        return_type: "V".into(),
    };
    let b = a.clone();
    assert_eq!(a.signature(), b.signature());
}