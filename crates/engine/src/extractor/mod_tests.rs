// SPDX-License-Identifier: MIT

use super::*;
use hotswap_bytecode::metadata::{FieldDescriptor, MethodDescriptor};
use hotswap_bytecode::{encode, ClassMetadata};
use hotswap_core::SystemClock;

fn sample_bytes() -> Vec<u8> {
    encode(&ClassMetadata {
        class_name: "com.example.Widget".into(),
        supertype_name: Some("java.lang.Object".into()),
        interfaces: vec![],
        fields: vec![FieldDescriptor {
            name: "count".into(),
            type_descriptor: "I".into(),
        }],
        methods: vec![MethodDescriptor {
            name: "render".into(),
            parameter_types: vec![],
            return_type: "V".into(),
        }],
    })
}

#[test]
fn extracting_a_well_formed_artifact_yields_metadata_extracted() {
    let extractor = MetadataExtractor::new(MetadataConfig::default());
    let artifact = ClassArtifact::new("/w/Widget.class", 1, sample_bytes());

    let event = extractor.extract(&artifact, &SystemClock);
    match event.payload {
        Payload::MetadataExtracted { class_name, from_cache, .. } => {
            assert_eq!(class_name, "com.example.Widget");
            assert!(!from_cache);
        }
        other => panic!("expected MetadataExtracted, got {other:?}"),
    }
}

#[test]
fn a_second_extraction_of_the_same_artifact_is_served_from_cache() {
    let extractor = MetadataExtractor::new(MetadataConfig::default());
    let artifact = ClassArtifact::new("/w/Widget.class", 1, sample_bytes());

    let first = extractor.extract(&artifact, &SystemClock);
    let second = extractor.extract(&artifact, &SystemClock);

    assert!(matches!(
        first.payload,
        Payload::MetadataExtracted { from_cache: false, .. }
    ));
    match second.payload {
        Payload::MetadataExtracted { from_cache, .. } => assert!(from_cache),
        other => panic!("expected MetadataExtracted, got {other:?}"),
    }
    assert_ne!(first.id, second.id);
}

#[test]
fn truncated_artifact_reports_extraction_failed() {
    let extractor = MetadataExtractor::new(MetadataConfig::default());
    let artifact = ClassArtifact::new("/w/Empty.class", 1, Vec::new());

    let event = extractor.extract(&artifact, &SystemClock);
    assert!(matches!(
        event.payload,
        Payload::ExtractionFailed {
            reason: ExtractionFailureReason::Truncated,
            ..
        }
    ));
}

#[test]
fn an_oversized_artifact_is_rejected_before_parsing() {
    let config = MetadataConfig {
        max_artifact_bytes: 4,
        ..Default::default()
    };
    let extractor = MetadataExtractor::new(config);
    let artifact = ClassArtifact::new("/w/Big.class", 1, sample_bytes());

    let event = extractor.extract(&artifact, &SystemClock);
    assert!(matches!(
        event.payload,
        Payload::ExtractionFailed {
            reason: ExtractionFailureReason::TooLarge,
            ..
        }
    ));
}