// SPDX-License-Identifier: MIT

//! The pipeline's currency. Every cross-component failure and success is
//! represented here; components never throw across their boundaries,
//! they emit.

use hotswap_bytecode::ClassMetadata;
use hotswap_core::EventId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    ClassNameMismatch,
    SupertypeChanged,
    InterfaceSetChanged,
    FieldAdded { name: String },
    FieldRemoved { name: String },
    FieldTypeChanged { name: String },
    MethodAdded { signature: String },
    MethodRemoved { signature: String },
    MethodSignatureChanged { signature: String },
    NotLoaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    VmRejected,
    NotLoaded,
    Internal,
    Timeout,
    Backpressure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionFailureReason {
    Truncated,
    TooLarge,
    UnsupportedFormat,
    Malformed,
}

impl From<hotswap_bytecode::ExtractionFailed> for ExtractionFailureReason {
    fn from(value: hotswap_bytecode::ExtractionFailed) -> Self {
        use hotswap_bytecode::ExtractionFailed as E;
        match value {
            E::Truncated => Self::Truncated,
            E::TooLarge => Self::TooLarge,
            E::UnsupportedFormat => Self::UnsupportedFormat,
            E::Malformed => Self::Malformed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Payload {
    // -- watch session --
    #[serde(rename = "watch:artifact_changed")]
    ArtifactChanged {
        path: PathBuf,
        size: u64,
        digest: String,
        likely_meaningful: bool,
    },
    #[serde(rename = "watch:dropped_event")]
    DroppedEvent { path: PathBuf, reason: String },
    #[serde(rename = "watch:degraded")]
    WatchDegraded { path: PathBuf, error: String },

    // -- metadata extractor --
    #[serde(rename = "metadata:extracted")]
    MetadataExtracted {
        class_name: String,
        metadata: ClassMetadata,
        from_cache: bool,
    },
    #[serde(rename = "metadata:extraction_failed")]
    ExtractionFailed {
        path: PathBuf,
        reason: ExtractionFailureReason,
    },

    // -- compatibility validator --
    #[serde(rename = "validator:validated")]
    Validated {
        class_name: String,
        new_metadata: ClassMetadata,
        new_bytecode: Vec<u8>,
    },
    #[serde(rename = "validator:rejected")]
    ValidationRejected {
        class_name: String,
        reasons: Vec<RejectionReason>,
    },

    // -- redefinition coordinator --
    #[serde(rename = "coordinator:started")]
    RedefinitionStarted { class_name: String },
    #[serde(rename = "coordinator:succeeded")]
    RedefinitionSucceeded {
        class_name: String,
        affected_instances: usize,
        duration_ms: u64,
    },
    #[serde(rename = "coordinator:failed")]
    RedefinitionFailed {
        class_name: String,
        category: FailureCategory,
        detail: String,
    },
    /// The VM redefinition primitive is temporarily unavailable; the
    /// attempt stays in `Redefining` for a later `run` call to retry.
    #[serde(rename = "coordinator:vm_unavailable")]
    VmUnavailable { class_name: String },

    // -- instance reconciler --
    #[serde(rename = "reconciler:instances_updated")]
    InstancesUpdated { class_name: String, count: usize },
    #[serde(rename = "reconciler:instance_update_failed")]
    InstanceUpdateFailed {
        class_name: String,
        partial_success: usize,
        first_error: String,
    },

    // -- rollback manager --
    #[serde(rename = "rollback:rolled_back")]
    RolledBack { class_name: String, partial: bool },
    #[serde(rename = "rollback:failed")]
    RollbackFailed {
        class_name: String,
        reason: String,
        partial: bool,
    },
    #[serde(rename = "rollback:manual_intervention_required")]
    ManualInterventionRequired { class_name: String, detail: String },

    // -- event sink / bus --
    #[serde(rename = "sink:degraded")]
    SinkDegraded { dropped: usize },

    #[serde(other, skip_serializing)]
    Custom,
}

impl Payload {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ArtifactChanged { .. } => "artifact_changed",
            Self::DroppedEvent { .. } => "dropped_event",
            Self::WatchDegraded { .. } => "watch_degraded",
            Self::MetadataExtracted { .. } => "metadata_extracted",
            Self::ExtractionFailed { .. } => "extraction_failed",
            Self::Validated { .. } => "validated",
            Self::ValidationRejected { .. } => "validation_rejected",
            Self::RedefinitionStarted { .. } => "redefinition_started",
            Self::RedefinitionSucceeded { .. } => "redefinition_succeeded",
            Self::RedefinitionFailed { .. } => "redefinition_failed",
            Self::VmUnavailable { .. } => "vm_unavailable",
            Self::InstancesUpdated { .. } => "instances_updated",
            Self::InstanceUpdateFailed { .. } => "instance_update_failed",
            Self::RolledBack { .. } => "rolled_back",
            Self::RollbackFailed { .. } => "rollback_failed",
            Self::ManualInterventionRequired { .. } => "manual_intervention_required",
            Self::SinkDegraded { .. } => "sink_degraded",
            Self::Custom => "custom",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp_ms: u64,
    pub causation_id: Option<EventId>,
    pub correlation_id: Option<String>,
    pub payload: Payload,
}

impl Event {
    pub fn new(timestamp_ms: u64, payload: Payload) -> Self {
        Self {
            id: EventId::new(),
            timestamp_ms,
            causation_id: None,
            correlation_id: None,
            payload,
        }
    }

    pub fn caused_by(mut self, causation_id: EventId) -> Self {
        self.causation_id = Some(causation_id);
        self
    }

    pub fn correlated_with(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;