// SPDX-License-Identifier: MIT

//! The VM's view of a currently-loaded class, and the instance field-state
//! representation used by snapshots and reconciliation.

use hotswap_bytecode::ClassMetadata;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceKey {
    pub identity_hash: u64,
    pub type_tag: String,
}

/// A single field value. References to other instances are stored as
/// [`InstanceKey`]s rather than embedded objects, so that cyclic object
/// graphs in a snapshot can be reconstructed in two passes (allocate by
/// key, then wire references) instead of requiring shared ownership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Ref(InstanceKey),
}

pub type FieldState = BTreeMap<String, FieldValue>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedClass {
    pub class_name: String,
    pub bytecode: Vec<u8>,
    pub metadata: ClassMetadata,
    pub generation: u64,
}

impl LoadedClass {
    pub fn new(metadata: ClassMetadata, bytecode: Vec<u8>) -> Self {
        Self {
            class_name: metadata.class_name.clone(),
            bytecode,
            metadata,
            generation: 0,
        }
    }

    /// Install new bytecode/metadata and bump the generation. Called only
    /// by the Redefinition Coordinator after a successful VM call.
    pub fn install(&mut self, metadata: ClassMetadata, bytecode: Vec<u8>) {
        self.metadata = metadata;
        self.bytecode = bytecode;
        self.generation += 1;
    }
}