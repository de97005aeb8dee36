// SPDX-License-Identifier: MIT

//! [`ClassMetadata`]: the structural summary produced by the Metadata
//! Extractor, and the schema fingerprint used to decide redefinition
//! compatibility.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub type_descriptor: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    pub parameter_types: Vec<String>,
    pub return_type: String,
}

impl MethodDescriptor {
    /// The `(name, parameter-types, return-type)` signature used for
    /// identity comparisons; method bodies are not part of it.
    pub fn signature(&self) -> String {
        format!(
            "{}({})->{}",
            self.name,
            self.parameter_types.join(","),
            self.return_type
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMetadata {
    pub class_name: String,
    pub supertype_name: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<FieldDescriptor>,
    pub methods: Vec<MethodDescriptor>,
}

impl ClassMetadata {
    /// A stable hash over (supertype, sorted interfaces, sorted
    /// field name+type pairs, sorted method signatures). Two metadata
    /// values with equal fingerprint are redefinition-compatible.
    pub fn schema_fingerprint(&self) -> String {
        let mut interfaces = self.interfaces.clone();
        interfaces.sort();

        let mut fields: Vec<String> = self
            .fields
            .iter()
            .map(|f| format!("{}:{}", f.name, f.type_descriptor))
            .collect();
        fields.sort();

        let mut methods: Vec<String> = self.methods.iter().map(MethodDescriptor::signature).collect();
        methods.sort();

        let mut hasher = Sha256::new();
        hasher.update(self.supertype_name.as_deref().unwrap_or("").as_bytes());
        hasher.update(b"\0");
        for i in &interfaces {
            hasher.update(i.as_bytes());
            hasher.update(b",");
        }
        hasher.update(b"\0");
        for f in &fields {
            hasher.update(f.as_bytes());
            hasher.update(b",");
        }
        hasher.update(b"\0");
        for m in &methods {
            hasher.update(m.as_bytes());
            hasher.update(b",");
        }
        let out = hasher.finalize();
        let mut s = String::with_capacity(out.len() * 2);
        for byte in out {
            use std::fmt::Write;
            let _ = write!(s, "{byte:02x}");
        }
        s
    }

    pub fn interface_set(&self) -> std::collections::BTreeSet<&str> {
        self.interfaces.iter().map(String::as_str).collect()
    }

    pub fn field_set(&self) -> std::collections::BTreeSet<(&str, &str)> {
        self.fields
            .iter()
            .map(|f| (f.name.as_str(), f.type_descriptor.as_str()))
            .collect()
    }

    pub fn method_set(&self) -> std::collections::BTreeSet<String> {
        self.methods.iter().map(MethodDescriptor::signature).collect()
    }
}

#[cfg(test)]
#[path = "metadata_tests.rs"]
mod tests;