// SPDX-License-Identifier: MIT

//! Compatibility Validator: decides whether new metadata is
//! redefinition-compatible with whatever the VM currently has loaded.
//! Class name, supertype, and interface set must match exactly; fields
//! must match by name; methods are compared by their full signature
//! (name, parameter types, return type), so overloads are tracked
//! independently of one another (bodies may differ freely either way).

use crate::event::{Event, Payload, RejectionReason};
use hotswap_bytecode::ClassMetadata;
use hotswap_core::Clock;
use hotswap_ports::LoadedClass;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Default, Clone, Copy)]
pub struct CompatibilityValidator;

impl CompatibilityValidator {
    pub fn new() -> Self {
        Self
    }

    /// `loaded` is `None` when the VM has nothing registered under this
    /// class name, which alone is enough to reject (`NotLoaded`).
    pub fn validate(
        &self,
        new_metadata: &ClassMetadata,
        new_bytecode: Vec<u8>,
        loaded: Option<&LoadedClass>,
        clock: &dyn Clock,
    ) -> Event {
        let now = clock.epoch_ms();

        let Some(loaded) = loaded else {
            return Event::new(
                now,
                Payload::ValidationRejected {
                    class_name: new_metadata.class_name.clone(),
                    reasons: vec![RejectionReason::NotLoaded],
                },
            );
        };

        let reasons = self.check(new_metadata, &loaded.metadata);
        if reasons.is_empty() {
            Event::new(
                now,
                Payload::Validated {
                    class_name: new_metadata.class_name.clone(),
                    new_metadata: new_metadata.clone(),
                    new_bytecode,
                },
            )
        } else {
            Event::new(
                now,
                Payload::ValidationRejected {
                    class_name: new_metadata.class_name.clone(),
                    reasons,
                },
            )
        }
    }

    fn check(&self, new: &ClassMetadata, old: &ClassMetadata) -> Vec<RejectionReason> {
        let mut reasons = Vec::new();

        if new.class_name != old.class_name {
            reasons.push(RejectionReason::ClassNameMismatch);
        }
        if new.supertype_name != old.supertype_name {
            reasons.push(RejectionReason::SupertypeChanged);
        }
        if new.interface_set() != old.interface_set() {
            reasons.push(RejectionReason::InterfaceSetChanged);
        }

        let old_fields: BTreeMap<&str, &str> = old
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.type_descriptor.as_str()))
            .collect();
        let new_fields: BTreeMap<&str, &str> = new
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.type_descriptor.as_str()))
            .collect();
        for (name, ty) in &new_fields {
            match old_fields.get(name) {
                None => reasons.push(RejectionReason::FieldAdded {
                    name: (*name).to_string(),
                }),
                Some(old_ty) if old_ty != ty => reasons.push(RejectionReason::FieldTypeChanged {
                    name: (*name).to_string(),
                }),
                _ => {}
            }
        }
        for name in old_fields.keys() {
            if !new_fields.contains_key(name) {
                reasons.push(RejectionReason::FieldRemoved {
                    name: (*name).to_string(),
                });
            }
        }

        // Group by name first so overloads (same name, distinct
        // signatures) don't collapse into a single map entry; then
        // compare each name's signature set rather than a bare string.
        let mut old_by_name: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for m in &old.methods {
            old_by_name.entry(m.name.as_str()).or_default().push(m.signature());
        }
        let mut new_by_name: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for m in &new.methods {
            new_by_name.entry(m.name.as_str()).or_default().push(m.signature());
        }

        let empty: Vec<String> = Vec::new();
        let all_names: BTreeSet<&str> = old_by_name.keys().chain(new_by_name.keys()).copied().collect();
        for name in all_names {
            let old_sigs = old_by_name.get(name).unwrap_or(&empty);
            let new_sigs = new_by_name.get(name).unwrap_or(&empty);
            let old_set: BTreeSet<&String> = old_sigs.iter().collect();
            let new_set: BTreeSet<&String> = new_sigs.iter().collect();
            let added: Vec<&String> = new_set.difference(&old_set).copied().collect();
            let removed: Vec<&String> = old_set.difference(&new_set).copied().collect();

            if old_sigs.len() == 1 && new_sigs.len() == 1 && added.len() == 1 && removed.len() == 1 {
                reasons.push(RejectionReason::MethodSignatureChanged {
                    signature: added[0].clone(),
                });
                continue;
            }
            for signature in removed {
                reasons.push(RejectionReason::MethodRemoved {
                    signature: signature.clone(),
                });
            }
            for signature in added {
                reasons.push(RejectionReason::MethodAdded {
                    signature: signature.clone(),
                });
            }
        }

        reasons
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;