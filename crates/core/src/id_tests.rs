// SPDX-License-Identifier: MIT

#![allow(clippy::unwrap_used)]

use super::*;

#[test]
fn generated_ids_carry_their_prefix() {
    let id = EventId::new();
    assert!(id.as_str().starts_with("evt-"));
}

#[test]
fn ids_round_trip_through_serde() {
    let id = AttemptId::new();
    let json = serde_json::to_string(&id).unwrap();
    let back: AttemptId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, back);
}

#[test]
fn from_string_preserves_short_ids() {
    let id = SnapshotId::from_string("snp-fixed");
    assert_eq!(id.as_str(), "snp-fixed");
}

#[test]
fn short_truncates_to_char_boundary() {
    assert_eq!(short("hello", 3), "hel");
    assert_eq!(short("hi", 10), "hi");
}

#[test]
fn ids_of_different_prefixes_are_distinct_types() {
    let a = EventId::new();
    let b = WatchId::new();
    assert_ne!(a.as_str(), b.as_str());
}