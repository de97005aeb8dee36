// SPDX-License-Identifier: MIT

//! hotswap-storage: in-memory state the core holds across an attempt's
//! lifetime — the snapshot chain, the per-class attempt registry, and
//! the metadata cache. Nothing here touches disk: event durability is
//! the external sink's responsibility.
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod attempt;
pub mod cache;
pub mod snapshot;

pub use attempt::{AttemptRegistry, AttemptState, InvalidTransition, RedefinitionAttempt, SubmitError};
pub use cache::{CacheHit, CacheKey, MetadataCache};
pub use snapshot::{ChainError, Snapshot, SnapshotChain};