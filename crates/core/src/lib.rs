// SPDX-License-Identifier: MIT

//! hotswap-core: shared primitives for the class-redefinition agent
//!
//! Ids, a testable clock, small declarative macros, and the configuration
//! schema. Everything else in the workspace (bytecode parsing, the VM
//! boundary, storage, and the pipeline engine) depends on this crate but
//! never the reverse.

pub mod clock;
pub mod config;
pub mod id;
pub mod macros;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{
    Config, ConfigError, ConflictStrategy, CoordinatorConfig, MetadataConfig, ReconcileStrategy,
    ReconcilerConfig, RollbackConfig, SnapshotConfig, WatchConfig,
};
pub use id::{short, AttemptId, EventId, IdBuf, SnapshotId, WatchId};