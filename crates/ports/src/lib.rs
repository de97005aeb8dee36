// SPDX-License-Identifier: MIT

//! hotswap-ports: the three external interface boundaries the core
//! depends on at its edges — the VM redefinition primitive, the
//! filesystem watcher, and the event sink — plus fake implementations
//! gated behind `test-support` for deterministic tests.
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod loaded_class;
pub mod sink;
pub mod vm;
pub mod watcher;

pub use loaded_class::{FieldState, FieldValue, InstanceKey, LoadedClass};
pub use sink::{EventSink, SinkError};
pub use vm::{InstanceError, RedefineError, VmPrimitive};
pub use watcher::{FilesystemWatcher, FsEventKind, NotifyFsWatcher, RawFsEvent, WatchError};

#[cfg(any(test, feature = "test-support"))]
pub use sink::fake::{FakeEventSink, SinkBehavior};
#[cfg(any(test, feature = "test-support"))]
pub use vm::fake::{FakeVmPrimitive, RedefineBehavior};
#[cfg(any(test, feature = "test-support"))]
pub use watcher::fake::FakeFilesystemWatcher;