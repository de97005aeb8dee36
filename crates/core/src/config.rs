// SPDX-License-Identifier: MIT

//! The configuration schema recognized at startup (see `watch.*`,
//! `metadata.*`, `coordinator.*`, `snapshot.*`, `reconciler.*`, and
//! `rollback.*` keys). Callers assemble a [`Config`] however they like
//! (file, env, flags); this crate only defines the shape and defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileStrategy {
    Automatic,
    ReflectiveRestore,
    ProxyRefresh,
    FactoryReset,
    NoUpdate,
}

impl Default for ReconcileStrategy {
    fn default() -> Self {
        Self::Automatic
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStrategy {
    MergeChanges,
    PreferRollback,
    PreferCurrent,
    AbortOnConflict,
    ForceRollback,
    ManualResolution,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub directories: Vec<PathBuf>,
    pub recursive: bool,
    pub debounce_window_ms: u64,
    pub burst_threshold: u32,
    pub queue_capacity: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            directories: Vec::new(),
            recursive: true,
            debounce_window_ms: 250,
            burst_threshold: 5,
            queue_capacity: 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    pub cache_ttl_minutes: u64,
    pub cache_max_entries: usize,
    pub meaningful_size_threshold_bytes: u64,
    pub max_artifact_bytes: u64,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            cache_ttl_minutes: 30,
            cache_max_entries: 1024,
            meaningful_size_threshold_bytes: 100,
            max_artifact_bytes: 16 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    pub attempt_deadline_seconds: u64,
    pub coalesce_pending: bool,
    pub inbound_queue_capacity: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            attempt_deadline_seconds: 30,
            coalesce_pending: true,
            inbound_queue_capacity: 256,
        }
    }
}

impl CoordinatorConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.attempt_deadline_seconds)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    pub chain_max_length: usize,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self { chain_max_length: 16 }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilerConfig {
    pub default_strategy: ReconcileStrategy,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            default_strategy: ReconcileStrategy::Automatic,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RollbackConfig {
    pub bytecode_conflict: ConflictStrategy,
    pub instance_conflict: ConflictStrategy,
}

impl Default for RollbackConfig {
    fn default() -> Self {
        Self {
            bytecode_conflict: ConflictStrategy::ForceRollback,
            instance_conflict: ConflictStrategy::AbortOnConflict,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub watch: WatchConfig,
    pub metadata: MetadataConfig,
    pub coordinator: CoordinatorConfig,
    pub snapshot: SnapshotConfig,
    pub reconciler: ReconcilerConfig,
    pub rollback: RollbackConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("watch.directories must not be empty")]
    NoWatchDirectories,
    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

impl Config {
    /// Validate required fields. The core refuses to start on an
    /// unparseable or incomplete required configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.watch.directories.is_empty() {
            return Err(ConfigError::NoWatchDirectories);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;