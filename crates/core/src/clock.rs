// SPDX-License-Identifier: MIT

//! Time abstraction so that debouncing, deadlines, and TTLs are testable
//! without sleeping real wall-clock time.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

pub trait Clock: Send + Sync + 'static {
    /// A monotonic instant, used for deadlines and debounce windows.
    fn now(&self) -> Instant;
    /// Wall-clock milliseconds since the Unix epoch, used for event timestamps.
    fn epoch_ms(&self) -> u64;
}

#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn epoch_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// A controllable clock for deterministic tests.
#[derive(Clone)]
pub struct FakeClock {
    instant: Arc<Mutex<Instant>>,
    epoch_ms: Arc<Mutex<u64>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            instant: Arc::new(Mutex::new(Instant::now())),
            epoch_ms: Arc::new(Mutex::new(0)),
        }
    }

    pub fn advance(&self, delta: Duration) {
        *self.instant.lock() += delta;
        *self.epoch_ms.lock() += delta.as_millis() as u64;
    }

    pub fn set_epoch_ms(&self, ms: u64) {
        *self.epoch_ms.lock() = ms;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        *self.instant.lock()
    }

    fn epoch_ms(&self) -> u64 {
        *self.epoch_ms.lock()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;