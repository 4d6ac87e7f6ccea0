//! Explicit application context passed to containers.
//!
//! # Responsibility
//! - Carry the options store and clock that containers depend on.
//!
//! # Invariants
//! - No container reads options or time through process-wide state.

use crate::options::{ContainerOptions, OptionsStore};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of wall-clock time in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// Clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    pub fn new(now_ms: i64) -> Self {
        Self {
            now_ms: AtomicI64::new(now_ms),
        }
    }

    pub fn set(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: i64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// Shared services handed to every container.
#[derive(Clone)]
pub struct AppContext {
    options: Arc<dyn OptionsStore>,
    clock: Arc<dyn Clock>,
}

impl AppContext {
    pub fn new(options: Arc<dyn OptionsStore>) -> Self {
        Self {
            options,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn options(&self) -> &dyn OptionsStore {
        self.options.as_ref()
    }

    pub fn options_handle(&self) -> Arc<dyn OptionsStore> {
        Arc::clone(&self.options)
    }

    /// Reads a fresh typed options snapshot.
    pub fn container_options(&self) -> ContainerOptions {
        ContainerOptions::read(self.options.as_ref())
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }
}
