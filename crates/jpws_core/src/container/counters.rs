//! Modify/mirror bookkeeping and IO-progress tracking.
//!
//! # Invariants
//! - Both counters are monotonic and `mirror_number <= modify_number`.
//! - `modify_number` grows at most once per dirty transition, i.e. only on
//!   the first mutation after the counters were last equal.
//! - Counter updates that follow a write happen under the same lock as the
//!   write and only after it succeeded.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterSnapshot {
    pub modify_number: u64,
    pub mirror_number: u64,
}

impl CounterSnapshot {
    pub fn is_dirty(&self) -> bool {
        self.modify_number != self.mirror_number
    }
}

/// Per-container counters behind a coarse mutex.
#[derive(Debug, Default)]
pub struct ModifyCounters {
    state: Mutex<CounterSnapshot>,
}

impl ModifyCounters {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CounterSnapshot> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        *self.lock()
    }

    /// Registers a record mutation; returns whether the counter moved.
    pub fn note_mutation(&self) -> bool {
        let mut state = self.lock();
        if state.is_dirty() {
            return false;
        }
        state.modify_number += 1;
        true
    }

    /// Runs `write` while holding the lock if the counters differ, then
    /// marks the written state as mirrored.
    ///
    /// Returns `Ok(false)` without calling `write` when nothing changed.
    pub fn sync_with<E>(&self, write: impl FnOnce(u64) -> Result<(), E>) -> Result<bool, E> {
        let mut state = self.lock();
        if !state.is_dirty() {
            return Ok(false);
        }
        write(state.modify_number)?;
        state.mirror_number = state.modify_number;
        Ok(true)
    }

    /// Runs `write` under the lock regardless of the counters, marking the
    /// state as mirrored on success.
    pub fn force_sync_with<E>(&self, write: impl FnOnce() -> Result<(), E>) -> Result<(), E> {
        let mut state = self.lock();
        write()?;
        state.mirror_number = state.modify_number;
        Ok(())
    }
}

/// Shared count of persistence operations in flight.
#[derive(Debug, Clone, Default)]
pub struct IoTracker {
    active: Arc<AtomicUsize>,
}

impl IoTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_progressing(&self) -> bool {
        self.active.load(Ordering::SeqCst) > 0
    }

    /// Marks an IO operation as running until the guard drops.
    pub fn begin(&self) -> IoGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        IoGuard {
            active: Arc::clone(&self.active),
        }
    }
}

#[derive(Debug)]
pub struct IoGuard {
    active: Arc<AtomicUsize>,
}

impl Drop for IoGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::{IoTracker, ModifyCounters};

    #[test]
    fn modify_number_moves_once_per_dirty_transition() {
        let counters = ModifyCounters::new();
        assert!(counters.note_mutation());
        assert!(!counters.note_mutation());
        assert_eq!(counters.snapshot().modify_number, 1);

        assert_eq!(counters.sync_with(|_| Ok::<_, ()>(())), Ok(true));
        assert_eq!(counters.snapshot().mirror_number, 1);
        assert!(counters.note_mutation());
        assert_eq!(counters.snapshot().modify_number, 2);
    }

    #[test]
    fn failed_write_leaves_counters_untouched() {
        let counters = ModifyCounters::new();
        counters.note_mutation();
        assert_eq!(counters.sync_with(|_| Err("disk full")), Err("disk full"));
        let state = counters.snapshot();
        assert_eq!((state.modify_number, state.mirror_number), (1, 0));
    }

    #[test]
    fn clean_counters_skip_the_write() {
        let counters = ModifyCounters::new();
        let mut called = false;
        let synced = counters.sync_with(|_| {
            called = true;
            Ok::<_, ()>(())
        });
        assert_eq!(synced, Ok(false));
        assert!(!called);
    }

    #[test]
    fn io_guard_tracks_progress() {
        let tracker = IoTracker::new();
        let guard = tracker.begin();
        assert!(tracker.is_progressing());
        drop(guard);
        assert!(!tracker.is_progressing());
    }
}
