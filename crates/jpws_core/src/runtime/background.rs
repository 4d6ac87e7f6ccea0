//! Background work with an awaitable or discardable result.

use crate::runtime::{LoopError, LoopResult};
use log::{debug, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Cooperative cancellation flag handed to background work.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Work running on its own thread.
///
/// Cancelling never interrupts the work; it only discards the result.
pub struct BackgroundTask<T: Send + 'static> {
    name: String,
    token: CancelToken,
    handle: Option<JoinHandle<T>>,
}

impl<T: Send + 'static> BackgroundTask<T> {
    pub fn spawn<F>(name: &str, work: F) -> LoopResult<Self>
    where
        F: FnOnce(&CancelToken) -> T + Send + 'static,
    {
        let token = CancelToken::default();
        let worker_token = token.clone();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || work(&worker_token))?;
        Ok(Self {
            name: name.to_string(),
            token,
            handle: Some(handle),
        })
    }

    pub fn cancel(&self) {
        self.token.cancelled.store(true, Ordering::SeqCst);
        debug!("event=task_cancel module=runtime name={}", self.name);
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.handle
            .as_ref()
            .map_or(true, JoinHandle::is_finished)
    }

    /// Waits for the work; `Ok(None)` when the task was cancelled.
    pub fn wait(mut self) -> LoopResult<Option<T>> {
        let Some(handle) = self.handle.take() else {
            return Ok(None);
        };
        let value = handle.join().map_err(|_| {
            warn!("event=task_join module=runtime status=panic name={}", self.name);
            LoopError::TaskPanicked
        })?;
        if self.is_cancelled() {
            debug!("event=task_discard module=runtime name={}", self.name);
            return Ok(None);
        }
        Ok(Some(value))
    }

    /// Cancels and detaches; the work finishes on its own.
    pub fn discard(mut self) {
        self.cancel();
        self.handle.take();
    }
}

impl<T: Send + 'static> Drop for BackgroundTask<T> {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.token.cancelled.store(true, Ordering::SeqCst);
        }
    }
}
