//! Threading model around containers.
//!
//! # Responsibility
//! - Run all container state on one UI loop thread fed by a task queue.
//! - Tick periodic service work from daemon threads via posted tasks.
//! - Run background work whose result can be awaited or discarded.
//!
//! # Invariants
//! - Loop state is created on and only touched by the loop thread.
//! - A panicking task is logged and never stops the loop.

mod background;
mod daemon;
mod event_loop;

pub use background::{BackgroundTask, CancelToken};
pub use daemon::ServiceDaemon;
pub use event_loop::{EventLoop, UiHandle};

use std::error::Error;
use std::fmt::{Display, Formatter};

pub type LoopResult<T> = Result<T, LoopError>;

/// Runtime errors.
#[derive(Debug)]
pub enum LoopError {
    Spawn(std::io::Error),
    /// The loop thread has stopped.
    Disconnected,
    /// The task panicked before producing a result.
    TaskPanicked,
    /// `execute_and_wait` was called from the loop thread itself.
    WouldDeadlock,
}

impl Display for LoopError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spawn(err) => write!(f, "failed to spawn thread: {err}"),
            Self::Disconnected => write!(f, "event loop is not running"),
            Self::TaskPanicked => write!(f, "task panicked"),
            Self::WouldDeadlock => write!(f, "blocking wait on the event loop thread"),
        }
    }
}

impl Error for LoopError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Spawn(err) => Some(err),
            Self::Disconnected | Self::TaskPanicked | Self::WouldDeadlock => None,
        }
    }
}

impl From<std::io::Error> for LoopError {
    fn from(value: std::io::Error) -> Self {
        Self::Spawn(value)
    }
}
