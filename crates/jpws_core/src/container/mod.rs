//! Per-database container state machine.
//!
//! # Responsibility
//! - Own the record store, ordered list, views and undo history of one open
//!   database.
//! - Track lifecycle, display, filter and selection state and report changes.
//! - Keep modify/mirror bookkeeping and drive mirror, save and close.
//!
//! # Invariants
//! - Every record mutation goes through an undoable edit.
//! - No container state changes after `OperationMode::Unmounted`.
//! - Failed persistence never touches the list, the undo history or the
//!   counters.

mod content;
mod counters;
mod file_container;
mod modes;

pub use counters::{CounterSnapshot, IoGuard, IoTracker, ModifyCounters};
pub use file_container::{ContainerListenerId, PwsFileContainer};
pub use modes::{
    CloseOutcome, ClosePrompt, ContainerChangeListener, ContainerProperty, FilterStatus,
    OperationMode, PropertyKind, SaveDecision,
};

use crate::repo::RepoError;
use crate::store::StoreError;
use crate::undo::EditError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ContainerResult<T> = Result<T, ContainerError>;

/// Container operation errors.
#[derive(Debug)]
pub enum ContainerError {
    Store(StoreError),
    Edit(EditError),
    Repo(RepoError),
    /// The container was closed.
    Unmounted,
    /// The database has never been saved to a file.
    NoFilePath,
    UnknownGroup(String),
    /// Group names must not be empty.
    InvalidGroupName(String),
}

impl Display for ContainerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Edit(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Unmounted => write!(f, "container is closed"),
            Self::NoFilePath => write!(f, "database has no file path"),
            Self::UnknownGroup(path) => write!(f, "unknown group `{path}`"),
            Self::InvalidGroupName(name) => write!(f, "invalid group name `{name}`"),
        }
    }
}

impl Error for ContainerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Edit(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Unmounted
            | Self::NoFilePath
            | Self::UnknownGroup(_)
            | Self::InvalidGroupName(_) => None,
        }
    }
}

impl From<StoreError> for ContainerError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<EditError> for ContainerError {
    fn from(value: EditError) -> Self {
        match value {
            EditError::Store(err) => Self::Store(err),
            other => Self::Edit(other),
        }
    }
}

impl From<RepoError> for ContainerError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}
