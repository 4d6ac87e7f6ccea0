//! Core of the JPWS password manager: per-database containers with undo
//! history, the ordered record list and the views synchronized with it.

pub mod command;
pub mod container;
pub mod context;
pub mod db;
pub mod list;
pub mod logging;
pub mod mirror;
pub mod model;
pub mod options;
pub mod repo;
pub mod runtime;
pub mod store;
pub mod undo;
pub mod view;

pub use command::{CommandOutcome, ContainerCommand};
pub use container::{
    CloseOutcome, ClosePrompt, ContainerChangeListener, ContainerError, ContainerProperty,
    ContainerResult, OperationMode, PwsFileContainer, SaveDecision,
};
pub use context::{AppContext, Clock, ManualClock, SystemClock};
pub use list::{FilterMode, OrderedListEvent, OrderedListListener, OrderedRecordList};
pub use logging::{init_logging, logging_status, LogLevel, LoggingError};
pub use mirror::{mirror_file_name, MirrorStore};
pub use model::header::{FileHeader, HeaderFieldValue, Passphrase};
pub use model::record::{PwsRecord, RecordId};
pub use model::wrapper::{RecordWrapper, SortField};
pub use options::{MemoryOptionsStore, OptionsStore, SqliteOptionsStore};
pub use store::{RecordList, StoreError};
pub use undo::{UndoManager, UndoableEdit};
pub use view::{ContainerView, SelectionStatus, ViewMode};

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
