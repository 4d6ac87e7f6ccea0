//! Preferences store and typed container options.
//!
//! # Responsibility
//! - Provide a key-value options store with change notification.
//! - Expose typed, validated accessors for options the container reads.
//!
//! # Invariants
//! - Listeners fire only when a stored value actually changes.
//! - A panicking listener never prevents delivery to later listeners.

mod container_options;
mod store;

pub use container_options::{
    clamp_undo_entries, tree_expansion_key, write_max_undo_entries, ContainerOptions,
    ALLOWED_UNDO_ENTRIES, EXPIRY_SCOPE_DAYS, MAX_UNDO_ENTRIES, MIRROR_DIR, MIRROR_PERIOD_SECONDS,
    SORT_FIELD, STORE_MINOR_CHANGES, TREE_EXPANSION_PREFIX, USE_DATA_MIRRORS, VIEW_CURTAIN_TIME,
};
pub use store::{
    MemoryOptionsStore, OptionChange, OptionListener, OptionListenerId, OptionsError,
    OptionsResult, OptionsStore, SqliteOptionsStore,
};
