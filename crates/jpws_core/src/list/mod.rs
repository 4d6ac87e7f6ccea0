//! Ordered, filtered projection of the record list.
//!
//! # Responsibility
//! - Keep the sorted and filtered sequence of wrappers that views display.
//! - Announce every structural change to registered listeners.
//!
//! # Invariants
//! - Items are strictly ascending by collation key.
//! - Every visible mutation emits its event before the call returns.
//! - A position change is reported as remove followed by insert.

mod event;
mod filter;
mod ordered;

pub use event::{ListenerId, OrderedListEvent, OrderedListEventKind, OrderedListListener};
pub use filter::{FilterMode, RecordFilter};
pub use ordered::{ExpiryScope, OrderedRecordList, SharedListener};
