//! Undo/redo model for container edits.
//!
//! # Responsibility
//! - Represent every reversible container change as a tagged edit.
//! - Keep a bounded linear history with a single cursor.
//!
//! # Invariants
//! - An edit stores only the state it would restore next; applying it swaps
//!   that state with the live one.
//! - Pushing an edit clears the redo tail.
//! - Undo/redo with nothing available is a no-op, not an error.

mod edit;
mod manager;

pub use edit::{
    AddKind, EditError, EditKind, EditResult, EditTarget, GroupChangeKind, RecordSetState,
    UndoableEdit, UndoableEditEvent, UndoableEditListener,
};
pub use manager::UndoManager;
