//! View contract kept in sync with the ordered list.
//!
//! # Responsibility
//! - Mirror the ordered list's rows through its event protocol.
//! - Report selection as indices into the current ordered list.
//!
//! # Invariants
//! - Events are applied synchronously; selection indices are re-resolved on
//!   every structural change and never go stale across a mutation.
//! - Out-of-range indices and vanished wrappers are dropped silently.
//! - Views never sort or filter; they only follow list events.

mod selection;
mod table;
mod tree;

pub use selection::SelectionModel;
pub use table::TableView;
pub use tree::{TreeNode, TreeView, EXPANSION_DELIMITER};

use crate::list::OrderedListListener;
use crate::model::wrapper::RecordWrapper;

/// Presentation mode of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewMode {
    #[default]
    Table,
    Tree,
}

/// Selection classification derived from the active view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionStatus {
    NothingSelected,
    GroupSelected,
    RecordSelected,
    RecordSetSelected,
}

impl SelectionStatus {
    pub fn from_count(count: usize) -> Self {
        match count {
            0 => Self::NothingSelected,
            1 => Self::RecordSelected,
            _ => Self::RecordSetSelected,
        }
    }
}

/// Uniform selection API implemented by table and tree views.
pub trait ContainerView: OrderedListListener {
    fn view_mode(&self) -> ViewMode;

    /// Selected positions in the current ordered list, ascending.
    fn selected_items(&self) -> Vec<usize>;

    /// Selects exactly `indices`; out-of-range entries are dropped.
    fn set_selected_items(&mut self, indices: &[usize]);

    /// Selects the current positions of `wrappers`; missing ones are skipped.
    fn set_selected_wrappers(&mut self, wrappers: &[RecordWrapper]);

    /// Selected wrappers in list order.
    fn selected_wrappers(&self) -> Vec<RecordWrapper>;

    fn has_user_selection(&self) -> bool;

    fn clear_selection(&mut self);

    fn selection_status(&self) -> SelectionStatus;

    /// Releases mirrored state; later events are ignored.
    fn dispose(&mut self);

    fn is_disposed(&self) -> bool;
}
