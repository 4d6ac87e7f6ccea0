//! Typed events of the ordered list protocol.

use crate::model::wrapper::RecordWrapper;

/// Registration handle for one ordered list listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

/// Discriminant of [`OrderedListEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderedListEventKind {
    ItemAdded,
    ItemUpdated,
    ItemRemoved,
    ListReloaded,
    ListCleared,
}

/// Structural change of the ordered list.
///
/// Indices refer to the list state right after the change.
#[derive(Debug, Clone)]
pub enum OrderedListEvent {
    ItemAdded { index: usize, item: RecordWrapper },
    ItemUpdated { index: usize, item: RecordWrapper },
    /// `index` is the position the item occupied before removal. `moving`
    /// marks the first half of a position move: an `ItemAdded` for the same
    /// record follows immediately.
    ItemRemoved {
        index: usize,
        item: RecordWrapper,
        moving: bool,
    },
    ListReloaded { items: Vec<RecordWrapper> },
    ListCleared,
}

impl OrderedListEvent {
    pub fn kind(&self) -> OrderedListEventKind {
        match self {
            Self::ItemAdded { .. } => OrderedListEventKind::ItemAdded,
            Self::ItemUpdated { .. } => OrderedListEventKind::ItemUpdated,
            Self::ItemRemoved { .. } => OrderedListEventKind::ItemRemoved,
            Self::ListReloaded { .. } => OrderedListEventKind::ListReloaded,
            Self::ListCleared => OrderedListEventKind::ListCleared,
        }
    }
}

/// Receiver of ordered list events, called synchronously with each change.
pub trait OrderedListListener {
    fn ordered_list_performed(&mut self, event: &OrderedListEvent);
}
