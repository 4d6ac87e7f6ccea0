//! Container lifecycle modes and reported properties.

use crate::list::FilterMode;
use crate::view::{SelectionStatus, ViewMode};

/// Lifecycle stage of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperationMode {
    /// Created, not yet attached to a desktop slot.
    #[default]
    Virgin,
    MountedPassive,
    /// Mounted and currently focused.
    MountedActive,
    /// Closed. Terminal.
    Unmounted,
}

impl OperationMode {
    pub fn is_mounted(self) -> bool {
        matches!(self, Self::MountedPassive | Self::MountedActive)
    }
}

/// Filter status as reported to dependents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterStatus {
    pub mode: FilterMode,
    pub find_text: Option<String>,
}

/// Property change reported by a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerProperty {
    OperationMode(OperationMode),
    DisplayMode(ViewMode),
    SelectionStatus(SelectionStatus),
    FilterStatus(FilterStatus),
    /// View curtain closed (`true`) or lifted.
    Curtain(bool),
    /// User selection changed.
    SelectionEvent,
    /// Record or header content changed.
    ModifyEvent,
}

/// Identity of a property, independent of its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    OperationMode,
    DisplayMode,
    SelectionStatus,
    FilterStatus,
    Curtain,
    SelectionEvent,
    ModifyEvent,
}

impl ContainerProperty {
    pub fn kind(&self) -> PropertyKind {
        match self {
            Self::OperationMode(_) => PropertyKind::OperationMode,
            Self::DisplayMode(_) => PropertyKind::DisplayMode,
            Self::SelectionStatus(_) => PropertyKind::SelectionStatus,
            Self::FilterStatus(_) => PropertyKind::FilterStatus,
            Self::Curtain(_) => PropertyKind::Curtain,
            Self::SelectionEvent => PropertyKind::SelectionEvent,
            Self::ModifyEvent => PropertyKind::ModifyEvent,
        }
    }

    /// Level-triggered properties are only reported when their value changes.
    pub fn is_level_triggered(&self) -> bool {
        !matches!(self, Self::SelectionEvent | Self::ModifyEvent)
    }
}

/// Receiver of container property changes.
pub trait ContainerChangeListener {
    fn container_changed(&mut self, property: &ContainerProperty);
}

/// Answer to the save question asked while closing a modified container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveDecision {
    Save,
    Discard,
    Cancel,
}

/// Asks the user whether to save before closing.
pub trait ClosePrompt {
    fn confirm_save(&mut self, database_name: &str) -> SaveDecision;
}

impl<F> ClosePrompt for F
where
    F: FnMut(&str) -> SaveDecision,
{
    fn confirm_save(&mut self, database_name: &str) -> SaveDecision {
        self(database_name)
    }
}

/// Result of a close request.
#[derive(Debug)]
pub enum CloseOutcome {
    Closed,
    /// Persistence in progress; nothing changed.
    Busy,
    /// User kept the container open.
    Cancelled,
    /// Saving failed; the container stays open.
    Failed(super::ContainerError),
}

impl CloseOutcome {
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}
