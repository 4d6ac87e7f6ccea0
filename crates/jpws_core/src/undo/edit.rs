//! Reversible edit variants and the target they apply to.

use crate::model::header::{FileHeader, HeaderFieldValue, Passphrase};
use crate::model::record::{PwsRecord, RecordId};
use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type EditResult<T> = Result<T, EditError>;

/// Failure while applying an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    Store(StoreError),
    /// Edit state does not match the direction it was applied in.
    StateMismatch(&'static str),
}

impl Display for EditError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::StateMismatch(edit) => write!(f, "edit `{edit}` applied out of order"),
        }
    }
}

impl Error for EditError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::StateMismatch(_) => None,
        }
    }
}

impl From<StoreError> for EditError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Operations an edit needs from its owning container.
///
/// Multi-record operations must be all-or-nothing.
pub trait EditTarget {
    fn insert_records(&mut self, records: Vec<PwsRecord>) -> EditResult<()>;
    fn remove_records(&mut self, ids: &[RecordId]) -> EditResult<Vec<PwsRecord>>;
    fn replace_record(&mut self, record: PwsRecord) -> EditResult<PwsRecord>;
    /// Sets the groups of several records, returning the previous groups.
    fn replace_groups(
        &mut self,
        groups: Vec<(RecordId, Option<String>)>,
    ) -> EditResult<Vec<(RecordId, Option<String>)>>;
    fn replace_header_field(&mut self, value: HeaderFieldValue) -> HeaderFieldValue;
    fn replace_passphrase(&mut self, passphrase: Passphrase) -> Passphrase;
    fn replace_content(
        &mut self,
        header: FileHeader,
        records: Vec<PwsRecord>,
    ) -> (FileHeader, Vec<PwsRecord>);
}

/// Presence state of a record set edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordSetState {
    /// Records are in the store; only their IDs are kept.
    Present(Vec<RecordId>),
    /// Records are gone; full snapshots are kept for re-insertion.
    Absent(Vec<PwsRecord>),
}

impl RecordSetState {
    fn toggle(&mut self, target: &mut dyn EditTarget) -> EditResult<()> {
        let next = match self {
            Self::Present(ids) => Self::Absent(target.remove_records(ids)?),
            Self::Absent(records) => {
                let ids = records.iter().map(|record| record.uuid).collect();
                target.insert_records(records.clone())?;
                Self::Present(ids)
            }
        };
        *self = next;
        Ok(())
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Present(ids) => ids.len(),
            Self::Absent(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddKind {
    New,
    Copy,
    Import,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupChangeKind {
    Move,
    RenameGroup,
}

/// Discriminant of [`UndoableEdit`], used in notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditKind {
    HeaderField,
    ModifyRecord,
    AddRecords,
    DeleteRecords,
    GroupChange,
    PasswordChange,
    Revert,
}

/// One reversible container change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoableEdit {
    HeaderField {
        value: HeaderFieldValue,
    },
    ModifyRecord {
        record: PwsRecord,
    },
    AddRecords {
        kind: AddKind,
        state: RecordSetState,
    },
    DeleteRecords {
        /// Group the deletion was issued on, if any.
        origin_group: Option<String>,
        state: RecordSetState,
    },
    GroupChange {
        kind: GroupChangeKind,
        groups: Vec<(RecordId, Option<String>)>,
    },
    PasswordChange {
        passphrase: Passphrase,
    },
    Revert {
        header: Box<FileHeader>,
        records: Vec<PwsRecord>,
    },
}

impl UndoableEdit {
    pub fn kind(&self) -> EditKind {
        match self {
            Self::HeaderField { .. } => EditKind::HeaderField,
            Self::ModifyRecord { .. } => EditKind::ModifyRecord,
            Self::AddRecords { .. } => EditKind::AddRecords,
            Self::DeleteRecords { .. } => EditKind::DeleteRecords,
            Self::GroupChange { .. } => EditKind::GroupChange,
            Self::PasswordChange { .. } => EditKind::PasswordChange,
            Self::Revert { .. } => EditKind::Revert,
        }
    }

    /// Menu label fragment, e.g. "delete 3 records".
    pub fn presentation_name(&self) -> String {
        match self {
            Self::HeaderField { value } => format!("edit {}", value.field_name().replace('_', " ")),
            Self::ModifyRecord { .. } => "modify record".to_string(),
            Self::AddRecords { kind, state } => {
                let verb = match kind {
                    AddKind::New => "add",
                    AddKind::Copy => "copy",
                    AddKind::Import => "import",
                };
                format!("{verb} {}", plural_records(state.len()))
            }
            Self::DeleteRecords { state, .. } => format!("delete {}", plural_records(state.len())),
            Self::GroupChange { kind, groups } => match kind {
                GroupChangeKind::Move => format!("move {}", plural_records(groups.len())),
                GroupChangeKind::RenameGroup => "rename group".to_string(),
            },
            Self::PasswordChange { .. } => "change passphrase".to_string(),
            Self::Revert { .. } => "revert".to_string(),
        }
    }

    /// Reverts the change this edit was recorded for.
    pub fn undo(&mut self, target: &mut dyn EditTarget) -> EditResult<()> {
        self.swap(target)
    }

    /// Re-applies the change after an undo.
    pub fn redo(&mut self, target: &mut dyn EditTarget) -> EditResult<()> {
        self.swap(target)
    }

    fn swap(&mut self, target: &mut dyn EditTarget) -> EditResult<()> {
        match self {
            Self::HeaderField { value } => {
                let previous = target.replace_header_field(value.clone());
                *value = previous;
            }
            Self::ModifyRecord { record } => {
                *record = target.replace_record(record.clone())?;
            }
            Self::AddRecords { state, .. } | Self::DeleteRecords { state, .. } => {
                state.toggle(target)?;
            }
            Self::GroupChange { groups, .. } => {
                *groups = target.replace_groups(groups.clone())?;
            }
            Self::PasswordChange { passphrase } => {
                *passphrase = target.replace_passphrase(passphrase.clone());
            }
            Self::Revert { header, records } => {
                let (previous_header, previous_records) =
                    target.replace_content((**header).clone(), std::mem::take(records));
                **header = previous_header;
                *records = previous_records;
            }
        }
        Ok(())
    }
}

fn plural_records(count: usize) -> String {
    if count == 1 {
        "record".to_string()
    } else {
        format!("{count} records")
    }
}

/// Notification describing an edit that was just recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoableEditEvent {
    pub kind: EditKind,
    pub presentation_name: String,
}

/// Receiver of recorded-edit notifications.
pub trait UndoableEditListener {
    fn undoable_edit_happened(&mut self, event: &UndoableEditEvent);
}
