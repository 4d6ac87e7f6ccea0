//! Closed set of container commands.
//!
//! Menu entries, buttons and key bindings map to a [`ContainerCommand`];
//! dispatch is an exhaustive match, so adding a command without handling it
//! does not compile.

use crate::container::{ContainerResult, PwsFileContainer};
use crate::list::FilterMode;
use crate::model::header::{HeaderFieldValue, Passphrase};
use crate::model::record::{PwsRecord, RecordId};
use crate::model::wrapper::SortField;
use crate::view::{SelectionStatus, ViewMode};
use log::debug;
use std::path::PathBuf;

/// User-level operation on one container.
#[derive(Debug, Clone)]
pub enum ContainerCommand {
    Undo,
    Redo,
    AddRecord(PwsRecord),
    UpdateRecord(PwsRecord),
    /// Deletes the records selected in the active view.
    DeleteSelection,
    DeleteRecords(Vec<RecordId>),
    DeleteGroup(String),
    MoveToGroup {
        ids: Vec<RecordId>,
        group: Option<String>,
    },
    CopyToGroup {
        ids: Vec<RecordId>,
        group: Option<String>,
    },
    RenameGroup {
        old: String,
        new: String,
    },
    Import(Vec<PwsRecord>),
    ChangePassphrase(Passphrase),
    SetHeaderField(HeaderFieldValue),
    Revert,
    Save,
    SaveAs(PathBuf),
    SetViewMode(ViewMode),
    SetFilter(FilterMode),
    QuickFind(Option<String>),
    SortBy(SortField),
    ToggleFavourite(RecordId),
    SelectAll,
    ClearSelection,
    CheckMirror,
}

/// What a command produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Done,
    /// Undo/redo with nothing to apply.
    Nothing,
    /// Undo/redo applied the named edit.
    Applied(String),
    Created(Vec<RecordId>),
    Affected(usize),
    Favourite(bool),
    Mirrored(bool),
}

impl ContainerCommand {
    /// Whether the command can currently do anything.
    pub fn is_enabled(&self, container: &PwsFileContainer) -> bool {
        match self {
            Self::Undo => container.can_undo(),
            Self::Redo => container.can_redo(),
            Self::DeleteSelection => matches!(
                container.selection_status(),
                SelectionStatus::RecordSelected
                    | SelectionStatus::RecordSetSelected
                    | SelectionStatus::GroupSelected
            ),
            Self::Save => container.is_modified() && container.file_path().is_some(),
            Self::Revert => container.file_path().is_some(),
            Self::SelectAll => !container.ordered_list().is_empty(),
            Self::AddRecord(_)
            | Self::UpdateRecord(_)
            | Self::DeleteRecords(_)
            | Self::DeleteGroup(_)
            | Self::MoveToGroup { .. }
            | Self::CopyToGroup { .. }
            | Self::RenameGroup { .. }
            | Self::Import(_)
            | Self::ChangePassphrase(_)
            | Self::SetHeaderField(_)
            | Self::SaveAs(_)
            | Self::SetViewMode(_)
            | Self::SetFilter(_)
            | Self::QuickFind(_)
            | Self::SortBy(_)
            | Self::ToggleFavourite(_)
            | Self::ClearSelection
            | Self::CheckMirror => true,
        }
    }

    pub fn execute(self, container: &mut PwsFileContainer) -> ContainerResult<CommandOutcome> {
        debug!("event=command module=command name={}", self.name());
        let outcome = match self {
            Self::Undo => applied(container.undo()?),
            Self::Redo => applied(container.redo()?),
            Self::AddRecord(record) => {
                let id = record.uuid;
                container.add_record(record)?;
                CommandOutcome::Created(vec![id])
            }
            Self::UpdateRecord(record) => {
                container.update_record(record)?;
                CommandOutcome::Done
            }
            Self::DeleteSelection => {
                let group = container.tree_view().borrow().selected_group().map(str::to_string);
                match (container.view_mode(), group) {
                    (ViewMode::Tree, Some(group)) => {
                        CommandOutcome::Affected(container.delete_group(&group)?)
                    }
                    _ => {
                        let ids = container.selected_ids();
                        CommandOutcome::Affected(container.delete_records(&ids)?)
                    }
                }
            }
            Self::DeleteRecords(ids) => CommandOutcome::Affected(container.delete_records(&ids)?),
            Self::DeleteGroup(path) => CommandOutcome::Affected(container.delete_group(&path)?),
            Self::MoveToGroup { ids, group } => {
                container.move_to_group(&ids, group.as_deref())?;
                CommandOutcome::Affected(ids.len())
            }
            Self::CopyToGroup { ids, group } => {
                CommandOutcome::Created(container.copy_to_group(&ids, group.as_deref())?)
            }
            Self::RenameGroup { old, new } => {
                CommandOutcome::Affected(container.rename_group(&old, &new)?)
            }
            Self::Import(records) => CommandOutcome::Created(container.import_records(records)?),
            Self::ChangePassphrase(passphrase) => {
                container.change_passphrase(passphrase)?;
                CommandOutcome::Done
            }
            Self::SetHeaderField(value) => {
                container.set_header_field(value)?;
                CommandOutcome::Done
            }
            Self::Revert => {
                container.revert()?;
                CommandOutcome::Done
            }
            Self::Save => {
                container.save()?;
                CommandOutcome::Done
            }
            Self::SaveAs(path) => {
                container.save_as(&path)?;
                CommandOutcome::Done
            }
            Self::SetViewMode(mode) => {
                container.set_view_mode(mode)?;
                CommandOutcome::Done
            }
            Self::SetFilter(mode) => {
                container.set_filter_mode(mode)?;
                CommandOutcome::Done
            }
            Self::QuickFind(text) => {
                container.quick_find(text.as_deref())?;
                CommandOutcome::Done
            }
            Self::SortBy(field) => {
                container.set_sort_field(field)?;
                CommandOutcome::Done
            }
            Self::ToggleFavourite(id) => CommandOutcome::Favourite(container.toggle_favourite(id)?),
            Self::SelectAll => {
                let all: Vec<usize> = (0..container.ordered_list().len()).collect();
                container.select_indices(&all);
                CommandOutcome::Affected(all.len())
            }
            Self::ClearSelection => {
                container.clear_selection();
                CommandOutcome::Done
            }
            Self::CheckMirror => CommandOutcome::Mirrored(container.check_mirror_activity()?),
        };
        Ok(outcome)
    }

    /// Stable name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Undo => "undo",
            Self::Redo => "redo",
            Self::AddRecord(_) => "add_record",
            Self::UpdateRecord(_) => "update_record",
            Self::DeleteSelection => "delete_selection",
            Self::DeleteRecords(_) => "delete_records",
            Self::DeleteGroup(_) => "delete_group",
            Self::MoveToGroup { .. } => "move_to_group",
            Self::CopyToGroup { .. } => "copy_to_group",
            Self::RenameGroup { .. } => "rename_group",
            Self::Import(_) => "import",
            Self::ChangePassphrase(_) => "change_passphrase",
            Self::SetHeaderField(_) => "set_header_field",
            Self::Revert => "revert",
            Self::Save => "save",
            Self::SaveAs(_) => "save_as",
            Self::SetViewMode(_) => "set_view_mode",
            Self::SetFilter(_) => "set_filter",
            Self::QuickFind(_) => "quick_find",
            Self::SortBy(_) => "sort_by",
            Self::ToggleFavourite(_) => "toggle_favourite",
            Self::SelectAll => "select_all",
            Self::ClearSelection => "clear_selection",
            Self::CheckMirror => "check_mirror",
        }
    }
}

fn applied(name: Option<String>) -> CommandOutcome {
    name.map_or(CommandOutcome::Nothing, CommandOutcome::Applied)
}

#[cfg(test)]
mod tests {
    use super::{CommandOutcome, ContainerCommand};
    use crate::container::PwsFileContainer;
    use crate::context::AppContext;
    use crate::model::record::PwsRecord;
    use crate::options::MemoryOptionsStore;
    use std::sync::Arc;

    fn container() -> PwsFileContainer {
        PwsFileContainer::new(AppContext::new(Arc::new(MemoryOptionsStore::new())))
    }

    #[test]
    fn undo_is_disabled_until_an_edit_happens() {
        let mut container = container();
        assert!(!ContainerCommand::Undo.is_enabled(&container));
        assert_eq!(
            ContainerCommand::Undo.execute(&mut container).unwrap(),
            CommandOutcome::Nothing
        );

        ContainerCommand::AddRecord(PwsRecord::new("mail"))
            .execute(&mut container)
            .unwrap();
        assert!(ContainerCommand::Undo.is_enabled(&container));
        assert_eq!(
            ContainerCommand::Undo.execute(&mut container).unwrap(),
            CommandOutcome::Applied("add record".to_string())
        );
    }

    #[test]
    fn delete_selection_removes_selected_records() {
        let mut container = container();
        container
            .add_records(vec![PwsRecord::new("a"), PwsRecord::new("b")])
            .unwrap();
        ContainerCommand::SelectAll.execute(&mut container).unwrap();
        assert!(ContainerCommand::DeleteSelection.is_enabled(&container));

        let outcome = ContainerCommand::DeleteSelection
            .execute(&mut container)
            .unwrap();
        assert_eq!(outcome, CommandOutcome::Affected(2));
        assert_eq!(container.record_count(), 0);
    }
}
