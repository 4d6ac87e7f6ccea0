//! One open database with its views, history and bookkeeping.

use crate::container::content::ContainerCore;
use crate::container::counters::{CounterSnapshot, IoTracker};
use crate::container::modes::{
    CloseOutcome, ClosePrompt, ContainerChangeListener, ContainerProperty, FilterStatus,
    OperationMode, PropertyKind, SaveDecision,
};
use crate::container::{ContainerError, ContainerResult};
use crate::context::AppContext;
use crate::list::{FilterMode, ListenerId, OrderedRecordList, SharedListener};
use crate::mirror::MirrorStore;
use crate::model::header::{FileHeader, HeaderFieldValue, Passphrase};
use crate::model::recent::{
    RecentList, RecentLists, DEFAULT_EDITED_CAPACITY, DEFAULT_FAVOURITES_CAPACITY,
    DEFAULT_USED_CAPACITY, RECENT_LIST_DELIMITER,
};
use crate::model::record::{rebase_group, PwsRecord, RecordId};
use crate::model::wrapper::{RecordWrapper, SortField};
use crate::options::{
    clamp_undo_entries, tree_expansion_key, OptionChange, OptionListenerId, MAX_UNDO_ENTRIES,
    STORE_MINOR_CHANGES,
};
use crate::repo::snapshot_repo::{
    load_snapshot_file, save_snapshot_file, DatabaseSnapshot, RecentSnapshot,
};
use crate::store::{RecordList, StoreError};
use crate::undo::{
    AddKind, EditTarget, GroupChangeKind, RecordSetState, UndoManager, UndoableEdit,
    UndoableEditEvent, UndoableEditListener,
};
use crate::view::{ContainerView, SelectionStatus, TableView, TreeView, ViewMode};
use log::{debug, error, info, warn};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

const UNTITLED: &str = "untitled";

/// Registration handle for container change and edit listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerListenerId(u64);

type SharedChangeListener = Rc<RefCell<dyn ContainerChangeListener>>;
type SharedEditListener = Rc<RefCell<dyn UndoableEditListener>>;

/// Live state of one open database.
///
/// Owns the record store, the ordered list with a table and a tree view
/// registered on it, and the undo history. All methods run on the thread
/// that owns the container; only the counters and the IO tracker are shared.
pub struct PwsFileContainer {
    id: Uuid,
    core: ContainerCore,
    undo: UndoManager,
    undo_limit: Arc<AtomicUsize>,
    options_listener: Option<OptionListenerId>,
    table: Rc<RefCell<TableView>>,
    tree: Rc<RefCell<TreeView>>,
    view_mode: ViewMode,
    operation_mode: OperationMode,
    change_listeners: Vec<(ContainerListenerId, SharedChangeListener)>,
    edit_listeners: Vec<(ContainerListenerId, SharedEditListener)>,
    next_listener_id: u64,
    last_levels: HashMap<PropertyKind, ContainerProperty>,
    io: IoTracker,
    last_activity_ms: i64,
    curtain: bool,
}

impl PwsFileContainer {
    /// Creates a virgin container over an empty database.
    pub fn new(context: AppContext) -> Self {
        Self::from_store(context, RecordList::new(), RecentLists::default())
    }

    pub fn from_store(context: AppContext, store: RecordList, recent: RecentLists) -> Self {
        let options = context.container_options();
        let now_ms = context.now_ms();

        let undo_limit = Arc::new(AtomicUsize::new(options.max_undo_entries));
        let shared_limit = Arc::clone(&undo_limit);
        let options_listener = context
            .options()
            .add_listener(Arc::new(move |change: &OptionChange| {
                if change.name != MAX_UNDO_ENTRIES {
                    return;
                }
                if let Some(value) = change
                    .new_value
                    .as_deref()
                    .and_then(|value| value.trim().parse::<i64>().ok())
                {
                    shared_limit.store(clamp_undo_entries(value), Ordering::SeqCst);
                }
            }));

        let mut core = ContainerCore::new(context, store, recent);
        let table = Rc::new(RefCell::new(TableView::new()));
        let tree = Rc::new(RefCell::new(TreeView::new()));
        let table_listener: SharedListener = table.clone();
        let tree_listener: SharedListener = tree.clone();
        core.list.add_listener(table_listener);
        core.list.add_listener(tree_listener);
        core.reload();

        let mut container = Self {
            id: Uuid::new_v4(),
            core,
            undo: UndoManager::new(options.max_undo_entries),
            undo_limit,
            options_listener: Some(options_listener),
            table,
            tree,
            view_mode: ViewMode::default(),
            operation_mode: OperationMode::Virgin,
            change_listeners: Vec::new(),
            edit_listeners: Vec::new(),
            next_listener_id: 0,
            last_levels: HashMap::new(),
            io: IoTracker::new(),
            last_activity_ms: now_ms,
            curtain: false,
        };
        container.seed_levels();
        container.restore_tree_expansion();
        info!(
            "event=container_create module=container status=ok records={} name={}",
            container.core.store.len(),
            container.database_name()
        );
        container
    }

    /// Builds a container from a loaded snapshot; the passphrase is supplied
    /// by the caller because snapshots never carry it.
    pub fn from_snapshot(
        context: AppContext,
        snapshot: DatabaseSnapshot,
        passphrase: Passphrase,
        path: Option<PathBuf>,
    ) -> ContainerResult<Self> {
        let mut header = snapshot.header;
        header.passphrase = passphrase;
        let mut store = RecordList::from_parts(header, snapshot.records)?;
        store.set_file_path(path);
        let recent = recent_from_snapshot(&snapshot.recent);
        Ok(Self::from_store(context, store, recent))
    }

    pub fn open(context: AppContext, path: &Path, passphrase: Passphrase) -> ContainerResult<Self> {
        let snapshot = load_snapshot_file(path)?;
        Self::from_snapshot(context, snapshot, passphrase, Some(path.to_path_buf()))
    }

    /// Reopens the mirror left behind for `database_path`.
    ///
    /// The recovered container keeps the original path and starts modified.
    pub fn recover_mirror(
        context: AppContext,
        mirrors: &MirrorStore,
        database_path: &Path,
        passphrase: Passphrase,
    ) -> ContainerResult<Self> {
        let snapshot = mirrors.read(&database_path.to_string_lossy())?;
        let mut container = Self::from_snapshot(
            context,
            snapshot,
            passphrase,
            Some(database_path.to_path_buf()),
        )?;
        container.core.store.mark_modified();
        container.core.counters.note_mutation();
        info!("event=mirror_recover module=container status=ok");
        Ok(container)
    }

    // ---- identity ----

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.core.store.file_path()
    }

    /// File name of the database, or "untitled".
    pub fn database_name(&self) -> String {
        self.core
            .store
            .file_path()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| UNTITLED.to_string())
    }

    fn mirror_key(&self) -> String {
        match self.core.store.file_path() {
            Some(path) => path.to_string_lossy().into_owned(),
            None => format!("{UNTITLED}:{}", self.id),
        }
    }

    pub fn context(&self) -> &AppContext {
        &self.core.context
    }

    // ---- lifecycle ----

    pub fn operation_mode(&self) -> OperationMode {
        self.operation_mode
    }

    /// Attaches the container to a desktop slot, or switches between the
    /// passive and active mounted modes.
    pub fn mount(&mut self, active: bool) -> ContainerResult<()> {
        self.ensure_open()?;
        let mode = if active {
            OperationMode::MountedActive
        } else {
            OperationMode::MountedPassive
        };
        self.operation_mode = mode;
        self.report_property_change(ContainerProperty::OperationMode(mode));
        Ok(())
    }

    fn ensure_open(&self) -> ContainerResult<()> {
        if self.operation_mode == OperationMode::Unmounted {
            return Err(ContainerError::Unmounted);
        }
        Ok(())
    }

    // ---- listeners ----

    fn next_id(&mut self) -> ContainerListenerId {
        let id = ContainerListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        id
    }

    pub fn add_change_listener(&mut self, listener: SharedChangeListener) -> ContainerListenerId {
        let id = self.next_id();
        self.change_listeners.push((id, listener));
        id
    }

    pub fn remove_change_listener(&mut self, id: ContainerListenerId) -> bool {
        let before = self.change_listeners.len();
        self.change_listeners.retain(|(entry, _)| *entry != id);
        self.change_listeners.len() != before
    }

    pub fn add_edit_listener(&mut self, listener: SharedEditListener) -> ContainerListenerId {
        let id = self.next_id();
        self.edit_listeners.push((id, listener));
        id
    }

    pub fn remove_edit_listener(&mut self, id: ContainerListenerId) -> bool {
        let before = self.edit_listeners.len();
        self.edit_listeners.retain(|(entry, _)| *entry != id);
        self.edit_listeners.len() != before
    }

    /// Registers an additional ordered list listener after the built-in views.
    pub fn add_list_listener(&mut self, listener: SharedListener) -> ListenerId {
        self.core.list.add_listener(listener)
    }

    pub fn remove_list_listener(&mut self, id: ListenerId) -> bool {
        self.core.list.remove_listener(id)
    }

    /// Reports a property to change listeners.
    ///
    /// Level-triggered properties are dropped when equal to the last reported
    /// value; edge-triggered ones always go out.
    pub fn report_property_change(&mut self, property: ContainerProperty) {
        if property.is_level_triggered() {
            if self.last_levels.get(&property.kind()) == Some(&property) {
                return;
            }
            self.last_levels.insert(property.kind(), property.clone());
        }
        debug!(
            "event=container_property module=container kind={:?} listeners={}",
            property.kind(),
            self.change_listeners.len()
        );
        notify_all(&self.change_listeners, "container_property", |listener| {
            listener.container_changed(&property)
        });
    }

    fn seed_levels(&mut self) {
        let levels = [
            ContainerProperty::OperationMode(self.operation_mode),
            ContainerProperty::DisplayMode(self.view_mode),
            ContainerProperty::SelectionStatus(SelectionStatus::NothingSelected),
            ContainerProperty::FilterStatus(self.filter_status()),
            ContainerProperty::Curtain(false),
        ];
        for level in levels {
            self.last_levels.insert(level.kind(), level);
        }
    }

    // ---- content queries ----

    pub fn ordered_list(&self) -> &OrderedRecordList {
        &self.core.list
    }

    pub fn record(&self, id: RecordId) -> Option<&PwsRecord> {
        self.core.store.get(id)
    }

    pub fn records(&self) -> impl Iterator<Item = &PwsRecord> {
        self.core.store.iter()
    }

    /// Records in the store, regardless of filter.
    pub fn record_count(&self) -> usize {
        self.core.store.len()
    }

    pub fn header(&self) -> &FileHeader {
        self.core.store.header()
    }

    /// Checksum of header and records.
    pub fn crc(&self) -> u32 {
        self.core.store.crc()
    }

    pub fn recent_lists(&self) -> &RecentLists {
        &self.core.recent
    }

    /// Whether the database differs from its saved state.
    ///
    /// Recent list changes count only with the `storeMinorChanges` option.
    pub fn is_modified(&self) -> bool {
        if self.core.store.is_modified() {
            return true;
        }
        self.core.context.options().get_bool(STORE_MINOR_CHANGES, false)
            && self.core.recent.is_modified()
    }

    pub fn counters(&self) -> CounterSnapshot {
        self.core.counters.snapshot()
    }

    pub fn modify_number(&self) -> u64 {
        self.counters().modify_number
    }

    pub fn mirror_number(&self) -> u64 {
        self.counters().mirror_number
    }

    // ---- views and selection ----

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    /// Switches between table and tree, carrying the record selection over.
    pub fn set_view_mode(&mut self, mode: ViewMode) -> ContainerResult<()> {
        self.ensure_open()?;
        if mode == self.view_mode {
            return Ok(());
        }
        let selection = self.active_view().borrow().selected_wrappers();
        self.view_mode = mode;
        self.active_view().borrow_mut().set_selected_wrappers(&selection);
        self.report_property_change(ContainerProperty::DisplayMode(mode));
        self.refresh_selection_status();
        Ok(())
    }

    pub fn active_view(&self) -> Rc<RefCell<dyn ContainerView>> {
        match self.view_mode {
            ViewMode::Table => self.table.clone(),
            ViewMode::Tree => self.tree.clone(),
        }
    }

    pub fn table_view(&self) -> Rc<RefCell<TableView>> {
        Rc::clone(&self.table)
    }

    pub fn tree_view(&self) -> Rc<RefCell<TreeView>> {
        Rc::clone(&self.tree)
    }

    /// Selection status of the active view, derived on every call.
    pub fn selection_status(&self) -> SelectionStatus {
        if self.operation_mode == OperationMode::Unmounted {
            return SelectionStatus::NothingSelected;
        }
        self.active_view().borrow().selection_status()
    }

    pub fn select_indices(&mut self, indices: &[usize]) {
        self.active_view().borrow_mut().set_selected_items(indices);
        self.selection_changed();
    }

    /// Selects the visible records among `ids`.
    pub fn select_records(&mut self, ids: &[RecordId]) {
        let wrappers: Vec<RecordWrapper> = ids
            .iter()
            .filter_map(|id| self.core.list.index_of_id(*id))
            .filter_map(|index| self.core.list.get(index).cloned())
            .collect();
        self.active_view().borrow_mut().set_selected_wrappers(&wrappers);
        self.selection_changed();
    }

    /// Selects a group node; only possible in tree mode.
    pub fn select_group(&mut self, path: &str) -> bool {
        if self.view_mode != ViewMode::Tree {
            return false;
        }
        let selected = self.tree.borrow_mut().select_group(path);
        if selected {
            self.selection_changed();
        }
        selected
    }

    pub fn clear_selection(&mut self) {
        self.active_view().borrow_mut().clear_selection();
        self.selection_changed();
    }

    pub fn selected_records(&self) -> Vec<PwsRecord> {
        self.active_view()
            .borrow()
            .selected_wrappers()
            .into_iter()
            .map(RecordWrapper::into_record)
            .collect()
    }

    pub fn selected_ids(&self) -> Vec<RecordId> {
        self.active_view()
            .borrow()
            .selected_wrappers()
            .iter()
            .map(RecordWrapper::id)
            .collect()
    }

    fn selection_changed(&mut self) {
        self.note_user_activity();
        self.report_property_change(ContainerProperty::SelectionEvent);
        self.refresh_selection_status();
    }

    fn refresh_selection_status(&mut self) {
        let status = self.selection_status();
        self.report_property_change(ContainerProperty::SelectionStatus(status));
    }

    // ---- record operations ----

    pub fn add_record(&mut self, record: PwsRecord) -> ContainerResult<()> {
        self.add_records(vec![record]).map(|_| ())
    }

    pub fn add_records(&mut self, records: Vec<PwsRecord>) -> ContainerResult<Vec<RecordId>> {
        self.insert_as(AddKind::New, records)
    }

    fn insert_as(
        &mut self,
        kind: AddKind,
        records: Vec<PwsRecord>,
    ) -> ContainerResult<Vec<RecordId>> {
        self.ensure_open()?;
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<RecordId> = records.iter().map(|record| record.uuid).collect();
        self.core
            .insert_records(records)
            .inspect_err(|err| log_rejected("add_records", err))?;
        self.record_edit(UndoableEdit::AddRecords {
            kind,
            state: RecordSetState::Present(ids.clone()),
        });
        Ok(ids)
    }

    /// Replaces a stored record by ID, stamping its modification time.
    pub fn update_record(&mut self, mut record: PwsRecord) -> ContainerResult<()> {
        self.ensure_open()?;
        let id = record.uuid;
        record.modify_time = self.core.context.now_ms();
        let previous = self
            .core
            .replace_record(record)
            .inspect_err(|err| log_rejected("update_record", err))?;
        self.core.recent.edited.touch(id);
        self.record_edit(UndoableEdit::ModifyRecord { record: previous });
        Ok(())
    }

    pub fn delete_records(&mut self, ids: &[RecordId]) -> ContainerResult<usize> {
        self.delete_with_origin(ids, None)
    }

    /// Deletes every record at or below `path`.
    pub fn delete_group(&mut self, path: &str) -> ContainerResult<usize> {
        let ids = self.group_members(path)?;
        self.delete_with_origin(&ids, Some(path.to_string()))
    }

    fn delete_with_origin(
        &mut self,
        ids: &[RecordId],
        origin_group: Option<String>,
    ) -> ContainerResult<usize> {
        self.ensure_open()?;
        let ids = dedup(ids);
        if ids.is_empty() {
            return Ok(0);
        }
        let removed = self
            .core
            .remove_records(&ids)
            .inspect_err(|err| log_rejected("delete_records", err))?;
        let count = removed.len();
        self.record_edit(UndoableEdit::DeleteRecords {
            origin_group,
            state: RecordSetState::Absent(removed),
        });
        Ok(count)
    }

    /// Moves records into `group`; `None` or blank moves them to top level.
    pub fn move_to_group(&mut self, ids: &[RecordId], group: Option<&str>) -> ContainerResult<()> {
        self.ensure_open()?;
        let group = normalize_group(group);
        let changes: Vec<(RecordId, Option<String>)> =
            dedup(ids).into_iter().map(|id| (id, group.clone())).collect();
        if changes.is_empty() {
            return Ok(());
        }
        let previous = self
            .core
            .replace_groups(changes)
            .inspect_err(|err| log_rejected("move_to_group", err))?;
        self.record_edit(UndoableEdit::GroupChange {
            kind: GroupChangeKind::Move,
            groups: previous,
        });
        Ok(())
    }

    /// Adds copies of records with fresh IDs into `group`.
    pub fn copy_to_group(
        &mut self,
        ids: &[RecordId],
        group: Option<&str>,
    ) -> ContainerResult<Vec<RecordId>> {
        self.ensure_open()?;
        let group = normalize_group(group);
        let now_ms = self.core.context.now_ms();
        let copies = dedup(ids)
            .into_iter()
            .map(|id| -> ContainerResult<PwsRecord> {
                let source = self.core.store.get(id).ok_or(StoreError::NoSuchRecord(id))?;
                Ok(PwsRecord {
                    uuid: Uuid::new_v4(),
                    group: group.clone(),
                    create_time: now_ms,
                    modify_time: now_ms,
                    ..source.clone()
                })
            })
            .collect::<ContainerResult<Vec<_>>>()?;
        self.insert_as(AddKind::Copy, copies)
    }

    /// Renames group `old` to `new`, carrying subgroups along.
    pub fn rename_group(&mut self, old: &str, new: &str) -> ContainerResult<usize> {
        self.ensure_open()?;
        let new = new.trim();
        if new.is_empty() {
            return Err(ContainerError::InvalidGroupName(new.to_string()));
        }
        let changes: Vec<(RecordId, Option<String>)> = self
            .core
            .store
            .iter()
            .filter_map(|record| {
                let path = record.group.as_deref()?;
                rebase_group(path, old, new).map(|rebased| (record.uuid, Some(rebased)))
            })
            .collect();
        if changes.is_empty() {
            return Err(ContainerError::UnknownGroup(old.to_string()));
        }
        let count = changes.len();
        let previous = self
            .core
            .replace_groups(changes)
            .inspect_err(|err| log_rejected("rename_group", err))?;
        self.record_edit(UndoableEdit::GroupChange {
            kind: GroupChangeKind::RenameGroup,
            groups: previous,
        });
        Ok(count)
    }

    /// Adds foreign records, re-keying IDs that collide with stored ones.
    ///
    /// Imported records are marked in the ordered list until the next save.
    pub fn import_records(&mut self, records: Vec<PwsRecord>) -> ContainerResult<Vec<RecordId>> {
        self.ensure_open()?;
        let mut seen = HashSet::new();
        let records: Vec<PwsRecord> = records
            .into_iter()
            .map(|mut record| {
                if self.core.store.contains(record.uuid) || !seen.insert(record.uuid) {
                    record.uuid = Uuid::new_v4();
                    seen.insert(record.uuid);
                }
                record
            })
            .collect();
        self.core
            .list
            .mark_imported(records.iter().map(|record| record.uuid));
        let ids = self.insert_as(AddKind::Import, records)?;
        info!(
            "event=records_import module=container status=ok count={}",
            ids.len()
        );
        Ok(ids)
    }

    pub fn change_passphrase(&mut self, passphrase: Passphrase) -> ContainerResult<()> {
        self.ensure_open()?;
        let previous = self.core.replace_passphrase(passphrase);
        self.record_edit(UndoableEdit::PasswordChange {
            passphrase: previous,
        });
        Ok(())
    }

    pub fn set_header_field(&mut self, value: HeaderFieldValue) -> ContainerResult<()> {
        self.ensure_open()?;
        let previous = self.core.replace_header_field(value);
        self.record_edit(UndoableEdit::HeaderField { value: previous });
        Ok(())
    }

    /// Replaces the content with the saved file, as an undoable edit.
    pub fn revert(&mut self) -> ContainerResult<()> {
        self.ensure_open()?;
        let path = self
            .core
            .store
            .file_path()
            .ok_or(ContainerError::NoFilePath)?
            .to_path_buf();
        let snapshot = {
            let _io = self.io.begin();
            load_snapshot_file(&path)?
        };
        let mut header = snapshot.header;
        header.passphrase = self.core.store.header().passphrase.clone();
        let (previous_header, previous_records) =
            self.core.replace_content(header, snapshot.records);
        self.core.store.reset_modified();
        self.record_edit(UndoableEdit::Revert {
            header: Box::new(previous_header),
            records: previous_records,
        });
        info!("event=container_revert module=container status=ok");
        Ok(())
    }

    fn group_members(&self, path: &str) -> ContainerResult<Vec<RecordId>> {
        let ids: Vec<RecordId> = self
            .core
            .store
            .iter()
            .filter(|record| record.group.is_some() && record.is_in_group(path))
            .map(|record| record.uuid)
            .collect();
        if ids.is_empty() {
            return Err(ContainerError::UnknownGroup(path.to_string()));
        }
        Ok(ids)
    }

    fn record_edit(&mut self, edit: UndoableEdit) {
        let event = UndoableEditEvent {
            kind: edit.kind(),
            presentation_name: edit.presentation_name(),
        };
        self.undo.set_limit(self.undo_limit.load(Ordering::SeqCst));
        self.undo.undoable_edit_happened(edit);
        notify_all(&self.edit_listeners, "undoable_edit", |listener| {
            listener.undoable_edit_happened(&event)
        });
        self.content_changed();
    }

    fn content_changed(&mut self) {
        self.note_user_activity();
        self.report_property_change(ContainerProperty::ModifyEvent);
        self.refresh_selection_status();
    }

    // ---- undo ----

    /// Reverts the latest edit; `Ok(None)` when there is none.
    pub fn undo(&mut self) -> ContainerResult<Option<String>> {
        self.ensure_open()?;
        let name = self.undo.undo(&mut self.core)?;
        if name.is_some() {
            self.content_changed();
        }
        Ok(name)
    }

    pub fn redo(&mut self) -> ContainerResult<Option<String>> {
        self.ensure_open()?;
        let name = self.undo.redo(&mut self.core)?;
        if name.is_some() {
            self.content_changed();
        }
        Ok(name)
    }

    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.undo.can_redo()
    }

    pub fn undo_presentation_name(&self) -> String {
        self.undo.undo_presentation_name()
    }

    pub fn redo_presentation_name(&self) -> String {
        self.undo.redo_presentation_name()
    }

    pub fn undo_manager(&self) -> &UndoManager {
        &self.undo
    }

    // ---- recent lists ----

    pub fn touch_used(&mut self, id: RecordId) -> ContainerResult<()> {
        self.ensure_open()?;
        if !self.core.store.contains(id) {
            return Err(StoreError::NoSuchRecord(id).into());
        }
        self.core.recent.used.touch(id);
        Ok(())
    }

    /// Toggles favourite membership; returns the new state.
    pub fn toggle_favourite(&mut self, id: RecordId) -> ContainerResult<bool> {
        self.ensure_open()?;
        if !self.core.store.contains(id) {
            return Err(StoreError::NoSuchRecord(id).into());
        }
        let favourite = self.core.recent.toggle_favourite(id);
        if self.core.filter_mode == FilterMode::Favourites {
            self.core.refilter();
            self.refresh_selection_status();
        }
        Ok(favourite)
    }

    // ---- filter and sort ----

    pub fn filter_status(&self) -> FilterStatus {
        FilterStatus {
            mode: self.core.filter_mode,
            find_text: self.core.find_text.clone(),
        }
    }

    pub fn set_filter_mode(&mut self, mode: FilterMode) -> ContainerResult<()> {
        self.ensure_open()?;
        self.core.filter_mode = mode;
        self.apply_filter();
        Ok(())
    }

    /// Restricts the list to records containing `text`; `None` clears it.
    pub fn quick_find(&mut self, text: Option<&str>) -> ContainerResult<()> {
        self.ensure_open()?;
        self.core.find_text = text
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string);
        self.apply_filter();
        Ok(())
    }

    fn apply_filter(&mut self) {
        self.core.refilter();
        let status = self.filter_status();
        self.report_property_change(ContainerProperty::FilterStatus(status));
        self.refresh_selection_status();
    }

    pub fn sort_field(&self) -> SortField {
        self.core.list.sort_field()
    }

    pub fn set_sort_field(&mut self, field: SortField) -> ContainerResult<()> {
        self.ensure_open()?;
        self.core.list.set_sort_field(field, self.core.store.iter());
        Ok(())
    }

    /// Re-classifies expiry against the current time.
    pub fn refresh_expiry(&mut self) {
        if self.operation_mode == OperationMode::Unmounted {
            return;
        }
        self.core.reload();
        self.refresh_selection_status();
    }

    // ---- persistence ----

    pub fn is_io_progressing(&self) -> bool {
        self.io.is_progressing()
    }

    pub fn io_tracker(&self) -> IoTracker {
        self.io.clone()
    }

    fn snapshot(&self, source_path: Option<&Path>) -> DatabaseSnapshot {
        let store = &self.core.store;
        let mut header = store.header().clone();
        header.passphrase = Passphrase::default();
        DatabaseSnapshot {
            header,
            records: store.iter().cloned().collect(),
            recent: RecentSnapshot {
                used: persist_live(&self.core.recent.used, store),
                edited: persist_live(&self.core.recent.edited, store),
                favourites: persist_live(&self.core.recent.favourites, store),
            },
            source_path: source_path.map(|path| path.to_string_lossy().into_owned()),
            written_at_ms: self.core.context.now_ms(),
        }
    }

    /// Writes a mirror snapshot if the database changed since the last one.
    ///
    /// Returns whether a mirror was written. Disabled mirrors or a missing
    /// mirror directory make this a no-op.
    pub fn check_mirror_activity(&mut self) -> ContainerResult<bool> {
        if self.operation_mode == OperationMode::Unmounted || !self.counters().is_dirty() {
            return Ok(false);
        }
        let options = self.core.context.container_options();
        if !options.use_data_mirrors {
            return Ok(false);
        }
        let Some(dir) = options.mirror_dir else {
            debug!("event=mirror_check module=container status=skipped reason=no_mirror_dir");
            return Ok(false);
        };
        let mirrors = MirrorStore::new(dir);
        let key = self.mirror_key();
        let snapshot = self.snapshot(self.core.store.file_path());

        let _io = self.io.begin();
        let written = self
            .core
            .counters
            .sync_with(|modify_number| {
                mirrors.write(&key, &snapshot).map(|_| {
                    debug!(
                        "event=mirror_check module=container status=ok modify_number={modify_number}"
                    )
                })
            })
            .inspect_err(|err| {
                error!("event=mirror_check module=container status=error error={err}")
            })?;
        Ok(written)
    }

    /// Saves to the current file path.
    pub fn save(&mut self) -> ContainerResult<()> {
        let path = self
            .core
            .store
            .file_path()
            .ok_or(ContainerError::NoFilePath)?
            .to_path_buf();
        self.save_as(&path)
    }

    /// Saves to `path` and makes it the database path.
    ///
    /// On success the mirror becomes obsolete and is removed.
    pub fn save_as(&mut self, path: &Path) -> ContainerResult<()> {
        self.ensure_open()?;
        let previous_key = self.mirror_key();
        let snapshot = self.snapshot(Some(path));
        {
            let _io = self.io.begin();
            self.core
                .counters
                .force_sync_with(|| save_snapshot_file(path, &snapshot))
                .inspect_err(|err| {
                    error!("event=container_save module=container status=error error={err}")
                })?;
        }
        self.core.store.set_file_path(Some(path.to_path_buf()));
        self.core.store.reset_modified();
        self.core.recent.reset_modified();
        self.core.list.clear_import_marks();
        self.remove_mirror(&previous_key);
        info!(
            "event=container_save module=container status=ok records={}",
            snapshot.records.len()
        );
        self.report_property_change(ContainerProperty::ModifyEvent);
        Ok(())
    }

    fn remove_mirror(&self, key: &str) {
        if let Some(dir) = self.core.context.container_options().mirror_dir {
            MirrorStore::new(dir).remove(key);
        }
    }

    fn persist_tree_expansion(&self) {
        let Some(path) = self.core.store.file_path() else {
            return;
        };
        let key = tree_expansion_key(&path.to_string_lossy());
        let state = self.tree.borrow().expansion_state();
        let options = self.core.context.options();
        let result = if state.is_empty() {
            options.remove(&key)
        } else {
            options.set_string(&key, &state)
        };
        if let Err(err) = result {
            warn!("event=tree_expansion_persist module=container status=error error={err}");
        }
    }

    fn restore_tree_expansion(&mut self) {
        let Some(path) = self.core.store.file_path() else {
            return;
        };
        let key = tree_expansion_key(&path.to_string_lossy());
        if let Some(state) = self.core.context.options().get_string(&key) {
            self.tree.borrow_mut().restore_expansion(&state);
        }
    }

    // ---- close ----

    /// Closes the container.
    ///
    /// Refuses while persistence is in progress. A modified database is
    /// offered for saving first. Teardown order: listener deregistration,
    /// view disposal, mirror cleanup, base close.
    pub fn close(&mut self, prompt: &mut dyn ClosePrompt) -> CloseOutcome {
        if self.operation_mode == OperationMode::Unmounted {
            return CloseOutcome::Closed;
        }
        if self.is_io_progressing() {
            warn!("event=container_close module=container status=busy");
            return CloseOutcome::Busy;
        }
        self.persist_tree_expansion();

        if self.is_modified() {
            match prompt.confirm_save(&self.database_name()) {
                SaveDecision::Save => {
                    if let Err(err) = self.save() {
                        error!("event=container_close module=container status=error error={err}");
                        return CloseOutcome::Failed(err);
                    }
                }
                SaveDecision::Discard => {}
                SaveDecision::Cancel => {
                    info!("event=container_close module=container status=cancelled");
                    return CloseOutcome::Cancelled;
                }
            }
        }

        self.operation_mode = OperationMode::Unmounted;
        self.report_property_change(ContainerProperty::OperationMode(OperationMode::Unmounted));
        self.teardown();
        CloseOutcome::Closed
    }

    fn teardown(&mut self) {
        self.core.list.remove_all_listeners();
        self.change_listeners.clear();
        self.edit_listeners.clear();
        if let Some(id) = self.options_listener.take() {
            self.core.context.options().remove_listener(id);
        }

        self.table.borrow_mut().dispose();
        self.tree.borrow_mut().dispose();

        self.remove_mirror(&self.mirror_key());

        self.undo.discard_all_edits();
        self.core.list.clear();
        let path = self.core.store.file_path().map(Path::to_path_buf);
        self.core.store = RecordList::new();
        self.core.store.set_file_path(path);
        self.core.recent = RecentLists::default();
        info!(
            "event=container_close module=container status=ok name={}",
            self.database_name()
        );
    }

    // ---- view curtain ----

    pub fn note_user_activity(&mut self) {
        self.last_activity_ms = self.core.context.now_ms();
    }

    /// Closes the view curtain once the idle time exceeds `viewCurtainTime`.
    ///
    /// Returns whether the curtain is closed afterwards.
    pub fn check_idle(&mut self) -> bool {
        if self.curtain || !self.operation_mode.is_mounted() {
            return self.curtain;
        }
        let Some(limit) = self.core.context.container_options().view_curtain_time else {
            return false;
        };
        let idle_ms = self.core.context.now_ms() - self.last_activity_ms;
        if idle_ms < i64::try_from(limit.as_millis()).unwrap_or(i64::MAX) {
            return false;
        }
        self.curtain = true;
        self.active_view().borrow_mut().clear_selection();
        info!("event=view_curtain module=container status=closed idle_ms={idle_ms}");
        self.report_property_change(ContainerProperty::Curtain(true));
        self.refresh_selection_status();
        true
    }

    pub fn is_curtained(&self) -> bool {
        self.curtain
    }

    /// Lifts the curtain if `passphrase` matches the database passphrase.
    pub fn lift_curtain(&mut self, passphrase: &Passphrase) -> bool {
        if !self.curtain {
            return true;
        }
        if passphrase != &self.core.store.header().passphrase {
            warn!("event=view_curtain module=container status=rejected");
            return false;
        }
        self.curtain = false;
        self.note_user_activity();
        self.report_property_change(ContainerProperty::Curtain(false));
        true
    }
}

fn notify_all<L: ?Sized>(
    listeners: &[(ContainerListenerId, Rc<RefCell<L>>)],
    event: &str,
    mut deliver: impl FnMut(&mut L),
) {
    for (id, listener) in listeners {
        let delivered = catch_unwind(AssertUnwindSafe(|| match listener.try_borrow_mut() {
            Ok(mut listener) => {
                deliver(&mut *listener);
                true
            }
            Err(_) => false,
        }));
        match delivered {
            Ok(true) => {}
            Ok(false) => warn!(
                "event={event} module=container status=skipped listener={} reason=reentrant",
                id.0
            ),
            Err(_) => error!(
                "event={event} module=container status=panic listener={}",
                id.0
            ),
        }
    }
}

fn log_rejected(operation: &str, err: &impl std::fmt::Display) {
    warn!("event={operation} module=container status=rejected error={err}");
}

fn normalize_group(group: Option<&str>) -> Option<String> {
    group
        .map(str::trim)
        .filter(|group| !group.is_empty())
        .map(str::to_string)
}

fn dedup(ids: &[RecordId]) -> Vec<RecordId> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

fn persist_live(list: &RecentList, store: &RecordList) -> String {
    list.iter()
        .filter(|id| store.contains(**id))
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(&RECENT_LIST_DELIMITER.to_string())
}

fn recent_from_snapshot(snapshot: &RecentSnapshot) -> RecentLists {
    RecentLists {
        used: RecentList::from_persist_string(DEFAULT_USED_CAPACITY, &snapshot.used),
        edited: RecentList::from_persist_string(DEFAULT_EDITED_CAPACITY, &snapshot.edited),
        favourites: RecentList::from_persist_string(
            DEFAULT_FAVOURITES_CAPACITY,
            &snapshot.favourites,
        ),
    }
}

impl Drop for PwsFileContainer {
    fn drop(&mut self) {
        if let Some(id) = self.options_listener.take() {
            self.core.context.options().remove_listener(id);
        }
    }
}
