//! Record-holding half of a container, the target of undoable edits.
//!
//! # Invariants
//! - Every store mutation is mirrored into the ordered list before the
//!   method returns.
//! - Multi-record operations validate everything up front, so a failure
//!   leaves store and list untouched.

use crate::container::counters::ModifyCounters;
use crate::context::AppContext;
use crate::list::{ExpiryScope, FilterMode, OrderedRecordList, RecordFilter};
use crate::model::header::{FileHeader, HeaderFieldValue, Passphrase};
use crate::model::recent::RecentLists;
use crate::model::record::{PwsRecord, RecordId};
use crate::store::{RecordList, StoreError};
use crate::undo::{EditResult, EditTarget};
use std::collections::HashSet;
use std::sync::Arc;

pub(crate) struct ContainerCore {
    pub(crate) context: AppContext,
    pub(crate) store: RecordList,
    pub(crate) list: OrderedRecordList,
    pub(crate) recent: RecentLists,
    pub(crate) counters: Arc<ModifyCounters>,
    pub(crate) filter_mode: FilterMode,
    pub(crate) find_text: Option<String>,
}

impl ContainerCore {
    pub(crate) fn new(context: AppContext, store: RecordList, recent: RecentLists) -> Self {
        let sort_field = context.container_options().sort_field;
        Self {
            context,
            store,
            list: OrderedRecordList::new(sort_field),
            recent,
            counters: Arc::new(ModifyCounters::new()),
            filter_mode: FilterMode::All,
            find_text: None,
        }
    }

    pub(crate) fn expiry_scope(&self) -> ExpiryScope {
        ExpiryScope {
            now_ms: self.context.now_ms(),
            scope_days: self.context.container_options().expiry_scope_days,
            default_lifetime_days: self.store.header().password_lifetime,
        }
    }

    pub(crate) fn build_filter(&self) -> RecordFilter {
        RecordFilter::new(
            self.filter_mode,
            self.find_text.as_deref(),
            self.recent.favourites.iter().copied(),
        )
    }

    /// Rebuilds the projection from the store.
    pub(crate) fn reload(&mut self) {
        let scope = self.expiry_scope();
        self.list.load_database(self.store.iter(), scope);
    }

    /// Rebuilds the filter from the current mode, find text and favourites.
    pub(crate) fn refilter(&mut self) {
        let filter = self.build_filter();
        let scope = self.expiry_scope();
        self.list.set_expiry_scope(scope);
        self.list.set_filter(filter, self.store.iter());
    }

    /// Refreshes the list's expiry scope so incremental inserts classify
    /// against the current clock.
    fn sync_expiry_scope(&mut self) {
        let scope = self.expiry_scope();
        self.list.set_expiry_scope(scope);
    }

    fn mutated(&self) {
        self.counters.note_mutation();
    }

    fn require_present(&self, ids: &[RecordId]) -> EditResult<()> {
        match ids.iter().find(|id| !self.store.contains(**id)) {
            Some(missing) => Err(StoreError::NoSuchRecord(*missing).into()),
            None => Ok(()),
        }
    }
}

impl EditTarget for ContainerCore {
    fn insert_records(&mut self, records: Vec<PwsRecord>) -> EditResult<()> {
        let mut seen = HashSet::new();
        for record in &records {
            record.validate().map_err(StoreError::from)?;
            if self.store.contains(record.uuid) || !seen.insert(record.uuid) {
                return Err(StoreError::DuplicateEntry(record.uuid).into());
            }
        }
        self.sync_expiry_scope();
        for record in records {
            self.store.add_record(record.clone())?;
            self.list.add(&record);
        }
        self.mutated();
        Ok(())
    }

    fn remove_records(&mut self, ids: &[RecordId]) -> EditResult<Vec<PwsRecord>> {
        self.require_present(ids)?;
        let mut removed = Vec::with_capacity(ids.len());
        for id in ids {
            removed.push(self.store.delete_record(*id)?);
            self.list.remove(*id);
        }
        self.mutated();
        Ok(removed)
    }

    fn replace_record(&mut self, record: PwsRecord) -> EditResult<PwsRecord> {
        let previous = self.store.update_record(record.clone())?;
        self.sync_expiry_scope();
        self.list.update_record(&record);
        self.mutated();
        Ok(previous)
    }

    fn replace_groups(
        &mut self,
        groups: Vec<(RecordId, Option<String>)>,
    ) -> EditResult<Vec<(RecordId, Option<String>)>> {
        let mut updated = Vec::with_capacity(groups.len());
        for (id, group) in groups {
            let mut record = self
                .store
                .get(id)
                .cloned()
                .ok_or(StoreError::NoSuchRecord(id))?;
            let previous = std::mem::replace(&mut record.group, group);
            record.validate().map_err(StoreError::from)?;
            updated.push((record, previous));
        }

        self.sync_expiry_scope();
        let mut previous_groups = Vec::with_capacity(updated.len());
        for (record, previous) in updated {
            previous_groups.push((record.uuid, previous));
            self.store.update_record(record.clone())?;
            self.list.update_record(&record);
        }
        self.mutated();
        Ok(previous_groups)
    }

    fn replace_header_field(&mut self, value: HeaderFieldValue) -> HeaderFieldValue {
        let lifetime_changed = matches!(value, HeaderFieldValue::PasswordLifetime(_));
        let previous = self.store.replace_header_field(value);
        if lifetime_changed {
            self.reload();
        }
        self.mutated();
        previous
    }

    fn replace_passphrase(&mut self, passphrase: Passphrase) -> Passphrase {
        let previous = self.store.replace_passphrase(passphrase);
        self.mutated();
        previous
    }

    fn replace_content(
        &mut self,
        header: FileHeader,
        records: Vec<PwsRecord>,
    ) -> (FileHeader, Vec<PwsRecord>) {
        let previous = self.store.replace_content(header, records);
        self.reload();
        self.mutated();
        previous
    }
}
