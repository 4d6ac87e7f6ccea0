//! Sorted, filtered record projection with synchronous listener fan-out.

use crate::list::event::{ListenerId, OrderedListEvent, OrderedListListener};
use crate::list::filter::RecordFilter;
use crate::model::record::{PwsRecord, RecordId};
use crate::model::wrapper::{expiry_status, CollationKey, ImportStatus, RecordWrapper, SortField};
use log::{debug, error, warn};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

/// Listener handle shared between the list and its owner.
pub type SharedListener = Rc<RefCell<dyn OrderedListListener>>;

/// Inputs of the expiry classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExpiryScope {
    pub now_ms: i64,
    pub scope_days: u32,
    /// File-level default password lifetime.
    pub default_lifetime_days: Option<u32>,
}

/// Ordered and filtered list of record wrappers.
pub struct OrderedRecordList {
    items: Vec<RecordWrapper>,
    keys: HashMap<RecordId, CollationKey>,
    sort_field: SortField,
    filter: RecordFilter,
    expiry: ExpiryScope,
    imported: HashSet<RecordId>,
    listeners: Vec<(ListenerId, SharedListener)>,
    next_listener_id: u64,
}

impl Default for OrderedRecordList {
    fn default() -> Self {
        Self::new(SortField::default())
    }
}

impl OrderedRecordList {
    pub fn new(sort_field: SortField) -> Self {
        Self {
            items: Vec::new(),
            keys: HashMap::new(),
            sort_field,
            filter: RecordFilter::default(),
            expiry: ExpiryScope::default(),
            imported: HashSet::new(),
            listeners: Vec::new(),
            next_listener_id: 0,
        }
    }

    // ---- listener protocol ----

    /// Registers a listener; delivery follows registration order.
    pub fn add_listener(&mut self, listener: SharedListener) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, listener));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(entry, _)| *entry != id);
        self.listeners.len() != before
    }

    pub fn remove_all_listeners(&mut self) {
        self.listeners.clear();
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn fire(&self, event: OrderedListEvent) {
        debug!(
            "event=ordered_list_fire module=list kind={:?} listeners={}",
            event.kind(),
            self.listeners.len()
        );
        for (id, listener) in &self.listeners {
            let delivered = catch_unwind(AssertUnwindSafe(|| match listener.try_borrow_mut() {
                Ok(mut listener) => {
                    listener.ordered_list_performed(&event);
                    true
                }
                Err(_) => false,
            }));
            match delivered {
                Ok(true) => {}
                Ok(false) => warn!(
                    "event=ordered_list_fire module=list status=skipped listener={} reason=reentrant",
                    id.0
                ),
                Err(_) => error!(
                    "event=ordered_list_fire module=list status=panic listener={} kind={:?}",
                    id.0,
                    event.kind()
                ),
            }
        }
    }

    // ---- projection state ----

    pub fn sort_field(&self) -> SortField {
        self.sort_field
    }

    pub fn filter(&self) -> &RecordFilter {
        &self.filter
    }

    pub fn expiry_scope(&self) -> ExpiryScope {
        self.expiry
    }

    /// Sets the expiry inputs used by wrappers built afterwards.
    pub fn set_expiry_scope(&mut self, expiry: ExpiryScope) {
        self.expiry = expiry;
    }

    /// Rebuilds the projection from scratch and emits `ListReloaded`.
    ///
    /// Idempotent for identical inputs.
    pub fn load_database<'a>(
        &mut self,
        records: impl IntoIterator<Item = &'a PwsRecord>,
        expiry: ExpiryScope,
    ) {
        self.expiry = expiry;
        let mut items: Vec<RecordWrapper> = records
            .into_iter()
            .map(|record| self.wrap(record.clone()))
            .filter(|wrapper| self.filter.accepts(wrapper))
            .collect();
        items.sort_by(|a, b| a.collate(b));
        self.keys = items
            .iter()
            .map(|wrapper| (wrapper.id(), wrapper.key().clone()))
            .collect();
        self.items = items;
        self.fire(OrderedListEvent::ListReloaded {
            items: self.items.clone(),
        });
    }

    /// Replaces the filter and re-projects `records`.
    pub fn set_filter<'a>(
        &mut self,
        filter: RecordFilter,
        records: impl IntoIterator<Item = &'a PwsRecord>,
    ) {
        self.filter = filter;
        self.load_database(records, self.expiry);
    }

    /// Replaces the sort field and re-projects `records`.
    pub fn set_sort_field<'a>(
        &mut self,
        sort_field: SortField,
        records: impl IntoIterator<Item = &'a PwsRecord>,
    ) {
        self.sort_field = sort_field;
        self.load_database(records, self.expiry);
    }

    /// Marks records as imported; affects wrappers built afterwards.
    pub fn mark_imported(&mut self, ids: impl IntoIterator<Item = RecordId>) {
        self.imported.extend(ids);
    }

    pub fn clear_import_marks(&mut self) {
        self.imported.clear();
    }

    /// Empties the projection and emits `ListCleared`.
    pub fn clear(&mut self) {
        self.items.clear();
        self.keys.clear();
        self.fire(OrderedListEvent::ListCleared);
    }

    // ---- incremental mutations ----

    /// Inserts `record` if the filter accepts it; returns its index.
    pub fn add(&mut self, record: &PwsRecord) -> Option<usize> {
        if self.keys.contains_key(&record.uuid) {
            return self.update_record(record);
        }
        let wrapper = self.wrap(record.clone());
        if !self.filter.accepts(&wrapper) {
            return None;
        }
        Some(self.insert_wrapper(wrapper))
    }

    /// Removes the record with `id` if visible; returns its former index.
    pub fn remove(&mut self, id: RecordId) -> Option<usize> {
        let index = self.index_of_id(id)?;
        let item = self.items.remove(index);
        self.keys.remove(&id);
        self.fire(OrderedListEvent::ItemRemoved {
            index,
            item,
            moving: false,
        });
        Some(index)
    }

    /// Re-wraps, re-filters and re-sorts one changed record.
    ///
    /// Returns the record's index afterwards, or `None` when it is not
    /// visible anymore.
    pub fn update_record(&mut self, record: &PwsRecord) -> Option<usize> {
        let wrapper = self.wrap(record.clone());
        let accepted = self.filter.accepts(&wrapper);
        let Some(old_index) = self.index_of_id(record.uuid) else {
            return accepted.then(|| self.insert_wrapper(wrapper));
        };
        if !accepted {
            self.remove(record.uuid);
            return None;
        }

        let old = self.items.remove(old_index);
        let new_index = match self.search(wrapper.key()) {
            Ok(index) | Err(index) => index,
        };
        if new_index == old_index {
            self.keys.insert(wrapper.id(), wrapper.key().clone());
            self.items.insert(old_index, wrapper.clone());
            self.fire(OrderedListEvent::ItemUpdated {
                index: old_index,
                item: wrapper,
            });
            return Some(old_index);
        }

        self.keys.remove(&old.id());
        self.fire(OrderedListEvent::ItemRemoved {
            index: old_index,
            item: old,
            moving: true,
        });
        Some(self.insert_wrapper(wrapper))
    }

    fn insert_wrapper(&mut self, wrapper: RecordWrapper) -> usize {
        let index = match self.search(wrapper.key()) {
            Ok(index) | Err(index) => index,
        };
        self.keys.insert(wrapper.id(), wrapper.key().clone());
        self.items.insert(index, wrapper.clone());
        self.fire(OrderedListEvent::ItemAdded {
            index,
            item: wrapper,
        });
        index
    }

    fn wrap(&self, record: PwsRecord) -> RecordWrapper {
        let status = expiry_status(
            &record,
            self.expiry.now_ms,
            self.expiry.scope_days,
            self.expiry.default_lifetime_days,
        );
        let import = if self.imported.contains(&record.uuid) {
            ImportStatus::Imported
        } else {
            ImportStatus::Original
        };
        RecordWrapper::new(record, self.sort_field, status).with_import_status(import)
    }

    fn search(&self, key: &CollationKey) -> Result<usize, usize> {
        self.items.binary_search_by(|item| item.key().cmp(key))
    }

    // ---- queries ----

    /// Position of `wrapper` in the current projection.
    ///
    /// Resolved by binary search on the current key of the wrapped record,
    /// so wrappers carrying a stale key still resolve.
    pub fn index_of(&self, wrapper: &RecordWrapper) -> Option<usize> {
        match self.search(wrapper.key()) {
            Ok(index) => Some(index),
            Err(_) => self.index_of_id(wrapper.id()),
        }
    }

    pub fn index_of_id(&self, id: RecordId) -> Option<usize> {
        let key = self.keys.get(&id)?;
        self.search(key).ok()
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.keys.contains_key(&id)
    }

    pub fn get(&self, index: usize) -> Option<&RecordWrapper> {
        self.items.get(index)
    }

    pub fn items(&self) -> &[RecordWrapper] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordWrapper> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Wrappers at `indices`, skipping out-of-range positions.
    pub fn wrappers_at(&self, indices: &[usize]) -> Vec<RecordWrapper> {
        indices
            .iter()
            .filter_map(|index| self.items.get(*index).cloned())
            .collect()
    }
}
