//! Bounded recency lists of record identifiers.
//!
//! # Responsibility
//! - Keep most-recently-touched record IDs in front order.
//! - Persist as a delimited string inside the database header.
//!
//! # Invariants
//! - No duplicate IDs; length never exceeds capacity.
//! - Parsing skips malformed tokens instead of failing.

use crate::model::record::RecordId;
use std::collections::VecDeque;
use uuid::Uuid;

/// Delimiter between IDs in the persisted form.
pub const RECENT_LIST_DELIMITER: char = ';';

pub const DEFAULT_USED_CAPACITY: usize = 16;
pub const DEFAULT_EDITED_CAPACITY: usize = 16;
pub const DEFAULT_FAVOURITES_CAPACITY: usize = 256;

/// Ordered set of record IDs, most recent first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentList {
    entries: VecDeque<RecordId>,
    capacity: usize,
    modified: bool,
}

impl RecentList {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
            modified: false,
        }
    }

    /// Parses the persisted form; the result is not marked modified.
    pub fn from_persist_string(capacity: usize, value: &str) -> Self {
        let mut list = Self::new(capacity);
        for token in value.split(RECENT_LIST_DELIMITER) {
            let Ok(id) = Uuid::parse_str(token.trim()) else {
                continue;
            };
            if list.entries.contains(&id) || list.entries.len() >= list.capacity {
                continue;
            }
            list.entries.push_back(id);
        }
        list
    }

    pub fn to_persist_string(&self) -> String {
        self.entries
            .iter()
            .map(Uuid::to_string)
            .collect::<Vec<_>>()
            .join(&RECENT_LIST_DELIMITER.to_string())
    }

    /// Moves `id` to the front, evicting the oldest entry when full.
    pub fn touch(&mut self, id: RecordId) {
        if self.entries.front() == Some(&id) {
            return;
        }
        self.entries.retain(|entry| *entry != id);
        self.entries.push_front(id);
        self.entries.truncate(self.capacity);
        self.modified = true;
    }

    /// Removes `id`; returns whether it was present.
    pub fn remove(&mut self, id: RecordId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| *entry != id);
        let removed = self.entries.len() != before;
        self.modified |= removed;
        removed
    }

    /// Drops every ID rejected by `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&RecordId) -> bool) {
        let before = self.entries.len();
        self.entries.retain(|id| keep(id));
        self.modified |= self.entries.len() != before;
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.entries.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordId> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn reset_modified(&mut self) {
        self.modified = false;
    }
}

/// The per-container "used", "edited" and "favourite" lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentLists {
    pub used: RecentList,
    pub edited: RecentList,
    pub favourites: RecentList,
}

impl Default for RecentLists {
    fn default() -> Self {
        Self {
            used: RecentList::new(DEFAULT_USED_CAPACITY),
            edited: RecentList::new(DEFAULT_EDITED_CAPACITY),
            favourites: RecentList::new(DEFAULT_FAVOURITES_CAPACITY),
        }
    }
}

impl RecentLists {
    pub fn is_modified(&self) -> bool {
        self.used.is_modified() || self.edited.is_modified() || self.favourites.is_modified()
    }

    pub fn reset_modified(&mut self) {
        self.used.reset_modified();
        self.edited.reset_modified();
        self.favourites.reset_modified();
    }

    /// Forgets a record in all lists.
    pub fn purge(&mut self, id: RecordId) {
        self.used.remove(id);
        self.edited.remove(id);
        self.favourites.remove(id);
    }

    /// Toggles favourite membership; returns the new state.
    pub fn toggle_favourite(&mut self, id: RecordId) -> bool {
        if self.favourites.remove(id) {
            false
        } else {
            self.favourites.touch(id);
            true
        }
    }
}
