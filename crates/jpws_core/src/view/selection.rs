//! Row mirror plus index selection shared by the concrete views.

use crate::list::OrderedListEvent;
use crate::model::record::RecordId;
use crate::model::wrapper::RecordWrapper;
use std::collections::BTreeSet;

/// Rows mirrored from the ordered list and the selected positions in them.
#[derive(Debug, Default)]
pub struct SelectionModel {
    rows: Vec<RecordWrapper>,
    selected: BTreeSet<usize>,
    /// Selected record in the middle of a position move.
    moving: Option<RecordId>,
}

impl SelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one list event to rows and selection.
    pub fn apply(&mut self, event: &OrderedListEvent) {
        let moving = self.moving.take();
        match event {
            OrderedListEvent::ItemAdded { index, item } => {
                let index = (*index).min(self.rows.len());
                self.rows.insert(index, item.clone());
                self.selected = self
                    .selected
                    .iter()
                    .map(|selected| if *selected >= index { selected + 1 } else { *selected })
                    .collect();
                if moving == Some(item.id()) {
                    self.selected.insert(index);
                }
            }
            OrderedListEvent::ItemUpdated { index, item } => {
                if let Some(row) = self.rows.get_mut(*index) {
                    *row = item.clone();
                }
            }
            OrderedListEvent::ItemRemoved {
                index,
                item,
                moving: is_move,
            } => {
                if *index < self.rows.len() {
                    self.rows.remove(*index);
                }
                if *is_move && self.selected.contains(index) {
                    self.moving = Some(item.id());
                }
                self.selected = self
                    .selected
                    .iter()
                    .filter(|selected| **selected != *index)
                    .map(|selected| if *selected > *index { selected - 1 } else { *selected })
                    .collect();
            }
            OrderedListEvent::ListReloaded { items } => {
                let kept: Vec<RecordWrapper> = self.selected_wrappers();
                self.rows = items.clone();
                self.selected = kept.iter().filter_map(|item| self.resolve(item)).collect();
            }
            OrderedListEvent::ListCleared => {
                self.rows.clear();
                self.selected.clear();
            }
        }
    }

    /// Position of `wrapper` in the mirrored rows.
    pub fn resolve(&self, wrapper: &RecordWrapper) -> Option<usize> {
        match self
            .rows
            .binary_search_by(|row| row.key().cmp(wrapper.key()))
        {
            Ok(index) => Some(index),
            Err(_) => self.position_of_id(wrapper.id()),
        }
    }

    pub fn position_of_id(&self, id: RecordId) -> Option<usize> {
        self.rows.iter().position(|row| row.id() == id)
    }

    pub fn select_indices(&mut self, indices: &[usize]) {
        let len = self.rows.len();
        self.moving = None;
        self.selected = indices.iter().copied().filter(|index| *index < len).collect();
    }

    pub fn select_wrappers(&mut self, wrappers: &[RecordWrapper]) {
        self.moving = None;
        self.selected = wrappers
            .iter()
            .filter_map(|wrapper| self.resolve(wrapper))
            .collect();
    }

    pub fn selected_indices(&self) -> Vec<usize> {
        self.selected.iter().copied().collect()
    }

    pub fn selected_wrappers(&self) -> Vec<RecordWrapper> {
        self.selected
            .iter()
            .filter_map(|index| self.rows.get(*index).cloned())
            .collect()
    }

    pub fn selection_len(&self) -> usize {
        self.selected.len()
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
        self.moving = None;
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.clear_selection();
    }

    pub fn rows(&self) -> &[RecordWrapper] {
        &self.rows
    }
}
