//! Flat table view over the ordered list.

use crate::list::{OrderedListEvent, OrderedListListener};
use crate::model::wrapper::RecordWrapper;
use crate::view::selection::SelectionModel;
use crate::view::{ContainerView, SelectionStatus, ViewMode};

/// Table presentation: one row per ordered list item.
#[derive(Debug, Default)]
pub struct TableView {
    model: SelectionModel,
    disposed: bool,
}

impl TableView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row_count(&self) -> usize {
        self.model.rows().len()
    }

    pub fn rows(&self) -> &[RecordWrapper] {
        self.model.rows()
    }
}

impl OrderedListListener for TableView {
    fn ordered_list_performed(&mut self, event: &OrderedListEvent) {
        if self.disposed {
            return;
        }
        self.model.apply(event);
    }
}

impl ContainerView for TableView {
    fn view_mode(&self) -> ViewMode {
        ViewMode::Table
    }

    fn selected_items(&self) -> Vec<usize> {
        self.model.selected_indices()
    }

    fn set_selected_items(&mut self, indices: &[usize]) {
        self.model.select_indices(indices);
    }

    fn set_selected_wrappers(&mut self, wrappers: &[RecordWrapper]) {
        self.model.select_wrappers(wrappers);
    }

    fn selected_wrappers(&self) -> Vec<RecordWrapper> {
        self.model.selected_wrappers()
    }

    fn has_user_selection(&self) -> bool {
        self.model.selection_len() > 0
    }

    fn clear_selection(&mut self) {
        self.model.clear_selection();
    }

    fn selection_status(&self) -> SelectionStatus {
        SelectionStatus::from_count(self.model.selection_len())
    }

    fn dispose(&mut self) {
        self.model.clear();
        self.disposed = true;
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}
