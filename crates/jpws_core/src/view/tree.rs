//! Group tree view over the ordered list.
//!
//! # Invariants
//! - Group selection and record selection are mutually exclusive; every
//!   selection change clears the other class.
//! - A selected group that loses its last record is deselected.
//! - Group record counts always match the mirrored rows.

use crate::list::{OrderedListEvent, OrderedListListener};
use crate::model::record::GROUP_SEPARATOR;
use crate::model::wrapper::RecordWrapper;
use crate::view::selection::SelectionModel;
use crate::view::{ContainerView, SelectionStatus, ViewMode};
use std::collections::{BTreeMap, BTreeSet};

/// Delimiter between group paths in the persisted expansion state.
pub const EXPANSION_DELIMITER: char = '\n';

/// One displayable line of the flattened tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    Group {
        path: String,
        name: String,
        depth: usize,
        expanded: bool,
    },
    /// Record at `index` of the ordered list.
    Leaf { index: usize, depth: usize },
}

/// Tree presentation grouping records by their group path.
#[derive(Debug, Default)]
pub struct TreeView {
    model: SelectionModel,
    group_counts: BTreeMap<String, usize>,
    selected_group: Option<String>,
    expanded: BTreeSet<String>,
    disposed: bool,
}

impl TreeView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects a group node and clears record selection.
    ///
    /// Returns `false` when the group does not exist.
    pub fn select_group(&mut self, path: &str) -> bool {
        if !self.group_counts.contains_key(path) {
            return false;
        }
        self.model.clear_selection();
        self.selected_group = Some(path.to_string());
        true
    }

    pub fn selected_group(&self) -> Option<&str> {
        self.selected_group.as_deref()
    }

    /// All group paths currently present, including intermediate ones.
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.group_counts.keys().map(String::as_str)
    }

    /// Number of records at or below `path`.
    pub fn group_size(&self, path: &str) -> usize {
        self.group_counts.get(path).copied().unwrap_or(0)
    }

    /// Ordered list indices of records at or below `path`.
    pub fn group_items(&self, path: &str) -> Vec<usize> {
        self.model
            .rows()
            .iter()
            .enumerate()
            .filter(|(_, row)| row.record().is_in_group(path))
            .map(|(index, _)| index)
            .collect()
    }

    pub fn expand(&mut self, path: &str) {
        self.expanded.insert(path.to_string());
    }

    pub fn collapse(&mut self, path: &str) {
        self.expanded.remove(path);
    }

    pub fn is_expanded(&self, path: &str) -> bool {
        self.expanded.contains(path)
    }

    /// Expanded group paths in persisted form.
    pub fn expansion_state(&self) -> String {
        self.expanded
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(&EXPANSION_DELIMITER.to_string())
    }

    pub fn restore_expansion(&mut self, state: &str) {
        self.expanded = state
            .split(EXPANSION_DELIMITER)
            .filter(|path| !path.is_empty())
            .map(str::to_string)
            .collect();
    }

    /// Flattened display lines honoring expansion state.
    pub fn visible_nodes(&self) -> Vec<TreeNode> {
        let mut leaves: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (index, row) in self.model.rows().iter().enumerate() {
            leaves
                .entry(row.record().group_path())
                .or_default()
                .push(index);
        }
        let mut out = Vec::new();
        self.walk("", 0, &leaves, &mut out);
        out
    }

    fn walk(
        &self,
        parent: &str,
        depth: usize,
        leaves: &BTreeMap<&str, Vec<usize>>,
        out: &mut Vec<TreeNode>,
    ) {
        let mut children: Vec<&String> = self
            .group_counts
            .keys()
            .filter(|path| parent_of(path) == parent)
            .collect();
        children.sort_by_key(|path| path.to_lowercase());

        for child in children {
            let expanded = self.expanded.contains(child);
            out.push(TreeNode::Group {
                path: child.clone(),
                name: last_segment(child).to_string(),
                depth,
                expanded,
            });
            if expanded {
                self.walk(child, depth + 1, leaves, out);
            }
        }
        if let Some(indices) = leaves.get(parent) {
            out.extend(indices.iter().map(|index| TreeNode::Leaf {
                index: *index,
                depth,
            }));
        }
    }

    fn recount(&mut self) {
        self.group_counts.clear();
        for row in self.model.rows() {
            adjust_counts(&mut self.group_counts, row, 1);
        }
    }

    fn drop_vanished_group(&mut self) {
        let vanished = self
            .selected_group
            .as_ref()
            .is_some_and(|path| !self.group_counts.contains_key(path));
        if vanished {
            self.selected_group = None;
        }
    }
}

impl OrderedListListener for TreeView {
    fn ordered_list_performed(&mut self, event: &OrderedListEvent) {
        if self.disposed {
            return;
        }
        match event {
            OrderedListEvent::ItemAdded { item, .. } => {
                self.model.apply(event);
                adjust_counts(&mut self.group_counts, item, 1);
            }
            OrderedListEvent::ItemUpdated { index, item } => {
                if let Some(previous) = self.model.rows().get(*index).cloned() {
                    adjust_counts(&mut self.group_counts, &previous, -1);
                }
                self.model.apply(event);
                adjust_counts(&mut self.group_counts, item, 1);
            }
            OrderedListEvent::ItemRemoved { item, .. } => {
                self.model.apply(event);
                adjust_counts(&mut self.group_counts, item, -1);
            }
            OrderedListEvent::ListReloaded { .. } => {
                self.model.apply(event);
                self.recount();
            }
            OrderedListEvent::ListCleared => {
                self.model.apply(event);
                self.group_counts.clear();
            }
        }
        self.drop_vanished_group();
    }
}

impl ContainerView for TreeView {
    fn view_mode(&self) -> ViewMode {
        ViewMode::Tree
    }

    fn selected_items(&self) -> Vec<usize> {
        self.model.selected_indices()
    }

    fn set_selected_items(&mut self, indices: &[usize]) {
        self.selected_group = None;
        self.model.select_indices(indices);
    }

    fn set_selected_wrappers(&mut self, wrappers: &[RecordWrapper]) {
        self.selected_group = None;
        self.model.select_wrappers(wrappers);
    }

    fn selected_wrappers(&self) -> Vec<RecordWrapper> {
        self.model.selected_wrappers()
    }

    fn has_user_selection(&self) -> bool {
        self.selected_group.is_some() || self.model.selection_len() > 0
    }

    fn clear_selection(&mut self) {
        self.selected_group = None;
        self.model.clear_selection();
    }

    fn selection_status(&self) -> SelectionStatus {
        if self.selected_group.is_some() {
            SelectionStatus::GroupSelected
        } else {
            SelectionStatus::from_count(self.model.selection_len())
        }
    }

    fn dispose(&mut self) {
        self.model.clear();
        self.group_counts.clear();
        self.selected_group = None;
        self.disposed = true;
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}

fn adjust_counts(counts: &mut BTreeMap<String, usize>, wrapper: &RecordWrapper, delta: isize) {
    for path in ancestors(wrapper.record().group_path()) {
        let remaining = {
            let entry = counts.entry(path.clone()).or_insert(0);
            *entry = entry.saturating_add_signed(delta);
            *entry
        };
        if remaining == 0 {
            counts.remove(&path);
        }
    }
}

/// `A.B.C` yields `A`, `A.B`, `A.B.C`; top level yields nothing.
fn ancestors(path: &str) -> Vec<String> {
    if path.is_empty() {
        return Vec::new();
    }
    path.char_indices()
        .filter(|(_, c)| *c == GROUP_SEPARATOR)
        .map(|(index, _)| path[..index].to_string())
        .chain(std::iter::once(path.to_string()))
        .collect()
}

fn parent_of(path: &str) -> &str {
    path.rsplit_once(GROUP_SEPARATOR)
        .map(|(parent, _)| parent)
        .unwrap_or("")
}

fn last_segment(path: &str) -> &str {
    path.rsplit_once(GROUP_SEPARATOR)
        .map(|(_, name)| name)
        .unwrap_or(path)
}
