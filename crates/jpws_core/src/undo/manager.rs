//! Bounded linear undo history.
//!
//! ```text
//! push(e3) after undo():  undo [e1]      redo [e2]
//!                      -> undo [e1, e3]  redo []
//! ```

use crate::options::clamp_undo_entries;
use crate::undo::edit::{EditResult, EditTarget, UndoableEdit};
use log::{debug, warn};
use std::collections::VecDeque;

/// Undo/redo stacks for one container.
///
/// The undo stack is bounded by `limit`; the oldest entry is evicted first.
#[derive(Debug)]
pub struct UndoManager {
    undo_stack: VecDeque<UndoableEdit>,
    redo_stack: Vec<UndoableEdit>,
    limit: usize,
}

impl UndoManager {
    /// Creates a manager; `limit` is clamped to an allowed history size.
    pub fn new(limit: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            limit: clamp_undo_entries(i64::try_from(limit).unwrap_or(i64::MAX)),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Changes the bound, evicting old entries when it shrinks.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = clamp_undo_entries(i64::try_from(limit).unwrap_or(i64::MAX));
        self.enforce_limit();
    }

    /// Records an edit that has already been applied to the target.
    pub fn undoable_edit_happened(&mut self, edit: UndoableEdit) {
        if !self.redo_stack.is_empty() {
            debug!(
                "event=undo_redo_truncated module=undo status=ok dropped={}",
                self.redo_stack.len()
            );
            self.redo_stack.clear();
        }
        self.undo_stack.push_back(edit);
        self.enforce_limit();
    }

    /// Reverts the latest edit.
    ///
    /// Returns `Ok(None)` when there is nothing to undo. A failed edit stays
    /// on the undo stack.
    pub fn undo(&mut self, target: &mut dyn EditTarget) -> EditResult<Option<String>> {
        let Some(mut edit) = self.undo_stack.pop_back() else {
            return Ok(None);
        };
        let name = edit.presentation_name();
        match edit.undo(target) {
            Ok(()) => {
                self.redo_stack.push(edit);
                Ok(Some(name))
            }
            Err(err) => {
                warn!("event=undo_failed module=undo status=error edit={name:?} error={err}");
                self.undo_stack.push_back(edit);
                Err(err)
            }
        }
    }

    /// Re-applies the most recently undone edit.
    pub fn redo(&mut self, target: &mut dyn EditTarget) -> EditResult<Option<String>> {
        let Some(mut edit) = self.redo_stack.pop() else {
            return Ok(None);
        };
        let name = edit.presentation_name();
        match edit.redo(target) {
            Ok(()) => {
                self.undo_stack.push_back(edit);
                Ok(Some(name))
            }
            Err(err) => {
                warn!("event=redo_failed module=undo status=error edit={name:?} error={err}");
                self.redo_stack.push(edit);
                Err(err)
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Menu label for the next undo, e.g. "Undo delete 3 records".
    pub fn undo_presentation_name(&self) -> String {
        match self.undo_stack.back() {
            Some(edit) => format!("Undo {}", edit.presentation_name()),
            None => "Undo".to_string(),
        }
    }

    pub fn redo_presentation_name(&self) -> String {
        match self.redo_stack.last() {
            Some(edit) => format!("Redo {}", edit.presentation_name()),
            None => "Redo".to_string(),
        }
    }

    /// Drops the whole history.
    pub fn discard_all_edits(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    fn enforce_limit(&mut self) {
        while self.undo_stack.len() > self.limit {
            self.undo_stack.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::UndoManager;
    use crate::model::header::{FileHeader, HeaderFieldValue, Passphrase};
    use crate::model::record::{PwsRecord, RecordId};
    use crate::undo::{EditResult, EditTarget, UndoableEdit};

    #[derive(Default)]
    struct Header {
        header: FileHeader,
    }

    impl EditTarget for Header {
        fn insert_records(&mut self, _records: Vec<PwsRecord>) -> EditResult<()> {
            Ok(())
        }

        fn remove_records(&mut self, _ids: &[RecordId]) -> EditResult<Vec<PwsRecord>> {
            Ok(Vec::new())
        }

        fn replace_record(&mut self, record: PwsRecord) -> EditResult<PwsRecord> {
            Ok(record)
        }

        fn replace_groups(
            &mut self,
            groups: Vec<(RecordId, Option<String>)>,
        ) -> EditResult<Vec<(RecordId, Option<String>)>> {
            Ok(groups)
        }

        fn replace_header_field(&mut self, value: HeaderFieldValue) -> HeaderFieldValue {
            self.header.replace(value)
        }

        fn replace_passphrase(&mut self, passphrase: Passphrase) -> Passphrase {
            std::mem::replace(&mut self.header.passphrase, passphrase)
        }

        fn replace_content(
            &mut self,
            header: FileHeader,
            records: Vec<PwsRecord>,
        ) -> (FileHeader, Vec<PwsRecord>) {
            (std::mem::replace(&mut self.header, header), records)
        }
    }

    fn describe(target: &mut Header, text: &str) -> UndoableEdit {
        let previous = target.replace_header_field(HeaderFieldValue::Description(Some(
            text.to_string(),
        )));
        UndoableEdit::HeaderField { value: previous }
    }

    #[test]
    fn undo_then_redo_swaps_field_value() {
        let mut target = Header::default();
        let mut manager = UndoManager::new(10);
        let edit = describe(&mut target, "vault");
        manager.undoable_edit_happened(edit);

        assert_eq!(manager.undo(&mut target).unwrap().as_deref(), Some("edit description"));
        assert_eq!(target.header.description, None);
        manager.redo(&mut target).unwrap();
        assert_eq!(target.header.description.as_deref(), Some("vault"));
    }

    #[test]
    fn empty_history_is_a_no_op() {
        let mut target = Header::default();
        let mut manager = UndoManager::new(10);
        assert_eq!(manager.undo(&mut target).unwrap(), None);
        assert_eq!(manager.redo(&mut target).unwrap(), None);
        assert_eq!(manager.undo_presentation_name(), "Undo");
    }

    #[test]
    fn limit_is_clamped_and_shrinking_evicts_oldest() {
        let mut target = Header::default();
        let mut manager = UndoManager::new(37);
        assert_eq!(manager.limit(), 25);
        for n in 0..25 {
            let edit = describe(&mut target, &n.to_string());
            manager.undoable_edit_happened(edit);
        }
        manager.set_limit(10);
        assert_eq!(manager.undo_depth(), 10);

        for _ in 0..10 {
            manager.undo(&mut target).unwrap();
        }
        assert_eq!(target.header.description.as_deref(), Some("14"));
    }
}
