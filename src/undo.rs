//! Undo and redo.
//!
//! Every recorded edit is an [`Action`] holding enough to reverse it and
//! to replay it: the flat character offset it happened at and the text or
//! fragment involved. Offsets are flat so they survive the line splits and
//! joins that layout performs between the edit and its undo.
//!
//! Consecutive typed characters coalesce into one action. Edits bracketed
//! by `begin_user_action`/`end_user_action` undo and redo as a unit; the
//! brackets nest.

use crate::document::{Document, DocumentFragment, Marker};
use crate::options::DEFAULT_MAX_UNDO_DEPTH;

/// Selection as flat offsets, recorded around every action.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct SelectionSnapshot {
    pub start: usize,
    pub end: usize,
    pub caret: usize,
}

#[derive(Clone, Debug)]
pub(crate) enum ActionKind {
    /// Characters typed at the caret. `fragment` is filled in on undo so a
    /// redo brings back the exact runs that were removed.
    Typing {
        offset: usize,
        text: String,
        fragment: Option<DocumentFragment>,
    },
    InsertString {
        offset: usize,
        fragment: DocumentFragment,
    },
    DeleteString {
        offset: usize,
        fragment: DocumentFragment,
    },
    /// Whole paragraphs before and after a format change.
    Restyle {
        offset: usize,
        before: DocumentFragment,
        after: DocumentFragment,
    },
    UserActionBegin {
        name: String,
    },
    UserActionEnd,
}

impl ActionKind {
    fn name(&self) -> &str {
        match self {
            Self::Typing { .. } => "Typing",
            Self::InsertString { .. } => "Insert",
            Self::DeleteString { .. } => "Delete",
            Self::Restyle { .. } => "Format",
            Self::UserActionBegin { name } => name,
            Self::UserActionEnd => "",
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Action {
    pub kind: ActionKind,
    pub sel_before: SelectionSnapshot,
    pub sel_after: SelectionSnapshot,
}

/// Undo and redo stacks with a bounded depth.
#[derive(Clone, Debug)]
pub struct UndoManager {
    undo: Vec<Action>,
    redo: Vec<Action>,
    /// Maximum number of units kept. Oldest units are dropped first.
    max_depth: usize,
    /// Set while replaying so the replayed edits are not recorded again.
    locked: bool,
    /// Whether the next typed character may extend the top action.
    typing_open: bool,
    /// Nesting level of open user actions.
    nesting: usize,
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UNDO_DEPTH)
    }
}

impl UndoManager {
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            max_depth,
            locked: false,
            typing_open: false,
            nesting: 0,
        }
    }

    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
        self.trim();
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Display name of the unit [`Document::undo`] would revert.
    #[must_use]
    pub fn undo_name(&self) -> Option<&str> {
        let top = self.undo.last()?;
        if matches!(top.kind, ActionKind::UserActionEnd) {
            let start = unit_start(&self.undo)?;
            return Some(self.undo[start].kind.name());
        }
        Some(top.kind.name())
    }

    /// Display name of the unit [`Document::redo`] would replay.
    #[must_use]
    pub fn redo_name(&self) -> Option<&str> {
        self.redo.last().map(|a| a.kind.name())
    }

    /// Number of units on the undo stack.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        count_units(&self.undo)
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.typing_open = false;
        self.nesting = 0;
    }

    /// End the current typing run; the next character starts a new action.
    pub(crate) fn close_typing(&mut self) {
        self.typing_open = false;
    }

    pub(crate) fn record_typing(
        &mut self,
        offset: usize,
        text: &str,
        before: SelectionSnapshot,
        after: SelectionSnapshot,
    ) {
        if self.locked {
            return;
        }
        if self.typing_open {
            if let Some(top) = self.undo.last_mut() {
                if let ActionKind::Typing {
                    offset: start,
                    text: typed,
                    ..
                } = &mut top.kind
                {
                    if *start + typed.chars().count() == offset {
                        typed.push_str(text);
                        top.sel_after = after;
                        self.redo.clear();
                        return;
                    }
                }
            }
        }
        self.push(Action {
            kind: ActionKind::Typing {
                offset,
                text: text.to_owned(),
                fragment: None,
            },
            sel_before: before,
            sel_after: after,
        });
        self.typing_open = true;
    }

    pub(crate) fn record_insert(
        &mut self,
        offset: usize,
        fragment: DocumentFragment,
        before: SelectionSnapshot,
        after: SelectionSnapshot,
    ) {
        self.close_typing();
        self.push(Action {
            kind: ActionKind::InsertString { offset, fragment },
            sel_before: before,
            sel_after: after,
        });
    }

    pub(crate) fn record_delete(
        &mut self,
        offset: usize,
        fragment: DocumentFragment,
        before: SelectionSnapshot,
        after: SelectionSnapshot,
    ) {
        self.close_typing();
        self.push(Action {
            kind: ActionKind::DeleteString { offset, fragment },
            sel_before: before,
            sel_after: after,
        });
    }

    pub(crate) fn record_restyle(
        &mut self,
        offset: usize,
        before: DocumentFragment,
        after: DocumentFragment,
        sel_before: SelectionSnapshot,
        sel_after: SelectionSnapshot,
    ) {
        self.close_typing();
        self.push(Action {
            kind: ActionKind::Restyle {
                offset,
                before,
                after,
            },
            sel_before,
            sel_after,
        });
    }

    pub(crate) fn begin_user_action(&mut self, name: &str, snapshot: SelectionSnapshot) {
        if self.locked {
            return;
        }
        self.close_typing();
        self.nesting += 1;
        // Redo survives until something is recorded inside the group.
        self.undo.push(Action {
            kind: ActionKind::UserActionBegin {
                name: name.to_owned(),
            },
            sel_before: snapshot,
            sel_after: snapshot,
        });
    }

    /// Close the innermost user action. A group that recorded nothing is
    /// dropped entirely.
    pub(crate) fn end_user_action(&mut self, snapshot: SelectionSnapshot) {
        if self.locked || self.nesting == 0 {
            return;
        }
        self.close_typing();
        self.nesting -= 1;
        if matches!(
            self.undo.last().map(|a| &a.kind),
            Some(ActionKind::UserActionBegin { .. })
        ) {
            self.undo.pop();
            return;
        }
        self.undo.push(Action {
            kind: ActionKind::UserActionEnd,
            sel_before: snapshot,
            sel_after: snapshot,
        });
        self.trim();
    }

    fn push(&mut self, action: Action) {
        if self.locked {
            return;
        }
        self.redo.clear();
        self.undo.push(action);
        self.trim();
    }

    /// Drop the oldest units until at most `max_depth` remain.
    fn trim(&mut self) {
        // Units never outnumber actions.
        if self.undo.len() <= self.max_depth {
            return;
        }
        let mut excess = count_units(&self.undo).saturating_sub(self.max_depth);
        let mut cut = 0;
        while excess > 0 && cut < self.undo.len() {
            let next = unit_end(&self.undo, cut);
            // An open user action runs to the top of the stack; it is
            // trimmed, if at all, once it closes.
            if self.nesting > 0 && next == self.undo.len() {
                break;
            }
            cut = next;
            excess -= 1;
        }
        if cut > 0 {
            self.undo.drain(..cut);
        }
    }

    /// Pop the newest undo unit, newest action first.
    fn pop_undo_unit(&mut self) -> Vec<Action> {
        let mut unit = Vec::new();
        let mut depth = 0usize;
        while let Some(action) = self.undo.pop() {
            match action.kind {
                ActionKind::UserActionEnd => depth += 1,
                ActionKind::UserActionBegin { .. } => depth = depth.saturating_sub(1),
                _ => {}
            }
            unit.push(action);
            if depth == 0 {
                break;
            }
        }
        unit
    }

    /// Pop the newest redo unit, oldest action first.
    fn pop_redo_unit(&mut self) -> Vec<Action> {
        let mut unit = Vec::new();
        let mut depth = 0usize;
        while let Some(action) = self.redo.pop() {
            match action.kind {
                ActionKind::UserActionBegin { .. } => depth += 1,
                ActionKind::UserActionEnd => depth = depth.saturating_sub(1),
                _ => {}
            }
            unit.push(action);
            if depth == 0 {
                break;
            }
        }
        unit
    }
}

/// Index one past the unit starting at `from` (oldest first).
fn unit_end(actions: &[Action], from: usize) -> usize {
    let mut depth = 0usize;
    for (i, action) in actions.iter().enumerate().skip(from) {
        match action.kind {
            ActionKind::UserActionBegin { .. } => depth += 1,
            ActionKind::UserActionEnd => depth = depth.saturating_sub(1),
            _ => {}
        }
        if depth == 0 {
            return i + 1;
        }
    }
    actions.len()
}

/// Index of the `UserActionBegin` opening the unit on top of `actions`.
fn unit_start(actions: &[Action]) -> Option<usize> {
    let mut depth = 0usize;
    for (i, action) in actions.iter().enumerate().rev() {
        match action.kind {
            ActionKind::UserActionEnd => depth += 1,
            ActionKind::UserActionBegin { .. } => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn count_units(actions: &[Action]) -> usize {
    let mut units = 0;
    let mut at = 0;
    while at < actions.len() {
        at = unit_end(actions, at);
        units += 1;
    }
    units
}

impl Document {
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.undo.can_redo()
    }

    #[must_use]
    pub fn undo_action_name(&self) -> Option<&str> {
        self.undo.undo_name()
    }

    #[must_use]
    pub fn redo_action_name(&self) -> Option<&str> {
        self.undo.redo_name()
    }

    /// The undo history.
    #[must_use]
    pub fn undo_manager(&self) -> &UndoManager {
        &self.undo
    }

    /// Drop all undo and redo history.
    pub fn clear_undo(&mut self) {
        self.undo.clear();
    }

    /// Group the edits that follow into one undo unit named `name` until
    /// the matching [`end_user_action`](Self::end_user_action).
    pub fn begin_user_action(&mut self, name: &str) {
        let snapshot = self.selection_snapshot();
        self.undo.begin_user_action(name, snapshot);
    }

    pub fn end_user_action(&mut self) {
        let snapshot = self.selection_snapshot();
        self.undo.end_user_action(snapshot);
    }

    /// Revert the newest undo unit. Returns false when there is none.
    pub fn undo(&mut self) -> bool {
        self.undo.close_typing();
        let mut unit = self.undo.pop_undo_unit();
        let Some(earliest) = unit.last().map(|a| a.sel_before) else {
            return false;
        };
        self.undo.locked = true;
        self.suspend_recalc();
        for action in &mut unit {
            self.revert(&mut action.kind);
        }
        self.restore_selection(earliest);
        self.resume_recalc(false);
        self.undo.locked = false;
        // Newest-first pops leave the oldest action on top of redo.
        self.undo.redo.extend(unit);
        self.finish_edit();
        true
    }

    /// Replay the newest redo unit. Returns false when there is none.
    pub fn redo(&mut self) -> bool {
        self.undo.close_typing();
        let unit = self.undo.pop_redo_unit();
        let Some(latest) = unit.last().map(|a| a.sel_after) else {
            return false;
        };
        self.undo.locked = true;
        self.suspend_recalc();
        for action in &unit {
            self.replay(&action.kind);
        }
        self.restore_selection(latest);
        self.resume_recalc(false);
        self.undo.locked = false;
        self.undo.undo.extend(unit);
        self.finish_edit();
        true
    }

    fn revert(&mut self, kind: &mut ActionKind) {
        match kind {
            ActionKind::Typing {
                offset,
                text,
                fragment,
            } => {
                let (start, end) = self.flat_range(*offset, text.chars().count());
                *fragment = Some(self.capture(start, end));
                self.delete_between(start, end);
            }
            ActionKind::InsertString { offset, fragment } => {
                let (start, end) = self.flat_range(*offset, fragment.len());
                self.delete_between(start, end);
            }
            ActionKind::DeleteString { offset, fragment } => {
                let at = self.marker_for_offset(*offset);
                self.insert_fragment_at(at, fragment);
            }
            ActionKind::Restyle {
                offset,
                before,
                after,
            } => {
                let (start, end) = self.flat_range(*offset, after.len());
                self.delete_between(start, end);
                let at = self.marker_for_offset(*offset);
                self.insert_fragment_at(at, before);
            }
            ActionKind::UserActionBegin { .. } | ActionKind::UserActionEnd => {}
        }
    }

    fn replay(&mut self, kind: &ActionKind) {
        match kind {
            ActionKind::Typing {
                offset,
                text,
                fragment,
            } => {
                let at = self.marker_for_offset(*offset);
                match fragment {
                    Some(fragment) => {
                        self.insert_fragment_at(at, fragment);
                    }
                    None => {
                        self.insert_at(at, text, None);
                    }
                }
            }
            ActionKind::InsertString { offset, fragment } => {
                let at = self.marker_for_offset(*offset);
                self.insert_fragment_at(at, fragment);
            }
            ActionKind::DeleteString { offset, fragment } => {
                let (start, end) = self.flat_range(*offset, fragment.len());
                self.delete_between(start, end);
            }
            ActionKind::Restyle {
                offset,
                before,
                after,
            } => {
                let (start, end) = self.flat_range(*offset, before.len());
                self.delete_between(start, end);
                let at = self.marker_for_offset(*offset);
                self.insert_fragment_at(at, after);
            }
            ActionKind::UserActionBegin { .. } | ActionKind::UserActionEnd => {}
        }
    }

    fn flat_range(&self, offset: usize, len: usize) -> (Marker, Marker) {
        (
            self.marker_for_offset(offset),
            self.marker_for_offset(offset + len),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocPosition;
    use crate::style::{FontStyle, TextFormat};
    use crate::DocumentOptions;

    fn snap(at: usize) -> SelectionSnapshot {
        SelectionSnapshot {
            start: at,
            end: at,
            caret: at,
        }
    }

    fn type_str(doc: &mut Document, text: &str) {
        for ch in text.chars() {
            doc.type_char(ch).unwrap();
        }
    }

    #[test]
    fn test_typing_coalesces() {
        let mut mgr = UndoManager::new(10);
        mgr.record_typing(0, "a", snap(0), snap(1));
        mgr.record_typing(1, "b", snap(1), snap(2));
        assert_eq!(mgr.undo_depth(), 1);
        mgr.close_typing();
        mgr.record_typing(2, "c", snap(2), snap(3));
        assert_eq!(mgr.undo_depth(), 2);
    }

    #[test]
    fn test_typing_elsewhere_starts_new_action() {
        let mut mgr = UndoManager::new(10);
        mgr.record_typing(0, "a", snap(0), snap(1));
        mgr.record_typing(5, "b", snap(5), snap(6));
        assert_eq!(mgr.undo_depth(), 2);
    }

    #[test]
    fn test_empty_user_action_is_dropped() {
        let mut mgr = UndoManager::new(10);
        mgr.begin_user_action("Nothing", snap(0));
        mgr.end_user_action(snap(0));
        assert!(!mgr.can_undo());
    }

    #[test]
    fn test_depth_trims_oldest_units() {
        let mut mgr = UndoManager::new(2);
        for i in 0..5 {
            mgr.record_insert(i, DocumentFragment::new(), snap(i), snap(i));
        }
        assert_eq!(mgr.undo_depth(), 2);

        mgr.begin_user_action("Group", snap(0));
        mgr.record_insert(0, DocumentFragment::new(), snap(0), snap(0));
        mgr.record_insert(0, DocumentFragment::new(), snap(0), snap(0));
        mgr.end_user_action(snap(0));
        assert_eq!(mgr.undo_depth(), 2);
        assert_eq!(mgr.undo_name(), Some("Group"));
    }

    #[test]
    fn test_trim_never_cuts_an_open_user_action() {
        let mut mgr = UndoManager::new(0);
        mgr.begin_user_action("Group", snap(0));
        mgr.record_insert(0, DocumentFragment::new(), snap(0), snap(0));
        mgr.begin_user_action("Inner", snap(0));
        mgr.record_insert(0, DocumentFragment::new(), snap(0), snap(0));
        mgr.end_user_action(snap(0));
        assert_eq!(mgr.undo.len(), 5);
        assert!(matches!(mgr.undo[0].kind, ActionKind::UserActionBegin { .. }));

        mgr.end_user_action(snap(0));
        assert!(!mgr.can_undo());
        assert_eq!(mgr.nesting, 0);

        mgr.set_max_depth(3);
        mgr.begin_user_action("Later", snap(0));
        mgr.record_insert(0, DocumentFragment::new(), snap(0), snap(0));
        mgr.set_max_depth(0);
        assert_eq!(mgr.undo.len(), 2);
        mgr.end_user_action(snap(0));
        assert!(mgr.undo.is_empty());
    }

    #[test]
    fn test_undo_redo_typing() {
        let mut doc = Document::new();
        type_str(&mut doc, "abc");
        assert_eq!(doc.undo_manager().undo_name(), Some("Typing"));
        assert!(doc.undo());
        assert_eq!(doc.text(), "");
        assert!(!doc.can_undo());
        assert!(doc.redo());
        assert_eq!(doc.text(), "abc");
        assert_eq!(doc.caret_position(), DocPosition::new(1, 3));
    }

    #[test]
    fn test_undo_backspace_restores_text_and_caret() {
        let mut doc = Document::new();
        type_str(&mut doc, "hello");
        doc.backspace();
        doc.backspace();
        assert_eq!(doc.text(), "hel");
        assert!(doc.undo());
        assert_eq!(doc.text(), "hell");
        assert!(doc.undo());
        assert_eq!(doc.text(), "hello");
        assert_eq!(doc.caret_position(), DocPosition::new(1, 5));
    }

    #[test]
    fn test_undo_multiline_delete() {
        let mut doc = Document::new();
        doc.insert(1, 0, "one\r\ntwo\r\nthree").unwrap();
        doc.set_selection(DocPosition::new(1, 1), DocPosition::new(3, 2))
            .unwrap();
        assert!(doc.delete_selection());
        assert_eq!(doc.text(), "oree");
        assert!(doc.undo());
        assert_eq!(doc.text(), "one\r\ntwo\r\nthree");
        assert_eq!(doc.selected_text(), "ne\r\ntwo\r\nth");
        assert!(doc.redo());
        assert_eq!(doc.text(), "oree");
    }

    #[test]
    fn test_undo_restyle() {
        let mut doc = Document::new();
        type_str(&mut doc, "abc");
        doc.set_selection(DocPosition::new(1, 1), DocPosition::new(1, 2))
            .unwrap();
        doc.set_selection_format(&TextFormat::new().style_on(FontStyle::BOLD))
            .unwrap();
        assert!(doc.line(1).unwrap().char_formats()[1].font.bold());
        assert_eq!(doc.undo_manager().undo_name(), Some("Format"));

        assert!(doc.undo());
        assert!(doc.line(1).unwrap().char_formats().iter().all(|f| !f.font.bold()));
        assert_eq!(doc.line(1).unwrap().tags().len(), 1);
        assert_eq!(doc.selected_text(), "b");

        assert!(doc.redo());
        assert!(doc.line(1).unwrap().char_formats()[1].font.bold());
        assert_eq!(doc.text(), "abc");
    }

    #[test]
    fn test_replace_selection_is_one_unit() {
        let mut doc = Document::new();
        doc.insert(1, 0, "Hello World").unwrap();
        doc.set_selection(DocPosition::new(1, 6), DocPosition::new(1, 11))
            .unwrap();
        doc.replace_selection("There").unwrap();
        assert_eq!(doc.text(), "Hello There");
        assert_eq!(doc.undo_manager().undo_name(), Some("Replace"));
        assert!(doc.undo());
        assert_eq!(doc.text(), "Hello World");
        assert_eq!(doc.selected_text(), "World");
        assert!(!doc.can_undo());
        assert!(doc.redo());
        assert_eq!(doc.text(), "Hello There");
    }

    #[test]
    fn test_new_edit_clears_redo() {
        let mut doc = Document::new();
        type_str(&mut doc, "ab");
        doc.undo();
        assert!(doc.can_redo());
        type_str(&mut doc, "x");
        assert!(!doc.can_redo());
    }

    #[test]
    fn test_user_action_groups_edits() {
        let mut doc = Document::new();
        doc.begin_user_action("Paste twice");
        doc.insert_at_caret("one ").unwrap();
        doc.insert_at_caret("two").unwrap();
        doc.end_user_action();
        assert_eq!(doc.text(), "one two");
        assert_eq!(doc.undo_manager().undo_name(), Some("Paste twice"));
        assert!(doc.undo());
        assert_eq!(doc.text(), "");
        assert!(!doc.can_undo());
    }

    #[test]
    fn test_undo_survives_rewrap() {
        let mut doc =
            Document::with_options(DocumentOptions::default().word_wrap(true).viewport(60.0, 100.0));
        type_str(&mut doc, "alpha beta gamma");
        assert!(doc.line_count() > 1);
        assert!(doc.undo());
        assert_eq!(doc.text(), "");
        assert_eq!(doc.line_count(), 1);
        assert!(doc.redo());
        assert_eq!(doc.text(), "alpha beta gamma");
        doc.check_invariants().unwrap();
    }
}
