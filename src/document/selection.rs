//! Selection: bounds, expansion by word or line, minimal repaint.

use crate::document::marker::{DocPosition, Marker};
use crate::document::Document;
use crate::error::Result;
use crate::undo::SelectionSnapshot;

/// Unit a selection gesture grows by.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SelectionMode {
    /// Character positions (click and drag).
    #[default]
    Position,
    /// Whole words (double click).
    Word,
    /// Whole paragraphs (triple click).
    Line,
}

/// Characters that end a word for selection, word motion and whole-word
/// search.
pub(crate) fn is_word_separator(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '(' | ')')
}

impl Document {
    #[must_use]
    pub fn selection_start(&self) -> Marker {
        self.cursors.selection_start
    }

    #[must_use]
    pub fn selection_end(&self) -> Marker {
        self.cursors.selection_end
    }

    /// Selection bounds as positions, start first.
    #[must_use]
    pub fn selection_range(&self) -> (DocPosition, DocPosition) {
        (
            self.position_of(self.cursors.selection_start),
            self.position_of(self.cursors.selection_end),
        )
    }

    #[must_use]
    pub fn has_selection(&self) -> bool {
        self.cursors.selection_start != self.cursors.selection_end
    }

    /// Selected text with line terminators.
    #[must_use]
    pub fn selected_text(&self) -> String {
        let (start, end) = self.selection_range();
        self.text_range(start, end).unwrap_or_default()
    }

    /// Select between two positions in either order. The caret goes to
    /// `end` and the anchor to `start`.
    pub fn set_selection(&mut self, start: DocPosition, end: DocPosition) -> Result<()> {
        let anchor = self.marker_at(start)?;
        let caret = self.marker_at(end)?;
        let (s, e) = if start <= end {
            (anchor, caret)
        } else {
            (caret, anchor)
        };
        self.cursors.anchor = anchor;
        self.cursors.anchor_end = anchor;
        self.set_caret_marker(caret);
        self.apply_selection(s, e, true);
        Ok(())
    }

    /// Move the selection start; the end follows when it would fall behind.
    pub fn set_selection_start(&mut self, pos: DocPosition, invalidate: bool) -> Result<()> {
        let start = self.marker_at(pos)?;
        let end = if self.position_of(self.cursors.selection_end) < pos {
            start
        } else {
            self.cursors.selection_end
        };
        self.apply_selection(start, end, invalidate);
        Ok(())
    }

    /// Move the selection end; the start follows when it would get ahead.
    pub fn set_selection_end(&mut self, pos: DocPosition, invalidate: bool) -> Result<()> {
        let end = self.marker_at(pos)?;
        let start = if self.position_of(self.cursors.selection_start) > pos {
            end
        } else {
            self.cursors.selection_start
        };
        self.apply_selection(start, end, invalidate);
        Ok(())
    }

    /// With `start`, collapse the selection and anchor at the caret.
    /// Otherwise extend the selection from the anchor to the caret.
    pub fn set_selection_to_caret(&mut self, start: bool) {
        let caret = self.cursors.caret;
        if start {
            self.cursors.anchor = caret;
            self.cursors.anchor_end = caret;
            self.apply_selection(caret, caret, true);
            return;
        }
        let anchor = self.cursors.anchor;
        let (s, e) = self.ordered(anchor, caret);
        self.apply_selection(s, e, true);
    }

    /// Select around the caret in units of `mode`. With `extend_from_caret`
    /// the selection grows from the anchor range to the caret instead.
    pub fn expand_selection(&mut self, mode: SelectionMode, extend_from_caret: bool) {
        let caret = self.cursors.caret;
        let (cs, ce) = match mode {
            SelectionMode::Position => (caret, caret),
            SelectionMode::Word => self.word_bounds(caret),
            SelectionMode::Line => {
                let (from, to) = self.paragraph_bounds(caret.line, caret.line);
                (Marker::new(from, 0), Marker::new(to, self.line_ref(to).len()))
            }
        };
        if extend_from_caret {
            let (anchor, anchor_end) = (self.cursors.anchor, self.cursors.anchor_end);
            let (s, e) = if self.position_of(caret) < self.position_of(anchor) {
                (cs, self.later(anchor, anchor_end))
            } else {
                (anchor, self.later(ce, anchor_end))
            };
            self.apply_selection(s, e, true);
        } else {
            self.cursors.anchor = cs;
            self.cursors.anchor_end = ce;
            self.apply_selection(cs, ce, true);
        }
    }

    /// Select the whole document.
    pub fn select_all(&mut self) {
        let start = Marker::new(self.first_line(), 0);
        let last = self.last_line();
        let end = Marker::new(last, self.line_ref(last).len());
        self.cursors.anchor = start;
        self.cursors.anchor_end = start;
        self.set_caret_marker(end);
        self.apply_selection(start, end, true);
    }

    /// Word around `at`. On a separator the separator itself is the word.
    pub(crate) fn word_bounds(&self, at: Marker) -> (Marker, Marker) {
        let chars: Vec<char> = self.line_ref(at.line).text().chars().collect();
        let mut s = at.pos.min(chars.len());
        while s > 0 && !is_word_separator(chars[s - 1]) {
            s -= 1;
        }
        let mut e = at.pos.min(chars.len());
        while e < chars.len() && !is_word_separator(chars[e]) {
            e += 1;
        }
        if s == e && e < chars.len() {
            e += 1;
        }
        (Marker::new(at.line, s), Marker::new(at.line, e))
    }

    fn ordered(&self, a: Marker, b: Marker) -> (Marker, Marker) {
        if self.position_of(a) <= self.position_of(b) {
            (a, b)
        } else {
            (b, a)
        }
    }

    fn later(&self, a: Marker, b: Marker) -> Marker {
        self.ordered(a, b).1
    }

    /// Store new bounds, repainting only what changed.
    pub(crate) fn apply_selection(&mut self, start: Marker, end: Marker, invalidate: bool) {
        let (old_start, old_end) = (self.cursors.selection_start, self.cursors.selection_end);
        if (old_start, old_end) == (start, end) {
            return;
        }
        self.cursors.selection_start = start;
        self.cursors.selection_end = end;

        if invalidate && self.options.show_selection {
            let (os, oe) = (self.position_of(old_start), self.position_of(old_end));
            let (ns, ne) = (self.position_of(start), self.position_of(end));
            if ns > oe || ne < os {
                if os != oe {
                    self.invalidate_range(old_start, old_end);
                }
                if ns != ne {
                    self.invalidate_range(start, end);
                }
            } else {
                if os != ns {
                    self.invalidate_range(old_start, start);
                }
                if oe != ne {
                    self.invalidate_range(old_end, end);
                }
            }
        }
        self.events().selection_changed.emit(&());
    }

    /// Put caret and selection at `at`.
    pub(crate) fn collapse_to(&mut self, at: Marker) {
        self.cursors.anchor = at;
        self.cursors.anchor_end = at;
        self.cursors.caret_x = None;
        self.set_caret_marker(at);
        self.apply_selection(at, at, true);
    }

    pub(crate) fn selection_snapshot(&self) -> SelectionSnapshot {
        SelectionSnapshot {
            start: self.offset_of(self.cursors.selection_start),
            end: self.offset_of(self.cursors.selection_end),
            caret: self.offset_of(self.cursors.caret),
        }
    }

    pub(crate) fn restore_selection(&mut self, snapshot: SelectionSnapshot) {
        let start = self.marker_for_offset(snapshot.start);
        let end = self.marker_for_offset(snapshot.end);
        let caret = self.marker_for_offset(snapshot.caret);
        self.cursors.anchor = start;
        self.cursors.anchor_end = start;
        self.set_caret_marker(caret);
        self.apply_selection(start, end, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with(text: &str) -> Document {
        let mut doc = Document::new();
        doc.insert(1, 0, text).unwrap();
        doc
    }

    #[test]
    fn test_set_selection_orders_bounds() {
        let mut doc = doc_with("Hello World");
        doc.set_selection(DocPosition::new(1, 8), DocPosition::new(1, 2))
            .unwrap();
        assert_eq!(
            doc.selection_range(),
            (DocPosition::new(1, 2), DocPosition::new(1, 8))
        );
        assert_eq!(doc.selected_text(), "llo Wo");
        assert_eq!(doc.caret_position(), DocPosition::new(1, 2));
    }

    #[test]
    fn test_set_selection_start_pushes_end() {
        let mut doc = doc_with("abcdef");
        doc.set_selection(DocPosition::new(1, 1), DocPosition::new(1, 2))
            .unwrap();
        doc.set_selection_start(DocPosition::new(1, 4), true).unwrap();
        assert_eq!(
            doc.selection_range(),
            (DocPosition::new(1, 4), DocPosition::new(1, 4))
        );
    }

    #[test]
    fn test_expand_word_and_line() {
        let mut doc = doc_with("one two(three)\r\nnext");
        doc.set_caret(1, 5).unwrap();
        doc.expand_selection(SelectionMode::Word, false);
        assert_eq!(doc.selected_text(), "two");
        doc.expand_selection(SelectionMode::Line, false);
        assert_eq!(doc.selected_text(), "one two(three)");
    }

    #[test]
    fn test_extend_word_selection_to_caret() {
        let mut doc = doc_with("alpha beta gamma");
        doc.set_caret(1, 7).unwrap();
        doc.expand_selection(SelectionMode::Word, false);
        assert_eq!(doc.selected_text(), "beta");
        doc.set_caret(1, 13).unwrap();
        doc.expand_selection(SelectionMode::Word, true);
        assert_eq!(doc.selected_text(), "beta gamma");
        doc.set_caret(1, 2).unwrap();
        doc.expand_selection(SelectionMode::Word, true);
        assert_eq!(doc.selected_text(), "alpha beta");
    }

    #[test]
    fn test_selection_change_invalidates_only_difference() {
        let mut doc = doc_with("Hello World");
        doc.set_selection(DocPosition::new(1, 0), DocPosition::new(1, 5))
            .unwrap();
        doc.take_invalid_rects();
        doc.set_selection_end(DocPosition::new(1, 7), true).unwrap();
        let rects = doc.take_invalid_rects();
        assert_eq!(rects.len(), 1);
        let line = doc.line(1).unwrap();
        assert!((rects[0].x - line.x_of(5)).abs() < 0.01);
        assert!(rects[0].right() <= line.x_of(7) + 1.01);
    }

    #[test]
    fn test_selection_to_caret() {
        let mut doc = doc_with("abcdef");
        doc.set_caret(1, 1).unwrap();
        doc.set_selection_to_caret(true);
        doc.move_caret(crate::CaretDirection::CharForward);
        doc.move_caret(crate::CaretDirection::CharForward);
        doc.set_selection_to_caret(false);
        assert_eq!(doc.selected_text(), "bc");
    }
}
