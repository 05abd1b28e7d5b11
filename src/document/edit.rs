//! Text editing.
//!
//! Two layers live here. The structural primitives (`add`, `split`,
//! `combine`, `insert`, `delete_*`) change lines and keep markers valid but
//! record nothing. The caret operations (`type_char`, `insert_at_caret`,
//! `backspace`, ...) are what an editor binds to keys; they go through the
//! undo log.

use crate::document::fragment::DocumentFragment;
use crate::document::line::{Line, LineEnding};
use crate::document::marker::{DocPosition, Marker};
use crate::document::tree::LineId;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::picture::Picture;
use crate::style::TagFormat;

fn has_line_break(text: &str) -> bool {
    text.contains(['\r', '\n'])
}

impl Document {
    // ------------------------------------------------------------------
    // Structural primitives
    // ------------------------------------------------------------------

    /// Insert a new line at 1-based `line_no`; numbers past the end append.
    pub fn add(
        &mut self,
        line_no: usize,
        text: &str,
        format: TagFormat,
        ending: LineEnding,
    ) -> Result<LineId> {
        if line_no == 0 {
            return Err(Error::out_of_range("line", 0, self.line_count() + 1));
        }
        if has_line_break(text) {
            return Err(Error::InvalidArgument(
                "line text cannot contain a line terminator".into(),
            ));
        }
        let line_no = line_no.min(self.line_count() + 1);
        if line_no > self.line_count() {
            // The old last line is no longer last.
            let last = self.last_line();
            if self.line_ref(last).ending() == LineEnding::None {
                self.set_ending(last, LineEnding::Hard);
            }
        }
        let id = self.insert_line(line_no, Line::new(text, format, ending));
        if line_no == self.line_count() && ending == LineEnding::Wrap {
            self.set_ending(id, LineEnding::None);
        }
        self.mark_dirty(line_no.saturating_sub(1).max(1), line_no, None);
        self.finish_edit();
        Ok(id)
    }

    /// Remove line `line_no`. The last remaining line is emptied instead.
    pub fn delete_line(&mut self, line_no: usize) -> Result<()> {
        let id = self.require_line(line_no)?;
        if self.line_count() == 1 {
            let len = self.line_ref(id).len();
            self.edit_line(id, |line| {
                line.delete_text(0, len);
                line.ending = LineEnding::None;
            });
            self.remap_markers(|_| Marker::new(id, 0));
        } else {
            let target = match self.next_line(id) {
                Some(next) => Marker::new(next, 0),
                None => {
                    let prev = self.prev_line(id).unwrap_or(id);
                    Marker::new(prev, self.line_ref(prev).len())
                }
            };
            self.remap_markers(|m| if m.line == id { target } else { m });
            let removed_ending = self.line_ref(id).ending();
            let was_last = self.next_line(id).is_none();
            self.remove_line(id);
            if was_last {
                // Removed the last line; its predecessor takes over the end.
                self.set_ending(target.line, removed_ending);
            }
        }
        let at = line_no.min(self.line_count());
        self.mark_dirty(at.saturating_sub(1).max(1), at, None);
        self.finish_edit();
        Ok(())
    }

    /// Split line `line_no` at `pos` with a hard break. The new line keeps
    /// the original ending; markers at or past `pos` move onto it.
    pub fn split(&mut self, line_no: usize, pos: usize) -> Result<LineId> {
        self.split_with_ending(line_no, pos, LineEnding::Hard)
    }

    /// Split with an explicit ending for the first half.
    pub fn split_with_ending(
        &mut self,
        line_no: usize,
        pos: usize,
        ending: LineEnding,
    ) -> Result<LineId> {
        let id = self.require_position(line_no, pos)?;
        let new = self.split_line(id, pos, ending);
        self.mark_dirty(line_no, line_no + 1, Some(pos));
        self.finish_edit();
        Ok(new)
    }

    pub(crate) fn split_line(&mut self, id: LineId, pos: usize, ending: LineEnding) -> LineId {
        let len = self.line_ref(id).len();
        let paragraph = self.line_ref(id).paragraph().clone();
        let (tail_text, tail_tags) = self.edit_line(id, |line| line.split_off(pos));
        let old_ending = self.line_ref(id).ending();
        self.set_ending(id, ending);
        let tail = Line::from_parts(tail_text, tail_tags, old_ending, paragraph);
        let new = self.insert_line(self.no(id) + 1, tail);
        if pos < len {
            self.remap_markers(|m| {
                if m.line == id && m.pos >= pos {
                    Marker::new(new, m.pos - pos)
                } else {
                    m
                }
            });
        }
        new
    }

    /// Merge line `line_no + 1` into line `line_no`.
    pub fn combine(&mut self, line_no: usize) -> Result<()> {
        let first = self.require_line(line_no)?;
        let second = self
            .next_line(first)
            .ok_or_else(|| Error::out_of_range("line", line_no + 1, self.line_count()))?;
        self.combine_lines(first, second);
        self.mark_dirty(line_no, line_no, None);
        self.finish_edit();
        Ok(())
    }

    pub(crate) fn combine_lines(&mut self, first: LineId, second: LineId) {
        let offset = self.line_ref(first).len();
        self.remap_markers(|m| {
            if m.line == second {
                Marker::new(first, m.pos + offset)
            } else {
                m
            }
        });
        let Some(line) = self.remove_line(second) else {
            return;
        };
        let ending = line.ending();
        let (text, tags) = line.into_parts();
        self.edit_line(first, |l| {
            l.ending = ending;
            l.append(&text, tags);
        });
    }

    /// Insert `text` at `pos` on line `line_no`. Line terminators inside
    /// `text` create new lines. Returns the position after the text.
    pub fn insert(&mut self, line_no: usize, pos: usize, text: &str) -> Result<DocPosition> {
        let id = self.require_position(line_no, pos)?;
        let end = self.insert_at(Marker::new(id, pos), text, None);
        self.finish_edit();
        Ok(self.position_of(end))
    }

    /// Insert `text` in an explicit format.
    pub fn insert_formatted(
        &mut self,
        line_no: usize,
        pos: usize,
        text: &str,
        format: &TagFormat,
    ) -> Result<DocPosition> {
        let id = self.require_position(line_no, pos)?;
        let end = self.insert_at(Marker::new(id, pos), text, Some(format));
        self.finish_edit();
        Ok(self.position_of(end))
    }

    pub(crate) fn insert_at(&mut self, at: Marker, text: &str, format: Option<&TagFormat>) -> Marker {
        if text.is_empty() {
            return at;
        }
        if has_line_break(text) {
            let format = format.map_or_else(
                || self.line_ref(at.line).format_at(at.pos).clone(),
                Clone::clone,
            );
            let frag = DocumentFragment::from_plain(text, &format);
            return self.insert_fragment_at(at, &frag);
        }
        let count = text.chars().count();
        self.edit_line(at.line, |line| line.insert_text(at.pos, text, format));
        self.remap_markers(|m| {
            if m.line == at.line && m.pos >= at.pos {
                Marker::new(m.line, m.pos + count)
            } else {
                m
            }
        });
        let line_no = self.no(at.line);
        self.mark_dirty(line_no, line_no, Some(at.pos));
        Marker::new(at.line, at.pos + count)
    }

    /// Insert a picture at `pos` on line `line_no`.
    pub fn insert_picture(&mut self, line_no: usize, pos: usize, picture: Picture) -> Result<()> {
        let id = self.require_position(line_no, pos)?;
        self.insert_picture_at(Marker::new(id, pos), picture);
        self.finish_edit();
        Ok(())
    }

    pub(crate) fn insert_picture_at(&mut self, at: Marker, picture: Picture) -> Marker {
        let format = self.line_ref(at.line).format_at(at.pos).clone();
        self.edit_line(at.line, |line| line.insert_picture(at.pos, picture, format));
        self.remap_markers(|m| {
            if m.line == at.line && m.pos >= at.pos {
                Marker::new(m.line, m.pos + 1)
            } else {
                m
            }
        });
        let line_no = self.no(at.line);
        self.mark_dirty(line_no, line_no, Some(at.pos));
        Marker::new(at.line, at.pos + 1)
    }

    /// Delete `count` characters from one line; the count is clamped to the
    /// line end.
    pub fn delete_chars(&mut self, line_no: usize, pos: usize, count: usize) -> Result<()> {
        let id = self.require_position(line_no, pos)?;
        let end = (pos + count).min(self.line_ref(id).len());
        self.delete_between(Marker::new(id, pos), Marker::new(id, end));
        self.finish_edit();
        Ok(())
    }

    /// Delete `length` characters (terminators included) starting at `pos`
    /// on line `line_no`, joining lines as needed.
    pub fn delete_multiline(&mut self, line_no: usize, pos: usize, length: usize) -> Result<()> {
        let id = self.require_position(line_no, pos)?;
        let start = Marker::new(id, pos);
        let from = self.offset_of(start);
        let end = self.marker_for_offset(from + length);
        self.delete_between(start, end);
        self.finish_edit();
        Ok(())
    }

    /// Delete everything between two positions.
    pub fn delete_range(&mut self, start: DocPosition, end: DocPosition) -> Result<()> {
        let (start, end) = (start.min(end), start.max(end));
        let start = self.marker_at(start)?;
        let end = self.marker_at(end)?;
        self.delete_between(start, end);
        self.finish_edit();
        Ok(())
    }

    /// Remove `start..end`; the caller guarantees `start <= end`.
    pub(crate) fn delete_between(&mut self, start: Marker, end: Marker) {
        if start == end {
            return;
        }
        let start_no = self.no(start.line);
        if start.line == end.line {
            let count = end.pos - start.pos;
            self.edit_line(start.line, |line| line.delete_text(start.pos, count));
            self.remap_markers(|m| {
                if m.line != start.line || m.pos <= start.pos {
                    m
                } else if m.pos >= end.pos {
                    Marker::new(m.line, m.pos - count)
                } else {
                    start
                }
            });
            self.mark_dirty(start_no, start_no, Some(start.pos));
            return;
        }

        let end_no = self.no(end.line);
        let mut cursors = self.cursors;
        cursors.for_each_mut(|m| {
            let no = self.no(m.line);
            if no < start_no || no > end_no || (no == start_no && m.pos <= start.pos) {
                return;
            }
            *m = if no == end_no && m.pos >= end.pos {
                Marker::new(start.line, start.pos + m.pos - end.pos)
            } else {
                start
            };
        });
        self.cursors = cursors;

        let mut doomed = Vec::with_capacity(end_no - start_no);
        let mut cur = self.next_line(start.line);
        while let Some(id) = cur {
            doomed.push(id);
            if id == end.line {
                break;
            }
            cur = self.next_line(id);
        }
        let head_len = self.line_ref(start.line).len();
        let (tail_text, tail_tags) = self.edit_line(end.line, |line| line.split_off(end.pos));
        let ending = self.line_ref(end.line).ending();
        for id in doomed {
            self.remove_line(id);
        }
        self.edit_line(start.line, |line| {
            line.delete_text(start.pos, head_len - start.pos);
            line.ending = ending;
            line.append(&tail_text, tail_tags);
        });
        self.mark_dirty(start_no, start_no, Some(start.pos));
    }

    // ------------------------------------------------------------------
    // Caret editing, recorded for undo
    // ------------------------------------------------------------------

    /// Type one character at the caret, replacing any selection. Runs of
    /// typing coalesce into a single undo step.
    pub fn type_char(&mut self, ch: char) -> Result<()> {
        let text = match ch {
            '\r' | '\n' if !self.options.multiline => return Ok(()),
            '\r' | '\n' => "\r\n".to_owned(),
            _ => ch.to_string(),
        };
        let before = self.selection_snapshot();
        let grouped = self.has_selection();
        if grouped {
            self.undo.begin_user_action("Typing", before);
            self.delete_selection_recorded();
        }

        let caret = self.cursors.caret;
        let offset = self.offset_of(caret);
        let end = self.insert_at(caret, &text, None);
        self.collapse_to(end);
        let after = self.selection_snapshot();
        self.undo.record_typing(offset, &text, before, after);

        if grouped {
            self.undo.end_user_action(after);
        }
        self.finish_edit();
        Ok(())
    }

    /// Insert `text` at the caret as one undo step, replacing any selection.
    pub fn insert_at_caret(&mut self, text: &str) -> Result<()> {
        self.replace_selection(text)
    }

    /// Replace the selection with `text`.
    pub fn replace_selection(&mut self, text: &str) -> Result<()> {
        let before = self.selection_snapshot();
        self.undo.begin_user_action("Replace", before);
        self.delete_selection_recorded();

        let caret = self.cursors.caret;
        let offset = self.offset_of(caret);
        let format = self.line_ref(caret.line).format_at(caret.pos).clone();
        let mut frag = DocumentFragment::from_plain(text, &format);
        if !self.options.multiline {
            frag = frag.flattened();
        }
        let sel = self.selection_snapshot();
        let end = self.insert_fragment_at(caret, &frag);
        self.collapse_to(end);
        let after = self.selection_snapshot();
        if !text.is_empty() {
            self.undo.record_insert(offset, frag, sel, after);
        }
        self.undo.end_user_action(after);
        self.finish_edit();
        Ok(())
    }

    /// Delete the selection as one undo step. Returns false when nothing
    /// was selected.
    pub fn delete_selection(&mut self) -> bool {
        let deleted = self.delete_selection_recorded();
        self.finish_edit();
        deleted
    }

    pub(crate) fn delete_selection_recorded(&mut self) -> bool {
        let (start, end) = (self.cursors.selection_start, self.cursors.selection_end);
        if start == end {
            return false;
        }
        self.delete_recorded(start, end);
        true
    }

    /// Delete the selection, or the character before the caret.
    pub fn backspace(&mut self) -> bool {
        if self.delete_selection() {
            return true;
        }
        let caret = self.cursors.caret;
        let offset = self.offset_of(caret);
        if offset == 0 {
            return false;
        }
        let start = self.marker_for_offset(offset - 1);
        self.delete_recorded(start, caret);
        self.finish_edit();
        true
    }

    /// Delete the selection, or the character after the caret.
    pub fn delete_forward(&mut self) -> bool {
        if self.delete_selection() {
            return true;
        }
        let caret = self.cursors.caret;
        let line = self.line_ref(caret.line);
        let end = if caret.pos < line.len() {
            Marker::new(caret.line, caret.pos + 1)
        } else {
            match self.next_line(caret.line) {
                Some(next) if line.ending() == LineEnding::Wrap => {
                    Marker::new(next, 1.min(self.line_ref(next).len()))
                }
                Some(next) => Marker::new(next, 0),
                None => return false,
            }
        };
        self.delete_recorded(caret, end);
        self.finish_edit();
        true
    }

    /// Capture, record and delete `start..end`, leaving the caret at `start`.
    pub(crate) fn delete_recorded(&mut self, start: Marker, end: Marker) {
        let before = self.selection_snapshot();
        let offset = self.offset_of(start);
        let frag = self.capture(start, end);
        self.delete_between(start, end);
        self.collapse_to(start);
        let after = self.selection_snapshot();
        self.undo.record_delete(offset, frag, before, after);
    }
}
