//! The text document model.
//!
//! A [`Document`] owns every [`Line`] in an arena-backed red-black tree
//! ordered by line number, the caret/selection [`Marker`]s, the layout
//! caches and the undo log. All mutation is synchronous and single-threaded;
//! "suspension" only batches recalculation.
//!
//! Key types:
//!
//! - [`Document`]: line index, cursors, editing and layout entry points
//! - [`Line`] / [`LineTag`]: text plus its formatting runs
//! - [`Marker`] / [`DocPosition`]: positions by handle or by line number
//! - [`DocumentFragment`]: detached copy of a range, used by undo and import
//!
//! # Examples
//!
//! ```
//! use richdoc::{Document, LineEnding};
//!
//! let mut doc = Document::new();
//! doc.insert(1, 0, "Hello\r\nWorld").unwrap();
//! assert_eq!(doc.line_count(), 2);
//! assert_eq!(doc.line(1).unwrap().ending(), LineEnding::Hard);
//! assert_eq!(doc.text(), "Hello\r\nWorld");
//! ```

// Editing code reads better with explicit if/else than with map_or chains.
#![allow(clippy::option_if_let_else)]

mod caret;
mod edit;
mod find;
mod format;
mod fragment;
mod layout;
mod line;
mod links;
mod marker;
mod paint;
mod paragraph;
mod selection;
mod tag;
mod tree;

pub use caret::CaretDirection;
pub use find::FindOptions;
pub use fragment::{DocumentFragment, FragmentLine};
pub use layout::Rect;
pub use line::{Line, LineEnding, LineLayout};
pub use marker::{DocPosition, Marker};
pub use paint::Painter;
pub use paragraph::{HorizontalAlignment, ParagraphFormat, TabKind, TabStop, TabStopCollection};
pub use selection::SelectionMode;
pub use tag::{LineTag, PICTURE_PLACEHOLDER, TagLayout};
pub use tree::{LineId, LineTree};

pub(crate) use layout::LayoutState;
pub(crate) use marker::Cursors;

use crate::error::{Error, Result};
use crate::event::DocumentEvents;
use crate::measure::{MonospaceMeasurer, TextMeasurer};
use crate::options::DocumentOptions;
use crate::picture::{PictureDecoder, RawPictureDecoder};
use crate::style::TagFormat;
use crate::undo::UndoManager;
use std::io::{Read, Write};

/// A flat character offset resolved to line, run and position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CharLocation {
    pub line: LineId,
    pub line_no: usize,
    /// Index of the run the position falls in.
    pub tag: usize,
    pub pos: usize,
}

/// Formatted multi-line text document.
#[derive(Debug)]
pub struct Document {
    lines: LineTree<Line>,
    pub(crate) cursors: Cursors,
    pub(crate) options: DocumentOptions,
    pub(crate) measurer: Box<dyn TextMeasurer>,
    pub(crate) decoder: Box<dyn PictureDecoder>,
    char_count: usize,
    reported_len: usize,
    pub(crate) layout: LayoutState,
    pub(crate) undo: UndoManager,
    events: DocumentEvents,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(DocumentOptions::default())
    }

    /// Create an empty document.
    #[must_use]
    pub fn with_options(options: DocumentOptions) -> Self {
        Self::with_measurer(options, Box::new(MonospaceMeasurer::default()))
    }

    /// Create an empty document measured by `measurer`.
    #[must_use]
    pub fn with_measurer(options: DocumentOptions, measurer: Box<dyn TextMeasurer>) -> Self {
        let undo = UndoManager::new(options.max_undo_depth);
        let mut doc = Self {
            lines: LineTree::new(),
            cursors: Cursors::at(Marker::new(LineId::placeholder(), 0)),
            options,
            measurer,
            decoder: Box::new(RawPictureDecoder),
            char_count: 0,
            reported_len: 0,
            layout: LayoutState::default(),
            undo,
            events: DocumentEvents::default(),
        };
        doc.reset_lines();
        doc.recalculate_all();
        doc
    }

    /// Replace the picture decoder used by RTF import.
    pub fn set_picture_decoder(&mut self, decoder: Box<dyn PictureDecoder>) {
        self.decoder = decoder;
    }

    #[must_use]
    pub fn options(&self) -> &DocumentOptions {
        &self.options
    }

    /// Observer lists for caret, size, selection and length events.
    pub fn events_mut(&mut self) -> &mut DocumentEvents {
        &mut self.events
    }

    pub(crate) fn events(&mut self) -> &mut DocumentEvents {
        &mut self.events
    }

    /// Default run format for new text.
    #[must_use]
    pub fn default_format(&self) -> TagFormat {
        TagFormat::new(self.options.default_font.clone(), self.options.default_color)
    }

    // ------------------------------------------------------------------
    // Line access
    // ------------------------------------------------------------------

    /// Number of lines; always at least one.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Line `line_no` (1-based), or `None` when out of range.
    #[must_use]
    pub fn line(&self, line_no: usize) -> Option<&Line> {
        self.line_id(line_no).and_then(|id| self.lines.get(id))
    }

    /// Handle of line `line_no` (1-based).
    #[must_use]
    pub fn line_id(&self, line_no: usize) -> Option<LineId> {
        line_no.checked_sub(1).and_then(|i| self.lines.nth(i))
    }

    /// Line behind a handle.
    #[must_use]
    pub fn line_by_id(&self, id: LineId) -> Option<&Line> {
        self.lines.get(id)
    }

    /// 1-based number of the line behind `id`.
    #[must_use]
    pub fn line_no(&self, id: LineId) -> Option<usize> {
        self.lines.contains(id).then(|| self.lines.rank(id) + 1)
    }

    /// Lines in order.
    pub fn lines(&self) -> impl Iterator<Item = &Line> + '_ {
        self.lines.ids().filter_map(|id| self.lines.get(id))
    }

    /// Line handles in order.
    pub fn line_ids(&self) -> impl Iterator<Item = LineId> + '_ {
        self.lines.ids()
    }

    pub(crate) fn next_line(&self, id: LineId) -> Option<LineId> {
        self.lines.next(id)
    }

    pub(crate) fn prev_line(&self, id: LineId) -> Option<LineId> {
        self.lines.prev(id)
    }

    pub(crate) fn first_line(&self) -> LineId {
        match self.lines.first() {
            Some(id) => id,
            None => unreachable!("document always has a line"),
        }
    }

    pub(crate) fn last_line(&self) -> LineId {
        match self.lines.last() {
            Some(id) => id,
            None => unreachable!("document always has a line"),
        }
    }

    pub(crate) fn line_ref(&self, id: LineId) -> &Line {
        match self.lines.get(id) {
            Some(line) => line,
            None => unreachable!("stale line handle {id:?}"),
        }
    }

    pub(crate) fn line_mut(&mut self, id: LineId) -> &mut Line {
        match self.lines.get_mut(id) {
            Some(line) => line,
            None => unreachable!("stale line handle {id:?}"),
        }
    }

    pub(crate) fn no(&self, id: LineId) -> usize {
        self.lines.rank(id) + 1
    }

    /// Resolve a 1-based line number or fail with `OutOfRange`.
    pub(crate) fn require_line(&self, line_no: usize) -> Result<LineId> {
        self.line_id(line_no)
            .ok_or_else(|| Error::out_of_range("line", line_no, self.line_count()))
    }

    /// Resolve a position, checking line and column.
    pub(crate) fn require_position(&self, line_no: usize, pos: usize) -> Result<LineId> {
        let id = self.require_line(line_no)?;
        let len = self.line_ref(id).len();
        if pos > len {
            return Err(Error::out_of_range("position", pos, len));
        }
        Ok(id)
    }

    /// Mutate a line, keeping the character count in step.
    pub(crate) fn edit_line<R>(&mut self, id: LineId, f: impl FnOnce(&mut Line) -> R) -> R {
        let line = self.line_mut(id);
        let before = line.len_with_ending();
        let out = f(line);
        line.recalc = true;
        let after = line.len_with_ending();
        self.char_count = self.char_count + after - before;
        out
    }

    pub(crate) fn set_ending(&mut self, id: LineId, ending: LineEnding) {
        self.edit_line(id, |line| line.ending = ending);
    }

    /// Link a new line in at 1-based `line_no`.
    pub(crate) fn insert_line(&mut self, line_no: usize, line: Line) -> LineId {
        self.char_count += line.len_with_ending();
        self.lines.insert_at(line_no.saturating_sub(1), line)
    }

    /// Unlink a line. The caller must move markers off it first.
    pub(crate) fn remove_line(&mut self, id: LineId) -> Option<Line> {
        let line = self.lines.remove(id)?;
        self.char_count -= line.len_with_ending();
        Some(line)
    }

    pub(crate) fn reset_lines(&mut self) {
        self.lines.clear();
        self.char_count = 0;
        let format = self.default_format();
        let id = self.insert_line(1, Line::new("", format, LineEnding::None));
        self.cursors = Cursors::at(Marker::new(id, 0));
    }

    // ------------------------------------------------------------------
    // Markers
    // ------------------------------------------------------------------

    /// Current caret.
    #[must_use]
    pub fn caret(&self) -> Marker {
        self.cursors.caret
    }

    /// Caret as line number and position.
    #[must_use]
    pub fn caret_position(&self) -> DocPosition {
        self.position_of(self.cursors.caret)
    }

    /// Resolve a marker to a line number; markers on removed lines resolve
    /// to the document start.
    #[must_use]
    pub fn position_of(&self, marker: Marker) -> DocPosition {
        match self.line_no(marker.line) {
            Some(line_no) => DocPosition::new(line_no, marker.pos),
            None => DocPosition::new(1, 0),
        }
    }

    /// Build a marker from a line number and position.
    pub fn marker(&self, line_no: usize, pos: usize) -> Result<Marker> {
        let id = self.require_position(line_no, pos)?;
        Ok(Marker::new(id, pos))
    }

    pub(crate) fn marker_at(&self, position: DocPosition) -> Result<Marker> {
        self.marker(position.line_no, position.pos)
    }

    /// Check that a caller-supplied marker still points into the document.
    pub(crate) fn validate_marker(&self, marker: Marker) -> Result<Marker> {
        let line = self
            .lines
            .get(marker.line)
            .ok_or_else(|| Error::InvalidArgument(format!("stale marker {marker:?}")))?;
        if marker.pos > line.len() {
            return Err(Error::out_of_range("position", marker.pos, line.len()));
        }
        Ok(marker)
    }

    /// Rewrite every cursor marker.
    pub(crate) fn remap_markers(&mut self, f: impl Fn(Marker) -> Marker) {
        self.cursors.for_each_mut(|m| *m = f(*m));
    }

    /// Index of the run the caret types into.
    #[must_use]
    pub fn caret_tag(&self) -> &LineTag {
        let line = self.line_ref(self.cursors.caret.line);
        &line.tags()[line.tag_index_at(self.cursors.caret.pos)]
    }

    // ------------------------------------------------------------------
    // Flat offsets
    // ------------------------------------------------------------------

    /// Total characters, line terminators included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.char_count
    }

    /// True when the document holds one empty line.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.char_count == 0
    }

    /// Flat offset of `pos` on line `line_no`.
    pub fn line_tag_to_char_index(&self, line_no: usize, pos: usize) -> Result<usize> {
        let id = self.require_position(line_no, pos)?;
        Ok(self.offset_of(Marker::new(id, pos)))
    }

    pub(crate) fn offset_of(&self, marker: Marker) -> usize {
        let mut offset = marker.pos;
        let mut cur = self.lines.prev(marker.line);
        while let Some(id) = cur {
            offset += self.line_ref(id).len_with_ending();
            cur = self.lines.prev(id);
        }
        offset
    }

    /// Resolve a flat offset. Offsets that fall inside a line terminator
    /// resolve to the end of that line.
    pub fn char_index_to_line_tag(&self, index: usize) -> Result<CharLocation> {
        if index > self.char_count {
            return Err(Error::out_of_range("character index", index, self.char_count));
        }
        let marker = self.marker_for_offset(index);
        let line = self.line_ref(marker.line);
        Ok(CharLocation {
            line: marker.line,
            line_no: self.no(marker.line),
            tag: line.tag_index_at(marker.pos),
            pos: marker.pos,
        })
    }

    /// Resolve a flat offset, clamping past-the-end offsets to the end.
    pub(crate) fn marker_for_offset(&self, index: usize) -> Marker {
        let mut remaining = index;
        let mut cur = Some(self.first_line());
        let mut last = self.first_line();
        while let Some(id) = cur {
            let line = self.line_ref(id);
            if remaining <= line.len() {
                return Marker::new(id, remaining);
            }
            if remaining < line.len_with_ending() {
                return Marker::new(id, line.len());
            }
            remaining -= line.len_with_ending();
            last = id;
            cur = self.lines.next(id);
        }
        Marker::new(last, self.line_ref(last).len())
    }

    // ------------------------------------------------------------------
    // Text access
    // ------------------------------------------------------------------

    /// Whole text with line terminators.
    #[must_use]
    pub fn text(&self) -> String {
        let mut out = String::with_capacity(self.char_count);
        for line in self.lines() {
            out.push_str(line.text());
            out.push_str(line.ending().as_str());
        }
        out
    }

    /// Text between two positions, terminators included.
    pub fn text_range(&self, start: DocPosition, end: DocPosition) -> Result<String> {
        let (start, end) = (start.min(end), start.max(end));
        let first = self.require_position(start.line_no, start.pos)?;
        let last = self.require_position(end.line_no, end.pos)?;
        let mut out = String::new();
        let mut cur = Some(first);
        while let Some(id) = cur {
            let line = self.line_ref(id);
            let from = if id == first { start.pos } else { 0 };
            if id == last {
                out.push_str(line.slice(from, end.pos));
                break;
            }
            out.push_str(line.slice(from, line.len()));
            out.push_str(line.ending().as_str());
            cur = self.lines.next(id);
        }
        Ok(out)
    }

    /// Clear to a single empty line, dropping undo history.
    pub fn empty(&mut self) {
        self.reset_lines();
        self.undo.clear();
        self.layout.invalid.clear();
        self.recalculate_all();
        self.finish_edit();
    }

    /// Replace the content with plain text read from `reader`.
    pub fn load_text(&mut self, mut reader: impl Read) -> Result<()> {
        let mut bytes = Vec::new();
        let mut chunk = [0u8; 8192];
        loop {
            let n = reader.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            bytes.try_reserve(n).map_err(|e| {
                Error::Io(std::io::Error::new(std::io::ErrorKind::OutOfMemory, e))
            })?;
            bytes.extend_from_slice(&chunk[..n]);
        }
        let text = String::from_utf8(bytes)
            .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

        self.suspend_recalc();
        self.reset_lines();
        self.undo.clear();
        let first = self.first_line();
        self.insert_at(Marker::new(first, 0), &text, None);
        let start = Marker::new(self.first_line(), 0);
        self.cursors = Cursors::at(start);
        self.mark_all_dirty();
        self.resume_recalc(true);
        self.finish_edit();
        Ok(())
    }

    /// Write the text with its recorded line terminators.
    pub fn write_text(&self, mut writer: impl Write) -> Result<()> {
        for line in self.lines() {
            writer.write_all(line.text().as_bytes())?;
            writer.write_all(line.ending().as_str().as_bytes())?;
        }
        writer.flush()?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Bookkeeping
    // ------------------------------------------------------------------

    /// Close out a public mutation: run pending layout and raise events.
    pub(crate) fn finish_edit(&mut self) {
        self.flush_recalc();
        if self.char_count != self.reported_len {
            self.reported_len = self.char_count;
            self.events.length_changed.emit(&());
        }
        #[cfg(debug_assertions)]
        if let Err(e) = self.check_invariants() {
            panic!("{e}");
        }
    }

    /// Walk the whole document checking tree, run, line and marker
    /// invariants.
    pub fn check_invariants(&self) -> Result<()> {
        let fail = |msg: String| Err(Error::Invariant(msg));
        if let Err(e) = self.lines.validate() {
            return fail(format!("line tree: {e}"));
        }
        if self.lines.is_empty() {
            return fail("document has no lines".into());
        }
        let mut total = 0;
        for (i, id) in self.lines.ids().enumerate() {
            let line = self.line_ref(id);
            if let Err(e) = line.check() {
                return fail(format!("line {}: {e}", i + 1));
            }
            if self.no(id) != i + 1 {
                return fail(format!("line {} reports number {}", i + 1, self.no(id)));
            }
            total += line.len_with_ending();
        }
        if total != self.char_count {
            return fail(format!(
                "character count {} but lines hold {total}",
                self.char_count
            ));
        }
        if self.line_ref(self.last_line()).ending() == LineEnding::Wrap {
            return fail("last line ends in a wrap".into());
        }
        let markers = [
            ("caret", self.cursors.caret),
            ("selection start", self.cursors.selection_start),
            ("selection end", self.cursors.selection_end),
            ("anchor", self.cursors.anchor),
            ("anchor end", self.cursors.anchor_end),
        ];
        for (name, marker) in markers {
            match self.lines.get(marker.line) {
                None => return fail(format!("{name} points at a removed line")),
                Some(line) if marker.pos > line.len() => {
                    return fail(format!(
                        "{name} at {} beyond line length {}",
                        marker.pos,
                        line.len()
                    ));
                }
                Some(_) => {}
            }
        }
        if self.position_of(self.cursors.selection_start)
            > self.position_of(self.cursors.selection_end)
        {
            return fail("selection start after selection end".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document_has_one_line() {
        let doc = Document::new();
        assert_eq!(doc.line_count(), 1);
        assert!(doc.is_empty());
        assert_eq!(doc.line(1).unwrap().ending(), LineEnding::None);
        assert!(doc.line(0).is_none());
        assert!(doc.line(2).is_none());
        assert_eq!(doc.caret_position(), DocPosition::new(1, 0));
        doc.check_invariants().unwrap();
    }

    #[test]
    fn test_char_index_mapping() {
        let mut doc = Document::new();
        doc.insert(1, 0, "ab\r\ncd\nef").unwrap();
        assert_eq!(doc.len(), 9);
        assert_eq!(doc.line_tag_to_char_index(2, 1).unwrap(), 5);
        assert_eq!(doc.line_tag_to_char_index(3, 0).unwrap(), 7);

        let loc = doc.char_index_to_line_tag(5).unwrap();
        assert_eq!((loc.line_no, loc.pos), (2, 1));
        // Inside "\r\n" resolves to the end of line 1.
        let loc = doc.char_index_to_line_tag(3).unwrap();
        assert_eq!((loc.line_no, loc.pos), (1, 2));
        assert!(doc.char_index_to_line_tag(10).is_err());
    }

    #[test]
    fn test_text_range() {
        let mut doc = Document::new();
        doc.insert(1, 0, "Hello\r\nWorld").unwrap();
        let text = doc
            .text_range(DocPosition::new(1, 3), DocPosition::new(2, 2))
            .unwrap();
        assert_eq!(text, "lo\r\nWo");
    }

    #[test]
    fn test_load_and_write_text() {
        let mut doc = Document::new();
        doc.load_text("one\r\ntwo\nthree\rfour".as_bytes()).unwrap();
        assert_eq!(doc.line_count(), 4);
        assert_eq!(doc.line(3).unwrap().ending(), LineEnding::Limp);
        let mut out = Vec::new();
        doc.write_text(&mut out).unwrap();
        assert_eq!(out, b"one\r\ntwo\nthree\rfour");
        assert_eq!(doc.caret_position(), DocPosition::new(1, 0));
    }

    #[test]
    fn test_load_text_rejects_invalid_utf8() {
        let mut doc = Document::new();
        let err = doc.load_text(&[0xff, 0xfe][..]).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_empty_resets() {
        let mut doc = Document::new();
        doc.insert(1, 0, "a\nb\nc").unwrap();
        doc.empty();
        assert_eq!(doc.line_count(), 1);
        assert_eq!(doc.text(), "");
        assert!(!doc.can_undo());
    }
}
