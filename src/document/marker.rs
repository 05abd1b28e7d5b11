//! Positions inside the document.
//!
//! A [`Marker`] names a line by its stable handle plus a character offset.
//! Markers never hold references into the tree; the tag they fall in is
//! looked up on demand, so merging or deleting lines cannot leave one
//! dangling as long as the edit paths move markers off removed lines.

use crate::document::tree::LineId;
use std::cmp::Ordering;

/// A point in the document: line handle plus 0-based character position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Marker {
    pub line: LineId,
    pub pos: usize,
}

impl Marker {
    #[must_use]
    pub const fn new(line: LineId, pos: usize) -> Self {
        Self { line, pos }
    }
}

/// A marker resolved to its 1-based line number, which orders in document
/// order: by line number, then by position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DocPosition {
    pub line_no: usize,
    pub pos: usize,
}

impl DocPosition {
    #[must_use]
    pub const fn new(line_no: usize, pos: usize) -> Self {
        Self { line_no, pos }
    }
}

impl PartialOrd for DocPosition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DocPosition {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line_no
            .cmp(&other.line_no)
            .then(self.pos.cmp(&other.pos))
    }
}

/// Caret, selection bounds and the anchor a drag or shift-extend grows from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Cursors {
    pub caret: Marker,
    pub selection_start: Marker,
    pub selection_end: Marker,
    pub anchor: Marker,
    /// Far end of the anchor range when a word or line was selected first.
    pub anchor_end: Marker,
    /// Preferred x offset for vertical caret motion.
    pub caret_x: Option<f32>,
}

impl Cursors {
    pub(crate) fn at(marker: Marker) -> Self {
        Self {
            caret: marker,
            selection_start: marker,
            selection_end: marker,
            anchor: marker,
            anchor_end: marker,
            caret_x: None,
        }
    }

    /// Apply `f` to every marker.
    pub(crate) fn for_each_mut(&mut self, mut f: impl FnMut(&mut Marker)) {
        f(&mut self.caret);
        f(&mut self.selection_start);
        f(&mut self.selection_end);
        f(&mut self.anchor);
        f(&mut self.anchor_end);
    }
}
