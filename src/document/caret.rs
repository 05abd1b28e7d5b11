//! Caret positioning and motion.

use crate::document::line::LineEnding;
use crate::document::marker::Marker;
use crate::document::selection::is_word_separator;
use crate::document::tree::LineId;
use crate::document::Document;
use crate::error::Result;

/// Direction for [`Document::move_caret`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CaretDirection {
    CharForward,
    CharBack,
    WordForward,
    WordBack,
    LineUp,
    LineDown,
    PageUp,
    PageDown,
    /// Start of the current line.
    Home,
    /// End of the current line.
    End,
    DocumentStart,
    DocumentEnd,
    SelectionStart,
    SelectionEnd,
}

impl Document {
    /// Move the caret to `pos` on line `line_no`. The selection is left
    /// alone.
    pub fn set_caret(&mut self, line_no: usize, pos: usize) -> Result<()> {
        let marker = self.marker(line_no, pos)?;
        self.place_caret(marker);
        Ok(())
    }

    /// Move the caret to a marker obtained earlier.
    pub fn set_caret_at(&mut self, marker: Marker) -> Result<()> {
        let marker = self.validate_marker(marker)?;
        self.place_caret(marker);
        Ok(())
    }

    /// Move the caret to the character boundary nearest a document-space
    /// point.
    pub fn set_caret_from_point(&mut self, x: f32, y: f32) {
        let marker = self.find_cursor(x, y);
        self.place_caret(marker);
    }

    /// Character boundary nearest a document-space point.
    #[must_use]
    pub fn find_cursor(&self, x: f32, y: f32) -> Marker {
        let line = self.line_at_y(y);
        Marker::new(line, self.pos_at_x(line, x))
    }

    /// User-driven caret placement: ends a typing run and drops a pending
    /// caret format on the line being left.
    fn place_caret(&mut self, marker: Marker) {
        let old = self.cursors.caret;
        if old != marker {
            if self.line_by_id(old.line).is_some() {
                let line = self.line_mut(old.line);
                line.prune_empty_tags(None);
                line.coalesce();
            }
            self.undo.close_typing();
        }
        self.cursors.caret_x = None;
        self.set_caret_marker(marker);
    }

    /// Store the caret and raise `caret_moved` when it changed.
    pub(crate) fn set_caret_marker(&mut self, marker: Marker) {
        if self.cursors.caret == marker {
            return;
        }
        self.cursors.caret = marker;
        self.update_caret_rect();
    }

    /// Move the caret one step in `direction`.
    pub fn move_caret(&mut self, direction: CaretDirection) {
        let caret = self.cursors.caret;
        let vertical = matches!(
            direction,
            CaretDirection::LineUp
                | CaretDirection::LineDown
                | CaretDirection::PageUp
                | CaretDirection::PageDown
        );
        let target = match direction {
            CaretDirection::CharForward => self.char_forward(caret),
            CaretDirection::CharBack => self.char_back(caret),
            CaretDirection::WordForward => self.word_forward(caret),
            CaretDirection::WordBack => self.word_back(caret),
            CaretDirection::LineUp => self.prev_line(caret.line).map(|l| self.vertical_target(l)),
            CaretDirection::LineDown => self.next_line(caret.line).map(|l| self.vertical_target(l)),
            CaretDirection::PageUp | CaretDirection::PageDown => {
                let page = self.options.viewport_height;
                let y = self.line_ref(caret.line).layout().y;
                let y = if direction == CaretDirection::PageUp {
                    y - page
                } else {
                    y + page
                };
                let line = self.line_at_y(y);
                let (ox, oy) = self.scroll_offset();
                let dy = if direction == CaretDirection::PageUp { -page } else { page };
                self.set_scroll_offset(ox, oy + dy);
                Some(self.vertical_target(line))
            }
            CaretDirection::Home => Some(Marker::new(caret.line, 0)),
            CaretDirection::End => Some(Marker::new(caret.line, self.line_ref(caret.line).len())),
            CaretDirection::DocumentStart => Some(Marker::new(self.first_line(), 0)),
            CaretDirection::DocumentEnd => {
                let last = self.last_line();
                Some(Marker::new(last, self.line_ref(last).len()))
            }
            CaretDirection::SelectionStart => Some(self.cursors.selection_start),
            CaretDirection::SelectionEnd => Some(self.cursors.selection_end),
        };
        let Some(target) = target else {
            return;
        };

        let preferred_x = if vertical {
            Some(
                self.cursors
                    .caret_x
                    .unwrap_or_else(|| self.line_ref(caret.line).x_of(caret.pos)),
            )
        } else {
            None
        };
        self.place_caret(target);
        self.cursors.caret_x = preferred_x;
        self.scroll_to_caret();
    }

    fn vertical_target(&self, line: LineId) -> Marker {
        let caret = self.cursors.caret;
        let x = self
            .cursors
            .caret_x
            .unwrap_or_else(|| self.line_ref(caret.line).x_of(caret.pos));
        Marker::new(line, self.pos_at_x(line, x))
    }

    fn char_forward(&self, caret: Marker) -> Option<Marker> {
        let line = self.line_ref(caret.line);
        if caret.pos < line.len() {
            return Some(Marker::new(caret.line, caret.pos + 1));
        }
        let next = self.next_line(caret.line)?;
        // The end of a wrapped line and the start of its continuation are
        // the same text position.
        let pos = if line.ending() == LineEnding::Wrap {
            1.min(self.line_ref(next).len())
        } else {
            0
        };
        Some(Marker::new(next, pos))
    }

    fn char_back(&self, caret: Marker) -> Option<Marker> {
        if caret.pos > 0 {
            return Some(Marker::new(caret.line, caret.pos - 1));
        }
        let prev = self.prev_line(caret.line)?;
        let line = self.line_ref(prev);
        let pos = if line.ending() == LineEnding::Wrap {
            line.len().saturating_sub(1)
        } else {
            line.len()
        };
        Some(Marker::new(prev, pos))
    }

    fn word_forward(&self, caret: Marker) -> Option<Marker> {
        let chars: Vec<char> = self.line_ref(caret.line).text().chars().collect();
        if caret.pos >= chars.len() {
            return self.next_line(caret.line).map(|n| Marker::new(n, 0));
        }
        let mut pos = caret.pos;
        while pos < chars.len() && !is_word_separator(chars[pos]) {
            pos += 1;
        }
        while pos < chars.len() && is_word_separator(chars[pos]) {
            pos += 1;
        }
        Some(Marker::new(caret.line, pos))
    }

    fn word_back(&self, caret: Marker) -> Option<Marker> {
        if caret.pos == 0 {
            let prev = self.prev_line(caret.line)?;
            return Some(Marker::new(prev, self.line_ref(prev).len()));
        }
        let chars: Vec<char> = self.line_ref(caret.line).text().chars().collect();
        let mut pos = caret.pos.min(chars.len());
        while pos > 0 && is_word_separator(chars[pos - 1]) {
            pos -= 1;
        }
        while pos > 0 && !is_word_separator(chars[pos - 1]) {
            pos -= 1;
        }
        Some(Marker::new(caret.line, pos))
    }

    /// Scroll so the caret rectangle is inside the viewport.
    pub fn scroll_to_caret(&mut self) {
        let rect = self.caret_rect();
        let (mut ox, mut oy) = self.scroll_offset();
        let (vw, vh) = (self.options.viewport_width, self.options.viewport_height);
        if rect.x < ox {
            ox = rect.x;
        } else if rect.right() > ox + vw {
            ox = rect.right() - vw;
        }
        if rect.y < oy {
            oy = rect.y;
        } else if rect.bottom() > oy + vh {
            oy = rect.bottom() - vh;
        }
        self.set_scroll_offset(ox, oy);
    }
}
