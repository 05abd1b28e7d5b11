//! Character and paragraph formatting.

use crate::document::marker::{DocPosition, Marker};
use crate::document::paragraph::ParagraphFormat;
use crate::document::tag::LineTag;
use crate::document::tree::LineId;
use crate::document::Document;
use crate::error::Result;
use crate::style::{TagFormat, TextFormat};

impl Document {
    /// Apply `format` to the text between two positions. An empty range
    /// formats the caret position: text typed there picks the format up.
    pub fn format_text(
        &mut self,
        start: DocPosition,
        end: DocPosition,
        format: &TextFormat,
    ) -> Result<()> {
        let (start, end) = (start.min(end), start.max(end));
        let start = self.marker_at(start)?;
        let end = self.marker_at(end)?;
        self.format_between(start, end, format);
        self.finish_edit();
        Ok(())
    }

    pub(crate) fn format_between(&mut self, start: Marker, end: Marker, format: &TextFormat) {
        if format.is_empty() {
            return;
        }
        let start_no = self.no(start.line);
        if start == end {
            let pos = start.pos;
            self.edit_line(start.line, |line| {
                let base = line.format_at(pos).clone();
                let new = format.apply(&base);
                if line.is_empty() {
                    line.tags.truncate(1);
                    line.tags[0].format = new;
                    return;
                }
                line.tags.retain(|t| !(t.length == 0 && t.start == pos));
                let at = line.split_tags_at(pos);
                line.tags.insert(at, LineTag::new(pos, 0, new));
            });
            self.mark_dirty(start_no, start_no, Some(pos));
            return;
        }

        let mut cur = Some(start.line);
        let mut line_no = start_no;
        while let Some(id) = cur {
            let len = self.line_ref(id).len();
            let from = if id == start.line { start.pos } else { 0 };
            let to = if id == end.line { end.pos } else { len };
            self.edit_line(id, |line| {
                if len == 0 {
                    for tag in &mut line.tags {
                        tag.format = format.apply(&tag.format);
                    }
                    return;
                }
                if from == to {
                    return;
                }
                let a = line.split_tags_at(from);
                let b = line.split_tags_at(to);
                for tag in &mut line.tags[a..b] {
                    tag.format = format.apply(&tag.format);
                }
                line.coalesce();
            });
            if id == end.line {
                break;
            }
            cur = self.next_line(id);
            line_no += 1;
        }
        self.mark_dirty(start_no, line_no, Some(start.pos));
    }

    /// Update the paragraph format of every paragraph touching lines
    /// `first..=last`.
    pub fn format_paragraphs(
        &mut self,
        first: usize,
        last: usize,
        mut update: impl FnMut(&mut ParagraphFormat),
    ) -> Result<()> {
        let (first, last) = (first.min(last), first.max(last));
        let first = self.require_line(first)?;
        let last = self.require_line(last)?;
        let (from, to) = self.paragraph_bounds(first, last);
        let mut cur = Some(from);
        while let Some(id) = cur {
            update(&mut self.line_mut(id).paragraph);
            self.line_mut(id).recalc = true;
            if id == to {
                break;
            }
            cur = self.next_line(id);
        }
        let (a, b) = (self.no(from), self.no(to));
        self.mark_dirty(a, b + 1, None);
        self.finish_edit();
        Ok(())
    }

    /// Widen a line range to whole paragraphs.
    pub(crate) fn paragraph_bounds(&self, first: LineId, last: LineId) -> (LineId, LineId) {
        let mut from = first;
        while let Some(prev) = self.prev_line(from) {
            if self.line_ref(prev).ending().ends_paragraph() {
                break;
            }
            from = prev;
        }
        let mut to = last;
        while !self.line_ref(to).ending().ends_paragraph() {
            match self.next_line(to) {
                Some(next) => to = next,
                None => break,
            }
        }
        (from, to)
    }

    /// Format of the run the caret types into.
    #[must_use]
    pub fn caret_format(&self) -> &TagFormat {
        &self.caret_tag().format
    }

    /// Apply `format` to the selection, or to the caret when nothing is
    /// selected. Recorded for undo.
    pub fn set_selection_format(&mut self, format: &TextFormat) -> Result<()> {
        let (start, end) = (self.cursors.selection_start, self.cursors.selection_end);
        if start == end {
            self.format_between(start, start, format);
            self.finish_edit();
            return Ok(());
        }
        self.restyle_recorded(start.line, end.line, |doc| {
            doc.format_between(start, end, format);
        });
        self.finish_edit();
        Ok(())
    }

    /// Update the paragraph format of every paragraph the selection
    /// touches. Recorded for undo.
    pub fn set_selection_paragraph(
        &mut self,
        mut update: impl FnMut(&mut ParagraphFormat),
    ) -> Result<()> {
        let (start, end) = (self.cursors.selection_start, self.cursors.selection_end);
        self.restyle_recorded(start.line, end.line, |doc| {
            let (from, to) = doc.paragraph_bounds(start.line, end.line);
            let mut cur = Some(from);
            while let Some(id) = cur {
                update(&mut doc.line_mut(id).paragraph);
                doc.line_mut(id).recalc = true;
                if id == to {
                    break;
                }
                cur = doc.next_line(id);
            }
            let (a, b) = (doc.no(from), doc.no(to));
            doc.mark_dirty(a, b + 1, None);
        });
        self.finish_edit();
        Ok(())
    }

    /// Snapshot the paragraphs spanning `first..=last`, run `apply`, and
    /// record both snapshots as one undo step.
    fn restyle_recorded(&mut self, first: LineId, last: LineId, apply: impl FnOnce(&mut Self)) {
        let (from, to) = self.paragraph_bounds(first, last);
        let start = Marker::new(from, 0);
        let end = Marker::new(to, self.line_ref(to).len());
        let offset = self.offset_of(start);
        let before = self.capture(start, end);
        let sel_before = self.selection_snapshot();

        apply(self);

        let start = self.marker_for_offset(offset);
        let end = self.marker_for_offset(offset + before.len());
        let after = self.capture(start, end);
        let sel_after = self.selection_snapshot();
        self.undo.record_restyle(offset, before, after, sel_before, sel_after);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::document::paragraph::HorizontalAlignment;
    use crate::style::FontStyle;

    #[test]
    fn test_format_range_splits_runs() {
        let mut doc = Document::new();
        doc.insert(1, 0, "Hello World").unwrap();
        doc.format_text(
            DocPosition::new(1, 6),
            DocPosition::new(1, 11),
            &TextFormat::new().style_on(FontStyle::BOLD),
        )
        .unwrap();
        let line = doc.line(1).unwrap();
        assert_eq!(line.tags().len(), 2);
        assert!(line.tags()[1].format.font.bold());
        assert!(!line.tags()[0].format.font.bold());
    }

    #[test]
    fn test_format_across_lines() {
        let mut doc = Document::new();
        doc.insert(1, 0, "ab\r\n\r\ncd").unwrap();
        doc.format_text(
            DocPosition::new(1, 1),
            DocPosition::new(3, 1),
            &TextFormat::new().color(Color::RED),
        )
        .unwrap();
        let colors = |n: usize| -> Vec<Color> {
            doc.line(n).unwrap().char_formats().iter().map(|f| f.color).collect()
        };
        assert_eq!(colors(1), vec![Color::BLACK, Color::RED]);
        assert_eq!(doc.line(2).unwrap().tags()[0].format.color, Color::RED);
        assert_eq!(colors(3), vec![Color::RED, Color::BLACK]);
    }

    #[test]
    fn test_caret_format_applies_to_typed_text() {
        let mut doc = Document::new();
        doc.insert(1, 0, "ab").unwrap();
        doc.set_selection(DocPosition::new(1, 1), DocPosition::new(1, 1))
            .unwrap();
        doc.set_selection_format(&TextFormat::new().style_on(FontStyle::ITALIC))
            .unwrap();
        assert!(doc.caret_format().font.italic());
        doc.type_char('X').unwrap();
        let formats = doc.line(1).unwrap().char_formats();
        assert!(!formats[0].font.italic());
        assert!(formats[1].font.italic());
        assert!(!formats[2].font.italic());
        doc.check_invariants().unwrap();
    }

    #[test]
    fn test_paragraph_format_covers_wrapped_lines() {
        let mut doc = Document::with_options(
            crate::DocumentOptions::default()
                .word_wrap(true)
                .viewport(60.0, 100.0),
        );
        doc.insert(1, 0, "alpha beta gamma").unwrap();
        assert!(doc.line_count() > 1);
        doc.format_paragraphs(2, 2, |p| p.alignment = HorizontalAlignment::Right)
            .unwrap();
        assert!(doc
            .lines()
            .all(|l| l.paragraph().alignment == HorizontalAlignment::Right));
    }
}
