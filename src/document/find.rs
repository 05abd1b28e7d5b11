//! Text search.
//!
//! Matching runs paragraph by paragraph over the joined text of each
//! paragraph's wrapped lines, so a match can span a soft wrap but never a
//! paragraph break. Results are flat character offsets.

use crate::document::marker::Marker;
use crate::document::selection::is_word_separator;
use crate::document::tree::LineId;
use crate::document::Document;
use bitflags::bitflags;

bitflags! {
    /// Search behaviour.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct FindOptions: u8 {
        /// Compare case-sensitively.
        const MATCH_CASE = 1 << 0;
        /// Only match whole words.
        const WHOLE_WORD = 1 << 1;
        /// Search from the end of the range backwards.
        const REVERSE = 1 << 2;
        /// Do not select the match.
        const NO_HIGHLIGHT = 1 << 3;
    }
}

struct Paragraph {
    /// Flat offset of the first character.
    offset: usize,
    chars: Vec<char>,
}

/// Paragraphs overlapping a flat range, joined one at a time from either
/// end so a search stops as soon as it matches.
struct Paragraphs<'a> {
    doc: &'a Document,
    /// First line of the next paragraph from the front, and its offset.
    front: LineId,
    front_offset: usize,
    /// First line of the next paragraph from the back, and the offset
    /// just past it.
    back: LineId,
    back_end: usize,
    done: bool,
}

impl<'a> Paragraphs<'a> {
    fn new(doc: &'a Document, start: usize, end: usize) -> Self {
        let first = doc.marker_for_offset(start).line;
        let (front, _) = doc.paragraph_bounds(first, first);
        let last = doc.marker_for_offset(end).line;
        let (back, back_last) = doc.paragraph_bounds(last, last);
        Self {
            doc,
            front,
            front_offset: doc.offset_of(Marker::new(front, 0)),
            back,
            back_end: doc.offset_of(Marker::new(back_last, 0))
                + doc.line_ref(back_last).len_with_ending(),
            done: false,
        }
    }

    /// Joined text of the paragraph starting at `first`, its last line and
    /// its flat length including endings.
    fn join(&self, first: LineId) -> (Vec<char>, LineId, usize) {
        let mut chars = Vec::new();
        let mut len = 0;
        let mut cur = first;
        loop {
            let line = self.doc.line_ref(cur);
            chars.extend(line.text().chars());
            len += line.len_with_ending();
            if line.ending().ends_paragraph() {
                break;
            }
            match self.doc.next_line(cur) {
                Some(next) => cur = next,
                None => break,
            }
        }
        (chars, cur, len)
    }
}

impl Iterator for Paragraphs<'_> {
    type Item = Paragraph;

    fn next(&mut self) -> Option<Paragraph> {
        if self.done {
            return None;
        }
        let (chars, last, len) = self.join(self.front);
        let para = Paragraph {
            offset: self.front_offset,
            chars,
        };
        match self.doc.next_line(last) {
            Some(next) if self.front != self.back => {
                self.front = next;
                self.front_offset += len;
            }
            _ => self.done = true,
        }
        Some(para)
    }
}

impl DoubleEndedIterator for Paragraphs<'_> {
    fn next_back(&mut self) -> Option<Paragraph> {
        if self.done {
            return None;
        }
        let (chars, _, len) = self.join(self.back);
        self.back_end -= len;
        let para = Paragraph {
            offset: self.back_end,
            chars,
        };
        match self.doc.prev_line(self.back) {
            Some(prev) if self.front != self.back => {
                self.back = self.doc.paragraph_bounds(prev, prev).0;
            }
            _ => self.done = true,
        }
        Some(para)
    }
}

fn chars_equal(a: char, b: char, match_case: bool) -> bool {
    a == b || (!match_case && a.to_lowercase().eq(b.to_lowercase()))
}

impl Document {
    /// Flat offset of the first match of `needle` inside `start..end`
    /// (defaults: whole document), or `None`.
    #[must_use]
    pub fn find(
        &self,
        needle: &str,
        start: Option<usize>,
        end: Option<usize>,
        options: FindOptions,
    ) -> Option<usize> {
        let needle: Vec<char> = needle.chars().collect();
        let start = start.unwrap_or(0).min(self.len());
        let end = end.unwrap_or(self.len()).min(self.len());
        if needle.is_empty() || start >= end {
            return None;
        }
        let match_case = options.contains(FindOptions::MATCH_CASE);
        let whole_word = options.contains(FindOptions::WHOLE_WORD);
        let n = needle.len();

        let matches_at = |para: &Paragraph, k: usize| -> bool {
            let abs = para.offset + k;
            if abs < start || abs + n > end || k + n > para.chars.len() {
                return false;
            }
            if !para.chars[k..k + n]
                .iter()
                .zip(&needle)
                .all(|(&a, &b)| chars_equal(a, b, match_case))
            {
                return false;
            }
            !whole_word
                || ((k == 0 || is_word_separator(para.chars[k - 1]))
                    && (k + n == para.chars.len() || is_word_separator(para.chars[k + n])))
        };

        let mut paragraphs = Paragraphs::new(self, start, end);
        if options.contains(FindOptions::REVERSE) {
            paragraphs.rev().find_map(|para| {
                (0..para.chars.len())
                    .rev()
                    .find(|&k| matches_at(&para, k))
                    .map(|k| para.offset + k)
            })
        } else {
            paragraphs.find_map(|para| {
                (0..para.chars.len())
                    .find(|&k| matches_at(&para, k))
                    .map(|k| para.offset + k)
            })
        }
    }

    /// Flat offset of the first character from `set` inside `start..end`.
    #[must_use]
    pub fn find_chars(
        &self,
        set: &[char],
        start: Option<usize>,
        end: Option<usize>,
        options: FindOptions,
    ) -> Option<usize> {
        let start = start.unwrap_or(0).min(self.len());
        let end = end.unwrap_or(self.len()).min(self.len());
        if set.is_empty() || start >= end {
            return None;
        }
        let match_case = options.contains(FindOptions::MATCH_CASE);
        let hit = |para: &Paragraph, k: usize| {
            let abs = para.offset + k;
            abs >= start
                && abs < end
                && set.iter().any(|&c| chars_equal(para.chars[k], c, match_case))
        };
        let mut paragraphs = Paragraphs::new(self, start, end);
        if options.contains(FindOptions::REVERSE) {
            paragraphs.rev().find_map(|p| {
                (0..p.chars.len()).rev().find(|&k| hit(&p, k)).map(|k| p.offset + k)
            })
        } else {
            paragraphs.find_map(|p| {
                (0..p.chars.len()).find(|&k| hit(&p, k)).map(|k| p.offset + k)
            })
        }
    }

    /// Search like [`find`](Self::find) and select the match unless
    /// [`FindOptions::NO_HIGHLIGHT`] is set.
    pub fn find_and_select(
        &mut self,
        needle: &str,
        start: Option<usize>,
        end: Option<usize>,
        options: FindOptions,
    ) -> Option<usize> {
        let found = self.find(needle, start, end, options)?;
        if !options.contains(FindOptions::NO_HIGHLIGHT) {
            let s = self.marker_for_offset(found);
            let e = self.marker_for_offset(found + needle.chars().count());
            self.cursors.anchor = s;
            self.cursors.anchor_end = s;
            self.set_caret_marker(e);
            self.apply_selection(s, e, true);
        }
        Some(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::DocumentOptions;

    fn doc_with(text: &str) -> Document {
        let mut doc = Document::new();
        doc.insert(1, 0, text).unwrap();
        doc
    }

    #[test]
    fn test_find_returns_flat_offset() {
        let doc = doc_with("Hello\r\nWorld");
        assert_eq!(doc.find("World", None, None, FindOptions::empty()), Some(7));
        assert_eq!(doc.find("world", None, None, FindOptions::empty()), Some(7));
        assert_eq!(doc.find("world", None, None, FindOptions::MATCH_CASE), None);
    }

    #[test]
    fn test_find_respects_range_and_reverse() {
        let doc = doc_with("abc abc abc");
        assert_eq!(doc.find("abc", Some(1), None, FindOptions::empty()), Some(4));
        assert_eq!(doc.find("abc", None, Some(7), FindOptions::REVERSE), Some(4));
        assert_eq!(doc.find("abc", Some(9), None, FindOptions::empty()), None);
    }

    #[test]
    fn test_whole_word() {
        let doc = doc_with("cat concat (cat)");
        assert_eq!(doc.find("cat", Some(1), None, FindOptions::WHOLE_WORD), Some(12));
        assert_eq!(doc.find("cat", Some(1), None, FindOptions::empty()), Some(7));
    }

    #[test]
    fn test_paragraphs_are_joined_lazily_from_both_ends() {
        let doc = doc_with("one\r\ntwo\r\nthree");
        let len = doc.len();
        let text = |p: Paragraph| (p.offset, p.chars.into_iter().collect::<String>());

        let mut paras = Paragraphs::new(&doc, 0, len);
        assert_eq!(paras.next().map(text), Some((0, "one".to_owned())));
        assert_eq!(paras.next_back().map(text), Some((10, "three".to_owned())));
        assert_eq!(paras.next().map(text), Some((5, "two".to_owned())));
        assert!(paras.next().is_none());
        assert!(paras.next_back().is_none());

        let offsets: Vec<usize> = Paragraphs::new(&doc, 0, len).rev().map(|p| p.offset).collect();
        assert_eq!(offsets, [10, 5, 0]);
        let offsets: Vec<usize> = Paragraphs::new(&doc, 6, 8).map(|p| p.offset).collect();
        assert_eq!(offsets, [5]);
    }

    #[test]
    fn test_reverse_find_across_paragraphs() {
        let doc = doc_with("abc\r\nxyz\r\nabc");
        assert_eq!(doc.find("abc", None, None, FindOptions::REVERSE), Some(10));
        assert_eq!(doc.find("abc", None, Some(9), FindOptions::REVERSE), Some(0));
    }

    #[test]
    fn test_match_never_spans_paragraphs() {
        let doc = doc_with("ab\r\ncd");
        assert_eq!(doc.find("bc", None, None, FindOptions::empty()), None);
    }

    #[test]
    fn test_match_spans_soft_wrap() {
        let mut doc =
            Document::with_options(DocumentOptions::default().word_wrap(true).viewport(60.0, 100.0));
        doc.insert(1, 0, "alpha beta gamma").unwrap();
        assert!(doc.line_count() > 1);
        assert_eq!(doc.find("a beta", None, None, FindOptions::empty()), Some(4));
    }

    #[test]
    fn test_find_chars() {
        let doc = doc_with("x = (a + b)");
        assert_eq!(doc.find_chars(&['(', ')'], None, None, FindOptions::empty()), Some(4));
        assert_eq!(doc.find_chars(&['(', ')'], None, None, FindOptions::REVERSE), Some(10));
    }

    #[test]
    fn test_find_and_select() {
        let mut doc = doc_with("Hello World");
        let found = doc.find_and_select("world", None, None, FindOptions::empty());
        assert_eq!(found, Some(6));
        assert_eq!(doc.selected_text(), "World");
    }
}
