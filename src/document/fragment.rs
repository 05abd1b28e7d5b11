//! Detached copies of document ranges.
//!
//! A [`DocumentFragment`] holds the text, runs, endings and paragraph
//! formats of a range outside the line tree. Undo keeps deleted text as a
//! fragment, and RTF import builds one before splicing it in, so a failed
//! parse never touches the document.

use crate::document::line::{Line, LineEnding};
use crate::document::marker::{DocPosition, Marker};
use crate::document::paragraph::ParagraphFormat;
use crate::document::tag::LineTag;
use crate::document::Document;
use crate::error::Result;
use crate::style::TagFormat;

/// One logical line of a fragment. Word-wrap continuations are joined, so a
/// fragment never contains [`LineEnding::Wrap`].
#[derive(Clone, Debug, PartialEq)]
pub struct FragmentLine {
    pub text: String,
    /// Runs, 0-based relative to `text`.
    pub tags: Vec<LineTag>,
    /// Terminator after this line; ignored on the last line.
    pub ending: LineEnding,
    pub paragraph: ParagraphFormat,
    /// Whether the line was captured from the start of a paragraph, in
    /// which case its paragraph format travels with it.
    pub starts_line: bool,
}

impl FragmentLine {
    fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Append a run. It replaces an empty placeholder and merges into the
    /// previous run when nothing tells the two apart.
    fn push_tag(&mut self, tag: LineTag) {
        match self.tags.last_mut() {
            Some(last) if last.length == 0 => *last = tag,
            Some(last)
                if last.picture.is_none()
                    && tag.picture.is_none()
                    && last.format == tag.format
                    && last.link == tag.link
                    && last.end() == tag.start =>
            {
                last.length += tag.length;
            }
            _ => self.tags.push(tag),
        }
    }
}

/// Formatted text detached from any document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DocumentFragment {
    lines: Vec<FragmentLine>,
}

impl DocumentFragment {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain text in one format, split at line terminators.
    #[must_use]
    pub fn from_plain(text: &str, format: &TagFormat) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let mut frag = Self::new();
        let mut current = String::new();
        let mut i = 0;
        while i < chars.len() {
            if let Some((ending, n)) = LineEnding::detect(&chars[i..]) {
                frag.push_plain(std::mem::take(&mut current), format, ending);
                i += n;
            } else {
                current.push(chars[i]);
                i += 1;
            }
        }
        frag.push_plain(current, format, LineEnding::None);
        frag
    }

    fn push_plain(&mut self, text: String, format: &TagFormat, ending: LineEnding) {
        let len = text.chars().count();
        self.lines.push(FragmentLine {
            text,
            tags: vec![LineTag::new(0, len, format.clone())],
            ending,
            paragraph: ParagraphFormat::default(),
            starts_line: false,
        });
    }

    /// Append a line.
    pub fn push_line(&mut self, line: FragmentLine) {
        self.lines.push(line);
    }

    #[must_use]
    pub fn lines(&self) -> &[FragmentLine] {
        &self.lines
    }

    /// Characters the fragment occupies once inserted, terminators included.
    #[must_use]
    pub fn len(&self) -> usize {
        let n = self.lines.len();
        self.lines
            .iter()
            .enumerate()
            .map(|(i, l)| l.char_len() + if i + 1 < n { l.ending.char_len() } else { 0 })
            .sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() || self.len() == 0 && self.lines.len() == 1
    }

    /// Plain text with terminators between lines.
    #[must_use]
    pub fn text(&self) -> String {
        let n = self.lines.len();
        let mut out = String::new();
        for (i, line) in self.lines.iter().enumerate() {
            out.push_str(&line.text);
            if i + 1 < n {
                out.push_str(line.ending.as_str());
            }
        }
        out
    }

    /// Drop a trailing empty line, as left behind by a final paragraph mark.
    pub fn trim_trailing_empty_line(&mut self) {
        if self.lines.len() > 1 && self.lines.last().is_some_and(|l| l.text.is_empty()) {
            self.lines.pop();
        }
    }

    /// Join every line into one, for single-line documents.
    #[must_use]
    pub fn flattened(&self) -> Self {
        let mut text = String::new();
        let mut tags = Vec::new();
        let mut offset = 0;
        for line in &self.lines {
            tags.extend(line.tags.iter().filter(|t| t.length > 0).map(|t| {
                let mut t = t.clone();
                t.start += offset;
                t
            }));
            text.push_str(&line.text);
            offset += line.char_len();
        }
        let first = self.lines.first();
        if tags.is_empty() {
            if let Some(tag) = first.and_then(|l| l.tags.first()) {
                tags.push(tag.text_template(0, 0));
            }
        }
        Self {
            lines: vec![FragmentLine {
                text,
                tags,
                ending: LineEnding::None,
                paragraph: first.map(|l| l.paragraph.clone()).unwrap_or_default(),
                starts_line: first.is_some_and(|l| l.starts_line),
            }],
        }
    }
}

impl Document {
    /// Copy the range between two positions.
    pub fn fragment(&self, start: DocPosition, end: DocPosition) -> Result<DocumentFragment> {
        let (start, end) = (start.min(end), start.max(end));
        let start = self.marker_at(start)?;
        let end = self.marker_at(end)?;
        Ok(self.capture(start, end))
    }

    /// Copy `start..end`; the caller guarantees `start <= end`.
    pub(crate) fn capture(&self, start: Marker, end: Marker) -> DocumentFragment {
        let mut frag = DocumentFragment::new();
        let starts_paragraph =
            |id| self.prev_line(id).is_none_or(|p| self.line_ref(p).ending().ends_paragraph());

        let mut current = FragmentLine {
            text: String::new(),
            tags: Vec::new(),
            ending: LineEnding::None,
            paragraph: self.line_ref(start.line).paragraph().clone(),
            starts_line: start.pos == 0 && starts_paragraph(start.line),
        };
        let mut cur = Some(start.line);
        while let Some(id) = cur {
            let line = self.line_ref(id);
            let from = if id == start.line { start.pos } else { 0 };
            let to = if id == end.line { end.pos } else { line.len() };
            let base = current.char_len();
            for tag in line.tags() {
                let (s, e) = (tag.start.max(from), tag.end().min(to));
                if s < e {
                    let mut piece = tag.text_template(s - from + base, e - s);
                    piece.picture.clone_from(&tag.picture);
                    piece.link.clone_from(&tag.link);
                    current.push_tag(piece);
                }
            }
            if current.tags.is_empty() {
                current
                    .tags
                    .push(LineTag::new(0, 0, line.format_at(from).clone()));
            }
            current.text.push_str(line.slice(from, to));

            if id == end.line {
                break;
            }
            if line.ending() != LineEnding::Wrap {
                current.ending = line.ending();
                let next = self.next_line(id);
                let paragraph = next
                    .map(|n| self.line_ref(n).paragraph().clone())
                    .unwrap_or_default();
                frag.lines.push(std::mem::replace(
                    &mut current,
                    FragmentLine {
                        text: String::new(),
                        tags: Vec::new(),
                        ending: LineEnding::None,
                        paragraph,
                        starts_line: true,
                    },
                ));
            }
            cur = self.next_line(id);
        }
        frag.lines.push(current);
        frag
    }

    /// Insert a fragment at `at`, returning the position just after it.
    pub fn insert_fragment(
        &mut self,
        at: DocPosition,
        fragment: &DocumentFragment,
    ) -> Result<DocPosition> {
        let marker = self.marker_at(at)?;
        let end = self.insert_fragment_at(marker, fragment);
        self.finish_edit();
        Ok(self.position_of(end))
    }

    pub(crate) fn insert_fragment_at(&mut self, at: Marker, fragment: &DocumentFragment) -> Marker {
        let flat;
        let fragment = if !self.options.multiline && fragment.lines.len() > 1 {
            flat = fragment.flattened();
            &flat
        } else {
            fragment
        };
        let Some((first, rest)) = fragment.lines.split_first() else {
            return at;
        };

        let host = at.line;
        let pos = at.pos;
        let host_starts_paragraph = pos == 0
            && self
                .prev_line(host)
                .is_none_or(|p| self.line_ref(p).ending().ends_paragraph());
        let host_no = self.no(host);

        if rest.is_empty() {
            let count = first.char_len();
            self.edit_line(host, |line| {
                line.splice(pos, &first.text, first.tags.clone());
                if first.starts_line && host_starts_paragraph {
                    line.paragraph = first.paragraph.clone();
                }
            });
            self.remap_markers(|m| {
                if m.line == host && m.pos >= pos {
                    Marker::new(host, m.pos + count)
                } else {
                    m
                }
            });
            self.mark_dirty(host_no, host_no, Some(pos));
            return Marker::new(host, pos + count);
        }

        let template = self.line_ref(host).format_at(pos).clone();
        let host_paragraph = self.line_ref(host).paragraph().clone();
        let (tail_text, tail_tags) = self.edit_line(host, |line| line.split_off(pos));
        let old_ending = self.line_ref(host).ending();
        self.edit_line(host, |line| {
            line.ending = first.ending;
            line.splice(pos, &first.text, first.tags.clone());
            if first.starts_line && host_starts_paragraph {
                line.paragraph = first.paragraph.clone();
            }
        });

        let paragraph_of = |l: &FragmentLine| {
            if l.starts_line {
                l.paragraph.clone()
            } else {
                host_paragraph.clone()
            }
        };
        let tags_or_template = |l: &FragmentLine| {
            if l.tags.is_empty() {
                vec![LineTag::new(0, l.char_len(), template.clone())]
            } else {
                l.tags.clone()
            }
        };

        let mut line_no = host_no;
        let (middle, last) = rest.split_at(rest.len() - 1);
        for l in middle {
            line_no += 1;
            let line = Line::from_parts(l.text.clone(), tags_or_template(l), l.ending, paragraph_of(l));
            self.insert_line(line_no, line);
        }

        let last = &last[0];
        line_no += 1;
        let last_len = last.char_len();
        let mut tail = Line::from_parts(tail_text, tail_tags, old_ending, paragraph_of(last));
        tail.splice(0, &last.text, tags_or_template(last));
        let tail_id = self.insert_line(line_no, tail);

        self.remap_markers(|m| {
            if m.line == host && m.pos >= pos {
                Marker::new(tail_id, m.pos - pos + last_len)
            } else {
                m
            }
        });
        self.mark_dirty(host_no, line_no, Some(pos));
        Marker::new(tail_id, last_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::document::paragraph::HorizontalAlignment;
    use crate::style::TextFormat;

    #[test]
    fn test_from_plain_splits_endings() {
        let frag = DocumentFragment::from_plain("a\r\nbc\nd", &TagFormat::default());
        assert_eq!(frag.lines().len(), 3);
        assert_eq!(frag.lines()[0].ending, LineEnding::Hard);
        assert_eq!(frag.lines()[1].ending, LineEnding::Rich);
        assert_eq!(frag.len(), 7);
        assert_eq!(frag.text(), "a\r\nbc\nd");
    }

    #[test]
    fn test_capture_and_reinsert_keeps_format() {
        let mut doc = Document::new();
        doc.insert(1, 0, "Hello\r\nWorld").unwrap();
        doc.format_text(
            DocPosition::new(1, 1),
            DocPosition::new(2, 2),
            &TextFormat::new().color(Color::RED),
        )
        .unwrap();
        let frag = doc
            .fragment(DocPosition::new(1, 1), DocPosition::new(2, 2))
            .unwrap();
        assert_eq!(frag.text(), "ello\r\nWo");
        assert!(frag.lines().iter().all(|l| l.tags.iter().all(|t| t.format.color == Color::RED)));

        let mut other = Document::new();
        other.insert(1, 0, "[]").unwrap();
        let end = other.insert_fragment(DocPosition::new(1, 1), &frag).unwrap();
        assert_eq!(other.text(), "[ello\r\nWo]");
        assert_eq!(end, DocPosition::new(2, 2));
        let formats = other.line(2).unwrap().char_formats();
        assert_eq!(formats[0].color, Color::RED);
        assert_eq!(formats[2].color, Color::BLACK);
    }

    #[test]
    fn test_whole_line_fragment_carries_paragraph() {
        let mut doc = Document::new();
        doc.insert(1, 0, "one\r\ntwo").unwrap();
        doc.format_paragraphs(2, 2, |p| p.alignment = HorizontalAlignment::Center)
            .unwrap();
        let frag = doc
            .fragment(DocPosition::new(1, 3), DocPosition::new(2, 3))
            .unwrap();
        assert!(frag.lines()[1].starts_line);

        let mut other = Document::new();
        other.insert(1, 0, "x").unwrap();
        other.insert_fragment(DocPosition::new(1, 1), &frag).unwrap();
        assert_eq!(other.text(), "x\r\ntwo");
        assert_eq!(
            other.line(2).unwrap().paragraph().alignment,
            HorizontalAlignment::Center
        );
    }

    #[test]
    fn test_capture_joins_wrapped_runs() {
        let options = crate::DocumentOptions::default()
            .word_wrap(true)
            .viewport(60.0, 100.0);
        let mut doc = Document::with_options(options);
        doc.insert(1, 0, "alpha beta gamma\r\nx").unwrap();
        let last = doc.line_count();
        assert!(last > 2);
        let first_len = doc.line(1).unwrap().len();

        let frag = doc
            .fragment(DocPosition::new(1, 0), DocPosition::new(last, 1))
            .unwrap();
        assert_eq!(frag.text(), "alpha beta gamma\r\nx");
        assert_eq!(frag.lines()[0].tags.len(), 1);
        assert_eq!(frag.lines()[0].tags[0].length, 16);

        let frag = doc
            .fragment(DocPosition::new(1, first_len), DocPosition::new(last, 1))
            .unwrap();
        assert_eq!(frag.lines()[0].tags.len(), 1);
        assert!(frag.lines()[0].tags[0].length > 0);
    }

    #[test]
    fn test_capture_keeps_links() {
        let mut doc = Document::with_options(crate::DocumentOptions::default().detect_urls(true));
        doc.insert(1, 0, "go www.a.org now").unwrap();
        let frag = doc
            .fragment(DocPosition::new(1, 0), DocPosition::new(1, 16))
            .unwrap();
        let links: Vec<&str> = frag.lines()[0]
            .tags
            .iter()
            .filter_map(|t| t.link.as_deref())
            .collect();
        assert_eq!(links, ["www.a.org"]);
        assert_eq!(frag.lines()[0].tags.len(), 3);
    }

    #[test]
    fn test_single_line_document_flattens() {
        let mut doc = Document::with_options(crate::DocumentOptions::default().multiline(false));
        let frag = DocumentFragment::from_plain("a\nb", &TagFormat::default());
        doc.insert_fragment(DocPosition::new(1, 0), &frag).unwrap();
        assert_eq!(doc.line_count(), 1);
        assert_eq!(doc.text(), "ab");
    }
}
