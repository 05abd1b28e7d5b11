//! A single line: text, ending kind, paragraph format, tag chain and
//! cached layout.

use crate::document::paragraph::ParagraphFormat;
use crate::document::tag::{LineTag, PICTURE_PLACEHOLDER};
use crate::error::{Error, Result};
use crate::picture::Picture;
use crate::style::TagFormat;

/// How a line terminates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LineEnding {
    /// Word-wrap continuation of the same paragraph.
    Wrap,
    /// `\r\r\n`
    Soft,
    /// `\r\n`
    Hard,
    /// `\n`
    Rich,
    /// `\r`
    Limp,
    /// Last line, no terminator.
    #[default]
    None,
}

impl LineEnding {
    /// Terminator text.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Soft => "\r\r\n",
            Self::Hard => "\r\n",
            Self::Rich => "\n",
            Self::Limp => "\r",
            Self::Wrap | Self::None => "",
        }
    }

    /// Length of the terminator in characters.
    #[must_use]
    pub const fn char_len(self) -> usize {
        self.as_str().len()
    }

    /// Whether this ending closes a paragraph.
    #[must_use]
    pub const fn ends_paragraph(self) -> bool {
        !matches!(self, Self::Wrap)
    }

    /// Recognise a line terminator at the start of `chars`, returning the
    /// ending and how many characters it spans.
    #[must_use]
    pub fn detect(chars: &[char]) -> Option<(Self, usize)> {
        match chars {
            ['\r', '\r', '\n', ..] => Some((Self::Soft, 3)),
            ['\r', '\n', ..] => Some((Self::Hard, 2)),
            ['\r', ..] => Some((Self::Limp, 1)),
            ['\n', ..] => Some((Self::Rich, 1)),
            _ => None,
        }
    }
}

impl TryFrom<i32> for LineEnding {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Self::Wrap),
            1 => Ok(Self::Limp),
            2 => Ok(Self::Hard),
            4 => Ok(Self::Soft),
            8 => Ok(Self::Rich),
            16 => Ok(Self::None),
            _ => Err(Error::InvalidEnumValue {
                what: "line ending",
                value,
            }),
        }
    }
}

/// Cached line geometry, in pixels.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LineLayout {
    /// Left edge of the text box (after indents).
    pub x: f32,
    pub y: f32,
    /// Width of the text, excluding alignment shift.
    pub width: f32,
    pub height: f32,
    /// Distance from the top of the line to the baseline.
    pub ascent: f32,
    /// Extra offset applied for center/right alignment.
    pub align_shift: f32,
    /// `widths[i]` is the x offset of character `i`; one extra entry for the end.
    pub widths: Vec<f32>,
}

/// A line of text with its formatting runs.
#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    text: String,
    len: usize,
    pub(crate) ending: LineEnding,
    pub(crate) paragraph: ParagraphFormat,
    pub(crate) tags: Vec<LineTag>,
    pub(crate) layout: LineLayout,
    pub(crate) recalc: bool,
}

impl Line {
    /// Create a line covered by a single run.
    #[must_use]
    pub fn new(text: &str, format: TagFormat, ending: LineEnding) -> Self {
        let len = text.chars().count();
        Self {
            text: text.to_owned(),
            len,
            ending,
            paragraph: ParagraphFormat::default(),
            tags: vec![LineTag::new(0, len, format)],
            layout: LineLayout::default(),
            recalc: true,
        }
    }

    pub(crate) fn from_parts(
        text: String,
        tags: Vec<LineTag>,
        ending: LineEnding,
        paragraph: ParagraphFormat,
    ) -> Self {
        let len = text.chars().count();
        Self {
            text,
            len,
            ending,
            paragraph,
            tags,
            layout: LineLayout::default(),
            recalc: true,
        }
    }

    /// Text without the line terminator.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length in characters, excluding the terminator.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn ending(&self) -> LineEnding {
        self.ending
    }

    #[must_use]
    pub fn paragraph(&self) -> &ParagraphFormat {
        &self.paragraph
    }

    #[must_use]
    pub fn tags(&self) -> &[LineTag] {
        &self.tags
    }

    #[must_use]
    pub fn layout(&self) -> &LineLayout {
        &self.layout
    }

    /// Whether the line is waiting for recalculation.
    #[must_use]
    pub fn needs_recalc(&self) -> bool {
        self.recalc
    }

    /// Length including the terminator.
    #[must_use]
    pub fn len_with_ending(&self) -> usize {
        self.len + self.ending.char_len()
    }

    #[must_use]
    pub fn char_at(&self, pos: usize) -> Option<char> {
        self.text.chars().nth(pos)
    }

    pub(crate) fn byte_of(&self, pos: usize) -> usize {
        self.text
            .char_indices()
            .nth(pos)
            .map_or(self.text.len(), |(b, _)| b)
    }

    /// Characters `start..end` (clamped).
    #[must_use]
    pub fn slice(&self, start: usize, end: usize) -> &str {
        let end = end.min(self.len);
        let start = start.min(end);
        &self.text[self.byte_of(start)..self.byte_of(end)]
    }

    /// X offset of character `pos` from the left of the line, including the
    /// alignment shift.
    #[must_use]
    pub fn x_of(&self, pos: usize) -> f32 {
        let w = &self.layout.widths;
        let inner = w.get(pos.min(self.len)).or_else(|| w.last()).copied();
        self.layout.x + self.layout.align_shift + inner.unwrap_or(0.0)
    }

    /// Index of the run a caret at `pos` types into: the run holding the
    /// character before `pos`, or a zero-length run sitting at `pos`.
    #[must_use]
    pub fn tag_index_at(&self, pos: usize) -> usize {
        if let Some(i) = self
            .tags
            .iter()
            .position(|t| t.length == 0 && t.start == pos)
        {
            return i;
        }
        if pos == 0 {
            return 0;
        }
        let i = self.tags.partition_point(|t| t.end() < pos);
        i.min(self.tags.len().saturating_sub(1))
    }

    /// Index of the run containing character `pos`.
    #[must_use]
    pub fn tag_index_for_char(&self, pos: usize) -> Option<usize> {
        let i = self.tags.partition_point(|t| t.end() <= pos);
        (i < self.tags.len() && self.tags[i].contains(pos)).then_some(i)
    }

    /// Format a caret at `pos` would type with.
    #[must_use]
    pub fn format_at(&self, pos: usize) -> &TagFormat {
        &self.tags[self.tag_index_at(pos)].format
    }

    /// Ensure a run boundary at `pos`; returns the index of the first run
    /// starting at or after `pos`.
    pub(crate) fn split_tags_at(&mut self, pos: usize) -> usize {
        if let Some(i) = self.tags.iter().position(|t| t.start < pos && pos < t.end()) {
            let tag = &mut self.tags[i];
            let right_len = tag.end() - pos;
            tag.length = pos - tag.start;
            let mut right = tag.clone();
            right.start = pos;
            right.length = right_len;
            self.tags.insert(i + 1, right);
            return i + 1;
        }
        self.tags.partition_point(|t| t.start < pos)
    }

    /// Insert `text` at `pos`. With `format` the text gets that format,
    /// otherwise it inherits the run at `pos`.
    pub(crate) fn insert_text(&mut self, pos: usize, text: &str, format: Option<&TagFormat>) {
        let pos = pos.min(self.len);
        let count = text.chars().count();
        if count == 0 {
            return;
        }

        let current = self.tag_index_at(pos);
        let format = format.unwrap_or(&self.tags[current].format).clone();
        let target = if self.tags[current].accepts(&format) {
            self.tags[current].length += count;
            current
        } else {
            let at = self.split_tags_at(pos);
            self.tags.insert(at, LineTag::new(pos, count, format));
            at
        };
        for tag in &mut self.tags[target + 1..] {
            tag.start += count;
        }

        let byte = self.byte_of(pos);
        self.text.insert_str(byte, text);
        self.len += count;
        self.prune_empty_tags(None);
        self.recalc = true;
    }

    /// Insert a picture placeholder at `pos`.
    pub(crate) fn insert_picture(&mut self, pos: usize, picture: Picture, format: TagFormat) {
        let pos = pos.min(self.len);
        let at = self.split_tags_at(pos);
        self.tags.insert(at, LineTag::picture(pos, picture, format));
        for tag in &mut self.tags[at + 1..] {
            tag.start += 1;
        }
        let byte = self.byte_of(pos);
        self.text.insert(byte, PICTURE_PLACEHOLDER);
        self.len += 1;
        self.prune_empty_tags(None);
        self.recalc = true;
    }

    /// Remove `count` characters starting at `pos`.
    pub(crate) fn delete_text(&mut self, pos: usize, count: usize) {
        let pos = pos.min(self.len);
        let end = (pos + count).min(self.len);
        if end == pos {
            return;
        }
        let removed = end - pos;
        let first_deleted = self.tag_index_for_char(pos).unwrap_or(0);
        let fallback = self.tags[first_deleted].text_template(0, 0);

        let first = self.split_tags_at(pos);
        let after = self.split_tags_at(end);
        self.tags.drain(first..after);
        for tag in &mut self.tags[first..] {
            tag.start -= removed;
        }
        if self.tags.is_empty() {
            self.tags.push(fallback);
        }

        let (b0, b1) = (self.byte_of(pos), self.byte_of(end));
        self.text.replace_range(b0..b1, "");
        self.len -= removed;
        self.prune_empty_tags(None);
        self.recalc = true;
    }

    /// Cut the line at `pos`, returning the tail text and runs rebased to 0.
    pub(crate) fn split_off(&mut self, pos: usize) -> (String, Vec<LineTag>) {
        let pos = pos.min(self.len);
        let template = self.tags[self.tag_index_at(pos)].text_template(0, 0);
        let at = self.split_tags_at(pos);
        let mut tail_tags = self.tags.split_off(at);
        for tag in &mut tail_tags {
            tag.start -= pos;
        }
        if tail_tags.is_empty() {
            tail_tags.push(template.clone());
        }
        if self.tags.is_empty() {
            self.tags.push(LineTag::new(0, 0, tail_tags[0].format.clone()));
        }

        let byte = self.byte_of(pos);
        let tail = self.text.split_off(byte);
        self.len = pos;
        self.recalc = true;
        (tail, tail_tags)
    }

    /// Append text and runs (runs are 0-based relative to `text`).
    pub(crate) fn append(&mut self, text: &str, tags: Vec<LineTag>) {
        let base = self.len;
        self.tags.extend(tags.into_iter().map(|mut t| {
            t.start += base;
            t
        }));
        self.text.push_str(text);
        self.len += text.chars().count();
        self.prune_empty_tags(None);
        self.recalc = true;
    }

    /// Take the line apart into text and runs.
    pub(crate) fn into_parts(self) -> (String, Vec<LineTag>) {
        (self.text, self.tags)
    }

    /// Insert `text` with its own runs (0-based relative to `text`) at `pos`.
    pub(crate) fn splice(&mut self, pos: usize, text: &str, tags: Vec<LineTag>) {
        let pos = pos.min(self.len);
        let count = text.chars().count();
        if count == 0 {
            return;
        }
        let at = self.split_tags_at(pos);
        for tag in &mut self.tags[at..] {
            tag.start += count;
        }
        let inserted = tags.into_iter().map(|mut t| {
            t.start += pos;
            t
        });
        self.tags.splice(at..at, inserted);

        let byte = self.byte_of(pos);
        self.text.insert_str(byte, text);
        self.len += count;
        self.prune_empty_tags(None);
        self.coalesce();
        self.recalc = true;
    }

    /// Merge neighbouring plain runs that share a format.
    pub(crate) fn coalesce(&mut self) {
        let mut i = 1;
        while i < self.tags.len() {
            let (left, right) = (&self.tags[i - 1], &self.tags[i]);
            let plain = |t: &LineTag| t.picture.is_none() && t.link.is_none() && t.length > 0;
            if plain(left) && plain(right) && left.format == right.format {
                self.tags[i - 1].length += self.tags[i].length;
                self.tags.remove(i);
            } else {
                i += 1;
            }
        }
    }

    /// Re-derive run edges from the laid-out character offsets, after runs
    /// were split or merged without changing their formats.
    pub(crate) fn refresh_tag_edges(&mut self) {
        let widths = &self.layout.widths;
        let Some(last) = widths.len().checked_sub(1) else {
            return;
        };
        for tag in &mut self.tags {
            let x = widths[tag.start.min(last)];
            tag.layout.x = x;
            tag.layout.width = widths[tag.end().min(last)] - x;
        }
    }

    /// Drop zero-length runs except one sitting at `keep`; at least one run
    /// always remains.
    pub(crate) fn prune_empty_tags(&mut self, keep: Option<usize>) {
        if self.tags.len() <= 1 {
            return;
        }
        let has_text = self.len > 0;
        let mut kept_empty = false;
        self.tags.retain(|t| {
            if t.length > 0 {
                return true;
            }
            let keep_this = !kept_empty && (keep == Some(t.start) || !has_text);
            kept_empty |= keep_this;
            keep_this
        });
    }

    /// Check the run invariants for this line.
    pub(crate) fn check(&self) -> std::result::Result<(), String> {
        if self.tags.is_empty() {
            return Err("line has no runs".into());
        }
        if self.len != self.text.chars().count() {
            return Err("cached length is stale".into());
        }
        let mut expected = 0;
        for (i, tag) in self.tags.iter().enumerate() {
            if tag.start != expected {
                return Err(format!(
                    "run {i} starts at {} but previous run ends at {expected}",
                    tag.start
                ));
            }
            if tag.picture.is_some() && tag.length != 1 {
                return Err(format!("picture run {i} has length {}", tag.length));
            }
            expected = tag.end();
        }
        if expected != self.len {
            return Err(format!(
                "runs cover {expected} characters of a {} character line",
                self.len
            ));
        }
        Ok(())
    }

    /// Formats per character, for comparisons in tests and undo checks.
    #[must_use]
    pub fn char_formats(&self) -> Vec<&TagFormat> {
        self.tags
            .iter()
            .flat_map(|t| std::iter::repeat_n(&t.format, t.length))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::style::{Font, FontStyle};

    fn bold() -> TagFormat {
        TagFormat::new(
            Font::default().with_style(FontStyle::BOLD),
            Color::BLACK,
        )
    }

    #[test]
    fn test_ending_detect() {
        let chars: Vec<char> = "\r\r\nx".chars().collect();
        assert_eq!(LineEnding::detect(&chars), Some((LineEnding::Soft, 3)));
        assert_eq!(LineEnding::detect(&['\r', 'x']), Some((LineEnding::Limp, 1)));
        assert_eq!(LineEnding::detect(&['\n']), Some((LineEnding::Rich, 1)));
        assert_eq!(LineEnding::detect(&['x']), None);
        assert_eq!(LineEnding::Hard.char_len(), 2);
        assert_eq!(LineEnding::Wrap.char_len(), 0);
    }

    #[test]
    fn test_insert_extends_run() {
        let mut line = Line::new("Hello", TagFormat::default(), LineEnding::None);
        line.insert_text(5, " World", None);
        assert_eq!(line.text(), "Hello World");
        assert_eq!(line.tags().len(), 1);
        assert!(line.check().is_ok());
    }

    #[test]
    fn test_insert_with_format_splits() {
        let mut line = Line::new("Hello", TagFormat::default(), LineEnding::None);
        line.insert_text(2, "XX", Some(&bold()));
        assert_eq!(line.text(), "HeXXllo");
        let starts: Vec<(usize, usize)> = line.tags().iter().map(|t| (t.start, t.length)).collect();
        assert_eq!(starts, vec![(0, 2), (2, 2), (4, 3)]);
        assert!(line.check().is_ok());
    }

    #[test]
    fn test_insert_at_start_with_same_format() {
        let mut line = Line::new("abc", TagFormat::default(), LineEnding::None);
        line.insert_text(0, "z", None);
        assert_eq!(line.text(), "zabc");
        assert_eq!(line.tags().len(), 1);
        assert!(line.check().is_ok());
    }

    #[test]
    fn test_delete_across_runs() {
        let mut line = Line::new("Hello", TagFormat::default(), LineEnding::None);
        line.insert_text(5, "World", Some(&bold()));
        line.delete_text(3, 4);
        assert_eq!(line.text(), "Helld");
        assert_eq!(line.tags().len(), 2);
        assert_eq!(line.tags()[1].start, 3);
        assert!(line.check().is_ok());
    }

    #[test]
    fn test_delete_everything_keeps_a_run() {
        let mut line = Line::new("Hello", bold(), LineEnding::Hard);
        line.delete_text(0, 5);
        assert!(line.is_empty());
        assert_eq!(line.tags().len(), 1);
        assert_eq!(line.tags()[0].format, bold());
        assert!(line.check().is_ok());
    }

    #[test]
    fn test_split_off_and_append_restore() {
        let mut line = Line::new("Hello", TagFormat::default(), LineEnding::Hard);
        line.insert_text(5, "World", Some(&bold()));
        let original = line.clone();
        for pos in 0..=line.len() {
            let mut copy = original.clone();
            let (tail, tags) = copy.split_off(pos);
            assert!(copy.check().is_ok());
            copy.append(&tail, tags);
            assert_eq!(copy.text(), original.text());
            assert_eq!(copy.char_formats(), original.char_formats());
            assert!(copy.check().is_ok());
        }
    }

    #[test]
    fn test_tag_lookup() {
        let mut line = Line::new("Hello", TagFormat::default(), LineEnding::None);
        line.insert_text(5, "World", Some(&bold()));
        assert_eq!(line.tag_index_at(5), 0);
        assert_eq!(line.tag_index_at(6), 1);
        assert_eq!(line.tag_index_for_char(5), Some(1));
        assert_eq!(line.tag_index_for_char(10), None);
    }

    #[test]
    fn test_insert_picture() {
        use crate::picture::{Picture, PictureKind};
        let mut line = Line::new("ab", TagFormat::default(), LineEnding::None);
        line.insert_picture(1, Picture::new(PictureKind::Png, vec![0u8], 4.0, 4.0), TagFormat::default());
        assert_eq!(line.len(), 3);
        assert!(line.tags()[1].is_picture());
        assert_eq!(line.char_at(1), Some(PICTURE_PLACEHOLDER));
        assert!(line.check().is_ok());
    }

    #[test]
    fn test_splice_inserts_runs_and_merges() {
        let mut line = Line::new("ad", TagFormat::default(), LineEnding::None);
        line.splice(
            1,
            "bc",
            vec![LineTag::new(0, 1, bold()), LineTag::new(1, 1, TagFormat::default())],
        );
        assert_eq!(line.text(), "abcd");
        let runs: Vec<(usize, usize)> = line.tags().iter().map(|t| (t.start, t.length)).collect();
        assert_eq!(runs, vec![(0, 1), (1, 1), (2, 2)]);
        assert!(line.check().is_ok());
    }

    #[test]
    fn test_slice_clamps() {
        let line = Line::new("héllo", TagFormat::default(), LineEnding::None);
        assert_eq!(line.slice(1, 3), "él");
        assert_eq!(line.slice(3, 99), "lo");
        assert_eq!(line.slice(9, 2), "");
    }
}
