//! RTF import and export.
//!
//! The supported subset covers the font and color tables, character
//! formatting (font, size, bold, italic, underline, strikeout, colors,
//! sub/superscript, baseline offset, hidden text), paragraph formatting
//! (alignment, indents, spacing, tab stops), special characters, `\u`
//! escapes and embedded pictures.
//!
//! Import is all-or-nothing: the stream is parsed into a
//! [`DocumentFragment`] first and only spliced into the document once the
//! whole stream has been read.

mod lexer;
mod reader;
mod writer;

use crate::color::Color;
use crate::document::{DocPosition, Document, DocumentFragment, Marker};
use crate::error::{Error, Result};
use crate::picture::PictureDecoder;
use crate::style::TagFormat;
use std::fmt;
use std::io::{Read, Write};
use tracing::{debug, warn};

use reader::RtfReader;
use writer::RtfWriter;

/// What was wrong with an RTF stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RtfErrorKind {
    /// The stream does not start with `{\rtf`.
    MissingHeader,
    /// The stream ends inside an escape.
    UnexpectedEof,
    /// A `\'hh` escape or picture payload is not valid hex.
    InvalidHex,
    /// A numeric parameter does not fit in 32 bits.
    ParameterOverflow,
    /// A control word is longer than any RTF defines.
    WordTooLong,
    /// Groups are nested deeper than the reader accepts.
    TooDeep,
    /// The picture decoder rejected an embedded picture.
    InvalidPicture,
}

impl RtfErrorKind {
    const fn message(self) -> &'static str {
        match self {
            Self::MissingHeader => "missing {\\rtf header",
            Self::UnexpectedEof => "unexpected end of input",
            Self::InvalidHex => "invalid hex data",
            Self::ParameterOverflow => "numeric parameter overflow",
            Self::WordTooLong => "control word too long",
            Self::TooDeep => "groups nested too deeply",
            Self::InvalidPicture => "undecodable picture",
        }
    }
}

/// Malformed RTF, with the byte offset where reading stopped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RtfError {
    kind: RtfErrorKind,
    offset: usize,
}

impl RtfError {
    #[must_use]
    pub const fn new(kind: RtfErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }

    #[must_use]
    pub const fn kind(&self) -> RtfErrorKind {
        self.kind
    }

    /// Byte offset into the input.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }
}

impl fmt::Display for RtfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at byte {}", self.kind.message(), self.offset)
    }
}

impl std::error::Error for RtfError {}

/// Parse an RTF stream into a fragment. Text without explicit formatting
/// gets `base`.
pub fn parse(
    data: &[u8],
    base: &TagFormat,
    decoder: &dyn PictureDecoder,
) -> std::result::Result<DocumentFragment, RtfError> {
    RtfReader::new(data, base, decoder).read()
}

/// Serialize a fragment. Text in `foreground` is written without a color
/// reference.
#[must_use]
pub fn generate(fragment: &DocumentFragment, foreground: Color) -> String {
    RtfWriter::new(fragment, foreground).write(fragment)
}

impl Document {
    fn parse_rtf(&self, data: &[u8]) -> Result<DocumentFragment> {
        let fragment = parse(data, &self.default_format(), self.decoder.as_ref()).map_err(|e| {
            warn!(error = %e, "rejected RTF input");
            Error::Rtf(e)
        })?;
        debug!(lines = fragment.lines().len(), bytes = data.len(), "parsed RTF");
        if self.options.multiline {
            Ok(fragment)
        } else {
            Ok(fragment.flattened())
        }
    }

    /// Replace the content with an RTF document, dropping undo history.
    /// On error the document is left as it was.
    pub fn load_rtf(&mut self, data: &[u8]) -> Result<()> {
        let fragment = self.parse_rtf(data)?;
        self.suspend_recalc();
        self.reset_lines();
        self.undo.clear();
        let start = Marker::new(self.first_line(), 0);
        let end = self.insert_fragment_at(start, &fragment);
        self.collapse_to(end);
        self.mark_all_dirty();
        self.resume_recalc(false);
        self.finish_edit();
        Ok(())
    }

    /// [`load_rtf`](Self::load_rtf) from a reader.
    pub fn read_rtf(&mut self, mut reader: impl Read) -> Result<()> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        self.load_rtf(&data)
    }

    /// Insert an RTF document at `at` as one undo step, leaving the caret
    /// after it. On error the document is left as it was.
    pub fn insert_rtf(&mut self, at: DocPosition, data: &[u8]) -> Result<DocPosition> {
        let marker = self.marker_at(at)?;
        let fragment = self.parse_rtf(data)?;
        let before = self.selection_snapshot();
        let offset = self.offset_of(marker);

        self.suspend_recalc();
        let end = self.insert_fragment_at(marker, &fragment);
        self.collapse_to(end);
        let after = self.selection_snapshot();
        self.undo.record_insert(offset, fragment, before, after);
        self.resume_recalc(false);
        self.finish_edit();
        Ok(self.position_of(end))
    }

    /// RTF for the text between two positions.
    pub fn generate_rtf(&self, start: DocPosition, end: DocPosition) -> Result<String> {
        let fragment = self.fragment(start, end)?;
        Ok(generate(&fragment, self.options.default_color))
    }

    /// RTF for the whole document.
    #[must_use]
    pub fn to_rtf(&self) -> String {
        let last = self.last_line();
        let start = Marker::new(self.first_line(), 0);
        let end = Marker::new(last, self.line_ref(last).len());
        generate(&self.capture(start, end), self.options.default_color)
    }

    /// Write the whole document as RTF.
    pub fn save_rtf(&self, mut writer: impl Write) -> Result<()> {
        writer.write_all(self.to_rtf().as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::HorizontalAlignment;
    use crate::document::LineEnding;
    use crate::style::FontStyle;
    use crate::style::TextFormat;

    const HI: &[u8] = br"{\rtf1\ansi{\fonttbl{\f0\fnil\fcharset0 Arial;}}\f0\fs20 Hi\par}";

    #[test]
    fn test_load_rtf() {
        let mut doc = Document::new();
        doc.load_rtf(HI).unwrap();
        assert_eq!(doc.line_count(), 1);
        let line = doc.line(1).unwrap();
        assert_eq!(line.text(), "Hi");
        assert_eq!(line.ending(), LineEnding::None);
        let format = &line.tags()[0].format;
        assert_eq!(format.font.name, "Arial");
        assert!((format.font.size - 10.0).abs() < f32::EPSILON);
        assert!(!doc.can_undo());
    }

    #[test]
    fn test_failed_load_leaves_document_untouched() {
        let mut doc = Document::new();
        doc.insert(1, 0, "keep me").unwrap();
        let err = doc.load_rtf(br"{\rtf1 broken\'zz}").unwrap_err();
        assert!(matches!(err, Error::Rtf(ref e) if e.kind() == RtfErrorKind::InvalidHex));
        assert_eq!(doc.text(), "keep me");
    }

    #[test]
    fn test_insert_rtf_is_undoable() {
        let mut doc = Document::new();
        doc.insert(1, 0, "ab").unwrap();
        let end = doc
            .insert_rtf(DocPosition::new(1, 1), br"{\rtf1 X\par Y}")
            .unwrap();
        assert_eq!(doc.line_count(), 2);
        assert_eq!(doc.line(1).unwrap().text(), "aX");
        assert_eq!(doc.line(2).unwrap().text(), "Yb");
        assert_eq!(end, DocPosition::new(2, 1));
        assert_eq!(doc.caret_position(), end);

        assert!(doc.undo());
        assert_eq!(doc.text(), "ab");
        assert!(doc.redo());
        assert_eq!(doc.line(2).unwrap().text(), "Yb");
    }

    #[test]
    fn test_round_trip_keeps_formatting() {
        // RTF sizes are half points.
        let options =
            crate::DocumentOptions::default().default_font(crate::style::Font::new("Arial", 10.0));
        let mut doc = Document::with_options(options.clone());
        doc.insert(1, 0, "plain bold\r\ncentered").unwrap();
        doc.format_text(
            DocPosition::new(1, 6),
            DocPosition::new(1, 10),
            &TextFormat::new().style_on(FontStyle::BOLD).color(Color::RED),
        )
        .unwrap();
        doc.format_paragraphs(2, 2, |p| p.alignment = HorizontalAlignment::Center)
            .unwrap();

        let rtf = doc.to_rtf();
        let mut copy = Document::with_options(options);
        copy.load_rtf(rtf.as_bytes()).unwrap();

        assert_eq!(copy.line_count(), 2);
        for n in 1..=2 {
            let (a, b) = (doc.line(n).unwrap(), copy.line(n).unwrap());
            assert_eq!(a.text(), b.text());
            assert_eq!(a.char_formats(), b.char_formats());
            assert_eq!(a.paragraph(), b.paragraph());
        }
    }

    #[test]
    fn test_single_line_import_flattens() {
        let mut doc = Document::with_options(crate::DocumentOptions::default().multiline(false));
        doc.load_rtf(br"{\rtf1 one\par two}").unwrap();
        assert_eq!(doc.line_count(), 1);
        assert_eq!(doc.text(), "onetwo");
    }

    #[test]
    fn test_error_display() {
        let err = RtfError::new(RtfErrorKind::TooDeep, 42);
        assert_eq!(err.to_string(), "groups nested too deeply at byte 42");
    }
}
