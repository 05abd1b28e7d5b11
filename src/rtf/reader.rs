//! RTF import.
//!
//! Tokens drive a small state machine. Each `{` saves the current character
//! and paragraph state and each `}` restores it, so formatting scoped to a
//! group never leaks out of it. Text accumulates into lines of a
//! [`DocumentFragment`]; a run is extended while its format is unchanged and
//! a new one starts as soon as the format differs.

use crate::color::Color;
use crate::document::{
    DocumentFragment, FragmentLine, HorizontalAlignment, LineEnding, LineTag, ParagraphFormat,
    TabKind, TabStop, PICTURE_PLACEHOLDER,
};
use crate::picture::{PictureDecoder, PictureKind};
use crate::rtf::lexer::{hex_pair, Lexer, Token};
use crate::rtf::{RtfError, RtfErrorKind};
use crate::style::{FontStyle, TagFormat, TextPosition};
use std::collections::HashMap;
use tracing::trace;

/// Deepest group nesting accepted.
const MAX_DEPTH: usize = 1024;

/// Destinations whose content is never shown; the whole group is skipped.
const SKIPPED_DESTINATIONS: &[&str] = &[
    "author",
    "colorschememapping",
    "comment",
    "datastore",
    "fldinst",
    "footer",
    "footnote",
    "generator",
    "header",
    "info",
    "latentstyles",
    "listoverridetable",
    "listtable",
    "nonshppict",
    "object",
    "operator",
    "pntext",
    "pntxta",
    "pntxtb",
    "revtbl",
    "rsidtbl",
    "stylesheet",
    "themedata",
    "title",
    "xmlnstbl",
];

/// Windows-1252 code points for bytes 0x80..=0x9F; the rest match Latin-1.
const CP1252_HIGH: [u16; 32] = [
    0x20AC, 0xFFFD, 0x201A, 0x0192, 0x201E, 0x2026, 0x2020, 0x2021, 0x02C6, 0x2030, 0x0160,
    0x2039, 0x0152, 0xFFFD, 0x017D, 0xFFFD, 0xFFFD, 0x2018, 0x2019, 0x201C, 0x201D, 0x2022,
    0x2013, 0x2014, 0x02DC, 0x2122, 0x0161, 0x203A, 0x0153, 0xFFFD, 0x017E, 0x0178,
];

fn decode_cp1252(byte: u8) -> char {
    let code = match byte {
        0x80..=0x9F => u32::from(CP1252_HIGH[usize::from(byte - 0x80)]),
        _ => u32::from(byte),
    };
    char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
}

fn twips_to_points(twips: i32) -> f32 {
    twips as f32 / 20.0
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Destination {
    Text,
    FontTable,
    ColorTable,
    Picture,
}

/// Everything a group saves and restores.
#[derive(Clone, Debug)]
struct GroupState {
    format: TagFormat,
    paragraph: ParagraphFormat,
    /// `\li` and `\fi` in twips; the paragraph indents derive from both.
    left_indent: i32,
    first_indent: i32,
    /// `\sl` in twips and whether `\slmult1` is in effect.
    line_spacing: i32,
    line_spacing_multiple: bool,
    /// Kind for the next `\tx`.
    tab_kind: TabKind,
    /// Fallback characters following each `\u`.
    unicode_skip: usize,
    destination: Destination,
    /// Set by `\*`: an unknown destination word skips the group.
    ignorable: bool,
}

impl GroupState {
    fn new(format: TagFormat) -> Self {
        Self {
            format,
            paragraph: ParagraphFormat::default(),
            left_indent: 0,
            first_indent: 0,
            line_spacing: 0,
            line_spacing_multiple: false,
            tab_kind: TabKind::Left,
            unicode_skip: 1,
            destination: Destination::Text,
            ignorable: false,
        }
    }

    fn update_indents(&mut self) {
        self.paragraph.indent = twips_to_points(self.left_indent + self.first_indent);
        self.paragraph.hanging_indent = twips_to_points(-self.first_indent);
    }

    fn update_line_spacing(&mut self) {
        if self.line_spacing_multiple {
            self.paragraph.line_spacing = self.line_spacing as f32 / 240.0;
            self.paragraph.line_spacing_multiple = true;
        } else {
            self.paragraph.line_spacing = twips_to_points(self.line_spacing.abs());
            self.paragraph.line_spacing_multiple = false;
        }
    }
}

#[derive(Debug, Default)]
struct PictState {
    kind: Option<PictureKind>,
    goal_width: Option<i32>,
    goal_height: Option<i32>,
    hex: Vec<u8>,
}

/// Parser state for one import.
pub(crate) struct RtfReader<'a> {
    lexer: Lexer<'a>,
    decoder: &'a dyn PictureDecoder,
    base: TagFormat,
    state: GroupState,
    stack: Vec<GroupState>,

    fonts: HashMap<i32, String>,
    default_font: Option<i32>,
    font_id: Option<i32>,
    font_name: String,

    colors: Vec<Option<Color>>,
    color: [u8; 3],
    color_set: bool,

    pict: PictState,
    /// Fallback characters still to drop after a `\u`.
    skip: usize,
    high_surrogate: Option<u32>,

    fragment: DocumentFragment,
    text: String,
    tags: Vec<LineTag>,
    len: usize,
}

impl<'a> RtfReader<'a> {
    pub(crate) fn new(data: &'a [u8], base: &TagFormat, decoder: &'a dyn PictureDecoder) -> Self {
        Self {
            lexer: Lexer::new(data),
            decoder,
            base: base.clone(),
            state: GroupState::new(base.clone()),
            stack: Vec::new(),
            fonts: HashMap::new(),
            default_font: None,
            font_id: None,
            font_name: String::new(),
            colors: Vec::new(),
            color: [0; 3],
            color_set: false,
            pict: PictState::default(),
            skip: 0,
            high_surrogate: None,
            fragment: DocumentFragment::new(),
            text: String::new(),
            tags: Vec::new(),
            len: 0,
        }
    }

    /// Parse the whole stream into a fragment.
    pub(crate) fn read(mut self) -> Result<DocumentFragment, RtfError> {
        self.expect_header()?;
        while let Some(token) = self.lexer.next_token()? {
            match token {
                Token::GroupOpen => self.open_group()?,
                Token::GroupClose => {
                    self.close_group()?;
                    if self.stack.is_empty() {
                        break;
                    }
                }
                Token::Control { word, param } => self.control(word, param)?,
                Token::Symbol(symbol) => self.symbol(symbol),
                Token::Hex(byte) => self.hex_char(byte),
                Token::Text(bytes) => self.text_bytes(bytes),
            }
        }
        // Unclosed groups at the end of input are tolerated.
        if self.state.destination == Destination::Picture {
            self.finish_picture()?;
        }
        self.end_line(LineEnding::None);
        let mut fragment = self.fragment;
        fragment.trim_trailing_empty_line();
        trace!(lines = fragment.lines().len(), "rtf import parsed");
        Ok(fragment)
    }

    fn error(&self, kind: RtfErrorKind) -> RtfError {
        RtfError::new(kind, self.lexer.offset())
    }

    fn expect_header(&mut self) -> Result<(), RtfError> {
        let missing = RtfError::new(RtfErrorKind::MissingHeader, 0);
        if self.lexer.next_token()? != Some(Token::GroupOpen) {
            return Err(missing);
        }
        match self.lexer.next_token()? {
            Some(Token::Control { word: "rtf", .. }) => {
                self.stack.push(self.state.clone());
                Ok(())
            }
            _ => Err(missing),
        }
    }

    fn open_group(&mut self) -> Result<(), RtfError> {
        if self.stack.len() >= MAX_DEPTH {
            return Err(self.error(RtfErrorKind::TooDeep));
        }
        self.stack.push(self.state.clone());
        self.state.ignorable = false;
        self.state.unicode_skip = 1;
        self.skip = 0;
        Ok(())
    }

    fn close_group(&mut self) -> Result<(), RtfError> {
        let closing = self.state.destination;
        let Some(parent) = self.stack.pop() else {
            return Ok(());
        };
        let leaving = parent.destination != closing;
        if closing == Destination::FontTable {
            self.commit_font();
        }
        if closing == Destination::Picture && leaving {
            self.finish_picture()?;
        }
        self.state = parent;
        self.skip = 0;
        if closing == Destination::FontTable && leaving {
            self.apply_default_font();
        }
        Ok(())
    }

    /// Drop the rest of the current group without looking at it.
    fn skip_group(&mut self) {
        self.lexer.skip_group();
        if let Some(parent) = self.stack.pop() {
            self.state = parent;
        }
        self.skip = 0;
    }

    fn control(&mut self, word: &str, param: Option<i32>) -> Result<(), RtfError> {
        match self.state.destination {
            Destination::Picture => {
                self.picture_control(word, param);
                return Ok(());
            }
            Destination::FontTable => {
                let ignorable = std::mem::take(&mut self.state.ignorable);
                match word {
                    "f" => {
                        self.commit_font();
                        self.font_id = param;
                    }
                    // `\panose`, `\falt` and friends would leak into the name.
                    w if ignorable || SKIPPED_DESTINATIONS.contains(&w) => self.skip_group(),
                    _ => {}
                }
                return Ok(());
            }
            Destination::ColorTable => {
                let value = param.unwrap_or(0).clamp(0, 255) as u8;
                match word {
                    "red" => self.color[0] = value,
                    "green" => self.color[1] = value,
                    "blue" => self.color[2] = value,
                    _ => return Ok(()),
                }
                self.color_set = true;
                return Ok(());
            }
            Destination::Text => {}
        }

        let ignorable = std::mem::take(&mut self.state.ignorable);
        let on = param != Some(0);
        let n = param.unwrap_or(0);
        let state = &mut self.state;
        match word {
            "deff" => self.default_font = param,
            "fonttbl" => state.destination = Destination::FontTable,
            "colortbl" => state.destination = Destination::ColorTable,
            "pict" => {
                state.destination = Destination::Picture;
                self.pict = PictState::default();
            }
            // Container for a `\pict`; its content is read as usual.
            "shppict" => {}
            w if SKIPPED_DESTINATIONS.contains(&w) => self.skip_group(),

            "plain" => state.format = self.base.clone(),
            "f" => {
                if let Some(name) = self.fonts.get(&n) {
                    state.format.font.name.clone_from(name);
                }
            }
            "fs" if n > 0 => state.format.font.size = n as f32 / 2.0,
            "b" => state.format.font.style.set(FontStyle::BOLD, on),
            "i" => state.format.font.style.set(FontStyle::ITALIC, on),
            "ul" => state.format.font.style.set(FontStyle::UNDERLINE, on),
            "ulnone" => state.format.font.style.remove(FontStyle::UNDERLINE),
            "strike" => state.format.font.style.set(FontStyle::STRIKEOUT, on),
            "cf" => {
                state.format.color = self
                    .colors
                    .get(usize::try_from(n).unwrap_or(0))
                    .copied()
                    .flatten()
                    .unwrap_or(self.base.color);
            }
            "cb" | "highlight" => {
                state.format.back_color = self
                    .colors
                    .get(usize::try_from(n).unwrap_or(0))
                    .copied()
                    .flatten();
            }
            "super" => state.format.text_position = TextPosition::Superscript,
            "sub" => state.format.text_position = TextPosition::Subscript,
            "nosupersub" => state.format.text_position = TextPosition::Normal,
            "up" => state.format.char_offset = param.unwrap_or(6) as f32 / 2.0,
            "dn" => state.format.char_offset = -(param.unwrap_or(6) as f32) / 2.0,
            "v" => state.format.visible = !on,

            "pard" => {
                state.paragraph = ParagraphFormat::default();
                state.left_indent = 0;
                state.first_indent = 0;
                state.line_spacing = 0;
                state.line_spacing_multiple = false;
                state.tab_kind = TabKind::Left;
            }
            "ql" | "qj" => state.paragraph.alignment = HorizontalAlignment::Left,
            "qc" => state.paragraph.alignment = HorizontalAlignment::Center,
            "qr" => state.paragraph.alignment = HorizontalAlignment::Right,
            "li" => {
                state.left_indent = n;
                state.update_indents();
            }
            "fi" => {
                state.first_indent = n;
                state.update_indents();
            }
            "ri" => state.paragraph.right_indent = twips_to_points(n),
            "sb" => state.paragraph.spacing_before = twips_to_points(n),
            "sa" => state.paragraph.spacing_after = twips_to_points(n),
            "sl" => {
                state.line_spacing = n;
                state.update_line_spacing();
            }
            "slmult" => {
                state.line_spacing_multiple = on;
                state.update_line_spacing();
            }
            "tqc" => state.tab_kind = TabKind::Center,
            "tqr" => state.tab_kind = TabKind::Right,
            "tqdec" => state.tab_kind = TabKind::Decimal,
            "tx" => {
                let kind = std::mem::take(&mut state.tab_kind);
                state
                    .paragraph
                    .tab_stops
                    .add(TabStop::new(twips_to_points(n), kind));
            }

            "par" | "line" => self.end_line(LineEnding::Rich),
            "tab" => self.special_char('\t'),
            "emdash" => self.special_char('\u{2014}'),
            "endash" => self.special_char('\u{2013}'),
            "lquote" => self.special_char('\u{2018}'),
            "rquote" => self.special_char('\u{2019}'),
            "ldblquote" => self.special_char('\u{201C}'),
            "rdblquote" => self.special_char('\u{201D}'),
            "bullet" => self.special_char('\u{2022}'),
            "uc" => state.unicode_skip = usize::try_from(n).unwrap_or(0),
            "u" => {
                if let Some(n) = param {
                    self.unicode(n);
                }
            }
            _ if ignorable => self.skip_group(),
            _ => {}
        }
        Ok(())
    }

    fn picture_control(&mut self, word: &str, param: Option<i32>) {
        if let Some(kind) = PictureKind::from_rtf_keyword(word) {
            self.pict.kind = Some(kind);
            return;
        }
        match word {
            "picwgoal" => self.pict.goal_width = param,
            "pichgoal" => self.pict.goal_height = param,
            _ => {}
        }
    }

    fn symbol(&mut self, symbol: u8) {
        match symbol {
            b'\\' | b'{' | b'}' => self.special_char(char::from(symbol)),
            b'~' => self.special_char('\u{A0}'),
            b'_' => self.special_char('\u{2011}'),
            b'*' => self.state.ignorable = true,
            // Optional hyphen: a line break opportunity, not a character.
            _ => {}
        }
    }

    fn hex_char(&mut self, byte: u8) {
        match self.state.destination {
            Destination::FontTable => self.font_name.push(decode_cp1252(byte)),
            Destination::Text => self.special_char(decode_cp1252(byte)),
            Destination::ColorTable | Destination::Picture => {}
        }
    }

    fn text_bytes(&mut self, bytes: &[u8]) {
        match self.state.destination {
            Destination::FontTable => {
                for &b in bytes {
                    if b == b';' {
                        self.commit_font();
                    } else {
                        self.font_name.push(decode_cp1252(b));
                    }
                }
            }
            Destination::ColorTable => {
                for _ in bytes.iter().filter(|&&b| b == b';') {
                    let entry = self
                        .color_set
                        .then(|| Color::rgb(self.color[0], self.color[1], self.color[2]));
                    self.colors.push(entry);
                    self.color = [0; 3];
                    self.color_set = false;
                }
            }
            Destination::Picture => self
                .pict
                .hex
                .extend(bytes.iter().filter(|b| b.is_ascii_hexdigit())),
            Destination::Text => {
                for &b in bytes {
                    self.special_char(decode_cp1252(b));
                }
            }
        }
    }

    /// Append a character unless it is fallback text for a `\u` escape.
    fn special_char(&mut self, ch: char) {
        if self.skip > 0 {
            self.skip -= 1;
            return;
        }
        self.push_char(ch);
    }

    fn unicode(&mut self, value: i32) {
        let unit = if value < 0 { value + 0x1_0000 } else { value };
        let unit = u32::try_from(unit).unwrap_or(0xFFFD);
        match unit {
            0xD800..=0xDBFF => self.high_surrogate = Some(unit),
            0xDC00..=0xDFFF => {
                let ch = self
                    .high_surrogate
                    .take()
                    .and_then(|hi| char::from_u32(0x1_0000 + ((hi - 0xD800) << 10) + (unit - 0xDC00)))
                    .unwrap_or(char::REPLACEMENT_CHARACTER);
                self.push_char(ch);
            }
            _ => {
                self.high_surrogate = None;
                self.push_char(char::from_u32(unit).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
        }
        self.skip = self.state.unicode_skip;
    }

    fn push_char(&mut self, ch: char) {
        // The placeholder is reserved for pictures.
        let ch = if ch == PICTURE_PLACEHOLDER {
            char::REPLACEMENT_CHARACTER
        } else {
            ch
        };
        let format = &self.state.format;
        match self.tags.last_mut() {
            Some(tag) if tag.picture.is_none() && tag.format == *format => tag.length += 1,
            _ => self.tags.push(LineTag::new(self.len, 1, format.clone())),
        }
        self.text.push(ch);
        self.len += 1;
    }

    fn end_line(&mut self, ending: LineEnding) {
        let tags = if self.tags.is_empty() {
            vec![LineTag::new(0, 0, self.state.format.clone())]
        } else {
            std::mem::take(&mut self.tags)
        };
        self.fragment.push_line(FragmentLine {
            text: std::mem::take(&mut self.text),
            tags,
            ending,
            paragraph: self.state.paragraph.clone(),
            starts_line: true,
        });
        self.len = 0;
    }

    fn commit_font(&mut self) {
        let name = self.font_name.trim();
        if let Some(id) = self.font_id.take() {
            if !name.is_empty() {
                self.fonts.insert(id, name.to_owned());
            }
        }
        self.font_name.clear();
    }

    /// Once the font table is known, `\deff` names the base font.
    fn apply_default_font(&mut self) {
        let Some(name) = self.default_font.and_then(|id| self.fonts.get(&id)) else {
            return;
        };
        self.base.font.name.clone_from(name);
        self.state.format.font.name.clone_from(name);
        for state in &mut self.stack {
            state.format.font.name.clone_from(name);
        }
    }

    fn finish_picture(&mut self) -> Result<(), RtfError> {
        let pict = std::mem::take(&mut self.pict);
        let Some(kind) = pict.kind else {
            // Formats without a decoder are dropped.
            return Ok(());
        };
        if pict.hex.len() % 2 != 0 {
            return Err(self.error(RtfErrorKind::InvalidHex));
        }
        let data = pict
            .hex
            .chunks_exact(2)
            .map(|pair| hex_pair(pair[0], pair[1]))
            .collect::<Option<Vec<u8>>>()
            .ok_or_else(|| self.error(RtfErrorKind::InvalidHex))?;
        let picture = self
            .decoder
            .decode(kind, data, pict.goal_width, pict.goal_height)
            .map_err(|_| self.error(RtfErrorKind::InvalidPicture))?;
        self.tags
            .push(LineTag::picture(self.len, picture, self.state.format.clone()));
        self.text.push(PICTURE_PLACEHOLDER);
        self.len += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::picture::RawPictureDecoder;

    fn read(input: &str) -> DocumentFragment {
        RtfReader::new(input.as_bytes(), &TagFormat::default(), &RawPictureDecoder)
            .read()
            .unwrap()
    }

    fn read_err(input: &str) -> RtfErrorKind {
        RtfReader::new(input.as_bytes(), &TagFormat::default(), &RawPictureDecoder)
            .read()
            .unwrap_err()
            .kind()
    }

    #[test]
    fn test_font_table_and_size() {
        let frag = read(r"{\rtf1\ansi{\fonttbl{\f0\fnil\fcharset0 Arial;}}\f0\fs20 Hi\par}");
        assert_eq!(frag.lines().len(), 1);
        let line = &frag.lines()[0];
        assert_eq!(line.text, "Hi");
        assert_eq!(line.tags[0].format.font.name, "Arial");
        assert!((line.tags[0].format.font.size - 10.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_font_table_skips_panose_and_alternates() {
        let frag = read(concat!(
            r"{\rtf1\ansi\deff0{\fonttbl",
            r"{\f0\froman\fprq2\fcharset0{\*\panose 02020603050405020304}Times New Roman{\*\falt Times};}",
            r"{\f1\fswiss\fcharset0{\*\panose 020b0604020202020204}Arial;}}",
            r"\f1 Hi\f0 there}"
        ));
        let tags = &frag.lines()[0].tags;
        assert_eq!(tags[0].format.font.name, "Arial");
        assert_eq!(tags[1].format.font.name, "Times New Roman");
    }

    #[test]
    fn test_default_font_applies_after_table() {
        let frag = read(r"{\rtf1\deff1{\fonttbl{\f0 Arial;}{\f1 Courier New;}}plain}");
        assert_eq!(frag.lines()[0].tags[0].format.font.name, "Courier New");
    }

    #[test]
    fn test_groups_restore_format() {
        let frag = read(r"{\rtf1 a{\b b}c}");
        let line = &frag.lines()[0];
        assert_eq!(line.text, "abc");
        assert_eq!(line.tags.len(), 3);
        assert!(line.tags[1].format.font.bold());
        assert!(!line.tags[2].format.font.bold());
    }

    #[test]
    fn test_color_table() {
        let frag = read(r"{\rtf1{\colortbl ;\red255\green0\blue0;}\cf1 red\cf0 auto}");
        let tags = &frag.lines()[0].tags;
        assert_eq!(tags[0].format.color, Color::rgb(255, 0, 0));
        assert_eq!(tags[1].format.color, TagFormat::default().color);
    }

    #[test]
    fn test_unicode_skips_fallback() {
        let frag = read(r"{\rtf1 caf\u233?\uc2\u8364 EU!}");
        assert_eq!(frag.lines()[0].text, "caf\u{e9}\u{20ac}!");

        let frag = read(r"{\rtf1 \u-10179?\u-8704?}");
        assert_eq!(frag.lines()[0].text, "\u{1F600}");
    }

    #[test]
    fn test_uc_resets_in_new_group() {
        let frag = read(r"{\rtf1\uc2 {\u233 xy}z}");
        assert_eq!(frag.lines()[0].text, "\u{e9}yz");
    }

    #[test]
    fn test_paragraph_controls() {
        let frag = read(r"{\rtf1\pard\qc\li720\fi-360\sb120\tqr\tx2880 one\par\pard two}");
        let first = &frag.lines()[0].paragraph;
        assert_eq!(first.alignment, HorizontalAlignment::Center);
        assert!((first.indent - 18.0).abs() < f32::EPSILON);
        assert!((first.hanging_indent - 18.0).abs() < f32::EPSILON);
        assert!((first.spacing_before - 6.0).abs() < f32::EPSILON);
        let tab = first.tab_stops.get(0).unwrap();
        assert_eq!(tab.kind, TabKind::Right);
        assert!((tab.position - 144.0).abs() < f32::EPSILON);
        assert_eq!(frag.lines()[1].paragraph, ParagraphFormat::default());
    }

    #[test]
    fn test_skipped_destinations() {
        let frag = read(r"{\rtf1{\stylesheet{\s0 Normal;}}{\*\unknown junk}{\info{\title T}}body}");
        assert_eq!(frag.lines()[0].text, "body");
    }

    #[test]
    fn test_special_characters() {
        let frag = read(r"{\rtf1 a\tab b\emdash\ldblquote q\rdblquote\~\{\}\\\'e9}");
        assert_eq!(
            frag.lines()[0].text,
            "a\tb\u{2014}\u{201C}q\u{201D}\u{A0}{}\\\u{e9}"
        );
    }

    #[test]
    fn test_picture() {
        let frag = read(r"{\rtf1 x{\pict\pngblip\picwgoal300\pichgoal150 0a0B0c}y}");
        let line = &frag.lines()[0];
        assert_eq!(line.text, format!("x{PICTURE_PLACEHOLDER}y"));
        let pic = line.tags[1].picture.as_ref().unwrap();
        assert_eq!(pic.data(), &[0x0a, 0x0b, 0x0c]);
        assert!((pic.width() - 20.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_sub_and_superscript() {
        let frag = read(r"{\rtf1 x\super 2\nosupersub y\sub i}");
        let tags = &frag.lines()[0].tags;
        assert_eq!(tags[1].format.text_position, TextPosition::Superscript);
        assert_eq!(tags[2].format.text_position, TextPosition::Normal);
        assert_eq!(tags[3].format.text_position, TextPosition::Subscript);
    }

    #[test]
    fn test_unclosed_group_is_tolerated() {
        let frag = read(r"{\rtf1 open{\b bold");
        assert_eq!(frag.lines()[0].text, "openbold");
    }

    #[test]
    fn test_malformed_input() {
        assert_eq!(read_err("plain text"), RtfErrorKind::MissingHeader);
        assert_eq!(read_err(r"{\pard x}"), RtfErrorKind::MissingHeader);
        assert_eq!(read_err(r"{\rtf1 {\pict\pngblip 0g}}"), RtfErrorKind::InvalidHex);
        assert_eq!(read_err(r"{\rtf1 x\"), RtfErrorKind::UnexpectedEof);
        let deep = format!(r"{{\rtf1 {}", "{".repeat(MAX_DEPTH + 1));
        assert_eq!(read_err(&deep), RtfErrorKind::TooDeep);
    }
}
