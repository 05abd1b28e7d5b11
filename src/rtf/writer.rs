//! RTF export.
//!
//! Two passes over a fragment: the first collects the font and color
//! tables, the second writes the body. Like a terminal writer that tracks
//! the current SGR state, the body writer remembers the last character and
//! paragraph formats it emitted and writes only the control words that
//! changed.

use crate::color::Color;
use crate::document::{DocumentFragment, HorizontalAlignment, ParagraphFormat, TabKind};
use crate::picture::Picture;
use crate::style::{FontStyle, TagFormat, TextPosition};
use std::fmt::Write as _;

fn points_to_twips(points: f32) -> i32 {
    (points * 20.0).round() as i32
}

fn half_points(points: f32) -> i32 {
    (points * 2.0).round() as i32
}

/// Everything but the tab stops matches.
fn same_layout(a: &ParagraphFormat, b: &ParagraphFormat) -> bool {
    a.alignment == b.alignment
        && a.indent == b.indent
        && a.hanging_indent == b.hanging_indent
        && a.right_indent == b.right_indent
        && a.spacing_before == b.spacing_before
        && a.spacing_after == b.spacing_after
        && a.line_spacing == b.line_spacing
        && a.line_spacing_multiple == b.line_spacing_multiple
}

pub(crate) struct RtfWriter<'a> {
    out: String,
    fonts: Vec<&'a str>,
    colors: Vec<Color>,
    color_table: bool,
    foreground: Color,
    format: Option<&'a TagFormat>,
    paragraph: Option<&'a ParagraphFormat>,
    /// The last thing written was a control word that needs a delimiter
    /// before literal text.
    delimit: bool,
}

impl<'a> RtfWriter<'a> {
    /// Collect the tables for `fragment`. `foreground` is the color text
    /// has when no `\cf` is in effect.
    pub(crate) fn new(fragment: &'a DocumentFragment, foreground: Color) -> Self {
        let mut fonts: Vec<&str> = Vec::new();
        let mut colors: Vec<Color> = Vec::new();
        let mut has_back = false;
        let runs = fragment
            .lines()
            .iter()
            .flat_map(|l| l.tags.iter())
            .filter(|t| t.length > 0);
        for tag in runs {
            let f = &tag.format;
            if !fonts.contains(&f.font.name.as_str()) {
                fonts.push(&f.font.name);
            }
            if !colors.contains(&f.color) {
                colors.push(f.color);
            }
            if let Some(back) = f.back_color {
                has_back = true;
                if !colors.contains(&back) {
                    colors.push(back);
                }
            }
        }
        if fonts.is_empty() {
            let first = fragment.lines().first().and_then(|l| l.tags.first());
            fonts.push(first.map_or("Microsoft Sans Serif", |t| t.format.font.name.as_str()));
        }
        let color_table =
            has_back || colors.len() > 1 || colors.first().is_some_and(|&c| c != foreground);

        Self {
            out: String::new(),
            fonts,
            colors,
            color_table,
            foreground,
            format: None,
            paragraph: None,
            delimit: false,
        }
    }

    /// Serialize `fragment` and return the RTF text.
    pub(crate) fn write(mut self, fragment: &'a DocumentFragment) -> String {
        self.header();
        let count = fragment.lines().len();
        for (i, line) in fragment.lines().iter().enumerate() {
            self.paragraph_delta(&line.paragraph);
            let chars: Vec<char> = line.text.chars().collect();
            for tag in line.tags.iter().filter(|t| t.length > 0) {
                self.format_delta(&tag.format);
                if let Some(picture) = &tag.picture {
                    self.picture(picture);
                } else {
                    let end = (tag.start + tag.length).min(chars.len());
                    for &ch in chars.get(tag.start..end).unwrap_or_default() {
                        self.text_char(ch);
                    }
                }
            }
            if i + 1 < count {
                self.out.push_str("\\par\n");
                self.delimit = false;
            }
        }
        self.out.push('}');
        self.out
    }

    fn header(&mut self) {
        self.out
            .push_str("{\\rtf1\\ansi\\ansicpg1252\\deff0\\deflang1033{\\fonttbl");
        for (i, name) in self.fonts.iter().enumerate() {
            let _ = write!(self.out, "{{\\f{i}\\fnil\\fcharset0 ");
            for ch in name.chars() {
                if matches!(ch, '\\' | '{' | '}') {
                    self.out.push('\\');
                }
                self.out.push(ch);
            }
            self.out.push_str(";}");
        }
        self.out.push_str("}\n");
        if self.color_table {
            self.out.push_str("{\\colortbl ;");
            for c in &self.colors {
                let _ = write!(self.out, "\\red{}\\green{}\\blue{};", c.r, c.g, c.b);
            }
            self.out.push_str("}\n");
        }
        self.out.push_str("{\\*\\generator richdoc;}\\viewkind4\\uc1");
        self.delimit = true;
    }

    fn word(&mut self, word: &str) {
        self.out.push('\\');
        self.out.push_str(word);
        self.delimit = true;
    }

    fn word_param(&mut self, word: &str, param: i32) {
        let _ = write!(self.out, "\\{word}{param}");
        self.delimit = true;
    }

    fn text_char(&mut self, ch: char) {
        match ch {
            '\t' => return self.word("tab"),
            '\u{A0}' => {
                // Control symbols take no delimiter.
                self.out.push_str("\\~");
                self.delimit = false;
                return;
            }
            _ => {}
        }
        if self.delimit {
            self.out.push(' ');
            self.delimit = false;
        }
        match ch {
            '\\' | '{' | '}' => {
                self.out.push('\\');
                self.out.push(ch);
            }
            c if c.is_ascii() => self.out.push(c),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    let _ = write!(self.out, "\\u{}?", *unit as i16);
                }
            }
        }
    }

    fn font_index(&self, name: &str) -> usize {
        self.fonts.iter().position(|f| *f == name).unwrap_or(0)
    }

    fn color_index(&self, color: Color) -> usize {
        self.colors.iter().position(|c| *c == color).map_or(0, |i| i + 1)
    }

    /// Emit the control words turning the current format into `format`.
    fn format_delta(&mut self, format: &'a TagFormat) {
        let initial = TagFormat {
            font: crate::style::Font::new("", 0.0),
            color: self.foreground,
            ..TagFormat::default()
        };
        let prev = self.format.cloned().unwrap_or(initial);
        self.format = Some(format);

        if prev.font.name != format.font.name {
            let index = self.font_index(&format.font.name);
            self.word_param("f", index as i32);
        }
        if half_points(prev.font.size) != half_points(format.font.size) {
            self.word_param("fs", half_points(format.font.size));
        }
        let styles = [
            (FontStyle::BOLD, "b", "b0"),
            (FontStyle::ITALIC, "i", "i0"),
            (FontStyle::STRIKEOUT, "strike", "strike0"),
            (FontStyle::UNDERLINE, "ul", "ulnone"),
        ];
        for (flag, on, off) in styles {
            let now = format.font.style.contains(flag);
            if prev.font.style.contains(flag) != now {
                self.word(if now { on } else { off });
            }
        }
        if self.color_table && prev.color != format.color {
            let index = self.color_index(format.color);
            self.word_param("cf", index as i32);
        }
        if prev.back_color != format.back_color {
            let index = format.back_color.map_or(0, |c| self.color_index(c));
            self.word_param("cb", index as i32);
        }
        if prev.text_position != format.text_position {
            self.word(match format.text_position {
                TextPosition::Normal => "nosupersub",
                TextPosition::Superscript => "super",
                TextPosition::Subscript => "sub",
            });
        }
        if half_points(prev.char_offset) != half_points(format.char_offset) {
            let offset = half_points(format.char_offset);
            if offset < 0 {
                self.word_param("dn", -offset);
            } else {
                self.word_param("up", offset);
            }
        }
        if prev.visible != format.visible {
            self.word(if format.visible { "v0" } else { "v" });
        }
    }

    /// Emit the paragraph controls for `paragraph` if it differs from the
    /// previous line's. New trailing tab stops are appended without a reset.
    fn paragraph_delta(&mut self, paragraph: &'a ParagraphFormat) {
        let prev = self.paragraph.replace(paragraph);
        match prev {
            Some(prev) if prev == paragraph => {}
            Some(prev)
                if same_layout(prev, paragraph)
                    && prev.tab_stops.len() <= paragraph.tab_stops.len()
                    && prev
                        .tab_stops
                        .iter()
                        .zip(paragraph.tab_stops.iter())
                        .all(|(a, b)| a == b) =>
            {
                for stop in paragraph.tab_stops.iter().skip(prev.tab_stops.len()) {
                    self.tab_stop(stop.kind, stop.position);
                }
            }
            _ => self.full_paragraph(paragraph),
        }
    }

    fn full_paragraph(&mut self, p: &ParagraphFormat) {
        self.word("pard");
        match p.alignment {
            HorizontalAlignment::Left => {}
            HorizontalAlignment::Center => self.word("qc"),
            HorizontalAlignment::Right => self.word("qr"),
        }
        let left = points_to_twips(p.indent + p.hanging_indent);
        let first = points_to_twips(-p.hanging_indent);
        if left != 0 {
            self.word_param("li", left);
        }
        if first != 0 {
            self.word_param("fi", first);
        }
        if p.right_indent != 0.0 {
            self.word_param("ri", points_to_twips(p.right_indent));
        }
        if p.spacing_before != 0.0 {
            self.word_param("sb", points_to_twips(p.spacing_before));
        }
        if p.spacing_after != 0.0 {
            self.word_param("sa", points_to_twips(p.spacing_after));
        }
        if p.line_spacing > 0.0 {
            if p.line_spacing_multiple {
                self.word_param("sl", (p.line_spacing * 240.0).round() as i32);
                self.word_param("slmult", 1);
            } else {
                self.word_param("sl", points_to_twips(p.line_spacing));
                self.word_param("slmult", 0);
            }
        }
        for stop in &p.tab_stops {
            self.tab_stop(stop.kind, stop.position);
        }
    }

    fn tab_stop(&mut self, kind: TabKind, position: f32) {
        match kind {
            TabKind::Left => {}
            TabKind::Center => self.word("tqc"),
            TabKind::Right => self.word("tqr"),
            TabKind::Decimal => self.word("tqdec"),
        }
        self.word_param("tx", points_to_twips(position));
    }

    fn picture(&mut self, picture: &Picture) {
        let _ = write!(
            self.out,
            "{{\\pict\\{}\\picwgoal{}\\pichgoal{}\n",
            picture.kind().rtf_keyword(),
            picture.width_twips(),
            picture.height_twips()
        );
        for byte in picture.data() {
            let _ = write!(self.out, "{byte:02X}");
        }
        self.out.push('}');
        self.delimit = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentFragment, FragmentLine, LineEnding, LineTag};
    use crate::style::Font;

    fn line(text: &str, tags: Vec<LineTag>, paragraph: ParagraphFormat) -> FragmentLine {
        FragmentLine {
            text: text.to_owned(),
            tags,
            ending: LineEnding::Hard,
            paragraph,
            starts_line: true,
        }
    }

    fn arial() -> TagFormat {
        TagFormat::new(Font::new("Arial", 10.0), Color::BLACK)
    }

    fn write(frag: &DocumentFragment) -> String {
        RtfWriter::new(frag, Color::BLACK).write(frag)
    }

    #[test]
    fn test_minimal_output() {
        let mut frag = DocumentFragment::new();
        frag.push_line(line(
            "Hi",
            vec![LineTag::new(0, 2, arial())],
            ParagraphFormat::default(),
        ));
        assert_eq!(
            write(&frag),
            "{\\rtf1\\ansi\\ansicpg1252\\deff0\\deflang1033{\\fonttbl{\\f0\\fnil\\fcharset0 Arial;}}\n\
             {\\*\\generator richdoc;}\\viewkind4\\uc1\\pard\\f0\\fs20 Hi}"
        );
    }

    #[test]
    fn test_only_changes_are_written() {
        let bold = TagFormat {
            font: Font::new("Arial", 10.0).with_style(FontStyle::BOLD),
            ..arial()
        };
        let mut frag = DocumentFragment::new();
        frag.push_line(line(
            "abc",
            vec![
                LineTag::new(0, 1, arial()),
                LineTag::new(1, 1, bold),
                LineTag::new(2, 1, arial()),
            ],
            ParagraphFormat::default(),
        ));
        let out = write(&frag);
        assert!(out.ends_with("\\pard\\f0\\fs20 a\\b b\\b0 c}"));
        assert_eq!(out.matches("\\fs20").count(), 1);
    }

    #[test]
    fn test_color_table_only_when_needed() {
        let mut frag = DocumentFragment::new();
        frag.push_line(line(
            "x",
            vec![LineTag::new(0, 1, arial())],
            ParagraphFormat::default(),
        ));
        assert!(!write(&frag).contains("colortbl"));

        let red = TagFormat {
            color: Color::RED,
            ..arial()
        };
        let mut frag = DocumentFragment::new();
        frag.push_line(line(
            "x",
            vec![LineTag::new(0, 1, red)],
            ParagraphFormat::default(),
        ));
        let out = write(&frag);
        assert!(out.contains("{\\colortbl ;\\red255\\green0\\blue0;}"));
        assert!(out.contains("\\cf1 x"));
    }

    #[test]
    fn test_escapes() {
        let mut frag = DocumentFragment::new();
        frag.push_line(line(
            "{a}\\\t\u{e9}\u{1F600}",
            vec![LineTag::new(0, 7, arial())],
            ParagraphFormat::default(),
        ));
        let out = write(&frag);
        assert!(out.ends_with(" \\{a\\}\\\\\\tab \\u233?\\u-10179?\\u-8704?}"));
        assert!(out.is_ascii());
    }

    #[test]
    fn test_tab_stops_appended_without_reset() {
        let mut first = ParagraphFormat::default();
        first.tab_stops.add(crate::document::TabStop::new(36.0, TabKind::Left));
        let mut second = first.clone();
        second
            .tab_stops
            .add(crate::document::TabStop::new(72.0, TabKind::Right));

        let mut frag = DocumentFragment::new();
        frag.push_line(line("a", vec![LineTag::new(0, 1, arial())], first));
        frag.push_line(line("b", vec![LineTag::new(0, 1, arial())], second));
        let out = write(&frag);
        assert_eq!(out.matches("\\pard").count(), 1);
        assert!(out.contains("\\par\n\\tqr\\tx1440 b"));
    }
}
