//! Document configuration.

use crate::color::Color;
use crate::style::Font;

/// Default undo history depth, in user-visible undo units.
pub const DEFAULT_MAX_UNDO_DEPTH: usize = 1000;

/// Document configuration options.
///
/// These options control layout and editing behaviour when creating a
/// [`Document`](crate::Document).
#[derive(Clone, Debug)]
pub struct DocumentOptions {
    /// Allow more than one line; single-line documents reject line breaks.
    pub multiline: bool,
    /// Wrap lines that are wider than the viewport.
    pub word_wrap: bool,
    /// Scan paragraphs for URLs and mark them as links.
    pub detect_urls: bool,
    /// Font for text inserted without explicit formatting.
    pub default_font: Font,
    /// Foreground color for text inserted without explicit formatting.
    pub default_color: Color,
    /// Surface background (used when deciding whether to emit an RTF color table).
    pub back_color: Color,
    /// Interval between implicit tab stops, in points.
    pub default_tab_width: f32,
    /// Oldest undo units beyond this depth are dropped.
    pub max_undo_depth: usize,
    /// Viewport width in pixels.
    pub viewport_width: f32,
    /// Viewport height in pixels.
    pub viewport_height: f32,
    /// Paint the selection highlight.
    pub show_selection: bool,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            multiline: true,
            word_wrap: false,
            detect_urls: false,
            default_font: Font::default(),
            default_color: Color::BLACK,
            back_color: Color::WHITE,
            default_tab_width: 36.0,
            max_undo_depth: DEFAULT_MAX_UNDO_DEPTH,
            viewport_width: 400.0,
            viewport_height: 300.0,
            show_selection: true,
        }
    }
}

impl DocumentOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn multiline(mut self, multiline: bool) -> Self {
        self.multiline = multiline;
        self
    }

    #[must_use]
    pub fn word_wrap(mut self, wrap: bool) -> Self {
        self.word_wrap = wrap;
        self
    }

    #[must_use]
    pub fn detect_urls(mut self, detect: bool) -> Self {
        self.detect_urls = detect;
        self
    }

    #[must_use]
    pub fn default_font(mut self, font: Font) -> Self {
        self.default_font = font;
        self
    }

    #[must_use]
    pub fn default_color(mut self, color: Color) -> Self {
        self.default_color = color;
        self
    }

    #[must_use]
    pub fn max_undo_depth(mut self, depth: usize) -> Self {
        self.max_undo_depth = depth;
        self
    }

    #[must_use]
    pub fn viewport(mut self, width: f32, height: f32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }
}
