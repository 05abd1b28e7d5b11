//! Character formatting carried by tags.
//!
//! This module provides types for describing how a run of text looks:
//!
//! - [`FontStyle`]: Bitflags for bold, italic, underline, strikeout
//! - [`Font`]: Face name, point size and style flags
//! - [`TagFormat`]: Complete formatting of one tag (font, colors, position, visibility)
//! - [`TextFormat`]: Sparse set of overrides applied by `Document::format_text`
//!
//! # Examples
//!
//! ```
//! use richdoc::{Color, Font, FontStyle, TagFormat, TextFormat};
//!
//! let base = TagFormat::new(Font::new("Arial", 10.0), Color::BLACK);
//!
//! // Only the flagged fields change.
//! let bolder = TextFormat::new().style_on(FontStyle::BOLD).color(Color::RED);
//! let applied = bolder.apply(&base);
//! assert!(applied.font.style.contains(FontStyle::BOLD));
//! assert_eq!(applied.font.name, "Arial");
//! assert_eq!(applied.color, Color::RED);
//! ```

use crate::color::Color;
use crate::error::{Error, Result};
use bitflags::bitflags;

bitflags! {
    /// Font style flags.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
    pub struct FontStyle: u8 {
        const BOLD      = 0x01;
        const ITALIC    = 0x02;
        const UNDERLINE = 0x04;
        const STRIKEOUT = 0x08;
    }
}

bitflags! {
    /// Which fields of a [`TextFormat`] carry a value.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
    pub struct FormatSpecified: u16 {
        const FONT_NAME     = 0x001;
        const FONT_SIZE     = 0x002;
        const FONT_STYLE    = 0x004;
        const COLOR         = 0x008;
        const BACK_COLOR    = 0x010;
        const TEXT_POSITION = 0x020;
        const CHAR_OFFSET   = 0x040;
        const VISIBILITY    = 0x080;
        /// Whole font (name, size and style).
        const FONT = Self::FONT_NAME.bits() | Self::FONT_SIZE.bits() | Self::FONT_STYLE.bits();
    }
}

/// Font face, point size and style.
#[derive(Clone, Debug, PartialEq)]
pub struct Font {
    pub name: String,
    /// Size in points.
    pub size: f32,
    pub style: FontStyle,
}

impl Font {
    /// Create a regular-style font.
    #[must_use]
    pub fn new(name: impl Into<String>, size: f32) -> Self {
        Self {
            name: name.into(),
            size,
            style: FontStyle::empty(),
        }
    }

    /// Return the font with the given style flags.
    #[must_use]
    pub fn with_style(mut self, style: FontStyle) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub fn bold(&self) -> bool {
        self.style.contains(FontStyle::BOLD)
    }

    #[must_use]
    pub fn italic(&self) -> bool {
        self.style.contains(FontStyle::ITALIC)
    }

    #[must_use]
    pub fn underline(&self) -> bool {
        self.style.contains(FontStyle::UNDERLINE)
    }

    #[must_use]
    pub fn strikeout(&self) -> bool {
        self.style.contains(FontStyle::STRIKEOUT)
    }
}

impl Default for Font {
    fn default() -> Self {
        Self::new("Microsoft Sans Serif", 8.25)
    }
}

/// Vertical placement of a run relative to the baseline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextPosition {
    #[default]
    Normal,
    Superscript,
    Subscript,
}

impl TryFrom<i32> for TextPosition {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Self::Normal),
            1 => Ok(Self::Superscript),
            2 => Ok(Self::Subscript),
            _ => Err(Error::InvalidEnumValue {
                what: "text position",
                value,
            }),
        }
    }
}

/// Complete formatting of one tag.
#[derive(Clone, Debug, PartialEq)]
pub struct TagFormat {
    pub font: Font,
    pub color: Color,
    /// Background fill; `None` paints nothing behind the run.
    pub back_color: Option<Color>,
    pub text_position: TextPosition,
    /// Baseline shift in points, positive moves up.
    pub char_offset: f32,
    pub visible: bool,
}

impl TagFormat {
    /// Create a visible, normally positioned format.
    #[must_use]
    pub fn new(font: Font, color: Color) -> Self {
        Self {
            font,
            color,
            back_color: None,
            text_position: TextPosition::Normal,
            char_offset: 0.0,
            visible: true,
        }
    }
}

impl Default for TagFormat {
    fn default() -> Self {
        Self::new(Font::default(), Color::BLACK)
    }
}

/// Sparse set of formatting overrides.
///
/// Every field is optional; [`TextFormat::specified`] reports which ones are
/// set and [`TextFormat::apply`] only touches those.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextFormat {
    pub font_name: Option<String>,
    pub font_size: Option<f32>,
    /// Style flags to switch on.
    pub style_on: FontStyle,
    /// Style flags to switch off.
    pub style_off: FontStyle,
    pub color: Option<Color>,
    pub back_color: Option<Option<Color>>,
    pub text_position: Option<TextPosition>,
    pub char_offset: Option<f32>,
    pub visible: Option<bool>,
}

impl TextFormat {
    /// Empty override set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override every font field with `font`.
    #[must_use]
    pub fn font(mut self, font: &Font) -> Self {
        self.font_name = Some(font.name.clone());
        self.font_size = Some(font.size);
        self.style_on = font.style;
        self.style_off = FontStyle::all() - font.style;
        self
    }

    #[must_use]
    pub fn font_name(mut self, name: impl Into<String>) -> Self {
        self.font_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn font_size(mut self, size: f32) -> Self {
        self.font_size = Some(size);
        self
    }

    #[must_use]
    pub fn style_on(mut self, style: FontStyle) -> Self {
        self.style_on |= style;
        self.style_off -= style;
        self
    }

    #[must_use]
    pub fn style_off(mut self, style: FontStyle) -> Self {
        self.style_off |= style;
        self.style_on -= style;
        self
    }

    #[must_use]
    pub fn color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    #[must_use]
    pub fn back_color(mut self, color: Option<Color>) -> Self {
        self.back_color = Some(color);
        self
    }

    #[must_use]
    pub fn text_position(mut self, position: TextPosition) -> Self {
        self.text_position = Some(position);
        self
    }

    #[must_use]
    pub fn char_offset(mut self, offset: f32) -> Self {
        self.char_offset = Some(offset);
        self
    }

    #[must_use]
    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    /// Flags naming the fields that carry a value.
    #[must_use]
    pub fn specified(&self) -> FormatSpecified {
        let mut flags = FormatSpecified::empty();
        flags.set(FormatSpecified::FONT_NAME, self.font_name.is_some());
        flags.set(FormatSpecified::FONT_SIZE, self.font_size.is_some());
        flags.set(
            FormatSpecified::FONT_STYLE,
            !(self.style_on.is_empty() && self.style_off.is_empty()),
        );
        flags.set(FormatSpecified::COLOR, self.color.is_some());
        flags.set(FormatSpecified::BACK_COLOR, self.back_color.is_some());
        flags.set(FormatSpecified::TEXT_POSITION, self.text_position.is_some());
        flags.set(FormatSpecified::CHAR_OFFSET, self.char_offset.is_some());
        flags.set(FormatSpecified::VISIBILITY, self.visible.is_some());
        flags
    }

    /// True when no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specified().is_empty()
    }

    /// Produce `base` with the specified fields overridden.
    #[must_use]
    pub fn apply(&self, base: &TagFormat) -> TagFormat {
        let mut out = base.clone();
        if let Some(name) = &self.font_name {
            out.font.name.clone_from(name);
        }
        if let Some(size) = self.font_size {
            out.font.size = size;
        }
        out.font.style = (out.font.style | self.style_on) - self.style_off;
        if let Some(color) = self.color {
            out.color = color;
        }
        if let Some(back) = self.back_color {
            out.back_color = back;
        }
        if let Some(position) = self.text_position {
            out.text_position = position;
        }
        if let Some(offset) = self.char_offset {
            out.char_offset = offset;
        }
        if let Some(visible) = self.visible {
            out.visible = visible;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specified_tracks_fields() {
        let fmt = TextFormat::new().color(Color::RED).visible(false);
        assert_eq!(
            fmt.specified(),
            FormatSpecified::COLOR | FormatSpecified::VISIBILITY
        );
        assert!(TextFormat::new().is_empty());
    }

    #[test]
    fn test_style_on_off_cancel() {
        let fmt = TextFormat::new()
            .style_on(FontStyle::BOLD)
            .style_off(FontStyle::BOLD);
        assert!(fmt.style_on.is_empty());
        assert_eq!(fmt.style_off, FontStyle::BOLD);
    }

    #[test]
    fn test_apply_whole_font() {
        let base = TagFormat::new(
            Font::new("Arial", 10.0).with_style(FontStyle::ITALIC),
            Color::BLACK,
        );
        let font = Font::new("Courier New", 12.0).with_style(FontStyle::BOLD);
        let out = TextFormat::new().font(&font).apply(&base);
        assert_eq!(out.font, font);
        assert_eq!(out.color, Color::BLACK);
    }

    #[test]
    fn test_apply_keeps_unspecified() {
        let mut base = TagFormat::default();
        base.back_color = Some(Color::WHITE);
        let out = TextFormat::new()
            .text_position(TextPosition::Superscript)
            .apply(&base);
        assert_eq!(out.back_color, Some(Color::WHITE));
        assert_eq!(out.text_position, TextPosition::Superscript);
        assert_eq!(out.font, base.font);
    }

    #[test]
    fn test_text_position_try_from() {
        assert_eq!(TextPosition::try_from(2).unwrap(), TextPosition::Subscript);
        assert!(matches!(
            TextPosition::try_from(5),
            Err(Error::InvalidEnumValue { .. })
        ));
    }
}
