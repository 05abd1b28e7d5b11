//! Text measurement boundary.
//!
//! Recalculation asks a [`TextMeasurer`] for per-character advances and
//! line metrics. Hosts with a real font stack plug in their own measurer;
//! [`MonospaceMeasurer`] is a deterministic stand-in built on
//! `unicode-width` cell widths, which keeps layout testable without fonts.

use crate::style::Font;
use std::fmt;
use unicode_width::UnicodeWidthChar;

/// Pixels per point at 96 DPI.
pub const POINTS_TO_PIXELS: f32 = 96.0 / 72.0;

/// Vertical metrics of a font, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FontMetrics {
    pub ascent: f32,
    pub descent: f32,
}

impl FontMetrics {
    /// Ascent plus descent.
    #[must_use]
    pub fn height(self) -> f32 {
        self.ascent + self.descent
    }
}

/// Measures text for layout.
pub trait TextMeasurer: fmt::Debug {
    /// Advance width of `ch` in pixels.
    fn advance(&self, font: &Font, ch: char) -> f32;

    /// Ascent/descent of `font` in pixels.
    fn metrics(&self, font: &Font) -> FontMetrics;

    /// Append one advance per character of `text` to `out`.
    fn measure_into(&self, font: &Font, text: &str, out: &mut Vec<f32>) {
        out.extend(text.chars().map(|ch| self.advance(font, ch)));
    }
}

/// Fixed-pitch measurer: every display column is `0.6em` wide.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MonospaceMeasurer {
    /// Column width as a fraction of the pixel size.
    pub column_ratio: f32,
}

impl Default for MonospaceMeasurer {
    fn default() -> Self {
        Self { column_ratio: 0.6 }
    }
}

impl MonospaceMeasurer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn pixel_size(font: &Font) -> f32 {
        font.size * POINTS_TO_PIXELS
    }
}

impl TextMeasurer for MonospaceMeasurer {
    fn advance(&self, font: &Font, ch: char) -> f32 {
        // Control characters (tabs included) are sized by layout.
        let columns = if ch < ' ' {
            0
        } else {
            UnicodeWidthChar::width(ch).unwrap_or(0)
        };
        columns as f32 * Self::pixel_size(font) * self.column_ratio
    }

    fn metrics(&self, font: &Font) -> FontMetrics {
        let px = Self::pixel_size(font);
        FontMetrics {
            ascent: px * 0.8,
            descent: px * 0.2,
        }
    }
}
