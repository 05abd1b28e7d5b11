//! Formatting runs ("tags").
//!
//! A line's tags cover its text exactly, in order, without gaps. A tag may
//! carry a [`Picture`], in which case it spans exactly one
//! [`PICTURE_PLACEHOLDER`] character.

use crate::picture::Picture;
use crate::style::TagFormat;

/// Character stored in the line text where a picture sits.
pub const PICTURE_PLACEHOLDER: char = '\u{FFFC}';

/// Cached geometry of a tag, filled in by recalculation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TagLayout {
    /// Left edge relative to the line origin, in pixels.
    pub x: f32,
    pub width: f32,
    pub ascent: f32,
    pub descent: f32,
    /// Baseline shift in pixels, positive moves up.
    pub shift: f32,
}

/// A contiguous run of one line sharing the same formatting.
#[derive(Clone, Debug, PartialEq)]
pub struct LineTag {
    /// 0-based character offset within the line.
    pub start: usize,
    pub length: usize,
    pub format: TagFormat,
    /// URL text when the run was detected as a link.
    pub link: Option<String>,
    pub picture: Option<Picture>,
    pub(crate) layout: TagLayout,
}

impl LineTag {
    /// Create a text run.
    #[must_use]
    pub fn new(start: usize, length: usize, format: TagFormat) -> Self {
        Self {
            start,
            length,
            format,
            link: None,
            picture: None,
            layout: TagLayout::default(),
        }
    }

    /// Create a picture run of length one.
    #[must_use]
    pub fn picture(start: usize, picture: Picture, format: TagFormat) -> Self {
        Self {
            picture: Some(picture),
            ..Self::new(start, 1, format)
        }
    }

    /// One past the last character.
    #[must_use]
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    #[must_use]
    pub fn is_link(&self) -> bool {
        self.link.is_some()
    }

    #[must_use]
    pub fn is_picture(&self) -> bool {
        self.picture.is_some()
    }

    /// Whether character `pos` lies inside this run.
    #[must_use]
    pub fn contains(&self, pos: usize) -> bool {
        pos >= self.start && pos < self.end()
    }

    /// Cached geometry.
    #[must_use]
    pub fn layout(&self) -> &TagLayout {
        &self.layout
    }

    /// Same run with no picture or link attached, used as the template for
    /// text typed next to it.
    pub(crate) fn text_template(&self, start: usize, length: usize) -> Self {
        Self::new(start, length, self.format.clone())
    }

    /// Whether text typed at the end of this run can extend it.
    pub(crate) fn accepts(&self, format: &TagFormat) -> bool {
        self.picture.is_none() && self.format == *format
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::picture::PictureKind;

    #[test]
    fn test_contains_and_end() {
        let tag = LineTag::new(3, 4, TagFormat::default());
        assert_eq!(tag.end(), 7);
        assert!(!tag.contains(2));
        assert!(tag.contains(3));
        assert!(tag.contains(6));
        assert!(!tag.contains(7));
    }

    #[test]
    fn test_picture_tag_is_one_char() {
        let pic = Picture::new(PictureKind::Png, vec![1u8], 10.0, 10.0);
        let tag = LineTag::picture(0, pic, TagFormat::default());
        assert_eq!(tag.length, 1);
        assert!(tag.is_picture());
        assert!(!tag.accepts(&TagFormat::default()));
    }

    #[test]
    fn test_text_template_drops_link() {
        let mut tag = LineTag::new(0, 5, TagFormat::default());
        tag.link = Some("www.example.com".into());
        let tmpl = tag.text_template(5, 0);
        assert!(!tmpl.is_link());
        assert_eq!(tmpl.format, tag.format);
    }
}
