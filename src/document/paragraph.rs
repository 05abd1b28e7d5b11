//! Paragraph-level formatting: alignment, indents, spacing, tab stops.
//!
//! All distances are in points.

use crate::error::{Error, Result};

/// Horizontal alignment of a paragraph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HorizontalAlignment {
    #[default]
    Left,
    Center,
    Right,
}

impl TryFrom<i32> for HorizontalAlignment {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Self::Left),
            1 => Ok(Self::Right),
            2 => Ok(Self::Center),
            _ => Err(Error::InvalidEnumValue {
                what: "alignment",
                value,
            }),
        }
    }
}

/// How text aligns against a tab stop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TabKind {
    #[default]
    Left,
    Center,
    Right,
    Decimal,
}

/// One tab stop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TabStop {
    /// Distance from the left margin, in points.
    pub position: f32,
    pub kind: TabKind,
}

impl TabStop {
    #[must_use]
    pub const fn new(position: f32, kind: TabKind) -> Self {
        Self { position, kind }
    }
}

/// Tab stops kept sorted by position.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TabStopCollection {
    stops: Vec<TabStop>,
}

impl TabStopCollection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a stop, replacing any stop already at the same position.
    pub fn add(&mut self, stop: TabStop) {
        match self
            .stops
            .binary_search_by(|s| s.position.total_cmp(&stop.position))
        {
            Ok(i) => self.stops[i] = stop,
            Err(i) => self.stops.insert(i, stop),
        }
    }

    pub fn clear(&mut self) {
        self.stops.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&TabStop> {
        self.stops.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TabStop> {
        self.stops.iter()
    }

    /// First stop strictly after `position`.
    #[must_use]
    pub fn next_after(&self, position: f32) -> Option<&TabStop> {
        self.stops.iter().find(|s| s.position > position)
    }
}

impl<'a> IntoIterator for &'a TabStopCollection {
    type Item = &'a TabStop;
    type IntoIter = std::slice::Iter<'a, TabStop>;

    fn into_iter(self) -> Self::IntoIter {
        self.stops.iter()
    }
}

impl FromIterator<TabStop> for TabStopCollection {
    fn from_iter<I: IntoIterator<Item = TabStop>>(iter: I) -> Self {
        let mut tabs = Self::new();
        for stop in iter {
            tabs.add(stop);
        }
        tabs
    }
}

/// Paragraph formatting carried by every line of a paragraph.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParagraphFormat {
    pub alignment: HorizontalAlignment,
    /// Left indent of the first line.
    pub indent: f32,
    /// Extra left indent of wrapped continuation lines.
    pub hanging_indent: f32,
    pub right_indent: f32,
    pub spacing_before: f32,
    pub spacing_after: f32,
    /// Points when `line_spacing_multiple` is false, a factor otherwise;
    /// zero means single spacing.
    pub line_spacing: f32,
    pub line_spacing_multiple: bool,
    pub tab_stops: TabStopCollection,
}

impl ParagraphFormat {
    #[must_use]
    pub fn with_alignment(mut self, alignment: HorizontalAlignment) -> Self {
        self.alignment = alignment;
        self
    }

    #[must_use]
    pub fn with_indent(mut self, indent: f32) -> Self {
        self.indent = indent;
        self
    }

    /// Line height after applying the spacing rule to a natural height.
    #[must_use]
    pub fn spaced_height(&self, natural: f32, points_to_pixels: f32) -> f32 {
        if self.line_spacing <= 0.0 {
            natural
        } else if self.line_spacing_multiple {
            natural * self.line_spacing
        } else {
            natural.max(self.line_spacing * points_to_pixels)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_stops_sorted_and_replaced() {
        let mut tabs = TabStopCollection::new();
        tabs.add(TabStop::new(72.0, TabKind::Left));
        tabs.add(TabStop::new(36.0, TabKind::Center));
        tabs.add(TabStop::new(72.0, TabKind::Right));
        let positions: Vec<f32> = tabs.iter().map(|t| t.position).collect();
        assert_eq!(positions, vec![36.0, 72.0]);
        assert_eq!(tabs.get(1).unwrap().kind, TabKind::Right);
        assert_eq!(tabs.next_after(36.0).unwrap().position, 72.0);
        assert!(tabs.next_after(72.0).is_none());
    }

    #[test]
    fn test_alignment_try_from() {
        assert_eq!(
            HorizontalAlignment::try_from(2).unwrap(),
            HorizontalAlignment::Center
        );
        assert!(HorizontalAlignment::try_from(-1).is_err());
    }

    #[test]
    fn test_spaced_height() {
        let mut para = ParagraphFormat::default();
        assert!((para.spaced_height(10.0, 1.0) - 10.0).abs() < f32::EPSILON);
        para.line_spacing = 1.5;
        para.line_spacing_multiple = true;
        assert!((para.spaced_height(10.0, 1.0) - 15.0).abs() < f32::EPSILON);
        para.line_spacing_multiple = false;
        para.line_spacing = 20.0;
        assert!((para.spaced_height(10.0, 2.0) - 40.0).abs() < f32::EPSILON);
    }
}
