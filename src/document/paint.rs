//! Drawing through a host-supplied [`Painter`].

use crate::color::Color;
use crate::document::layout::Rect;
use crate::document::Document;
use crate::picture::Picture;
use crate::style::{FontStyle, TagFormat};

/// Selection highlight fill.
const HIGHLIGHT: Color = Color::rgb(51, 153, 255);
/// Text drawn over the highlight.
const HIGHLIGHT_TEXT: Color = Color::WHITE;

/// Drawing backend. Coordinates are viewport pixels.
pub trait Painter {
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Draw `text` with its left edge at `x` and its baseline at `baseline`.
    fn draw_text(&mut self, x: f32, baseline: f32, text: &str, format: &TagFormat);

    fn draw_picture(&mut self, rect: Rect, picture: &Picture);
}

impl Document {
    /// Paint the part of the document inside `clip` (viewport coordinates).
    pub fn draw(&self, clip: Rect, painter: &mut dyn Painter) {
        painter.fill_rect(clip, self.options.back_color);
        let (ox, oy) = self.scroll_offset();
        let (sel_start, sel_end) = self.selection_range();
        let show_selection = self.options.show_selection && sel_start != sel_end;

        let mut cur = Some(self.line_at_y(clip.y + oy));
        while let Some(id) = cur {
            let line = self.line_ref(id);
            let layout = line.layout();
            let top = layout.y - oy;
            if top >= clip.bottom() {
                break;
            }
            let line_no = self.no(id);
            let (sel_a, sel_b) = if show_selection
                && line_no >= sel_start.line_no
                && line_no <= sel_end.line_no
            {
                let a = if line_no == sel_start.line_no { sel_start.pos } else { 0 };
                let b = if line_no == sel_end.line_no {
                    sel_end.pos
                } else {
                    line.len()
                };
                (a, b)
            } else {
                (0, 0)
            };
            let origin = layout.x + layout.align_shift - ox;
            let baseline = top + layout.ascent;

            if sel_a < sel_b {
                let x0 = origin + layout.widths.get(sel_a).copied().unwrap_or(0.0);
                let x1 = origin + layout.widths.get(sel_b).copied().unwrap_or(layout.width);
                painter.fill_rect(Rect::new(x0, top, x1 - x0, layout.height), HIGHLIGHT);
            }

            for tag in line.tags().iter().filter(|t| t.length > 0) {
                if !tag.format.visible {
                    continue;
                }
                let tl = tag.layout();
                let x = origin + tl.x;
                if let Some(back) = tag.format.back_color {
                    painter.fill_rect(Rect::new(x, top, tl.width, layout.height), back);
                }
                if let Some(pic) = &tag.picture {
                    let rect = Rect::new(x, baseline - pic.height(), pic.width(), pic.height());
                    painter.draw_picture(rect, pic);
                    continue;
                }

                let mut format = tag.format.clone();
                if tag.is_link() {
                    format.color = Color::LINK_BLUE;
                    format.font.style |= FontStyle::UNDERLINE;
                }
                // Up to three pieces: before, inside and after the selection.
                let cuts = [
                    tag.start,
                    sel_a.clamp(tag.start, tag.end()),
                    sel_b.clamp(tag.start, tag.end()),
                    tag.end(),
                ];
                for (i, w) in cuts.windows(2).enumerate() {
                    let (a, b) = (w[0], w[1]);
                    if a >= b {
                        continue;
                    }
                    let piece_x = origin + layout.widths.get(a).copied().unwrap_or(tl.x);
                    let text = line.slice(a, b);
                    if i == 1 {
                        let mut selected = format.clone();
                        selected.color = HIGHLIGHT_TEXT;
                        painter.draw_text(piece_x, baseline - tl.shift, text, &selected);
                    } else {
                        painter.draw_text(piece_x, baseline - tl.shift, text, &format);
                    }
                }
            }
            cur = self.next_line(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::marker::DocPosition;
    use crate::options::DocumentOptions;

    #[derive(Default)]
    struct Recorder {
        fills: Vec<(Rect, Color)>,
        texts: Vec<(String, Color, bool)>,
        pictures: usize,
    }

    impl Painter for Recorder {
        fn fill_rect(&mut self, rect: Rect, color: Color) {
            self.fills.push((rect, color));
        }

        fn draw_text(&mut self, _x: f32, _baseline: f32, text: &str, format: &TagFormat) {
            self.texts
                .push((text.to_owned(), format.color, format.font.underline()));
        }

        fn draw_picture(&mut self, _rect: Rect, _picture: &Picture) {
            self.pictures += 1;
        }
    }

    fn viewport(doc: &Document) -> Rect {
        Rect::new(0.0, 0.0, doc.options().viewport_width, doc.options().viewport_height)
    }

    #[test]
    fn test_draw_splits_selection() {
        let mut doc = Document::new();
        doc.insert(1, 0, "Hello World").unwrap();
        doc.set_selection(DocPosition::new(1, 2), DocPosition::new(1, 7))
            .unwrap();
        let mut rec = Recorder::default();
        doc.draw(viewport(&doc), &mut rec);
        let texts: Vec<&str> = rec.texts.iter().map(|t| t.0.as_str()).collect();
        assert_eq!(texts, vec!["He", "llo W", "orld"]);
        assert_eq!(rec.texts[1].1, HIGHLIGHT_TEXT);
        assert!(rec.fills.iter().any(|f| f.1 == HIGHLIGHT));
    }

    #[test]
    fn test_draw_links_underlined() {
        let mut doc = Document::with_options(DocumentOptions::default().detect_urls(true));
        doc.insert(1, 0, "at www.a.org").unwrap();
        let mut rec = Recorder::default();
        doc.draw(viewport(&doc), &mut rec);
        let link = rec.texts.iter().find(|t| t.0 == "www.a.org").unwrap();
        assert_eq!(link.1, Color::LINK_BLUE);
        assert!(link.2);
    }

    #[test]
    fn test_draw_skips_lines_outside_clip() {
        let mut doc = Document::new();
        doc.insert(1, 0, "one\r\ntwo\r\nthree").unwrap();
        let h = doc.line(1).unwrap().layout().height;
        let mut rec = Recorder::default();
        doc.draw(Rect::new(0.0, h + 0.5, 100.0, h / 2.0), &mut rec);
        let texts: Vec<&str> = rec.texts.iter().map(|t| t.0.as_str()).collect();
        assert_eq!(texts, vec!["two"]);
    }
}
