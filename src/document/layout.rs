//! Line layout, word wrap and invalidation.
//!
//! Edits only mark a range of lines dirty. The range is laid out when the
//! outermost edit finishes, unless recalculation is suspended, in which case
//! ranges accumulate and are laid out together on resume.
//!
//! Word wrap splits over-long lines physically, giving the first half a
//! [`LineEnding::Wrap`]. Before a line is measured again its wrapped
//! continuations are joined back, so wrap points always reflect the current
//! text and viewport.

use crate::document::line::{LineEnding, LineLayout};
use crate::document::marker::Marker;
use crate::document::paragraph::HorizontalAlignment;
use crate::document::tag::TagLayout;
use crate::document::tree::LineId;
use crate::document::Document;
use crate::measure::POINTS_TO_PIXELS;
use crate::style::TextPosition;
use tracing::{debug, trace};

/// Axis-aligned rectangle in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    #[must_use]
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Smallest rectangle covering both.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Self::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }
}

fn differs(a: f32, b: f32) -> bool {
    (a - b).abs() > f32::EPSILON
}

/// Layout bookkeeping: pending ranges, suspension depth, cached sizes.
#[derive(Debug)]
pub(crate) struct LayoutState {
    recalc_suspended: u32,
    recalc_pending: bool,
    recalc_start: usize,
    recalc_end: usize,
    /// Column on the first dirty line where the change began, for a tight
    /// invalidation rectangle. `None` means the whole line.
    recalc_pos: Option<usize>,
    update_suspended: u32,
    update_pending: bool,
    update_start: usize,
    update_end: usize,
    update_height_changed: bool,
    pub(crate) invalid: Vec<Rect>,
    document_width: f32,
    document_height: f32,
    pub(crate) offset_x: f32,
    pub(crate) offset_y: f32,
    host_ready: bool,
    visible: bool,
    caret_rect: Rect,
}

impl Default for LayoutState {
    fn default() -> Self {
        Self {
            recalc_suspended: 0,
            recalc_pending: false,
            recalc_start: 1,
            recalc_end: 1,
            recalc_pos: None,
            update_suspended: 0,
            update_pending: false,
            update_start: 1,
            update_end: 1,
            update_height_changed: false,
            invalid: Vec::new(),
            document_width: 0.0,
            document_height: 0.0,
            offset_x: 0.0,
            offset_y: 0.0,
            host_ready: true,
            visible: true,
            caret_rect: Rect::default(),
        }
    }
}

impl Document {
    // ------------------------------------------------------------------
    // Dirty tracking and suspension
    // ------------------------------------------------------------------

    /// Record that lines `first..=last` need layout.
    pub(crate) fn mark_dirty(&mut self, first: usize, last: usize, pos: Option<usize>) {
        let state = &mut self.layout;
        let (first, last) = (first.max(1), last.max(first));
        if !state.recalc_pending {
            state.recalc_pending = true;
            state.recalc_start = first;
            state.recalc_end = last;
            state.recalc_pos = pos;
            return;
        }
        state.recalc_pos = match first.cmp(&state.recalc_start) {
            std::cmp::Ordering::Less => pos,
            std::cmp::Ordering::Equal => state.recalc_pos.zip(pos).map(|(a, b)| a.min(b)),
            std::cmp::Ordering::Greater => state.recalc_pos,
        };
        state.recalc_start = state.recalc_start.min(first);
        state.recalc_end = state.recalc_end.max(last);
    }

    /// Flag every line for layout.
    pub(crate) fn mark_all_dirty(&mut self) {
        let ids: Vec<LineId> = self.line_ids().collect();
        for id in ids {
            self.line_mut(id).recalc = true;
        }
        let count = self.line_count();
        self.mark_dirty(1, count, None);
    }

    /// Batch layout: edits made while suspended are laid out together.
    pub fn suspend_recalc(&mut self) {
        self.layout.recalc_suspended += 1;
    }

    /// Undo one [`suspend_recalc`](Self::suspend_recalc). With `immediate`,
    /// the accumulated range is laid out as soon as the count reaches zero;
    /// otherwise it waits for the next edit or an explicit
    /// [`recalculate_pending`](Self::recalculate_pending).
    pub fn resume_recalc(&mut self, immediate: bool) {
        self.layout.recalc_suspended = self.layout.recalc_suspended.saturating_sub(1);
        if immediate && self.layout.recalc_suspended == 0 {
            self.flush_recalc();
        }
    }

    #[must_use]
    pub fn recalc_suspended(&self) -> bool {
        self.layout.recalc_suspended > 0
    }

    /// Lay out whatever is pending.
    pub fn recalculate_pending(&mut self) {
        self.flush_recalc();
    }

    /// Hold back invalidation; rectangles accumulate into one range.
    pub fn suspend_update(&mut self) {
        self.layout.update_suspended += 1;
    }

    pub fn resume_update(&mut self, immediate: bool) {
        let state = &mut self.layout;
        state.update_suspended = state.update_suspended.saturating_sub(1);
        if !immediate || state.update_suspended > 0 || !state.update_pending {
            return;
        }
        state.update_pending = false;
        let (start, end, height_changed) = (
            state.update_start,
            state.update_end,
            state.update_height_changed,
        );
        state.update_height_changed = false;
        self.update_view(start, end, None, height_changed);
    }

    pub(crate) fn flush_recalc(&mut self) {
        let state = &self.layout;
        if !state.recalc_pending
            || state.recalc_suspended > 0
            || !state.host_ready
            || !state.visible
        {
            return;
        }
        let count = self.line_count();
        let start = state.recalc_start.clamp(1, count);
        let end = state.recalc_end.clamp(start, count);
        let pos = state.recalc_pos;
        self.layout.recalc_pending = false;

        let (width, height) = (self.layout.document_width, self.layout.document_height);
        let height_changed = self.recalculate_document(start, end, true);
        let end = end.min(self.line_count());
        if self.options.detect_urls {
            self.scan_links(start, end);
        }
        self.update_view(start, end, pos, height_changed);
        self.update_document_size();
        if differs(width, self.layout.document_width) || differs(height, self.layout.document_height)
        {
            let grew_vertically = differs(height, self.layout.document_height);
            self.events().size_changed.emit(&grew_vertically);
        }
        self.update_caret_rect();
    }

    /// Lay out every line from scratch and invalidate the viewport.
    pub fn recalculate_all(&mut self) {
        self.mark_all_dirty();
        if !self.layout.host_ready || !self.layout.visible {
            return;
        }
        self.layout.recalc_pending = false;
        let count = self.line_count();
        self.recalculate_document(1, count, false);
        self.update_document_size();
        self.invalidate_all();
        self.update_caret_rect();
    }

    // ------------------------------------------------------------------
    // Host notifications
    // ------------------------------------------------------------------

    /// The host surface exists; layout can run.
    pub fn handle_created(&mut self) {
        self.layout.host_ready = true;
        self.recalculate_all();
    }

    /// The host surface went away; layout is deferred until it returns.
    pub fn handle_destroyed(&mut self) {
        self.layout.host_ready = false;
    }

    pub fn set_visible(&mut self, visible: bool) {
        let was = self.layout.visible;
        self.layout.visible = visible;
        if visible && !was {
            self.recalculate_all();
        }
    }

    /// Resize the viewport. Wrapped documents re-flow.
    pub fn set_viewport_size(&mut self, width: f32, height: f32) {
        let rewrap = differs(width, self.options.viewport_width);
        self.options.viewport_width = width;
        self.options.viewport_height = height;
        if rewrap {
            self.recalculate_all();
        } else {
            self.invalidate_all();
        }
    }

    pub fn set_word_wrap(&mut self, wrap: bool) {
        if self.options.word_wrap != wrap {
            self.options.word_wrap = wrap;
            self.recalculate_all();
        }
    }

    /// Scroll the viewport origin.
    pub fn set_scroll_offset(&mut self, x: f32, y: f32) {
        let x = x.clamp(0.0, (self.layout.document_width - self.options.viewport_width).max(0.0));
        let y = y.clamp(0.0, (self.layout.document_height - self.options.viewport_height).max(0.0));
        if differs(x, self.layout.offset_x) || differs(y, self.layout.offset_y) {
            self.layout.offset_x = x;
            self.layout.offset_y = y;
            self.invalidate_all();
        }
    }

    #[must_use]
    pub fn scroll_offset(&self) -> (f32, f32) {
        (self.layout.offset_x, self.layout.offset_y)
    }

    /// Width and height of the laid-out document in pixels.
    #[must_use]
    pub fn document_size(&self) -> (f32, f32) {
        (self.layout.document_width, self.layout.document_height)
    }

    // ------------------------------------------------------------------
    // Recalculation
    // ------------------------------------------------------------------

    /// Lay out lines `start..=end` (1-based). With `optimize`, lines not
    /// flagged dirty are only repositioned. Layout continues past `end`
    /// while following lines have shifted. Returns whether any line height
    /// or the line count changed.
    pub fn recalculate_document(&mut self, start: usize, end: usize, optimize: bool) -> bool {
        let Some(mut id) = self.line_id(start.max(1)) else {
            return false;
        };
        let mut end = end.max(start);
        let mut line_no = start.max(1);
        let mut changed = false;
        let mut y = self
            .prev_line(id)
            .map_or(0.0, |p| self.line_ref(p).layout.y + self.line_ref(p).layout.height);

        debug!(start, end, optimize, "recalculating");
        loop {
            let in_range = line_no <= end;
            if (in_range && !optimize) || self.line_ref(id).recalc {
                let (height_changed, delta) = self.recalculate_line(id, y);
                changed |= height_changed || delta != 0;
                end = end.saturating_add_signed(delta).max(line_no);
            } else {
                self.line_mut(id).layout.y = y;
            }
            let layout = &self.line_ref(id).layout;
            y = layout.y + layout.height;

            let Some(next) = self.next_line(id) else {
                break;
            };
            line_no += 1;
            let next_line = self.line_ref(next);
            if line_no > end && !next_line.recalc && !differs(next_line.layout.y, y) {
                break;
            }
            id = next;
        }
        changed
    }

    /// Measure one line, re-wrapping it when needed. Returns whether the
    /// height changed and how many lines were added (negative when wrapped
    /// continuations were joined).
    fn recalculate_line(&mut self, id: LineId, y: f32) -> (bool, isize) {
        let mut delta = 0isize;
        while self.line_ref(id).ending() == LineEnding::Wrap {
            let Some(next) = self.next_line(id) else {
                self.line_mut(id).ending = LineEnding::None;
                break;
            };
            self.combine_lines(id, next);
            delta -= 1;
        }

        let pt = POINTS_TO_PIXELS;
        let starts_paragraph = self
            .prev_line(id)
            .is_none_or(|p| self.line_ref(p).ending().ends_paragraph());
        let para = self.line_ref(id).paragraph().clone();
        let x0 = (para.indent + if starts_paragraph { 0.0 } else { para.hanging_indent }) * pt;
        let avail = (self.options.viewport_width - x0 - para.right_indent * pt).max(1.0);

        let mut widths = self.measure_line(id, x0);
        let len = self.line_ref(id).len();
        if self.options.word_wrap && self.options.multiline && len > 1 && widths[len] > avail {
            let at = self.wrap_point(id, &widths, avail);
            if at < len {
                trace!(line = ?id, at, "wrapping");
                self.split_line(id, at, LineEnding::Wrap);
                delta += 1;
                widths.truncate(at + 1);
            }
        }

        let line = self.line_ref(id);
        let len = line.len();
        let mut ascent: f32 = 0.0;
        let mut descent: f32 = 0.0;
        let mut tag_layouts = Vec::with_capacity(line.tags().len());
        for tag in line.tags() {
            let metrics = self.measurer.metrics(&tag.format.font);
            let (asc, desc) = match &tag.picture {
                Some(pic) => (pic.height(), 0.0),
                None => (metrics.ascent, metrics.descent),
            };
            let shift = tag.format.char_offset * pt
                + match tag.format.text_position {
                    TextPosition::Normal => 0.0,
                    TextPosition::Superscript => metrics.height() / 3.0,
                    TextPosition::Subscript => -metrics.height() / 4.0,
                };
            if tag.length > 0 || len == 0 {
                ascent = ascent.max(asc + shift);
                descent = descent.max(desc - shift);
            }
            let x = widths[tag.start.min(len)];
            let right = widths[tag.end().min(len)];
            tag_layouts.push(TagLayout {
                x,
                width: right - x,
                ascent: asc,
                descent: desc,
                shift,
            });
        }

        let natural = ascent + descent;
        let spaced = para.spaced_height(natural, pt);
        let before = if starts_paragraph { para.spacing_before * pt } else { 0.0 };
        let after = if line.ending().ends_paragraph() {
            para.spacing_after * pt
        } else {
            0.0
        };
        let width = widths[len];
        let align_shift = match para.alignment {
            HorizontalAlignment::Left => 0.0,
            HorizontalAlignment::Center => ((avail - width) / 2.0).max(0.0),
            HorizontalAlignment::Right => (avail - width).max(0.0),
        };
        let layout = LineLayout {
            x: x0,
            y,
            width,
            height: spaced + before + after,
            ascent: before + (spaced - natural) + ascent,
            align_shift,
            widths,
        };

        let line = self.line_mut(id);
        let height_changed = differs(line.layout.height, layout.height);
        for (tag, tl) in line.tags.iter_mut().zip(tag_layouts) {
            tag.layout = tl;
        }
        line.layout = layout;
        line.recalc = false;
        (height_changed, delta)
    }

    /// Cumulative advances: `widths[i]` is the x offset of character `i`.
    fn measure_line(&self, id: LineId, x0: f32) -> Vec<f32> {
        let line = self.line_ref(id);
        let pt = POINTS_TO_PIXELS;
        let tab_width = self.options.default_tab_width.max(1.0);
        let mut widths = Vec::with_capacity(line.len() + 1);
        widths.push(0.0);
        let mut cur: f32 = 0.0;
        let mut chars = line.text().chars();
        for tag in line.tags() {
            for _ in 0..tag.length {
                let Some(ch) = chars.next() else {
                    break;
                };
                let advance = if let Some(pic) = &tag.picture {
                    pic.width()
                } else if ch == '\t' {
                    let at = (x0 + cur) / pt;
                    let stop = line
                        .paragraph()
                        .tab_stops
                        .next_after(at)
                        .map_or_else(|| ((at / tab_width).floor() + 1.0) * tab_width, |s| s.position);
                    (stop * pt - x0 - cur).max(0.0)
                } else {
                    self.measurer.advance(&tag.format.font, ch)
                };
                cur += advance;
                widths.push(cur);
            }
        }
        widths
    }

    /// Where to break a line that overflows `avail`: after the last
    /// whitespace that fits, else after the last character that fits, and
    /// never before the first character.
    fn wrap_point(&self, id: LineId, widths: &[f32], avail: f32) -> usize {
        let chars: Vec<char> = self.line_ref(id).text().chars().collect();
        let len = chars.len();
        let fit = (1..=len).rev().find(|&p| widths[p] <= avail).unwrap_or(1);
        // Trailing spaces hang past the margin.
        let mut hang = fit;
        while hang < len && chars[hang].is_whitespace() {
            hang += 1;
        }
        if hang > fit {
            return hang;
        }
        (1..=fit)
            .rev()
            .find(|&p| chars[p - 1].is_whitespace())
            .unwrap_or(fit)
    }

    fn update_document_size(&mut self) {
        let pt = POINTS_TO_PIXELS;
        let mut width: f32 = 0.0;
        for line in self.lines() {
            let l = &line.layout;
            width = width.max(l.x + l.align_shift + l.width + line.paragraph().right_indent * pt);
        }
        let last = &self.line_ref(self.last_line()).layout;
        let height = last.y + last.height;
        self.layout.document_width = width;
        self.layout.document_height = height;
    }

    // ------------------------------------------------------------------
    // Invalidation
    // ------------------------------------------------------------------

    /// Invalidate after lines `start..=end` were laid out. A height change
    /// repaints everything from `start` down; otherwise only the changed
    /// lines, starting at `pos` on the first one when it is left-aligned.
    pub(crate) fn update_view(
        &mut self,
        start: usize,
        end: usize,
        pos: Option<usize>,
        height_changed: bool,
    ) {
        if self.layout.update_suspended > 0 {
            let state = &mut self.layout;
            if state.update_pending {
                state.update_start = state.update_start.min(start);
                state.update_end = state.update_end.max(end);
            } else {
                state.update_pending = true;
                state.update_start = start;
                state.update_end = end;
            }
            state.update_height_changed |= height_changed;
            return;
        }

        let (vw, vh) = (self.options.viewport_width, self.options.viewport_height);
        let (ox, oy) = (self.layout.offset_x, self.layout.offset_y);
        let Some(first) = self.line_id(start.clamp(1, self.line_count())) else {
            return;
        };
        if height_changed {
            let top = self.line_ref(first).layout.y - oy;
            self.invalidate(Rect::new(0.0, top.max(0.0), vw, vh - top.max(0.0)));
            return;
        }

        let mut cur = Some(first);
        let mut line_no = start;
        while let Some(id) = cur {
            if line_no > end {
                break;
            }
            let line = self.line_ref(id);
            let top = line.layout.y - oy;
            let rect = match pos {
                Some(p) if id == first && line.paragraph().alignment == HorizontalAlignment::Left => {
                    let x = (line.x_of(p) - ox).max(0.0);
                    Rect::new(x, top, vw - x, line.layout.height)
                }
                _ => Rect::new(0.0, top, vw, line.layout.height),
            };
            self.invalidate(rect);
            cur = self.next_line(id);
            line_no += 1;
        }
    }

    /// Invalidate the pixels between two markers, line by line.
    pub(crate) fn invalidate_range(&mut self, start: Marker, end: Marker) {
        let (s, e) = (self.position_of(start), self.position_of(end));
        let (start, end) = if s <= e { (start, end) } else { (end, start) };
        let vw = self.options.viewport_width;
        let (ox, oy) = (self.layout.offset_x, self.layout.offset_y);
        let mut cur = Some(start.line);
        while let Some(id) = cur {
            let line = self.line_ref(id);
            let top = line.layout.y - oy;
            let x0 = if id == start.line {
                line.x_of(start.pos) - ox
            } else {
                0.0
            };
            let x1 = if id == end.line {
                line.x_of(end.pos) - ox + 1.0
            } else {
                vw
            };
            self.invalidate(Rect::new(x0, top, (x1 - x0).max(1.0), line.layout.height));
            if id == end.line {
                break;
            }
            cur = self.next_line(id);
        }
    }

    pub(crate) fn invalidate_all(&mut self) {
        let rect = Rect::new(0.0, 0.0, self.options.viewport_width, self.options.viewport_height);
        self.invalidate(rect);
    }

    /// Add a viewport rectangle to the repaint list.
    pub fn invalidate(&mut self, rect: Rect) {
        let viewport = Rect::new(0.0, 0.0, self.options.viewport_width, self.options.viewport_height);
        if rect.is_empty() || !rect.intersects(&viewport) {
            return;
        }
        self.layout.invalid.push(rect);
    }

    /// Rectangles, in viewport coordinates, that need repainting since the
    /// last call.
    pub fn take_invalid_rects(&mut self) -> Vec<Rect> {
        std::mem::take(&mut self.layout.invalid)
    }

    // ------------------------------------------------------------------
    // Hit testing
    // ------------------------------------------------------------------

    /// Line whose band contains document-space `y`, clamped to the first
    /// and last lines.
    #[must_use]
    pub fn line_at_y(&self, y: f32) -> LineId {
        let (mut lo, mut hi) = (0, self.line_count());
        // Last line whose top is at or above y.
        while hi - lo > 1 {
            let mid = (lo + hi) / 2;
            let top = self
                .line_id(mid + 1)
                .map_or(f32::MAX, |id| self.line_ref(id).layout.y);
            if top <= y {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        self.line_id(lo + 1).unwrap_or_else(|| self.first_line())
    }

    /// Character boundary on `id` nearest to document-space `x`.
    pub(crate) fn pos_at_x(&self, id: LineId, x: f32) -> usize {
        let line = self.line_ref(id);
        let local = x - line.layout.x - line.layout.align_shift;
        let widths = &line.layout.widths;
        let len = line.len().min(widths.len().saturating_sub(1));
        for p in 0..len {
            let mid = (widths[p] + widths[p + 1]) / 2.0;
            if local < mid {
                return p;
            }
        }
        len
    }

    /// Caret rectangle in document coordinates.
    #[must_use]
    pub fn caret_rect(&self) -> Rect {
        let caret = self.cursors.caret;
        let line = self.line_ref(caret.line);
        Rect::new(line.x_of(caret.pos), line.layout.y, 1.0, line.layout.height)
    }

    pub(crate) fn update_caret_rect(&mut self) {
        let rect = self.caret_rect();
        if rect != self.layout.caret_rect {
            self.layout.caret_rect = rect;
            self.events().caret_moved.emit(&());
        }
    }
}
