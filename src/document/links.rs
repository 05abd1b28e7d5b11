//! URL detection.
//!
//! When `detect_urls` is on, every paragraph touched by an edit is scanned
//! once layout is done and runs covering a URL get their `link` set. Runs are
//! only rewritten, and the paragraph repainted, when the set of links in the
//! paragraph actually changed.

use crate::document::marker::Marker;
use crate::document::tree::LineId;
use crate::document::Document;
use tracing::trace;

/// Recognized prefixes. The earliest occurrence in the paragraph wins.
const LINK_PREFIXES: [&str; 4] = ["www.", "http:/", "ftp:/", "https:/"];

/// Characters a URL runs through.
fn url_safe(ch: char) -> bool {
    ch.is_alphanumeric() || "@-/:~.?=_&".contains(ch)
}

/// Characters allowed right after an inner dot.
fn continues_after_dot(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '@' | '/' | '~')
}

/// Characters that make `www.` the start of an address.
fn follows_www(ch: char) -> bool {
    continues_after_dot(ch) || ch == '-'
}

fn starts_with_ignore_case(chars: &[char], prefix: &str) -> bool {
    let mut it = chars.iter();
    prefix
        .chars()
        .all(|p| it.next().is_some_and(|c| c.eq_ignore_ascii_case(&p)))
}

/// Earliest prefix at or after `from`.
fn find_prefix(chars: &[char], from: usize) -> Option<(usize, &'static str)> {
    (from..chars.len()).find_map(|i| {
        LINK_PREFIXES
            .iter()
            .find(|p| starts_with_ignore_case(&chars[i..], p))
            .map(|&p| (i, p))
    })
}

/// URL spans in `chars` as `(start, end)` character indices.
///
/// A link starts at the earliest prefix and runs through URL-safe
/// characters. A dot followed by anything other than a letter, digit, `@`,
/// `/` or `~` ends it, and that dot is left out, so sentence punctuation is
/// never part of a link.
#[must_use]
pub fn scan_urls(chars: &[char]) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut from = 0;
    while let Some((start, prefix)) = find_prefix(chars, from) {
        let body = start + prefix.len();
        if prefix == "www." {
            match chars.get(body) {
                None => break,
                Some(&ch) if !follows_www(ch) => {
                    from = body;
                    continue;
                }
                Some(_) => {}
            }
        }
        let stop = (body..chars.len())
            .find(|&k| {
                let ok = if k > body && chars[k - 1] == '.' {
                    continues_after_dot(chars[k])
                } else {
                    url_safe(chars[k])
                };
                !ok
            })
            .unwrap_or(chars.len());
        let end = if stop > body && chars[stop - 1] == '.' {
            stop - 1
        } else {
            stop
        };
        spans.push((start, end));
        from = stop;
    }
    spans
}

/// A link span inside a paragraph.
#[derive(Debug, PartialEq, Eq)]
struct LinkSpan {
    start: usize,
    end: usize,
    url: String,
}

impl Document {
    /// Rescan the paragraphs touching lines `first..=last`.
    pub(crate) fn scan_links(&mut self, first: usize, last: usize) {
        let (Some(first), Some(last)) = (self.line_id(first), self.line_id(last)) else {
            return;
        };
        let (mut cur, to) = self.paragraph_bounds(first, last);
        loop {
            let lines = self.paragraph_lines(cur);
            let Some(&end) = lines.last() else {
                return;
            };
            self.relink_paragraph(&lines);
            if lines.contains(&to) {
                return;
            }
            match self.next_line(end) {
                Some(next) => cur = next,
                None => return,
            }
        }
    }

    /// Lines of the paragraph starting at `start`.
    fn paragraph_lines(&self, start: LineId) -> Vec<LineId> {
        let mut lines = vec![start];
        let mut cur = start;
        while !self.line_ref(cur).ending().ends_paragraph() {
            match self.next_line(cur) {
                Some(next) => {
                    lines.push(next);
                    cur = next;
                }
                None => break,
            }
        }
        lines
    }

    fn relink_paragraph(&mut self, lines: &[LineId]) {
        let mut chars = Vec::new();
        let mut existing: Vec<LinkSpan> = Vec::new();
        for &id in lines {
            let line = self.line_ref(id);
            let base = chars.len();
            for tag in line.tags().iter().filter(|t| t.length > 0) {
                let Some(url) = &tag.link else {
                    continue;
                };
                let (s, e) = (base + tag.start, base + tag.end());
                match existing.last_mut() {
                    Some(span) if span.end == s && span.url == *url => span.end = e,
                    _ => existing.push(LinkSpan {
                        start: s,
                        end: e,
                        url: url.clone(),
                    }),
                }
            }
            chars.extend(line.text().chars());
        }

        let found: Vec<LinkSpan> = scan_urls(&chars)
            .into_iter()
            .map(|(start, end)| LinkSpan {
                start,
                end,
                url: chars[start..end].iter().collect(),
            })
            .collect();
        if found == existing {
            return;
        }
        trace!(lines = lines.len(), links = found.len(), "relinking paragraph");

        let mut base = 0;
        for &id in lines {
            let line = self.line_mut(id);
            let len = line.len();
            for tag in &mut line.tags {
                tag.link = None;
            }
            line.coalesce();
            for span in &found {
                let (s, e) = (span.start.max(base), span.end.min(base + len));
                if s >= e {
                    continue;
                }
                let a = line.split_tags_at(s - base);
                let b = line.split_tags_at(e - base);
                for tag in &mut line.tags[a..b] {
                    tag.link = Some(span.url.clone());
                }
            }
            line.refresh_tag_edges();
            base += len;
        }
        // Links only restyle runs, so the laid-out lines just need a repaint.
        if let (Some(&first), Some(&last)) = (lines.first(), lines.last()) {
            let end = Marker::new(last, self.line_ref(last).len());
            self.invalidate_range(Marker::new(first, 0), end);
        }
    }

    /// URL of the link under a document-space point.
    #[must_use]
    pub fn link_at(&self, x: f32, y: f32) -> Option<&str> {
        let id = self.line_at_y(y);
        let line = self.line_ref(id);
        let layout = line.layout();
        if y < layout.y || y >= layout.y + layout.height {
            return None;
        }
        let local = x - layout.x - layout.align_shift;
        let k = layout
            .widths
            .windows(2)
            .position(|w| local >= w[0] && local < w[1])?;
        let tag = &line.tags()[line.tag_index_for_char(k)?];
        tag.link.as_deref()
    }
}
