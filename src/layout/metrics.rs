//! Per-character metrics cache.

use super::LineDescriptor;
use crate::error::{Error, Result};
use crate::font::{FontMetrics, FontRegistry};
use crate::style::{StyleDescriptor, StyleResolver};
use std::ops::Range;

/// Everything a layout pass needs to measure characters.
pub struct MeasureContext<'a> {
    chars: &'a [char],
    resolver: StyleResolver<'a>,
    fonts: &'a dyn FontRegistry,
}

impl<'a> MeasureContext<'a> {
    #[must_use]
    pub const fn new(
        chars: &'a [char],
        resolver: StyleResolver<'a>,
        fonts: &'a dyn FontRegistry,
    ) -> Self {
        Self {
            chars,
            resolver,
            fonts,
        }
    }

    /// Characters of the visible window.
    #[must_use]
    pub const fn chars(&self) -> &'a [char] {
        self.chars
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.chars.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    #[must_use]
    pub const fn resolver(&self) -> &StyleResolver<'a> {
        &self.resolver
    }

    /// Resolved style at `index`, or the root style past the end.
    #[must_use]
    pub fn style_at(&self, index: usize) -> StyleDescriptor {
        if index < self.chars.len() {
            self.resolver.resolve(index)
        } else {
            *self.resolver.root()
        }
    }

    /// Metrics of the font resolved for a style.
    #[must_use]
    pub fn font_of(&self, style: &StyleDescriptor) -> &dyn FontMetrics {
        self.fonts.metrics(&style.font())
    }

    /// Width of `text` drawn in the style of the character at `index`,
    /// spacing included.
    #[must_use]
    pub fn text_width(&self, index: usize, text: &str) -> u32 {
        let style = self.style_at(index);
        let count = text.chars().count() as u32;
        self.font_of(&style).string_width(text) + style.spacing().total() * count
    }

    /// Height of the font at `index`; used for empty lines.
    #[must_use]
    pub fn height_at(&self, index: usize) -> u32 {
        let index = index.min(self.chars.len().saturating_sub(1));
        let style = self.style_at(index);
        self.font_of(&style).height()
    }
}

/// A greedy measurement line: visible range and its width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BreakSpan {
    pub offset: usize,
    pub len: usize,
    pub width: u32,
}

/// Laid-out position of one character.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CharPosition {
    pub x: u32,
    pub y: u32,
    pub line: usize,
    pub width: u32,
}

/// Cached widths, heights, positions and greedy breaks.
///
/// Widths include the per-character spacing of the resolved style. The
/// cache is filled lazily and keeps its widths across edits through
/// [`patch_insert`](Self::patch_insert) and
/// [`patch_delete`](Self::patch_delete); anything derived from the line
/// table is dropped on every change.
#[derive(Clone, Debug, Default)]
pub struct MetricsCache {
    widths: Vec<u32>,
    heights: Vec<u32>,
    measured: Vec<bool>,
    pending: usize,
    positions: Option<Vec<CharPosition>>,
    breaks: Option<((u32, Option<usize>), Vec<BreakSpan>)>,
}

impl MetricsCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of characters tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.widths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.widths.is_empty()
    }

    /// True if every tracked character has been measured.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.pending == 0
    }

    /// Forget everything.
    pub fn invalidate(&mut self) {
        self.widths.clear();
        self.heights.clear();
        self.measured.clear();
        self.pending = 0;
        self.invalidate_derived();
    }

    /// Forget positions and breaks but keep character metrics.
    pub fn invalidate_derived(&mut self) {
        self.positions = None;
        self.breaks = None;
    }

    /// Make room for a character inserted at `at`; it is measured lazily.
    pub fn patch_insert(&mut self, at: usize) {
        if at > self.widths.len() {
            self.invalidate();
            return;
        }
        self.widths.insert(at, 0);
        self.heights.insert(at, 0);
        self.measured.insert(at, false);
        self.pending += 1;
        self.invalidate_derived();
    }

    /// Drop the metrics of `count` characters starting at `at`.
    pub fn patch_delete(&mut self, at: usize, count: usize) {
        let end = at.saturating_add(count);
        if end > self.widths.len() {
            self.invalidate();
            return;
        }
        self.widths.drain(at..end);
        self.heights.drain(at..end);
        self.measured.drain(at..end);
        self.pending = self.measured.iter().filter(|known| !**known).count();
        self.invalidate_derived();
    }

    fn sync_len(&mut self, len: usize) {
        if self.widths.len() != len {
            self.widths = vec![0; len];
            self.heights = vec![0; len];
            self.measured = vec![false; len];
            self.pending = len;
            self.invalidate_derived();
        }
    }

    fn measure_one(&mut self, ctx: &MeasureContext<'_>, index: usize) {
        let style = ctx.style_at(index);
        let font = ctx.font_of(&style);
        self.widths[index] = font.char_width(ctx.chars[index]) + style.spacing().total();
        self.heights[index] = font.height();
        self.measured[index] = true;
        self.pending -= 1;
    }

    /// Measure every character not measured yet, one style run at a time.
    pub fn fill(&mut self, ctx: &MeasureContext<'_>) {
        self.sync_len(ctx.len());
        if self.pending == 0 {
            return;
        }
        if self.pending * 4 < ctx.len() {
            for index in 0..ctx.len() {
                if !self.measured[index] {
                    self.measure_one(ctx, index);
                }
            }
            return;
        }
        for run in ctx.resolver.runs(0..ctx.len()) {
            let font = ctx.font_of(&run.style);
            let spacing = run.style.spacing().total();
            let height = font.height();
            for index in run.range {
                if !self.measured[index] {
                    self.widths[index] = font.char_width(ctx.chars[index]) + spacing;
                    self.heights[index] = height;
                    self.measured[index] = true;
                    self.pending -= 1;
                }
            }
        }
    }

    /// Width of one character, measuring it on demand.
    pub fn char_width(&mut self, ctx: &MeasureContext<'_>, index: usize) -> Result<u32> {
        Error::check_index(index, ctx.len())?;
        self.sync_len(ctx.len());
        if !self.measured[index] {
            self.measure_one(ctx, index);
        }
        Ok(self.widths[index])
    }

    /// Height of one character, measuring it on demand.
    pub fn char_height(&mut self, ctx: &MeasureContext<'_>, index: usize) -> Result<u32> {
        Error::check_index(index, ctx.len())?;
        self.sync_len(ctx.len());
        if !self.measured[index] {
            self.measure_one(ctx, index);
        }
        Ok(self.heights[index])
    }

    /// All widths. Only meaningful after [`fill`](Self::fill).
    #[must_use]
    pub fn widths(&self) -> &[u32] {
        &self.widths
    }

    /// Sum of the widths of `range`, clamped to the tracked characters.
    #[must_use]
    pub fn range_width(&self, range: Range<usize>) -> u32 {
        let end = range.end.min(self.widths.len());
        let start = range.start.min(end);
        self.widths[start..end].iter().sum()
    }

    /// Tallest character of `range`, if the range is not empty.
    #[must_use]
    pub fn max_height(&self, range: Range<usize>) -> Option<u32> {
        let end = range.end.min(self.heights.len());
        let start = range.start.min(end);
        self.heights[start..end].iter().copied().max()
    }

    /// Greedy measurement breaks at `width`.
    ///
    /// Lines end at `'\n'`, after the last space or break punctuation that
    /// fits, or anywhere when no such point exists. A trailing space is not
    /// counted in the visible length. Text ending in `'\n'` gets an empty
    /// last span. The result is cached per
    /// `(width, max_lines)`.
    pub fn break_by_width(
        &mut self,
        ctx: &MeasureContext<'_>,
        width: u32,
        max_lines: Option<usize>,
    ) -> Vec<BreakSpan> {
        self.fill(ctx);
        let key = (width, max_lines);
        if let Some((cached, spans)) = &self.breaks {
            if *cached == key {
                return spans.clone();
            }
        }

        let chars = ctx.chars;
        let total = chars.len();
        let mut spans = Vec::new();
        let mut start = 0;
        while start < total && max_lines.is_none_or(|max| spans.len() < max) {
            let (end, next) = self.greedy_line(chars, start, width);
            let mut visible = end;
            if visible > start && chars[visible - 1] == ' ' {
                visible -= 1;
            }
            spans.push(BreakSpan {
                offset: start,
                len: visible - start,
                width: self.range_width(start..visible),
            });
            start = next;
        }
        let room = max_lines.is_none_or(|max| spans.len() < max);
        if spans.is_empty() || (room && chars.last() == Some(&'\n')) {
            spans.push(BreakSpan {
                offset: total,
                len: 0,
                width: 0,
            });
        }

        self.breaks = Some((key, spans.clone()));
        spans
    }

    /// Breaks at newlines only.
    pub fn break_natural(&mut self, ctx: &MeasureContext<'_>) -> Vec<BreakSpan> {
        self.break_by_width(ctx, u32::MAX, None)
    }

    /// End of the line starting at `start` and where the next one begins.
    fn greedy_line(&self, chars: &[char], start: usize, width: u32) -> (usize, usize) {
        let mut x = 0u32;
        let mut last_break = None;
        for (index, &ch) in chars.iter().enumerate().skip(start) {
            if ch == '\n' {
                return (index, index + 1);
            }
            let advance = self.widths[index];
            if index > start && x.saturating_add(advance) > width {
                if ch == ' ' {
                    return (index, index + 1);
                }
                return last_break.map_or((index, index), |point| (point, point));
            }
            x += advance;
            if is_break_char(ch) {
                last_break = Some(index + 1);
            }
        }
        (chars.len(), chars.len())
    }

    /// Positions of every character for a line table.
    ///
    /// Skipped characters sit at the end of the visible text of their line.
    pub fn positions(
        &mut self,
        ctx: &MeasureContext<'_>,
        lines: &[LineDescriptor],
        line_spacing: u32,
    ) -> &[CharPosition] {
        self.fill(ctx);
        if self.positions.is_none() {
            let total = ctx.len();
            let mut out = vec![CharPosition::default(); total];
            let mut y = 0u32;
            for (line_index, line) in lines.iter().enumerate() {
                if line_index > 0 {
                    y += line_spacing;
                }
                let advances = line.advances(&self.widths);
                let mut x = 0u32;
                for (index, advance) in line.range().zip(advances) {
                    if let Some(slot) = out.get_mut(index) {
                        *slot = CharPosition {
                            x,
                            y,
                            line: line_index,
                            width: advance,
                        };
                    }
                    x += advance;
                }
                for index in line.end()..line.next_offset().min(total) {
                    out[index] = CharPosition {
                        x,
                        y,
                        line: line_index,
                        width: 0,
                    };
                }
                y += line.height;
            }
            self.positions = Some(out);
        }
        self.positions.as_deref().unwrap_or(&[])
    }

    /// Cached position of one character, if positions were computed.
    #[must_use]
    pub fn position(&self, index: usize) -> Option<CharPosition> {
        self.positions.as_ref()?.get(index).copied()
    }
}

/// Characters after which a line may break.
pub(crate) const fn is_break_char(ch: char) -> bool {
    matches!(ch, ' ' | '-' | '/' | ',' | ';' | '!' | '?' | '\u{2013}' | '\u{3000}')
}
