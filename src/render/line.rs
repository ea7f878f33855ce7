//! Line-by-line rendering of a laid-out controller.

use super::{FxPainter, GraphicsSink, LeafSet, RenderLeaf};
use crate::error::{Error, Result};
use crate::layout::{Anchor, LineDescriptor, LineFlags};
use crate::style::{FigureRef, FontSpec, Scope, StyleDescriptor, StyleResolver, TextColor};
use crate::text::TextController;
use std::collections::HashMap;
use std::ops::Range;

/// Which part of the text to draw and how much room there is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderWindow {
    pub start_line: usize,
    /// Lines to draw; `None` draws to the end.
    pub line_count: Option<usize>,
    pub start_char: usize,
    /// Characters to draw; `None` draws to the end.
    pub char_count: Option<usize>,
    /// Horizontal budget from the area's left edge.
    pub max_width: Option<u32>,
    /// Vertical budget from the top of the text block.
    pub max_height: Option<u32>,
}

impl RenderWindow {
    #[must_use]
    pub const fn lines(mut self, start: usize, count: usize) -> Self {
        self.start_line = start;
        self.line_count = Some(count);
        self
    }

    #[must_use]
    pub const fn chars(mut self, start: usize, count: usize) -> Self {
        self.start_char = start;
        self.char_count = Some(count);
        self
    }

    #[must_use]
    pub const fn max_width(mut self, width: u32) -> Self {
        self.max_width = Some(width);
        self
    }

    #[must_use]
    pub const fn max_height(mut self, height: u32) -> Self {
        self.max_height = Some(height);
        self
    }
}

/// Counters of one render pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub lines: usize,
    pub leaves: usize,
    pub draw_calls: usize,
    pub figures: usize,
    pub masks: usize,
    /// True if the width or height budget cut the pass short.
    pub stopped_early: bool,
}

/// Draws a controller's lines through a sink.
#[derive(Clone, Copy, Debug, Default)]
pub struct LineRenderer {
    window: RenderWindow,
}

/// Absolute rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Rect {
    x: i32,
    y: i32,
    width: u32,
    height: u32,
}

impl Rect {
    fn union(self, other: Self) -> Self {
        let left = self.x.min(other.x);
        let top = self.y.min(other.y);
        let right = (self.x + self.width as i32).max(other.x + other.width as i32);
        let bottom = (self.y + self.height as i32).max(other.y + other.height as i32);
        Self {
            x: left,
            y: top,
            width: (right - left) as u32,
            height: (bottom - top) as u32,
        }
    }
}

/// Tracks the sink's current font and color to skip redundant calls.
#[derive(Default)]
struct Pen {
    font: Option<FontSpec>,
    color: Option<TextColor>,
}

impl Pen {
    fn apply(&mut self, sink: &mut dyn GraphicsSink, style: &StyleDescriptor) {
        let font = style.font();
        if self.font != Some(font) {
            sink.set_font(font);
            self.font = Some(font);
        }
        let color = style.color();
        if self.color != Some(color) {
            sink.set_color(color);
            self.color = Some(color);
        }
    }

    /// Forget the sink state after a painter may have changed it.
    fn reset(&mut self) {
        *self = Self::default();
    }
}

impl LineRenderer {
    #[must_use]
    pub const fn new(window: RenderWindow) -> Self {
        Self { window }
    }

    #[must_use]
    pub const fn window(&self) -> RenderWindow {
        self.window
    }

    /// Lay the controller out if needed and draw its visible lines.
    pub fn render(
        &self,
        text: &mut TextController,
        sink: &mut dyn GraphicsSink,
        painter: &mut dyn FxPainter,
    ) -> Result<RenderStats> {
        text.ensure_layout()?;
        let text = &*text;

        let line_total = text.line_count();
        if self.window.start_line > line_total {
            return Err(Error::LineOutOfRange {
                line: self.window.start_line,
                count: line_total,
            });
        }
        Error::check_position(self.window.start_char, text.char_count())?;

        let line_end = self.window.line_count.map_or(line_total, |count| {
            (self.window.start_line + count).min(line_total)
        });
        let char_end = self.window.char_count.map_or(text.char_count(), |count| {
            (self.window.start_char + count).min(text.char_count())
        });
        let char_window = self.window.start_char..char_end;

        let mut stats = RenderStats::default();
        let (area_x, block_y) = text.block_origin();
        let mut origins = Vec::with_capacity(line_end - self.window.start_line);
        let mut last_line = self.window.start_line;
        for index in self.window.start_line..line_end {
            let origin = text.line_origin(index)?;
            let bottom = origin.1 - block_y + text.lines()[index].height as i32;
            if self
                .window
                .max_height
                .is_some_and(|max| bottom > max as i32)
            {
                stats.stopped_early = true;
                break;
            }
            origins.push(origin);
            last_line = index + 1;
        }
        let line_range = self.window.start_line..last_line;

        let resolver = StyleResolver::from_layers(text.base_style(), text.layers());
        let set = LeafSet::build(
            text.lines(),
            line_range.clone(),
            &char_window,
            text.chars(),
            &resolver,
            text.char_widths(),
        );
        stats.lines = line_range.len();
        stats.leaves = set.len();

        let origin_of = |line: usize| origins[line - line_range.start];
        let fits = |leaf: &RenderLeaf| {
            let (line_x, _) = origin_of(leaf.line);
            let right = line_x - area_x + (leaf.x + leaf.width) as i32;
            self.window.max_width.is_none_or(|max| right <= max as i32)
        };

        if text.state().decorations_present {
            self.paint_figures(text, &set, &origin_of, sink, painter, &mut stats);
        }

        let mut pen = Pen::default();
        for leaf in &set.leaves {
            if !fits(leaf) {
                stats.stopped_early = true;
                continue;
            }
            let style = set.style_of(leaf);
            let (line_x, line_y) = origin_of(leaf.line);
            let x = line_x + leaf.x as i32;
            let line = &text.lines()[leaf.line];

            if let Some(glyphs) = &leaf.text {
                if glyphs.is_empty() {
                    continue;
                }
                pen.apply(sink, style);
                let glyphs: Vec<char> = glyphs.chars().collect();
                sink.draw_chars(&glyphs, x, line_y, Anchor::default());
                stats.draw_calls += 1;
                continue;
            }

            let chars = &text.chars()[leaf.range.clone()];
            if let Some(mask) = style.mask() {
                painter.draw_mask(sink, mask, chars, x, line_y, style.font());
                pen.reset();
                stats.masks += 1;
                continue;
            }

            pen.apply(sink, style);
            let spacing = style.spacing();
            let per_char = style.shift().is_some() || spacing.total() > 0 || line.is_justified();
            if per_char {
                let advances = line.advances(text.char_widths());
                let mut char_x = x;
                for (idx, &ch) in leaf.range.clone().zip(chars) {
                    let dy = style.shift().map_or(0, |shift| shift.offset(idx));
                    sink.draw_char(ch, char_x + i32::from(spacing.left), line_y + dy, Anchor::default());
                    stats.draw_calls += 1;
                    char_x += advances[idx - line.offset] as i32;
                }
            } else {
                sink.draw_chars(chars, x, line_y, Anchor::default());
                stats.draw_calls += 1;
            }
        }

        self.draw_suffixes(text, &line_range, &char_window, &origin_of, sink, &mut stats);
        Ok(stats)
    }

    /// Paint every background figure, grouped by the scope of the text
    /// style: one figure per run for character and word scope, per line,
    /// per paragraph or once for the whole text otherwise.
    fn paint_figures(
        &self,
        text: &TextController,
        set: &LeafSet,
        origin_of: &dyn Fn(usize) -> (i32, i32),
        sink: &mut dyn GraphicsSink,
        painter: &mut dyn FxPainter,
        stats: &mut RenderStats,
    ) {
        let lines = text.lines();
        let paragraph_of = paragraph_indices(lines);
        let mut order: Vec<(FigureRef, Rect)> = Vec::new();
        let mut groups: HashMap<(FigureRef, u8, usize), usize> = HashMap::new();

        let mut add = |key: (FigureRef, u8, usize), rect: Rect| {
            let existing = groups.get(&key).copied();
            match existing {
                Some(slot) => order[slot].1 = order[slot].1.union(rect),
                None => {
                    groups.insert(key, order.len());
                    order.push((key.0, rect));
                }
            }
        };

        for (leaf_index, leaf) in set.leaves.iter().enumerate() {
            let style = set.style_of(leaf);
            let Some(figure) = style.figure() else {
                continue;
            };
            let (line_x, line_y) = origin_of(leaf.line);
            let height = lines[leaf.line].height;
            let scope = style.scope();
            let group = match scope {
                Scope::Char | Scope::Word => leaf_index,
                Scope::Line => leaf.line,
                Scope::Paragraph => paragraph_of[leaf.line],
                Scope::Text => 0,
            };
            add(
                (figure, scope.code(), group),
                Rect {
                    x: line_x + leaf.x as i32,
                    y: line_y,
                    width: leaf.width,
                    height,
                },
            );
        }

        for (figure, rect) in order {
            painter.paint_figure(sink, figure, rect.x, rect.y, rect.width, rect.height);
            stats.figures += 1;
        }
    }

    /// Draw hyphens and ellipses after the last visible character.
    fn draw_suffixes(
        &self,
        text: &TextController,
        line_range: &Range<usize>,
        char_window: &Range<usize>,
        origin_of: &dyn Fn(usize) -> (i32, i32),
        sink: &mut dyn GraphicsSink,
        stats: &mut RenderStats,
    ) {
        let resolver = StyleResolver::from_layers(text.base_style(), text.layers());
        for index in line_range.clone() {
            let line = &text.lines()[index];
            let Some(suffix) = line.suffix else {
                continue;
            };
            // Only lines whose end is inside the character window.
            if line.end() < char_window.start || line.end() > char_window.end {
                continue;
            }
            let cue_width = line.suffix_width(text.char_widths());
            let x_rel = line.width - cue_width;
            let (line_x, line_y) = origin_of(index);
            if self
                .window
                .max_width
                .is_some_and(|max| line_x - text.area().x + line.width as i32 > max as i32)
            {
                stats.stopped_early = true;
                continue;
            }
            let anchor = line.end().saturating_sub(1).max(line.offset);
            let style = if text.char_count() == 0 {
                *resolver.root()
            } else {
                resolver.resolve(anchor.min(text.char_count() - 1))
            };
            sink.set_font(style.font());
            sink.set_color(style.color());
            let glyphs: Vec<char> = suffix.text().chars().collect();
            sink.draw_chars(&glyphs, line_x + x_rel as i32, line_y, Anchor::default());
            stats.draw_calls += 1;
        }
    }
}

/// Paragraph number of every line; a paragraph ends at a newline.
fn paragraph_indices(lines: &[LineDescriptor]) -> Vec<usize> {
    let mut paragraph = 0;
    lines
        .iter()
        .map(|line| {
            let current = paragraph;
            if line.flags.contains(LineFlags::NEWLINE) {
                paragraph += 1;
            }
            current
        })
        .collect()
}
