//! Stateful layout controller.
//!
//! [`TextController`] owns the character buffer, the overlay layers and the
//! current line table. Layout is lazy: style and option changes only mark
//! the controller stale, and the next query or render lays the text out
//! again. Single-character edits on plain, unwrapped lines are patched in
//! place instead.

use super::{CharBuffer, Interval, LayerId, OverlayStore};
use crate::error::{Error, Result};
use crate::event::{EVENT_RELAYOUT, EVENT_TRIMMED, LogLevel, emit_event, emit_log};
use crate::font::FontRegistry;
use crate::layout::{
    Anchor, Area, BreakOutcome, LayoutOptions, LineBreaker, LineDescriptor, MeasureContext,
    MetricsCache, TabStop, WrapPolicy,
};
use crate::style::{StyleDescriptor, StyleEffect, StyleResolver};
use std::sync::Arc;

/// Lifecycle of the line table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Never laid out.
    #[default]
    Uninitialized,
    /// Lines match the buffer, styles and options.
    LaidOut,
    /// Something changed since the last layout.
    NeedsRelayout,
}

/// Drawing strategy chosen after layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DrawType {
    /// One line, plain glyph runs.
    #[default]
    SingleLine,
    /// One line with masks, figures, shifts or color functions.
    SingleLineFx,
    MultiLine,
    MultiLineFx,
}

impl DrawType {
    #[must_use]
    pub const fn is_multi_line(self) -> bool {
        matches!(self, Self::MultiLine | Self::MultiLineFx)
    }

    #[must_use]
    pub const fn has_effects(self) -> bool {
        matches!(self, Self::SingleLineFx | Self::MultiLineFx)
    }
}

/// Which derived data is still valid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LayoutState {
    pub metrics_valid: bool,
    pub lines_valid: bool,
    pub positions_valid: bool,
    pub draw_type_valid: bool,
    /// The last pass hid text behind an ellipsis, or a trim is active.
    pub trimming_applied: bool,
    /// Some run paints a background figure.
    pub decorations_present: bool,
}

impl LayoutState {
    /// Everything computed by a full layout pass.
    pub const VALID: Self = Self {
        metrics_valid: true,
        lines_valid: true,
        positions_valid: true,
        draw_type_valid: true,
        trimming_applied: false,
        decorations_present: false,
    };

    /// A style or buffer change: nothing survives.
    pub fn invalidate_all(&mut self) {
        *self = Self::default();
    }

    /// An option or area change: character metrics survive.
    pub fn invalidate_lines(&mut self) {
        *self = Self {
            metrics_valid: self.metrics_valid,
            ..Self::default()
        };
    }

    /// A patched edit: lines were adjusted in place.
    pub fn invalidate_positions(&mut self) {
        self.positions_valid = false;
    }

    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.metrics_valid && self.lines_valid && self.positions_valid && self.draw_type_valid
    }
}

/// Saved state while a trim is active.
#[derive(Clone, Debug)]
struct TrimBackup {
    options: LayoutOptions,
    cut: Option<TrimCut>,
}

/// Characters and overlays of the window before [`TextController::trim`]
/// shortened it.
#[derive(Clone, Debug)]
struct TrimCut {
    chars: Vec<char>,
    layers: Vec<OverlayStore>,
}

/// Effects found in the resolved runs of the window.
#[derive(Clone, Copy, Debug, Default)]
struct EffectScan {
    effects: bool,
    figures: bool,
}

/// Owner of one block of styled text and its layout.
pub struct TextController {
    fonts: Arc<dyn FontRegistry>,
    text: CharBuffer,
    chars: Vec<char>,
    text_style: StyleEffect,
    base: StyleDescriptor,
    layers: Vec<OverlayStore>,
    area: Area,
    anchor: Anchor,
    options: LayoutOptions,
    phase: Phase,
    state: LayoutState,
    metrics: MetricsCache,
    lines: Vec<LineDescriptor>,
    /// Top of every line relative to the block, line spacing included.
    tops: Vec<u32>,
    tab_stops: Vec<TabStop>,
    height: u32,
    draw_type: DrawType,
    backup: Option<TrimBackup>,
}

/// Measurement context over the controller's fields.
///
/// A free function so callers can borrow the metrics cache mutably at the
/// same time.
fn context<'a>(
    chars: &'a [char],
    base: &'a StyleDescriptor,
    layers: &'a [OverlayStore],
    fonts: &'a dyn FontRegistry,
) -> MeasureContext<'a> {
    MeasureContext::new(chars, StyleResolver::from_layers(base, layers), fonts)
}

/// Characters that never need a substitution.
fn is_plain_char(ch: char) -> bool {
    !ch.is_control()
}

impl TextController {
    /// Create an empty controller measuring with `fonts`.
    #[must_use]
    pub fn new(fonts: Arc<dyn FontRegistry>) -> Self {
        Self {
            fonts,
            text: CharBuffer::new(),
            chars: Vec::new(),
            text_style: StyleEffect::new(),
            base: StyleDescriptor::base(&StyleEffect::new()),
            layers: (0..LayerId::STOCK_COUNT).map(|_| OverlayStore::new(0)).collect(),
            area: Area::default(),
            anchor: Anchor::default(),
            options: LayoutOptions::default(),
            phase: Phase::Uninitialized,
            state: LayoutState::default(),
            metrics: MetricsCache::new(),
            lines: Vec::new(),
            tops: Vec::new(),
            tab_stops: Vec::new(),
            height: 0,
            draw_type: DrawType::SingleLine,
            backup: None,
        }
    }

    /// Builder form of [`set_text`](Self::set_text).
    #[must_use]
    pub fn with_text(mut self, text: &str) -> Self {
        self.set_text(text);
        self
    }

    /// Builder form of [`set_options`](Self::set_options) for options known
    /// to be valid; invalid options are ignored and logged. Use
    /// [`try_with_options`](Self::try_with_options) to see the error.
    #[must_use]
    pub fn with_options(mut self, options: LayoutOptions) -> Self {
        let _ = self.set_options(options);
        self
    }

    /// Builder form of [`set_options`](Self::set_options) that fails on
    /// invalid options.
    pub fn try_with_options(mut self, options: LayoutOptions) -> Result<Self> {
        self.set_options(options)?;
        Ok(self)
    }

    #[must_use]
    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    // ---- buffer ----

    /// Replace the text. Every overlay is cleared.
    pub fn set_text(&mut self, text: &str) {
        self.text.set_text(text);
        self.reload_window();
    }

    /// Replace the text by the decimal form of `value`.
    pub fn set_number(&mut self, value: i64) {
        self.set_text(&value.to_string());
    }

    /// Restrict layout to `len` characters from absolute offset `start`.
    /// Every overlay is cleared.
    pub fn set_window(&mut self, start: usize, len: usize) -> Result<()> {
        self.text.set_window(start, len)?;
        self.reload_window();
        Ok(())
    }

    fn reload_window(&mut self) {
        self.chars = self.text.chars();
        for layer in &mut self.layers {
            layer.clear();
            layer.set_bound(self.chars.len());
        }
        if let Some(backup) = self.backup.take() {
            self.options = backup.options;
        }
        self.metrics.invalidate();
        self.state.invalidate_all();
        self.mark_stale();
    }

    /// Text of the visible window.
    #[must_use]
    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    /// Characters of the visible window.
    #[must_use]
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Number of characters in the visible window.
    #[must_use]
    pub fn char_count(&self) -> usize {
        self.chars.len()
    }

    // ---- configuration ----

    #[must_use]
    pub const fn options(&self) -> &LayoutOptions {
        &self.options
    }

    /// Replace the layout options.
    pub fn set_options(&mut self, options: LayoutOptions) -> Result<()> {
        if let Err(err) = options.validate() {
            emit_log(LogLevel::Warn, &format!("rejected layout options: {err}"));
            return Err(err);
        }
        if options != self.options {
            self.options = options;
            self.state.invalidate_lines();
            self.metrics.invalidate_derived();
            self.mark_stale();
        }
        Ok(())
    }

    #[must_use]
    pub const fn area(&self) -> Area {
        self.area
    }

    /// Move or resize the layout area.
    pub fn set_area(&mut self, area: Area) {
        if area.width_limit() != self.area.width_limit() || area.height != self.area.height {
            self.state.invalidate_lines();
            self.metrics.invalidate_derived();
            self.mark_stale();
        }
        self.area = area;
    }

    #[must_use]
    pub const fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub fn set_anchor(&mut self, anchor: Anchor) {
        self.anchor = anchor;
    }

    /// Resolved style of the whole text.
    #[must_use]
    pub const fn base_style(&self) -> &StyleDescriptor {
        &self.base
    }

    /// Font registry used for measuring.
    #[must_use]
    pub fn fonts(&self) -> &dyn FontRegistry {
        self.fonts.as_ref()
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub const fn state(&self) -> LayoutState {
        self.state
    }

    /// Drawing strategy for the current line table.
    #[must_use]
    pub const fn draw_type(&self) -> DrawType {
        self.draw_type
    }

    fn set_text_style(&mut self, text_style: &StyleEffect) {
        if *text_style != self.text_style {
            self.text_style = *text_style;
            self.base = StyleDescriptor::base(text_style);
            self.metrics.invalidate();
            self.state.invalidate_all();
            self.mark_stale();
        }
    }

    fn mark_stale(&mut self) {
        if self.phase == Phase::LaidOut {
            self.phase = Phase::NeedsRelayout;
        }
    }

    // ---- overlays ----

    /// Overlay layers, lowest first.
    #[must_use]
    pub fn layers(&self) -> &[OverlayStore] {
        &self.layers
    }

    /// One overlay layer.
    pub fn layer(&self, id: LayerId) -> Result<&OverlayStore> {
        self.layers.get(id.0).ok_or(Error::UnknownLayer(id.0))
    }

    /// Register a new layer above all existing ones.
    pub fn add_layer(&mut self) -> LayerId {
        self.commit_cut();
        self.layers.push(OverlayStore::new(self.chars.len()));
        LayerId(self.layers.len() - 1)
    }

    /// Apply `effect` to `len` characters from `offset` in one layer.
    pub fn add_style(
        &mut self,
        layer: LayerId,
        offset: usize,
        len: usize,
        effect: StyleEffect,
    ) -> Result<()> {
        self.layers
            .get_mut(layer.0)
            .ok_or(Error::UnknownLayer(layer.0))?
            .add(offset, len, effect)?;
        self.styles_changed();
        Ok(())
    }

    /// Remove the styling of `len` characters from `offset` in one layer.
    pub fn remove_style(&mut self, layer: LayerId, offset: usize, len: usize) -> Result<()> {
        let removed = self
            .layers
            .get_mut(layer.0)
            .ok_or(Error::UnknownLayer(layer.0))?
            .remove(offset, len)?;
        if removed {
            self.styles_changed();
        }
        Ok(())
    }

    /// Remove one interval of a layer if it is stored exactly as given.
    /// Returns whether it was found.
    pub fn remove_exact_style(
        &mut self,
        layer: LayerId,
        interval: &Interval<StyleEffect>,
    ) -> Result<bool> {
        let removed = self
            .layers
            .get_mut(layer.0)
            .ok_or(Error::UnknownLayer(layer.0))?
            .remove_exact(interval);
        if removed {
            self.styles_changed();
        }
        Ok(removed)
    }

    /// Remove every interval of one layer.
    pub fn clear_layer(&mut self, layer: LayerId) -> Result<()> {
        self.layers
            .get_mut(layer.0)
            .ok_or(Error::UnknownLayer(layer.0))?
            .clear();
        self.styles_changed();
        Ok(())
    }

    fn styles_changed(&mut self) {
        self.commit_cut();
        self.metrics.invalidate();
        self.state.invalidate_all();
        self.mark_stale();
    }

    // ---- layout ----

    /// Lay the text out with `text_style` into the given rectangle.
    pub fn layout(
        &mut self,
        text_style: &StyleEffect,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    ) -> Result<()> {
        self.set_text_style(text_style);
        self.set_area(Area::new(x, y, width, height));
        self.ensure_layout()
    }

    /// Lay out again if anything changed since the last pass.
    pub fn ensure_layout(&mut self) -> Result<()> {
        if self.phase == Phase::LaidOut && self.state.lines_valid {
            return Ok(());
        }
        self.relayout()
    }

    /// Lay out with the current configuration, whether stale or not.
    pub fn measure(&mut self) -> Result<()> {
        self.relayout()
    }

    /// Lay out with another wrap policy and line limit, keeping them for
    /// later passes. Returns the new line table.
    pub fn measure_with(&mut self, wrap: WrapPolicy, max_lines: Option<usize>) -> Result<&[LineDescriptor]> {
        let mut options = self.options;
        options.wrap = wrap;
        options.max_lines = max_lines;
        self.set_options(options)?;
        self.relayout()?;
        Ok(&self.lines)
    }

    fn wrap_limit(&self) -> Option<u32> {
        self.options.wrap_width.or_else(|| self.area.width_limit())
    }

    fn relayout(&mut self) -> Result<()> {
        let mut options = self.options;
        if options.max_height.is_none() && self.area.height > 0 && self.backup.is_some() {
            options.max_height = Some(self.area.height);
        }
        let breaker =
            LineBreaker::new(&options, self.wrap_limit()).with_tail_ellipsis(self.backup.is_some());
        let ctx = context(&self.chars, &self.base, &self.layers, self.fonts.as_ref());
        let outcome = breaker.run(&ctx, &mut self.metrics)?;
        let scan = self.scan_effects(&ctx);
        self.install(outcome, scan);
        Ok(())
    }

    fn scan_effects(&self, ctx: &MeasureContext<'_>) -> EffectScan {
        let mut scan = EffectScan {
            effects: self.base.has_effects(),
            figures: self.base.figure().is_some(),
        };
        for run in ctx.resolver().runs(0..self.chars.len()) {
            scan.effects |= run.style.has_effects();
            scan.figures |= run.style.figure().is_some();
        }
        scan
    }

    fn classify(&mut self, scan: EffectScan) {
        self.draw_type = match (self.lines.len() > 1, scan.effects) {
            (false, false) => DrawType::SingleLine,
            (false, true) => DrawType::SingleLineFx,
            (true, false) => DrawType::MultiLine,
            (true, true) => DrawType::MultiLineFx,
        };
        self.state.decorations_present = scan.figures;
    }

    fn rebuild_tops(&mut self) {
        self.tops.clear();
        let mut y = 0;
        for line in &self.lines {
            self.tops.push(y);
            y += line.height + self.options.line_spacing;
        }
    }

    fn install(&mut self, outcome: BreakOutcome, scan: EffectScan) {
        let trimmed = outcome.trimmed;
        self.lines = outcome.lines;
        self.tab_stops = outcome.tab_stops;
        self.height = outcome.height;
        self.rebuild_tops();
        self.state = LayoutState::VALID;
        self.state.trimming_applied = trimmed || self.backup.is_some();
        self.classify(scan);
        self.phase = Phase::LaidOut;

        emit_log(
            LogLevel::Debug,
            &format!(
                "laid out {} chars into {} lines ({}x{})",
                self.chars.len(),
                self.lines.len(),
                self.content_width(),
                self.height
            ),
        );
        if trimmed {
            emit_event(EVENT_TRIMMED, &format!("lines={}", self.lines.len()));
        }
    }

    // ---- queries ----

    /// Current line table. Empty before the first layout.
    #[must_use]
    pub fn lines(&self) -> &[LineDescriptor] {
        &self.lines
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Cached advance of every window character, spacing included.
    /// Valid after layout.
    #[must_use]
    pub fn char_widths(&self) -> &[u32] {
        self.metrics.widths()
    }

    /// Columns established by the first tabbed line.
    #[must_use]
    pub fn tab_stops(&self) -> &[TabStop] {
        &self.tab_stops
    }

    pub fn line(&self, index: usize) -> Result<&LineDescriptor> {
        self.lines.get(index).ok_or(Error::LineOutOfRange {
            line: index,
            count: self.lines.len(),
        })
    }

    /// Index of the line that consumed the character at `index`.
    ///
    /// Page filler lines share their offset with the following line, which
    /// wins.
    pub fn line_at(&self, index: usize) -> Result<usize> {
        Error::check_position(index, self.chars.len())?;
        if self.lines.is_empty() {
            return Err(Error::LineOutOfRange { line: 0, count: 0 });
        }
        let after = self.lines.partition_point(|line| line.offset <= index);
        Ok(after.saturating_sub(1))
    }

    /// Visible text of one line, substitutions not applied.
    pub fn line_text(&self, index: usize) -> Result<String> {
        let line = self.line(index)?;
        Ok(self.chars[line.range()].iter().collect())
    }

    /// Text of one line as drawn: substitutions replace their characters
    /// and the suffix follows the last visible character.
    pub fn line_display(&self, index: usize) -> Result<String> {
        let line = self.line(index)?;
        let mut out = String::new();
        for offset in line.range() {
            match line.substitution(offset) {
                Some(sub) => out.push_str(&sub.text),
                None => out.push(self.chars[offset]),
            }
        }
        if let Some(suffix) = line.suffix {
            out.push_str(suffix.text());
        }
        Ok(out)
    }

    #[must_use]
    pub fn content_width(&self) -> u32 {
        self.lines.iter().map(|line| line.width).max().unwrap_or(0)
    }

    /// Width and height of the laid-out text.
    #[must_use]
    pub fn content_size(&self) -> (u32, u32) {
        (self.content_width(), self.height)
    }

    /// Top-left corner of the text block after anchoring.
    #[must_use]
    pub fn block_origin(&self) -> (i32, i32) {
        let dy = self.anchor.align_y(self.area.height, self.height);
        (self.area.x, self.area.y + dy as i32)
    }

    /// Top-left corner of one line after anchoring.
    pub fn line_origin(&self, index: usize) -> Result<(i32, i32)> {
        let line = self.line(index)?;
        let (_, block_y) = self.block_origin();
        let area_width = self.area.width_limit().unwrap_or_else(|| self.content_width());
        let dx = self.anchor.align_x(area_width, line.width);
        let top = self.tops.get(index).copied().unwrap_or(0);
        Ok((self.area.x + dx as i32, block_y + top as i32))
    }

    /// Bounding box of one character as `(x, y, width, height)`.
    pub fn char_bounds(&mut self, index: usize) -> Result<(i32, i32, u32, u32)> {
        Error::check_index(index, self.chars.len())?;
        self.ensure_layout()?;
        let line_index = self.line_at(index)?;
        let (line_x, line_y) = self.line_origin(line_index)?;
        let height = self.lines[line_index].height;
        let ctx = context(&self.chars, &self.base, &self.layers, self.fonts.as_ref());
        let spacing = self.options.line_spacing;
        let position = self.metrics.positions(&ctx, &self.lines, spacing)[index];
        self.state.positions_valid = true;
        Ok((line_x + position.x as i32, line_y, position.width, height))
    }

    /// Character under a point, if the point is inside some line.
    pub fn char_offset(&mut self, x: i32, y: i32) -> Result<Option<usize>> {
        self.ensure_layout()?;
        let (_, block_y) = self.block_origin();
        let rel = i64::from(y) - i64::from(block_y);
        let below = self.tops.partition_point(|&top| i64::from(top) <= rel);
        let Some(index) = below.checked_sub(1) else {
            return Ok(None);
        };
        let (line_x, line_y) = self.line_origin(index)?;
        let line = &self.lines[index];
        if y >= line_y + line.height as i32 {
            return Ok(None);
        }
        let advances = line.advances(self.metrics.widths());
        let mut left = line_x;
        for (offset, advance) in line.range().zip(advances) {
            if x >= left && x < left + advance as i32 {
                return Ok(Some(offset));
            }
            left += advance as i32;
        }
        Ok(None)
    }

    // ---- trimming ----

    /// Cut the text after its first `end` characters and end the last line
    /// with an ellipsis.
    ///
    /// The hidden characters and their overlays stay in a backup that
    /// [`untrimmed_text`](Self::untrimmed_text) reads and
    /// [`untrim`](Self::untrim) restores. Any later edit or style change
    /// makes the cut permanent.
    pub fn trim(&mut self, end: usize) -> Result<()> {
        Error::check_position(end, self.untrimmed_len())?;
        self.restore_cut()?;
        let hidden = self.chars.len() - end;
        let cut = TrimCut {
            chars: self.chars.clone(),
            layers: self.layers.clone(),
        };
        self.text.set_window_len(end)?;
        self.chars.truncate(end);
        for layer in &mut self.layers {
            layer.on_delete(end, hidden);
        }
        self.ensure_backup().cut = Some(cut);
        self.metrics.invalidate();
        self.state.invalidate_all();
        self.relayout()
    }

    /// Limit the text to `max_lines` lines and end it with an ellipsis.
    ///
    /// The previous options are kept and restored by
    /// [`untrim`](Self::untrim).
    pub fn trim_lines(&mut self, max_lines: usize) -> Result<()> {
        let original = self
            .backup
            .as_ref()
            .map_or(self.options, |backup| backup.options);
        let mut options = original;
        options.max_lines = Some(max_lines);
        if let Err(err) = options.validate() {
            emit_log(LogLevel::Warn, &format!("rejected trim: {err}"));
            return Err(err);
        }
        self.ensure_backup();
        self.options = options;
        self.state.invalidate_lines();
        self.metrics.invalidate_derived();
        self.relayout()
    }

    /// Restore the text and options saved by [`trim`](Self::trim) and
    /// [`trim_lines`](Self::trim_lines).
    pub fn untrim(&mut self) -> Result<()> {
        self.restore_cut()?;
        if let Some(backup) = self.backup.take() {
            self.options = backup.options;
            self.state.invalidate_lines();
            self.metrics.invalidate_derived();
            self.relayout()?;
        }
        Ok(())
    }

    /// True while a trim is active.
    #[must_use]
    pub const fn is_trimmed(&self) -> bool {
        self.backup.is_some()
    }

    /// Window text as it was before [`trim`](Self::trim) cut it.
    #[must_use]
    pub fn untrimmed_text(&self) -> String {
        match self.cut() {
            Some(cut) => cut.chars.iter().collect(),
            None => self.text(),
        }
    }

    fn cut(&self) -> Option<&TrimCut> {
        self.backup.as_ref().and_then(|backup| backup.cut.as_ref())
    }

    fn untrimmed_len(&self) -> usize {
        self.cut().map_or(self.chars.len(), |cut| cut.chars.len())
    }

    fn ensure_backup(&mut self) -> &mut TrimBackup {
        let options = self.options;
        self.backup
            .get_or_insert_with(|| TrimBackup { options, cut: None })
    }

    /// Put back the characters and overlays hidden by a cut, if any.
    fn restore_cut(&mut self) -> Result<()> {
        let Some(cut) = self.backup.as_mut().and_then(|backup| backup.cut.take()) else {
            return Ok(());
        };
        self.text.set_window_len(cut.chars.len())?;
        self.chars = cut.chars;
        self.layers = cut.layers;
        self.metrics.invalidate();
        self.state.invalidate_all();
        self.mark_stale();
        Ok(())
    }

    /// Forget the hidden characters of a cut; the ellipsis stays.
    fn commit_cut(&mut self) {
        if let Some(backup) = &mut self.backup {
            backup.cut = None;
        }
    }

    // ---- incremental edits ----

    /// Insert one character at window offset `at`.
    pub fn insert_char(&mut self, at: usize, ch: char) -> Result<()> {
        Error::check_position(at, self.chars.len())?;
        self.commit_cut();
        self.text.insert_char(at, ch)?;
        self.chars.insert(at, ch);
        for layer in &mut self.layers {
            layer.on_insert(at, 1);
        }
        self.metrics.patch_insert(at);

        if self.phase == Phase::LaidOut && self.patch_insert(at, ch) {
            return Ok(());
        }
        self.require_relayout();
        Ok(())
    }

    /// Delete the character at window offset `at`.
    pub fn delete_char(&mut self, at: usize) -> Result<()> {
        Error::check_index(at, self.chars.len())?;
        self.commit_cut();
        let ch = self.chars[at];
        let old_width = self
            .metrics
            .is_complete()
            .then(|| self.metrics.widths().get(at).copied())
            .flatten()
            .filter(|_| self.metrics.len() == self.chars.len());

        self.text.remove(at, 1)?;
        self.chars.remove(at);
        for layer in &mut self.layers {
            layer.on_delete(at, 1);
        }
        self.metrics.patch_delete(at, 1);

        if self.phase == Phase::LaidOut {
            if let Some(width) = old_width {
                if self.patch_delete(at, ch, width) {
                    return Ok(());
                }
            }
        }
        self.require_relayout();
        Ok(())
    }

    fn require_relayout(&mut self) {
        self.state.invalidate_all();
        self.metrics.invalidate_derived();
        self.mark_stale();
        emit_event(EVENT_RELAYOUT, &format!("chars={}", self.chars.len()));
    }

    /// True if a line can absorb an edit without a new pass.
    fn is_patchable(&self, line: &LineDescriptor) -> bool {
        let single = self.options.wrap == WrapPolicy::None || self.lines.len() == 1;
        single
            && line.substitutions.is_none()
            && line.suffix.is_none()
            && line.char_widths.is_none()
            && !line.is_trimmed()
            && !line.is_fictive()
            && self.backup.is_none()
            && self.options.max_height.is_none()
    }

    /// Index of the line whose visible range contains or ends at `at`.
    fn editable_line(&self, at: usize, inclusive_end: bool) -> Option<usize> {
        self.lines.iter().position(|line| {
            let contains = line.range().contains(&at) || (inclusive_end && line.end() == at);
            contains && !line.is_fictive()
        })
    }

    fn patch_insert(&mut self, at: usize, ch: char) -> bool {
        if !is_plain_char(ch) {
            return false;
        }
        let Some(index) = self.editable_line(at, true) else {
            return false;
        };
        if !self.is_patchable(&self.lines[index]) {
            return false;
        }
        let limit = self.wrap_limit();
        let line = &self.lines[index];
        let range = line.offset..line.end() + 1;

        let ctx = context(&self.chars, &self.base, &self.layers, self.fonts.as_ref());
        if !ctx.resolver().is_plain(&range) {
            return false;
        }
        let Ok(width) = self.metrics.char_width(&ctx, at) else {
            return false;
        };
        let new_width = line.width + width;
        if limit.is_some_and(|limit| new_width > limit) {
            return false;
        }

        self.lines[index].len += 1;
        self.lines[index].width = new_width;
        for later in &mut self.lines[index + 1..] {
            later.offset += 1;
        }
        self.finish_patch(index);
        true
    }

    fn patch_delete(&mut self, at: usize, ch: char, width: u32) -> bool {
        if !is_plain_char(ch) {
            return false;
        }
        let Some(index) = self.editable_line(at, false) else {
            return false;
        };
        if !self.is_patchable(&self.lines[index]) {
            return false;
        }
        let line = &self.lines[index];
        let range = line.offset..line.end() - 1;
        let ctx = context(&self.chars, &self.base, &self.layers, self.fonts.as_ref());
        if !range.is_empty() && !ctx.resolver().is_plain(&range) {
            return false;
        }

        self.lines[index].len -= 1;
        self.lines[index].width = self.lines[index].width.saturating_sub(width);
        for later in &mut self.lines[index + 1..] {
            later.offset -= 1;
        }
        self.finish_patch(index);
        true
    }

    /// Bring a patched line's height, the block height, the line tops and
    /// the draw type in line with its new characters.
    fn finish_patch(&mut self, index: usize) {
        let ctx = context(&self.chars, &self.base, &self.layers, self.fonts.as_ref());
        let line = &self.lines[index];
        let height = self
            .metrics
            .max_height(line.range())
            .unwrap_or_else(|| ctx.height_at(line.offset));
        let scan = self.scan_effects(&ctx);

        let old = self.lines[index].height;
        self.lines[index].height = height;
        self.height = self.height - old + height;
        self.rebuild_tops();
        self.classify(scan);
        self.metrics.invalidate_derived();
        self.state.invalidate_positions();
    }
}

impl std::fmt::Debug for TextController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextController")
            .field("chars", &self.chars.len())
            .field("lines", &self.lines.len())
            .field("phase", &self.phase)
            .field("area", &self.area)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;
    use crate::font::{FontTable, MonoFont};
    use crate::layout::LineFlags;
    use crate::style::{FigureRef, FontFace, FontSize, FontSpec, FontStyle};

    fn controller(text: &str) -> TextController {
        TextController::new(Arc::new(MonoFont::new(10, 12))).with_text(text)
    }

    #[test]
    fn test_layout_wraps_into_area() {
        let mut ctl = controller("The quick brown fox");
        ctl.layout(&StyleEffect::new(), 0, 0, 100, 0).unwrap();
        assert_eq!(ctl.phase(), Phase::LaidOut);
        assert_eq!(ctl.line_count(), 2);
        assert_eq!(ctl.line_text(0).unwrap(), "The quick");
        assert_eq!(ctl.line_text(1).unwrap(), "brown fox");
        assert_eq!(ctl.content_size(), (90, 24));
        assert_eq!(ctl.draw_type(), DrawType::MultiLine);
        assert!(ctl.state().is_valid());
    }

    #[test]
    fn test_style_change_marks_stale() {
        let mut ctl = controller("hello");
        ctl.layout(&StyleEffect::new(), 0, 0, 0, 0).unwrap();
        ctl.add_style(LayerId::BASE, 0, 2, StyleEffect::new().with_color(Rgba::RED))
            .unwrap();
        assert_eq!(ctl.phase(), Phase::NeedsRelayout);
        assert!(!ctl.state().metrics_valid);
        ctl.ensure_layout().unwrap();
        assert_eq!(ctl.phase(), Phase::LaidOut);
    }

    #[test]
    fn test_unknown_layer() {
        let mut ctl = controller("hello");
        assert_eq!(
            ctl.add_style(LayerId(9), 0, 1, StyleEffect::new()),
            Err(Error::UnknownLayer(9))
        );
        let id = ctl.add_layer();
        assert_eq!(id, LayerId(3));
        assert!(ctl.add_style(id, 0, 1, StyleEffect::new().bold()).is_ok());
        assert_eq!(ctl.layer(id).unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_interval_rejected() {
        let mut ctl = controller("hello");
        assert!(matches!(
            ctl.add_style(LayerId::BASE, 3, 5, StyleEffect::new()),
            Err(Error::InvalidInterval { .. })
        ));
    }

    #[test]
    fn test_insert_on_single_line_is_patched() {
        let mut ctl = controller("hello");
        ctl.layout(&StyleEffect::new(), 0, 0, 200, 0).unwrap();
        ctl.insert_char(5, '!').unwrap();
        assert_eq!(ctl.phase(), Phase::LaidOut);
        assert_eq!(ctl.lines()[0].len, 6);
        assert_eq!(ctl.lines()[0].width, 60);
        assert_eq!(ctl.text(), "hello!");

        ctl.delete_char(0).unwrap();
        assert_eq!(ctl.phase(), Phase::LaidOut);
        assert_eq!(ctl.lines()[0].len, 5);
        assert_eq!(ctl.lines()[0].width, 50);
        assert_eq!(ctl.text(), "ello!");
    }

    #[test]
    fn test_insert_that_overflows_requires_relayout() {
        let mut ctl = controller("hello");
        ctl.layout(&StyleEffect::new(), 0, 0, 50, 0).unwrap();
        ctl.insert_char(5, 'x').unwrap();
        assert_eq!(ctl.phase(), Phase::NeedsRelayout);
        ctl.ensure_layout().unwrap();
        assert_eq!(ctl.line_count(), 2);
    }

    #[test]
    fn test_newline_insert_requires_relayout() {
        let mut ctl = controller("hello");
        ctl.layout(&StyleEffect::new(), 0, 0, 0, 0).unwrap();
        ctl.insert_char(2, '\n').unwrap();
        assert_eq!(ctl.phase(), Phase::NeedsRelayout);
        ctl.ensure_layout().unwrap();
        assert_eq!(ctl.line_text(0).unwrap(), "he");
        assert_eq!(ctl.line_text(1).unwrap(), "llo");
    }

    #[test]
    fn test_edits_shift_overlays() {
        let mut ctl = controller("hello");
        ctl.add_style(LayerId::BASE, 2, 2, StyleEffect::new().bold())
            .unwrap();
        ctl.insert_char(0, 'x').unwrap();
        let span = |ctl: &TextController| {
            ctl.layer(LayerId::BASE)
                .unwrap()
                .iter()
                .next()
                .map(|iv| (iv.offset, iv.len))
        };
        assert_eq!(span(&ctl), Some((3, 2)));
        ctl.delete_char(3).unwrap();
        assert_eq!(span(&ctl), Some((3, 1)));
    }

    #[test]
    fn test_trim_lines_and_untrim() {
        let mut ctl = controller("one\ntwo\nthree");
        ctl.layout(&StyleEffect::new(), 0, 0, 200, 0).unwrap();
        assert_eq!(ctl.line_count(), 3);

        ctl.trim_lines(1).unwrap();
        assert!(ctl.is_trimmed());
        assert!(ctl.state().trimming_applied);
        assert_eq!(ctl.line_count(), 1);
        assert!(ctl.lines()[0].flags.contains(LineFlags::TRIMMED));
        assert_eq!(ctl.untrimmed_text(), "one\ntwo\nthree");

        ctl.untrim().unwrap();
        assert!(!ctl.is_trimmed());
        assert!(!ctl.state().trimming_applied);
        assert_eq!(ctl.line_count(), 3);
        assert_eq!(ctl.options().max_lines, None);
    }

    #[test]
    fn test_trim_cuts_text_and_keeps_backup() {
        let mut ctl = controller("abcdefgh");
        ctl.add_style(LayerId::BASE, 2, 4, StyleEffect::new().bold())
            .unwrap();
        ctl.layout(&StyleEffect::new(), 0, 0, 0, 0).unwrap();

        ctl.trim(3).unwrap();
        assert_eq!(ctl.text(), "abc");
        assert_eq!(ctl.untrimmed_text(), "abcdefgh");
        assert_eq!(ctl.line_display(0).unwrap(), "abc..");
        let spans: Vec<_> = ctl
            .layer(LayerId::BASE)
            .unwrap()
            .iter()
            .map(|iv| (iv.offset, iv.len))
            .collect();
        assert_eq!(spans, vec![(2, 1)]);

        // A second trim measures against the original text.
        ctl.trim(5).unwrap();
        assert_eq!(ctl.text(), "abcde");

        ctl.untrim().unwrap();
        assert_eq!(ctl.text(), "abcdefgh");
        assert_eq!(ctl.line_display(0).unwrap(), "abcdefgh");
        assert_eq!(ctl.layer(LayerId::BASE).unwrap().iter().next().map(|iv| iv.len), Some(4));
        assert_eq!(
            ctl.trim(9),
            Err(Error::OutOfBounds { index: 9, len: 8 })
        );
    }

    #[test]
    fn test_edit_after_trim_makes_cut_permanent() {
        let mut ctl = controller("abcdef");
        ctl.layout(&StyleEffect::new(), 0, 0, 0, 0).unwrap();
        ctl.trim(2).unwrap();
        ctl.insert_char(2, 'x').unwrap();
        assert_eq!(ctl.untrimmed_text(), "abx");

        ctl.untrim().unwrap();
        assert_eq!(ctl.text(), "abx");
        assert_eq!(ctl.line_display(0).unwrap(), "abx");
    }

    #[test]
    fn test_remove_exact_style_marks_stale() {
        let mut ctl = controller("hello");
        ctl.add_style(LayerId::HIGHLIGHT, 1, 2, StyleEffect::new().bold())
            .unwrap();
        ctl.layout(&StyleEffect::new(), 0, 0, 0, 0).unwrap();

        let other = Interval::new(1, 3, StyleEffect::new().bold());
        assert_eq!(ctl.remove_exact_style(LayerId::HIGHLIGHT, &other), Ok(false));
        assert_eq!(ctl.phase(), Phase::LaidOut);

        let stored = Interval::new(1, 2, StyleEffect::new().bold());
        assert_eq!(ctl.remove_exact_style(LayerId::HIGHLIGHT, &stored), Ok(true));
        assert_eq!(ctl.phase(), Phase::NeedsRelayout);
        assert!(ctl.layer(LayerId::HIGHLIGHT).unwrap().is_empty());
        assert_eq!(
            ctl.remove_exact_style(LayerId(7), &stored),
            Err(Error::UnknownLayer(7))
        );
    }

    #[test]
    fn test_patched_delete_shrinks_line_height() {
        let large = FontSpec::new(FontFace::System, FontStyle::empty(), FontSize::Large);
        let fonts = FontTable::new(MonoFont::new(10, 12)).with(large, MonoFont::new(10, 20));
        let mut ctl = TextController::new(Arc::new(fonts)).with_text("abc");
        ctl.add_style(LayerId::BASE, 1, 1, StyleEffect::new().with_size(FontSize::Large))
            .unwrap();
        ctl.layout(&StyleEffect::new(), 0, 0, 0, 0).unwrap();
        assert_eq!(ctl.content_size(), (30, 20));

        ctl.delete_char(1).unwrap();
        assert_eq!(ctl.phase(), Phase::LaidOut);
        assert_eq!(ctl.lines()[0].height, 12);
        assert_eq!(ctl.content_size(), (20, 12));
        let patched = ctl.lines().to_vec();
        ctl.measure().unwrap();
        assert_eq!(ctl.lines(), patched.as_slice());
    }

    #[test]
    fn test_try_with_options_returns_error() {
        let bad = LayoutOptions::default().page_lines(0);
        assert!(matches!(
            controller("x").try_with_options(bad),
            Err(Error::InvalidConfig(_))
        ));
        let ctl = controller("x").with_options(bad);
        assert_eq!(ctl.options(), &LayoutOptions::default());

        let ctl = controller("x")
            .try_with_options(LayoutOptions::default().max_lines(2))
            .unwrap();
        assert_eq!(ctl.options().max_lines, Some(2));
    }

    #[test]
    fn test_decorations_flag_follows_figures() {
        let mut ctl = controller("ab");
        ctl.layout(&StyleEffect::new(), 0, 0, 0, 0).unwrap();
        assert!(!ctl.state().decorations_present);
        ctl.add_style(LayerId::BASE, 0, 1, StyleEffect::new().with_figure(FigureRef(4)))
            .unwrap();
        ctl.ensure_layout().unwrap();
        assert!(ctl.state().decorations_present);
    }

    #[test]
    fn test_char_offset_finds_later_lines() {
        let mut ctl = controller("ab\ncd\nef").with_options(LayoutOptions::default().line_spacing(3));
        ctl.layout(&StyleEffect::new(), 0, 10, 0, 0).unwrap();
        assert_eq!(ctl.line_origin(2).unwrap(), (0, 40));
        assert_eq!(ctl.char_offset(15, 41).unwrap(), Some(7));
        assert_eq!(ctl.char_offset(15, 23).unwrap(), None);
        assert_eq!(ctl.char_offset(15, 9).unwrap(), None);
    }

    #[test]
    fn test_set_number() {
        let mut ctl = controller("");
        ctl.set_number(-1234);
        assert_eq!(ctl.text(), "-1234");
        ctl.ensure_layout().unwrap();
        assert_eq!(ctl.lines()[0].width, 50);
    }

    #[test]
    fn test_line_display_applies_substitutions_and_suffix() {
        let mut ctl = controller("ab\tc");
        ctl.layout(&StyleEffect::new(), 0, 0, 0, 0).unwrap();
        assert_eq!(ctl.line_text(0).unwrap(), "ab\tc");
        assert_eq!(ctl.line_display(0).unwrap(), "ab    c");

        let mut ctl = controller("abcdefghij")
            .with_options(LayoutOptions::default().wrap(WrapPolicy::None));
        ctl.layout(&StyleEffect::new(), 0, 0, 50, 0).unwrap();
        assert_eq!(ctl.line_display(0).unwrap(), "abc..");
    }

    #[test]
    fn test_line_queries() {
        let mut ctl = controller("ab\ncd");
        ctl.layout(&StyleEffect::new(), 5, 7, 100, 0).unwrap();
        assert_eq!(ctl.line_at(0).unwrap(), 0);
        assert_eq!(ctl.line_at(2).unwrap(), 0);
        assert_eq!(ctl.line_at(3).unwrap(), 1);
        assert_eq!(ctl.line_at(5).unwrap(), 1);
        assert!(ctl.line_at(6).is_err());
        assert_eq!(
            ctl.line(4),
            Err(Error::LineOutOfRange { line: 4, count: 2 })
        );

        assert_eq!(ctl.char_bounds(4).unwrap(), (15, 19, 10, 12));
        assert_eq!(ctl.char_offset(16, 20).unwrap(), Some(4));
        assert_eq!(ctl.char_offset(90, 20).unwrap(), None);
    }

    #[test]
    fn test_anchor_moves_lines() {
        let mut ctl = controller("ab").with_anchor(Anchor::RIGHT | Anchor::BOTTOM);
        ctl.layout(&StyleEffect::new(), 0, 0, 100, 50).unwrap();
        assert_eq!(ctl.line_origin(0).unwrap(), (80, 38));
    }

    #[test]
    fn test_invalid_options_rejected() {
        let mut ctl = controller("x");
        let bad = LayoutOptions::default().max_lines(0);
        assert!(matches!(ctl.set_options(bad), Err(Error::InvalidConfig(_))));
        assert_eq!(ctl.options().max_lines, None);
    }

    #[test]
    fn test_measure_with_swaps_lines() {
        let mut ctl = controller("aaaa bbbb");
        ctl.layout(&StyleEffect::new(), 0, 0, 60, 0).unwrap();
        assert_eq!(ctl.line_count(), 2);
        let lines = ctl.measure_with(WrapPolicy::None, None).unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].is_trimmed());
    }
}
