//! The line-breaking pass.

use super::metrics::is_break_char;
use super::{
    LayoutOptions, LineDescriptor, LineFlags, MeasureContext, MetricsCache, NewlinePolicy,
    SpaceTrim, Substitution, Suffix, TabColumns, TabPolicy, TabStop, WrapPolicy,
    fit_with_ellipsis, justify,
};
use crate::error::Result;

/// Result of one layout pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BreakOutcome {
    pub lines: Vec<LineDescriptor>,
    /// Columns established by the first tabbed line.
    pub tab_stops: Vec<TabStop>,
    /// Total height, line spacing included.
    pub height: u32,
    /// True if some text was hidden behind an ellipsis.
    pub trimmed: bool,
}

impl BreakOutcome {
    /// Width of the widest line.
    #[must_use]
    pub fn max_width(&self) -> u32 {
        self.lines.iter().map(|line| line.width).max().unwrap_or(0)
    }
}

/// Splits a character window into lines.
///
/// The breaker is a single forward pass. When a character overflows the
/// width limit, the current line is cut at the policy's break point and the
/// scan resumes right after the cut, so characters past the break point are
/// measured again for the next line.
#[derive(Clone, Copy, Debug)]
pub struct LineBreaker<'o> {
    options: &'o LayoutOptions,
    width: Option<u32>,
    tail_ellipsis: bool,
}

/// State of the line being built.
#[derive(Debug)]
struct BreakSession {
    start: usize,
    x: u32,
    advances: Vec<u32>,
    subs: Vec<Substitution>,
    /// Characters up to and including the last nice break point.
    nice: Option<usize>,
    field: usize,
    field_start: u32,
    pending_stops: Vec<TabStop>,
}

impl BreakSession {
    const fn new(start: usize) -> Self {
        Self {
            start,
            x: 0,
            advances: Vec::new(),
            subs: Vec::new(),
            nice: None,
            field: 0,
            field_start: 0,
            pending_stops: Vec::new(),
        }
    }

    fn len(&self) -> usize {
        self.advances.len()
    }

    fn push(&mut self, advance: u32, sub: Option<Substitution>) {
        self.x += advance;
        self.advances.push(advance);
        if let Some(sub) = sub {
            self.subs.push(sub);
        }
    }
}

/// Lines emitted so far.
#[derive(Debug, Default)]
struct BreakState {
    lines: Vec<LineDescriptor>,
    height: u32,
    tabs: TabColumns,
    stopped: bool,
}

impl<'o> LineBreaker<'o> {
    /// Create a breaker; `width` is the wrap limit, `None` for unbounded.
    #[must_use]
    pub const fn new(options: &'o LayoutOptions, width: Option<u32>) -> Self {
        Self {
            options,
            width,
            tail_ellipsis: false,
        }
    }

    /// Always end the last line with an ellipsis.
    #[must_use]
    pub const fn with_tail_ellipsis(mut self, enabled: bool) -> Self {
        self.tail_ellipsis = enabled;
        self
    }

    /// Run one pass over the context's characters.
    pub fn run(&self, ctx: &MeasureContext<'_>, metrics: &mut MetricsCache) -> Result<BreakOutcome> {
        self.options.validate()?;
        metrics.fill(ctx);
        let metrics = &*metrics;

        let chars = ctx.chars();
        let total = chars.len();
        let mut state = BreakState::default();
        let mut session = BreakSession::new(0);
        let mut index = 0;

        while index < total {
            let ch = chars[index];

            if ch == '\n' && self.options.newline == NewlinePolicy::Break {
                let keep = session.len();
                self.commit(ctx, metrics, &mut state, &session, keep, index + 1, LineFlags::NEWLINE, None);
                if state.stopped {
                    break;
                }
                index += 1;
                session = BreakSession::new(index);
                continue;
            }

            if ch == '\x0c' {
                let keep = session.len();
                let flags = LineFlags::NEWLINE | LineFlags::PAGE_BREAK;
                self.commit(ctx, metrics, &mut state, &session, keep, index + 1, flags, None);
                index += 1;
                if let Some(page) = self.options.page_lines {
                    while !state.stopped && state.lines.len() % page != 0 {
                        let mut filler = LineDescriptor::empty(index, ctx.height_at(index));
                        filler.flags = LineFlags::FICTIVE;
                        self.admit(ctx, metrics, &mut state, filler);
                    }
                }
                if state.stopped {
                    break;
                }
                session = BreakSession::new(index);
                continue;
            }

            let (advance, sub) = self.advance(ctx, metrics, &state.tabs, &session, index);

            if self.overflows(&session, advance) {
                let (keep, suffix) = self.cut_point(ctx, &session, ch);
                let mut next = session.start + keep;
                let mut flags = LineFlags::WRAPPED;
                if self.options.space_trim.trims() {
                    while next < total && chars[next] == ' ' {
                        next += 1;
                    }
                    if next < total
                        && chars[next] == '\n'
                        && self.options.newline == NewlinePolicy::Break
                    {
                        next += 1;
                        flags |= LineFlags::NEWLINE;
                    }
                }
                self.commit(ctx, metrics, &mut state, &session, keep, next, flags, suffix);
                if state.stopped {
                    break;
                }
                index = next;
                session = BreakSession::new(index);
                continue;
            }

            let is_tab_column = ch == '\t' && matches!(self.options.tab, TabPolicy::Columns(_));
            session.push(advance, sub);
            if is_tab_column {
                if !state.tabs.is_established() {
                    session.pending_stops.push(TabStop {
                        offset: session.field_start,
                        width: session.x - session.field_start,
                    });
                }
                session.field += 1;
                session.field_start = session.x;
            }
            if is_break_char(ch) {
                session.nice = Some(session.len());
            }
            index += 1;
        }

        if !state.stopped {
            let after_break = state
                .lines
                .last()
                .is_some_and(|line| line.flags.contains(LineFlags::NEWLINE));
            if session.start < total || state.lines.is_empty() || after_break {
                let flags = if session.start >= total && after_break {
                    LineFlags::FICTIVE
                } else {
                    LineFlags::empty()
                };
                let keep = session.len();
                self.commit(ctx, metrics, &mut state, &session, keep, total, flags, None);
            }
        }

        if self.tail_ellipsis && !state.stopped {
            self.apply_tail_ellipsis(ctx, metrics, &mut state);
        }

        let trimmed = state.lines.iter().any(LineDescriptor::is_trimmed);
        Ok(BreakOutcome {
            lines: state.lines,
            tab_stops: state.tabs.stops().to_vec(),
            height: state.height,
            trimmed,
        })
    }

    fn overflows(&self, session: &BreakSession, advance: u32) -> bool {
        self.options.wrap.wraps()
            && session.len() > 0
            && self
                .width
                .is_some_and(|limit| session.x.saturating_add(advance) > limit)
    }

    /// Advance of the character at `index` and its substitution, if any.
    fn advance(
        &self,
        ctx: &MeasureContext<'_>,
        metrics: &MetricsCache,
        tabs: &TabColumns,
        session: &BreakSession,
        index: usize,
    ) -> (u32, Option<Substitution>) {
        let ch = ctx.chars()[index];
        let substitute = |text: String, width: u32| {
            (
                width,
                Some(Substitution {
                    index,
                    text,
                    width,
                }),
            )
        };
        match ch {
            '\t' => match self.options.tab {
                TabPolicy::Fixed(spaces) => {
                    let text = " ".repeat(usize::from(spaces));
                    let width = ctx.text_width(index, &text);
                    substitute(text, width)
                }
                TabPolicy::Columns(spaces) => {
                    let step = ctx.text_width(index, " ") * u32::from(spaces);
                    let width = tabs.tab_advance(session.field, session.x, step);
                    substitute(String::new(), width)
                }
                TabPolicy::Escape => {
                    let width = ctx.text_width(index, "\\t");
                    substitute("\\t".to_string(), width)
                }
            },
            '\n' => match self.options.newline {
                NewlinePolicy::Glyph(glyph) => {
                    let text = glyph.to_string();
                    let width = ctx.text_width(index, &text);
                    substitute(text, width)
                }
                NewlinePolicy::Ignore | NewlinePolicy::Break => substitute(String::new(), 0),
            },
            '\r' => substitute(String::new(), 0),
            _ => {
                let width = metrics.widths()[index];
                if matches!(self.options.tab, TabPolicy::Columns(_)) {
                    let gap = ctx.text_width(index, " ");
                    let clipped = tabs
                        .clip_limit(session.field, gap)
                        .is_some_and(|limit| session.x + width > limit);
                    if clipped {
                        return substitute(String::new(), 0);
                    }
                }
                (width, None)
            }
        }
    }

    /// Number of characters kept on an overflowing line, and its suffix.
    fn cut_point(
        &self,
        ctx: &MeasureContext<'_>,
        session: &BreakSession,
        overflowing: char,
    ) -> (usize, Option<Suffix>) {
        let len = session.len();
        if overflowing == ' ' {
            return (len, None);
        }
        match self.options.wrap {
            WrapPolicy::NiceWord => (session.nice.unwrap_or(len), None),
            WrapPolicy::Hyphenation => match session.nice {
                Some(nice) => (nice, None),
                None => self.hyphenate(ctx, session),
            },
            WrapPolicy::Anywhere | WrapPolicy::None => (len, None),
        }
    }

    /// Largest prefix that still fits with a trailing hyphen.
    fn hyphenate(&self, ctx: &MeasureContext<'_>, session: &BreakSession) -> (usize, Option<Suffix>) {
        let limit = self.width.unwrap_or(u32::MAX);
        let mut keep = session.len();
        let mut prefix = session.x;
        while keep > 0 {
            let hyphen = ctx.text_width(session.start + keep - 1, Suffix::Hyphen.text());
            if prefix + hyphen <= limit {
                return (keep, Some(Suffix::Hyphen));
            }
            keep -= 1;
            prefix -= session.advances[keep];
        }
        (session.len(), None)
    }

    /// Turn the first `keep` characters of the session into a line that
    /// consumes everything up to `next`.
    #[allow(clippy::too_many_arguments)]
    fn commit(
        &self,
        ctx: &MeasureContext<'_>,
        metrics: &MetricsCache,
        state: &mut BreakState,
        session: &BreakSession,
        keep: usize,
        next: usize,
        mut flags: LineFlags,
        suffix: Option<Suffix>,
    ) {
        let chars = ctx.chars();
        let start = session.start;
        let mut len = keep.min(session.len());
        if flags.contains(LineFlags::WRAPPED) && self.options.space_trim.trims() {
            while len > 0 && chars[start + len - 1] == ' ' {
                len -= 1;
            }
        }
        let end = start + len;
        let advances = &session.advances[..len];
        let subs: Vec<Substitution> = session
            .subs
            .iter()
            .filter(|sub| sub.index < end)
            .cloned()
            .collect();

        let height = metrics
            .max_height(start..end)
            .unwrap_or_else(|| ctx.height_at(start));
        let mut line = LineDescriptor {
            offset: start,
            len,
            skip: next.saturating_sub(end),
            width: advances.iter().sum(),
            height,
            substitutions: (!subs.is_empty()).then_some(subs),
            char_widths: None,
            suffix: None,
            flags: LineFlags::empty(),
        };
        if let Some(suffix) = suffix {
            line.width += ctx.text_width(end.saturating_sub(1).max(start), suffix.text());
            line.suffix = Some(suffix);
        }

        if let Some(limit) = self.width {
            if !self.options.wrap.wraps() && line.width > limit {
                apply_ellipsis(ctx, &mut line, advances, limit, next);
            }
        }

        let justifiable = self.options.space_trim == SpaceTrim::Justified
            && flags.contains(LineFlags::WRAPPED)
            && !flags.contains(LineFlags::NEWLINE)
            && line.suffix.is_none();
        if justifiable {
            if let Some(limit) = self.width.filter(|limit| *limit > line.width) {
                if let Some(widths) = justify(advances, &chars[start..end], limit - line.width) {
                    line.char_widths = Some(widths);
                    line.width = limit;
                    flags |= LineFlags::JUSTIFIED;
                }
            }
        }
        line.flags |= flags;

        if !session.pending_stops.is_empty() {
            state.tabs.establish(session.pending_stops.clone());
        }
        self.admit(ctx, metrics, state, line);
    }

    /// Append a line unless a line or height limit stops the pass.
    fn admit(
        &self,
        ctx: &MeasureContext<'_>,
        metrics: &MetricsCache,
        state: &mut BreakState,
        line: LineDescriptor,
    ) {
        let spacing = if state.lines.is_empty() {
            0
        } else {
            self.options.line_spacing
        };
        let over_lines = self
            .options
            .max_lines
            .is_some_and(|max| state.lines.len() >= max);
        let over_height = self.options.max_height.is_some_and(|max| {
            !state.lines.is_empty() && state.height + spacing + line.height > max
        });

        if over_lines || over_height {
            let hides_text = line.len > 0 || line.next_offset() < ctx.len();
            if hides_text {
                self.trim_last(ctx, metrics, state);
            }
            state.stopped = true;
            return;
        }

        state.height += spacing + line.height;
        state.lines.push(line);
    }

    /// Rewrite the last emitted line so it ends with an ellipsis and hides
    /// the rest of the window.
    fn trim_last(&self, ctx: &MeasureContext<'_>, metrics: &MetricsCache, state: &mut BreakState) {
        let Some(last) = state.lines.last_mut() else {
            return;
        };
        last.char_widths = None;
        let advances = last.advances(metrics.widths());
        let budget = self
            .width
            .unwrap_or_else(|| advances.iter().sum::<u32>());
        apply_ellipsis(ctx, last, &advances, budget, ctx.len());
    }

    /// Append an ellipsis to the last real line, dropping any filler lines
    /// after it.
    fn apply_tail_ellipsis(
        &self,
        ctx: &MeasureContext<'_>,
        metrics: &MetricsCache,
        state: &mut BreakState,
    ) {
        while state.lines.len() > 1 && state.lines.last().is_some_and(LineDescriptor::is_fictive) {
            if let Some(filler) = state.lines.pop() {
                state.height = state
                    .height
                    .saturating_sub(filler.height + self.options.line_spacing);
            }
        }
        let Some(last) = state.lines.last_mut() else {
            return;
        };
        last.char_widths = None;
        let advances = last.advances(metrics.widths());
        apply_ellipsis(
            ctx,
            last,
            &advances,
            self.width.unwrap_or(u32::MAX),
            ctx.len(),
        );
    }
}

/// Keep the longest prefix of `line` that fits `budget` with an ellipsis,
/// hiding everything up to `hidden_to`.
fn apply_ellipsis(
    ctx: &MeasureContext<'_>,
    line: &mut LineDescriptor,
    advances: &[u32],
    budget: u32,
    hidden_to: usize,
) {
    let anchor = line.end().saturating_sub(1).max(line.offset);
    let dot = ctx.text_width(anchor, ".");
    let double_dot = ctx.text_width(anchor, "..");
    let fit = fit_with_ellipsis(advances, budget, dot, double_dot);

    line.len = fit.keep.min(line.len);
    let end = line.end();
    line.skip = hidden_to.saturating_sub(end);
    if let Some(subs) = &mut line.substitutions {
        subs.retain(|sub| sub.index < end);
    }
    if line.substitutions.as_ref().is_some_and(Vec::is_empty) {
        line.substitutions = None;
    }
    line.char_widths = None;
    line.suffix = Some(Suffix::Ellipsis(fit.cue));
    line.width = fit.width;
    line.flags.remove(LineFlags::JUSTIFIED);
    line.flags.insert(LineFlags::TRIMMED);
}
