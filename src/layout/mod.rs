//! Line breaking, metrics caching and line descriptors.
//!
//! A layout pass turns the visible characters of a buffer into an ordered
//! list of [`LineDescriptor`]s:
//!
//! - [`MetricsCache`] caches per-character widths, heights and positions
//! - [`LineBreaker`] runs one pass under a [`WrapPolicy`]
//! - [`fit_with_ellipsis`], [`justify`] and [`TabColumns`] are the helpers
//!   the breaker uses for trimming, justification and tab alignment
//!
//! Every line accounts for the characters it consumed:
//! `offset + len + skip` of one line is the `offset` of the next, where
//! `skip` covers trimmed spaces, the terminating newline and characters
//! hidden behind an ellipsis.

mod breaker;
mod ellipsis;
mod justify;
mod metrics;
mod tabs;

pub use breaker::{BreakOutcome, LineBreaker};
pub use ellipsis::{EllipsisCue, EllipsisFit, fit_with_ellipsis};
pub use justify::justify;
pub use metrics::{BreakSpan, CharPosition, MeasureContext, MetricsCache};
pub use tabs::{TabColumns, TabStop};

use crate::error::{Error, Result};
use bitflags::bitflags;
use std::ops::Range;

/// Word-wrap policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WrapPolicy {
    /// No wrapping; overlong lines are truncated with an ellipsis.
    None,
    /// Break exactly at the width limit.
    Anywhere,
    /// Break at the last space or break punctuation.
    #[default]
    NiceWord,
    /// Like `NiceWord`, but hyphenate words wider than the line.
    Hyphenation,
}

impl WrapPolicy {
    /// Stable numeric code.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Anywhere => 1,
            Self::NiceWord => 2,
            Self::Hyphenation => 3,
        }
    }

    /// Whether lines may wrap at all.
    #[must_use]
    pub const fn wraps(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl TryFrom<u8> for WrapPolicy {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Self::None),
            1 => Ok(Self::Anywhere),
            2 => Ok(Self::NiceWord),
            3 => Ok(Self::Hyphenation),
            _ => Err(Error::InvalidConfig(format!("unknown wrap policy {code}"))),
        }
    }
}

/// What happens to spaces at wrap boundaries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SpaceTrim {
    /// Keep every space.
    None,
    /// Drop trailing spaces of wrapped lines and leading spaces of
    /// continuation lines.
    #[default]
    Normal,
    /// `Normal`, then spread each wrapped line's slack over its spaces.
    Justified,
}

impl SpaceTrim {
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Normal => 1,
            Self::Justified => 2,
        }
    }

    #[must_use]
    pub const fn trims(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl TryFrom<u8> for SpaceTrim {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Self::None),
            1 => Ok(Self::Normal),
            2 => Ok(Self::Justified),
            _ => Err(Error::InvalidConfig(format!("unknown space trim {code}"))),
        }
    }
}

/// Treatment of `'\n'`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NewlinePolicy {
    /// End the line.
    #[default]
    Break,
    /// Hide the newline and keep going on the same line.
    Ignore,
    /// Draw a visible glyph instead and keep going on the same line.
    Glyph(char),
}

impl NewlinePolicy {
    /// Default glyph for [`NewlinePolicy::Glyph`].
    pub const PILCROW: char = '¶';

    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Break => 0,
            Self::Ignore => 1,
            Self::Glyph(_) => 2,
        }
    }
}

impl TryFrom<u8> for NewlinePolicy {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Self::Break),
            1 => Ok(Self::Ignore),
            2 => Ok(Self::Glyph(Self::PILCROW)),
            _ => Err(Error::InvalidConfig(format!("unknown newline policy {code}"))),
        }
    }
}

/// Treatment of `'\t'`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TabPolicy {
    /// Replace each tab by this many spaces.
    Fixed(u8),
    /// Align tab-separated fields to the columns of the first tabbed line.
    /// Until columns exist, tabs advance to the next multiple of this many
    /// space widths.
    Columns(u8),
    /// Draw the tab as the two characters `\t`.
    Escape,
}

impl Default for TabPolicy {
    fn default() -> Self {
        Self::Fixed(4)
    }
}

impl TabPolicy {
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Fixed(_) => 0,
            Self::Columns(_) => 1,
            Self::Escape => 2,
        }
    }
}

impl TryFrom<u8> for TabPolicy {
    type Error = Error;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Self::Fixed(4)),
            1 => Ok(Self::Columns(4)),
            2 => Ok(Self::Escape),
            _ => Err(Error::InvalidConfig(format!("unknown tab policy {code}"))),
        }
    }
}

/// Layout configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LayoutOptions {
    pub wrap: WrapPolicy,
    pub space_trim: SpaceTrim,
    pub newline: NewlinePolicy,
    pub tab: TabPolicy,
    /// Stop after this many lines (the last one gets an ellipsis).
    pub max_lines: Option<usize>,
    /// Stop before the lines exceed this many pixels.
    pub max_height: Option<u32>,
    /// Lines per page; a form feed pads with empty lines up to the next page.
    pub page_lines: Option<usize>,
    /// Extra pixels between consecutive lines.
    pub line_spacing: u32,
    /// Width limit overriding the area width.
    pub wrap_width: Option<u32>,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            wrap: WrapPolicy::NiceWord,
            space_trim: SpaceTrim::Normal,
            newline: NewlinePolicy::Break,
            tab: TabPolicy::default(),
            max_lines: None,
            max_height: None,
            page_lines: None,
            line_spacing: 0,
            wrap_width: None,
        }
    }
}

impl LayoutOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn wrap(mut self, wrap: WrapPolicy) -> Self {
        self.wrap = wrap;
        self
    }

    #[must_use]
    pub const fn space_trim(mut self, trim: SpaceTrim) -> Self {
        self.space_trim = trim;
        self
    }

    #[must_use]
    pub const fn newline(mut self, newline: NewlinePolicy) -> Self {
        self.newline = newline;
        self
    }

    #[must_use]
    pub const fn tab(mut self, tab: TabPolicy) -> Self {
        self.tab = tab;
        self
    }

    #[must_use]
    pub const fn max_lines(mut self, lines: usize) -> Self {
        self.max_lines = Some(lines);
        self
    }

    #[must_use]
    pub const fn max_height(mut self, height: u32) -> Self {
        self.max_height = Some(height);
        self
    }

    #[must_use]
    pub const fn page_lines(mut self, lines: usize) -> Self {
        self.page_lines = Some(lines);
        self
    }

    #[must_use]
    pub const fn line_spacing(mut self, spacing: u32) -> Self {
        self.line_spacing = spacing;
        self
    }

    #[must_use]
    pub const fn wrap_width(mut self, width: u32) -> Self {
        self.wrap_width = Some(width);
        self
    }

    /// Reject option values no layout pass can honour.
    pub fn validate(&self) -> Result<()> {
        match self.tab {
            TabPolicy::Fixed(0) | TabPolicy::Columns(0) => {
                return Err(Error::InvalidConfig("tab width must be at least one space".into()));
            }
            _ => {}
        }
        if self.page_lines == Some(0) {
            return Err(Error::InvalidConfig("page length must be at least one line".into()));
        }
        if self.max_lines == Some(0) {
            return Err(Error::InvalidConfig("max_lines must be at least one".into()));
        }
        Ok(())
    }
}

bitflags! {
    /// Placement of text inside its area.
    #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
    pub struct Anchor: u8 {
        const LEFT    = 0x01;
        const HCENTER = 0x02;
        const RIGHT   = 0x04;
        const TOP     = 0x08;
        const VCENTER = 0x10;
        const BOTTOM  = 0x20;
    }
}

impl Default for Anchor {
    fn default() -> Self {
        Self::LEFT | Self::TOP
    }
}

impl Anchor {
    /// Horizontal offset of a box of `inner` pixels inside `outer` pixels.
    #[must_use]
    pub const fn align_x(self, outer: u32, inner: u32) -> u32 {
        let free = outer.saturating_sub(inner);
        if self.contains(Self::RIGHT) {
            free
        } else if self.contains(Self::HCENTER) {
            free / 2
        } else {
            0
        }
    }

    /// Vertical offset of a box of `inner` pixels inside `outer` pixels.
    #[must_use]
    pub const fn align_y(self, outer: u32, inner: u32) -> u32 {
        let free = outer.saturating_sub(inner);
        if self.contains(Self::BOTTOM) {
            free
        } else if self.contains(Self::VCENTER) {
            free / 2
        } else {
            0
        }
    }
}

/// Rectangle text is laid out into.
///
/// A zero width means no width limit and a zero height no height limit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Area {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Area {
    #[must_use]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Width limit for wrapping, if any.
    #[must_use]
    pub const fn width_limit(&self) -> Option<u32> {
        if self.width == 0 {
            None
        } else {
            Some(self.width)
        }
    }
}

bitflags! {
    /// Per-line flags.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
    pub struct LineFlags: u8 {
        /// Slack was spread over the spaces; see `char_widths`.
        const JUSTIFIED  = 0x01;
        /// Empty filler line (trailing newline or page padding).
        const FICTIVE    = 0x02;
        /// Ended by a newline in the buffer.
        const NEWLINE    = 0x04;
        /// Text was hidden behind an ellipsis.
        const TRIMMED    = 0x08;
        /// Ended by wrapping.
        const WRAPPED    = 0x10;
        /// Ended by a form feed.
        const PAGE_BREAK = 0x20;
    }
}

/// Replacement glyphs drawn for one buffer character.
///
/// Empty `text` hides the character.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Substitution {
    /// Window offset of the replaced character.
    pub index: usize,
    pub text: String,
    pub width: u32,
}

/// Cue drawn after the last visible character of a line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Suffix {
    Hyphen,
    Ellipsis(EllipsisCue),
}

impl Suffix {
    /// Glyphs of the cue.
    #[must_use]
    pub const fn text(self) -> &'static str {
        match self {
            Self::Hyphen => "-",
            Self::Ellipsis(cue) => cue.text(),
        }
    }
}

/// One visual line.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct LineDescriptor {
    /// Window offset of the first character.
    pub offset: usize,
    /// Number of visible characters.
    pub len: usize,
    /// Characters consumed after the visible ones but not shown.
    pub skip: usize,
    /// Pixel width including substitutions and the suffix.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
    /// Sorted by `index`; `None` when the line has no substitution.
    pub substitutions: Option<Vec<Substitution>>,
    /// Per-character advances, only materialized for justified lines.
    pub char_widths: Option<Vec<u32>>,
    pub suffix: Option<Suffix>,
    pub flags: LineFlags,
}

impl LineDescriptor {
    /// Create an empty line at `offset`.
    #[must_use]
    pub fn empty(offset: usize, height: u32) -> Self {
        Self {
            offset,
            height,
            ..Self::default()
        }
    }

    /// Exclusive end of the visible characters.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.offset + self.len
    }

    /// Visible character range.
    #[must_use]
    pub const fn range(&self) -> Range<usize> {
        self.offset..self.end()
    }

    /// Offset of the first character after everything this line consumed.
    #[must_use]
    pub const fn next_offset(&self) -> usize {
        self.offset + self.len + self.skip
    }

    /// Substitution of the character at a window offset.
    #[must_use]
    pub fn substitution(&self, index: usize) -> Option<&Substitution> {
        let subs = self.substitutions.as_ref()?;
        subs.binary_search_by_key(&index, |sub| sub.index)
            .ok()
            .map(|pos| &subs[pos])
    }

    #[must_use]
    pub const fn is_fictive(&self) -> bool {
        self.flags.contains(LineFlags::FICTIVE)
    }

    #[must_use]
    pub const fn is_justified(&self) -> bool {
        self.flags.contains(LineFlags::JUSTIFIED)
    }

    #[must_use]
    pub const fn is_trimmed(&self) -> bool {
        self.flags.contains(LineFlags::TRIMMED)
    }

    /// Advance of every visible character.
    ///
    /// `base` holds the cached width of every window character; justified
    /// widths and substitution widths take precedence.
    #[must_use]
    pub fn advances(&self, base: &[u32]) -> Vec<u32> {
        if let Some(widths) = &self.char_widths {
            return widths.clone();
        }
        self.range()
            .map(|idx| {
                self.substitution(idx)
                    .map_or_else(|| base.get(idx).copied().unwrap_or(0), |sub| sub.width)
            })
            .collect()
    }

    /// Width of the suffix cue, if any, given the line's total width.
    #[must_use]
    pub fn suffix_width(&self, base: &[u32]) -> u32 {
        if self.suffix.is_none() {
            return 0;
        }
        let glyphs: u32 = self.advances(base).iter().sum();
        self.width.saturating_sub(glyphs)
    }
}
