//! Font metrics providers.
//!
//! Layout never rasterizes glyphs; it only asks a [`FontRegistry`] for the
//! [`FontMetrics`] of a resolved [`FontSpec`]. Two providers ship with the
//! crate:
//!
//! - [`MonoFont`]: every character has the same advance (tests, bitmap fonts)
//! - [`CellFont`]: terminal-style cells sized by Unicode display width
//!
//! [`FontTable`] maps individual specs to providers with a fallback.

use crate::style::FontSpec;
use crate::unicode::{WidthMethod, display_width_char_with_method};
use std::collections::HashMap;

/// Metrics of one concrete font.
pub trait FontMetrics: Send + Sync {
    /// Advance width of a character in pixels.
    fn char_width(&self, ch: char) -> u32;

    /// Line height in pixels.
    fn height(&self) -> u32;

    /// Width of a string in pixels.
    fn string_width(&self, s: &str) -> u32 {
        s.chars().map(|ch| self.char_width(ch)).sum()
    }

    /// Width of `len` characters of `s` starting at character `start`.
    fn substring_width(&self, s: &str, start: usize, len: usize) -> u32 {
        s.chars()
            .skip(start)
            .take(len)
            .map(|ch| self.char_width(ch))
            .sum()
    }
}

/// Lookup from a resolved font reference to its metrics.
pub trait FontRegistry: Send + Sync {
    fn metrics(&self, font: &FontSpec) -> &dyn FontMetrics;
}

/// Fixed-advance font.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonoFont {
    advance: u32,
    height: u32,
}

impl MonoFont {
    /// Create a font where every character is `advance` pixels wide.
    #[must_use]
    pub const fn new(advance: u32, height: u32) -> Self {
        Self { advance, height }
    }

    #[must_use]
    pub const fn advance(&self) -> u32 {
        self.advance
    }
}

impl FontMetrics for MonoFont {
    fn char_width(&self, _ch: char) -> u32 {
        self.advance
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn string_width(&self, s: &str) -> u32 {
        s.chars().count() as u32 * self.advance
    }
}

/// A single font serves every spec.
impl FontRegistry for MonoFont {
    fn metrics(&self, _font: &FontSpec) -> &dyn FontMetrics {
        self
    }
}

/// Cell-grid font: a character spans as many cells as its display width.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellFont {
    cell_width: u32,
    cell_height: u32,
    method: WidthMethod,
}

impl CellFont {
    /// Create a cell font with the default width method.
    #[must_use]
    pub const fn new(cell_width: u32, cell_height: u32) -> Self {
        Self {
            cell_width,
            cell_height,
            method: WidthMethod::WcWidth,
        }
    }

    /// Use a different treatment for ambiguous-width characters.
    #[must_use]
    pub const fn with_width_method(mut self, method: WidthMethod) -> Self {
        self.method = method;
        self
    }
}

impl FontMetrics for CellFont {
    fn char_width(&self, ch: char) -> u32 {
        display_width_char_with_method(ch, self.method) as u32 * self.cell_width
    }

    fn height(&self) -> u32 {
        self.cell_height
    }
}

impl FontRegistry for CellFont {
    fn metrics(&self, _font: &FontSpec) -> &dyn FontMetrics {
        self
    }
}

/// Per-spec font table with a fallback.
pub struct FontTable {
    fallback: Box<dyn FontMetrics>,
    entries: HashMap<FontSpec, Box<dyn FontMetrics>>,
}

impl FontTable {
    /// Create a table where unknown specs use `fallback`.
    #[must_use]
    pub fn new(fallback: impl FontMetrics + 'static) -> Self {
        Self {
            fallback: Box::new(fallback),
            entries: HashMap::new(),
        }
    }

    /// Register metrics for one spec.
    #[must_use]
    pub fn with(mut self, font: FontSpec, metrics: impl FontMetrics + 'static) -> Self {
        self.entries.insert(font, Box::new(metrics));
        self
    }

    /// Number of explicit entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FontRegistry for FontTable {
    fn metrics(&self, font: &FontSpec) -> &dyn FontMetrics {
        self.entries
            .get(font)
            .map_or(self.fallback.as_ref(), |metrics| metrics.as_ref())
    }
}

impl std::fmt::Debug for FontTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontTable")
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}
