//! Drawing laid-out text through an abstract graphics sink.
//!
//! Rendering never touches pixels. [`LineRenderer`] walks the line table of
//! a [`TextController`](crate::TextController), splits every line into
//! [`RenderLeaf`]s of uniform style and issues draw calls to a
//! [`GraphicsSink`]. Effects the sink cannot express on its own (figures
//! behind text and glyph masks) go through an [`FxPainter`].
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use textfx::{
//!     Anchor, FontSpec, GraphicsSink, LineRenderer, MonoFont, NoEffects, RenderWindow,
//!     StyleEffect, TextColor, TextController,
//! };
//!
//! #[derive(Default)]
//! struct Collect(Vec<(String, i32, i32)>);
//!
//! impl GraphicsSink for Collect {
//!     fn set_font(&mut self, _font: FontSpec) {}
//!     fn set_color(&mut self, _color: TextColor) {}
//!     fn draw_chars(&mut self, chars: &[char], x: i32, y: i32, _anchor: Anchor) {
//!         self.0.push((chars.iter().collect(), x, y));
//!     }
//! }
//!
//! let mut text = TextController::new(Arc::new(MonoFont::new(10, 12))).with_text("ab\ncd");
//! text.layout(&StyleEffect::new(), 0, 0, 100, 0).unwrap();
//!
//! let mut sink = Collect::default();
//! let stats = LineRenderer::new(RenderWindow::default())
//!     .render(&mut text, &mut sink, &mut NoEffects)
//!     .unwrap();
//! assert_eq!(stats.lines, 2);
//! assert_eq!(sink.0, vec![("ab".to_string(), 0, 0), ("cd".to_string(), 0, 12)]);
//! ```

mod leaf;
mod line;

pub use leaf::{LeafSet, RenderLeaf};
pub use line::{LineRenderer, RenderStats, RenderWindow};

use crate::layout::Anchor;
use crate::style::{FigureRef, FontSpec, MaskRef, TextColor};

/// Destination of glyph draw calls.
pub trait GraphicsSink {
    /// Font for the following draw calls.
    fn set_font(&mut self, font: FontSpec);

    /// Color for the following draw calls.
    fn set_color(&mut self, color: TextColor);

    /// Draw a run of characters with its anchor point at `(x, y)`.
    fn draw_chars(&mut self, chars: &[char], x: i32, y: i32, anchor: Anchor);

    /// Draw a single character.
    fn draw_char(&mut self, ch: char, x: i32, y: i32, anchor: Anchor) {
        self.draw_chars(&[ch], x, y, anchor);
    }
}

/// Paints effects referenced by opaque ids.
pub trait FxPainter {
    /// Paint a background figure over a box.
    fn paint_figure(
        &mut self,
        sink: &mut dyn GraphicsSink,
        figure: FigureRef,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    );

    /// Draw characters through a glyph mask.
    fn draw_mask(
        &mut self,
        sink: &mut dyn GraphicsSink,
        mask: MaskRef,
        chars: &[char],
        x: i32,
        y: i32,
        font: FontSpec,
    );
}

/// Painter without effects: figures are skipped and masked text is drawn
/// plainly.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoEffects;

impl FxPainter for NoEffects {
    fn paint_figure(
        &mut self,
        _sink: &mut dyn GraphicsSink,
        _figure: FigureRef,
        _x: i32,
        _y: i32,
        _width: u32,
        _height: u32,
    ) {
    }

    fn draw_mask(
        &mut self,
        sink: &mut dyn GraphicsSink,
        _mask: MaskRef,
        chars: &[char],
        x: i32,
        y: i32,
        font: FontSpec,
    ) {
        sink.set_font(font);
        sink.draw_chars(chars, x, y, Anchor::default());
    }
}
