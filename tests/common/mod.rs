#![allow(clippy::nursery)] // Test infra prioritizes clarity over pedantry
#![allow(clippy::pedantic)] // Test infra prioritizes clarity over pedantry
#![allow(dead_code)] // Not every test binary uses every helper

//! Shared fixtures: recording sink and painter, controller builders.

use std::sync::Arc;
use textfx::{
    Anchor, FigureRef, FontFace, FontSize, FontSpec, FontStyle, FontTable, FxPainter,
    GraphicsSink, LayoutOptions, MaskRef, MonoFont, StyleEffect, TextColor, TextController,
};

/// One call received by a [`RecordingSink`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SinkCall {
    Font(FontSpec),
    Color(TextColor),
    Draw { text: String, x: i32, y: i32 },
}

/// Sink that records every call in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub calls: Vec<SinkCall>,
}

impl RecordingSink {
    /// Only the draw calls, as `(text, x, y)`.
    pub fn draws(&self) -> Vec<(String, i32, i32)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                SinkCall::Draw { text, x, y } => Some((text.clone(), *x, *y)),
                _ => None,
            })
            .collect()
    }

    /// Concatenated text of every draw call.
    pub fn drawn_text(&self) -> String {
        self.draws().into_iter().map(|(text, _, _)| text).collect()
    }
}

impl GraphicsSink for RecordingSink {
    fn set_font(&mut self, font: FontSpec) {
        self.calls.push(SinkCall::Font(font));
    }

    fn set_color(&mut self, color: TextColor) {
        self.calls.push(SinkCall::Color(color));
    }

    fn draw_chars(&mut self, chars: &[char], x: i32, y: i32, _anchor: Anchor) {
        self.calls.push(SinkCall::Draw {
            text: chars.iter().collect(),
            x,
            y,
        });
    }
}

/// Painter that records figures and masks, drawing masked text plainly.
#[derive(Debug, Default)]
pub struct RecordingPainter {
    pub figures: Vec<(FigureRef, i32, i32, u32, u32)>,
    pub masks: Vec<(MaskRef, String, i32, i32)>,
}

impl FxPainter for RecordingPainter {
    fn paint_figure(
        &mut self,
        _sink: &mut dyn GraphicsSink,
        figure: FigureRef,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    ) {
        self.figures.push((figure, x, y, width, height));
    }

    fn draw_mask(
        &mut self,
        sink: &mut dyn GraphicsSink,
        mask: MaskRef,
        chars: &[char],
        x: i32,
        y: i32,
        font: FontSpec,
    ) {
        self.masks.push((mask, chars.iter().collect(), x, y));
        sink.set_font(font);
        sink.draw_chars(chars, x, y, Anchor::default());
    }
}

/// Controller with a 10x12 monospace font.
pub fn mono_controller(text: &str) -> TextController {
    TextController::new(Arc::new(MonoFont::new(10, 12))).with_text(text)
}

/// Controller whose sizes measure differently: small 8x10, medium 10x12
/// and large 14x20.
pub fn sized_controller(text: &str) -> TextController {
    let spec = |size| FontSpec::new(FontFace::System, FontStyle::empty(), size);
    let fonts = FontTable::new(MonoFont::new(10, 12))
        .with(spec(FontSize::Small), MonoFont::new(8, 10))
        .with(spec(FontSize::Large), MonoFont::new(14, 20));
    TextController::new(Arc::new(fonts)).with_text(text)
}

/// Lay `text` out at `width` pixels and return the visible text of every line.
pub fn wrap_lines(text: &str, options: LayoutOptions, width: u32) -> Vec<String> {
    let mut ctl = mono_controller(text).with_options(options);
    ctl.layout(&StyleEffect::new(), 0, 0, width, 0)
        .expect("layout");
    (0..ctl.line_count())
        .map(|line| ctl.line_text(line).expect("line text"))
        .collect()
}

/// Raw text of every line of a laid-out controller.
pub fn line_texts(ctl: &TextController) -> Vec<String> {
    (0..ctl.line_count())
        .map(|line| ctl.line_text(line).expect("line text"))
        .collect()
}

/// Assert that the lines of `ctl` account for every character exactly once.
pub fn assert_full_coverage(ctl: &TextController) {
    let mut offset = 0;
    for (index, line) in ctl.lines().iter().enumerate() {
        assert_eq!(line.offset, offset, "line {index} does not continue the previous one");
        offset = line.next_offset();
    }
    assert_eq!(offset, ctl.char_count(), "lines do not reach the end of the text");
}
