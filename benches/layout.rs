//! Layout and rendering performance benchmarks.

#![allow(clippy::semicolon_if_nothing_returned)]

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;
use textfx::{
    Anchor, FontSpec, GraphicsSink, LayerId, LayoutOptions, LineRenderer, MonoFont, NoEffects,
    RenderWindow, Rgba, SpaceTrim, StyleEffect, TextColor, TextController, WrapPolicy,
};

/// Sink that only counts draw calls.
#[derive(Default)]
struct NullSink {
    draws: usize,
}

impl GraphicsSink for NullSink {
    fn set_font(&mut self, _font: FontSpec) {}

    fn set_color(&mut self, _color: TextColor) {}

    fn draw_chars(&mut self, chars: &[char], _x: i32, _y: i32, _anchor: Anchor) {
        self.draws += chars.len();
    }
}

fn paragraph(words: usize) -> String {
    const WORDS: [&str; 8] = ["lorem", "ipsum", "dolor", "sit", "amet", "elit", "sed", "do"];
    (0..words)
        .map(|i| WORDS[i % WORDS.len()])
        .collect::<Vec<_>>()
        .join(" ")
}

fn controller(text: &str, options: LayoutOptions) -> TextController {
    TextController::new(Arc::new(MonoFont::new(8, 16)))
        .with_text(text)
        .with_options(options)
}

fn wrap_policies(c: &mut Criterion) {
    let text = paragraph(2_000);
    let mut group = c.benchmark_group("wrap");
    for (name, wrap) in [
        ("anywhere", WrapPolicy::Anywhere),
        ("nice_word", WrapPolicy::NiceWord),
        ("hyphenation", WrapPolicy::Hyphenation),
    ] {
        group.bench_with_input(BenchmarkId::new(name, text.len()), &wrap, |b, &wrap| {
            let mut ctl = controller(&text, LayoutOptions::default().wrap(wrap));
            ctl.layout(&StyleEffect::new(), 0, 0, 640, 0).unwrap();
            b.iter(|| {
                ctl.measure().unwrap();
                black_box(ctl.line_count())
            });
        });
    }
    group.finish();
}

fn justified(c: &mut Criterion) {
    let text = paragraph(2_000);
    let options = LayoutOptions::default().space_trim(SpaceTrim::Justified);
    c.bench_function("layout_justified_2k_words", |b| {
        let mut ctl = controller(&text, options);
        ctl.layout(&StyleEffect::new(), 0, 0, 640, 0).unwrap();
        b.iter(|| {
            ctl.measure().unwrap();
            black_box(ctl.content_size())
        });
    });
}

fn styled_layout(c: &mut Criterion) {
    let text = paragraph(1_000);
    c.bench_function("layout_styled_cold", |b| {
        b.iter(|| {
            let mut ctl = controller(black_box(&text), LayoutOptions::default());
            for start in (0..text.len() - 10).step_by(50) {
                ctl.add_style(LayerId::HIGHLIGHT, start, 10, StyleEffect::new().bold())
                    .unwrap();
            }
            ctl.layout(&StyleEffect::new(), 0, 0, 640, 0).unwrap();
            black_box(ctl.line_count())
        });
    });
}

fn incremental_edits(c: &mut Criterion) {
    let options = LayoutOptions::default().wrap(WrapPolicy::None);
    c.bench_function("insert_char_patched", |b| {
        let mut ctl = controller("single line of text", options);
        ctl.layout(&StyleEffect::new(), 0, 0, 0, 0).unwrap();
        b.iter(|| {
            ctl.insert_char(black_box(5), 'x').unwrap();
            ctl.delete_char(black_box(5)).unwrap();
        });
    });
}

fn render(c: &mut Criterion) {
    let text = paragraph(1_000);
    let mut ctl = controller(&text, LayoutOptions::default());
    ctl.add_style(LayerId::HIGHLIGHT, 100, 400, StyleEffect::new().with_color(Rgba::RED))
        .unwrap();
    ctl.layout(&StyleEffect::new(), 0, 0, 640, 0).unwrap();

    c.bench_function("render_1k_words", |b| {
        let renderer = LineRenderer::new(RenderWindow::default());
        b.iter(|| {
            let mut sink = NullSink::default();
            renderer
                .render(&mut ctl, &mut sink, &mut NoEffects)
                .unwrap();
            black_box(sink.draws)
        });
    });
}

criterion_group!(
    benches,
    wrap_policies,
    justified,
    styled_layout,
    incremental_edits,
    render
);
criterion_main!(benches);
