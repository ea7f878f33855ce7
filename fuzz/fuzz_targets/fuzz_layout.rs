//! Fuzz target for line breaking.
//!
//! Lays out arbitrary text under arbitrary policies and checks that every
//! pass succeeds and its lines tile the text.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;
use textfx::{
    LayoutOptions, MonoFont, NewlinePolicy, SpaceTrim, StyleEffect, TabPolicy, TextController,
    WrapPolicy,
};

#[derive(Arbitrary, Debug)]
struct Input {
    text: String,
    wrap: u8,
    trim: u8,
    newline: u8,
    tab: u8,
    width: u16,
    max_lines: Option<u8>,
    trim_to: Option<u8>,
    cut_at: Option<u16>,
}

fuzz_target!(|input: Input| {
    // Unknown codes are rejected, not guessed.
    let (Ok(wrap), Ok(trim), Ok(newline), Ok(tab)) = (
        WrapPolicy::try_from(input.wrap),
        SpaceTrim::try_from(input.trim),
        NewlinePolicy::try_from(input.newline),
        TabPolicy::try_from(input.tab),
    ) else {
        return;
    };

    let mut options = LayoutOptions::default()
        .wrap(wrap)
        .space_trim(trim)
        .newline(newline)
        .tab(tab)
        .page_lines(4);
    if let Some(max) = input.max_lines.filter(|max| *max > 0) {
        options = options.max_lines(usize::from(max));
    }

    let mut ctl = TextController::new(Arc::new(MonoFont::new(7, 11)))
        .with_text(&input.text)
        .with_options(options);
    ctl.layout(&StyleEffect::new(), 0, 0, u32::from(input.width), 0)
        .expect("layout never fails on valid options");
    if let Some(lines) = input.trim_to.filter(|lines| *lines > 0) {
        ctl.trim_lines(usize::from(lines)).expect("trim to a positive count");
    }
    if let Some(at) = input.cut_at {
        let end = usize::from(at) % (ctl.char_count() + 1);
        ctl.trim(end).expect("cut inside the text");
    }

    assert!(ctl.line_count() >= 1);
    let mut offset = 0;
    for line in ctl.lines() {
        assert_eq!(line.offset, offset);
        offset = line.next_offset();
    }
    assert_eq!(offset, ctl.char_count());
});
