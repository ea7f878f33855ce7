//! Incremental edits, state transitions and diagnostics of the controller.

mod common;

use common::{assert_full_coverage, mono_controller, sized_controller};
use proptest::prelude::*;
use std::sync::{Arc, Mutex};
use textfx::event::{clear_event_callback, clear_log_callback};
use textfx::{
    DrawType, EVENT_RELAYOUT, EVENT_TRIMMED, Error, FigureRef, FontSize, LayerId, LayoutOptions,
    LogLevel, Phase, StyleEffect, TextController, WrapPolicy, set_event_callback,
    set_log_callback,
};

#[derive(Clone, Debug)]
enum Edit {
    Insert(usize, char),
    Delete(usize),
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (0usize..64, "[a-z ]").prop_map(|(at, ch)| {
            Edit::Insert(at, ch.chars().next().unwrap_or(' '))
        }),
        (0usize..64).prop_map(Edit::Delete),
    ]
}

/// A sized span `(offset, len, size)` applied before layout.
fn sized_span() -> impl Strategy<Value = (usize, usize, FontSize)> {
    (
        0usize..20,
        1usize..5,
        prop_oneof![
            Just(FontSize::Small),
            Just(FontSize::Medium),
            Just(FontSize::Large)
        ],
    )
}

/// Replay the styles of `ctl` onto a fresh controller over the same text.
fn fresh_copy(ctl: &TextController, options: LayoutOptions) -> TextController {
    let mut fresh = sized_controller(&ctl.text()).with_options(options);
    for (index, layer) in ctl.layers().iter().enumerate() {
        for interval in layer.iter() {
            fresh
                .add_style(LayerId(index), interval.offset, interval.len, interval.payload)
                .unwrap();
        }
    }
    fresh
}

#[test]
fn test_phase_transitions() {
    let mut ctl = mono_controller("abc");
    assert_eq!(ctl.phase(), Phase::Uninitialized);
    assert!(!ctl.state().is_valid());

    ctl.layout(&StyleEffect::new(), 0, 0, 100, 0).unwrap();
    assert_eq!(ctl.phase(), Phase::LaidOut);
    assert!(ctl.state().is_valid());

    ctl.add_style(LayerId::BASE, 0, 1, StyleEffect::new().bold())
        .unwrap();
    assert_eq!(ctl.phase(), Phase::NeedsRelayout);
    assert!(!ctl.state().lines_valid);

    ctl.ensure_layout().unwrap();
    assert_eq!(ctl.phase(), Phase::LaidOut);
}

#[test]
fn test_draw_type_classification() {
    let mut ctl = mono_controller("ab");
    ctl.layout(&StyleEffect::new(), 0, 0, 0, 0).unwrap();
    assert_eq!(ctl.draw_type(), DrawType::SingleLine);

    ctl.add_style(LayerId::BASE, 0, 1, StyleEffect::new().with_figure(FigureRef(1)))
        .unwrap();
    ctl.ensure_layout().unwrap();
    assert_eq!(ctl.draw_type(), DrawType::SingleLineFx);

    ctl.set_text("a\nb");
    ctl.ensure_layout().unwrap();
    assert_eq!(ctl.draw_type(), DrawType::MultiLine);
    assert!(ctl.draw_type().is_multi_line());
    assert!(!ctl.draw_type().has_effects());
}

#[test]
fn test_window_limits_layout() {
    let mut ctl = mono_controller("hello world");
    ctl.set_window(6, 5).unwrap();
    ctl.layout(&StyleEffect::new(), 0, 0, 0, 0).unwrap();
    assert_eq!(ctl.text(), "world");
    assert_eq!(ctl.lines()[0].width, 50);

    assert!(matches!(
        ctl.set_window(8, 10),
        Err(Error::OutOfBounds { .. })
    ));
    assert_eq!(ctl.text(), "world");
}

#[test]
fn test_edits_out_of_bounds_fail() {
    let mut ctl = mono_controller("ab");
    assert_eq!(
        ctl.insert_char(3, 'x'),
        Err(Error::OutOfBounds { index: 3, len: 2 })
    );
    assert_eq!(
        ctl.delete_char(2),
        Err(Error::OutOfBounds { index: 2, len: 2 })
    );
    assert_eq!(ctl.text(), "ab");
}

#[test]
fn test_edit_on_wrapped_text_relayouts() {
    let mut ctl = mono_controller("aaa bbb ccc");
    ctl.layout(&StyleEffect::new(), 0, 0, 70, 0).unwrap();
    assert_eq!(ctl.line_count(), 2);

    ctl.insert_char(3, 'a').unwrap();
    assert_eq!(ctl.phase(), Phase::NeedsRelayout);
    ctl.ensure_layout().unwrap();
    assert_eq!(ctl.line_text(0).unwrap(), "aaaa");
    assert_eq!(ctl.line_text(1).unwrap(), "bbb ccc");
    assert_full_coverage(&ctl);
}

#[test]
fn test_callbacks_report_trims_relayouts_and_rejections() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let logs = Arc::new(Mutex::new(Vec::new()));
    {
        let events = Arc::clone(&events);
        set_event_callback(move |name, _data| {
            events.lock().unwrap().push(name.to_string());
        });
        let logs = Arc::clone(&logs);
        set_log_callback(move |level, message| {
            logs.lock().unwrap().push((level, message.to_string()));
        });
    }

    let mut ctl = mono_controller("one\ntwo\nthree");
    ctl.layout(&StyleEffect::new(), 0, 0, 100, 0).unwrap();
    ctl.trim(1).unwrap();
    ctl.untrim().unwrap();
    ctl.insert_char(1, '\n').unwrap();
    let rejected = ctl.set_options(LayoutOptions::default().page_lines(0));

    clear_event_callback();
    clear_log_callback();

    assert!(rejected.is_err());
    let events = events.lock().unwrap();
    assert!(events.iter().any(|name| name == EVENT_TRIMMED));
    assert!(events.iter().any(|name| name == EVENT_RELAYOUT));
    let logs = logs.lock().unwrap();
    assert!(logs.iter().any(|(level, _)| *level == LogLevel::Debug));
    assert!(
        logs.iter()
            .any(|(level, message)| *level == LogLevel::Warn && message.contains("page"))
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Patched edits leave the same line table a fresh layout would build.
    #[test]
    fn prop_patched_edits_match_fresh_layout(
        text in "[a-z ]{0,20}",
        edits in prop::collection::vec(edit(), 1..12),
    ) {
        let options = LayoutOptions::default().wrap(WrapPolicy::None);
        let mut ctl = mono_controller(&text).with_options(options);
        ctl.layout(&StyleEffect::new(), 0, 0, 0, 0).unwrap();

        for edit in edits {
            let len = ctl.char_count();
            match edit {
                Edit::Insert(at, ch) => ctl.insert_char(at % (len + 1), ch).unwrap(),
                Edit::Delete(at) if len > 0 => ctl.delete_char(at % len).unwrap(),
                Edit::Delete(_) => {}
            }
        }
        ctl.ensure_layout().unwrap();

        let mut fresh = mono_controller(&ctl.text()).with_options(options);
        fresh.layout(&StyleEffect::new(), 0, 0, 0, 0).unwrap();
        prop_assert_eq!(ctl.lines(), fresh.lines());
        prop_assert_eq!(ctl.char_widths(), fresh.char_widths());
    }

    /// The same holds on styled text whose sizes change line heights and
    /// character widths.
    #[test]
    fn prop_patched_edits_on_sized_text_match_fresh_layout(
        text in "[a-z ]{1,20}",
        spans in prop::collection::vec(sized_span(), 0..4),
        edits in prop::collection::vec(edit(), 1..12),
    ) {
        let options = LayoutOptions::default().wrap(WrapPolicy::None);
        let mut ctl = sized_controller(&text).with_options(options);
        let len = ctl.char_count();
        for (offset, span, size) in spans {
            let offset = offset % len;
            let span = span.min(len - offset);
            ctl.add_style(LayerId::HIGHLIGHT, offset, span, StyleEffect::new().with_size(size))
                .unwrap();
        }
        ctl.layout(&StyleEffect::new(), 0, 0, 0, 0).unwrap();

        for edit in edits {
            let len = ctl.char_count();
            match edit {
                Edit::Insert(at, ch) => ctl.insert_char(at % (len + 1), ch).unwrap(),
                Edit::Delete(at) if len > 0 => ctl.delete_char(at % len).unwrap(),
                Edit::Delete(_) => {}
            }
            ctl.ensure_layout().unwrap();
            let mut fresh = fresh_copy(&ctl, options);
            fresh.layout(&StyleEffect::new(), 0, 0, 0, 0).unwrap();
            prop_assert_eq!(ctl.lines(), fresh.lines());
            prop_assert_eq!(ctl.content_size(), fresh.content_size());
            prop_assert_eq!(ctl.draw_type(), fresh.draw_type());
            prop_assert_eq!(ctl.line_origin(0).unwrap(), fresh.line_origin(0).unwrap());
        }
    }
}
