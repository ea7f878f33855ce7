//! `textfx` - Styled text layout engine
//!
//! Lays out a window of characters into lines under wrap, trim, newline
//! and tab policies, cascades style overlays onto a base text style, and
//! renders the result through an abstract graphics sink.
//!
//! ```
//! use std::sync::Arc;
//! use textfx::{LayoutOptions, MonoFont, SpaceTrim, StyleEffect, TextController};
//!
//! let mut text = TextController::new(Arc::new(MonoFont::new(10, 12)))
//!     .with_text("aa bb cc dd")
//!     .with_options(LayoutOptions::default().space_trim(SpaceTrim::Justified));
//! text.layout(&StyleEffect::new(), 0, 0, 95, 0).unwrap();
//!
//! assert_eq!(text.line_text(0).unwrap(), "aa bb cc");
//! assert_eq!(text.lines()[0].width, 95);
//! assert_eq!(textfx::Rgba::from_hex("#ff0000"), Some(textfx::Rgba::RED));
//! ```

// Crate-level lint configuration
#![warn(unsafe_code)]
#![allow(dead_code)] // Public API functions not yet used internally
#![allow(clippy::cast_possible_truncation)] // Intentional pixel casts
#![allow(clippy::cast_sign_loss)] // Intentional coordinate conversions
#![allow(clippy::cast_possible_wrap)] // Intentional coordinate conversions
#![allow(clippy::module_name_repetitions)] // Allow layout::LayoutOptions etc
#![allow(clippy::struct_excessive_bools)] // LayoutState needs multiple flags
#![allow(clippy::missing_errors_doc)] // Docs WIP
#![allow(clippy::missing_panics_doc)] // Docs WIP
#![allow(clippy::missing_const_for_fn)] // Many functions could be const, not critical
#![allow(clippy::doc_markdown)] // Allow technical names without backticks
#![allow(clippy::use_self)] // Allow explicit type names in impl blocks
#![allow(clippy::needless_pass_by_value)] // Allow pass by value for small Copy types
#![allow(clippy::inherent_to_string)] // to_string methods are convenient
#![allow(clippy::should_implement_trait)] // from_str naming is intentional
#![allow(clippy::collapsible_if)] // Sometimes nested ifs are clearer
#![allow(clippy::cast_lossless)] // as casts are fine for primitive widening
#![allow(clippy::items_after_statements)] // Common pattern in tests
#![allow(clippy::semicolon_if_nothing_returned)] // Style preference
#![allow(clippy::needless_collect)] // Collect for assertions is clear

pub mod color;
pub mod error;
pub mod event;
pub mod font;
pub mod layout;
pub mod render;
pub mod style;
pub mod text;
pub mod unicode;

// Re-export core types at crate root
pub use color::Rgba;
pub use error::{Error, Result};
pub use event::{
    EVENT_RELAYOUT, EVENT_TRIMMED, LogLevel, emit_event, emit_log, set_event_callback,
    set_log_callback,
};
pub use font::{CellFont, FontMetrics, FontRegistry, FontTable, MonoFont};

// Re-export style types
pub use style::{
    Attr, ColorFnRef, FigureRef, FontFace, FontSize, FontSpec, FontStyle, MaskRef, Scope,
    Spacing, StyleDescriptor, StyleEffect, StyleResolver, StyleRun, TextColor, VerticalShift,
};

// Re-export layout types
pub use layout::{
    Anchor, Area, EllipsisCue, LayoutOptions, LineDescriptor, LineFlags, NewlinePolicy,
    SpaceTrim, Substitution, Suffix, TabPolicy, TabStop, WrapPolicy,
};

// Re-export commonly used types
pub use render::{FxPainter, GraphicsSink, LineRenderer, NoEffects, RenderStats, RenderWindow};
pub use text::{
    CharBuffer, DrawType, Interval, LayerId, LayoutState, OverlayStore, Phase, TextController,
};
pub use unicode::WidthMethod;
