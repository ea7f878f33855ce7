//! Text storage, style overlays and the layout controller.
//!
//! Key types:
//!
//! - [`CharBuffer`]: rope-backed characters with a visible window
//! - [`IntervalStore`] / [`OverlayStore`]: non-overlapping style intervals
//! - [`TextController`]: owns text, layers and the current line table
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use textfx::{LayerId, MonoFont, Rgba, StyleEffect, TextController};
//!
//! let mut text = TextController::new(Arc::new(MonoFont::new(10, 12)))
//!     .with_text("The quick brown fox");
//! text.add_style(LayerId::BASE, 4, 5, StyleEffect::new().with_color(Rgba::RED))
//!     .unwrap();
//! text.layout(&StyleEffect::new(), 0, 0, 100, 0).unwrap();
//!
//! assert_eq!(text.line_count(), 2);
//! assert_eq!(text.line_text(0).unwrap(), "The quick");
//! ```

mod chars;
mod controller;
mod overlay;

pub use chars::CharBuffer;
pub use controller::{DrawType, LayoutState, Phase, TextController};
pub use overlay::{Interval, IntervalStore, LayerId, OverlayStore};
