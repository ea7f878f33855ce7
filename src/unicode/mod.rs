//! Unicode display-width helpers used by cell-based font metrics.

mod width;

pub use width::{WidthMethod, display_width_char_with_method};
