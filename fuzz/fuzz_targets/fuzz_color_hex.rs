//! Fuzz target for color hex parsing.
//!
//! Rgba::from_hex must return None for malformed input, never panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use textfx::Rgba;

fuzz_target!(|data: &str| {
    let parsed = Rgba::from_hex(data);

    if !data.starts_with('#') {
        let _ = Rgba::from_hex(&format!("#{data}"));
    }

    // Parsed colors survive a round trip through ARGB.
    if let Some(color) = parsed {
        assert_eq!(Rgba::from_argb(color.to_argb()), color);
    }

    for (i, _) in data.char_indices().take(10) {
        let _ = Rgba::from_hex(&data[i..]);
        let _ = Rgba::from_hex(&data[..i]);
    }
});
