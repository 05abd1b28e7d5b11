//! Fuzz target for color hex parsing.
//!
//! Tests that Color::from_hex handles arbitrary strings without panicking
//! and that anything it accepts formats back to the same color.

#![no_main]

use libfuzzer_sys::fuzz_target;
use richdoc::Color;

fuzz_target!(|data: &str| {
    if let Some(color) = Color::from_hex(data) {
        assert_eq!(Color::from_hex(&color.to_hex()), Some(color));
    }

    // Try suffixes on char boundaries to find edge cases
    for (i, _) in data.char_indices().take(10) {
        let _ = Color::from_hex(&data[i..]);
    }
});
