//! Shared helpers for integration tests.

#![allow(dead_code)] // Not every test binary uses every helper

use richdoc::{Document, DocumentOptions, Font};
use std::sync::Once;

/// Route `tracing` output to the test harness once per binary.
pub fn setup_test_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

/// Options with a font whose size survives an RTF round trip exactly.
pub fn arial_options() -> DocumentOptions {
    DocumentOptions::default().default_font(Font::new("Arial", 10.0))
}

/// Document holding `text`, with undo history cleared.
pub fn doc_with(text: &str) -> Document {
    let mut doc = Document::with_options(arial_options());
    doc.insert(1, 0, text).unwrap();
    doc.clear_undo();
    doc
}

/// Line texts, first to last.
pub fn line_texts(doc: &Document) -> Vec<String> {
    doc.lines().map(|l| l.text().to_owned()).collect()
}
