//! Fuzz target for RTF import.
//!
//! Arbitrary bytes must either load or fail with an RTF error, never panic,
//! and a failed load must leave the document as it was.

#![no_main]

use libfuzzer_sys::fuzz_target;
use richdoc::Document;

fuzz_target!(|data: &[u8]| {
    let mut doc = Document::new();
    doc.insert(1, 0, "seed").unwrap();
    match doc.load_rtf(data) {
        Ok(()) => {
            doc.check_invariants().unwrap();
            // Whatever was imported must export and import again.
            let rtf = doc.to_rtf();
            let mut copy = Document::new();
            copy.load_rtf(rtf.as_bytes()).unwrap();
        }
        Err(_) => assert_eq!(doc.text(), "seed"),
    }
});
