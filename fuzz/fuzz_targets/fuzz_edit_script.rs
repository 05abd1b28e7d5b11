//! Fuzz target for editing and undo.
//!
//! Replays an arbitrary edit script and checks the document invariants
//! after every step, then undoes everything.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use richdoc::{CaretDirection, DocPosition, Document};

#[derive(Arbitrary, Debug)]
enum Step {
    Type(char),
    Backspace,
    DeleteForward,
    Left,
    Right,
    Up,
    Down,
    Select { line: u8, pos: u8, to_line: u8, to_pos: u8 },
    Undo,
    Redo,
}

fuzz_target!(|steps: Vec<Step>| {
    let mut doc = Document::new();
    for step in steps.iter().take(200) {
        match *step {
            Step::Type(ch) => {
                let _ = doc.type_char(ch);
            }
            Step::Backspace => {
                doc.backspace();
            }
            Step::DeleteForward => {
                doc.delete_forward();
            }
            Step::Left => doc.move_caret(CaretDirection::CharBack),
            Step::Right => doc.move_caret(CaretDirection::CharForward),
            Step::Up => doc.move_caret(CaretDirection::LineUp),
            Step::Down => doc.move_caret(CaretDirection::LineDown),
            Step::Select { line, pos, to_line, to_pos } => {
                let _ = doc.set_selection(
                    DocPosition::new(usize::from(line), usize::from(pos)),
                    DocPosition::new(usize::from(to_line), usize::from(to_pos)),
                );
            }
            Step::Undo => {
                doc.undo();
            }
            Step::Redo => {
                doc.redo();
            }
        }
        doc.check_invariants().unwrap();
    }
    while doc.undo() {}
    assert_eq!(doc.text(), "");
});
