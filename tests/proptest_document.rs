//! Property-based tests for document editing, undo and RTF export.
//!
//! Random edit scripts must keep the line tree, run lengths and markers
//! consistent, and undo must walk all the way back.

mod support;

use proptest::prelude::*;
use richdoc::{CaretDirection, Document};
use support::{arial_options, line_texts};

// ============================================================================
// Strategies
// ============================================================================

#[derive(Clone, Debug)]
enum Op {
    Type(char),
    Backspace,
    DeleteForward,
    Move(CaretDirection),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => prop::sample::select(vec!['a', 'b', ' ', '\r', '\u{e9}']).prop_map(Op::Type),
        2 => Just(Op::Backspace),
        1 => Just(Op::DeleteForward),
        2 => prop::sample::select(vec![
            CaretDirection::CharBack,
            CaretDirection::CharForward,
            CaretDirection::LineUp,
            CaretDirection::WordBack,
            CaretDirection::Home,
            CaretDirection::End,
        ])
        .prop_map(Op::Move),
    ]
}

/// Characters that need escaping in RTF, plus plain ones.
fn rtf_char_strategy() -> impl Strategy<Value = char> {
    prop::sample::select(vec![
        'a', 'Z', '7', ' ', '{', '}', '\\', '\t', '-', '\u{A0}', '\u{e9}', '\u{4e2d}',
        '\u{1F600}',
    ])
}

fn rtf_lines_strategy() -> impl Strategy<Value = Vec<String>> {
    (
        prop::collection::vec(
            prop::collection::vec(rtf_char_strategy(), 0..12)
                .prop_map(|cs| cs.into_iter().collect::<String>()),
            0..4,
        ),
        "[a-z]{1,5}",
    )
        .prop_map(|(mut lines, last)| {
            lines.push(last);
            lines
        })
}

fn apply(doc: &mut Document, op: &Op) {
    match op {
        Op::Type(ch) => doc.type_char(*ch).unwrap(),
        Op::Backspace => {
            doc.backspace();
        }
        Op::DeleteForward => {
            doc.delete_forward();
        }
        Op::Move(direction) => doc.move_caret(*direction),
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_edits_keep_invariants(ops in prop::collection::vec(op_strategy(), 0..60)) {
        let mut doc = Document::new();
        for op in &ops {
            apply(&mut doc, op);
            prop_assert!(doc.check_invariants().is_ok(), "{:?} after {op:?}", doc.check_invariants());
        }
        let len: usize = doc.lines().map(richdoc::Line::len_with_ending).sum();
        prop_assert_eq!(doc.len(), len);
    }

    #[test]
    fn prop_undo_all_restores_empty_then_redo_all(
        ops in prop::collection::vec(op_strategy(), 1..40)
    ) {
        let mut doc = Document::new();
        for op in &ops {
            apply(&mut doc, op);
        }
        let edited = doc.text();

        while doc.undo() {}
        prop_assert_eq!(doc.text(), "");
        prop_assert!(doc.check_invariants().is_ok());

        while doc.redo() {}
        prop_assert_eq!(doc.text(), edited);
        prop_assert!(doc.check_invariants().is_ok());
    }

    #[test]
    fn prop_rtf_round_trip_keeps_text(lines in rtf_lines_strategy()) {
        let mut doc = Document::with_options(arial_options());
        doc.insert(1, 0, &lines.join("\r\n")).unwrap();

        let rtf = doc.to_rtf();
        prop_assert!(rtf.is_ascii());

        let mut copy = Document::with_options(arial_options());
        copy.load_rtf(rtf.as_bytes()).unwrap();
        prop_assert_eq!(line_texts(&copy), lines);
    }
}
