//! Document editing and layout benchmarks.

#![allow(clippy::semicolon_if_nothing_returned)]

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use richdoc::{CaretDirection, DocPosition, Document, DocumentOptions, FindOptions};
use std::hint::black_box;

fn sample_text(lines: usize) -> String {
    (0..lines)
        .map(|i| format!("Line {i}: the quick brown fox jumps over the lazy dog"))
        .collect::<Vec<_>>()
        .join("\r\n")
}

fn document_creation(c: &mut Criterion) {
    c.bench_function("document_new", |b| {
        b.iter(Document::new);
    });

    let text = sample_text(1_000);
    c.bench_function("document_insert_1k_lines", |b| {
        b.iter(|| {
            let mut doc = Document::new();
            doc.insert(1, 0, black_box(&text)).unwrap();
            doc
        });
    });

    c.bench_function("document_insert_1k_lines_wrapped", |b| {
        b.iter(|| {
            let options = DocumentOptions::default().word_wrap(true).viewport(200.0, 300.0);
            let mut doc = Document::with_options(options);
            doc.insert(1, 0, black_box(&text)).unwrap();
            doc
        });
    });
}

fn document_lookup(c: &mut Criterion) {
    let mut doc = Document::new();
    doc.insert(1, 0, &sample_text(10_000)).unwrap();

    c.bench_function("document_line_by_number", |b| {
        b.iter(|| black_box(&doc).line(black_box(7_345)).map(|l| l.len()));
    });

    c.bench_function("document_char_index_to_line", |b| {
        b.iter(|| black_box(&doc).char_index_to_line_tag(black_box(250_000)));
    });

    c.bench_function("document_find_last_line", |b| {
        b.iter(|| black_box(&doc).find(black_box("Line 9999"), None, None, FindOptions::MATCH_CASE));
    });
}

fn document_editing(c: &mut Criterion) {
    let text = sample_text(1_000);

    c.bench_function("document_type_100_chars", |b| {
        b.iter_batched(
            || {
                let mut doc = Document::new();
                doc.insert(1, 0, &text).unwrap();
                doc.set_caret(500, 10).unwrap();
                doc
            },
            |mut doc| {
                for _ in 0..100 {
                    doc.type_char('x').unwrap();
                }
                doc
            },
            BatchSize::SmallInput,
        );
    });

    c.bench_function("document_delete_and_undo_range", |b| {
        b.iter_batched(
            || {
                let mut doc = Document::new();
                doc.insert(1, 0, &text).unwrap();
                doc.set_selection(DocPosition::new(100, 3), DocPosition::new(400, 7))
                    .unwrap();
                doc
            },
            |mut doc| {
                doc.delete_selection();
                doc.undo();
                doc
            },
            BatchSize::SmallInput,
        );
    });

    c.bench_function("document_caret_down_100", |b| {
        b.iter_batched(
            || {
                let mut doc = Document::new();
                doc.insert(1, 0, &text).unwrap();
                doc.set_caret(1, 0).unwrap();
                doc
            },
            |mut doc| {
                for _ in 0..100 {
                    doc.move_caret(CaretDirection::LineDown);
                }
                doc
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, document_creation, document_lookup, document_editing);
criterion_main!(benches);
