//! RTF export snapshots and file round trips.

mod support;

use richdoc::{DocPosition, Document, Error, FontStyle, RtfErrorKind, TextFormat};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use support::{arial_options, doc_with, line_texts, setup_test_logging};

#[test]
fn test_export_snapshot() {
    setup_test_logging();
    let mut doc = doc_with("Hi\r\nthere");
    doc.format_text(
        DocPosition::new(2, 0),
        DocPosition::new(2, 5),
        &TextFormat::new().style_on(FontStyle::BOLD),
    )
    .unwrap();

    insta::assert_snapshot!(doc.to_rtf(), @r"
    {\rtf1\ansi\ansicpg1252\deff0\deflang1033{\fonttbl{\f0\fnil\fcharset0 Arial;}}
    {\*\generator richdoc;}\viewkind4\uc1\pard\f0\fs20 Hi\par
    \b there}
    ");
}

#[test]
fn test_save_and_reload_through_file() {
    setup_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("note.rtf");

    let mut doc = doc_with("first {braced}\r\n\tsecond \u{e9}");
    doc.format_text(
        DocPosition::new(1, 0),
        DocPosition::new(1, 5),
        &TextFormat::new().style_on(FontStyle::ITALIC),
    )
    .unwrap();
    doc.save_rtf(BufWriter::new(File::create(&path).unwrap()))
        .unwrap();

    let mut copy = Document::with_options(arial_options());
    copy.read_rtf(BufReader::new(File::open(&path).unwrap()))
        .unwrap();
    assert_eq!(line_texts(&copy), line_texts(&doc));
    assert_eq!(
        copy.line(1).unwrap().char_formats(),
        doc.line(1).unwrap().char_formats()
    );
}

#[test]
fn test_generate_range() {
    let doc = doc_with("alpha\r\nbeta");
    let rtf = doc
        .generate_rtf(DocPosition::new(1, 2), DocPosition::new(2, 2))
        .unwrap();
    let mut copy = Document::new();
    copy.load_rtf(rtf.as_bytes()).unwrap();
    assert_eq!(line_texts(&copy), ["pha", "be"]);
}

#[test]
fn test_truncated_file_is_rejected() {
    setup_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.rtf");
    std::fs::write(&path, b"{\\rtf1 text\\").unwrap();

    let mut doc = doc_with("untouched");
    let err = doc.read_rtf(File::open(&path).unwrap()).unwrap_err();
    match err {
        Error::Rtf(e) => assert_eq!(e.kind(), RtfErrorKind::UnexpectedEof),
        other => panic!("unexpected error {other}"),
    }
    assert_eq!(doc.text(), "untouched");
}

