//! Property-based tests for the CSV codec.
//!
//! Uses proptest to verify invariants across random inputs:
//! - Plain cells survive export followed by import
//! - Cells embedding separators, quotes and newlines survive the same trip
//! - Every exported field is quoted and no terminator is appended
//! - A malformed line never hides the valid lines around it

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use impex::backends::csv::codec::{decode, encode};
use impex::backends::csv::{Charset, ColumnSeparator, CsvSettings};
use impex::models::{Cell, Row, text_row};
use proptest::prelude::*;

fn separator() -> impl Strategy<Value = ColumnSeparator> {
    prop::sample::select(ColumnSeparator::ALL.to_vec())
}

fn plain_row() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-zA-Z0-9 _-]{0,12}", 1..8)
}

fn tricky_row() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z\"\t;:.,\n\r ]{0,12}", 1..8)
}

fn round_trip(rows: &[Row], settings: &CsvSettings) -> Vec<Row> {
    let mut content = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            content.push(b'\n');
        }
        content.extend_from_slice(encode(row, settings).unwrap().as_bytes());
    }
    let data = decode(&content, settings);
    assert!(data.diagnostics.is_empty(), "{:?}", data.diagnostics);
    data.rows
}

proptest! {
    /// Property: plain cells round-trip for every separator.
    #[test]
    fn prop_plain_round_trip(sep in separator(), cells in plain_row()) {
        let settings = CsvSettings::new(sep);
        let row = text_row(&cells);
        prop_assert_eq!(round_trip(std::slice::from_ref(&row), &settings), vec![row]);
    }

    /// Property: separators, quotes and newlines inside cells round-trip.
    #[test]
    fn prop_embedded_specials_round_trip(
        sep in separator(),
        rows in prop::collection::vec(tricky_row(), 1..5),
    ) {
        let settings = CsvSettings::new(sep);
        let rows: Vec<Row> = rows.iter().map(|cells| text_row(cells)).collect();
        prop_assert_eq!(round_trip(&rows, &settings), rows);
    }

    /// Property: non-UTF-8 charsets round-trip arbitrary bytes.
    #[test]
    fn prop_bytes_round_trip(cells in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..10), 1..6)) {
        let settings = CsvSettings::new(ColumnSeparator::Comma)
            .with_charset(Charset::Other("iso-8859-1".to_string()));
        let row: Row = cells.into_iter().map(Cell::Bytes).collect();
        prop_assert_eq!(round_trip(std::slice::from_ref(&row), &settings), vec![row]);
    }

    /// Property: exported lines quote every field and carry no terminator.
    #[test]
    fn prop_export_shape(sep in separator(), cells in plain_row()) {
        let settings = CsvSettings::new(sep);
        let line = encode(&text_row(&cells), &settings).unwrap();
        let text = line.as_text().unwrap();

        prop_assert!(text.starts_with('"'));
        prop_assert!(text.ends_with('"'));
        prop_assert!(!text.ends_with('\n'));
        let delimiter = char::from(sep.byte());
        let expected = cells
            .iter()
            .map(|c| format!("\"{c}\""))
            .collect::<Vec<_>>()
            .join(&delimiter.to_string());
        prop_assert_eq!(text, expected.as_str());
    }

    /// Property: a malformed line is reported and the valid lines survive.
    #[test]
    fn prop_partial_failure(
        before in prop::collection::vec(plain_row(), 0..4),
        after in prop::collection::vec(plain_row(), 0..4),
    ) {
        let settings = CsvSettings::new(ColumnSeparator::Semicolon);
        let mut lines: Vec<String> = before
            .iter()
            .map(|cells| encode(&text_row(cells), &settings).unwrap().to_string())
            .collect();
        lines.push("\"broken\"garbage;\"x\"".to_string());
        lines.extend(
            after
                .iter()
                .map(|cells| encode(&text_row(cells), &settings).unwrap().to_string()),
        );

        let data = decode(lines.join("\n").as_bytes(), &settings);

        let expected: Vec<Row> = before.iter().chain(after.iter()).map(|c| text_row(c)).collect();
        prop_assert_eq!(data.rows, expected);
        prop_assert_eq!(data.diagnostics.len(), 1);
        prop_assert_eq!(data.diagnostics[0].line, before.len() + 1);
    }
}

#[test]
fn test_comma_and_semicolon_equivalent() {
    let rows = vec![text_row(&["id", "title"]), text_row(&["1", "Printer jam"])];
    let comma = CsvSettings::new(ColumnSeparator::Comma);
    let semicolon = CsvSettings::new(ColumnSeparator::Semicolon);

    assert_eq!(round_trip(&rows, &comma), round_trip(&rows, &semicolon));
    assert_eq!(
        decode(b"\"1\",\"a\"", &comma).rows,
        decode(b"\"1\";\"a\"", &semicolon).rows
    );
}
