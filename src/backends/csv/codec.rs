//! CSV record splitting, decoding and encoding.
//!
//! Import runs in two passes over an in-memory buffer. A quote-aware scanner
//! splits the input into records and flags quoting defects per record; each
//! clean record is then decoded with the `csv` crate. Defective records are
//! reported as diagnostics and skipped so that one bad line does not hide
//! the rest of the file.

use super::settings::{Charset, CsvSettings};
use crate::backends::{ImportData, ParseDiagnostic, ParseErrorKind};
use crate::models::{Cell, Row};
use crate::{Error, Result};
use tracing::warn;

const QUOTE: u8 = b'"';

/// Scanner position within the current field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    FieldStart,
    Unquoted,
    Quoted,
    /// A quote was seen inside a quoted field: either an escape or the close.
    QuoteInQuoted,
    /// A defect was found; skip to the end of the line.
    Invalid,
}

/// One record as it appears in the input.
#[derive(Debug)]
struct RawRecord<'a> {
    line: usize,
    bytes: &'a [u8],
    defect: Option<(ParseErrorKind, &'static str)>,
}

/// Splits `input` into records, skipping blank lines.
///
/// Newlines inside quoted fields do not end a record. `\r\n` is accepted as
/// a terminator.
fn split_records(input: &[u8], separator: u8) -> Vec<RawRecord<'_>> {
    let mut records = Vec::new();
    let mut state = State::FieldStart;
    let mut defect = None;
    let mut start = 0;
    let mut start_line = 1;
    let mut line = 1;

    for (i, &byte) in input.iter().enumerate() {
        if state == State::Quoted {
            if byte == QUOTE {
                state = State::QuoteInQuoted;
            } else if byte == b'\n' {
                line += 1;
            }
            continue;
        }

        if byte == b'\r' && input.get(i + 1) == Some(&b'\n') {
            continue;
        }

        if byte == b'\n' {
            let bytes = strip_cr(&input[start..i]);
            if !bytes.is_empty() {
                records.push(RawRecord {
                    line: start_line,
                    bytes,
                    defect: defect.take(),
                });
            }
            line += 1;
            start = i + 1;
            start_line = line;
            state = State::FieldStart;
            defect = None;
            continue;
        }

        state = match state {
            State::FieldStart if byte == QUOTE => State::Quoted,
            State::FieldStart | State::Unquoted if byte == separator => State::FieldStart,
            State::FieldStart => State::Unquoted,
            State::Unquoted if byte == QUOTE => {
                defect.get_or_insert((
                    ParseErrorKind::LooseQuote,
                    "quote character inside an unquoted field",
                ));
                State::Invalid
            },
            State::QuoteInQuoted if byte == QUOTE => State::Quoted,
            State::QuoteInQuoted if byte == separator => State::FieldStart,
            State::QuoteInQuoted => {
                defect.get_or_insert((
                    ParseErrorKind::TrailingGarbage,
                    "unexpected characters after a closing quote",
                ));
                State::Invalid
            },
            other => other,
        };
    }

    if start < input.len() {
        if state == State::Quoted {
            defect.get_or_insert((
                ParseErrorKind::UnterminatedQuote,
                "input ended inside a quoted field",
            ));
        }
        let bytes = strip_cr(&input[start..]);
        if !bytes.is_empty() {
            records.push(RawRecord {
                line: start_line,
                bytes,
                defect,
            });
        }
    }

    records
}

fn strip_cr(bytes: &[u8]) -> &[u8] {
    bytes.strip_suffix(b"\r").unwrap_or(bytes)
}

fn reader_builder(settings: &CsvSettings) -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .delimiter(settings.separator.byte())
        .quote(QUOTE)
        .double_quote(true)
        .flexible(true)
        .trim(csv::Trim::None)
        .terminator(csv::Terminator::Any(b'\n'));
    builder
}

/// Converts the fields of one decoded record into cells.
fn record_cells(
    record: &csv::ByteRecord,
    settings: &CsvSettings,
) -> std::result::Result<Row, (ParseErrorKind, String)> {
    record
        .iter()
        .enumerate()
        .map(|(index, field)| match settings.charset {
            Charset::Utf8 => std::str::from_utf8(field)
                .map(|text| Cell::Text(text.to_string()))
                .map_err(|e| {
                    (
                        ParseErrorKind::InvalidUtf8,
                        format!("field {} is not valid UTF-8: {e}", index + 1),
                    )
                }),
            Charset::Other(_) => Ok(Cell::Bytes(field.to_vec())),
        })
        .collect()
}

fn skip_record(data: &mut ImportData, line: usize, kind: ParseErrorKind, message: String) {
    warn!(line, kind = kind.code(), %message, "Skipping malformed CSV record");
    metrics::counter!("impex_csv_parse_diagnostics_total", "kind" => kind.code()).increment(1);
    data.diagnostics
        .push(ParseDiagnostic::new(line, kind, message));
}

/// Decodes CSV content into rows.
///
/// Every record becomes one row, including a header row. Records that fail
/// to decode are logged, counted and returned as diagnostics.
///
/// Clean records are joined into one buffer and read by a single reader, one
/// record per scanned record.
#[must_use]
pub fn decode(input: &[u8], settings: &CsvSettings) -> ImportData {
    let mut data = ImportData::default();
    let mut clean = Vec::with_capacity(input.len() + 1);
    let mut clean_lines = Vec::new();

    for record in split_records(input, settings.separator.byte()) {
        if let Some((kind, message)) = record.defect {
            skip_record(&mut data, record.line, kind, message.to_string());
            continue;
        }
        clean.extend_from_slice(record.bytes);
        clean.push(b'\n');
        clean_lines.push(record.line);
    }

    let mut reader = reader_builder(settings).from_reader(clean.as_slice());
    let mut record = csv::ByteRecord::new();
    for line in clean_lines {
        match reader.read_byte_record(&mut record) {
            Ok(true) => match record_cells(&record, settings) {
                Ok(row) => data.push_row(line, row),
                Err((kind, message)) => skip_record(&mut data, line, kind, message),
            },
            Ok(false) => break,
            Err(e) => skip_record(&mut data, line, ParseErrorKind::Malformed, e.to_string()),
        }
    }

    data.diagnostics.sort_by_key(|d| d.line);
    metrics::counter!("impex_csv_rows_decoded_total").increment(data.rows.len() as u64);
    data
}

/// Encodes one row as a single line with every field quoted.
///
/// No line terminator is appended. An empty row yields an empty line.
///
/// # Errors
///
/// Returns [`Error::Serialization`] if the writer fails, or if the charset is
/// UTF-8 and the encoded line is not valid UTF-8.
pub fn encode(row: &[Cell], settings: &CsvSettings) -> Result<Cell> {
    let mut line = if row.is_empty() {
        Vec::new()
    } else {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .delimiter(settings.separator.byte())
            .quote(QUOTE)
            .double_quote(true)
            .quote_style(csv::QuoteStyle::Always)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer
            .write_record(row.iter().map(Cell::as_bytes))
            .map_err(|e| Error::Serialization(e.to_string()))?;
        writer
            .into_inner()
            .map_err(|e| Error::Serialization(e.to_string()))?
    };

    if line.last() == Some(&b'\n') {
        line.pop();
    }

    match settings.charset {
        Charset::Utf8 => String::from_utf8(line)
            .map(Cell::Text)
            .map_err(|e| Error::Serialization(format!("row is not valid UTF-8: {e}"))),
        Charset::Other(_) => Ok(Cell::Bytes(line)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::csv::ColumnSeparator;
    use crate::models::text_row;
    use test_case::test_case;

    fn utf8(separator: ColumnSeparator) -> CsvSettings {
        CsvSettings::new(separator)
    }

    fn latin1(separator: ColumnSeparator) -> CsvSettings {
        CsvSettings::new(separator).with_charset(Charset::Other("iso-8859-1".to_string()))
    }

    #[test]
    fn test_decode_basic() {
        let data = decode(b"\"a\";\"b\"\n\"c\";\"d\"", &utf8(ColumnSeparator::Semicolon));
        assert!(data.diagnostics.is_empty());
        assert_eq!(data.rows, vec![text_row(&["a", "b"]), text_row(&["c", "d"])]);
    }

    #[test]
    fn test_decode_empty_input() {
        assert!(decode(b"", &utf8(ColumnSeparator::Comma)).is_empty());
        assert!(decode(b"\n\n", &utf8(ColumnSeparator::Comma)).is_empty());
    }

    #[test]
    fn test_decode_unquoted_and_blank_fields() {
        let data = decode(b"a,,c\n", &utf8(ColumnSeparator::Comma));
        assert_eq!(data.rows, vec![text_row(&["a", "", "c"])]);
    }

    #[test]
    fn test_decode_embedded_specials() {
        let input = b"\"x,y\",\"say \"\"hi\"\"\",\"two\nlines\"\n\"next\"";
        let data = decode(input, &utf8(ColumnSeparator::Comma));
        assert!(data.diagnostics.is_empty());
        assert_eq!(
            data.rows,
            vec![
                text_row(&["x,y", "say \"hi\"", "two\nlines"]),
                text_row(&["next"]),
            ]
        );
    }

    #[test]
    fn test_decode_crlf_and_blank_lines() {
        let data = decode(b"\"a\"\r\n\r\n\"b\"\r\n", &utf8(ColumnSeparator::Comma));
        assert_eq!(data.rows, vec![text_row(&["a"]), text_row(&["b"])]);
    }

    #[test_case(b"a\"b,c\n\"ok\"", ParseErrorKind::LooseQuote ; "loose quote")]
    #[test_case(b" \"a\",c\n\"ok\"", ParseErrorKind::LooseQuote ; "space before quote")]
    #[test_case(b"\"a\" ,c\n\"ok\"", ParseErrorKind::TrailingGarbage ; "space after quote")]
    #[test_case(b"\"a\"x\n\"ok\"", ParseErrorKind::TrailingGarbage ; "garbage after quote")]
    fn test_decode_defect_on_first_line(input: &[u8], kind: ParseErrorKind) {
        let data = decode(input, &utf8(ColumnSeparator::Comma));
        assert_eq!(data.rows, vec![text_row(&["ok"])]);
        assert_eq!(data.diagnostics.len(), 1);
        assert_eq!(data.diagnostics[0].line, 1);
        assert_eq!(data.diagnostics[0].kind, kind);
    }

    #[test]
    fn test_decode_partial_failure_reports_line() {
        let input = b"\"a\";\"b\"\n\"c\";\"d\"\n\"bad\"x;\"e\"\n\"f\";\"g\"\n";
        let data = decode(input, &utf8(ColumnSeparator::Semicolon));

        assert_eq!(
            data.rows,
            vec![
                text_row(&["a", "b"]),
                text_row(&["c", "d"]),
                text_row(&["f", "g"]),
            ]
        );
        assert_eq!(data.row_lines, vec![1, 2, 4]);
        assert_eq!(data.diagnostics.len(), 1);
        assert_eq!(data.diagnostics[0].line, 3);
    }

    #[test]
    fn test_decode_line_numbers_count_embedded_newlines() {
        let input = b"\"multi\nline\"\n\"bad\"x\n\n\"after\"\n";
        let data = decode(input, &utf8(ColumnSeparator::Comma));
        assert_eq!(data.rows.len(), 2);
        assert_eq!(data.row_lines, vec![1, 5]);
        assert_eq!(data.diagnostics[0].line, 3);
    }

    #[test]
    fn test_decode_diagnostics_sorted_by_line() {
        let input = b"\"caf\xe9\"\n\"ok\"\n\"bad\"x\n";
        let data = decode(input, &utf8(ColumnSeparator::Comma));
        let lines: Vec<_> = data.diagnostics.iter().map(|d| (d.line, d.kind)).collect();
        assert_eq!(
            lines,
            vec![
                (1, ParseErrorKind::InvalidUtf8),
                (3, ParseErrorKind::TrailingGarbage),
            ]
        );
        assert_eq!(data.row_lines, vec![2]);
        assert_eq!(data.first_record_line(), Some(1));
    }

    #[test]
    fn test_decode_unterminated_quote() {
        let data = decode(b"\"a\"\n\"open,b\nc", &utf8(ColumnSeparator::Comma));
        assert_eq!(data.rows, vec![text_row(&["a"])]);
        assert_eq!(data.diagnostics.len(), 1);
        assert_eq!(data.diagnostics[0].kind, ParseErrorKind::UnterminatedQuote);
        assert_eq!(data.diagnostics[0].line, 2);
    }

    #[test]
    fn test_decode_invalid_utf8() {
        let input = b"\"caf\xe9\"\n\"ok\"";
        let data = decode(input, &utf8(ColumnSeparator::Comma));
        assert_eq!(data.rows, vec![text_row(&["ok"])]);
        assert_eq!(data.diagnostics[0].kind, ParseErrorKind::InvalidUtf8);

        let data = decode(input, &latin1(ColumnSeparator::Comma));
        assert!(data.diagnostics.is_empty());
        assert_eq!(data.rows[0], vec![Cell::Bytes(b"caf\xe9".to_vec())]);
        assert_eq!(data.rows[1], vec![Cell::Bytes(b"ok".to_vec())]);
    }

    #[test]
    fn test_separators_behave_alike() {
        let comma = decode(b"\"a\",\"b\"\nc,d", &utf8(ColumnSeparator::Comma));
        let semicolon = decode(b"\"a\";\"b\"\nc;d", &utf8(ColumnSeparator::Semicolon));
        assert_eq!(comma, semicolon);
    }

    #[test]
    fn test_encode_quotes_every_field() {
        let line = encode(&text_row(&["a", "b\"c", ""]), &utf8(ColumnSeparator::Semicolon)).unwrap();
        assert_eq!(line, Cell::Text("\"a\";\"b\"\"c\";\"\"".to_string()));
    }

    #[test]
    fn test_encode_tab_separator() {
        let line = encode(&text_row(&["a", "b"]), &utf8(ColumnSeparator::Tabulator)).unwrap();
        assert_eq!(line.as_text(), Some("\"a\"\t\"b\""));
    }

    #[test]
    fn test_encode_empty_row() {
        let line = encode(&[], &utf8(ColumnSeparator::Comma)).unwrap();
        assert_eq!(line, Cell::Text(String::new()));
    }

    #[test]
    fn test_encode_charset_handling() {
        let row = vec![Cell::Bytes(b"caf\xe9".to_vec())];

        let err = encode(&row, &utf8(ColumnSeparator::Comma)).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));

        let line = encode(&row, &latin1(ColumnSeparator::Comma)).unwrap();
        assert_eq!(line, Cell::Bytes(b"\"caf\xe9\"".to_vec()));
    }

    #[test]
    fn test_encode_then_decode_with_newline() {
        let settings = utf8(ColumnSeparator::Comma);
        let row = text_row(&["line1\nline2", "x,y", "q\"q"]);
        let line = encode(&row, &settings).unwrap();
        let data = decode(line.as_bytes(), &settings);
        assert_eq!(data.rows, vec![row]);
    }
}
