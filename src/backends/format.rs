//! Format backend contract.

use crate::Result;
use crate::models::{AttributeDescriptor, Cell, Row, TemplateId, UserId};
use serde::Serialize;
use std::fmt;

/// Translates between generic tabular rows and an external serialized form.
///
/// Implementations read their per-template configuration from the format
/// data store handed to them at construction.
pub trait FormatBackend: Send + Sync {
    /// Logical name of the backend (`CSV`).
    fn name(&self) -> &str;

    /// Configurable attributes shown when editing a template.
    fn attributes(&self, user_id: UserId) -> Vec<AttributeDescriptor>;

    /// Attributes shown per mapped column.
    fn mapping_attributes(&self, user_id: UserId) -> Vec<AttributeDescriptor>;

    /// Parses raw content into rows.
    ///
    /// Empty content yields an empty [`ImportData`]. Records that fail to
    /// decode are reported as diagnostics and left out of the rows. Each row
    /// carries the line it starts on, so a header can be told apart from the
    /// first data row.
    ///
    /// # Errors
    ///
    /// Returns an error if the template's format data is missing or invalid.
    fn import_data(&self, template_id: TemplateId, source: &[u8]) -> Result<ImportData>;

    /// Serializes one row into a single output line.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Serialization`] if the row cannot be encoded,
    /// or a validation error if the template's format data is invalid.
    fn export_row(&self, template_id: TemplateId, row: &[Cell]) -> Result<Cell>;
}

/// Rows decoded from one import, plus what could not be decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportData {
    /// Successfully decoded rows, in input order.
    pub rows: Vec<Row>,
    /// 1-based starting line of each entry in `rows`.
    pub row_lines: Vec<usize>,
    /// One entry per record that was skipped.
    pub diagnostics: Vec<ParseDiagnostic>,
}

impl ImportData {
    /// Appends a decoded row that starts on `line`.
    pub fn push_row(&mut self, line: usize, row: Row) {
        self.row_lines.push(line);
        self.rows.push(row);
    }

    /// Returns true if nothing was decoded and nothing failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.diagnostics.is_empty()
    }

    /// Starting line of the first record in the input, decoded or not.
    #[must_use]
    pub fn first_record_line(&self) -> Option<usize> {
        self.row_lines
            .iter()
            .copied()
            .chain(self.diagnostics.iter().map(|d| d.line))
            .min()
    }

    /// Iterates over rows paired with their starting line.
    pub fn numbered_rows(&self) -> impl Iterator<Item = (usize, &Row)> {
        self.row_lines.iter().copied().zip(self.rows.iter())
    }
}

/// Why a record failed to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorKind {
    /// A quote appeared inside an unquoted field.
    LooseQuote,
    /// Characters followed a closing quote before the next separator.
    TrailingGarbage,
    /// Input ended inside a quoted field.
    UnterminatedQuote,
    /// The charset is UTF-8 but the record is not.
    InvalidUtf8,
    /// Any other decoder failure.
    Malformed,
}

impl ParseErrorKind {
    /// Stable short code for logs and metrics.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::LooseQuote => "loose_quote",
            Self::TrailingGarbage => "trailing_garbage",
            Self::UnterminatedQuote => "unterminated_quote",
            Self::InvalidUtf8 => "invalid_utf8",
            Self::Malformed => "malformed",
        }
    }
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A non-fatal, line-scoped decode failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseDiagnostic {
    /// 1-based line on which the failing record starts.
    pub line: usize,
    /// Failure category.
    pub kind: ParseErrorKind,
    /// Human-readable detail.
    pub message: String,
}

impl ParseDiagnostic {
    /// Creates a diagnostic.
    #[must_use]
    pub fn new(line: usize, kind: ParseErrorKind, message: impl Into<String>) -> Self {
        Self {
            line,
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {} ({})", self.line, self.message, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_display() {
        let diag = ParseDiagnostic::new(3, ParseErrorKind::LooseQuote, "quote in unquoted field");
        assert_eq!(
            diag.to_string(),
            "line 3: quote in unquoted field (loose_quote)"
        );
    }

    #[test]
    fn test_import_data_is_empty() {
        assert!(ImportData::default().is_empty());
        let data = ImportData {
            diagnostics: vec![ParseDiagnostic::new(1, ParseErrorKind::Malformed, "x")],
            ..ImportData::default()
        };
        assert!(!data.is_empty());
    }

    #[test]
    fn test_first_record_line() {
        assert_eq!(ImportData::default().first_record_line(), None);

        let mut data = ImportData::default();
        data.push_row(3, vec![Cell::from("a")]);
        assert_eq!(data.first_record_line(), Some(3));

        data.diagnostics
            .push(ParseDiagnostic::new(2, ParseErrorKind::LooseQuote, "x"));
        assert_eq!(data.first_record_line(), Some(2));
        assert_eq!(
            data.numbered_rows().collect::<Vec<_>>(),
            vec![(3, &vec![Cell::from("a")])]
        );
    }

    #[test]
    fn test_kind_serializes_as_code() {
        let json = serde_json::to_string(&ParseErrorKind::UnterminatedQuote).unwrap();
        assert_eq!(json, "\"unterminated_quote\"");
    }
}
