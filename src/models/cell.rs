//! Cells and rows of the generic tabular pipeline.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// A single tabular cell.
///
/// Format backends return [`Cell::Text`] when the configured charset is
/// UTF-8 and [`Cell::Bytes`] otherwise, leaving decoding of foreign charsets
/// to the consumer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    /// Text known to be UTF-8.
    Text(String),
    /// Opaque bytes in some other charset.
    Bytes(Vec<u8>),
}

/// An ordered sequence of cells.
pub type Row = Vec<Cell>;

impl Cell {
    /// Returns the raw bytes of the cell.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(s) => s.as_bytes(),
            Self::Bytes(b) => b,
        }
    }

    /// Returns the text if the cell is tagged as UTF-8.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Bytes(_) => None,
        }
    }

    /// Returns whether the cell is tagged as UTF-8 text.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Returns the content as text, replacing invalid UTF-8 sequences.
    #[must_use]
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        match self {
            Self::Text(s) => Cow::Borrowed(s),
            Self::Bytes(b) => String::from_utf8_lossy(b),
        }
    }

    /// Consumes the cell and returns its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Text(s) => s.into_bytes(),
            Self::Bytes(b) => b,
        }
    }

    /// Returns whether the cell holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<Vec<u8>> for Cell {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

/// Builds a text row from string slices.
#[must_use]
pub fn text_row<S: AsRef<str>>(cells: &[S]) -> Row {
    cells.iter().map(|c| Cell::from(c.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_and_bytes_accessors() {
        let text = Cell::from("hällo");
        assert!(text.is_text());
        assert_eq!(text.as_text(), Some("hällo"));

        let bytes = Cell::from(vec![0x68, 0xe4, 0x6c]);
        assert!(!bytes.is_text());
        assert_eq!(bytes.as_bytes(), &[0x68, 0xe4, 0x6c]);
        assert_eq!(bytes.to_string_lossy(), "h\u{fffd}l");
    }

    #[test]
    fn test_text_row() {
        let row = text_row(&["a", "", "c"]);
        assert_eq!(row.len(), 3);
        assert!(row[1].is_empty());
    }
}
