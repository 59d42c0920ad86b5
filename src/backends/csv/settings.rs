//! Typed CSV configuration stored in a template's format data.

use crate::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Format data key holding the separator name.
pub const COLUMN_SEPARATOR_KEY: &str = "ColumnSeparator";
/// Format data key holding the charset.
pub const CHARSET_KEY: &str = "Charset";
/// Format data key flagging a header row (`1` / `0`).
pub const INCLUDE_COLUMN_HEADERS_KEY: &str = "IncludeColumnHeaders";

/// Column separator, stored by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnSeparator {
    /// `\t`
    Tabulator,
    /// `;`
    Semicolon,
    /// `:`
    Colon,
    /// `.`
    Dot,
    /// `,`
    Comma,
}

impl ColumnSeparator {
    /// All separators in display order.
    pub const ALL: [Self; 5] = [
        Self::Tabulator,
        Self::Semicolon,
        Self::Colon,
        Self::Dot,
        Self::Comma,
    ];

    /// Returns the stored name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tabulator => "Tabulator",
            Self::Semicolon => "Semicolon",
            Self::Colon => "Colon",
            Self::Dot => "Dot",
            Self::Comma => "Comma",
        }
    }

    /// Returns the delimiter byte.
    #[must_use]
    pub const fn byte(self) -> u8 {
        match self {
            Self::Tabulator => b'\t',
            Self::Semicolon => b';',
            Self::Colon => b':',
            Self::Dot => b'.',
            Self::Comma => b',',
        }
    }

    /// Returns the selection label, showing the character.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Tabulator => "Tabulator (TAB)",
            Self::Semicolon => "Semicolon (;)",
            Self::Colon => "Colon (:)",
            Self::Dot => "Dot (.)",
            Self::Comma => "Comma (,)",
        }
    }
}

impl fmt::Display for ColumnSeparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnSeparator {
    type Err = Error;

    /// Parses a separator name. Names are case-sensitive.
    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|sep| sep.as_str() == s)
            .ok_or_else(|| Error::InvalidInput(format!("unknown column separator '{s}'")))
    }
}

/// Character set of the external data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Charset {
    /// UTF-8; cells are decoded to text.
    #[default]
    Utf8,
    /// Any other charset, kept verbatim; cells stay raw bytes.
    Other(String),
}

impl Charset {
    /// Canonical UTF-8 name.
    pub const UTF8_NAME: &'static str = "UTF-8";

    /// Parses a configured charset.
    ///
    /// `utf-8` and `utf8` are recognised in any case and with surrounding
    /// whitespace. Other values are kept exactly as given.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the value is empty.
    pub fn parse(value: &str) -> Result<Self> {
        if value.is_empty() {
            return Err(Error::InvalidInput("charset must not be empty".to_string()));
        }
        let normalized = value.trim().to_lowercase();
        if normalized == "utf-8" || normalized == "utf8" {
            Ok(Self::Utf8)
        } else {
            Ok(Self::Other(value.to_string()))
        }
    }

    /// Returns the charset name (`UTF-8` for UTF-8).
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Utf8 => Self::UTF8_NAME,
            Self::Other(name) => name,
        }
    }

    /// Returns true for UTF-8.
    #[must_use]
    pub const fn is_utf8(&self) -> bool {
        matches!(self, Self::Utf8)
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CSV settings of one template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvSettings {
    /// Field delimiter.
    pub separator: ColumnSeparator,
    /// Character set of the data.
    pub charset: Charset,
    /// Whether the first row holds column headers.
    pub include_column_headers: bool,
}

impl CsvSettings {
    /// Creates settings with UTF-8 and no header row.
    #[must_use]
    pub fn new(separator: ColumnSeparator) -> Self {
        Self {
            separator,
            charset: Charset::Utf8,
            include_column_headers: false,
        }
    }

    /// Sets the charset.
    #[must_use]
    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }

    /// Sets the header flag.
    #[must_use]
    pub const fn with_column_headers(mut self, include: bool) -> Self {
        self.include_column_headers = include;
        self
    }

    /// Reads settings from format data.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the separator is missing or unknown,
    /// or the charset is missing or empty.
    pub fn from_format_data(data: &BTreeMap<String, String>) -> Result<Self> {
        let separator = data
            .get(COLUMN_SEPARATOR_KEY)
            .ok_or_else(|| Error::InvalidInput(format!("{COLUMN_SEPARATOR_KEY} is not set")))?
            .parse()?;
        let charset = Charset::parse(data.get(CHARSET_KEY).map_or("", String::as_str))?;

        Ok(Self {
            separator,
            charset,
            include_column_headers: headers_enabled(data),
        })
    }

    /// Converts settings into format data.
    #[must_use]
    pub fn to_format_data(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (
                COLUMN_SEPARATOR_KEY.to_string(),
                self.separator.as_str().to_string(),
            ),
            (CHARSET_KEY.to_string(), self.charset.as_str().to_string()),
            (
                INCLUDE_COLUMN_HEADERS_KEY.to_string(),
                if self.include_column_headers { "1" } else { "0" }.to_string(),
            ),
        ])
    }
}

/// Returns true if format data flags a header row.
#[must_use]
pub fn headers_enabled(data: &BTreeMap<String, String>) -> bool {
    data.get(INCLUDE_COLUMN_HEADERS_KEY)
        .is_some_and(|value| value == "1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("Tabulator", b'\t')]
    #[test_case("Semicolon", b';')]
    #[test_case("Colon", b':')]
    #[test_case("Dot", b'.')]
    #[test_case("Comma", b',')]
    fn test_separator_names(name: &str, byte: u8) {
        let sep: ColumnSeparator = name.parse().unwrap();
        assert_eq!(sep.byte(), byte);
        assert_eq!(sep.to_string(), name);
    }

    #[test_case("" ; "empty")]
    #[test_case("comma" ; "wrong case")]
    #[test_case("Pipe" ; "unsupported")]
    #[test_case(" Comma" ; "leading space")]
    fn test_unknown_separator_rejected(name: &str) {
        assert!(matches!(
            name.parse::<ColumnSeparator>(),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test_case("utf8" ; "lowercase without dash")]
    #[test_case("UTF-8" ; "canonical")]
    #[test_case(" utf-8 " ; "padded")]
    #[test_case("Utf8" ; "mixed case")]
    fn test_charset_utf8_normalized(value: &str) {
        let charset = Charset::parse(value).unwrap();
        assert_eq!(charset, Charset::Utf8);
        assert_eq!(charset.as_str(), "UTF-8");
    }

    #[test_case("iso-8859-1")]
    #[test_case(" windows-1252 ")]
    #[test_case("UTF-16")]
    fn test_charset_other_verbatim(value: &str) {
        let charset = Charset::parse(value).unwrap();
        assert_eq!(charset.as_str(), value);
        assert!(!charset.is_utf8());
    }

    #[test]
    fn test_charset_empty_rejected() {
        assert!(matches!(Charset::parse(""), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_settings_from_format_data() {
        let data = BTreeMap::from([
            ("ColumnSeparator".to_string(), "Semicolon".to_string()),
            ("Charset".to_string(), "utf8".to_string()),
            ("IncludeColumnHeaders".to_string(), "1".to_string()),
        ]);
        let settings = CsvSettings::from_format_data(&data).unwrap();
        assert_eq!(settings.separator, ColumnSeparator::Semicolon);
        assert_eq!(settings.charset, Charset::Utf8);
        assert!(settings.include_column_headers);

        let back = settings.to_format_data();
        assert_eq!(back["Charset"], "UTF-8");
        assert_eq!(back["IncludeColumnHeaders"], "1");
        assert_eq!(CsvSettings::from_format_data(&back).unwrap(), settings);
    }

    #[test]
    fn test_settings_missing_keys() {
        let mut data = BTreeMap::new();
        assert!(CsvSettings::from_format_data(&data).is_err());

        data.insert("ColumnSeparator".to_string(), "Comma".to_string());
        assert!(CsvSettings::from_format_data(&data).is_err());

        data.insert("Charset".to_string(), "latin1".to_string());
        let settings = CsvSettings::from_format_data(&data).unwrap();
        assert!(!settings.include_column_headers);
        assert_eq!(settings.charset, Charset::Other("latin1".to_string()));
    }
}
