//! CSV format backend.
//!
//! Configuration lives in the template's format data (see [`CsvSettings`]).
//! Import decodes in-memory content into rows, reporting undecodable records
//! as diagnostics. Export quotes every field and appends no terminator.

pub mod codec;
mod settings;

pub use settings::{
    CHARSET_KEY, COLUMN_SEPARATOR_KEY, Charset, ColumnSeparator, CsvSettings,
    INCLUDE_COLUMN_HEADERS_KEY, headers_enabled,
};

use super::{BackendContext, FormatBackend, ImportData};
use crate::models::{
    AttributeDescriptor, Cell, InputDescriptor, SelectOption, TemplateId, UserId,
};
use crate::storage::KeyValueStorage;
use crate::Result;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Mapping key driving the column counter.
pub const COLUMN_KEY: &str = "Column";

/// The CSV format backend.
pub struct CsvFormatBackend {
    format_data: Arc<dyn KeyValueStorage>,
}

impl CsvFormatBackend {
    /// Logical name in the format catalog.
    pub const NAME: &'static str = "CSV";
    /// Module name the factory is registered under.
    pub const MODULE: &'static str = "csv";

    /// Creates the backend over the context's format data store.
    #[must_use]
    pub fn new(context: &BackendContext) -> Self {
        Self {
            format_data: Arc::clone(&context.format_data),
        }
    }

    /// Reads a template's settings.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the separator or charset is missing or
    /// invalid.
    pub fn settings(&self, template_id: TemplateId) -> Result<CsvSettings> {
        CsvSettings::from_format_data(&self.format_data.get_all(template_id)?)
    }
}

impl FormatBackend for CsvFormatBackend {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn attributes(&self, _user_id: UserId) -> Vec<AttributeDescriptor> {
        let separators = ColumnSeparator::ALL
            .into_iter()
            .map(|sep| SelectOption::new(sep.as_str(), sep.label()))
            .collect();

        vec![
            AttributeDescriptor::new(
                COLUMN_SEPARATOR_KEY,
                "Column Separator",
                InputDescriptor::selection(separators)
                    .required()
                    .translated()
                    .possible_none(),
            ),
            AttributeDescriptor::new(
                CHARSET_KEY,
                "Charset",
                InputDescriptor::text()
                    .required()
                    .with_default(Charset::UTF8_NAME)
                    .with_length(20, 20),
            ),
            AttributeDescriptor::new(
                INCLUDE_COLUMN_HEADERS_KEY,
                "Include Column Headers",
                InputDescriptor::selection(vec![
                    SelectOption::new("1", "Yes"),
                    SelectOption::new("0", "No"),
                ])
                .with_default("1"),
            ),
        ]
    }

    fn mapping_attributes(&self, _user_id: UserId) -> Vec<AttributeDescriptor> {
        vec![AttributeDescriptor::new(
            COLUMN_KEY,
            "Column",
            InputDescriptor::dtl("Counter").readonly(),
        )]
    }

    #[instrument(skip(self, source), fields(template_id = %template_id, bytes = source.len()))]
    fn import_data(&self, template_id: TemplateId, source: &[u8]) -> Result<ImportData> {
        if source.is_empty() {
            debug!("No content to import");
            return Ok(ImportData::default());
        }

        let settings = self.settings(template_id)?;
        let data = codec::decode(source, &settings);
        debug!(
            rows = data.rows.len(),
            diagnostics = data.diagnostics.len(),
            "CSV content decoded"
        );
        Ok(data)
    }

    fn export_row(&self, template_id: TemplateId, row: &[Cell]) -> Result<Cell> {
        let settings = self.settings(template_id)?;
        codec::encode(row, &settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImpexConfig;
    use crate::models::{InputType, NewTemplate, TemplateKind, text_row};
    use crate::storage::Stores;
    use crate::Error;

    fn setup(settings: Option<&CsvSettings>) -> (CsvFormatBackend, TemplateId) {
        let stores = Stores::in_memory().unwrap();
        let id = stores
            .templates
            .add(&NewTemplate::new(TemplateKind::Import, "Ticket", "CSV", "T", 1))
            .unwrap();
        if let Some(settings) = settings {
            stores
                .format_data
                .save_all(id, &settings.to_format_data())
                .unwrap();
        }
        let ctx = BackendContext::from_stores(&stores, ImpexConfig::default());
        (CsvFormatBackend::new(&ctx), id)
    }

    #[test]
    fn test_attributes() {
        let (backend, _) = setup(None);
        let attrs = backend.attributes(1);
        let keys: Vec<_> = attrs.iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, ["ColumnSeparator", "Charset", "IncludeColumnHeaders"]);

        assert_eq!(attrs[0].input.input_type, InputType::Selection);
        assert_eq!(attrs[0].input.options.len(), 5);
        assert!(attrs[0].input.required);
        assert!(attrs[0].input.translation);
        assert_eq!(attrs[1].input.default_value.as_deref(), Some("UTF-8"));
        assert_eq!(attrs[1].input.max_length, Some(20));
        assert_eq!(attrs[2].input.default_value.as_deref(), Some("1"));

        let mapping = backend.mapping_attributes(1);
        assert_eq!(mapping[0].key, "Column");
        assert_eq!(mapping[0].input.input_type, InputType::Dtl);
        assert!(mapping[0].input.readonly);
    }

    #[test]
    fn test_import_empty_without_settings() {
        let (backend, id) = setup(None);
        assert!(backend.import_data(id, b"").unwrap().is_empty());
        assert!(matches!(
            backend.import_data(id, b"\"a\""),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_import_and_export() {
        let settings = CsvSettings::new(ColumnSeparator::Semicolon).with_column_headers(true);
        let (backend, id) = setup(Some(&settings));

        let data = backend.import_data(id, b"\"h1\";\"h2\"\n\"a\";\"b\"").unwrap();
        assert_eq!(data.rows, vec![text_row(&["h1", "h2"]), text_row(&["a", "b"])]);

        let line = backend.export_row(id, &text_row(&["a", "b;c"])).unwrap();
        assert_eq!(line.as_text(), Some("\"a\";\"b;c\""));
    }

    #[test]
    fn test_invalid_separator_in_format_data() {
        let (backend, id) = setup(None);
        let stores_data = std::collections::BTreeMap::from([
            ("ColumnSeparator".to_string(), "Pipe".to_string()),
            ("Charset".to_string(), "UTF-8".to_string()),
        ]);
        backend.format_data.save_all(id, &stores_data).unwrap();

        assert!(matches!(
            backend.export_row(id, &text_row(&["a"])),
            Err(Error::InvalidInput(_))
        ));
    }
}
