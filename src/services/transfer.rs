//! Import/export pipeline.
//!
//! Wires a template's object backend and format backend together:
//!
//! ```text
//! import: bytes ──FormatBackend::import_data──▶ rows ──ObjectBackend::import_row──▶ objects
//! export: objects ──ObjectBackend::export_data──▶ rows ──FormatBackend::export_row──▶ lines
//! ```

use crate::backends::csv::headers_enabled;
use crate::backends::{BackendRegistry, ImportRowStatus, ParseDiagnostic};
use crate::models::{Cell, Template, TemplateId, TemplateKind, UserId, text_row};
use crate::{Error, Result};
use serde::Serialize;
use tracing::{info, instrument, warn};

/// A row the object backend rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    /// 1-based position among data rows.
    pub counter: usize,
    /// 1-based input line the row starts on.
    pub line: usize,
    /// Error message.
    pub message: String,
}

/// Outcome of an import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Data rows handed to the object backend.
    pub total: usize,
    /// Rows that created an object.
    pub created: usize,
    /// Rows that updated an object.
    pub updated: usize,
    /// Rows the object backend ignored.
    pub skipped: usize,
    /// Rows the object backend rejected.
    pub failed: usize,
    /// Details of rejected rows.
    pub row_errors: Vec<RowError>,
    /// Records the format backend could not decode.
    pub diagnostics: Vec<ParseDiagnostic>,
}

impl ImportReport {
    fn record(&mut self, status: ImportRowStatus) {
        match status {
            ImportRowStatus::Created => self.created += 1,
            ImportRowStatus::Updated => self.updated += 1,
            ImportRowStatus::Skipped => self.skipped += 1,
        }
    }
}

/// Outcome of an export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    /// Serialized lines, header first when enabled.
    pub lines: Vec<Cell>,
}

impl ExportReport {
    /// Joins all lines with `\n`.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                out.push(b'\n');
            }
            out.extend_from_slice(line.as_bytes());
        }
        out
    }
}

/// Runs imports and exports for stored templates.
pub struct TransferService<'a> {
    registry: &'a BackendRegistry,
}

impl<'a> TransferService<'a> {
    /// Creates a service resolving backends through `registry`.
    #[must_use]
    pub const fn new(registry: &'a BackendRegistry) -> Self {
        Self { registry }
    }

    /// Imports raw content through an import template.
    ///
    /// Rows the object backend rejects are counted and reported; they do not
    /// stop the import. With column headers enabled, the first record of the
    /// input is the header. It is dropped only if it decoded; a header that
    /// failed to decode is reported as a diagnostic and every data row is
    /// kept.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if the template does not exist
    /// - [`Error::InvalidInput`] if it is not an import template or its
    ///   format data is invalid
    /// - backend resolution errors
    #[instrument(skip(self, content), fields(template_id = %template_id, bytes = content.len()))]
    pub fn import(
        &self,
        template_id: TemplateId,
        content: &[u8],
        user_id: UserId,
    ) -> Result<ImportReport> {
        let template = self.template_of_kind(template_id, TemplateKind::Import)?;
        let object = self.registry.object_backend(&template.object_type)?;
        let format = self.registry.format_backend(&template.format_type)?;

        let data = format.import_data(template_id, content)?;
        let header_line = if self.headers_enabled(template_id)? {
            data.first_record_line()
        } else {
            None
        };

        let mut report = ImportReport::default();
        let rows = data
            .numbered_rows()
            .filter(|&(line, _)| Some(line) != header_line);

        for (index, (line, row)) in rows.enumerate() {
            let counter = index + 1;
            report.total += 1;
            match object.import_row(template_id, row, counter, user_id) {
                Ok(status) => {
                    report.record(status);
                    metrics::counter!(
                        "impex_transfer_rows_total",
                        "direction" => "import",
                        "status" => status.as_str()
                    )
                    .increment(1);
                },
                Err(e) => {
                    warn!(counter, line, error = %e, "Row import failed");
                    metrics::counter!(
                        "impex_transfer_rows_total",
                        "direction" => "import",
                        "status" => "failed"
                    )
                    .increment(1);
                    report.failed += 1;
                    report.row_errors.push(RowError {
                        counter,
                        line,
                        message: e.to_string(),
                    });
                },
            }
        }
        report.diagnostics = data.diagnostics;

        info!(
            total = report.total,
            created = report.created,
            updated = report.updated,
            skipped = report.skipped,
            failed = report.failed,
            diagnostics = report.diagnostics.len(),
            "Import finished"
        );
        Ok(report)
    }

    /// Exports objects through an export template.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if the template does not exist
    /// - [`Error::InvalidInput`] if it is not an export template or its
    ///   format data is invalid
    /// - [`Error::Serialization`] if a row cannot be encoded
    /// - backend resolution and object backend errors
    #[instrument(skip(self), fields(template_id = %template_id))]
    pub fn export(&self, template_id: TemplateId, user_id: UserId) -> Result<ExportReport> {
        let template = self.template_of_kind(template_id, TemplateKind::Export)?;
        let object = self.registry.object_backend(&template.object_type)?;
        let format = self.registry.format_backend(&template.format_type)?;

        let rows = object.export_data(template_id, user_id)?;
        let mut lines = Vec::with_capacity(rows.len() + 1);

        if self.headers_enabled(template_id)? {
            let headers = object.column_headers(template_id)?;
            if !headers.is_empty() {
                lines.push(format.export_row(template_id, &text_row(&headers))?);
            }
        }

        for row in &rows {
            lines.push(format.export_row(template_id, row)?);
        }

        metrics::counter!(
            "impex_transfer_rows_total",
            "direction" => "export",
            "status" => "exported"
        )
        .increment(rows.len() as u64);
        info!(rows = rows.len(), lines = lines.len(), "Export finished");

        Ok(ExportReport { lines })
    }

    fn template_of_kind(&self, template_id: TemplateId, kind: TemplateKind) -> Result<Template> {
        let template = self.registry.context().templates.get(template_id)?;
        if template.kind != kind {
            return Err(Error::InvalidInput(format!(
                "template {} has kind {}, expected {kind}",
                template.number, template.kind
            )));
        }
        Ok(template)
    }

    fn headers_enabled(&self, template_id: TemplateId) -> Result<bool> {
        let data = self.registry.context().format_data.get_all(template_id)?;
        Ok(headers_enabled(&data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_report_to_bytes() {
        let report = ExportReport {
            lines: vec![Cell::from("\"a\""), Cell::from("\"b\"")],
        };
        assert_eq!(report.to_bytes(), b"\"a\"\n\"b\"");
        assert!(ExportReport::default().to_bytes().is_empty());
    }

    #[test]
    fn test_import_report_record() {
        let mut report = ImportReport::default();
        report.record(ImportRowStatus::Created);
        report.record(ImportRowStatus::Created);
        report.record(ImportRowStatus::Updated);
        report.record(ImportRowStatus::Skipped);
        assert_eq!((report.created, report.updated, report.skipped), (2, 1, 1));
    }
}
