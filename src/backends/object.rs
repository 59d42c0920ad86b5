//! Object backend contract.
//!
//! No concrete object backend ships with the crate; host applications
//! register their own through [`super::BackendRegistry`].

use crate::Result;
use crate::models::{AttributeDescriptor, Row, TemplateId, UserId};
use serde::Serialize;

/// Translates between domain objects and generic tabular rows.
pub trait ObjectBackend: Send + Sync {
    /// Logical name of the backend (`Ticket`).
    fn name(&self) -> &str;

    /// Configurable attributes shown when editing a template.
    fn attributes(&self, user_id: UserId) -> Vec<AttributeDescriptor>;

    /// Attributes shown per mapped column.
    fn mapping_attributes(&self, user_id: UserId) -> Vec<AttributeDescriptor>;

    /// Collects the rows to export for a template.
    ///
    /// # Errors
    ///
    /// Returns an error if the objects cannot be read.
    fn export_data(&self, template_id: TemplateId, user_id: UserId) -> Result<Vec<Row>>;

    /// Applies one imported row.
    ///
    /// `counter` is the 1-based position of the row among data rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the row cannot be applied. The caller records the
    /// error and continues with the next row.
    fn import_row(
        &self,
        template_id: TemplateId,
        row: &Row,
        counter: usize,
        user_id: UserId,
    ) -> Result<ImportRowStatus>;

    /// Column headers prepended on export when headers are enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the mapping cannot be read.
    fn column_headers(&self, _template_id: TemplateId) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Outcome of importing one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportRowStatus {
    /// A new object was created.
    Created,
    /// An existing object was updated.
    Updated,
    /// The row was intentionally ignored.
    Skipped,
}

impl ImportRowStatus {
    /// Returns the status as a label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Skipped => "skipped",
        }
    }
}
