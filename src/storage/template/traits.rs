//! Template storage trait definition.

use crate::Result;
use crate::models::{NewTemplate, Template, TemplateId, TemplateKind, TemplateUpdate};

/// Trait for template metadata storage.
///
/// Names are unique per object type. Object and format type are fixed at
/// creation; only name, validity and comment change afterwards.
pub trait TemplateStorage: Send + Sync {
    /// Lists the ids of all templates for an object type, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be accessed.
    fn list(&self, object_type: &str) -> Result<Vec<TemplateId>>;

    /// Lists the ids of an object type's templates of one kind, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be accessed.
    fn list_by_kind(&self, object_type: &str, kind: TemplateKind) -> Result<Vec<TemplateId>>;

    /// Gets a template.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::NotFound`] if no such template exists.
    fn get(&self, id: TemplateId) -> Result<Template>;

    /// Adds a template and returns its id.
    ///
    /// Name, object type and format type are sanitized before validation.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::InvalidInput`] if a required field is empty
    /// - [`crate::Error::Conflict`] if the name is taken for the object type
    fn add(&self, template: &NewTemplate) -> Result<TemplateId>;

    /// Updates name, validity and comment.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::InvalidInput`] if the name is empty
    /// - [`crate::Error::NotFound`] if the template does not exist
    /// - [`crate::Error::Conflict`] if another template of the same object
    ///   type already uses the name
    fn update(&self, id: TemplateId, update: &TemplateUpdate) -> Result<()>;

    /// Deletes templates together with their object and format data.
    ///
    /// Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be accessed.
    fn delete(&self, ids: &[TemplateId]) -> Result<()>;
}
