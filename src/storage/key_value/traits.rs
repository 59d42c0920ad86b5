//! Key-value storage trait definition.

use crate::Result;
use crate::models::TemplateId;
use std::collections::BTreeMap;

/// Per-template key-value configuration storage.
///
/// Two instances exist: object data (consumed by object backends) and format
/// data (consumed by format backends). Both are owned by the template they
/// reference.
pub trait KeyValueStorage: Send + Sync {
    /// Returns every pair stored for the template.
    ///
    /// An unknown template yields an empty map.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be accessed.
    fn get_all(&self, template_id: TemplateId) -> Result<BTreeMap<String, String>>;

    /// Replaces the template's data with `data`.
    ///
    /// Existing pairs are deleted, then the given pairs are inserted. Merging
    /// is not supported.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidInput`] if a key is empty or contains
    /// control characters (checked before anything is deleted), or a storage
    /// error if the template does not exist or the write fails.
    fn save_all(&self, template_id: TemplateId, data: &BTreeMap<String, String>) -> Result<()>;

    /// Removes all pairs for the given templates.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be accessed.
    fn delete_all(&self, template_ids: &[TemplateId]) -> Result<()>;

    /// Returns a single value.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be accessed.
    fn get(&self, template_id: TemplateId, key: &str) -> Result<Option<String>> {
        Ok(self.get_all(template_id)?.remove(key))
    }
}
