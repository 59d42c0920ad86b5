//! Storage layer.
//!
//! Three logical tables back the crate:
//! - **template**: template metadata ([`TemplateStorage`])
//! - **`object_data`** / **`format_data`**: per-template key-value
//!   configuration ([`KeyValueStorage`])
//!
//! All stores share a single [`Database`] connection.

#![allow(clippy::significant_drop_tightening)]

pub mod key_value;
pub mod sqlite;
pub mod template;

pub use key_value::{DataTable, KeyValueStorage, SqliteKeyValueStorage};
pub use sqlite::Database;
pub use template::{SqliteTemplateStorage, TemplateStorage};

use crate::Result;
use std::path::PathBuf;
use std::sync::Arc;

/// The template store and both key-value stores over one database.
#[derive(Clone)]
pub struct Stores {
    /// Shared database.
    pub database: Arc<Database>,
    /// Template metadata.
    pub templates: Arc<dyn TemplateStorage>,
    /// Object backend configuration.
    pub object_data: Arc<dyn KeyValueStorage>,
    /// Format backend configuration.
    pub format_data: Arc<dyn KeyValueStorage>,
}

impl Stores {
    /// Wires all stores over an existing database.
    #[must_use]
    pub fn new(database: Arc<Database>) -> Self {
        let object_data: Arc<dyn KeyValueStorage> = Arc::new(SqliteKeyValueStorage::new(
            Arc::clone(&database),
            DataTable::ObjectData,
        ));
        let format_data: Arc<dyn KeyValueStorage> = Arc::new(SqliteKeyValueStorage::new(
            Arc::clone(&database),
            DataTable::FormatData,
        ));
        let templates: Arc<dyn TemplateStorage> = Arc::new(SqliteTemplateStorage::new(
            Arc::clone(&database),
            Arc::clone(&object_data),
            Arc::clone(&format_data),
        ));

        Self {
            database,
            templates,
            object_data,
            format_data,
        }
    }

    /// Opens the stores over a database file.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::new(Arc::new(Database::open(path)?)))
    }

    /// Opens the stores over an in-memory database (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(Arc::new(Database::in_memory()?)))
    }
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores")
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}
