//! SQLite-backed key-value storage for object and format data.

use super::KeyValueStorage;
use crate::models::TemplateId;
use crate::storage::sqlite::Database;
use crate::{Error, Result};
use rusqlite::{Connection, params, params_from_iter};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Which of the two key-value tables a store writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataTable {
    /// Object backend configuration.
    ObjectData,
    /// Format backend configuration.
    FormatData,
}

impl DataTable {
    /// Returns the table name.
    #[must_use]
    pub const fn table_name(&self) -> &'static str {
        match self {
            Self::ObjectData => "object_data",
            Self::FormatData => "format_data",
        }
    }
}

impl fmt::Display for DataTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// `SQLite` key-value storage over one [`DataTable`].
#[derive(Debug, Clone)]
pub struct SqliteKeyValueStorage {
    db: Arc<Database>,
    table: DataTable,
}

impl SqliteKeyValueStorage {
    /// Creates a store over the given table.
    #[must_use]
    pub const fn new(db: Arc<Database>, table: DataTable) -> Self {
        Self { db, table }
    }

    /// Returns the backing table.
    #[must_use]
    pub const fn table(&self) -> DataTable {
        self.table
    }

    fn validate(data: &BTreeMap<String, String>) -> Result<()> {
        for key in data.keys() {
            if key.trim().is_empty() {
                return Err(Error::InvalidInput(
                    "Key-value data contains an empty key".to_string(),
                ));
            }
            if key.chars().any(char::is_control) {
                return Err(Error::InvalidInput(format!(
                    "Key-value data key contains control characters: {key:?}"
                )));
            }
        }
        Ok(())
    }

    fn delete_in(&self, conn: &Connection, template_ids: &[TemplateId]) -> Result<usize> {
        let placeholders = vec!["?"; template_ids.len()].join(", ");
        let sql = format!(
            "DELETE FROM {} WHERE template_id IN ({placeholders})",
            self.table.table_name()
        );
        conn.execute(&sql, params_from_iter(template_ids.iter().map(|id| id.as_i64())))
            .map_err(|e| Error::operation(format!("delete_{}", self.table), e))
    }
}

impl KeyValueStorage for SqliteKeyValueStorage {
    fn get_all(&self, template_id: TemplateId) -> Result<BTreeMap<String, String>> {
        self.db.with_conn(|conn| {
            let sql = format!(
                "SELECT data_key, data_value FROM {} WHERE template_id = ?1",
                self.table.table_name()
            );
            let mut stmt = conn
                .prepare(&sql)
                .map_err(|e| Error::operation(format!("prepare_get_{}", self.table), e))?;

            let rows = stmt
                .query_map(params![template_id.as_i64()], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })
                .map_err(|e| Error::operation(format!("get_{}", self.table), e))?;

            rows.collect::<std::result::Result<BTreeMap<_, _>, _>>()
                .map_err(|e| Error::operation(format!("read_{}_row", self.table), e))
        })
    }

    fn save_all(&self, template_id: TemplateId, data: &BTreeMap<String, String>) -> Result<()> {
        Self::validate(data)?;

        self.db.transaction(|tx| {
            self.delete_in(tx, &[template_id])?;

            let sql = format!(
                "INSERT INTO {} (template_id, data_key, data_value) VALUES (?1, ?2, ?3)",
                self.table.table_name()
            );
            let mut stmt = tx
                .prepare(&sql)
                .map_err(|e| Error::operation(format!("prepare_insert_{}", self.table), e))?;
            for (key, value) in data {
                stmt.execute(params![template_id.as_i64(), key, value])
                    .map_err(|e| Error::operation(format!("insert_{}", self.table), e))?;
            }
            Ok(())
        })?;

        tracing::debug!(
            template_id = %template_id,
            table = %self.table,
            pairs = data.len(),
            "Saved key-value data"
        );
        Ok(())
    }

    fn delete_all(&self, template_ids: &[TemplateId]) -> Result<()> {
        if template_ids.is_empty() {
            return Ok(());
        }
        let removed = self.db.with_conn(|conn| self.delete_in(conn, template_ids))?;
        tracing::debug!(
            table = %self.table,
            templates = template_ids.len(),
            removed,
            "Deleted key-value data"
        );
        Ok(())
    }
}
