//! SQLite-based template metadata storage.

use super::TemplateStorage;
use crate::models::{
    NewTemplate, Template, TemplateId, TemplateKind, TemplateUpdate, UserId, ValidityState,
    sanitize_field,
};
use crate::storage::KeyValueStorage;
use crate::storage::sqlite::Database;
use crate::{Error, Result};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use std::sync::Arc;
use tracing::instrument;

const SELECT_COLUMNS: &str = "id, kind, object_type, format_type, name, validity_state, comment,
     created_at, created_by, changed_at, changed_by";

/// `SQLite` template storage.
///
/// Holds the two key-value stores so that deletes cascade explicitly into
/// object and format data before metadata rows are removed.
pub struct SqliteTemplateStorage {
    db: Arc<Database>,
    object_data: Arc<dyn KeyValueStorage>,
    format_data: Arc<dyn KeyValueStorage>,
}

impl SqliteTemplateStorage {
    /// Creates a template store.
    #[must_use]
    pub fn new(
        db: Arc<Database>,
        object_data: Arc<dyn KeyValueStorage>,
        format_data: Arc<dyn KeyValueStorage>,
    ) -> Self {
        Self {
            db,
            object_data,
            format_data,
        }
    }

    /// Returns the id of the template holding `name` for `object_type`, if any.
    fn find_by_name(conn: &Connection, object_type: &str, name: &str) -> Result<Option<TemplateId>> {
        conn.query_row(
            "SELECT id FROM template WHERE object_type = ?1 AND name = ?2",
            params![object_type, name],
            |row| row.get::<_, i64>(0),
        )
        .optional()
        .map(|id| id.map(TemplateId::new))
        .map_err(|e| Error::operation("find_template_by_name", e))
    }

    fn list_ids(&self, object_type: &str, kind: Option<TemplateKind>) -> Result<Vec<TemplateId>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id FROM template
                     WHERE object_type = ?1 AND (?2 IS NULL OR kind = ?2)
                     ORDER BY name ASC",
                )
                .map_err(|e| Error::operation("prepare_list_templates", e))?;

            let ids = stmt
                .query_map(params![object_type, kind.map(|k| k.as_str())], |row| {
                    row.get::<_, i64>(0)
                })
                .map_err(|e| Error::operation("list_templates", e))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| Error::operation("collect_template_ids", e))?;

            Ok(ids.into_iter().map(TemplateId::new).collect())
        })
    }

    fn require_user(user_id: UserId) -> Result<()> {
        if user_id <= 0 {
            return Err(Error::InvalidInput(format!(
                "A positive user id is required, got {user_id}"
            )));
        }
        Ok(())
    }

    fn normalize_comment(comment: Option<&String>) -> Option<String> {
        comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
    }
}

/// Raw template row as stored.
struct TemplateRow {
    id: i64,
    kind: String,
    object_type: String,
    format_type: String,
    name: String,
    validity_state: i64,
    comment: Option<String>,
    created_at: i64,
    created_by: i64,
    changed_at: i64,
    changed_by: i64,
}

impl TemplateRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            kind: row.get(1)?,
            object_type: row.get(2)?,
            format_type: row.get(3)?,
            name: row.get(4)?,
            validity_state: row.get(5)?,
            comment: row.get(6)?,
            created_at: row.get(7)?,
            created_by: row.get(8)?,
            changed_at: row.get(9)?,
            changed_by: row.get(10)?,
        })
    }

    fn into_template(self) -> Result<Template> {
        let id = TemplateId::new(self.id);
        let kind = self.kind.parse::<TemplateKind>()?;
        let validity = ValidityState::from_id(self.validity_state).ok_or_else(|| {
            Error::operation(
                "decode_template",
                format!("unknown validity state {} on template {id}", self.validity_state),
            )
        })?;

        Ok(Template {
            id,
            number: id.display_number(),
            kind,
            object_type: self.object_type,
            format_type: self.format_type,
            name: self.name,
            validity,
            comment: self.comment,
            created_at: u64::try_from(self.created_at).unwrap_or(0),
            created_by: self.created_by,
            changed_at: u64::try_from(self.changed_at).unwrap_or(0),
            changed_by: self.changed_by,
        })
    }
}

impl TemplateStorage for SqliteTemplateStorage {
    fn list(&self, object_type: &str) -> Result<Vec<TemplateId>> {
        self.list_ids(object_type, None)
    }

    fn list_by_kind(&self, object_type: &str, kind: TemplateKind) -> Result<Vec<TemplateId>> {
        self.list_ids(object_type, Some(kind))
    }

    fn get(&self, id: TemplateId) -> Result<Template> {
        let row = self.db.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM template WHERE id = ?1"),
                params![id.as_i64()],
                TemplateRow::from_row,
            )
            .optional()
            .map_err(|e| Error::operation("get_template", e))
        })?;

        row.ok_or_else(|| Error::NotFound {
            entity: "template",
            id: id.to_string(),
        })?
        .into_template()
    }

    #[instrument(skip(self, template), fields(object_type = %template.object_type))]
    fn add(&self, template: &NewTemplate) -> Result<TemplateId> {
        let object_type = sanitize_field(&template.object_type);
        let format_type = sanitize_field(&template.format_type);
        let name = sanitize_field(&template.name);

        for (field, value) in [
            ("object type", &object_type),
            ("format type", &format_type),
            ("name", &name),
        ] {
            if value.is_empty() {
                tracing::warn!(field, "Rejected template without required field");
                return Err(Error::InvalidInput(format!("Template {field} is required")));
            }
        }
        Self::require_user(template.user_id)?;

        let now = i64::try_from(crate::current_timestamp()).unwrap_or(i64::MAX);
        let comment = Self::normalize_comment(template.comment.as_ref());

        let id = self.db.transaction(|tx| {
            if Self::find_by_name(tx, &object_type, &name)?.is_some() {
                tracing::warn!(name = %name, "Template name already in use");
                return Err(Error::Conflict {
                    object_type: object_type.clone(),
                    name: name.clone(),
                });
            }

            tx.execute(
                "INSERT INTO template
                 (kind, object_type, format_type, name, validity_state, comment,
                  created_at, created_by, changed_at, changed_by)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?7, ?8)",
                params![
                    template.kind.as_str(),
                    object_type,
                    format_type,
                    name,
                    template.validity.as_id(),
                    comment,
                    now,
                    template.user_id,
                ],
            )
            .map_err(|e| Error::operation("insert_template", e))?;

            Ok(TemplateId::new(tx.last_insert_rowid()))
        })?;

        tracing::info!(template_id = %id, name = %name, format_type = %format_type, "Added template");
        Ok(id)
    }

    #[instrument(skip(self, update), fields(template_id = %id))]
    fn update(&self, id: TemplateId, update: &TemplateUpdate) -> Result<()> {
        let name = sanitize_field(&update.name);
        if name.is_empty() {
            return Err(Error::InvalidInput("Template name is required".to_string()));
        }
        Self::require_user(update.user_id)?;

        let now = i64::try_from(crate::current_timestamp()).unwrap_or(i64::MAX);
        let comment = Self::normalize_comment(update.comment.as_ref());

        self.db.transaction(|tx| {
            let object_type: String = tx
                .query_row(
                    "SELECT object_type FROM template WHERE id = ?1",
                    params![id.as_i64()],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| Error::operation("get_template_object_type", e))?
                .ok_or_else(|| Error::NotFound {
                    entity: "template",
                    id: id.to_string(),
                })?;

            if let Some(existing) = Self::find_by_name(tx, &object_type, &name)?
                && existing != id
            {
                tracing::warn!(name = %name, conflicting_id = %existing, "Template name already in use");
                return Err(Error::Conflict { object_type, name: name.clone() });
            }

            tx.execute(
                "UPDATE template
                 SET name = ?1, validity_state = ?2, comment = ?3, changed_at = ?4, changed_by = ?5
                 WHERE id = ?6",
                params![
                    name,
                    update.validity.as_id(),
                    comment,
                    now,
                    update.user_id,
                    id.as_i64(),
                ],
            )
            .map_err(|e| Error::operation("update_template", e))?;
            Ok(())
        })?;

        tracing::info!(name = %name, validity = %update.validity, "Updated template");
        Ok(())
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    fn delete(&self, ids: &[TemplateId]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        self.object_data.delete_all(ids)?;
        self.format_data.delete_all(ids)?;

        let removed = self.db.with_conn(|conn| {
            let placeholders = vec!["?"; ids.len()].join(", ");
            conn.execute(
                &format!("DELETE FROM template WHERE id IN ({placeholders})"),
                params_from_iter(ids.iter().map(|id| id.as_i64())),
            )
            .map_err(|e| Error::operation("delete_templates", e))
        })?;

        tracing::info!(removed, "Deleted templates");
        Ok(())
    }
}
