//! The shared `SQLite` database and its embedded schema migrations.

use super::connection::{acquire_lock, configure_connection};
use crate::{Error, Result};
use rusqlite::{Connection, OptionalExtension, Transaction};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A single schema migration.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    /// Sequential version, starting at 1.
    pub version: i64,
    /// Human-readable description.
    pub description: &'static str,
    /// SQL batch to apply.
    pub sql: &'static str,
}

/// Embedded migrations, applied in order on open.
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "template metadata and key-value data",
    sql: "
        CREATE TABLE IF NOT EXISTS template (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            kind TEXT NOT NULL,
            object_type TEXT NOT NULL,
            format_type TEXT NOT NULL,
            name TEXT NOT NULL,
            validity_state INTEGER NOT NULL,
            comment TEXT,
            created_at INTEGER NOT NULL,
            created_by INTEGER NOT NULL,
            changed_at INTEGER NOT NULL,
            changed_by INTEGER NOT NULL,
            UNIQUE (object_type, name)
        );
        CREATE TABLE IF NOT EXISTS object_data (
            template_id INTEGER NOT NULL REFERENCES template(id) ON DELETE CASCADE,
            data_key TEXT NOT NULL,
            data_value TEXT NOT NULL,
            PRIMARY KEY (template_id, data_key)
        );
        CREATE TABLE IF NOT EXISTS format_data (
            template_id INTEGER NOT NULL REFERENCES template(id) ON DELETE CASCADE,
            data_key TEXT NOT NULL,
            data_value TEXT NOT NULL,
            PRIMARY KEY (template_id, data_key)
        );
        CREATE INDEX IF NOT EXISTS idx_template_object_name ON template(object_type, name);
    ",
}];

/// Shared `SQLite` database used by all stores.
pub struct Database {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl Database {
    /// Opens (or creates) a database file and applies pending migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created, the file
    /// cannot be opened, or a migration fails.
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::operation("create_db_dir", e))?;
        }

        let conn = Connection::open(&db_path).map_err(|e| Error::operation("open_db", e))?;
        Self::from_connection(conn, db_path)
    }

    /// Creates an in-memory database (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub fn in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| Error::operation("open_db_memory", e))?;
        Self::from_connection(conn, PathBuf::from(":memory:"))
    }

    fn from_connection(conn: Connection, db_path: PathBuf) -> Result<Self> {
        configure_connection(&conn)?;
        let db = Self {
            conn: Mutex::new(conn),
            db_path,
        };
        db.migrate()?;
        tracing::debug!(path = %db.db_path.display(), version = db.schema_version()?, "Opened template database");
        Ok(db)
    }

    /// Returns the database path (`:memory:` for in-memory databases).
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Runs `f` with the locked connection.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `f`.
    pub fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = acquire_lock(&self.conn);
        f(&conn)
    }

    /// Runs `f` inside a transaction, committing on success.
    ///
    /// The transaction is rolled back when `f` fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started or committed, or
    /// propagates the error returned by `f`.
    pub fn transaction<T>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        let mut conn = acquire_lock(&self.conn);
        let tx = conn
            .transaction()
            .map_err(|e| Error::operation("begin_transaction", e))?;
        let value = f(&tx)?;
        tx.commit()
            .map_err(|e| Error::operation("commit_transaction", e))?;
        Ok(value)
    }

    /// Returns the applied schema version (0 for a fresh database).
    ///
    /// # Errors
    ///
    /// Returns an error if the version table cannot be read.
    pub fn schema_version(&self) -> Result<i64> {
        self.with_conn(|conn| {
            conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                row.get::<_, Option<i64>>(0)
            })
            .optional()
            .map(|v| v.flatten().unwrap_or(0))
            .map_err(|e| Error::operation("read_schema_version", e))
        })
    }

    fn migrate(&self) -> Result<()> {
        self.transaction(|tx| {
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS schema_version (
                    version INTEGER PRIMARY KEY,
                    description TEXT NOT NULL,
                    applied_at INTEGER NOT NULL
                )",
            )
            .map_err(|e| Error::operation("create_schema_version_table", e))?;

            let current: i64 = tx
                .query_row(
                    "SELECT COALESCE(MAX(version), 0) FROM schema_version",
                    [],
                    |row| row.get(0),
                )
                .map_err(|e| Error::operation("read_schema_version", e))?;

            for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
                tx.execute_batch(migration.sql)
                    .map_err(|e| Error::operation("apply_migration", e))?;
                tx.execute(
                    "INSERT INTO schema_version (version, description, applied_at) VALUES (?1, ?2, ?3)",
                    rusqlite::params![
                        migration.version,
                        migration.description,
                        i64::try_from(crate::current_timestamp()).unwrap_or(i64::MAX),
                    ],
                )
                .map_err(|e| Error::operation("record_migration", e))?;
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "Applied schema migration"
                );
            }
            Ok(())
        })
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}
