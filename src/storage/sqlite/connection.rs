//! Shared connection handling for the `SQLite` stores.
//!
//! All stores share one connection behind a mutex. Lock acquisition recovers
//! from poisoning so that a panic in one critical section does not take every
//! later store call down with it.

use crate::Result;
use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard};

/// Busy timeout applied to every connection, in milliseconds.
pub const BUSY_TIMEOUT_MS: u32 = 5_000;

/// Acquires a mutex lock, recovering the inner value if it was poisoned.
pub fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("SQLite mutex was poisoned, recovering");
            metrics::counter!("impex_sqlite_mutex_poison_recovery_total").increment(1);
            poisoned.into_inner()
        },
    }
}

/// Configures a `SQLite` connection.
///
/// # Configuration Applied
///
/// - **`foreign_keys`**: on, so `object_data`/`format_data` rows reference live templates
/// - **WAL mode**: concurrent readers with a single writer (file databases only)
/// - **NORMAL synchronous**: balances durability with performance
/// - **`busy_timeout`**: waits for locks instead of failing immediately
///
/// # Errors
///
/// Returns [`crate::Error::OperationFailed`] if foreign keys cannot be enabled.
pub fn configure_connection(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")
        .map_err(|e| crate::Error::operation("enable_foreign_keys", e))?;

    // journal_mode returns a row, so failures here are tolerated rather than
    // surfaced; in-memory databases report "memory".
    let _ = conn.pragma_update(None, "journal_mode", "WAL");
    let _ = conn.pragma_update(None, "synchronous", "NORMAL");
    let _ = conn.pragma_update(None, "busy_timeout", BUSY_TIMEOUT_MS.to_string());

    Ok(())
}
