//! `SQLite` infrastructure shared by the template and key-value stores.

mod connection;
mod database;

pub use connection::{BUSY_TIMEOUT_MS, acquire_lock, configure_connection};
pub use database::{Database, MIGRATIONS, Migration};
