//! Per-template key-value storage (object data and format data).

mod sqlite;
mod traits;

pub use sqlite::{DataTable, SqliteKeyValueStorage};
pub use traits::KeyValueStorage;
