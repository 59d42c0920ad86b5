//! Template metadata storage.

mod sqlite;
mod traits;

pub use sqlite::SqliteTemplateStorage;
pub use traits::TemplateStorage;
