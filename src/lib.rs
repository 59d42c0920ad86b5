//! # Impex
//!
//! Import/export templates with pluggable object and format backends.
//!
//! A template binds a domain object type (for example `Ticket`) and a data
//! format type (for example `CSV`) together with user-supplied configuration.
//! The crate stores templates and their key-value configuration in `SQLite`,
//! resolves backends by name through an explicit registry, and ships a CSV
//! format backend as the reference implementation of the format contract.
//!
//! ## Example
//!
//! ```rust,ignore
//! use impex::backends::{BackendContext, BackendRegistry};
//! use impex::models::{NewTemplate, TemplateKind};
//! use impex::storage::Stores;
//!
//! let stores = Stores::in_memory()?;
//! let id = stores.templates.add(&NewTemplate::new(
//!     TemplateKind::Import, "Ticket", "CSV", "Nightly ticket import", 1,
//! ))?;
//!
//! let registry = BackendRegistry::with_defaults(BackendContext::from_stores(&stores, config));
//! let csv = registry.format_backend("CSV")?;
//! let data = csv.import_data(id, b"\"a\";\"b\"")?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod backends;
pub mod config;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;

pub use backends::{
    BackendContext, BackendHandle, BackendKind, BackendRegistry, Dispatcher, FormatBackend,
    ImportData, ObjectBackend, ParseDiagnostic,
};
pub use config::ImpexConfig;
pub use models::{
    AttributeDescriptor, Cell, NewTemplate, Row, Template, TemplateId, TemplateKind,
    TemplateUpdate, UserId, ValidityState,
};
pub use services::TransferService;
pub use storage::{KeyValueStorage, Stores, TemplateStorage};

/// Error type for impex operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `InvalidInput` | Required fields missing, malformed keys, unknown CSV separator, empty charset |
/// | `Conflict` | A template name is already taken for the object type |
/// | `NotFound` | A template id does not exist |
/// | `BackendLoad` | No catalog entry or no registered factory for a backend name |
/// | `BackendInstantiation` | A backend factory failed to construct its backend |
/// | `Serialization` | A row could not be combined into an output line |
/// | `OperationFailed` | `SQLite` queries fail, I/O errors, lock failures |
#[derive(Debug, ThisError)]
pub enum Error {
    /// Invalid input was provided.
    ///
    /// Raised before any side effect when:
    /// - A template is added without object type, format type or name
    /// - A key-value mapping contains an empty or control-character key
    /// - CSV settings carry an unknown separator or an empty charset
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A template with the same name already exists for the object type.
    #[error("template name '{name}' is already used for object type '{object_type}'")]
    Conflict {
        /// Object type scoping the name.
        object_type: String,
        /// The colliding name.
        name: String,
    },

    /// A referenced entity does not exist.
    #[error("{entity} '{id}' not found")]
    NotFound {
        /// Kind of entity (`template`, ...).
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// A backend could not be located.
    ///
    /// Raised when the catalog has no entry for the requested name or when no
    /// factory is registered for the module the catalog points to.
    #[error("backend '{identifier}' could not be loaded: {cause}")]
    BackendLoad {
        /// Fully-qualified backend identifier (`Format::CSV`).
        identifier: String,
        /// Why loading failed.
        cause: String,
    },

    /// A backend was located but could not be constructed.
    #[error("backend '{identifier}' could not be instantiated: {cause}")]
    BackendInstantiation {
        /// Fully-qualified backend identifier.
        identifier: String,
        /// Why construction failed.
        cause: String,
    },

    /// A row could not be serialized into the output format.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - `SQLite` database operations fail
    /// - Filesystem I/O errors occur
    /// - Configuration files cannot be read or parsed
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Shorthand for [`Error::OperationFailed`].
    pub fn operation(operation: impl Into<String>, cause: impl ToString) -> Self {
        Self::OperationFailed {
            operation: operation.into(),
            cause: cause.to_string(),
        }
    }

    /// Returns a short stable label for the variant, used in log fields and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::Conflict { .. } => "conflict",
            Self::NotFound { .. } => "not_found",
            Self::BackendLoad { .. } => "backend_load",
            Self::BackendInstantiation { .. } => "backend_instantiation",
            Self::Serialization(_) => "serialization",
            Self::OperationFailed { .. } => "operation_failed",
        }
    }
}

/// Result type alias for impex operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current Unix timestamp in seconds.
///
/// Falls back to 0 if the system clock is before the Unix epoch.
#[must_use]
pub fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
