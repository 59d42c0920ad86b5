//! Object and format backends.
//!
//! A template names one object backend and one format backend. Both are
//! resolved by logical name through the [`BackendRegistry`]:
//!
//! ```text
//! BackendRegistry
//!   ├── catalog (config)   name → module
//!   ├── factories          (kind, module) → Fn(&BackendContext) -> Arc<dyn ...>
//!   └── cache              "Format::CSV" → BackendHandle
//! ```

pub mod csv;
mod format;
mod object;
mod registry;

pub use format::{FormatBackend, ImportData, ParseDiagnostic, ParseErrorKind};
pub use object::{ImportRowStatus, ObjectBackend};
pub use registry::{BackendRegistry, Dispatcher, FormatFactory, ObjectFactory};

use crate::config::ImpexConfig;
use crate::storage::{KeyValueStorage, Stores, TemplateStorage};
use std::fmt;
use std::sync::Arc;

/// Which catalog a backend name is looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Domain-object backends.
    Object,
    /// Data-format backends.
    Format,
}

impl BackendKind {
    /// Returns the kind as it appears in identifiers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Object => "Object",
            Self::Format => "Format",
        }
    }

    /// Builds the fully-qualified identifier (`Format::CSV`).
    #[must_use]
    pub fn identifier(self, name: &str) -> String {
        format!("{}::{name}", self.as_str())
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved backend instance.
#[derive(Clone)]
pub enum BackendHandle {
    /// An object backend.
    Object(Arc<dyn ObjectBackend>),
    /// A format backend.
    Format(Arc<dyn FormatBackend>),
}

impl BackendHandle {
    /// Returns the kind of backend held.
    #[must_use]
    pub const fn kind(&self) -> BackendKind {
        match self {
            Self::Object(_) => BackendKind::Object,
            Self::Format(_) => BackendKind::Format,
        }
    }

    /// Returns the backend's logical name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Object(backend) => backend.name(),
            Self::Format(backend) => backend.name(),
        }
    }
}

impl fmt::Debug for BackendHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple(self.kind().as_str()).field(&self.name()).finish()
    }
}

/// Collaborators handed to every backend factory.
///
/// Backends may keep a clone. The [`Dispatcher`] lets them resolve sibling
/// backends through the registry that built them.
#[derive(Clone)]
pub struct BackendContext {
    /// Loaded configuration.
    pub config: Arc<ImpexConfig>,
    /// Template metadata.
    pub templates: Arc<dyn TemplateStorage>,
    /// Object backend configuration.
    pub object_data: Arc<dyn KeyValueStorage>,
    /// Format backend configuration.
    pub format_data: Arc<dyn KeyValueStorage>,
    /// Back-reference to the owning registry.
    pub dispatcher: Dispatcher,
}

impl BackendContext {
    /// Builds a context over opened stores.
    #[must_use]
    pub fn from_stores(stores: &Stores, config: impl Into<Arc<ImpexConfig>>) -> Self {
        Self {
            config: config.into(),
            templates: Arc::clone(&stores.templates),
            object_data: Arc::clone(&stores.object_data),
            format_data: Arc::clone(&stores.format_data),
            dispatcher: Dispatcher::default(),
        }
    }
}

impl fmt::Debug for BackendContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendContext")
            .field("config", &self.config)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}
