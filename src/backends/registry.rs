//! Backend registry.
//!
//! Resolves logical backend names through the configured catalog to a
//! registered factory, and caches the constructed instance for the
//! registry's lifetime.

use super::csv::CsvFormatBackend;
use super::{BackendContext, BackendHandle, BackendKind, FormatBackend, ObjectBackend};
use crate::config::module_name;
use crate::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, Weak};
use tracing::{debug, instrument, warn};

/// Factory building a format backend.
pub type FormatFactory =
    Arc<dyn Fn(&BackendContext) -> Result<Arc<dyn FormatBackend>> + Send + Sync>;

/// Factory building an object backend.
pub type ObjectFactory =
    Arc<dyn Fn(&BackendContext) -> Result<Arc<dyn ObjectBackend>> + Send + Sync>;

/// Resolves and caches backends by logical name.
///
/// The registry is owned by the caller; nothing is global. The cache lock is
/// held while a backend is constructed, so each identifier is built at most
/// once per registry even under concurrent resolution.
pub struct BackendRegistry {
    context: BackendContext,
    format_factories: HashMap<String, FormatFactory>,
    object_factories: HashMap<String, ObjectFactory>,
    cache: Mutex<HashMap<String, BackendHandle>>,
}

impl BackendRegistry {
    /// Creates a registry with no factories.
    #[must_use]
    pub fn new(context: BackendContext) -> Self {
        Self {
            context,
            format_factories: HashMap::new(),
            object_factories: HashMap::new(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Moves the registry behind an `Arc` and attaches it to the context's
    /// [`Dispatcher`], so backends can resolve their siblings.
    #[must_use]
    pub fn into_shared(self) -> Arc<Self> {
        let shared = Arc::new(self);
        shared.context.dispatcher.attach(&shared);
        shared
    }

    /// Creates a registry with the built-in format backends registered.
    #[must_use]
    pub fn with_defaults(context: BackendContext) -> Self {
        Self::new(context).with_format(CsvFormatBackend::MODULE, |ctx| {
            Ok(Arc::new(CsvFormatBackend::new(ctx)) as Arc<dyn FormatBackend>)
        })
    }

    /// Registers a format backend factory under a module name.
    pub fn register_format<F>(&mut self, module: impl Into<String>, factory: F)
    where
        F: Fn(&BackendContext) -> Result<Arc<dyn FormatBackend>> + Send + Sync + 'static,
    {
        self.format_factories
            .insert(module.into(), Arc::new(factory));
    }

    /// Registers an object backend factory under a module name.
    pub fn register_object<F>(&mut self, module: impl Into<String>, factory: F)
    where
        F: Fn(&BackendContext) -> Result<Arc<dyn ObjectBackend>> + Send + Sync + 'static,
    {
        self.object_factories
            .insert(module.into(), Arc::new(factory));
    }

    /// Builder form of [`Self::register_format`].
    #[must_use]
    pub fn with_format<F>(mut self, module: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&BackendContext) -> Result<Arc<dyn FormatBackend>> + Send + Sync + 'static,
    {
        self.register_format(module, factory);
        self
    }

    /// Builder form of [`Self::register_object`].
    #[must_use]
    pub fn with_object<F>(mut self, module: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&BackendContext) -> Result<Arc<dyn ObjectBackend>> + Send + Sync + 'static,
    {
        self.register_object(module, factory);
        self
    }

    /// Returns the context passed to factories.
    #[must_use]
    pub const fn context(&self) -> &BackendContext {
        &self.context
    }

    /// Number of instances constructed so far.
    #[must_use]
    pub fn cached_count(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Resolves a backend by kind and logical name.
    ///
    /// # Errors
    ///
    /// - [`Error::BackendLoad`] if the catalog has no entry for the name or no
    ///   factory is registered for its module
    /// - [`Error::BackendInstantiation`] if the factory fails
    #[instrument(skip(self), fields(identifier = %kind.identifier(name)))]
    pub fn resolve(&self, kind: BackendKind, name: &str) -> Result<BackendHandle> {
        let identifier = kind.identifier(name);
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(handle) = cache.get(&identifier) {
            metrics::counter!(
                "impex_backend_resolutions_total",
                "kind" => kind.as_str(),
                "outcome" => "cached"
            )
            .increment(1);
            return Ok(handle.clone());
        }

        match self.instantiate(kind, name, &identifier) {
            Ok(handle) => {
                debug!(identifier = %identifier, "Backend instantiated");
                metrics::counter!(
                    "impex_backend_resolutions_total",
                    "kind" => kind.as_str(),
                    "outcome" => "created"
                )
                .increment(1);
                cache.insert(identifier, handle.clone());
                Ok(handle)
            },
            Err(e) => {
                warn!(identifier = %identifier, error = %e, "Backend resolution failed");
                metrics::counter!(
                    "impex_backend_resolutions_total",
                    "kind" => kind.as_str(),
                    "outcome" => e.kind()
                )
                .increment(1);
                Err(e)
            },
        }
    }

    /// Resolves a format backend.
    ///
    /// # Errors
    ///
    /// See [`Self::resolve`].
    pub fn format_backend(&self, name: &str) -> Result<Arc<dyn FormatBackend>> {
        match self.resolve(BackendKind::Format, name)? {
            BackendHandle::Format(backend) => Ok(backend),
            BackendHandle::Object(_) => Err(kind_mismatch(BackendKind::Format, name)),
        }
    }

    /// Resolves an object backend.
    ///
    /// # Errors
    ///
    /// See [`Self::resolve`].
    pub fn object_backend(&self, name: &str) -> Result<Arc<dyn ObjectBackend>> {
        match self.resolve(BackendKind::Object, name)? {
            BackendHandle::Object(backend) => Ok(backend),
            BackendHandle::Format(_) => Err(kind_mismatch(BackendKind::Object, name)),
        }
    }

    fn instantiate(&self, kind: BackendKind, name: &str, identifier: &str) -> Result<BackendHandle> {
        let catalog = match kind {
            BackendKind::Object => &self.context.config.backends.object,
            BackendKind::Format => &self.context.config.backends.format,
        };
        let descriptor = catalog.get(name).ok_or_else(|| Error::BackendLoad {
            identifier: identifier.to_string(),
            cause: format!("no {} backend named '{name}' is configured", kind.as_str().to_lowercase()),
        })?;
        let module = module_name(name, descriptor);

        let missing_factory = || Error::BackendLoad {
            identifier: identifier.to_string(),
            cause: format!("no factory registered for module '{module}'"),
        };
        let instantiation_failed = |e: Error| Error::BackendInstantiation {
            identifier: identifier.to_string(),
            cause: e.to_string(),
        };

        match kind {
            BackendKind::Format => {
                let factory = self.format_factories.get(&module).ok_or_else(missing_factory)?;
                factory(&self.context)
                    .map(BackendHandle::Format)
                    .map_err(instantiation_failed)
            },
            BackendKind::Object => {
                let factory = self.object_factories.get(&module).ok_or_else(missing_factory)?;
                factory(&self.context)
                    .map(BackendHandle::Object)
                    .map_err(instantiation_failed)
            },
        }
    }
}

fn kind_mismatch(kind: BackendKind, name: &str) -> Error {
    Error::BackendLoad {
        identifier: kind.identifier(name),
        cause: "factory returned a backend of the wrong kind".to_string(),
    }
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut formats: Vec<_> = self.format_factories.keys().collect();
        let mut objects: Vec<_> = self.object_factories.keys().collect();
        formats.sort();
        objects.sort();
        f.debug_struct("BackendRegistry")
            .field("format_factories", &formats)
            .field("object_factories", &objects)
            .field("cached", &self.cached_count())
            .finish_non_exhaustive()
    }
}

/// Back-reference from a backend to the registry that built it.
///
/// Every [`BackendContext`] carries one. It is attached by
/// [`BackendRegistry::into_shared`] and holds the registry weakly. Resolve
/// siblings when they are needed, not from inside a factory: the cache lock
/// is held while a factory runs.
#[derive(Clone, Default)]
pub struct Dispatcher {
    registry: Arc<OnceLock<Weak<BackendRegistry>>>,
}

impl Dispatcher {
    fn attach(&self, registry: &Arc<BackendRegistry>) {
        if self.registry.set(Arc::downgrade(registry)).is_err() {
            warn!("Dispatcher already attached to a registry");
        }
    }

    fn registry(&self) -> Result<Arc<BackendRegistry>> {
        self.registry
            .get()
            .and_then(Weak::upgrade)
            .ok_or_else(|| Error::operation("dispatch", "no registry attached to this context"))
    }

    /// Returns true if the owning registry is still alive.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.registry.get().is_some_and(|r| r.strong_count() > 0)
    }

    /// Resolves a format backend through the owning registry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if no live registry is attached, or
    /// any error of [`BackendRegistry::format_backend`].
    pub fn format_backend(&self, name: &str) -> Result<Arc<dyn FormatBackend>> {
        self.registry()?.format_backend(name)
    }

    /// Resolves an object backend through the owning registry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if no live registry is attached, or
    /// any error of [`BackendRegistry::object_backend`].
    pub fn object_backend(&self, name: &str) -> Result<Arc<dyn ObjectBackend>> {
        self.registry()?.object_backend(name)
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("attached", &self.is_attached())
            .finish()
    }
}
