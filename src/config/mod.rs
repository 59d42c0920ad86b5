//! Configuration management.

mod catalog;

pub use catalog::{BackendCatalog, BackendDescriptor, module_name};

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration for impex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImpexConfig {
    /// Path to the `SQLite` template database.
    pub database_path: PathBuf,
    /// Logging settings.
    pub logging: LoggingSettings,
    /// Object and format backend catalogs.
    pub backends: BackendCatalog,
}

/// Logging section of the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoggingSettings {
    /// Filter directive (`info`, `impex=debug`, ...). `RUST_LOG` wins when set.
    pub level: Option<String>,
    /// Output format: `pretty` or `json`.
    pub format: Option<String>,
    /// Optional log file; logs go to stderr when absent.
    pub file: Option<PathBuf>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Database path.
    pub database_path: Option<String>,
    /// Logging settings.
    pub logging: Option<LoggingSettings>,
    /// Backend catalogs.
    pub backends: Option<BackendCatalog>,
}

impl Default for ImpexConfig {
    fn default() -> Self {
        Self {
            database_path: Self::default_database_path(),
            logging: LoggingSettings::default(),
            backends: BackendCatalog::default(),
        }
    }
}

impl ImpexConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the default database path.
    ///
    /// Uses the platform data directory (`~/.local/share/impex/impex.db` on
    /// Linux) and falls back to `./impex.db`.
    #[must_use]
    pub fn default_database_path() -> PathBuf {
        directories::ProjectDirs::from("", "", "impex").map_or_else(
            || PathBuf::from("impex.db"),
            |dirs| dirs.data_dir().join("impex.db"),
        )
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::operation("read_config_file", e))?;
        Self::from_toml(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid configuration file.
    pub fn from_toml(contents: &str) -> crate::Result<Self> {
        let file: ConfigFile = toml::from_str(contents)
            .map_err(|e| crate::Error::operation("parse_config_file", e))?;
        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`~/Library/Application Support/impex/` on macOS)
    /// 2. XDG config dir (`~/.config/impex/`)
    ///
    /// Returns default configuration if no config file is found.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read or parsed.
    /// Such a file is never skipped in favor of the defaults.
    pub fn load_default() -> crate::Result<Self> {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Ok(Self::default());
        };

        Self::load_first(&[
            base_dirs.config_dir().join("impex").join("config.toml"),
            base_dirs
                .home_dir()
                .join(".config")
                .join("impex")
                .join("config.toml"),
        ])
    }

    /// Loads the first existing file among `candidates`.
    fn load_first(candidates: &[PathBuf]) -> crate::Result<Self> {
        candidates
            .iter()
            .find(|p| p.exists())
            .map_or_else(|| Ok(Self::default()), |path| Self::load_from_file(path))
    }

    /// Converts a `ConfigFile` to `ImpexConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(path) = file.database_path {
            config.database_path = PathBuf::from(path);
        }
        if let Some(logging) = file.logging {
            config.logging = logging;
        }
        if let Some(backends) = file.backends {
            config.backends = backends;
        }

        config
    }

    /// Sets the database path.
    #[must_use]
    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = path.into();
        self
    }

    /// Sets the backend catalog.
    #[must_use]
    pub fn with_backends(mut self, backends: BackendCatalog) -> Self {
        self.backends = backends;
        self
    }
}
