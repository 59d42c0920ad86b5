//! Backend catalog configuration.
//!
//! The catalog maps logical backend names (the `object_type` / `format_type`
//! stored on templates) to a display label and the module whose factory
//! builds the backend.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendDescriptor {
    /// Display label.
    pub label: String,
    /// Module the registry builds the backend from. Defaults to the
    /// lowercased logical name.
    #[serde(default)]
    pub module: Option<String>,
}

impl BackendDescriptor {
    /// Creates an entry pointing at `module`.
    #[must_use]
    pub fn new(label: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            module: Some(module.into()),
        }
    }
}

/// Object and format backend catalogs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendCatalog {
    /// Object backends by logical name.
    #[serde(default)]
    pub object: BTreeMap<String, BackendDescriptor>,
    /// Format backends by logical name.
    #[serde(default = "default_format_backends")]
    pub format: BTreeMap<String, BackendDescriptor>,
}

fn default_format_backends() -> BTreeMap<String, BackendDescriptor> {
    BTreeMap::from([(
        "CSV".to_string(),
        BackendDescriptor::new("CSV (Comma Separated Values)", "csv"),
    )])
}

impl Default for BackendCatalog {
    fn default() -> Self {
        Self {
            object: BTreeMap::new(),
            format: default_format_backends(),
        }
    }
}

impl BackendCatalog {
    /// Adds or replaces an object backend entry.
    #[must_use]
    pub fn with_object(mut self, name: impl Into<String>, descriptor: BackendDescriptor) -> Self {
        self.object.insert(name.into(), descriptor);
        self
    }

    /// Adds or replaces a format backend entry.
    #[must_use]
    pub fn with_format(mut self, name: impl Into<String>, descriptor: BackendDescriptor) -> Self {
        self.format.insert(name.into(), descriptor);
        self
    }
}

/// Resolves the module name of a catalog entry.
#[must_use]
pub fn module_name(name: &str, descriptor: &BackendDescriptor) -> String {
    descriptor
        .module
        .as_deref()
        .map_or_else(|| name.to_lowercase(), str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_has_csv() {
        let catalog = BackendCatalog::default();
        assert!(catalog.object.is_empty());
        let csv = &catalog.format["CSV"];
        assert_eq!(module_name("CSV", csv), "csv");
    }

    #[test]
    fn test_module_defaults_to_lowercased_name() {
        let descriptor = BackendDescriptor {
            label: "Ticket".to_string(),
            module: None,
        };
        assert_eq!(module_name("Ticket", &descriptor), "ticket");
    }

    #[test]
    fn test_catalog_from_toml() {
        let catalog: BackendCatalog = toml::from_str(
            r#"
            [object.Ticket]
            label = "Ticket"
            module = "ticket"
            "#,
        )
        .unwrap();
        assert_eq!(catalog.object["Ticket"].label, "Ticket");
        // Omitted format table falls back to the built-in CSV entry.
        assert!(catalog.format.contains_key("CSV"));
    }
}
