//! Attribute descriptors returned by backend introspection.
//!
//! Descriptors tell a configuration surface which keys a backend reads from
//! its template's key-value data and how each value should be entered. They
//! are never persisted.

use serde::{Deserialize, Serialize};

/// How a configuration value is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    /// Pick one of the enumerated options.
    Selection,
    /// Free text.
    Text,
    /// Expression evaluated per mapping row (for example a column counter).
    Dtl,
    /// Boolean toggle.
    Checkbox,
}

/// A single selectable option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    /// Stored value.
    pub value: String,
    /// Display label.
    pub label: String,
}

impl SelectOption {
    /// Creates an option.
    #[must_use]
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Input descriptor of an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDescriptor {
    /// Input widget type.
    pub input_type: InputType,
    /// Ordered options for [`InputType::Selection`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    /// Whether a value must be supplied.
    pub required: bool,
    /// Default value, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Display size of a text input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    /// Maximum accepted length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    /// Whether option labels should be translated.
    pub translation: bool,
    /// Whether the value is computed rather than entered.
    pub readonly: bool,
    /// Whether an empty selection is allowed.
    pub possible_none: bool,
    /// Counter key driving a [`InputType::Dtl`] input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counter_key: Option<String>,
}

impl InputDescriptor {
    fn of(input_type: InputType) -> Self {
        Self {
            input_type,
            options: Vec::new(),
            required: false,
            default_value: None,
            size: None,
            max_length: None,
            translation: false,
            readonly: false,
            possible_none: false,
            counter_key: None,
        }
    }

    /// Selection input over the given options.
    #[must_use]
    pub fn selection(options: Vec<SelectOption>) -> Self {
        Self {
            options,
            ..Self::of(InputType::Selection)
        }
    }

    /// Free-text input.
    #[must_use]
    pub fn text() -> Self {
        Self::of(InputType::Text)
    }

    /// Expression input driven by a counter key.
    #[must_use]
    pub fn dtl(counter_key: impl Into<String>) -> Self {
        Self {
            counter_key: Some(counter_key.into()),
            ..Self::of(InputType::Dtl)
        }
    }

    /// Marks the input required.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Sets display size and maximum length.
    #[must_use]
    pub const fn with_length(mut self, size: u32, max_length: u32) -> Self {
        self.size = Some(size);
        self.max_length = Some(max_length);
        self
    }

    /// Marks option labels as translatable.
    #[must_use]
    pub const fn translated(mut self) -> Self {
        self.translation = true;
        self
    }

    /// Marks the input readonly.
    #[must_use]
    pub const fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    /// Allows an empty selection.
    #[must_use]
    pub const fn possible_none(mut self) -> Self {
        self.possible_none = true;
        self
    }
}

/// One configurable field a backend exposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    /// Storage key in object or format data.
    pub key: String,
    /// Display label.
    pub name: String,
    /// How the value is entered.
    pub input: InputDescriptor,
}

impl AttributeDescriptor {
    /// Creates a descriptor.
    #[must_use]
    pub fn new(key: impl Into<String>, name: impl Into<String>, input: InputDescriptor) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            input,
        }
    }
}
