//! Template metadata models.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Identifier of an agent performing a change (audit fields).
pub type UserId = i64;

/// Width of the zero-padded display number.
pub const DISPLAY_NUMBER_WIDTH: usize = 6;

/// Unique, immutable template identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(i64);

impl TemplateId {
    /// Wraps a raw database id.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw database id.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }

    /// Returns the fixed-width display number (`42` -> `000042`).
    #[must_use]
    pub fn display_number(self) -> String {
        format!("{:0width$}", self.0, width = DISPLAY_NUMBER_WIDTH)
    }
}

impl From<i64> for TemplateId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TemplateId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .map(Self)
            .map_err(|_| Error::InvalidInput(format!("Invalid template id: {s}")))
    }
}

/// Direction a template is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    /// External content flows into the object backend.
    #[default]
    Import,
    /// Object backend rows flow out as serialized content.
    Export,
}

impl TemplateKind {
    /// Returns the persisted string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::Export => "export",
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TemplateKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "import" => Ok(Self::Import),
            "export" => Ok(Self::Export),
            _ => Err(Error::InvalidInput(format!(
                "Invalid template kind: {s}. Expected: import or export"
            ))),
        }
    }
}

/// Validity of a template.
///
/// Persisted as the classic validity ids: 1 valid, 2 invalid, 3 temporarily invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidityState {
    /// Usable.
    #[default]
    Valid,
    /// Disabled.
    Invalid,
    /// Disabled for the time being.
    InvalidTemporarily,
}

impl ValidityState {
    /// Returns the persisted numeric id.
    #[must_use]
    pub const fn as_id(&self) -> i64 {
        match self {
            Self::Valid => 1,
            Self::Invalid => 2,
            Self::InvalidTemporarily => 3,
        }
    }

    /// Maps a persisted numeric id back to a state.
    #[must_use]
    pub const fn from_id(id: i64) -> Option<Self> {
        match id {
            1 => Some(Self::Valid),
            2 => Some(Self::Invalid),
            3 => Some(Self::InvalidTemporarily),
            _ => None,
        }
    }

    /// Returns the display string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Invalid => "invalid",
            Self::InvalidTemporarily => "invalid-temporarily",
        }
    }
}

impl fmt::Display for ValidityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ValidityState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "valid" | "1" => Ok(Self::Valid),
            "invalid" | "2" => Ok(Self::Invalid),
            "invalid-temporarily" | "3" => Ok(Self::InvalidTemporarily),
            _ => Err(Error::InvalidInput(format!("Invalid validity state: {s}"))),
        }
    }
}

/// A stored import/export template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    /// Unique identifier.
    pub id: TemplateId,
    /// Zero-padded display form of `id`.
    pub number: String,
    /// Import or export.
    pub kind: TemplateKind,
    /// Object backend catalog key (immutable after creation).
    pub object_type: String,
    /// Format backend catalog key (immutable after creation).
    pub format_type: String,
    /// Name, unique per object type.
    pub name: String,
    /// Validity state.
    pub validity: ValidityState,
    /// Optional free-text comment.
    pub comment: Option<String>,
    /// Creation timestamp (Unix epoch seconds).
    pub created_at: u64,
    /// Creating user.
    pub created_by: UserId,
    /// Last change timestamp (Unix epoch seconds).
    pub changed_at: u64,
    /// Last changing user.
    pub changed_by: UserId,
}

/// Input for [`crate::storage::TemplateStorage::add`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTemplate {
    /// Import or export.
    pub kind: TemplateKind,
    /// Object backend catalog key.
    pub object_type: String,
    /// Format backend catalog key.
    pub format_type: String,
    /// Template name.
    pub name: String,
    /// Validity state.
    pub validity: ValidityState,
    /// Optional comment.
    pub comment: Option<String>,
    /// Creating user.
    pub user_id: UserId,
}

impl NewTemplate {
    /// Creates a valid template request without comment.
    #[must_use]
    pub fn new(
        kind: TemplateKind,
        object_type: impl Into<String>,
        format_type: impl Into<String>,
        name: impl Into<String>,
        user_id: UserId,
    ) -> Self {
        Self {
            kind,
            object_type: object_type.into(),
            format_type: format_type.into(),
            name: name.into(),
            validity: ValidityState::Valid,
            comment: None,
            user_id,
        }
    }

    /// Sets the comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Sets the validity state.
    #[must_use]
    pub const fn with_validity(mut self, validity: ValidityState) -> Self {
        self.validity = validity;
        self
    }
}

/// Mutable fields of a template.
///
/// Object and format type are deliberately absent: they cannot change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateUpdate {
    /// New name.
    pub name: String,
    /// New validity state.
    pub validity: ValidityState,
    /// New comment (`None` clears it).
    pub comment: Option<String>,
    /// Changing user.
    pub user_id: UserId,
}

/// Strips newlines and tabs, then trims whitespace and control characters.
#[must_use]
pub fn sanitize_field(value: &str) -> String {
    value
        .chars()
        .filter(|c| !matches!(c, '\r' | '\n' | '\t'))
        .collect::<String>()
        .trim_matches(|c: char| c.is_whitespace() || c.is_control())
        .to_string()
}
