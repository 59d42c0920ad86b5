//! Command handlers module.
//!
//! This module organizes the CLI command implementations into separate files:
//! - `template.rs`: Template metadata management
//! - `data.rs`: Object and format key-value data
//! - `format.rs`: Format backend introspection and previews

mod data;
mod format;
mod template;

use std::path::PathBuf;

use clap::{Subcommand, ValueEnum};
use impex::models::{TemplateId, TemplateKind, ValidityState};

pub use data::cmd_data;
pub use format::cmd_format;
pub use template::cmd_template;

/// Template subcommands.
#[derive(Subcommand)]
pub enum TemplateAction {
    /// List templates of an object type.
    List {
        /// Object type (for example `Ticket`).
        #[arg(short, long)]
        object: String,

        /// Only templates of this kind.
        #[arg(short, long)]
        kind: Option<TemplateKind>,
    },

    /// Show one template as JSON.
    Show {
        /// Template id.
        id: TemplateId,
    },

    /// Add a template.
    Add {
        /// Object type.
        #[arg(short, long)]
        object: String,

        /// Format type.
        #[arg(short, long)]
        format: String,

        /// Template name, unique per object type.
        #[arg(short, long)]
        name: String,

        /// Import or export.
        #[arg(short, long, default_value = "import")]
        kind: TemplateKind,

        /// Free-text comment.
        #[arg(long)]
        comment: Option<String>,

        /// Create the template as invalid.
        #[arg(long)]
        invalid: bool,
    },

    /// Update name, validity and comment.
    Update {
        /// Template id.
        id: TemplateId,

        /// New name.
        #[arg(short, long)]
        name: String,

        /// Validity: valid, invalid or invalid-temporarily.
        #[arg(long, default_value = "valid")]
        validity: ValidityState,

        /// New comment; omitted clears it.
        #[arg(long)]
        comment: Option<String>,
    },

    /// Delete templates and their data.
    Delete {
        /// Template ids.
        #[arg(required = true)]
        ids: Vec<TemplateId>,
    },
}

/// Which key-value store a data command targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DataStore {
    /// Object backend configuration.
    Object,
    /// Format backend configuration.
    Format,
}

/// Data subcommands.
#[derive(Subcommand)]
pub enum DataAction {
    /// Print a template's data as JSON.
    Get {
        /// Template id.
        id: TemplateId,

        /// Store to read.
        #[arg(short, long, value_enum)]
        store: DataStore,
    },

    /// Replace a template's data.
    Set {
        /// Template id.
        id: TemplateId,

        /// Store to write.
        #[arg(short, long, value_enum)]
        store: DataStore,

        /// `KEY=VALUE` pairs.
        pairs: Vec<String>,
    },
}

/// Format subcommands.
#[derive(Subcommand)]
pub enum FormatAction {
    /// Print a format backend's attributes as JSON.
    Attributes {
        /// Format name (for example `CSV`).
        name: String,
    },

    /// Decode a file through a template and print rows and diagnostics.
    PreviewImport {
        /// Template id.
        id: TemplateId,

        /// File to decode.
        file: PathBuf,
    },

    /// Serialize one row read from stdin as a JSON array of strings.
    ExportRow {
        /// Template id.
        id: TemplateId,
    },
}
