//! Binary entry point for impex.
//!
//! This binary manages import/export templates and their backend
//! configuration from the command line.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

mod commands;

use clap::{Parser, Subcommand};
use commands::{DataAction, FormatAction, TemplateAction, cmd_data, cmd_format, cmd_template};
use impex::config::ImpexConfig;
use impex::models::UserId;
use impex::observability;
use impex::{BackendContext, BackendRegistry, Stores};
use std::path::PathBuf;
use std::process::ExitCode;

/// Impex - import/export template manager.
#[derive(Parser)]
#[command(name = "impex")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "IMPEX_CONFIG")]
    config: Option<PathBuf>,

    /// Path to the template database (overrides the configuration).
    #[arg(short, long, global = true, env = "IMPEX_DATABASE")]
    database: Option<PathBuf>,

    /// Acting user id recorded in audit fields.
    #[arg(short, long, global = true, env = "IMPEX_USER", default_value_t = 1)]
    user: UserId,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Manage templates.
    Template {
        /// Template action.
        #[command(subcommand)]
        action: TemplateAction,
    },

    /// Read or replace a template's object or format data.
    Data {
        /// Data action.
        #[command(subcommand)]
        action: DataAction,
    },

    /// Inspect format backends.
    Format {
        /// Format action.
        #[command(subcommand)]
        action: FormatAction,
    },
}

/// Main entry point.
fn main() -> ExitCode {
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e:#}");
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) = observability::init_from_settings(&config.logging, cli.verbose) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "Command failed");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(cli: Cli, config: ImpexConfig) -> anyhow::Result<()> {
    let stores = Stores::open(config.database_path.clone())?;

    match cli.command {
        Commands::Template { action } => cmd_template(&stores, action, cli.user),

        Commands::Data { action } => cmd_data(&stores, action),

        Commands::Format { action } => {
            let registry =
                BackendRegistry::with_defaults(BackendContext::from_stores(&stores, config))
                    .into_shared();
            cmd_format(&registry, action, cli.user)
        },
    }
}

/// Loads configuration.
fn load_config(cli: &Cli) -> anyhow::Result<ImpexConfig> {
    let config = match &cli.config {
        Some(path) => ImpexConfig::load_from_file(path)?,
        None => ImpexConfig::load_default()?,
    };

    Ok(match &cli.database {
        Some(path) => config.with_database_path(path),
        None => config,
    })
}
