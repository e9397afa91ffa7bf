//! # ember-cli
//!
//! Source-based package manager CLI.
//!
//! This is the main entry point for the ember tool. It handles command
//! parsing, sets up logging, loads the configuration and database
//! snapshots, and dispatches to the command handlers. Resolution errors
//! are reported once here and the process exits non-zero.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use tracing::error;

use ember_core::error::EmberError;

mod commands;

use commands::CommandContext;

/// Source-based package manager
#[derive(Parser)]
#[command(name = "ember", version, about = "Source-based package manager")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to ember.toml (defaults to the user configuration directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute the build/install plan for the requested atoms
    Plan {
        /// Requested package atoms
        #[arg(required = true)]
        atoms: Vec<String>,

        /// Skip dependency resolution; plan the requested set verbatim
        #[arg(long)]
        ignore_depends: bool,

        /// Rebuild installed packages whose applied option set changed
        #[arg(long)]
        use_new_options: bool,

        /// Enable an option for every package ("-name" disables)
        #[arg(short = 'o', long = "option", value_name = "NAME", allow_hyphen_values = true)]
        options: Vec<String>,

        /// Package-scoped options: category/name[-version]=opt,opt
        #[arg(long = "package-option", value_name = "SPEC")]
        package_options: Vec<String>,
    },
    /// Show repository and installed records matching an atom
    Show {
        /// Package atom
        atom: String,
    },
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    if let Err(err) = run(cli) {
        error!("{err}");
        eprintln!("ember: {err}");
        if let Some(suggestion) = err.downcast_ref::<EmberError>().and_then(EmberError::suggestion)
        {
            eprintln!("  hint: {suggestion}");
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = CommandContext::new(cli.config)?;
    commands::dispatch(cli.command, &ctx)
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "ember={level},ember_resolver={level},ember_db={level}"
        ))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
