//! Command implementations and dispatch logic.
//!
//! Configuration and database snapshots are loaded once into a
//! `CommandContext`; each command receives it read-only.

use anyhow::{anyhow, Context};
use camino::{Utf8Path, Utf8PathBuf};

use ember_config::{settings, ResolverConfig, Settings};
use ember_db::{snapshot, MemoryStore};

use crate::Commands;

pub mod plan;
pub mod show;


/// Shared context for all commands
pub struct CommandContext {
    pub settings: Settings,
    pub config: ResolverConfig,
    pub store: MemoryStore,
}

impl CommandContext {
    /// Load configuration and database snapshots
    pub fn new(config_path: Option<Utf8PathBuf>) -> anyhow::Result<Self> {
        let path = match config_path {
            Some(path) => path,
            None => default_config_path()?,
        };
        let settings = settings::load_from_file(&path)
            .with_context(|| format!("loading configuration from {path}"))?;
        let base = path
            .parent()
            .unwrap_or_else(|| Utf8Path::new("."))
            .to_path_buf();

        let config = ResolverConfig::from_settings(&settings, &base)?;

        let repository = settings
            .paths
            .repository
            .as_ref()
            .map(|p| settings::resolve_path(&base, p));
        let installed = settings
            .paths
            .installed
            .as_ref()
            .map(|p| settings::resolve_path(&base, p));
        let store = snapshot::load(repository.as_deref(), installed.as_deref())?;

        Ok(Self {
            settings,
            config,
            store,
        })
    }
}

fn default_config_path() -> anyhow::Result<Utf8PathBuf> {
    let dir = dirs::config_dir().context("could not determine the configuration directory")?;
    let mut path = Utf8PathBuf::from_path_buf(dir)
        .map_err(|p| anyhow!("configuration directory is not UTF-8: {}", p.display()))?;
    path.push("ember");
    path.push("ember.toml");
    Ok(path)
}

/// Dispatch a command to its handler
pub fn dispatch(command: Commands, ctx: &CommandContext) -> anyhow::Result<()> {
    match command {
        Commands::Plan {
            atoms,
            ignore_depends,
            use_new_options,
            options,
            package_options,
        } => plan::execute(
            atoms,
            ignore_depends,
            use_new_options,
            options,
            package_options,
            ctx,
        ),
        Commands::Show { atom } => show::execute(&atom, ctx),
    }
}
