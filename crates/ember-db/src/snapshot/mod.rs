//! TOML snapshot loading for repository and installed-state files.
//!
//! A snapshot file carries `[[package]]` records plus, for installed state,
//! the `[[conditional]]` and `[[inline]]` tables persisted by prior runs.

use camino::Utf8Path;
use serde::Deserialize;

use ember_core::error::{EmberError, EmberResult};
use ember_core::types::{Cmp, DecisionPoint, Package};

use crate::memory::MemoryStore;

#[derive(Debug, Default, Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    package: Vec<Package>,
    #[serde(default)]
    conditional: Vec<ConditionalEntry>,
    #[serde(default)]
    inline: Vec<InlineEntry>,
}

/// Persisted decision point: `owner` required `cmp version` of `target`
#[derive(Debug, Deserialize)]
struct ConditionalEntry {
    /// `category/name`
    target: String,
    cmp: Cmp,
    version: String,
    owner: String,
}

/// Persisted inline option choices for `category/name:slot`
#[derive(Debug, Deserialize)]
struct InlineEntry {
    target: String,
    options: Vec<String>,
}

fn parse(path: &Utf8Path) -> EmberResult<SnapshotFile> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| EmberError::io(format!("failed to read {}", path), e))?;
    toml::from_str(&text).map_err(|e| EmberError::ConfigParse {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

/// Load a repository snapshot into the store
pub fn load_repository(store: &mut MemoryStore, path: &Utf8Path) -> EmberResult<()> {
    let file = parse(path)?;
    for pkg in file.package {
        store.insert(pkg);
    }
    load_side_tables(store, file.conditional, file.inline);
    Ok(())
}

/// Load an installed-state snapshot into the store
pub fn load_installed(store: &mut MemoryStore, path: &Utf8Path) -> EmberResult<()> {
    let file = parse(path)?;
    for pkg in file.package {
        store.insert_installed(pkg);
    }
    load_side_tables(store, file.conditional, file.inline);
    Ok(())
}

fn load_side_tables(
    store: &mut MemoryStore,
    conditionals: Vec<ConditionalEntry>,
    inline: Vec<InlineEntry>,
) {
    for entry in conditionals {
        let point = DecisionPoint::new(&entry.target, entry.cmp, &entry.version, 0, &entry.owner);
        store.add_conditional(&entry.target, point);
    }
    for entry in inline {
        store.add_inline_options(&entry.target, entry.options);
    }
}

/// Build a store from optional repository and installed snapshots
pub fn load(
    repository: Option<&Utf8Path>,
    installed: Option<&Utf8Path>,
) -> EmberResult<MemoryStore> {
    let mut store = MemoryStore::new();
    if let Some(path) = repository {
        load_repository(&mut store, path)?;
    }
    if let Some(path) = installed {
        load_installed(&mut store, path)?;
    }
    Ok(store)
}
