//! `ember.toml` parsing.
//!
//! The global configuration file carries the host's architecture list, the
//! default option layer, and the locations of the database snapshots and
//! user rule files.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use ember_core::error::{EmberError, EmberResult};

/// Complete ember.toml configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Host section
    #[serde(default)]
    pub host: HostSection,

    /// Build option defaults
    #[serde(default)]
    pub options: OptionsSection,

    /// Database and rule-file locations
    #[serde(default)]
    pub paths: PathsSection,
}

/// Host architecture configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostSection {
    /// Acceptable architectures, most-preferred first.
    #[serde(default)]
    pub arch: Vec<String>,
}

/// Default build options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionsSection {
    /// Default-enabled option names; a `-` prefix disables.
    #[serde(default)]
    pub default: Vec<String>,
}

/// File locations, relative to the configuration file unless absolute
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PathsSection {
    /// Repository snapshot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<Utf8PathBuf>,

    /// Installed-state snapshot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installed: Option<Utf8PathBuf>,

    /// Administrator lock rules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locks: Option<Utf8PathBuf>,

    /// Per-package architecture overrides.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arch_overrides: Option<Utf8PathBuf>,

    /// Per-package option overrides.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_options: Option<Utf8PathBuf>,
}

/// Load settings from an ember.toml file
pub fn load_from_file(path: &Utf8Path) -> EmberResult<Settings> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| EmberError::io(format!("failed to read {}", path), e))?;
    toml::from_str(&text).map_err(|e| EmberError::ConfigParse {
        path: path.to_string(),
        reason: e.to_string(),
    })
}

/// Resolve a configured path against the configuration file's directory
pub fn resolve_path(base: &Utf8Path, configured: &Utf8Path) -> Utf8PathBuf {
    if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        base.join(configured)
    }
}
