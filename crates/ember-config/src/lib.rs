//! Configuration loading for the ember package manager
//!
//! This crate parses ember.toml and the three user rule files (locks, arch
//! overrides, per-package options) and assembles them into one immutable
//! `ResolverConfig` value, constructed once per invocation and passed into
//! the resolver.

pub mod rules;
pub mod settings;

// Re-export main types
pub use rules::{ArchRule, LockRule, OptionRule, RuleAtom};
pub use settings::Settings;

use camino::Utf8Path;

use ember_core::error::EmberResult;

/// Result type for configuration operations
pub type ConfigResult<T> = EmberResult<T>;

/// Immutable resolver configuration.
///
/// Loaded once per process invocation; the resolver receives it by
/// reference and never mutates it.
#[derive(Debug, Clone, Default)]
pub struct ResolverConfig {
    /// Default option layer, lowest precedence. A `-` prefix disables.
    pub options: Vec<String>,
    /// Acceptable architectures, most-preferred first.
    pub arch: Vec<String>,
    pub locks: Vec<LockRule>,
    pub arch_overrides: Vec<ArchRule>,
    pub package_options: Vec<OptionRule>,
}

impl ResolverConfig {
    /// Assemble the resolver configuration from parsed settings, loading
    /// every referenced rule file. Relative paths resolve against `base`,
    /// the directory holding the settings file.
    pub fn from_settings(settings: &Settings, base: &Utf8Path) -> EmberResult<Self> {
        let locks = match &settings.paths.locks {
            Some(path) => rules::load_lock_rules(&settings::resolve_path(base, path))?,
            None => Vec::new(),
        };
        let arch_overrides = match &settings.paths.arch_overrides {
            Some(path) => rules::load_arch_rules(&settings::resolve_path(base, path))?,
            None => Vec::new(),
        };
        let package_options = match &settings.paths.package_options {
            Some(path) => rules::load_option_rules(&settings::resolve_path(base, path))?,
            None => Vec::new(),
        };

        Ok(Self {
            options: settings.options.default.clone(),
            arch: settings.host.arch.clone(),
            locks,
            arch_overrides,
            package_options,
        })
    }
}
