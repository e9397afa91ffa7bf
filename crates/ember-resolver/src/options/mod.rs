//! Option resolution.
//!
//! The effective requested set for a package is folded from six layers in
//! fixed precedence, later layers overriding earlier ones per option name;
//! a `-` prefix removes. The applied set actually recorded against the
//! package is the intersection with its declared options.

use indexmap::{IndexMap, IndexSet};

use ember_config::ResolverConfig;
use ember_core::error::{EmberError, EmberResult};
use ember_core::types::Package;
use ember_core::version;
use ember_db::PackageStore;

/// A package-scoped option flag from the command line,
/// `category/name[-version]=opt,opt,...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageOptionFlag {
    pub category: String,
    pub name: String,
    /// Exact version the flag is pinned to, if any.
    pub version: Option<String>,
    pub options: Vec<String>,
}

impl PackageOptionFlag {
    /// Parse a flag like `app-editors/vim=python,-gtk` or
    /// `app-editors/vim-9.0=python`
    pub fn parse(raw: &str) -> EmberResult<Self> {
        let fail = |reason: &str| EmberError::InvalidAtom {
            atom: raw.to_string(),
            owner: "command line".to_string(),
            reason: reason.to_string(),
        };

        let (target, opts) = raw.split_once('=').ok_or_else(|| fail("expected '='"))?;
        let (cn, vers) = match version::split_name_version(target) {
            Some((cn, vers)) => (cn, Some(vers.to_string())),
            None => (target, None),
        };
        let (category, name) = cn
            .split_once('/')
            .ok_or_else(|| fail("expected category/name"))?;
        if category.is_empty() || name.is_empty() {
            return Err(fail("expected category/name"));
        }
        let options: Vec<String> = opts
            .split(',')
            .map(str::trim)
            .filter(|opt| !opt.is_empty())
            .map(str::to_string)
            .collect();
        if options.is_empty() {
            return Err(fail("no options named"));
        }

        Ok(Self {
            category: category.to_string(),
            name: name.to_string(),
            version: vers,
            options,
        })
    }

    fn matches(&self, pkg: &Package) -> bool {
        pkg.category == self.category
            && pkg.name == self.name
            && self.version.as_ref().map_or(true, |v| &pkg.version == v)
    }
}

/// Fold one `name` / `-name` token into the set
fn apply(set: &mut IndexSet<String>, token: &str) {
    match token.strip_prefix('-') {
        Some(name) => {
            set.shift_remove(name);
        }
        None => {
            set.insert(token.to_string());
        }
    }
}

/// Compute the effective requested option set for one package.
///
/// Layers, lowest precedence first: global config defaults, per-package
/// rule-file entries, command-line flags, package-scoped command-line
/// flags, inline atom options accumulated this run (keyed by
/// `category/name:slot`), and inline options persisted from prior runs.
pub fn effective(
    pkg: &Package,
    config: &ResolverConfig,
    cli_options: &[String],
    package_flags: &[PackageOptionFlag],
    inline_targets: &IndexMap<String, Vec<String>>,
    store: &dyn PackageStore,
) -> IndexSet<String> {
    let mut set = IndexSet::new();

    for token in &config.options {
        apply(&mut set, token);
    }
    for rule in &config.package_options {
        if rule.atom.matches(pkg) {
            for token in &rule.options {
                apply(&mut set, token);
            }
        }
    }
    for token in cli_options {
        apply(&mut set, token);
    }
    for flag in package_flags {
        if flag.matches(pkg) {
            for token in &flag.options {
                apply(&mut set, token);
            }
        }
    }
    if let Some(tokens) = inline_targets.get(&pkg.slot_key()) {
        for token in tokens {
            apply(&mut set, token);
        }
    }
    for token in store.inline_options(&pkg.category, &pkg.name, &pkg.slot) {
        apply(&mut set, &token);
    }

    set
}

/// The applied set: effective requests restricted to declared options.
/// Requesting an undeclared option is not an error; it is dropped here.
pub fn applied(effective: &IndexSet<String>, pkg: &Package) -> IndexSet<String> {
    effective
        .iter()
        .filter(|opt| pkg.options.contains(opt.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_db::MemoryStore;

    fn pkg() -> Package {
        Package::new("main", "app-editors", "vim", "9.0", "0", "amd64")
            .with_options(["python", "gtk", "ruby", "lua"])
    }

    fn set(names: &[&str]) -> IndexSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_layer_precedence() {
        let config = ResolverConfig {
            options: vec!["python".to_string(), "gtk".to_string()],
            package_options: ember_config::rules::parse_option_rules(
                "app-editors/vim -gtk ruby\n",
                "options",
            )
            .unwrap(),
            ..Default::default()
        };
        let cli = vec!["-ruby".to_string()];
        let flags = vec![PackageOptionFlag::parse("app-editors/vim=lua").unwrap()];
        let store = MemoryStore::new();

        let result = effective(&pkg(), &config, &cli, &flags, &IndexMap::new(), &store);
        // python (global), gtk removed by rule file, ruby added by rule file
        // then removed by CLI, lua added by the package-scoped flag
        assert_eq!(result, set(&["python", "lua"]));
    }

    #[test]
    fn test_inline_targets_override_cli() {
        let config = ResolverConfig::default();
        let cli = vec!["gtk".to_string()];
        let mut targets = IndexMap::new();
        targets.insert("app-editors/vim:0".to_string(), vec!["-gtk".to_string(), "python".to_string()]);
        let store = MemoryStore::new();

        let result = effective(&pkg(), &config, &cli, &[], &targets, &store);
        assert_eq!(result, set(&["python"]));
    }

    #[test]
    fn test_persisted_inline_options_are_highest_layer() {
        let config = ResolverConfig::default();
        let mut store = MemoryStore::new();
        store.add_inline_options("app-editors/vim:0", ["-python", "ruby"]);

        let cli = vec!["python".to_string()];
        let result = effective(&pkg(), &config, &cli, &[], &IndexMap::new(), &store);
        assert_eq!(result, set(&["ruby"]));
    }

    #[test]
    fn test_version_pinned_flag() {
        let flag = PackageOptionFlag::parse("app-editors/vim-9.0=lua").unwrap();
        assert_eq!(flag.version.as_deref(), Some("9.0"));
        assert!(flag.matches(&pkg()));

        let other = PackageOptionFlag::parse("app-editors/vim-8.2=lua").unwrap();
        assert!(!other.matches(&pkg()));
    }

    #[test]
    fn test_flag_parse_errors() {
        assert!(PackageOptionFlag::parse("app-editors/vim").is_err());
        assert!(PackageOptionFlag::parse("vim=python").is_err());
        assert!(PackageOptionFlag::parse("app-editors/vim=").is_err());
    }

    #[test]
    fn test_applied_drops_undeclared_options() {
        let requested = set(&["python", "static-libs", "gtk"]);
        let result = applied(&requested, &pkg());
        assert_eq!(result, set(&["python", "gtk"]));
    }
}
