//! Line-oriented user rule files.
//!
//! Three files share one grammar: an atom-like matcher followed by
//! file-specific trailing tokens. `#`-prefixed lines and blank lines are
//! ignored. One rule per line.

use camino::Utf8Path;

use ember_core::error::{EmberError, EmberResult};
use ember_core::types::{Cmp, Package};
use ember_core::version;

/// Package matcher used by every rule file: optional comparator,
/// `category/name`, optional version (comparator atoms only), optional slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleAtom {
    pub cmp: Option<Cmp>,
    pub category: String,
    pub name: String,
    pub version: Option<String>,
    pub slot: Option<String>,
}

impl RuleAtom {
    /// Parse a matcher token like `>=sys-libs/zlib-1.2:0`
    pub fn parse(token: &str, path: &str) -> EmberResult<Self> {
        let malformed = |reason: &str| EmberError::ConfigParse {
            path: path.to_string(),
            reason: format!("malformed rule atom '{}': {}", token, reason),
        };

        let (cmp, rest) = Cmp::strip(token);

        let (body, slot) = match rest.split_once(':') {
            Some((body, slot)) => {
                if slot.contains(':') {
                    return Err(malformed("more than one slot separator"));
                }
                (body, Some(slot.to_string()))
            }
            None => (rest, None),
        };

        let (cn, version) = if cmp.is_some() {
            let (cn, version) = version::split_name_version(body)
                .ok_or_else(|| malformed("comparator without a version"))?;
            (cn, Some(version.to_string()))
        } else {
            (body, None)
        };

        let (category, name) = cn
            .split_once('/')
            .ok_or_else(|| malformed("expected category/name"))?;
        if category.is_empty() || name.is_empty() {
            return Err(malformed("expected category/name"));
        }

        Ok(Self {
            cmp,
            category: category.to_string(),
            name: name.to_string(),
            version,
            slot,
        })
    }

    /// Whether a package record is matched by this rule atom
    pub fn matches(&self, pkg: &Package) -> bool {
        if pkg.category != self.category || pkg.name != self.name {
            return false;
        }
        if let Some(slot) = &self.slot {
            if &pkg.slot != slot {
                return false;
            }
        }
        match (self.cmp, &self.version) {
            (Some(cmp), Some(version)) => cmp.admits(&pkg.version, version),
            _ => true,
        }
    }
}

/// Administrator lock: matched packages may not be selected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockRule {
    pub atom: RuleAtom,
    /// Explicit version list; empty locks every version the atom matches.
    pub versions: Vec<String>,
}

impl LockRule {
    pub fn locks(&self, pkg: &Package) -> bool {
        self.atom.matches(pkg)
            && (self.versions.is_empty() || self.versions.iter().any(|v| v == &pkg.version))
    }
}

/// Additional acceptable architectures for matched packages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchRule {
    pub atom: RuleAtom,
    pub arches: Vec<String>,
}

impl ArchRule {
    /// Whether this rule explicitly accepts the package's architecture
    pub fn allows(&self, pkg: &Package) -> bool {
        self.atom.matches(pkg) && self.arches.iter().any(|a| a == &pkg.arch)
    }
}

/// Per-package option overrides from the options rule file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionRule {
    pub atom: RuleAtom,
    /// Option names; a `-` prefix disables.
    pub options: Vec<String>,
}

fn rule_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

/// Parse lock rules from file text
pub fn parse_lock_rules(text: &str, path: &str) -> EmberResult<Vec<LockRule>> {
    rule_lines(text)
        .map(|line| {
            let mut tokens = line.split_whitespace();
            let atom = RuleAtom::parse(tokens.next().unwrap(), path)?;
            Ok(LockRule {
                atom,
                versions: tokens.map(str::to_string).collect(),
            })
        })
        .collect()
}

/// Parse arch-override rules from file text
pub fn parse_arch_rules(text: &str, path: &str) -> EmberResult<Vec<ArchRule>> {
    rule_lines(text)
        .map(|line| {
            let mut tokens = line.split_whitespace();
            let atom = RuleAtom::parse(tokens.next().unwrap(), path)?;
            let arches: Vec<String> = tokens.map(str::to_string).collect();
            if arches.is_empty() {
                return Err(EmberError::ConfigParse {
                    path: path.to_string(),
                    reason: format!("arch override '{}' names no architecture", line),
                });
            }
            Ok(ArchRule { atom, arches })
        })
        .collect()
}

/// Parse per-package option rules from file text
pub fn parse_option_rules(text: &str, path: &str) -> EmberResult<Vec<OptionRule>> {
    rule_lines(text)
        .map(|line| {
            let mut tokens = line.split_whitespace();
            let atom = RuleAtom::parse(tokens.next().unwrap(), path)?;
            Ok(OptionRule {
                atom,
                options: tokens.map(str::to_string).collect(),
            })
        })
        .collect()
}

fn read(path: &Utf8Path) -> EmberResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| EmberError::io(format!("failed to read {}", path), e))
}

pub fn load_lock_rules(path: &Utf8Path) -> EmberResult<Vec<LockRule>> {
    parse_lock_rules(&read(path)?, path.as_str())
}

pub fn load_arch_rules(path: &Utf8Path) -> EmberResult<Vec<ArchRule>> {
    parse_arch_rules(&read(path)?, path.as_str())
}

pub fn load_option_rules(path: &Utf8Path) -> EmberResult<Vec<OptionRule>> {
    parse_option_rules(&read(path)?, path.as_str())
}
