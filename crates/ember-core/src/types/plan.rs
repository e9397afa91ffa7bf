//! Decision points and the assembled operation plan.

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use super::{Cmp, Package};

/// A version requirement one package imposes on another.
///
/// Attached to the *target* package identity so every requester of the same
/// installed target is checked against the same single version; `owner`
/// identifies the requester for two-sided conflict reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionPoint {
    /// Target `category/name`.
    pub target: String,
    pub cmp: Cmp,
    pub version: String,
    /// Requester's surrogate id. Zero for decision points rehydrated from a
    /// prior run, whose owner is no longer part of the heap.
    #[serde(default)]
    pub owner_id: u32,
    /// Requester's printable identity.
    pub owner: String,
}

impl DecisionPoint {
    pub fn new(target: &str, cmp: Cmp, version: &str, owner_id: u32, owner: &str) -> Self {
        Self {
            target: target.to_string(),
            cmp,
            version: version.to_string(),
            owner_id,
            owner: owner.to_string(),
        }
    }

    /// Whether an installed version satisfies this requirement.
    pub fn admits(&self, installed_version: &str) -> bool {
        self.cmp.admits(installed_version, &self.version)
    }
}

impl fmt::Display for DecisionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} requires {}{}", self.owner, self.cmp, self.version)
    }
}

/// The final build/install plan plus the side tables the executor persists.
///
/// `packages` is in build order (dependencies first) and deduplicated by
/// `(repo, category, name, version)`; no id appears twice. All side tables
/// are keyed by package id except `inline_targets`, keyed by
/// `category/name:slot`.
#[derive(Debug, Default)]
pub struct OperationPlan {
    pub packages: Vec<Package>,
    /// Atoms each package resolved during collection, for persistence.
    pub dep_records: IndexMap<u32, Vec<String>>,
    /// Applied option set per package.
    pub options: IndexMap<u32, IndexSet<String>>,
    /// Option choices packages impose on other not-yet-built packages.
    pub inline_targets: IndexMap<String, Vec<String>>,
    /// All recorded decision points, keyed by the owning requester's identity.
    pub conditionals: IndexMap<String, Vec<DecisionPoint>>,
    /// Installed packages that must be removed before each entry merges.
    pub conflicts: IndexMap<u32, Vec<Package>>,
}

impl OperationPlan {
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Applied options for one plan entry
    pub fn options_for(&self, id: u32) -> Option<&IndexSet<String>> {
        self.options.get(&id)
    }

    /// Position of the first entry matching `category/name`
    pub fn position(&self, cn: &str) -> Option<usize> {
        self.packages.iter().position(|p| p.cn() == cn)
    }
}
