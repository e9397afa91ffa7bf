//! The package database boundary consumed by the resolver.

use ember_core::error::EmberResult;
use ember_core::types::{DecisionPoint, Package};

/// Query shape for package lookups
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageQuery {
    pub name: String,
    pub category: Option<String>,
    pub repo: Option<String>,
    pub version: Option<String>,
    pub slot: Option<String>,
}

impl PackageQuery {
    /// Query by category and name
    pub fn named(category: &str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            category: Some(category.to_string()),
            ..Default::default()
        }
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    pub fn with_slot(mut self, slot: &str) -> Self {
        self.slot = Some(slot.to_string());
        self
    }

    /// Whether a package record satisfies every constrained axis
    pub fn matches(&self, pkg: &Package) -> bool {
        pkg.name == self.name
            && self.category.as_ref().map_or(true, |c| &pkg.category == c)
            && self.repo.as_ref().map_or(true, |r| &pkg.repo == r)
            && self.version.as_ref().map_or(true, |v| &pkg.version == v)
            && self.slot.as_ref().map_or(true, |s| &pkg.slot == s)
    }
}

/// Read-only package database oracle.
///
/// Every call is blocking and synchronous; the resolver is the only caller
/// and issues them sequentially.
pub trait PackageStore {
    /// Look up repository packages matching the query.
    fn find(&self, query: &PackageQuery) -> EmberResult<Vec<Package>>;

    /// Look up currently-merged packages matching the query.
    fn find_installed(&self, query: &PackageQuery) -> EmberResult<Vec<Package>>;

    /// Decision points persisted by prior runs against `category/name`.
    fn conditional_versions(&self, category: &str, name: &str) -> Vec<DecisionPoint>;

    /// Inline option choices persisted by prior runs for `category/name:slot`.
    fn inline_options(&self, category: &str, name: &str, slot: &str) -> Vec<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_matching() {
        let pkg = Package::new("main", "sys-libs", "zlib", "1.3", "0", "amd64");

        assert!(PackageQuery::named("sys-libs", "zlib").matches(&pkg));
        assert!(!PackageQuery::named("sys-libs", "ncurses").matches(&pkg));
        assert!(PackageQuery::named("sys-libs", "zlib").with_version("1.3").matches(&pkg));
        assert!(!PackageQuery::named("sys-libs", "zlib").with_version("1.2").matches(&pkg));
        assert!(PackageQuery::named("sys-libs", "zlib").with_slot("0").matches(&pkg));
        assert!(!PackageQuery::named("sys-libs", "zlib").with_slot("1").matches(&pkg));
    }

    #[test]
    fn test_unconstrained_axes_match_anything() {
        let pkg = Package::new("overlay", "sys-libs", "zlib", "1.3", "2", "x86");
        let query = PackageQuery {
            name: "zlib".to_string(),
            ..Default::default()
        };
        assert!(query.matches(&pkg));
    }
}
