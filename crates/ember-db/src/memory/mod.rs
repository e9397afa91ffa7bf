//! In-memory package store with surrogate-id assignment.

use indexmap::IndexMap;

use ember_core::error::EmberResult;
use ember_core::types::{DecisionPoint, Package};

use crate::store::{PackageQuery, PackageStore};

/// In-memory store backing one resolution run.
///
/// Ids are assigned at insert time and are stable for the lifetime of the
/// store, so repeated lookups of the same record agree on identity.
#[derive(Debug, Default)]
pub struct MemoryStore {
    repo: Vec<Package>,
    installed: Vec<Package>,
    /// Persisted decision points, keyed by `category/name`.
    conditionals: IndexMap<String, Vec<DecisionPoint>>,
    /// Persisted inline option choices, keyed by `category/name:slot`.
    inline: IndexMap<String, Vec<String>>,
    next_id: u32,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    /// Add a repository package, assigning its surrogate id
    pub fn insert(&mut self, mut pkg: Package) -> u32 {
        pkg.id = self.next_id;
        self.next_id += 1;
        let id = pkg.id;
        self.repo.push(pkg);
        id
    }

    /// Add an installed package, assigning its surrogate id
    pub fn insert_installed(&mut self, mut pkg: Package) -> u32 {
        pkg.id = self.next_id;
        self.next_id += 1;
        let id = pkg.id;
        self.installed.push(pkg);
        id
    }

    /// Record a persisted decision point against `category/name`
    pub fn add_conditional(&mut self, target: &str, point: DecisionPoint) {
        self.conditionals
            .entry(target.to_string())
            .or_default()
            .push(point);
    }

    /// Record persisted inline options for `category/name:slot`
    pub fn add_inline_options<I, S>(&mut self, target: &str, options: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inline
            .entry(target.to_string())
            .or_default()
            .extend(options.into_iter().map(Into::into));
    }

    pub fn package_count(&self) -> usize {
        self.repo.len()
    }

    pub fn installed_count(&self) -> usize {
        self.installed.len()
    }
}

impl PackageStore for MemoryStore {
    fn find(&self, query: &PackageQuery) -> EmberResult<Vec<Package>> {
        Ok(self
            .repo
            .iter()
            .filter(|pkg| query.matches(pkg))
            .cloned()
            .collect())
    }

    fn find_installed(&self, query: &PackageQuery) -> EmberResult<Vec<Package>> {
        Ok(self
            .installed
            .iter()
            .filter(|pkg| query.matches(pkg))
            .cloned()
            .collect())
    }

    fn conditional_versions(&self, category: &str, name: &str) -> Vec<DecisionPoint> {
        self.conditionals
            .get(&format!("{}/{}", category, name))
            .cloned()
            .unwrap_or_default()
    }

    fn inline_options(&self, category: &str, name: &str, slot: &str) -> Vec<String> {
        self.inline
            .get(&format!("{}/{}:{}", category, name, slot))
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::types::Cmp;

    #[test]
    fn test_insert_assigns_distinct_ids() {
        let mut store = MemoryStore::new();
        let a = store.insert(Package::new("main", "c", "a", "1.0", "0", "amd64"));
        let b = store.insert(Package::new("main", "c", "b", "1.0", "0", "amd64"));
        let c = store.insert_installed(Package::new("main", "c", "a", "0.9", "0", "amd64"));

        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_eq!(store.package_count(), 2);
        assert_eq!(store.installed_count(), 1);
    }

    #[test]
    fn test_find_is_scoped_to_repo() {
        let mut store = MemoryStore::new();
        store.insert(Package::new("main", "c", "a", "1.0", "0", "amd64"));
        store.insert_installed(Package::new("main", "c", "a", "0.9", "0", "amd64"));

        let query = PackageQuery::named("c", "a");
        let found = store.find(&query).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].version, "1.0");

        let installed = store.find_installed(&query).unwrap();
        assert_eq!(installed.len(), 1);
        assert_eq!(installed[0].version, "0.9");
    }

    #[test]
    fn test_find_preserves_insert_order() {
        let mut store = MemoryStore::new();
        store.insert(Package::new("main", "c", "a", "1.0", "0", "amd64"));
        store.insert(Package::new("overlay", "c", "a", "1.0", "0", "amd64"));

        let found = store.find(&PackageQuery::named("c", "a")).unwrap();
        assert_eq!(found[0].repo, "main");
        assert_eq!(found[1].repo, "overlay");
    }

    #[test]
    fn test_persisted_tables() {
        let mut store = MemoryStore::new();
        store.add_conditional("c/a", DecisionPoint::new("c/a", Cmp::GreaterEq, "2.0", 0, "c/b-1.0"));
        store.add_inline_options("c/a:0", ["static"]);

        assert_eq!(store.conditional_versions("c", "a").len(), 1);
        assert!(store.conditional_versions("c", "missing").is_empty());
        assert_eq!(store.inline_options("c", "a", "0"), vec!["static"]);
        assert!(store.inline_options("c", "a", "1").is_empty());
    }
}
