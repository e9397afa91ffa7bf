//! Candidate selection.
//!
//! Given candidates already narrowed to one `category/name`, applies the
//! version comparator, slot request, architecture filter and administrator
//! locks, then picks the highest surviving version. Ties between equal
//! versions keep the first candidate the database returned.

use std::cmp::Ordering;

use tracing::debug;

use ember_config::ResolverConfig;
use ember_core::error::{EmberError, EmberResult};
use ember_core::types::Package;
use ember_core::version;

use crate::atom::Atom;

/// Pick one concrete package for `atom` out of `candidates`
pub fn choose(
    candidates: Vec<Package>,
    atom: &Atom,
    owner: &str,
    config: &ResolverConfig,
) -> EmberResult<Package> {
    let missing = || EmberError::MissingDependency {
        atom: atom.raw.clone(),
        owner: owner.to_string(),
    };

    if candidates.is_empty() {
        return Err(missing());
    }

    let mut survivors: Vec<Package> = candidates
        .into_iter()
        .filter(|pkg| atom.admits_version(&pkg.version))
        .collect();
    if survivors.is_empty() {
        return Err(missing());
    }

    if let Some(slot) = &atom.slot {
        let concrete = match slot.strip_suffix('*') {
            Some(prefix) => expand_wildcard(&survivors, prefix),
            None => Some(slot.clone()),
        };
        match concrete {
            Some(wanted) => survivors.retain(|pkg| pkg.slot == wanted),
            None => survivors.clear(),
        }
        if survivors.is_empty() {
            return Err(missing());
        }
    }

    let (usable, rejected): (Vec<Package>, Vec<Package>) = survivors
        .into_iter()
        .partition(|pkg| arch_acceptable(pkg, config));
    if usable.is_empty() {
        return Err(EmberError::UnavailablePackage {
            atom: atom.raw.clone(),
            owner: owner.to_string(),
            found: rejected.into_iter().map(|pkg| pkg.arch).collect(),
            accepted: config.arch.clone(),
        });
    }

    let (free, locked): (Vec<Package>, Vec<Package>) = usable
        .into_iter()
        .partition(|pkg| !config.locks.iter().any(|rule| rule.locks(pkg)));
    if free.is_empty() {
        return Err(EmberError::LockedPackage {
            atom: atom.raw.clone(),
            owner: owner.to_string(),
            locked: locked.iter().map(ToString::to_string).collect(),
        });
    }

    let chosen = best_version(free);
    debug!(atom = %atom, chosen = %chosen, "selected candidate");
    Ok(chosen)
}

fn arch_acceptable(pkg: &Package, config: &ResolverConfig) -> bool {
    config.arch.iter().any(|arch| arch == &pkg.arch)
        || config.arch_overrides.iter().any(|rule| rule.allows(pkg))
}

/// Expand a slot-prefix wildcard to a concrete slot: the longest slot
/// sharing the prefix, ties going to the slot of the highest version.
fn expand_wildcard(candidates: &[Package], prefix: &str) -> Option<String> {
    let mut best: Option<&Package> = None;
    for pkg in candidates.iter().filter(|pkg| pkg.slot.starts_with(prefix)) {
        best = Some(match best {
            None => pkg,
            Some(current) => match pkg.slot.len().cmp(&current.slot.len()) {
                Ordering::Greater => pkg,
                Ordering::Less => current,
                Ordering::Equal => {
                    if version::compare(&pkg.version, &current.version) == Ordering::Greater {
                        pkg
                    } else {
                        current
                    }
                }
            },
        });
    }
    best.map(|pkg| pkg.slot.clone())
}

/// Highest version wins; an equal-version tie keeps the earlier candidate
fn best_version(mut candidates: Vec<Package>) -> Package {
    let mut best = 0;
    for i in 1..candidates.len() {
        if version::compare(&candidates[i].version, &candidates[best].version) == Ordering::Greater
        {
            best = i;
        }
    }
    candidates.swap_remove(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_config::rules::{LockRule, RuleAtom};

    fn config() -> ResolverConfig {
        ResolverConfig {
            arch: vec!["amd64".to_string()],
            ..Default::default()
        }
    }

    fn pkg(version: &str, slot: &str, arch: &str) -> Package {
        Package::new("main", "sys-libs", "zlib", version, slot, arch)
    }

    fn atom(raw: &str) -> Atom {
        Atom::parse(raw, "test").unwrap()
    }

    #[test]
    fn test_picks_highest_version() {
        let chosen = choose(
            vec![pkg("1.1", "0", "amd64"), pkg("1.3", "0", "amd64"), pkg("1.2", "0", "amd64")],
            &atom("sys-libs/zlib"),
            "test",
            &config(),
        )
        .unwrap();
        assert_eq!(chosen.version, "1.3");
    }

    #[test]
    fn test_equal_version_tie_keeps_first_returned() {
        let mut overlay = pkg("1.3", "0", "amd64");
        overlay.repo = "overlay".to_string();
        let chosen = choose(
            vec![pkg("1.3", "0", "amd64"), overlay],
            &atom("sys-libs/zlib"),
            "test",
            &config(),
        )
        .unwrap();
        assert_eq!(chosen.repo, "main");
    }

    #[test]
    fn test_comparator_restricts_before_best_pick() {
        let chosen = choose(
            vec![pkg("1.1", "0", "amd64"), pkg("1.3", "0", "amd64")],
            &atom("<sys-libs/zlib-1.2"),
            "test",
            &config(),
        )
        .unwrap();
        assert_eq!(chosen.version, "1.1");
    }

    #[test]
    fn test_empty_candidates_is_missing_dependency() {
        let err = choose(Vec::new(), &atom("sys-libs/zlib"), "test", &config()).unwrap_err();
        assert!(matches!(err, EmberError::MissingDependency { .. }));

        // Comparator filtering everything out reports the same way
        let err = choose(
            vec![pkg("1.0", "0", "amd64")],
            &atom(">=sys-libs/zlib-2.0"),
            "test",
            &config(),
        )
        .unwrap_err();
        assert!(matches!(err, EmberError::MissingDependency { .. }));
    }

    #[test]
    fn test_slot_literal_match() {
        let chosen = choose(
            vec![pkg("1.0", "0", "amd64"), pkg("2.0", "2", "amd64")],
            &atom("sys-libs/zlib:2"),
            "test",
            &config(),
        )
        .unwrap();
        assert_eq!(chosen.slot, "2");
    }

    #[test]
    fn test_slot_wildcard_expands_to_best_prefix_match() {
        let chosen = choose(
            vec![
                pkg("3.10", "3.10", "amd64"),
                pkg("3.11", "3.11", "amd64"),
                pkg("2.7", "2.7", "amd64"),
            ],
            &atom("sys-libs/zlib:3*"),
            "test",
            &config(),
        )
        .unwrap();
        assert_eq!(chosen.slot, "3.11");
    }

    #[test]
    fn test_arch_filter_reports_both_sides() {
        let err = choose(
            vec![pkg("1.0", "0", "sparc"), pkg("1.1", "0", "ppc")],
            &atom("sys-libs/zlib"),
            "app-misc/hello-1.0",
            &config(),
        )
        .unwrap_err();
        match err {
            EmberError::UnavailablePackage { found, accepted, .. } => {
                assert_eq!(found, vec!["sparc", "ppc"]);
                assert_eq!(accepted, vec!["amd64"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_arch_override_rescues_candidate() {
        let mut cfg = config();
        cfg.arch_overrides = ember_config::rules::parse_arch_rules("sys-libs/zlib ~amd64\n", "arch").unwrap();

        let chosen = choose(
            vec![pkg("1.0", "0", "~amd64")],
            &atom("sys-libs/zlib"),
            "test",
            &cfg,
        )
        .unwrap();
        assert_eq!(chosen.arch, "~amd64");
    }

    #[test]
    fn test_lock_exclusion() {
        let mut cfg = config();
        cfg.locks = vec![LockRule {
            atom: RuleAtom::parse("sys-libs/zlib", "locks").unwrap(),
            versions: Vec::new(),
        }];

        let err = choose(
            vec![pkg("1.0", "0", "amd64"), pkg("1.1", "0", "amd64")],
            &atom("sys-libs/zlib"),
            "test",
            &cfg,
        )
        .unwrap_err();
        assert!(matches!(err, EmberError::LockedPackage { .. }));

        // Narrowing the lock to 1.1 deterministically selects 1.0
        cfg.locks[0].versions = vec!["1.1".to_string()];
        let chosen = choose(
            vec![pkg("1.0", "0", "amd64"), pkg("1.1", "0", "amd64")],
            &atom("sys-libs/zlib"),
            "test",
            &cfg,
        )
        .unwrap();
        assert_eq!(chosen.version, "1.0");
    }

    #[test]
    fn test_arch_check_precedes_lock_check() {
        // The only arch-acceptable candidate is locked: report the lock,
        // not unavailability.
        let mut cfg = config();
        cfg.locks = vec![LockRule {
            atom: RuleAtom::parse("sys-libs/zlib", "locks").unwrap(),
            versions: Vec::new(),
        }];

        let err = choose(
            vec![pkg("1.0", "0", "sparc"), pkg("1.1", "0", "amd64")],
            &atom("sys-libs/zlib"),
            "test",
            &cfg,
        )
        .unwrap_err();
        assert!(matches!(err, EmberError::LockedPackage { .. }));
    }
}
