//! Dependency collection.
//!
//! Walks one package's eight dependency buckets, resolving every atom
//! through the candidate selector. Conflict-bucket atoms resolve against
//! the installed database and are silently skipped when nothing matches.
//! Side effects accumulate in the resolve state: graph edges, postmerge
//! pairs, dependency records, inline-option targets, decision points and
//! the conflict set.

use indexmap::IndexSet;
use tracing::{debug, trace};

use ember_config::ResolverConfig;
use ember_core::error::EmberResult;
use ember_core::types::{BundleEntry, DecisionPoint, DepBundle, Package};
use ember_db::{PackageQuery, PackageStore};

use crate::atom::Atom;
use crate::{options, select, ResolveState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    Build,
    Run,
    Post,
}

/// Collect one package's dependencies under the given effective option set.
/// Returns the ids of every dependency reached, postmerge ones included.
pub(crate) fn collect_one(
    store: &dyn PackageStore,
    config: &ResolverConfig,
    state: &mut ResolveState,
    id: u32,
    effective: &IndexSet<String>,
) -> EmberResult<Vec<u32>> {
    let pkg = state.heap[&id].clone();
    state.applied.insert(id, options::applied(effective, &pkg));

    trace!(package = %pkg, options = ?effective, "collecting dependencies");

    let mut children = Vec::new();
    let static_buckets = [
        (&pkg.depend_build, Bucket::Build),
        (&pkg.depend_run, Bucket::Run),
        (&pkg.depend_post, Bucket::Post),
    ];
    for (atoms, bucket) in static_buckets {
        for raw in atoms {
            children.push(resolve_dep(store, config, state, id, &pkg, raw, bucket)?);
        }
    }
    for raw in &pkg.depend_conflict {
        resolve_conflict(store, state, id, &pkg, raw)?;
    }

    let optional_buckets = [
        (&pkg.optional_build, Bucket::Build),
        (&pkg.optional_run, Bucket::Run),
        (&pkg.optional_post, Bucket::Post),
    ];
    for (bundles, bucket) in optional_buckets {
        for bundle in bundles {
            for raw in bundle_atoms(bundle, effective) {
                children.push(resolve_dep(store, config, state, id, &pkg, raw, bucket)?);
            }
        }
    }
    for bundle in &pkg.optional_conflict {
        for raw in bundle_atoms(bundle, effective) {
            resolve_conflict(store, state, id, &pkg, raw)?;
        }
    }

    Ok(children)
}

/// Evaluate one bundle against the owner's effective option set.
///
/// A satisfied top-level gate takes the entries before the else sentinel;
/// an unsatisfied one takes the entries after it, if present. Within the
/// taken sequence, contiguous runs of sub-gated branches form an else-if
/// chain where the first satisfied branch wins.
pub(crate) fn bundle_atoms<'a>(bundle: &'a DepBundle, options: &IndexSet<String>) -> Vec<&'a str> {
    let else_at = bundle
        .entries
        .iter()
        .position(|entry| matches!(entry, BundleEntry::Else));

    let taken: &[BundleEntry] = if bundle.gate.satisfied(options) {
        &bundle.entries[..else_at.unwrap_or(bundle.entries.len())]
    } else {
        match else_at {
            Some(position) => &bundle.entries[position + 1..],
            None => return Vec::new(),
        }
    };

    let mut out = Vec::new();
    let mut i = 0;
    while i < taken.len() {
        match &taken[i] {
            BundleEntry::Atom(atom) => {
                out.push(atom.as_str());
                i += 1;
            }
            BundleEntry::Else => break,
            BundleEntry::Branch { .. } => {
                let mut matched = false;
                while let Some(BundleEntry::Branch { gate, atoms }) = taken.get(i) {
                    if !matched && gate.satisfied(options) {
                        out.extend(atoms.iter().map(String::as_str));
                        matched = true;
                    }
                    i += 1;
                }
            }
        }
    }
    out
}

/// Repository lookup through the per-run `(category, name)` candidate cache
pub(crate) fn cached_find(
    store: &dyn PackageStore,
    state: &mut ResolveState,
    category: &str,
    name: &str,
) -> EmberResult<Vec<Package>> {
    let key = (category.to_string(), name.to_string());
    if let Some(hit) = state.cand_cache.get(&key) {
        return Ok(hit.clone());
    }
    let found = store.find(&PackageQuery::named(category, name))?;
    state.cand_cache.insert(key, found.clone());
    Ok(found)
}

/// Register a newly selected package in the heap, rehydrating persisted
/// decision points the first time its target identity is seen
pub(crate) fn admit(store: &dyn PackageStore, state: &mut ResolveState, pkg: Package) -> u32 {
    let id = pkg.id;
    if !state.heap.contains_key(&id) {
        let key = pkg.slot_key();
        let points = state.decisions.entry(key).or_default();
        for point in store.conditional_versions(&pkg.category, &pkg.name) {
            if !points.contains(&point) {
                points.push(point);
            }
        }
        state.heap.insert(id, pkg);
    }
    id
}

/// Record an atom's inline options against its resolved target
pub(crate) fn record_inline_options(state: &mut ResolveState, target: &Package, atom: &Atom) {
    if atom.options.is_empty() {
        return;
    }
    let entry = state.inline_targets.entry(target.slot_key()).or_default();
    for option in &atom.options {
        if !entry.contains(option) {
            entry.push(option.clone());
        }
    }
}

fn resolve_dep(
    store: &dyn PackageStore,
    config: &ResolverConfig,
    state: &mut ResolveState,
    owner_id: u32,
    owner: &Package,
    raw: &str,
    bucket: Bucket,
) -> EmberResult<u32> {
    let owner_label = owner.to_string();
    let atom = Atom::parse(raw, &owner_label)?;
    let candidates = cached_find(store, state, &atom.category, &atom.name)?;
    let chosen = select::choose(candidates, &atom, &owner_label, config)?;
    let child = admit(store, state, chosen);
    let target = state.heap[&child].clone();
    record_inline_options(state, &target, &atom);

    if let (Some(cmp), Some(version)) = (atom.cmp, &atom.version) {
        let point = DecisionPoint::new(&target.cn(), cmp, version, owner_id, &owner_label);
        let points = state.decisions.entry(target.slot_key()).or_default();
        if !points.contains(&point) {
            points.push(point);
        }
    }

    let record = state.dep_records.entry(owner_id).or_default();
    if !record.iter().any(|existing| existing == raw) {
        record.push(raw.to_string());
    }

    match bucket {
        Bucket::Post => {
            if !state.postmerge.contains(&(child, owner_id)) {
                state.postmerge.push((child, owner_id));
            }
        }
        Bucket::Build | Bucket::Run => {
            if state.seen_edges.insert((owner_id, child)) {
                state.edges.push((owner_id, child));
            }
        }
    }

    Ok(child)
}

/// Whether a conflict atom names a package record
pub(crate) fn conflict_matches(atom: &Atom, pkg: &Package) -> bool {
    if pkg.category != atom.category || pkg.name != atom.name {
        return false;
    }
    if !atom.admits_version(&pkg.version) {
        return false;
    }
    match &atom.slot {
        Some(slot) => match slot.strip_suffix('*') {
            Some(prefix) => pkg.slot.starts_with(prefix),
            None => &pkg.slot == slot,
        },
        None => true,
    }
}

/// Resolve a conflict-bucket atom against the installed database. Nothing
/// installed matching the atom is a silent skip.
fn resolve_conflict(
    store: &dyn PackageStore,
    state: &mut ResolveState,
    owner_id: u32,
    owner: &Package,
    raw: &str,
) -> EmberResult<()> {
    let owner_label = owner.to_string();
    let atom = Atom::parse(raw, &owner_label)?;

    let atoms = state.conflict_atoms.entry(owner_id).or_default();
    if !atoms.iter().any(|existing| existing == raw) {
        atoms.push(raw.to_string());
    }

    let installed = store.find_installed(&PackageQuery::named(&atom.category, &atom.name))?;
    for pkg in installed {
        if !conflict_matches(&atom, &pkg) {
            continue;
        }
        debug!(owner = %owner, conflict = %pkg, "recorded installed conflict");
        let entry = state.conflicts.entry(owner_id).or_default();
        if !entry.iter().any(|existing| existing.id == pkg.id) {
            entry.push(pkg);
        }
    }
    Ok(())
}
