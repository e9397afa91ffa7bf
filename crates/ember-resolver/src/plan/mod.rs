//! Plan assembly.
//!
//! Reconciles the topologically sorted closure against installed state,
//! emits the included packages in build order, re-splices postmerge
//! dependencies to follow their owners, and bundles the side tables.

use std::cmp::Ordering;
use std::collections::HashSet;

use tracing::debug;

use ember_core::error::{EmberError, EmberResult};
use ember_core::types::{OperationPlan, Package, PackageKey};
use ember_core::version;
use ember_db::{PackageQuery, PackageStore};

use crate::atom::Atom;
use crate::{collect, decision, ResolveState};

/// Best-version installed match for a package's `category/name:slot`
fn installed_match(store: &dyn PackageStore, pkg: &Package) -> EmberResult<Option<Package>> {
    let query = PackageQuery::named(&pkg.category, &pkg.name).with_slot(&pkg.slot);
    let mut found = store.find_installed(&query)?;
    let mut best: Option<Package> = None;
    for candidate in found.drain(..) {
        best = Some(match best {
            None => candidate,
            Some(current) => {
                if version::compare(&candidate.version, &current.version) == Ordering::Greater {
                    candidate
                } else {
                    current
                }
            }
        });
    }
    Ok(best)
}

/// Assemble the final plan from the sorted closure.
///
/// `order` is the topological order with the requested set first; the
/// emitted plan is its included subset reversed into build order.
pub(crate) fn assemble(
    store: &dyn PackageStore,
    state: &ResolveState,
    order: Vec<u32>,
    use_new_options: bool,
) -> EmberResult<OperationPlan> {
    let mut included: Vec<u32> = Vec::new();
    for id in order {
        let pkg = &state.heap[&id];

        let include = if state.requested.contains(&id) {
            true
        } else {
            match installed_match(store, pkg)? {
                None => true,
                Some(installed) => {
                    let mut include = false;
                    let points = state.decisions.get(&pkg.slot_key());
                    if let Some(points) = points.filter(|p| !p.is_empty()) {
                        decision::check_pairwise(points, &installed)?;
                        include = decision::any_rejected(points, &installed.version);
                    }
                    if !include && use_new_options {
                        let fresh = state.applied.get(&id);
                        include = fresh.map_or(false, |applied| *applied != installed.applied);
                    }
                    include
                }
            }
        };

        if include {
            included.push(id);
        } else {
            debug!(package = %pkg, "already satisfied, skipping");
        }
    }

    // Dedup by primary key; the first (most-depended-upon last) occurrence wins
    let mut seen: HashSet<PackageKey> = HashSet::new();
    included.retain(|id| seen.insert(state.heap[id].key()));

    // Build order: dependencies first
    included.reverse();

    // A conflict atom matching another plan member is fatal
    for (owner_id, atoms) in &state.conflict_atoms {
        if !included.contains(owner_id) {
            continue;
        }
        let owner = &state.heap[owner_id];
        for raw in atoms {
            let atom = Atom::parse(raw, &owner.to_string())?;
            let clash = included
                .iter()
                .filter(|id| *id != owner_id)
                .find(|id| collect::conflict_matches(&atom, &state.heap[*id]));
            if let Some(id) = clash {
                return Err(EmberError::PackageConflict {
                    owner: owner.to_string(),
                    other: state.heap[id].to_string(),
                });
            }
        }
    }

    // Postmerge re-splice: each dependency moves to directly follow its owner
    for &(dep, owner) in &state.postmerge {
        let Some(dep_at) = included.iter().position(|id| *id == dep) else {
            continue;
        };
        if !included.contains(&owner) {
            continue;
        }
        let id = included.remove(dep_at);
        let owner_at = included.iter().position(|x| *x == owner).unwrap();
        included.insert(owner_at + 1, id);
    }

    Ok(emit(state, included))
}

/// Degraded mode: the requested set verbatim, carrying only collector side
/// data; no reconciliation, no ordering constraints.
pub(crate) fn verbatim(state: &ResolveState, requested: &[u32]) -> OperationPlan {
    let mut seen: HashSet<PackageKey> = HashSet::new();
    let included: Vec<u32> = requested
        .iter()
        .copied()
        .filter(|id| seen.insert(state.heap[id].key()))
        .collect();
    emit(state, included)
}

fn emit(state: &ResolveState, included: Vec<u32>) -> OperationPlan {
    let mut plan = OperationPlan {
        inline_targets: state.inline_targets.clone(),
        ..Default::default()
    };
    for id in included {
        if let Some(records) = state.dep_records.get(&id) {
            plan.dep_records.insert(id, records.clone());
        }
        if let Some(applied) = state.applied.get(&id) {
            plan.options.insert(id, applied.clone());
        }
        if let Some(conflicts) = state.conflicts.get(&id) {
            plan.conflicts.insert(id, conflicts.clone());
        }
        plan.packages.push(state.heap[&id].clone());
    }
    // Conditional-version records persist keyed by the owning requester
    for points in state.decisions.values() {
        for point in points {
            plan.conditionals
                .entry(point.owner.clone())
                .or_default()
                .push(point.clone());
        }
    }
    plan
}
