//! Dependency resolution engine for the ember package manager
//!
//! Turns a set of requested package atoms into a topologically ordered,
//! deduplicated, conflict-checked operation plan: the concrete package
//! versions to build and merge, each with its applied option set, plus the
//! bookkeeping the build executor persists.
//!
//! Resolution is single-threaded and synchronous: a breadth-first worklist
//! collects dependencies, re-visiting any package whose effective option
//! set changes until a fixed point is reached, then the accumulated edges
//! are sorted and reconciled against installed state.

pub mod atom;
pub mod collect;
pub mod decision;
pub mod graph;
pub mod options;
pub mod plan;
pub mod select;

// Re-export main types
pub use atom::Atom;
pub use graph::DepGraph;
pub use options::PackageOptionFlag;

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, info};

use ember_config::ResolverConfig;
use ember_core::error::EmberResult;
use ember_core::types::{DecisionPoint, OperationPlan, Package};
use ember_db::PackageStore;

/// One resolution request from the command line
#[derive(Debug, Clone, Default)]
pub struct ResolveRequest {
    /// Requested package atoms.
    pub atoms: Vec<String>,
    /// Skip graph building and reconciliation entirely; return the
    /// requested set verbatim with collector side data attached.
    pub ignore_depends: bool,
    /// Rebuild installed packages whose applied option set changed.
    pub use_new_options: bool,
    /// Command-line option flags, third option layer.
    pub options: Vec<String>,
    /// Package-scoped command-line flags, fourth option layer.
    pub package_options: Vec<PackageOptionFlag>,
}

impl ResolveRequest {
    pub fn new<I, S>(atoms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            atoms: atoms.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }
}

/// Mutable bookkeeping for one resolution run, discarded afterwards
#[derive(Debug, Default)]
pub(crate) struct ResolveState {
    /// Every package admitted to the closure, by surrogate id.
    pub(crate) heap: IndexMap<u32, Package>,
    /// Ids of the originally requested packages.
    pub(crate) requested: IndexSet<u32>,
    /// Applied option set per package, recomputed on every visit.
    pub(crate) applied: IndexMap<u32, IndexSet<String>>,
    /// Atoms each package resolved, for persistence.
    pub(crate) dep_records: IndexMap<u32, Vec<String>>,
    /// Inline option choices keyed by target `category/name:slot`.
    pub(crate) inline_targets: IndexMap<String, Vec<String>>,
    /// Decision points keyed by target `category/name:slot`.
    pub(crate) decisions: IndexMap<String, Vec<DecisionPoint>>,
    /// Installed packages each owner conflicts with.
    pub(crate) conflicts: IndexMap<u32, Vec<Package>>,
    /// Raw conflict-bucket atoms per owner, re-checked against the plan.
    pub(crate) conflict_atoms: IndexMap<u32, Vec<String>>,
    /// Postmerge `(dependency, owner)` pairs; merge-order only.
    pub(crate) postmerge: Vec<(u32, u32)>,
    /// Graph edges `(parent, child)` in discovery order.
    pub(crate) edges: Vec<(u32, u32)>,
    pub(crate) seen_edges: HashSet<(u32, u32)>,
    /// Option snapshot each node was last collected under.
    pub(crate) visited: IndexMap<u32, IndexSet<String>>,
    /// Per-run `(category, name)` candidate cache.
    pub(crate) cand_cache: HashMap<(String, String), Vec<Package>>,
}

/// The resolution engine. Created fresh per request; `resolve` consumes it.
pub struct Resolver<'a> {
    store: &'a dyn PackageStore,
    config: &'a ResolverConfig,
    request: ResolveRequest,
    state: ResolveState,
}

impl<'a> Resolver<'a> {
    pub fn new(
        store: &'a dyn PackageStore,
        config: &'a ResolverConfig,
        request: ResolveRequest,
    ) -> Self {
        Self {
            store,
            config,
            request,
            state: ResolveState::default(),
        }
    }

    /// Run resolution to a finished operation plan
    pub fn resolve(mut self) -> EmberResult<OperationPlan> {
        let requested = self.seed()?;
        info!(requested = requested.len(), "resolving");

        if self.request.ignore_depends {
            for &id in &requested {
                let effective = self.effective_for(id);
                collect::collect_one(self.store, self.config, &mut self.state, id, &effective)?;
            }
            return Ok(plan::verbatim(&self.state, &requested));
        }

        let mut queue: VecDeque<u32> = requested.iter().copied().collect();
        loop {
            while let Some(id) = queue.pop_front() {
                let effective = self.effective_for(id);
                if self.state.visited.get(&id) == Some(&effective) {
                    continue;
                }
                self.state.visited.insert(id, effective.clone());
                let children =
                    collect::collect_one(self.store, self.config, &mut self.state, id, &effective)?;
                queue.extend(children);
            }

            // Option choices discovered on later edges can invalidate an
            // earlier visit; keep passing until no snapshot changes.
            let stale: Vec<u32> = self
                .state
                .visited
                .iter()
                .filter(|(id, snapshot)| &self.effective_for(**id) != *snapshot)
                .map(|(id, _)| *id)
                .collect();
            if stale.is_empty() {
                break;
            }
            debug!(stale = stale.len(), "option snapshots changed, revisiting");
            queue.extend(stale);
        }

        let mut dep_graph = graph::DepGraph::new();
        for &id in self.state.heap.keys() {
            dep_graph.add_node(id);
        }
        for &(parent, child) in &self.state.edges {
            dep_graph.add_edge(parent, child);
        }
        debug!(
            nodes = dep_graph.node_count(),
            edges = dep_graph.edge_count(),
            "worklist converged"
        );

        let heap = &self.state.heap;
        let order = dep_graph.toposort(|id| {
            heap.get(&id)
                .map(ToString::to_string)
                .unwrap_or_else(|| format!("#{id}"))
        })?;

        plan::assemble(self.store, &self.state, order, self.request.use_new_options)
    }

    /// The effective requested option set for one admitted package
    fn effective_for(&self, id: u32) -> IndexSet<String> {
        options::effective(
            &self.state.heap[&id],
            self.config,
            &self.request.options,
            &self.request.package_options,
            &self.state.inline_targets,
            self.store,
        )
    }

    /// Resolve the requested atoms into seed nodes
    fn seed(&mut self) -> EmberResult<Vec<u32>> {
        let atoms = self.request.atoms.clone();
        let mut ids = Vec::new();
        for raw in &atoms {
            let atom = Atom::parse(raw, "command line")?;
            let candidates =
                collect::cached_find(self.store, &mut self.state, &atom.category, &atom.name)?;
            let chosen = select::choose(candidates, &atom, "command line", self.config)?;
            let id = collect::admit(self.store, &mut self.state, chosen);

            let target = self.state.heap[&id].clone();
            collect::record_inline_options(&mut self.state, &target, &atom);
            if let (Some(cmp), Some(version)) = (atom.cmp, &atom.version) {
                let point = DecisionPoint::new(&target.cn(), cmp, version, 0, "command line");
                let points = self.state.decisions.entry(target.slot_key()).or_default();
                if !points.contains(&point) {
                    points.push(point);
                }
            }

            self.state.requested.insert(id);
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Ok(ids)
    }
}
