//! Dependency graph construction and topological ordering.
//!
//! Edges run parent → child (dependent → dependency). The sort removes all
//! zero-in-degree nodes per round, so the returned order starts at the
//! nodes nothing depends on; reversing it yields a valid build order.

use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use tracing::debug;

use ember_core::error::{EmberError, EmberResult};

/// Multigraph of `(parent, child)` dependency edges over package ids
#[derive(Debug, Default)]
pub struct DepGraph {
    graph: DiGraph<u32, ()>,
    nodes: HashMap<u32, NodeIndex>,
}

impl DepGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, returning the existing index if it is already present
    pub fn add_node(&mut self, id: u32) -> NodeIndex {
        if let Some(index) = self.nodes.get(&id) {
            return *index;
        }
        let index = self.graph.add_node(id);
        self.nodes.insert(id, index);
        index
    }

    /// Add a parent → child edge, creating missing endpoints
    pub fn add_edge(&mut self, parent: u32, child: u32) {
        let parent = self.add_node(parent);
        let child = self.add_node(child);
        self.graph.add_edge(parent, child, ());
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Topological order by repeated removal of all zero-in-degree nodes,
    /// later removals after earlier ones. Nodes nothing depends on come
    /// first; the reversed sequence is a valid build order.
    pub fn toposort(&self, label: impl Fn(u32) -> String) -> EmberResult<Vec<u32>> {
        let mut in_degree: HashMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|index| {
                (
                    index,
                    self.graph
                        .neighbors_directed(index, Direction::Incoming)
                        .count(),
                )
            })
            .collect();

        let mut removed: HashSet<NodeIndex> = HashSet::new();
        let mut order = Vec::with_capacity(self.graph.node_count());
        loop {
            let batch: Vec<NodeIndex> = self
                .graph
                .node_indices()
                .filter(|index| !removed.contains(index) && in_degree[index] == 0)
                .collect();
            if batch.is_empty() {
                break;
            }
            for index in batch {
                removed.insert(index);
                order.push(self.graph[index]);
                for child in self.graph.neighbors_directed(index, Direction::Outgoing) {
                    if let Some(degree) = in_degree.get_mut(&child) {
                        *degree = degree.saturating_sub(1);
                    }
                }
            }
        }

        if order.len() < self.graph.node_count() {
            let residual: Vec<NodeIndex> = self
                .graph
                .node_indices()
                .filter(|index| !removed.contains(index))
                .collect();
            let cycles = self.find_cycles(&residual);
            debug!(residual = residual.len(), cycles = cycles.len(), "topological sort failed");
            return Err(EmberError::CircularDependency {
                nodes: residual.iter().map(|index| label(self.graph[*index])).collect(),
                cycles: cycles.iter().map(|cycle| render_cycle(cycle, &label)).collect(),
            });
        }

        Ok(order)
    }

    /// Recover cycles from the residual node set by DFS with a path stack,
    /// deduplicating cycles that are rotations of one another.
    fn find_cycles(&self, residual: &[NodeIndex]) -> Vec<Vec<u32>> {
        let residual_set: HashSet<NodeIndex> = residual.iter().copied().collect();
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut seen: HashSet<Vec<u32>> = HashSet::new();
        let mut cycles = Vec::new();

        for &start in residual {
            let mut path: Vec<NodeIndex> = Vec::new();
            self.dfs_cycles(start, &residual_set, &mut path, &mut visited, &mut seen, &mut cycles);
        }
        cycles
    }

    fn dfs_cycles(
        &self,
        node: NodeIndex,
        residual: &HashSet<NodeIndex>,
        path: &mut Vec<NodeIndex>,
        visited: &mut HashSet<NodeIndex>,
        seen: &mut HashSet<Vec<u32>>,
        cycles: &mut Vec<Vec<u32>>,
    ) {
        if let Some(position) = path.iter().position(|on_path| *on_path == node) {
            let cycle: Vec<u32> = path[position..].iter().map(|index| self.graph[*index]).collect();
            let canonical = canonical_rotation(&cycle);
            if seen.insert(canonical) {
                cycles.push(cycle);
            }
            return;
        }
        if visited.contains(&node) {
            return;
        }
        visited.insert(node);

        path.push(node);
        for child in self.graph.neighbors_directed(node, Direction::Outgoing) {
            if residual.contains(&child) {
                self.dfs_cycles(child, residual, path, visited, seen, cycles);
            }
        }
        path.pop();
    }
}

/// Rotate a cycle so its smallest id comes first, making rotations compare equal
fn canonical_rotation(cycle: &[u32]) -> Vec<u32> {
    let min_position = cycle
        .iter()
        .enumerate()
        .min_by_key(|(_, id)| **id)
        .map(|(position, _)| position)
        .unwrap_or(0);
    let mut rotated = cycle[min_position..].to_vec();
    rotated.extend_from_slice(&cycle[..min_position]);
    rotated
}

/// Format a cycle as `a -> b -> a`
fn render_cycle(cycle: &[u32], label: &impl Fn(u32) -> String) -> String {
    let mut names: Vec<String> = cycle.iter().map(|id| label(*id)).collect();
    if let Some(first) = names.first().cloned() {
        names.push(first);
    }
    names.join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(id: u32) -> String {
        id.to_string()
    }

    #[test]
    fn test_empty_graph() {
        let graph = DepGraph::new();
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.toposort(label).unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn test_linear_chain_orders_roots_first() {
        let mut graph = DepGraph::new();
        graph.add_edge(1, 2);
        graph.add_edge(2, 3);

        let order = graph.toposort(label).unwrap();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn test_dependency_precedes_dependent_in_reversed_order() {
        let mut graph = DepGraph::new();
        // 1 depends on 2 and 3; 2 depends on 3
        graph.add_edge(1, 2);
        graph.add_edge(1, 3);
        graph.add_edge(2, 3);

        let order = graph.toposort(label).unwrap();
        let build: Vec<u32> = order.into_iter().rev().collect();

        let position = |id: u32| build.iter().position(|x| *x == id).unwrap();
        assert!(position(3) < position(2));
        assert!(position(2) < position(1));
    }

    #[test]
    fn test_isolated_nodes_ride_the_first_batch() {
        let mut graph = DepGraph::new();
        graph.add_node(7);
        graph.add_edge(1, 2);

        let order = graph.toposort(label).unwrap();
        assert_eq!(order.len(), 3);
        assert!(order.contains(&7));
        // 7 and 1 both have zero in-degree; batch order follows insertion
        assert_eq!(order[0], 7);
    }

    #[test]
    fn test_cycle_detection_recovers_rotation_deduplicated_cycle() {
        let mut graph = DepGraph::new();
        graph.add_edge(1, 2);
        graph.add_edge(2, 3);
        graph.add_edge(3, 1);

        let err = graph.toposort(label).unwrap_err();
        match err {
            EmberError::CircularDependency { nodes, cycles } => {
                let mut ids = nodes.clone();
                ids.sort();
                assert_eq!(ids, vec!["1", "2", "3"]);
                // Rotations collapse into exactly one recovered cycle
                assert_eq!(cycles.len(), 1);
                assert!(cycles[0].contains("->"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_two_disjoint_cycles() {
        let mut graph = DepGraph::new();
        graph.add_edge(1, 2);
        graph.add_edge(2, 1);
        graph.add_edge(3, 4);
        graph.add_edge(4, 3);

        let err = graph.toposort(label).unwrap_err();
        match err {
            EmberError::CircularDependency { cycles, .. } => assert_eq!(cycles.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_cycle_with_clean_prefix_sorts_the_prefix() {
        let mut graph = DepGraph::new();
        graph.add_edge(1, 2);
        graph.add_edge(2, 3);
        graph.add_edge(3, 2);

        let err = graph.toposort(label).unwrap_err();
        match err {
            EmberError::CircularDependency { nodes, .. } => {
                // Node 1 reduces away; only the cycle remains
                assert!(!nodes.contains(&"1".to_string()));
                assert_eq!(nodes.len(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_edges_do_not_break_reduction() {
        let mut graph = DepGraph::new();
        graph.add_edge(1, 2);
        graph.add_edge(1, 2);

        let order = graph.toposort(label).unwrap();
        assert_eq!(order, vec![1, 2]);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn acyclic_graphs_sort_every_edge_consistently(
            num_nodes in 2usize..8,
            edges in prop::collection::vec((0u32..7, 0u32..7), 0..20)
        ) {
            let mut graph = DepGraph::new();
            for id in 0..num_nodes as u32 {
                graph.add_node(id);
            }
            // Orient every edge downward to keep the graph acyclic
            let mut kept = Vec::new();
            for (a, b) in edges {
                let (a, b) = (a % num_nodes as u32, b % num_nodes as u32);
                if a < b {
                    graph.add_edge(a, b);
                    kept.push((a, b));
                }
            }

            let order = graph.toposort(|id| id.to_string()).unwrap();
            prop_assert_eq!(order.len(), num_nodes);

            // Every parent appears before its child; the reversed sequence
            // is therefore a valid build order.
            for (parent, child) in kept {
                let parent_at = order.iter().position(|x| *x == parent).unwrap();
                let child_at = order.iter().position(|x| *x == child).unwrap();
                prop_assert!(parent_at < child_at);
            }
        }
    }

    proptest! {
        #[test]
        fn sort_never_duplicates_or_drops_nodes(
            num_nodes in 1usize..8,
            edges in prop::collection::vec((0u32..7, 0u32..7), 0..20)
        ) {
            let mut graph = DepGraph::new();
            for id in 0..num_nodes as u32 {
                graph.add_node(id);
            }
            for (a, b) in edges {
                let (a, b) = (a % num_nodes as u32, b % num_nodes as u32);
                if a != b {
                    graph.add_edge(a, b);
                }
            }

            match graph.toposort(|id| id.to_string()) {
                Ok(order) => {
                    prop_assert_eq!(order.len(), num_nodes);
                    let unique: std::collections::HashSet<u32> = order.iter().copied().collect();
                    prop_assert_eq!(unique.len(), num_nodes);
                }
                Err(EmberError::CircularDependency { cycles, .. }) => {
                    prop_assert!(!cycles.is_empty());
                }
                Err(other) => prop_assert!(false, "unexpected error: {}", other),
            }
        }
    }
}
