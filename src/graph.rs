//! Level dependency graph module.
//!
//! Provides the `LevelGraph` type, which records which leveled traits need
//! another trait's level first: a skill defaulting to another skill, a
//! ritual magic spell built on its Ritual Magic skill, a weapon used with a
//! skill. The calculator resolves traits in the order this graph gives.

use crate::traits::TraitPath;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// Order in which to resolve levels, plus any dependency loops found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionOrder {
    /// Every node, dependencies before dependents. Members of a cycle are
    /// adjacent, sorted by path.
    pub order: Vec<TraitPath>,
    /// Each cycle as a closed path (first node repeated at the end).
    pub cycles: Vec<Vec<TraitPath>>,
}

/// A directed graph of trait level dependencies.
///
/// Edges run from a dependency to its dependent. Unlike a strict DAG the
/// graph tolerates cycles: they are reported, and their members are still
/// ordered so a pass can give each of them a value.
///
/// # Examples
///
/// ```rust
/// use gurps_bonus::graph::LevelGraph;
/// use gurps_bonus::traits::TraitPath;
///
/// let broadsword = TraitPath(vec![0]);
/// let shortsword = TraitPath(vec![1]);
///
/// let mut graph = LevelGraph::new();
/// // Shortsword defaults from Broadsword
/// graph.add_edge(shortsword.clone(), broadsword.clone());
///
/// let resolution = graph.resolution_order();
/// assert_eq!(resolution.order, vec![broadsword, shortsword]);
/// assert!(resolution.cycles.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct LevelGraph {
    graph: DiGraph<TraitPath, ()>,
    node_map: HashMap<TraitPath, NodeIndex>,
}

impl LevelGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node if it doesn't exist yet and return its index.
    pub fn add_node(&mut self, path: TraitPath) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(&path) {
            idx
        } else {
            let idx = self.graph.add_node(path.clone());
            self.node_map.insert(path, idx);
            idx
        }
    }

    /// Record that `dependent` needs the level of `dependency` first.
    ///
    /// Both nodes are added if missing. Repeated edges are kept once.
    pub fn add_edge(&mut self, dependent: TraitPath, dependency: TraitPath) {
        let dependent_idx = self.add_node(dependent);
        let dependency_idx = self.add_node(dependency);
        self.graph.update_edge(dependency_idx, dependent_idx, ());
    }

    /// Check if a node exists in the graph.
    pub fn contains_node(&self, path: &TraitPath) -> bool {
        self.node_map.contains_key(path)
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Whether `a` and `b` sit on the same dependency cycle.
    pub fn same_cycle(&self, a: &TraitPath, b: &TraitPath) -> bool {
        self.resolution_order()
            .cycles
            .iter()
            .any(|cycle| cycle.contains(a) && cycle.contains(b))
    }

    /// Compute the resolution order.
    ///
    /// Strongly connected components come out of Tarjan's algorithm in
    /// reverse topological order, so they are reversed here. A component
    /// with more than one node, or a node depending on itself, is a cycle.
    pub fn resolution_order(&self) -> ResolutionOrder {
        let mut resolution = ResolutionOrder::default();
        let mut components = tarjan_scc(&self.graph);
        components.reverse();

        for component in components {
            let mut paths: Vec<TraitPath> = component.iter().map(|&idx| self.graph[idx].clone()).collect();
            paths.sort();

            let is_cycle = component.len() > 1
                || component
                    .first()
                    .is_some_and(|&idx| self.graph.contains_edge(idx, idx));
            if is_cycle {
                let mut cycle = paths.clone();
                cycle.push(paths[0].clone());
                resolution.cycles.push(cycle);
            }
            resolution.order.extend(paths);
        }

        resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(i: usize) -> TraitPath {
        TraitPath(vec![i])
    }

    #[test]
    fn test_graph_add_nodes() {
        let mut graph = LevelGraph::new();
        graph.add_node(path(0));
        graph.add_node(path(0));
        graph.add_node(path(1));

        assert_eq!(graph.len(), 2);
        assert!(graph.contains_node(&path(1)));
        assert!(!graph.contains_node(&path(2)));
    }

    #[test]
    fn test_chain_order() {
        let mut graph = LevelGraph::new();
        // 2 depends on 1, 1 depends on 0
        graph.add_edge(path(2), path(1));
        graph.add_edge(path(1), path(0));

        let resolution = graph.resolution_order();
        assert_eq!(resolution.order, vec![path(0), path(1), path(2)]);
        assert!(resolution.cycles.is_empty());
    }

    #[test]
    fn test_isolated_nodes_are_ordered() {
        let mut graph = LevelGraph::new();
        graph.add_node(path(5));
        graph.add_edge(path(1), path(0));

        let resolution = graph.resolution_order();
        assert_eq!(resolution.order.len(), 3);
        let pos = |p: TraitPath| resolution.order.iter().position(|x| *x == p).unwrap();
        assert!(pos(path(0)) < pos(path(1)));
    }

    #[test]
    fn test_two_node_cycle() {
        let mut graph = LevelGraph::new();
        graph.add_edge(path(0), path(1));
        graph.add_edge(path(1), path(0));
        graph.add_edge(path(2), path(1));

        let resolution = graph.resolution_order();
        assert_eq!(resolution.cycles, vec![vec![path(0), path(1), path(0)]]);
        assert_eq!(resolution.order.last(), Some(&path(2)));
        assert!(graph.same_cycle(&path(0), &path(1)));
        assert!(!graph.same_cycle(&path(1), &path(2)));
    }

    #[test]
    fn test_self_cycle() {
        let mut graph = LevelGraph::new();
        graph.add_edge(path(0), path(0));

        let resolution = graph.resolution_order();
        assert_eq!(resolution.cycles, vec![vec![path(0), path(0)]]);
    }

    #[test]
    fn test_order_is_deterministic() {
        let build = || {
            let mut graph = LevelGraph::new();
            graph.add_edge(path(3), path(1));
            graph.add_edge(path(3), path(2));
            graph.add_edge(path(1), path(0));
            graph.resolution_order()
        };
        assert_eq!(build(), build());
    }
}
