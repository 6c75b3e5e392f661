//! Dependency graph and topological orderer.
//!
//! Vertices are [`VertexId`] handles into the registry's module arena; edges
//! point from producer to consumer. Forward and backward adjacency lists are
//! kept side by side so ancestor queries and Kahn's algorithm are both cheap.

use crate::resolver::error::{ResolutionError, ResolutionResult};
use crate::resolver::id::VertexId;
use crate::resolver::registry::Registry;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Vertices in the graph, ascending.
    vertices: BTreeSet<VertexId>,
    /// Producer → consumers
    fwd_adj: Vec<Vec<VertexId>>,
    /// Consumer → producers
    bwd_adj: Vec<Vec<VertexId>>,
    edge_count: usize,
}

impl DependencyGraph {
    /// Create an empty graph able to address `capacity` vertices.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            vertices: BTreeSet::new(),
            fwd_adj: vec![Vec::new(); capacity],
            bwd_adj: vec![Vec::new(); capacity],
            edge_count: 0,
        }
    }

    fn ensure_slot(&mut self, v: VertexId) {
        let needed = v.index() + 1;
        if self.fwd_adj.len() < needed {
            self.fwd_adj.resize(needed, Vec::new());
            self.bwd_adj.resize(needed, Vec::new());
        }
    }

    pub fn add_vertex(&mut self, v: VertexId) {
        self.ensure_slot(v);
        self.vertices.insert(v);
    }

    /// Insert `from → to`. Parallel edges are collapsed; returns whether the
    /// edge is new.
    pub fn add_edge(&mut self, from: VertexId, to: VertexId) -> bool {
        self.add_vertex(from);
        self.add_vertex(to);
        if self.fwd_adj[from.index()].contains(&to) {
            return false;
        }
        self.fwd_adj[from.index()].push(to);
        self.bwd_adj[to.index()].push(from);
        self.edge_count += 1;
        true
    }

    pub fn contains(&self, v: VertexId) -> bool {
        self.vertices.contains(&v)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices.iter().copied()
    }

    /// All edges as `(producer, consumer)`, grouped by producer.
    pub fn edges(&self) -> impl Iterator<Item = (VertexId, VertexId)> + '_ {
        self.vertices
            .iter()
            .flat_map(move |&from| self.fwd_adj[from.index()].iter().map(move |&to| (from, to)))
    }

    pub fn consumers(&self, v: VertexId) -> &[VertexId] {
        self.fwd_adj.get(v.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn producers(&self, v: VertexId) -> &[VertexId] {
        self.bwd_adj.get(v.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `v` together with every vertex it transitively depends on.
    pub fn ancestors(&self, v: VertexId) -> BTreeSet<VertexId> {
        let mut seen = BTreeSet::new();
        let mut stack = vec![v];

        while let Some(node) = stack.pop() {
            if !seen.insert(node) {
                continue;
            }
            for &producer in self.producers(node) {
                if !seen.contains(&producer) {
                    stack.push(producer);
                }
            }
        }

        seen
    }

    /// Kahn's algorithm. Ready vertices are taken in ascending id order so
    /// the result only depends on the graph, not on insertion history.
    pub fn topological_order(&self, registry: &Registry) -> ResolutionResult<Vec<VertexId>> {
        let mut in_degree = vec![0usize; self.bwd_adj.len()];
        for &v in &self.vertices {
            in_degree[v.index()] = self.bwd_adj[v.index()].len();
        }

        let mut ready: BTreeSet<VertexId> = self
            .vertices
            .iter()
            .copied()
            .filter(|v| in_degree[v.index()] == 0)
            .collect();
        let mut result = Vec::with_capacity(self.vertices.len());

        while let Some(node) = ready.pop_first() {
            result.push(node);
            for &consumer in &self.fwd_adj[node.index()] {
                in_degree[consumer.index()] -= 1;
                if in_degree[consumer.index()] == 0 {
                    ready.insert(consumer);
                }
            }
        }

        if result.len() != self.vertices.len() {
            let remaining = self
                .vertices
                .iter()
                .filter(|v| in_degree[v.index()] > 0)
                .map(|&v| registry.label(v))
                .collect();
            return Err(ResolutionError::CyclicDependency { remaining });
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::node::ComputeNode;

    fn registry(n: usize) -> Registry {
        let mut registry = Registry::new();
        for i in 0..n {
            registry.add_module(ComputeNode::new(format!("f{i}"), "M", format!("c{i}"), "int"));
        }
        registry
    }

    #[test]
    fn test_topological_order_respects_edges() {
        let registry = registry(4);
        let mut graph = DependencyGraph::with_capacity(4);
        // 3 → 1 → 0, 2 → 0
        graph.add_edge(VertexId(3), VertexId(1));
        graph.add_edge(VertexId(1), VertexId(0));
        graph.add_edge(VertexId(2), VertexId(0));

        let order = graph.topological_order(&registry).unwrap();
        assert_eq!(order, vec![VertexId(2), VertexId(3), VertexId(1), VertexId(0)]);
    }

    #[test]
    fn test_parallel_edges_collapsed() {
        let mut graph = DependencyGraph::with_capacity(2);
        assert!(graph.add_edge(VertexId(0), VertexId(1)));
        assert!(!graph.add_edge(VertexId(0), VertexId(1)));
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edges().collect::<Vec<_>>(), vec![(VertexId(0), VertexId(1))]);
    }

    #[test]
    fn test_cycle_detected() {
        let registry = registry(3);
        let mut graph = DependencyGraph::with_capacity(3);
        graph.add_edge(VertexId(0), VertexId(1));
        graph.add_edge(VertexId(1), VertexId(0));
        graph.add_edge(VertexId(2), VertexId(0));

        let err = graph.topological_order(&registry).unwrap_err();
        match err {
            ResolutionError::CyclicDependency { remaining } => {
                assert_eq!(remaining, vec!["M::f0", "M::f1"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ancestors_include_self() {
        let mut graph = DependencyGraph::with_capacity(4);
        graph.add_edge(VertexId(0), VertexId(1));
        graph.add_edge(VertexId(1), VertexId(2));
        graph.add_vertex(VertexId(3));

        let ancestors = graph.ancestors(VertexId(2));
        assert_eq!(
            ancestors.into_iter().collect::<Vec<_>>(),
            vec![VertexId(0), VertexId(1), VertexId(2)]
        );
        assert_eq!(graph.ancestors(VertexId(3)).len(), 1);
    }

    #[test]
    fn test_isolated_vertices_are_ordered() {
        let registry = registry(3);
        let mut graph = DependencyGraph::with_capacity(0);
        graph.add_vertex(VertexId(2));
        graph.add_vertex(VertexId(0));
        assert_eq!(
            graph.topological_order(&registry).unwrap(),
            vec![VertexId(0), VertexId(2)]
        );
    }
}
