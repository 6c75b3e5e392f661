//! Output scheduler.
//!
//! Orders the requested outputs so that, when some of them are invalidated
//! far more often than others, the expected amount of recomputation is
//! small. Cheap outputs that rarely change go first; expensive or volatile
//! outputs go later, by which time much of their shared upstream work has
//! already been paid for.
//!
//! The greedy pass keeps a set of "friends": ancestors already counted by
//! an earlier pick. At each step the remaining output `v` minimising
//!
//! ```text
//! cost(ancestors(v) ∪ friends) / invalidation_rate(v)
//! ```
//!
//! is taken, where `cost` sums the nodes' average runtimes and
//! `ancestors(v)` includes `v`. Ties go to the output bound first.
//!
//! This is a heuristic. It is not globally optimal.

use crate::resolver::graph::DependencyGraph;
use crate::resolver::id::VertexId;
use crate::resolver::registry::Registry;
use std::collections::BTreeSet;
use tracing::trace;

fn cost(registry: &Registry, vertices: &BTreeSet<VertexId>) -> f64 {
    vertices
        .iter()
        .filter_map(|&v| registry.module(v))
        .map(|node| node.runtime_average())
        .sum()
}

/// Order `outputs` for evaluation. Repeated vertices keep their first
/// position only.
pub fn schedule(graph: &DependencyGraph, registry: &Registry, outputs: &[VertexId]) -> Vec<VertexId> {
    let mut remaining: Vec<(VertexId, BTreeSet<VertexId>)> = Vec::with_capacity(outputs.len());
    for &v in outputs {
        if !remaining.iter().any(|(seen, _)| *seen == v) {
            remaining.push((v, graph.ancestors(v)));
        }
    }

    let mut friends: BTreeSet<VertexId> = BTreeSet::new();
    let mut sorted = Vec::with_capacity(remaining.len());

    while !remaining.is_empty() {
        let mut best_index = 0;
        let mut best_ratio = f64::INFINITY;

        for (index, (v, ancestors)) in remaining.iter().enumerate() {
            let union: BTreeSet<VertexId> = ancestors.union(&friends).copied().collect();
            let rate = registry.module(*v).map_or(0.0, |node| node.invalidation_rate());
            let ratio = if rate > 0.0 {
                cost(registry, &union) / rate
            } else {
                f64::INFINITY
            };
            trace!("Output {} has cost ratio {}", v, ratio);

            // Strict comparison keeps the earliest output on ties.
            if ratio < best_ratio {
                best_ratio = ratio;
                best_index = index;
            }
        }

        let (v, ancestors) = remaining.remove(best_index);
        friends.extend(ancestors);
        sorted.push(v);
    }

    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::node::ComputeNode;

    fn output(registry: &mut Registry, graph: &mut DependencyGraph, name: &str, runtime: f64, rate: f64) -> VertexId {
        let v = registry.add_module(
            ComputeNode::new(name, "M", name, "double")
                .with_runtime_estimate(runtime)
                .with_invalidation_rate(rate),
        );
        graph.add_vertex(v);
        v
    }

    #[test]
    fn test_orders_by_cost_over_rate() {
        let mut registry = Registry::new();
        let mut graph = DependencyGraph::with_capacity(3);
        let a = output(&mut registry, &mut graph, "a", 10.0, 1.0);
        let b = output(&mut registry, &mut graph, "b", 20.0, 10.0);
        let c = output(&mut registry, &mut graph, "c", 30.0, 100.0);

        assert_eq!(schedule(&graph, &registry, &[a, b, c]), vec![c, b, a]);
    }

    #[test]
    fn test_ties_keep_binding_order() {
        let mut registry = Registry::new();
        let mut graph = DependencyGraph::with_capacity(2);
        let a = output(&mut registry, &mut graph, "a", 5.0, 1.0);
        let b = output(&mut registry, &mut graph, "b", 5.0, 1.0);

        assert_eq!(schedule(&graph, &registry, &[b, a]), vec![b, a]);
    }

    #[test]
    fn test_shared_ancestors_are_amortised() {
        // shared (100) feeds both x and y; z is independent (60).
        let mut registry = Registry::new();
        let mut graph = DependencyGraph::with_capacity(4);
        let shared = output(&mut registry, &mut graph, "shared", 100.0, 1.0);
        let x = output(&mut registry, &mut graph, "x", 1.0, 1.0);
        let y = output(&mut registry, &mut graph, "y", 1.0, 1.0);
        let z = output(&mut registry, &mut graph, "z", 60.0, 1.0);
        graph.add_edge(shared, x);
        graph.add_edge(shared, y);

        // z (60) beats x (101); afterwards x costs 161 and y 161, tie → x.
        assert_eq!(schedule(&graph, &registry, &[x, y, z]), vec![z, x, y]);
    }

    #[test]
    fn test_zero_rate_goes_last() {
        let mut registry = Registry::new();
        let mut graph = DependencyGraph::with_capacity(2);
        let frozen = output(&mut registry, &mut graph, "frozen", 1.0, 0.0);
        let live = output(&mut registry, &mut graph, "live", 50.0, 1.0);

        assert_eq!(schedule(&graph, &registry, &[frozen, live]), vec![live, frozen]);
    }

    #[test]
    fn test_duplicates_collapsed() {
        let mut registry = Registry::new();
        let mut graph = DependencyGraph::with_capacity(1);
        let a = output(&mut registry, &mut graph, "a", 1.0, 1.0);
        assert_eq!(schedule(&graph, &registry, &[a, a]), vec![a]);
    }
}
