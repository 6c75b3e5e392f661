//! Property-based tests over randomly generated acyclic registries.

mod common;

use common::builders::{NodeBuilder, SetupBuilder};
use common::assert_topologically_sorted;
use depres_rs::resolver::{ActivationStatus, DependencyResolver, Functor, VertexId};
use proptest::prelude::*;
use std::collections::BTreeSet;

const NODES: usize = 12;

/// Node `i` provides `c{i}`. An edge `(a, b)` with `a < b` makes node `b`
/// require `c{a}`, so the generated graph is always acyclic.
fn random_setup(
    edges: &[(usize, usize)],
    outputs: &[usize],
    runtimes: &[f64],
    rates: &[f64],
) -> DependencyResolver {
    let mut setup = SetupBuilder::new().active_model("M1");
    for i in 0..NODES {
        let mut node = NodeBuilder::new(&format!("f{i}"), &format!("Mod{}", i % 3), &format!("c{i}"), "double")
            .cost(runtimes[i], rates[i]);
        for &(a, b) in edges {
            if b == i && a < b {
                node = node.requires(&format!("c{a}"), "double");
            }
        }
        setup.add(node);
    }
    for &o in outputs {
        setup = setup.output(&format!("c{o}"), "double");
    }
    setup.build()
}

proptest! {
    #[test]
    fn test_resolution_is_deterministic(
        edges in prop::collection::vec((0usize..NODES, 0usize..NODES), 0..30),
        outputs in prop::collection::vec(0usize..NODES, 1..6),
        runtimes in prop::collection::vec(0.0f64..100.0, NODES),
        rates in prop::collection::vec(0.1f64..10.0, NODES),
    ) {
        let mut first = random_setup(&edges, &outputs, &runtimes, &rates);
        let mut second = random_setup(&edges, &outputs, &runtimes, &rates);

        first.resolve().unwrap();
        second.resolve().unwrap();
        prop_assert_eq!(first.execution_order(), second.execution_order());
        prop_assert_eq!(first.output_order(), second.output_order());

        // Resolving the same instance again changes nothing either.
        let order = first.execution_order().to_vec();
        first.resolve().unwrap();
        prop_assert_eq!(first.execution_order(), order.as_slice());
    }

    #[test]
    fn test_execution_order_covers_activated_graph(
        edges in prop::collection::vec((0usize..NODES, 0usize..NODES), 0..30),
        outputs in prop::collection::vec(0usize..NODES, 1..6),
    ) {
        let mut resolver = random_setup(&edges, &outputs, &[1.0; NODES], &[1.0; NODES]);
        resolver.resolve().unwrap();
        assert_topologically_sorted(&resolver);

        let order: BTreeSet<VertexId> = resolver.execution_order().iter().copied().collect();
        let graph: BTreeSet<VertexId> = resolver.graph().vertices().collect();
        prop_assert_eq!(order.len(), resolver.execution_order().len(), "no vertex twice");
        prop_assert_eq!(&order, &graph);

        for (id, node) in resolver.registry().modules() {
            let activated = node.status() == ActivationStatus::Activated;
            prop_assert_eq!(activated, order.contains(&id), "{} activation", node.label());
        }
    }

    #[test]
    fn test_output_order_is_permutation_of_bindings(
        outputs in prop::collection::vec(0usize..NODES, 1..8),
        runtimes in prop::collection::vec(0.0f64..100.0, NODES),
        rates in prop::collection::vec(0.0f64..10.0, NODES),
    ) {
        let mut resolver = random_setup(&[(0, 1), (1, 2), (0, 5)], &outputs, &runtimes, &rates);
        resolver.resolve().unwrap();

        prop_assert_eq!(resolver.output_bindings().len(), outputs.len());
        let bound: BTreeSet<VertexId> = resolver.output_bindings().iter().map(|b| b.vertex).collect();
        let scheduled: BTreeSet<VertexId> = resolver.output_order().iter().copied().collect();
        prop_assert_eq!(resolver.output_order().len(), bound.len());
        prop_assert_eq!(bound, scheduled);
    }
}
