//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;

use depres_rs::resolver::{DependencyResolver, VertexId};

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// Names (`origin::name`) of a list of vertices
pub fn labels(resolver: &DependencyResolver, vertices: &[VertexId]) -> Vec<String> {
    vertices
        .iter()
        .map(|&v| resolver.registry().label(v))
        .collect()
}

/// Assert every producer appears before each of its consumers
pub fn assert_topologically_sorted(resolver: &DependencyResolver) {
    let order = resolver.execution_order();
    let position = |v: VertexId| order.iter().position(|&o| o == v);
    for (from, to) in resolver.graph().edges() {
        let (Some(p_from), Some(p_to)) = (position(from), position(to)) else {
            panic!("edge {} -> {} touches a vertex outside the execution order", from, to);
        };
        assert!(
            p_from < p_to,
            "{} must run before {}",
            resolver.registry().label(from),
            resolver.registry().label(to)
        );
    }
}
