//! Diagnostics and reporting.
//!
//! - [`ResolutionTrace`] records every requirement the graph builder handled
//!   and what satisfied it.
//! - [`node_table`] / [`backend_table`] render the registry with activation
//!   status, for the log.
//! - [`GraphSnapshot`] is a serializable description of the resolved graph;
//!   [`GraphSnapshot::to_dot`] turns it into Graphviz input.

use crate::resolver::graph::DependencyGraph;
use crate::resolver::id::VertexId;
use crate::resolver::node::{Functor, Requirement};
use crate::resolver::queue::DependencyKind;
use crate::resolver::registry::Registry;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};

/// One resolved requirement.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceStep {
    pub requirement: Requirement,
    /// `Core` or `origin::name` of the consumer.
    pub consumer: String,
    /// `origin::name` of the producer.
    pub producer: String,
    pub kind: DependencyKind,
    /// The producer was activated by this step.
    pub activated: bool,
}

impl fmt::Display for TraceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            DependencyKind::Normal => "",
            DependencyKind::LoopManager => " [loop manager]",
        };
        write!(
            f,
            "{}{} required by {} resolved by {}",
            self.requirement, kind, self.consumer, self.producer
        )?;
        if self.activated {
            write!(f, " (activated)")?;
        }
        Ok(())
    }
}

/// Ordered record of the graph builder's decisions.
#[derive(Debug, Clone, Default)]
pub struct ResolutionTrace {
    steps: Vec<TraceStep>,
}

impl ResolutionTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, step: TraceStep) {
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[TraceStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for ResolutionTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            writeln!(f, "{}", step)?;
        }
        Ok(())
    }
}

// ==================== Tables ====================

const TABLE_HEADER: &str = "ORIGIN (VERSION)          | FUNCTION                       | CAPABILITY                     | TYPE                 | STATUS | #DEPS | #BE_REQS";

fn table_row(out: &mut String, node: &dyn Functor, backend_reqs: usize) {
    let origin = if node.version().is_empty() {
        node.origin().to_string()
    } else {
        format!("{} ({})", node.origin(), node.version())
    };
    // Writing into a String cannot fail.
    let _ = writeln!(
        out,
        "{:<25} | {:<30} | {:<30} | {:<20} | {:>6} | {:>5} | {:>8}",
        origin,
        node.name(),
        node.capability(),
        node.result_type(),
        node.status().code(),
        node.requirements().len(),
        backend_reqs,
    );
}

/// Module functions with their activation status
/// (0 = disabled, 1 = eligible, 2 = activated).
pub fn node_table(registry: &Registry) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Available module functions");
    let _ = writeln!(out, "{}", TABLE_HEADER);
    for (_, node) in registry.modules() {
        table_row(&mut out, node, node.backend_requirements().len());
    }
    out
}

/// Backend functions with their status (0 = library failed to load).
pub fn backend_table(registry: &Registry) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Available backend functions");
    let _ = writeln!(out, "{}", TABLE_HEADER);
    for (_, node) in registry.backends() {
        table_row(&mut out, node, 0);
    }
    out
}

// ==================== Graph Snapshot ====================

/// Snapshot of a single graph vertex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexSnapshot {
    pub id: VertexId,
    pub name: String,
    pub origin: String,
    pub capability: String,
    #[serde(rename = "type")]
    pub result_type: String,
    pub print_required: bool,
}

/// Snapshot of a single producer → consumer edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSnapshot {
    pub from: VertexId,
    pub to: VertexId,
}

/// Complete description of a resolved graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub vertices: Vec<VertexSnapshot>,
    pub edges: Vec<EdgeSnapshot>,
}

impl GraphSnapshot {
    pub fn capture(graph: &DependencyGraph, registry: &Registry) -> Self {
        let vertices = graph
            .vertices()
            .filter_map(|id| {
                registry.module(id).map(|node| VertexSnapshot {
                    id,
                    name: node.name().to_string(),
                    origin: node.origin().to_string(),
                    capability: node.capability().to_string(),
                    result_type: node.result_type().to_string(),
                    print_required: node.print_required(),
                })
            })
            .collect();
        let edges = graph
            .edges()
            .map(|(from, to)| EdgeSnapshot { from, to })
            .collect();
        Self { vertices, edges }
    }

    /// Graphviz description, one record-shaped box per vertex.
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph dependencies {\n");
        out.push_str("  node [shape=box, fontname=\"Helvetica\"];\n");
        for v in &self.vertices {
            let _ = writeln!(
                out,
                "  {} [label=\"{}\\nType: {}\\nFunction: {}\\nModule: {}\"{}];",
                v.id.0,
                escape_label(&v.capability),
                escape_label(&v.result_type),
                escape_label(&v.name),
                escape_label(&v.origin),
                if v.print_required { ", style=bold" } else { "" },
            );
        }
        for e in &self.edges {
            let _ = writeln!(out, "  {} -> {};", e.from.0, e.to.0);
        }
        out.push_str("}\n");
        out
    }
}

fn escape_label(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
