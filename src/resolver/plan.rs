use crate::resolver::builder::OutputBinding;
use crate::resolver::id::VertexId;
use std::collections::{BTreeMap, HashMap};

/// Immutable result of a successful resolution, replayed by the evaluation
/// loop.
#[derive(Debug, Clone, Default)]
pub struct ExecutionPlan {
    /// Activated vertices in topological order
    order: Vec<VertexId>,

    /// Position of each vertex in `order`
    positions: HashMap<VertexId, usize>,

    /// Loop manager → nested vertices, in topological order
    nested: BTreeMap<VertexId, Vec<VertexId>>,

    /// Output requests with their resolved vertices, in request order
    bindings: Vec<OutputBinding>,

    /// Output vertices in scheduler order
    output_order: Vec<VertexId>,

    /// Resolution statistics
    pub stats: PlanStats,
}

/// Statistics about a resolution run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanStats {
    /// Module functions in the registry
    pub registered_modules: usize,

    /// Module functions left eligible by the compatibility filter
    pub eligible_modules: usize,

    /// Vertices in the execution order
    pub active_vertices: usize,

    /// Producer → consumer edges
    pub edges: usize,

    /// Output requests
    pub outputs: usize,

    /// Loop managers with at least one nested vertex
    pub loop_managers: usize,

    /// Resolution time in microseconds
    pub resolve_time_us: u64,
}

impl ExecutionPlan {
    pub fn new(
        order: Vec<VertexId>,
        nested: BTreeMap<VertexId, Vec<VertexId>>,
        bindings: Vec<OutputBinding>,
        output_order: Vec<VertexId>,
        stats: PlanStats,
    ) -> Self {
        let positions = order.iter().enumerate().map(|(i, &v)| (v, i)).collect();
        Self {
            order,
            positions,
            nested,
            bindings,
            output_order,
            stats,
        }
    }

    pub fn execution_order(&self) -> &[VertexId] {
        &self.order
    }

    /// Vertices nested under `manager`, in execution order. Empty for
    /// vertices that manage no loop.
    pub fn nested(&self, manager: VertexId) -> &[VertexId] {
        self.nested.get(&manager).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn loop_managers(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.nested.keys().copied()
    }

    pub fn output_bindings(&self) -> &[OutputBinding] {
        &self.bindings
    }

    pub fn output_order(&self) -> &[VertexId] {
        &self.output_order
    }

    pub fn position(&self, v: VertexId) -> Option<usize> {
        self.positions.get(&v).copied()
    }

    pub fn contains(&self, v: VertexId) -> bool {
        self.positions.contains_key(&v)
    }

    /// Sort `vertices` into execution order, dropping any not in the plan.
    pub fn sort_vertices<I>(&self, vertices: I) -> Vec<VertexId>
    where
        I: IntoIterator<Item = VertexId>,
    {
        let mut known: Vec<(usize, VertexId)> = vertices
            .into_iter()
            .filter_map(|v| self.position(v).map(|p| (p, v)))
            .collect();
        known.sort_unstable();
        known.dedup();
        known.into_iter().map(|(_, v)| v).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
