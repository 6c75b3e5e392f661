//! Resolver facade.
//!
//! [`DependencyResolver`] owns the registry and the run configuration and
//! runs the whole pipeline:
//!
//! ```text
//! Registry → compat::filter → GraphBuilder → topological order → scheduler
//! ```
//!
//! The result is an [`ExecutionPlan`]. Changing the active model set throws
//! the plan away and resolves again from scratch.

use crate::config::RunConfig;
use crate::error::{DepResError, Result, ResultExt};
use crate::models::ModelHierarchy;
use crate::printer::PrinterSink;
use crate::resolver::builder::{GraphBuilder, OutputBinding};
use crate::resolver::compat;
use crate::resolver::diagnostics::{self, GraphSnapshot, ResolutionTrace};
use crate::resolver::error::{ResolutionError, ResolutionResult};
use crate::resolver::graph::DependencyGraph;
use crate::resolver::id::VertexId;
use crate::resolver::node::{ActivationStatus, Functor};
use crate::resolver::plan::{ExecutionPlan, PlanStats};
use crate::resolver::registry::Registry;
use crate::resolver::scheduler;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

pub struct DependencyResolver {
    registry: Registry,
    config: RunConfig,
    hierarchy: ModelHierarchy,
    active_models: Vec<String>,
    graph: DependencyGraph,
    trace: ResolutionTrace,
    plan: Option<ExecutionPlan>,
}

impl DependencyResolver {
    pub fn new(registry: Registry, config: RunConfig) -> Self {
        let hierarchy = config.hierarchy();
        let active_models = config.active_models.clone();
        Self {
            registry,
            config,
            hierarchy,
            active_models,
            graph: DependencyGraph::default(),
            trace: ResolutionTrace::new(),
            plan: None,
        }
    }

    /// Run the full resolution. All-or-nothing: on error no plan is kept.
    pub fn resolve(&mut self) -> ResolutionResult<&ExecutionPlan> {
        self.plan = None;
        match self.run() {
            Ok(plan) => {
                info!(
                    "Resolved {} outputs using {} of {} module functions ({} edges) in {}us",
                    plan.stats.outputs,
                    plan.stats.active_vertices,
                    plan.stats.registered_modules,
                    plan.stats.edges,
                    plan.stats.resolve_time_us
                );
                Ok(self.plan.insert(plan))
            }
            Err(e) => {
                error!("Dependency resolution failed: {}", e);
                Err(e)
            }
        }
    }

    fn run(&mut self) -> ResolutionResult<ExecutionPlan> {
        let start_time = Instant::now();

        self.registry.reset_resolution();
        self.graph = DependencyGraph::default();
        self.trace = ResolutionTrace::new();

        if self.active_models.is_empty() {
            warn!("No active models; no module function is eligible");
        }
        if self.config.observables.is_empty() {
            warn!("No outputs requested; the execution plan will be empty");
        }

        let eligible = compat::filter(&mut self.registry, &self.hierarchy, &self.active_models)?;
        debug!(
            "{} of {} module functions eligible",
            eligible,
            self.registry.module_count()
        );

        let outcome = GraphBuilder::new(
            &mut self.registry,
            &self.hierarchy,
            &self.active_models,
            &self.config,
        )
        .build(&mut self.trace)?;
        self.graph = outcome.graph;

        let order = self.graph.topological_order(&self.registry)?;

        let mut nested = BTreeMap::new();
        for (manager, members) in outcome.loop_managers {
            let sorted: Vec<VertexId> = order
                .iter()
                .copied()
                .filter(|v| members.contains(v))
                .collect();
            self.registry[manager].set_nested(sorted.clone());
            nested.insert(manager, sorted);
        }

        let outputs: Vec<VertexId> = outcome.bindings.iter().map(|b| b.vertex).collect();
        let output_order = scheduler::schedule(&self.graph, &self.registry, &outputs);

        let stats = PlanStats {
            registered_modules: self.registry.module_count(),
            eligible_modules: eligible,
            active_vertices: order.len(),
            edges: self.graph.edge_count(),
            outputs: outcome.bindings.len(),
            loop_managers: nested.len(),
            resolve_time_us: start_time.elapsed().as_micros() as u64,
        };

        Ok(ExecutionPlan::new(
            order,
            nested,
            outcome.bindings,
            output_order,
            stats,
        ))
    }

    /// Replace the active model set and resolve again from scratch.
    pub fn set_active_models(&mut self, models: Vec<String>) -> ResolutionResult<&ExecutionPlan> {
        info!("Active models changed to [{}]; rebuilding", models.join(", "));
        self.active_models = models;
        self.resolve()
    }

    // ── Evaluation-loop interface ──
    //
    // Before a successful `resolve` these are all empty.

    pub fn plan(&self) -> Option<&ExecutionPlan> {
        self.plan.as_ref()
    }

    pub fn execution_order(&self) -> &[VertexId] {
        self.plan.as_ref().map(|p| p.execution_order()).unwrap_or(&[])
    }

    pub fn nested(&self, manager: VertexId) -> &[VertexId] {
        self.plan.as_ref().map(|p| p.nested(manager)).unwrap_or(&[])
    }

    pub fn output_bindings(&self) -> &[OutputBinding] {
        self.plan.as_ref().map(|p| p.output_bindings()).unwrap_or(&[])
    }

    pub fn output_order(&self) -> &[VertexId] {
        self.plan.as_ref().map(|p| p.output_order()).unwrap_or(&[])
    }

    /// Everything `vertex` depends on, itself included, in execution order.
    pub fn evaluation_order_for(&self, vertex: VertexId) -> ResolutionResult<Vec<VertexId>> {
        let plan = self
            .plan
            .as_ref()
            .filter(|p| p.contains(vertex))
            .ok_or_else(|| ResolutionError::UnknownVertex(self.registry.label(vertex)))?;
        Ok(plan.sort_vertices(self.graph.ancestors(vertex)))
    }

    /// Hand every activated, print-requiring vertex to the printer. Returns
    /// what was handed over.
    pub fn initialise_printer(&self, printer: &mut dyn PrinterSink) -> Vec<VertexId> {
        let vertices: Vec<VertexId> = self
            .execution_order()
            .iter()
            .copied()
            .filter(|&v| {
                let node = &self.registry[v];
                node.status() == ActivationStatus::Activated && node.print_required()
            })
            .collect();
        debug!("Initialising printer with {} vertices", vertices.len());
        printer.initialise(&vertices);
        vertices
    }

    /// Record a measured runtime on a node, for the next scheduling pass.
    pub fn record_runtime(&mut self, vertex: VertexId, elapsed: Duration) -> ResolutionResult<()> {
        let node = self
            .registry
            .module_mut(vertex)
            .ok_or_else(|| ResolutionError::UnknownVertex(vertex.to_string()))?;
        node.record_runtime(elapsed);
        Ok(())
    }

    // ── Diagnostics ──

    pub fn trace(&self) -> &ResolutionTrace {
        &self.trace
    }

    pub fn node_table(&self) -> String {
        diagnostics::node_table(&self.registry)
    }

    pub fn backend_table(&self) -> String {
        diagnostics::backend_table(&self.registry)
    }

    /// The output order with function and origin of each output.
    pub fn evaluation_order_report(&self) -> String {
        let mut out = String::from("Initial functor evaluation order\n");
        let _ = writeln!(out, "{:<6} {:<30} {:<30} {}", "#", "FUNCTION", "CAPABILITY", "ORIGIN");
        for (i, &v) in self.output_order().iter().enumerate() {
            let node = &self.registry[v];
            let _ = writeln!(
                out,
                "{:<6} {:<30} {:<30} {}",
                i,
                node.name(),
                node.capability(),
                node.origin()
            );
        }
        out
    }

    pub fn graph_snapshot(&self) -> GraphSnapshot {
        GraphSnapshot::capture(&self.graph, &self.registry)
    }

    /// Write the graph artifacts named in the resolution settings.
    pub fn write_artifacts(&self) -> Result<()> {
        let settings = &self.config.resolution;
        if let Some(path) = &settings.graph_output {
            self.write_file(path, self.graph_snapshot().to_dot())
                .with_context(|| format!("Failed to write graph to {:?}", path))?;
            info!("Graph written to {:?}", path);
        }
        if let Some(path) = &settings.snapshot_output {
            let json = serde_json::to_string_pretty(&self.graph_snapshot())?;
            self.write_file(path, json)
                .with_context(|| format!("Failed to write snapshot to {:?}", path))?;
            info!("Graph snapshot written to {:?}", path);
        }
        Ok(())
    }

    fn write_file(&self, path: &Path, content: String) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content).map_err(DepResError::from)
    }

    // ── Accessors ──

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn active_models(&self) -> &[String] {
        &self.active_models
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }
}
