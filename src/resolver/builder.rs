//! Graph builder.
//!
//! Drives a FIFO of outstanding requirements, seeded with one entry per
//! output request. Each entry is resolved to a producer; Core entries become
//! output bindings, everything else becomes a producer → consumer edge. A
//! producer picked for the first time is activated, its backend requirements
//! are bound and its own requirements join the queue.

use crate::config::{find_entry_for_functor, find_entry_for_requirement, ConfigEntry, OutputRequest, RunConfig};
use crate::models::ModelHierarchy;
use crate::resolver::backend::resolve_backends;
use crate::resolver::capability::CapabilityResolver;
use crate::resolver::diagnostics::{ResolutionTrace, TraceStep};
use crate::resolver::error::{ResolutionError, ResolutionResult};
use crate::resolver::graph::DependencyGraph;
use crate::resolver::id::VertexId;
use crate::resolver::node::{ActivationStatus, Functor};
use crate::resolver::queue::{Consumer, DependencyKind, QueueEntry, RequirementQueue};
use crate::resolver::registry::Registry;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// An output request and the vertex that satisfies it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputBinding {
    pub request: OutputRequest,
    pub vertex: VertexId,
}

/// Loop manager → nodes nested beneath it.
pub type LoopManagerSet = BTreeMap<VertexId, BTreeSet<VertexId>>;

/// Everything graph construction produces.
#[derive(Debug, Clone, Default)]
pub struct BuildOutcome {
    pub graph: DependencyGraph,
    pub bindings: Vec<OutputBinding>,
    pub loop_managers: LoopManagerSet,
}

pub struct GraphBuilder<'a> {
    registry: &'a mut Registry,
    hierarchy: &'a ModelHierarchy,
    active_models: &'a [String],
    config: &'a RunConfig,
}

impl<'a> GraphBuilder<'a> {
    /// The registry must already have gone through the compatibility filter.
    pub fn new(
        registry: &'a mut Registry,
        hierarchy: &'a ModelHierarchy,
        active_models: &'a [String],
        config: &'a RunConfig,
    ) -> Self {
        Self {
            registry,
            hierarchy,
            active_models,
            config,
        }
    }

    /// Steps are recorded into `trace` as they happen, so it keeps
    /// everything resolved before a failure.
    pub fn build(mut self, trace: &mut ResolutionTrace) -> ResolutionResult<BuildOutcome> {
        let mut queue = RequirementQueue::new();
        for (index, request) in self.config.observables.iter().enumerate() {
            queue.push(QueueEntry::output(request.requirement(), request.printme, index));
        }

        let mut outcome = BuildOutcome {
            graph: DependencyGraph::with_capacity(self.registry.module_count()),
            ..Default::default()
        };

        while let Some(entry) = queue.pop() {
            let (filter, options) = self.entry_filters(&entry)?;

            let producer = {
                let resolver = CapabilityResolver::new(
                    &*self.registry,
                    self.hierarchy,
                    self.active_models,
                    &self.config.resolution,
                );
                debug!(
                    "Resolving {} required by {}",
                    entry.requirement,
                    resolver.consumer_label(entry.consumer)
                );
                resolver.resolve(&entry.requirement, entry.consumer, filter)?
            };

            match entry.consumer {
                Consumer::Core => {
                    if entry.print_me {
                        if self.registry[producer].is_void() {
                            debug!("{} has no result to print", self.registry.label(producer));
                        } else {
                            self.registry[producer].set_print_required(true);
                        }
                    }
                    if let Some(request) = entry.request_index.and_then(|i| self.config.observables.get(i)) {
                        outcome.bindings.push(OutputBinding {
                            request: request.clone(),
                            vertex: producer,
                        });
                    }
                }
                Consumer::Vertex(consumer) => {
                    if entry.kind == DependencyKind::LoopManager {
                        if !self.registry[producer].can_be_loop_manager() {
                            return Err(ResolutionError::InvalidLoopManager {
                                requirement: entry.requirement.clone(),
                                consumer: entry.consumer,
                                consumer_label: self.registry.label(consumer),
                                producer: self.registry.label(producer),
                            });
                        }
                        outcome
                            .loop_managers
                            .entry(producer)
                            .or_default()
                            .insert(consumer);
                    } else {
                        self.registry[consumer].resolve_dependency(entry.requirement.clone(), producer);
                    }
                    outcome.graph.add_edge(producer, consumer);
                }
            }

            let newly_activated = self.registry[producer].status() != ActivationStatus::Activated;
            trace.record(TraceStep {
                requirement: entry.requirement.clone(),
                consumer: match entry.consumer {
                    Consumer::Core => "Core".to_string(),
                    Consumer::Vertex(v) => self.registry.label(v),
                },
                producer: self.registry.label(producer),
                kind: entry.kind,
                activated: newly_activated,
            });
            debug!("Resolved by {}", self.registry.label(producer));

            if newly_activated {
                self.activate(producer, options, &mut queue)?;
                outcome.graph.add_vertex(producer);
            }
        }

        Ok(outcome)
    }

    /// The configuration filter used to pick the producer, and the entry
    /// whose options go to the producer if it gets activated.
    fn entry_filters(
        &self,
        entry: &QueueEntry,
    ) -> ResolutionResult<(Option<&'a ConfigEntry>, Option<&'a ConfigEntry>)> {
        let config = self.config;
        match entry.consumer {
            Consumer::Core => {
                let request = entry.request_index.and_then(|i| config.observables.get(i));
                Ok((request, request))
            }
            Consumer::Vertex(consumer) => {
                let node = self
                    .registry
                    .module(consumer)
                    .ok_or_else(|| ResolutionError::UnknownVertex(consumer.to_string()))?;
                let aux = find_entry_for_functor(node, &config.auxiliaries)?;
                let filter = match aux {
                    Some(aux) => find_entry_for_requirement(&entry.requirement, &aux.dependencies)?,
                    None => None,
                };
                let options = find_entry_for_requirement(&entry.requirement, &config.auxiliaries)?;
                Ok((filter, options))
            }
        }
    }

    fn activate(
        &mut self,
        vertex: VertexId,
        options: Option<&ConfigEntry>,
        queue: &mut RequirementQueue,
    ) -> ResolutionResult<()> {
        debug!("Adding {} to the dependency tree", self.registry.label(vertex));

        let config = self.config;
        let aux = find_entry_for_functor(&self.registry[vertex], &config.auxiliaries)?;
        let backends = resolve_backends(&*self.registry, vertex, aux)?;

        let node = &mut self.registry[vertex];
        for (requirement, backend) in backends {
            node.resolve_backend_requirement(requirement, backend);
        }
        if let Some(entry) = options {
            node.notify_of_options(entry.options.clone());
        }
        node.set_status(ActivationStatus::Activated);

        for requirement in node.requirements() {
            queue.push(QueueEntry::dependency(requirement.clone(), vertex));
        }
        if let Some(capability) = node.loop_manager_capability() {
            queue.push(QueueEntry::loop_manager(capability, vertex));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::compat::filter;
    use crate::resolver::node::{ComputeNode, Requirement};
    use serde_json::json;

    fn run_traced(
        registry: &mut Registry,
        config: &RunConfig,
        trace: &mut ResolutionTrace,
    ) -> ResolutionResult<BuildOutcome> {
        let hierarchy = config.hierarchy();
        filter(registry, &hierarchy, &config.active_models)?;
        GraphBuilder::new(registry, &hierarchy, &config.active_models, config).build(trace)
    }

    fn run(registry: &mut Registry, config: &RunConfig) -> ResolutionResult<BuildOutcome> {
        run_traced(registry, config, &mut ResolutionTrace::new())
    }

    fn base_config() -> RunConfig {
        RunConfig::new("test").with_active_model("M1")
    }

    #[test]
    fn test_chain_builds_edge_and_binding() {
        let mut registry = Registry::new();
        let a = registry.add_module(ComputeNode::new("a", "Mod", "x", "int"));
        let b = registry.add_module(ComputeNode::new("b", "Mod", "y", "int").requires("x", "int"));
        let config = base_config().with_observable(ConfigEntry::new("y", "int"));

        let mut trace = ResolutionTrace::new();
        let outcome = run_traced(&mut registry, &config, &mut trace).unwrap();

        assert_eq!(outcome.bindings.len(), 1);
        assert_eq!(outcome.bindings[0].vertex, b);
        assert_eq!(outcome.graph.edges().collect::<Vec<_>>(), vec![(a, b)]);
        assert_eq!(registry[a].status(), ActivationStatus::Activated);
        assert_eq!(registry[b].resolved_dependencies(), &[(Requirement::new("x", "int"), a)]);
        assert!(registry[b].print_required());
        assert!(!registry[a].print_required());
        assert_eq!(trace.len(), 2);
    }

    #[test]
    fn test_unrequested_nodes_stay_eligible() {
        let mut registry = Registry::new();
        let a = registry.add_module(ComputeNode::new("a", "Mod", "x", "int"));
        let unused = registry.add_module(ComputeNode::new("u", "Mod", "z", "int"));
        let config = base_config().with_observable(ConfigEntry::new("x", "int"));

        let outcome = run(&mut registry, &config).unwrap();
        assert!(outcome.graph.contains(a));
        assert!(!outcome.graph.contains(unused));
        assert_eq!(registry[unused].status(), ActivationStatus::Eligible);
    }

    #[test]
    fn test_shared_dependency_activated_once() {
        let mut registry = Registry::new();
        let a = registry.add_module(ComputeNode::new("a", "Mod", "x", "int"));
        registry.add_module(ComputeNode::new("b", "Mod", "y", "int").requires("x", "int"));
        registry.add_module(ComputeNode::new("c", "Mod", "z", "int").requires("x", "int"));
        let config = base_config()
            .with_observable(ConfigEntry::new("y", "int"))
            .with_observable(ConfigEntry::new("z", "int"));

        let mut trace = ResolutionTrace::new();
        let outcome = run_traced(&mut registry, &config, &mut trace).unwrap();
        let activations = trace
            .steps()
            .iter()
            .filter(|s| s.producer == registry.label(a) && s.activated)
            .count();
        assert_eq!(activations, 1);
        assert_eq!(outcome.graph.consumers(a).len(), 2);
    }

    #[test]
    fn test_loop_manager_recorded() {
        let mut registry = Registry::new();
        let manager = registry.add_module(ComputeNode::new("loop", "Mod", "events", "void").loop_manager(true));
        let nested = registry.add_module(ComputeNode::new("per_event", "Mod", "y", "int").managed_by("events"));
        let config = base_config().with_observable(ConfigEntry::new("y", "int"));

        let outcome = run(&mut registry, &config).unwrap();
        assert_eq!(
            outcome.loop_managers.get(&manager).map(|s| s.iter().copied().collect::<Vec<_>>()),
            Some(vec![nested])
        );
        assert!(outcome.graph.consumers(manager).contains(&nested));
        assert!(registry[nested].resolved_dependencies().is_empty());
    }

    #[test]
    fn test_invalid_loop_manager() {
        let mut registry = Registry::new();
        registry.add_module(ComputeNode::new("not_a_loop", "Mod", "events", "void"));
        registry.add_module(ComputeNode::new("per_event", "Mod", "y", "int").managed_by("events"));
        let config = base_config().with_observable(ConfigEntry::new("y", "int"));

        let err = run(&mut registry, &config).unwrap_err();
        match err {
            ResolutionError::InvalidLoopManager { producer, consumer_label, .. } => {
                assert_eq!(producer, "Mod::not_a_loop");
                assert_eq!(consumer_label, "Mod::per_event");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_auxiliary_dependency_filter_and_options() {
        let mut registry = Registry::new();
        registry.add_module(ComputeNode::new("x_a", "ModA", "x", "int"));
        let x_b = registry.add_module(ComputeNode::new("x_b", "ModB", "x", "int"));
        let y = registry.add_module(ComputeNode::new("y", "ModC", "y", "int").requires("x", "int"));

        let config = base_config()
            .with_observable(ConfigEntry::new("y", "int").with_option("tolerance", json!(0.1)))
            .with_auxiliary(
                ConfigEntry::new("y", "").with_dependency(ConfigEntry::new("x", "").with_module("ModB")),
            )
            .with_auxiliary(ConfigEntry::new("x", "").with_function("x_b").with_option("depth", json!(3)));

        let outcome = run(&mut registry, &config).unwrap();
        assert_eq!(registry[y].resolved_dependencies()[0].1, x_b);
        assert_eq!(
            registry[y].options().and_then(|o| o.get("tolerance")),
            Some(&json!(0.1))
        );
        assert_eq!(registry[x_b].options().and_then(|o| o.get("depth")), Some(&json!(3)));
        assert_eq!(outcome.graph.edge_count(), 1);
    }

    #[test]
    fn test_duplicate_auxiliary_entries_rejected() {
        let mut registry = Registry::new();
        registry.add_module(ComputeNode::new("x", "ModA", "x", "int"));
        registry.add_module(ComputeNode::new("y", "ModC", "y", "int").requires("x", "int"));

        let config = base_config()
            .with_observable(ConfigEntry::new("y", "int"))
            .with_auxiliary(ConfigEntry::new("y", "").with_module("ModC"))
            .with_auxiliary(ConfigEntry::new("y", "int"));

        let err = run(&mut registry, &config).unwrap_err();
        assert!(matches!(err, ResolutionError::DuplicateConfigEntry { .. }));
    }

    #[test]
    fn test_printme_false_leaves_printing_off() {
        let mut registry = Registry::new();
        let a = registry.add_module(ComputeNode::new("a", "Mod", "x", "int"));
        let config = base_config().with_observable(ConfigEntry::new("x", "int").with_printme(false));

        run(&mut registry, &config).unwrap();
        assert!(!registry[a].print_required());
    }

    #[test]
    fn test_void_output_not_printed() {
        let mut registry = Registry::new();
        let sink = registry.add_module(ComputeNode::new("finish", "Mod", "done", "void"));
        let config = base_config().with_observable(ConfigEntry::new("done", "void"));

        let outcome = run(&mut registry, &config).unwrap();
        assert_eq!(outcome.bindings[0].vertex, sink);
        assert_eq!(registry[sink].status(), ActivationStatus::Activated);
        assert!(!registry[sink].print_required());
    }

    #[test]
    fn test_trace_kept_up_to_failure() {
        let mut registry = Registry::new();
        registry.add_module(ComputeNode::new("b", "Mod", "y", "int").requires("x", "int"));
        let config = base_config().with_observable(ConfigEntry::new("y", "int"));

        let mut trace = ResolutionTrace::new();
        let err = run_traced(&mut registry, &config, &mut trace).unwrap_err();
        assert!(matches!(err, ResolutionError::UnresolvedCapability { .. }));
        assert_eq!(trace.len(), 1);
        assert_eq!(trace.steps()[0].consumer, "Core");
        assert_eq!(trace.steps()[0].producer, "Mod::b");
    }
}
