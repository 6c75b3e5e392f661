//! Compute node abstraction for the resolver.
//!
//! Module functions and backend functions are the same kind of thing as far
//! as resolution is concerned: they produce one capability and may require
//! others. Both are stored as [`ComputeNode`] records, tagged by [`NodeKind`],
//! and matched through the [`Functor`] trait.

use crate::models::ModelHierarchy;
use crate::resolver::id::{BackendId, VertexId};
use crate::types::Options;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

/// Result type of nodes that produce no value.
pub const VOID_TYPE: &str = "void";

/// Capability that can only be resolved from within the consumer's module.
pub const POINT_INIT_CAPABILITY: &str = "PointInit";

/// A `(capability, type)` pair a node requires. An empty type is a wildcard.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Requirement {
    pub capability: String,
    #[serde(rename = "type", default)]
    pub result_type: String,
}

impl Requirement {
    pub fn new(capability: impl Into<String>, result_type: impl Into<String>) -> Self {
        Self {
            capability: capability.into(),
            result_type: result_type.into(),
        }
    }

    /// Whether the type half of this requirement accepts any type.
    pub fn is_wildcard(&self) -> bool {
        self.result_type.is_empty()
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.capability, self.result_type)
    }
}

/// Activation state machine of a node.
///
/// `Disabled → Eligible` happens in the compatibility filter,
/// `Eligible → Activated` when the graph builder first picks the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationStatus {
    #[default]
    Disabled,
    Eligible,
    Activated,
}

impl ActivationStatus {
    /// Eligible or activated nodes may satisfy requirements.
    pub fn is_available(self) -> bool {
        !matches!(self, ActivationStatus::Disabled)
    }

    /// Numeric code used in the node tables.
    pub fn code(self) -> u8 {
        match self {
            ActivationStatus::Disabled => 0,
            ActivationStatus::Eligible => 1,
            ActivationStatus::Activated => 2,
        }
    }
}

/// Which pool a node lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A function contributed by a physics module. Becomes a graph vertex.
    #[default]
    Module,
    /// A function loaded from an external library. Only reachable through
    /// backend requirements.
    Backend,
}

/// The shared interface the matchers work against.
pub trait Functor {
    fn name(&self) -> &str;
    fn origin(&self) -> &str;
    fn version(&self) -> &str;
    fn capability(&self) -> &str;
    fn result_type(&self) -> &str;
    fn requirements(&self) -> &[Requirement];
    fn status(&self) -> ActivationStatus;

    /// `origin::name`, the form used in candidate lists.
    fn label(&self) -> String {
        format!("{}::{}", self.origin(), self.name())
    }

    /// Exact capability match, plus exact type match unless `requirement`
    /// carries the wildcard type.
    fn provides(&self, requirement: &Requirement) -> bool {
        self.capability() == requirement.capability
            && (requirement.is_wildcard() || self.result_type() == requirement.result_type)
    }
}

/// A unit of computation with declared inputs and one declared output.
#[derive(Debug, Clone)]
pub struct ComputeNode {
    name: String,
    origin: String,
    version: String,
    capability: String,
    result_type: String,
    kind: NodeKind,
    requirements: Vec<Requirement>,
    loop_manager_capability: Option<String>,
    backend_requirements: Vec<Requirement>,
    allowed_models: BTreeSet<String>,
    can_be_loop_manager: bool,
    status: ActivationStatus,

    // Scheduler metadata. Written by the node, read by the scheduler.
    invalidation_rate: f64,
    runtime_average: f64,
    runtime_samples: u64,

    // Per-resolution state, cleared by `reset_resolution`.
    notified_models: Vec<String>,
    options: Option<Options>,
    print_required: bool,
    resolved_dependencies: Vec<(Requirement, VertexId)>,
    resolved_backends: Vec<(Requirement, BackendId)>,
    nested: Vec<VertexId>,
}

impl ComputeNode {
    /// Create a module node with no requirements and no model restriction.
    pub fn new(
        name: impl Into<String>,
        origin: impl Into<String>,
        capability: impl Into<String>,
        result_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            origin: origin.into(),
            version: String::new(),
            capability: capability.into(),
            result_type: result_type.into(),
            kind: NodeKind::Module,
            requirements: Vec::new(),
            loop_manager_capability: None,
            backend_requirements: Vec::new(),
            allowed_models: BTreeSet::new(),
            can_be_loop_manager: false,
            status: ActivationStatus::Eligible,
            invalidation_rate: 1.0,
            runtime_average: 0.0,
            runtime_samples: 0,
            notified_models: Vec::new(),
            options: None,
            print_required: false,
            resolved_dependencies: Vec::new(),
            resolved_backends: Vec::new(),
            nested: Vec::new(),
        }
    }

    /// Create a backend node. `enabled` is false when the library providing
    /// it could not be loaded.
    pub fn backend(
        name: impl Into<String>,
        origin: impl Into<String>,
        version: impl Into<String>,
        capability: impl Into<String>,
        result_type: impl Into<String>,
        enabled: bool,
    ) -> Self {
        let mut node = Self::new(name, origin, capability, result_type).with_version(version);
        node.kind = NodeKind::Backend;
        node.status = if enabled {
            ActivationStatus::Eligible
        } else {
            ActivationStatus::Disabled
        };
        node
    }

    // ── Builder-style declaration ──

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn requires(mut self, capability: impl Into<String>, result_type: impl Into<String>) -> Self {
        self.requirements.push(Requirement::new(capability, result_type));
        self
    }

    pub fn requires_backend(
        mut self,
        capability: impl Into<String>,
        result_type: impl Into<String>,
    ) -> Self {
        self.backend_requirements
            .push(Requirement::new(capability, result_type));
        self
    }

    /// Declare that this node runs nested inside the loop manager providing
    /// `capability`.
    pub fn managed_by(mut self, capability: impl Into<String>) -> Self {
        self.loop_manager_capability = Some(capability.into());
        self
    }

    pub fn loop_manager(mut self, can_manage: bool) -> Self {
        self.can_be_loop_manager = can_manage;
        self
    }

    pub fn allowed_model(mut self, model: impl Into<String>) -> Self {
        self.allowed_models.insert(model.into());
        self
    }

    pub fn with_runtime_estimate(mut self, runtime: f64) -> Self {
        self.runtime_average = runtime;
        self
    }

    pub fn with_invalidation_rate(mut self, rate: f64) -> Self {
        self.invalidation_rate = rate;
        self
    }

    // ── Accessors ──

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn loop_manager_capability(&self) -> Option<&str> {
        self.loop_manager_capability.as_deref()
    }

    pub fn backend_requirements(&self) -> &[Requirement] {
        &self.backend_requirements
    }

    pub fn allowed_models(&self) -> &BTreeSet<String> {
        &self.allowed_models
    }

    pub fn can_be_loop_manager(&self) -> bool {
        self.can_be_loop_manager
    }

    pub fn is_void(&self) -> bool {
        self.result_type == VOID_TYPE
    }

    pub fn invalidation_rate(&self) -> f64 {
        self.invalidation_rate
    }

    /// Average runtime in nanoseconds.
    pub fn runtime_average(&self) -> f64 {
        self.runtime_average
    }

    pub fn notified_models(&self) -> &[String] {
        &self.notified_models
    }

    pub fn options(&self) -> Option<&Options> {
        self.options.as_ref()
    }

    pub fn print_required(&self) -> bool {
        self.print_required
    }

    pub fn resolved_dependencies(&self) -> &[(Requirement, VertexId)] {
        &self.resolved_dependencies
    }

    pub fn resolved_backends(&self) -> &[(Requirement, BackendId)] {
        &self.resolved_backends
    }

    /// Nodes nested under this loop manager, in execution order.
    pub fn nested(&self) -> &[VertexId] {
        &self.nested
    }

    // ── Model restriction ──

    /// Empty restriction, or the model or one of its ancestors is listed.
    pub fn model_allowed(&self, model: &str, hierarchy: &ModelHierarchy) -> bool {
        if self.allowed_models.is_empty() {
            return true;
        }
        hierarchy
            .lineage(model)
            .iter()
            .any(|m| self.allowed_models.contains(m))
    }

    /// The node names this exact model in its restriction set.
    pub fn model_explicitly_allowed(&self, model: &str) -> bool {
        self.allowed_models.contains(model)
    }

    // ── State transitions ──

    pub fn set_status(&mut self, status: ActivationStatus) {
        self.status = status;
    }

    pub fn notify_of_model(&mut self, model: &str) {
        if !self.notified_models.iter().any(|m| m == model) {
            self.notified_models.push(model.to_string());
        }
    }

    pub fn notify_of_options(&mut self, options: Options) {
        self.options = Some(options);
    }

    pub fn set_print_required(&mut self, required: bool) {
        self.print_required = required;
    }

    pub fn resolve_dependency(&mut self, requirement: Requirement, producer: VertexId) {
        self.resolved_dependencies.push((requirement, producer));
    }

    pub fn resolve_backend_requirement(&mut self, requirement: Requirement, backend: BackendId) {
        self.resolved_backends.push((requirement, backend));
    }

    pub fn set_nested(&mut self, nested: Vec<VertexId>) {
        self.nested = nested;
    }

    pub fn set_invalidation_rate(&mut self, rate: f64) {
        self.invalidation_rate = rate;
    }

    /// Fold one measured runtime into the running average.
    pub fn record_runtime(&mut self, elapsed: Duration) {
        let sample = elapsed.as_nanos() as f64;
        self.runtime_samples += 1;
        self.runtime_average += (sample - self.runtime_average) / self.runtime_samples as f64;
    }

    /// Drop everything a previous resolution attached to this node.
    pub fn reset_resolution(&mut self) {
        self.notified_models.clear();
        self.options = None;
        self.print_required = false;
        self.resolved_dependencies.clear();
        self.resolved_backends.clear();
        self.nested.clear();
    }
}

impl Functor for ComputeNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn origin(&self) -> &str {
        &self.origin
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn capability(&self) -> &str {
        &self.capability
    }

    fn result_type(&self) -> &str {
        &self.result_type
    }

    fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    fn status(&self) -> ActivationStatus {
        self.status
    }
}
