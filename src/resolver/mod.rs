//! Dependency resolution engine.
//!
//! Compute nodes declare what they produce (capability + type) and what they
//! require. The resolver turns a set of requested outputs into an executable
//! plan: one producer per requirement, an acyclic graph, a global execution
//! order, loop-manager nesting and a cost-aware output order.
//!
//! # Architecture
//!
//! ```text
//! [Registry] ──► [compat::filter] ──► [GraphBuilder] ──► [topological order] ──► [scheduler]
//!                                          │
//!                                          └──► [CapabilityResolver] per requirement
//!                                               [resolve_backends] per activation
//! ```
//!
//! # Design
//!
//! - **Arena + dense handles**: nodes live in the [`Registry`] and are
//!   addressed by [`VertexId`] / [`BackendId`]; the graph is adjacency lists
//!   over those handles.
//! - **Shared trait**: module and backend functions are both [`ComputeNode`]s
//!   matched through [`Functor`].
//! - **No globals**: the registry is built by the application and owned by
//!   the [`DependencyResolver`].
//! - **All-or-nothing**: every [`ResolutionError`] is fatal.

pub mod backend;
pub mod builder;
pub mod capability;
pub mod compat;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod graph;
pub mod id;
pub mod node;
pub mod plan;
pub mod queue;
pub mod registry;
pub mod scheduler;

pub use builder::{GraphBuilder, LoopManagerSet, OutputBinding};
pub use capability::CapabilityResolver;
pub use diagnostics::{GraphSnapshot, ResolutionTrace, TraceStep};
pub use engine::DependencyResolver;
pub use error::{ResolutionError, ResolutionResult};
pub use graph::DependencyGraph;
pub use id::{BackendId, VertexId};
pub use node::{ActivationStatus, ComputeNode, Functor, NodeKind, Requirement};
pub use plan::{ExecutionPlan, PlanStats};
pub use queue::{Consumer, DependencyKind};
pub use registry::Registry;
