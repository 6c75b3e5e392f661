//! # depres-rs: Capability-based dependency resolver
//!
//! Resolves an executable pipeline of compute nodes from their declarations.
//! Nodes declare a capability they produce and the capabilities they
//! require; given a set of requested outputs and the active models, the
//! resolver picks exactly one producer per requirement, builds an acyclic
//! dependency graph and derives an execution order plus a cost-aware order
//! for the requested outputs.
//!
//! ## Architecture
//!
//! - **Registry**: arena of module and backend functions, built by the
//!   application from a [`RegistryFeed`] or programmatically
//! - **Resolver**: compatibility filter, capability resolver, graph builder,
//!   topological orderer and output scheduler (see [`resolver`])
//! - **Configuration**: output requests, auxiliary disambiguation entries,
//!   model declarations and settings, loaded from TOML or JSON
//! - **Printer**: external sink told which vertices get printed
//!
//! ## Example
//!
//! ```ignore
//! use depres_rs::{
//!     config::{ConfigEntry, RunConfig},
//!     resolver::{ComputeNode, DependencyResolver, Registry},
//! };
//!
//! let mut registry = Registry::new();
//! registry.add_module(ComputeNode::new("make_x", "ModA", "x", "int"));
//! registry.add_module(ComputeNode::new("make_y", "ModA", "y", "int").requires("x", "int"));
//!
//! let config = RunConfig::new("example")
//!     .with_active_model("M1")
//!     .with_observable(ConfigEntry::new("y", "int"));
//!
//! let mut resolver = DependencyResolver::new(registry, config);
//! let plan = resolver.resolve()?;
//! for vertex in plan.execution_order() {
//!     println!("{}", resolver.registry().label(*vertex));
//! }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod printer;
pub mod resolver;
pub mod types;

// Re-export commonly used types
pub use config::{ConfigEntry, OutputRequest, ResolutionSettings, RunConfig, SetupFile};
pub use error::{DepResError, Result};
pub use models::ModelHierarchy;
pub use printer::PrinterSink;
pub use resolver::{
    ComputeNode, DependencyResolver, ExecutionPlan, Registry, ResolutionError, VertexId,
};
pub use types::{BackendDescriptor, NodeDescriptor, RegistryFeed};
