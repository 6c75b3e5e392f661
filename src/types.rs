//! Core data types shared between the registry feed and the resolver.
//!
//! # Main Types
//!
//! - [`Options`] - Free-form option record handed to a node on activation
//! - [`NodeDescriptor`] - Serializable declaration of a module function
//! - [`BackendDescriptor`] - Serializable declaration of a backend function
//! - [`RegistryFeed`] - Everything module and backend registration contributes

use crate::resolver::node::{ComputeNode, Requirement};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Option record attached to a node by the configuration.
pub type Options = BTreeMap<String, serde_json::Value>;

fn default_invalidation_rate() -> f64 {
    1.0
}

/// Declaration of a module function as contributed by module registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDescriptor {
    pub name: String,
    pub origin: String,
    #[serde(default)]
    pub version: String,
    pub capability: String,
    #[serde(rename = "type")]
    pub result_type: String,
    #[serde(default)]
    pub requirements: Vec<Requirement>,
    #[serde(default)]
    pub backend_requirements: Vec<Requirement>,
    /// Models this function may run under. Empty means always allowed.
    #[serde(default)]
    pub allowed_models: Vec<String>,
    /// Capability of the loop manager this function runs nested in.
    #[serde(default)]
    pub loop_manager: Option<String>,
    #[serde(default)]
    pub can_be_loop_manager: bool,
    /// Initial runtime estimate in nanoseconds.
    #[serde(default)]
    pub runtime_estimate: f64,
    #[serde(default = "default_invalidation_rate")]
    pub invalidation_rate: f64,
}

impl From<NodeDescriptor> for ComputeNode {
    fn from(desc: NodeDescriptor) -> Self {
        let mut node = ComputeNode::new(desc.name, desc.origin, desc.capability, desc.result_type)
            .with_version(desc.version)
            .loop_manager(desc.can_be_loop_manager)
            .with_runtime_estimate(desc.runtime_estimate)
            .with_invalidation_rate(desc.invalidation_rate);
        for req in desc.requirements {
            node = node.requires(req.capability, req.result_type);
        }
        for req in desc.backend_requirements {
            node = node.requires_backend(req.capability, req.result_type);
        }
        for model in desc.allowed_models {
            node = node.allowed_model(model);
        }
        if let Some(capability) = desc.loop_manager {
            node = node.managed_by(capability);
        }
        node
    }
}

fn default_true() -> bool {
    true
}

/// Declaration of a backend function as contributed by a backend loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendDescriptor {
    pub name: String,
    pub origin: String,
    #[serde(default)]
    pub version: String,
    pub capability: String,
    #[serde(rename = "type")]
    pub result_type: String,
    /// False when the shared library providing this function failed to load.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl From<BackendDescriptor> for ComputeNode {
    fn from(desc: BackendDescriptor) -> Self {
        ComputeNode::backend(
            desc.name,
            desc.origin,
            desc.version,
            desc.capability,
            desc.result_type,
            desc.enabled,
        )
    }
}

/// Ordered list of node declarations, as supplied by registration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryFeed {
    #[serde(default)]
    pub modules: Vec<NodeDescriptor>,
    #[serde(default)]
    pub backends: Vec<BackendDescriptor>,
}
