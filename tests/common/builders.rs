//! Test data builders for creating registries and configurations

use depres_rs::config::{ConfigEntry, RunConfig};
use depres_rs::resolver::{ComputeNode, DependencyResolver, Registry, VertexId};

/// Builder for creating test module functions
pub struct NodeBuilder {
    node: ComputeNode,
}

impl NodeBuilder {
    /// Function `name` in module `origin` providing `capability` of `result_type`
    pub fn new(name: &str, origin: &str, capability: &str, result_type: &str) -> Self {
        Self {
            node: ComputeNode::new(name, origin, capability, result_type),
        }
    }

    pub fn requires(mut self, capability: &str, result_type: &str) -> Self {
        self.node = self.node.requires(capability, result_type);
        self
    }

    pub fn requires_backend(mut self, capability: &str, result_type: &str) -> Self {
        self.node = self.node.requires_backend(capability, result_type);
        self
    }

    pub fn model(mut self, model: &str) -> Self {
        self.node = self.node.allowed_model(model);
        self
    }

    pub fn managed_by(mut self, capability: &str) -> Self {
        self.node = self.node.managed_by(capability);
        self
    }

    pub fn loop_manager(mut self) -> Self {
        self.node = self.node.loop_manager(true);
        self
    }

    pub fn cost(mut self, runtime: f64, invalidation_rate: f64) -> Self {
        self.node = self
            .node
            .with_runtime_estimate(runtime)
            .with_invalidation_rate(invalidation_rate);
        self
    }

    pub fn build(self) -> ComputeNode {
        self.node
    }
}

/// Builder for a registry plus run configuration
pub struct SetupBuilder {
    registry: Registry,
    config: RunConfig,
}

impl SetupBuilder {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            config: RunConfig::new("test"),
        }
    }

    pub fn node(mut self, node: NodeBuilder) -> Self {
        self.registry.add_module(node.build());
        self
    }

    /// Add a node and hand back its handle
    pub fn add(&mut self, node: NodeBuilder) -> VertexId {
        self.registry.add_module(node.build())
    }

    pub fn backend(mut self, name: &str, origin: &str, version: &str, capability: &str, result_type: &str, enabled: bool) -> Self {
        self.registry.add_backend(ComputeNode::backend(
            name,
            origin,
            version,
            capability,
            result_type,
            enabled,
        ));
        self
    }

    pub fn active_model(mut self, model: &str) -> Self {
        self.config = self.config.with_active_model(model);
        self
    }

    pub fn model(mut self, model: &str, parents: &[&str]) -> Self {
        self.config = self.config.with_model(model, parents.iter().copied());
        self
    }

    pub fn output(mut self, capability: &str, result_type: &str) -> Self {
        self.config = self
            .config
            .with_observable(ConfigEntry::new(capability, result_type));
        self
    }

    pub fn observable(mut self, entry: ConfigEntry) -> Self {
        self.config = self.config.with_observable(entry);
        self
    }

    pub fn auxiliary(mut self, entry: ConfigEntry) -> Self {
        self.config = self.config.with_auxiliary(entry);
        self
    }

    pub fn config_mut(&mut self) -> &mut RunConfig {
        &mut self.config
    }

    pub fn build(self) -> DependencyResolver {
        DependencyResolver::new(self.registry, self.config)
    }
}

impl Default for SetupBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depres_rs::resolver::Functor;

    #[test]
    fn test_node_builder() {
        let node = NodeBuilder::new("f", "M", "x", "int")
            .requires("y", "int")
            .model("M1")
            .build();

        assert_eq!(node.name(), "f");
        assert_eq!(node.requirements().len(), 1);
        assert!(node.model_explicitly_allowed("M1"));
    }
}
