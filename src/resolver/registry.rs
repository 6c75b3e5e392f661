//! Compute node registry.
//!
//! Two flat arenas: module functions (which become graph vertices) and
//! backend functions (which are only reachable through backend
//! requirements). The registry is built by the application during setup and
//! handed to the resolver by reference; there is no global registration.

use crate::resolver::id::{BackendId, VertexId};
use crate::resolver::node::{ComputeNode, Functor};
use crate::types::RegistryFeed;
use std::ops::{Index, IndexMut};

#[derive(Debug, Clone, Default)]
pub struct Registry {
    modules: Vec<ComputeNode>,
    backends: Vec<ComputeNode>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from declarations, preserving their order.
    pub fn from_feed(feed: RegistryFeed) -> Self {
        let mut registry = Self::new();
        for desc in feed.modules {
            registry.add_module(desc.into());
        }
        for desc in feed.backends {
            registry.add_backend(desc.into());
        }
        registry
    }

    /// Add a module function. Returns its vertex handle.
    pub fn add_module(&mut self, node: ComputeNode) -> VertexId {
        let id = VertexId(self.modules.len() as u32);
        self.modules.push(node);
        id
    }

    /// Add a backend function. Returns its handle in the backend pool.
    pub fn add_backend(&mut self, node: ComputeNode) -> BackendId {
        let id = BackendId(self.backends.len() as u32);
        self.backends.push(node);
        id
    }

    pub fn module(&self, id: VertexId) -> Option<&ComputeNode> {
        self.modules.get(id.index())
    }

    pub fn module_mut(&mut self, id: VertexId) -> Option<&mut ComputeNode> {
        self.modules.get_mut(id.index())
    }

    pub fn backend(&self, id: BackendId) -> Option<&ComputeNode> {
        self.backends.get(id.index())
    }

    /// Iterate module functions with their handles, in registration order.
    pub fn modules(&self) -> impl Iterator<Item = (VertexId, &ComputeNode)> {
        self.modules
            .iter()
            .enumerate()
            .map(|(i, node)| (VertexId(i as u32), node))
    }

    pub fn modules_mut(&mut self) -> impl Iterator<Item = &mut ComputeNode> {
        self.modules.iter_mut()
    }

    /// Iterate backend functions with their handles, in registration order.
    pub fn backends(&self) -> impl Iterator<Item = (BackendId, &ComputeNode)> {
        self.backends
            .iter()
            .enumerate()
            .map(|(i, node)| (BackendId(i as u32), node))
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn backend_count(&self) -> usize {
        self.backends.len()
    }

    pub fn contains(&self, id: VertexId) -> bool {
        id.index() < self.modules.len()
    }

    /// `origin::name` of a module function, or the raw id if unknown.
    pub fn label(&self, id: VertexId) -> String {
        self.module(id)
            .map(|node| node.label())
            .unwrap_or_else(|| id.to_string())
    }

    /// Clear everything a previous resolution attached to module functions.
    pub fn reset_resolution(&mut self) {
        for node in &mut self.modules {
            node.reset_resolution();
        }
    }
}

impl Index<VertexId> for Registry {
    type Output = ComputeNode;

    fn index(&self, id: VertexId) -> &ComputeNode {
        &self.modules[id.index()]
    }
}

impl IndexMut<VertexId> for Registry {
    fn index_mut(&mut self, id: VertexId) -> &mut ComputeNode {
        &mut self.modules[id.index()]
    }
}

impl Index<BackendId> for Registry {
    type Output = ComputeNode;

    fn index(&self, id: BackendId) -> &ComputeNode {
        &self.backends[id.index()]
    }
}
