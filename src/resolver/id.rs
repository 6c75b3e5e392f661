//! Identity types for the resolver.
//!
//! Both IDs are newtypes over `u32` that serve as direct array indices
//! into their registry arenas, providing O(1) lookup.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index into `Registry::modules`. Doubles as the dependency graph vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct VertexId(pub u32);

impl VertexId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Index into `Registry::backends`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BackendId(pub u32);

impl BackendId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_id() {
        let id = VertexId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(format!("{}", id), "VertexId(42)");
    }

    #[test]
    fn test_vertex_ids_order_by_index() {
        let mut ids = vec![VertexId(3), VertexId(0), VertexId(2)];
        ids.sort();
        assert_eq!(ids, vec![VertexId(0), VertexId(2), VertexId(3)]);
    }

    #[test]
    fn test_backend_id() {
        let id = BackendId(5);
        assert_eq!(id.index(), 5);
        assert_eq!(format!("{:?}", id), "BackendId(5)");
    }
}
