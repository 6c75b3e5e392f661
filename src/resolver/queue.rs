//! Requirement queue driving graph construction.

use crate::resolver::id::VertexId;
use crate::resolver::node::Requirement;
use std::collections::VecDeque;
use std::fmt;

/// Who asked for a requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Consumer {
    /// The virtual sink standing for the user's output requests.
    Core,
    /// A node already in the graph.
    Vertex(VertexId),
}

impl Consumer {
    pub fn vertex(self) -> Option<VertexId> {
        match self {
            Consumer::Core => None,
            Consumer::Vertex(v) => Some(v),
        }
    }

    pub fn is_core(self) -> bool {
        matches!(self, Consumer::Core)
    }
}

impl fmt::Display for Consumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Consumer::Core => write!(f, "Core"),
            Consumer::Vertex(v) => write!(f, "{}", v),
        }
    }
}

/// How the producer relates to the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKind {
    Normal,
    /// The producer drives repeated invocation of the consumer.
    LoopManager,
}

/// One outstanding requirement.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub requirement: Requirement,
    pub consumer: Consumer,
    pub kind: DependencyKind,
    /// Register the producer as a printed output.
    pub print_me: bool,
    /// Index into the output requests, for entries seeded by the Core.
    pub request_index: Option<usize>,
}

impl QueueEntry {
    pub fn output(requirement: Requirement, print_me: bool, request_index: usize) -> Self {
        Self {
            requirement,
            consumer: Consumer::Core,
            kind: DependencyKind::Normal,
            print_me,
            request_index: Some(request_index),
        }
    }

    pub fn dependency(requirement: Requirement, consumer: VertexId) -> Self {
        Self {
            requirement,
            consumer: Consumer::Vertex(consumer),
            kind: DependencyKind::Normal,
            print_me: false,
            request_index: None,
        }
    }

    /// Loop-manager entries always use the wildcard type.
    pub fn loop_manager(capability: impl Into<String>, consumer: VertexId) -> Self {
        Self {
            requirement: Requirement::new(capability, ""),
            consumer: Consumer::Vertex(consumer),
            kind: DependencyKind::LoopManager,
            print_me: false,
            request_index: None,
        }
    }
}

/// FIFO of outstanding requirements.
#[derive(Debug, Default)]
pub struct RequirementQueue {
    entries: VecDeque<QueueEntry>,
}

impl RequirementQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: QueueEntry) {
        self.entries.push_back(entry);
    }

    pub fn pop(&mut self) -> Option<QueueEntry> {
        self.entries.pop_front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
