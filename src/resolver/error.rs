//! Resolver-specific error types.
//!
//! Every error is fatal: resolution is all-or-nothing per configuration and
//! no partial plan is usable after one of these is raised.

use crate::resolver::node::Requirement;
use crate::resolver::queue::Consumer;
use thiserror::Error;

/// Errors that can occur while resolving a dependency graph.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolutionError {
    #[error(
        "No module function provides {requirement} required by {consumer_label}; \
         check the configuration for typos and the modules for consistency"
    )]
    UnresolvedCapability {
        requirement: Requirement,
        consumer: Consumer,
        consumer_label: String,
    },

    #[error(
        "Too many module functions provide {requirement} required by {consumer_label}{hint}; \
         candidates: {}",
        .candidates.join(", ")
    )]
    AmbiguousCapability {
        requirement: Requirement,
        consumer: Consumer,
        consumer_label: String,
        candidates: Vec<String>,
        /// Extra advice appended when model-specific preference is switched off.
        hint: String,
    },

    #[error(
        "{consumer_label} needs loop manager {requirement}, but {producer} is not declared \
         as a loop manager"
    )]
    InvalidLoopManager {
        requirement: Requirement,
        consumer: Consumer,
        consumer_label: String,
        producer: String,
    },

    #[error("Cycle detected in dependency graph among: {}", .remaining.join(", "))]
    CyclicDependency { remaining: Vec<String> },

    #[error(
        "Model {model} has multiple parents ({}); model-specific preference cannot be \
         applied while resolving {requirement} for {consumer_label}. Specify the dependency \
         more fully in the configuration",
        .parents.join(", ")
    )]
    MultiParentModelAmbiguity {
        model: String,
        parents: Vec<String>,
        requirement: Requirement,
        consumer: Consumer,
        consumer_label: String,
    },

    #[error(
        "No model-specific function provides {requirement} for {consumer_label} anywhere in \
         the active model ancestry; candidates: {}",
        .candidates.join(", ")
    )]
    ModelAncestryExhausted {
        requirement: Requirement,
        consumer: Consumer,
        consumer_label: String,
        candidates: Vec<String>,
    },

    #[error(
        "No backend function provides {requirement} for {consumer_label}{}",
        disabled_note(.disabled)
    )]
    BackendUnresolved {
        requirement: Requirement,
        consumer: Consumer,
        consumer_label: String,
        /// Matching backends whose library failed to load.
        disabled: Vec<String>,
    },

    #[error(
        "Too many backend functions provide {requirement} for {consumer_label}; candidates: {}",
        .candidates.join(", ")
    )]
    BackendAmbiguous {
        requirement: Requirement,
        consumer: Consumer,
        consumer_label: String,
        candidates: Vec<String>,
    },

    #[error("Multiple configuration entries match {subject}")]
    DuplicateConfigEntry { subject: String },

    #[error("Active model {0} is not declared in the model hierarchy")]
    UnknownModel(String),

    #[error("Vertex {0} is not part of the registry")]
    UnknownVertex(String),
}

fn disabled_note(disabled: &[String]) -> String {
    if disabled.is_empty() {
        String::new()
    } else {
        format!(
            ". Viable candidates exist but have been disabled: {}. Check that the shared \
             libraries for these backends exist and export the required symbols",
            disabled.join(", ")
        )
    }
}

impl ResolutionError {
    /// The requirement the error is about, where there is one.
    pub fn requirement(&self) -> Option<&Requirement> {
        match self {
            ResolutionError::UnresolvedCapability { requirement, .. }
            | ResolutionError::AmbiguousCapability { requirement, .. }
            | ResolutionError::InvalidLoopManager { requirement, .. }
            | ResolutionError::MultiParentModelAmbiguity { requirement, .. }
            | ResolutionError::ModelAncestryExhausted { requirement, .. }
            | ResolutionError::BackendUnresolved { requirement, .. }
            | ResolutionError::BackendAmbiguous { requirement, .. } => Some(requirement),
            _ => None,
        }
    }

    /// The consumer the error is about, where there is one.
    pub fn consumer(&self) -> Option<Consumer> {
        match self {
            ResolutionError::UnresolvedCapability { consumer, .. }
            | ResolutionError::AmbiguousCapability { consumer, .. }
            | ResolutionError::InvalidLoopManager { consumer, .. }
            | ResolutionError::MultiParentModelAmbiguity { consumer, .. }
            | ResolutionError::ModelAncestryExhausted { consumer, .. }
            | ResolutionError::BackendUnresolved { consumer, .. }
            | ResolutionError::BackendAmbiguous { consumer, .. } => Some(*consumer),
            _ => None,
        }
    }
}

pub type ResolutionResult<T> = std::result::Result<T, ResolutionError>;
