//! Capability resolver.
//!
//! Picks the unique module function that satisfies one requirement of one
//! consumer. The rules, applied in order:
//!
//! 1. Eligible or activated functions providing the requirement
//!    (exact capability, exact type unless the requested type is empty).
//! 2. A configuration filter, when present, must match every given field.
//! 3. `PointInit` can only be satisfied from the consumer's own module.
//! 4. Several survivors: prefer functions tied to the scanned model, walking
//!    its ancestry one generation at a time.
//! 5. Exactly one must remain.

use crate::config::{ConfigEntry, ResolutionSettings};
use crate::models::ModelHierarchy;
use crate::resolver::error::{ResolutionError, ResolutionResult};
use crate::resolver::id::VertexId;
use crate::resolver::node::{Functor, Requirement, POINT_INIT_CAPABILITY};
use crate::resolver::queue::Consumer;
use crate::resolver::registry::Registry;
use std::collections::HashSet;
use tracing::{debug, trace};

/// Read-only view of everything a single resolution depends on.
pub struct CapabilityResolver<'a> {
    registry: &'a Registry,
    hierarchy: &'a ModelHierarchy,
    active_models: &'a [String],
    settings: &'a ResolutionSettings,
}

impl<'a> CapabilityResolver<'a> {
    pub fn new(
        registry: &'a Registry,
        hierarchy: &'a ModelHierarchy,
        active_models: &'a [String],
        settings: &'a ResolutionSettings,
    ) -> Self {
        Self {
            registry,
            hierarchy,
            active_models,
            settings,
        }
    }

    /// Label used for `consumer` in diagnostics.
    pub fn consumer_label(&self, consumer: Consumer) -> String {
        match consumer {
            Consumer::Core => "Core".to_string(),
            Consumer::Vertex(v) => self.registry.label(v),
        }
    }

    /// Available module functions matching the requirement and the filter,
    /// in registration order.
    pub fn candidates(
        &self,
        requirement: &Requirement,
        consumer: Consumer,
        filter: Option<&ConfigEntry>,
    ) -> Vec<VertexId> {
        let consumer_origin = consumer
            .vertex()
            .and_then(|v| self.registry.module(v))
            .map(|node| node.origin().to_string());

        self.registry
            .modules()
            .filter(|(_, node)| node.status().is_available())
            .filter(|(_, node)| node.provides(requirement))
            .filter(|(_, node)| filter.map_or(true, |entry| entry.matches_functor(*node)))
            .filter(|(_, node)| {
                requirement.capability != POINT_INIT_CAPABILITY
                    || consumer_origin
                        .as_deref()
                        .map_or(true, |origin| node.origin() == origin)
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// Resolve `requirement` for `consumer` to exactly one vertex.
    pub fn resolve(
        &self,
        requirement: &Requirement,
        consumer: Consumer,
        filter: Option<&ConfigEntry>,
    ) -> ResolutionResult<VertexId> {
        let mut candidates = self.candidates(requirement, consumer, filter);
        trace!(
            "{} candidates for {} required by {}",
            candidates.len(),
            requirement,
            consumer
        );

        if candidates.is_empty() {
            return Err(ResolutionError::UnresolvedCapability {
                requirement: requirement.clone(),
                consumer,
                consumer_label: self.consumer_label(consumer),
            });
        }

        if candidates.len() > 1 && self.settings.prefer_model_specific_functions {
            candidates = self.prefer_model_specific(candidates, requirement, consumer)?;
        }

        if candidates.len() > 1 {
            let hint = if self.settings.prefer_model_specific_functions {
                String::new()
            } else {
                " (consider turning on prefer_model_specific_functions)".to_string()
            };
            return Err(ResolutionError::AmbiguousCapability {
                requirement: requirement.clone(),
                consumer,
                consumer_label: self.consumer_label(consumer),
                candidates: self.labels(&candidates),
                hint,
            });
        }

        Ok(candidates[0])
    }

    /// Walk up the active models' ancestry one generation at a time and keep
    /// the candidates explicitly tied to the first generation that has any.
    fn prefer_model_specific(
        &self,
        candidates: Vec<VertexId>,
        requirement: &Requirement,
        consumer: Consumer,
    ) -> ResolutionResult<Vec<VertexId>> {
        let mut generation: Vec<String> = self.active_models.to_vec();
        let mut seen: HashSet<String> = generation.iter().cloned().collect();

        while !generation.is_empty() {
            let narrowed: Vec<VertexId> = candidates
                .iter()
                .copied()
                .filter(|&c| {
                    generation
                        .iter()
                        .any(|m| self.registry[c].model_explicitly_allowed(m))
                })
                .collect();

            if !narrowed.is_empty() {
                debug!(
                    "Model-specific preference narrowed {} candidates to {} for {}",
                    candidates.len(),
                    narrowed.len(),
                    requirement
                );
                return Ok(narrowed);
            }

            let mut next = Vec::new();
            for model in &generation {
                match self.hierarchy.parents(model) {
                    [] => {}
                    [parent] => {
                        if seen.insert(parent.clone()) {
                            next.push(parent.clone());
                        }
                    }
                    parents => {
                        return Err(ResolutionError::MultiParentModelAmbiguity {
                            model: model.clone(),
                            parents: parents.to_vec(),
                            requirement: requirement.clone(),
                            consumer,
                            consumer_label: self.consumer_label(consumer),
                        });
                    }
                }
            }
            generation = next;
        }

        if self.settings.strict_model_ancestry {
            return Err(ResolutionError::ModelAncestryExhausted {
                requirement: requirement.clone(),
                consumer,
                consumer_label: self.consumer_label(consumer),
                candidates: self.labels(&candidates),
            });
        }
        Ok(candidates)
    }

    fn labels(&self, candidates: &[VertexId]) -> Vec<String> {
        candidates.iter().map(|&c| self.registry.label(c)).collect()
    }
}
