//! Compatibility filter.
//!
//! Runs once before graph construction, and again whenever the active model
//! set changes. Every module function is first disabled; each active model
//! then switches on the functions that may run under it or one of its
//! ancestors.

use crate::models::ModelHierarchy;
use crate::resolver::error::{ResolutionError, ResolutionResult};
use crate::resolver::node::{ActivationStatus, Functor};
use crate::resolver::registry::Registry;
use tracing::debug;

/// Apply the active model set to the module pool.
///
/// Every active model must be declared in `hierarchy`. Returns the number of
/// eligible module functions.
pub fn filter(
    registry: &mut Registry,
    hierarchy: &ModelHierarchy,
    active_models: &[String],
) -> ResolutionResult<usize> {
    if let Some(unknown) = active_models.iter().find(|m| !hierarchy.contains(m)) {
        return Err(ResolutionError::UnknownModel(unknown.clone()));
    }

    for node in registry.modules_mut() {
        node.set_status(ActivationStatus::Disabled);
    }

    for model in active_models {
        let mut switched_on = 0usize;
        for node in registry.modules_mut() {
            if node.model_allowed(model, hierarchy) {
                node.set_status(ActivationStatus::Eligible);
                node.notify_of_model(model);
                switched_on += 1;
            }
        }
        debug!("Model {} enables {} module functions", model, switched_on);
    }

    Ok(registry
        .modules()
        .filter(|(_, node)| node.status().is_available())
        .count())
}
