//! Backend requirement resolution.
//!
//! Backend functions never become graph vertices. A newly activated module
//! function has each of its backend requirements bound to exactly one
//! enabled backend function. Disabled backends that would have matched are
//! reported separately so a missing library is distinguishable from a
//! missing function.

use crate::config::{find_entry_for_requirement, ConfigEntry};
use crate::resolver::error::{ResolutionError, ResolutionResult};
use crate::resolver::id::{BackendId, VertexId};
use crate::resolver::node::{Functor, Requirement};
use crate::resolver::queue::Consumer;
use crate::resolver::registry::Registry;
use tracing::debug;

/// `origin::name (version)`, the form used for backend candidate lists.
fn backend_label(node: &dyn Functor) -> String {
    format!("{} ({})", node.label(), node.version())
}

/// Bind every backend requirement of `vertex`.
///
/// `aux` is the auxiliary configuration entry describing `vertex`, whose
/// `backends` sub-entries act as filters.
pub fn resolve_backends(
    registry: &Registry,
    vertex: VertexId,
    aux: Option<&ConfigEntry>,
) -> ResolutionResult<Vec<(Requirement, BackendId)>> {
    let node = registry
        .module(vertex)
        .ok_or_else(|| ResolutionError::UnknownVertex(vertex.to_string()))?;

    let mut bindings = Vec::with_capacity(node.backend_requirements().len());
    for requirement in node.backend_requirements() {
        let filter = match aux {
            Some(entry) => find_entry_for_requirement(requirement, &entry.backends)?,
            None => None,
        };
        let backend = resolve_one(registry, vertex, requirement, filter)?;
        debug!(
            "Backend requirement {} of {} resolved by {}",
            requirement,
            node.label(),
            backend_label(&registry[backend])
        );
        bindings.push((requirement.clone(), backend));
    }
    Ok(bindings)
}

fn resolve_one(
    registry: &Registry,
    vertex: VertexId,
    requirement: &Requirement,
    filter: Option<&ConfigEntry>,
) -> ResolutionResult<BackendId> {
    let mut enabled = Vec::new();
    let mut disabled = Vec::new();

    for (id, backend) in registry.backends() {
        let matches = backend.capability() == requirement.capability
            && backend.result_type() == requirement.result_type
            && filter.map_or(true, |entry| entry.matches_backend(backend));
        if !matches {
            continue;
        }
        if backend.status().is_available() {
            enabled.push(id);
        } else {
            disabled.push(backend_label(backend));
        }
    }

    match enabled.as_slice() {
        [single] => Ok(*single),
        [] => Err(ResolutionError::BackendUnresolved {
            requirement: requirement.clone(),
            consumer: Consumer::Vertex(vertex),
            consumer_label: registry.label(vertex),
            disabled,
        }),
        many => Err(ResolutionError::BackendAmbiguous {
            requirement: requirement.clone(),
            consumer: Consumer::Vertex(vertex),
            consumer_label: registry.label(vertex),
            candidates: many.iter().map(|&b| backend_label(&registry[b])).collect(),
        }),
    }
}
