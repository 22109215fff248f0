//! Domain resolution: from an ordered list of variable ids to their bounds.

use std::collections::{BTreeMap, BTreeSet};

use crate::errors::{EngineError, ErrorInfo};
use crate::types::{Bounds, Variable, VariableId};

/// Ordered set of bounded dimensions resolved for a single engine call.
#[derive(Debug, Clone, PartialEq)]
pub struct Domain {
    order: Vec<VariableId>,
    bounds: BTreeMap<VariableId, Bounds>,
}

/// Serialisable snapshot of a domain keyed by the identifier's string form.
pub type DomainSnapshot = BTreeMap<VariableId, Bounds>;

impl Domain {
    /// Builds a domain from ordered `(id, bounds)` pairs.
    ///
    /// Callers outside the registry should prefer [`DomainRegistry::resolve`],
    /// which enforces the uniqueness and boundedness invariants.
    pub fn from_entries(entries: Vec<(VariableId, Bounds)>) -> Self {
        let order = entries.iter().map(|(id, _)| *id).collect();
        let bounds = entries.into_iter().collect();
        Self { order, bounds }
    }

    /// Variable identifiers in request order.
    pub fn ids(&self) -> &[VariableId] {
        &self.order
    }

    /// Number of dimensions.
    pub fn dimensions(&self) -> usize {
        self.order.len()
    }

    /// Bounds of the given variable, if it belongs to the domain.
    pub fn bounds(&self, id: VariableId) -> Option<&Bounds> {
        self.bounds.get(&id)
    }

    /// Whether the variable belongs to the domain.
    pub fn contains(&self, id: VariableId) -> bool {
        self.bounds.contains_key(&id)
    }

    /// Iterates `(id, bounds)` in request order.
    pub fn iter(&self) -> impl Iterator<Item = (VariableId, &Bounds)> + '_ {
        self.order
            .iter()
            .filter_map(move |id| self.bounds.get(id).map(|b| (*id, b)))
    }

    /// Returns the serialisable snapshot used in result metadata.
    pub fn snapshot(&self) -> DomainSnapshot {
        self.bounds.clone()
    }
}

/// Read-only view over the variable catalog.
///
/// The registry is the sole source of truth for bounds; engines only ever
/// consume the [`Domain`] it resolves.
pub trait DomainRegistry: Send + Sync {
    /// Looks up a single active variable.
    fn variable(&self, id: VariableId) -> Option<Variable>;

    /// Resolves an ordered, duplicate-free list of identifiers to a domain.
    fn resolve(&self, ids: &[VariableId]) -> Result<Domain, EngineError> {
        resolve_with(ids, |id| self.variable(id))
    }
}

/// Shared resolution rule used by every [`DomainRegistry`] implementation.
pub fn resolve_with<F>(ids: &[VariableId], lookup: F) -> Result<Domain, EngineError>
where
    F: Fn(VariableId) -> Option<Variable>,
{
    if ids.is_empty() {
        return Err(EngineError::Domain(
            ErrorInfo::new("domain.empty", "at least one variable id is required")
                .with_hint("select one or more variables"),
        ));
    }
    let mut seen = BTreeSet::new();
    let duplicates: Vec<VariableId> = ids.iter().filter(|id| !seen.insert(**id)).copied().collect();
    if !duplicates.is_empty() {
        return Err(EngineError::Domain(
            ErrorInfo::new("domain.duplicate", "variable_ids must be unique")
                .with_context("duplicate_variable_ids", join_ids(&duplicates)),
        ));
    }

    let mut missing = Vec::new();
    let mut unsafe_ids = Vec::new();
    let mut entries = Vec::with_capacity(ids.len());
    for id in ids {
        match lookup(*id) {
            None => missing.push(*id),
            Some(variable) => match variable.bounds() {
                Some(bounds) => entries.push((*id, bounds)),
                None => unsafe_ids.push(*id),
            },
        }
    }
    if !missing.is_empty() {
        return Err(EngineError::Domain(
            ErrorInfo::new("domain.unknown", "unknown or inactive variable ids")
                .with_context("missing_variable_ids", join_ids(&missing)),
        ));
    }
    if !unsafe_ids.is_empty() {
        return Err(EngineError::Domain(
            ErrorInfo::new("domain.unbounded", "min and max are required and must satisfy min < max")
                .with_context("unsafe_variable_ids", join_ids(&unsafe_ids)),
        ));
    }
    Ok(Domain::from_entries(entries))
}

fn join_ids(ids: &[VariableId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
