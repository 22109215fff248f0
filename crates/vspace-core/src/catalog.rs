//! File-backed variable catalog implementing [`DomainRegistry`].

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::DomainRegistry;
use crate::errors::{EngineError, ErrorInfo};
use crate::types::{Variable, VariableId};

/// On-disk catalog layout (`variables: [...]`), YAML or JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    /// Catalog entries.
    #[serde(default)]
    pub variables: Vec<Variable>,
}

/// In-memory registry built from a validated catalog.
#[derive(Debug, Clone, Default)]
pub struct CatalogRegistry {
    variables: BTreeMap<VariableId, Variable>,
}

impl CatalogRegistry {
    /// Builds a registry after validating every entry.
    pub fn new(variables: Vec<Variable>) -> Result<Self, EngineError> {
        let mut names = BTreeSet::new();
        let mut map = BTreeMap::new();
        for variable in variables {
            validate_variable(&variable)?;
            if !names.insert(variable.name.clone()) {
                return Err(EngineError::Validation(
                    catalog_error("catalog.duplicate_name", "variable names must be unique")
                        .with_context("name", variable.name.clone()),
                ));
            }
            let id = variable.id;
            if map.insert(id, variable).is_some() {
                return Err(EngineError::Validation(
                    catalog_error("catalog.duplicate_id", "variable ids must be unique")
                        .with_context("id", id.to_string()),
                ));
            }
        }
        Ok(Self { variables: map })
    }

    /// Loads a catalog from a `.yaml`/`.yml` or `.json` file.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let text = fs::read_to_string(path).map_err(|err| {
            EngineError::Serde(
                ErrorInfo::new("catalog.read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        let file: CatalogFile = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&text).map_err(|err| {
                EngineError::Serde(ErrorInfo::new("catalog.parse", err.to_string()))
            })?,
            _ => serde_yaml::from_str(&text).map_err(|err| {
                EngineError::Serde(ErrorInfo::new("catalog.parse", err.to_string()))
            })?,
        };
        let registry = Self::new(file.variables)?;
        debug!(
            path = %path.display(),
            variables = registry.len(),
            "loaded variable catalog"
        );
        Ok(registry)
    }

    /// Number of catalog entries, active or not.
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Whether the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

impl DomainRegistry for CatalogRegistry {
    fn variable(&self, id: VariableId) -> Option<Variable> {
        self.variables
            .get(&id)
            .filter(|variable| variable.active)
            .cloned()
    }
}

fn validate_variable(variable: &Variable) -> Result<(), EngineError> {
    let id = variable.id.to_string();
    if variable.name.trim().is_empty() {
        return Err(EngineError::Validation(
            catalog_error("catalog.name", "variable name must not be empty").with_context("id", id),
        ));
    }
    if !(0.0..=1.0).contains(&variable.confidence) {
        return Err(EngineError::Validation(
            catalog_error("catalog.confidence", "confidence must lie in [0, 1]")
                .with_context("id", id)
                .with_context("confidence", variable.confidence.to_string()),
        ));
    }
    if let (Some(min), Some(max)) = (variable.min, variable.max) {
        if !(min < max) {
            return Err(EngineError::Validation(
                catalog_error("catalog.bounds", "min must be strictly below max")
                    .with_context("id", id)
                    .with_context("min", min.to_string())
                    .with_context("max", max.to_string()),
            ));
        }
    }
    Ok(())
}

fn catalog_error(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_inverted_bounds() {
        let err = CatalogRegistry::new(vec![Variable::bounded(1, "x", 2.0, 1.0)]).unwrap_err();
        assert_eq!(err.info().code, "catalog.bounds");
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = CatalogRegistry::new(vec![
            Variable::bounded(1, "x", 0.0, 1.0),
            Variable::bounded(1, "y", 0.0, 1.0),
        ])
        .unwrap_err();
        assert_eq!(err.info().code, "catalog.duplicate_id");
    }

    #[test]
    fn inactive_variables_are_hidden() {
        let mut hidden = Variable::bounded(2, "hidden", 0.0, 1.0);
        hidden.active = false;
        let registry =
            CatalogRegistry::new(vec![Variable::bounded(1, "x", 0.0, 1.0), hidden]).unwrap();
        assert!(registry.variable(VariableId::from_raw(1)).is_some());
        assert!(registry.variable(VariableId::from_raw(2)).is_none());
        assert_eq!(registry.len(), 2);
    }
}
