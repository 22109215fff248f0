use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use vspace_core::{EngineError, ErrorInfo};
use vspace_runs::{MemoryRunStore, RunStore, SqliteRunStore, DEFAULT_LIMIT, MAX_LIMIT};

/// Log line format of the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Service configuration, read from YAML. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Listen address of the HTTP server.
    pub bind: SocketAddr,
    /// SQLite run database. Runs stay in memory when unset.
    pub database: Option<PathBuf>,
    /// Variable catalog file (`.yaml`, `.yml` or `.json`).
    pub catalog: PathBuf,
    /// Record every DOE and optimize call as a run.
    pub record_runs: bool,
    /// Serve template insights.
    pub insight: bool,
    /// Page size of run listings when the caller gives none.
    pub list_limit: usize,
    pub log_format: LogFormat,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8000)),
            database: None,
            catalog: PathBuf::from("catalog.yaml"),
            record_runs: true,
            insight: true,
            list_limit: DEFAULT_LIMIT,
            log_format: LogFormat::Text,
        }
    }
}

impl ServiceConfig {
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let text = fs::read_to_string(path).map_err(|err| {
            EngineError::Validation(
                ErrorInfo::new("config.read", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        let config: Self = serde_yaml::from_str(&text).map_err(|err| {
            EngineError::Validation(
                ErrorInfo::new("config.parse", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })?;
        config.validate()?;
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.list_limit == 0 || self.list_limit > MAX_LIMIT {
            return Err(EngineError::Validation(
                ErrorInfo::new("config.list_limit", format!("list_limit must lie in [1, {MAX_LIMIT}]"))
                    .with_context("list_limit", self.list_limit.to_string()),
            ));
        }
        Ok(())
    }

    /// Opens the configured run store without touching the catalog.
    pub fn open_store(&self) -> Result<Arc<dyn RunStore>, EngineError> {
        Ok(match &self.database {
            Some(path) => Arc::new(SqliteRunStore::open(path)?),
            None => Arc::new(MemoryRunStore::new()),
        })
    }
}
