use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use vspace_core::serde::fingerprint;
use vspace_core::{EngineError, ErrorInfo};

/// Default page size of [`RunQuery`].
pub const DEFAULT_LIMIT: usize = 50;
/// Largest accepted page size.
pub const MAX_LIMIT: usize = 500;

/// Store-assigned run identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(i64);

impl RunId {
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    pub fn as_raw(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of engine call a run records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunType {
    Doe,
    Optimize,
}

impl RunType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunType::Doe => "doe",
            RunType::Optimize => "optimize",
        }
    }
}

impl fmt::Display for RunType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunType {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "doe" => Ok(RunType::Doe),
            "optimize" => Ok(RunType::Optimize),
            other => Err(EngineError::Validation(
                ErrorInfo::new("runs.run_type", "run_type must be doe or optimize")
                    .with_context("run_type", other),
            )),
        }
    }
}

/// Payload accepted by [`crate::RunStore::create`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRun {
    pub run_type: RunType,
    #[serde(default)]
    pub title: Option<String>,
    pub request_json: Value,
    pub response_json: Value,
}

impl NewRun {
    pub fn new(run_type: RunType, request_json: Value, response_json: Value) -> Self {
        Self {
            run_type,
            title: None,
            request_json,
            response_json,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Fingerprint of the request; equal requests hash equal whatever their
    /// key order.
    pub fn request_hash(&self) -> Result<String, EngineError> {
        fingerprint(&self.request_json)
    }

    /// The explicit title, or one derived from the request
    /// (`DOE sobol · 20 points`, `Optimize random · 30 iterations`).
    pub fn resolved_title(&self) -> String {
        if let Some(title) = self.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            return title.to_string();
        }
        let method = self.request_json.get("method").and_then(Value::as_str);
        let count = |field: &str, default: u64| {
            self.request_json
                .get(field)
                .and_then(Value::as_u64)
                .unwrap_or(default)
        };
        match self.run_type {
            RunType::Doe => format!(
                "DOE {} · {} points",
                method.unwrap_or("sobol"),
                count("n_points", 20)
            ),
            RunType::Optimize => format!(
                "Optimize {} · {} iterations",
                method.unwrap_or("random"),
                count("n_iter", 30)
            ),
        }
    }
}

/// Immutable record of one engine call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    pub run_type: RunType,
    pub title: String,
    pub request_json: Value,
    pub response_json: Value,
    /// SHA-256 of the canonical request; a replay shares its source's hash.
    pub request_hash: String,
    /// RFC 3339 UTC timestamp with microsecond precision.
    pub created_at: String,
}

impl Run {
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            id: self.id,
            run_type: self.run_type,
            title: self.title.clone(),
            request_hash: self.request_hash.clone(),
            created_at: self.created_at.clone(),
        }
    }
}

/// Listing entry without payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub id: RunId,
    pub run_type: RunType,
    pub title: String,
    pub request_hash: String,
    pub created_at: String,
}

/// Listing filter and window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunQuery {
    #[serde(default)]
    pub run_type: Option<RunType>,
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "RunQuery::default_limit")]
    pub limit: usize,
}

impl Default for RunQuery {
    fn default() -> Self {
        Self {
            run_type: None,
            skip: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl RunQuery {
    const fn default_limit() -> usize {
        DEFAULT_LIMIT
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    /// Rejects page sizes outside `[1, MAX_LIMIT]`.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.limit == 0 || self.limit > MAX_LIMIT {
            return Err(EngineError::Validation(
                ErrorInfo::new("runs.limit", format!("limit must lie in [1, {MAX_LIMIT}]"))
                    .with_context("limit", self.limit.to_string()),
            ));
        }
        Ok(())
    }
}

/// One window of a listing, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunPage {
    pub items: Vec<RunSummary>,
    /// Matching runs before windowing.
    pub total: usize,
    pub skip: usize,
    pub limit: usize,
}

pub(crate) fn not_found(id: RunId) -> EngineError {
    EngineError::NotFound(
        ErrorInfo::new("runs.not_found", "run not found").with_context("id", id.to_string()),
    )
}
