use chrono::{SecondsFormat, Utc};
use vspace_core::EngineError;

use crate::model::{NewRun, Run, RunId, RunPage, RunQuery};

/// Persistence for run records. Every operation is atomic on one record.
pub trait RunStore: Send + Sync {
    /// Assigns an identifier and timestamp and stores the run.
    fn create(&self, run: NewRun) -> Result<Run, EngineError>;

    /// Lists runs newest first (`created_at` desc, then id desc).
    fn list(&self, query: &RunQuery) -> Result<RunPage, EngineError>;

    /// Fetches one run, `NotFound` when absent.
    fn get(&self, id: RunId) -> Result<Run, EngineError>;

    /// Deletes one run, `NotFound` when absent.
    fn delete(&self, id: RunId) -> Result<(), EngineError>;
}

/// Current time in the stored timestamp format.
pub(crate) fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
