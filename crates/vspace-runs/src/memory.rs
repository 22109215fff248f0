use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use vspace_core::EngineError;

use crate::model::{not_found, NewRun, Run, RunId, RunPage, RunQuery};
use crate::store::{timestamp, RunStore};

/// Process-local [`RunStore`] for tests and ephemeral servers.
#[derive(Default)]
pub struct MemoryRunStore {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    last_id: i64,
    runs: BTreeMap<RunId, Run>,
}

impl MemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, EngineError> {
        self.state
            .lock()
            .map_err(|_| EngineError::persistence("runs.lock", "run store lock poisoned"))
    }
}

impl RunStore for MemoryRunStore {
    fn create(&self, run: NewRun) -> Result<Run, EngineError> {
        let request_hash = run.request_hash()?;
        let mut state = self.lock()?;
        state.last_id += 1;
        let stored = Run {
            id: RunId::from_raw(state.last_id),
            run_type: run.run_type,
            title: run.resolved_title(),
            request_hash,
            request_json: run.request_json,
            response_json: run.response_json,
            created_at: timestamp(),
        };
        state.runs.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn list(&self, query: &RunQuery) -> Result<RunPage, EngineError> {
        query.validate()?;
        let state = self.lock()?;
        let mut matching: Vec<&Run> = state
            .runs
            .values()
            .filter(|run| query.run_type.map_or(true, |t| run.run_type == t))
            .collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(RunPage {
            total: matching.len(),
            items: matching
                .into_iter()
                .skip(query.skip)
                .take(query.limit)
                .map(Run::summary)
                .collect(),
            skip: query.skip,
            limit: query.limit,
        })
    }

    fn get(&self, id: RunId) -> Result<Run, EngineError> {
        self.lock()?.runs.get(&id).cloned().ok_or_else(|| not_found(id))
    }

    fn delete(&self, id: RunId) -> Result<(), EngineError> {
        self.lock()?
            .runs
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found(id))
    }
}
