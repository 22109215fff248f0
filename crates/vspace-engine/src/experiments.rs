use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};
use vspace_core::serde::{from_json_value, to_json_value};
use vspace_core::{CatalogRegistry, DomainRegistry, EngineError, ErrorInfo, Insight};
use vspace_doe::{DoeRequest, DoeResult};
use vspace_opt::{OptimizeRequest, OptimizeResult};
use vspace_runs::{NewRun, Run, RunId, RunPage, RunQuery, RunStore, RunType};

use crate::config::ServiceConfig;
use crate::insight::{
    DoeDigest, InsightProvider, OptimizeDigest, OptimizeMetaDigest, TemplateInsight,
};
use crate::recorder::{PersistTicket, RunRecorder};

/// A computed result plus the non-fatal side effects attached to it.
#[derive(Debug)]
pub struct Outcome<T> {
    pub result: T,
    /// Why the requested insight is missing, if it is.
    pub insight_error: Option<EngineError>,
    /// Pending write of the run, when recording is enabled.
    pub persist: Option<PersistTicket>,
}

/// Entry point tying the engines to insight, persistence and replay.
#[derive(Clone)]
pub struct Experiments {
    registry: Arc<dyn DomainRegistry>,
    store: Arc<dyn RunStore>,
    insight: Option<Arc<dyn InsightProvider>>,
    recorder: Option<RunRecorder>,
}

impl Experiments {
    pub fn new(registry: Arc<dyn DomainRegistry>, store: Arc<dyn RunStore>) -> Self {
        Self {
            registry,
            store,
            insight: None,
            recorder: None,
        }
    }

    /// Builds the engine a service configuration describes: catalog, run
    /// store, insight provider and, with `record_runs`, a recorder task on
    /// the current tokio runtime.
    pub fn from_config(
        config: &ServiceConfig,
    ) -> Result<(Self, Option<JoinHandle<()>>), EngineError> {
        let registry = Arc::new(CatalogRegistry::load(&config.catalog)?);
        let store = config.open_store()?;
        let mut experiments = Self::new(registry, Arc::clone(&store));
        if config.insight {
            experiments = experiments.with_insight(Arc::new(TemplateInsight));
        }
        let mut task = None;
        if config.record_runs {
            let (recorder, handle) = RunRecorder::spawn(store);
            experiments = experiments.with_recorder(recorder);
            task = Some(handle);
        }
        info!(
            catalog = %config.catalog.display(),
            persistent = config.database.is_some(),
            record_runs = config.record_runs,
            insight = config.insight,
            "experiment engine ready"
        );
        Ok((experiments, task))
    }

    pub fn with_insight(mut self, provider: Arc<dyn InsightProvider>) -> Self {
        self.insight = Some(provider);
        self
    }

    /// Records every successful DOE and optimize call through `recorder`.
    pub fn with_recorder(mut self, recorder: RunRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn registry(&self) -> &dyn DomainRegistry {
        self.registry.as_ref()
    }

    pub fn store(&self) -> &dyn RunStore {
        self.store.as_ref()
    }

    #[instrument(skip_all)]
    pub fn doe(&self, request: DoeRequest) -> Result<Outcome<DoeResult>, EngineError> {
        let (result, insight_error) = self.compute_doe(&request)?;
        let persist = self.record(RunType::Doe, &request, &result);
        Ok(Outcome {
            result,
            insight_error,
            persist,
        })
    }

    #[instrument(skip_all)]
    pub fn optimize(
        &self,
        request: OptimizeRequest,
    ) -> Result<Outcome<OptimizeResult>, EngineError> {
        let (result, insight_error) = self.compute_optimize(&request)?;
        let persist = self.record(RunType::Optimize, &request, &result);
        Ok(Outcome {
            result,
            insight_error,
            persist,
        })
    }

    pub fn doe_insight(&self, digest: &DoeDigest) -> Result<Insight, EngineError> {
        self.provider()?.summarize_doe(digest)
    }

    pub fn optimize_insight(&self, digest: &OptimizeDigest) -> Result<Insight, EngineError> {
        self.provider()?.summarize_optimize(digest)
    }

    pub fn create_run(&self, run: NewRun) -> Result<Run, EngineError> {
        self.store.create(run)
    }

    pub fn list_runs(&self, query: &RunQuery) -> Result<RunPage, EngineError> {
        self.store.list(query)
    }

    pub fn get_run(&self, id: RunId) -> Result<Run, EngineError> {
        self.store.get(id)
    }

    pub fn delete_run(&self, id: RunId) -> Result<(), EngineError> {
        self.store.delete(id)
    }

    /// Re-executes a stored request and stores the fresh response as a new
    /// run. The original run is left untouched.
    #[instrument(skip_all, fields(id = %id))]
    pub fn replay(&self, id: RunId) -> Result<Run, EngineError> {
        let original = self.store.get(id)?;
        let title = format!("Replay of run #{id}");
        let response = match original.run_type {
            RunType::Doe => {
                let request: DoeRequest = decode_stored(&original)?;
                to_json_value(&self.compute_doe(&request)?.0)?
            }
            RunType::Optimize => {
                let request: OptimizeRequest = decode_stored(&original)?;
                to_json_value(&self.compute_optimize(&request)?.0)?
            }
        };
        // The request is kept verbatim so the replay shares its request_hash.
        let new_run = NewRun::new(original.run_type, original.request_json, response);
        let run = self.store.create(new_run.with_title(title))?;
        info!(replayed = %run.id, request_hash = %run.request_hash, "run replayed");
        Ok(run)
    }

    fn compute_doe(
        &self,
        request: &DoeRequest,
    ) -> Result<(DoeResult, Option<EngineError>), EngineError> {
        let mut result = vspace_doe::generate(self.registry.as_ref(), request)?;
        let mut insight_error = None;
        if request.include_insight {
            let digest = DoeDigest {
                variable_ids: result.variable_ids.clone(),
                points: result.points.clone(),
            };
            match self.doe_insight(&digest) {
                Ok(insight) => result.insight = Some(insight),
                Err(err) => insight_error = Some(upstream(err)),
            }
        }
        Ok((result, insight_error))
    }

    fn compute_optimize(
        &self,
        request: &OptimizeRequest,
    ) -> Result<(OptimizeResult, Option<EngineError>), EngineError> {
        let mut result = vspace_opt::optimize(self.registry.as_ref(), request)?;
        let mut insight_error = None;
        if request.include_insight {
            let digest = OptimizeDigest {
                variable_ids: result.variable_ids.clone(),
                best_point: result.best_point.clone(),
                meta: OptimizeMetaDigest {
                    n_iter: Some(result.meta.n_iter),
                    best_score: Some(result.meta.best_score),
                    initial_points: Some(result.meta.initial_points),
                },
            };
            match self.optimize_insight(&digest) {
                Ok(insight) => result.insight = Some(insight),
                Err(err) => insight_error = Some(upstream(err)),
            }
        }
        Ok((result, insight_error))
    }

    fn provider(&self) -> Result<&dyn InsightProvider, EngineError> {
        self.insight.as_deref().ok_or_else(|| {
            EngineError::Upstream(
                ErrorInfo::new("insight.disabled", "no insight provider is configured")
                    .with_hint("enable insight in the service configuration"),
            )
        })
    }

    fn record<Req: Serialize, Res: Serialize>(
        &self,
        run_type: RunType,
        request: &Req,
        result: &Res,
    ) -> Option<PersistTicket> {
        let recorder = self.recorder.as_ref()?;
        match stored_run(run_type, request, result) {
            Ok(run) => Some(recorder.record(run)),
            Err(err) => {
                warn!(error = %err, "could not encode run for recording");
                None
            }
        }
    }
}

fn stored_run<Req: Serialize, Res: Serialize>(
    run_type: RunType,
    request: &Req,
    result: &Res,
) -> Result<NewRun, EngineError> {
    Ok(NewRun::new(
        run_type,
        to_json_value(request)?,
        to_json_value(result)?,
    ))
}

fn decode_stored<T: DeserializeOwned>(run: &Run) -> Result<T, EngineError> {
    from_json_value(run.request_json.clone()).map_err(|err| {
        EngineError::Validation(
            ErrorInfo::new("runs.replay_request", err.info().message.clone())
                .with_context("id", run.id.to_string())
                .with_context("run_type", run.run_type.as_str()),
        )
    })
}

/// Insight failures always surface as upstream errors, whatever the provider
/// reported.
fn upstream(err: EngineError) -> EngineError {
    match err {
        EngineError::Upstream(info) => EngineError::Upstream(info),
        other => {
            warn!(error = %other, "insight provider failed");
            EngineError::Upstream(other.info().clone())
        }
    }
}
