use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use tracing::warn;
use vspace_core::{EngineError, Insight};
use vspace_doe::{DoeRequest, DoeResult};
use vspace_engine::{DoeDigest, Experiments, OptimizeDigest, Outcome};
use vspace_opt::{OptimizeRequest, OptimizeResult};
use vspace_runs::{NewRun, Run, RunId, RunPage, RunQuery, RunType};

use crate::error::{error_code_header, ApiError, INSIGHT_ERROR_HEADER, PERSIST_ERROR_HEADER};
use crate::AppState;

type ApiResult<T> = Result<T, ApiError>;

/// Runs an engine call on the blocking pool.
async fn blocking<T, F>(experiments: Experiments, call: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&Experiments) -> Result<T, EngineError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || call(&experiments))
        .await
        .map_err(|err| ApiError(EngineError::persistence("server.task", err)))?
        .map_err(ApiError)
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::rejected("request.body", rejection.body_text()))
}

fn run_id(id: Result<Path<i64>, PathRejection>) -> ApiResult<RunId> {
    id.map(|Path(raw)| RunId::from_raw(raw))
        .map_err(|rejection| ApiError::rejected("request.path", rejection.body_text()))
}

/// Splits an outcome into its result and the headers reporting non-fatal
/// failures. A pending run write is not awaited.
fn settle<T>(outcome: Outcome<T>) -> (HeaderMap, T) {
    let mut headers = HeaderMap::new();
    if let Some(err) = &outcome.insight_error {
        warn!(error = %err, "insight unavailable");
        if let Some(value) = error_code_header(err) {
            headers.insert(INSIGHT_ERROR_HEADER, value);
        }
    }
    if let Some(err) = outcome.persist.and_then(|mut ticket| ticket.settled_error()) {
        if let Some(value) = error_code_header(&err) {
            headers.insert(PERSIST_ERROR_HEADER, value);
        }
    }
    (headers, outcome.result)
}

pub async fn health() -> &'static str {
    "OK"
}

/// POST /experiments/doe
///
/// Insight failures are reported in `x-insight-error`. A recorder that is
/// already down is reported in `x-persist-error`; later write failures are
/// only logged by the recorder.
pub async fn doe(
    State(state): State<AppState>,
    payload: Result<Json<DoeRequest>, JsonRejection>,
) -> ApiResult<(HeaderMap, Json<DoeResult>)> {
    let request = body(payload)?;
    let outcome = blocking(state.experiments, move |e| e.doe(request)).await?;
    let (headers, result) = settle(outcome);
    Ok((headers, Json(result)))
}

/// POST /experiments/doe/insight
pub async fn doe_insight(
    State(state): State<AppState>,
    payload: Result<Json<DoeDigest>, JsonRejection>,
) -> ApiResult<Json<Insight>> {
    let digest = body(payload)?;
    Ok(Json(state.experiments.doe_insight(&digest)?))
}

/// POST /experiments/optimize
///
/// Reports side-effect failures the same way as the DOE route.
pub async fn optimize(
    State(state): State<AppState>,
    payload: Result<Json<OptimizeRequest>, JsonRejection>,
) -> ApiResult<(HeaderMap, Json<OptimizeResult>)> {
    let request = body(payload)?;
    let outcome = blocking(state.experiments, move |e| e.optimize(request)).await?;
    let (headers, result) = settle(outcome);
    Ok((headers, Json(result)))
}

/// POST /experiments/optimize/insight
pub async fn optimize_insight(
    State(state): State<AppState>,
    payload: Result<Json<OptimizeDigest>, JsonRejection>,
) -> ApiResult<Json<Insight>> {
    let digest = body(payload)?;
    Ok(Json(state.experiments.optimize_insight(&digest)?))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    run_type: Option<RunType>,
    skip: Option<usize>,
    limit: Option<usize>,
}

/// GET /runs
pub async fn list_runs(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<RunPage>> {
    let Query(params) = params
        .map_err(|rejection| ApiError::rejected("request.query", rejection.body_text()))?;
    let query = RunQuery {
        run_type: params.run_type,
        skip: params.skip.unwrap_or(0),
        limit: params.limit.unwrap_or(state.list_limit),
    };
    let page = blocking(state.experiments, move |e| e.list_runs(&query)).await?;
    Ok(Json(page))
}

/// POST /runs
pub async fn create_run(
    State(state): State<AppState>,
    payload: Result<Json<NewRun>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Run>)> {
    let run = body(payload)?;
    let run = blocking(state.experiments, move |e| e.create_run(run)).await?;
    Ok((StatusCode::CREATED, Json(run)))
}

/// GET /runs/{id}
pub async fn get_run(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Run>> {
    let id = run_id(id)?;
    Ok(Json(blocking(state.experiments, move |e| e.get_run(id)).await?))
}

/// DELETE /runs/{id}
pub async fn delete_run(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let id = run_id(id)?;
    blocking(state.experiments, move |e| e.delete_run(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /runs/{id}/replay
pub async fn replay_run(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<(StatusCode, Json<Run>)> {
    let id = run_id(id)?;
    let run = blocking(state.experiments, move |e| e.replay(id)).await?;
    Ok((StatusCode::CREATED, Json(run)))
}
