use std::sync::Arc;

use serde_json::json;
use vspace_core::{CatalogRegistry, EngineError, ErrorInfo, Insight, Variable, VariableId};
use vspace_doe::{DoeMethod, DoeRequest, DoeResult};
use vspace_engine::{
    DoeDigest, Experiments, InsightProvider, OptimizeDigest, RunRecorder, Session,
    TemplateInsight,
};
use vspace_opt::{ObjectiveSpec, OptimizeRequest, OptimizeResult};
use vspace_runs::{
    MemoryRunStore, NewRun, Run, RunId, RunPage, RunQuery, RunStore, RunType, SqliteRunStore,
};

fn id(raw: i64) -> VariableId {
    VariableId::from_raw(raw)
}

fn registry() -> Arc<CatalogRegistry> {
    Arc::new(
        CatalogRegistry::new(vec![
            Variable::bounded(1, "temperature", 0.0, 10.0).with_unit("C"),
            Variable::bounded(2, "ratio", 0.0, 1.0),
        ])
        .expect("catalog"),
    )
}

fn experiments(store: Arc<dyn RunStore>) -> Experiments {
    Experiments::new(registry(), store).with_insight(Arc::new(TemplateInsight))
}

struct BrokenInsight;

impl InsightProvider for BrokenInsight {
    fn summarize_doe(&self, _: &DoeDigest) -> Result<Insight, EngineError> {
        Err(EngineError::Upstream(ErrorInfo::new("insight.timeout", "summarizer timed out")))
    }

    fn summarize_optimize(&self, _: &OptimizeDigest) -> Result<Insight, EngineError> {
        Err(EngineError::Validation(ErrorInfo::new("insight.payload", "bad payload")))
    }
}

struct ReadOnlyStore;

impl RunStore for ReadOnlyStore {
    fn create(&self, _: NewRun) -> Result<Run, EngineError> {
        Err(EngineError::persistence("runs.insert", "database is read-only"))
    }

    fn list(&self, _: &RunQuery) -> Result<RunPage, EngineError> {
        Err(EngineError::persistence("runs.query", "database is read-only"))
    }

    fn get(&self, id: RunId) -> Result<Run, EngineError> {
        Err(EngineError::NotFound(ErrorInfo::new("runs.not_found", id.to_string())))
    }

    fn delete(&self, id: RunId) -> Result<(), EngineError> {
        Err(EngineError::NotFound(ErrorInfo::new("runs.not_found", id.to_string())))
    }
}

#[tokio::test]
async fn recorded_doe_round_trips_through_the_store() {
    let store: Arc<dyn RunStore> = Arc::new(SqliteRunStore::open_in_memory().expect("store"));
    let (recorder, _task) = RunRecorder::spawn(Arc::clone(&store));
    let engine = experiments(Arc::clone(&store)).with_recorder(recorder);

    let mut request = DoeRequest::new(vec![id(1), id(2)], 12, DoeMethod::Sobol);
    request.include_insight = true;
    let outcome = engine.doe(request).expect("doe");
    assert!(outcome.insight_error.is_none());
    assert!(outcome.result.insight.is_some());

    let run = outcome.persist.expect("recording enabled").wait().await.expect("persisted");
    assert_eq!(run.run_type, RunType::Doe);
    assert_eq!(run.title, "DOE sobol · 12 points");
    let stored = engine.get_run(run.id).expect("get");
    let points: DoeResult = serde_json::from_value(stored.response_json).expect("decode");
    assert_eq!(points.points, outcome.result.points);
}

#[tokio::test]
async fn persistence_failure_keeps_the_result() {
    let store: Arc<dyn RunStore> = Arc::new(ReadOnlyStore);
    let (recorder, _task) = RunRecorder::spawn(Arc::clone(&store));
    let engine = experiments(store).with_recorder(recorder);

    let request = OptimizeRequest::new(
        vec![id(1)],
        10,
        ObjectiveSpec::MaximizeVariable { variable_id: id(1) },
    )
    .with_seed(42);
    let outcome = engine.optimize(request).expect("optimize");
    assert_eq!(outcome.result.history.len(), 10);
    let err = outcome.persist.expect("ticket").wait().await.expect_err("read-only");
    assert!(err.is_non_fatal());
    assert_eq!(err.info().code, "runs.insert");
}

#[test]
fn insight_failure_is_reported_beside_the_result() {
    let engine = Experiments::new(registry(), Arc::new(MemoryRunStore::new()))
        .with_insight(Arc::new(BrokenInsight));

    let mut doe = DoeRequest::new(vec![id(1)], 4, DoeMethod::Lhs);
    doe.include_insight = true;
    let outcome = engine.doe(doe).expect("doe");
    assert_eq!(outcome.result.points.len(), 4);
    assert!(outcome.result.insight.is_none());
    assert!(matches!(outcome.insight_error, Some(EngineError::Upstream(_))));
    assert!(outcome.persist.is_none());

    let mut opt = OptimizeRequest::new(
        vec![id(1)],
        5,
        ObjectiveSpec::MinimizeVariable { variable_id: id(1) },
    );
    opt.include_insight = true;
    let outcome = engine.optimize(opt).expect("optimize");
    let err = outcome.insight_error.expect("insight error");
    assert_eq!(err.family(), "upstream");
    assert_eq!(err.info().code, "insight.payload");
}

#[test]
fn missing_provider_is_an_upstream_error() {
    let engine = Experiments::new(registry(), Arc::new(MemoryRunStore::new()));
    let digest = DoeDigest {
        variable_ids: vec![id(1)],
        points: Vec::new(),
    };
    let err = engine.doe_insight(&digest).expect_err("disabled");
    assert_eq!(err.info().code, "insight.disabled");
}

#[test]
fn replaying_a_sobol_run_reproduces_its_points() {
    let store = Arc::new(MemoryRunStore::new());
    let engine = experiments(store.clone());
    let request = DoeRequest::new(vec![id(2), id(1)], 16, DoeMethod::Sobol);
    let result = engine.doe(request.clone()).expect("doe").result;
    let original = engine
        .create_run(NewRun::new(
            RunType::Doe,
            serde_json::to_value(&request).expect("request"),
            serde_json::to_value(&result).expect("response"),
        ))
        .expect("create");

    let replay = engine.replay(original.id).expect("replay");
    assert_ne!(replay.id, original.id);
    assert_eq!(replay.title, format!("Replay of run #{}", original.id));
    assert_eq!(replay.request_json, original.request_json);
    assert_eq!(replay.request_hash, original.request_hash);
    let replayed: DoeResult = serde_json::from_value(replay.response_json).expect("decode");
    assert_eq!(replayed.points, result.points);
    assert_eq!(engine.get_run(original.id).expect("original"), original);
    assert_eq!(engine.list_runs(&RunQuery::default()).expect("list").total, 2);
}

#[test]
fn replaying_seeded_searches_and_lhs_designs_is_deterministic() {
    let engine = experiments(Arc::new(MemoryRunStore::new()));

    let lhs = engine
        .create_run(NewRun::new(
            RunType::Doe,
            json!({"variable_ids": [1, 2], "n_points": 9, "method": "lhs"}),
            json!({}),
        ))
        .expect("lhs run");
    let a: DoeResult =
        serde_json::from_value(engine.replay(lhs.id).expect("first").response_json).expect("a");
    let b: DoeResult =
        serde_json::from_value(engine.replay(lhs.id).expect("second").response_json).expect("b");
    assert_eq!(a.points, b.points);

    let opt = engine
        .create_run(NewRun::new(
            RunType::Optimize,
            json!({
                "variable_ids": [1, 2],
                "n_iter": 20,
                "seed": 5,
                "objective": {"kind": "maximize_variable", "variable_id": 2}
            }),
            json!({}),
        ))
        .expect("optimize run");
    let a: OptimizeResult =
        serde_json::from_value(engine.replay(opt.id).expect("first").response_json).expect("a");
    let b: OptimizeResult =
        serde_json::from_value(engine.replay(opt.id).expect("second").response_json).expect("b");
    assert_eq!(a.history, b.history);
    assert_eq!(a.meta.seed, 5);
}

#[test]
fn replay_failures() {
    let engine = experiments(Arc::new(MemoryRunStore::new()));
    let err = engine.replay(RunId::from_raw(99)).expect_err("missing");
    assert!(matches!(err, EngineError::NotFound(_)));

    let broken = engine
        .create_run(NewRun::new(RunType::Optimize, json!({"n_iter": "many"}), json!({})))
        .expect("create");
    let err = engine.replay(broken.id).expect_err("undecodable");
    assert!(matches!(err, EngineError::Validation(_)));
    assert_eq!(err.info().code, "runs.replay_request");
}

#[test]
fn session_feeds_the_last_design_into_a_search() {
    let engine = experiments(Arc::new(MemoryRunStore::new()));
    let mut session = Session::new();
    session.select_all([id(1), id(2)]);
    let design = engine
        .doe(session.doe_request(6, DoeMethod::Sobol))
        .expect("doe")
        .result;
    session.remember_doe(design);

    session.toggle(id(2));
    assert_eq!(session.selected(), &[id(1)]);
    let request = session
        .optimize_request(4, ObjectiveSpec::MaximizeVariable { variable_id: id(1) }, 3, true)
        .expect("request");
    assert_eq!(request.initial_points.len(), 6);
    assert!(request.initial_points.iter().all(|p| p.len() == 1));

    let outcome = engine.optimize(request).expect("optimize");
    assert_eq!(outcome.result.meta.initial_points, 3);
    assert_eq!(outcome.result.history.len(), 3 + 4);

    session.select_all([id(1), id(2), id(3)]);
    let err = session
        .optimize_request(4, ObjectiveSpec::MaximizeVariable { variable_id: id(1) }, 3, true)
        .expect_err("design misses 3");
    assert_eq!(err.info().code, "session.warm_start");
}

#[tokio::test]
async fn engine_builds_from_a_service_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    let catalog = dir.path().join("catalog.yaml");
    std::fs::write(
        &catalog,
        "variables:\n  - id: 1\n    name: pressure\n    min: 1.0\n    max: 3.0\n    unit: bar\n",
    )
    .expect("write catalog");
    let config = vspace_engine::ServiceConfig {
        catalog,
        database: Some(dir.path().join("runs.db")),
        ..Default::default()
    };

    let (engine, task) = Experiments::from_config(&config).expect("engine");
    assert!(task.is_some());
    let outcome = engine
        .doe(DoeRequest::new(vec![id(1)], 3, DoeMethod::Lhs))
        .expect("doe");
    let run = outcome.persist.expect("ticket").wait().await.expect("stored");
    assert_eq!(engine.list_runs(&RunQuery::default()).expect("list").items[0].id, run.id);
    assert!(outcome
        .result
        .points
        .iter()
        .all(|p| (1.0..=3.0).contains(&p[&id(1)])));
}
