use proptest::prelude::*;
use vspace_core::{CatalogRegistry, EngineError, Point, Variable, VariableId};
use vspace_opt::{optimize, LinearTerm, ObjectiveSpec, OptimizeRequest};

fn id(raw: i64) -> VariableId {
    VariableId::from_raw(raw)
}

fn registry() -> CatalogRegistry {
    CatalogRegistry::new(vec![
        Variable::bounded(1, "v1", 0.0, 10.0),
        Variable::bounded(2, "v2", 0.0, 1.0),
        Variable::bounded(3, "v3", -5.0, 5.0),
        Variable {
            min: None,
            ..Variable::bounded(4, "open", 0.0, 1.0)
        },
    ])
    .expect("catalog")
}

fn maximize(raw: i64) -> ObjectiveSpec {
    ObjectiveSpec::MaximizeVariable { variable_id: id(raw) }
}

fn point(values: &[(i64, f64)]) -> Point {
    values.iter().map(|(k, v)| (id(*k), *v)).collect()
}

#[test]
fn seeded_single_variable_scenario() {
    let request = OptimizeRequest::new(vec![id(1)], 10, maximize(1))
        .with_seed(42)
        .with_initial_points(Vec::new(), 0);
    let result = optimize(&registry(), &request).expect("optimize");

    assert_eq!(result.history.len(), 10);
    let values: Vec<f64> = result.history.iter().map(|p| p[&id(1)]).collect();
    assert!(values.iter().all(|v| (0.0..=10.0).contains(v)));
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(result.best_point[&id(1)], max);
    assert_eq!(result.meta.best_score, max);
    assert_eq!(result.meta.seed, 42);
    assert_eq!(result.meta.initial_points, 0);
}

#[test]
fn same_seed_same_history() {
    let request = OptimizeRequest::new(vec![id(1), id(2)], 25, maximize(2)).with_seed(7);
    let a = optimize(&registry(), &request).expect("first");
    let b = optimize(&registry(), &request).expect("second");
    assert_eq!(a.history, b.history);
    assert_eq!(a.best_point, b.best_point);
}

#[test]
fn unseeded_runs_report_a_replayable_seed() {
    let request = OptimizeRequest::new(vec![id(1)], 15, maximize(1));
    let first = optimize(&registry(), &request).expect("first");
    let replay = request.clone().with_seed(first.meta.seed);
    let second = optimize(&registry(), &replay).expect("replay");
    assert_eq!(first.history, second.history);
}

#[test]
fn negative_seeds_decode_and_repeat() {
    let request: OptimizeRequest = serde_json::from_str(
        r#"{"variable_ids":[1,2],"n_iter":12,"seed":-1,
            "objective":{"kind":"maximize_variable","variable_id":1}}"#,
    )
    .expect("decode");
    assert_eq!(request.seed, Some(-1));
    let first = optimize(&registry(), &request).expect("first");
    let second = optimize(&registry(), &request).expect("second");
    assert_eq!(first.history, second.history);
    assert_eq!(first.meta.seed, -1);

    let positive = optimize(&registry(), &request.clone().with_seed(1)).expect("positive");
    assert_ne!(positive.history, first.history);

    let value = serde_json::to_value(&first).expect("encode");
    assert_eq!(value["meta"]["seed"], -1);
}

#[test]
fn initial_points_are_clamped_and_come_first() {
    let seeds = vec![
        point(&[(1, 12.0), (2, -0.5)]),
        point(&[(1, 3.0), (2, 0.5), (3, 99.0)]),
        point(&[(1, 4.0), (2, 0.25)]),
    ];
    let request = OptimizeRequest::new(vec![id(1), id(2)], 5, maximize(1))
        .with_seed(1)
        .with_initial_points(seeds, 2);
    let result = optimize(&registry(), &request).expect("optimize");

    assert_eq!(result.history.len(), 2 + 5);
    assert_eq!(result.history[0], point(&[(1, 10.0), (2, 0.0)]));
    assert_eq!(result.history[1], point(&[(1, 3.0), (2, 0.5)]));
    assert_eq!(result.meta.initial_points, 2);
    assert_eq!(result.meta.max_initial_points, 2);
    assert_eq!(result.best_point, point(&[(1, 10.0), (2, 0.0)]));
}

#[test]
fn minimize_picks_the_smallest_value() {
    let request = OptimizeRequest::new(vec![id(3)], 40, ObjectiveSpec::MinimizeVariable {
        variable_id: id(3),
    })
    .with_seed(3);
    let result = optimize(&registry(), &request).expect("optimize");
    let min = result
        .history
        .iter()
        .map(|p| p[&id(3)])
        .fold(f64::INFINITY, f64::min);
    assert_eq!(result.meta.best_score, min);
}

#[test]
fn linear_objective_scores_weighted_sum() {
    let objective = ObjectiveSpec::Linear {
        terms: vec![
            LinearTerm { variable_id: id(1), weight: 2.0 },
            LinearTerm { variable_id: id(2), weight: -1.0 },
        ],
    };
    let request = OptimizeRequest::new(vec![id(1), id(2)], 30, objective).with_seed(11);
    let result = optimize(&registry(), &request).expect("optimize");
    let best = result
        .history
        .iter()
        .map(|p| 2.0 * p[&id(1)] - p[&id(2)])
        .fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(result.meta.best_score, best);
    assert_eq!(
        2.0 * result.best_point[&id(1)] - result.best_point[&id(2)],
        best
    );
}

#[test]
fn validation_failures() {
    let registry = registry();
    let cases = [
        (OptimizeRequest::new(vec![id(1)], 0, maximize(1)), "n_iter.range"),
        (OptimizeRequest::new(vec![id(1)], 5001, maximize(1)), "n_iter.range"),
        (OptimizeRequest::new(vec![id(1)], 5, maximize(2)), "objective.variable"),
        (
            OptimizeRequest::new(vec![id(1)], 5, maximize(1)).with_initial_points(Vec::new(), 5001),
            "max_initial_points.range",
        ),
        (
            OptimizeRequest::new(vec![id(1), id(2)], 5, maximize(1))
                .with_initial_points(vec![point(&[(1, 1.0)])], 1),
            "optimize.initial_point",
        ),
    ];
    for (request, code) in cases {
        match optimize(&registry, &request) {
            Err(EngineError::Validation(info)) => assert_eq!(info.code, code),
            other => panic!("expected {code}, got {other:?}"),
        }
    }
}

#[test]
fn domain_failures_propagate() {
    let request = OptimizeRequest::new(vec![id(4)], 5, maximize(4));
    let err = optimize(&registry(), &request).expect_err("unbounded");
    assert!(matches!(err, EngineError::Domain(_)));
    assert_eq!(err.info().code, "domain.unbounded");
}

#[test]
fn wire_shape_uses_string_keys_and_defaults() {
    let request: OptimizeRequest = serde_json::from_str(
        r#"{"variable_ids":[1],"objective":{"kind":"maximize_variable","variable_id":1},
            "initial_points":[{"1":20.0}],"seed":null}"#,
    )
    .expect("decode");
    assert_eq!(request.n_iter, 30);
    assert_eq!(request.max_initial_points, 200);
    let result = optimize(&registry(), &request).expect("optimize");
    assert_eq!(result.history.len(), 31);

    let value = serde_json::to_value(&result).expect("encode");
    assert_eq!(value["best_point"]["1"], serde_json::json!(10.0));
    assert_eq!(value["meta"]["objective"]["kind"], "maximize_variable");
    assert_eq!(value["meta"]["domain"]["1"]["max"], serde_json::json!(10.0));
    assert_eq!(value["method"], "random");
}

proptest! {
    #[test]
    fn history_length_and_best_score(
        n_iter in 1usize..200,
        seeds in 0usize..20,
        cap in 0usize..30,
        seed in any::<i64>(),
        minimize in any::<bool>(),
    ) {
        let initial: Vec<Point> = (0..seeds)
            .map(|i| point(&[(1, i as f64 - 3.0), (3, i as f64)]))
            .collect();
        let objective = if minimize {
            ObjectiveSpec::MinimizeVariable { variable_id: id(3) }
        } else {
            maximize(3)
        };
        let request = OptimizeRequest::new(vec![id(1), id(3)], n_iter, objective)
            .with_seed(seed)
            .with_initial_points(initial, cap);
        let result = optimize(&registry(), &request).unwrap();

        prop_assert_eq!(result.history.len(), seeds.min(cap) + n_iter);
        let scores = result.history.iter().map(|p| p[&id(3)]);
        let extremal = if minimize {
            scores.fold(f64::INFINITY, f64::min)
        } else {
            scores.fold(f64::NEG_INFINITY, f64::max)
        };
        prop_assert_eq!(result.meta.best_score, extremal);
        for p in &result.history {
            prop_assert!((0.0..=10.0).contains(&p[&id(1)]));
            prop_assert!((-5.0..=5.0).contains(&p[&id(3)]));
        }
    }
}
