use std::io::Write;

use vspace_core::{
    CatalogRegistry, DomainRegistry, EngineError, Point, Variable, VariableId,
};

fn ids(raw: &[i64]) -> Vec<VariableId> {
    raw.iter().copied().map(VariableId::from_raw).collect()
}

fn registry() -> CatalogRegistry {
    let mut unbounded = Variable::bounded(3, "open", 0.0, 1.0);
    unbounded.max = None;
    CatalogRegistry::new(vec![
        Variable::bounded(1, "temperature", 0.0, 10.0).with_unit("C"),
        Variable::bounded(2, "ratio", 0.0, 1.0),
        unbounded,
    ])
    .expect("catalog")
}

#[test]
fn resolves_in_request_order() {
    let domain = registry().resolve(&ids(&[2, 1])).expect("resolve");
    assert_eq!(domain.ids(), ids(&[2, 1]).as_slice());
    let bounds = domain.bounds(VariableId::from_raw(1)).expect("bounds");
    assert_eq!((bounds.min, bounds.max), (0.0, 10.0));
    assert_eq!(bounds.unit.as_deref(), Some("C"));
}

#[test]
fn rejects_empty_duplicate_unknown_and_unbounded() {
    let registry = registry();
    let cases = [
        (vec![], "domain.empty"),
        (ids(&[1, 1]), "domain.duplicate"),
        (ids(&[1, 42]), "domain.unknown"),
        (ids(&[1, 3]), "domain.unbounded"),
    ];
    for (request, code) in cases {
        match registry.resolve(&request) {
            Err(EngineError::Domain(info)) => assert_eq!(info.code, code),
            other => panic!("expected domain error {code}, got {other:?}"),
        }
    }
}

#[test]
fn unknown_ids_are_reported_together() {
    let err = registry().resolve(&ids(&[7, 1, 8])).unwrap_err();
    assert_eq!(err.info().context["missing_variable_ids"], "7,8");
}

#[test]
fn points_use_string_keys_on_the_wire() {
    let mut point = Point::new();
    point.insert(VariableId::from_raw(12), 0.5);
    let json = serde_json::to_string(&point).expect("encode");
    assert_eq!(json, r#"{"12":0.5}"#);
    let decoded: Point = serde_json::from_str(&json).expect("decode");
    assert_eq!(decoded, point);
}

#[test]
fn loads_yaml_catalog() {
    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .expect("tempfile");
    writeln!(
        file,
        "variables:\n  - id: 1\n    name: pressure\n    min: 1.0\n    max: 5.0\n    unit: bar\n    source: hard_data\n    confidence: 0.9\n  - id: 2\n    name: margin\n    category: business_kpi"
    )
    .expect("write");
    let registry = CatalogRegistry::load(file.path()).expect("load");
    assert_eq!(registry.len(), 2);
    assert!(registry.resolve(&ids(&[1])).is_ok());
    assert!(registry.resolve(&ids(&[2])).is_err());
}
