use vspace_core::errors::{EngineError, ErrorInfo};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("id", "1")
        .with_context("reason", "example")
}

#[test]
fn validation_error_surface() {
    let err = EngineError::Validation(sample_info("n_points.range", "too many points"));
    assert_eq!(err.info().code, "n_points.range");
    assert_eq!(err.family(), "validation");
    assert!(!err.is_non_fatal());
}

#[test]
fn domain_error_surface() {
    let err = EngineError::Domain(sample_info("domain.unknown", "unknown ids"));
    assert!(err.info().context.contains_key("id"));
    assert_eq!(err.family(), "domain");
}

#[test]
fn non_fatal_families() {
    assert!(EngineError::Upstream(sample_info("insight", "down")).is_non_fatal());
    assert!(EngineError::persistence("runs.insert", "disk full").is_non_fatal());
    assert!(!EngineError::NotFound(sample_info("runs.missing", "gone")).is_non_fatal());
}

#[test]
fn display_includes_context_and_hint() {
    let err = EngineError::Domain(sample_info("domain.empty", "nothing selected").with_hint("pick one"));
    let text = err.to_string();
    assert!(text.contains("domain.empty"));
    assert!(text.contains("id=1"));
    assert!(text.contains("hint: pick one"));
}

#[test]
fn serializes_with_family_tag() {
    let err = EngineError::NotFound(ErrorInfo::new("runs.missing", "run 3 not found"));
    let value = serde_json::to_value(&err).expect("serialize");
    assert_eq!(value["family"], "not_found");
    assert_eq!(value["detail"]["code"], "runs.missing");
}
