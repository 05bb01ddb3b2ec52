use tmcmc_core::errors::{ErrorInfo, TmcmcError};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_context("stage", "1")
        .with_context("reason", "example")
}

#[test]
fn config_error_surface() {
    let err = TmcmcError::Config(sample_info("unknown-prior", "prior not recognised"));
    assert_eq!(err.info().code, "unknown-prior");
    assert!(err.info().context.contains_key("stage"));
}

#[test]
fn store_error_surface() {
    let err = TmcmcError::Store(sample_info("capacity-exceeded", "store is full"));
    assert_eq!(err.info().code, "capacity-exceeded");
    assert!(err.info().context.contains_key("reason"));
}

#[test]
fn sampling_error_surface() {
    let err = TmcmcError::Sampling(sample_info("nan-candidate", "candidate contains NaN"));
    assert_eq!(err.info().code, "nan-candidate");
}

#[test]
fn display_includes_context_and_hint() {
    let err = TmcmcError::Data(
        ErrorInfo::new("data-parse", "bad row")
            .with_context("line", "3")
            .with_hint("expected two numeric columns"),
    );
    let rendered = err.to_string();
    assert!(rendered.starts_with("data error: bad row (code: data-parse)"));
    assert!(rendered.contains("line=3"));
    assert!(rendered.contains("hint: expected two numeric columns"));
}

#[test]
fn errors_serialize_with_family_tag() {
    let err = TmcmcError::Model(ErrorInfo::new("unknown-model", "no such model"));
    let json = serde_json::to_string(&err).unwrap();
    assert!(json.contains("\"family\":\"Model\""));
    let back: TmcmcError = serde_json::from_str(&json).unwrap();
    assert_eq!(back, err);
}
