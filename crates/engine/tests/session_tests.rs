use std::sync::Arc;

use sempred_common::{CallError, PredicateLocation, PredicateSource, Value};
use sempred_engine::{
    DecisionOutcome, EvaluationSession, PredicateConfig, PredicateError, PredicateRegistry,
};
use tracing::info;

fn expr_grammar() -> PredicateRegistry {
    let mut registry = PredicateRegistry::new("Expr.g4");
    registry.register(PredicateSource::new("Expr.g4", "stat", 0, "{ version < 1000 }?"));
    registry.register(PredicateSource::new("Expr.g4", "stat", 1, "{ version >= 1000 }?"));
    registry.register(PredicateSource::new("Expr.g4", "primary", 0, "{ doesItBlend() }?"));
    registry.register(PredicateSource::new("Expr.g4", "primary", 1, "{ x = 1 }?"));
    registry
}

#[test]
fn test_decisions_follow_bindings() {
    sempred_common::logging::ensure_test_logging(None);
    info!("Running test");
    let mut session = EvaluationSession::new(Arc::new(expr_grammar()), PredicateConfig::default());

    session.set_binding("version", 999);
    assert!(session.decide("stat", 0).value);
    assert!(!session.decide("stat", 1).value);

    session.set_binding("version", 1000);
    assert!(!session.decide("stat", 0).value);
    assert!(session.decide("stat", 1).value);
}

#[test]
fn test_constant_function_stub() {
    sempred_common::logging::ensure_test_logging(None);
    let mut session = EvaluationSession::new(Arc::new(expr_grammar()), PredicateConfig::default());

    session.set_binding("doesItBlend", Value::constant_function(false));
    let decision = session.decide("primary", 0);
    assert_eq!(decision.outcome, DecisionOutcome::Evaluated);
    assert!(!decision.value);
}

#[test]
fn test_callable_failure_falls_back() {
    sempred_common::logging::ensure_test_logging(None);
    let config = PredicateConfig { fallback_value: false, ..Default::default() };
    let mut session = EvaluationSession::new(Arc::new(expr_grammar()), config);

    session.set_binding(
        "doesItBlend",
        Value::function("doesItBlend", |_| Err(CallError::Failed("blender offline".into()))),
    );
    let decision = session.decide("primary", 0);
    assert!(!decision.value);
    assert!(matches!(
        decision.error(),
        Some(PredicateError::CallFailed { name, .. }) if name == "doesItBlend"
    ));
}

#[test]
fn test_parse_failure_is_permanent() {
    sempred_common::logging::ensure_test_logging(None);
    let mut session = EvaluationSession::new(Arc::new(expr_grammar()), PredicateConfig::default());

    let first = session.evaluate_at("primary", 1).unwrap_err();
    match &first {
        PredicateError::ParseFailure(err) => assert_eq!(err.offset, 2),
        other => panic!("expected parse failure, got {other}"),
    }

    session.set_binding("x", 1);
    assert_eq!(session.evaluate_at("primary", 1).unwrap_err(), first);
    assert!(session.decide("primary", 1).is_fallback());
}

#[test]
fn test_unknown_location_falls_back() {
    sempred_common::logging::ensure_test_logging(None);
    let session = EvaluationSession::new(Arc::new(expr_grammar()), PredicateConfig::default());

    let decision = session.decide("stat", 7);
    assert!(decision.value);
    assert_eq!(
        decision.error(),
        Some(&PredicateError::UnknownPredicate { location: PredicateLocation::new("stat", 7) })
    );
}

#[test]
fn test_reload_makes_handles_stale() {
    sempred_common::logging::ensure_test_logging(None);
    let mut session = EvaluationSession::new(Arc::new(expr_grammar()), PredicateConfig::default());
    session.set_binding("version", 1);

    let old_handle = session.registry().find("stat", 0).unwrap();
    assert_eq!(session.evaluate_predicate(old_handle), Ok(true));

    session.reload_grammar(Arc::new(expr_grammar()));

    let err = session.evaluate_predicate(old_handle).unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(err, PredicateError::StaleHandle { handle: old_handle });

    // Bindings survive the reload; location lookups use the new registry.
    assert_eq!(session.evaluate_at("stat", 0), Ok(true));
    let new_handle = session.registry().find("stat", 0).unwrap();
    assert_ne!(new_handle, old_handle);
}

#[test]
fn test_registry_shared_between_sessions() {
    sempred_common::logging::ensure_test_logging(None);
    let registry = Arc::new(expr_grammar());

    let mut old = EvaluationSession::new(registry.clone(), PredicateConfig::default());
    let mut new = EvaluationSession::new(registry, PredicateConfig::default());
    old.set_binding("version", 10);
    new.set_binding("version", 5000);

    assert_eq!(old.evaluate_at("stat", 0), Ok(true));
    assert_eq!(new.evaluate_at("stat", 0), Ok(false));
}

#[test]
fn test_concurrent_first_lookup() {
    sempred_common::logging::ensure_test_logging(None);
    let registry = Arc::new(expr_grammar());
    let handle = registry.find("stat", 0).unwrap();

    let trees: Vec<_> = std::thread::scope(|scope| {
        let workers: Vec<_> = (0..4).map(|_| scope.spawn(|| registry.lookup(handle))).collect();
        workers.into_iter().map(|worker| worker.join().unwrap().unwrap()).collect()
    });

    for tree in &trees[1..] {
        assert!(Arc::ptr_eq(&trees[0], tree));
    }
}

#[test]
fn test_disabled_config_uses_disabled_value() {
    sempred_common::logging::ensure_test_logging(None);
    let config = PredicateConfig { enabled: false, disabled_value: false, fallback_value: true };
    let session = EvaluationSession::new(Arc::new(expr_grammar()), config);

    for (rule, index) in [("stat", 0), ("primary", 1), ("nowhere", 0)] {
        let decision = session.decide(rule, index);
        assert_eq!(decision.outcome, DecisionOutcome::Disabled);
        assert!(!decision.value);
    }
}
