//! Error handling tests
//!
//! Tests classification, the bounded error log, and the degrade policy.

use std::time::Duration;

use scopedsl_engine::{ActorContext, EngineConfig, ScopeEngine};
use scopedsl_foundation::{ErrorCategory, ErrorKind};
use scopedsl_language::parse_scope;
use scopedsl_storage::World;
use serde_json::json;

fn world() -> World {
    World::new()
        .with_entity("hero", [("core:stats", json!({"level": 3}))])
        .with_entity("bob", [("core:stats", json!({"level": [1, 2]}))])
}

fn hero() -> ActorContext {
    ActorContext::new("hero")
}

// =============================================================================
// Cycles
// =============================================================================

#[test]
fn self_reference_is_cyclic() {
    let mut engine = ScopeEngine::new();
    engine.register_definitions("mod:a := mod:a").unwrap();
    let err = engine.resolve("mod:a", &hero(), &world()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::CyclicScope);
    assert_eq!(err.to_string(), "cyclic scope reference: mod:a -> mod:a");
}

#[test]
fn long_cycles_are_detected() {
    for length in 2..=6 {
        let defs: Vec<String> = (0..length)
            .map(|i| format!("m:s{i} := m:s{}", (i + 1) % length))
            .collect();
        let mut engine = ScopeEngine::new();
        engine.register_definitions(&defs.join("\n")).unwrap();

        let err = engine.resolve("m:s0", &hero(), &world()).unwrap_err();
        let ErrorKind::CyclicScope { chain } = &err.kind else {
            panic!("expected cycle for length {length}, got {err}");
        };
        assert_eq!(chain.len(), length + 1);
        assert_eq!(chain.first(), chain.last());
    }
}

#[test]
fn diamond_is_not_a_cycle() {
    let mut engine = ScopeEngine::new();
    engine
        .register_definitions("m:top := m:left + m:right\nm:left := m:base\nm:right := m:base\nm:base := actor")
        .unwrap();
    let result = engine.resolve("m:top", &hero(), &world()).unwrap();
    assert_eq!(result.len(), 1);
}

#[test]
fn cycle_through_filter_is_detected() {
    let mut engine = ScopeEngine::new();
    engine
        .register_definitions(r#"m:a := m:b[{"var": "entity.id"}]
m:b := actor + m:a"#)
        .unwrap();
    let err = engine.resolve("m:a", &hero(), &world()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::CyclicScope);
}

// =============================================================================
// Classification and Degrade Policy
// =============================================================================

#[test]
fn unknown_reference_inside_scope() {
    let mut engine = ScopeEngine::new();
    engine.register_scope_source("m:a", "actor + m:missing").unwrap();
    let err = engine.resolve("m:a", &hero(), &world()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::UnknownScope);
    assert_eq!(err.scope_id(), Some("m:a"));
    assert!(engine.resolve_or_empty("m:a", &hero(), &world()).is_empty());
}

#[test]
fn unknown_root_scope_is_logged_against_its_id() {
    let mut engine = ScopeEngine::new();
    assert!(engine.resolve_or_empty("m:nope", &hero(), &world()).is_empty());
    let recent = engine.errors().recent(1);
    assert_eq!(recent[0].category, ErrorCategory::UnknownScope);
    assert_eq!(recent[0].scope_id.as_deref(), Some("m:nope"));

    // A failure inside a nested scope keeps the innermost id.
    engine.register_definitions("m:outer := m:inner\nm:inner := m:gone").unwrap();
    let err = engine.resolve("m:outer", &hero(), &world()).unwrap_err();
    assert_eq!(err.scope_id(), Some("m:inner"));
    assert_eq!(engine.errors().recent(1)[0].scope_id.as_deref(), Some("m:inner"));
}

#[test]
fn missing_location_is_a_dependency_error() {
    let engine = ScopeEngine::new();
    let err = engine
        .resolve_expr(&parse_scope("location").unwrap(), &hero(), &world())
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::MissingDependency);
    assert_eq!(err.category().code(), "SCOPE_4001");
}

#[test]
fn filter_errors_exclude_only_the_bad_candidate() {
    let engine = ScopeEngine::new();
    let expr = parse_scope(r#"entities(core:stats)[{">": [{"var": "entity.core:stats.level"}, 0]}]"#)
        .unwrap();
    let result = engine.resolve_expr(&expr, &hero(), &world()).unwrap();
    assert!(result.contains("hero"));
    assert!(!result.contains("bob"));
    assert_eq!(engine.errors().count(ErrorCategory::FilterEvaluation), 1);
}

#[test]
fn depth_limit_is_configurable() {
    let defs = "m:a := m:b\nm:b := m:c\nm:c := actor";

    let mut shallow = ScopeEngine::with_config(EngineConfig::new().with_max_depth(2));
    shallow.register_definitions(defs).unwrap();
    let err = shallow.resolve("m:a", &hero(), &world()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::DepthLimit);

    let mut deep = ScopeEngine::new();
    deep.register_definitions(defs).unwrap();
    assert_eq!(deep.resolve("m:a", &hero(), &world()).unwrap().len(), 1);
}

// =============================================================================
// Error Log
// =============================================================================

#[test]
fn error_log_counts_and_rates() {
    let engine = ScopeEngine::new();
    for _ in 0..3 {
        let _ = engine.resolve("m:nope", &hero(), &world());
    }
    let _ = engine.resolve_expr(&parse_scope("location").unwrap(), &hero(), &world());

    let errors = engine.errors();
    assert_eq!(errors.len(), 4);
    assert_eq!(errors.total_reported(), 4);
    let counts = errors.count_by_category();
    assert_eq!(counts.get(&ErrorCategory::UnknownScope), Some(&3));
    assert_eq!(counts.get(&ErrorCategory::MissingDependency), Some(&1));
    assert!(errors.rate(Duration::from_secs(60)) > 0.0);

    let recent = errors.recent(2);
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].category, ErrorCategory::UnknownScope);
    assert_eq!(recent[1].category, ErrorCategory::MissingDependency);
    assert_eq!(recent[1].code, "SCOPE_4001");
}

#[test]
fn error_log_is_bounded() {
    let engine = ScopeEngine::with_config(EngineConfig::new().with_error_buffer_size(5));
    for _ in 0..12 {
        let _ = engine.resolve("m:nope", &hero(), &world());
    }
    assert_eq!(engine.errors().len(), 5);
    assert_eq!(engine.errors().total_reported(), 12);

    engine.errors().clear();
    assert!(engine.errors().is_empty());
    assert_eq!(engine.errors().total_reported(), 12);
}

#[test]
fn summary_names_categories() {
    let mut engine = ScopeEngine::new();
    let _ = engine.register_scope_source("m:bad", "actor[");
    let summary = engine.errors().format_summary();
    assert!(summary.contains("SyntaxError"));
    assert!(summary.contains("SCOPE_1001"));
}
