//! Profiler tests

use scopedsl_debug::{OverheadEstimate, Profiler, Tracer};
use scopedsl_engine::{ActorContext, ScopeEngine};
use scopedsl_language::parse_scope;
use scopedsl_storage::World;
use serde_json::json;
use std::time::Duration;

fn world() -> World {
    (0..20).fold(World::new(), |world, i| {
        world.with_entity(format!("e{i:02}"), [("core:rank", json!({"value": i}))])
    })
}

fn engine() -> ScopeEngine {
    let mut engine = ScopeEngine::new();
    engine
        .register_scope_source(
            "ranks:top",
            r#"entities(core:rank)[{">=": [{"var": "entity.core:rank.value"}, 15]}]"#,
        )
        .unwrap();
    engine
}

#[test]
fn profile_is_consistent_and_restores_disabled_tracer() {
    let engine = engine();
    let mut tracer = Tracer::disabled();
    let report = Profiler::new()
        .with_iterations(5)
        .profile(&engine, "ranks:top", &ActorContext::new("e00"), &world(), &mut tracer)
        .unwrap();

    assert!(report.consistent);
    assert_eq!(report.iterations, 5);
    assert_eq!(report.result.len(), 5);
    assert!(!tracer.is_enabled());
    assert_eq!(tracer.stats().resolutions, 5);
    assert_eq!(tracer.stats().overhead, Some(report.overhead));
}

#[test]
fn profile_keeps_enabled_tracer_enabled() {
    let engine = engine();
    let mut tracer = Tracer::enabled();
    Profiler::new()
        .profile(&engine, "ranks:top", &ActorContext::new("e00"), &world(), &mut tracer)
        .unwrap();
    assert!(tracer.is_enabled());
}

#[test]
fn profile_expression() {
    let engine = engine();
    let expr = parse_scope("ranks:top + actor").unwrap();
    let mut tracer = Tracer::disabled();
    let report = Profiler::new()
        .profile_expr(&engine, &expr, &ActorContext::new("e00"), &world(), &mut tracer)
        .unwrap();
    assert_eq!(report.result.len(), 6);
    assert!(report.consistent);
}

#[test]
fn overhead_is_clamped_at_zero() {
    let faster = OverheadEstimate::from_runs(Duration::from_millis(10), Duration::from_millis(8));
    assert!(faster.percent.abs() < f64::EPSILON);

    let slower = OverheadEstimate::from_runs(Duration::from_millis(6), Duration::from_millis(8));
    assert!((slower.percent - 25.0).abs() < 1e-9);
}

#[test]
fn clear_drops_overhead() {
    let engine = engine();
    let mut tracer = Tracer::disabled();
    Profiler::new()
        .profile(&engine, "ranks:top", &ActorContext::new("e00"), &world(), &mut tracer)
        .unwrap();
    assert!(tracer.overhead().is_some());
    tracer.clear();
    assert!(tracer.overhead().is_none());
    assert!(tracer.is_empty());
}
