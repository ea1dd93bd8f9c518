//! Filter evaluator integration tests
//!
//! Tests JSON-Logic evaluation against entities from a real World.

use scopedsl_foundation::{EntityId, ErrorCategory};
use scopedsl_language::{CompareOp, FilterContext, FilterEvaluator, FilterExpr, Subject};
use scopedsl_storage::World;
use serde_json::{Value, json};

fn world() -> World {
    World::new()
        .with_entity(
            "bob",
            [
                ("core:name", json!({"text": "Bob"})),
                ("core:stats", json!({"level": 5, "tags": ["brave", "tall"]})),
            ],
        )
        .with_entity("hero", [("core:name", json!({"text": "Alice"}))])
        .with_entity("tavern", [("core:location", json!({"lit": true}))])
}

/// Evaluates `logic` with `entity` as the candidate, `hero` as the actor,
/// and `tavern` as the location.
fn eval_with(evaluator: &FilterEvaluator, logic: &Value, entity: &str) -> scopedsl_foundation::Result<bool> {
    let world = world();
    let actor = EntityId::new("hero");
    let location = EntityId::new("tavern");
    let candidate = EntityId::new(entity);
    let ctx = FilterContext::new(
        Subject::for_id(&world, &actor),
        Subject::for_id(&world, &location),
    )
    .with_entity(Subject::for_id(&world, &candidate));
    let expr = FilterExpr::compile(logic).expect("filter should compile");
    evaluator.evaluate(&expr, &ctx)
}

fn eval(logic: &Value, entity: &str) -> bool {
    eval_with(&FilterEvaluator::new(), logic, entity).expect("evaluation failed")
}

// =============================================================================
// Paths
// =============================================================================

#[test]
fn long_and_short_component_paths() {
    assert!(eval(&json!({"==": [{"var": "entity.components.core:name.text"}, "Bob"]}), "bob"));
    assert!(eval(&json!({"==": [{"var": "entity.core:name.text"}, "Bob"]}), "bob"));
    assert!(!eval(&json!({"==": [{"var": "entity.core:name.text"}, "Bob"]}), "hero"));
}

#[test]
fn actor_and_location_roots() {
    assert!(eval(&json!({"==": [{"var": "actor.core:name.text"}, "Alice"]}), "bob"));
    assert!(eval(&json!({"var": "location.core:location.lit"}), "bob"));
    assert!(eval(&json!({"!=": [{"var": "entity.id"}, {"var": "actor.id"}]}), "bob"));
}

#[test]
fn missing_path_is_null_and_excluded() {
    assert!(!eval(&json!({"==": [{"var": "entity.core:nothing.here"}, true]}), "bob"));
    assert!(eval(&json!({"==": [{"var": "entity.core:nothing.here"}, null]}), "bob"));
    assert!(!eval(&json!({">": [{"var": "entity.core:stats.level"}, 1]}), "hero"));
}

#[test]
fn unknown_candidate_only_has_an_id() {
    assert!(eval(&json!({"==": [{"var": "entity.id"}, "ghost"]}), "ghost"));
    assert!(!eval(&json!({"var": "entity.core:name.text"}), "ghost"));
}

#[test]
fn var_default_applies_to_null() {
    assert!(eval(
        &json!({"==": [{"var": ["entity.core:name.text", "anon"]}, "anon"]}),
        "tavern"
    ));
}

// =============================================================================
// Operators
// =============================================================================

#[test]
fn numeric_comparisons_and_between() {
    assert!(eval(&json!({">=": [{"var": "entity.core:stats.level"}, 5]}), "bob"));
    assert!(eval(&json!({"<": [1, {"var": "entity.core:stats.level"}, 10]}), "bob"));
    assert!(!eval(&json!({"<": [1, {"var": "entity.core:stats.level"}, 5]}), "bob"));
    assert!(eval(&json!({"<=": [1, {"var": "entity.core:stats.level"}, 5]}), "bob"));
}

#[test]
fn loose_and_strict_equality() {
    assert!(eval(&json!({"==": [{"var": "entity.core:stats.level"}, "5"]}), "bob"));
    assert!(!eval(&json!({"===": [{"var": "entity.core:stats.level"}, "5"]}), "bob"));
}

#[test]
fn membership_and_quantifiers() {
    assert!(eval(&json!({"in": ["tall", {"var": "entity.core:stats.tags"}]}), "bob"));
    assert!(eval(&json!({"in": ["ob", {"var": "entity.core:name.text"}]}), "bob"));
    assert!(eval(
        &json!({"some": [{"var": "entity.core:stats.tags"}, {"==": [{"var": ""}, "brave"]}]}),
        "bob"
    ));
    assert!(!eval(
        &json!({"every": [{"var": "entity.core:stats.tags"}, {"==": [{"var": ""}, "brave"]}]}),
        "bob"
    ));
    assert!(eval(
        &json!({"none": [{"var": "entity.core:stats.tags"}, {"==": [{"var": ""}, "short"]}]}),
        "bob"
    ));
}

#[test]
fn logic_and_missing() {
    assert!(eval(
        &json!({"and": [{"var": "entity.core:name"}, {"!": {"var": "entity.core:location"}}]}),
        "bob"
    ));
    assert!(eval(&json!({"or": [false, {"var": "entity.core:stats"}]}), "bob"));
    assert!(eval(&json!({"missing": ["entity.core:stats"]}), "hero"));
    assert!(!eval(&json!({"missing": ["entity.core:stats"]}), "bob"));
    assert!(eval(
        &json!({"if": [{"var": "entity.core:stats"}, true, {"==": [{"var": "entity.id"}, "hero"]}]}),
        "hero"
    ));
}

#[test]
fn if_chains_pick_the_first_true_branch() {
    let logic = json!({"if": [
        {"==": [{"var": "entity.core:name.text"}, "Bob"]}, {"var": "entity.core:stats.level"},
        {"==": [{"var": "entity.core:name.text"}, "Alice"]}, 0,
        true
    ]});
    assert!(eval(&logic, "bob"));
    assert!(!eval(&logic, "hero"));
    assert!(eval(&logic, "tavern"));
}

#[test]
fn equality_with_three_operands_is_an_error() {
    assert!(FilterExpr::compile(&json!({"==": [1, 1, 1]})).is_err());

    let world = world();
    let hero = EntityId::new("hero");
    let ctx = FilterContext::new(Subject::for_id(&world, &hero), Subject::for_id(&world, &hero));
    let expr = FilterExpr::Compare {
        op: CompareOp::Eq,
        args: vec![FilterExpr::Literal(json!(1)); 3],
    };
    let err = FilterEvaluator::new().evaluate(&expr, &ctx).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::FilterEvaluation);
}

// =============================================================================
// Errors and Condition References
// =============================================================================

#[test]
fn comparing_objects_is_an_error() {
    let err = eval_with(
        &FilterEvaluator::new(),
        &json!({">": [{"var": "entity.core:stats"}, 1]}),
        "bob",
    )
    .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::FilterEvaluation);
}

#[test]
fn condition_refs_resolve_and_detect_cycles() {
    let mut evaluator = FilterEvaluator::new();
    evaluator
        .register_condition("core:is-bob", &json!({"==": [{"var": "entity.core:name.text"}, "Bob"]}))
        .unwrap();
    assert!(eval_with(&evaluator, &json!({"condition_ref": "core:is-bob"}), "bob").unwrap());
    assert!(!eval_with(&evaluator, &json!({"condition_ref": "core:is-bob"}), "hero").unwrap());

    evaluator
        .register_condition("core:loop", &json!({"condition_ref": "core:loop"}))
        .unwrap();
    let err = eval_with(&evaluator, &json!({"condition_ref": "core:loop"}), "bob").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::FilterEvaluation);

    let err = eval_with(&evaluator, &json!({"condition_ref": "core:unknown"}), "bob").unwrap_err();
    assert!(err.to_string().contains("core:unknown"));
}

#[test]
fn unknown_operator_fails_to_compile() {
    assert!(FilterExpr::compile(&json!({"frobnicate": [1]})).is_err());
    assert!(FilterExpr::compile(&json!({"==": [1]})).is_err());
}
