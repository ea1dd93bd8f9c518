//! Scenario tests
//!
//! Each test mirrors a typical game-side use: inventories, filtered actor
//! lists, misconfigured definitions, and a traced resolution.

use scopedsl_debug::Tracer;
use scopedsl_engine::{ActorContext, ScopeEngine};
use scopedsl_foundation::{EntityId, EntitySet, ErrorCategory, ErrorKind};
use scopedsl_language::parse_scope;
use scopedsl_storage::World;
use serde_json::json;

const DEFINITIONS: &str = r#"
// Everything the actor carries
items:actor_inventory_items := actor.core:inventory.items[]

// Other actors sharing the actor's location
positioning:close_actors := location.core:location.occupants[][{"!=": [{"var": "entity.id"}, {"var": "actor.id"}]}]

items:equipped := actor.core:equipment.slots[].itemId
items:everything := items:actor_inventory_items + items:equipped
"#;

fn world() -> World {
    World::new()
        .with_entity(
            "hero",
            [
                ("core:name", json!({"text": "Alice"})),
                ("core:actor", json!({})),
                ("core:inventory", json!({"items": ["item1", "item2"]})),
                (
                    "core:equipment",
                    json!({"slots": [
                        {"slot": "hand", "itemId": "sword"},
                        {"slot": "head", "itemId": null}
                    ]}),
                ),
            ],
        )
        .with_entity("bob", [("core:name", json!({"text": "Bob"})), ("core:actor", json!({}))])
        .with_entity("carol", [("core:name", json!({"text": "Carol"})), ("core:actor", json!({}))])
        .with_entity("item1", [("core:item", json!({"weight": 1}))])
        .with_entity("item2", [("core:item", json!({"weight": 2}))])
        .with_entity("sword", [("core:item", json!({"weight": 8}))])
        .with_entity(
            "tavern",
            [("core:location", json!({"occupants": ["hero", "bob", "carol"]}))],
        )
}

fn engine() -> ScopeEngine {
    let mut engine = ScopeEngine::new();
    let count = engine.register_definitions(DEFINITIONS).unwrap();
    assert_eq!(count, 4);
    engine
}

fn hero() -> ActorContext {
    ActorContext::new("hero").with_location("tavern")
}

fn ids(set: &EntitySet) -> Vec<&str> {
    set.iter().map(EntityId::as_str).collect()
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn inventory_items() {
    let result = engine()
        .resolve("items:actor_inventory_items", &hero(), &world())
        .unwrap();
    assert_eq!(ids(&result), vec!["item1", "item2"]);
}

#[test]
fn close_actors_filtered_by_name() {
    let engine = engine();
    let expr = parse_scope(
        r#"positioning:close_actors[{"==": [{"var": "entity.components.core:name.text"}, "Bob"]}]"#,
    )
    .unwrap();
    let result = engine.resolve_expr(&expr, &hero(), &world()).unwrap();
    assert_eq!(ids(&result), vec!["bob"]);

    let everyone = engine
        .resolve("positioning:close_actors", &hero(), &world())
        .unwrap();
    assert_eq!(ids(&everyone), vec!["bob", "carol"]);
}

#[test]
fn self_reference_is_a_cycle() {
    let mut engine = engine();
    engine.register_definitions("mod:a := mod:a").unwrap();

    let err = engine.resolve("mod:a", &hero(), &world()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::CyclicScope);
    assert!(matches!(&err.kind, ErrorKind::CyclicScope { chain } if chain == &["mod:a", "mod:a"]));
    assert_eq!(err.to_string(), "cyclic scope reference: mod:a -> mod:a");

    let recorded = engine.errors().recent(1);
    assert_eq!(recorded[0].code, "SCOPE_2002");
    assert_eq!(recorded[0].scope_id.as_deref(), Some("mod:a"));
}

#[test]
fn mutual_recursion_reports_the_whole_chain() {
    let mut engine = engine();
    engine
        .register_definitions("mod:a := actor + mod:b\nmod:b := mod:a")
        .unwrap();
    let err = engine.resolve("mod:a", &hero(), &world()).unwrap_err();
    assert_eq!(err.to_string(), "cyclic scope reference: mod:a -> mod:b -> mod:a");
}

#[test]
fn traced_filter_over_ten_entities() {
    let mut world = World::new();
    for i in 0..10 {
        world = world.with_entity(format!("npc{i}"), [("core:npc", json!({"level": i}))]);
    }
    let mut engine = ScopeEngine::new();
    engine
        .register_scope_source(
            "npcs:veterans",
            r#"entities(core:npc)[{">=": [{"var": "entity.core:npc.level"}, 7]}]"#,
        )
        .unwrap();

    let mut tracer = Tracer::enabled();
    let result = engine
        .resolve_traced("npcs:veterans", &ActorContext::new("npc0"), &world, &mut tracer)
        .unwrap();
    assert_eq!(ids(&result), vec!["npc7", "npc8", "npc9"]);

    let stats = tracer.stats();
    assert_eq!(stats.step_count(), 3);
    assert_eq!(stats.filters.count, 10);
    assert_eq!(stats.filters.passed, 3);

    let sum: f64 = stats.percentages().iter().map(|(_, p)| p).sum();
    if !stats.exclusive_total().is_zero() {
        assert!((sum - 100.0).abs() <= 20.0, "sum was {sum}");
    }
}

// =============================================================================
// Missing data
// =============================================================================

#[test]
fn null_and_missing_paths_yield_nothing() {
    let engine = engine();
    let world = world();
    for source in [
        "actor.core:missing",
        "actor.core:inventory.nothing",
        "actor.core:equipment.slots[].nothing",
        "location.core:location.occupants[].core:name",
    ] {
        let expr = parse_scope(source).unwrap();
        let result = engine.resolve_expr(&expr, &hero(), &world).unwrap();
        assert!(result.is_empty(), "{source} gave {result:?}");
    }

    // The empty head slot is skipped; the sword is kept.
    let equipped = engine.resolve("items:equipped", &hero(), &world).unwrap();
    assert_eq!(ids(&equipped), vec!["sword"]);
}

#[test]
fn missing_values_compare_as_null() {
    let engine = engine();
    let expr = parse_scope(
        r#"entities(core:actor)[{"==": [{"var": "entity.core:inventory.items"}, null]}]"#,
    )
    .unwrap();
    let result = engine.resolve_expr(&expr, &hero(), &world()).unwrap();
    assert_eq!(ids(&result), vec!["bob", "carol"]);
}

#[test]
fn missing_location_degrades_to_empty() {
    let engine = engine();
    let nowhere = ActorContext::new("hero");

    let err = engine
        .resolve("positioning:close_actors", &nowhere, &world())
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::MissingDependency);

    let result = engine.resolve_or_empty("positioning:close_actors", &nowhere, &world());
    assert!(result.is_empty());
    assert_eq!(engine.errors().count(ErrorCategory::MissingDependency), 2);
}

#[test]
fn unions_merge_without_duplicates() {
    let result = engine()
        .resolve("items:everything", &hero(), &world())
        .unwrap();
    assert_eq!(ids(&result), vec!["item1", "item2", "sword"]);
}
