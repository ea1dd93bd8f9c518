//! Resolution tests
//!
//! Tests each node kind end to end against a small world.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use scopedsl_engine::{
    ActorContext, CandidateSet, Dispatcher, NodeResolver, ResolutionContext, ScopeEngine,
    SourceRefResolver,
};
use scopedsl_foundation::{EntityId, EntitySet, Result};
use scopedsl_language::{NodeKind, ScopeExpr, parse_scope};
use scopedsl_storage::World;
use serde_json::json;

fn world() -> World {
    World::new()
        .with_entity(
            "hero",
            [
                ("core:name", json!({"text": "Alice"})),
                ("core:inventory", json!({"items": ["item1", "item2", "ghost"]})),
                (
                    "core:equipment",
                    json!({"slots": [
                        {"slot": "hand", "itemId": "sword"},
                        {"slot": "head", "itemId": null},
                        {"slot": "back", "itemId": "ghost"}
                    ]}),
                ),
            ],
        )
        .with_entity("item1", [("core:item", json!({"weight": 1}))])
        .with_entity("item2", [("core:item", json!({"weight": 5}))])
        .with_entity("sword", [("core:item", json!({"weight": 9}))])
        .with_entity("bob", [("core:name", json!({"text": "Bob"})), ("core:actor", json!({}))])
        .with_entity("tavern", [("core:location", json!({"occupants": ["hero", "bob"]}))])
}

fn actor() -> ActorContext {
    ActorContext::new("hero").with_location("tavern")
}

fn ids(set: &EntitySet) -> Vec<&str> {
    set.iter().map(EntityId::as_str).collect()
}

fn resolve(engine: &ScopeEngine, source: &str) -> EntitySet {
    let expr = parse_scope(source).expect("parse failed");
    engine
        .resolve_expr(&expr, &actor(), &world())
        .expect("resolution failed")
}

// =============================================================================
// Sources
// =============================================================================

#[test]
fn builtin_sources() {
    let engine = ScopeEngine::new();
    assert_eq!(ids(&resolve(&engine, "actor")), vec!["hero"]);
    assert_eq!(ids(&resolve(&engine, "self")), vec!["hero"]);
    assert_eq!(ids(&resolve(&engine, "location")), vec!["tavern"]);
    assert!(resolve(&engine, "none").is_empty());
}

#[test]
fn entities_by_component() {
    let engine = ScopeEngine::new();
    assert_eq!(
        ids(&resolve(&engine, "entities(core:item)")),
        vec!["item1", "item2", "sword"]
    );
    assert_eq!(
        ids(&resolve(&engine, "entities(!core:item)")),
        vec!["bob", "hero", "tavern"]
    );
    assert!(resolve(&engine, "entities(core:nothing)").is_empty());
}

#[test]
fn registered_scopes_compose() {
    let mut engine = ScopeEngine::new();
    let count = engine
        .register_definitions(
            "items:inventory := actor.core:inventory.items[]\n\
             items:heavy := items:inventory[{\">\": [{\"var\": \"entity.core:item.weight\"}, 2]}]\n\
             items:heavy_or_here := items:heavy + location\n",
        )
        .unwrap();
    assert_eq!(count, 3);

    let result = engine.resolve("items:heavy_or_here", &actor(), &world()).unwrap();
    assert_eq!(ids(&result), vec!["item2", "tavern"]);
}

// =============================================================================
// Property Access and Iteration
// =============================================================================

#[test]
fn iteration_drops_dangling_ids() {
    let engine = ScopeEngine::new();
    assert_eq!(
        ids(&resolve(&engine, "actor.core:inventory.items[]")),
        vec!["item1", "item2"]
    );
}

#[test]
fn property_access_through_value_candidates() {
    let engine = ScopeEngine::new();
    // null and dangling itemIds disappear; "sword" becomes an entity
    assert_eq!(
        ids(&resolve(&engine, "actor.core:equipment.slots[].itemId")),
        vec!["sword"]
    );
}

#[test]
fn filter_over_value_candidates() {
    let engine = ScopeEngine::new();
    let result = resolve(
        &engine,
        r#"actor.core:equipment.slots[][{"==": [{"var": "entity.slot"}, "hand"]}].itemId"#,
    );
    assert_eq!(ids(&result), vec!["sword"]);
}

#[test]
fn location_occupants_minus_actor() {
    let engine = ScopeEngine::new();
    let result = resolve(
        &engine,
        r#"location.core:location.occupants[][{"!=": [{"var": "entity.id"}, {"var": "actor.id"}]}]"#,
    );
    assert_eq!(ids(&result), vec!["bob"]);
}

#[test]
fn non_array_iteration_is_empty() {
    let engine = ScopeEngine::new();
    assert!(resolve(&engine, "actor.core:name[]").is_empty());
    assert!(resolve(&engine, "actor[]").is_empty());
    assert!(resolve(&engine, "actor.core:missing.items[]").is_empty());
}

#[test]
fn intermediate_values_never_leak_into_results() {
    let engine = ScopeEngine::new();
    // The union contains JSON objects from the slots array; only entities come out
    let result = resolve(&engine, "actor.core:equipment.slots[] + actor");
    assert_eq!(ids(&result), vec!["hero"]);
}

// =============================================================================
// Registration
// =============================================================================

#[test]
fn scope_listing_and_removal() {
    let mut engine = ScopeEngine::new();
    engine.register_scope_source("b:two", "actor").unwrap();
    engine.register_scope_source("a:one", "none").unwrap();
    assert_eq!(engine.scope_ids(), vec!["a:one", "b:two"]);

    engine.clear_scopes();
    assert!(engine.scope_ids().is_empty());
}

#[test]
fn resolve_or_empty_on_success() {
    let mut engine = ScopeEngine::new();
    engine.register_scope_source("core:me", "actor").unwrap();
    assert_eq!(
        ids(&engine.resolve_or_empty("core:me", &actor(), &world())),
        vec!["hero"]
    );
}

// =============================================================================
// Custom Resolvers
// =============================================================================

/// Delegates to the built-in source resolver and counts calls.
struct CountingSource {
    calls: Arc<AtomicUsize>,
}

impl NodeResolver for CountingSource {
    fn name(&self) -> &'static str {
        "CountingSource"
    }

    fn resolve<'w>(
        &self,
        node: &ScopeExpr,
        env: &Dispatcher<'w>,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<CandidateSet<'w>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        SourceRefResolver.resolve(node, env, ctx)
    }
}

#[test]
fn custom_resolver_replaces_builtin() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut engine = ScopeEngine::new();
    engine.register_resolver(
        NodeKind::Source,
        Box::new(CountingSource {
            calls: Arc::clone(&calls),
        }),
    );

    let result = resolve(&engine, "actor + location + entities(core:actor)");
    assert_eq!(ids(&result), vec!["bob", "hero", "tavern"]);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(
        engine
            .resolvers()
            .names()
            .contains(&(NodeKind::Source, "CountingSource"))
    );
}
