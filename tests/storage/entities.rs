//! Entity lifecycle tests
//!
//! Tests spawn, set, remove_component, and destroy on persistent worlds.

use scopedsl_foundation::{EntityManager, ErrorKind};
use scopedsl_storage::World;
use serde_json::json;

// =============================================================================
// Spawn
// =============================================================================

#[test]
fn spawn_adds_entity_without_touching_original() {
    let empty = World::new();
    let world = empty
        .spawn("hero", [("core:name", json!({"text": "Alice"}))])
        .unwrap();

    assert_eq!(empty.entity_count(), 0);
    assert_eq!(world.entity_count(), 1);
    assert!(world.exists("hero"));
}

#[test]
fn spawn_duplicate_fails() {
    let world = World::new().with_entity("hero", [("core:actor", json!({}))]);
    let err = world.spawn("hero", [("core:actor", json!({}))]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::EntityExists(_)));
}

// =============================================================================
// Components
// =============================================================================

#[test]
fn set_overwrites_and_indexes() {
    let world = World::new().with_entity("hero", [("core:name", json!({"text": "Alice"}))]);
    let world = world
        .set("hero", "core:name", json!({"text": "Alicia"}))
        .unwrap()
        .set("hero", "core:actor", json!({}))
        .unwrap();

    assert_eq!(world.get("hero", "core:name"), Some(&json!({"text": "Alicia"})));
    assert_eq!(world.entities_with_component("core:actor").len(), 1);
}

#[test]
fn set_on_missing_entity_fails() {
    let err = World::new().set("ghost", "core:name", json!(null)).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::EntityNotFound(_)));
}

#[test]
fn remove_component_updates_index() {
    let world = World::new().with_entity(
        "lamp",
        [("core:item", json!({})), ("core:light", json!({"lit": true}))],
    );
    let world = world.remove_component("lamp", "core:light").unwrap();

    assert!(world.get("lamp", "core:light").is_none());
    assert!(world.entities_with_component("core:light").is_empty());
    assert_eq!(world.entities_with_component("core:item").len(), 1);

    // Removing again is a no-op
    assert!(world.remove_component("lamp", "core:light").is_ok());
}

#[test]
fn destroy_removes_entity_and_index_entries() {
    let world = World::new()
        .with_entity("lamp", [("core:item", json!({}))])
        .with_entity("sword", [("core:item", json!({}))]);
    let world = world.destroy("lamp").unwrap();

    assert!(!world.has_entity("lamp"));
    let items = world.entities_with_component("core:item");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].as_str(), "sword");
    assert!(world.destroy("lamp").is_err());
}
