//! Integration tests for entity views and path walking
//!
//! Tests the nullable path semantics filters and property access rely on.

use scopedsl_foundation::{ComponentMap, EntityId, EntityView, path};
use serde_json::json;

fn bob() -> (EntityId, ComponentMap) {
    let components = ComponentMap::new()
        .update("core:name".to_string(), json!({"text": "Bob"}))
        .update(
            "core:inventory".to_string(),
            json!({"items": ["item1", "item2"], "slots": {"hand": "sword"}}),
        );
    (EntityId::new("bob"), components)
}

// =============================================================================
// EntityId
// =============================================================================

#[test]
fn entity_id_orders_and_borrows_as_str() {
    let mut ids = vec![EntityId::new("b"), EntityId::from("a"), EntityId::from("c".to_string())];
    ids.sort();
    let names: Vec<&str> = ids.iter().map(EntityId::as_str).collect();
    assert_eq!(names, vec!["a", "b", "c"]);

    let set: std::collections::BTreeSet<EntityId> = ids.into_iter().collect();
    assert!(set.contains("b"));
}

// =============================================================================
// EntityView Lookup
// =============================================================================

#[test]
fn lookup_long_and_short_forms_agree() {
    let (id, components) = bob();
    let view = EntityView::new(&id, &components);

    let long = view.lookup(&["components", "core:name", "text"]).unwrap();
    let short = view.lookup(&["core:name", "text"]).unwrap();
    assert_eq!(long, short);
    assert_eq!(*long, json!("Bob"));
}

#[test]
fn lookup_id_and_whole_entity() {
    let (id, components) = bob();
    let view = EntityView::new(&id, &components);

    assert_eq!(*view.lookup(&["id"]).unwrap(), json!("bob"));
    let whole = view.lookup::<&str>(&[]).unwrap();
    assert_eq!(whole["components"]["core:name"]["text"], json!("Bob"));
}

#[test]
fn lookup_missing_steps_are_none() {
    let (id, components) = bob();
    let view = EntityView::new(&id, &components);

    assert!(view.lookup(&["core:missing", "text"]).is_none());
    assert!(view.lookup(&["core:name", "text", "deeper"]).is_none());
    assert!(view.lookup(&["components", "core:inventory", "items", "7"]).is_none());
    assert!(view.lookup(&["unprefixed"]).is_none());
}

// =============================================================================
// Path Walking
// =============================================================================

#[test]
fn walk_objects_and_arrays() {
    let data = json!({"items": ["item1", {"id": "item2"}]});
    assert_eq!(path::walk(&data, &["items", "0"]), Some(&json!("item1")));
    assert_eq!(path::walk(&data, &["items", "1", "id"]), Some(&json!("item2")));
    assert_eq!(path::walk(&data, &["items", "x"]), None);
}

#[test]
fn split_keeps_component_ids_whole() {
    assert_eq!(
        path::split("entity.components.core:name.text"),
        vec!["entity", "components", "core:name", "text"]
    );
    assert!(path::split("").is_empty());
}

#[test]
fn component_id_needs_both_halves() {
    assert!(path::is_component_id("core:name"));
    assert!(!path::is_component_id("core:"));
    assert!(!path::is_component_id(":name"));
    assert!(!path::is_component_id("items"));
}
