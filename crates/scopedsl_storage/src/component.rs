//! Component index.
//!
//! Tracks which entities carry each component so `entities(ns:comp)` sources
//! do not need to scan the whole world.

use im::{HashMap, OrdSet};
use scopedsl_foundation::EntityId;

/// Persistent index from component id to the entities carrying it.
///
/// Cloning is O(1); updates share structure with the original.
#[derive(Clone, Debug, Default)]
pub struct ComponentIndex {
    by_component: HashMap<String, OrdSet<EntityId>>,
}

impl ComponentIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `entity` carries `component`.
    pub fn insert(&mut self, component: &str, entity: EntityId) {
        self.by_component
            .entry(component.to_string())
            .or_default()
            .insert(entity);
    }

    /// Records that `entity` no longer carries `component`.
    pub fn remove(&mut self, component: &str, entity: &EntityId) {
        let now_empty = match self.by_component.get_mut(component) {
            Some(set) => {
                set.remove(entity);
                set.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.by_component.remove(component);
        }
    }

    /// Returns the entities carrying `component`, in ID order.
    #[must_use]
    pub fn entities(&self, component: &str) -> Vec<EntityId> {
        self.by_component
            .get(component)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the number of entities carrying `component`.
    #[must_use]
    pub fn count(&self, component: &str) -> usize {
        self.by_component.get(component).map_or(0, OrdSet::len)
    }

    /// Returns every indexed component id, sorted.
    #[must_use]
    pub fn components(&self) -> Vec<String> {
        let mut names: Vec<String> = self.by_component.keys().cloned().collect();
        names.sort();
        names
    }
}
