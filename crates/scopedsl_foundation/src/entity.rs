//! Entity identifiers, read-only entity views, and the storage seam.

use std::borrow::{Borrow, Cow};
use std::collections::BTreeSet;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::path;

/// Entity identifier.
///
/// Identifiers are content-defined strings (`"item1"`, `"core:player"`), shared
/// behind an `Arc` so cloning never allocates.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct EntityId(Arc<str>);

impl EntityId {
    /// Creates a new entity ID.
    #[must_use]
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for EntityId {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(Arc::from(id))
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A resolved scope: a set of entity IDs.
///
/// Iteration order is stable but carries no meaning.
pub type EntitySet = BTreeSet<EntityId>;

/// Component data for one entity, keyed by namespaced component id.
pub type ComponentMap = im::OrdMap<String, Value>;

// =============================================================================
// Entity View
// =============================================================================

/// Read-only projection of an entity: its ID and component data.
///
/// Views borrow from the entity manager and live for one resolution.
#[derive(Clone, Copy, Debug)]
pub struct EntityView<'a> {
    id: &'a EntityId,
    components: &'a ComponentMap,
}

impl<'a> EntityView<'a> {
    /// Creates a view over borrowed entity data.
    #[must_use]
    pub const fn new(id: &'a EntityId, components: &'a ComponentMap) -> Self {
        Self { id, components }
    }

    /// Returns the entity ID.
    #[must_use]
    pub const fn id(&self) -> &'a EntityId {
        self.id
    }

    /// Returns all component data.
    #[must_use]
    pub const fn components(&self) -> &'a ComponentMap {
        self.components
    }

    /// Returns a component's data, if present.
    #[must_use]
    pub fn component(&self, component: &str) -> Option<&'a Value> {
        self.components.get(component)
    }

    /// Returns true if the entity carries the component.
    #[must_use]
    pub fn has_component(&self, component: &str) -> bool {
        self.components.contains_key(component)
    }

    /// Resolves a path relative to this entity.
    ///
    /// - `[]` → the whole entity as `{"id", "components"}`
    /// - `["id"]` → the id string
    /// - `["components", ...]` → the component object, or a path into one component
    /// - `["ns:comp", ...]` → shorthand for `["components", "ns:comp", ...]`
    ///
    /// Missing steps yield `None`. Paths into a component stay borrowed.
    #[must_use]
    pub fn lookup<S: AsRef<str>>(&self, segments: &[S]) -> Option<Cow<'a, Value>> {
        let Some((first, rest)) = segments.split_first() else {
            return Some(Cow::Owned(self.to_json()));
        };
        match first.as_ref() {
            "id" if rest.is_empty() => Some(Cow::Owned(Value::String(self.id.to_string()))),
            "components" => match rest.split_first() {
                None => Some(Cow::Owned(self.components_json())),
                Some((component, fields)) => self
                    .component(component.as_ref())
                    .and_then(|data| path::walk(data, fields))
                    .map(Cow::Borrowed),
            },
            component if path::is_component_id(component) => self
                .component(component)
                .and_then(|data| path::walk(data, rest))
                .map(Cow::Borrowed),
            _ => None,
        }
    }

    /// Converts all component data into a JSON object.
    #[must_use]
    pub fn components_json(&self) -> Value {
        let map: Map<String, Value> = self
            .components
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Value::Object(map)
    }

    /// Converts the whole entity into a JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("id".to_string(), Value::String(self.id.to_string()));
        map.insert("components".to_string(), self.components_json());
        Value::Object(map)
    }
}

// =============================================================================
// Entity Manager
// =============================================================================

/// Read access to entity/component storage.
///
/// The scope engine never mutates entities; it only needs lookup by ID and
/// by component. Lookups are expected to be O(1) or O(log n).
pub trait EntityManager {
    /// Returns a view of the entity with the given ID.
    fn entity(&self, id: &str) -> Option<EntityView<'_>>;

    /// Returns every entity ID.
    fn entity_ids(&self) -> Vec<EntityId>;

    /// Returns true if the entity exists.
    fn has_entity(&self, id: &str) -> bool {
        self.entity(id).is_some()
    }

    /// Returns a single component's data.
    fn component(&self, id: &str, component: &str) -> Option<&Value> {
        self.entity(id).and_then(|view| view.component(component))
    }

    /// Returns the IDs of all entities carrying `component`.
    ///
    /// The default scans every entity; stores with a component index should
    /// override it.
    fn entities_with_component(&self, component: &str) -> Vec<EntityId> {
        self.entity_ids()
            .into_iter()
            .filter(|id| self.component(id, component).is_some())
            .collect()
    }
}
