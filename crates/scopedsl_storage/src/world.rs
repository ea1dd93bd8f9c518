//! World state management with immutable snapshots.
//!
//! The `World` is the reference [`EntityManager`]: a persistent map from
//! entity ID to component data plus a component index. It uses `im`
//! collections for O(1) cloning and structural sharing, so a resolution can
//! borrow a snapshot while the owner builds the next one.

use im::OrdMap;
use scopedsl_foundation::{
    ComponentMap, EntityId, EntityManager, EntityView, Error, ErrorKind, Result,
};
use serde_json::Value;

use crate::component::ComponentIndex;

#[cfg(feature = "serde")]
mod serde_support {
    use super::World;
    use scopedsl_foundation::EntityId;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::{Map, Value};

    /// On-disk form: `{"entities": [{"id": ..., "components": {...}}]}`.
    ///
    /// The component index is rebuilt on load.
    #[derive(Serialize, Deserialize)]
    struct Snapshot {
        entities: Vec<EntitySnapshot>,
    }

    #[derive(Serialize, Deserialize)]
    struct EntitySnapshot {
        id: EntityId,
        #[serde(default)]
        components: Map<String, Value>,
    }

    impl Serialize for World {
        fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            let entities = self
                .entities
                .values()
                .map(|record| EntitySnapshot {
                    id: record.id.clone(),
                    components: record
                        .components
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect(),
                })
                .collect();
            Snapshot { entities }.serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for World {
        fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            let snapshot = Snapshot::deserialize(deserializer)?;
            let mut world = World::new();
            for entity in snapshot.entities {
                world = world.with_entity(entity.id, entity.components);
            }
            Ok(world)
        }
    }
}

/// Stored data for one entity.
#[derive(Clone, Debug)]
struct EntityRecord {
    id: EntityId,
    components: ComponentMap,
}

/// Immutable snapshot of entity/component state.
///
/// Clone is O(1) due to structural sharing.
/// All mutation methods return a new `World` instance.
#[derive(Clone, Debug, Default)]
pub struct World {
    /// Entities keyed by ID.
    entities: OrdMap<EntityId, EntityRecord>,
    /// Component → entities index.
    index: ComponentIndex,
}

impl World {
    /// Creates a new empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if the entity exists.
    #[must_use]
    pub fn exists(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    /// Returns an iterator over all entity IDs, in ID order.
    pub fn entities(&self) -> impl Iterator<Item = &EntityId> + '_ {
        self.entities.keys()
    }

    /// Returns the component index.
    #[must_use]
    pub fn index(&self) -> &ComponentIndex {
        &self.index
    }

    /// Gets a component's data.
    #[must_use]
    pub fn get(&self, id: &str, component: &str) -> Option<&Value> {
        self.entities
            .get(id)
            .and_then(|record| record.components.get(component))
    }

    // --- Builders ---

    /// Inserts or replaces an entity with the given components.
    ///
    /// Builder form of [`World::spawn`] that never fails; used for fixtures
    /// and snapshot loading.
    #[must_use]
    pub fn with_entity<I, K>(mut self, id: impl Into<EntityId>, components: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let id = id.into();
        if let Some(old) = self.entities.get(id.as_str()).cloned() {
            for component in old.components.keys() {
                self.index.remove(component, &id);
            }
        }

        let components: ComponentMap = components
            .into_iter()
            .map(|(k, v)| (k.into(), v))
            .collect();
        for component in components.keys() {
            self.index.insert(component, id.clone());
        }
        self.entities.insert(
            id.clone(),
            EntityRecord {
                id,
                components,
            },
        );
        self
    }

    // --- Entity Operations ---

    /// Spawns a new entity.
    ///
    /// # Errors
    ///
    /// Returns an error if an entity with the same ID already exists.
    pub fn spawn<I, K>(&self, id: impl Into<EntityId>, components: I) -> Result<World>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let id = id.into();
        if self.exists(&id) {
            return Err(Error::new(ErrorKind::EntityExists(id)));
        }
        Ok(self.clone().with_entity(id, components))
    }

    /// Sets a component value on an existing entity.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity does not exist.
    pub fn set(&self, id: &str, component: &str, value: Value) -> Result<World> {
        let mut record = self.record(id)?.clone();
        record.components.insert(component.to_string(), value);

        let mut world = self.clone();
        world.index.insert(component, record.id.clone());
        world.entities.insert(record.id.clone(), record);
        Ok(world)
    }

    /// Removes a component from an entity. Removing an absent component is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity does not exist.
    pub fn remove_component(&self, id: &str, component: &str) -> Result<World> {
        let mut record = self.record(id)?.clone();
        if record.components.remove(component).is_none() {
            return Ok(self.clone());
        }

        let mut world = self.clone();
        world.index.remove(component, &record.id);
        world.entities.insert(record.id.clone(), record);
        Ok(world)
    }

    /// Destroys an entity and all of its components.
    ///
    /// References to it held by other entities are left dangling; resolvers
    /// skip them.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity does not exist.
    pub fn destroy(&self, id: &str) -> Result<World> {
        let record = self.record(id)?;

        let mut world = self.clone();
        for component in record.components.keys() {
            world.index.remove(component, &record.id);
        }
        world.entities.remove(id);
        Ok(world)
    }

    fn record(&self, id: &str) -> Result<&EntityRecord> {
        self.entities
            .get(id)
            .ok_or_else(|| Error::entity_not_found(EntityId::new(id)))
    }
}

impl EntityManager for World {
    fn entity(&self, id: &str) -> Option<EntityView<'_>> {
        self.entities
            .get(id)
            .map(|record| EntityView::new(&record.id, &record.components))
    }

    fn entity_ids(&self) -> Vec<EntityId> {
        self.entities.keys().cloned().collect()
    }

    fn has_entity(&self, id: &str) -> bool {
        self.exists(id)
    }

    fn component(&self, id: &str, component: &str) -> Option<&Value> {
        self.get(id, component)
    }

    fn entities_with_component(&self, component: &str) -> Vec<EntityId> {
        self.index.entities(component)
    }
}
