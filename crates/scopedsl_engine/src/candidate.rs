//! Intermediate resolution results.

use std::borrow::Cow;
use std::collections::BTreeSet;

use scopedsl_foundation::{EntityId, EntitySet, JsonValue};

/// Candidates flowing between resolvers.
///
/// Entity candidates are kept as a set. Value candidates (component data
/// reached by property access) are kept in insertion order, deduplicated by
/// JSON equality, and borrowed from the entity manager where possible.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CandidateSet<'w> {
    entities: BTreeSet<EntityId>,
    values: Vec<Cow<'w, JsonValue>>,
}

impl<'w> CandidateSet<'w> {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set of entity candidates.
    #[must_use]
    pub fn from_entities(entities: impl IntoIterator<Item = EntityId>) -> Self {
        Self {
            entities: entities.into_iter().collect(),
            values: Vec::new(),
        }
    }

    /// Adds an entity candidate.
    pub fn insert_entity(&mut self, id: EntityId) {
        self.entities.insert(id);
    }

    /// Adds a value candidate unless an equal one is present.
    pub fn insert_value(&mut self, value: Cow<'w, JsonValue>) {
        if !self.values.iter().any(|v| **v == *value) {
            self.values.push(value);
        }
    }

    /// Merges another set into this one.
    pub fn extend(&mut self, other: Self) {
        self.entities.extend(other.entities);
        for value in other.values {
            self.insert_value(value);
        }
    }

    /// Returns the entity candidates.
    #[must_use]
    pub fn entities(&self) -> &BTreeSet<EntityId> {
        &self.entities
    }

    /// Returns the value candidates.
    #[must_use]
    pub fn values(&self) -> &[Cow<'w, JsonValue>] {
        &self.values
    }

    /// Returns the total number of candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len() + self.values.len()
    }

    /// Returns true if there are no candidates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.values.is_empty()
    }

    /// Splits into entity and value candidates.
    #[must_use]
    pub fn into_parts(self) -> (BTreeSet<EntityId>, Vec<Cow<'w, JsonValue>>) {
        (self.entities, self.values)
    }

    /// Keeps the entity candidates and drops values.
    #[must_use]
    pub fn into_entities(self) -> EntitySet {
        self.entities
    }
}

impl FromIterator<EntityId> for CandidateSet<'_> {
    fn from_iter<I: IntoIterator<Item = EntityId>>(iter: I) -> Self {
        Self::from_entities(iter)
    }
}
