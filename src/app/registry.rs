//! Identity-keyed entity storage
//!
//! This module provides the registry type backing both entity kinds: a
//! mapping from identity key to entity with idempotent upsert, lookup and
//! removal. The registries exclusively own entity lifetime; the view holds
//! only render handles keyed by the same identities.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Whether an upsert constructed a new entity or updated an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

impl UpsertOutcome {
    pub fn is_created(self) -> bool {
        matches!(self, UpsertOutcome::Created)
    }
}

/// Generic mapping from identity key to entity
///
/// Insertion order is irrelevant; snapshot order is preserved by the caller
/// where it matters. No interior locking: all mutation happens on the single
/// cooperative thread that owns the registries.
#[derive(Debug)]
pub struct EntityRegistry<K, V> {
    entries: HashMap<K, V>,
}

impl<K, V> Default for EntityRegistry<K, V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K, V> EntityRegistry<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Insert-or-update under one key
    ///
    /// If the key is absent, `create` constructs the entity. If present,
    /// `update` mutates the existing entity in place — the entity is never
    /// replaced, so render handles held against this key stay valid.
    pub fn upsert<C, U>(&mut self, key: K, create: C, update: U) -> UpsertOutcome
    where
        C: FnOnce() -> V,
        U: FnOnce(&mut V),
    {
        match self.entries.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(create());
                UpsertOutcome::Created
            }
            Entry::Occupied(mut slot) => {
                update(slot.get_mut());
                UpsertOutcome::Updated
            }
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.entries.get_mut(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Delete the entry, returning it; no-op returning None if absent
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key)
    }

    /// Current key set, for snapshot-vs-registry set difference
    pub fn keys(&self) -> HashSet<K> {
        self.entries.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_creates_when_absent() {
        let mut registry: EntityRegistry<String, u32> = EntityRegistry::new();
        let outcome = registry.upsert("a".to_string(), || 1, |_| unreachable!());
        assert_eq!(outcome, UpsertOutcome::Created);
        assert_eq!(registry.get(&"a".to_string()), Some(&1));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_upsert_updates_in_place_when_present() {
        let mut registry: EntityRegistry<String, u32> = EntityRegistry::new();
        registry.upsert("a".to_string(), || 1, |_| {});
        let outcome = registry.upsert("a".to_string(), || unreachable!(), |v| *v += 10);
        assert_eq!(outcome, UpsertOutcome::Updated);
        assert_eq!(registry.get(&"a".to_string()), Some(&11));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_is_noop_when_absent() {
        let mut registry: EntityRegistry<String, u32> = EntityRegistry::new();
        assert_eq!(registry.remove(&"missing".to_string()), None);
        registry.upsert("a".to_string(), || 7, |_| {});
        assert_eq!(registry.remove(&"a".to_string()), Some(7));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_keys_reflect_live_entries() {
        let mut registry: EntityRegistry<String, u32> = EntityRegistry::new();
        registry.upsert("a".to_string(), || 1, |_| {});
        registry.upsert("b".to_string(), || 2, |_| {});
        registry.remove(&"a".to_string());

        let keys = registry.keys();
        assert_eq!(keys.len(), 1);
        assert!(keys.contains("b"));
    }

    #[test]
    fn test_iter_visits_all_entries() {
        let mut registry: EntityRegistry<String, u32> = EntityRegistry::new();
        registry.upsert("a".to_string(), || 1, |_| {});
        registry.upsert("b".to_string(), || 2, |_| {});
        let total: u32 = registry.iter().map(|(_, v)| v).sum();
        assert_eq!(total, 3);
    }
}
