//! Favorites registry.
//!
//! A small ordered collection of saved entities, keyed by identity.
//! Mutations are idempotent: adding a favorite twice or removing one that
//! is not there reports a no-op instead of erroring, and callers notify
//! only when something actually changed.

use crate::entity::{EntityKey, GeoEntity};

/// Saved entities in the order they were added.
///
/// Backed by a Vec; favorites lists are small enough that linear identity
/// scans beat maintaining an index.
#[derive(Debug, Default)]
pub struct FavoritesRegistry {
    entries: Vec<GeoEntity>,
}

impl FavoritesRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Saves an entity. Returns false when its identity is already saved,
    /// leaving the existing entry untouched.
    pub fn add(&mut self, entity: GeoEntity) -> bool {
        if self.contains(&entity.key()) {
            return false;
        }
        self.entries.push(entity);
        true
    }

    /// Removes the favorite with this identity, returning it if present.
    pub fn remove(&mut self, key: &EntityKey) -> Option<GeoEntity> {
        let index = self.entries.iter().position(|entry| entry.key() == *key)?;
        Some(self.entries.remove(index))
    }

    pub fn contains(&self, key: &EntityKey) -> bool {
        self.entries.iter().any(|entry| entry.key() == *key)
    }

    /// Saved entities in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &GeoEntity> {
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
    use crate::geo::LatLng;

    fn restaurant(name: &str) -> GeoEntity {
        GeoEntity::Restaurant {
            position: LatLng::new(37.7749, -122.4194).unwrap(),
            name: name.to_string(),
            price: "$".to_string(),
        }
    }

    #[test]
    fn test_add_and_contains() {
        let mut favorites = FavoritesRegistry::new();

        assert!(favorites.add(restaurant("Taco Town")));
        assert!(favorites.contains(&restaurant("Taco Town").key()));
        assert_eq!(favorites.len(), 1);
    }

    #[test]
    fn test_add_duplicate_identity_is_noop() {
        let mut favorites = FavoritesRegistry::new();
        favorites.add(restaurant("Taco Town"));

        assert!(!favorites.add(restaurant("Taco Town")));
        assert_eq!(favorites.len(), 1);
    }

    #[test]
    fn test_remove_returns_saved_entity() {
        let mut favorites = FavoritesRegistry::new();
        favorites.add(restaurant("Taco Town"));

        let removed = favorites.remove(&restaurant("Taco Town").key());

        assert_eq!(removed, Some(restaurant("Taco Town")));
        assert!(favorites.is_empty());
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut favorites = FavoritesRegistry::new();
        assert_eq!(favorites.remove(&restaurant("Nowhere").key()), None);
    }

    #[test]
    fn test_iteration_preserves_insertion_order() {
        let mut favorites = FavoritesRegistry::new();
        favorites.add(restaurant("First"));
        favorites.add(restaurant("Second"));
        favorites.add(restaurant("Third"));
        favorites.remove(&restaurant("Second").key());

        let names: Vec<_> = favorites.iter().filter_map(|e| e.name()).collect();
        assert_eq!(names, vec!["First", "Third"]);
    }
}
