//! Marker reconciliation.
//!
//! Instead of tearing down and recreating every marker whenever data
//! arrives, the engine diffs the previous rendered view against the next
//! one by entity identity and applies only the difference. An entity whose
//! key appears on both sides keeps its marker even if its payload was
//! refreshed; for named entities that includes a corrected position.

use crate::entity::{EntityKey, GeoEntity};
use crate::route::Route;
use std::collections::HashSet;
use tracing::debug;

/// The minimal set of marker operations turning one view into the next.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkerPlan {
    /// Entities to create markers for, in view order.
    pub to_add: Vec<GeoEntity>,
    /// Marker identities to remove, in previous-view order.
    pub to_remove: Vec<EntityKey>,
    /// Identities present in both views; their markers stay untouched.
    pub unchanged: Vec<EntityKey>,
}

impl MarkerPlan {
    /// True when the plan touches no markers.
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Diffs two views by entity identity in O(prev + next).
///
/// Duplicate identities within a view keep their first occurrence and drop
/// the rest, matching how the view itself is rendered.
pub fn plan(prev: &[GeoEntity], next: &[GeoEntity]) -> MarkerPlan {
    let prev_dedup = dedup_by_key(prev);
    let next_dedup = dedup_by_key(next);

    let prev_keys: HashSet<&EntityKey> = prev_dedup.iter().map(|(key, _)| key).collect();
    let next_keys: HashSet<&EntityKey> = next_dedup.iter().map(|(key, _)| key).collect();

    let mut to_add = Vec::new();
    let mut unchanged = Vec::new();
    for (key, entity) in &next_dedup {
        if prev_keys.contains(key) {
            unchanged.push(key.clone());
        } else {
            to_add.push((*entity).clone());
        }
    }

    let to_remove = prev_dedup
        .iter()
        .filter(|(key, _)| !next_keys.contains(key))
        .map(|(key, _)| key.clone())
        .collect();

    MarkerPlan {
        to_add,
        to_remove,
        unchanged,
    }
}

fn dedup_by_key(entities: &[GeoEntity]) -> Vec<(EntityKey, &GeoEntity)> {
    let mut seen = HashSet::new();
    let mut deduped = Vec::with_capacity(entities.len());
    for entity in entities {
        let key = entity.key();
        if seen.insert(key.clone()) {
            deduped.push((key, entity));
        } else {
            debug!(key = %key, "Dropped duplicate identity from view");
        }
    }
    deduped
}

// ====== Route overlay ======

/// What to do with the route overlay after state changed.
#[derive(Debug, PartialEq)]
pub enum OverlayOp<'a> {
    /// Draw (or redraw) the overlay for this route.
    Set(&'a Route),
    /// Remove the overlay.
    Clear,
    /// The overlay already matches; leave it alone.
    Keep,
}

/// Decides whether the drawn route overlay needs updating.
pub fn route_overlay<'a>(prev: Option<&Route>, next: Option<&'a Route>) -> OverlayOp<'a> {
    match (prev, next) {
        (Some(drawn), Some(wanted)) if drawn == wanted => OverlayOp::Keep,
        (None, None) => OverlayOp::Keep,
        (_, Some(wanted)) => OverlayOp::Set(wanted),
        (_, None) => OverlayOp::Clear,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{LayerKind, SafetyLevel};
    use crate::geo::LatLng;
    use crate::route::RouteStep;
    use proptest::prelude::*;

    fn safety(lat: f64, lng: f64) -> GeoEntity {
        GeoEntity::Safety {
            position: LatLng::new(lat, lng).unwrap(),
            level: SafetyLevel::Low,
        }
    }

    fn restaurant(name: &str, lat: f64) -> GeoEntity {
        GeoEntity::Restaurant {
            position: LatLng::new(lat, -122.4194).unwrap(),
            name: name.to_string(),
            price: "$".to_string(),
        }
    }

    fn keys(entities: &[GeoEntity]) -> Vec<EntityKey> {
        entities.iter().map(|e| e.key()).collect()
    }

    #[test]
    fn test_plan_empty_to_empty_is_empty() {
        let plan = plan(&[], &[]);
        assert!(plan.is_empty());
        assert!(plan.unchanged.is_empty());
    }

    #[test]
    fn test_plan_adds_everything_to_empty_view() {
        let next = vec![safety(37.7749, -122.4194), restaurant("Taco Town", 37.7831)];

        let plan = plan(&[], &next);

        assert_eq!(plan.to_add, next);
        assert!(plan.to_remove.is_empty());
        assert!(plan.unchanged.is_empty());
    }

    #[test]
    fn test_plan_identical_views_touch_nothing() {
        let view = vec![safety(37.7749, -122.4194), restaurant("Taco Town", 37.7831)];

        let plan = plan(&view, &view);

        assert!(plan.is_empty());
        assert_eq!(plan.unchanged, keys(&view));
    }

    #[test]
    fn test_plan_preserves_order_on_both_sides() {
        let prev = vec![
            restaurant("A", 37.70),
            restaurant("B", 37.71),
            restaurant("C", 37.72),
        ];
        let next = vec![
            restaurant("D", 37.73),
            restaurant("B", 37.71),
            restaurant("E", 37.74),
        ];

        let plan = plan(&prev, &next);

        assert_eq!(
            plan.to_add,
            vec![restaurant("D", 37.73), restaurant("E", 37.74)]
        );
        assert_eq!(
            plan.to_remove,
            vec![
                EntityKey::named(LayerKind::Restaurants, "A"),
                EntityKey::named(LayerKind::Restaurants, "C"),
            ]
        );
        assert_eq!(
            plan.unchanged,
            vec![EntityKey::named(LayerKind::Restaurants, "B")]
        );
    }

    #[test]
    fn test_plan_moved_named_entity_is_unchanged() {
        // Named identity survives a position correction
        let prev = vec![restaurant("Taco Town", 37.7831)];
        let next = vec![restaurant("Taco Town", 37.7832)];

        let plan = plan(&prev, &next);

        assert!(plan.is_empty());
        assert_eq!(plan.unchanged.len(), 1);
    }

    #[test]
    fn test_plan_moved_safety_zone_churns() {
        // Positioned identity does not survive a move
        let prev = vec![safety(37.7749, -122.4194)];
        let next = vec![safety(37.7750, -122.4194)];

        let plan = plan(&prev, &next);

        assert_eq!(plan.to_add.len(), 1);
        assert_eq!(plan.to_remove.len(), 1);
        assert!(plan.unchanged.is_empty());
    }

    #[test]
    fn test_plan_duplicate_identity_keeps_first() {
        let next = vec![
            restaurant("Taco Town", 37.7831),
            restaurant("Taco Town", 37.7000),
        ];

        let plan = plan(&[], &next);

        assert_eq!(plan.to_add, vec![restaurant("Taco Town", 37.7831)]);
    }

    #[test]
    fn test_route_overlay_decisions() {
        let step = RouteStep {
            name: "Depart".to_string(),
            position: LatLng::new(37.7749, -122.4194).unwrap(),
        };
        let route = Route {
            distance_km: 1.5,
            time_minutes: 6.0,
            steps: vec![step],
        };
        let mut other = route.clone();
        other.distance_km = 2.0;

        assert_eq!(route_overlay(None, None), OverlayOp::Keep);
        assert_eq!(route_overlay(Some(&route), Some(&route)), OverlayOp::Keep);
        assert_eq!(route_overlay(None, Some(&route)), OverlayOp::Set(&route));
        assert_eq!(
            route_overlay(Some(&route), Some(&other)),
            OverlayOp::Set(&other)
        );
        assert_eq!(route_overlay(Some(&route), None), OverlayOp::Clear);
    }

    // ----- Properties -----

    /// Small pool with deliberately colliding identities.
    fn pool() -> Vec<GeoEntity> {
        vec![
            safety(37.70, -122.41),
            safety(37.71, -122.41),
            restaurant("r0", 37.70),
            restaurant("r1", 37.71),
            restaurant("r0", 37.99),
            restaurant("r2", 37.72),
        ]
    }

    fn key_set(keys: &[EntityKey]) -> HashSet<EntityKey> {
        keys.iter().cloned().collect()
    }

    proptest! {
        #[test]
        fn prop_plan_partitions_both_views(
            prev_idx in proptest::collection::vec(0..6usize, 0..10),
            next_idx in proptest::collection::vec(0..6usize, 0..10),
        ) {
            let pool = pool();
            let prev: Vec<GeoEntity> = prev_idx.iter().map(|&i| pool[i].clone()).collect();
            let next: Vec<GeoEntity> = next_idx.iter().map(|&i| pool[i].clone()).collect();

            let plan = plan(&prev, &next);

            let prev_keys: HashSet<EntityKey> = prev.iter().map(|e| e.key()).collect();
            let next_keys: HashSet<EntityKey> = next.iter().map(|e| e.key()).collect();
            let added = key_set(&keys(&plan.to_add));
            let removed = key_set(&plan.to_remove);
            let unchanged = key_set(&plan.unchanged);

            // added and unchanged partition the next view's identities
            prop_assert!(added.is_disjoint(&unchanged));
            prop_assert_eq!(
                added.union(&unchanged).cloned().collect::<HashSet<_>>(),
                next_keys.clone()
            );

            // removed and unchanged partition the previous view's identities
            prop_assert!(removed.is_disjoint(&unchanged));
            prop_assert_eq!(
                removed.union(&unchanged).cloned().collect::<HashSet<_>>(),
                prev_keys
            );

            // nothing is both added and removed
            prop_assert!(added.is_disjoint(&removed));
        }

        #[test]
        fn prop_plan_against_self_is_empty(
            idx in proptest::collection::vec(0..6usize, 0..10),
        ) {
            let pool = pool();
            let view: Vec<GeoEntity> = idx.iter().map(|&i| pool[i].clone()).collect();

            prop_assert!(plan(&view, &view).is_empty());
        }
    }
}
