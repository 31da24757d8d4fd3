//! Domain entities rendered on the map.
//!
//! Every entity belongs to exactly one layer and carries a stable identity
//! key. Identity is what the marker reconciler diffs on: a safety zone is
//! identified by its position, while restaurants and events are identified
//! by name so that a corrected coordinate updates in place rather than
//! producing a remove/add pair.

use crate::geo::LatLng;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

// ====== Layers ======

/// The data layers the map renders, in draw order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Safety,
    Restaurants,
    Events,
}

impl LayerKind {
    /// All layers in their fixed draw order: safety first, events last.
    pub const ALL: [LayerKind; 3] = [
        LayerKind::Safety,
        LayerKind::Restaurants,
        LayerKind::Events,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Safety => "safety",
            LayerKind::Restaurants => "restaurants",
            LayerKind::Events => "events",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ====== Safety levels ======

/// Severity rating attached to a safety zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SafetyLevel::Low => "low",
            SafetyLevel::Medium => "medium",
            SafetyLevel::High => "high",
        };
        write!(f, "{}", s)
    }
}

// ====== Entities ======

/// A single mappable item with a validated position.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GeoEntity {
    Safety {
        position: LatLng,
        level: SafetyLevel,
    },
    Restaurant {
        position: LatLng,
        name: String,
        price: String,
    },
    Event {
        position: LatLng,
        name: String,
        date: NaiveDate,
    },
}

impl GeoEntity {
    /// The layer this entity belongs to.
    pub fn layer(&self) -> LayerKind {
        match self {
            GeoEntity::Safety { .. } => LayerKind::Safety,
            GeoEntity::Restaurant { .. } => LayerKind::Restaurants,
            GeoEntity::Event { .. } => LayerKind::Events,
        }
    }

    /// The entity's position on the map.
    pub fn position(&self) -> LatLng {
        match self {
            GeoEntity::Safety { position, .. }
            | GeoEntity::Restaurant { position, .. }
            | GeoEntity::Event { position, .. } => *position,
        }
    }

    /// The entity's name, if it has one. Safety zones are anonymous.
    pub fn name(&self) -> Option<&str> {
        match self {
            GeoEntity::Safety { .. } => None,
            GeoEntity::Restaurant { name, .. } | GeoEntity::Event { name, .. } => {
                Some(name)
            }
        }
    }

    /// Human-readable label for notifications and logs.
    pub fn label(&self) -> String {
        match self.name() {
            Some(name) => name.to_string(),
            None => format!("safety zone at {}", self.position()),
        }
    }

    /// The stable identity key used to match this entity across refreshes.
    pub fn key(&self) -> EntityKey {
        match self {
            GeoEntity::Safety { position, .. } => EntityKey::positioned(
                LayerKind::Safety,
                position.latitude(),
                position.longitude(),
            ),
            GeoEntity::Restaurant { name, .. } => {
                EntityKey::named(LayerKind::Restaurants, name)
            }
            GeoEntity::Event { name, .. } => EntityKey::named(LayerKind::Events, name),
        }
    }
}

impl fmt::Display for GeoEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoEntity::Safety { position, level } => {
                write!(f, "safety zone ({}) at {}", level, position)
            }
            GeoEntity::Restaurant {
                position,
                name,
                price,
            } => {
                write!(f, "restaurant '{}' ({}) at {}", name, price, position)
            }
            GeoEntity::Event {
                position,
                name,
                date,
            } => {
                write!(f, "event '{}' on {} at {}", name, date, position)
            }
        }
    }
}

// ====== Identity keys ======

/// Stable identity of an entity across refresh cycles.
///
/// Named entities (restaurants, events) are keyed by layer and name, so a
/// provider correcting a coordinate moves the existing marker's identity
/// rather than churning it. Anonymous entities (safety zones) fall back to
/// their exact position, bit-compared so the key is hashable without
/// tolerating float drift.
///
/// Two same-layer entities sharing a name collapse to one key; the view
/// keeps whichever the provider listed first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityKey {
    Named {
        layer: LayerKind,
        name: String,
    },
    Positioned {
        layer: LayerKind,
        lat_bits: u64,
        lng_bits: u64,
    },
}

impl EntityKey {
    pub fn named(layer: LayerKind, name: &str) -> Self {
        EntityKey::Named {
            layer,
            name: name.to_string(),
        }
    }

    pub fn positioned(layer: LayerKind, latitude: f64, longitude: f64) -> Self {
        EntityKey::Positioned {
            layer,
            lat_bits: latitude.to_bits(),
            lng_bits: longitude.to_bits(),
        }
    }

    /// The layer this key belongs to.
    pub fn layer(&self) -> LayerKind {
        match self {
            EntityKey::Named { layer, .. } | EntityKey::Positioned { layer, .. } => {
                *layer
            }
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKey::Named { layer, name } => write!(f, "{}/{}", layer, name),
            EntityKey::Positioned {
                layer,
                lat_bits,
                lng_bits,
            } => {
                write!(
                    f,
                    "{}@{:.4},{:.4}",
                    layer,
                    f64::from_bits(*lat_bits),
                    f64::from_bits(*lng_bits)
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn restaurant(name: &str, lat: f64, lng: f64) -> GeoEntity {
        GeoEntity::Restaurant {
            position: LatLng::new(lat, lng).unwrap(),
            name: name.to_string(),
            price: "$$".to_string(),
        }
    }

    fn safety(lat: f64, lng: f64, level: SafetyLevel) -> GeoEntity {
        GeoEntity::Safety {
            position: LatLng::new(lat, lng).unwrap(),
            level,
        }
    }

    #[test]
    fn test_layer_draw_order() {
        assert_eq!(
            LayerKind::ALL,
            [
                LayerKind::Safety,
                LayerKind::Restaurants,
                LayerKind::Events
            ]
        );
    }

    #[test]
    fn test_named_key_survives_position_change() {
        let before = restaurant("Taco Town", 37.7749, -122.4194);
        let after = restaurant("Taco Town", 37.7750, -122.4200);

        assert_eq!(before.key(), after.key());
    }

    #[test]
    fn test_positioned_key_changes_with_position() {
        let here = safety(37.7749, -122.4194, SafetyLevel::Low);
        let there = safety(37.7750, -122.4194, SafetyLevel::Low);

        assert_ne!(here.key(), there.key());
    }

    #[test]
    fn test_positioned_key_ignores_level() {
        let low = safety(37.7749, -122.4194, SafetyLevel::Low);
        let high = safety(37.7749, -122.4194, SafetyLevel::High);

        assert_eq!(low.key(), high.key());
    }

    #[test]
    fn test_same_name_different_layer_distinct_keys() {
        let restaurant = EntityKey::named(LayerKind::Restaurants, "Festival");
        let event = EntityKey::named(LayerKind::Events, "Festival");

        assert_ne!(restaurant, event);
    }

    #[test]
    fn test_label_uses_name_when_present() {
        let entity = restaurant("Pasta Paradise", 37.7749, -122.4194);
        assert_eq!(entity.label(), "Pasta Paradise");
    }

    #[test]
    fn test_label_describes_anonymous_safety_zone() {
        let entity = safety(37.7749, -122.4194, SafetyLevel::Medium);
        assert_eq!(entity.label(), "safety zone at 37.7749, -122.4194");
    }

    #[test]
    fn test_key_display() {
        let named = EntityKey::named(LayerKind::Restaurants, "Taco Town");
        assert_eq!(named.to_string(), "restaurants/Taco Town");

        let positioned = EntityKey::positioned(LayerKind::Safety, 37.7749, -122.4194);
        assert_eq!(positioned.to_string(), "safety@37.7749,-122.4194");
    }
}
