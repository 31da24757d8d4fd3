//! Layer snapshot store and visibility filters.
//!
//! Each layer holds at most one snapshot, replaced wholesale on every
//! successful fetch. The store validates raw records as they arrive and
//! rejects bad ones individually, so a single malformed record never costs
//! the layer its update.

use crate::entity::{GeoEntity, LayerKind};
use crate::provider::types::RecordError;
use std::collections::HashMap;
use std::time::Instant;
use tracing::warn;

// ====== Filters ======

/// Per-layer visibility toggles. All layers start visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterState {
    safety: bool,
    restaurants: bool,
    events: bool,
}

impl FilterState {
    pub fn visible(&self, kind: LayerKind) -> bool {
        match kind {
            LayerKind::Safety => self.safety,
            LayerKind::Restaurants => self.restaurants,
            LayerKind::Events => self.events,
        }
    }

    pub fn set(&mut self, kind: LayerKind, visible: bool) {
        match kind {
            LayerKind::Safety => self.safety = visible,
            LayerKind::Restaurants => self.restaurants = visible,
            LayerKind::Events => self.events = visible,
        }
    }
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            safety: true,
            restaurants: true,
            events: true,
        }
    }
}

// ====== Snapshots ======

#[derive(Debug)]
struct LayerSnapshot {
    entities: Vec<GeoEntity>,
    fetched_at: Instant,
}

/// Holds the latest snapshot of every layer plus the active filters.
///
/// The ordered, filtered [`view`](MapLayerStore::view) is the single source
/// of truth for what belongs on the map.
#[derive(Debug, Default)]
pub struct MapLayerStore {
    layers: HashMap<LayerKind, LayerSnapshot>,
    filters: FilterState,
}

impl MapLayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces `kind`'s snapshot with the converted records.
    ///
    /// Records that fail validation are logged and dropped one by one; the
    /// rest still land. Returns how many records were rejected.
    pub fn ingest<R>(&mut self, kind: LayerKind, records: Vec<R>) -> usize
    where
        R: TryInto<GeoEntity, Error = RecordError>,
    {
        let total = records.len();
        let mut entities = Vec::with_capacity(total);

        for record in records {
            match record.try_into() {
                Ok(entity) if entity.layer() == kind => entities.push(entity),
                Ok(entity) => {
                    warn!(
                        layer = %kind,
                        entity = %entity,
                        "Rejected record belonging to a different layer"
                    );
                }
                Err(err) => {
                    warn!(layer = %kind, error = %err, "Rejected invalid record");
                }
            }
        }

        let rejected = total - entities.len();
        self.layers.insert(
            kind,
            LayerSnapshot {
                entities,
                fetched_at: Instant::now(),
            },
        );
        rejected
    }

    /// Sets one layer's visibility. Returns whether anything changed.
    pub fn set_filter(&mut self, kind: LayerKind, visible: bool) -> bool {
        if self.filters.visible(kind) == visible {
            return false;
        }
        self.filters.set(kind, visible);
        true
    }

    pub fn filters(&self) -> FilterState {
        self.filters
    }

    /// The filtered view in draw order: safety, then restaurants, then
    /// events, each layer in provider order.
    pub fn view(&self) -> Vec<GeoEntity> {
        let mut view = Vec::new();
        for kind in LayerKind::ALL {
            if !self.filters.visible(kind) {
                continue;
            }
            if let Some(snapshot) = self.layers.get(&kind) {
                view.extend(snapshot.entities.iter().cloned());
            }
        }
        view
    }

    /// Number of stored entities for `kind`, filtered or not.
    pub fn entity_count(&self, kind: LayerKind) -> usize {
        self.layers
            .get(&kind)
            .map(|snapshot| snapshot.entities.len())
            .unwrap_or(0)
    }

    /// When `kind` last received a snapshot, if it ever has.
    pub fn last_fetched(&self, kind: LayerKind) -> Option<Instant> {
        self.layers.get(&kind).map(|snapshot| snapshot.fetched_at)
    }
}
