//! Point-in-time engine state snapshot.

use crate::engine::config::DisplayMode;
use crate::entity::{GeoEntity, LayerKind};
use crate::route::Route;
use crate::search::SearchState;
use crate::store::FilterState;
use std::time::Instant;

/// Everything a frontend needs to render its chrome, captured atomically
/// by the engine task.
#[derive(Debug, Clone)]
pub struct EngineStatus {
    pub display_mode: DisplayMode,
    pub filters: FilterState,
    pub selection: Option<GeoEntity>,
    /// Saved favorites in the order they were added.
    pub favorites: Vec<GeoEntity>,
    pub search: SearchState,
    /// The installed route, if one has been planned and not dropped.
    pub route: Option<Route>,
    /// Entities currently rendered, in draw order.
    pub visible: Vec<GeoEntity>,
    /// Stored entity count per layer, filtered or not.
    pub layer_counts: [(LayerKind, usize); 3],
    /// When the most recent successful layer fetch landed.
    pub last_refresh: Option<Instant>,
    pub refresh_in_flight: bool,
    pub refreshes_completed: u64,
    pub refreshes_coalesced: u64,
}

impl EngineStatus {
    /// Stored entity count for one layer.
    pub fn layer_count(&self, kind: LayerKind) -> usize {
        self.layer_counts
            .iter()
            .find(|(layer, _)| *layer == kind)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }
}
