//! Messages flowing into the engine task.

use crate::engine::config::DisplayMode;
use crate::engine::status::EngineStatus;
use crate::engine::EngineError;
use crate::entity::{EntityKey, GeoEntity, LayerKind};
use crate::provider::types::{LayerRecords, ProviderError, RouteRecord, SearchRecord};
use crate::route::RouteSeq;
use crate::search::SearchSeq;
use tokio::sync::oneshot;

/// A command submitted through an [`EngineHandle`](super::EngineHandle) or
/// a marker click handler.
pub(crate) enum EngineCommand {
    /// Refresh all layers now instead of waiting for the next tick.
    Refresh,
    SetFilter {
        layer: LayerKind,
        visible: bool,
    },
    /// The user clicked a marker (or selected an entity directly).
    MarkerClicked(GeoEntity),
    Deselect,
    AddFavorite {
        reply: oneshot::Sender<Result<bool, EngineError>>,
    },
    RemoveFavorite {
        key: EntityKey,
        reply: oneshot::Sender<Result<bool, EngineError>>,
    },
    Search {
        query: String,
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    PlanRoute {
        reply: oneshot::Sender<Result<(), EngineError>>,
    },
    SetDisplayMode(DisplayMode),
    Status {
        reply: oneshot::Sender<EngineStatus>,
    },
}

/// A finished background fetch, reported back to the engine task.
pub(crate) enum Completion {
    Layer {
        cycle: u64,
        layer: LayerKind,
        result: Result<LayerRecords, ProviderError>,
    },
    Search {
        seq: SearchSeq,
        query: String,
        result: Result<Vec<SearchRecord>, ProviderError>,
    },
    Route {
        seq: RouteSeq,
        result: Result<RouteRecord, ProviderError>,
    },
}
