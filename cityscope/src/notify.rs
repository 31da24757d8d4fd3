//! User-facing event notifications.
//!
//! The engine emits notices; it never decides how they are presented. A
//! frontend turns them into toasts, a headless run logs them, tests collect
//! them. Exactly one notice is emitted per completed user-visible outcome,
//! so sinks can count them without deduplicating.

use crate::entity::LayerKind;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// A user-visible event produced by the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Notice {
    /// A refresh cycle finished with every layer updated.
    RefreshSucceeded { layers: usize, entities: usize },
    /// One layer's fetch failed; its previous snapshot is still shown.
    RefreshFailed { layer: LayerKind, message: String },
    SearchSucceeded {
        query: String,
        hits: usize,
    },
    SearchFailed {
        query: String,
        message: String,
    },
    FavoriteAdded {
        label: String,
    },
    FavoriteRemoved {
        label: String,
    },
    RoutePlanned {
        distance_km: f64,
        time_minutes: f64,
        steps: usize,
    },
    /// Planning failed; any previously drawn route remains.
    RouteFailed { message: String },
}

impl Notice {
    /// Stable name for counting and filtering in sinks.
    pub fn kind(&self) -> &'static str {
        match self {
            Notice::RefreshSucceeded { .. } => "refresh_succeeded",
            Notice::RefreshFailed { .. } => "refresh_failed",
            Notice::SearchSucceeded { .. } => "search_succeeded",
            Notice::SearchFailed { .. } => "search_failed",
            Notice::FavoriteAdded { .. } => "favorite_added",
            Notice::FavoriteRemoved { .. } => "favorite_removed",
            Notice::RoutePlanned { .. } => "route_planned",
            Notice::RouteFailed { .. } => "route_failed",
        }
    }
}

/// Receiver of engine notices.
pub trait NoticeSink: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Discards every notice.
#[derive(Debug, Default)]
pub struct NullNoticeSink;

impl NoticeSink for NullNoticeSink {
    fn notify(&self, _notice: Notice) {}
}

/// Logs every notice through `tracing`, failures at warn level.
#[derive(Debug, Default)]
pub struct TracingNoticeSink;

impl NoticeSink for TracingNoticeSink {
    fn notify(&self, notice: Notice) {
        match &notice {
            Notice::RefreshSucceeded { layers, entities } => {
                info!(layers = *layers, entities = *entities, "Map data refreshed");
            }
            Notice::RefreshFailed { layer, message } => {
                warn!(layer = %layer, message = %message, "Layer refresh failed");
            }
            Notice::SearchSucceeded { query, hits } => {
                info!(query = %query, hits = *hits, "Search completed");
            }
            Notice::SearchFailed { query, message } => {
                warn!(query = %query, message = %message, "Search failed");
            }
            Notice::FavoriteAdded { label } => {
                info!(label = %label, "Added to favorites");
            }
            Notice::FavoriteRemoved { label } => {
                info!(label = %label, "Removed from favorites");
            }
            Notice::RoutePlanned {
                distance_km,
                time_minutes,
                steps,
            } => {
                info!(
                    distance_km = *distance_km,
                    time_minutes = *time_minutes,
                    steps = *steps,
                    "Route planned"
                );
            }
            Notice::RouteFailed { message } => {
                warn!(message = %message, "Route planning failed");
            }
        }
    }
}

/// Fans notices out to broadcast subscribers.
///
/// Sending never blocks; a subscriber that falls more than `capacity`
/// notices behind starts lagging and misses the oldest ones.
#[derive(Debug)]
pub struct BroadcastNoticeSink {
    tx: broadcast::Sender<Notice>,
}

impl BroadcastNoticeSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }
}

impl NoticeSink for BroadcastNoticeSink {
    fn notify(&self, notice: Notice) {
        // Send only fails when nobody is subscribed
        let _ = self.tx.send(notice);
    }
}
