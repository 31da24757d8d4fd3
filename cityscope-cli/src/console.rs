//! Terminal front-end pieces: the rendering surface and the notice printer.
//!
//! The surface narrates marker and overlay changes through `tracing`
//! instead of drawing them. Marker click handlers are discarded; this
//! front-end drives selection through the engine handle instead. Notices
//! are printed as plain lines, one per event.

use cityscope::entity::{EntityKey, GeoEntity};
use cityscope::geo::LatLng;
use cityscope::notify::Notice;
use cityscope::route::RouteStep;
use cityscope::surface::{MarkerClickHandler, RenderSurface};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

// ====== Surface ======

/// Surface that logs every map mutation to the terminal.
#[derive(Debug, Default)]
pub struct ConsoleSurface {
    markers: usize,
}

impl ConsoleSurface {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RenderSurface for ConsoleSurface {
    fn add_marker(&mut self, entity: &GeoEntity, _on_click: MarkerClickHandler) {
        self.markers += 1;
        info!(
            layer = %entity.layer(),
            marker = %entity,
            total = self.markers,
            "Marker added"
        );
    }

    fn remove_marker(&mut self, key: &EntityKey) {
        self.markers = self.markers.saturating_sub(1);
        info!(marker = %key, total = self.markers, "Marker removed");
    }

    fn set_route_overlay(&mut self, steps: Option<&[RouteStep]>) {
        match steps {
            Some(steps) => info!(steps = steps.len(), "Route overlay drawn"),
            None => info!("Route overlay cleared"),
        }
    }

    fn set_viewport(&mut self, center: LatLng, zoom: u8) {
        info!(center = %center, zoom, "Viewport moved");
    }
}

// ====== Notice printer ======

/// One printable line for a notice.
pub fn describe(notice: &Notice) -> String {
    match notice {
        Notice::RefreshSucceeded { layers, entities } => {
            format!("Map refreshed: {} layers, {} places", layers, entities)
        }
        Notice::RefreshFailed { layer, message } => {
            format!("Could not refresh {}: {}", layer, message)
        }
        Notice::SearchSucceeded { query, hits } => {
            format!("Search \"{}\": {} result(s)", query, hits)
        }
        Notice::SearchFailed { query, message } => {
            format!("Search \"{}\" failed: {}", query, message)
        }
        Notice::FavoriteAdded { label } => {
            format!("Added to favorites: {}", label)
        }
        Notice::FavoriteRemoved { label } => {
            format!("Removed from favorites: {}", label)
        }
        Notice::RoutePlanned {
            distance_km,
            time_minutes,
            steps,
        } => {
            format!(
                "Route ready: {:.1} km, about {:.0} min, {} steps",
                distance_km, time_minutes, steps
            )
        }
        Notice::RouteFailed { message } => {
            format!("Route planning failed: {}", message)
        }
    }
}

/// Prints notices as they arrive, until shutdown or the channel closes.
pub fn spawn_notice_printer(
    mut notices: broadcast::Receiver<Notice>,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    debug!("Notice printer cancelled");
                    break;
                }

                result = notices.recv() => {
                    match result {
                        Ok(notice) => println!("• {}", describe(&notice)),
                        Err(broadcast::error::RecvError::Closed) => {
                            debug!("Notice channel closed");
                            break;
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!(missed = n, "Notice printer lagged");
                        }
                    }
                }
            }
        }
    })
}
