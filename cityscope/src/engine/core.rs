//! The engine task.
//!
//! All mutable map state lives inside a single task; handles and marker
//! click callbacks talk to it through a command channel. Provider calls
//! never run on the engine task itself: each fetch is spawned off with a
//! deadline and reports back through a completion channel, so the engine
//! stays responsive while any number of fetches are in flight.
//!
//! ```text
//!  EngineHandle ----\
//!                    +--> commands ---> +-----------+
//!  marker clicks ---/                   |           |---> RenderSurface
//!                                       | MapEngine |
//!  fetch tasks ------> completions ---> |  (task)   |---> NoticeSink
//!                                       +-----------+
//! ```
//!
//! Refresh cycles fetch all three layers concurrently, at most one cycle
//! at a time; ticks landing mid-cycle are coalesced. Search and route
//! responses carry sequence numbers and are dropped when superseded.

use crate::engine::command::{Completion, EngineCommand};
use crate::engine::config::{DisplayMode, EngineConfig};
use crate::engine::handle::EngineHandle;
use crate::engine::status::EngineStatus;
use crate::engine::EngineError;
use crate::entity::{GeoEntity, LayerKind};
use crate::favorites::FavoritesRegistry;
use crate::notify::{Notice, NoticeSink};
use crate::provider::types::{
    LayerRecords, MapDataProvider, ProviderError, RouteProvider, RouteRecord,
    SearchProvider, SearchRecord,
};
use crate::reconcile::{self, OverlayOp};
use crate::route::{Route, RouteOutcome, RoutePlanner, RouteSeq};
use crate::search::{SearchHit, SearchOutcome, SearchSeq, SearchSession};
use crate::selection::SelectionController;
use crate::store::MapLayerStore;
use crate::surface::{MarkerClickHandler, RenderSurface};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const COMPLETION_CHANNEL_CAPACITY: usize = 16;

/// Owns all map state and applies every mutation in one place.
pub struct MapEngine<D, S, R>
where
    D: MapDataProvider + 'static,
    S: SearchProvider + 'static,
    R: RouteProvider + 'static,
{
    config: EngineConfig,
    data: Arc<D>,
    search_provider: Arc<S>,
    route_provider: Arc<R>,
    surface: Box<dyn RenderSurface>,
    sink: Arc<dyn NoticeSink>,

    store: MapLayerStore,
    selection: SelectionController,
    favorites: FavoritesRegistry,
    search: SearchSession,
    planner: RoutePlanner,
    display_mode: DisplayMode,

    /// Entities currently rendered on the surface, in draw order.
    rendered: Vec<GeoEntity>,
    /// The route currently drawn on the surface.
    overlaid: Option<Route>,

    command_tx: mpsc::Sender<EngineCommand>,
    command_rx: mpsc::Receiver<EngineCommand>,
    completion_tx: mpsc::Sender<Completion>,
    completion_rx: mpsc::Receiver<Completion>,

    /// Layers still fetching in the current refresh cycle.
    in_flight: HashSet<LayerKind>,
    refresh_cycle: u64,
    cycle_failures: usize,
    refreshes_completed: u64,
    refreshes_coalesced: u64,
}

impl<D, S, R> MapEngine<D, S, R>
where
    D: MapDataProvider + 'static,
    S: SearchProvider + 'static,
    R: RouteProvider + 'static,
{
    /// Creates an engine and the handle that talks to it.
    ///
    /// The engine does nothing until [`run`](MapEngine::run) is spawned.
    pub fn new(
        config: EngineConfig,
        data: Arc<D>,
        search_provider: Arc<S>,
        route_provider: Arc<R>,
        surface: Box<dyn RenderSurface>,
        sink: Arc<dyn NoticeSink>,
    ) -> (Self, EngineHandle) {
        let (command_tx, command_rx) = mpsc::channel(config.command_capacity);
        let (completion_tx, completion_rx) = mpsc::channel(COMPLETION_CHANNEL_CAPACITY);
        let handle = EngineHandle::new(command_tx.clone());

        let engine = Self {
            config,
            data,
            search_provider,
            route_provider,
            surface,
            sink,
            store: MapLayerStore::new(),
            selection: SelectionController::new(),
            favorites: FavoritesRegistry::new(),
            search: SearchSession::new(),
            planner: RoutePlanner::new(),
            display_mode: DisplayMode::default(),
            rendered: Vec::new(),
            overlaid: None,
            command_tx,
            command_rx,
            completion_tx,
            completion_rx,
            in_flight: HashSet::new(),
            refresh_cycle: 0,
            cycle_failures: 0,
            refreshes_completed: 0,
            refreshes_coalesced: 0,
        };
        (engine, handle)
    }

    /// Runs the engine until `shutdown` is cancelled.
    ///
    /// The first refresh starts immediately; later ones follow the
    /// configured interval, skipping ticks that pile up behind a slow
    /// cycle.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(
            provider = %self.data.name(),
            refresh_interval = ?self.config.refresh_interval,
            "Map engine starting"
        );
        self.surface
            .set_viewport(self.config.home_center, self.config.home_zoom);

        let mut ticker = tokio::time::interval(self.config.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Map engine shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    self.start_refresh();
                }
                Some(completion) = self.completion_rx.recv() => {
                    self.handle_completion(completion);
                }
                Some(command) = self.command_rx.recv() => {
                    self.handle_command(command);
                }
            }
        }

        info!(
            refreshes = self.refreshes_completed,
            coalesced = self.refreshes_coalesced,
            "Map engine stopped"
        );
    }

    // ====== Refresh ======

    /// Starts a refresh cycle, or coalesces the request into the cycle
    /// already running.
    fn start_refresh(&mut self) {
        if !self.in_flight.is_empty() {
            self.refreshes_coalesced += 1;
            debug!(
                cycle = self.refresh_cycle,
                "Refresh request coalesced into running cycle"
            );
            return;
        }

        self.refresh_cycle += 1;
        self.cycle_failures = 0;
        debug!(cycle = self.refresh_cycle, "Refresh cycle started");

        for layer in LayerKind::ALL {
            self.in_flight.insert(layer);
            self.spawn_layer_fetch(layer);
        }
    }

    fn spawn_layer_fetch(&self, layer: LayerKind) {
        let provider = Arc::clone(&self.data);
        let tx = self.completion_tx.clone();
        let cycle = self.refresh_cycle;
        let deadline = self.config.provider_timeout;

        tokio::spawn(async move {
            let result = match layer {
                LayerKind::Safety => {
                    with_deadline(provider.fetch_safety(), deadline)
                        .await
                        .map(LayerRecords::Safety)
                }
                LayerKind::Restaurants => {
                    with_deadline(provider.fetch_restaurants(), deadline)
                        .await
                        .map(LayerRecords::Restaurants)
                }
                LayerKind::Events => {
                    with_deadline(provider.fetch_events(), deadline)
                        .await
                        .map(LayerRecords::Events)
                }
            };
            let _ = tx.send(Completion::Layer { cycle, layer, result }).await;
        });
    }

    fn finish_layer(
        &mut self,
        cycle: u64,
        layer: LayerKind,
        result: Result<LayerRecords, ProviderError>,
    ) {
        if cycle != self.refresh_cycle || !self.in_flight.remove(&layer) {
            debug!(cycle, layer = %layer, "Discarded layer response from a stale cycle");
            return;
        }

        match result {
            Ok(records) => {
                let rejected = match records {
                    LayerRecords::Safety(records) => {
                        self.store.ingest(LayerKind::Safety, records)
                    }
                    LayerRecords::Restaurants(records) => {
                        self.store.ingest(LayerKind::Restaurants, records)
                    }
                    LayerRecords::Events(records) => {
                        self.store.ingest(LayerKind::Events, records)
                    }
                };
                if rejected > 0 {
                    warn!(layer = %layer, rejected, "Layer snapshot arrived with invalid records");
                }
                debug!(
                    layer = %layer,
                    entities = self.store.entity_count(layer),
                    "Layer snapshot updated"
                );
                self.sync_surface();
            }
            Err(err) => {
                self.cycle_failures += 1;
                warn!(layer = %layer, error = %err, "Layer fetch failed; keeping previous snapshot");
                self.sink.notify(Notice::RefreshFailed {
                    layer,
                    message: err.to_string(),
                });
            }
        }

        if self.in_flight.is_empty() {
            self.refreshes_completed += 1;
            debug!(
                cycle,
                failures = self.cycle_failures,
                "Refresh cycle finished"
            );
            if self.cycle_failures == 0 {
                let entities = LayerKind::ALL
                    .iter()
                    .map(|&kind| self.store.entity_count(kind))
                    .sum();
                self.sink.notify(Notice::RefreshSucceeded {
                    layers: LayerKind::ALL.len(),
                    entities,
                });
            }
        }
    }

    // ====== Search ======

    fn start_search(&mut self, query: String) -> Result<(), EngineError> {
        if query.trim().is_empty() {
            return Err(EngineError::EmptyQuery);
        }

        let seq = self.search.begin(&query);
        debug!(query = %query, seq, "Search submitted");

        let provider = Arc::clone(&self.search_provider);
        let tx = self.completion_tx.clone();
        let deadline = self.config.provider_timeout;
        tokio::spawn(async move {
            let result = with_deadline(provider.search(&query), deadline).await;
            let _ = tx.send(Completion::Search { seq, query, result }).await;
        });
        Ok(())
    }

    fn finish_search(
        &mut self,
        seq: SearchSeq,
        query: String,
        result: Result<Vec<SearchRecord>, ProviderError>,
    ) {
        let hits = result.map(|records| {
            records
                .into_iter()
                .filter_map(|record| match SearchHit::try_from(record) {
                    Ok(hit) => Some(hit),
                    Err(err) => {
                        warn!(query = %query, error = %err, "Dropped malformed search hit");
                        None
                    }
                })
                .collect::<Vec<_>>()
        });

        match self.search.complete(seq, hits) {
            SearchOutcome::Success { hits } => {
                info!(query = %query, hits, "Search succeeded");
                self.sink.notify(Notice::SearchSucceeded { query, hits });
            }
            SearchOutcome::Failed { message } => {
                warn!(query = %query, message = %message, "Search failed");
                self.sink.notify(Notice::SearchFailed { query, message });
            }
            SearchOutcome::Stale => {}
        }
    }

    // ====== Routing ======

    fn start_route(&mut self) -> Result<(), EngineError> {
        let target = self
            .selection
            .selected()
            .ok_or(EngineError::NoSelection)?
            .clone();
        let seq = self.planner.begin(&target);
        debug!(target = %target.key(), seq, "Route planning started");

        let provider = Arc::clone(&self.route_provider);
        let tx = self.completion_tx.clone();
        let origin = self.config.home_center;
        let deadline = self.config.provider_timeout;
        tokio::spawn(async move {
            let result = with_deadline(provider.plan_route(origin, &target), deadline).await;
            let _ = tx.send(Completion::Route { seq, result }).await;
        });
        Ok(())
    }

    fn finish_route(&mut self, seq: RouteSeq, result: Result<RouteRecord, ProviderError>) {
        let route = result.and_then(|record| {
            Route::try_from(record)
                .map_err(|err| ProviderError::InvalidResponse(err.to_string()))
        });

        match self.planner.complete(seq, route) {
            RouteOutcome::Installed {
                distance_km,
                time_minutes,
                steps,
            } => {
                info!(distance_km, time_minutes, steps, "Route installed");
                self.sync_route_overlay();
                self.sink.notify(Notice::RoutePlanned {
                    distance_km,
                    time_minutes,
                    steps,
                });
            }
            RouteOutcome::Failed { message } => {
                warn!(message = %message, "Route planning failed; keeping previous route");
                self.sink.notify(Notice::RouteFailed { message });
            }
            RouteOutcome::Stale => {}
        }
    }

    // ====== Commands ======

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Layer {
                cycle,
                layer,
                result,
            } => self.finish_layer(cycle, layer, result),
            Completion::Search { seq, query, result } => {
                self.finish_search(seq, query, result)
            }
            Completion::Route { seq, result } => self.finish_route(seq, result),
        }
    }

    fn handle_command(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::Refresh => self.start_refresh(),
            EngineCommand::SetFilter { layer, visible } => {
                if self.store.set_filter(layer, visible) {
                    info!(layer = %layer, visible, "Layer filter changed");
                    self.sync_surface();
                }
            }
            EngineCommand::MarkerClicked(entity) => {
                let key = entity.key();
                debug!(key = %key, "Entity selected");
                self.selection.click(entity);
                if self.planner.retarget(&key) {
                    self.sync_route_overlay();
                }
            }
            EngineCommand::Deselect => {
                // A planned route outlives the selection that produced it
                self.selection.deselect();
            }
            EngineCommand::AddFavorite { reply } => {
                let _ = reply.send(self.add_favorite());
            }
            EngineCommand::RemoveFavorite { key, reply } => {
                let removed = self.favorites.remove(&key);
                if let Some(entity) = &removed {
                    self.sink.notify(Notice::FavoriteRemoved {
                        label: entity.label(),
                    });
                }
                let _ = reply.send(Ok(removed.is_some()));
            }
            EngineCommand::Search { query, reply } => {
                let _ = reply.send(self.start_search(query));
            }
            EngineCommand::PlanRoute { reply } => {
                let _ = reply.send(self.start_route());
            }
            EngineCommand::SetDisplayMode(mode) => {
                if self.display_mode != mode {
                    info!(mode = %mode, "Display mode changed");
                    self.display_mode = mode;
                }
            }
            EngineCommand::Status { reply } => {
                let _ = reply.send(self.status());
            }
        }
    }

    fn add_favorite(&mut self) -> Result<bool, EngineError> {
        let entity = self
            .selection
            .selected()
            .ok_or(EngineError::NoSelection)?
            .clone();
        let label = entity.label();
        let added = self.favorites.add(entity);
        if added {
            self.sink.notify(Notice::FavoriteAdded { label });
        }
        Ok(added)
    }

    // ====== Surface synchronization ======

    /// Brings the surface in line with the filtered view, then reconciles
    /// selection and route against what is actually visible.
    fn sync_surface(&mut self) {
        let view = self.store.view();
        let plan = reconcile::plan(&self.rendered, &view);

        if !plan.is_empty() {
            debug!(
                add = plan.to_add.len(),
                remove = plan.to_remove.len(),
                unchanged = plan.unchanged.len(),
                "Applying marker plan"
            );
        }
        for key in &plan.to_remove {
            self.surface.remove_marker(key);
        }
        for entity in &plan.to_add {
            let on_click = self.marker_click_handler();
            self.surface.add_marker(entity, on_click);
        }
        self.rendered = view;

        if self.selection.retain_present(&self.rendered) {
            self.planner.reset();
            self.sync_route_overlay();
        }
    }

    fn sync_route_overlay(&mut self) {
        match reconcile::route_overlay(self.overlaid.as_ref(), self.planner.route()) {
            OverlayOp::Set(route) => {
                self.surface.set_route_overlay(Some(&route.steps));
                self.overlaid = Some(route.clone());
            }
            OverlayOp::Clear => {
                self.surface.set_route_overlay(None);
                self.overlaid = None;
            }
            OverlayOp::Keep => {}
        }
    }

    /// Builds the callback a new marker fires when clicked.
    ///
    /// Clicks can land from outside the engine task, so the handler queues
    /// a command instead of mutating anything directly.
    fn marker_click_handler(&self) -> MarkerClickHandler {
        let tx = self.command_tx.clone();
        Arc::new(move |entity| {
            if let Err(err) = tx.try_send(EngineCommand::MarkerClicked(entity)) {
                warn!(error = %err, "Dropped marker click");
            }
        })
    }

    fn status(&self) -> EngineStatus {
        EngineStatus {
            display_mode: self.display_mode,
            filters: self.store.filters(),
            selection: self.selection.selected().cloned(),
            favorites: self.favorites.iter().cloned().collect(),
            search: self.search.state().clone(),
            route: self.planner.route().cloned(),
            visible: self.rendered.clone(),
            layer_counts: LayerKind::ALL.map(|kind| (kind, self.store.entity_count(kind))),
            last_refresh: LayerKind::ALL
                .iter()
                .filter_map(|&kind| self.store.last_fetched(kind))
                .max(),
            refresh_in_flight: !self.in_flight.is_empty(),
            refreshes_completed: self.refreshes_completed,
            refreshes_coalesced: self.refreshes_coalesced,
        }
    }
}

/// Wraps a provider call with the configured deadline.
async fn with_deadline<T>(
    fetch: impl Future<Output = Result<T, ProviderError>>,
    deadline: Duration,
) -> Result<T, ProviderError> {
    match tokio::time::timeout(deadline, fetch).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout {
            seconds: deadline.as_secs(),
        }),
    }
}
