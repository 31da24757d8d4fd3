//! Rendering boundary.
//!
//! The engine never draws anything itself; it narrates marker and overlay
//! changes to a [`RenderSurface`]. A real frontend would adapt these calls
//! to its map widget. [`RecordingSurface`] captures them instead, which is
//! how headless runs and the integration tests observe the map.

use crate::entity::{EntityKey, GeoEntity};
use crate::geo::LatLng;
use crate::route::RouteStep;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Callback attached to a marker, fired when the user clicks it.
pub type MarkerClickHandler = Arc<dyn Fn(GeoEntity) + Send + Sync>;

/// Receiver of marker and overlay mutations.
///
/// Calls arrive from the engine task in plan order: removals first, then
/// additions. Implementations hold whatever widget state they need.
pub trait RenderSurface: Send {
    /// Creates a marker for `entity`, wiring `on_click` to marker clicks.
    fn add_marker(&mut self, entity: &GeoEntity, on_click: MarkerClickHandler);

    /// Destroys the marker with this identity, if present.
    fn remove_marker(&mut self, key: &EntityKey);

    /// Draws the route overlay, or clears it when `steps` is `None`.
    fn set_route_overlay(&mut self, steps: Option<&[RouteStep]>);

    /// Moves the viewport to `center` at `zoom`.
    fn set_viewport(&mut self, center: LatLng, zoom: u8);
}

// ====== Recording surface ======

/// One recorded surface mutation, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    MarkerAdded(EntityKey),
    MarkerRemoved(EntityKey),
    RouteSet { steps: usize },
    RouteCleared,
    ViewportSet { center: LatLng, zoom: u8 },
}

#[derive(Default)]
struct SurfaceState {
    markers: HashMap<EntityKey, (GeoEntity, MarkerClickHandler)>,
    route: Option<Vec<RouteStep>>,
    viewport: Option<(LatLng, u8)>,
    ops: Vec<SurfaceOp>,
}

/// A surface that records every call for later inspection.
///
/// Cloning shares the underlying state, so tests keep a handle while the
/// engine owns the boxed copy. [`click`](RecordingSurface::click) plays the
/// user back into the engine through the marker's stored handler.
#[derive(Clone, Default)]
pub struct RecordingSurface {
    inner: Arc<Mutex<SurfaceState>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, SurfaceState> {
        self.inner.lock().expect("surface state lock poisoned")
    }

    /// Number of live markers.
    pub fn marker_count(&self) -> usize {
        self.state().markers.len()
    }

    /// Whether a marker with this identity is live.
    pub fn contains(&self, key: &EntityKey) -> bool {
        self.state().markers.contains_key(key)
    }

    /// The currently drawn route steps, if any.
    pub fn route(&self) -> Option<Vec<RouteStep>> {
        self.state().route.clone()
    }

    /// The last viewport set, if any.
    pub fn viewport(&self) -> Option<(LatLng, u8)> {
        self.state().viewport
    }

    /// Every operation recorded so far, in call order.
    pub fn ops(&self) -> Vec<SurfaceOp> {
        self.state().ops.clone()
    }

    /// Simulates the user clicking the marker with this identity.
    ///
    /// Returns false when no such marker is live. The handler runs outside
    /// the state lock.
    pub fn click(&self, key: &EntityKey) -> bool {
        let found = {
            let state = self.state();
            state
                .markers
                .get(key)
                .map(|(entity, handler)| (entity.clone(), Arc::clone(handler)))
        };
        match found {
            Some((entity, handler)) => {
                handler(entity);
                true
            }
            None => false,
        }
    }
}

impl RenderSurface for RecordingSurface {
    fn add_marker(&mut self, entity: &GeoEntity, on_click: MarkerClickHandler) {
        let mut state = self.state();
        let key = entity.key();
        state.ops.push(SurfaceOp::MarkerAdded(key.clone()));
        state.markers.insert(key, (entity.clone(), on_click));
    }

    fn remove_marker(&mut self, key: &EntityKey) {
        let mut state = self.state();
        state.ops.push(SurfaceOp::MarkerRemoved(key.clone()));
        state.markers.remove(key);
    }

    fn set_route_overlay(&mut self, steps: Option<&[RouteStep]>) {
        let mut state = self.state();
        match steps {
            Some(steps) => {
                state.ops.push(SurfaceOp::RouteSet { steps: steps.len() });
                state.route = Some(steps.to_vec());
            }
            None => {
                state.ops.push(SurfaceOp::RouteCleared);
                state.route = None;
            }
        }
    }

    fn set_viewport(&mut self, center: LatLng, zoom: u8) {
        let mut state = self.state();
        state.ops.push(SurfaceOp::ViewportSet { center, zoom });
        state.viewport = Some((center, zoom));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::SafetyLevel;

    fn safety_zone() -> GeoEntity {
        GeoEntity::Safety {
            position: LatLng::new(37.7749, -122.4194).unwrap(),
            level: SafetyLevel::Medium,
        }
    }

    fn noop_handler() -> MarkerClickHandler {
        Arc::new(|_| {})
    }

    #[test]
    fn test_add_and_remove_marker() {
        let surface = RecordingSurface::new();
        let mut boxed: Box<dyn RenderSurface> = Box::new(surface.clone());
        let entity = safety_zone();

        boxed.add_marker(&entity, noop_handler());
        assert_eq!(surface.marker_count(), 1);
        assert!(surface.contains(&entity.key()));

        boxed.remove_marker(&entity.key());
        assert_eq!(surface.marker_count(), 0);
        assert_eq!(
            surface.ops(),
            vec![
                SurfaceOp::MarkerAdded(entity.key()),
                SurfaceOp::MarkerRemoved(entity.key()),
            ]
        );
    }

    #[test]
    fn test_click_invokes_stored_handler() {
        let surface = RecordingSurface::new();
        let mut boxed: Box<dyn RenderSurface> = Box::new(surface.clone());
        let entity = safety_zone();

        let clicked: Arc<Mutex<Option<GeoEntity>>> = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&clicked);
        let handler: MarkerClickHandler = Arc::new(move |entity| {
            *sink.lock().unwrap() = Some(entity);
        });

        boxed.add_marker(&entity, handler);
        assert!(surface.click(&entity.key()));
        assert_eq!(clicked.lock().unwrap().as_ref(), Some(&entity));
    }

    #[test]
    fn test_click_unknown_marker_returns_false() {
        let surface = RecordingSurface::new();
        assert!(!surface.click(&safety_zone().key()));
    }

    #[test]
    fn test_route_overlay_set_and_clear() {
        let surface = RecordingSurface::new();
        let mut boxed: Box<dyn RenderSurface> = Box::new(surface.clone());
        let steps = vec![RouteStep {
            name: "Depart".to_string(),
            position: LatLng::new(37.7749, -122.4194).unwrap(),
        }];

        boxed.set_route_overlay(Some(&steps));
        assert_eq!(surface.route().as_deref(), Some(steps.as_slice()));

        boxed.set_route_overlay(None);
        assert_eq!(surface.route(), None);
    }

    #[test]
    fn test_viewport_recorded() {
        let surface = RecordingSurface::new();
        let mut boxed: Box<dyn RenderSurface> = Box::new(surface.clone());
        let center = LatLng::new(37.7749, -122.4194).unwrap();

        boxed.set_viewport(center, 13);

        assert_eq!(surface.viewport(), Some((center, 13)));
    }
}
