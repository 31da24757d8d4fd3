//! Built-in mock providers with fixed demo datasets.
//!
//! These stand in for real network services: every fetch sleeps for a
//! configurable latency before answering, and any call can be primed to
//! fail once with [`ProviderError::Unavailable`] to exercise error paths.

use crate::entity::{GeoEntity, LayerKind, SafetyLevel};
use crate::geo::LatLng;
use crate::provider::types::{
    EventRecord, MapDataProvider, ProviderError, RestaurantRecord, RouteProvider,
    RouteRecord, RouteStepRecord, SafetyRecord, SearchProvider, SearchRecord,
};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Default simulated latency for layer fetches.
pub const DEFAULT_LAYER_LATENCY: Duration = Duration::from_millis(300);

/// Default simulated latency for search queries.
pub const DEFAULT_SEARCH_LATENCY: Duration = Duration::from_millis(500);

/// Default simulated latency for route planning.
pub const DEFAULT_ROUTE_LATENCY: Duration = Duration::from_millis(300);

/// Assumed walking-ish speed for travel time estimates.
const ROUTE_SPEED_KMH: f64 = 15.0;

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// ====== Map data ======

/// In-memory data provider serving a fixed San Francisco dataset.
#[derive(Debug)]
pub struct MockDataProvider {
    latency: Duration,
    fail_safety: AtomicBool,
    fail_restaurants: AtomicBool,
    fail_events: AtomicBool,
    safety_calls: AtomicUsize,
    restaurant_calls: AtomicUsize,
    event_calls: AtomicUsize,
}

impl MockDataProvider {
    pub fn new() -> Self {
        Self {
            latency: DEFAULT_LAYER_LATENCY,
            fail_safety: AtomicBool::new(false),
            fail_restaurants: AtomicBool::new(false),
            fail_events: AtomicBool::new(false),
            safety_calls: AtomicUsize::new(0),
            restaurant_calls: AtomicUsize::new(0),
            event_calls: AtomicUsize::new(0),
        }
    }

    /// Overrides the simulated latency. Tests use `Duration::ZERO`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Primes the next fetch of `kind` to fail with `Unavailable`.
    pub fn fail_next(&self, kind: LayerKind) {
        self.fail_flag(kind).store(true, Ordering::SeqCst);
    }

    /// Number of fetches issued for `kind` so far.
    pub fn calls(&self, kind: LayerKind) -> usize {
        self.counter(kind).load(Ordering::SeqCst)
    }

    fn fail_flag(&self, kind: LayerKind) -> &AtomicBool {
        match kind {
            LayerKind::Safety => &self.fail_safety,
            LayerKind::Restaurants => &self.fail_restaurants,
            LayerKind::Events => &self.fail_events,
        }
    }

    fn counter(&self, kind: LayerKind) -> &AtomicUsize {
        match kind {
            LayerKind::Safety => &self.safety_calls,
            LayerKind::Restaurants => &self.restaurant_calls,
            LayerKind::Events => &self.event_calls,
        }
    }

    async fn begin_call(&self, kind: LayerKind) -> Result<(), ProviderError> {
        self.counter(kind).fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.fail_flag(kind).swap(false, Ordering::SeqCst) {
            return Err(ProviderError::Unavailable(format!("{} feed offline", kind)));
        }
        Ok(())
    }
}

impl Default for MockDataProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MapDataProvider for MockDataProvider {
    fn fetch_safety(
        &self,
    ) -> impl Future<Output = Result<Vec<SafetyRecord>, ProviderError>> + Send {
        async move {
            self.begin_call(LayerKind::Safety).await?;
            Ok(vec![
                SafetyRecord {
                    lat: 37.7749,
                    lng: -122.4194,
                    level: SafetyLevel::Low,
                },
                SafetyRecord {
                    lat: 37.7694,
                    lng: -122.4862,
                    level: SafetyLevel::Medium,
                },
                SafetyRecord {
                    lat: 37.7831,
                    lng: -122.4039,
                    level: SafetyLevel::High,
                },
            ])
        }
    }

    fn fetch_restaurants(
        &self,
    ) -> impl Future<Output = Result<Vec<RestaurantRecord>, ProviderError>> + Send {
        async move {
            self.begin_call(LayerKind::Restaurants).await?;
            Ok(vec![
                RestaurantRecord {
                    lat: 37.7749,
                    lng: -122.4194,
                    name: "Gourmet Burgers".to_string(),
                    price: "$$".to_string(),
                },
                RestaurantRecord {
                    lat: 37.7694,
                    lng: -122.4862,
                    name: "Pasta Paradise".to_string(),
                    price: "$$$".to_string(),
                },
                RestaurantRecord {
                    lat: 37.7831,
                    lng: -122.4039,
                    name: "Taco Town".to_string(),
                    price: "$".to_string(),
                },
            ])
        }
    }

    fn fetch_events(
        &self,
    ) -> impl Future<Output = Result<Vec<EventRecord>, ProviderError>> + Send {
        async move {
            self.begin_call(LayerKind::Events).await?;
            Ok(vec![
                EventRecord {
                    lat: 37.7749,
                    lng: -122.4194,
                    name: "Summer Music Festival".to_string(),
                    date: "2023-07-20".to_string(),
                },
                EventRecord {
                    lat: 37.7694,
                    lng: -122.4862,
                    name: "Art Gallery Opening".to_string(),
                    date: "2023-06-25".to_string(),
                },
                EventRecord {
                    lat: 37.7831,
                    lng: -122.4039,
                    name: "Food Truck Rally".to_string(),
                    date: "2023-08-05".to_string(),
                },
            ])
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ====== Search ======

/// In-memory search provider with canned answers.
///
/// Queries mentioning restaurants or events get themed hits; anything else
/// gets a single informational hit.
#[derive(Debug)]
pub struct MockSearchProvider {
    latency: Duration,
}

impl MockSearchProvider {
    pub fn new() -> Self {
        Self {
            latency: DEFAULT_SEARCH_LATENCY,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

impl Default for MockSearchProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchProvider for MockSearchProvider {
    fn search(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<SearchRecord>, ProviderError>> + Send {
        let query = query.to_lowercase();
        async move {
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }

            if query.contains("restaurant") {
                Ok(vec![
                    SearchRecord::Restaurant {
                        name: "Delicious Diner".to_string(),
                        description: "Affordable American cuisine".to_string(),
                        price: "$$".to_string(),
                    },
                    SearchRecord::Restaurant {
                        name: "Sushi Sensation".to_string(),
                        description: "Fresh Japanese delicacies".to_string(),
                        price: "$$$".to_string(),
                    },
                ])
            } else if query.contains("event") {
                Ok(vec![
                    SearchRecord::Event {
                        name: "San Francisco Street Fair".to_string(),
                        description: "Annual cultural celebration".to_string(),
                        date: "2023-07-15".to_string(),
                    },
                    SearchRecord::Event {
                        name: "Tech Meetup".to_string(),
                        description: "Networking event for tech professionals".to_string(),
                        date: "2023-06-30".to_string(),
                    },
                ])
            } else {
                Ok(vec![SearchRecord::Info {
                    description: "I'm sorry, I couldn't find specific information \
                                  about that. Can you try rephrasing your question?"
                        .to_string(),
                }])
            }
        }
    }
}

// ====== Routing ======

/// In-memory route planner producing straight-line three-step routes.
///
/// Distance is great-circle; travel time assumes a fixed speed. Both are
/// rounded to one decimal place.
#[derive(Debug)]
pub struct MockRoutePlanner {
    latency: Duration,
    fail_next: AtomicBool,
}

impl MockRoutePlanner {
    pub fn new() -> Self {
        Self {
            latency: DEFAULT_ROUTE_LATENCY,
            fail_next: AtomicBool::new(false),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Primes the next plan to fail with `Unavailable`.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

impl Default for MockRoutePlanner {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteProvider for MockRoutePlanner {
    fn plan_route(
        &self,
        origin: LatLng,
        target: &GeoEntity,
    ) -> impl Future<Output = Result<RouteRecord, ProviderError>> + Send {
        let destination = target.position();
        let label = target.label();
        async move {
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(ProviderError::Unavailable(
                    "routing service offline".to_string(),
                ));
            }

            let distance = round1(origin.distance_km(&destination));
            let time = round1(distance / ROUTE_SPEED_KMH * 60.0);
            let midpoint = origin.midpoint(&destination);

            Ok(RouteRecord {
                distance,
                time,
                steps: vec![
                    RouteStepRecord {
                        name: "Depart".to_string(),
                        lat: origin.latitude(),
                        lng: origin.longitude(),
                    },
                    RouteStepRecord {
                        name: "Continue".to_string(),
                        lat: midpoint.latitude(),
                        lng: midpoint.longitude(),
                    },
                    RouteStepRecord {
                        name: format!("Arrive at {}", label),
                        lat: destination.latitude(),
                        lng: destination.longitude(),
                    },
                ],
            })
        }
    }
}
