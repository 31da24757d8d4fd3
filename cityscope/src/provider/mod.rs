//! Data provider abstractions and built-in mock implementations.
//!
//! The engine talks to three provider traits: [`MapDataProvider`] for layer
//! snapshots, [`SearchProvider`] for free-text queries, and
//! [`RouteProvider`] for route planning. The mock implementations simulate
//! latency and injectable failures so the full pipeline can run without any
//! network backend.

pub mod mock;
pub mod types;

pub use mock::{MockDataProvider, MockRoutePlanner, MockSearchProvider};
pub use types::{
    EventRecord, LayerRecords, MapDataProvider, ProviderError, RecordError,
    RestaurantRecord, RouteProvider, RouteRecord, RouteStepRecord, SafetyRecord,
    SearchProvider, SearchRecord,
};
