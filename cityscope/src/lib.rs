//! Cityscope is a map state synchronization engine for layered city data.
//!
//! It keeps three data layers (safety zones, restaurants, events) fresh by
//! periodically polling async providers, reconciles the rendered markers
//! with minimal diffs instead of redrawing, and drives selection,
//! favorites, free-text search, and route planning from one task that owns
//! all mutable state. Frontends attach at two seams: a
//! [`RenderSurface`](surface::RenderSurface) receiving marker and overlay
//! mutations, and a [`NoticeSink`](notify::NoticeSink) receiving
//! user-visible events.
//!
//! Slow responses never corrupt state: layer fetches, searches, and route
//! plans all carry identifiers, and anything superseded by the time it
//! arrives is discarded.
//!
//! # Example
//!
//! ```ignore
//! use cityscope::engine::{EngineConfig, MapEngine};
//! use cityscope::notify::TracingNoticeSink;
//! use cityscope::provider::{MockDataProvider, MockRoutePlanner, MockSearchProvider};
//! use cityscope::surface::RecordingSurface;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let surface = RecordingSurface::new();
//!     let (engine, handle) = MapEngine::new(
//!         EngineConfig::default(),
//!         Arc::new(MockDataProvider::new()),
//!         Arc::new(MockSearchProvider::new()),
//!         Arc::new(MockRoutePlanner::new()),
//!         Box::new(surface.clone()),
//!         Arc::new(TracingNoticeSink),
//!     );
//!
//!     let shutdown = CancellationToken::new();
//!     let engine_task = tokio::spawn(engine.run(shutdown.clone()));
//!
//!     handle.search("best restaurants nearby").await.unwrap();
//!
//!     shutdown.cancel();
//!     engine_task.await.unwrap();
//! }
//! ```

pub mod engine;
pub mod entity;
pub mod favorites;
pub mod geo;
pub mod logging;
pub mod notify;
pub mod provider;
pub mod reconcile;
pub mod route;
pub mod search;
pub mod selection;
pub mod store;
pub mod surface;

/// Crate version, from Cargo metadata.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
