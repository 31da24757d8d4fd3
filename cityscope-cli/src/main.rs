//! Cityscope CLI - terminal front-end for the map engine.
//!
//! Runs the engine against the built-in mock providers, narrating marker
//! changes through `tracing` and notices as printed lines, until Ctrl+C.
//! The `--demo` flag walks a scripted tour through selection, favorites,
//! search, and route planning.

mod console;
mod error;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use cityscope::engine::{DisplayMode, EngineConfig, EngineHandle, MapEngine};
use cityscope::entity::LayerKind;
use cityscope::geo::LatLng;
use cityscope::logging::init_logging;
use cityscope::notify::BroadcastNoticeSink;
use cityscope::provider::{MockDataProvider, MockRoutePlanner, MockSearchProvider};

use crate::console::{spawn_notice_printer, ConsoleSurface};
use crate::error::CliError;

#[derive(Parser)]
#[command(name = "cityscope")]
#[command(about = "Explore a city map from the terminal", long_about = None)]
struct Args {
    /// Seconds between automatic data refreshes
    #[arg(long, default_value = "60")]
    refresh_secs: u64,

    /// Simulated provider latency in milliseconds
    #[arg(long, default_value = "300")]
    latency_ms: u64,

    /// Home latitude in decimal degrees (requires --lon)
    #[arg(long, requires = "lon")]
    lat: Option<f64>,

    /// Home longitude in decimal degrees (requires --lat)
    #[arg(long, requires = "lat")]
    lon: Option<f64>,

    /// Initial zoom level
    #[arg(long, default_value = "13")]
    zoom: u8,

    /// Start in the neon display theme
    #[arg(long)]
    neon: bool,

    /// Run a scripted tour of the engine after startup
    #[arg(long)]
    demo: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        e.exit();
    }
}

async fn run(args: Args) -> Result<(), CliError> {
    init_logging("info").map_err(|e| CliError::LoggingInit(e.to_string()))?;

    let config = build_config(&args)?;

    println!("Cityscope v{}", cityscope::VERSION);
    println!("{}", "=".repeat(40));
    println!();
    println!("Refresh interval: {}s", args.refresh_secs);
    println!("Provider latency: {}ms", args.latency_ms);
    println!(
        "Home viewport:    {} (zoom {})",
        config.home_center, config.home_zoom
    );
    println!();
    println!("Press Ctrl+C to stop.");
    println!();

    let latency = Duration::from_millis(args.latency_ms);
    let data = Arc::new(MockDataProvider::new().with_latency(latency));
    let search = Arc::new(MockSearchProvider::new().with_latency(latency));
    let routes = Arc::new(MockRoutePlanner::new().with_latency(latency));

    let sink = BroadcastNoticeSink::new(64);
    let notices = sink.subscribe();

    let (engine, handle) = MapEngine::new(
        config,
        data,
        search,
        routes,
        Box::new(ConsoleSurface::new()),
        Arc::new(sink),
    );

    let shutdown = CancellationToken::new();
    let engine_task = tokio::spawn(engine.run(shutdown.clone()));
    let printer_task = spawn_notice_printer(notices, shutdown.clone());

    if args.neon {
        handle.set_display_mode(DisplayMode::Neon).await?;
    }

    if args.demo {
        demo_tour(&handle, latency).await?;
    }

    tokio::signal::ctrl_c().await.map_err(CliError::Signal)?;
    info!("Shutdown signal received");

    shutdown.cancel();
    if let Err(e) = engine_task.await {
        warn!(error = %e, "Engine task ended abnormally");
    }
    let _ = printer_task.await;

    println!();
    println!("Engine stopped. Goodbye!");

    Ok(())
}

/// Translate command-line flags into an engine configuration.
fn build_config(args: &Args) -> Result<EngineConfig, CliError> {
    if args.refresh_secs == 0 {
        return Err(CliError::Config(
            "Refresh interval must be at least 1 second".to_string(),
        ));
    }
    if !(1..=19).contains(&args.zoom) {
        return Err(CliError::Config(
            "Zoom level must be between 1 and 19".to_string(),
        ));
    }

    let mut config =
        EngineConfig::new().with_refresh_interval(Duration::from_secs(args.refresh_secs));

    if let (Some(lat), Some(lon)) = (args.lat, args.lon) {
        let center = LatLng::new(lat, lon).map_err(|e| CliError::Config(e.to_string()))?;
        config = config.with_home_viewport(center, args.zoom);
    } else {
        config.home_zoom = args.zoom;
    }

    Ok(config)
}

/// Scripted walkthrough touching each engine operation once.
///
/// Pauses between steps so the narrated log stays readable at the
/// configured provider latency.
async fn demo_tour(handle: &EngineHandle, latency: Duration) -> Result<(), CliError> {
    let pause = latency + Duration::from_millis(200);

    info!("Demo tour starting");

    // Wait for the initial refresh to put markers on the map
    let mut restaurant = None;
    for _ in 0..10 {
        sleep(pause).await;
        let status = handle.status().await?;
        restaurant = status
            .visible
            .iter()
            .find(|entity| entity.layer() == LayerKind::Restaurants)
            .cloned();
        if restaurant.is_some() {
            break;
        }
    }

    let Some(restaurant) = restaurant else {
        warn!("No restaurant marker appeared, skipping tour");
        return Ok(());
    };

    info!(marker = %restaurant, "Selecting");
    handle.select(restaurant).await?;

    if handle.add_favorite().await? {
        info!("Saved the selection to favorites");
    }

    info!("Planning a route to the selection");
    handle.plan_route().await?;
    sleep(pause).await;

    // Two quick searches; only the second should report back
    handle.search("restaurants nearby").await?;
    handle.search("events this weekend").await?;
    sleep(pause).await;

    info!(layer = %LayerKind::Events, "Hiding a layer, then restoring it");
    handle.set_filter(LayerKind::Events, false).await?;
    sleep(pause).await;
    handle.set_filter(LayerKind::Events, true).await?;

    info!("Switching to the neon theme");
    handle.set_display_mode(DisplayMode::Neon).await?;

    let status = handle.status().await?;
    info!(
        markers = status.visible.len(),
        favorites = status.favorites.len(),
        mode = %status.display_mode,
        "Demo tour complete"
    );

    Ok(())
}
