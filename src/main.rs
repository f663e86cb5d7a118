// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};
use axum::{
    routing::{delete, get},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::application::fleet_service::FleetService;
use crate::application::streaming_report_service::StreamingReportService;
use crate::application::trip_report_service::TripReportService;
use crate::domain::trip_detector::TripDetector;
use crate::infrastructure::config::load_app_config;
use crate::infrastructure::geofence_store::GeofenceStore;
use crate::infrastructure::tracker_api::TrackerApiRepository;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    create_polygon, delete_polygon, export_trip_report, health_check, list_polygons,
    list_vehicles, stream_trip_report, trip_report, vehicle_history,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let app_config = load_app_config()?;

    // Create repository and zone storage (infrastructure layer)
    let repository = Arc::new(TrackerApiRepository::new(
        app_config.tracker.base_url,
        app_config.tracker.primary_key,
        app_config.tracker.secondary_key,
        Duration::from_secs(app_config.tracker.cache_ttl_secs),
    ));
    let zone_store = Arc::new(GeofenceStore::new(app_config.storage.zones_path)?);

    // Create services (application layer)
    let detector = TripDetector::new();
    let fleet_service = FleetService::new(repository.clone());
    let report_service =
        TripReportService::new(repository.clone(), zone_store.clone(), detector.clone());
    let streaming_service =
        StreamingReportService::new(repository.clone(), zone_store.clone(), detector);

    // Create application state
    let state = Arc::new(AppState {
        fleet_service,
        report_service,
        streaming_service,
        zone_store,
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/vehicles", get(list_vehicles))
        .route("/vehicles/:device_id/history", get(vehicle_history))
        .route("/zones", get(list_polygons).post(create_polygon))
        .route("/zones/:id", delete(delete_polygon))
        .route("/reports/trips", get(trip_report))
        .route("/reports/trips/stream", get(stream_trip_report))
        .route("/reports/trips/export", get(export_trip_report))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = "0.0.0.0:5000".parse().unwrap();
    println!("Starting fleet-telemetry service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
