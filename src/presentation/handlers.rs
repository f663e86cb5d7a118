// HTTP request handlers
use crate::application::trip_report_service::{ReportError, ReportParams};
use crate::domain::gps::Provider;
use crate::infrastructure::chunked_json::stream_from_receiver;
use crate::infrastructure::geofence_store::GeofenceStoreError;
use crate::infrastructure::report_csv;
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct ReportQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub vehicle: Option<String>,
    pub zone: Option<String>,
}

impl ReportQuery {
    fn into_params(self) -> ReportParams {
        let today = chrono::Utc::now().date_naive();
        ReportParams {
            from: self.from.unwrap_or(today),
            to: self.to.unwrap_or(today),
            vehicle_no: self.vehicle,
            zone_id: self.zone,
        }
    }
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub provider: Option<Provider>,
}

#[derive(Deserialize)]
pub struct CreatePolygonRequest {
    pub name: String,
    pub ring: Vec<[f64; 2]>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// List live vehicle snapshots from both providers
pub async fn list_vehicles(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.fleet_service.live_vehicles().await {
        Ok(vehicles) => Json(vehicles).into_response(),
        Err(e) => {
            tracing::error!("live vehicle fetch failed: {:#}", e);
            error_response(StatusCode::BAD_GATEWAY, "Tracking provider unavailable.")
        }
    }
}

/// Raw GPS history for one device
pub async fn vehicle_history(
    Path(device_id): Path<String>,
    Query(query): Query<HistoryQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let today = chrono::Utc::now().date_naive();
    let from = query.from.unwrap_or(today);
    let to = query.to.unwrap_or(today);
    let provider = query.provider.unwrap_or(Provider::Secondary);

    match state
        .fleet_service
        .vehicle_history(&device_id, from, to, provider)
        .await
    {
        Ok(fixes) => Json(fixes).into_response(),
        Err(e) => {
            tracing::error!("history fetch failed for {}: {:#}", device_id, e);
            error_response(StatusCode::BAD_GATEWAY, "Tracking provider unavailable.")
        }
    }
}

/// List dump zones
pub async fn list_polygons(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.zone_store.list() {
        Ok(polygons) => Json(polygons).into_response(),
        Err(e) => store_error_response(&e),
    }
}

/// Create a dump zone
pub async fn create_polygon(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreatePolygonRequest>,
) -> impl IntoResponse {
    if request.name.trim().is_empty() {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, "Polygon name is required.");
    }

    match state.zone_store.create(request.name.trim(), request.ring) {
        Ok(polygon) => (StatusCode::CREATED, Json(polygon)).into_response(),
        Err(e) => store_error_response(&e),
    }
}

/// Delete a dump zone
pub async fn delete_polygon(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    match state.zone_store.delete(&id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => store_error_response(&e),
    }
}

/// Full trip report for a date range
pub async fn trip_report(
    Query(query): Query<ReportQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let params = query.into_params();
    match state.report_service.generate(&params).await {
        Ok(report) => Json(report).into_response(),
        Err(e) => report_error_response(&e),
    }
}

/// Trip report streamed vehicle by vehicle
pub async fn stream_trip_report(
    Query(query): Query<ReportQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let params = query.into_params();
    match state.streaming_service.stream_report(&params).await {
        Ok(rx) => stream_from_receiver(rx).into_response(),
        Err(e) => report_error_response(&e),
    }
}

/// Trip report as a CSV attachment
pub async fn export_trip_report(
    Query(query): Query<ReportQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let params = query.into_params();
    let report = match state.report_service.generate(&params).await {
        Ok(report) => report,
        Err(e) => return report_error_response(&e),
    };

    match report_csv::trips_to_csv(&report.trips) {
        Ok(csv) => {
            let filename = format!("Secondary_Trip_Report_{}_{}.csv", params.from, params.to);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/csv".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", filename),
                    ),
                ],
                csv,
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("CSV export failed: {:#}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Export failed.")
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn report_error_response(error: &ReportError) -> Response {
    match error {
        ReportError::Store(inner) => store_error_response(inner),
        ReportError::NoZonesDefined => {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, &error.to_string())
        }
        ReportError::NoVehiclesMatched => error_response(StatusCode::NOT_FOUND, &error.to_string()),
        ReportError::ZoneNotFound(id) => {
            tracing::warn!("report rejected: zone {} is not in the stored set", id);
            error_response(StatusCode::NOT_FOUND, &error.to_string())
        }
        ReportError::TrackerUnavailable(_) => {
            tracing::error!("report aborted: {}", error);
            error_response(StatusCode::BAD_GATEWAY, &error.to_string())
        }
    }
}

fn store_error_response(error: &GeofenceStoreError) -> Response {
    match error {
        GeofenceStoreError::Geometry(e) => {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, &e.to_string())
        }
        e => {
            tracing::error!("zone storage failure: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Polygon storage unavailable.",
            )
        }
    }
}
