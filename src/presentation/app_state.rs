// Application state for HTTP handlers
use crate::application::fleet_service::FleetService;
use crate::application::streaming_report_service::StreamingReportService;
use crate::application::trip_report_service::TripReportService;
use crate::infrastructure::geofence_store::GeofenceStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub fleet_service: FleetService,
    pub report_service: TripReportService,
    pub streaming_service: StreamingReportService,
    pub zone_store: Arc<GeofenceStore>,
}
