// Trip report service - Use case for building trip reports
use crate::application::tracking_repository::TrackingRepository;
use crate::domain::geofence::DumpPolygon;
use crate::domain::gps::VehicleSnapshot;
use crate::domain::report::{SkippedVehicle, TripReport};
use crate::domain::trip_detector::TripDetector;
use crate::infrastructure::geofence_store::{GeofenceStore, GeofenceStoreError};
use chrono::NaiveDate;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct ReportParams {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub vehicle_no: Option<String>,
    pub zone_id: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("No Dump Zones defined. Create a Dump Zone first.")]
    NoZonesDefined,
    #[error("No vehicles found.")]
    NoVehiclesMatched,
    #[error("Selected Dump Zone not found.")]
    ZoneNotFound(String),
    #[error("Vehicle list unavailable: {0}")]
    TrackerUnavailable(String),
    #[error(transparent)]
    Store(#[from] GeofenceStoreError),
}

#[derive(Clone)]
pub struct TripReportService {
    repository: Arc<dyn TrackingRepository>,
    store: Arc<GeofenceStore>,
    detector: TripDetector,
}

impl TripReportService {
    pub fn new(
        repository: Arc<dyn TrackingRepository>,
        store: Arc<GeofenceStore>,
        detector: TripDetector,
    ) -> Self {
        Self {
            repository,
            store,
            detector,
        }
    }

    /// Run the report over every selected vehicle, one at a time. A vehicle
    /// whose history cannot be fetched is recorded as skipped and the run
    /// continues.
    pub async fn generate(&self, params: &ReportParams) -> Result<TripReport, ReportError> {
        let (vehicles, polygons) =
            resolve_targets(&self.store, self.repository.as_ref(), params).await?;

        let mut trips = Vec::new();
        let mut skipped = Vec::new();
        let mut processed = 0usize;
        let total = vehicles.len();

        for (index, vehicle) in vehicles.iter().enumerate() {
            tracing::info!("processing {} ({}/{})", vehicle.vehicle_no, index + 1, total);

            match self
                .repository
                .vehicle_history(vehicle.tracking_id(), params.from, params.to, vehicle.provider)
                .await
            {
                Ok(history) => {
                    if !history.is_empty() {
                        trips.extend(self.detector.analyze_trips(&history, &polygons));
                    }
                    processed += 1;
                }
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", vehicle.vehicle_no, e);
                    skipped.push(SkippedVehicle {
                        vehicle_no: vehicle.vehicle_no.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(TripReport::new(
            params.from,
            params.to,
            trips,
            processed,
            skipped,
        ))
    }
}

/// Shared precondition checks for the batch and streaming paths. Order
/// matters: the zone-set check comes before any tracker call, and the
/// zone filter is only applied once vehicles are known to exist.
pub(crate) async fn resolve_targets(
    store: &GeofenceStore,
    repository: &dyn TrackingRepository,
    params: &ReportParams,
) -> Result<(Vec<VehicleSnapshot>, Vec<DumpPolygon>), ReportError> {
    let all_polygons = store.list()?;
    if all_polygons.is_empty() {
        return Err(ReportError::NoZonesDefined);
    }

    let mut vehicles = repository
        .live_vehicles()
        .await
        .map_err(|e| ReportError::TrackerUnavailable(format!("{e:#}")))?;
    if let Some(wanted) = &params.vehicle_no {
        vehicles.retain(|vehicle| &vehicle.vehicle_no == wanted);
    }
    if vehicles.is_empty() {
        return Err(ReportError::NoVehiclesMatched);
    }

    let polygons = match &params.zone_id {
        Some(id) => {
            let selected: Vec<DumpPolygon> = all_polygons
                .into_iter()
                .filter(|polygon| &polygon.id == id)
                .collect();
            if selected.is_empty() {
                return Err(ReportError::ZoneNotFound(id.clone()));
            }
            selected
        }
        None => all_polygons,
    };

    Ok((vehicles, polygons))
}
