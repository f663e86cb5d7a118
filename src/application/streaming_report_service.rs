// Streaming trip report service - Progressive per-vehicle delivery
use crate::application::tracking_repository::TrackingRepository;
use crate::application::trip_report_service::{resolve_targets, ReportError, ReportParams};
use crate::domain::report::ReportStreamMessage;
use crate::domain::trip_detector::TripDetector;
use crate::infrastructure::geofence_store::GeofenceStore;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

#[derive(Clone)]
pub struct StreamingReportService {
    repository: Arc<dyn TrackingRepository>,
    store: Arc<GeofenceStore>,
    detector: TripDetector,
}

impl StreamingReportService {
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

    /// Resolve the vehicle and zone set up front, then emit one message per
    /// vehicle as its history is analyzed. Precondition failures surface
    /// before the first message so the caller can still return a plain error.
    pub async fn stream_report(
        &self,
        params: &ReportParams,
    ) -> Result<mpsc::Receiver<ReportStreamMessage>, ReportError> {
        let (vehicles, polygons) =
            resolve_targets(&self.store, self.repository.as_ref(), params).await?;

        let (tx, rx) = mpsc::channel(100);
        let start_time = Instant::now();
        let repository = self.repository.clone();
        let detector = self.detector.clone();
        let from = params.from;
        let to = params.to;

        tokio::spawn(async move {
            let total = vehicles.len();
            let started = ReportStreamMessage::Started {
                from,
                to,
                vehicles_total: total,
            };
            if tx.send(started).await.is_err() {
                return;
            }

            let mut trips_total = 0usize;
            let mut processed = 0usize;
            let mut skipped = 0usize;

            // Vehicles go one at a time so progress arrives in order and the
            // tracker is not hammered with parallel history queries.
            for (index, vehicle) in vehicles.iter().enumerate() {
                tracing::info!("streaming {} ({}/{})", vehicle.vehicle_no, index + 1, total);

                let msg = match repository
                    .vehicle_history(vehicle.tracking_id(), from, to, vehicle.provider)
                    .await
                {
                    Ok(history) => {
                        let trips = detector.analyze_trips(&history, &polygons);
                        trips_total += trips.len();
                        processed += 1;
                        ReportStreamMessage::VehicleTrips {
                            vehicle_no: vehicle.vehicle_no.clone(),
                            index: index + 1,
                            total,
                            trips,
                        }
                    }
                    Err(e) => {
                        tracing::warn!("skipping {}: {:#}", vehicle.vehicle_no, e);
                        skipped += 1;
                        ReportStreamMessage::VehicleSkipped {
                            vehicle_no: vehicle.vehicle_no.clone(),
                            index: index + 1,
                            total,
                            reason: e.to_string(),
                        }
                    }
                };

                // Receiver dropped means the client went away
                if tx.send(msg).await.is_err() {
                    return;
                }
            }

            let complete = ReportStreamMessage::Complete {
                trips_total,
                vehicles_processed: processed,
                vehicles_skipped: skipped,
                duration_ms: start_time.elapsed().as_millis() as i64,
            };
            let _ = tx.send(complete).await;
        });

        Ok(rx)
    }
}
