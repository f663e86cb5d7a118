// Fleet service - Use case for querying live vehicles and raw history
use crate::application::tracking_repository::TrackingRepository;
use crate::domain::gps::{GpsFix, Provider, VehicleSnapshot};
use chrono::NaiveDate;
use std::sync::Arc;

#[derive(Clone)]
pub struct FleetService {
    repository: Arc<dyn TrackingRepository>,
}

impl FleetService {
    pub fn new(repository: Arc<dyn TrackingRepository>) -> Self {
        Self { repository }
    }

    pub async fn live_vehicles(&self) -> anyhow::Result<Vec<VehicleSnapshot>> {
        self.repository.live_vehicles().await
    }

    pub async fn vehicle_history(
        &self,
        device_id: &str,
        from: NaiveDate,
        to: NaiveDate,
        provider: Provider,
    ) -> anyhow::Result<Vec<GpsFix>> {
        self.repository
            .vehicle_history(device_id, from, to, provider)
            .await
    }
}
