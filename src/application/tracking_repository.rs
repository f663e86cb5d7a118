// Repository trait for vehicle tracking data access
use crate::domain::gps::{GpsFix, Provider, VehicleSnapshot};
use async_trait::async_trait;
use chrono::NaiveDate;

#[async_trait]
pub trait TrackingRepository: Send + Sync {
    /// Current snapshot of every vehicle across all providers
    async fn live_vehicles(&self) -> anyhow::Result<Vec<VehicleSnapshot>>;

    /// GPS history for one vehicle over a date range (inclusive).
    /// Order is not guaranteed; rows the tracker reports with unusable
    /// coordinates or timestamps are already dropped.
    async fn vehicle_history(
        &self,
        device_id: &str,
        from: NaiveDate,
        to: NaiveDate,
        provider: Provider,
    ) -> anyhow::Result<Vec<GpsFix>>;
}
