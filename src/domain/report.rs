// Trip report aggregate models
use crate::domain::trip::TripEvent;
use chrono::NaiveDate;
use serde::Serialize;

/// A vehicle whose history could not be fetched; the report carries on
/// without it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedVehicle {
    pub vehicle_no: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub trips: Vec<TripEvent>,
    pub vehicles_processed: usize,
    pub skipped: Vec<SkippedVehicle>,
}

impl TripReport {
    pub fn new(
        from: NaiveDate,
        to: NaiveDate,
        trips: Vec<TripEvent>,
        vehicles_processed: usize,
        skipped: Vec<SkippedVehicle>,
    ) -> Self {
        Self {
            from,
            to,
            trips,
            vehicles_processed,
            skipped,
        }
    }
}

/// Messages emitted while a report is generated vehicle by vehicle.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ReportStreamMessage {
    Started {
        from: NaiveDate,
        to: NaiveDate,
        vehicles_total: usize,
    },
    VehicleTrips {
        vehicle_no: String,
        index: usize,
        total: usize,
        trips: Vec<TripEvent>,
    },
    VehicleSkipped {
        vehicle_no: String,
        index: usize,
        total: usize,
        reason: String,
    },
    Complete {
        trips_total: usize,
        vehicles_processed: usize,
        vehicles_skipped: usize,
        duration_ms: i64,
    },
}
