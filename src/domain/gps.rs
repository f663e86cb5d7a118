// Vehicle position domain models
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A single time-stamped position sample for one vehicle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GpsFix {
    pub vehicle_no: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: NaiveDateTime,
}

impl GpsFix {
    pub fn new(vehicle_no: String, latitude: f64, longitude: f64, timestamp: NaiveDateTime) -> Self {
        Self {
            vehicle_no,
            latitude,
            longitude,
            timestamp,
        }
    }

    /// Parse a tracker timestamp. The feed normally sends
    /// "2024-01-15 08:30:00"; ISO variants show up in exported files.
    pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
            return Some(ts);
        }
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(ts);
        }
        chrono::DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|ts| ts.naive_utc())
    }
}

/// Which upstream tracking account a vehicle was discovered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Primary,
    Secondary,
}

/// A vehicle as reported by the live endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleSnapshot {
    pub vehicle_no: String,
    pub device_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub speed: f64,
    pub datetime: Option<String>,
    pub provider: Provider,
}

impl VehicleSnapshot {
    /// Identifier used for history lookups. Some fleets are keyed by IMEI,
    /// others only by the plate number.
    pub fn tracking_id(&self) -> &str {
        if self.device_id.is_empty() {
            &self.vehicle_no
        } else {
            &self.device_id
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_accepts_tracker_formats() {
        let expected = chrono::NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();

        assert_eq!(GpsFix::parse_timestamp("2024-01-15 08:30:00"), Some(expected));
        assert_eq!(GpsFix::parse_timestamp("2024-01-15T08:30:00"), Some(expected));
        assert_eq!(
            GpsFix::parse_timestamp("2024-01-15T08:30:00Z"),
            Some(expected)
        );
        assert_eq!(GpsFix::parse_timestamp(" 2024-01-15 08:30:00 "), Some(expected));
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert_eq!(GpsFix::parse_timestamp(""), None);
        assert_eq!(GpsFix::parse_timestamp("yesterday"), None);
        assert_eq!(GpsFix::parse_timestamp("15/01/2024 08:30"), None);
    }

    #[test]
    fn test_tracking_id_falls_back_to_vehicle_no() {
        let mut snapshot = VehicleSnapshot {
            vehicle_no: "UP-80-AB-1234".to_string(),
            device_id: "868324027812345".to_string(),
            latitude: 27.5,
            longitude: 77.7,
            speed: 0.0,
            datetime: None,
            provider: Provider::Secondary,
        };
        assert_eq!(snapshot.tracking_id(), "868324027812345");

        snapshot.device_id.clear();
        assert_eq!(snapshot.tracking_id(), "UP-80-AB-1234");
    }
}
