// Trip event domain model
use chrono::NaiveDateTime;
use serde::Serialize;

/// Minimum dwell, in minutes, for a visit to count as a real trip.
pub const MIN_VALID_DWELL_MINUTES: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TripStatus {
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Completed")]
    Completed,
}

/// One detected visit of a vehicle to a dump zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripEvent {
    pub id: String,
    pub vehicle_no: String,
    pub dump_id: String,
    pub dump_name: String,
    pub entry_time: NaiveDateTime,
    pub exit_time: NaiveDateTime,
    pub duration_minutes: f64,
    pub is_valid: bool,
    pub status: TripStatus,
    /// `[latitude, longitude]` of the fixes seen inside the zone, in order.
    /// The fix that closes a trip is not part of its path.
    pub path: Vec<[f64; 2]>,
}

impl TripEvent {
    /// Finalize a trip at `exit_time`: duration rounded to 2 decimals,
    /// validity against the dwell threshold, status flipped to Completed.
    /// Zero or negative spans simply come out invalid.
    pub fn close(&mut self, exit_time: NaiveDateTime) {
        self.exit_time = exit_time;
        let minutes = (exit_time - self.entry_time).num_milliseconds() as f64 / 60_000.0;
        self.duration_minutes = round2(minutes);
        self.is_valid = self.duration_minutes >= MIN_VALID_DWELL_MINUTES;
        self.status = TripStatus::Completed;
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn open_trip(entry: NaiveDateTime) -> TripEvent {
        TripEvent {
            id: "trip-1".to_string(),
            vehicle_no: "UP-80-AB-1234".to_string(),
            dump_id: "zone-1".to_string(),
            dump_name: "MSW Plant".to_string(),
            entry_time: entry,
            exit_time: entry,
            duration_minutes: 0.0,
            is_valid: false,
            status: TripStatus::InProgress,
            path: vec![[27.5075, 77.7080]],
        }
    }

    #[test]
    fn test_close_rounds_to_two_decimals() {
        let mut trip = open_trip(at(10, 0, 0));
        trip.close(at(10, 7, 20));

        assert_eq!(trip.duration_minutes, 7.33);
        assert_eq!(trip.status, TripStatus::Completed);
        assert!(trip.is_valid);
    }

    #[test]
    fn test_validity_boundary() {
        // 1 minute 59.4 seconds rounds to 1.99 and stays invalid
        let mut short = open_trip(at(10, 0, 0));
        short.close(at(10, 0, 0) + chrono::Duration::milliseconds(119_400));
        assert_eq!(short.duration_minutes, 1.99);
        assert!(!short.is_valid);

        let mut exact = open_trip(at(10, 0, 0));
        exact.close(at(10, 2, 0));
        assert_eq!(exact.duration_minutes, 2.0);
        assert!(exact.is_valid);
    }

    #[test]
    fn test_zero_length_trip_is_invalid_but_completed() {
        let mut trip = open_trip(at(10, 0, 0));
        trip.close(at(10, 0, 0));

        assert_eq!(trip.duration_minutes, 0.0);
        assert!(!trip.is_valid);
        assert_eq!(trip.status, TripStatus::Completed);
    }

    #[test]
    fn test_backwards_clock_does_not_panic() {
        let mut trip = open_trip(at(10, 5, 0));
        trip.close(at(10, 0, 0));

        assert!(trip.duration_minutes < 0.0);
        assert!(!trip.is_valid);
    }
}
