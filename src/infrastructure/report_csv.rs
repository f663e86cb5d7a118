// Trip report CSV export
use crate::domain::trip::TripEvent;
use anyhow::Result;

pub const EXPORT_HEADERS: [&str; 6] = [
    "Vehicle Number",
    "Dump Zone",
    "Entry Time",
    "Exit Time",
    "Duration (Min)",
    "Status",
];

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Flatten trips into the spreadsheet layout the reporting team works with,
/// one row per trip.
pub fn trips_to_csv(trips: &[TripEvent]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADERS)?;

    for trip in trips {
        let entry_time = trip.entry_time.format(TIME_FORMAT).to_string();
        let exit_time = trip.exit_time.format(TIME_FORMAT).to_string();
        let duration = format!("{:.2}", trip.duration_minutes);
        let status = if trip.is_valid { "Valid" } else { "Invalid" };

        writer.write_record([
            trip.vehicle_no.as_str(),
            trip.dump_name.as_str(),
            entry_time.as_str(),
            exit_time.as_str(),
            duration.as_str(),
            status,
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("failed to flush CSV writer: {}", e))?;
    Ok(String::from_utf8(bytes)?)
}
