// History CSV ingestion - Column resolution by header alias
use crate::domain::gps::GpsFix;
use std::io;

// Alias lists are ordered; the first header that matches wins.
const LAT_ALIASES: &[&str] = &["lat", "latitude"];
const LNG_ALIASES: &[&str] = &["lng", "long", "longitude"];
const TIMESTAMP_ALIASES: &[&str] = &["dt_tracker", "datetime", "date_time", "timestamp"];
const VEHICLE_ALIASES: &[&str] = &["vehicle_name", "vehicle_no", "name"];

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("missing {field} column, expected one of: {}", .aliases.join(", "))]
    MissingColumn {
        field: &'static str,
        aliases: Vec<String>,
    },

    #[error("unreadable CSV: {0}")]
    Csv(#[from] csv::Error),
}

struct Columns {
    lat: usize,
    lng: usize,
    timestamp: usize,
    vehicle: Option<usize>,
}

/// Parse a CSV history export into fixes. The header row decides the
/// column layout once; rows that cannot be read as a fix are dropped with
/// a warning.
pub fn parse_history_csv(reader: impl io::Read) -> Result<Vec<GpsFix>, ImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let columns = resolve_columns(csv_reader.headers()?)?;

    let mut fixes = Vec::new();
    for record in csv_reader.records() {
        match record {
            Ok(record) => {
                if let Some(fix) = fix_from_record(&record, &columns) {
                    fixes.push(fix);
                }
            }
            Err(e) => {
                tracing::warn!("dropping malformed history row: {}", e);
            }
        }
    }
    Ok(fixes)
}

fn resolve_columns(headers: &csv::StringRecord) -> Result<Columns, ImportError> {
    let require = |field: &'static str, aliases: &'static [&str]| {
        find_column(headers, aliases).ok_or_else(|| ImportError::MissingColumn {
            field,
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        })
    };

    Ok(Columns {
        lat: require("latitude", LAT_ALIASES)?,
        lng: require("longitude", LNG_ALIASES)?,
        timestamp: require("timestamp", TIMESTAMP_ALIASES)?,
        vehicle: find_column(headers, VEHICLE_ALIASES),
    })
}

fn find_column(headers: &csv::StringRecord, aliases: &[&str]) -> Option<usize> {
    aliases.iter().find_map(|alias| {
        headers
            .iter()
            .position(|header| header.trim().eq_ignore_ascii_case(alias))
    })
}

fn fix_from_record(record: &csv::StringRecord, columns: &Columns) -> Option<GpsFix> {
    let latitude: f64 = record.get(columns.lat)?.parse().ok()?;
    let longitude: f64 = record.get(columns.lng)?.parse().ok()?;
    if !latitude.is_finite() || !longitude.is_finite() {
        return None;
    }
    // (0, 0) is the tracker's placeholder before satellite lock
    if latitude == 0.0 && longitude == 0.0 {
        return None;
    }

    let timestamp = GpsFix::parse_timestamp(record.get(columns.timestamp)?)?;

    let vehicle_no = columns
        .vehicle
        .and_then(|index| record.get(index))
        .filter(|value| !value.is_empty())
        .unwrap_or("Unknown")
        .to_string();

    Some(GpsFix::new(vehicle_no, latitude, longitude, timestamp))
}
