// GPS tracker gateway repository implementation
use crate::application::tracking_repository::TrackingRepository;
use crate::domain::gps::{GpsFix, Provider, VehicleSnapshot};
use crate::infrastructure::history_csv;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use std::sync::Mutex;
use std::time::{Duration, Instant};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

pub struct TrackerApiRepository {
    base_url: String,
    primary_key: String,
    secondary_key: String,
    client: reqwest::Client,
    cache_ttl: Duration,
    live_cache: Mutex<Option<CachedVehicles>>,
}

struct CachedVehicles {
    data: Vec<VehicleSnapshot>,
    fetched_at: Instant,
}

#[derive(Debug, Deserialize)]
struct RawVehicle {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    vehicle_no: Option<String>,
    #[serde(default, deserialize_with = "parse_string_option")]
    imei: Option<String>,
    #[serde(default, deserialize_with = "parse_string_option")]
    device_id: Option<String>,
    #[serde(default, deserialize_with = "parse_string_option")]
    id: Option<String>,
    #[serde(default, deserialize_with = "parse_f64_option")]
    lat: Option<f64>,
    #[serde(default, deserialize_with = "parse_f64_option")]
    lng: Option<f64>,
    #[serde(default, deserialize_with = "parse_f64_option")]
    speed: Option<f64>,
    #[serde(default, alias = "datetime")]
    dt_tracker: Option<String>,
}

impl RawVehicle {
    fn into_snapshot(self, provider: Provider) -> VehicleSnapshot {
        let vehicle_no = [self.name, self.vehicle_no]
            .into_iter()
            .flatten()
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
            .unwrap_or_else(|| "Unknown".to_string());

        let device_id = [self.imei, self.device_id, self.id]
            .into_iter()
            .flatten()
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
            .unwrap_or_default();

        VehicleSnapshot {
            vehicle_no,
            device_id,
            latitude: self.lat.unwrap_or(0.0),
            longitude: self.lng.unwrap_or(0.0),
            speed: self.speed.unwrap_or(0.0),
            datetime: self.dt_tracker,
            provider,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawHistoryRow {
    #[serde(default, alias = "latitude", deserialize_with = "parse_f64_option")]
    lat: Option<f64>,
    #[serde(
        default,
        alias = "long",
        alias = "longitude",
        deserialize_with = "parse_f64_option"
    )]
    lng: Option<f64>,
    #[serde(default, alias = "datetime", alias = "date_time", alias = "timestamp")]
    dt_tracker: Option<String>,
    #[serde(default, alias = "vehicle_no", alias = "name")]
    vehicle_name: Option<String>,
}

impl RawHistoryRow {
    fn into_fix(self) -> Option<GpsFix> {
        let latitude = self.lat?;
        let longitude = self.lng?;
        if !latitude.is_finite() || !longitude.is_finite() {
            return None;
        }
        // (0, 0) is the tracker's placeholder before satellite lock
        if latitude == 0.0 && longitude == 0.0 {
            return None;
        }

        let timestamp = GpsFix::parse_timestamp(self.dt_tracker.as_deref()?)?;

        let vehicle_no = self
            .vehicle_name
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "Unknown".to_string());

        Some(GpsFix::new(vehicle_no, latitude, longitude, timestamp))
    }
}

fn parse_f64_option<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrFloat {
        String(String),
        Float(f64),
    }

    let v: Option<StringOrFloat> = Option::deserialize(deserializer)?;
    match v {
        Some(StringOrFloat::Float(f)) => Ok(Some(f)),
        Some(StringOrFloat::String(s)) => {
            if s.trim().is_empty() {
                Ok(None)
            } else {
                s.trim().parse::<f64>().map(Some).map_err(serde::de::Error::custom)
            }
        }
        None => Ok(None),
    }
}

fn parse_string_option<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrInt {
        String(String),
        Int(i64),
    }

    let v: Option<StringOrInt> = Option::deserialize(deserializer)?;
    Ok(match v {
        Some(StringOrInt::String(s)) => Some(s),
        Some(StringOrInt::Int(n)) => Some(n.to_string()),
        None => None,
    })
}

impl TrackerApiRepository {
    pub fn new(
        base_url: String,
        primary_key: String,
        secondary_key: String,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            primary_key,
            secondary_key,
            client: reqwest::Client::new(),
            cache_ttl,
            live_cache: Mutex::new(None),
        }
    }

    fn key_for(&self, provider: Provider) -> &str {
        match provider {
            Provider::Primary => &self.primary_key,
            Provider::Secondary => &self.secondary_key,
        }
    }

    async fn fetch_raw(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .timeout(REQUEST_TIMEOUT)
            .header("Accept", "application/json, text/plain, */*")
            .send()
            .await
            .context("Failed to reach tracker gateway")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("tracker request failed with status {}: {}", status, body);
        }

        response
            .text()
            .await
            .context("Failed to read tracker response")
    }

    async fn fetch_live(&self, provider: Provider) -> Result<Vec<VehicleSnapshot>> {
        let url = format!("{}?key={}&cmd=ALL,*", self.base_url, self.key_for(provider));
        let raw = self.fetch_raw(&url).await?;
        Self::parse_live_payload(&raw, provider)
    }

    fn cached_vehicles(&self) -> Option<Vec<VehicleSnapshot>> {
        let cache = self.live_cache.lock().ok()?;
        cache
            .as_ref()
            .filter(|entry| entry.fetched_at.elapsed() < self.cache_ttl)
            .map(|entry| entry.data.clone())
    }

    fn store_cache(&self, vehicles: &[VehicleSnapshot]) {
        if let Ok(mut cache) = self.live_cache.lock() {
            *cache = Some(CachedVehicles {
                data: vehicles.to_vec(),
                fetched_at: Instant::now(),
            });
        }
    }
}

#[async_trait]
impl TrackingRepository for TrackerApiRepository {
    async fn live_vehicles(&self) -> Result<Vec<VehicleSnapshot>> {
        if let Some(cached) = self.cached_vehicles() {
            tracing::debug!("serving {} vehicles from live cache", cached.len());
            return Ok(cached);
        }

        let (primary, secondary) = futures::join!(
            self.fetch_live(Provider::Primary),
            self.fetch_live(Provider::Secondary)
        );

        let mut vehicles = Vec::new();
        let mut errors = Vec::new();
        match primary {
            Ok(mut batch) => vehicles.append(&mut batch),
            Err(e) => {
                tracing::warn!("primary provider unavailable: {:#}", e);
                errors.push(e);
            }
        }
        match secondary {
            Ok(mut batch) => vehicles.append(&mut batch),
            Err(e) => {
                tracing::warn!("secondary provider unavailable: {:#}", e);
                errors.push(e);
            }
        }

        // One dead provider degrades to a partial list; two dead providers
        // is an outage the caller must see
        if vehicles.is_empty() && errors.len() == 2 {
            return Err(errors.remove(0).context("no tracking provider reachable"));
        }

        self.store_cache(&vehicles);
        Ok(vehicles)
    }

    async fn vehicle_history(
        &self,
        device_id: &str,
        from: NaiveDate,
        to: NaiveDate,
        provider: Provider,
    ) -> Result<Vec<GpsFix>> {
        let url = format!(
            "{}?key={}&cmd=TRACK,{},{},{}",
            self.base_url,
            self.key_for(provider),
            urlencoding::encode(device_id),
            from,
            to
        );
        let raw = self.fetch_raw(&url).await?;
        Self::parse_history_payload(&raw)
    }
}

impl TrackerApiRepository {
    /// The gateway sometimes prefixes JSON bodies with a UTF-8 BOM
    fn clean_payload(raw: &str) -> &str {
        raw.trim_start_matches('\u{feff}').trim()
    }

    fn payload_rows(payload: serde_json::Value) -> Result<Vec<serde_json::Value>> {
        match payload {
            serde_json::Value::Array(rows) => Ok(rows),
            serde_json::Value::Object(mut map) => {
                if map.get("success").and_then(|v| v.as_bool()) == Some(false) {
                    let message = map
                        .get("message")
                        .and_then(|v| v.as_str())
                        .unwrap_or("unspecified tracker error")
                        .to_string();
                    anyhow::bail!("tracker rejected the request: {}", message);
                }
                match map.remove("data") {
                    Some(serde_json::Value::Array(rows)) => Ok(rows),
                    _ => anyhow::bail!("unexpected tracker payload shape"),
                }
            }
            _ => anyhow::bail!("unexpected tracker payload shape"),
        }
    }

    fn parse_live_payload(raw: &str, provider: Provider) -> Result<Vec<VehicleSnapshot>> {
        let payload: serde_json::Value = serde_json::from_str(Self::clean_payload(raw))
            .context("live vehicle payload is not JSON")?;
        let rows = Self::payload_rows(payload)?;

        Ok(rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value::<RawVehicle>(row) {
                Ok(vehicle) => Some(vehicle.into_snapshot(provider)),
                Err(e) => {
                    tracing::warn!("dropping unreadable vehicle row: {}", e);
                    None
                }
            })
            .collect())
    }

    fn parse_history_payload(raw: &str) -> Result<Vec<GpsFix>> {
        let cleaned = Self::clean_payload(raw);
        match serde_json::from_str::<serde_json::Value>(cleaned) {
            Ok(payload) => {
                let rows = Self::payload_rows(payload)?;
                Ok(rows
                    .into_iter()
                    .filter_map(|row| match serde_json::from_value::<RawHistoryRow>(row) {
                        Ok(row) => row.into_fix(),
                        Err(e) => {
                            tracing::warn!("dropping unreadable history row: {}", e);
                            None
                        }
                    })
                    .collect())
            }
            // Some deployments answer history queries with a CSV export
            Err(_) => Ok(history_csv::parse_history_csv(cleaned.as_bytes())?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repository(cache_ttl: Duration) -> TrackerApiRepository {
        TrackerApiRepository::new(
            "https://tracker.example.com/api/api.php/".to_string(),
            "key-a".to_string(),
            "key-b".to_string(),
            cache_ttl,
        )
    }

    fn snapshot(vehicle_no: &str) -> VehicleSnapshot {
        VehicleSnapshot {
            vehicle_no: vehicle_no.to_string(),
            device_id: "dev-1".to_string(),
            latitude: 27.5,
            longitude: 77.7,
            speed: 0.0,
            datetime: None,
            provider: Provider::Primary,
        }
    }

    #[test]
    fn test_parse_live_payload_bare_array() {
        let raw = r#"[
            {"name": "UP-80-AB-1234", "imei": 862430051234567, "lat": "27.5070", "lng": 77.7080, "speed": "12.5"},
            {"vehicle_no": "UP-80-CD-5678", "device_id": "dev-2", "lat": 27.6, "lng": 77.8}
        ]"#;

        let vehicles =
            TrackerApiRepository::parse_live_payload(raw, Provider::Primary).unwrap();

        assert_eq!(vehicles.len(), 2);
        assert_eq!(vehicles[0].vehicle_no, "UP-80-AB-1234");
        assert_eq!(vehicles[0].device_id, "862430051234567");
        assert_eq!(vehicles[0].latitude, 27.5070);
        assert_eq!(vehicles[0].speed, 12.5);
        assert_eq!(vehicles[0].provider, Provider::Primary);
        assert_eq!(vehicles[1].vehicle_no, "UP-80-CD-5678");
        assert_eq!(vehicles[1].device_id, "dev-2");
    }

    #[test]
    fn test_parse_live_payload_wrapped_and_bom() {
        let raw = "\u{feff}{\"data\": [{\"name\": \"UP-80-AB-1234\", \"lat\": 27.5, \"lng\": 77.7}]}";

        let vehicles =
            TrackerApiRepository::parse_live_payload(raw, Provider::Secondary).unwrap();

        assert_eq!(vehicles.len(), 1);
        assert_eq!(vehicles[0].provider, Provider::Secondary);
    }

    #[test]
    fn test_parse_live_payload_upstream_rejection() {
        let raw = r#"{"success": false, "message": "invalid api key"}"#;

        let result = TrackerApiRepository::parse_live_payload(raw, Provider::Primary);

        let message = result.unwrap_err().to_string();
        assert!(message.contains("invalid api key"));
    }

    #[test]
    fn test_parse_live_payload_drops_unreadable_rows() {
        let raw = r#"[{"name": "UP-80-AB-1234", "lat": 27.5, "lng": 77.7}, "garbage"]"#;

        let vehicles =
            TrackerApiRepository::parse_live_payload(raw, Provider::Primary).unwrap();

        assert_eq!(vehicles.len(), 1);
    }

    #[test]
    fn test_missing_names_fall_back_to_unknown() {
        let raw = r#"[{"lat": 27.5, "lng": 77.7}]"#;

        let vehicles =
            TrackerApiRepository::parse_live_payload(raw, Provider::Primary).unwrap();

        assert_eq!(vehicles[0].vehicle_no, "Unknown");
        assert_eq!(vehicles[0].device_id, "");
    }

    #[test]
    fn test_parse_history_json_with_aliases() {
        let raw = r#"[
            {"latitude": "27.5070", "long": "77.7080", "datetime": "2024-01-15 10:00:00", "vehicle_no": "UP-80-AB-1234"},
            {"lat": 0, "lng": 0, "dt_tracker": "2024-01-15 10:01:00"},
            {"lat": 27.6, "lng": 77.8, "dt_tracker": "not a time"},
            {"lat": 27.7, "lng": 77.9, "dt_tracker": "2024-01-15T10:02:00"}
        ]"#;

        let fixes = TrackerApiRepository::parse_history_payload(raw).unwrap();

        assert_eq!(fixes.len(), 2);
        assert_eq!(fixes[0].vehicle_no, "UP-80-AB-1234");
        assert_eq!(fixes[0].latitude, 27.5070);
        assert_eq!(fixes[1].latitude, 27.7);
    }

    #[test]
    fn test_parse_history_csv_fallback() {
        let raw = "lat,lng,dt_tracker\n27.5,77.7,2024-01-15 10:00:00\n";

        let fixes = TrackerApiRepository::parse_history_payload(raw).unwrap();

        assert_eq!(fixes.len(), 1);
        assert_eq!(fixes[0].longitude, 77.7);
    }

    #[test]
    fn test_trailing_slash_trimmed_from_base_url() {
        let repository = repository(Duration::from_secs(60));
        assert_eq!(
            repository.base_url,
            "https://tracker.example.com/api/api.php"
        );
    }

    #[test]
    fn test_cache_round_trip() {
        let repository = repository(Duration::from_secs(60));

        assert!(repository.cached_vehicles().is_none());
        repository.store_cache(&[snapshot("UP-80-AB-1234")]);

        let cached = repository.cached_vehicles().unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].vehicle_no, "UP-80-AB-1234");
    }

    #[test]
    fn test_zero_ttl_disables_cache() {
        let repository = repository(Duration::ZERO);

        repository.store_cache(&[snapshot("UP-80-AB-1234")]);

        assert!(repository.cached_vehicles().is_none());
    }
}
