use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub tracker: TrackerSettings,
    #[serde(default)]
    pub storage: StorageSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrackerSettings {
    pub base_url: String,
    pub primary_key: String,
    pub secondary_key: String,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    pub zones_path: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            zones_path: "data/dump_zones.json".to_string(),
        }
    }
}

fn default_cache_ttl_secs() -> u64 {
    120
}

pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/tracker"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let raw = r#"
            [tracker]
            base_url = "https://tracker.example.com/api/api.php"
            primary_key = "key-a"
            secondary_key = "key-b"
        "#;

        let settings = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap();
        let app: AppConfig = settings.try_deserialize().unwrap();

        assert_eq!(app.tracker.cache_ttl_secs, 120);
        assert_eq!(app.storage.zones_path, "data/dump_zones.json");
    }

    #[test]
    fn test_explicit_values_win() {
        let raw = r#"
            [tracker]
            base_url = "https://tracker.example.com/api/api.php"
            primary_key = "key-a"
            secondary_key = "key-b"
            cache_ttl_secs = 30

            [storage]
            zones_path = "/var/lib/fleet/zones.json"
        "#;

        let settings = config::Config::builder()
            .add_source(config::File::from_str(raw, config::FileFormat::Toml))
            .build()
            .unwrap();
        let app: AppConfig = settings.try_deserialize().unwrap();

        assert_eq!(app.tracker.cache_ttl_secs, 30);
        assert_eq!(app.storage.zones_path, "/var/lib/fleet/zones.json");
    }
}
