// Infrastructure layer - External dependencies and adapters
pub mod chunked_json;
pub mod config;
pub mod geofence_store;
pub mod history_csv;
pub mod report_csv;
pub mod tracker_api;
