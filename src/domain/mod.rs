// Domain layer - Core models and trip detection
pub mod geofence;
pub mod gps;
pub mod ids;
pub mod report;
pub mod trip;
pub mod trip_detector;
