// Application layer - Use cases and repository contracts
pub mod fleet_service;
pub mod streaming_report_service;
pub mod tracking_repository;
pub mod trip_report_service;
