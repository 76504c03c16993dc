pub mod devices;
pub mod telemetry;
