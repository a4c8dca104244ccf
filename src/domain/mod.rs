pub mod alert;
pub mod history;
pub mod liveness;
pub mod models;
pub mod snapshot;
pub mod statistics;
pub mod telemetry_payload;
pub mod trend;
