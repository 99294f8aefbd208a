pub mod classifier;
pub mod configuration;
pub mod domain;
pub mod events;
pub mod idempotency;
pub mod insight_store;
pub mod lead_store;
pub mod routes;
pub mod startup;
pub mod stream;
pub mod telemetry;
pub mod utils;
pub mod worker;
