//! src/lib.rs
pub mod batcher;
pub mod configuration;
pub mod dispatcher;
pub mod domain;
pub mod error;
pub mod ledger;
pub mod quota;
pub mod record_store;
pub mod routes;
pub mod seed;
pub mod startup;
pub mod telemetry;
pub mod transport;
