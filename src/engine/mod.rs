//! Pure statistical and operations-research functions. No I/O, no knowledge
//! of tenants or storage; everything here is deterministic over its inputs.

pub mod anomaly;
pub mod customers;
pub mod demand;
pub mod operations;
pub mod regression;
pub mod service_mix;
pub mod stats;
pub mod tax;
