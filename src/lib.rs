pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use config::{BiConfig, CalculationPolicy};
pub use error::{BiError, BiResult};
pub use models::{DailySummary, MaintenanceResult};
pub use services::maintenance::MaintenanceService;
pub use services::summary::compute_summary;
