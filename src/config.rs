use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything the maintenance run needs to know about its environment.
/// Passed in explicitly at construction; nothing here is read from globals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiConfig {
    pub db_path: PathBuf,
    pub backups_dir: PathBuf,
    pub archive_dir: PathBuf,
    /// Audit rows older than this many days are archived and pruned.
    pub log_retention_days: i64,
    /// Number of backup snapshots kept after rotation.
    pub backup_retention_count: usize,
}

impl BiConfig {
    pub fn from_env() -> Self {
        let data_dir = std::env::var("FRANCHISE_BI_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));
        BiConfig {
            db_path: std::env::var("FRANCHISE_BI_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| data_dir.join("franchise.sqlite")),
            backups_dir: data_dir.join("backups"),
            archive_dir: data_dir.join("log-archive"),
            log_retention_days: env_i64("FRANCHISE_BI_LOG_RETENTION_DAYS", 90),
            backup_retention_count: env_i64("FRANCHISE_BI_BACKUP_RETENTION", 7) as usize,
        }
    }
}

fn env_i64(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Named calculation defaults that used to live inline in the summary
/// pipeline. Overridable per run so they can be tested in isolation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationPolicy {
    /// Estimated cost as a fraction of revenue.
    pub cost_ratio: f64,
    /// Staff shift length used to normalize throughput into per-hour rates.
    pub shift_hours: f64,
    /// Turnaround band counted as "within target".
    pub turnaround_tolerance_hours: f64,
    /// Expected turnaround assumed when an order carries no due timestamp.
    pub default_turnaround_hours: f64,
    /// Loyalty tier floors: spend or order count qualifies.
    pub platinum_spend: f64,
    pub platinum_orders: i64,
    pub gold_spend: f64,
    pub gold_orders: i64,
    pub silver_spend: f64,
    pub silver_orders: i64,
    /// CLV projection horizon.
    pub clv_horizon_months: f64,
    pub anomaly_k_sigma: f64,
    pub history_window_days: i64,
    pub forecast_horizon: usize,
    /// Bottleneck baselines: processing days and arrivals per day that the
    /// shop is expected to absorb.
    pub processing_target_days: f64,
    pub volume_threshold_per_day: f64,
    /// Velocity band outside which the trend stops being "stable".
    pub velocity_threshold: f64,
    pub heatmap_top_n: usize,
    pub correlation_top_n: usize,
}

impl Default for CalculationPolicy {
    fn default() -> Self {
        CalculationPolicy {
            cost_ratio: 0.30,
            shift_hours: 8.0,
            turnaround_tolerance_hours: 2.0,
            default_turnaround_hours: 24.0,
            platinum_spend: 50_000.0,
            platinum_orders: 50,
            gold_spend: 20_000.0,
            gold_orders: 25,
            silver_spend: 5_000.0,
            silver_orders: 10,
            clv_horizon_months: 12.0,
            anomaly_k_sigma: 3.0,
            history_window_days: 30,
            forecast_horizon: 7,
            processing_target_days: 1.5,
            volume_threshold_per_day: 25.0,
            velocity_threshold: 0.5,
            heatmap_top_n: 10,
            correlation_top_n: 10,
        }
    }
}
