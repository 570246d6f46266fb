use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Franchise {
    pub id: String,
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub franchise_id: String,
    pub customer_id: Option<String>,
    pub employee_id: Option<String>,
    pub created_at: String,
    pub due_at: Option<String>,
    pub completed_at: Option<String>,
    pub total_amount: f64,
    pub status: String,
    pub payment_method: String,
    pub payment_status: String,
    pub tax_rate: f64,
    pub interstate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub franchise_id: String,
    pub name: String,
    pub total_spend: f64,
    pub order_count: i64,
    pub first_order_at: Option<String>,
    pub last_order_at: Option<String>,
}

/// One employee's throughput for the day, aggregated from assigned orders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffThroughput {
    pub employee_id: String,
    pub name: String,
    pub orders_processed: i64,
    pub items_processed: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoyaltyTier {
    Platinum,
    Gold,
    Silver,
    Bronze,
}

impl LoyaltyTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoyaltyTier::Platinum => "platinum",
            LoyaltyTier::Gold => "gold",
            LoyaltyTier::Silver => "silver",
            LoyaltyTier::Bronze => "bronze",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerValue {
    pub customer_id: String,
    pub lifetime_value: f64,
    pub tier: LoyaltyTier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BottleneckType {
    Volume,
    Processing,
    Balanced,
}

impl BottleneckType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BottleneckType::Volume => "volume",
            BottleneckType::Processing => "processing",
            BottleneckType::Balanced => "balanced",
        }
    }

    pub fn from_str(value: &str) -> Self {
        match value {
            "volume" => BottleneckType::Volume,
            "processing" => BottleneckType::Processing,
            _ => BottleneckType::Balanced,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevenueTrend {
    Accelerating,
    Decelerating,
    Stable,
}

impl RevenueTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            RevenueTrend::Accelerating => "accelerating",
            RevenueTrend::Decelerating => "decelerating",
            RevenueTrend::Stable => "stable",
        }
    }

    pub fn from_str(value: &str) -> Self {
        match value {
            "accelerating" => RevenueTrend::Accelerating,
            "decelerating" => RevenueTrend::Decelerating,
            _ => RevenueTrend::Stable,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceRole {
    Hero,
    LossLeader,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceContribution {
    pub service_id: String,
    pub name: String,
    pub revenue: f64,
    pub share: f64,
    pub target_share: f64,
    pub variance: f64,
    pub role: ServiceRole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCorrelation {
    pub service_a: String,
    pub service_b: String,
    pub strength: f64,
    pub co_occurrences: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffScore {
    pub employee_id: String,
    pub name: String,
    pub orders_per_hour: f64,
    pub items_per_hour: f64,
    pub z_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyDetail {
    pub order_id: String,
    pub amount: f64,
    pub deviation: f64,
    pub direction: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub hour: u32,
    pub weekday: String,
    pub orders: i64,
    pub revenue: f64,
    pub score: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RevenueBlock {
    pub total_revenue: f64,
    pub order_count: i64,
    pub avg_order_value: f64,
    pub day_growth_pct: f64,
    pub week_growth_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictiveBlock {
    pub regression_slope: f64,
    pub regression_intercept: f64,
    pub regression_r2: f64,
    pub forecast: Vec<f64>,
    pub projected_month_end: f64,
    pub revenue_velocity: f64,
    pub revenue_trend: RevenueTrend,
    pub at_risk_revenue: f64,
}

impl Default for PredictiveBlock {
    fn default() -> Self {
        PredictiveBlock {
            regression_slope: 0.0,
            regression_intercept: 0.0,
            regression_r2: 0.0,
            forecast: Vec::new(),
            projected_month_end: 0.0,
            revenue_velocity: 0.0,
            revenue_trend: RevenueTrend::Stable,
            at_risk_revenue: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerBlock {
    pub active_customers: i64,
    pub new_customers: i64,
    pub returning_customers: i64,
    pub avg_clv: f64,
    pub tier_counts: BTreeMap<String, i64>,
    pub churn_rate: Option<f64>,
    pub retention_rate: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceBlock {
    pub top_service_name: Option<String>,
    pub top_service_revenue: f64,
    pub service_mix_variance: f64,
    pub hero_services: i64,
    pub loss_leader_services: i64,
    pub correlations: Vec<ServiceCorrelation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationsBlock {
    pub avg_turnaround_hours: f64,
    pub turnaround_stddev_hours: f64,
    pub consistency_score: f64,
    pub within_target_pct: f64,
    pub arrival_rate: f64,
    pub avg_wait_days: f64,
    pub work_in_process: f64,
    pub bottleneck_type: BottleneckType,
    pub bottleneck_recommendation: String,
    pub on_time_orders: i64,
    pub delayed_orders: i64,
    pub pending_orders: i64,
    pub completed_orders: i64,
}

impl Default for OperationsBlock {
    fn default() -> Self {
        OperationsBlock {
            avg_turnaround_hours: 0.0,
            turnaround_stddev_hours: 0.0,
            consistency_score: 0.0,
            within_target_pct: 0.0,
            arrival_rate: 0.0,
            avg_wait_days: 0.0,
            work_in_process: 0.0,
            bottleneck_type: BottleneckType::Balanced,
            bottleneck_recommendation: String::new(),
            on_time_orders: 0,
            delayed_orders: 0,
            pending_orders: 0,
            completed_orders: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaffBlock {
    pub avg_staff_score: f64,
    pub top_performer_name: Option<String>,
    pub top_performer_score: f64,
    pub staff_productivity: f64,
    pub performance: Vec<StaffScore>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaxBlock {
    pub total_tax: f64,
    pub cgst_amount: f64,
    pub sgst_amount: f64,
    pub igst_amount: f64,
    pub taxable_base: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinancialBlock {
    pub estimated_cost: f64,
    pub contribution_margin: f64,
    pub gross_profit: f64,
    pub payment_mix: BTreeMap<String, f64>,
    pub credit_sales: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnomalyBlock {
    pub anomaly_count: i64,
    pub details: Vec<AnomalyDetail>,
    pub suspicious_order_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatisticalBlock {
    pub mean: f64,
    pub median: f64,
    pub mode: f64,
    pub stddev: f64,
    pub variance: f64,
    pub p25: f64,
    pub p75: f64,
    pub p85: f64,
    pub p95: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DemandBlock {
    pub peak_hour: Option<u32>,
    pub peak_day: Option<String>,
    pub peak_score: f64,
    pub heatmap: Vec<HeatmapCell>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrendBlock {
    pub sma_7: Vec<f64>,
    pub sma_14: Vec<f64>,
    pub sma_30: Vec<f64>,
    pub ema_7: Vec<f64>,
}

/// One franchise-day of precomputed intelligence, assembled by the
/// calculator and persisted whole by the summary writer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySummary {
    pub franchise_id: String,
    pub summary_date: NaiveDate,
    pub revenue: RevenueBlock,
    pub predictive: PredictiveBlock,
    pub customers: CustomerBlock,
    pub services: ServiceBlock,
    pub operations: OperationsBlock,
    pub staff: StaffBlock,
    pub tax: TaxBlock,
    pub financial: FinancialBlock,
    pub anomalies: AnomalyBlock,
    pub statistics: StatisticalBlock,
    pub demand: DemandBlock,
    pub trend: TrendBlock,
    pub computation_ms: i64,
    pub data_quality_score: f64,
}

/// Per-step success flags for one maintenance run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepOutcomes {
    pub compaction: bool,
    pub statistics_refresh: bool,
    pub backup: bool,
    pub log_archival: bool,
    pub backup_rotation: bool,
    pub bi_calculation: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaintenanceStats {
    pub db_size_before: u64,
    pub db_size_after: u64,
    pub logs_archived: u64,
    pub logs_deleted: u64,
    pub backups_deleted: u64,
    pub summaries_generated: Vec<String>,
    pub anomalies_detected: i64,
    pub calculation_ms: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaintenanceResult {
    pub success: bool,
    pub operations: StepOutcomes,
    pub errors: Vec<String>,
    pub stats: MaintenanceStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub actor: String,
    pub action: String,
    pub details: String,
    pub created_at: String,
}
