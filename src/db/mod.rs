use rusqlite::{params, types::ToSql, Connection, OptionalExtension, Result as SqlResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::{BiError, BiResult};
use crate::models::{
    AuditEntry, BottleneckType, Customer, DailySummary, Franchise, Order, RevenueTrend,
    StaffThroughput,
};
use crate::utils::now_rfc3339;

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new(db_path: PathBuf) -> SqlResult<Self> {
        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let mut db = Database { conn };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&mut self) -> SqlResult<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                name TEXT PRIMARY KEY,
                applied_at TEXT NOT NULL
            );",
        )?;

        let migrations = vec![
            (
                "001_create_core_tables.sql",
                include_str!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/migrations/001_create_core_tables.sql"
                )),
            ),
            (
                "002_create_daily_summaries.sql",
                include_str!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/migrations/002_create_daily_summaries.sql"
                )),
            ),
            (
                "003_create_audit_logs.sql",
                include_str!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/migrations/003_create_audit_logs.sql"
                )),
            ),
        ];

        for (name, sql) in migrations {
            let applied: Option<String> = self
                .conn
                .query_row(
                    "SELECT name FROM schema_migrations WHERE name = ?1",
                    params![name],
                    |row| row.get(0),
                )
                .optional()?;

            if applied.is_none() {
                let tx = self.conn.transaction()?;
                tx.execute_batch(sql)?;
                tx.execute(
                    "INSERT INTO schema_migrations (name, applied_at) VALUES (?1, datetime('now'))",
                    params![name],
                )?;
                tx.commit()?;
            }
        }

        Ok(())
    }

    pub fn get_active_franchises(&self) -> SqlResult<Vec<Franchise>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, active FROM franchises WHERE active = 1 ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok(Franchise {
                id: row.get(0)?,
                name: row.get(1)?,
                active: row.get::<_, i64>(2)? != 0,
            })
        })?;
        rows.collect()
    }

    pub fn get_franchise(&self, id: &str) -> SqlResult<Option<Franchise>> {
        self.conn
            .query_row(
                "SELECT id, name, active FROM franchises WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Franchise {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        active: row.get::<_, i64>(2)? != 0,
                    })
                },
            )
            .optional()
    }

    pub fn get_orders_for_day(&self, franchise_id: &str, date: NaiveDate) -> SqlResult<Vec<Order>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, franchise_id, customer_id, employee_id, created_at, due_at,
                    completed_at, total_amount, status, payment_method, payment_status,
                    tax_rate, interstate
             FROM orders
             WHERE franchise_id = ?1 AND date(created_at) = ?2
             ORDER BY created_at",
        )?;
        let rows = stmt.query_map(params![franchise_id, date], |row| {
            Ok(Order {
                id: row.get(0)?,
                franchise_id: row.get(1)?,
                customer_id: row.get(2)?,
                employee_id: row.get(3)?,
                created_at: row.get(4)?,
                due_at: row.get(5)?,
                completed_at: row.get(6)?,
                total_amount: row.get(7)?,
                status: row.get(8)?,
                payment_method: row.get(9)?,
                payment_status: row.get(10)?,
                tax_rate: row.get(11)?,
                interstate: row.get::<_, i64>(12)? != 0,
            })
        })?;
        rows.collect()
    }

    /// Revenue per calendar day over `[end - days + 1, end]`, zero-filled for
    /// days without orders. Cancelled orders never count as revenue.
    pub fn get_daily_revenue_series(
        &self,
        franchise_id: &str,
        end: NaiveDate,
        days: i64,
    ) -> SqlResult<Vec<f64>> {
        let start = end - chrono::Duration::days(days - 1);
        let mut stmt = self.conn.prepare(
            "SELECT date(created_at) AS day, COALESCE(SUM(total_amount), 0)
             FROM orders
             WHERE franchise_id = ?1
               AND date(created_at) >= ?2 AND date(created_at) <= ?3
               AND status != 'cancelled'
             GROUP BY day",
        )?;
        let rows = stmt.query_map(params![franchise_id, start, end], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?;

        let mut by_day: BTreeMap<String, f64> = BTreeMap::new();
        for row in rows {
            let (day, total) = row?;
            by_day.insert(day, total);
        }

        let mut series = Vec::with_capacity(days as usize);
        for offset in 0..days {
            let day = (start + chrono::Duration::days(offset)).to_string();
            series.push(by_day.get(&day).copied().unwrap_or(0.0));
        }
        Ok(series)
    }

    pub fn get_revenue_between(
        &self,
        franchise_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> SqlResult<f64> {
        self.conn.query_row(
            "SELECT COALESCE(SUM(total_amount), 0)
             FROM orders
             WHERE franchise_id = ?1
               AND date(created_at) >= ?2 AND date(created_at) <= ?3
               AND status != 'cancelled'",
            params![franchise_id, start, end],
            |row| row.get(0),
        )
    }

    /// Value of orders still open past their due timestamp.
    pub fn get_overdue_open_total(&self, franchise_id: &str, as_of: &str) -> SqlResult<f64> {
        self.conn.query_row(
            "SELECT COALESCE(SUM(total_amount), 0)
             FROM orders
             WHERE franchise_id = ?1
               AND status NOT IN ('completed', 'delivered', 'cancelled')
               AND due_at IS NOT NULL AND due_at < ?2",
            params![franchise_id, as_of],
            |row| row.get(0),
        )
    }

    pub fn get_customers(&self, franchise_id: &str) -> SqlResult<Vec<Customer>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, franchise_id, name, total_spend, order_count, first_order_at, last_order_at
             FROM customers WHERE franchise_id = ?1",
        )?;
        let rows = stmt.query_map(params![franchise_id], |row| {
            Ok(Customer {
                id: row.get(0)?,
                franchise_id: row.get(1)?,
                name: row.get(2)?,
                total_spend: row.get(3)?,
                order_count: row.get(4)?,
                first_order_at: row.get(5)?,
                last_order_at: row.get(6)?,
            })
        })?;
        rows.collect()
    }

    /// Per-employee orders and line items handled on one day.
    pub fn get_staff_throughput(
        &self,
        franchise_id: &str,
        date: NaiveDate,
    ) -> SqlResult<Vec<StaffThroughput>> {
        let mut stmt = self.conn.prepare(
            "SELECT e.id, e.name, COUNT(DISTINCT o.id),
                    COALESCE(SUM(oi.quantity), 0)
             FROM employees e
             JOIN orders o ON o.employee_id = e.id
                          AND o.franchise_id = ?1
                          AND date(o.created_at) = ?2
                          AND o.status != 'cancelled'
             LEFT JOIN order_items oi ON oi.order_id = o.id
             WHERE e.franchise_id = ?1
             GROUP BY e.id, e.name",
        )?;
        let rows = stmt.query_map(params![franchise_id, date], |row| {
            Ok(StaffThroughput {
                employee_id: row.get(0)?,
                name: row.get(1)?,
                orders_processed: row.get(2)?,
                items_processed: row.get(3)?,
            })
        })?;
        rows.collect()
    }

    /// Revenue per service for one day, highest first.
    pub fn get_service_revenue_for_day(
        &self,
        franchise_id: &str,
        date: NaiveDate,
    ) -> SqlResult<Vec<(String, String, f64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.id, s.name, COALESCE(SUM(oi.subtotal), 0) AS revenue
             FROM order_items oi
             JOIN orders o ON o.id = oi.order_id
             JOIN services s ON s.id = oi.service_id
             WHERE o.franchise_id = ?1 AND date(o.created_at) = ?2
               AND o.status != 'cancelled'
             GROUP BY s.id, s.name
             ORDER BY revenue DESC",
        )?;
        let rows = stmt.query_map(params![franchise_id, date], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })?;
        rows.collect()
    }

    /// Service ids grouped per order, for basket correlation.
    pub fn get_order_baskets(
        &self,
        franchise_id: &str,
        date: NaiveDate,
    ) -> SqlResult<Vec<Vec<String>>> {
        let mut stmt = self.conn.prepare(
            "SELECT oi.order_id, oi.service_id
             FROM order_items oi
             JOIN orders o ON o.id = oi.order_id
             WHERE o.franchise_id = ?1 AND date(o.created_at) = ?2
               AND o.status != 'cancelled'
             ORDER BY oi.order_id",
        )?;
        let rows = stmt.query_map(params![franchise_id, date], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut baskets: Vec<Vec<String>> = Vec::new();
        let mut current_order: Option<String> = None;
        for row in rows {
            let (order_id, service_id) = row?;
            if current_order.as_deref() != Some(order_id.as_str()) {
                baskets.push(Vec::new());
                current_order = Some(order_id);
            }
            if let Some(basket) = baskets.last_mut() {
                basket.push(service_id);
            }
        }
        Ok(baskets)
    }

    /// Whole-record upsert keyed by (franchise_id, summary_date). An existing
    /// row keeps its id and created_at; every derived column is replaced and
    /// the recalculation timestamps are bumped.
    pub fn upsert_daily_summary(&self, summary: &DailySummary) -> BiResult<()> {
        let json = SummaryJson::encode(summary)?;
        let now = now_rfc3339();

        let existing: Option<String> = self
            .conn
            .query_row(
                "SELECT id FROM daily_summaries WHERE franchise_id = ?1 AND summary_date = ?2",
                params![summary.franchise_id, summary.summary_date],
                |row| row.get(0),
            )
            .optional()?;

        let mut binds = summary_binds(summary, &json);
        if existing.is_some() {
            let set_clause: Vec<String> = SUMMARY_COLUMNS
                .iter()
                .map(|col| format!("{col} = :{col}"))
                .collect();
            let sql = format!(
                "UPDATE daily_summaries
                 SET {}, updated_at = :updated_at, last_recalculated_at = :last_recalculated_at
                 WHERE franchise_id = :franchise_id AND summary_date = :summary_date",
                set_clause.join(", ")
            );
            binds.push((":updated_at", &now));
            binds.push((":last_recalculated_at", &now));
            binds.push((":franchise_id", &summary.franchise_id));
            binds.push((":summary_date", &summary.summary_date));
            self.conn.prepare(&sql)?.execute(binds.as_slice())?;
        } else {
            let id = uuid::Uuid::new_v4().to_string();
            let placeholders: Vec<String> =
                SUMMARY_COLUMNS.iter().map(|col| format!(":{col}")).collect();
            let sql = format!(
                "INSERT INTO daily_summaries
                 (id, franchise_id, summary_date, created_at, updated_at, last_recalculated_at, {})
                 VALUES (:id, :franchise_id, :summary_date, :created_at, :updated_at,
                         :last_recalculated_at, {})",
                SUMMARY_COLUMNS.join(", "),
                placeholders.join(", ")
            );
            binds.push((":id", &id));
            binds.push((":franchise_id", &summary.franchise_id));
            binds.push((":summary_date", &summary.summary_date));
            binds.push((":created_at", &now));
            binds.push((":updated_at", &now));
            binds.push((":last_recalculated_at", &now));
            self.conn.prepare(&sql)?.execute(binds.as_slice())?;
        }

        Ok(())
    }

    pub fn get_daily_summary(
        &self,
        franchise_id: &str,
        date: NaiveDate,
    ) -> BiResult<Option<DailySummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT * FROM daily_summaries WHERE franchise_id = ?1 AND summary_date = ?2",
        )?;
        let row = stmt
            .query_row(params![franchise_id, date], read_summary_row)
            .optional()
            .map_err(BiError::from)?;
        row.map(|raw| raw.decode()).transpose()
    }

    pub fn count_daily_summaries(&self, franchise_id: &str) -> SqlResult<i64> {
        self.conn.query_row(
            "SELECT COUNT(*) FROM daily_summaries WHERE franchise_id = ?1",
            params![franchise_id],
            |row| row.get(0),
        )
    }

    pub fn insert_audit_entry(&self, actor: &str, action: &str, details: &str) -> SqlResult<()> {
        self.conn.execute(
            "INSERT INTO audit_logs (id, actor, action, details, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                uuid::Uuid::new_v4().to_string(),
                actor,
                action,
                details,
                now_rfc3339()
            ],
        )?;
        Ok(())
    }

    pub fn get_audit_entries_before(&self, cutoff: &str) -> SqlResult<Vec<AuditEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, actor, action, details, created_at
             FROM audit_logs WHERE created_at < ?1 ORDER BY created_at",
        )?;
        let rows = stmt.query_map(params![cutoff], |row| {
            Ok(AuditEntry {
                id: row.get(0)?,
                actor: row.get(1)?,
                action: row.get(2)?,
                details: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;
        rows.collect()
    }

    pub fn delete_audit_entries_before(&self, cutoff: &str) -> SqlResult<usize> {
        self.conn
            .execute("DELETE FROM audit_logs WHERE created_at < ?1", params![cutoff])
    }

    pub fn vacuum(&self) -> SqlResult<()> {
        self.conn.execute_batch("VACUUM;")
    }

    pub fn refresh_statistics(&self) -> SqlResult<()> {
        self.conn.execute_batch("ANALYZE;")
    }

    /// Writes a consistent snapshot of the whole store to `target`.
    pub fn snapshot_to(&self, target: &Path) -> SqlResult<()> {
        self.conn.execute(
            "VACUUM INTO ?1",
            params![target.to_string_lossy().into_owned()],
        )?;
        Ok(())
    }
}

const SUMMARY_COLUMNS: [&str; 73] = [
    "total_revenue",
    "order_count",
    "avg_order_value",
    "day_growth_pct",
    "week_growth_pct",
    "regression_slope",
    "regression_intercept",
    "regression_r2",
    "forecast_json",
    "projected_month_end",
    "revenue_velocity",
    "revenue_trend",
    "at_risk_revenue",
    "active_customers",
    "new_customers",
    "returning_customers",
    "avg_clv",
    "tier_counts_json",
    "churn_rate",
    "retention_rate",
    "top_service_name",
    "top_service_revenue",
    "service_mix_variance",
    "hero_services",
    "loss_leader_services",
    "service_correlations_json",
    "avg_turnaround_hours",
    "turnaround_stddev_hours",
    "consistency_score",
    "within_target_pct",
    "arrival_rate",
    "avg_wait_days",
    "work_in_process",
    "bottleneck_type",
    "bottleneck_recommendation",
    "on_time_orders",
    "delayed_orders",
    "pending_orders",
    "completed_orders",
    "avg_staff_score",
    "top_performer_name",
    "top_performer_score",
    "staff_productivity",
    "staff_performance_json",
    "total_tax",
    "cgst_amount",
    "sgst_amount",
    "igst_amount",
    "taxable_base",
    "estimated_cost",
    "contribution_margin",
    "gross_profit",
    "payment_mix_json",
    "credit_sales",
    "anomaly_count",
    "anomaly_details_json",
    "suspicious_order_ids_json",
    "value_mean",
    "value_median",
    "value_mode",
    "value_stddev",
    "value_variance",
    "value_p25",
    "value_p75",
    "value_p85",
    "value_p95",
    "peak_hour",
    "peak_day",
    "peak_score",
    "heatmap_json",
    "trend_json",
    "computation_ms",
    "data_quality_score",
];

/// Serialized forms of the nested blocks; the only place where the typed
/// in-memory summary meets JSON text columns.
struct SummaryJson {
    forecast: String,
    tier_counts: String,
    correlations: String,
    staff_performance: String,
    payment_mix: String,
    anomaly_details: String,
    suspicious_order_ids: String,
    heatmap: String,
    trend: String,
    revenue_trend: &'static str,
    bottleneck_type: &'static str,
}

impl SummaryJson {
    fn encode(summary: &DailySummary) -> BiResult<Self> {
        Ok(SummaryJson {
            forecast: serde_json::to_string(&summary.predictive.forecast)?,
            tier_counts: serde_json::to_string(&summary.customers.tier_counts)?,
            correlations: serde_json::to_string(&summary.services.correlations)?,
            staff_performance: serde_json::to_string(&summary.staff.performance)?,
            payment_mix: serde_json::to_string(&summary.financial.payment_mix)?,
            anomaly_details: serde_json::to_string(&summary.anomalies.details)?,
            suspicious_order_ids: serde_json::to_string(&summary.anomalies.suspicious_order_ids)?,
            heatmap: serde_json::to_string(&summary.demand.heatmap)?,
            trend: serde_json::to_string(&summary.trend)?,
            revenue_trend: summary.predictive.revenue_trend.as_str(),
            bottleneck_type: summary.operations.bottleneck_type.as_str(),
        })
    }
}

fn summary_binds<'a>(
    s: &'a DailySummary,
    json: &'a SummaryJson,
) -> Vec<(&'static str, &'a dyn ToSql)> {
    vec![
        (":total_revenue", &s.revenue.total_revenue),
        (":order_count", &s.revenue.order_count),
        (":avg_order_value", &s.revenue.avg_order_value),
        (":day_growth_pct", &s.revenue.day_growth_pct),
        (":week_growth_pct", &s.revenue.week_growth_pct),
        (":regression_slope", &s.predictive.regression_slope),
        (":regression_intercept", &s.predictive.regression_intercept),
        (":regression_r2", &s.predictive.regression_r2),
        (":forecast_json", &json.forecast),
        (":projected_month_end", &s.predictive.projected_month_end),
        (":revenue_velocity", &s.predictive.revenue_velocity),
        (":revenue_trend", &json.revenue_trend),
        (":at_risk_revenue", &s.predictive.at_risk_revenue),
        (":active_customers", &s.customers.active_customers),
        (":new_customers", &s.customers.new_customers),
        (":returning_customers", &s.customers.returning_customers),
        (":avg_clv", &s.customers.avg_clv),
        (":tier_counts_json", &json.tier_counts),
        (":churn_rate", &s.customers.churn_rate),
        (":retention_rate", &s.customers.retention_rate),
        (":top_service_name", &s.services.top_service_name),
        (":top_service_revenue", &s.services.top_service_revenue),
        (":service_mix_variance", &s.services.service_mix_variance),
        (":hero_services", &s.services.hero_services),
        (":loss_leader_services", &s.services.loss_leader_services),
        (":service_correlations_json", &json.correlations),
        (":avg_turnaround_hours", &s.operations.avg_turnaround_hours),
        (":turnaround_stddev_hours", &s.operations.turnaround_stddev_hours),
        (":consistency_score", &s.operations.consistency_score),
        (":within_target_pct", &s.operations.within_target_pct),
        (":arrival_rate", &s.operations.arrival_rate),
        (":avg_wait_days", &s.operations.avg_wait_days),
        (":work_in_process", &s.operations.work_in_process),
        (":bottleneck_type", &json.bottleneck_type),
        (":bottleneck_recommendation", &s.operations.bottleneck_recommendation),
        (":on_time_orders", &s.operations.on_time_orders),
        (":delayed_orders", &s.operations.delayed_orders),
        (":pending_orders", &s.operations.pending_orders),
        (":completed_orders", &s.operations.completed_orders),
        (":avg_staff_score", &s.staff.avg_staff_score),
        (":top_performer_name", &s.staff.top_performer_name),
        (":top_performer_score", &s.staff.top_performer_score),
        (":staff_productivity", &s.staff.staff_productivity),
        (":staff_performance_json", &json.staff_performance),
        (":total_tax", &s.tax.total_tax),
        (":cgst_amount", &s.tax.cgst_amount),
        (":sgst_amount", &s.tax.sgst_amount),
        (":igst_amount", &s.tax.igst_amount),
        (":taxable_base", &s.tax.taxable_base),
        (":estimated_cost", &s.financial.estimated_cost),
        (":contribution_margin", &s.financial.contribution_margin),
        (":gross_profit", &s.financial.gross_profit),
        (":payment_mix_json", &json.payment_mix),
        (":credit_sales", &s.financial.credit_sales),
        (":anomaly_count", &s.anomalies.anomaly_count),
        (":anomaly_details_json", &json.anomaly_details),
        (":suspicious_order_ids_json", &json.suspicious_order_ids),
        (":value_mean", &s.statistics.mean),
        (":value_median", &s.statistics.median),
        (":value_mode", &s.statistics.mode),
        (":value_stddev", &s.statistics.stddev),
        (":value_variance", &s.statistics.variance),
        (":value_p25", &s.statistics.p25),
        (":value_p75", &s.statistics.p75),
        (":value_p85", &s.statistics.p85),
        (":value_p95", &s.statistics.p95),
        (":peak_hour", &s.demand.peak_hour),
        (":peak_day", &s.demand.peak_day),
        (":peak_score", &s.demand.peak_score),
        (":heatmap_json", &json.heatmap),
        (":trend_json", &json.trend),
        (":computation_ms", &s.computation_ms),
        (":data_quality_score", &s.data_quality_score),
    ]
}

/// Raw row with JSON columns still as text; decoded outside the rusqlite
/// closure so serde errors surface as `BiError` rather than mapped sql errors.
struct RawSummaryRow {
    summary: DailySummary,
    forecast: String,
    tier_counts: String,
    correlations: String,
    staff_performance: String,
    payment_mix: String,
    anomaly_details: String,
    suspicious_order_ids: String,
    heatmap: String,
    trend: String,
}

impl RawSummaryRow {
    fn decode(mut self) -> BiResult<DailySummary> {
        self.summary.predictive.forecast = serde_json::from_str(&self.forecast)?;
        self.summary.customers.tier_counts = serde_json::from_str(&self.tier_counts)?;
        self.summary.services.correlations = serde_json::from_str(&self.correlations)?;
        self.summary.staff.performance = serde_json::from_str(&self.staff_performance)?;
        self.summary.financial.payment_mix = serde_json::from_str(&self.payment_mix)?;
        self.summary.anomalies.details = serde_json::from_str(&self.anomaly_details)?;
        self.summary.anomalies.suspicious_order_ids =
            serde_json::from_str(&self.suspicious_order_ids)?;
        self.summary.demand.heatmap = serde_json::from_str(&self.heatmap)?;
        self.summary.trend = serde_json::from_str(&self.trend)?;
        Ok(self.summary)
    }
}

fn read_summary_row(row: &rusqlite::Row<'_>) -> SqlResult<RawSummaryRow> {
    let mut summary = DailySummary {
        franchise_id: row.get("franchise_id")?,
        summary_date: row.get("summary_date")?,
        revenue: Default::default(),
        predictive: Default::default(),
        customers: Default::default(),
        services: Default::default(),
        operations: Default::default(),
        staff: Default::default(),
        tax: Default::default(),
        financial: Default::default(),
        anomalies: Default::default(),
        statistics: Default::default(),
        demand: Default::default(),
        trend: Default::default(),
        computation_ms: row.get("computation_ms")?,
        data_quality_score: row.get("data_quality_score")?,
    };

    summary.revenue.total_revenue = row.get("total_revenue")?;
    summary.revenue.order_count = row.get("order_count")?;
    summary.revenue.avg_order_value = row.get("avg_order_value")?;
    summary.revenue.day_growth_pct = row.get("day_growth_pct")?;
    summary.revenue.week_growth_pct = row.get("week_growth_pct")?;

    summary.predictive.regression_slope = row.get("regression_slope")?;
    summary.predictive.regression_intercept = row.get("regression_intercept")?;
    summary.predictive.regression_r2 = row.get("regression_r2")?;
    summary.predictive.projected_month_end = row.get("projected_month_end")?;
    summary.predictive.revenue_velocity = row.get("revenue_velocity")?;
    summary.predictive.revenue_trend =
        RevenueTrend::from_str(&row.get::<_, String>("revenue_trend")?);
    summary.predictive.at_risk_revenue = row.get("at_risk_revenue")?;

    summary.customers.active_customers = row.get("active_customers")?;
    summary.customers.new_customers = row.get("new_customers")?;
    summary.customers.returning_customers = row.get("returning_customers")?;
    summary.customers.avg_clv = row.get("avg_clv")?;
    summary.customers.churn_rate = row.get("churn_rate")?;
    summary.customers.retention_rate = row.get("retention_rate")?;

    summary.services.top_service_name = row.get("top_service_name")?;
    summary.services.top_service_revenue = row.get("top_service_revenue")?;
    summary.services.service_mix_variance = row.get("service_mix_variance")?;
    summary.services.hero_services = row.get("hero_services")?;
    summary.services.loss_leader_services = row.get("loss_leader_services")?;

    summary.operations.avg_turnaround_hours = row.get("avg_turnaround_hours")?;
    summary.operations.turnaround_stddev_hours = row.get("turnaround_stddev_hours")?;
    summary.operations.consistency_score = row.get("consistency_score")?;
    summary.operations.within_target_pct = row.get("within_target_pct")?;
    summary.operations.arrival_rate = row.get("arrival_rate")?;
    summary.operations.avg_wait_days = row.get("avg_wait_days")?;
    summary.operations.work_in_process = row.get("work_in_process")?;
    summary.operations.bottleneck_type =
        BottleneckType::from_str(&row.get::<_, String>("bottleneck_type")?);
    summary.operations.bottleneck_recommendation = row.get("bottleneck_recommendation")?;
    summary.operations.on_time_orders = row.get("on_time_orders")?;
    summary.operations.delayed_orders = row.get("delayed_orders")?;
    summary.operations.pending_orders = row.get("pending_orders")?;
    summary.operations.completed_orders = row.get("completed_orders")?;

    summary.staff.avg_staff_score = row.get("avg_staff_score")?;
    summary.staff.top_performer_name = row.get("top_performer_name")?;
    summary.staff.top_performer_score = row.get("top_performer_score")?;
    summary.staff.staff_productivity = row.get("staff_productivity")?;

    summary.tax.total_tax = row.get("total_tax")?;
    summary.tax.cgst_amount = row.get("cgst_amount")?;
    summary.tax.sgst_amount = row.get("sgst_amount")?;
    summary.tax.igst_amount = row.get("igst_amount")?;
    summary.tax.taxable_base = row.get("taxable_base")?;

    summary.financial.estimated_cost = row.get("estimated_cost")?;
    summary.financial.contribution_margin = row.get("contribution_margin")?;
    summary.financial.gross_profit = row.get("gross_profit")?;
    summary.financial.credit_sales = row.get("credit_sales")?;

    summary.anomalies.anomaly_count = row.get("anomaly_count")?;

    summary.statistics.mean = row.get("value_mean")?;
    summary.statistics.median = row.get("value_median")?;
    summary.statistics.mode = row.get("value_mode")?;
    summary.statistics.stddev = row.get("value_stddev")?;
    summary.statistics.variance = row.get("value_variance")?;
    summary.statistics.p25 = row.get("value_p25")?;
    summary.statistics.p75 = row.get("value_p75")?;
    summary.statistics.p85 = row.get("value_p85")?;
    summary.statistics.p95 = row.get("value_p95")?;

    summary.demand.peak_hour = row.get("peak_hour")?;
    summary.demand.peak_day = row.get("peak_day")?;
    summary.demand.peak_score = row.get("peak_score")?;

    Ok(RawSummaryRow {
        summary,
        forecast: row.get("forecast_json")?,
        tier_counts: row.get("tier_counts_json")?,
        correlations: row.get("service_correlations_json")?,
        staff_performance: row.get("staff_performance_json")?,
        payment_mix: row.get("payment_mix_json")?,
        anomaly_details: row.get("anomaly_details_json")?,
        suspicious_order_ids: row.get("suspicious_order_ids_json")?,
        heatmap: row.get("heatmap_json")?,
        trend: row.get("trend_json")?,
    })
}
