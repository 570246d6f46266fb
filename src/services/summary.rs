//! Daily-Summary Calculator: pulls one franchise-day of raw rows, shapes
//! them for the engine, and assembles a `DailySummary`.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::config::CalculationPolicy;
use crate::db::Database;
use crate::engine::{anomaly, customers, demand, operations, regression, service_mix, stats, tax};
use crate::error::{BiError, BiResult};
use crate::models::{
    AnomalyBlock, CustomerBlock, DailySummary, DemandBlock, FinancialBlock, Order,
    OperationsBlock, PredictiveBlock, RevenueBlock, ServiceBlock, ServiceRole, StaffBlock,
    StatisticalBlock, TaxBlock, TrendBlock,
};
use crate::utils::parse_timestamp;

/// Computes the summary for one (franchise, date) pair. The date must not be
/// in the future and the franchise must exist. A day with zero orders yields
/// a zeroed record, never an error.
pub fn compute_summary(
    db: &Database,
    policy: &CalculationPolicy,
    franchise_id: &str,
    date: NaiveDate,
) -> BiResult<DailySummary> {
    let started = Instant::now();

    db.get_franchise(franchise_id)?
        .ok_or_else(|| BiError::UnknownFranchise(franchise_id.to_string()))?;
    if date > Utc::now().date_naive() {
        return Err(BiError::FutureDate(date.to_string()));
    }

    let orders = db.get_orders_for_day(franchise_id, date)?;
    let billable: Vec<&Order> = orders.iter().filter(|o| o.status != "cancelled").collect();
    let series = db.get_daily_revenue_series(franchise_id, date, policy.history_window_days)?;
    let all_customers = db.get_customers(franchise_id)?;
    let staff = db.get_staff_throughput(franchise_id, date)?;
    let service_revenue = db.get_service_revenue_for_day(franchise_id, date)?;
    let baskets = db.get_order_baskets(franchise_id, date)?;
    let at_risk = db.get_overdue_open_total(franchise_id, &day_end(date))?;

    let revenue = revenue_block(&billable, &series);
    let predictive = predictive_block(db, policy, franchise_id, date, &series, &revenue, at_risk)?;
    let customer_block = customer_block(&all_customers, &billable, date, policy);
    let services = service_block(&service_revenue, &baskets, policy);
    let ops = operations_block(&billable, policy, day_close(date));
    let staff_block = staff_block(&staff, policy);
    let tax_block = tax_block(&billable);
    let financial = financial_block(&billable, revenue.total_revenue, &tax_block, policy);
    let anomalies = anomaly_block(&billable, policy);
    let statistics = statistical_block(&billable);
    let demand_block = demand_block(&billable, policy);
    let trend = trend_block(&series);

    let data_quality_score = data_quality(
        revenue.order_count,
        customer_block.active_customers,
        staff.len(),
        &series,
        anomalies.anomaly_count,
    );

    Ok(DailySummary {
        franchise_id: franchise_id.to_string(),
        summary_date: date,
        revenue,
        predictive,
        customers: customer_block,
        services,
        operations: ops,
        staff: staff_block,
        tax: tax_block,
        financial,
        anomalies,
        statistics,
        demand: demand_block,
        trend,
        computation_ms: started.elapsed().as_millis() as i64,
        data_quality_score,
    })
}

fn day_end(date: NaiveDate) -> String {
    format!("{date}T23:59:59Z")
}

/// First instant after the summary day. Open-order classification anchors
/// here rather than to the wall clock, so recomputing a past day is stable.
fn day_close(date: NaiveDate) -> DateTime<Utc> {
    (date + chrono::Duration::days(1))
        .and_time(chrono::NaiveTime::MIN)
        .and_utc()
}

fn growth_pct(current: f64, previous: f64) -> f64 {
    if previous > 0.0 {
        (current - previous) / previous * 100.0
    } else {
        0.0
    }
}

fn revenue_block(billable: &[&Order], series: &[f64]) -> RevenueBlock {
    let total_revenue: f64 = billable.iter().map(|o| o.total_amount).sum();
    let order_count = billable.len() as i64;
    let n = series.len();

    RevenueBlock {
        total_revenue,
        order_count,
        avg_order_value: if order_count > 0 {
            total_revenue / order_count as f64
        } else {
            0.0
        },
        day_growth_pct: if n >= 2 {
            growth_pct(total_revenue, series[n - 2])
        } else {
            0.0
        },
        week_growth_pct: if n >= 8 {
            growth_pct(total_revenue, series[n - 8])
        } else {
            0.0
        },
    }
}

fn predictive_block(
    db: &Database,
    policy: &CalculationPolicy,
    franchise_id: &str,
    date: NaiveDate,
    series: &[f64],
    revenue: &RevenueBlock,
    at_risk: f64,
) -> BiResult<PredictiveBlock> {
    let xs: Vec<f64> = (0..series.len()).map(|i| i as f64).collect();
    let fit = regression::linear_regression(&xs, series);
    let forecast = regression::forecast_revenue(series, policy.forecast_horizon);

    let month_start = date.with_day(1).unwrap_or(date);
    let month_to_date = db.get_revenue_between(franchise_id, month_start, date)?;
    let last_month_end = month_start - chrono::Duration::days(1);
    let last_month_start = last_month_end.with_day(1).unwrap_or(last_month_end);
    let last_month = db.get_revenue_between(franchise_id, last_month_start, last_month_end)?;
    let projected_month_end = regression::projected_month_end_revenue(
        month_to_date,
        date.day(),
        days_in_month(date),
        last_month,
    );

    let n = series.len();
    let last7 = if n >= 8 { &series[n - 8..n - 1] } else { &series[..n.saturating_sub(1)] };
    let (revenue_velocity, revenue_trend) =
        regression::revenue_velocity(revenue.total_revenue, last7, policy.velocity_threshold);

    Ok(PredictiveBlock {
        regression_slope: fit.slope,
        regression_intercept: fit.intercept,
        regression_r2: fit.r2,
        forecast,
        projected_month_end,
        revenue_velocity,
        revenue_trend,
        at_risk_revenue: at_risk,
    })
}

fn days_in_month(date: NaiveDate) -> u32 {
    let next_month = if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    };
    match next_month {
        Some(first) => (first - chrono::Duration::days(1)).day(),
        None => 30,
    }
}

fn customer_block(
    all_customers: &[crate::models::Customer],
    billable: &[&Order],
    date: NaiveDate,
    policy: &CalculationPolicy,
) -> CustomerBlock {
    let values = customers::customer_clvs(all_customers, date, policy);

    let mut tier_counts: BTreeMap<String, i64> = BTreeMap::new();
    for value in &values {
        *tier_counts.entry(value.tier.as_str().to_string()).or_insert(0) += 1;
    }

    let avg_clv = if values.is_empty() {
        0.0
    } else {
        values.iter().map(|v| v.lifetime_value).sum::<f64>() / values.len() as f64
    };

    let todays_customers: BTreeSet<&str> = billable
        .iter()
        .filter_map(|o| o.customer_id.as_deref())
        .collect();
    let first_order_dates: BTreeMap<&str, NaiveDate> = all_customers
        .iter()
        .filter_map(|c| {
            c.first_order_at
                .as_deref()
                .and_then(parse_timestamp)
                .map(|ts| (c.id.as_str(), ts.date_naive()))
        })
        .collect();
    let new_customers = todays_customers
        .iter()
        .filter(|id| first_order_dates.get(**id).is_some_and(|d| *d == date))
        .count() as i64;

    let (churn_rate, retention_rate) = match customers::cohort_retention(all_customers) {
        Some((churn, retention)) => (Some(churn), Some(retention)),
        None => (None, None),
    };

    CustomerBlock {
        active_customers: values.len() as i64,
        new_customers,
        returning_customers: todays_customers.len() as i64 - new_customers,
        avg_clv,
        tier_counts,
        churn_rate,
        retention_rate,
    }
}

fn service_block(
    service_revenue: &[(String, String, f64)],
    baskets: &[Vec<String>],
    policy: &CalculationPolicy,
) -> ServiceBlock {
    let rows: Vec<service_mix::ServiceRevenue> = service_revenue
        .iter()
        .map(|(id, name, revenue)| service_mix::ServiceRevenue {
            service_id: id.clone(),
            name: name.clone(),
            revenue: *revenue,
        })
        .collect();
    let total: f64 = rows.iter().map(|r| r.revenue).sum();
    let contributions = service_mix::service_contribution(&rows, total);

    let mut correlations = service_mix::service_correlation(baskets);
    correlations.truncate(policy.correlation_top_n);

    ServiceBlock {
        top_service_name: contributions.first().map(|c| c.name.clone()),
        top_service_revenue: contributions.first().map(|c| c.revenue).unwrap_or(0.0),
        service_mix_variance: contributions.iter().map(|c| c.variance.abs()).sum(),
        hero_services: contributions
            .iter()
            .filter(|c| c.role == ServiceRole::Hero)
            .count() as i64,
        loss_leader_services: contributions
            .iter()
            .filter(|c| c.role == ServiceRole::LossLeader)
            .count() as i64,
        correlations,
    }
}

fn operations_block(
    billable: &[&Order],
    policy: &CalculationPolicy,
    as_of: DateTime<Utc>,
) -> OperationsBlock {
    let mut pairs: Vec<(f64, f64)> = Vec::new();
    let mut completed = 0i64;
    let mut on_time = 0i64;
    let mut delayed = 0i64;
    let mut pending = 0i64;

    for order in billable {
        let created = order.created_at.as_str();
        let created_ts = parse_timestamp(created);
        let due_ts = order.due_at.as_deref().and_then(parse_timestamp);
        let completed_ts = order.completed_at.as_deref().and_then(parse_timestamp);

        let is_done = matches!(order.status.as_str(), "completed" | "delivered");
        if is_done {
            completed += 1;
            match (completed_ts, due_ts) {
                (Some(done), Some(due)) if done > due => delayed += 1,
                _ => on_time += 1,
            }
            if let (Some(created), Some(done)) = (created_ts, completed_ts) {
                let actual_hours = hours_between(created, done);
                let expected_hours = due_ts
                    .map(|due| hours_between(created, due))
                    .unwrap_or(policy.default_turnaround_hours);
                pairs.push((expected_hours, actual_hours));
            }
        } else {
            match due_ts {
                Some(due) if as_of > due => delayed += 1,
                _ => pending += 1,
            }
        }
    }

    let turnaround = operations::turnaround_variance(&pairs, policy.turnaround_tolerance_hours);

    let arrival_rate = billable.len() as f64;
    let avg_processing_days = if pairs.is_empty() {
        policy.default_turnaround_hours / 24.0
    } else {
        pairs.iter().map(|(_, actual)| actual / 24.0).sum::<f64>() / pairs.len() as f64
    };
    let queue = operations::littles_law(arrival_rate, avg_processing_days, policy);

    OperationsBlock {
        avg_turnaround_hours: turnaround.mean_actual_hours,
        turnaround_stddev_hours: turnaround.delta_stddev_hours,
        consistency_score: turnaround.consistency_score,
        within_target_pct: turnaround.within_target_pct,
        arrival_rate: queue.arrival_rate,
        avg_wait_days: queue.avg_wait_days,
        work_in_process: queue.work_in_process,
        bottleneck_type: queue.bottleneck,
        bottleneck_recommendation: queue.recommendation,
        on_time_orders: on_time,
        delayed_orders: delayed,
        pending_orders: pending,
        completed_orders: completed,
    }
}

fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_seconds() as f64 / 3600.0
}

fn staff_block(staff: &[crate::models::StaffThroughput], policy: &CalculationPolicy) -> StaffBlock {
    let scores = operations::staff_efficiency(staff, policy.shift_hours);
    if scores.is_empty() {
        return StaffBlock::default();
    }

    let avg = scores.iter().map(|s| s.z_score).sum::<f64>() / scores.len() as f64;
    let total_orders: i64 = staff.iter().map(|s| s.orders_processed).sum();
    let staff_hours = staff.len() as f64 * policy.shift_hours;

    StaffBlock {
        avg_staff_score: avg,
        top_performer_name: Some(scores[0].name.clone()),
        top_performer_score: scores[0].z_score,
        staff_productivity: if staff_hours > 0.0 {
            total_orders as f64 / staff_hours
        } else {
            0.0
        },
        performance: scores,
    }
}

fn tax_block(billable: &[&Order]) -> TaxBlock {
    let mut block = TaxBlock::default();
    for order in billable {
        let breakout = tax::gst_breakout(order.total_amount, order.tax_rate, order.interstate);
        block.total_tax += breakout.total_tax;
        block.cgst_amount += breakout.cgst;
        block.sgst_amount += breakout.sgst;
        block.igst_amount += breakout.igst;
        block.taxable_base += breakout.taxable_base;
    }
    block
}

fn financial_block(
    billable: &[&Order],
    total_revenue: f64,
    tax_block: &TaxBlock,
    policy: &CalculationPolicy,
) -> FinancialBlock {
    let estimated_cost = total_revenue * policy.cost_ratio;

    let mut payment_mix: BTreeMap<String, f64> = BTreeMap::new();
    let mut credit_sales = 0.0;
    for order in billable {
        *payment_mix.entry(order.payment_method.clone()).or_insert(0.0) += order.total_amount;
        if order.payment_status != "paid" {
            credit_sales += order.total_amount;
        }
    }

    FinancialBlock {
        estimated_cost,
        contribution_margin: total_revenue - estimated_cost,
        gross_profit: tax_block.taxable_base - estimated_cost,
        payment_mix,
        credit_sales,
    }
}

fn anomaly_block(billable: &[&Order], policy: &CalculationPolicy) -> AnomalyBlock {
    let inputs: Vec<(String, f64)> = billable
        .iter()
        .map(|o| (o.id.clone(), o.total_amount))
        .collect();
    let details = anomaly::detect_anomalies(&inputs, policy.anomaly_k_sigma);

    AnomalyBlock {
        anomaly_count: details.len() as i64,
        suspicious_order_ids: details.iter().map(|d| d.order_id.clone()).collect(),
        details,
    }
}

fn statistical_block(billable: &[&Order]) -> StatisticalBlock {
    let amounts: Vec<f64> = billable.iter().map(|o| o.total_amount).collect();
    if amounts.is_empty() {
        return StatisticalBlock::default();
    }

    StatisticalBlock {
        mean: stats::mean(&amounts),
        median: stats::median(&amounts),
        mode: stats::mode(&amounts),
        stddev: stats::std_dev(&amounts),
        variance: stats::variance(&amounts),
        p25: stats::percentile(&amounts, 25.0),
        p75: stats::percentile(&amounts, 75.0),
        p85: stats::percentile(&amounts, 85.0),
        p95: stats::percentile(&amounts, 95.0),
    }
}

fn demand_block(billable: &[&Order], policy: &CalculationPolicy) -> DemandBlock {
    let timed: Vec<(DateTime<Utc>, f64)> = billable
        .iter()
        .filter_map(|o| parse_timestamp(&o.created_at).map(|ts| (ts, o.total_amount)))
        .collect();

    let mut heatmap = demand::peak_demand_heatmap(&timed);
    heatmap.truncate(policy.heatmap_top_n);

    DemandBlock {
        peak_hour: heatmap.first().map(|c| c.hour),
        peak_day: heatmap.first().map(|c| c.weekday.clone()),
        peak_score: heatmap.first().map(|c| c.score).unwrap_or(0.0),
        heatmap,
    }
}

fn trend_block(series: &[f64]) -> TrendBlock {
    TrendBlock {
        sma_7: regression::simple_moving_average(series, 7),
        sma_14: regression::simple_moving_average(series, 14),
        sma_30: regression::simple_moving_average(series, 30),
        ema_7: regression::exponential_moving_average(series, 7),
    }
}

/// Heuristic 0-100 confidence in the day's inputs, not a correctness gate.
fn data_quality(
    order_count: i64,
    active_customers: i64,
    staff_records: usize,
    series: &[f64],
    anomaly_count: i64,
) -> f64 {
    let mut score: f64 = 100.0;
    if order_count == 0 {
        score -= 30.0;
    }
    if active_customers == 0 {
        score -= 20.0;
    }
    if staff_records == 0 {
        score -= 10.0;
    }
    let days_with_data = series.iter().filter(|v| **v > 0.0).count();
    if days_with_data < 7 {
        score -= 20.0;
    }
    if anomaly_count > 5 {
        score -= 10.0;
    }
    score.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_order(id: &str, due_at: &str) -> Order {
        Order {
            id: id.to_string(),
            franchise_id: "f1".to_string(),
            customer_id: None,
            employee_id: None,
            created_at: "2026-08-24T09:00:00Z".to_string(),
            due_at: Some(due_at.to_string()),
            completed_at: None,
            total_amount: 100.0,
            status: "pending".to_string(),
            payment_method: "cash".to_string(),
            payment_status: "unpaid".to_string(),
            tax_rate: 0.18,
            interstate: false,
        }
    }

    #[test]
    fn open_orders_classify_against_day_close_not_wall_clock() {
        let policy = CalculationPolicy::default();
        let date = NaiveDate::from_ymd_opt(2026, 8, 24).unwrap();

        let due_within_day = open_order("a", "2026-08-24T18:00:00Z");
        let due_next_week = open_order("b", "2026-08-31T12:00:00Z");
        let billable = vec![&due_within_day, &due_next_week];

        let first = operations_block(&billable, &policy, day_close(date));
        let second = operations_block(&billable, &policy, day_close(date));

        assert_eq!(first.delayed_orders, 1);
        assert_eq!(first.pending_orders, 1);
        assert_eq!(first.delayed_orders, second.delayed_orders);
        assert_eq!(first.pending_orders, second.pending_orders);
    }

    #[test]
    fn quality_score_applies_all_penalties() {
        assert_eq!(data_quality(0, 0, 0, &[], 6), 10.0);
        assert_eq!(data_quality(0, 0, 0, &[], 100), 10.0);
        assert_eq!(data_quality(10, 5, 2, &[1.0; 30], 0), 100.0);
    }
}
