//! Queueing, turnaround and staffing computations.

use crate::config::CalculationPolicy;
use crate::engine::stats;
use crate::models::{BottleneckType, StaffScore, StaffThroughput};

#[derive(Debug, Clone, PartialEq)]
pub struct QueueMetrics {
    pub arrival_rate: f64,
    pub avg_wait_days: f64,
    pub work_in_process: f64,
    pub bottleneck: BottleneckType,
    pub recommendation: String,
}

/// Little's Law, L = λW. The constraint is classified by which baseline is
/// exceeded harder: per-item processing time or incoming volume.
pub fn littles_law(
    arrival_rate_per_day: f64,
    avg_processing_days: f64,
    policy: &CalculationPolicy,
) -> QueueMetrics {
    let work_in_process = arrival_rate_per_day * avg_processing_days;

    let processing_ratio = if policy.processing_target_days > 0.0 {
        avg_processing_days / policy.processing_target_days
    } else {
        0.0
    };
    let volume_ratio = if policy.volume_threshold_per_day > 0.0 {
        arrival_rate_per_day / policy.volume_threshold_per_day
    } else {
        0.0
    };

    let (bottleneck, recommendation) = if processing_ratio <= 1.0 && volume_ratio <= 1.0 {
        (
            BottleneckType::Balanced,
            "Throughput is balanced; no intervention needed.".to_string(),
        )
    } else if processing_ratio >= volume_ratio {
        (
            BottleneckType::Processing,
            format!(
                "Average processing time of {:.1} days exceeds the {:.1}-day target; \
                 review station capacity and batching.",
                avg_processing_days, policy.processing_target_days
            ),
        )
    } else {
        (
            BottleneckType::Volume,
            format!(
                "Arrivals of {:.1} orders/day exceed the {:.0}/day intake baseline; \
                 consider staggered pickups or added intake staff.",
                arrival_rate_per_day, policy.volume_threshold_per_day
            ),
        )
    };

    QueueMetrics {
        arrival_rate: arrival_rate_per_day,
        avg_wait_days: avg_processing_days,
        work_in_process,
        bottleneck,
        recommendation,
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnaroundStats {
    pub mean_actual_hours: f64,
    pub mean_delta_hours: f64,
    pub delta_stddev_hours: f64,
    /// 0-100, higher means a tighter delta distribution.
    pub consistency_score: f64,
    pub within_target_pct: f64,
}

/// Spread of (actual − expected) turnaround across completed orders.
pub fn turnaround_variance(pairs: &[(f64, f64)], tolerance_hours: f64) -> TurnaroundStats {
    if pairs.is_empty() {
        return TurnaroundStats::default();
    }
    let actuals: Vec<f64> = pairs.iter().map(|(_, actual)| *actual).collect();
    let deltas: Vec<f64> = pairs.iter().map(|(expected, actual)| actual - expected).collect();

    let delta_stddev = stats::std_dev(&deltas);
    let within = deltas.iter().filter(|d| d.abs() <= tolerance_hours).count();

    TurnaroundStats {
        mean_actual_hours: stats::mean(&actuals),
        mean_delta_hours: stats::mean(&deltas),
        delta_stddev_hours: delta_stddev,
        consistency_score: (100.0 - delta_stddev * 10.0).clamp(0.0, 100.0),
        within_target_pct: within as f64 / pairs.len() as f64 * 100.0,
    }
}

/// Standardizes each employee's hourly throughput into a z-score against the
/// cohort and combines orders (0.6) with items (0.4). Sorted descending.
pub fn staff_efficiency(records: &[StaffThroughput], shift_hours: f64) -> Vec<StaffScore> {
    if records.is_empty() || shift_hours <= 0.0 {
        return Vec::new();
    }
    let order_rates: Vec<f64> = records
        .iter()
        .map(|r| r.orders_processed as f64 / shift_hours)
        .collect();
    let item_rates: Vec<f64> = records
        .iter()
        .map(|r| r.items_processed as f64 / shift_hours)
        .collect();

    let order_mean = stats::mean(&order_rates);
    let order_sd = stats::std_dev(&order_rates);
    let item_mean = stats::mean(&item_rates);
    let item_sd = stats::std_dev(&item_rates);

    let z = |value: f64, mean: f64, sd: f64| if sd > 0.0 { (value - mean) / sd } else { 0.0 };

    let mut scores: Vec<StaffScore> = records
        .iter()
        .enumerate()
        .map(|(i, r)| StaffScore {
            employee_id: r.employee_id.clone(),
            name: r.name.clone(),
            orders_per_hour: order_rates[i],
            items_per_hour: item_rates[i],
            z_score: 0.6 * z(order_rates[i], order_mean, order_sd)
                + 0.4 * z(item_rates[i], item_mean, item_sd),
        })
        .collect();

    scores.sort_by(|a, b| b.z_score.total_cmp(&a.z_score));
    scores
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn littles_law_identity() {
        let policy = CalculationPolicy::default();
        let metrics = littles_law(10.0, 2.0, &policy);
        assert!((metrics.work_in_process - 20.0).abs() < 1e-12);
        assert!((metrics.avg_wait_days - 2.0).abs() < 1e-12);
    }

    #[test]
    fn bottleneck_classification() {
        let policy = CalculationPolicy::default();
        // Processing well past target, arrivals under the baseline.
        assert_eq!(littles_law(10.0, 2.0, &policy).bottleneck, BottleneckType::Processing);
        // Arrivals dominate, processing under target.
        assert_eq!(littles_law(50.0, 1.0, &policy).bottleneck, BottleneckType::Volume);
        // Neither baseline exceeded.
        assert_eq!(littles_law(10.0, 1.0, &policy).bottleneck, BottleneckType::Balanced);
    }

    #[test]
    fn turnaround_within_target_band() {
        let pairs = [(24.0, 25.0), (24.0, 23.0), (24.0, 30.0), (24.0, 24.0)];
        let result = turnaround_variance(&pairs, 2.0);
        assert!((result.within_target_pct - 75.0).abs() < 1e-9);
        // Deltas are [1, -1, 6, 0].
        assert!((result.mean_delta_hours - 1.5).abs() < 1e-9);
        assert!(result.consistency_score > 0.0 && result.consistency_score < 100.0);
    }

    #[test]
    fn identical_turnarounds_score_perfect_consistency() {
        let pairs = [(24.0, 25.0), (24.0, 25.0), (24.0, 25.0)];
        let result = turnaround_variance(&pairs, 2.0);
        assert!((result.consistency_score - 100.0).abs() < 1e-9);
        assert!((result.within_target_pct - 100.0).abs() < 1e-9);
    }

    #[test]
    fn staff_ranked_descending() {
        let records = vec![
            StaffThroughput {
                employee_id: "slow".to_string(),
                name: "Slow".to_string(),
                orders_processed: 4,
                items_processed: 10,
            },
            StaffThroughput {
                employee_id: "fast".to_string(),
                name: "Fast".to_string(),
                orders_processed: 12,
                items_processed: 40,
            },
        ];
        let scores = staff_efficiency(&records, 8.0);
        assert_eq!(scores[0].employee_id, "fast");
        assert!(scores[0].z_score > scores[1].z_score);
    }

    #[test]
    fn uniform_cohort_has_zero_z() {
        let records = vec![
            StaffThroughput {
                employee_id: "a".to_string(),
                name: "A".to_string(),
                orders_processed: 8,
                items_processed: 20,
            },
            StaffThroughput {
                employee_id: "b".to_string(),
                name: "B".to_string(),
                orders_processed: 8,
                items_processed: 20,
            },
        ];
        let scores = staff_efficiency(&records, 8.0);
        assert!(scores.iter().all(|s| s.z_score == 0.0));
    }
}
