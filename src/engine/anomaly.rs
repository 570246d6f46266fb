//! Order-value outlier detection.

use crate::engine::stats;
use crate::models::AnomalyDetail;

/// Flags orders whose amount sits more than `k_sigma` standard deviations
/// from the day's mean. Each order is scored against the mean and stddev of
/// the *other* orders (leave-one-out), so a single extreme value cannot
/// inflate the baseline enough to mask itself. Needs at least three orders.
pub fn detect_anomalies(orders: &[(String, f64)], k_sigma: f64) -> Vec<AnomalyDetail> {
    if orders.len() < 3 {
        return Vec::new();
    }

    let amounts: Vec<f64> = orders.iter().map(|(_, amount)| *amount).collect();
    let mut details = Vec::new();

    for (i, (order_id, amount)) in orders.iter().enumerate() {
        let rest: Vec<f64> = amounts
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, v)| *v)
            .collect();

        let rest_mean = stats::mean(&rest);
        let rest_sd = stats::std_dev(&rest);
        let delta = amount - rest_mean;

        // A flat baseline has no scale to standardize against, so any
        // departure from it counts; the reported deviation is relative to
        // the baseline to stay unit-free.
        let (deviation, flagged) = if rest_sd > 0.0 {
            let z = delta.abs() / rest_sd;
            (z, z > k_sigma)
        } else {
            let relative = if rest_mean.abs() > 0.0 {
                delta.abs() / rest_mean.abs()
            } else {
                delta.abs()
            };
            (relative, delta != 0.0)
        };
        if flagged {
            details.push(AnomalyDetail {
                order_id: order_id.clone(),
                amount: *amount,
                deviation,
                direction: if delta >= 0.0 { "high" } else { "low" }.to_string(),
            });
        }
    }

    details
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orders(amounts: &[f64]) -> Vec<(String, f64)> {
        amounts
            .iter()
            .enumerate()
            .map(|(i, amount)| (format!("order-{i}"), *amount))
            .collect()
    }

    #[test]
    fn single_extreme_outlier_is_the_only_flag() {
        let flagged = detect_anomalies(&orders(&[100.0, 105.0, 98.0, 102.0, 5000.0]), 3.0);
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].order_id, "order-4");
        assert_eq!(flagged[0].direction, "high");
        assert!(flagged[0].deviation > 3.0);
    }

    #[test]
    fn uniform_day_has_no_anomalies() {
        assert!(detect_anomalies(&orders(&[50.0, 50.0, 50.0, 50.0]), 3.0).is_empty());
    }

    #[test]
    fn low_outliers_are_flagged_too() {
        let flagged = detect_anomalies(&orders(&[500.0, 510.0, 495.0, 505.0, 2.0]), 3.0);
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].direction, "low");
    }

    #[test]
    fn too_few_orders_are_skipped() {
        assert!(detect_anomalies(&orders(&[10.0, 9000.0]), 3.0).is_empty());
    }

    #[test]
    fn flat_baseline_flags_any_departure() {
        // Against three identical 1000s the departing order has a flat
        // leave-one-out baseline; the absolute gap of 2 must not be
        // measured against k_sigma as if it were a z-score.
        let flagged = detect_anomalies(&orders(&[1000.0, 1000.0, 1000.0, 1002.0]), 3.0);
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].order_id, "order-3");
        assert!((flagged[0].deviation - 2.0 / 1000.0).abs() < 1e-12);
    }
}
