//! Customer lifetime value, loyalty tiers and cohort retention.

use chrono::{Datelike, NaiveDate};

use crate::config::CalculationPolicy;
use crate::models::{Customer, CustomerValue, LoyaltyTier};
use crate::utils::parse_timestamp;

/// Annualized value of one customer from cumulative spend, order count and
/// account age. Zero orders means no CLV.
pub fn customer_clv(
    total_spend: f64,
    order_count: i64,
    age_days: f64,
    policy: &CalculationPolicy,
) -> f64 {
    if order_count <= 0 {
        return 0.0;
    }
    let age_days = age_days.max(1.0);
    let avg_order = total_spend / order_count as f64;
    let orders_per_month = order_count as f64 / (age_days / 30.0);
    avg_order * orders_per_month * policy.clv_horizon_months
}

pub fn loyalty_tier(total_spend: f64, order_count: i64, policy: &CalculationPolicy) -> LoyaltyTier {
    if total_spend >= policy.platinum_spend || order_count >= policy.platinum_orders {
        LoyaltyTier::Platinum
    } else if total_spend >= policy.gold_spend || order_count >= policy.gold_orders {
        LoyaltyTier::Gold
    } else if total_spend >= policy.silver_spend || order_count >= policy.silver_orders {
        LoyaltyTier::Silver
    } else {
        LoyaltyTier::Bronze
    }
}

/// CLV and tier for every customer with at least one order.
pub fn customer_clvs(
    customers: &[Customer],
    as_of: NaiveDate,
    policy: &CalculationPolicy,
) -> Vec<CustomerValue> {
    customers
        .iter()
        .filter(|c| c.order_count > 0)
        .map(|c| {
            let age_days = c
                .first_order_at
                .as_deref()
                .and_then(parse_timestamp)
                .map(|first| (as_of - first.date_naive()).num_days() as f64)
                .unwrap_or(1.0);
            CustomerValue {
                customer_id: c.id.clone(),
                lifetime_value: customer_clv(c.total_spend, c.order_count, age_days, policy),
                tier: loyalty_tier(c.total_spend, c.order_count, policy),
            }
        })
        .collect()
}

/// Month-over-month retention by signup cohort. A cohort member counts as
/// retained when they ordered again in a later month than their first.
/// Returns (churn_pct, retention_pct), or `None` when fewer than two signup
/// cohorts exist to compare.
pub fn cohort_retention(customers: &[Customer]) -> Option<(f64, f64)> {
    let mut cohorts: std::collections::BTreeMap<(i32, u32), (i64, i64)> =
        std::collections::BTreeMap::new();

    for customer in customers {
        let Some(first) = customer.first_order_at.as_deref().and_then(parse_timestamp) else {
            continue;
        };
        let last = customer.last_order_at.as_deref().and_then(parse_timestamp);
        let key = (first.year(), first.month());
        let entry = cohorts.entry(key).or_insert((0, 0));
        entry.0 += 1;
        if let Some(last) = last {
            if (last.year(), last.month()) > key {
                entry.1 += 1;
            }
        }
    }

    if cohorts.len() < 2 {
        return None;
    }
    let total: i64 = cohorts.values().map(|(n, _)| n).sum();
    let retained: i64 = cohorts.values().map(|(_, r)| r).sum();
    if total == 0 {
        return None;
    }
    let retention = retained as f64 / total as f64 * 100.0;
    Some((100.0 - retention, retention))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(id: &str, spend: f64, orders: i64, first: &str, last: &str) -> Customer {
        Customer {
            id: id.to_string(),
            franchise_id: "f1".to_string(),
            name: id.to_string(),
            total_spend: spend,
            order_count: orders,
            first_order_at: Some(first.to_string()),
            last_order_at: Some(last.to_string()),
        }
    }

    #[test]
    fn clv_scales_with_frequency() {
        let policy = CalculationPolicy::default();
        // 10 orders of 100 over 60 days: 5 orders/month * 100 * 12 months.
        let clv = customer_clv(1000.0, 10, 60.0, &policy);
        assert!((clv - 6000.0).abs() < 1e-9);
        assert_eq!(customer_clv(1000.0, 0, 60.0, &policy), 0.0);
    }

    #[test]
    fn tiers_follow_policy_floors() {
        let policy = CalculationPolicy::default();
        assert_eq!(loyalty_tier(60_000.0, 3, &policy), LoyaltyTier::Platinum);
        assert_eq!(loyalty_tier(100.0, 60, &policy), LoyaltyTier::Platinum);
        assert_eq!(loyalty_tier(25_000.0, 5, &policy), LoyaltyTier::Gold);
        assert_eq!(loyalty_tier(6_000.0, 2, &policy), LoyaltyTier::Silver);
        assert_eq!(loyalty_tier(100.0, 1, &policy), LoyaltyTier::Bronze);
    }

    #[test]
    fn clvs_skip_customers_without_orders() {
        let policy = CalculationPolicy::default();
        let as_of = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let mut customers = vec![
            customer("a", 500.0, 5, "2026-01-01T10:00:00Z", "2026-02-20T10:00:00Z"),
            customer("b", 90.0, 1, "2026-02-10T10:00:00Z", "2026-02-10T10:00:00Z"),
        ];
        customers.push(Customer {
            id: "never-ordered".to_string(),
            franchise_id: "f1".to_string(),
            name: "n".to_string(),
            total_spend: 0.0,
            order_count: 0,
            first_order_at: None,
            last_order_at: None,
        });

        let values = customer_clvs(&customers, as_of, &policy);
        assert_eq!(values.len(), 2);
        assert!(values.iter().all(|v| v.lifetime_value > 0.0));
    }

    #[test]
    fn retention_needs_two_cohorts() {
        let one_cohort = vec![customer(
            "a",
            100.0,
            2,
            "2026-01-05T00:00:00Z",
            "2026-02-01T00:00:00Z",
        )];
        assert!(cohort_retention(&one_cohort).is_none());

        let two_cohorts = vec![
            customer("a", 100.0, 2, "2026-01-05T00:00:00Z", "2026-02-01T00:00:00Z"),
            customer("b", 100.0, 1, "2026-02-07T00:00:00Z", "2026-02-07T00:00:00Z"),
        ];
        let (churn, retention) = cohort_retention(&two_cohorts).unwrap();
        assert!((retention - 50.0).abs() < 1e-9);
        assert!((churn - 50.0).abs() < 1e-9);
    }
}
