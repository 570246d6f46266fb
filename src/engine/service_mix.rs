//! Service revenue mix and basket co-occurrence.

use std::collections::BTreeMap;

use crate::models::{ServiceContribution, ServiceCorrelation, ServiceRole};

/// Revenue per service keyed by id, carrying the display name.
#[derive(Debug, Clone)]
pub struct ServiceRevenue {
    pub service_id: String,
    pub name: String,
    pub revenue: f64,
}

/// Each service's revenue share against an equal-share target. At or above
/// target is a Hero, below is a LossLeader; variance is the signed gap.
pub fn service_contribution(
    services: &[ServiceRevenue],
    total_revenue: f64,
) -> Vec<ServiceContribution> {
    if services.is_empty() || total_revenue <= 0.0 {
        return Vec::new();
    }
    let target_share = 1.0 / services.len() as f64;

    let mut contributions: Vec<ServiceContribution> = services
        .iter()
        .map(|s| {
            let share = s.revenue / total_revenue;
            let variance = share - target_share;
            ServiceContribution {
                service_id: s.service_id.clone(),
                name: s.name.clone(),
                revenue: s.revenue,
                share,
                target_share,
                variance,
                role: if variance >= 0.0 {
                    ServiceRole::Hero
                } else {
                    ServiceRole::LossLeader
                },
            }
        })
        .collect();

    contributions.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
    contributions
}

/// Pairwise co-occurrence strength between services appearing in the same
/// order basket (cosine over per-service basket counts), ranked descending.
pub fn service_correlation(baskets: &[Vec<String>]) -> Vec<ServiceCorrelation> {
    let mut single: BTreeMap<String, i64> = BTreeMap::new();
    let mut pairs: BTreeMap<(String, String), i64> = BTreeMap::new();

    for basket in baskets {
        let mut unique: Vec<String> = basket.clone();
        unique.sort();
        unique.dedup();

        for service in &unique {
            *single.entry(service.clone()).or_insert(0) += 1;
        }
        for i in 0..unique.len() {
            for j in (i + 1)..unique.len() {
                *pairs
                    .entry((unique[i].clone(), unique[j].clone()))
                    .or_insert(0) += 1;
            }
        }
    }

    let mut correlations: Vec<ServiceCorrelation> = pairs
        .into_iter()
        .map(|((a, b), count)| {
            let denominator = (single[&a] as f64 * single[&b] as f64).sqrt();
            ServiceCorrelation {
                strength: if denominator > 0.0 {
                    count as f64 / denominator
                } else {
                    0.0
                },
                co_occurrences: count,
                service_a: a,
                service_b: b,
            }
        })
        .collect();

    correlations.sort_by(|a, b| {
        b.strength
            .total_cmp(&a.strength)
            .then_with(|| b.co_occurrences.cmp(&a.co_occurrences))
    });
    correlations
}
