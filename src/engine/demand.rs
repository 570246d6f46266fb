//! Peak-demand heat-mapping over (hour-of-day x day-of-week) cells.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};

use crate::models::HeatmapCell;

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Buckets orders by creation hour and weekday, scoring each cell by
/// volume x value. Sorted descending by score.
pub fn peak_demand_heatmap(orders: &[(DateTime<Utc>, f64)]) -> Vec<HeatmapCell> {
    let mut cells: BTreeMap<(u32, u32), (i64, f64)> = BTreeMap::new();

    for (created_at, amount) in orders {
        let key = (
            created_at.weekday().num_days_from_monday(),
            created_at.hour(),
        );
        let entry = cells.entry(key).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += amount;
    }

    let mut out: Vec<HeatmapCell> = cells
        .into_iter()
        .map(|((weekday_idx, hour), (count, revenue))| HeatmapCell {
            hour,
            weekday: weekday_name(weekday_from_index(weekday_idx)).to_string(),
            orders: count,
            revenue,
            score: count as f64 * revenue,
        })
        .collect();

    out.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| b.orders.cmp(&a.orders))
    });
    out
}

fn weekday_from_index(index: u32) -> Weekday {
    match index {
        0 => Weekday::Mon,
        1 => Weekday::Tue,
        2 => Weekday::Wed,
        3 => Weekday::Thu,
        4 => Weekday::Fri,
        5 => Weekday::Sat,
        _ => Weekday::Sun,
    }
}
