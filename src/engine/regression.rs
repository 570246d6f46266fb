//! Trend fitting and revenue projection over the trailing daily series.

use crate::engine::stats;
use crate::models::RevenueTrend;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionFit {
    pub slope: f64,
    pub intercept: f64,
    pub r2: f64,
}

/// Ordinary least squares. Degenerate input (fewer than two points or a
/// flat x axis) yields slope 0 and R² 0 instead of NaN.
pub fn linear_regression(xs: &[f64], ys: &[f64]) -> RegressionFit {
    let n = xs.len().min(ys.len());
    if n < 2 {
        let intercept = if n == 1 { ys[0] } else { 0.0 };
        return RegressionFit { slope: 0.0, intercept, r2: 0.0 };
    }

    let xs = &xs[..n];
    let ys = &ys[..n];
    let mean_x = stats::mean(xs);
    let mean_y = stats::mean(ys);

    let mut ss_xx = 0.0;
    let mut ss_xy = 0.0;
    for i in 0..n {
        let dx = xs[i] - mean_x;
        ss_xx += dx * dx;
        ss_xy += dx * (ys[i] - mean_y);
    }
    if ss_xx == 0.0 {
        return RegressionFit { slope: 0.0, intercept: mean_y, r2: 0.0 };
    }

    let slope = ss_xy / ss_xx;
    let intercept = mean_y - slope * mean_x;

    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for i in 0..n {
        let predicted = slope * xs[i] + intercept;
        ss_res += (ys[i] - predicted) * (ys[i] - predicted);
        ss_tot += (ys[i] - mean_y) * (ys[i] - mean_y);
    }
    let r2 = if ss_tot == 0.0 {
        0.0
    } else {
        (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
    };

    RegressionFit { slope, intercept, r2 }
}

/// Extrapolates the fitted line `horizon` steps past the history, flooring
/// every point at zero.
pub fn forecast_revenue(history: &[f64], horizon: usize) -> Vec<f64> {
    if history.is_empty() {
        return vec![0.0; horizon];
    }
    let xs: Vec<f64> = (0..history.len()).map(|i| i as f64).collect();
    let fit = linear_regression(&xs, history);
    (0..horizon)
        .map(|step| {
            let x = (history.len() + step) as f64;
            (fit.slope * x + fit.intercept).max(0.0)
        })
        .collect()
}

const RUN_RATE_WEIGHT: f64 = 0.7;

/// Linear run-rate projection of the current month, blended toward last
/// month's actual as a smoothing prior when one exists.
pub fn projected_month_end_revenue(
    month_to_date: f64,
    day_of_month: u32,
    days_in_month: u32,
    last_month_revenue: f64,
) -> f64 {
    if day_of_month == 0 {
        return 0.0;
    }
    let run_rate = month_to_date / day_of_month as f64 * days_in_month as f64;
    if last_month_revenue > 0.0 {
        run_rate * RUN_RATE_WEIGHT + last_month_revenue * (1.0 - RUN_RATE_WEIGHT)
    } else {
        run_rate
    }
}

/// Fixed-window trailing average; output is shorter than the input by
/// `window - 1`.
pub fn simple_moving_average(data: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || data.len() < window {
        return Vec::new();
    }
    data.windows(window)
        .map(|w| w.iter().sum::<f64>() / window as f64)
        .collect()
}

/// Standard smoothing with alpha = 2 / (window + 1), seeded with the first
/// observation; output aligned to the input.
pub fn exponential_moving_average(data: &[f64], window: usize) -> Vec<f64> {
    if data.is_empty() || window == 0 {
        return Vec::new();
    }
    let alpha = 2.0 / (window as f64 + 1.0);
    let mut out = Vec::with_capacity(data.len());
    let mut current = data[0];
    out.push(current);
    for &value in &data[1..] {
        current = value * alpha + current * (1.0 - alpha);
        out.push(current);
    }
    out
}

/// Rate of change of today's revenue against the recent baseline,
/// normalized by recent volatility so a noisy week does not read as a trend.
pub fn revenue_velocity(today: f64, last_7_days: &[f64], threshold: f64) -> (f64, RevenueTrend) {
    if last_7_days.is_empty() {
        return (0.0, RevenueTrend::Stable);
    }
    let baseline = stats::mean(last_7_days);
    let volatility = stats::std_dev(last_7_days);
    let velocity = if volatility > 0.0 {
        (today - baseline) / volatility
    } else if baseline > 0.0 {
        (today - baseline) / baseline
    } else {
        0.0
    };

    let trend = if velocity > threshold {
        RevenueTrend::Accelerating
    } else if velocity < -threshold {
        RevenueTrend::Decelerating
    } else {
        RevenueTrend::Stable
    };
    (velocity, trend)
}
