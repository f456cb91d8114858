//! Lag features and magnitude transforms.

use crate::core::SalesSeries;
use crate::features::calendar::{business_hours_indicator, cyclical_pair};
use chrono::{DateTime, Datelike, Timelike, Utc};

/// Sign-preserving log transform: `sign(v) * ln(1 + |v|)`.
///
/// Compresses heavy-tailed sales magnitudes while keeping negatives
/// (returns, corrections) distinguishable.
pub fn signed_log1p(value: f64) -> f64 {
    value.signum() * value.abs().ln_1p()
}

/// Build a supervised lag matrix from a series.
///
/// Row `i` holds `values[t - lag]` for each requested lag, with target
/// `values[t]`; only rows where every lag is available are produced.
pub fn lag_matrix(values: &[f64], lags: &[usize]) -> (Vec<Vec<f64>>, Vec<f64>) {
    let max_lag = lags.iter().copied().max().unwrap_or(0);
    if max_lag == 0 || values.len() <= max_lag {
        return (Vec::new(), Vec::new());
    }

    let mut rows = Vec::with_capacity(values.len() - max_lag);
    let mut targets = Vec::with_capacity(values.len() - max_lag);
    for t in max_lag..values.len() {
        rows.push(lags.iter().map(|&lag| values[t - lag]).collect());
        targets.push(values[t]);
    }
    (rows, targets)
}

/// Feature vector for a single anomaly observation: time-of-day/week/month
/// cyclical encodings, log-compressed magnitude, sign indicator, and the
/// business-hours indicator.
///
/// Nine values, fixed order; the pattern model's geometry depends on it.
pub fn observation_features(timestamp: &DateTime<Utc>, value: f64) -> Vec<f64> {
    let (hour_sin, hour_cos) = cyclical_pair(timestamp.hour() as f64, 24.0);
    let (dow_sin, dow_cos) =
        cyclical_pair(timestamp.weekday().num_days_from_monday() as f64, 7.0);
    let (dom_sin, dom_cos) = cyclical_pair((timestamp.day() - 1) as f64, 31.0);
    vec![
        hour_sin,
        hour_cos,
        dow_sin,
        dow_cos,
        dom_sin,
        dom_cos,
        signed_log1p(value),
        if value < 0.0 { 1.0 } else { 0.0 },
        business_hours_indicator(timestamp),
    ]
}

/// Lag features plus calendar block for one forecast step of a series.
///
/// `step_timestamp` is the timestamp the prediction is for; the lags are
/// taken from the series tail.
pub fn step_features(
    series: &SalesSeries,
    lags: &[usize],
    step_timestamp: &DateTime<Utc>,
) -> Option<Vec<f64>> {
    let values = series.values();
    let max_lag = lags.iter().copied().max().unwrap_or(0);
    if max_lag == 0 || values.len() < max_lag {
        return None;
    }
    let mut features: Vec<f64> = lags
        .iter()
        .map(|&lag| values[values.len() - lag])
        .collect();
    features.extend(crate::features::calendar::calendar_features(step_timestamp));
    Some(features)
}
