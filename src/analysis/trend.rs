//! Linear trend fitting.

use statrs::distribution::{ContinuousCDF, Normal};

/// Direction of a fitted trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

/// Result of the OLS fit of value against time index.
#[derive(Debug, Clone)]
pub struct TrendFit {
    /// Change in value per time step.
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination of the fit.
    pub r_squared: f64,
    /// Standard error of the slope.
    pub stderr: f64,
    /// Two-tailed p-value for the slope (normal approximation).
    pub p_value: f64,
    /// Mean level of the series, used for the stability threshold.
    pub mean_level: f64,
}

/// Slopes smaller than this fraction of the mean level per step count as
/// stable.
const STABILITY_EPSILON: f64 = 5e-3;

impl TrendFit {
    /// Classify the fit: slope magnitude below epsilon (relative to the
    /// series level) is stable, otherwise the sign decides.
    pub fn direction(&self) -> TrendDirection {
        if !self.slope.is_finite() {
            return TrendDirection::Stable;
        }
        let scale = self.mean_level.abs().max(1.0);
        if self.slope.abs() < STABILITY_EPSILON * scale {
            TrendDirection::Stable
        } else if self.slope > 0.0 {
            TrendDirection::Increasing
        } else {
            TrendDirection::Decreasing
        }
    }
}

/// Ordinary least-squares regression of value against the index 0, 1, 2, …
///
/// Series with fewer than two points return a flat fit with zero strength.
pub fn fit_trend(values: &[f64]) -> TrendFit {
    if values.len() < 2 {
        return TrendFit {
            slope: 0.0,
            intercept: values.first().copied().unwrap_or(0.0),
            r_squared: 0.0,
            stderr: f64::NAN,
            p_value: 1.0,
            mean_level: values.first().copied().unwrap_or(0.0),
        };
    }

    let n = values.len() as f64;
    let sum_x: f64 = (0..values.len()).map(|i| i as f64).sum();
    let sum_y: f64 = values.iter().sum();
    let sum_xy: f64 = values.iter().enumerate().map(|(i, &y)| i as f64 * y).sum();
    let sum_x2: f64 = (0..values.len()).map(|i| (i * i) as f64).sum();

    let mean_x = sum_x / n;
    let mean_y = sum_y / n;

    let ss_xx = sum_x2 - n * mean_x * mean_x;
    let ss_xy = sum_xy - n * mean_x * mean_y;

    if ss_xx.abs() < 1e-10 {
        return TrendFit {
            slope: 0.0,
            intercept: mean_y,
            r_squared: 0.0,
            stderr: f64::NAN,
            p_value: 1.0,
            mean_level: mean_y,
        };
    }

    let slope = ss_xy / ss_xx;
    let intercept = mean_y - slope * mean_x;

    let ss_yy: f64 = values.iter().map(|&y| (y - mean_y).powi(2)).sum();
    let ss_res: f64 = values
        .iter()
        .enumerate()
        .map(|(i, &y)| (y - (slope * i as f64 + intercept)).powi(2))
        .sum();

    let r_squared = if ss_yy.abs() < 1e-10 {
        // Constant series: the flat line fits perfectly.
        1.0
    } else {
        1.0 - ss_res / ss_yy
    };

    let mse = if n > 2.0 { ss_res / (n - 2.0) } else { 0.0 };
    let stderr = if ss_xx > 0.0 {
        (mse / ss_xx).sqrt()
    } else {
        f64::NAN
    };

    let t_stat = if stderr > 1e-10 {
        slope / stderr
    } else {
        f64::INFINITY
    };
    let p_value = match Normal::new(0.0, 1.0) {
        Ok(normal) => 2.0 * (1.0 - normal.cdf(t_stat.abs())),
        Err(_) => f64::NAN,
    };

    TrendFit {
        slope,
        intercept,
        r_squared,
        stderr,
        p_value,
        mean_level: mean_y,
    }
}
