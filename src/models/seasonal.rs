//! Additive trend-plus-seasonal regression.

use crate::analysis::seasonality::detect_seasonality;
use crate::analysis::trend::fit_trend;
use crate::core::{ModelId, SalesSeries};
use crate::error::{EngineError, Result};
use crate::models::Forecaster;

/// Decomposes the series into an OLS linear trend and per-phase seasonal
/// means, then extrapolates both.
///
/// The period is detected from the autocorrelation scan unless supplied;
/// with no seasonality the model degrades to the bare trend line.
#[derive(Debug, Clone)]
pub struct SeasonalRegression {
    period_override: Option<usize>,
    period: usize,
    slope: f64,
    intercept: f64,
    seasonal: Vec<f64>,
    n: usize,
    fitted: Option<Vec<f64>>,
}

impl SeasonalRegression {
    pub fn new() -> Self {
        Self {
            period_override: None,
            period: 1,
            slope: 0.0,
            intercept: 0.0,
            seasonal: vec![0.0],
            n: 0,
            fitted: None,
        }
    }

    /// Force a seasonal period instead of detecting one.
    pub fn with_period(mut self, period: usize) -> Self {
        self.period_override = Some(period.max(1));
        self
    }

    /// Period used by the last fit.
    pub fn period(&self) -> usize {
        self.period
    }
}

impl Default for SeasonalRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl Forecaster for SeasonalRegression {
    fn fit(&mut self, series: &SalesSeries) -> Result<()> {
        let values = series.values();
        if values.len() < 3 {
            return Err(EngineError::InsufficientData {
                needed: 3,
                got: values.len(),
            });
        }

        let trend = fit_trend(values);
        self.slope = trend.slope;
        self.intercept = trend.intercept;

        self.period = self
            .period_override
            .or_else(|| detect_seasonality(values).period)
            .unwrap_or(1)
            .min(values.len());

        // Per-phase mean of detrended residuals.
        let mut sums = vec![0.0; self.period];
        let mut counts = vec![0usize; self.period];
        for (t, &y) in values.iter().enumerate() {
            let residual = y - (self.slope * t as f64 + self.intercept);
            sums[t % self.period] += residual;
            counts[t % self.period] += 1;
        }
        self.seasonal = sums
            .iter()
            .zip(counts.iter())
            .map(|(&s, &c)| if c > 0 { s / c as f64 } else { 0.0 })
            .collect();

        self.n = values.len();
        self.fitted = Some(
            (0..values.len())
                .map(|t| self.slope * t as f64 + self.intercept + self.seasonal[t % self.period])
                .collect(),
        );
        Ok(())
    }

    fn predict_next(&self) -> Result<f64> {
        if self.fitted.is_none() {
            return Err(EngineError::NotTrained);
        }
        let t = self.n;
        Ok(self.slope * t as f64 + self.intercept + self.seasonal[t % self.period])
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn id(&self) -> ModelId {
        ModelId::SeasonalRegression
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone, Utc};

    fn make_series(values: Vec<f64>) -> SalesSeries {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let timestamps: Vec<_> = (0..values.len())
            .map(|i| base + Duration::days(i as i64))
            .collect();
        SalesSeries::new(timestamps, values).unwrap()
    }

    fn trend_plus_weekly(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                200.0
                    + 2.0 * i as f64
                    + 30.0 * (2.0 * std::f64::consts::PI * i as f64 / 7.0).sin()
            })
            .collect()
    }

    #[test]
    fn recovers_trend_and_weekly_component() {
        let values = trend_plus_weekly(70);
        let mut model = SeasonalRegression::new();
        model.fit(&make_series(values.clone())).unwrap();

        assert_eq!(model.period(), 7);

        // Next point continues both trend and phase.
        let expected = 200.0
            + 2.0 * 70.0
            + 30.0 * (2.0 * std::f64::consts::PI * 70.0 / 7.0).sin();
        assert_relative_eq!(model.predict_next().unwrap(), expected, epsilon = 5.0);
    }

    #[test]
    fn plain_trend_without_seasonality() {
        let values: Vec<f64> = (0..30).map(|i| 10.0 + 3.0 * i as f64).collect();
        let mut model = SeasonalRegression::new();
        model.fit(&make_series(values)).unwrap();

        assert_eq!(model.period(), 1);
        assert_relative_eq!(model.predict_next().unwrap(), 100.0, epsilon = 1e-6);
    }

    #[test]
    fn explicit_period_overrides_detection() {
        let values = trend_plus_weekly(70);
        let mut model = SeasonalRegression::new().with_period(14);
        model.fit(&make_series(values)).unwrap();
        assert_eq!(model.period(), 14);
    }

    #[test]
    fn fitted_values_track_series() {
        let values = trend_plus_weekly(56);
        let mut model = SeasonalRegression::new();
        model.fit(&make_series(values.clone())).unwrap();

        let fitted = model.fitted_values().unwrap();
        assert_eq!(fitted.len(), values.len());
        // Additive decomposition should explain most of the variation.
        let mse: f64 = values
            .iter()
            .zip(fitted.iter())
            .map(|(y, f)| (y - f).powi(2))
            .sum::<f64>()
            / values.len() as f64;
        assert!(mse < 100.0, "mse was {}", mse);
    }

    #[test]
    fn requires_three_points() {
        let mut model = SeasonalRegression::new();
        assert!(matches!(
            model.fit(&make_series(vec![1.0, 2.0])),
            Err(EngineError::InsufficientData { .. })
        ));
    }
}
