//! Fixed-lookback window regressor and the moving-average fallback.

use crate::core::{ModelId, SalesSeries};
use crate::error::{EngineError, Result};
use crate::models::Forecaster;
use crate::utils::{least_squares, mean, LinearModel};

/// Default lookback window for the sequence model.
pub const DEFAULT_LOOKBACK: usize = 14;

/// Learns a ridge-regularized linear map from the last `lookback`
/// observations to the next value.
#[derive(Debug, Clone)]
pub struct WindowRegressor {
    lookback: usize,
    model: Option<LinearModel>,
    history: Vec<f64>,
    fitted: Option<Vec<f64>>,
}

impl WindowRegressor {
    pub fn new(lookback: usize) -> Self {
        Self {
            lookback: lookback.max(1),
            model: None,
            history: Vec::new(),
            fitted: None,
        }
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }

    /// Minimum history needed to fit: one full window plus two targets.
    pub fn min_history(&self) -> usize {
        self.lookback + 2
    }
}

impl Default for WindowRegressor {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKBACK)
    }
}

impl Forecaster for WindowRegressor {
    fn fit(&mut self, series: &SalesSeries) -> Result<()> {
        let values = series.values();
        if values.len() < self.min_history() {
            return Err(EngineError::InsufficientData {
                needed: self.min_history(),
                got: values.len(),
            });
        }

        let k = self.lookback;
        let mut rows = Vec::with_capacity(values.len() - k);
        let mut targets = Vec::with_capacity(values.len() - k);
        for t in k..values.len() {
            rows.push(values[t - k..t].to_vec());
            targets.push(values[t]);
        }

        // Consecutive observations are highly collinear; the ridge term
        // keeps the window coefficients bounded.
        let model = least_squares(&rows, &targets, 0.1)?;

        let mut fitted = vec![f64::NAN; k];
        fitted.extend(rows.iter().map(|row| model.predict(row)));

        self.model = Some(model);
        self.history = values.to_vec();
        self.fitted = Some(fitted);
        Ok(())
    }

    fn predict_next(&self) -> Result<f64> {
        let model = self.model.as_ref().ok_or(EngineError::NotTrained)?;
        let tail = &self.history[self.history.len() - self.lookback..];
        Ok(model.predict(tail))
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn id(&self) -> ModelId {
        ModelId::WindowRegression
    }
}

/// Moving-average estimator: the documented fallback when history is
/// shorter than the window regressor's lookback. Fits on any non-empty
/// series.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    window: usize,
    history: Vec<f64>,
    fitted: Option<Vec<f64>>,
}

impl MovingAverage {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            history: Vec::new(),
            fitted: None,
        }
    }
}

impl Default for MovingAverage {
    fn default() -> Self {
        Self::new(7)
    }
}

impl Forecaster for MovingAverage {
    fn fit(&mut self, series: &SalesSeries) -> Result<()> {
        let values = series.values();
        if values.is_empty() {
            return Err(EngineError::InsufficientData { needed: 1, got: 0 });
        }

        let mut fitted = vec![f64::NAN; values.len()];
        for t in 1..values.len() {
            let start = t.saturating_sub(self.window);
            fitted[t] = mean(&values[start..t]);
        }

        self.history = values.to_vec();
        self.fitted = Some(fitted);
        Ok(())
    }

    fn predict_next(&self) -> Result<f64> {
        if self.history.is_empty() {
            return Err(EngineError::NotTrained);
        }
        let start = self.history.len().saturating_sub(self.window);
        Ok(mean(&self.history[start..]))
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn id(&self) -> ModelId {
        ModelId::MovingAverage
    }
}
