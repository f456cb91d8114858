//! Autoregressive model with optional first-order differencing.

use crate::analysis::trend::{fit_trend, TrendDirection};
use crate::core::{ModelId, SalesSeries};
use crate::error::{EngineError, Result};
use crate::features::lag_matrix;
use crate::models::Forecaster;
use crate::utils::{least_squares, LinearModel};

/// Default autoregressive order.
pub const DEFAULT_ORDER: usize = 3;

/// AR(p) over the raw series, or over first differences when the series
/// carries a trend (the "integrated" case).
#[derive(Debug, Clone)]
pub struct Autoregressive {
    order: usize,
    model: Option<LinearModel>,
    differenced: bool,
    history: Vec<f64>,
    fitted: Option<Vec<f64>>,
}

impl Autoregressive {
    pub fn new(order: usize) -> Self {
        Self {
            order: order.max(1),
            model: None,
            differenced: false,
            history: Vec::new(),
            fitted: None,
        }
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Whether the last fit used first differences.
    pub fn is_differenced(&self) -> bool {
        self.differenced
    }

    fn min_history(&self) -> usize {
        // One extra point for differencing plus three target rows.
        self.order + 4
    }

    fn working_values(&self) -> Vec<f64> {
        if self.differenced {
            self.history.windows(2).map(|w| w[1] - w[0]).collect()
        } else {
            self.history.clone()
        }
    }
}

impl Default for Autoregressive {
    fn default() -> Self {
        Self::new(DEFAULT_ORDER)
    }
}

impl Forecaster for Autoregressive {
    fn fit(&mut self, series: &SalesSeries) -> Result<()> {
        let values = series.values();
        if values.len() < self.min_history() {
            return Err(EngineError::InsufficientData {
                needed: self.min_history(),
                got: values.len(),
            });
        }

        // Difference once when the level drifts; AR coefficients then model
        // the changes rather than the level.
        self.differenced = fit_trend(values).direction() != TrendDirection::Stable;
        self.history = values.to_vec();

        let working = self.working_values();
        let lags: Vec<usize> = (1..=self.order).collect();
        let (rows, targets) = lag_matrix(&working, &lags);
        if rows.len() < 3 {
            return Err(EngineError::InsufficientData {
                needed: self.min_history(),
                got: values.len(),
            });
        }
        let model = least_squares(&rows, &targets, 0.0)?;

        // In-sample one-step predictions on the original scale.
        let offset = values.len() - working.len(); // 1 when differenced
        let mut fitted = vec![f64::NAN; offset + self.order];
        for (i, row) in rows.iter().enumerate() {
            let pred = model.predict(row);
            let t = offset + self.order + i;
            fitted.push(if self.differenced {
                values[t - 1] + pred
            } else {
                pred
            });
        }
        debug_assert_eq!(fitted.len(), values.len());

        self.model = Some(model);
        self.fitted = Some(fitted);
        Ok(())
    }

    fn predict_next(&self) -> Result<f64> {
        let model = self.model.as_ref().ok_or(EngineError::NotTrained)?;
        let working = self.working_values();
        if working.len() < self.order {
            return Err(EngineError::InsufficientData {
                needed: self.order,
                got: working.len(),
            });
        }

        // Lag 1 first, matching the training row layout.
        let features: Vec<f64> = (1..=self.order)
            .map(|lag| working[working.len() - lag])
            .collect();
        let pred = model.predict(&features);

        Ok(if self.differenced {
            self.history.last().copied().unwrap_or(0.0) + pred
        } else {
            pred
        })
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn id(&self) -> ModelId {
        ModelId::Autoregressive
    }
}
