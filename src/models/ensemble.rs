//! Ensemble forecasting: weighted blend of the model families, extended
//! recursively over the horizon.
//!
//! Each forecast step appends the blended point to a working copy of the
//! series before producing the next step, so later steps condition on
//! earlier predictions and forecast error compounds with the horizon. The
//! interval width grows with the square root of the step for the same
//! reason.

use crate::analysis::{analyze_trend, TrendDirection};
use crate::core::{ConfidenceInterval, ForecastResult, MetricKind, ModelId, SalesSeries};
use crate::error::{EngineError, Result};
use crate::models::window::DEFAULT_LOOKBACK;
use crate::models::{
    Autoregressive, BoostedStumps, Forecaster, MovingAverage, SeasonalRegression, WindowRegressor,
};
use crate::utils::{mean, std_dev};

/// Minimum history for the full model stack; below this the forecast falls
/// back to a moving average (the sequence model's lookback plus targets).
pub const MIN_HISTORY: usize = DEFAULT_LOOKBACK + 2;

/// Which model family (or the blend) to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelSelector {
    #[default]
    Ensemble,
    Autoregressive,
    Seasonal,
    Boosted,
    Window,
}

/// Non-negative blend weights over the four families, summing to 1.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EnsembleWeights {
    pub autoregressive: f64,
    pub seasonal: f64,
    pub boosted: f64,
    pub window: f64,
}

impl Default for EnsembleWeights {
    fn default() -> Self {
        Self {
            autoregressive: 0.30,
            seasonal: 0.25,
            boosted: 0.25,
            window: 0.20,
        }
    }
}

impl EnsembleWeights {
    pub fn sum(&self) -> f64 {
        self.autoregressive + self.seasonal + self.boosted + self.window
    }

    fn as_array(&self) -> [f64; 4] {
        [self.autoregressive, self.seasonal, self.boosted, self.window]
    }

    /// Scale so the weights sum to 1. Rejects negative weights and
    /// all-zero weight sets.
    pub fn normalized(&self) -> Result<Self> {
        if self.as_array().iter().any(|&w| w < 0.0 || !w.is_finite()) {
            return Err(EngineError::InvalidInput(
                "ensemble weights must be non-negative and finite".to_string(),
            ));
        }
        let sum = self.sum();
        if sum <= 0.0 {
            return Err(EngineError::InvalidInput(
                "ensemble weights must not all be zero".to_string(),
            ));
        }
        Ok(Self {
            autoregressive: self.autoregressive / sum,
            seasonal: self.seasonal / sum,
            boosted: self.boosted / sum,
            window: self.window / sum,
        })
    }

    /// Optional backtest-based reweighting: inverse one-step MSE of each
    /// family over a walk-forward holdout tail. Never invoked implicitly;
    /// the static defaults are the load-bearing path.
    pub fn from_backtest(series: &SalesSeries, holdout: usize) -> Result<Self> {
        if holdout == 0 {
            return Err(EngineError::InvalidInput(
                "holdout must be positive".to_string(),
            ));
        }
        let needed = MIN_HISTORY + holdout;
        if series.len() < needed {
            return Err(EngineError::InsufficientData {
                needed,
                got: series.len(),
            });
        }

        let n = series.len();
        let actuals = &series.values()[n - holdout..];
        let mut mses = [f64::INFINITY; 4];

        for (slot, family) in FAMILIES.iter().enumerate() {
            let mut sq_errors = Vec::with_capacity(holdout);
            for i in 0..holdout {
                let train = series.slice(0, n - holdout + i)?;
                if let Ok(pred) = family_prediction(*family, &train, None) {
                    sq_errors.push((pred.0 - actuals[i]).powi(2));
                }
            }
            if sq_errors.len() == holdout {
                mses[slot] = mean(&sq_errors).max(1e-10);
            }
        }

        if mses.iter().all(|m| m.is_infinite()) {
            return Ok(Self::default());
        }

        let inv: Vec<f64> = mses
            .iter()
            .map(|&m| if m.is_finite() { 1.0 / m } else { 0.0 })
            .collect();
        let total: f64 = inv.iter().sum();
        Ok(Self {
            autoregressive: inv[0] / total,
            seasonal: inv[1] / total,
            boosted: inv[2] / total,
            window: inv[3] / total,
        })
    }
}

/// Options for a forecast request.
#[derive(Debug, Clone)]
pub struct ForecastOptions {
    pub selector: ModelSelector,
    /// Confidence level in percent; 90, 95 and 99 are recognized, anything
    /// else defaults to 95.
    pub confidence_level: f64,
    /// Metric domain, used for output clamping.
    pub metric: MetricKind,
    /// Blend weights; `None` uses the static defaults.
    pub weights: Option<EnsembleWeights>,
    /// Seasonal period override for the decomposition model.
    pub seasonal_period: Option<usize>,
    /// Caller-imposed horizon ceiling; longer requests are rejected with
    /// `BudgetExceeded` before any work.
    pub max_horizon: Option<usize>,
}

impl Default for ForecastOptions {
    fn default() -> Self {
        Self {
            selector: ModelSelector::Ensemble,
            confidence_level: 95.0,
            metric: MetricKind::Revenue,
            weights: None,
            seasonal_period: None,
            max_horizon: None,
        }
    }
}

/// Z multiplier for a confidence level in percent; unknown levels default
/// to 95%.
fn z_multiplier(level: f64) -> f64 {
    match level.round() as i64 {
        90 => 1.645,
        95 => 1.96,
        99 => 2.576,
        _ => 1.96,
    }
}

const FAMILIES: [ModelSelector; 4] = [
    ModelSelector::Autoregressive,
    ModelSelector::Seasonal,
    ModelSelector::Boosted,
    ModelSelector::Window,
];

fn family_weight(weights: &EnsembleWeights, family: ModelSelector) -> f64 {
    match family {
        ModelSelector::Autoregressive => weights.autoregressive,
        ModelSelector::Seasonal => weights.seasonal,
        ModelSelector::Boosted => weights.boosted,
        ModelSelector::Window => weights.window,
        ModelSelector::Ensemble => 0.0,
    }
}

fn family_model_id(family: ModelSelector) -> ModelId {
    match family {
        ModelSelector::Autoregressive => ModelId::Autoregressive,
        ModelSelector::Seasonal => ModelId::SeasonalRegression,
        ModelSelector::Boosted => ModelId::BoostedTrees,
        ModelSelector::Window => ModelId::WindowRegression,
        ModelSelector::Ensemble => ModelId::Ensemble,
    }
}

/// Fit one family on the working series and return its one-step prediction
/// and in-sample fitted values.
fn family_prediction(
    family: ModelSelector,
    series: &SalesSeries,
    seasonal_period: Option<usize>,
) -> Result<(f64, Vec<f64>)> {
    fn run<M: Forecaster>(mut model: M, series: &SalesSeries) -> Result<(f64, Vec<f64>)> {
        model.fit(series)?;
        let pred = model.predict_next()?;
        let fitted = model.fitted_values().map(|f| f.to_vec()).unwrap_or_default();
        Ok((pred, fitted))
    }

    match family {
        ModelSelector::Autoregressive => run(Autoregressive::default(), series),
        ModelSelector::Seasonal => {
            let model = match seasonal_period {
                Some(p) => SeasonalRegression::new().with_period(p),
                None => SeasonalRegression::new(),
            };
            run(model, series)
        }
        ModelSelector::Boosted => run(BoostedStumps::default(), series),
        ModelSelector::Window => run(WindowRegressor::default(), series),
        ModelSelector::Ensemble => Err(EngineError::InvalidInput(
            "ensemble is not a single family".to_string(),
        )),
    }
}

/// Outcome of one blended step.
struct BlendedStep {
    predicted: f64,
    model: ModelId,
    /// Blended in-sample fitted values, present only when at least one
    /// family fitted.
    fitted: Option<Vec<f64>>,
    degraded: bool,
}

fn blend_step(
    working: &SalesSeries,
    options: &ForecastOptions,
    weights: &EnsembleWeights,
) -> Result<BlendedStep> {
    let families: Vec<ModelSelector> = match options.selector {
        ModelSelector::Ensemble => FAMILIES.to_vec(),
        single => vec![single],
    };

    let mut fitted_parts: Vec<(f64, Vec<f64>)> = Vec::new();
    let mut weighted: Vec<(f64, f64)> = Vec::new(); // (weight, prediction)
    for family in &families {
        if let Ok((pred, fitted)) = family_prediction(*family, working, options.seasonal_period) {
            if pred.is_finite() {
                let w = match options.selector {
                    ModelSelector::Ensemble => family_weight(weights, *family),
                    _ => 1.0,
                };
                weighted.push((w, pred));
                fitted_parts.push((w, fitted));
            }
        }
    }

    let total_weight: f64 = weighted.iter().map(|(w, _)| w).sum();
    if weighted.is_empty() || total_weight <= 0.0 {
        // No family could fit: documented moving-average fallback.
        let mut ma = MovingAverage::default();
        ma.fit(working)?;
        return Ok(BlendedStep {
            predicted: ma.predict_next()?,
            model: ModelId::MovingAverage,
            fitted: ma.fitted_values().map(|f| f.to_vec()),
            degraded: true,
        });
    }

    let predicted = weighted
        .iter()
        .map(|(w, p)| w / total_weight * p)
        .sum::<f64>();

    // Blend fitted values where every contributing family has a finite
    // in-sample prediction.
    let len = working.len();
    let mut blended_fitted = vec![f64::NAN; len];
    for (t, slot) in blended_fitted.iter_mut().enumerate() {
        let mut acc = 0.0;
        let mut ok = true;
        for (w, fitted) in &fitted_parts {
            match fitted.get(t) {
                Some(v) if v.is_finite() => acc += w / total_weight * v,
                _ => {
                    ok = false;
                    break;
                }
            }
        }
        if ok {
            *slot = acc;
        }
    }

    let model = match options.selector {
        ModelSelector::Ensemble => ModelId::Ensemble,
        single => family_model_id(single),
    };

    Ok(BlendedStep {
        predicted,
        model,
        fitted: Some(blended_fitted),
        degraded: weighted.len() < families.len(),
    })
}

/// Mean absolute percentage error of fitted vs actual, skipping warm-up
/// NaNs and near-zero actuals.
fn accuracy_from_fitted(fitted: &[f64], actuals: &[f64]) -> f64 {
    let mut ratios = Vec::new();
    for (f, y) in fitted.iter().zip(actuals.iter()) {
        if f.is_finite() && y.abs() > 1e-9 {
            ratios.push(((f - y) / y).abs());
        }
    }
    if ratios.is_empty() {
        return 0.5;
    }
    (1.0 - mean(&ratios)).clamp(0.0, 1.0)
}

/// Forecast `horizon` steps ahead.
///
/// Multi-step prediction is recursive: each blended point is appended to a
/// working copy of the series before the next step is produced, so forecast
/// error compounds by design. History shorter than the sequence model's
/// lookback degrades to a moving-average estimate, tagged
/// `ModelId::MovingAverage` in the results.
pub fn forecast(
    series: &SalesSeries,
    horizon: usize,
    options: &ForecastOptions,
) -> Result<Vec<ForecastResult>> {
    if series.is_empty() {
        return Err(EngineError::InvalidInput("empty series".to_string()));
    }
    if horizon == 0 {
        return Err(EngineError::InvalidInput(
            "horizon must be at least 1".to_string(),
        ));
    }
    if let Some(limit) = options.max_horizon {
        if horizon > limit {
            return Err(EngineError::BudgetExceeded {
                limit,
                requested: horizon,
            });
        }
    }
    let weights = options.weights.unwrap_or_default().normalized()?;

    tracing::debug!(
        len = series.len(),
        horizon,
        selector = ?options.selector,
        "running forecast"
    );

    let sigma = {
        let s = std_dev(series.values());
        if s.is_finite() {
            s
        } else {
            0.0
        }
    };
    let z = z_multiplier(options.confidence_level);
    let spacing = series.modal_spacing();

    // Base insights from the shape of the history.
    let mut base_insights: Vec<String> = Vec::new();
    if series.len() >= 2 {
        if let Ok(analysis) = analyze_trend(series) {
            match analysis.direction {
                TrendDirection::Increasing => {
                    base_insights.push("historical demand is trending upward".to_string())
                }
                TrendDirection::Decreasing => {
                    base_insights.push("historical demand is trending downward".to_string())
                }
                TrendDirection::Stable => {}
            }
            if let Some(period) = analysis.seasonality.period {
                base_insights.push(format!(
                    "seasonal cycle of {} observations detected",
                    period
                ));
            }
        }
    }

    let short_history = series.len() < MIN_HISTORY;
    if short_history {
        base_insights.push(
            "history shorter than model lookback; using moving-average fallback".to_string(),
        );
    }

    let mut working = series.clone();
    let mut results = Vec::with_capacity(horizon);
    let mut accuracy: Option<f64> = None;
    let mut degraded_noted = false;

    for step in 0..horizon {
        let last_ts = working
            .last_timestamp()
            .ok_or_else(|| EngineError::InvalidInput("empty series".to_string()))?;
        let next_ts = last_ts + spacing;

        let blended = if short_history {
            let mut ma = MovingAverage::default();
            ma.fit(&working)?;
            BlendedStep {
                predicted: ma.predict_next()?,
                model: ModelId::MovingAverage,
                fitted: ma.fitted_values().map(|f| f.to_vec()),
                degraded: true,
            }
        } else {
            blend_step(&working, options, &weights)?
        };

        // The accuracy estimate comes from the first step's in-sample fit,
        // before predicted points enter the working series.
        if accuracy.is_none() {
            accuracy = Some(match &blended.fitted {
                Some(fitted) => accuracy_from_fitted(fitted, working.values()),
                None => 0.5,
            });
        }

        let mut insights = base_insights.clone();
        if blended.degraded && !short_history && !degraded_noted {
            insights.push("one or more model families skipped (short history)".to_string());
            degraded_noted = true;
        }

        let predicted = options.metric.clamp(blended.predicted);
        let half_width = z * sigma * ((step + 1) as f64).sqrt();
        let lower = options.metric.clamp(predicted - half_width);
        let upper = predicted + half_width;

        results.push(ForecastResult {
            timestamp: next_ts,
            predicted,
            interval: ConfidenceInterval::new(lower, upper),
            model: blended.model,
            accuracy: accuracy.unwrap_or(0.5),
            insights,
        });

        working.append(next_ts, predicted)?;
    }

    Ok(results)
}
