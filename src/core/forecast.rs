//! Forecast result structures.

use chrono::{DateTime, Utc};

/// Identifier of the model (or fallback) that produced a forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ModelId {
    /// Autoregressive model with optional differencing.
    Autoregressive,
    /// Additive trend-plus-seasonal regression.
    SeasonalRegression,
    /// Gradient-boosted stumps over lag/calendar features.
    BoostedTrees,
    /// Fixed-lookback window regressor.
    WindowRegression,
    /// Moving-average fallback for short histories.
    MovingAverage,
    /// Weighted blend of the model families.
    Ensemble,
}

impl ModelId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelId::Autoregressive => "autoregressive",
            ModelId::SeasonalRegression => "seasonal_regression",
            ModelId::BoostedTrees => "boosted_trees",
            ModelId::WindowRegression => "window_regression",
            ModelId::MovingAverage => "moving_average",
            ModelId::Ensemble => "ensemble",
        }
    }
}

/// A prediction interval around a point forecast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// One forecast step.
///
/// Invariant: `interval.lower <= predicted <= interval.upper`, and
/// `predicted >= 0` for non-negative metric kinds.
#[derive(Debug, Clone)]
pub struct ForecastResult {
    pub timestamp: DateTime<Utc>,
    pub predicted: f64,
    pub interval: ConfidenceInterval,
    /// Which model (or fallback) produced this step.
    pub model: ModelId,
    /// In-sample accuracy estimate in [0, 1].
    pub accuracy: f64,
    pub insights: Vec<String>,
}
