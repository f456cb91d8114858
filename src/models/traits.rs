//! Forecaster trait defining the common interface for the model families.

use crate::core::{ModelId, SalesSeries};
use crate::error::Result;

/// Common interface for the one-step-ahead forecasting models.
///
/// Multi-step forecasting is handled by the ensemble layer, which refits on
/// a growing working series; each family only ever predicts the next step.
pub trait Forecaster {
    /// Fit the model to the series.
    fn fit(&mut self, series: &SalesSeries) -> Result<()>;

    /// Predict one step past the end of the fitted series.
    fn predict_next(&self) -> Result<f64>;

    /// In-sample one-step predictions, aligned with the fitted series
    /// (`NaN` for warm-up positions a model cannot predict).
    fn fitted_values(&self) -> Option<&[f64]>;

    /// Which family this model belongs to.
    fn id(&self) -> ModelId;

    /// Whether the model has been fitted.
    fn is_fitted(&self) -> bool {
        self.fitted_values().is_some()
    }
}

/// Type alias for boxed forecaster trait objects.
pub type BoxedForecaster = Box<dyn Forecaster>;
