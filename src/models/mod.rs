//! Forecasting model families and the ensemble blender.

pub mod autoregressive;
pub mod boosted;
pub mod ensemble;
pub mod seasonal;
pub mod traits;
pub mod window;

pub use autoregressive::Autoregressive;
pub use boosted::BoostedStumps;
pub use ensemble::{forecast, EnsembleWeights, ForecastOptions, ModelSelector};
pub use seasonal::SeasonalRegression;
pub use traits::Forecaster;
pub use window::{MovingAverage, WindowRegressor};
