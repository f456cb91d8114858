//! Core data structures: series points, validated sales series, forecast
//! results.

pub mod forecast;
pub mod series;

pub use forecast::{ConfidenceInterval, ForecastResult, ModelId};
pub use series::{DimensionKeys, MetricKind, SalesSeries, SeriesPoint};
