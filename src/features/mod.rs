//! Feature engineering: lag windows and calendar encodings shared by the
//! forecasting models and the anomaly pattern signal.

pub mod calendar;
pub mod lag;

pub use calendar::{business_hours_indicator, calendar_features, cyclical_pair};
pub use lag::{lag_matrix, observation_features, signed_log1p, step_features};
