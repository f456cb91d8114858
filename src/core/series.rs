//! Sales series container and point types.

use crate::error::{EngineError, Result};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Optional slice-and-dice keys attached to an observation.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DimensionKeys {
    /// Product category (e.g. "Beverages").
    pub category: Option<String>,
    /// Store or store-type identifier.
    pub store: Option<String>,
    /// Product identifier.
    pub product: Option<String>,
}

impl DimensionKeys {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn category(name: impl Into<String>) -> Self {
        Self {
            category: Some(name.into()),
            ..Self::default()
        }
    }
}

/// A single timestamped observation supplied by the caller. Immutable.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub dimensions: DimensionKeys,
}

impl SeriesPoint {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self {
            timestamp,
            value,
            dimensions: DimensionKeys::none(),
        }
    }

    pub fn with_dimensions(mut self, dimensions: DimensionKeys) -> Self {
        self.dimensions = dimensions;
        self
    }
}

/// Domain classification of a metric, used for output clamping and
/// integrality expectations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum MetricKind {
    #[default]
    Revenue,
    Volume,
    Spend,
    Count,
    Ratio,
    Other,
}

impl MetricKind {
    /// Whether the metric can never be negative (volumes, revenues, spend,
    /// counts).
    pub fn non_negative(&self) -> bool {
        matches!(
            self,
            MetricKind::Revenue | MetricKind::Volume | MetricKind::Spend | MetricKind::Count
        )
    }

    /// Whether only whole-number observations are expected.
    pub fn integral(&self) -> bool {
        matches!(self, MetricKind::Count)
    }

    /// Clamp a predicted value to the metric's valid domain.
    pub fn clamp(&self, value: f64) -> f64 {
        if self.non_negative() {
            value.max(0.0)
        } else {
            value
        }
    }

    /// Best-effort classification from a metric name.
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.contains("revenue") || lower.contains("sales") {
            MetricKind::Revenue
        } else if lower.contains("volume") || lower.contains("units") {
            MetricKind::Volume
        } else if lower.contains("spend") || lower.contains("budget") {
            MetricKind::Spend
        } else if lower.contains("count") || lower.contains("transaction") {
            MetricKind::Count
        } else if lower.contains("roi") || lower.contains("rate") || lower.contains("ratio") {
            MetricKind::Ratio
        } else {
            MetricKind::Other
        }
    }
}

/// A validated univariate sales series: strictly increasing timestamps.
#[derive(Debug, Clone)]
pub struct SalesSeries {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

impl SalesSeries {
    /// Create a series from parallel timestamp/value vectors.
    ///
    /// Timestamps must be strictly increasing and values finite.
    pub fn new(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(EngineError::InvalidInput(format!(
                "timestamps ({}) and values ({}) differ in length",
                timestamps.len(),
                values.len()
            )));
        }
        for i in 1..timestamps.len() {
            if timestamps[i] <= timestamps[i - 1] {
                return Err(EngineError::InvalidInput(
                    "timestamps must be strictly increasing".to_string(),
                ));
            }
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(EngineError::InvalidInput(
                "series values must be finite".to_string(),
            ));
        }
        Ok(Self { timestamps, values })
    }

    /// Create a series from caller-supplied points (chronologically sorted).
    pub fn from_points(points: &[SeriesPoint]) -> Result<Self> {
        let timestamps = points.iter().map(|p| p.timestamp).collect();
        let values = points.iter().map(|p| p.value).collect();
        Self::new(timestamps, values)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamps.last().copied()
    }

    pub fn last_value(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Append an observation; the timestamp must extend the series.
    ///
    /// Used by the recursive multi-step forecast, where each predicted point
    /// becomes part of the working history for the next step.
    pub fn append(&mut self, timestamp: DateTime<Utc>, value: f64) -> Result<()> {
        if let Some(&last) = self.timestamps.last() {
            if timestamp <= last {
                return Err(EngineError::InvalidInput(
                    "appended timestamp must extend the series".to_string(),
                ));
            }
        }
        if !value.is_finite() {
            return Err(EngineError::InvalidInput(
                "appended value must be finite".to_string(),
            ));
        }
        self.timestamps.push(timestamp);
        self.values.push(value);
        Ok(())
    }

    /// Modal spacing between consecutive observations.
    ///
    /// Falls back to one day for series too short to measure.
    pub fn modal_spacing(&self) -> Duration {
        if self.len() < 2 {
            return Duration::days(1);
        }
        let mut counts: HashMap<i64, usize> = HashMap::new();
        for w in self.timestamps.windows(2) {
            *counts.entry((w[1] - w[0]).num_seconds()).or_insert(0) += 1;
        }
        let modal = counts
            .into_iter()
            .max_by_key(|&(secs, count)| (count, std::cmp::Reverse(secs)))
            .map(|(secs, _)| secs)
            .unwrap_or(86_400);
        Duration::seconds(modal)
    }

    /// Sub-series over `[start, end)`.
    pub fn slice(&self, start: usize, end: usize) -> Result<SalesSeries> {
        if start > end || end > self.len() {
            return Err(EngineError::InvalidInput(format!(
                "slice bounds {}..{} out of range for series of length {}",
                start,
                end,
                self.len()
            )));
        }
        Ok(SalesSeries {
            timestamps: self.timestamps[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
        })
    }
}
