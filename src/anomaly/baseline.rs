//! Per-metric statistical baselines.

use crate::anomaly::AnomalyObservation;
use crate::error::{EngineError, Result};
use crate::utils::{mean, std_dev};
use std::collections::HashMap;

/// Z-score divisor: four standard deviations saturate the signal.
const Z_SATURATION: f64 = 4.0;

/// Mean/std baseline for one metric, fit once over a training batch.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MetricBaseline {
    pub mean: f64,
    pub std: f64,
    /// Number of training observations behind the fit.
    pub count: usize,
}

impl MetricBaseline {
    /// Fit from raw values. Requires at least two observations.
    pub fn fit(values: &[f64]) -> Result<Self> {
        if values.len() < 2 {
            return Err(EngineError::InsufficientData {
                needed: 2,
                got: values.len(),
            });
        }
        let std = std_dev(values);
        Ok(Self {
            mean: mean(values),
            std: if std.is_finite() { std } else { 0.0 },
            count: values.len(),
        })
    }

    /// Deviation of a value from the baseline in standard deviations.
    ///
    /// A degenerate zero-std baseline is epsilon-substituted so the score
    /// stays finite.
    pub fn z_score(&self, value: f64) -> f64 {
        (value - self.mean) / self.std.max(1e-9)
    }

    /// Statistical anomaly signal: `min(1, |z| / 4)`.
    pub fn score(&self, value: f64) -> f64 {
        (self.z_score(value).abs() / Z_SATURATION).min(1.0)
    }
}

/// Baselines keyed by metric name.
///
/// Refitting replaces the previous baselines wholesale, so training is
/// safely re-runnable.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct BaselineSet {
    baselines: HashMap<String, MetricBaseline>,
}

impl BaselineSet {
    /// Fit baselines from a training batch, one per metric with at least
    /// two observations.
    pub fn fit(observations: &[AnomalyObservation]) -> Result<Self> {
        if observations.is_empty() {
            return Err(EngineError::InsufficientData { needed: 2, got: 0 });
        }

        let mut grouped: HashMap<String, Vec<f64>> = HashMap::new();
        for obs in observations {
            grouped
                .entry(obs.metric.to_ascii_lowercase())
                .or_default()
                .push(obs.value);
        }

        let mut baselines = HashMap::new();
        for (metric, values) in grouped {
            if values.len() >= 2 {
                baselines.insert(metric, MetricBaseline::fit(&values)?);
            }
        }
        Ok(Self { baselines })
    }

    pub fn get(&self, metric: &str) -> Option<&MetricBaseline> {
        self.baselines.get(&metric.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.baselines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.baselines.is_empty()
    }
}
