//! Gradient-boosted regression stumps over lag and calendar features.

use crate::core::{ModelId, SalesSeries};
use crate::error::{EngineError, Result};
use crate::features::{calendar_features, step_features};
use crate::models::Forecaster;

/// Lags used as features, in row order.
pub const FEATURE_LAGS: [usize; 4] = [1, 2, 3, 7];
/// Default number of boosting rounds.
pub const DEFAULT_ROUNDS: usize = 40;
/// Shrinkage applied to each stump's contribution.
pub const LEARNING_RATE: f64 = 0.1;

/// A depth-one regression tree: one feature, one threshold, two leaves.
#[derive(Debug, Clone)]
struct Stump {
    feature: usize,
    threshold: f64,
    left: f64,
    right: f64,
}

impl Stump {
    fn predict(&self, features: &[f64]) -> f64 {
        if features[self.feature] <= self.threshold {
            self.left
        } else {
            self.right
        }
    }
}

/// Squared-loss gradient boosting with stump base learners.
///
/// Deterministic: candidate thresholds are feature quantiles, so repeated
/// fits on identical data produce identical models.
#[derive(Debug, Clone)]
pub struct BoostedStumps {
    rounds: usize,
    base: f64,
    stumps: Vec<Stump>,
    next_features: Option<Vec<f64>>,
    fitted: Option<Vec<f64>>,
}

impl BoostedStumps {
    pub fn new(rounds: usize) -> Self {
        Self {
            rounds: rounds.max(1),
            base: 0.0,
            stumps: Vec::new(),
            next_features: None,
            fitted: None,
        }
    }

    pub fn num_stumps(&self) -> usize {
        self.stumps.len()
    }

    fn min_history() -> usize {
        // Longest lag plus enough rows to split on.
        FEATURE_LAGS[3] + 8
    }

    fn predict_features(&self, features: &[f64]) -> f64 {
        let mut y = self.base;
        for stump in &self.stumps {
            y += LEARNING_RATE * stump.predict(features);
        }
        y
    }
}

impl Default for BoostedStumps {
    fn default() -> Self {
        Self::new(DEFAULT_ROUNDS)
    }
}

/// Find the best single split of `residuals` on one feature column.
///
/// Returns (threshold, left mean, right mean, sse) for the best of up to
/// nine quantile candidate thresholds.
fn best_split(
    rows: &[Vec<f64>],
    residuals: &[f64],
    feature: usize,
) -> Option<(f64, f64, f64, f64)> {
    let mut column: Vec<f64> = rows.iter().map(|r| r[feature]).collect();
    column.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    column.dedup();
    if column.len() < 2 {
        return None;
    }

    let candidates: Vec<f64> = (1..=9)
        .map(|d| column[(d * (column.len() - 1)) / 10])
        .collect();

    let mut best: Option<(f64, f64, f64, f64)> = None;
    for &threshold in &candidates {
        let mut left_sum = 0.0;
        let mut left_n = 0usize;
        let mut right_sum = 0.0;
        let mut right_n = 0usize;
        for (row, &r) in rows.iter().zip(residuals.iter()) {
            if row[feature] <= threshold {
                left_sum += r;
                left_n += 1;
            } else {
                right_sum += r;
                right_n += 1;
            }
        }
        if left_n == 0 || right_n == 0 {
            continue;
        }
        let left_mean = left_sum / left_n as f64;
        let right_mean = right_sum / right_n as f64;

        let sse: f64 = rows
            .iter()
            .zip(residuals.iter())
            .map(|(row, &r)| {
                let leaf = if row[feature] <= threshold {
                    left_mean
                } else {
                    right_mean
                };
                (r - leaf).powi(2)
            })
            .sum();

        if best.map_or(true, |(_, _, _, best_sse)| sse < best_sse) {
            best = Some((threshold, left_mean, right_mean, sse));
        }
    }
    best
}

impl Forecaster for BoostedStumps {
    fn fit(&mut self, series: &SalesSeries) -> Result<()> {
        let values = series.values();
        if values.len() < Self::min_history() {
            return Err(EngineError::InsufficientData {
                needed: Self::min_history(),
                got: values.len(),
            });
        }

        let max_lag = FEATURE_LAGS[3];
        let timestamps = series.timestamps();
        let mut rows = Vec::with_capacity(values.len() - max_lag);
        let mut targets = Vec::with_capacity(values.len() - max_lag);
        for t in max_lag..values.len() {
            let mut row: Vec<f64> = FEATURE_LAGS.iter().map(|&lag| values[t - lag]).collect();
            row.extend(calendar_features(&timestamps[t]));
            rows.push(row);
            targets.push(values[t]);
        }

        self.base = targets.iter().sum::<f64>() / targets.len() as f64;
        self.stumps.clear();

        let num_features = rows[0].len();
        let mut residuals: Vec<f64> = targets.iter().map(|&y| y - self.base).collect();

        for _ in 0..self.rounds {
            let mut round_best: Option<(usize, f64, f64, f64, f64)> = None;
            for feature in 0..num_features {
                if let Some((threshold, left, right, sse)) =
                    best_split(&rows, &residuals, feature)
                {
                    if round_best.map_or(true, |(_, _, _, _, best_sse)| sse < best_sse) {
                        round_best = Some((feature, threshold, left, right, sse));
                    }
                }
            }
            let Some((feature, threshold, left, right, _)) = round_best else {
                break;
            };
            let stump = Stump {
                feature,
                threshold,
                left,
                right,
            };
            for (row, r) in rows.iter().zip(residuals.iter_mut()) {
                *r -= LEARNING_RATE * stump.predict(row);
            }
            self.stumps.push(stump);
        }

        let mut fitted = vec![f64::NAN; max_lag];
        fitted.extend(rows.iter().map(|row| self.predict_features(row)));

        // Features for the step just past the series end.
        let last_ts = series
            .last_timestamp()
            .ok_or_else(|| EngineError::InvalidInput("empty series".to_string()))?;
        let next_ts = last_ts + series.modal_spacing();
        self.next_features = step_features(series, &FEATURE_LAGS, &next_ts);
        self.fitted = Some(fitted);
        Ok(())
    }

    fn predict_next(&self) -> Result<f64> {
        let features = self
            .next_features
            .as_ref()
            .ok_or(EngineError::NotTrained)?;
        Ok(self.predict_features(features))
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn id(&self) -> ModelId {
        ModelId::BoostedTrees
    }
}
