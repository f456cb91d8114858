//! Reconstruction-error pattern model.
//!
//! Learns the dominant direction of the engineered observation features
//! (single principal component via power iteration) and scores new
//! observations by how poorly that component reconstructs them. The error
//! is normalized by the training batch's 95th-percentile error, so typical
//! observations score well below 1.

use crate::error::{EngineError, Result};
use crate::utils::{mean, percentile_sorted, std_dev};

/// Power-iteration rounds; the leading eigenvector of a 9-dimensional
/// covariance converges long before this.
const POWER_ITERATIONS: usize = 50;
/// Minimum training rows for a usable component.
const MIN_TRAINING_ROWS: usize = 8;

/// Fitted pattern model: feature standardization, leading component, and
/// the error scale used to map reconstruction error into [0, 1].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PatternModel {
    feature_mean: Vec<f64>,
    feature_std: Vec<f64>,
    component: Vec<f64>,
    error_scale: f64,
}

impl PatternModel {
    /// Fit from engineered feature rows (all the same length).
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self> {
        if rows.len() < MIN_TRAINING_ROWS {
            return Err(EngineError::InsufficientData {
                needed: MIN_TRAINING_ROWS,
                got: rows.len(),
            });
        }
        let dims = rows[0].len();
        if dims == 0 {
            return Err(EngineError::InvalidInput(
                "pattern features must not be empty".to_string(),
            ));
        }
        for row in rows {
            if row.len() != dims {
                return Err(EngineError::InvalidInput(format!(
                    "ragged feature rows: expected {}, got {}",
                    dims,
                    row.len()
                )));
            }
        }

        // Column-wise standardization.
        let mut feature_mean = vec![0.0; dims];
        let mut feature_std = vec![0.0; dims];
        for d in 0..dims {
            let column: Vec<f64> = rows.iter().map(|r| r[d]).collect();
            feature_mean[d] = mean(&column);
            let std = std_dev(&column);
            feature_std[d] = if std.is_finite() && std > 1e-9 {
                std
            } else {
                1.0
            };
        }

        let standardized: Vec<Vec<f64>> = rows
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(d, &x)| (x - feature_mean[d]) / feature_std[d])
                    .collect()
            })
            .collect();

        // Leading eigenvector of X'X via power iteration.
        let mut component = vec![1.0 / (dims as f64).sqrt(); dims];
        for _ in 0..POWER_ITERATIONS {
            // w = X' (X v)
            let projections: Vec<f64> = standardized
                .iter()
                .map(|row| dot(row, &component))
                .collect();
            let mut next = vec![0.0; dims];
            for (row, &p) in standardized.iter().zip(projections.iter()) {
                for (d, &x) in row.iter().enumerate() {
                    next[d] += x * p;
                }
            }
            let norm = dot(&next, &next).sqrt();
            if norm < 1e-12 {
                // Degenerate covariance (all rows identical after
                // standardization); keep the uniform component.
                break;
            }
            for (c, n) in component.iter_mut().zip(next.iter()) {
                *c = n / norm;
            }
        }

        let mut errors: Vec<f64> = standardized
            .iter()
            .map(|row| reconstruction_error(row, &component))
            .collect();
        errors.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let error_scale = percentile_sorted(&errors, 95.0).max(1e-6);

        Ok(Self {
            feature_mean,
            feature_std,
            component,
            error_scale,
        })
    }

    /// Score a feature vector in [0, 1]: the training p95 error maps to
    /// 0.5, twice that saturates at 1.
    pub fn score(&self, features: &[f64]) -> f64 {
        if features.len() != self.feature_mean.len() {
            return 0.0;
        }
        let standardized: Vec<f64> = features
            .iter()
            .enumerate()
            .map(|(d, &x)| (x - self.feature_mean[d]) / self.feature_std[d])
            .collect();
        let error = reconstruction_error(&standardized, &self.component);
        (error / (2.0 * self.error_scale)).clamp(0.0, 1.0)
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Distance between a standardized row and its projection onto the
/// component.
fn reconstruction_error(row: &[f64], component: &[f64]) -> f64 {
    let projection = dot(row, component);
    row.iter()
        .zip(component.iter())
        .map(|(&x, &c)| (x - c * projection).powi(2))
        .sum::<f64>()
        .sqrt()
}
