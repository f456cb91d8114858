//! Least-squares regression used by the forecasting models and the spend
//! optimizer.
//!
//! Solves the normal equations with a Cholesky decomposition; an optional
//! ridge term stabilizes ill-conditioned designs (short windows, collinear
//! lag features).

use crate::error::{EngineError, Result};

/// Fitted linear model: intercept plus one coefficient per feature.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LinearModel {
    /// Intercept term.
    pub intercept: f64,
    /// Regression coefficients, one per feature column.
    pub coefficients: Vec<f64>,
}

impl LinearModel {
    /// Predict a single target from a feature vector.
    pub fn predict(&self, features: &[f64]) -> f64 {
        let mut y = self.intercept;
        for (c, x) in self.coefficients.iter().zip(features.iter()) {
            y += c * x;
        }
        y
    }

    /// Number of feature coefficients.
    pub fn num_features(&self) -> usize {
        self.coefficients.len()
    }
}

/// Fit `targets ≈ intercept + rows · coefficients` by least squares.
///
/// # Arguments
/// * `rows` - Feature rows, all of equal length
/// * `targets` - One target per row
/// * `ridge` - Non-negative ridge penalty added to the normal-equation
///   diagonal (0.0 for plain OLS; a small diagonal jitter is always added
///   for numerical stability)
pub fn least_squares(rows: &[Vec<f64>], targets: &[f64], ridge: f64) -> Result<LinearModel> {
    let n = rows.len();
    if n == 0 {
        return Err(EngineError::InsufficientData { needed: 1, got: 0 });
    }
    if targets.len() != n {
        return Err(EngineError::InvalidInput(format!(
            "feature rows ({}) and targets ({}) differ in length",
            n,
            targets.len()
        )));
    }

    let k = rows[0].len();
    for row in rows {
        if row.len() != k {
            return Err(EngineError::InvalidInput(format!(
                "ragged feature rows: expected {}, got {}",
                k,
                row.len()
            )));
        }
    }

    if k == 0 {
        // No features: the intercept is just the target mean.
        let intercept = targets.iter().sum::<f64>() / n as f64;
        return Ok(LinearModel {
            intercept,
            coefficients: vec![],
        });
    }

    // Normal equations over the design [1, x1, .., xk].
    let p = k + 1;
    let mut xtx = vec![vec![0.0; p]; p];
    let mut xty = vec![0.0; p];

    for (row, &y) in rows.iter().zip(targets.iter()) {
        xtx[0][0] += 1.0;
        xty[0] += y;
        for i in 0..k {
            let xi = row[i];
            xtx[0][i + 1] += xi;
            xtx[i + 1][0] += xi;
            xty[i + 1] += xi * y;
            for j in 0..k {
                xtx[i + 1][j + 1] += xi * row[j];
            }
        }
    }

    // Ridge penalty on feature coefficients (not the intercept), plus a
    // small jitter on the whole diagonal for numerical stability.
    for i in 0..p {
        xtx[i][i] += 1e-8;
        if i > 0 {
            xtx[i][i] += ridge.max(0.0);
        }
    }

    let beta = solve_symmetric(&xtx, &xty).ok_or_else(|| {
        EngineError::NumericDegeneracy("normal equations not positive definite".to_string())
    })?;

    Ok(LinearModel {
        intercept: beta[0],
        coefficients: beta[1..].to_vec(),
    })
}

/// Solve `A x = b` for symmetric positive definite `A` via Cholesky.
fn solve_symmetric(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n {
        return None;
    }

    // A = L L'
    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }
            if i == j {
                if sum <= 0.0 {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    // Forward: L y = b
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }

    // Backward: L' x = y
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }

    Some(x)
}
