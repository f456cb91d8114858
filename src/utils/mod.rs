//! Shared numerical utilities.

pub mod ols;
pub mod stats;

pub use ols::{least_squares, LinearModel};
pub use stats::{
    autocorrelation, mean, median, pearson_correlation, percentile_sorted, population_std,
    quantile_normal, std_dev, variance,
};
