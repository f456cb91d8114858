//! Error types for the promo-engine library.

use thiserror::Error;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur during analytics operations.
///
/// Graceful-degradation paths (short history falling back to a moving
/// average, short series reporting "not detected") are tagged in the result
/// instead of surfacing here; these variants cover the cases where no
/// documented fallback exists.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Malformed request rejected before any work is done.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Model has not been trained yet.
    #[error("model must be trained before use")]
    NotTrained,

    /// Numerical degeneracy that could not be epsilon-guarded.
    #[error("numeric degeneracy: {0}")]
    NumericDegeneracy(String),

    /// Caller-imposed compute ceiling exceeded; rejected before work starts.
    #[error("compute budget exceeded: requested {requested}, limit {limit}")]
    BudgetExceeded { limit: usize, requested: usize },
}
