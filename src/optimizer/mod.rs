//! Promotion spend optimization.
//!
//! A trained regression maps promotion parameters plus segment-level
//! historical aggregates to recommended spend, expected ROI, and a
//! confidence score; rule-based post-processing produces insights and risk
//! factors. A separate screening pass flags anomalous promotion records.

pub mod aggregates;
pub mod model;
pub mod screening;

pub use aggregates::{aggregate_segments, segment_key, PromotionRecord, SegmentAggregates};
pub use model::{OptimizerParams, SpendOptimizer};
pub use screening::{screen_promotions, PromotionAnomaly};

/// Parameters of a promotion to optimize.
#[derive(Debug, Clone)]
pub struct OptimizationRequest {
    pub category: String,
    pub store_type: String,
    pub discount_type: String,
    /// Discount depth in percent.
    pub discount_value: f64,
    pub duration_days: u32,
    /// Seasonal demand multiplier around 1.0.
    pub seasonality_factor: f64,
    /// Caller-supplied historical aggregates; when absent the optimizer
    /// falls back to the trained segment aggregates, then to global
    /// defaults.
    pub aggregates: Option<SegmentAggregates>,
}

/// Optimizer output.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Recommended promotion spend, non-negative.
    pub recommended_spend: f64,
    /// Expected return on investment, non-negative.
    pub expected_roi: f64,
    /// Confidence in the recommendation, in [0, 1].
    pub confidence_score: f64,
    pub insights: Vec<String>,
    pub risk_factors: Vec<String>,
}
