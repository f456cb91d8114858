//! Trained spend-optimization regression.

use crate::error::{EngineError, Result};
use crate::optimizer::{
    aggregate_segments, segment_key, OptimizationRequest, OptimizationResult, PromotionRecord,
    SegmentAggregates,
};
use crate::utils::{least_squares, mean, std_dev, LinearModel};
use std::collections::HashMap;

/// Minimum promotion records to train on.
pub const MIN_TRAINING_RECORDS: usize = 10;

/// Discount depth beyond which margin erosion becomes a stated risk.
const DISCOUNT_RISK_THRESHOLD: f64 = 25.0;
/// Promotion length beyond which shorter bursts are recommended.
const DURATION_RISK_THRESHOLD: u32 = 30;
/// Expected ROI above which increasing investment is suggested.
const ROI_OPPORTUNITY_THRESHOLD: f64 = 2.0;
/// Confidence below which the limited-history caveat is attached.
const LOW_CONFIDENCE_THRESHOLD: f64 = 0.6;

/// Fixed categorical encodings; unknown values map to 0 so new master-data
/// entries degrade gracefully instead of erroring.
fn category_code(category: &str) -> f64 {
    match category.trim().to_ascii_lowercase().as_str() {
        "beverages" => 1.0,
        "snacks" => 2.0,
        "dairy" => 3.0,
        "household" => 4.0,
        "personal care" => 5.0,
        "frozen" => 6.0,
        "bakery" => 7.0,
        "produce" => 8.0,
        _ => 0.0,
    }
}

fn store_type_code(store_type: &str) -> f64 {
    match store_type.trim().to_ascii_lowercase().as_str() {
        "hypermarket" => 1.0,
        "supermarket" => 2.0,
        "convenience" => 3.0,
        "discount" => 4.0,
        "online" => 5.0,
        _ => 0.0,
    }
}

fn discount_type_code(discount_type: &str) -> f64 {
    match discount_type.trim().to_ascii_lowercase().as_str() {
        "percentage" => 1.0,
        "fixed_amount" => 2.0,
        "bogo" => 3.0,
        "bundle" => 4.0,
        "loyalty" => 5.0,
        _ => 0.0,
    }
}

/// Feature vector: categorical codes, promotion shape, and segment history.
fn feature_vector(
    category: &str,
    store_type: &str,
    discount_type: &str,
    discount_value: f64,
    duration_days: u32,
    seasonality_factor: f64,
    aggregates: &SegmentAggregates,
) -> Vec<f64> {
    vec![
        category_code(category),
        store_type_code(store_type),
        discount_type_code(discount_type),
        discount_value,
        duration_days as f64,
        seasonality_factor,
        aggregates.avg_spend,
        aggregates.avg_roi,
        aggregates.efficiency,
    ]
}

/// Trained regression parameters: feature standardization, the three output
/// models, and the per-segment aggregates captured at training time.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct OptimizerParams {
    feature_mean: Vec<f64>,
    feature_std: Vec<f64>,
    spend_model: LinearModel,
    roi_model: LinearModel,
    confidence_model: LinearModel,
    segments: HashMap<String, SegmentAggregates>,
}

/// Spend optimizer: train on promotion history, then map requests to
/// recommendations.
#[derive(Debug, Clone, Default)]
pub struct SpendOptimizer {
    params: Option<OptimizerParams>,
}

impl SpendOptimizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore from persisted parameters.
    pub fn from_params(params: OptimizerParams) -> Self {
        Self {
            params: Some(params),
        }
    }

    /// Trained parameters, for persistence.
    pub fn params(&self) -> Option<&OptimizerParams> {
        self.params.as_ref()
    }

    pub fn is_trained(&self) -> bool {
        self.params.is_some()
    }

    /// Fit the three regressions from promotion history. Re-runnable; the
    /// previous parameters are replaced.
    pub fn train(&mut self, records: &[PromotionRecord]) -> Result<()> {
        if records.len() < MIN_TRAINING_RECORDS {
            return Err(EngineError::InsufficientData {
                needed: MIN_TRAINING_RECORDS,
                got: records.len(),
            });
        }
        tracing::info!(records = records.len(), "training spend optimizer");

        let segments = aggregate_segments(records);

        let rows: Vec<Vec<f64>> = records
            .iter()
            .map(|r| {
                let aggregates = segments
                    .get(&segment_key(&r.category, &r.store_type))
                    .cloned()
                    .unwrap_or_else(SegmentAggregates::default_global);
                feature_vector(
                    &r.category,
                    &r.store_type,
                    &r.discount_type,
                    r.discount_value,
                    r.duration_days,
                    r.seasonality_factor,
                    &aggregates,
                )
            })
            .collect();

        // Column-wise standardization; zero-variance columns get unit std.
        let dims = rows[0].len();
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

        let spend_targets: Vec<f64> = records.iter().map(|r| r.spend).collect();
        let roi_targets: Vec<f64> = records.iter().map(|r| r.roi).collect();
        // Confidence is trained against budget utilization: promotions that
        // deployed their plan as intended are the ones the regression can
        // be trusted on.
        let confidence_targets: Vec<f64> = records
            .iter()
            .map(|r| {
                if r.budget > 0.0 {
                    (r.spend / r.budget).clamp(0.0, 1.0)
                } else {
                    1.0
                }
            })
            .collect();

        let spend_model = least_squares(&standardized, &spend_targets, 1e-3)?;
        let roi_model = least_squares(&standardized, &roi_targets, 1e-3)?;
        let confidence_model = least_squares(&standardized, &confidence_targets, 1e-3)?;

        self.params = Some(OptimizerParams {
            feature_mean,
            feature_std,
            spend_model,
            roi_model,
            confidence_model,
            segments,
        });
        Ok(())
    }

    /// Map a request to a spend recommendation.
    ///
    /// Aggregates come from the request when supplied, else from the
    /// trained segment history, else from global defaults; empty history
    /// never errors. Calling before [`train`](Self::train) returns
    /// [`EngineError::NotTrained`].
    pub fn optimize(&self, request: &OptimizationRequest) -> Result<OptimizationResult> {
        let params = self.params.as_ref().ok_or(EngineError::NotTrained)?;

        if !request.discount_value.is_finite() || request.discount_value < 0.0 {
            return Err(EngineError::InvalidInput(
                "discount value must be non-negative".to_string(),
            ));
        }
        if !request.seasonality_factor.is_finite() || request.seasonality_factor <= 0.0 {
            return Err(EngineError::InvalidInput(
                "seasonality factor must be positive".to_string(),
            ));
        }

        let aggregates = request
            .aggregates
            .clone()
            .or_else(|| {
                params
                    .segments
                    .get(&segment_key(&request.category, &request.store_type))
                    .cloned()
            })
            .unwrap_or_else(SegmentAggregates::default_global);

        let raw = feature_vector(
            &request.category,
            &request.store_type,
            &request.discount_type,
            request.discount_value,
            request.duration_days,
            request.seasonality_factor,
            &aggregates,
        );
        let features: Vec<f64> = raw
            .iter()
            .enumerate()
            .map(|(d, &x)| (x - params.feature_mean[d]) / params.feature_std[d])
            .collect();

        let recommended_spend = params.spend_model.predict(&features).max(0.0);
        let expected_roi = params.roi_model.predict(&features).max(0.0);
        let confidence_score = params.confidence_model.predict(&features).clamp(0.0, 1.0);

        let mut insights = Vec::new();
        let mut risk_factors = Vec::new();

        if expected_roi > ROI_OPPORTUNITY_THRESHOLD {
            insights.push(format!(
                "expected ROI of {:.1} is strong; consider increasing investment",
                expected_roi
            ));
        }
        if aggregates.efficiency > aggregates.avg_roi {
            insights.push(
                "segment historically deploys its budget fully; plans are executed as designed"
                    .to_string(),
            );
        }
        if request.seasonality_factor > 1.2 {
            insights.push("seasonal uplift supports a larger campaign window".to_string());
        }

        if request.discount_value > DISCOUNT_RISK_THRESHOLD {
            risk_factors.push(format!(
                "discount of {:.0}% risks margin erosion",
                request.discount_value
            ));
        }
        if request.duration_days > DURATION_RISK_THRESHOLD {
            risk_factors.push(format!(
                "{}-day duration dilutes impact; favor shorter bursts",
                request.duration_days
            ));
        }
        if confidence_score < LOW_CONFIDENCE_THRESHOLD {
            risk_factors
                .push("limited historical data for this segment; treat as directional".to_string());
        }

        Ok(OptimizationResult {
            recommended_spend,
            expected_roi,
            confidence_score,
            insights,
            risk_factors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A varied training set across two segments.
    fn training_records() -> Vec<PromotionRecord> {
        let mut records = Vec::new();
        for i in 0..12 {
            let depth = 10.0 + i as f64 * 2.0;
            records.push(PromotionRecord {
                category: "Beverages".to_string(),
                store_type: "Supermarket".to_string(),
                discount_type: "percentage".to_string(),
                discount_value: depth,
                duration_days: 7 + i,
                seasonality_factor: 0.9 + 0.05 * (i % 4) as f64,
                spend: 20_000.0 + 1_500.0 * i as f64,
                budget: 30_000.0 + 1_500.0 * i as f64,
                units: 4_000.0 + 100.0 * i as f64,
                revenue: 50_000.0 + 2_000.0 * i as f64,
                roi: 1.2 + 0.08 * i as f64,
            });
        }
        for i in 0..6 {
            records.push(PromotionRecord {
                category: "Snacks".to_string(),
                store_type: "Convenience".to_string(),
                discount_type: "bogo".to_string(),
                discount_value: 50.0,
                duration_days: 14,
                seasonality_factor: 1.0,
                spend: 8_000.0 + 500.0 * i as f64,
                budget: 10_000.0,
                units: 2_000.0,
                revenue: 12_000.0 + 800.0 * i as f64,
                roi: 1.4 + 0.05 * i as f64,
            });
        }
        records
    }

    fn beverages_request() -> OptimizationRequest {
        OptimizationRequest {
            category: "Beverages".to_string(),
            store_type: "Supermarket".to_string(),
            discount_type: "percentage".to_string(),
            discount_value: 15.0,
            duration_days: 14,
            seasonality_factor: 1.0,
            aggregates: None,
        }
    }

    #[test]
    fn optimize_before_train_is_rejected() {
        let optimizer = SpendOptimizer::new();
        assert!(matches!(
            optimizer.optimize(&beverages_request()),
            Err(EngineError::NotTrained)
        ));
    }

    #[test]
    fn trained_optimizer_produces_valid_ranges() {
        let mut optimizer = SpendOptimizer::new();
        optimizer.train(&training_records()).unwrap();

        let result = optimizer.optimize(&beverages_request()).unwrap();

        assert!(result.recommended_spend > 0.0);
        assert!(result.expected_roi > 0.0);
        assert!((0.0..=1.0).contains(&result.confidence_score));
    }

    #[test]
    fn unknown_segment_falls_back_without_error() {
        let mut optimizer = SpendOptimizer::new();
        optimizer.train(&training_records()).unwrap();

        let request = OptimizationRequest {
            category: "Electronics".to_string(), // unknown category -> code 0
            store_type: "Kiosk".to_string(),     // unknown store type
            ..beverages_request()
        };
        let result = optimizer.optimize(&request).unwrap();
        assert!(result.recommended_spend >= 0.0);
        assert!((0.0..=1.0).contains(&result.confidence_score));
    }

    #[test]
    fn caller_aggregates_take_precedence() {
        let mut optimizer = SpendOptimizer::new();
        optimizer.train(&training_records()).unwrap();

        let mut request = beverages_request();
        let baseline = optimizer.optimize(&request).unwrap();

        request.aggregates = Some(SegmentAggregates {
            avg_spend: 200_000.0,
            avg_units: 50_000.0,
            avg_revenue: 600_000.0,
            avg_roi: 3.0,
            efficiency: 2.8,
        });
        let boosted = optimizer.optimize(&request).unwrap();

        assert_ne!(baseline.recommended_spend, boosted.recommended_spend);
    }

    #[test]
    fn deep_discount_raises_margin_risk() {
        let mut optimizer = SpendOptimizer::new();
        optimizer.train(&training_records()).unwrap();

        let request = OptimizationRequest {
            discount_value: 40.0,
            ..beverages_request()
        };
        let result = optimizer.optimize(&request).unwrap();
        assert!(result
            .risk_factors
            .iter()
            .any(|r| r.contains("margin erosion")));
    }

    #[test]
    fn long_duration_raises_burst_risk() {
        let mut optimizer = SpendOptimizer::new();
        optimizer.train(&training_records()).unwrap();

        let request = OptimizationRequest {
            duration_days: 45,
            ..beverages_request()
        };
        let result = optimizer.optimize(&request).unwrap();
        assert!(result
            .risk_factors
            .iter()
            .any(|r| r.contains("shorter bursts")));
    }

    #[test]
    fn invalid_request_fields_rejected() {
        let mut optimizer = SpendOptimizer::new();
        optimizer.train(&training_records()).unwrap();

        let negative_discount = OptimizationRequest {
            discount_value: -5.0,
            ..beverages_request()
        };
        assert!(matches!(
            optimizer.optimize(&negative_discount),
            Err(EngineError::InvalidInput(_))
        ));

        let zero_season = OptimizationRequest {
            seasonality_factor: 0.0,
            ..beverages_request()
        };
        assert!(matches!(
            optimizer.optimize(&zero_season),
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[test]
    fn training_requires_enough_records() {
        let mut optimizer = SpendOptimizer::new();
        let few: Vec<PromotionRecord> = training_records().into_iter().take(3).collect();
        assert!(matches!(
            optimizer.train(&few),
            Err(EngineError::InsufficientData { .. })
        ));
    }

    #[test]
    fn params_round_trip_restores_recommendations() {
        let mut optimizer = SpendOptimizer::new();
        optimizer.train(&training_records()).unwrap();

        let json = serde_json::to_string(optimizer.params().unwrap()).unwrap();
        let restored: OptimizerParams = serde_json::from_str(&json).unwrap();
        let clone = SpendOptimizer::from_params(restored);

        let a = optimizer.optimize(&beverages_request()).unwrap();
        let b = clone.optimize(&beverages_request()).unwrap();
        assert_eq!(a.recommended_spend, b.recommended_spend);
        assert_eq!(a.expected_roi, b.expected_roi);
        assert_eq!(a.confidence_score, b.confidence_score);
    }

    #[test]
    fn categorical_codes_are_stable() {
        assert_eq!(category_code("Beverages"), 1.0);
        assert_eq!(category_code("  beverages "), 1.0);
        assert_eq!(category_code("unheard-of"), 0.0);
        assert_eq!(store_type_code("Hypermarket"), 1.0);
        assert_eq!(store_type_code("spaceship"), 0.0);
        assert_eq!(discount_type_code("BOGO"), 3.0);
        assert_eq!(discount_type_code("mystery"), 0.0);
    }
}
