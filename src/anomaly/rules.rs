//! Contextual business-rule checks.

use crate::anomaly::{AnomalyObservation, MetricPolicy};
use crate::features::calendar::business_hours_indicator;

/// Relative deviation from an explicit expectation that triggers the rule.
pub const DEVIATION_THRESHOLD: f64 = 0.5;
/// Score for a non-integral count observation.
const NON_INTEGRAL_SCORE: f64 = 0.8;
/// Score for off-hours activity on a transactional metric.
const OFF_HOURS_SCORE: f64 = 0.6;

/// A triggered business rule with its score and explanation.
#[derive(Debug, Clone)]
pub struct RuleHit {
    pub score: f64,
    pub description: String,
    pub recommendation: String,
}

/// Run the contextual checks and return the strongest hit, if any.
///
/// Checks, in decreasing typical severity: disallowed negative values,
/// non-integral counts, relative deviation from an explicit expected value,
/// and off-hours activity for transactional metrics.
pub fn contextual_check(
    observation: &AnomalyObservation,
    policy: &MetricPolicy,
) -> Option<RuleHit> {
    let mut best: Option<RuleHit> = None;

    if policy.kind.non_negative() && observation.value < 0.0 {
        best = strongest(
            best,
            RuleHit {
                score: 1.0,
                description: format!(
                    "negative value {:.2} for non-negative metric '{}'",
                    observation.value, observation.metric
                ),
                recommendation: "check for data-entry errors or unprocessed reversals"
                    .to_string(),
            },
        );
    }

    if policy.kind.integral() && observation.value.fract().abs() > 1e-9 {
        best = strongest(
            best,
            RuleHit {
                score: NON_INTEGRAL_SCORE,
                description: format!(
                    "non-integral value {:.4} for count metric '{}'",
                    observation.value, observation.metric
                ),
                recommendation: "verify the aggregation pipeline emits whole counts".to_string(),
            },
        );
    }

    if let Some(expected) = observation.expected {
        let relative = (observation.value - expected).abs() / expected.abs().max(1e-9);
        if relative > DEVIATION_THRESHOLD {
            best = strongest(
                best,
                RuleHit {
                    score: relative.min(1.0),
                    description: format!(
                        "value {:.2} deviates {:.0}% from expected {:.2}",
                        observation.value,
                        relative * 100.0,
                        expected
                    ),
                    recommendation: "compare against the source system for this period"
                        .to_string(),
                },
            );
        }
    }

    if policy.transactional && business_hours_indicator(&observation.timestamp) == 0.0 {
        best = strongest(
            best,
            RuleHit {
                score: OFF_HOURS_SCORE,
                description: format!(
                    "transactional metric '{}' active outside business hours",
                    observation.metric
                ),
                recommendation: "review store opening hours and system clock settings"
                    .to_string(),
            },
        );
    }

    best
}

fn strongest(current: Option<RuleHit>, candidate: RuleHit) -> Option<RuleHit> {
    match current {
        Some(hit) if hit.score >= candidate.score => Some(hit),
        _ => Some(candidate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MetricKind;
    use chrono::{TimeZone, Utc};

    fn policy(kind: MetricKind, transactional: bool) -> MetricPolicy {
        MetricPolicy {
            kind,
            transactional,
            impact_multiplier: 1.0,
        }
    }

    fn daytime() -> chrono::DateTime<Utc> {
        // Tuesday 11:00
        Utc.with_ymd_and_hms(2024, 1, 2, 11, 0, 0).unwrap()
    }

    #[test]
    fn negative_revenue_scores_max() {
        let obs = AnomalyObservation::new(daytime(), "revenue", -100.0);
        let hit = contextual_check(&obs, &policy(MetricKind::Revenue, false)).unwrap();
        assert_eq!(hit.score, 1.0);
        assert!(hit.description.contains("negative"));
    }

    #[test]
    fn negative_ratio_is_allowed() {
        let obs = AnomalyObservation::new(daytime(), "margin_delta", -0.2);
        assert!(contextual_check(&obs, &policy(MetricKind::Ratio, false)).is_none());
    }

    #[test]
    fn fractional_count_flagged() {
        let obs = AnomalyObservation::new(daytime(), "transaction_count", 12.5);
        let hit = contextual_check(&obs, &policy(MetricKind::Count, true)).unwrap();
        assert_eq!(hit.score, NON_INTEGRAL_SCORE);
    }

    #[test]
    fn whole_count_passes() {
        let obs = AnomalyObservation::new(daytime(), "transaction_count", 12.0);
        assert!(contextual_check(&obs, &policy(MetricKind::Count, false)).is_none());
    }

    #[test]
    fn deviation_from_expected_scales_with_distance() {
        let obs =
            AnomalyObservation::new(daytime(), "revenue", 190.0).with_expected(100.0);
        let hit = contextual_check(&obs, &policy(MetricKind::Revenue, false)).unwrap();
        assert!((hit.score - 0.9).abs() < 1e-9);

        // Within threshold: no hit.
        let close = AnomalyObservation::new(daytime(), "revenue", 120.0).with_expected(100.0);
        assert!(contextual_check(&close, &policy(MetricKind::Revenue, false)).is_none());
    }

    #[test]
    fn off_hours_transactions_flagged() {
        let night = Utc.with_ymd_and_hms(2024, 1, 2, 3, 0, 0).unwrap();
        let obs = AnomalyObservation::new(night, "transaction_count", 50.0);
        let hit = contextual_check(&obs, &policy(MetricKind::Count, true)).unwrap();
        assert_eq!(hit.score, OFF_HOURS_SCORE);

        // Non-transactional metrics are exempt.
        let obs = AnomalyObservation::new(night, "revenue", 50.0);
        assert!(contextual_check(&obs, &policy(MetricKind::Revenue, false)).is_none());
    }

    #[test]
    fn strongest_rule_wins() {
        // Negative AND far from expected: negative's 1.0 dominates.
        let obs =
            AnomalyObservation::new(daytime(), "revenue", -100.0).with_expected(100.0);
        let hit = contextual_check(&obs, &policy(MetricKind::Revenue, false)).unwrap();
        assert_eq!(hit.score, 1.0);
        assert!(hit.description.contains("negative"));
    }
}
