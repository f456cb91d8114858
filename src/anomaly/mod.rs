//! Multi-signal anomaly scoring.
//!
//! Three independent signals per observation — statistical (z-score against
//! a per-metric baseline), pattern (reconstruction error against a learned
//! feature-space model), and contextual (business-rule checks) — fused into
//! a graded verdict.

pub mod baseline;
pub mod pattern;
pub mod rules;
pub mod scorer;

pub use baseline::{BaselineSet, MetricBaseline};
pub use pattern::PatternModel;
pub use rules::{contextual_check, RuleHit};
pub use scorer::AnomalyScorer;

use crate::core::{DimensionKeys, MetricKind};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// A single observation to score.
#[derive(Debug, Clone)]
pub struct AnomalyObservation {
    pub timestamp: DateTime<Utc>,
    /// Metric name, e.g. "revenue" or "transaction_count".
    pub metric: String,
    pub value: f64,
    /// Explicit expectation to check relative deviation against.
    pub expected: Option<f64>,
    pub dimensions: DimensionKeys,
}

impl AnomalyObservation {
    pub fn new(timestamp: DateTime<Utc>, metric: impl Into<String>, value: f64) -> Self {
        Self {
            timestamp,
            metric: metric.into(),
            value,
            expected: None,
            dimensions: DimensionKeys::none(),
        }
    }

    pub fn with_expected(mut self, expected: f64) -> Self {
        self.expected = Some(expected);
        self
    }

    pub fn with_dimensions(mut self, dimensions: DimensionKeys) -> Self {
        self.dimensions = dimensions;
        self
    }
}

/// Graded severity of a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Which signal dominated the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalSource {
    Statistical,
    Pattern,
    Contextual,
}

/// Fused anomaly verdict for one observation.
#[derive(Debug, Clone)]
pub struct AnomalyVerdict {
    pub is_anomaly: bool,
    /// Average of the three signal scores, in [0, 1].
    pub score: f64,
    pub severity: Severity,
    /// The signal with the maximum score.
    pub source: SignalSource,
    pub description: String,
    pub recommendation: String,
}

/// Per-metric scoring policy.
#[derive(Debug, Clone)]
pub struct MetricPolicy {
    pub kind: MetricKind,
    /// Whether off-hours activity is suspicious for this metric.
    pub transactional: bool,
    /// Business-impact multiplier applied to the severity grading.
    pub impact_multiplier: f64,
}

impl Default for MetricPolicy {
    fn default() -> Self {
        Self {
            kind: MetricKind::Other,
            transactional: false,
            impact_multiplier: 1.0,
        }
    }
}

/// Lookup of per-metric policies with sensible FMCG defaults; unknown
/// metrics get a kind inferred from the name and a neutral multiplier.
#[derive(Debug, Clone)]
pub struct MetricCatalog {
    policies: HashMap<String, MetricPolicy>,
}

impl Default for MetricCatalog {
    fn default() -> Self {
        let mut policies = HashMap::new();
        policies.insert(
            "revenue".to_string(),
            MetricPolicy {
                kind: MetricKind::Revenue,
                transactional: false,
                impact_multiplier: 1.5,
            },
        );
        policies.insert(
            "volume".to_string(),
            MetricPolicy {
                kind: MetricKind::Volume,
                transactional: false,
                impact_multiplier: 1.2,
            },
        );
        policies.insert(
            "spend".to_string(),
            MetricPolicy {
                kind: MetricKind::Spend,
                transactional: false,
                impact_multiplier: 1.3,
            },
        );
        policies.insert(
            "transaction_count".to_string(),
            MetricPolicy {
                kind: MetricKind::Count,
                transactional: true,
                impact_multiplier: 1.0,
            },
        );
        Self { policies }
    }
}

impl MetricCatalog {
    /// Register or replace a metric policy.
    pub fn register(&mut self, metric: impl Into<String>, policy: MetricPolicy) {
        self.policies.insert(metric.into(), policy);
    }

    /// Policy for a metric name; unknown names fall back to an inferred
    /// kind with the default multiplier.
    pub fn policy(&self, metric: &str) -> MetricPolicy {
        let key = metric.to_ascii_lowercase();
        self.policies.get(&key).cloned().unwrap_or(MetricPolicy {
            kind: MetricKind::from_name(metric),
            ..MetricPolicy::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn catalog_returns_registered_policy() {
        let catalog = MetricCatalog::default();
        let policy = catalog.policy("revenue");
        assert_eq!(policy.kind, MetricKind::Revenue);
        assert!(policy.impact_multiplier > 1.0);
    }

    #[test]
    fn catalog_infers_unknown_metrics() {
        let catalog = MetricCatalog::default();
        let policy = catalog.policy("store_revenue_daily");
        assert_eq!(policy.kind, MetricKind::Revenue);
        assert_eq!(policy.impact_multiplier, 1.0);

        let other = catalog.policy("mystery_metric");
        assert_eq!(other.kind, MetricKind::Other);
    }

    #[test]
    fn catalog_registration_overrides() {
        let mut catalog = MetricCatalog::default();
        catalog.register(
            "revenue",
            MetricPolicy {
                kind: MetricKind::Revenue,
                transactional: false,
                impact_multiplier: 2.0,
            },
        );
        assert_eq!(catalog.policy("revenue").impact_multiplier, 2.0);
    }
}
