//! Signal fusion into graded verdicts.

use crate::anomaly::{
    contextual_check, AnomalyObservation, AnomalyVerdict, BaselineSet, MetricCatalog,
    PatternModel, Severity, SignalSource,
};
use crate::error::{EngineError, Result};
use crate::features::observation_features;

/// A single signal exceeding this flags the observation outright.
const MAX_SIGNAL_THRESHOLD: f64 = 0.7;
/// The signal average exceeding this also flags the observation.
const AVG_SIGNAL_THRESHOLD: f64 = 0.5;

/// Fuses the statistical, pattern, and contextual signals.
///
/// Train once over a historical batch, then score observations one at a
/// time or in batches. Retraining replaces the fitted state wholesale.
#[derive(Debug, Clone, Default)]
pub struct AnomalyScorer {
    catalog: MetricCatalog,
    baselines: Option<BaselineSet>,
    pattern: Option<PatternModel>,
}

impl AnomalyScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(catalog: MetricCatalog) -> Self {
        Self {
            catalog,
            baselines: None,
            pattern: None,
        }
    }

    /// Fit per-metric baselines and the pattern model from a historical
    /// batch. Safe to call again; the previous fit is replaced.
    pub fn train(&mut self, history: &[AnomalyObservation]) -> Result<()> {
        tracing::info!(observations = history.len(), "training anomaly scorer");
        let baselines = BaselineSet::fit(history)?;
        let rows: Vec<Vec<f64>> = history
            .iter()
            .map(|obs| observation_features(&obs.timestamp, obs.value))
            .collect();
        let pattern = PatternModel::fit(&rows)?;

        self.baselines = Some(baselines);
        self.pattern = Some(pattern);
        Ok(())
    }

    pub fn is_trained(&self) -> bool {
        self.baselines.is_some() && self.pattern.is_some()
    }

    /// Restore a scorer from previously persisted artifacts.
    pub fn from_artifacts(
        catalog: MetricCatalog,
        baselines: BaselineSet,
        pattern: PatternModel,
    ) -> Self {
        Self {
            catalog,
            baselines: Some(baselines),
            pattern: Some(pattern),
        }
    }

    /// The fitted artifacts, for persistence.
    pub fn artifacts(&self) -> Option<(&BaselineSet, &PatternModel)> {
        Some((self.baselines.as_ref()?, self.pattern.as_ref()?))
    }

    /// Score one observation.
    pub fn detect(&self, observation: &AnomalyObservation) -> Result<AnomalyVerdict> {
        let baselines = self.baselines.as_ref().ok_or(EngineError::NotTrained)?;
        let pattern = self.pattern.as_ref().ok_or(EngineError::NotTrained)?;
        let policy = self.catalog.policy(&observation.metric);

        // Signal (a): z-score against the per-metric baseline. Metrics
        // never seen in training contribute a zero signal rather than an
        // error.
        let (statistical, z) = match baselines.get(&observation.metric) {
            Some(baseline) => (baseline.score(observation.value), baseline.z_score(observation.value)),
            None => (0.0, 0.0),
        };

        // Signal (b): reconstruction error in engineered-feature space.
        let features = observation_features(&observation.timestamp, observation.value);
        let pattern_score = pattern.score(&features);

        // Signal (c): explicit business rules.
        let rule_hit = contextual_check(observation, &policy);
        let contextual = rule_hit.as_ref().map(|h| h.score).unwrap_or(0.0);

        let signals = [statistical, pattern_score, contextual];
        let max_signal = signals.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let score = signals.iter().sum::<f64>() / signals.len() as f64;
        let is_anomaly = max_signal > MAX_SIGNAL_THRESHOLD || score > AVG_SIGNAL_THRESHOLD;

        // The dominant signal supplies the narrative.
        let (source, description, recommendation) = if contextual >= statistical
            && contextual >= pattern_score
            && rule_hit.is_some()
        {
            let hit = rule_hit.as_ref().ok_or_else(|| {
                EngineError::NumericDegeneracy("rule hit disappeared".to_string())
            })?;
            (
                SignalSource::Contextual,
                hit.description.clone(),
                hit.recommendation.clone(),
            )
        } else if statistical >= pattern_score {
            (
                SignalSource::Statistical,
                format!(
                    "'{}' value {:.2} is {:.1} standard deviations from its baseline",
                    observation.metric,
                    observation.value,
                    z.abs()
                ),
                "validate the data source and review the surrounding period".to_string(),
            )
        } else {
            (
                SignalSource::Pattern,
                format!(
                    "'{}' observation breaks the learned time-of-day/week profile",
                    observation.metric
                ),
                "check for calendar events or promotions not reflected in the plan".to_string(),
            )
        };

        let severity = severity_for(score * policy.impact_multiplier);

        Ok(AnomalyVerdict {
            is_anomaly,
            score,
            severity,
            source,
            description,
            recommendation,
        })
    }

    /// Score a batch of observations.
    pub fn detect_batch(
        &self,
        observations: &[AnomalyObservation],
    ) -> Result<Vec<AnomalyVerdict>> {
        observations.iter().map(|obs| self.detect(obs)).collect()
    }
}

/// Severity grading over the impact-adjusted score.
fn severity_for(adjusted_score: f64) -> Severity {
    if adjusted_score > 0.9 {
        Severity::Critical
    } else if adjusted_score > 0.7 {
        Severity::High
    } else if adjusted_score > 0.5 {
        Severity::Medium
    } else {
        Severity::Low
    }
}
