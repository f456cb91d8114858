//! Simulation specification: closed tagged unions for scenario type and
//! distribution family, validated at the input boundary before any
//! sampling.

use crate::error::{EngineError, Result};
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution as _, Exp, LogNormal, Normal};

/// Default iteration count.
pub const DEFAULT_ITERATIONS: usize = 10_000;

/// Scenario composition logic to apply per iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SimulationType {
    PromotionImpact,
    PriceOptimization,
    BudgetAllocation,
    MarketScenario,
    CompetitiveResponse,
}

/// Distribution family of a stochastic variable.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Distribution {
    Normal { mean: f64, std: f64 },
    Uniform { min: f64, max: f64 },
    Exponential { rate: f64 },
    LogNormal { mu: f64, sigma: f64 },
}

impl Distribution {
    /// Validate the family's parameters.
    pub fn validate(&self) -> Result<()> {
        let ok = match self {
            Distribution::Normal { mean, std } => mean.is_finite() && std.is_finite() && *std >= 0.0,
            Distribution::Uniform { min, max } => {
                min.is_finite() && max.is_finite() && min <= max
            }
            Distribution::Exponential { rate } => rate.is_finite() && *rate > 0.0,
            Distribution::LogNormal { mu, sigma } => {
                mu.is_finite() && sigma.is_finite() && *sigma >= 0.0
            }
        };
        if ok {
            Ok(())
        } else {
            Err(EngineError::InvalidInput(format!(
                "invalid distribution parameters: {:?}",
                self
            )))
        }
    }

    /// Draw one sample. Parameters are assumed validated; degenerate
    /// zero-spread families collapse to their location.
    pub fn sample(&self, rng: &mut StdRng) -> f64 {
        match *self {
            Distribution::Normal { mean, std } => {
                if std <= 0.0 {
                    mean
                } else {
                    Normal::new(mean, std).map(|d| d.sample(rng)).unwrap_or(mean)
                }
            }
            Distribution::Uniform { min, max } => {
                if min >= max {
                    min
                } else {
                    rng.gen_range(min..=max)
                }
            }
            Distribution::Exponential { rate } => Exp::new(rate)
                .map(|d| d.sample(rng))
                .unwrap_or(1.0 / rate),
            Distribution::LogNormal { mu, sigma } => {
                if sigma <= 0.0 {
                    mu.exp()
                } else {
                    LogNormal::new(mu, sigma)
                        .map(|d| d.sample(rng))
                        .unwrap_or_else(|_| mu.exp())
                }
            }
        }
    }
}

/// A named stochastic input with a linear impact on the outcome.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StochasticVariable {
    pub name: String,
    pub distribution: Distribution,
    /// Linear coefficient in `outcome *= 1 + sample * impact_coefficient`.
    pub impact_coefficient: f64,
}

impl StochasticVariable {
    pub fn new(name: impl Into<String>, distribution: Distribution, impact: f64) -> Self {
        Self {
            name: name.into(),
            distribution,
            impact_coefficient: impact,
        }
    }
}

/// Bound applied to every iteration's outcome.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    Min,
    Max,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Constraint {
    pub kind: ConstraintKind,
    pub value: f64,
}

/// Full simulation request.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SimulationSpec {
    pub simulation_type: SimulationType,
    pub base_value: f64,
    pub variables: Vec<StochasticVariable>,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
    pub iterations: usize,
    /// Confidence level in percent for the empirical interval.
    pub confidence_level: f64,
}

impl SimulationSpec {
    /// Spec with default iteration count and 95% confidence.
    pub fn new(simulation_type: SimulationType, base_value: f64) -> Self {
        Self {
            simulation_type,
            base_value,
            variables: Vec::new(),
            constraints: Vec::new(),
            iterations: DEFAULT_ITERATIONS,
            confidence_level: 95.0,
        }
    }

    pub fn with_variable(mut self, variable: StochasticVariable) -> Self {
        self.variables.push(variable);
        self
    }

    pub fn with_constraint(mut self, kind: ConstraintKind, value: f64) -> Self {
        self.constraints.push(Constraint { kind, value });
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = level;
        self
    }

    /// Parse a spec from JSON, rejecting unknown simulation types or
    /// distribution families with `InvalidInput` — the input-boundary tag
    /// validation for callers that pass wire data.
    pub fn from_json(json: &str) -> Result<Self> {
        let spec: SimulationSpec = serde_json::from_str(json)
            .map_err(|e| EngineError::InvalidInput(format!("malformed simulation spec: {}", e)))?;
        spec.validate()?;
        Ok(spec)
    }

    /// Reject malformed specs before any sampling.
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(EngineError::InvalidInput(
                "iteration count must be positive".to_string(),
            ));
        }
        if !self.base_value.is_finite() {
            return Err(EngineError::InvalidInput(
                "base value must be finite".to_string(),
            ));
        }
        if !(0.0 < self.confidence_level && self.confidence_level < 100.0) {
            return Err(EngineError::InvalidInput(
                "confidence level must be in (0, 100)".to_string(),
            ));
        }
        for variable in &self.variables {
            if variable.name.trim().is_empty() {
                return Err(EngineError::InvalidInput(
                    "variable name must not be empty".to_string(),
                ));
            }
            if !variable.impact_coefficient.is_finite() {
                return Err(EngineError::InvalidInput(format!(
                    "impact coefficient for '{}' must be finite",
                    variable.name
                )));
            }
            variable.distribution.validate()?;
        }

        let mut min_bound = f64::NEG_INFINITY;
        let mut max_bound = f64::INFINITY;
        for constraint in &self.constraints {
            if !constraint.value.is_finite() {
                return Err(EngineError::InvalidInput(
                    "constraint value must be finite".to_string(),
                ));
            }
            match constraint.kind {
                ConstraintKind::Min => min_bound = min_bound.max(constraint.value),
                ConstraintKind::Max => max_bound = max_bound.min(constraint.value),
            }
        }
        if min_bound > max_bound {
            return Err(EngineError::InvalidInput(
                "min constraint exceeds max constraint".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply the declared constraints to an outcome.
    pub(crate) fn clamp(&self, mut outcome: f64) -> f64 {
        for constraint in &self.constraints {
            outcome = match constraint.kind {
                ConstraintKind::Min => outcome.max(constraint.value),
                ConstraintKind::Max => outcome.min(constraint.value),
            };
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn valid_spec_passes_validation() {
        let spec = SimulationSpec::new(SimulationType::PromotionImpact, 1_000_000.0)
            .with_variable(StochasticVariable::new(
                "demand",
                Distribution::Normal {
                    mean: 0.0,
                    std: 0.1,
                },
                1.0,
            ));
        assert!(spec.validate().is_ok());
        assert_eq!(spec.iterations, DEFAULT_ITERATIONS);
    }

    #[test]
    fn zero_iterations_rejected() {
        let spec =
            SimulationSpec::new(SimulationType::MarketScenario, 100.0).with_iterations(0);
        assert!(matches!(
            spec.validate(),
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[test]
    fn invalid_distribution_parameters_rejected() {
        assert!(Distribution::Normal {
            mean: 0.0,
            std: -1.0
        }
        .validate()
        .is_err());
        assert!(Distribution::Uniform { min: 5.0, max: 1.0 }.validate().is_err());
        assert!(Distribution::Exponential { rate: 0.0 }.validate().is_err());
        assert!(Distribution::LogNormal {
            mu: 0.0,
            sigma: f64::NAN
        }
        .validate()
        .is_err());

        assert!(Distribution::Normal { mean: 0.0, std: 0.0 }.validate().is_ok());
        assert!(Distribution::Uniform { min: 1.0, max: 1.0 }.validate().is_ok());
    }

    #[test]
    fn conflicting_constraints_rejected() {
        let spec = SimulationSpec::new(SimulationType::MarketScenario, 100.0)
            .with_constraint(ConstraintKind::Min, 500.0)
            .with_constraint(ConstraintKind::Max, 100.0);
        assert!(spec.validate().is_err());
    }

    #[test]
    fn unknown_simulation_type_rejected_at_parse() {
        let json = r#"{
            "simulation_type": "WEATHER_IMPACT",
            "base_value": 1000.0,
            "variables": [],
            "iterations": 100,
            "confidence_level": 95.0
        }"#;
        assert!(matches!(
            SimulationSpec::from_json(json),
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[test]
    fn unknown_distribution_family_rejected_at_parse() {
        let json = r#"{
            "simulation_type": "PROMOTION_IMPACT",
            "base_value": 1000.0,
            "variables": [
                {"name": "x", "distribution": {"cauchy": {"scale": 1.0}}, "impact_coefficient": 1.0}
            ],
            "iterations": 100,
            "confidence_level": 95.0
        }"#;
        assert!(matches!(
            SimulationSpec::from_json(json),
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[test]
    fn known_spec_round_trips_through_json() {
        let spec = SimulationSpec::new(SimulationType::BudgetAllocation, 50_000.0)
            .with_variable(StochasticVariable::new(
                "uptake",
                Distribution::Uniform { min: -0.2, max: 0.2 },
                0.8,
            ))
            .with_constraint(ConstraintKind::Min, 0.0);
        let json = serde_json::to_string(&spec).unwrap();
        let restored = SimulationSpec::from_json(&json).unwrap();
        assert_eq!(restored, spec);
    }

    #[test]
    fn samples_respect_uniform_bounds() {
        let dist = Distribution::Uniform {
            min: -0.5,
            max: 0.5,
        };
        let mut rng = rng();
        for _ in 0..1000 {
            let draw = dist.sample(&mut rng);
            assert!((-0.5..=0.5).contains(&draw));
        }
    }

    #[test]
    fn exponential_samples_are_positive() {
        let dist = Distribution::Exponential { rate: 2.0 };
        let mut rng = rng();
        for _ in 0..1000 {
            assert!(dist.sample(&mut rng) >= 0.0);
        }
    }

    #[test]
    fn lognormal_samples_are_positive() {
        let dist = Distribution::LogNormal {
            mu: 0.0,
            sigma: 0.5,
        };
        let mut rng = rng();
        for _ in 0..1000 {
            assert!(dist.sample(&mut rng) > 0.0);
        }
    }

    #[test]
    fn degenerate_distributions_collapse_to_location() {
        let mut rng = rng();
        assert_eq!(
            Distribution::Normal {
                mean: 3.0,
                std: 0.0
            }
            .sample(&mut rng),
            3.0
        );
        assert_eq!(
            Distribution::Uniform { min: 2.0, max: 2.0 }.sample(&mut rng),
            2.0
        );
    }

    #[test]
    fn normal_samples_center_on_mean() {
        let dist = Distribution::Normal {
            mean: 10.0,
            std: 1.0,
        };
        let mut rng = rng();
        let sum: f64 = (0..5000).map(|_| dist.sample(&mut rng)).sum();
        let mean = sum / 5000.0;
        assert!((mean - 10.0).abs() < 0.1, "sample mean was {}", mean);
    }

    #[test]
    fn constraint_clamp_applies_bounds() {
        let spec = SimulationSpec::new(SimulationType::MarketScenario, 100.0)
            .with_constraint(ConstraintKind::Min, 50.0)
            .with_constraint(ConstraintKind::Max, 150.0);
        assert_eq!(spec.clamp(10.0), 50.0);
        assert_eq!(spec.clamp(100.0), 100.0);
        assert_eq!(spec.clamp(500.0), 150.0);
    }
}
