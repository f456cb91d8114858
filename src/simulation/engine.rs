//! Monte Carlo engine: parallel iteration loop, distribution statistics,
//! scenario extraction, sensitivity ranking, and recommendations.

use crate::core::ConfidenceInterval;
use crate::error::{EngineError, Result};
use crate::simulation::scenario::apply_secondary_effects;
use crate::simulation::{SimulationSpec, SimulationType};
use crate::utils::{mean, pearson_correlation, percentile_sorted, population_std};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::collections::HashMap;

/// Number of equal-width probability-distribution bins.
pub const DEFAULT_BINS: usize = 50;

/// Outcome volatility (coefficient of variation) above which hedging is
/// recommended.
const HIGH_CV_THRESHOLD: f64 = 0.5;
/// Best/worst spread ratio above which contingency budget is recommended.
const WIDE_SPREAD_RATIO: f64 = 3.0;
/// Mean-return multiple below which promotion mechanics should be
/// reviewed.
const LOW_RETURN_MULTIPLE: f64 = 1.2;

/// Aggregate outcome statistics. The confidence interval is empirical
/// (percentile-based), not normal-approximated, so it tolerates skew.
#[derive(Debug, Clone)]
pub struct SummaryStats {
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation over all iterations.
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub p5: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
    pub confidence_interval: ConfidenceInterval,
}

/// One bin of the empirical outcome distribution.
#[derive(Debug, Clone)]
pub struct DistributionBin {
    pub midpoint: f64,
    /// Fraction of iterations falling in this bin; all bins sum to 1.
    pub frequency: f64,
}

/// A specific iteration's outcome with the variable draws that produced it.
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub outcome: f64,
    pub draws: HashMap<String, f64>,
}

/// Best (p95), worst (p5), and most likely (p50) iterations.
#[derive(Debug, Clone)]
pub struct ScenarioSet {
    pub best: ScenarioOutcome,
    pub worst: ScenarioOutcome,
    pub most_likely: ScenarioOutcome,
}

/// Per-variable sensitivity, ranked by |elasticity| descending.
#[derive(Debug, Clone)]
pub struct Sensitivity {
    pub variable: String,
    /// Discrete elasticity: relative outcome change per relative variable
    /// change, averaged over iterations.
    pub sensitivity: f64,
    /// Pearson correlation between the variable's draws and the outcome.
    pub correlation: f64,
}

/// Full simulation report.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub summary: SummaryStats,
    pub distribution: Vec<DistributionBin>,
    pub scenarios: ScenarioSet,
    pub sensitivities: Vec<Sensitivity>,
    pub recommendations: Vec<String>,
}

/// Monte Carlo simulator.
///
/// Iterations are independent and partitioned across rayon workers; each
/// iteration derives its own RNG from the master seed, so results are
/// identical regardless of thread count. Outcome arrays are merged by
/// concatenation before statistics are computed.
#[derive(Debug, Clone, Default)]
pub struct Simulator {
    seed: Option<u64>,
    iteration_cap: Option<usize>,
    bins: usize,
}

impl Simulator {
    pub fn new() -> Self {
        Self {
            seed: None,
            iteration_cap: None,
            bins: DEFAULT_BINS,
        }
    }

    /// Fix the master seed for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Caller-imposed iteration ceiling; larger requests are rejected with
    /// `BudgetExceeded` before any sampling.
    pub fn with_iteration_cap(mut self, cap: usize) -> Self {
        self.iteration_cap = Some(cap);
        self
    }

    pub fn with_bins(mut self, bins: usize) -> Self {
        self.bins = bins.max(1);
        self
    }

    /// Run the simulation described by `spec`.
    pub fn run(&self, spec: &SimulationSpec) -> Result<SimulationResult> {
        spec.validate()?;
        if let Some(limit) = self.iteration_cap {
            if spec.iterations > limit {
                return Err(EngineError::BudgetExceeded {
                    limit,
                    requested: spec.iterations,
                });
            }
        }

        tracing::debug!(
            iterations = spec.iterations,
            simulation_type = ?spec.simulation_type,
            variables = spec.variables.len(),
            "running simulation"
        );

        let master_seed = match self.seed {
            Some(seed) => seed,
            None => StdRng::from_entropy().gen(),
        };

        // Map: independent iterations across workers. Reduce: concatenated
        // outcome/draw arrays.
        let iterations: Vec<(f64, Vec<f64>)> = (0..spec.iterations)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(
                    master_seed.wrapping_add((i as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)),
                );
                run_iteration(spec, &mut rng)
            })
            .collect();

        let outcomes: Vec<f64> = iterations.iter().map(|(o, _)| *o).collect();
        let mut sorted = outcomes.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let summary = summarize(&sorted, spec.confidence_level);
        let distribution = build_distribution(&outcomes, summary.min, summary.max, self.bins);
        let scenarios = extract_scenarios(spec, &iterations, &outcomes);
        let sensitivities = rank_sensitivities(spec, &iterations, &outcomes);
        let recommendations = build_recommendations(spec, &summary, &scenarios, &sensitivities);

        Ok(SimulationResult {
            summary,
            distribution,
            scenarios,
            sensitivities,
            recommendations,
        })
    }
}

/// One iteration: draw each variable, compose the outcome, apply the
/// scenario's secondary effects, clamp to constraints.
fn run_iteration(spec: &SimulationSpec, rng: &mut StdRng) -> (f64, Vec<f64>) {
    let draws: Vec<f64> = spec
        .variables
        .iter()
        .map(|v| v.distribution.sample(rng))
        .collect();

    let mut outcome = spec.base_value;
    for (variable, &draw) in spec.variables.iter().zip(draws.iter()) {
        outcome *= 1.0 + draw * variable.impact_coefficient;
    }
    outcome = apply_secondary_effects(spec.simulation_type, outcome, spec.base_value, rng);
    if !outcome.is_finite() {
        outcome = 0.0;
    }
    (spec.clamp(outcome), draws)
}

fn summarize(sorted: &[f64], confidence_level: f64) -> SummaryStats {
    let alpha = (100.0 - confidence_level) / 2.0;
    SummaryStats {
        mean: mean(sorted),
        median: percentile_sorted(sorted, 50.0),
        std_dev: population_std(sorted),
        min: sorted.first().copied().unwrap_or(f64::NAN),
        max: sorted.last().copied().unwrap_or(f64::NAN),
        p5: percentile_sorted(sorted, 5.0),
        p25: percentile_sorted(sorted, 25.0),
        p50: percentile_sorted(sorted, 50.0),
        p75: percentile_sorted(sorted, 75.0),
        p95: percentile_sorted(sorted, 95.0),
        confidence_interval: ConfidenceInterval::new(
            percentile_sorted(sorted, alpha),
            percentile_sorted(sorted, 100.0 - alpha),
        ),
    }
}

fn build_distribution(outcomes: &[f64], min: f64, max: f64, bins: usize) -> Vec<DistributionBin> {
    let n = outcomes.len() as f64;
    let width = (max - min) / bins as f64;
    if width <= 0.0 || !width.is_finite() {
        // All outcomes identical: a single bin carries everything.
        return vec![DistributionBin {
            midpoint: min,
            frequency: 1.0,
        }];
    }

    let mut counts = vec![0usize; bins];
    for &outcome in outcomes {
        let index = (((outcome - min) / width) as usize).min(bins - 1);
        counts[index] += 1;
    }

    counts
        .iter()
        .enumerate()
        .map(|(i, &count)| DistributionBin {
            midpoint: min + (i as f64 + 0.5) * width,
            frequency: count as f64 / n,
        })
        .collect()
}

/// The iterations sitting at the 95th/5th/50th percentile ranks supply the
/// best/worst/most-likely scenarios, carrying their actual variable draws.
fn extract_scenarios(
    spec: &SimulationSpec,
    iterations: &[(f64, Vec<f64>)],
    outcomes: &[f64],
) -> ScenarioSet {
    let mut order: Vec<usize> = (0..outcomes.len()).collect();
    order.sort_by(|&a, &b| {
        outcomes[a]
            .partial_cmp(&outcomes[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let at_rank = |percent: f64| -> ScenarioOutcome {
        let rank = ((percent / 100.0) * (order.len() - 1) as f64).round() as usize;
        let index = order[rank];
        let (outcome, draws) = &iterations[index];
        let named: HashMap<String, f64> = spec
            .variables
            .iter()
            .zip(draws.iter())
            .map(|(v, &d)| (v.name.clone(), d))
            .collect();
        ScenarioOutcome {
            outcome: *outcome,
            draws: named,
        }
    };

    ScenarioSet {
        best: at_rank(95.0),
        worst: at_rank(5.0),
        most_likely: at_rank(50.0),
    }
}

/// Discrete elasticity of the outcome with respect to one variable.
///
/// Zero-deviation iterations are skipped; near-zero variable means are
/// substituted with the draw spread so zero-centered variables still get a
/// stable scale.
fn elasticity(draws: &[f64], outcomes: &[f64]) -> f64 {
    let x_mean = mean(draws);
    let x_std = population_std(draws);
    let y_mean = mean(outcomes);

    let x_scale = if x_mean.abs() > 0.1 * x_std && x_mean.abs() > 1e-9 {
        x_mean
    } else if x_std > 1e-9 {
        x_std
    } else {
        return 0.0; // constant variable
    };
    let y_scale = if y_mean.abs() > 1e-9 { y_mean } else { 1e-9 };
    let skip_below = (0.01 * x_std).max(1e-12);

    let mut acc = 0.0;
    let mut count = 0usize;
    for (&x, &y) in draws.iter().zip(outcomes.iter()) {
        let dx = x - x_mean;
        if dx.abs() < skip_below {
            continue;
        }
        acc += ((y - y_mean) / y_scale) / (dx / x_scale);
        count += 1;
    }
    if count == 0 {
        0.0
    } else {
        acc / count as f64
    }
}

fn rank_sensitivities(
    spec: &SimulationSpec,
    iterations: &[(f64, Vec<f64>)],
    outcomes: &[f64],
) -> Vec<Sensitivity> {
    let mut sensitivities: Vec<Sensitivity> = spec
        .variables
        .iter()
        .enumerate()
        .map(|(j, variable)| {
            let draws: Vec<f64> = iterations.iter().map(|(_, d)| d[j]).collect();
            let correlation = pearson_correlation(&draws, outcomes);
            Sensitivity {
                variable: variable.name.clone(),
                sensitivity: elasticity(&draws, outcomes),
                correlation: if correlation.is_finite() {
                    correlation.clamp(-1.0, 1.0)
                } else {
                    0.0
                },
            }
        })
        .collect();

    sensitivities.sort_by(|a, b| {
        b.sensitivity
            .abs()
            .partial_cmp(&a.sensitivity.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    sensitivities
}

fn build_recommendations(
    spec: &SimulationSpec,
    summary: &SummaryStats,
    scenarios: &ScenarioSet,
    sensitivities: &[Sensitivity],
) -> Vec<String> {
    let mut recommendations = Vec::new();

    let cv = if summary.mean.abs() > 1e-9 {
        summary.std_dev / summary.mean.abs()
    } else {
        0.0
    };
    if cv > HIGH_CV_THRESHOLD {
        recommendations.push(format!(
            "outcome volatility is high (coefficient of variation {:.2}); stage commitments and re-forecast mid-flight",
            cv
        ));
    }

    if scenarios.worst.outcome > 1e-9
        && scenarios.best.outcome / scenarios.worst.outcome > WIDE_SPREAD_RATIO
    {
        recommendations.push(format!(
            "best and worst scenarios differ by {:.1}x; secure contingency budget before committing",
            scenarios.best.outcome / scenarios.worst.outcome
        ));
    }

    match spec.simulation_type {
        SimulationType::PromotionImpact | SimulationType::BudgetAllocation => {
            if spec.base_value > 0.0 && summary.mean / spec.base_value < LOW_RETURN_MULTIPLE {
                recommendations.push(
                    "expected return is below 1.2x of the committed base; review promotion mechanics before launch"
                        .to_string(),
                );
            }
        }
        SimulationType::PriceOptimization => {
            if summary.p5 < 0.9 * spec.base_value {
                recommendations.push(
                    "downside scenarios erode revenue below 90% of today's level; cap the price move"
                        .to_string(),
                );
            }
        }
        SimulationType::MarketScenario => {
            if summary.p5 < spec.base_value {
                recommendations.push(
                    "contraction scenarios are plausible; prepare a defensive assortment plan"
                        .to_string(),
                );
            }
        }
        SimulationType::CompetitiveResponse => {
            if summary.mean < spec.base_value {
                recommendations.push(
                    "competitor reaction absorbs most of the move; defend with loyalty mechanics rather than deeper discounts"
                        .to_string(),
                );
            }
        }
    }

    if let Some(top) = sensitivities.first() {
        if top.sensitivity.abs() > 0.0 {
            recommendations.push(format!(
                "'{}' is the primary outcome lever; prioritize controlling it",
                top.variable
            ));
        }
    }

    recommendations
}
