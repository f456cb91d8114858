//! Monte Carlo risk simulation.
//!
//! Samples declared stochastic variables, composes scenario-specific
//! outcomes, and reports distribution statistics, scenario extremes, and a
//! sensitivity ranking.

pub mod engine;
pub mod scenario;
pub mod spec;

pub use engine::{
    DistributionBin, ScenarioOutcome, ScenarioSet, Sensitivity, SimulationResult, Simulator,
    SummaryStats,
};
pub use spec::{
    Constraint, ConstraintKind, Distribution, SimulationSpec, SimulationType, StochasticVariable,
};
