//! # promo-engine
//!
//! Analytics and decision engine for FMCG trade-promotion planning.
//!
//! Four numerical subsystems over caller-supplied historical series:
//! forecast ensembling, trend/seasonality/change-point analysis,
//! multi-signal anomaly scoring, and Monte Carlo risk simulation, plus the
//! spend-optimization regression that consumes the same aggregates.
//!
//! All operations are pure, request-scoped computations over in-memory
//! data; persistence and transport are the caller's concern. Long-lived
//! state (baselines, ensemble weights, trained regression parameters) is
//! carried in explicit artifact values persisted through
//! [`store::ParameterStore`].

pub mod analysis;
pub mod anomaly;
pub mod core;
pub mod error;
pub mod features;
pub mod models;
pub mod optimizer;
pub mod simulation;
pub mod store;
pub mod utils;

pub use error::{EngineError, Result};

pub mod prelude {
    pub use crate::analysis::{analyze_trend, TrendAnalysis, TrendDirection};
    pub use crate::anomaly::{AnomalyObservation, AnomalyScorer, AnomalyVerdict, Severity};
    pub use crate::core::{
        ConfidenceInterval, DimensionKeys, ForecastResult, MetricKind, ModelId, SalesSeries,
        SeriesPoint,
    };
    pub use crate::error::{EngineError, Result};
    pub use crate::models::{forecast, EnsembleWeights, ForecastOptions, ModelSelector};
    pub use crate::optimizer::{
        OptimizationRequest, OptimizationResult, PromotionRecord, SpendOptimizer,
    };
    pub use crate::simulation::{
        Distribution, SimulationSpec, SimulationType, Simulator, StochasticVariable,
    };
    pub use crate::store::{MemoryStore, ParameterStore};
}
