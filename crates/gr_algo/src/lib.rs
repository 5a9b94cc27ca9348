// crates/gr_algo/src/lib.rs
#![forbid(unsafe_code)]

//! Analytical components of the risk engine. Pure and synchronous: no I/O,
//! no shared mutable state, safe to call concurrently with separate inputs.

pub mod aggregate;
pub mod alerts;
pub mod factors;
pub mod forecast;
pub mod scenario;
pub mod signals;
pub mod stats;
pub mod trends;
pub mod weights;

// Convenience re-exports (pipeline imports these from crate root)
pub use aggregate::{aggregate, composite_value};
pub use alerts::{evaluate, AlertEvaluator};
pub use factors::{
    CalculatorSet, ConflictExtract, FactorCalculator, GovernanceExtract, SentimentExtract, SourceExtract,
};
pub use scenario::{
    baselines_from_composites, compare_simulations, Baselines, ScenarioComparison, ScenarioEngine,
    SimulationOptions,
};
pub use signals::{Signal, SignalKind};
pub use trends::{TrendAnalysis, TrendDirection};
pub use weights::WeightManager;
