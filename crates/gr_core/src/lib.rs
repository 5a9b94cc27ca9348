//! gr_core: domain types, engine parameters, error taxonomy and seeded RNG.
//!
//! This crate is **I/O-free**. It defines the stable types shared by the rest
//! of the engine (`gr_algo`, `gr_io`, `gr_pipeline`):
//!
//! - Factors and fixed-shape per-factor records (`Factor`, `FactorMap<T>`)
//! - Region ids, factor/composite scores, weight vectors and risk levels
//! - Scenarios, simulation results and alerts
//! - `EngineConfig` and its parameter blocks
//! - ChaCha20 streams keyed by seed and iteration index
//!
//! All records serialize to plain JSON: lowercase enums, RFC 3339 timestamps.

pub mod alerts;
pub mod entities;
pub mod errors;
pub mod factors;
pub mod ids;
pub mod rng;
pub mod scenario;
pub mod simulation;
pub mod variables;

pub use alerts::{Alert, AlertKind, AlertSeverity};
pub use entities::{
    clamp_score, clamp_unit, CompositeScore, FactorContribution, FactorScore, RiskLevel, WeightVector,
    NEUTRAL_SCORE, WEIGHT_SUM_EPSILON,
};
pub use errors::{EngineError, EngineResult, ErrorContext, WeightRejection};
pub use factors::{Factor, FactorMap};
pub use ids::{Region, RegionId};
pub use rng::SimRng;
pub use scenario::{ImpactDeltas, Scenario, ScenarioBuilder, ScenarioTemplate, Severity};
pub use simulation::{Distribution, ProjectionRole, RegionProjection, SimulationResult, TimelinePoint};
pub use variables::EngineConfig;
