//! gr_pipeline: the risk engine facade.
//!
//! Wires configuration → factor calculators → aggregation → alerts, and runs
//! scenario simulations into digested audit records. Math lives in `gr_algo`,
//! files and hashing in `gr_io`; this crate only orchestrates.

use thiserror::Error;

use gr_core::EngineError;
use gr_io::IoError;

pub mod engine;
pub mod inputs;
pub mod record;

pub use engine::{BatchEntry, Evaluation, RegionAssessment, RiskEngine, TrendReport};
pub use inputs::RegionInputs;
pub use record::SimulationRecord;

/// Single error surface for the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Io(#[from] IoError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
