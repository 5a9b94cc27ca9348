//! Factor calculators: one normalized source extract → one `FactorScore`.
//!
//! Calculators never fail on missing or partial data; they degrade confidence
//! instead. The only error is a malformed extract (`EngineError::Validation`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gr_core::variables::{EngineConfig, EventType, GovernanceIndicator};
use gr_core::{EngineError, EngineResult, ErrorContext, Factor, FactorMap, FactorScore, RegionId};

pub mod conflict;
pub mod governance;
pub mod sentiment;

pub use conflict::ConflictCalculator;
pub use governance::GovernanceCalculator;
pub use sentiment::SentimentCalculator;

// ----------------------------- Extracts -----------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictEvent {
    pub occurred_at: DateTime<Utc>,
    pub event_type: EventType,
    #[serde(default)]
    pub fatalities: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictExtract {
    /// End of the observation window.
    pub as_of: DateTime<Utc>,
    #[serde(default)]
    pub events: Vec<ConflictEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub published_at: DateTime<Utc>,
    /// Media tone on `[-10, 10]` (negative = hostile coverage).
    pub tone: f64,
    /// Relevance on `[0, 1]`; weights the tone average.
    #[serde(default = "default_relevance")]
    pub relevance: f64,
}

fn default_relevance() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentExtract {
    pub as_of: DateTime<Utc>,
    #[serde(default)]
    pub articles: Vec<Article>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorObservation {
    pub indicator: GovernanceIndicator,
    pub year: i32,
    /// Estimate on `[-2.5, 2.5]`; higher means better governance.
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceExtract {
    pub as_of: DateTime<Utc>,
    #[serde(default)]
    pub observations: Vec<IndicatorObservation>,
}

/// Any extract a calculator may receive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SourceExtract {
    Conflict(ConflictExtract),
    Sentiment(SentimentExtract),
    Governance(GovernanceExtract),
}

impl SourceExtract {
    pub const fn kind(&self) -> &'static str {
        match self {
            SourceExtract::Conflict(_) => "conflict",
            SourceExtract::Sentiment(_) => "sentiment",
            SourceExtract::Governance(_) => "governance",
        }
    }
}

// ----------------------------- Calculator seam -----------------------------

pub trait FactorCalculator: Send + Sync {
    fn factor(&self) -> Factor;

    fn compute(&self, region: &RegionId, extract: &SourceExtract) -> EngineResult<FactorScore>;
}

pub(crate) fn wrong_extract(factor: Factor, region: &RegionId, got: &SourceExtract) -> EngineError {
    EngineError::validation(
        ErrorContext::field("extract").with_factor(factor).with_region(region),
        format!("{factor} calculator cannot read a {} extract", got.kind()),
    )
}

/// The four calculators, one per factor, built from one config.
pub struct CalculatorSet {
    calculators: FactorMap<Box<dyn FactorCalculator>>,
}

impl CalculatorSet {
    pub fn from_config(cfg: &EngineConfig) -> Self {
        let conflict: Box<dyn FactorCalculator> = Box::new(ConflictCalculator::new(cfg.conflict.clone()));
        let sentiment: Box<dyn FactorCalculator> = Box::new(SentimentCalculator::new(cfg.sentiment.clone()));
        let political: Box<dyn FactorCalculator> = Box::new(GovernanceCalculator::political(&cfg.governance));
        let economic: Box<dyn FactorCalculator> = Box::new(GovernanceCalculator::economic(&cfg.governance));
        Self { calculators: FactorMap::new(conflict, sentiment, political, economic) }
    }

    pub fn calculator(&self, factor: Factor) -> &dyn FactorCalculator {
        &**self.calculators.get(factor)
    }

    pub fn compute(&self, factor: Factor, region: &RegionId, extract: &SourceExtract) -> EngineResult<FactorScore> {
        self.calculator(factor).compute(region, extract)
    }
}

impl Default for CalculatorSet {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}
