//! Trend analysis over a region's composite history.

use serde::{Deserialize, Serialize};

use gr_core::CompositeScore;

use crate::stats;

/// Samples used for the volatility estimate.
pub const VOLATILITY_WINDOW: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    RapidlyIncreasing,
    Increasing,
    Stable,
    Decreasing,
    RapidlyDecreasing,
}

impl TrendDirection {
    pub fn from_velocity(v: f64) -> Self {
        if v > 5.0 {
            TrendDirection::RapidlyIncreasing
        } else if v > 1.0 {
            TrendDirection::Increasing
        } else if v < -5.0 {
            TrendDirection::RapidlyDecreasing
        } else if v < -1.0 {
            TrendDirection::Decreasing
        } else {
            TrendDirection::Stable
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub samples: usize,
    /// Last step, in score points.
    pub velocity: f64,
    /// Change of velocity over the last two steps.
    pub acceleration: f64,
    /// Population std-dev of the last `VOLATILITY_WINDOW` values.
    pub volatility: f64,
    pub direction: TrendDirection,
}

/// `values` oldest first.
pub fn analyze(values: &[f64]) -> TrendAnalysis {
    let n = values.len();
    let velocity = if n >= 2 { values[n - 1] - values[n - 2] } else { 0.0 };
    let acceleration = if n >= 3 { velocity - (values[n - 2] - values[n - 3]) } else { 0.0 };
    let tail = &values[n.saturating_sub(VOLATILITY_WINDOW)..];
    let volatility = if tail.len() >= 2 { stats::std_dev(tail).unwrap_or(0.0) } else { 0.0 };
    TrendAnalysis { samples: n, velocity, acceleration, volatility, direction: TrendDirection::from_velocity(velocity) }
}

/// Like `analyze`, over composites ordered oldest first.
pub fn analyze_scores(history: &[CompositeScore]) -> TrendAnalysis {
    let values: Vec<f64> = history.iter().map(|c| c.value).collect();
    analyze(&values)
}
