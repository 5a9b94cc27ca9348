//! Score entities: `FactorScore`, `WeightVector`, `CompositeScore`, `RiskLevel`.
//!
//! All of these are value objects. A recalculation always produces a fresh
//! instance; nothing in the engine mutates a score after it was produced.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, WeightRejection};
use crate::factors::{Factor, FactorMap};
use crate::ids::RegionId;

/// Normalized weight vectors sum to 1.0 within this tolerance.
pub const WEIGHT_SUM_EPSILON: f64 = 1e-6;

/// Score assumed for a factor with no usable data.
pub const NEUTRAL_SCORE: f64 = 50.0;

pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 100.0;

/// Clip into the score domain `[0, 100]`.
#[inline]
pub fn clamp_score(v: f64) -> f64 {
    v.clamp(SCORE_MIN, SCORE_MAX)
}

/// Clip into `[0, 1]`.
#[inline]
pub fn clamp_unit(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

// ------------------------------------------------------------------------------------------------
// FactorScore
// ------------------------------------------------------------------------------------------------

/// One factor's risk for one region at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorScore {
    pub factor: Factor,
    pub region: RegionId,
    /// Risk in `[0, 100]`.
    pub value: f64,
    /// Data support in `[0, 1]`; `0.0` means "no data".
    pub confidence: f64,
    pub computed_at: DateTime<Utc>,
    /// Raw sub-metric values that produced `value`, keyed by sub-metric name.
    pub components: BTreeMap<String, f64>,
}

impl FactorScore {
    /// Neutral, zero-confidence placeholder for a factor without data.
    pub fn neutral(factor: Factor, region: RegionId, computed_at: DateTime<Utc>) -> Self {
        Self {
            factor,
            region,
            value: NEUTRAL_SCORE,
            confidence: 0.0,
            computed_at,
            components: BTreeMap::new(),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// WeightVector
// ------------------------------------------------------------------------------------------------

/// Per-factor weights summing to 1.0 (within `WEIGHT_SUM_EPSILON`).
///
/// The only public constructors normalize; `from_raw_unchecked` exists for
/// stores that persist already-normalized vectors and is what downstream
/// invariant checks guard against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FactorMap<f64>", into = "FactorMap<f64>")]
pub struct WeightVector(FactorMap<f64>);

impl WeightVector {
    /// 0.25 for every factor.
    pub fn balanced() -> Self {
        WeightVector(FactorMap::splat(0.25))
    }

    /// Validate and rescale `raw` so the weights sum to 1.0.
    ///
    /// Fails on any negative or non-finite weight, or when every weight is zero.
    pub fn normalize(raw: FactorMap<f64>) -> Result<Self, EngineError> {
        for (factor, &w) in raw.iter() {
            if !w.is_finite() {
                return Err(EngineError::InvalidWeight {
                    factor: Some(factor),
                    value: w,
                    reason: WeightRejection::NotFinite,
                });
            }
            if w < 0.0 {
                return Err(EngineError::InvalidWeight {
                    factor: Some(factor),
                    value: w,
                    reason: WeightRejection::Negative,
                });
            }
        }
        let largest = raw.iter().fold(0.0_f64, |m, (_, &w)| m.max(w));
        if largest <= 0.0 {
            return Err(EngineError::InvalidWeight {
                factor: None,
                value: raw.sum(),
                reason: WeightRejection::AllZero,
            });
        }
        // Scale into [0, 1] first so the sum cannot overflow.
        let scaled = raw.map(|_, &w| w / largest);
        let total = scaled.sum();
        Ok(WeightVector(scaled.map(|_, &w| w / total)))
    }

    /// Wrap weights without normalizing. Callers must uphold Σ = 1.
    pub fn from_raw_unchecked(raw: FactorMap<f64>) -> Self {
        WeightVector(raw)
    }

    pub fn get(&self, factor: Factor) -> f64 {
        *self.0.get(factor)
    }

    pub fn as_map(&self) -> &FactorMap<f64> {
        &self.0
    }

    pub fn sum(&self) -> f64 {
        self.0.sum()
    }

    pub fn is_normalized(&self) -> bool {
        self.0.iter().all(|(_, &w)| w.is_finite() && w >= 0.0)
            && (self.sum() - 1.0).abs() <= WEIGHT_SUM_EPSILON
    }
}

impl Default for WeightVector {
    fn default() -> Self {
        WeightVector::balanced()
    }
}

impl TryFrom<FactorMap<f64>> for WeightVector {
    type Error = EngineError;

    fn try_from(raw: FactorMap<f64>) -> Result<Self, Self::Error> {
        WeightVector::normalize(raw)
    }
}

impl From<WeightVector> for FactorMap<f64> {
    fn from(w: WeightVector) -> Self {
        w.0
    }
}

// ------------------------------------------------------------------------------------------------
// RiskLevel
// ------------------------------------------------------------------------------------------------

/// Five fixed buckets over the composite value. Upper bounds are inclusive:
/// `[0,20] Low, (20,40] Moderate, (40,60] Elevated, (60,80] High, (80,100] Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    Elevated,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_score(value: f64) -> Self {
        if value <= 20.0 {
            RiskLevel::Low
        } else if value <= 40.0 {
            RiskLevel::Moderate
        } else if value <= 60.0 {
            RiskLevel::Elevated
        } else if value <= 80.0 {
            RiskLevel::High
        } else {
            RiskLevel::Critical
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Moderate => "moderate",
            RiskLevel::Elevated => "elevated",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }

    /// Display label ("Elevated").
    pub const fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::Elevated => "Elevated",
            RiskLevel::High => "High",
            RiskLevel::Critical => "Critical",
        }
    }
}

impl core::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

// ------------------------------------------------------------------------------------------------
// CompositeScore
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorContribution {
    pub raw_score: f64,
    pub weight: f64,
    pub weighted_contribution: f64,
    pub confidence: f64,
    /// True when the factor was missing and the neutral placeholder was used.
    pub imputed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeScore {
    pub region: RegionId,
    pub value: f64,
    pub level: RiskLevel,
    pub factor_contributions: FactorMap<FactorContribution>,
    pub confidence: f64,
    pub computed_at: DateTime<Utc>,
}

impl CompositeScore {
    /// Factor with the largest weighted contribution (first in canonical order on ties).
    pub fn primary_factor(&self) -> Factor {
        let mut best = Factor::ALL[0];
        let mut best_v = f64::NEG_INFINITY;
        for (factor, c) in self.factor_contributions.iter() {
            if c.weighted_contribution > best_v {
                best = factor;
                best_v = c.weighted_contribution;
            }
        }
        best
    }

    pub fn raw_scores(&self) -> FactorMap<f64> {
        self.factor_contributions.map(|_, c| c.raw_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_buckets_are_upper_inclusive() {
        assert_eq!(RiskLevel::from_score(0.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(20.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(20.5), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_score(41.0), RiskLevel::Elevated);
        assert_eq!(RiskLevel::from_score(60.0), RiskLevel::Elevated);
        assert_eq!(RiskLevel::from_score(60.0001), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(80.0), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(81.0), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(100.0), RiskLevel::Critical);
    }

    #[test]
    fn normalize_rescales_to_unit_sum() {
        let w = WeightVector::normalize(FactorMap::new(2.0, 1.0, 1.0, 0.0)).unwrap();
        assert!((w.sum() - 1.0).abs() <= WEIGHT_SUM_EPSILON);
        assert!((w.get(Factor::Conflict) - 0.5).abs() < 1e-12);
        assert_eq!(w.get(Factor::Economic), 0.0);
        assert!(w.is_normalized());
    }

    #[test]
    fn normalize_rejects_negative_and_all_zero() {
        let neg = WeightVector::normalize(FactorMap::new(-0.1, 0.4, 0.3, 0.4));
        assert!(matches!(
            neg,
            Err(EngineError::InvalidWeight { factor: Some(Factor::Conflict), reason: WeightRejection::Negative, .. })
        ));
        let zero = WeightVector::normalize(FactorMap::splat(0.0));
        assert!(matches!(
            zero,
            Err(EngineError::InvalidWeight { reason: WeightRejection::AllZero, .. })
        ));
        let nan = WeightVector::normalize(FactorMap::new(f64::NAN, 0.4, 0.3, 0.4));
        assert!(nan.is_err());
    }

    #[test]
    fn huge_weights_still_sum_to_one() {
        let w = WeightVector::normalize(FactorMap::new(f64::MAX, f64::MAX, 1.0, 1.0)).unwrap();
        assert!(w.is_normalized());
        assert_eq!(w.get(Factor::Conflict), 0.5);
        assert_eq!(w.get(Factor::Sentiment), 0.5);
        assert!(w.get(Factor::Economic) < 1e-300);
    }

    #[test]
    fn deserializing_weights_normalizes() {
        let w: WeightVector =
            serde_json::from_str(r#"{"conflict":2,"sentiment":2,"political":2,"economic":2}"#).unwrap();
        assert_eq!(w, WeightVector::balanced());
    }

    #[test]
    fn unchecked_vector_reports_not_normalized() {
        let w = WeightVector::from_raw_unchecked(FactorMap::splat(0.5));
        assert!(!w.is_normalized());
    }
}
