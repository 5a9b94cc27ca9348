//! Political and economic factors from governance indicators.
//!
//! Each indicator estimate on `[-2.5, 2.5]` maps linearly onto risk
//! (`2.5 → 0`, `-2.5 → 100`). The factor is the mean over the expected
//! indicators that are present; confidence is the fraction present. Finite
//! estimates past the nominal bounds are clamped, the raw value is kept in
//! `components`.

use std::collections::BTreeMap;

use chrono::Datelike;
use tracing::debug;

use gr_core::variables::{GovernanceIndicator, GovernanceParams};
use gr_core::{
    clamp_score, EngineError, EngineResult, ErrorContext, Factor, FactorScore, RegionId,
};

use super::{wrong_extract, FactorCalculator, GovernanceExtract, IndicatorObservation, SourceExtract};

const ESTIMATE_BOUND: f64 = 2.5;

/// Linear map from an estimate to risk; higher governance quality means lower risk.
pub fn estimate_to_risk(estimate: f64) -> f64 {
    clamp_score((ESTIMATE_BOUND - estimate) / (2.0 * ESTIMATE_BOUND) * 100.0)
}

#[derive(Debug, Clone)]
pub struct GovernanceCalculator {
    factor: Factor,
    expected: Vec<GovernanceIndicator>,
    max_age_years: Option<u32>,
}

impl GovernanceCalculator {
    pub fn political(params: &GovernanceParams) -> Self {
        Self { factor: Factor::Political, expected: params.political.clone(), max_age_years: params.max_age_years }
    }

    pub fn economic(params: &GovernanceParams) -> Self {
        Self { factor: Factor::Economic, expected: params.economic.clone(), max_age_years: params.max_age_years }
    }

    pub fn score(&self, region: &RegionId, extract: &GovernanceExtract) -> EngineResult<FactorScore> {
        // Latest observation per indicator; later entries win a same-year tie.
        let mut latest: BTreeMap<GovernanceIndicator, IndicatorObservation> = BTreeMap::new();
        for (i, obs) in extract.observations.iter().enumerate() {
            if !obs.value.is_finite() {
                return Err(EngineError::validation(
                    ErrorContext::field(format!("observations[{i}].value"))
                        .with_factor(self.factor)
                        .with_region(region),
                    format!("{} estimate {} is not finite", obs.indicator.as_str(), obs.value),
                ));
            }
            if obs.value.abs() > ESTIMATE_BOUND {
                debug!(region = %region, indicator = obs.indicator.as_str(), value = obs.value, "estimate clamped to [-2.5, 2.5]");
            }
            match latest.get(&obs.indicator) {
                Some(prev) if prev.year > obs.year => {}
                _ => {
                    latest.insert(obs.indicator, *obs);
                }
            }
        }

        let as_of_year = extract.as_of.year();
        let mut components = BTreeMap::new();
        let mut risks = Vec::with_capacity(self.expected.len());
        for ind in &self.expected {
            let Some(obs) = latest.get(ind) else { continue };
            if let Some(max_age) = self.max_age_years {
                if i64::from(as_of_year) - i64::from(obs.year) > i64::from(max_age) {
                    continue;
                }
            }
            components.insert(ind.as_str().to_string(), obs.value);
            risks.push(estimate_to_risk(obs.value));
        }

        if risks.is_empty() {
            debug!(region = %region, factor = %self.factor, "no governance indicators; neutral score");
            return Ok(FactorScore::neutral(self.factor, region.clone(), extract.as_of));
        }

        let value = clamp_score(risks.iter().sum::<f64>() / risks.len() as f64);
        let confidence = risks.len() as f64 / self.expected.len() as f64;

        debug!(region = %region, factor = %self.factor, present = risks.len(), value, "governance score computed");

        Ok(FactorScore {
            factor: self.factor,
            region: region.clone(),
            value,
            confidence,
            computed_at: extract.as_of,
            components,
        })
    }
}

impl FactorCalculator for GovernanceCalculator {
    fn factor(&self) -> Factor {
        self.factor
    }

    fn compute(&self, region: &RegionId, extract: &SourceExtract) -> EngineResult<FactorScore> {
        match extract {
            SourceExtract::Governance(e) => self.score(region, e),
            other => Err(wrong_extract(self.factor, region, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn obs(indicator: GovernanceIndicator, year: i32, value: f64) -> IndicatorObservation {
        IndicatorObservation { indicator, year, value }
    }

    fn extract(observations: Vec<IndicatorObservation>) -> GovernanceExtract {
        GovernanceExtract { as_of: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(), observations }
    }

    fn region() -> RegionId {
        "VEN".parse().unwrap()
    }

    #[test]
    fn estimate_maps_linearly() {
        assert_eq!(estimate_to_risk(2.5), 0.0);
        assert_eq!(estimate_to_risk(-2.5), 100.0);
        assert_eq!(estimate_to_risk(0.0), 50.0);
    }

    #[test]
    fn partial_indicators_reduce_confidence() {
        let calc = GovernanceCalculator::political(&GovernanceParams::default());
        let s = calc
            .score(
                &region(),
                &extract(vec![
                    obs(GovernanceIndicator::RuleOfLaw, 2023, -1.5),
                    obs(GovernanceIndicator::ControlOfCorruption, 2023, -0.5),
                    // economic indicator: ignored by the political calculator
                    obs(GovernanceIndicator::RegulatoryQuality, 2023, 2.0),
                ]),
            )
            .unwrap();
        assert_eq!(s.confidence, 0.5);
        assert!((s.value - 70.0).abs() < 1e-9);
        assert_eq!(s.components.len(), 2);
    }

    #[test]
    fn latest_year_wins() {
        let calc = GovernanceCalculator::economic(&GovernanceParams::default());
        let s = calc
            .score(
                &region(),
                &extract(vec![
                    obs(GovernanceIndicator::RegulatoryQuality, 2023, 0.0),
                    obs(GovernanceIndicator::RegulatoryQuality, 2019, 2.5),
                    obs(GovernanceIndicator::GovernmentEffectiveness, 2022, 0.0),
                ]),
            )
            .unwrap();
        assert_eq!(s.value, 50.0);
        assert_eq!(s.confidence, 1.0);
    }

    #[test]
    fn stale_observations_count_as_missing() {
        let params = GovernanceParams { max_age_years: Some(3), ..GovernanceParams::default() };
        let calc = GovernanceCalculator::economic(&params);
        let s = calc
            .score(&region(), &extract(vec![obs(GovernanceIndicator::RegulatoryQuality, 2015, -2.0)]))
            .unwrap();
        assert_eq!(s.value, 50.0);
        assert_eq!(s.confidence, 0.0);
    }

    #[test]
    fn estimate_past_bound_is_clamped() {
        let calc = GovernanceCalculator::political(&GovernanceParams::default());
        let s = calc
            .score(&region(), &extract(vec![obs(GovernanceIndicator::RuleOfLaw, 2023, 2.52)]))
            .unwrap();
        assert_eq!(s.value, 0.0);
        assert_eq!(s.components["rule_of_law"], 2.52);
        assert_eq!(s.confidence, 0.25);
    }

    #[test]
    fn non_finite_estimate_is_rejected() {
        let calc = GovernanceCalculator::political(&GovernanceParams::default());
        let err = calc
            .score(&region(), &extract(vec![obs(GovernanceIndicator::RuleOfLaw, 2023, f64::INFINITY)]))
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation { context, .. } if context.factor == Some(Factor::Political)));
    }
}
