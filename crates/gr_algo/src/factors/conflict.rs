//! Conflict factor from armed-conflict event records.
//!
//! Three independently saturating terms, summed and clipped to `[0, 100]`:
//! - severity: Σ event-type weight over the window
//! - fatalities: total reported deaths
//! - trend: how much the recent half of the window outweighs the older half
//!
//! An empty window is a valid "quiet" reading (score 0) with baseline confidence.

use std::collections::BTreeMap;

use chrono::Duration;
use tracing::debug;

use gr_core::variables::ConflictParams;
use gr_core::{clamp_score, EngineError, EngineResult, ErrorContext, Factor, FactorScore, RegionId};

use super::{wrong_extract, ConflictExtract, FactorCalculator, SourceExtract};

#[derive(Debug, Clone, Default)]
pub struct ConflictCalculator {
    params: ConflictParams,
}

impl ConflictCalculator {
    pub fn new(params: ConflictParams) -> Self {
        Self { params }
    }

    pub fn score(&self, region: &RegionId, extract: &ConflictExtract) -> EngineResult<FactorScore> {
        let p = &self.params;
        let ctx = |field: String| ErrorContext::field(field).with_factor(Factor::Conflict).with_region(region);

        if p.lookback_days == 0 {
            return Err(EngineError::validation(ctx("lookback_days".into()), "window must be at least one day"));
        }
        let window_start = extract.as_of - Duration::days(i64::from(p.lookback_days));
        let midpoint = extract.as_of - Duration::days(i64::from(p.lookback_days)) / 2;

        let mut count = 0u32;
        let mut weighted = 0.0f64;
        let mut fatalities = 0u64;
        let mut recent = 0u32;
        let mut older = 0u32;

        for (i, ev) in extract.events.iter().enumerate() {
            if ev.occurred_at > extract.as_of {
                return Err(EngineError::validation(
                    ctx(format!("events[{i}].occurred_at")),
                    format!("event dated after as_of ({})", ev.occurred_at.to_rfc3339()),
                ));
            }
            if ev.occurred_at < window_start {
                continue;
            }
            count += 1;
            weighted += p.event_weights.weight(ev.event_type);
            fatalities += u64::from(ev.fatalities);
            if ev.occurred_at >= midpoint {
                recent += 1;
            } else {
                older += 1;
            }
        }

        let mut components = BTreeMap::new();
        components.insert("event_count".to_string(), f64::from(count));
        components.insert("weighted_events".to_string(), weighted);
        components.insert("fatalities".to_string(), fatalities as f64);

        if count == 0 {
            debug!(region = %region, "no conflict events in window");
            components.insert("trend_ratio".to_string(), 0.0);
            return Ok(FactorScore {
                factor: Factor::Conflict,
                region: region.clone(),
                value: 0.0,
                confidence: p.empty_confidence,
                computed_at: extract.as_of,
                components,
            });
        }

        let severity_term = (weighted / p.severity_saturation).min(1.0) * p.severity_points;
        let fatality_term = (fatalities as f64 / p.fatality_saturation).min(1.0) * p.fatality_points;
        let ratio = (f64::from(recent) - f64::from(older)) / f64::from(recent + older);
        let trend_term = ratio.max(0.0) * p.trend_points;
        components.insert("trend_ratio".to_string(), ratio);

        let value = clamp_score(severity_term + fatality_term + trend_term);
        let coverage = (f64::from(count) / f64::from(p.full_confidence_events)).min(1.0);
        let confidence = p.empty_confidence + (1.0 - p.empty_confidence) * coverage;

        debug!(region = %region, count, value, confidence, "conflict score computed");

        Ok(FactorScore {
            factor: Factor::Conflict,
            region: region.clone(),
            value,
            confidence,
            computed_at: extract.as_of,
            components,
        })
    }
}

impl FactorCalculator for ConflictCalculator {
    fn factor(&self) -> Factor {
        Factor::Conflict
    }

    fn compute(&self, region: &RegionId, extract: &SourceExtract) -> EngineResult<FactorScore> {
        match extract {
            SourceExtract::Conflict(e) => self.score(region, e),
            other => Err(wrong_extract(Factor::Conflict, region, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factors::ConflictEvent;
    use chrono::{DateTime, TimeZone, Utc};
    use gr_core::variables::EventType;

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap()
    }

    fn ev(days_ago: i64, event_type: EventType, fatalities: u32) -> ConflictEvent {
        ConflictEvent { occurred_at: as_of() - Duration::days(days_ago), event_type, fatalities }
    }

    fn region() -> RegionId {
        "SDN".parse().unwrap()
    }

    #[test]
    fn empty_window_scores_zero_with_baseline_confidence() {
        let calc = ConflictCalculator::default();
        let s = calc.score(&region(), &ConflictExtract { as_of: as_of(), events: vec![] }).unwrap();
        assert_eq!(s.value, 0.0);
        assert_eq!(s.confidence, 0.3);
        assert_eq!(s.components["event_count"], 0.0);
    }

    #[test]
    fn terms_saturate_and_clip() {
        let calc = ConflictCalculator::default();
        // 20 recent battles: severity 200/100 → 40, fatalities 500 → 40, all recent → trend 20.
        let events = (0..20).map(|i| ev(i % 10, EventType::Battles, 25)).collect();
        let s = calc.score(&region(), &ConflictExtract { as_of: as_of(), events }).unwrap();
        assert_eq!(s.value, 100.0);
        assert!((s.confidence - 1.0).abs() < 1e-12);
    }

    #[test]
    fn battles_outweigh_protests() {
        let calc = ConflictCalculator::default();
        let battles = (0..5).map(|i| ev(20 - i, EventType::Battles, 0)).collect();
        let protests = (0..5).map(|i| ev(20 - i, EventType::Protests, 0)).collect();
        let b = calc.score(&region(), &ConflictExtract { as_of: as_of(), events: battles }).unwrap();
        let p = calc.score(&region(), &ConflictExtract { as_of: as_of(), events: protests }).unwrap();
        assert!(b.value > p.value);
    }

    #[test]
    fn declining_activity_adds_no_trend() {
        let calc = ConflictCalculator::default();
        let events = vec![ev(25, EventType::Riots, 0), ev(24, EventType::Riots, 0), ev(2, EventType::Riots, 0)];
        let s = calc.score(&region(), &ConflictExtract { as_of: as_of(), events }).unwrap();
        assert!(s.components["trend_ratio"] < 0.0);
        // severity only: 15/100*40
        assert!((s.value - 6.0).abs() < 1e-9);
    }

    #[test]
    fn events_outside_window_are_ignored_and_future_events_rejected() {
        let calc = ConflictCalculator::default();
        let s = calc
            .score(&region(), &ConflictExtract { as_of: as_of(), events: vec![ev(45, EventType::Battles, 100)] })
            .unwrap();
        assert_eq!(s.value, 0.0);

        let err = calc
            .score(&region(), &ConflictExtract { as_of: as_of(), events: vec![ev(-1, EventType::Battles, 0)] })
            .unwrap_err();
        assert!(err.to_string().contains("events[0].occurred_at"));
    }
}
