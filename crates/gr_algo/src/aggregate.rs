//! Weighted composite aggregation with confidence discounting.
//!
//! contribution = value × weight; composite = Σ contribution / Σ weight;
//! confidence = Σ (confidence × weight) / Σ weight. Missing factors enter as
//! the neutral 50 with confidence 0. Reductions follow canonical factor order
//! so repeated calls are bit-identical.

use chrono::{DateTime, Utc};

use gr_core::{
    clamp_score, clamp_unit, CompositeScore, EngineError, EngineResult, ErrorContext, Factor,
    FactorContribution, FactorMap, FactorScore, RegionId, RiskLevel, WeightVector, NEUTRAL_SCORE,
};

fn check_weights(weights: &WeightVector) -> EngineResult<()> {
    if weights.is_normalized() {
        Ok(())
    } else {
        Err(EngineError::Invariant(format!(
            "aggregate called with un-normalized weights (sum = {})",
            weights.sum()
        )))
    }
}

/// Composite value for raw per-factor values. Used by the simulator's inner loop.
pub fn composite_value(values: &FactorMap<f64>, weights: &WeightVector) -> f64 {
    let total_w = weights.sum();
    if total_w <= 0.0 {
        return NEUTRAL_SCORE;
    }
    let acc: f64 = values.iter().map(|(f, v)| v * weights.get(f)).sum();
    clamp_score(acc / total_w)
}

pub fn aggregate(
    region: &RegionId,
    factor_scores: &[FactorScore],
    weights: &WeightVector,
) -> EngineResult<CompositeScore> {
    check_weights(weights)?;

    let mut slots: FactorMap<Option<&FactorScore>> = FactorMap::splat(None);
    for (i, s) in factor_scores.iter().enumerate() {
        let ctx = || ErrorContext::field(format!("factor_scores[{i}]")).with_factor(s.factor).with_region(region);
        if &s.region != region {
            return Err(EngineError::validation(ctx(), format!("score belongs to region {}", s.region)));
        }
        if !(s.value.is_finite() && (0.0..=100.0).contains(&s.value)) {
            return Err(EngineError::validation(ctx(), format!("value {} outside [0, 100]", s.value)));
        }
        if !(s.confidence.is_finite() && (0.0..=1.0).contains(&s.confidence)) {
            return Err(EngineError::validation(ctx(), format!("confidence {} outside [0, 1]", s.confidence)));
        }
        let slot = slots.get_mut(s.factor);
        if slot.is_some() {
            return Err(EngineError::validation(ctx(), "duplicate score for factor"));
        }
        *slot = Some(s);
    }

    let contributions: FactorMap<FactorContribution> = slots.map(|f: Factor, slot| {
        let weight = weights.get(f);
        let (raw_score, confidence, imputed) = match slot {
            Some(s) => (s.value, s.confidence, false),
            None => (NEUTRAL_SCORE, 0.0, true),
        };
        FactorContribution { raw_score, weight, weighted_contribution: raw_score * weight, confidence, imputed }
    });

    let total_w = weights.sum();
    let value_acc: f64 = contributions.iter().map(|(_, c)| c.weighted_contribution).sum();
    let conf_acc: f64 = contributions.iter().map(|(_, c)| c.confidence * c.weight).sum();
    let value = clamp_score(value_acc / total_w);
    let confidence = clamp_unit(conf_acc / total_w);

    let computed_at = factor_scores
        .iter()
        .map(|s| s.computed_at)
        .max()
        .unwrap_or_else(DateTime::<Utc>::default);

    Ok(CompositeScore {
        region: region.clone(),
        value,
        level: RiskLevel::from_score(value),
        factor_contributions: contributions,
        confidence,
        computed_at,
    })
}
