//! Sentiment factor from media-tone records.
//!
//! Sub-metrics (each on `[0, 100]` risk):
//! - tone: relevance-weighted mean tone, inverted from `[-10, 10]`
//! - coverage: article volume, saturating
//! - volatility: population std-dev of tone, saturating (needs two articles)
//!
//! Unavailable sub-metrics drop out and the rest are reweighted. Tones past
//! `[-10, 10]` are clamped; the raw extremes stay in `components`.

use std::collections::BTreeMap;

use tracing::debug;

use gr_core::variables::SentimentParams;
use gr_core::{
    clamp_score, EngineError, EngineResult, ErrorContext, Factor, FactorScore, RegionId, NEUTRAL_SCORE,
};

use super::{wrong_extract, FactorCalculator, SentimentExtract, SourceExtract};
use crate::stats;

const TONE_MIN: f64 = -10.0;
const TONE_MAX: f64 = 10.0;

#[derive(Debug, Clone, Default)]
pub struct SentimentCalculator {
    params: SentimentParams,
}

impl SentimentCalculator {
    pub fn new(params: SentimentParams) -> Self {
        Self { params }
    }

    pub fn score(&self, region: &RegionId, extract: &SentimentExtract) -> EngineResult<FactorScore> {
        let p = &self.params;
        for (i, a) in extract.articles.iter().enumerate() {
            let ctx = || ErrorContext::field(format!("articles[{i}]")).with_factor(Factor::Sentiment).with_region(region);
            if !a.tone.is_finite() {
                return Err(EngineError::validation(ctx(), format!("tone {} is not finite", a.tone)));
            }
            if !(a.relevance.is_finite() && (0.0..=1.0).contains(&a.relevance)) {
                return Err(EngineError::validation(ctx(), format!("relevance {} outside [0, 1]", a.relevance)));
            }
        }

        let n = extract.articles.len();
        let mut components = BTreeMap::new();
        components.insert("article_count".to_string(), n as f64);

        if n == 0 {
            debug!(region = %region, "no articles; neutral sentiment");
            return Ok(FactorScore::neutral(Factor::Sentiment, region.clone(), extract.as_of));
        }

        let clamped = extract.articles.iter().filter(|a| !(TONE_MIN..=TONE_MAX).contains(&a.tone)).count();
        if clamped > 0 {
            let raw_min = extract.articles.iter().map(|a| a.tone).fold(f64::INFINITY, f64::min);
            let raw_max = extract.articles.iter().map(|a| a.tone).fold(f64::NEG_INFINITY, f64::max);
            components.insert("clamped_tones".to_string(), clamped as f64);
            components.insert("raw_tone_min".to_string(), raw_min);
            components.insert("raw_tone_max".to_string(), raw_max);
            debug!(region = %region, clamped, raw_min, raw_max, "tones outside nominal range clamped");
        }

        let tones: Vec<f64> = extract.articles.iter().map(|a| a.tone.clamp(TONE_MIN, TONE_MAX)).collect();
        let relevance_total: f64 = extract.articles.iter().map(|a| a.relevance).sum();
        let avg_tone = if relevance_total > 0.0 {
            tones.iter().zip(&extract.articles).map(|(t, a)| t * a.relevance).sum::<f64>() / relevance_total
        } else {
            stats::mean(&tones).unwrap_or(0.0)
        };
        components.insert("avg_tone".to_string(), avg_tone);

        // (sub-metric risk, weight); None when the sub-metric has no support.
        let tone_risk = (TONE_MAX - avg_tone) / (TONE_MAX - TONE_MIN) * 100.0;
        let coverage = (n as f64 / f64::from(p.coverage_saturation)).min(1.0) * 100.0;
        let volatility = if n >= 2 {
            stats::std_dev(&tones).map(|sd| {
                components.insert("tone_std_dev".to_string(), sd);
                (sd / p.volatility_saturation).min(1.0) * 100.0
            })
        } else {
            None
        };

        let subs = [
            ("tone_risk", Some(tone_risk), p.tone_weight),
            ("coverage_intensity", Some(coverage), p.coverage_weight),
            ("volatility", volatility, p.volatility_weight),
        ];

        let total_weight: f64 = subs.iter().map(|(_, _, w)| w).sum();
        let mut used_weight = 0.0;
        let mut acc = 0.0;
        for (name, v, w) in subs {
            if let Some(v) = v {
                components.insert(name.to_string(), v);
                acc += v * w;
                used_weight += w;
            }
        }

        let value = if used_weight > 0.0 { clamp_score(acc / used_weight) } else { NEUTRAL_SCORE };
        let availability = if total_weight > 0.0 { used_weight / total_weight } else { 0.0 };
        let confidence = (n as f64 / f64::from(p.full_confidence_articles)).min(1.0) * availability;

        debug!(region = %region, n, value, confidence, "sentiment score computed");

        Ok(FactorScore {
            factor: Factor::Sentiment,
            region: region.clone(),
            value,
            confidence,
            computed_at: extract.as_of,
            components,
        })
    }
}

impl FactorCalculator for SentimentCalculator {
    fn factor(&self) -> Factor {
        Factor::Sentiment
    }

    fn compute(&self, region: &RegionId, extract: &SourceExtract) -> EngineResult<FactorScore> {
        match extract {
            SourceExtract::Sentiment(e) => self.score(region, e),
            other => Err(wrong_extract(Factor::Sentiment, region, other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factors::Article;
    use chrono::{DateTime, TimeZone, Utc};

    fn as_of() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
    }

    fn art(tone: f64) -> Article {
        Article { published_at: as_of(), tone, relevance: 1.0 }
    }

    fn region() -> RegionId {
        "IRN".parse().unwrap()
    }

    #[test]
    fn no_articles_is_neutral_with_zero_confidence() {
        let s = SentimentCalculator::default()
            .score(&region(), &SentimentExtract { as_of: as_of(), articles: vec![] })
            .unwrap();
        assert_eq!(s.value, 50.0);
        assert_eq!(s.confidence, 0.0);
    }

    #[test]
    fn hostile_tone_scores_higher_than_friendly() {
        let calc = SentimentCalculator::default();
        let hostile = calc
            .score(&region(), &SentimentExtract { as_of: as_of(), articles: vec![art(-8.0); 10] })
            .unwrap();
        let friendly = calc
            .score(&region(), &SentimentExtract { as_of: as_of(), articles: vec![art(8.0); 10] })
            .unwrap();
        assert!(hostile.value > friendly.value);
        assert!((hostile.components["tone_risk"] - 90.0).abs() < 1e-9);
    }

    #[test]
    fn single_article_drops_volatility_and_confidence() {
        let s = SentimentCalculator::default()
            .score(&region(), &SentimentExtract { as_of: as_of(), articles: vec![art(0.0)] })
            .unwrap();
        assert!(!s.components.contains_key("volatility"));
        // tone 50 (w .6) and coverage 1 (w .2) reweighted over .8
        assert!((s.value - (50.0 * 0.6 + 1.0 * 0.2) / 0.8).abs() < 1e-9);
        // 1/50 articles × 0.8 availability
        assert!((s.confidence - 0.016).abs() < 1e-12);
    }

    #[test]
    fn relevance_weights_the_tone_average() {
        let mut low = art(10.0);
        low.relevance = 0.0;
        let s = SentimentCalculator::default()
            .score(&region(), &SentimentExtract { as_of: as_of(), articles: vec![art(-10.0), low] })
            .unwrap();
        assert_eq!(s.components["avg_tone"], -10.0);
    }

    #[test]
    fn tone_past_nominal_range_is_clamped() {
        let s = SentimentCalculator::default()
            .score(&region(), &SentimentExtract { as_of: as_of(), articles: vec![art(-10.4)] })
            .unwrap();
        assert_eq!(s.components["avg_tone"], -10.0);
        assert_eq!(s.components["tone_risk"], 100.0);
        assert_eq!(s.components["raw_tone_min"], -10.4);
        assert_eq!(s.components["clamped_tones"], 1.0);
        assert!(s.value <= 100.0);
    }

    #[test]
    fn non_finite_tone_is_a_validation_error() {
        let err = SentimentCalculator::default()
            .score(&region(), &SentimentExtract { as_of: as_of(), articles: vec![art(0.0), art(f64::NAN)] })
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation { .. }));
        assert!(err.to_string().contains("articles[1]"));
    }
}
