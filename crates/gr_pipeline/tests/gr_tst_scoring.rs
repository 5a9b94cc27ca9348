//! End-to-end scoring: worked composite examples, missing data, batch isolation.

use chrono::{DateTime, Duration, TimeZone, Utc};

use gr_algo::factors::{Article, ConflictEvent, IndicatorObservation};
use gr_algo::{aggregate, ConflictExtract, GovernanceExtract, SentimentExtract};
use gr_core::variables::{EventType, GovernanceIndicator};
use gr_core::{EngineError, Factor, FactorMap, FactorScore, RegionId, RiskLevel, WeightVector};
use gr_pipeline::engine::batch_failures;
use gr_pipeline::{RegionInputs, RiskEngine};

fn rid(s: &str) -> RegionId {
    s.parse().unwrap()
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap()
}

fn fs(region: &RegionId, factor: Factor, value: f64, confidence: f64) -> FactorScore {
    FactorScore {
        factor,
        region: region.clone(),
        value,
        confidence,
        computed_at: t0(),
        components: Default::default(),
    }
}

fn ukr_scores(confidence: f64) -> Vec<FactorScore> {
    let ukr = rid("UKR");
    vec![
        fs(&ukr, Factor::Conflict, 92.0, 1.0),
        fs(&ukr, Factor::Sentiment, 75.0, confidence),
        fs(&ukr, Factor::Political, 68.0, 1.0),
        fs(&ukr, Factor::Economic, 65.0, 1.0),
    ]
}

fn battles(n: usize, as_of: DateTime<Utc>) -> ConflictExtract {
    let events = (0..n)
        .map(|i| ConflictEvent {
            occurred_at: as_of - Duration::days((i % 28) as i64),
            event_type: EventType::Battles,
            fatalities: 5,
        })
        .collect();
    ConflictExtract { as_of, events }
}

#[test]
fn ukraine_balanced_is_75_high() {
    let c = aggregate(&rid("UKR"), &ukr_scores(1.0), &WeightVector::balanced()).unwrap();
    assert_eq!(c.value, 75.0);
    assert_eq!(c.level, RiskLevel::High);
    assert_eq!(c.primary_factor(), Factor::Conflict);
}

#[test]
fn level_boundaries_are_exact() {
    assert_eq!(RiskLevel::from_score(60.0), RiskLevel::Elevated);
    assert_eq!(RiskLevel::from_score(60.0001), RiskLevel::High);
}

#[test]
fn aggregate_is_bit_identical_across_calls() {
    let w = WeightVector::normalize(FactorMap::new(0.3, 0.2, 0.1, 0.4)).unwrap();
    let a = aggregate(&rid("UKR"), &ukr_scores(0.7), &w).unwrap();
    let b = aggregate(&rid("UKR"), &ukr_scores(0.7), &w).unwrap();
    assert_eq!(a.value.to_bits(), b.value.to_bits());
    assert_eq!(a, b);
}

#[test]
fn zero_confidence_lowers_composite_confidence() {
    let full = aggregate(&rid("UKR"), &ukr_scores(1.0), &WeightVector::balanced()).unwrap();
    let partial = aggregate(&rid("UKR"), &ukr_scores(0.0), &WeightVector::balanced()).unwrap();
    assert!(partial.confidence < full.confidence);
    assert_eq!(partial.value, full.value);
}

#[test]
fn negative_weight_is_rejected() {
    let err = WeightVector::normalize(FactorMap::new(-0.1, 0.4, 0.4, 0.3)).unwrap_err();
    assert!(matches!(err, EngineError::InvalidWeight { .. }));

    let mut engine = RiskEngine::default();
    let before = engine.weights().current();
    assert!(engine.weights_mut().set_weights(FactorMap::splat(0.0)).is_err());
    assert_eq!(engine.weights().current(), before);
}

#[test]
fn sentiment_only_region_imputes_the_rest() {
    let engine = RiskEngine::default();
    let inputs = RegionInputs::new(rid("CHL")).with_sentiment(SentimentExtract { as_of: t0(), articles: vec![] });
    let a = engine.score_region(&inputs).unwrap();
    assert_eq!(a.factor_scores.len(), 1);
    assert_eq!(a.composite.value, 50.0);
    assert_eq!(a.composite.confidence, 0.0);
    assert_eq!(a.composite.computed_at, t0());
    let imputed: Vec<Factor> =
        a.composite.factor_contributions.iter().filter(|(_, c)| c.imputed).map(|(f, _)| f).collect();
    assert_eq!(imputed, vec![Factor::Conflict, Factor::Political, Factor::Economic]);
}

#[test]
fn batch_keeps_order_and_isolates_failures() {
    let engine = RiskEngine::default();
    let broken = RegionInputs::new(rid("ZZZ")).with_sentiment(SentimentExtract {
        as_of: t0(),
        articles: vec![Article { published_at: t0(), tone: 0.0, relevance: 3.0 }],
    });
    let inputs = vec![
        RegionInputs::new(rid("SYR")).with_conflict(battles(40, t0())),
        broken,
        RegionInputs::new(rid("NOR")),
    ];

    let entries = engine.score_batch(&inputs);
    let order: Vec<&str> = entries.iter().map(|e| e.region.as_str()).collect();
    assert_eq!(order, vec!["SYR", "ZZZ", "NOR"]);

    let failures = batch_failures(&entries);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0.as_str(), "ZZZ");
    assert!(matches!(failures[0].1, EngineError::Validation { .. }));

    let syr = entries[0].outcome.as_ref().unwrap();
    let nor = entries[2].outcome.as_ref().unwrap();
    assert!(syr.composite.raw_scores().conflict > 0.0);
    assert!(syr.composite.confidence > nor.composite.confidence);
}

#[test]
fn provider_values_past_nominal_ranges_still_score() {
    let engine = RiskEngine::default();
    let inputs = vec![
        RegionInputs::new(rid("SOM")).with_sentiment(SentimentExtract {
            as_of: t0(),
            articles: vec![Article { published_at: t0(), tone: -10.4, relevance: 1.0 }],
        }),
        RegionInputs::new(rid("DNK")).with_governance(GovernanceExtract {
            as_of: t0(),
            observations: vec![IndicatorObservation {
                indicator: GovernanceIndicator::ControlOfCorruption,
                year: 2023,
                value: 2.52,
            }],
        }),
    ];
    let entries = engine.score_batch(&inputs);
    assert!(batch_failures(&entries).is_empty());

    let som = entries[0].outcome.as_ref().unwrap();
    assert_eq!(som.factor_scores[0].components["raw_tone_min"], -10.4);
    let dnk = entries[1].outcome.as_ref().unwrap();
    assert_eq!(dnk.factor_scores[0].value, 0.0);
    assert!(dnk.composite.value <= 100.0 && dnk.composite.value >= 0.0);
}

#[test]
fn batch_matches_sequential_scoring() {
    let engine = RiskEngine::default();
    let inputs: Vec<RegionInputs> = ["AAA", "BBB", "CCC", "DDD"]
        .iter()
        .enumerate()
        .map(|(i, r)| RegionInputs::new(rid(r)).with_conflict(battles(5 * (i + 1), t0())))
        .collect();
    let batch = engine.score_batch(&inputs);
    for (entry, input) in batch.iter().zip(&inputs) {
        let solo = engine.score_region(input).unwrap();
        assert_eq!(entry.outcome.as_ref().unwrap(), &solo);
    }
}

#[test]
fn assessment_serializes_with_lowercase_enums() {
    let engine = RiskEngine::default();
    let a = engine.score_region(&RegionInputs::new(rid("PER"))).unwrap();
    let json = serde_json::to_value(&a).unwrap();
    assert_eq!(json["composite"]["level"], "elevated");
    assert_eq!(json["region"], "PER");
}
