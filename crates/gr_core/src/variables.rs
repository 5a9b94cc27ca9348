//! Engine parameters with safe defaults.
//!
//! Every knob the calculators, simulator and alert evaluator read lives here.
//! `EngineConfig` deserializes with per-field defaults and refuses unknown keys;
//! `validate()` enforces domains and cross-field consistency after loading.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::alerts::AlertSeverity;
use crate::errors::{EngineError, ErrorContext};
use crate::factors::FactorMap;

/// ------------ Conflict ------------

/// Armed-conflict event categories, as reported by event feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Battles,
    ExplosionsRemoteViolence,
    ViolenceAgainstCivilians,
    Riots,
    Protests,
    StrategicDevelopments,
    Other,
}

/// Severity weight per event type (battles heaviest, protests lightest).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EventWeights {
    pub battles: f64,
    pub explosions_remote_violence: f64,
    pub violence_against_civilians: f64,
    pub riots: f64,
    pub protests: f64,
    pub strategic_developments: f64,
    pub other: f64,
}

impl Default for EventWeights {
    fn default() -> Self {
        Self {
            battles: 10.0,
            explosions_remote_violence: 8.0,
            violence_against_civilians: 9.0,
            riots: 5.0,
            protests: 3.0,
            strategic_developments: 2.0,
            other: 5.0,
        }
    }
}

impl EventWeights {
    pub fn weight(&self, kind: EventType) -> f64 {
        match kind {
            EventType::Battles => self.battles,
            EventType::ExplosionsRemoteViolence => self.explosions_remote_violence,
            EventType::ViolenceAgainstCivilians => self.violence_against_civilians,
            EventType::Riots => self.riots,
            EventType::Protests => self.protests,
            EventType::StrategicDevelopments => self.strategic_developments,
            EventType::Other => self.other,
        }
    }

    fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> {
        [
            ("battles", self.battles),
            ("explosions_remote_violence", self.explosions_remote_violence),
            ("violence_against_civilians", self.violence_against_civilians),
            ("riots", self.riots),
            ("protests", self.protests),
            ("strategic_developments", self.strategic_developments),
            ("other", self.other),
        ]
        .into_iter()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConflictParams {
    /// Window ending at `as_of`; older events are ignored.
    pub lookback_days: u32,
    pub event_weights: EventWeights,
    /// Weighted event mass at which the severity term saturates.
    pub severity_saturation: f64,
    /// Fatalities at which the fatality term saturates.
    pub fatality_saturation: f64,
    /// Maximum points each term contributes; the three sum to 100.
    pub severity_points: f64,
    pub fatality_points: f64,
    pub trend_points: f64,
    /// Event count at which confidence reaches 1.0.
    pub full_confidence_events: u32,
    /// Confidence reported for an empty (but valid) extract.
    pub empty_confidence: f64,
}

impl Default for ConflictParams {
    fn default() -> Self {
        Self {
            lookback_days: 30,
            event_weights: EventWeights::default(),
            severity_saturation: 100.0,
            fatality_saturation: 100.0,
            severity_points: 40.0,
            fatality_points: 40.0,
            trend_points: 20.0,
            full_confidence_events: 20,
            empty_confidence: 0.3,
        }
    }
}

/// ------------ Sentiment ------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SentimentParams {
    pub tone_weight: f64,
    pub coverage_weight: f64,
    pub volatility_weight: f64,
    /// Article count at which coverage intensity saturates.
    pub coverage_saturation: u32,
    /// Tone std-dev at which the volatility sub-metric saturates.
    pub volatility_saturation: f64,
    pub full_confidence_articles: u32,
}

impl Default for SentimentParams {
    fn default() -> Self {
        Self {
            tone_weight: 0.6,
            coverage_weight: 0.2,
            volatility_weight: 0.2,
            coverage_saturation: 100,
            volatility_saturation: 5.0,
            full_confidence_articles: 50,
        }
    }
}

/// ------------ Governance ------------

/// Worldwide-governance style indicators on `[-2.5, 2.5]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GovernanceIndicator {
    VoiceAccountability,
    PoliticalStability,
    GovernmentEffectiveness,
    RegulatoryQuality,
    RuleOfLaw,
    ControlOfCorruption,
}

impl GovernanceIndicator {
    pub const fn as_str(self) -> &'static str {
        match self {
            GovernanceIndicator::VoiceAccountability => "voice_accountability",
            GovernanceIndicator::PoliticalStability => "political_stability",
            GovernanceIndicator::GovernmentEffectiveness => "government_effectiveness",
            GovernanceIndicator::RegulatoryQuality => "regulatory_quality",
            GovernanceIndicator::RuleOfLaw => "rule_of_law",
            GovernanceIndicator::ControlOfCorruption => "control_of_corruption",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GovernanceParams {
    /// Indicators expected for the political factor.
    pub political: Vec<GovernanceIndicator>,
    /// Indicators expected for the economic factor.
    pub economic: Vec<GovernanceIndicator>,
    /// Observations older than this many years (relative to `as_of`) count as missing.
    pub max_age_years: Option<u32>,
}

impl Default for GovernanceParams {
    fn default() -> Self {
        Self {
            political: vec![
                GovernanceIndicator::VoiceAccountability,
                GovernanceIndicator::PoliticalStability,
                GovernanceIndicator::RuleOfLaw,
                GovernanceIndicator::ControlOfCorruption,
            ],
            economic: vec![
                GovernanceIndicator::GovernmentEffectiveness,
                GovernanceIndicator::RegulatoryQuality,
            ],
            max_age_years: None,
        }
    }
}

/// ------------ Simulation ------------

/// Shape of the impact decay between day 0 (full impact) and `duration_days` (~0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecayCurve {
    /// `1 - d / duration`.
    Linear,
    /// `exp(-ln(100) · d / duration)`, i.e. 1% left at the end.
    Exponential,
}

impl DecayCurve {
    /// Multiplier in `[0, 1]`, non-increasing in `day`.
    pub fn factor(self, day: u32, duration_days: u32) -> f64 {
        if duration_days == 0 {
            return 0.0;
        }
        let t = (f64::from(day) / f64::from(duration_days)).clamp(0.0, 1.0);
        match self {
            DecayCurve::Linear => 1.0 - t,
            DecayCurve::Exponential => (-(100f64.ln()) * t).exp(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationParams {
    pub default_iterations: u32,
    pub min_iterations: u32,
    pub max_iterations: u32,
    /// Seed used when the caller supplies none.
    pub default_seed: u64,
    /// σ of the Normal(1.0, σ) noise multiplier.
    pub noise_std_dev: f64,
    pub decay: DecayCurve,
    /// Share of the direct perturbation applied to spillover regions.
    pub spillover_fraction: f64,
    pub timeline_step_days: u32,
    /// Longest scenario `simulate` accepts.
    pub max_duration_days: u32,
}

/// Hard bounds for the configurable iteration range.
pub const ITERATION_FLOOR: u32 = 100;
pub const ITERATION_CEILING: u32 = 100_000;

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            default_iterations: 1000,
            min_iterations: 100,
            max_iterations: 100_000,
            default_seed: 0,
            noise_std_dev: 0.15,
            decay: DecayCurve::Linear,
            spillover_fraction: 0.3,
            timeline_step_days: 30,
            max_duration_days: 3650,
        }
    }
}

/// ------------ Alerts ------------

/// Minimum relative change (percent) for each change-alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeverityBands {
    pub medium: f64,
    pub high: f64,
    pub critical: f64,
}

impl Default for SeverityBands {
    fn default() -> Self {
        Self { medium: 15.0, high: 25.0, critical: 40.0 }
    }
}

impl SeverityBands {
    pub fn classify(&self, change_pct: f64) -> AlertSeverity {
        if change_pct >= self.critical {
            AlertSeverity::Critical
        } else if change_pct >= self.high {
            AlertSeverity::High
        } else if change_pct >= self.medium {
            AlertSeverity::Medium
        } else {
            AlertSeverity::Low
        }
    }
}

/// An absolute composite level that raises a breach alert when crossed from below.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BreachLevel {
    pub level: f64,
    pub severity: AlertSeverity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlertThresholds {
    /// Relative change (percent) that triggers a change alert.
    pub change_pct: f64,
    /// Optional absolute trigger in score points, checked alongside `change_pct`.
    pub min_change_points: Option<f64>,
    pub bands: SeverityBands,
    pub breach_levels: Vec<BreachLevel>,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            change_pct: 15.0,
            min_change_points: None,
            bands: SeverityBands::default(),
            breach_levels: vec![
                BreachLevel { level: 70.0, severity: AlertSeverity::High },
                BreachLevel { level: 85.0, severity: AlertSeverity::Critical },
            ],
        }
    }
}

/// ------------ Weights ------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeightsConfig {
    /// Preset applied at engine start.
    pub active: String,
    /// Extra presets registered on top of the built-ins (raw, normalized at registration).
    pub presets: BTreeMap<String, FactorMap<f64>>,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self { active: "balanced".to_string(), presets: BTreeMap::new() }
    }
}

/// ------------ Root ------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub conflict: ConflictParams,
    pub sentiment: SentimentParams,
    pub governance: GovernanceParams,
    pub simulation: SimulationParams,
    pub alerts: AlertThresholds,
    pub weights: WeightsConfig,
}

/// -------- Validation (domain + cross-field consistency) --------

fn domain(field: impl Into<String>, reason: impl Into<String>) -> EngineError {
    EngineError::validation(ErrorContext::field(field), reason)
}

fn check_non_negative(field: &str, v: f64) -> Result<(), EngineError> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(domain(field, format!("must be finite and >= 0, got {v}")))
    }
}

fn check_positive(field: &str, v: f64) -> Result<(), EngineError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(domain(field, format!("must be finite and > 0, got {v}")))
    }
}

fn check_unit(field: &str, v: f64) -> Result<(), EngineError> {
    if v.is_finite() && (0.0..=1.0).contains(&v) {
        Ok(())
    } else {
        Err(domain(field, format!("must be in [0, 1], got {v}")))
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        // conflict
        let c = &self.conflict;
        if c.lookback_days == 0 {
            return Err(domain("conflict.lookback_days", "must be > 0"));
        }
        for (name, w) in c.event_weights.iter() {
            check_non_negative(&format!("conflict.event_weights.{name}"), w)?;
        }
        check_positive("conflict.severity_saturation", c.severity_saturation)?;
        check_positive("conflict.fatality_saturation", c.fatality_saturation)?;
        check_non_negative("conflict.severity_points", c.severity_points)?;
        check_non_negative("conflict.fatality_points", c.fatality_points)?;
        check_non_negative("conflict.trend_points", c.trend_points)?;
        let total = c.severity_points + c.fatality_points + c.trend_points;
        if total > 100.0 + 1e-9 {
            return Err(domain("conflict", format!("term points sum to {total}, above 100")));
        }
        if c.full_confidence_events == 0 {
            return Err(domain("conflict.full_confidence_events", "must be > 0"));
        }
        check_unit("conflict.empty_confidence", c.empty_confidence)?;

        // sentiment
        let s = &self.sentiment;
        check_non_negative("sentiment.tone_weight", s.tone_weight)?;
        check_non_negative("sentiment.coverage_weight", s.coverage_weight)?;
        check_non_negative("sentiment.volatility_weight", s.volatility_weight)?;
        if s.tone_weight + s.coverage_weight + s.volatility_weight <= 0.0 {
            return Err(domain("sentiment", "sub-metric weights are all zero"));
        }
        if s.coverage_saturation == 0 {
            return Err(domain("sentiment.coverage_saturation", "must be > 0"));
        }
        check_positive("sentiment.volatility_saturation", s.volatility_saturation)?;
        if s.full_confidence_articles == 0 {
            return Err(domain("sentiment.full_confidence_articles", "must be > 0"));
        }

        // governance
        if self.governance.political.is_empty() {
            return Err(domain("governance.political", "at least one indicator expected"));
        }
        if self.governance.economic.is_empty() {
            return Err(domain("governance.economic", "at least one indicator expected"));
        }

        // simulation
        let m = &self.simulation;
        if m.min_iterations < ITERATION_FLOOR || m.max_iterations > ITERATION_CEILING || m.min_iterations > m.max_iterations {
            return Err(domain(
                "simulation.min_iterations",
                format!(
                    "need {ITERATION_FLOOR} <= min <= max <= {ITERATION_CEILING}, got {}..{}",
                    m.min_iterations, m.max_iterations
                ),
            ));
        }
        if !(m.min_iterations..=m.max_iterations).contains(&m.default_iterations) {
            return Err(domain(
                "simulation.default_iterations",
                format!("{} outside [{}, {}]", m.default_iterations, m.min_iterations, m.max_iterations),
            ));
        }
        check_non_negative("simulation.noise_std_dev", m.noise_std_dev)?;
        check_unit("simulation.spillover_fraction", m.spillover_fraction)?;
        if m.timeline_step_days == 0 {
            return Err(domain("simulation.timeline_step_days", "must be > 0"));
        }
        if m.max_duration_days == 0 {
            return Err(domain("simulation.max_duration_days", "must be > 0"));
        }

        // alerts
        let a = &self.alerts;
        check_positive("alerts.change_pct", a.change_pct)?;
        if let Some(p) = a.min_change_points {
            check_positive("alerts.min_change_points", p)?;
        }
        let b = &a.bands;
        check_non_negative("alerts.bands.medium", b.medium)?;
        if !(b.medium < b.high && b.high < b.critical) || !b.critical.is_finite() {
            return Err(domain(
                "alerts.bands",
                format!("must ascend medium < high < critical, got {}/{}/{}", b.medium, b.high, b.critical),
            ));
        }
        for (i, lvl) in a.breach_levels.iter().enumerate() {
            if !(lvl.level.is_finite() && (0.0..=100.0).contains(&lvl.level)) {
                return Err(domain(format!("alerts.breach_levels[{i}].level"), format!("{} outside [0, 100]", lvl.level)));
            }
        }

        // weights
        if self.weights.active.trim().is_empty() {
            return Err(domain("weights.active", "must name a preset"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_json_fills_defaults_and_rejects_unknown_keys() {
        let cfg: EngineConfig =
            serde_json::from_str(r#"{"simulation":{"noise_std_dev":0.2}}"#).unwrap();
        assert_eq!(cfg.simulation.noise_std_dev, 0.2);
        assert_eq!(cfg.simulation.default_iterations, 1000);
        assert_eq!(cfg.alerts.bands.high, 25.0);

        assert!(serde_json::from_str::<EngineConfig>(r#"{"cache":{}}"#).is_err());
    }

    #[test]
    fn validate_catches_bad_domains() {
        let mut cfg = EngineConfig::default();
        cfg.simulation.noise_std_dev = -0.1;
        assert!(cfg.validate().is_err());

        let mut cfg = EngineConfig::default();
        cfg.alerts.bands = SeverityBands { medium: 30.0, high: 25.0, critical: 40.0 };
        assert!(cfg.validate().is_err());

        let mut cfg = EngineConfig::default();
        cfg.simulation.spillover_fraction = 1.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn iteration_range_can_narrow_but_not_widen() {
        let mut cfg = EngineConfig::default();
        cfg.simulation.min_iterations = 500;
        cfg.simulation.max_iterations = 5_000;
        assert!(cfg.validate().is_ok());

        let mut cfg = EngineConfig::default();
        cfg.simulation.min_iterations = 10;
        cfg.simulation.default_iterations = 10;
        assert!(cfg.validate().is_err());

        let mut cfg = EngineConfig::default();
        cfg.simulation.max_iterations = 1_000_000;
        assert!(cfg.validate().is_err());

        let mut cfg = EngineConfig::default();
        cfg.simulation.max_duration_days = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn decay_is_non_increasing_and_ends_near_zero() {
        for curve in [DecayCurve::Linear, DecayCurve::Exponential] {
            let mut prev = f64::INFINITY;
            for d in 0..=90 {
                let f = curve.factor(d, 90);
                assert!(f <= prev);
                prev = f;
            }
            assert_eq!(curve.factor(0, 90), 1.0);
            assert!(curve.factor(90, 90) <= 0.01 + 1e-12);
        }
    }

    #[test]
    fn bands_classify() {
        let b = SeverityBands::default();
        assert_eq!(b.classify(15.4), AlertSeverity::Medium);
        assert_eq!(b.classify(39.7), AlertSeverity::High);
        assert_eq!(b.classify(40.0), AlertSeverity::Critical);
        assert_eq!(b.classify(3.0), AlertSeverity::Low);
    }
}
