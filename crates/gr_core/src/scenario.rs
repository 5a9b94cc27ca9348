//! Scenario definitions for what-if simulation.
//!
//! A `Scenario` is built (and validated) through `ScenarioBuilder`, which is
//! also its wire form. Once built it is immutable; `Scenario::revise` hands
//! back a builder for the next version.

use std::collections::{BTreeMap, BTreeSet};

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::entities::clamp_unit;
use crate::errors::{EngineError, ErrorContext};
use crate::factors::{Factor, FactorMap};
use crate::ids::RegionId;

// ------------------------------------------------------------------------------------------------
// Severity
// ------------------------------------------------------------------------------------------------

/// Scenario severity on `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Severity(f64);

impl Severity {
    pub fn new(v: f64) -> Result<Self, EngineError> {
        if v.is_finite() && (0.0..=1.0).contains(&v) {
            Ok(Severity(v))
        } else {
            Err(EngineError::validation(
                ErrorContext::field("severity"),
                format!("{v} outside [0, 1]"),
            ))
        }
    }

    /// Map the operator-facing 1–10 scale onto `[0.1, 1.0]`.
    pub fn from_ten_point(v: f64) -> Result<Self, EngineError> {
        if v.is_finite() && (1.0..=10.0).contains(&v) {
            Ok(Severity(v / 10.0))
        } else {
            Err(EngineError::validation(
                ErrorContext::field("severity"),
                format!("{v} outside the 1-10 scale"),
            ))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Severity {
    type Error = EngineError;
    fn try_from(v: f64) -> Result<Self, Self::Error> {
        Severity::new(v)
    }
}

impl From<Severity> for f64 {
    fn from(s: Severity) -> Self {
        s.0
    }
}

// ------------------------------------------------------------------------------------------------
// Impact deltas
// ------------------------------------------------------------------------------------------------

/// Signed per-factor impact in score points. Factors left out carry no impact.
///
/// On input, keys that are not factor ids are dropped with a warning rather
/// than failing the whole scenario.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct ImpactDeltas(FactorMap<f64>);

impl ImpactDeltas {
    pub fn new(deltas: FactorMap<f64>) -> Self {
        ImpactDeltas(deltas)
    }

    /// Build from string-keyed pairs; returns the deltas and the ignored keys.
    pub fn from_named<'a, I>(pairs: I) -> (Self, Vec<String>)
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut deltas = FactorMap::splat(0.0);
        let mut ignored = Vec::new();
        for (key, value) in pairs {
            match key.parse::<Factor>() {
                Ok(factor) => deltas.set(factor, value),
                Err(_) => {
                    warn!(factor_id = key, value, "ignoring impact delta for unknown factor id");
                    ignored.push(key.to_string());
                }
            }
        }
        (ImpactDeltas(deltas), ignored)
    }

    pub fn get(&self, factor: Factor) -> f64 {
        *self.0.get(factor)
    }

    pub fn as_map(&self) -> &FactorMap<f64> {
        &self.0
    }

    /// Factors with a non-zero delta, canonical order.
    pub fn active(&self) -> impl Iterator<Item = (Factor, f64)> + '_ {
        self.0.iter().filter(|(_, &d)| d != 0.0).map(|(f, &d)| (f, d))
    }
}

impl<'de> Deserialize<'de> for ImpactDeltas {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        struct DeltaVisitor;

        impl<'de> Visitor<'de> for DeltaVisitor {
            type Value = ImpactDeltas;

            fn expecting(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                f.write_str("a map of factor id to signed score delta")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut raw: BTreeMap<String, f64> = BTreeMap::new();
                while let Some((k, v)) = map.next_entry::<String, f64>()? {
                    raw.insert(k, v);
                }
                let (deltas, _ignored) = ImpactDeltas::from_named(raw.iter().map(|(k, v)| (k.as_str(), *v)));
                Ok(deltas)
            }
        }

        d.deserialize_map(DeltaVisitor)
    }
}

// ------------------------------------------------------------------------------------------------
// Scenario
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ScenarioBuilder")]
pub struct Scenario {
    id: String,
    version: u32,
    name: String,
    trigger_description: String,
    affected_regions: BTreeSet<RegionId>,
    spillover_regions: BTreeSet<RegionId>,
    severity: Severity,
    duration_days: u32,
    impact_deltas: ImpactDeltas,
    #[serde(skip_serializing_if = "Option::is_none")]
    probability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    spillover_fraction: Option<f64>,
}

impl Scenario {
    pub fn builder(id: impl Into<String>, name: impl Into<String>) -> ScenarioBuilder {
        ScenarioBuilder {
            id: id.into(),
            name: name.into(),
            ..ScenarioBuilder::default()
        }
    }

    /// Start the next version of this scenario.
    pub fn revise(&self) -> ScenarioBuilder {
        ScenarioBuilder {
            id: self.id.clone(),
            version: self.version.saturating_add(1),
            name: self.name.clone(),
            trigger_description: self.trigger_description.clone(),
            affected_regions: self.affected_regions.clone(),
            spillover_regions: self.spillover_regions.clone(),
            severity: self.severity.value(),
            duration_days: self.duration_days,
            impact_deltas: self.impact_deltas,
            probability: self.probability,
            spillover_fraction: self.spillover_fraction,
        }
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn version(&self) -> u32 { self.version }
    pub fn name(&self) -> &str { &self.name }
    pub fn trigger_description(&self) -> &str { &self.trigger_description }
    pub fn affected_regions(&self) -> &BTreeSet<RegionId> { &self.affected_regions }
    /// Linked regions receiving a fractional share of the impact. Never overlaps `affected_regions`.
    pub fn spillover_regions(&self) -> &BTreeSet<RegionId> { &self.spillover_regions }
    pub fn severity(&self) -> Severity { self.severity }
    pub fn duration_days(&self) -> u32 { self.duration_days }
    pub fn impact_deltas(&self) -> &ImpactDeltas { &self.impact_deltas }
    pub fn probability(&self) -> Option<f64> { self.probability }
    pub fn spillover_fraction(&self) -> Option<f64> { self.spillover_fraction }
}

/// Mutable draft of a scenario; also the JSON shape of one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioBuilder {
    pub id: String,
    pub version: u32,
    pub name: String,
    pub trigger_description: String,
    pub affected_regions: BTreeSet<RegionId>,
    pub spillover_regions: BTreeSet<RegionId>,
    pub severity: f64,
    pub duration_days: u32,
    pub impact_deltas: ImpactDeltas,
    pub probability: Option<f64>,
    pub spillover_fraction: Option<f64>,
}

impl Default for ScenarioBuilder {
    fn default() -> Self {
        Self {
            id: String::new(),
            version: 1,
            name: String::new(),
            trigger_description: String::new(),
            affected_regions: BTreeSet::new(),
            spillover_regions: BTreeSet::new(),
            severity: 1.0,
            duration_days: 180,
            impact_deltas: ImpactDeltas::default(),
            probability: None,
            spillover_fraction: None,
        }
    }
}

impl ScenarioBuilder {
    pub fn trigger(mut self, description: impl Into<String>) -> Self {
        self.trigger_description = description.into();
        self
    }

    pub fn region(mut self, region: RegionId) -> Self {
        self.affected_regions.insert(region);
        self
    }

    pub fn regions<I: IntoIterator<Item = RegionId>>(mut self, regions: I) -> Self {
        self.affected_regions.extend(regions);
        self
    }

    pub fn spillover<I: IntoIterator<Item = RegionId>>(mut self, regions: I) -> Self {
        self.spillover_regions.extend(regions);
        self
    }

    pub fn severity(mut self, severity: f64) -> Self {
        self.severity = severity;
        self
    }

    /// Severity on the 1–10 scale; out-of-scale values surface at `build`.
    pub fn severity_ten_point(mut self, v: f64) -> Self {
        self.severity = match Severity::from_ten_point(v) {
            Ok(s) => s.value(),
            Err(_) => f64::NAN,
        };
        self
    }

    pub fn duration_days(mut self, days: u32) -> Self {
        self.duration_days = days;
        self
    }

    pub fn impact(mut self, factor: Factor, delta: f64) -> Self {
        let mut map = *self.impact_deltas.as_map();
        map.set(factor, delta);
        self.impact_deltas = ImpactDeltas::new(map);
        self
    }

    pub fn impacts(mut self, deltas: ImpactDeltas) -> Self {
        self.impact_deltas = deltas;
        self
    }

    pub fn probability(mut self, p: f64) -> Self {
        self.probability = Some(p);
        self
    }

    pub fn spillover_fraction(mut self, fraction: f64) -> Self {
        self.spillover_fraction = Some(fraction);
        self
    }

    pub fn build(self) -> Result<Scenario, EngineError> {
        if self.id.trim().is_empty() {
            return Err(EngineError::validation(ErrorContext::field("scenario.id"), "must not be empty"));
        }
        if self.name.trim().is_empty() {
            return Err(EngineError::validation(ErrorContext::field("scenario.name"), "must not be empty"));
        }
        if self.version == 0 {
            return Err(EngineError::validation(ErrorContext::field("scenario.version"), "versions start at 1"));
        }
        let severity = Severity::new(self.severity)?;
        if self.duration_days == 0 {
            return Err(EngineError::validation(
                ErrorContext::field("scenario.duration_days"),
                "must be a positive number of days",
            ));
        }
        for (factor, delta) in self.impact_deltas.as_map().iter() {
            if !delta.is_finite() {
                return Err(EngineError::validation(
                    ErrorContext::field("scenario.impact_deltas").with_factor(factor),
                    format!("non-finite delta {delta}"),
                ));
            }
        }
        if let Some(p) = self.probability {
            if !(p.is_finite() && (0.0..=1.0).contains(&p)) {
                return Err(EngineError::validation(
                    ErrorContext::field("scenario.probability"),
                    format!("{p} outside [0, 1]"),
                ));
            }
        }
        if let Some(s) = self.spillover_fraction {
            if !(s.is_finite() && (0.0..=1.0).contains(&s)) {
                return Err(EngineError::validation(
                    ErrorContext::field("scenario.spillover_fraction"),
                    format!("{s} outside [0, 1]"),
                ));
            }
        }

        // A region hit directly is never also a spillover target.
        let spillover_regions = self
            .spillover_regions
            .into_iter()
            .filter(|r| !self.affected_regions.contains(r))
            .collect();

        Ok(Scenario {
            id: self.id,
            version: self.version,
            name: self.name,
            trigger_description: self.trigger_description,
            affected_regions: self.affected_regions,
            spillover_regions,
            severity,
            duration_days: self.duration_days,
            impact_deltas: self.impact_deltas,
            probability: self.probability.map(clamp_unit),
            spillover_fraction: self.spillover_fraction,
        })
    }
}

impl TryFrom<ScenarioBuilder> for Scenario {
    type Error = EngineError;
    fn try_from(b: ScenarioBuilder) -> Result<Self, Self::Error> {
        b.build()
    }
}

// ------------------------------------------------------------------------------------------------
// Templates
// ------------------------------------------------------------------------------------------------

/// Predefined scenario shapes with fixed per-factor impacts (score points at severity 1.0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioTemplate {
    TradeEmbargo,
    MilitaryConflict,
    Sanctions,
    PoliticalCrisis,
    NaturalDisaster,
}

impl ScenarioTemplate {
    pub const ALL: [ScenarioTemplate; 5] = [
        ScenarioTemplate::TradeEmbargo,
        ScenarioTemplate::MilitaryConflict,
        ScenarioTemplate::Sanctions,
        ScenarioTemplate::PoliticalCrisis,
        ScenarioTemplate::NaturalDisaster,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            ScenarioTemplate::TradeEmbargo => "trade_embargo",
            ScenarioTemplate::MilitaryConflict => "military_conflict",
            ScenarioTemplate::Sanctions => "sanctions",
            ScenarioTemplate::PoliticalCrisis => "political_crisis",
            ScenarioTemplate::NaturalDisaster => "natural_disaster",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            ScenarioTemplate::TradeEmbargo => "Trade Embargo",
            ScenarioTemplate::MilitaryConflict => "Military Conflict",
            ScenarioTemplate::Sanctions => "Economic Sanctions",
            ScenarioTemplate::PoliticalCrisis => "Political Crisis",
            ScenarioTemplate::NaturalDisaster => "Natural Disaster",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            ScenarioTemplate::TradeEmbargo => "Trade embargo between two or more countries",
            ScenarioTemplate::MilitaryConflict => "Armed conflict or military intervention",
            ScenarioTemplate::Sanctions => "International sanctions imposed on a target",
            ScenarioTemplate::PoliticalCrisis => "Government instability or regime change",
            ScenarioTemplate::NaturalDisaster => "Major natural disaster affecting the region",
        }
    }

    /// Impact in score points at full severity.
    pub fn impacts(self) -> ImpactDeltas {
        // (conflict, sentiment, political, economic)
        let m = match self {
            ScenarioTemplate::TradeEmbargo => FactorMap::new(0.0, 40.0, 15.0, 25.0),
            ScenarioTemplate::MilitaryConflict => FactorMap::new(50.0, 20.0, 30.0, 20.0),
            ScenarioTemplate::Sanctions => FactorMap::new(0.0, 35.0, 20.0, 35.0),
            ScenarioTemplate::PoliticalCrisis => FactorMap::new(20.0, 15.0, 45.0, 25.0),
            ScenarioTemplate::NaturalDisaster => FactorMap::new(25.0, 20.0, 0.0, 30.0),
        };
        ImpactDeltas::new(m)
    }

    /// Builder pre-filled from the template; callers add id suffixes, regions, severity.
    pub fn builder(self, id: impl Into<String>) -> ScenarioBuilder {
        Scenario::builder(id, self.display_name())
            .trigger(self.description())
            .impacts(self.impacts())
    }
}

impl core::str::FromStr for ScenarioTemplate {
    type Err = EngineError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScenarioTemplate::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| EngineError::not_found("scenario template", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rid(s: &str) -> RegionId {
        s.parse().expect("region id")
    }

    #[test]
    fn ten_point_scale_maps_into_unit_interval() {
        assert_eq!(Severity::from_ten_point(7.0).unwrap().value(), 0.7);
        assert!(Severity::from_ten_point(0.5).is_err());
        assert!(Severity::new(1.2).is_err());
    }

    #[test]
    fn unknown_delta_keys_are_ignored() {
        let (d, ignored) = ImpactDeltas::from_named([("conflict", 12.0), ("trade", 40.0)]);
        assert_eq!(d.get(Factor::Conflict), 12.0);
        assert_eq!(d.get(Factor::Economic), 0.0);
        assert_eq!(ignored, vec!["trade".to_string()]);

        let parsed: ImpactDeltas = serde_json::from_str(r#"{"political":5,"security":10}"#).unwrap();
        assert_eq!(parsed.get(Factor::Political), 5.0);
        assert_eq!(parsed.active().count(), 1);
    }

    #[test]
    fn build_validates_and_strips_overlapping_spillover() {
        let s = Scenario::builder("blockade", "Strait blockade")
            .region(rid("TWN"))
            .spillover([rid("TWN"), rid("JPN")])
            .severity(0.8)
            .duration_days(90)
            .impact(Factor::Conflict, 30.0)
            .build()
            .unwrap();
        assert_eq!(s.spillover_regions().len(), 1);
        assert!(s.spillover_regions().contains(&rid("JPN")));
        assert_eq!(s.version(), 1);

        let bad = Scenario::builder("x", "x").duration_days(0).build();
        assert!(matches!(bad, Err(EngineError::Validation { .. })));
        let bad = Scenario::builder("x", "x").probability(1.5).build();
        assert!(bad.is_err());
    }

    #[test]
    fn revise_bumps_version_and_keeps_fields() {
        let s = ScenarioTemplate::Sanctions
            .builder("sanctions-irn")
            .region(rid("IRN"))
            .severity(0.5)
            .build()
            .unwrap();
        let v2 = s.revise().severity(0.9).build().unwrap();
        assert_eq!(v2.version(), 2);
        assert_eq!(v2.id(), s.id());
        assert_eq!(v2.impact_deltas(), s.impact_deltas());
        assert_eq!(s.severity().value(), 0.5);
    }

    #[test]
    fn scenario_deserializes_through_builder() {
        let s: Scenario = serde_json::from_str(
            r#"{"id":"s1","name":"Coup","affected_regions":["MLI"],"severity":0.6,
                "duration_days":60,"impact_deltas":{"political":40,"trade":10}}"#,
        )
        .unwrap();
        assert_eq!(s.impact_deltas().get(Factor::Political), 40.0);
        assert!(serde_json::from_str::<Scenario>(r#"{"id":"s1","name":"x","severity":3}"#).is_err());
    }

    #[test]
    fn template_lookup() {
        assert_eq!("military_conflict".parse::<ScenarioTemplate>().unwrap(), ScenarioTemplate::MilitaryConflict);
        assert!(matches!("meteor".parse::<ScenarioTemplate>(), Err(EngineError::NotFound { .. })));
    }

    #[test]
    fn ten_point_severity_is_normalized_or_rejected_at_build() {
        let draft = Scenario::builder("unrest", "Mass protests").region(rid("IRN")).duration_days(30);
        let s = draft.clone().severity_ten_point(7.0).build().unwrap();
        assert_eq!(s.severity().value(), 0.7);

        for bad in [0.0, 11.0, f64::NAN] {
            let err = draft.clone().severity_ten_point(bad).build().unwrap_err();
            assert!(matches!(err, EngineError::Validation { .. }), "{bad}: {err:?}");
        }
        // A later valid call replaces the rejected one.
        assert!(draft.severity_ten_point(12.0).severity(0.4).build().is_ok());
    }
}
