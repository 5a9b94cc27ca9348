//! Monte Carlo simulation output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::factors::FactorMap;
use crate::ids::RegionId;

/// Summary statistics over all iterations for one projected quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub p5: f64,
    pub p95: f64,
}

/// How a region entered the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionRole {
    Direct,
    Spillover,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionProjection {
    pub role: ProjectionRole,
    pub baseline_composite: f64,
    pub factors: FactorMap<Distribution>,
    pub composite: Distribution,
    /// `composite.mean - baseline_composite`.
    pub mean_impact: f64,
    /// `mean_impact × probability` when the scenario carries a probability.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub expected_impact: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub day_offset: u32,
    /// Mean composite delta over direct regions and iterations at this offset.
    pub mean_impact: f64,
    /// Decay multiplier applied at this offset.
    pub decay: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub scenario_id: String,
    pub scenario_version: u32,
    pub iterations: u32,
    /// Seed actually used (the configured default when the caller passed none).
    pub seed: u64,
    pub regions: BTreeMap<RegionId, RegionProjection>,
    pub timeline: Vec<TimelinePoint>,
}

impl SimulationResult {
    pub fn direct_regions(&self) -> impl Iterator<Item = (&RegionId, &RegionProjection)> + '_ {
        self.regions.iter().filter(|(_, p)| p.role == ProjectionRole::Direct)
    }

    /// Region with the largest absolute mean composite impact (lowest id on ties).
    pub fn most_affected(&self) -> Option<(&RegionId, f64)> {
        let mut best: Option<(&RegionId, f64)> = None;
        for (id, p) in &self.regions {
            match best {
                Some((_, b)) if p.mean_impact.abs() <= b.abs() => {}
                _ => best = Some((id, p.mean_impact)),
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dist(m: f64) -> Distribution {
        Distribution { mean: m, std_dev: 0.0, p5: m, p95: m }
    }

    fn proj(role: ProjectionRole, impact: f64) -> RegionProjection {
        RegionProjection {
            role,
            baseline_composite: 50.0,
            factors: FactorMap::splat(dist(50.0)),
            composite: dist(50.0 + impact),
            mean_impact: impact,
            expected_impact: None,
        }
    }

    #[test]
    fn most_affected_prefers_largest_magnitude() {
        let mut regions = BTreeMap::new();
        regions.insert("AAA".parse().unwrap(), proj(ProjectionRole::Direct, 4.0));
        regions.insert("BBB".parse().unwrap(), proj(ProjectionRole::Spillover, -9.0));
        regions.insert("CCC".parse().unwrap(), proj(ProjectionRole::Direct, 9.0));
        let r = SimulationResult {
            scenario_id: "s".into(),
            scenario_version: 1,
            iterations: 100,
            seed: 0,
            regions,
            timeline: vec![],
        };
        let (id, v) = r.most_affected().unwrap();
        assert_eq!(id.as_str(), "BBB");
        assert_eq!(v, -9.0);
        assert_eq!(r.direct_regions().count(), 2);
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ProjectionRole::Spillover).unwrap(), "\"spillover\"");
    }
}
