//! Monte Carlo scenario simulation.
//!
//! Per iteration `i` (run in parallel, each on ChaCha sub-stream `i` of the seed):
//! 1. draw one Normal(1, σ) noise multiplier per region and factor, truncated at 0
//! 2. perturbation = delta × severity × noise (× spillover fraction for linked regions)
//! 3. projected factor = clip(baseline + perturbation × decay(day), 0, 100)
//! 4. composite recomputed with the baseline weights
//!
//! Peak projections (day 0) feed the per-region distributions; the timeline
//! samples the decayed composite impact every `timeline_step_days`.

use std::collections::BTreeMap;

use rand_distr::{Distribution as _, Normal};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info_span};

use gr_core::variables::SimulationParams;
use gr_core::{
    clamp_score, CompositeScore, EngineError, EngineResult, ErrorContext, Factor, FactorMap, ProjectionRole,
    RegionId, RegionProjection, Scenario, SimRng, SimulationResult, TimelinePoint, WeightVector,
};

use crate::aggregate::composite_value;
use crate::stats;

/// Per-call knobs; `None` falls back to the engine parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationOptions {
    pub iterations: Option<u32>,
    pub seed: Option<u64>,
}

impl SimulationOptions {
    pub fn seeded(seed: u64) -> Self {
        Self { iterations: None, seed: Some(seed) }
    }

    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = Some(iterations);
        self
    }
}

/// Per-factor baseline values keyed by region.
pub type Baselines = BTreeMap<RegionId, FactorMap<f64>>;

/// Baselines from current composite scores (their raw factor values).
pub fn baselines_from_composites<'a, I>(composites: I) -> Baselines
where
    I: IntoIterator<Item = &'a CompositeScore>,
{
    composites.into_iter().map(|c| (c.region.clone(), c.raw_scores())).collect()
}

struct Target<'a> {
    region: &'a RegionId,
    role: ProjectionRole,
    /// 1.0 for direct regions, the spillover fraction otherwise.
    share: f64,
    baseline: FactorMap<f64>,
    baseline_composite: f64,
}

/// Iterations run in parallel per chunk; chunks are folded in index order.
const CHUNK_ITERATIONS: u32 = 256;

/// Outcome of one iteration.
struct Sample {
    /// Per target: peak factor values and composite.
    peaks: Vec<(FactorMap<f64>, f64)>,
    /// Mean composite delta over direct regions per timeline day.
    timeline: Vec<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct ScenarioEngine {
    params: SimulationParams,
}

impl ScenarioEngine {
    pub fn new(params: SimulationParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// Days at which the timeline is sampled: every step, plus the last day.
    pub fn timeline_days(&self, duration_days: u32) -> Vec<u32> {
        let step = self.params.timeline_step_days.max(1);
        let mut days: Vec<u32> = (0..duration_days).step_by(step as usize).collect();
        days.push(duration_days);
        days
    }

    pub fn simulate(
        &self,
        scenario: &Scenario,
        baselines: &Baselines,
        weights: &WeightVector,
        opts: SimulationOptions,
    ) -> EngineResult<SimulationResult> {
        let p = &self.params;
        let iterations = opts.iterations.unwrap_or(p.default_iterations);
        if !(p.min_iterations..=p.max_iterations).contains(&iterations) {
            return Err(EngineError::out_of_range(
                "iterations",
                iterations,
                format!("[{}, {}]", p.min_iterations, p.max_iterations),
            ));
        }
        if scenario.affected_regions().is_empty() {
            return Err(EngineError::out_of_range("affected_regions", 0, "at least one region"));
        }
        if scenario.duration_days() > p.max_duration_days {
            return Err(EngineError::out_of_range(
                "duration_days",
                scenario.duration_days(),
                format!("[1, {}]", p.max_duration_days),
            ));
        }
        if !weights.is_normalized() {
            return Err(EngineError::Invariant(format!(
                "simulate called with un-normalized weights (sum = {})",
                weights.sum()
            )));
        }
        let normal = Normal::new(1.0, p.noise_std_dev)
            .map_err(|e| EngineError::out_of_range("noise_std_dev", p.noise_std_dev, e.to_string()))?;

        let seed = opts.seed.unwrap_or(p.default_seed);
        let spill = scenario.spillover_fraction().unwrap_or(p.spillover_fraction);

        let _span = info_span!("simulate", scenario = scenario.id(), version = scenario.version(), iterations, seed)
            .entered();

        // Targets in ascending region order (direct and spillover sets are disjoint).
        let mut targets: Vec<Target<'_>> = Vec::new();
        let roles = scenario
            .affected_regions()
            .iter()
            .map(|r| (r, ProjectionRole::Direct, 1.0))
            .chain(scenario.spillover_regions().iter().map(|r| (r, ProjectionRole::Spillover, spill)));
        for (region, role, share) in roles {
            let baseline = *baselines.get(region).ok_or_else(|| {
                EngineError::validation(
                    ErrorContext::field("baselines").with_region(region),
                    "no baseline factor scores for region",
                )
            })?;
            for (f, v) in baseline.iter() {
                if !(v.is_finite() && (0.0..=100.0).contains(v)) {
                    return Err(EngineError::validation(
                        ErrorContext::field("baselines").with_region(region).with_factor(f),
                        format!("baseline {v} outside [0, 100]"),
                    ));
                }
            }
            let baseline_composite = composite_value(&baseline, weights);
            targets.push(Target { region, role, share, baseline, baseline_composite });
        }
        targets.sort_by(|a, b| a.region.cmp(b.region));

        let severity = scenario.severity().value();
        let deltas = *scenario.impact_deltas().as_map();
        let days = self.timeline_days(scenario.duration_days());
        let decays: Vec<f64> = days.iter().map(|&d| p.decay.factor(d, scenario.duration_days())).collect();
        let direct_count = targets.iter().filter(|t| t.role == ProjectionRole::Direct).count() as f64;

        debug!(targets = targets.len(), timeline_points = days.len(), "simulation started");

        let run = |i: u32| {
            let mut rng = SimRng::substream(seed, u64::from(i));
            let mut peaks = Vec::with_capacity(targets.len());
            let mut timeline = vec![0.0; decays.len()];
            for t in &targets {
                let perturbation = FactorMap::from_fn(|f: Factor| {
                    let noise = normal.sample(&mut rng).max(0.0);
                    deltas.get(f) * severity * noise * t.share
                });
                let project = |decay: f64| {
                    let values = t.baseline.map(|f, b| clamp_score(b + perturbation.get(f) * decay));
                    let composite = composite_value(&values, weights);
                    (values, composite)
                };
                if t.role == ProjectionRole::Direct {
                    for (slot, &decay) in timeline.iter_mut().zip(&decays) {
                        *slot += project(decay).1 - t.baseline_composite;
                    }
                }
                peaks.push(project(1.0));
            }
            for slot in &mut timeline {
                *slot /= direct_count;
            }
            Sample { peaks, timeline }
        };

        // Timelines are summed in iteration order as each chunk lands, so only
        // the peaks are kept for every iteration.
        let mut peaks: Vec<Vec<(FactorMap<f64>, f64)>> = Vec::with_capacity(iterations as usize);
        let mut timeline_sum = vec![0.0; decays.len()];
        for start in (0..iterations).step_by(CHUNK_ITERATIONS as usize) {
            let end = start.saturating_add(CHUNK_ITERATIONS).min(iterations);
            let chunk: Vec<Sample> = (start..end).into_par_iter().map(&run).collect();
            for sample in chunk {
                for (acc, v) in timeline_sum.iter_mut().zip(&sample.timeline) {
                    *acc += v;
                }
                peaks.push(sample.peaks);
            }
        }

        // Sequential reduction keeps results independent of thread scheduling.
        let mut regions = BTreeMap::new();
        for (ti, t) in targets.iter().enumerate() {
            let factors = FactorMap::from_fn(|f| {
                let mut xs: Vec<f64> = peaks.iter().map(|p| *p[ti].0.get(f)).collect();
                stats::summarize(&mut xs)
            });
            let mut composites: Vec<f64> = peaks.iter().map(|p| p[ti].1).collect();
            let composite = stats::summarize(&mut composites);
            let (Some(composite), Some(factors)) = (composite, transpose(factors)) else {
                return Err(EngineError::Invariant("simulation produced no samples".into()));
            };
            let mean_impact = composite.mean - t.baseline_composite;
            regions.insert(
                t.region.clone(),
                RegionProjection {
                    role: t.role,
                    baseline_composite: t.baseline_composite,
                    factors,
                    composite,
                    mean_impact,
                    expected_impact: scenario.probability().map(|prob| mean_impact * prob),
                },
            );
        }

        let n = f64::from(iterations);
        let timeline = days
            .iter()
            .zip(&decays)
            .enumerate()
            .map(|(k, (&day_offset, &decay))| TimelinePoint {
                day_offset,
                mean_impact: timeline_sum[k] / n,
                decay,
            })
            .collect();

        debug!(regions = regions.len(), "simulation finished");

        Ok(SimulationResult {
            scenario_id: scenario.id().to_string(),
            scenario_version: scenario.version(),
            iterations,
            seed,
            regions,
            timeline,
        })
    }
}

fn transpose<T>(m: FactorMap<Option<T>>) -> Option<FactorMap<T>> {
    Some(FactorMap::new(m.conflict?, m.sentiment?, m.political?, m.economic?))
}

// ----------------------------- Comparison -----------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSummary {
    pub scenario_id: String,
    pub scenario_version: u32,
    /// Σ mean composite impact over every projected region.
    pub total_impact: f64,
    pub average_impact: f64,
    pub most_affected: Option<RegionId>,
    /// Signed mean impact of `most_affected`.
    pub max_change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioComparison {
    pub scenarios: Vec<ScenarioSummary>,
    /// Region with the largest absolute impact across all scenarios.
    pub most_affected_overall: Option<RegionId>,
}

pub fn compare_simulations(results: &[SimulationResult]) -> ScenarioComparison {
    let mut overall: Option<(&RegionId, f64)> = None;
    let scenarios = results
        .iter()
        .map(|r| {
            let total_impact: f64 = r.regions.values().map(|p| p.mean_impact).sum();
            let average_impact =
                if r.regions.is_empty() { 0.0 } else { total_impact / r.regions.len() as f64 };
            let most = r.most_affected();
            if let Some((id, v)) = most {
                match overall {
                    Some((_, best)) if v.abs() <= best.abs() => {}
                    _ => overall = Some((id, v)),
                }
            }
            ScenarioSummary {
                scenario_id: r.scenario_id.clone(),
                scenario_version: r.scenario_version,
                total_impact,
                average_impact,
                most_affected: most.map(|(id, _)| id.clone()),
                max_change: most.map(|(_, v)| v).unwrap_or(0.0),
            }
        })
        .collect();
    ScenarioComparison { scenarios, most_affected_overall: overall.map(|(id, _)| id.clone()) }
}
