//! `RiskEngine`: one validated config, one set of components.
//!
//! Every call is `&self` except weight management, so an engine can be shared
//! across threads once built. History and preset stores are passed in per
//! call; the engine never holds on to them.

use std::path::Path;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn};

use gr_algo::forecast::{self, DEFAULT_ALPHA};
use gr_algo::weights::is_builtin;
use gr_algo::{
    aggregate, signals, trends, AlertEvaluator, Baselines, CalculatorSet, ScenarioEngine, Signal,
    SimulationOptions, TrendAnalysis, WeightManager,
};
use gr_core::{Alert, CompositeScore, EngineConfig, EngineError, EngineResult, FactorScore, RegionId, Scenario};
use gr_io::{PresetStore, ScoreHistory};

use crate::inputs::RegionInputs;
use crate::record::SimulationRecord;
use crate::PipelineResult;

/// Scores for one region at one point in time.
///
/// `factor_scores` holds only the factors that had an extract; the others are
/// visible as imputed contributions inside `composite`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionAssessment {
    pub region: RegionId,
    pub factor_scores: Vec<FactorScore>,
    pub composite: CompositeScore,
    pub signals: Vec<Signal>,
}

/// An assessment plus the alerts it raised against stored history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub assessment: RegionAssessment,
    pub alerts: Vec<Alert>,
}

/// One slot of a batch run, in input order.
#[derive(Debug)]
pub struct BatchEntry {
    pub region: RegionId,
    pub outcome: EngineResult<RegionAssessment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub region: RegionId,
    pub analysis: TrendAnalysis,
    /// Next composite by exponential smoothing.
    pub forecast: f64,
}

pub struct RiskEngine {
    config: EngineConfig,
    calculators: CalculatorSet,
    weights: WeightManager,
    scenarios: ScenarioEngine,
    alerts: AlertEvaluator,
}

impl RiskEngine {
    pub fn from_config(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let weights = WeightManager::from_config(&config.weights)?;
        let engine = Self {
            calculators: CalculatorSet::from_config(&config),
            scenarios: ScenarioEngine::new(config.simulation.clone()),
            alerts: AlertEvaluator::new(config.alerts.clone()),
            weights,
            config,
        };
        debug!(active_preset = ?engine.weights.active_preset(), "risk engine ready");
        Ok(engine)
    }

    /// Read, validate and build from a JSON config file.
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let cfg = gr_io::load_config(path)?;
        Ok(Self::from_config(cfg)?)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn weights(&self) -> &WeightManager {
        &self.weights
    }

    pub fn weights_mut(&mut self) -> &mut WeightManager {
        &mut self.weights
    }

    // ---- scoring ----

    pub fn score_region(&self, inputs: &RegionInputs) -> EngineResult<RegionAssessment> {
        let region = &inputs.region;
        let factor_scores = inputs
            .extracts()
            .iter()
            .map(|(factor, extract)| self.calculators.compute(*factor, region, extract))
            .collect::<EngineResult<Vec<_>>>()?;
        let composite = aggregate(region, &factor_scores, &self.weights.current())?;
        let signals = signals::detect(&composite);
        debug!(
            region = %region,
            score = composite.value,
            level = ?composite.level,
            signals = signals.len(),
            "region scored"
        );
        Ok(RegionAssessment { region: region.clone(), factor_scores, composite, signals })
    }

    /// Score, then compare against the latest stored composite. Storing the new
    /// composite is left to the caller.
    pub fn assess(&self, inputs: &RegionInputs, history: &dyn ScoreHistory) -> EngineResult<Evaluation> {
        let assessment = self.score_region(inputs)?;
        let previous = history.latest(&inputs.region);
        if let Some(prev) = &previous {
            if prev.computed_at > assessment.composite.computed_at {
                warn!(
                    region = %inputs.region,
                    stored = %prev.computed_at,
                    current = %assessment.composite.computed_at,
                    "stored composite is newer than the one being assessed"
                );
            }
        }
        let alerts = self.alerts.evaluate(&inputs.region, &assessment.composite, previous.as_ref())?;
        Ok(Evaluation { assessment, alerts })
    }

    /// Score many regions in parallel. Results keep input order and a failing
    /// region does not abort the others.
    pub fn score_batch(&self, inputs: &[RegionInputs]) -> Vec<BatchEntry> {
        let span = info_span!("score_batch", regions = inputs.len());
        let _guard = span.enter();

        let entries: Vec<BatchEntry> = inputs
            .par_iter()
            .map(|i| BatchEntry { region: i.region.clone(), outcome: self.score_region(i) })
            .collect();

        let failed = entries.iter().filter(|e| e.outcome.is_err()).count();
        if failed > 0 {
            warn!(failed, total = entries.len(), "some regions failed to score");
        }
        info!(total = entries.len(), failed, "batch scored");
        entries
    }

    // ---- history analytics ----

    pub fn trend(&self, region: &RegionId, since: DateTime<Utc>, history: &dyn ScoreHistory) -> EngineResult<TrendReport> {
        let series = history.list_since(region, since);
        let analysis = trends::analyze_scores(&series);
        let values: Vec<f64> = series.iter().map(|c| c.value).collect();
        let forecast = forecast::predict_next(&values, DEFAULT_ALPHA)?;
        Ok(TrendReport { region: region.clone(), analysis, forecast })
    }

    // ---- scenarios ----

    /// Simulate under the current weights and digest the result.
    pub fn run_scenario(
        &self,
        scenario: &Scenario,
        baselines: &Baselines,
        opts: SimulationOptions,
    ) -> PipelineResult<SimulationRecord> {
        let result = self.scenarios.simulate(scenario, baselines, &self.weights.current(), opts)?;
        let record = SimulationRecord::new(result)?;
        info!(scenario = scenario.id(), digest = %record.digest, "scenario recorded");
        Ok(record)
    }

    // ---- presets ----

    /// Register every stored preset. Built-in names in the store are skipped.
    pub fn load_presets(&mut self, store: &dyn PresetStore) -> EngineResult<usize> {
        let mut loaded = 0;
        for name in store.names() {
            if is_builtin(&name) {
                debug!(preset = %name, "store shadows a built-in preset; skipped");
                continue;
            }
            let w = store.load(&name)?;
            self.weights.register_preset(&name, *w.as_map())?;
            loaded += 1;
        }
        Ok(loaded)
    }

    /// Persist every user preset. Returns how many were written.
    pub fn save_presets(&self, store: &mut dyn PresetStore) -> EngineResult<usize> {
        let mut saved = 0;
        for name in self.weights.preset_names().into_iter().filter(|n| !is_builtin(n)) {
            store.save(name, self.weights.get_preset(name)?)?;
            saved += 1;
        }
        Ok(saved)
    }
}

impl Default for RiskEngine {
    fn default() -> Self {
        // The default config always validates and its active preset is built in.
        Self {
            config: EngineConfig::default(),
            calculators: CalculatorSet::default(),
            weights: WeightManager::new(),
            scenarios: ScenarioEngine::default(),
            alerts: AlertEvaluator::default(),
        }
    }
}

impl core::fmt::Debug for RiskEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RiskEngine")
            .field("active_preset", &self.weights.active_preset())
            .field("weights", &self.weights.current())
            .finish_non_exhaustive()
    }
}

/// Turn failed batch slots into `(region, error)` pairs.
pub fn batch_failures(entries: &[BatchEntry]) -> Vec<(&RegionId, &EngineError)> {
    entries.iter().filter_map(|e| e.outcome.as_ref().err().map(|err| (&e.region, err))).collect()
}
