//! Collaborator contracts for persisted state, plus in-memory stores.
//!
//! The engine only ever reads a history snapshot; appending the freshly
//! computed score is the caller's job. Both traits are object safe so the
//! pipeline can take `&dyn ScoreHistory`.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use gr_core::{CompositeScore, EngineError, EngineResult, ErrorContext, RegionId, WeightVector};

/// Address of one stored composite: region plus computation time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HistoryKey {
    pub region: RegionId,
    pub computed_at: DateTime<Utc>,
}

impl HistoryKey {
    pub fn of(score: &CompositeScore) -> Self {
        Self { region: score.region.clone(), computed_at: score.computed_at }
    }
}

impl core::fmt::Display for HistoryKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}@{}", self.region, self.computed_at.to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}

/// Append-only store of composite scores.
pub trait ScoreHistory: Send + Sync {
    fn get(&self, key: &HistoryKey) -> EngineResult<CompositeScore>;

    fn put(&mut self, key: HistoryKey, value: CompositeScore) -> EngineResult<()>;

    /// Scores for `region` with `computed_at >= since`, oldest first.
    fn list_since(&self, region: &RegionId, since: DateTime<Utc>) -> Vec<CompositeScore>;

    /// Most recent score for `region`.
    fn latest(&self, region: &RegionId) -> Option<CompositeScore>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryHistory {
    by_region: BTreeMap<RegionId, BTreeMap<DateTime<Utc>, CompositeScore>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `score` under its own key.
    pub fn append(&mut self, score: CompositeScore) -> EngineResult<()> {
        self.put(HistoryKey::of(&score), score)
    }

    pub fn len(&self) -> usize {
        self.by_region.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ScoreHistory for InMemoryHistory {
    fn get(&self, key: &HistoryKey) -> EngineResult<CompositeScore> {
        self.by_region
            .get(&key.region)
            .and_then(|m| m.get(&key.computed_at))
            .cloned()
            .ok_or_else(|| EngineError::not_found("composite score", key.to_string()))
    }

    fn put(&mut self, key: HistoryKey, value: CompositeScore) -> EngineResult<()> {
        if key != HistoryKey::of(&value) {
            return Err(EngineError::validation(
                ErrorContext::field("history.key").with_region(&key.region),
                format!("key {key} does not address the stored score {}", HistoryKey::of(&value)),
            ));
        }
        let series = self.by_region.entry(key.region.clone()).or_default();
        if series.contains_key(&key.computed_at) {
            return Err(EngineError::validation(
                ErrorContext::field("history.key").with_region(&key.region),
                format!("history is append-only; {key} already stored"),
            ));
        }
        series.insert(key.computed_at, value);
        Ok(())
    }

    fn list_since(&self, region: &RegionId, since: DateTime<Utc>) -> Vec<CompositeScore> {
        self.by_region
            .get(region)
            .map(|m| m.range(since..).map(|(_, s)| s.clone()).collect())
            .unwrap_or_default()
    }

    fn latest(&self, region: &RegionId) -> Option<CompositeScore> {
        self.by_region.get(region).and_then(|m| m.values().next_back().cloned())
    }
}

/// Named weight presets persisted outside the engine.
pub trait PresetStore: Send + Sync {
    fn load(&self, name: &str) -> EngineResult<WeightVector>;

    /// Last write wins.
    fn save(&mut self, name: &str, weights: WeightVector) -> EngineResult<()>;

    fn names(&self) -> Vec<String>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryPresetStore {
    presets: BTreeMap<String, WeightVector>,
}

impl PresetStore for InMemoryPresetStore {
    fn load(&self, name: &str) -> EngineResult<WeightVector> {
        self.presets.get(name).copied().ok_or_else(|| EngineError::not_found("weight preset", name))
    }

    fn save(&mut self, name: &str, weights: WeightVector) -> EngineResult<()> {
        if !weights.is_normalized() {
            return Err(EngineError::Invariant(format!("refusing to store un-normalized preset {name:?}")));
        }
        self.presets.insert(name.to_string(), weights);
        Ok(())
    }

    fn names(&self) -> Vec<String> {
        self.presets.keys().cloned().collect()
    }
}
