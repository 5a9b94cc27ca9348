//! Weight management: the current weight vector plus named presets.
//!
//! Built-in presets are fixed; `balanced` always exists. User presets are
//! normalized on registration and replaced wholesale on re-registration.

use std::collections::BTreeMap;

use tracing::debug;

use gr_core::variables::WeightsConfig;
use gr_core::{EngineError, EngineResult, ErrorContext, FactorMap, WeightVector};

pub const BALANCED: &str = "balanced";

/// Built-in presets as `(name, conflict, sentiment, political, economic)`.
const BUILTIN_PRESETS: [(&str, f64, f64, f64, f64); 5] = [
    (BALANCED, 0.25, 0.25, 0.25, 0.25),
    ("conflict_focused", 0.50, 0.15, 0.20, 0.15),
    ("economic_focused", 0.15, 0.20, 0.15, 0.50),
    ("sentiment_focused", 0.10, 0.50, 0.15, 0.25),
    ("political_focused", 0.15, 0.15, 0.50, 0.20),
];

pub fn is_builtin(name: &str) -> bool {
    BUILTIN_PRESETS.iter().any(|(n, ..)| *n == name)
}

#[derive(Debug, Clone)]
pub struct WeightManager {
    current: WeightVector,
    active_preset: Option<String>,
    presets: BTreeMap<String, WeightVector>,
}

impl Default for WeightManager {
    fn default() -> Self {
        Self::new()
    }
}

impl WeightManager {
    /// Built-in presets only; current weights are `balanced`.
    pub fn new() -> Self {
        let mut presets = BTreeMap::new();
        for (name, c, s, p, e) in BUILTIN_PRESETS {
            // Built-in rows are already normalized.
            presets.insert(name.to_string(), WeightVector::from_raw_unchecked(FactorMap::new(c, s, p, e)));
        }
        Self { current: WeightVector::balanced(), active_preset: Some(BALANCED.to_string()), presets }
    }

    /// Register configured extra presets, then apply the configured active one.
    pub fn from_config(cfg: &WeightsConfig) -> EngineResult<Self> {
        let mut wm = Self::new();
        for (name, raw) in &cfg.presets {
            wm.register_preset(name, *raw)?;
        }
        wm.apply_preset(&cfg.active)?;
        Ok(wm)
    }

    /// Validate and rescale raw weights to sum to 1.0.
    pub fn normalize(raw: FactorMap<f64>) -> EngineResult<WeightVector> {
        let w = WeightVector::normalize(raw)?;
        debug!(raw_sum = raw.sum(), "weights normalized");
        Ok(w)
    }

    pub fn current(&self) -> WeightVector {
        self.current
    }

    /// Name of the preset the current weights came from, if they were not set by hand.
    pub fn active_preset(&self) -> Option<&str> {
        self.active_preset.as_deref()
    }

    /// Replace the current weights. The previous vector is kept on error.
    pub fn set_weights(&mut self, raw: FactorMap<f64>) -> EngineResult<WeightVector> {
        let w = Self::normalize(raw)?;
        self.current = w;
        self.active_preset = None;
        Ok(w)
    }

    pub fn get_preset(&self, name: &str) -> EngineResult<WeightVector> {
        self.presets.get(name).copied().ok_or_else(|| EngineError::not_found("weight preset", name))
    }

    /// Store a user preset under `name`; last write wins. Built-in names are reserved.
    pub fn register_preset(&mut self, name: &str, raw: FactorMap<f64>) -> EngineResult<WeightVector> {
        if name.trim().is_empty() {
            return Err(EngineError::validation(ErrorContext::field("preset.name"), "must not be empty"));
        }
        if is_builtin(name) {
            return Err(EngineError::validation(
                ErrorContext::field("preset.name"),
                format!("{name:?} is a built-in preset"),
            ));
        }
        let w = Self::normalize(raw)?;
        self.presets.insert(name.to_string(), w);
        debug!(preset = name, "weight preset registered");
        Ok(w)
    }

    pub fn apply_preset(&mut self, name: &str) -> EngineResult<WeightVector> {
        let w = self.get_preset(name)?;
        self.current = w;
        self.active_preset = Some(name.to_string());
        Ok(w)
    }

    /// Back to `balanced`.
    pub fn reset(&mut self) -> WeightVector {
        self.current = WeightVector::balanced();
        self.active_preset = Some(BALANCED.to_string());
        self.current
    }

    pub fn remove_preset(&mut self, name: &str) -> EngineResult<WeightVector> {
        if is_builtin(name) {
            return Err(EngineError::validation(
                ErrorContext::field("preset.name"),
                format!("built-in preset {name:?} cannot be removed"),
            ));
        }
        let removed = self.presets.remove(name).ok_or_else(|| EngineError::not_found("weight preset", name))?;
        if self.active_preset.as_deref() == Some(name) {
            // Current weights stay; they just no longer track a preset.
            self.active_preset = None;
        }
        Ok(removed)
    }

    /// All preset names, ascending.
    pub fn preset_names(&self) -> Vec<&str> {
        self.presets.keys().map(String::as_str).collect()
    }
}
