//! The four risk factors and a fixed-shape per-factor record.
//!
//! `FactorMap<T>` replaces open string-keyed maps for weights, impact deltas
//! and per-factor results: every factor is always present, iteration order is
//! the canonical `Factor::ALL` order, and unknown keys cannot sneak in.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, ErrorContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Factor {
    Conflict,
    Sentiment,
    Political,
    Economic,
}

impl Factor {
    /// Canonical order used for iteration, serialization and reductions.
    pub const ALL: [Factor; 4] = [
        Factor::Conflict,
        Factor::Sentiment,
        Factor::Political,
        Factor::Economic,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Factor::Conflict => "conflict",
            Factor::Sentiment => "sentiment",
            Factor::Political => "political",
            Factor::Economic => "economic",
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Factor {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "conflict" => Ok(Factor::Conflict),
            "sentiment" => Ok(Factor::Sentiment),
            "political" => Ok(Factor::Political),
            "economic" => Ok(Factor::Economic),
            other => Err(EngineError::validation(
                ErrorContext::field("factor"),
                format!("unknown factor id {other:?}"),
            )),
        }
    }
}

/// Exactly one `T` per factor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FactorMap<T> {
    pub conflict: T,
    pub sentiment: T,
    pub political: T,
    pub economic: T,
}

impl<T> FactorMap<T> {
    pub fn new(conflict: T, sentiment: T, political: T, economic: T) -> Self {
        Self { conflict, sentiment, political, economic }
    }

    pub fn from_fn(mut f: impl FnMut(Factor) -> T) -> Self {
        Self {
            conflict: f(Factor::Conflict),
            sentiment: f(Factor::Sentiment),
            political: f(Factor::Political),
            economic: f(Factor::Economic),
        }
    }

    pub fn get(&self, factor: Factor) -> &T {
        match factor {
            Factor::Conflict => &self.conflict,
            Factor::Sentiment => &self.sentiment,
            Factor::Political => &self.political,
            Factor::Economic => &self.economic,
        }
    }

    pub fn get_mut(&mut self, factor: Factor) -> &mut T {
        match factor {
            Factor::Conflict => &mut self.conflict,
            Factor::Sentiment => &mut self.sentiment,
            Factor::Political => &mut self.political,
            Factor::Economic => &mut self.economic,
        }
    }

    pub fn set(&mut self, factor: Factor, value: T) {
        *self.get_mut(factor) = value;
    }

    /// Iterate `(factor, &value)` in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Factor, &T)> + '_ {
        Factor::ALL.into_iter().map(move |f| (f, self.get(f)))
    }

    pub fn map<U>(&self, mut f: impl FnMut(Factor, &T) -> U) -> FactorMap<U> {
        FactorMap::from_fn(|factor| f(factor, self.get(factor)))
    }
}

impl<T: Clone> FactorMap<T> {
    pub fn splat(value: T) -> Self {
        Self::from_fn(|_| value.clone())
    }
}

impl FactorMap<f64> {
    /// Sum in canonical order (fixed order keeps the result bit-stable).
    pub fn sum(&self) -> f64 {
        self.iter().map(|(_, v)| *v).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factor_round_trips_through_str() {
        for f in Factor::ALL {
            assert_eq!(f.as_str().parse::<Factor>().unwrap(), f);
        }
        assert!("security".parse::<Factor>().is_err());
    }

    #[test]
    fn iteration_follows_canonical_order() {
        let m = FactorMap::new(1, 2, 3, 4);
        let order: Vec<Factor> = m.iter().map(|(f, _)| f).collect();
        assert_eq!(order, Factor::ALL.to_vec());
    }

    #[test]
    fn unknown_keys_are_rejected_by_serde() {
        let err = serde_json::from_str::<FactorMap<f64>>(
            r#"{"conflict":1,"sentiment":1,"political":1,"economic":1,"trade":1}"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn enums_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&Factor::Political).unwrap(), "\"political\"");
    }
}
