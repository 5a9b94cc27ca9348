//! Engine error taxonomy.
//!
//! Every failure leaves the core as a typed `EngineError` carrying enough
//! context (factor, region, offending value) to be logged by the caller
//! without re-deriving it. Missing data is never an error: calculators and the
//! aggregator degrade confidence instead.

use core::fmt;

use thiserror::Error;

use crate::factors::Factor;
use crate::ids::RegionId;

/// Where a validation failure occurred.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorContext {
    pub factor: Option<Factor>,
    pub region: Option<RegionId>,
    /// Dotted/indexed path of the offending field, e.g. `events[3].tone`.
    pub field: String,
}

impl ErrorContext {
    pub fn field(field: impl Into<String>) -> Self {
        Self { factor: None, region: None, field: field.into() }
    }

    pub fn with_factor(mut self, factor: Factor) -> Self {
        self.factor = Some(factor);
        self
    }

    pub fn with_region(mut self, region: &RegionId) -> Self {
        self.region = Some(region.clone());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.field)?;
        if let Some(factor) = self.factor {
            write!(f, " [factor={factor}]")?;
        }
        if let Some(region) = &self.region {
            write!(f, " [region={region}]")?;
        }
        Ok(())
    }
}

/// Why a weight vector was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WeightRejection {
    Negative,
    NotFinite,
    AllZero,
}

impl fmt::Display for WeightRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightRejection::Negative => f.write_str("negative weight"),
            WeightRejection::NotFinite => f.write_str("non-finite weight"),
            WeightRejection::AllZero => f.write_str("all weights are zero"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum EngineError {
    /// Malformed input shape. Fatal to the call, never retried.
    #[error("invalid {context}: {reason}")]
    Validation { context: ErrorContext, reason: String },

    /// Negative, non-finite or all-zero weight vector.
    #[error("invalid weight vector ({reason}): factor={}, value={value}", .factor.map(Factor::as_str).unwrap_or("*"))]
    InvalidWeight {
        factor: Option<Factor>,
        value: f64,
        reason: WeightRejection,
    },

    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    /// Out-of-range operation parameter (iteration count, empty region set, ...).
    #[error("{param} out of range: {value} (expected {expected})")]
    OutOfRange {
        param: &'static str,
        value: String,
        expected: String,
    },

    /// Internal contract breach between components; indicates a caller defect.
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl EngineError {
    pub fn validation(context: ErrorContext, reason: impl Into<String>) -> Self {
        EngineError::Validation { context, reason: reason.into() }
    }

    pub fn out_of_range(
        param: &'static str,
        value: impl fmt::Display,
        expected: impl Into<String>,
    ) -> Self {
        EngineError::OutOfRange {
            param,
            value: value.to_string(),
            expected: expected.into(),
        }
    }

    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        EngineError::NotFound { kind, key: key.into() }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
