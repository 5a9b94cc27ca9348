//! One-step-ahead forecast by simple exponential smoothing.

use gr_core::{clamp_score, EngineError, EngineResult, NEUTRAL_SCORE};

pub const DEFAULT_ALPHA: f64 = 0.3;

/// Next value for `values` (oldest first). Empty history forecasts the neutral 50.
pub fn predict_next(values: &[f64], alpha: f64) -> EngineResult<f64> {
    if !(alpha.is_finite() && alpha > 0.0 && alpha <= 1.0) {
        return Err(EngineError::out_of_range("alpha", alpha, "(0, 1]"));
    }
    let Some((&first, rest)) = values.split_first() else {
        return Ok(NEUTRAL_SCORE);
    };
    let level = rest.iter().fold(first, |s, &x| alpha * x + (1.0 - alpha) * s);
    Ok(clamp_score(level))
}
