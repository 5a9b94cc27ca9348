//! Change and threshold alerts for one region's composite score.

use tracing::debug;

use gr_core::variables::AlertThresholds;
use gr_core::{Alert, AlertKind, AlertSeverity, CompositeScore, EngineError, EngineResult, ErrorContext, RegionId};

/// Relative change in percent; infinite when moving off a zero baseline.
pub fn relative_change_pct(previous: f64, current: f64) -> f64 {
    let delta = (current - previous).abs();
    if previous > 0.0 {
        delta / previous * 100.0
    } else if delta == 0.0 {
        0.0
    } else {
        f64::INFINITY
    }
}

#[derive(Debug, Clone, Default)]
pub struct AlertEvaluator {
    thresholds: AlertThresholds,
}

impl AlertEvaluator {
    pub fn new(thresholds: AlertThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &AlertThresholds {
        &self.thresholds
    }

    pub fn evaluate(
        &self,
        region: &RegionId,
        current: &CompositeScore,
        previous: Option<&CompositeScore>,
    ) -> EngineResult<Vec<Alert>> {
        evaluate(region, current, previous, &self.thresholds)
    }
}

/// Alerts raised by moving from `previous` to `current`: at most one change
/// alert, then one breach alert per configured level crossed from below.
pub fn evaluate(
    region: &RegionId,
    current: &CompositeScore,
    previous: Option<&CompositeScore>,
    thresholds: &AlertThresholds,
) -> EngineResult<Vec<Alert>> {
    for (name, s) in [("current", Some(current)), ("previous", previous)] {
        if let Some(s) = s {
            if &s.region != region {
                return Err(EngineError::validation(
                    ErrorContext::field(name).with_region(region),
                    format!("composite belongs to region {}", s.region),
                ));
            }
        }
    }

    let at = current.computed_at;
    let after = current.value;
    let before = previous.map(|p| p.value);
    let mut out = Vec::new();

    match before {
        None => debug!(region = %region, score = after, "baseline established"),
        Some(prev) => {
            let delta = after - prev;
            let pct = relative_change_pct(prev, after);
            let by_pct = pct >= thresholds.change_pct;
            let by_points = thresholds.min_change_points.is_some_and(|pts| delta.abs() >= pts);
            if delta != 0.0 && (by_pct || by_points) {
                let kind = if delta > 0.0 { AlertKind::ScoreIncrease } else { AlertKind::ScoreDecrease };
                out.push(Alert {
                    id: Alert::make_id(region, kind, at, None),
                    region: region.clone(),
                    kind,
                    severity: thresholds.bands.classify(pct),
                    score_before: Some(prev),
                    score_after: after,
                    change_pct: pct.is_finite().then_some(pct),
                    threshold: None,
                    triggered_at: at,
                    read: false,
                });
            }
        }
    }

    for lvl in &thresholds.breach_levels {
        let crossed = after >= lvl.level && before.map_or(true, |b| b < lvl.level);
        if crossed {
            out.push(Alert {
                id: Alert::make_id(region, AlertKind::ThresholdBreach, at, Some(lvl.level)),
                region: region.clone(),
                kind: AlertKind::ThresholdBreach,
                severity: lvl.severity,
                score_before: before,
                score_after: after,
                change_pct: None,
                threshold: Some(lvl.level),
                triggered_at: at,
                read: false,
            });
        }
    }

    if !out.is_empty() {
        debug!(region = %region, count = out.len(), "alerts raised");
    }
    Ok(out)
}

/// Highest severity among `alerts`.
pub fn max_severity(alerts: &[Alert]) -> Option<AlertSeverity> {
    alerts.iter().map(|a| a.severity).max()
}
