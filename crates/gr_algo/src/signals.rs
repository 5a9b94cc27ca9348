//! Early-warning signals read off a single composite score.

use serde::{Deserialize, Serialize};

use gr_core::{AlertSeverity, CompositeScore, Factor};

pub const FLASHPOINT_CONFLICT: f64 = 70.0;
pub const DESTABILIZATION_POLITICAL: f64 = 60.0;
pub const CRITICAL_COMPOSITE: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Flashpoint,
    Destabilization,
    CriticalStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub kind: SignalKind,
    pub severity: AlertSeverity,
    /// Factor that tripped the signal; `None` for composite-level signals.
    pub factor: Option<Factor>,
    pub value: f64,
}

pub fn detect(composite: &CompositeScore) -> Vec<Signal> {
    let raw = composite.raw_scores();
    let mut out = Vec::new();
    if raw.conflict > FLASHPOINT_CONFLICT {
        out.push(Signal {
            kind: SignalKind::Flashpoint,
            severity: AlertSeverity::High,
            factor: Some(Factor::Conflict),
            value: raw.conflict,
        });
    }
    if raw.political > DESTABILIZATION_POLITICAL {
        out.push(Signal {
            kind: SignalKind::Destabilization,
            severity: AlertSeverity::Medium,
            factor: Some(Factor::Political),
            value: raw.political,
        });
    }
    if composite.value > CRITICAL_COMPOSITE {
        out.push(Signal {
            kind: SignalKind::CriticalStatus,
            severity: AlertSeverity::Critical,
            factor: None,
            value: composite.value,
        });
    }
    out
}
