//! Alert records emitted by the alert evaluator.

use core::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::RegionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    ScoreIncrease,
    ScoreDecrease,
    ThresholdBreach,
}

impl AlertKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            AlertKind::ScoreIncrease => "score_increase",
            AlertKind::ScoreDecrease => "score_decrease",
            AlertKind::ThresholdBreach => "threshold_breach",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    pub const fn as_str(self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
            AlertSeverity::Critical => "critical",
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// `ALR:<region>:<kind>:<rfc3339>[:<threshold>]`, stable for identical inputs.
    pub id: String,
    pub region: RegionId,
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    /// `None` when no prior score existed (baseline establishment).
    pub score_before: Option<f64>,
    pub score_after: f64,
    /// Relative change in percent, for change alerts.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub change_pct: Option<f64>,
    /// Absolute level crossed, for threshold breaches.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub threshold: Option<f64>,
    pub triggered_at: DateTime<Utc>,
    pub read: bool,
}

impl Alert {
    /// Build the deterministic alert id.
    pub fn make_id(
        region: &RegionId,
        kind: AlertKind,
        triggered_at: DateTime<Utc>,
        threshold: Option<f64>,
    ) -> String {
        let ts = triggered_at.to_rfc3339_opts(SecondsFormat::Secs, true);
        match threshold {
            Some(t) => format!("ALR:{region}:{kind}:{ts}:{t}"),
            None => format!("ALR:{region}:{kind}:{ts}"),
        }
    }

    /// The only mutation an alert ever sees.
    pub fn mark_read(&mut self) {
        self.read = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn ids_are_stable_and_distinguish_thresholds() {
        let region: RegionId = "UKR".parse().unwrap();
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let a = Alert::make_id(&region, AlertKind::ThresholdBreach, at, Some(70.0));
        let b = Alert::make_id(&region, AlertKind::ThresholdBreach, at, Some(85.0));
        assert_eq!(a, "ALR:UKR:threshold_breach:2024-03-01T12:00:00Z:70");
        assert_ne!(a, b);
    }

    #[test]
    fn severity_orders_low_to_critical() {
        assert!(AlertSeverity::Low < AlertSeverity::Medium);
        assert!(AlertSeverity::High < AlertSeverity::Critical);
        assert_eq!(serde_json::to_string(&AlertKind::ScoreIncrease).unwrap(), "\"score_increase\"");
    }
    #[test]
    fn mark_read_only_flips_the_read_flag() {
        let region: RegionId = "SDN".parse().unwrap();
        let at = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();
        let mut alert = Alert {
            id: Alert::make_id(&region, AlertKind::ScoreIncrease, at, None),
            region,
            kind: AlertKind::ScoreIncrease,
            severity: AlertSeverity::High,
            score_before: Some(40.0),
            score_after: 55.0,
            change_pct: Some(37.5),
            threshold: None,
            triggered_at: at,
            read: false,
        };
        let before = alert.clone();
        alert.mark_read();
        assert!(alert.read);
        alert.mark_read();
        assert!(alert.read);
        assert_eq!(Alert { read: false, ..alert }, before);
    }
}
