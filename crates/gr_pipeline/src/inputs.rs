//! Per-region bundle of normalized extracts.

use serde::{Deserialize, Serialize};

use gr_algo::{ConflictExtract, GovernanceExtract, SentimentExtract, SourceExtract};
use gr_core::{Factor, RegionId};

/// Whatever the upstream clients produced for one region. A missing extract
/// leaves its factor(s) to the aggregator's neutral imputation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionInputs {
    pub region: RegionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict: Option<ConflictExtract>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<SentimentExtract>,
    /// Feeds both the political and the economic factor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub governance: Option<GovernanceExtract>,
}

impl RegionInputs {
    pub fn new(region: RegionId) -> Self {
        Self { region, conflict: None, sentiment: None, governance: None }
    }

    pub fn with_conflict(mut self, e: ConflictExtract) -> Self {
        self.conflict = Some(e);
        self
    }

    pub fn with_sentiment(mut self, e: SentimentExtract) -> Self {
        self.sentiment = Some(e);
        self
    }

    pub fn with_governance(mut self, e: GovernanceExtract) -> Self {
        self.governance = Some(e);
        self
    }

    /// `(factor, extract)` pairs available, canonical factor order.
    pub fn extracts(&self) -> Vec<(Factor, SourceExtract)> {
        let mut out = Vec::with_capacity(4);
        if let Some(e) = &self.conflict {
            out.push((Factor::Conflict, SourceExtract::Conflict(e.clone())));
        }
        if let Some(e) = &self.sentiment {
            out.push((Factor::Sentiment, SourceExtract::Sentiment(e.clone())));
        }
        if let Some(e) = &self.governance {
            out.push((Factor::Political, SourceExtract::Governance(e.clone())));
            out.push((Factor::Economic, SourceExtract::Governance(e.clone())));
        }
        out
    }
}
