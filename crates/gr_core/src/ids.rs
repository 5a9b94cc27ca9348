//! Region identifiers and reference data.
//!
//! A `RegionId` is either an ISO-3166 code (`UKR`, `TW`) or a canonical region
//! name (`United Kingdom`, `Sahel`). The charset is deliberately loose for
//! names, but empty ids, surrounding whitespace and control characters are
//! rejected so ids stay usable as stable map keys.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, ErrorContext};

const MAX_REGION_ID_LEN: usize = 64;

fn is_region_token(s: &str) -> bool {
    if s.is_empty() || s.len() > MAX_REGION_ID_LEN {
        return false;
    }
    if s.trim() != s {
        return false;
    }
    s.chars().all(|c| !c.is_control())
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RegionId(String);

impl RegionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RegionId {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if is_region_token(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(EngineError::validation(
                ErrorContext::field("region"),
                format!("invalid region id {s:?}"),
            ))
        }
    }
}

impl TryFrom<String> for RegionId {
    type Error = EngineError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if is_region_token(&s) {
            Ok(Self(s))
        } else {
            Err(EngineError::validation(
                ErrorContext::field("region"),
                format!("invalid region id {s:?}"),
            ))
        }
    }
}

impl From<RegionId> for String {
    fn from(id: RegionId) -> Self {
        id.0
    }
}

/// Immutable region reference data, created at configuration load.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
}
