//! Digested scenario-run records.

use std::path::Path;

use serde::{Deserialize, Serialize};

use gr_core::SimulationResult;
use gr_io::{canonical_json, hasher, IoResult};

/// A simulation result plus its `SIM:<sha256>` content digest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRecord {
    pub digest: String,
    pub result: SimulationResult,
}

impl SimulationRecord {
    pub fn new(result: SimulationResult) -> IoResult<Self> {
        let digest = hasher::simulation_digest(&result)?;
        Ok(Self { digest, result })
    }

    /// Recompute the digest and compare.
    pub fn verify(&self) -> IoResult<bool> {
        Ok(hasher::simulation_digest(&self.result)? == self.digest)
    }

    /// Write as canonical JSON (atomic replace).
    pub fn write_to(&self, path: &Path) -> IoResult<()> {
        canonical_json::write_canonical_file(path, self)
    }
}
