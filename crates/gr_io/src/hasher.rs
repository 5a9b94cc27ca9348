//! Deterministic hashing and ID builders for audit records.
//!
//! - Canonical JSON hashing: sorted object keys, array order preserved.
//! - Hex digests are **lowercase**.
//! - `SIM:<hex>` identifies a simulation result by its canonical bytes, so two
//!   runs with identical inputs and seed share an id.

use serde::Serialize;
use sha2::{Digest, Sha256};

use gr_core::SimulationResult;

use crate::canonical_json::canonical_bytes_of;
use crate::{IoError, IoResult};

pub const SIM_PREFIX: &str = "SIM:";

/// SHA-256 over raw bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// SHA-256 over **canonical JSON bytes** of any serializable value.
pub fn sha256_canonical<T: Serialize>(value: &T) -> IoResult<String> {
    Ok(sha256_hex(&canonical_bytes_of(value)?))
}

/// `SIM:<sha256>` of a simulation result.
pub fn simulation_digest(result: &SimulationResult) -> IoResult<String> {
    Ok(format!("{SIM_PREFIX}{}", sha256_canonical(result)?))
}

/// Check a `SIM:` digest shape (prefix + 64 lowercase hex).
pub fn parse_simulation_digest(s: &str) -> IoResult<&str> {
    let hex64 = s
        .strip_prefix(SIM_PREFIX)
        .ok_or_else(|| IoError::Hash(format!("missing {SIM_PREFIX} prefix: {s}")))?;
    if hex64.len() != 64 || !hex64.bytes().all(|c| matches!(c, b'0'..=b'9' | b'a'..=b'f')) {
        return Err(IoError::Hash(format!("expected 64 lowercase hex chars: {s}")));
    }
    Ok(hex64)
}
