//! gr_io: the engine's edges.
//!
//! - `config`: JSON configuration files → validated `EngineConfig`
//! - `canonical_json` / `hasher`: sorted-key JSON bytes and SHA-256 digests for audit records
//! - `history`: the `ScoreHistory` and `PresetStore` collaborator contracts with in-memory stores
//!
//! No network I/O.

#![forbid(unsafe_code)]

use thiserror::Error;

use gr_core::EngineError;

/// Unified error for gr_io (config, canonical_json, hasher).
#[derive(Debug, Error)]
pub enum IoError {
    /// Filesystem / path errors.
    #[error("io/path error: {0}")]
    Path(String),

    /// JSON (de)serialization errors with the line/column serde_json reports.
    #[error("json error at {pointer}: {msg}")]
    Json { pointer: String, msg: String },

    #[error("hash error: {0}")]
    Hash(String),

    /// Loaded content failed domain validation.
    #[error("invalid: {0}")]
    Invalid(#[from] EngineError),
}

pub type IoResult<T> = Result<T, IoError>;

/* ---------------- From conversions (used by file modules) ---------------- */

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Path(e.to_string())
    }
}

impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        let pointer = if e.line() > 0 { format!("line {} column {}", e.line(), e.column()) } else { "/".to_string() };
        IoError::Json { pointer, msg: e.to_string() }
    }
}

pub mod canonical_json;
pub mod config;
pub mod hasher;
pub mod history;

pub use config::{config_from_str, load_config};
pub use hasher::{sha256_canonical, simulation_digest};
pub use history::{HistoryKey, InMemoryHistory, InMemoryPresetStore, PresetStore, ScoreHistory};
