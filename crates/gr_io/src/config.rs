//! Engine configuration from JSON.
//!
//! Omitted sections take their defaults; unknown keys are rejected. The parsed
//! config is validated before it is returned.

use std::fs;
use std::path::Path;

use tracing::debug;

use gr_core::EngineConfig;

use crate::IoResult;

pub fn config_from_str(s: &str) -> IoResult<EngineConfig> {
    let cfg: EngineConfig = serde_json::from_str(s)?;
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_config(path: &Path) -> IoResult<EngineConfig> {
    let text = fs::read_to_string(path)?;
    let cfg = config_from_str(&text)?;
    debug!(path = %path.display(), active_preset = %cfg.weights.active, "engine config loaded");
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IoError;
    use gr_core::variables::DecayCurve;
    use std::io::Write;

    #[test]
    fn empty_object_is_the_default_config() {
        assert_eq!(config_from_str("{}").unwrap(), EngineConfig::default());
    }

    #[test]
    fn loads_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(
            f,
            r#"{{
                "simulation": {{"decay": "exponential", "default_seed": 7}},
                "weights": {{"active": "desk", "presets": {{"desk": {{"conflict": 2, "sentiment": 1, "political": 1, "economic": 0}}}}}}
            }}"#
        )
        .unwrap();
        let cfg = load_config(f.path()).unwrap();
        assert_eq!(cfg.simulation.decay, DecayCurve::Exponential);
        assert_eq!(cfg.simulation.default_seed, 7);
        assert_eq!(cfg.weights.presets["desk"].conflict, 2.0);
    }

    #[test]
    fn unknown_keys_and_bad_domains_fail() {
        assert!(matches!(config_from_str(r#"{"cache_ttl": 60}"#), Err(IoError::Json { .. })));
        assert!(matches!(
            config_from_str(r#"{"simulation": {"spillover_fraction": 2.0}}"#),
            Err(IoError::Invalid(_))
        ));
    }

    #[test]
    fn missing_file_is_a_path_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load_config(&dir.path().join("nope.json")), Err(IoError::Path(_))));
    }
}
