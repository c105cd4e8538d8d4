//! Engine configuration.

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::leveling::LevelingMode;

pub const ENV_MAX_LEVELING_ITERATIONS: &str = "SCHEDULE_ENGINE_MAX_LEVELING_ITERATIONS";
pub const ENV_LEVELING_MODE: &str = "SCHEDULE_ENGINE_LEVELING_MODE";
pub const ENV_MAX_CRITICAL_CHAINS: &str = "SCHEDULE_ENGINE_MAX_CRITICAL_CHAINS";

/// Bounds and defaults for one [`ScheduleEngine`](crate::engine::ScheduleEngine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Conflicts the leveler may work through before giving up.
    pub max_leveling_iterations: usize,
    /// Mode used when the caller does not name one.
    pub default_leveling_mode: LevelingMode,
    /// Cap on enumerated critical chains per schedule.
    pub max_critical_chains: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_leveling_iterations: 10_000,
            default_leveling_mode: LevelingMode::WithinFloat,
            max_critical_chains: 64,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_leveling_iterations == 0 {
            return Err("max_leveling_iterations must be greater than 0".into());
        }
        if self.max_critical_chains == 0 {
            return Err("max_critical_chains must be greater than 0".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: EngineConfig =
            serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let input = fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        Self::from_json_str(&input)
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self, String> {
        Self::default().with_env_overrides()
    }

    /// Applies `SCHEDULE_ENGINE_*` variables on top of `self`.
    pub fn with_env_overrides(mut self) -> Result<Self, String> {
        if let Ok(raw) = env::var(ENV_MAX_LEVELING_ITERATIONS) {
            self.max_leveling_iterations = raw
                .trim()
                .parse()
                .map_err(|e| format!("{ENV_MAX_LEVELING_ITERATIONS}: {e}"))?;
        }
        if let Ok(raw) = env::var(ENV_LEVELING_MODE) {
            self.default_leveling_mode = raw
                .parse()
                .map_err(|e| format!("{ENV_LEVELING_MODE}: {e}"))?;
        }
        if let Ok(raw) = env::var(ENV_MAX_CRITICAL_CHAINS) {
            self.max_critical_chains = raw
                .trim()
                .parse()
                .map_err(|e| format!("{ENV_MAX_CRITICAL_CHAINS}: {e}"))?;
        }
        self.validate()?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg = EngineConfig::from_json_str(r#"{ "default_leveling_mode": "allow_extension" }"#)
            .unwrap();
        assert_eq!(cfg.default_leveling_mode, LevelingMode::AllowExtension);
        assert_eq!(cfg.max_leveling_iterations, 10_000);
    }

    #[test]
    fn zero_bounds_are_rejected() {
        let err = EngineConfig::from_json_str(r#"{ "max_critical_chains": 0 }"#).unwrap_err();
        assert!(err.contains("max_critical_chains"));
        assert!(EngineConfig::from_json_str("not json").is_err());
    }
}
