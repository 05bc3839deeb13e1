//! Placement configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Fraction of unreachable candidates at which a decision is reported as
/// degraded.
pub const DEFAULT_MAX_ACCEPTABLE_ERROR_RATE: f64 = 0.5;

/// Default bound on a single remote load probe.
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 2_000;

/// Settings for the placement core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Error rate (unreachable / candidates) at which a warning is raised.
    pub max_acceptable_error_rate: f64,
    /// Ledger half-life in seconds. `None` keeps the ledger purely additive.
    pub ledger_half_life_secs: Option<u64>,
    /// Timeout for one remote load probe, in milliseconds.
    pub probe_timeout_ms: u64,
    /// Historical `table,<ignored>,cost` samples for the trained model.
    pub training_data: Option<PathBuf>,
    /// Per-table decay curves for load reporting.
    pub decay_model: Option<PathBuf>,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            max_acceptable_error_rate: DEFAULT_MAX_ACCEPTABLE_ERROR_RATE,
            ledger_half_life_secs: None,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            training_data: None,
            decay_model: None,
        }
    }
}

impl PlacementConfig {
    /// Read and validate a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let rate = self.max_acceptable_error_rate;
        if !(rate > 0.0 && rate <= 1.0) {
            return Err(Error::Config(format!(
                "max_acceptable_error_rate must be in (0, 1], got {}",
                rate
            )));
        }
        if self.probe_timeout_ms == 0 {
            return Err(Error::Config("probe_timeout_ms must be positive".to_string()));
        }
        Ok(())
    }

    pub fn ledger_half_life(&self) -> Option<Duration> {
        self.ledger_half_life_secs.map(Duration::from_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PlacementConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_acceptable_error_rate, 0.5);
        assert_eq!(config.ledger_half_life(), None);
        assert_eq!(config.probe_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: PlacementConfig =
            serde_json::from_str(r#"{ "ledger_half_life_secs": 600 }"#).unwrap();
        assert_eq!(config.ledger_half_life(), Some(Duration::from_secs(600)));
        assert_eq!(config.max_acceptable_error_rate, 0.5);
        assert!(config.training_data.is_none());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = PlacementConfig {
            max_acceptable_error_rate: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        config.max_acceptable_error_rate = 1.5;
        assert!(config.validate().is_err());
        config.max_acceptable_error_rate = 1.0;
        config.probe_timeout_ms = 0;
        assert!(config.validate().is_err());
    }
}
