//! Controller configuration
//!
//! Loaded from JSON. Every field has a default so an empty object `{}`
//! yields the stock 500 ms loop with no reverb hysteresis.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EffectsError, Result};

/// Default sampling period of the dynamic-mode loop in milliseconds.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 500;

/// Default thread name for the dynamic-mode worker.
pub const DEFAULT_WORKER_NAME: &str = "dynamic-mode";

/// Hysteresis must stay below the width of a reverb bucket.
const MAX_REVERB_HYSTERESIS: u8 = 33;

/// Tunables for [`crate::AudioEffectsController`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Period between two volume samples
    pub tick_interval_ms: u64,

    /// Volume points a level must travel past a reverb threshold before the
    /// preset changes. Zero keeps the plain step function.
    pub reverb_hysteresis: u8,

    /// Name given to the scheduler thread
    pub worker_name: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            reverb_hysteresis: 0,
            worker_name: DEFAULT_WORKER_NAME.to_string(),
        }
    }
}

impl ControllerConfig {
    /// Configuration with a custom tick interval and defaults elsewhere.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            tick_interval_ms: interval.as_millis() as u64,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Reject values the loop cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(EffectsError::InvalidConfig {
                reason: "tick_interval_ms must be greater than zero".to_string(),
            });
        }
        if self.reverb_hysteresis >= MAX_REVERB_HYSTERESIS {
            return Err(EffectsError::InvalidConfig {
                reason: format!(
                    "reverb_hysteresis must be below {} (got {})",
                    MAX_REVERB_HYSTERESIS, self.reverb_hysteresis
                ),
            });
        }
        if self.worker_name.trim().is_empty() {
            return Err(EffectsError::InvalidConfig {
                reason: "worker_name must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}
