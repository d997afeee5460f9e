use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_BRIDGE_ADDR: &str = "127.0.0.1:9001";

/// Substring that marks the synth's output port in enumeration.
pub const DEFAULT_DEVICE_MARKER: &str = "JT-4000M";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub client_name: String,
    pub preferred_device_marker: String,
    /// Random patches switch a toggle on with odds `toggle_on_weight / toggle_choices`.
    pub toggle_on_weight: u32,
    pub toggle_choices: u32,
    pub bridge_addr: String,
    pub device_poll_interval_ms: u64,
    pub tick_interval_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            client_name: "jt-control".to_string(),
            preferred_device_marker: DEFAULT_DEVICE_MARKER.to_string(),
            toggle_on_weight: 1,
            toggle_choices: 3,
            bridge_addr: DEFAULT_BRIDGE_ADDR.to_string(),
            device_poll_interval_ms: 500,
            tick_interval_ms: 16,
        }
    }
}

impl EngineConfig {
    /// Reads a JSON config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        if !path.exists() {
            info!("config not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        info!("loading config from {:?}", path);
        let raw = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.toggle_choices == 0 {
            return Err(EngineError::Config("toggle_choices must be > 0".to_string()));
        }
        if self.toggle_on_weight > self.toggle_choices {
            return Err(EngineError::Config(format!(
                "toggle_on_weight ({}) exceeds toggle_choices ({})",
                self.toggle_on_weight, self.toggle_choices
            )));
        }
        Ok(())
    }

    pub fn device_poll_interval(&self) -> Duration {
        Duration::from_millis(self.device_poll_interval_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}
