//! Simulator configuration
//!
//! Defaults match the reference device; every field can come from a TOML
//! file and be overridden per-flag on the command line.

use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CONTROL_PORT, DEFAULT_DATA_PORT, DEFAULT_STREAM_TIMEOUT_MS, DEFAULT_TICK_PERIOD_MS,
};
use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// Address both UDP channels bind to
    pub bind_address: IpAddr,
    /// Control channel port
    pub control_port: u16,
    /// Data (telemetry) channel port
    pub data_port: u16,
    /// Waveform tick period in milliseconds
    pub tick_period_ms: u64,
    /// Subscriber liveness timeout in milliseconds
    pub stream_timeout_ms: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::from([127, 0, 0, 1]),
            control_port: DEFAULT_CONTROL_PORT,
            data_port: DEFAULT_DATA_PORT,
            tick_period_ms: DEFAULT_TICK_PERIOD_MS,
            stream_timeout_ms: DEFAULT_STREAM_TIMEOUT_MS,
        }
    }
}

impl SimConfig {
    /// Load from a TOML file; missing keys keep their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_period_ms == 0 {
            return Err(ConfigError::InvalidValue("tick_period_ms must be > 0".into()).into());
        }
        if self.stream_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue("stream_timeout_ms must be > 0".into()).into());
        }
        if self.control_port == self.data_port && self.control_port != 0 {
            return Err(ConfigError::InvalidValue(format!(
                "control and data channels share port {}",
                self.control_port
            ))
            .into());
        }
        Ok(())
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    pub fn stream_timeout(&self) -> Duration {
        Duration::from_millis(self.stream_timeout_ms)
    }
}
