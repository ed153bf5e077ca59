use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::device::protocol::BAUD_RATE;
use crate::device::LedRequest;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub serial: SerialConfig,
    pub display: DisplayConfig,
    /// Tracing filter used when RUST_LOG is unset
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            serial: SerialConfig::default(),
            display: DisplayConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&contents)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Parse configuration text
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, contents)?;
        Ok(())
    }

    /// Get config file path
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")?;
        Ok(PathBuf::from(home).join(".config/tuxctl/config.toml"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Serial device the board is attached to
    pub port: String,
    /// Line speed
    pub baud: u32,
    /// Outbound commands that may wait for the writer before sends are rejected
    pub queue_depth: usize,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyS0".to_string(),
            baud: BAUD_RATE,
            queue_depth: 32,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Raw LED request shown right after init
    pub startup: Option<u32>,
}

impl DisplayConfig {
    pub fn startup_request(&self) -> Option<LedRequest> {
        self.startup.map(LedRequest::from_raw)
    }
}
