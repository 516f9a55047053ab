//! JSON file adapter for [`ConfigPort`].

use std::path::PathBuf;

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::DeviceConfig;

/// Default config location on the device filesystem.
pub const DEVICE_CONFIG_PATH: &str = "/usr/config.json";

pub struct JsonFileConfig {
    path: PathBuf,
}

impl JsonFileConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigPort for JsonFileConfig {
    fn load(&self) -> Result<DeviceConfig, ConfigError> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            warn!("config: {}: {}", self.path.display(), e);
            ConfigError::NotFound
        })?;
        let config = DeviceConfig::from_json(&text)?;
        info!("config: loaded {}", self.path.display());
        Ok(config)
    }
}
