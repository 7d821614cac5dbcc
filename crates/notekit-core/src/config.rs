use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{RELAY_URL, SUBSCRIPTION_BUFFER};
use crate::crypto::EncEncoding;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Core configuration that can be loaded from a JSON file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CoreConfig {
    /// Relays new subscriptions are issued against
    pub relay_urls: Vec<String>,

    /// Capacity of each subscription's bounded delivery channel
    pub subscription_buffer: usize,

    /// Wire encoding used for outgoing direct messages
    pub dm_encoding: EncEncoding,

    /// Append logs to this file in addition to stderr
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,

    /// Default level directive when NOTEKIT_LOG is unset
    pub log_level: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            relay_urls: vec![RELAY_URL.to_string()],
            subscription_buffer: SUBSCRIPTION_BUFFER,
            dm_encoding: EncEncoding::Base64,
            log_file: None,
            log_level: "info".to_string(),
        }
    }
}

impl CoreConfig {
    /// Load config from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Load from `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: CoreConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.subscription_buffer == 0 {
            return Err(ConfigError::Invalid(
                "subscriptionBuffer must be at least 1".to_string(),
            ));
        }
        if let Some(bad) = self
            .relay_urls
            .iter()
            .find(|url| !(url.starts_with("wss://") || url.starts_with("ws://")))
        {
            return Err(ConfigError::Invalid(format!(
                "relay url must use ws:// or wss://: {}",
                bad
            )));
        }
        Ok(())
    }
}

/// Default location of the JSON config file
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("notekit").join("config.json"))
        .unwrap_or_else(|| PathBuf::from("notekit.json"))
}
