use std::path::Path;

use anyhow::{Context, Result};
use nostr_sdk::prelude::Keys;
use notekit_core::CoreConfig;
use serde::{Deserialize, Serialize};

/// CLI configuration that can be loaded from a JSON file.
///
/// Core settings sit at the top level next to `credentials`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CliConfig {
    #[serde(flatten)]
    pub core: CoreConfig,

    /// Credentials for signing and decryption
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Credentials>,
}

/// Nostr credentials configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    /// nsec or 64-char hex secret key
    pub key: String,
}

impl CliConfig {
    /// Load config from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: CliConfig = serde_json::from_str(json).context("Failed to deserialize config")?;
        config.core.validate()?;
        Ok(config)
    }

    /// Signing keys: `override_key` wins over the configured credentials.
    pub fn keys(&self, override_key: Option<&str>) -> Result<Keys> {
        let key = override_key
            .or_else(|| self.credentials.as_ref().map(|c| c.key.as_str()))
            .context("No key configured: pass --nsec or set credentials.key in the config")?;
        Keys::parse(key).context("Invalid secret key")
    }
}
