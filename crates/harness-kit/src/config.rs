//! Harness configuration file loading.

use std::path::Path;

use indexmap::IndexMap;

use crate::errors::ConfigError;
use crate::network::{NetworkConfig, DEFAULT_DEVNET_NETWORK};

pub const DEFAULT_HARNESS_MANIFEST_PATH: &str = "harness.toml";

/// The harness configuration file: a `default_network` pointer plus one
/// `[networks.<name>]` table per target network.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HarnessConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_network: Option<String>,
    #[serde(default)]
    pub networks: IndexMap<String, NetworkConfig>,
}

impl HarnessConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::parse(&raw, &path.display().to_string())
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Self::parse(raw, "<inline>")
    }

    fn parse(raw: &str, path: &str) -> Result<Self, ConfigError> {
        let mut config: HarnessConfig = toml::from_str(raw).map_err(|e| ConfigError::Parse {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        // Network tables carry their name in the table key.
        for (name, network) in config.networks.iter_mut() {
            network.name = name.clone();
        }
        Ok(config)
    }

    /// Resolve a network by name. `None` falls back to `default_network`,
    /// then to the built-in local devnet.
    pub fn network(&self, name: Option<&str>) -> Result<NetworkConfig, ConfigError> {
        match name.or(self.default_network.as_deref()) {
            Some(name) => self
                .networks
                .get(name)
                .cloned()
                .ok_or_else(|| ConfigError::UnknownNetwork(name.to_string())),
            None => Ok(DEFAULT_DEVNET_NETWORK.clone()),
        }
    }
}
