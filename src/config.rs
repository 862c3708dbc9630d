//! Configuration management for PeerChain

use crate::error::{ChainError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Address peers use to reach this node, e.g. `http://127.0.0.1:5000`.
    pub node_address: String,
    #[serde(default)]
    pub seed_peers: Vec<String>,
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default = "default_peer_timeout_ms")]
    pub peer_timeout_ms: u64,
}

impl Config {
    /// Config with defaults for everything but the node address.
    pub fn new(node_address: impl Into<String>) -> Self {
        Self {
            node_address: node_address.into(),
            seed_peers: Vec::new(),
            listen: default_listen(),
            peer_timeout_ms: default_peer_timeout_ms(),
        }
    }

    pub fn with_seed_peers<I, S>(mut self, peers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.seed_peers = peers.into_iter().map(Into::into).collect();
        self
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            ChainError::ConfigError(format!("reading config file `{}`: {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.node_address.trim().is_empty() {
            return Err(ChainError::ConfigError("node_address must be set".to_string()));
        }
        if self.peer_timeout_ms == 0 {
            return Err(ChainError::ConfigError(
                "peer_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn peer_timeout(&self) -> Duration {
        Duration::from_millis(self.peer_timeout_ms)
    }
}

fn default_listen() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_peer_timeout_ms() -> u64 {
    3000
}
