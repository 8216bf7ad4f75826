use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tipjar_sdk::TipJarConfig;

use crate::error::{ServerError, ServerResult};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub tipjar: TipJarConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8787)),
            tipjar: TipJarConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(input: &str) -> ServerResult<Self> {
        toml::from_str(input).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> ServerResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }
}
