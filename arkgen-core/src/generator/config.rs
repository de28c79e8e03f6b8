use crate::address::{NetworkParams, NetworkTable};
use crate::ark::CsvTimelock;
use crate::error::{ArkgenError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub network: String,
    pub ark_server_url: String,
    pub request_timeout: Duration,
    /// Used by manual generation when the caller gives no delay.
    #[serde(default)]
    pub default_exit_delay: Option<u64>,
    /// Extra or overriding network parameters.
    #[serde(default)]
    pub networks: Vec<NetworkParams>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            network: "regtest".to_string(),
            ark_server_url: "http://localhost:7070".to_string(),
            request_timeout: Duration::from_secs(30),
            default_exit_delay: None,
            networks: Vec::new(),
        }
    }
}

impl GeneratorConfig {
    pub fn new(network: &str) -> Self {
        let mut config = Self {
            network: network.trim().to_ascii_lowercase(),
            ..Self::default()
        };

        match config.network.as_str() {
            "mutinynet" => {
                config.ark_server_url = "https://mutinynet.arkade.sh".to_string();
            }
            "signet" => {
                config.ark_server_url = "https://signet.arkade.sh".to_string();
            }
            "bitcoin" | "mainnet" => {
                config.ark_server_url = "https://arkade.computer".to_string();
            }
            _ => {
                // keep the local default for regtest and anything else
            }
        }

        config
    }

    pub fn network_table(&self) -> NetworkTable {
        NetworkTable::with_custom(self.networks.iter().cloned())
    }

    pub fn validate(&self) -> Result<()> {
        if self.ark_server_url.trim().is_empty() {
            return Err(ArkgenError::config("Ark server URL cannot be empty"));
        }

        if !self.ark_server_url.starts_with("http://") && !self.ark_server_url.starts_with("https://")
        {
            return Err(ArkgenError::config(format!(
                "Ark server URL must be http(s): {}",
                self.ark_server_url
            )));
        }

        if self.request_timeout.is_zero() {
            return Err(ArkgenError::config("Request timeout must be greater than 0"));
        }

        if let Some(delay) = self.default_exit_delay {
            CsvTimelock::from_exit_delay(delay)?;
        }

        for params in &self.networks {
            if params.name.trim().is_empty() {
                return Err(ArkgenError::config("Custom network name cannot be empty"));
            }
        }

        self.network_table().get(&self.network)?;
        Ok(())
    }
}
