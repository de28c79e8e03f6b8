use arkgen_core::{ArkgenError, GeneratorConfig, NetworkParams, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// On-disk settings. Every field is optional in the file; missing ones fall
/// back to the per-network defaults of [`GeneratorConfig::new`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub network: String,
    pub ark_server_url: Option<String>,
    pub request_timeout_secs: u64,
    pub default_exit_delay: Option<u64>,
    pub networks: Vec<NetworkParams>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            network: "regtest".to_string(),
            ark_server_url: None,
            request_timeout_secs: 30,
            default_exit_delay: None,
            networks: Vec::new(),
        }
    }
}

impl CliConfig {
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("arkgen")
            .join("config.json")
    }

    /// Reads `path`, or the default location when none is given. A missing
    /// default file is not an error; a missing explicit one is.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (Self::default_path(), false),
        };

        if !path.exists() {
            if explicit {
                return Err(ArkgenError::config(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            }
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&path)?;
        let config: CliConfig = serde_json::from_str(&contents)?;
        tracing::debug!(path = %path.display(), network = %config.network, "Loaded config");
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Switching networks drops a server URL that was only the file's
    /// choice for the previous network.
    pub fn set_network(&mut self, network: &str) {
        let network = network.trim().to_ascii_lowercase();
        if network != self.network {
            self.ark_server_url = None;
        }
        self.network = network;
    }

    pub fn generator_config(&self) -> GeneratorConfig {
        let mut config = GeneratorConfig::new(&self.network);
        if let Some(url) = &self.ark_server_url {
            config.ark_server_url = url.clone();
        }
        config.request_timeout = Duration::from_secs(self.request_timeout_secs);
        config.default_exit_delay = self.default_exit_delay;
        config.networks = self.networks.clone();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"network": "mutinynet", "default_exit_delay": 512}"#).unwrap();

        let config = CliConfig::load(Some(&path)).unwrap();
        assert_eq!(config.network, "mutinynet");
        assert_eq!(config.request_timeout_secs, 30);

        let generator_config = config.generator_config();
        assert_eq!(generator_config.ark_server_url, "https://mutinynet.arkade.sh");
        assert_eq!(generator_config.default_exit_delay, Some(512));
        generator_config.validate().unwrap();
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = CliConfig::default();
        config.ark_server_url = Some("http://127.0.0.1:7070".to_string());
        config.save(&path).unwrap();

        let loaded = CliConfig::load(Some(&path)).unwrap();
        assert_eq!(
            loaded.generator_config().ark_server_url,
            "http://127.0.0.1:7070"
        );
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.json");
        assert!(matches!(
            CliConfig::load(Some(&path)),
            Err(ArkgenError::Config(_))
        ));
    }

    #[test]
    fn test_network_flag_overrides_file() {
        let mut config = CliConfig {
            ark_server_url: Some("http://10.0.0.1:7070".to_string()),
            ..CliConfig::default()
        };
        config.set_network("Signet");
        assert_eq!(config.network, "signet");
        assert_eq!(
            config.generator_config().ark_server_url,
            "https://signet.arkade.sh"
        );

        let mut config = CliConfig {
            ark_server_url: Some("http://10.0.0.1:7070".to_string()),
            ..CliConfig::default()
        };
        config.set_network("regtest");
        assert_eq!(
            config.generator_config().ark_server_url,
            "http://10.0.0.1:7070"
        );
    }
}
