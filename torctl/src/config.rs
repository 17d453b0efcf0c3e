//! Configuration management for the control client

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Control port used when no address is configured
pub const DEFAULT_CONTROL_ADDR: &str = "127.0.0.1:9051";

/// Control client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// `host:port` of the control port
    #[serde(default = "default_address")]
    pub address: String,

    /// Password for `AUTHENTICATE`; none means bare authentication
    #[serde(default)]
    pub password: Option<String>,
}

fn default_address() -> String {
    DEFAULT_CONTROL_ADDR.to_string()
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            password: None,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let address = std::env::var("TOR_CONTROL_ADDR")
            .ok()
            .filter(|a| !a.is_empty())
            .unwrap_or_else(default_address);

        let password = std::env::var("TOR_CONTROL_PASSWORD").ok();

        Self { address, password }
    }

    /// Load configuration from a YAML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("~/.config"));
        config_dir.join("torctl").join("config.yaml")
    }

    /// Load from default locations (file first, then env)
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path();

        if config_path.exists() {
            Self::from_file(&config_path)
        } else {
            Ok(Self::from_env())
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_from_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        std::fs::write(
            &config_path,
            r#"
address: 10.1.2.3:9151
password: hunter2
"#,
        )
        .unwrap();

        let config = ControllerConfig::from_file(&config_path).unwrap();

        assert_eq!(config.address, "10.1.2.3:9151");
        assert_eq!(config.password.as_deref(), Some("hunter2"));
    }

    #[test]
    fn test_config_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        std::fs::write(&config_path, "password: null\n").unwrap();

        let config = ControllerConfig::from_file(&config_path).unwrap();

        assert_eq!(config.address, "127.0.0.1:9051");
        assert!(config.password.is_none());
    }

    #[test]
    fn test_config_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        std::fs::write(&config_path, "address: [unterminated\n").unwrap();

        assert!(matches!(
            ControllerConfig::from_file(&config_path),
            Err(ConfigError::Yaml(_))
        ));
    }
}
