//! # Site Configuration
//!
//! Persisted at `.compass/config.json`. A missing or unreadable file yields
//! defaults; command-line flags are merged on top.

use crate::orchestrator::{default_expected_servers, DEFAULT_BASE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default location of the persisted config
pub const CONFIG_PATH: &str = ".compass/config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Orchestrator base URL must be http(s): {0}")]
    InvalidBaseUrl(String),

    #[error("At least one expected server is required")]
    NoExpectedServers,

    #[error("Expected server names must not be blank")]
    BlankExpectedServer,
}

/// Server and probe settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Base URL of the probed orchestrator
    pub orchestrator_base: String,
    /// Providers the orchestrator must list in `servers_configured`
    pub expected_servers: Vec<String>,
    /// When set, probes are held to browser CORS rules for this origin
    pub probe_origin: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            orchestrator_base: DEFAULT_BASE.to_string(),
            expected_servers: default_expected_servers(),
            probe_origin: None,
        }
    }
}

/// Values that replace config fields when present
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub orchestrator_base: Option<String>,
    pub expected_servers: Option<Vec<String>>,
    pub probe_origin: Option<String>,
}

impl AppConfig {
    pub fn default_path() -> PathBuf {
        PathBuf::from(CONFIG_PATH)
    }

    pub async fn load() -> Self {
        Self::load_from(&Self::default_path()).await
    }

    pub async fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match tokio::fs::read_to_string(path).await {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), "Ignoring malformed config: {}", e);
                Self::default()
            }),
            Err(e) => {
                tracing::warn!(path = %path.display(), "Failed to read config: {}", e);
                Self::default()
            }
        }
    }

    pub async fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    pub fn merge(&mut self, other: ConfigOverrides) {
        if let Some(host) = other.host {
            self.host = host;
        }
        if let Some(port) = other.port {
            self.port = port;
        }
        if let Some(base) = other.orchestrator_base {
            self.orchestrator_base = base;
        }
        if let Some(servers) = other.expected_servers {
            self.expected_servers = servers;
        }
        if other.probe_origin.is_some() {
            self.probe_origin = other.probe_origin;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = self.orchestrator_base.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(self.orchestrator_base.clone()));
        }
        if self.expected_servers.is_empty() {
            return Err(ConfigError::NoExpectedServers);
        }
        if self.expected_servers.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::BlankExpectedServer);
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("compass-config-{}-{}", name, std::process::id()))
            .join("config.json")
    }

    #[tokio::test]
    async fn test_missing_file_is_default() {
        let config = AppConfig::load_from(Path::new("/definitely/not/here.json")).await;
        assert_eq!(config, AppConfig::default());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let path = temp_path("roundtrip");
        let mut config = AppConfig::default();
        config.port = 9191;
        config.probe_origin = Some("https://site.example".to_string());
        config.save_to(&path).await.unwrap();

        let loaded = AppConfig::load_from(&path).await;
        assert_eq!(loaded, config);

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
    }

    #[tokio::test]
    async fn test_partial_file_fills_defaults() {
        let path = temp_path("partial");
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, r#"{"port": 3000}"#).await.unwrap();

        let loaded = AppConfig::load_from(&path).await;
        assert_eq!(loaded.port, 3000);
        assert_eq!(loaded.orchestrator_base, DEFAULT_BASE);
        assert_eq!(loaded.expected_servers, default_expected_servers());

        tokio::fs::write(&path, "{broken").await.unwrap();
        assert_eq!(AppConfig::load_from(&path).await, AppConfig::default());

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
    }

    #[test]
    fn test_merge_only_present_fields() {
        let mut config = AppConfig::default();
        config.merge(ConfigOverrides {
            port: Some(4000),
            ..Default::default()
        });
        assert_eq!(config.port, 4000);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.bind_addr(), "127.0.0.1:4000");
        assert_eq!(config.expected_servers, default_expected_servers());

        config.merge(ConfigOverrides {
            expected_servers: Some(vec!["clock".to_string()]),
            ..Default::default()
        });
        assert_eq!(config.expected_servers, vec!["clock".to_string()]);
        assert_eq!(config.port, 4000);
    }

    #[test]
    fn test_validate() {
        assert!(AppConfig::default().validate().is_ok());

        let mut config = AppConfig::default();
        config.orchestrator_base = "ftp://nope".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidBaseUrl(_))));

        let mut config = AppConfig::default();
        config.expected_servers.clear();
        assert!(matches!(config.validate(), Err(ConfigError::NoExpectedServers)));
    }

    #[test]
    fn test_validate_rejects_blank_server_names() {
        let mut config = AppConfig::default();
        config.expected_servers = vec!["".to_string(), "clock".to_string()];
        assert!(matches!(config.validate(), Err(ConfigError::BlankExpectedServer)));

        config.expected_servers = vec!["clock".to_string(), "  ".to_string()];
        assert!(matches!(config.validate(), Err(ConfigError::BlankExpectedServer)));

        config.expected_servers = vec!["clock".to_string()];
        assert!(config.validate().is_ok());
    }
}
