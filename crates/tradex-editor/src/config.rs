//! Application configuration.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tradex_core::StrategyId;
use tradex_graph::ClientConfig;
use tradex_history::HistoryConfig;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "TRADEX_CONFIG";

/// Config file used when neither the CLI nor the environment names one.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Graph API connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API root. Default: "http://localhost:8080/api".
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Bearer token for the API.
    #[serde(default)]
    pub auth_token: Option<String>,
    /// Request timeout (ms). Default: 10,000.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            auth_token: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log filter used when RUST_LOG is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Strategy whose canvas is being edited.
    #[serde(default = "default_strategy_id")]
    pub strategy_id: String,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

fn default_strategy_id() -> String {
    "default".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            strategy_id: default_strategy_id(),
            api: ApiConfig::default(),
            history: HistoryConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `TRADEX_CONFIG` or the default path.
    ///
    /// Falls back to defaults when the file does not exist.
    pub fn load() -> AppResult<Self> {
        let config_path =
            std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        if Path::new(&config_path).exists() {
            Self::from_file(&config_path)
        } else {
            tracing::warn!(path = %config_path, "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        Self::from_toml(&content)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.strategy_id.trim().is_empty() {
            return Err(AppError::Config("strategy_id must not be empty".to_string()));
        }
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://") {
            return Err(AppError::Config(format!(
                "api.base_url must be an http(s) URL, got {}",
                self.api.base_url
            )));
        }
        if self.api.timeout_ms == 0 {
            return Err(AppError::Config(
                "api.timeout_ms must be greater than 0".to_string(),
            ));
        }
        self.history.validate()?;
        Ok(())
    }

    pub fn strategy(&self) -> StrategyId {
        StrategyId::new(self.strategy_id.clone())
    }

    /// Build graph client settings.
    pub fn client_config(&self) -> ClientConfig {
        let config = ClientConfig::new(self.api.base_url.clone())
            .with_timeout(Duration::from_millis(self.api.timeout_ms));
        match &self.api.auth_token {
            Some(token) => config.with_auth_token(token.clone()),
            None => config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.strategy_id, "default");
        assert_eq!(config.api.timeout_ms, 10_000);
        assert_eq!(config.history.max_depth, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = AppConfig::from_toml(
            r#"
            strategy_id = "strat-42"

            [api]
            base_url = "https://api.tradex.ai/api"
            auth_token = "tok"

            [history]
            max_depth = 25
            "#,
        )
        .unwrap();

        assert_eq!(config.strategy().as_str(), "strat-42");
        assert_eq!(config.api.timeout_ms, 10_000);
        assert_eq!(config.history.max_depth, 25);
        assert_eq!(config.telemetry.log_level, "info");

        let client = config.client_config();
        assert_eq!(client.auth_token.as_deref(), Some("tok"));
        assert_eq!(client.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            AppConfig::from_toml(r#"strategy_id = " ""#),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            AppConfig::from_toml("[api]\nbase_url = \"ftp://x\""),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            AppConfig::from_toml("[api]\ntimeout_ms = 0"),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            AppConfig::from_toml("[history]\nmax_depth = 1000000"),
            Err(AppError::History(_))
        ));
    }

    #[test]
    fn test_shipped_default_file_parses() {
        let config = AppConfig::from_toml(include_str!("../../../config/default.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("strategy_id"));
        assert!(toml_str.contains("max_depth"));
    }
}
