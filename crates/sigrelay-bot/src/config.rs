//! Application configuration.
//!
//! Layers, later wins: built-in defaults, an optional TOML file, then
//! environment variables (`PORT`, `DATABASE_URL`, `BOT_TOKEN`, `TARGET_ID`,
//! `CAPTURE_MODE`, `APP_ENV` / `NODE_ENV`, `TELEGRAM_API_URL`,
//! `DB_MAX_CONNECTIONS`).

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sigrelay_api::ApiConfig;
use sigrelay_ingest::{CaptureMode, IngestConfig, DEFAULT_API_URL};
use sigrelay_store::PgStoreConfig;
use std::str::FromStr;
use std::time::Duration;

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// `postgres://...`. Required.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout_secs() -> u64 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
        }
    }
}

/// Telegram ingestion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token. Ingestion is disabled without it.
    #[serde(default, skip_serializing)]
    pub bot_token: Option<String>,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub capture_mode: CaptureMode,
    /// Chat accepted in targeted mode.
    #[serde(default)]
    pub target_id: Option<String>,
    /// Long-poll timeout for `getUpdates`.
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
    /// Bound on handling one chat event.
    #[serde(default = "default_handler_timeout_secs")]
    pub handler_timeout_secs: u64,
    #[serde(default = "default_launch_attempts")]
    pub launch_attempts: u32,
    #[serde(default = "default_launch_backoff_secs")]
    pub launch_backoff_secs: u64,
    /// Pause after a polling error.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_poll_timeout_secs() -> u64 {
    30
}

fn default_handler_timeout_secs() -> u64 {
    90
}

fn default_launch_attempts() -> u32 {
    3
}

fn default_launch_backoff_secs() -> u64 {
    5
}

fn default_retry_delay_secs() -> u64 {
    3
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_url: default_api_url(),
            capture_mode: CaptureMode::default(),
            target_id: None,
            poll_timeout_secs: default_poll_timeout_secs(),
            handler_timeout_secs: default_handler_timeout_secs(),
            launch_attempts: default_launch_attempts(),
            launch_backoff_secs: default_launch_backoff_secs(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownConfig {
    /// Drain deadline before the process force-exits.
    #[serde(default = "default_drain_timeout_secs")]
    pub drain_timeout_secs: u64,
}

fn default_drain_timeout_secs() -> u64 {
    15
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            drain_timeout_secs: default_drain_timeout_secs(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Environment label (`production`, `development`, ...).
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

impl AppConfig {
    /// Load from a TOML file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config {path}: {e}")))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Defaults or `path`, then the process environment.
    pub fn load(path: Option<&str>) -> AppResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply environment overrides. Empty values count as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(port) = get("PORT") {
            self.api.port = parse_env("PORT", &port)?;
        }
        if let Some(url) = get("DATABASE_URL") {
            self.database.url = Some(url);
        }
        if let Some(max) = get("DB_MAX_CONNECTIONS") {
            self.database.max_connections = parse_env("DB_MAX_CONNECTIONS", &max)?;
        }
        if let Some(token) = get("BOT_TOKEN") {
            self.telegram.bot_token = Some(token);
        }
        if let Some(target) = get("TARGET_ID") {
            self.telegram.target_id = Some(target.trim().to_string());
        }
        if let Some(mode) = get("CAPTURE_MODE") {
            self.telegram.capture_mode =
                CaptureMode::from_str(&mode).map_err(|e| AppError::Config(e.to_string()))?;
        }
        if let Some(url) = get("TELEGRAM_API_URL") {
            self.telegram.api_url = url;
        }
        if let Some(env) = get("APP_ENV").or_else(|| get("NODE_ENV")) {
            self.environment = Some(env);
        }
        Ok(())
    }

    pub fn store_config(&self) -> AppResult<PgStoreConfig> {
        let url = self
            .database
            .url
            .as_deref()
            .ok_or_else(|| AppError::Config("DATABASE_URL is required".to_string()))?;
        let mut config = PgStoreConfig::new(url);
        config.max_connections = self.database.max_connections;
        config.acquire_timeout = Duration::from_secs(self.database.acquire_timeout_secs);
        Ok(config)
    }

    /// API settings with the environment label filled in.
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            environment: self.environment.clone(),
            ..self.api.clone()
        }
    }

    pub fn ingest_config(&self) -> IngestConfig {
        let t = &self.telegram;
        IngestConfig {
            capture_mode: t.capture_mode,
            target_id: t.target_id.clone(),
            handler_timeout: Duration::from_secs(t.handler_timeout_secs),
            probe_attempts: t.launch_attempts,
            probe_backoff: Duration::from_secs(t.launch_backoff_secs),
            retry_delay: Duration::from_secs(t.retry_delay_secs),
        }
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown.drain_timeout_secs)
    }

    pub fn is_production(&self) -> bool {
        self.environment.as_deref() == Some("production")
    }
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> AppResult<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid {key}={value:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.api.port, 3000);
        assert_eq!(config.api.bind_address, "0.0.0.0");
        assert_eq!(config.telegram.capture_mode, CaptureMode::Targeted);
        assert_eq!(config.telegram.handler_timeout_secs, 90);
        assert_eq!(config.telegram.launch_attempts, 3);
        assert_eq!(config.drain_timeout(), Duration::from_secs(15));
        assert!(config.store_config().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[
                ("PORT", "8081"),
                ("DATABASE_URL", "postgres://localhost/relay"),
                ("BOT_TOKEN", "1:abc"),
                ("TARGET_ID", " -100123 "),
                ("CAPTURE_MODE", "open"),
                ("NODE_ENV", "production"),
                ("DB_MAX_CONNECTIONS", "12"),
            ]))
            .unwrap();

        assert_eq!(config.api.port, 8081);
        assert_eq!(config.telegram.target_id.as_deref(), Some("-100123"));
        assert_eq!(config.telegram.capture_mode, CaptureMode::Open);
        assert!(config.is_production());
        assert_eq!(config.api_config().environment.as_deref(), Some("production"));

        let store = config.store_config().unwrap();
        assert_eq!(store.database_url, "postgres://localhost/relay");
        assert_eq!(store.max_connections, 12);
    }

    #[test]
    fn test_app_env_wins_over_node_env() {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[("NODE_ENV", "development"), ("APP_ENV", "staging")]))
            .unwrap();
        assert_eq!(config.environment.as_deref(), Some("staging"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = AppConfig::default();
        assert!(config.apply_env(env(&[("PORT", "http")])).is_err());
        assert!(config.apply_env(env(&[("PORT", "70000")])).is_err());
        assert!(config.apply_env(env(&[("CAPTURE_MODE", "all")])).is_err());
    }

    #[test]
    fn test_empty_env_is_unset() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[("BOT_TOKEN", ""), ("PORT", " ")])).unwrap();
        assert!(config.telegram.bot_token.is_none());
        assert_eq!(config.api.port, 3000);
    }

    #[test]
    fn test_toml_layer() {
        let config = AppConfig::from_toml(
            r#"
            environment = "development"

            [api]
            port = 4000
            max_page_limit = 500

            [telegram]
            capture_mode = "open"
            target_id = "42"
            "#,
        )
        .unwrap();
        assert_eq!(config.api.port, 4000);
        assert_eq!(config.api.max_port_attempts, 10);
        assert_eq!(config.api.max_page_limit, Some(500));
        assert_eq!(config.telegram.capture_mode, CaptureMode::Open);
        assert_eq!(config.telegram.poll_timeout_secs, 30);
    }

    #[test]
    fn test_token_not_serialized() {
        let mut config = AppConfig::default();
        config.telegram.bot_token = Some("1:secret".to_string());
        let toml_str = toml::to_string(&config).unwrap();
        assert!(!toml_str.contains("secret"));
    }
}
