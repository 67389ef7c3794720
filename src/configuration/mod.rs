use crate::communication::notifier::{Notifier, TelegramNotifier};
use crate::database::{DatabaseError, DatabaseService, UserStore};
use serde::Deserialize;
use std::env;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("File read error")]
    FileError,

    #[error("Deserialization error:{0}")]
    DeserializationError(String),

    #[error("Environment variable {0} not found")]
    EnvError(String),

    #[error("Database error:{0}")]
    DatabaseError(#[from] DatabaseError),
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub http: HttpConfig,
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_http_port")]
    pub port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub admin_id: i64,
    /// Public base URL of this service, used for the form link and the webhook.
    pub app_url: String,
    #[serde(default)]
    pub webhook: WebhookConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebhookConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_webhook_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TimeoutConfig {
    #[serde(default = "default_timeout_secs")]
    pub storage_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub notification_secs: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_static_dir() -> String {
    "static".to_string()
}

fn default_webhook_port() -> u16 {
    8443
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout_secs() -> u64 {
    5
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: default_http_port(),
            static_dir: default_static_dir(),
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_webhook_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            storage_secs: default_timeout_secs(),
            notification_secs: default_timeout_secs(),
        }
    }
}

impl TimeoutConfig {
    pub fn storage(&self) -> Duration {
        Duration::from_secs(self.storage_secs)
    }

    pub fn notification(&self) -> Duration {
        Duration::from_secs(self.notification_secs)
    }
}

impl Config {
    pub fn new(config_file: &str) -> Result<Self, ConfigError> {
        let config_str = fs::read_to_string(config_file).map_err(|_| ConfigError::FileError)?;
        Self::parse(&config_str)
    }

    pub fn parse(config_str: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(config_str)
            .map_err(|e| ConfigError::DeserializationError(e.to_string()))
    }
}

/// Process-wide handles, built once at startup and cloned into every service.
#[derive(Clone)]
pub struct Context {
    pub config: Config,
    pub database: Arc<DatabaseService>,
    pub bot: Bot,
    pub notifier: Arc<dyn Notifier>,
}

impl Context {
    pub async fn new(config: Config) -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::EnvError("DATABASE_URL".into()))?;
        let token = env::var("TELOXIDE_TOKEN")
            .map_err(|_| ConfigError::EnvError("TELOXIDE_TOKEN".into()))?;

        let database = DatabaseService::connect(&database_url, &config.database).await?;
        database.ensure_schema().await?;
        info!("Database schema ready");

        let bot = Bot::new(token);
        let notifier: Arc<dyn Notifier> = Arc::new(TelegramNotifier::new(bot.clone()));

        Ok(Self {
            config,
            database: Arc::new(database),
            bot,
            notifier,
        })
    }

    pub async fn shutdown(&self) {
        if self.config.telegram.webhook.enabled {
            if let Err(e) = self.bot.delete_webhook().await {
                warn!(error = %e, "Failed to remove webhook");
            }
        }
        self.database.close().await;
        info!("Database pool closed");
    }
}
