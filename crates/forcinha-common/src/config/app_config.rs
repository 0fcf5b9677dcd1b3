//! Application configuration structs
//!
//! Loads configuration from environment variables (with `.env` support).

pub use forcinha_core::ReportLocale;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub api: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub discord: DiscordConfig,
    pub esi: EsiConfig,
    pub audit: AuditConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "development" => Ok(Self::Development),
            other => Err(ConfigError::InvalidValue("APP_ENV", other.to_string())),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Redis configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    #[serde(default = "default_redis_max_connections")]
    pub max_connections: u32,
}

/// Discord REST API configuration
#[derive(Clone, Deserialize)]
pub struct DiscordConfig {
    pub bot_token: String,
    #[serde(default = "default_discord_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_discord_user_agent")]
    pub user_agent: String,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("bot_token", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// EVE Swagger Interface configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EsiConfig {
    #[serde(default = "default_esi_base_url")]
    pub base_url: String,
    #[serde(default = "default_esi_compatibility_date")]
    pub compatibility_date: String,
    #[serde(default = "default_esi_timeout_secs")]
    pub timeout_secs: u64,
    /// Ceiling on simultaneous in-flight requests
    #[serde(default = "default_esi_max_concurrency")]
    pub max_concurrency: usize,
    /// Total attempts per request, first try included
    #[serde(default = "default_esi_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_esi_backoff_ms")]
    pub backoff_ms: u64,
    /// Optional request-rate quota on top of the concurrency ceiling
    #[serde(default)]
    pub requests_per_second: Option<u32>,
}

impl EsiConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

impl Default for EsiConfig {
    fn default() -> Self {
        Self {
            base_url: default_esi_base_url(),
            compatibility_date: default_esi_compatibility_date(),
            timeout_secs: default_esi_timeout_secs(),
            max_concurrency: default_esi_max_concurrency(),
            max_attempts: default_esi_max_attempts(),
            backoff_ms: default_esi_backoff_ms(),
            requests_per_second: None,
        }
    }
}

/// Reconciliation run settings
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    #[serde(default = "default_policies_path")]
    pub policies_path: PathBuf,
    #[serde(default)]
    pub locale: ReportLocale,
}

// Default value functions
fn default_app_name() -> String {
    "forcinha".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_redis_max_connections() -> u32 {
    10
}

fn default_discord_api_base_url() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_discord_user_agent() -> String {
    concat!("DiscordBot (forcinha, ", env!("CARGO_PKG_VERSION"), ")").to_string()
}

fn default_esi_base_url() -> String {
    "https://esi.evetech.net".to_string()
}

fn default_esi_compatibility_date() -> String {
    "2025-09-23".to_string()
}

fn default_esi_timeout_secs() -> u64 {
    10
}

fn default_esi_max_concurrency() -> usize {
    25
}

fn default_esi_max_attempts() -> u32 {
    3
}

fn default_esi_backoff_ms() -> u64 {
    200
}

fn default_policies_path() -> PathBuf {
    PathBuf::from("config/guilds.toml")
}

/// Parse an optional numeric variable, rejecting values that do not parse
fn parse_var<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(name, raw)),
        Err(_) => Ok(None),
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let esi = EsiConfig {
            base_url: env::var("ESI_BASE_URL").unwrap_or_else(|_| default_esi_base_url()),
            compatibility_date: env::var("ESI_COMPATIBILITY_DATE")
                .unwrap_or_else(|_| default_esi_compatibility_date()),
            timeout_secs: parse_var("ESI_TIMEOUT_SECS")?.unwrap_or_else(default_esi_timeout_secs),
            max_concurrency: parse_var("ESI_MAX_CONCURRENCY")?
                .unwrap_or_else(default_esi_max_concurrency),
            max_attempts: parse_var("ESI_MAX_ATTEMPTS")?.unwrap_or_else(default_esi_max_attempts),
            backoff_ms: parse_var("ESI_BACKOFF_MS")?.unwrap_or_else(default_esi_backoff_ms),
            requests_per_second: parse_var("ESI_REQUESTS_PER_SECOND")?,
        };
        if esi.max_concurrency == 0 {
            return Err(ConfigError::InvalidValue(
                "ESI_MAX_CONCURRENCY",
                "must be at least 1".to_string(),
            ));
        }
        if esi.max_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "ESI_MAX_ATTEMPTS",
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            app: AppSettings {
                name: env::var("APP_NAME").unwrap_or_else(|_| default_app_name()),
                env: env::var("APP_ENV")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_default(),
            },
            api: ServerConfig {
                host: env::var("API_HOST").unwrap_or_else(|_| default_host()),
                port: parse_var("API_PORT")?.ok_or(ConfigError::MissingVar("API_PORT"))?,
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").map_err(|_| ConfigError::MissingVar("DATABASE_URL"))?,
                max_connections: parse_var("DATABASE_MAX_CONNECTIONS")?
                    .unwrap_or_else(default_max_connections),
                min_connections: parse_var("DATABASE_MIN_CONNECTIONS")?
                    .unwrap_or_else(default_min_connections),
            },
            redis: RedisConfig {
                url: env::var("REDIS_URL").map_err(|_| ConfigError::MissingVar("REDIS_URL"))?,
                max_connections: parse_var("REDIS_MAX_CONNECTIONS")?
                    .unwrap_or_else(default_redis_max_connections),
            },
            discord: DiscordConfig {
                bot_token: env::var("DISCORD_BOT_TOKEN")
                    .map_err(|_| ConfigError::MissingVar("DISCORD_BOT_TOKEN"))?,
                api_base_url: env::var("DISCORD_API_BASE_URL")
                    .unwrap_or_else(|_| default_discord_api_base_url()),
                user_agent: env::var("DISCORD_USER_AGENT")
                    .unwrap_or_else(|_| default_discord_user_agent()),
            },
            esi,
            audit: AuditConfig {
                policies_path: env::var("GUILD_POLICIES_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| default_policies_path()),
                locale: env::var("REPORT_LOCALE")
                    .ok()
                    .map(|s| s.parse::<ReportLocale>())
                    .transpose()
                    .map_err(|e| ConfigError::InvalidValue("REPORT_LOCALE", e.0))?
                    .unwrap_or_default(),
            },
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),

    #[error("Failed to read guild policies: {0}")]
    PolicyFile(#[from] config::ConfigError),

    #[error("Invalid guild policy: {0}")]
    InvalidPolicy(String),
}
