//! # forcinha-common
//!
//! Shared utilities: configuration, guild policy loading, error handling, and telemetry.

pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use config::{
    load_guild_policies, parse_guild_policies, AppConfig, AppSettings, AuditConfig, ConfigError,
    DatabaseConfig, DiscordConfig, Environment, EsiConfig, RedisConfig, ReportLocale,
    ServerConfig,
};
pub use error::{AppError, AppResult, ErrorResponse};
pub use telemetry::{try_init_tracing, TracingConfig, TracingError};
