//! Configuration structs and guild policy loading

mod app_config;
mod policies;

pub use app_config::{
    AppConfig, AppSettings, AuditConfig, ConfigError, DatabaseConfig, DiscordConfig, EsiConfig,
    Environment, RedisConfig, ReportLocale, ServerConfig,
};
pub use policies::{
    GuildPolicyDto, NicknamePolicyDto, NicknameRuleDto, PolicyFile, RoleRuleDto,
    load_guild_policies, parse_guild_policies,
};
