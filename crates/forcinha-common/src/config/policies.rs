//! Guild policy file loading
//!
//! Policies live in a TOML/JSON/YAML file read through the `config` crate.
//! The file is deserialized into DTOs, checked with `validator`, then turned
//! into domain [`GuildPolicy`] values (which run their own invariants).

use std::collections::HashSet;
use std::path::Path;

use config::{Config, File, FileFormat};
use forcinha_core::{
    AllianceId, CorporationId, GuildPolicy, NicknamePolicy, NicknameRule, RoleRule, Snowflake,
};
use serde::Deserialize;
use validator::{Validate, ValidationError};

use super::ConfigError;

/// Top-level policy file
#[derive(Debug, Deserialize, Validate)]
pub struct PolicyFile {
    #[serde(default)]
    #[validate(nested)]
    pub guilds: Vec<GuildPolicyDto>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GuildPolicyDto {
    #[validate(length(min = 1, max = 100, message = "Guild name must be 1-100 characters"))]
    pub name: String,
    pub guild_id: Snowflake,
    #[serde(default)]
    #[validate(nested)]
    pub roles: Vec<RoleRuleDto>,
    #[validate(nested)]
    pub nicknames: NicknamePolicyDto,
}

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_role_targets"))]
pub struct RoleRuleDto {
    #[validate(length(min = 1, max = 100, message = "Rule name must be 1-100 characters"))]
    pub name: String,
    pub role_id: Snowflake,
    #[serde(default)]
    pub corporations: Vec<i64>,
    #[serde(default)]
    pub alliances: Vec<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NicknamePolicyDto {
    #[validate(length(min = 1))]
    pub default: String,
    #[serde(default)]
    #[validate(nested)]
    pub rules: Vec<NicknameRuleDto>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NicknameRuleDto {
    #[validate(length(min = 1, max = 100, message = "Rule name must be 1-100 characters"))]
    pub name: String,
    #[validate(length(min = 1))]
    pub corporations: Vec<i64>,
    #[validate(length(min = 1))]
    pub template: String,
}

fn validate_role_targets(rule: &RoleRuleDto) -> Result<(), ValidationError> {
    if rule.corporations.is_empty() && rule.alliances.is_empty() {
        return Err(ValidationError::new("role_rule_without_targets"));
    }
    Ok(())
}

impl GuildPolicyDto {
    fn into_policy(self) -> Result<GuildPolicy, ConfigError> {
        let roles = self
            .roles
            .into_iter()
            .map(|rule| {
                RoleRule::new(rule.name, rule.role_id)
                    .with_corporations(rule.corporations.into_iter().map(CorporationId::new))
                    .with_alliances(rule.alliances.into_iter().map(AllianceId::new))
            })
            .collect();

        let nicknames = self.nicknames.rules.into_iter().fold(
            NicknamePolicy::new(self.nicknames.default.as_str()),
            |policy, rule| {
                policy.with_rule(
                    NicknameRule::new(rule.name, rule.template.as_str())
                        .with_corporations(rule.corporations.into_iter().map(CorporationId::new)),
                )
            },
        );

        GuildPolicy::new(self.guild_id, self.name, roles, nicknames)
            .map_err(|e| ConfigError::InvalidPolicy(e.to_string()))
    }
}

impl PolicyFile {
    /// Validate and convert every guild, rejecting an empty file and duplicate guild ids
    pub fn into_policies(self) -> Result<Vec<GuildPolicy>, ConfigError> {
        if self.guilds.is_empty() {
            return Err(ConfigError::InvalidPolicy(
                "at least one guild must be configured".to_string(),
            ));
        }
        self.validate()
            .map_err(|e| ConfigError::InvalidPolicy(e.to_string()))?;

        let mut seen = HashSet::new();
        let mut policies = Vec::with_capacity(self.guilds.len());
        for guild in self.guilds {
            if !seen.insert(guild.guild_id) {
                return Err(ConfigError::InvalidPolicy(format!(
                    "guild {} is configured more than once",
                    guild.guild_id
                )));
            }
            policies.push(guild.into_policy()?);
        }
        Ok(policies)
    }
}

/// Load guild policies from a file; the format follows the extension
pub fn load_guild_policies(path: impl AsRef<Path>) -> Result<Vec<GuildPolicy>, ConfigError> {
    let file: PolicyFile = Config::builder()
        .add_source(File::from(path.as_ref()))
        .build()?
        .try_deserialize()?;
    file.into_policies()
}

/// Load guild policies from an in-memory document
pub fn parse_guild_policies(
    source: &str,
    format: FileFormat,
) -> Result<Vec<GuildPolicy>, ConfigError> {
    let file: PolicyFile = Config::builder()
        .add_source(File::from_str(source, format))
        .build()?
        .try_deserialize()?;
    file.into_policies()
}
