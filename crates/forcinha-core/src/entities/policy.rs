//! Guild policy - the declarative rules a guild's roles and nicknames follow

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use super::template::NicknameTemplate;
use crate::error::DomainError;
use crate::value_objects::{AllianceId, CorporationId, Snowflake};

/// Grants `role_id` to members whose corporation or alliance is listed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleRule {
    pub name: String,
    pub role_id: Snowflake,
    pub corporation_ids: BTreeSet<CorporationId>,
    pub alliance_ids: BTreeSet<AllianceId>,
}

impl RoleRule {
    pub fn new(name: impl Into<String>, role_id: Snowflake) -> Self {
        Self {
            name: name.into(),
            role_id,
            corporation_ids: BTreeSet::new(),
            alliance_ids: BTreeSet::new(),
        }
    }

    pub fn with_corporations(mut self, ids: impl IntoIterator<Item = CorporationId>) -> Self {
        self.corporation_ids.extend(ids);
        self
    }

    pub fn with_alliances(mut self, ids: impl IntoIterator<Item = AllianceId>) -> Self {
        self.alliance_ids.extend(ids);
        self
    }

    /// Check whether the rule matches a corporation/alliance pair
    pub fn matches(&self, corporation_id: CorporationId, alliance_id: Option<AllianceId>) -> bool {
        self.corporation_ids.contains(&corporation_id)
            || alliance_id.is_some_and(|id| self.alliance_ids.contains(&id))
    }
}

/// Overrides the default nickname template for the listed corporations
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NicknameRule {
    pub name: String,
    pub corporation_ids: BTreeSet<CorporationId>,
    pub template: NicknameTemplate,
}

impl NicknameRule {
    pub fn new(name: impl Into<String>, template: impl Into<NicknameTemplate>) -> Self {
        Self {
            name: name.into(),
            corporation_ids: BTreeSet::new(),
            template: template.into(),
        }
    }

    pub fn with_corporations(mut self, ids: impl IntoIterator<Item = CorporationId>) -> Self {
        self.corporation_ids.extend(ids);
        self
    }
}

/// Default template plus ordered overrides
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NicknamePolicy {
    pub default_template: NicknameTemplate,
    pub rules: Vec<NicknameRule>,
}

impl NicknamePolicy {
    pub fn new(default_template: impl Into<NicknameTemplate>) -> Self {
        Self {
            default_template: default_template.into(),
            rules: Vec::new(),
        }
    }

    pub fn with_rule(mut self, rule: NicknameRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// First matching rule's template, or the default
    pub fn template_for(&self, corporation_id: CorporationId) -> &NicknameTemplate {
        self.rules
            .iter()
            .find(|rule| rule.corporation_ids.contains(&corporation_id))
            .map_or(&self.default_template, |rule| &rule.template)
    }
}

/// Validated, immutable policy for one guild
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuildPolicy {
    guild_id: Snowflake,
    name: String,
    role_rules: Vec<RoleRule>,
    nicknames: NicknamePolicy,
    managed_roles: BTreeSet<Snowflake>,
}

impl GuildPolicy {
    /// Build a policy, rejecting duplicate role ids and duplicate or empty rule names
    pub fn new(
        guild_id: Snowflake,
        name: impl Into<String>,
        role_rules: Vec<RoleRule>,
        nicknames: NicknamePolicy,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if guild_id.is_zero() {
            return Err(DomainError::InvalidPolicy(format!(
                "guild '{name}' has no guild id"
            )));
        }

        let mut managed_roles = BTreeSet::new();
        let mut role_names = HashSet::new();
        for rule in &role_rules {
            if rule.name.trim().is_empty() {
                return Err(DomainError::InvalidPolicy(format!(
                    "role rule for {} has an empty name",
                    rule.role_id
                )));
            }
            if !role_names.insert(rule.name.as_str()) {
                return Err(DomainError::DuplicateRuleName(rule.name.clone()));
            }
            if !managed_roles.insert(rule.role_id) {
                return Err(DomainError::DuplicateRole {
                    role_id: rule.role_id,
                });
            }
        }

        let mut nickname_names = HashSet::new();
        for rule in &nicknames.rules {
            if rule.name.trim().is_empty() {
                return Err(DomainError::InvalidPolicy(
                    "nickname rule has an empty name".to_string(),
                ));
            }
            if !nickname_names.insert(rule.name.as_str()) {
                return Err(DomainError::DuplicateRuleName(rule.name.clone()));
            }
        }

        Ok(Self {
            guild_id,
            name,
            role_rules,
            nicknames,
            managed_roles,
        })
    }

    #[inline]
    pub fn guild_id(&self) -> Snowflake {
        self.guild_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Role rules in evaluation order
    pub fn role_rules(&self) -> &[RoleRule] {
        &self.role_rules
    }

    pub fn nicknames(&self) -> &NicknamePolicy {
        &self.nicknames
    }

    /// Union of every role id referenced by a role rule
    pub fn managed_roles(&self) -> &BTreeSet<Snowflake> {
        &self.managed_roles
    }

    #[inline]
    pub fn is_managed(&self, role_id: Snowflake) -> bool {
        self.managed_roles.contains(&role_id)
    }

    /// Display name of a managed role, if any rule references it
    pub fn role_name(&self, role_id: Snowflake) -> Option<&str> {
        self.role_rules
            .iter()
            .find(|rule| rule.role_id == role_id)
            .map(|rule| rule.name.as_str())
    }
}
