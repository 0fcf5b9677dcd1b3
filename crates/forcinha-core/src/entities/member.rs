//! Member record - observed Discord state of one guild member

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::Snowflake;

/// Guild member as reported by Discord at the start of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub user_id: Snowflake,
    pub username: String,
    pub global_name: Option<String>,
    pub nickname: Option<String>,
    pub role_ids: BTreeSet<Snowflake>,
    pub bot: bool,
    pub joined_at: Option<DateTime<Utc>>,
}

impl MemberRecord {
    /// Create a member with no nickname and no roles
    pub fn new(user_id: Snowflake, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
            global_name: None,
            nickname: None,
            role_ids: BTreeSet::new(),
            bot: false,
            joined_at: None,
        }
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }

    pub fn with_global_name(mut self, global_name: impl Into<String>) -> Self {
        self.global_name = Some(global_name.into());
        self
    }

    pub fn with_roles(mut self, role_ids: impl IntoIterator<Item = Snowflake>) -> Self {
        self.role_ids.extend(role_ids);
        self
    }

    /// Name shown in reports: nickname, then global name, then username
    pub fn display_name(&self) -> &str {
        self.nickname
            .as_deref()
            .or(self.global_name.as_deref())
            .unwrap_or(&self.username)
    }

    #[inline]
    pub fn has_role(&self, role_id: Snowflake) -> bool {
        self.role_ids.contains(&role_id)
    }

    /// Current roles restricted to the given managed set
    pub fn managed_roles(&self, managed: &BTreeSet<Snowflake>) -> BTreeSet<Snowflake> {
        self.role_ids.intersection(managed).copied().collect()
    }
}
