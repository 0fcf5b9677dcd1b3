//! Discord REST payloads (only the fields we read or write).

use chrono::{DateTime, Utc};
use forcinha_core::{MemberRecord, Snowflake};
use serde::{Deserialize, Serialize};

/// `user` object embedded in a guild member
#[derive(Debug, Clone, Deserialize)]
pub struct UserPayload {
    pub id: Snowflake,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

/// Guild member object
#[derive(Debug, Clone, Deserialize)]
pub struct MemberPayload {
    pub user: UserPayload,
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default)]
    pub roles: Vec<Snowflake>,
    #[serde(default)]
    pub joined_at: Option<DateTime<Utc>>,
}

impl From<MemberPayload> for MemberRecord {
    fn from(payload: MemberPayload) -> Self {
        MemberRecord {
            user_id: payload.user.id,
            username: payload.user.username,
            global_name: payload.user.global_name,
            nickname: payload.nick,
            role_ids: payload.roles.into_iter().collect(),
            bot: payload.user.bot,
            joined_at: payload.joined_at,
        }
    }
}

/// `PATCH /guilds/{guild_id}/members/{user_id}` body; `null` clears
#[derive(Debug, Serialize)]
pub struct ModifyNickname<'a> {
    pub nick: Option<&'a str>,
}

/// 429 response body
#[derive(Debug, Deserialize)]
pub struct RateLimitPayload {
    pub retry_after: f64,
}
