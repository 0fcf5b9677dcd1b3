//! Character link - Discord user to EVE character association

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{CharacterId, Snowflake};

/// Persisted link between a Discord user and their EVE character
///
/// Written by the SSO callback; the reconciler only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterLink {
    pub discord_user_id: Snowflake,
    pub character_id: Option<CharacterId>,
    pub updated_at: DateTime<Utc>,
}

impl CharacterLink {
    pub fn new(discord_user_id: Snowflake, character_id: Option<CharacterId>) -> Self {
        Self {
            discord_user_id,
            character_id,
            updated_at: Utc::now(),
        }
    }

    #[inline]
    pub fn is_linked(&self) -> bool {
        self.character_id.is_some()
    }
}
