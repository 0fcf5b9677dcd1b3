//! Character link database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for the character_links table
#[derive(Debug, Clone, FromRow)]
pub struct CharacterLinkModel {
    pub discord_user_id: i64,
    pub character_id: Option<i64>,
    pub updated_at: DateTime<Utc>,
}
