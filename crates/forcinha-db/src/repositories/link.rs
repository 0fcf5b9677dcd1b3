//! PostgreSQL implementation of LinkStore

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use forcinha_core::traits::{LinkStore, RepoResult};
use forcinha_core::{CharacterId, CharacterLink, Snowflake};

use crate::models::CharacterLinkModel;

use super::error::map_db_error;

/// PostgreSQL implementation of LinkStore
#[derive(Clone)]
pub struct PgLinkRepository {
    pool: PgPool,
}

impl PgLinkRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkStore for PgLinkRepository {
    #[instrument(skip(self))]
    async fn get_all_links(&self) -> RepoResult<Vec<CharacterLink>> {
        let rows = sqlx::query_as::<_, CharacterLinkModel>(
            r#"
            SELECT discord_user_id, character_id, updated_at
            FROM character_links
            ORDER BY discord_user_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(rows.into_iter().map(CharacterLink::from).collect())
    }

    #[instrument(skip(self))]
    async fn get_link(&self, discord_user_id: Snowflake) -> RepoResult<Option<CharacterLink>> {
        let row = sqlx::query_as::<_, CharacterLinkModel>(
            r#"
            SELECT discord_user_id, character_id, updated_at
            FROM character_links
            WHERE discord_user_id = $1
            "#,
        )
        .bind(discord_user_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(row.map(CharacterLink::from))
    }

    #[instrument(skip(self))]
    async fn upsert_link(
        &self,
        discord_user_id: Snowflake,
        character_id: Option<CharacterId>,
    ) -> RepoResult<CharacterLink> {
        let row = sqlx::query_as::<_, CharacterLinkModel>(
            r#"
            INSERT INTO character_links (discord_user_id, character_id, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (discord_user_id)
            DO UPDATE SET character_id = EXCLUDED.character_id, updated_at = NOW()
            RETURNING discord_user_id, character_id, updated_at
            "#,
        )
        .bind(discord_user_id.into_inner())
        .bind(character_id.map(CharacterId::into_inner))
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(CharacterLink::from(row))
    }
}
