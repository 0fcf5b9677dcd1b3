//! Capability traits (ports) - what the reconciler needs from the outside world
//!
//! The domain layer defines the contracts; `forcinha-db`, `forcinha-cache`,
//! `forcinha-esi` and `forcinha-discord` provide the implementations.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::entities::{CharacterAffiliation, CharacterLink, EntityMetadata, Lookup, MemberRecord};
use crate::error::{DomainError, UpstreamError};
use crate::value_objects::{CharacterId, CorporationId, EntityId, Snowflake};

/// Result type for storage operations
pub type RepoResult<T> = Result<T, DomainError>;

/// Result type for upstream API calls
pub type UpstreamResult<T> = Result<T, UpstreamError>;

// ============================================================================
// Discord
// ============================================================================

#[async_trait]
pub trait MemberSource: Send + Sync {
    /// List every non-bot member of a guild
    async fn list_members(&self, guild_id: Snowflake) -> UpstreamResult<Vec<MemberRecord>>;

    /// Fetch one member; `None` when the user is not in the guild
    async fn get_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> UpstreamResult<Option<MemberRecord>>;
}

#[async_trait]
pub trait RoleSink: Send + Sync {
    async fn add_role(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
    ) -> UpstreamResult<()>;

    async fn remove_role(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
    ) -> UpstreamResult<()>;

    /// Set or clear (`None`) a member's nickname
    async fn set_nickname(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        nickname: Option<&str>,
    ) -> UpstreamResult<()>;
}

// ============================================================================
// EVE Online
// ============================================================================

#[async_trait]
pub trait AffiliationSource: Send + Sync {
    /// Current corporation and alliance, plus the name if the same answer carries it
    async fn fetch_affiliation(
        &self,
        character_id: CharacterId,
    ) -> UpstreamResult<Lookup<CharacterAffiliation>>;
}

#[async_trait]
pub trait EntityFactsSource: Send + Sync {
    /// Character name, as [`EntityMetadata::Character`]
    async fn fetch_character(
        &self,
        character_id: CharacterId,
    ) -> UpstreamResult<Lookup<EntityMetadata>>;

    /// Corporation name and ticker, as [`EntityMetadata::Corporation`]
    async fn fetch_corporation(
        &self,
        corporation_id: CorporationId,
    ) -> UpstreamResult<Lookup<EntityMetadata>>;
}

// ============================================================================
// Storage
// ============================================================================

#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Every stored link, linked or not
    async fn get_all_links(&self) -> RepoResult<Vec<CharacterLink>>;

    async fn get_link(&self, discord_user_id: Snowflake) -> RepoResult<Option<CharacterLink>>;

    /// Create or replace the link for a Discord user
    async fn upsert_link(
        &self,
        discord_user_id: Snowflake,
        character_id: Option<CharacterId>,
    ) -> RepoResult<CharacterLink>;
}

#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn get(&self, id: EntityId) -> RepoResult<Option<EntityMetadata>>;

    /// Entries for the ids that are present; absent ids are omitted
    async fn get_many(&self, ids: &[EntityId]) -> RepoResult<HashMap<EntityId, EntityMetadata>>;

    /// Unconditional overwrite
    async fn upsert(&self, id: EntityId, metadata: &EntityMetadata) -> RepoResult<()>;
}
