//! Entity metadata stored in Redis.
//!
//! One JSON value per entity under `entity_metadata:{id}`, no TTL.

use std::collections::HashMap;

use async_trait::async_trait;
use forcinha_core::traits::{MetadataStore, RepoResult};
use forcinha_core::{DomainError, EntityId, EntityMetadata};
use tracing::instrument;

use crate::pool::{RedisPool, RedisPoolError};

/// Key prefix for entity metadata
const METADATA_PREFIX: &str = "entity_metadata:";

fn metadata_key(id: EntityId) -> String {
    format!("{METADATA_PREFIX}{id}")
}

fn map_cache_error(e: RedisPoolError) -> DomainError {
    DomainError::CacheError(e.to_string())
}

/// Redis-backed [`MetadataStore`]
#[derive(Debug, Clone)]
pub struct RedisMetadataStore {
    pool: RedisPool,
}

impl RedisMetadataStore {
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MetadataStore for RedisMetadataStore {
    #[instrument(skip(self))]
    async fn get(&self, id: EntityId) -> RepoResult<Option<EntityMetadata>> {
        self.pool
            .get_value(&metadata_key(id))
            .await
            .map_err(map_cache_error)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn get_many(&self, ids: &[EntityId]) -> RepoResult<HashMap<EntityId, EntityMetadata>> {
        let keys: Vec<String> = ids.iter().copied().map(metadata_key).collect();
        let values = self
            .pool
            .get_values::<EntityMetadata>(&keys)
            .await
            .map_err(map_cache_error)?;

        Ok(ids
            .iter()
            .copied()
            .zip(values)
            .filter_map(|(id, value)| value.map(|metadata| (id, metadata)))
            .collect())
    }

    #[instrument(skip(self, metadata))]
    async fn upsert(&self, id: EntityId, metadata: &EntityMetadata) -> RepoResult<()> {
        self.pool
            .set(&metadata_key(id), metadata)
            .await
            .map_err(map_cache_error)
    }
}
