//! In-process entity metadata store.
//!
//! Used when Redis is not configured, and by tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use forcinha_core::traits::{MetadataStore, RepoResult};
use forcinha_core::{EntityId, EntityMetadata};

/// [`MetadataStore`] backed by a concurrent hash map
#[derive(Debug, Clone, Default)]
pub struct InMemoryMetadataStore {
    entries: Arc<DashMap<EntityId, EntityMetadata>>,
}

impl InMemoryMetadataStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn get(&self, id: EntityId) -> RepoResult<Option<EntityMetadata>> {
        Ok(self.entries.get(&id).map(|entry| entry.value().clone()))
    }

    async fn get_many(&self, ids: &[EntityId]) -> RepoResult<HashMap<EntityId, EntityMetadata>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.entries.get(id).map(|entry| (*id, entry.value().clone())))
            .collect())
    }

    async fn upsert(&self, id: EntityId, metadata: &EntityMetadata) -> RepoResult<()> {
        self.entries.insert(id, metadata.clone());
        Ok(())
    }
}
