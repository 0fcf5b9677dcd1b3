//! Entity metadata cache - persistent names and tickers with read-through fill
//!
//! Entries never expire. Names of 404'd entities are stored as tombstones so
//! they are not fetched again; transient failures are not stored.

use std::collections::HashMap;
use std::sync::Arc;

use forcinha_core::traits::MetadataStore;
use forcinha_core::{CharacterId, CorporationId, EntityId, EntityMetadata, Lookup, RepoResult};
use tracing::{debug, instrument, warn};

use super::fetcher::{AffiliationFetcher, FetchBatch};

#[derive(Clone)]
pub struct EntityMetadataCache {
    store: Arc<dyn MetadataStore>,
    fetcher: AffiliationFetcher,
}

impl EntityMetadataCache {
    pub fn new(store: Arc<dyn MetadataStore>, fetcher: AffiliationFetcher) -> Self {
        Self { store, fetcher }
    }

    pub async fn get(&self, id: EntityId) -> RepoResult<Option<EntityMetadata>> {
        self.store.get(id).await
    }

    /// Stored entries for the ids present in the store
    pub async fn get_many(
        &self,
        ids: &[EntityId],
    ) -> RepoResult<HashMap<EntityId, EntityMetadata>> {
        self.store.get_many(ids).await
    }

    pub async fn upsert(&self, id: EntityId, metadata: &EntityMetadata) -> RepoResult<()> {
        self.store.upsert(id, metadata).await
    }

    /// Names for the given characters, fetching the ones not cached yet
    #[instrument(skip_all, fields(count = ids.len()))]
    pub async fn resolve_characters(
        &self,
        ids: &[CharacterId],
    ) -> HashMap<CharacterId, EntityMetadata> {
        let cached = self.cached(ids).await;
        let missing = missing(ids, &cached);
        if missing.is_empty() {
            return cached;
        }
        let batch = self.fetcher.fetch_characters(&missing).await;
        self.fill(cached, batch, EntityMetadata::deleted_character).await
    }

    /// Names and tickers for the given corporations, fetching the ones not cached yet
    #[instrument(skip_all, fields(count = ids.len()))]
    pub async fn resolve_corporations(
        &self,
        ids: &[CorporationId],
    ) -> HashMap<CorporationId, EntityMetadata> {
        let cached = self.cached(ids).await;
        let missing = missing(ids, &cached);
        if missing.is_empty() {
            return cached;
        }
        let batch = self.fetcher.fetch_corporations(&missing).await;
        self.fill(cached, batch, EntityMetadata::deleted_corporation).await
    }

    /// Write one entry; a store failure is logged and otherwise ignored
    pub async fn record<K>(&self, id: K, metadata: &EntityMetadata)
    where
        K: Into<EntityId> + std::fmt::Display,
    {
        let id_str = id.to_string();
        if let Err(e) = self.store.upsert(id.into(), metadata).await {
            warn!(id = %id_str, error = %e, "Failed to cache entity metadata");
        }
    }

    /// Read what the store has; a store outage reads as an empty cache
    pub async fn cached<K>(&self, ids: &[K]) -> HashMap<K, EntityMetadata>
    where
        K: Copy + Eq + std::hash::Hash + Into<EntityId>,
    {
        let keys: Vec<EntityId> = ids.iter().copied().map(Into::into).collect();
        let mut stored = match self.store.get_many(&keys).await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "Metadata store read failed, fetching from ESI");
                HashMap::new()
            }
        };

        let hits: HashMap<K, EntityMetadata> = ids
            .iter()
            .filter_map(|id| {
                let key: EntityId = (*id).into();
                stored.remove(&key).map(|meta| (*id, meta))
            })
            .collect();
        debug!(requested = ids.len(), hits = hits.len(), "Metadata cache lookup");
        hits
    }

    async fn fill<K>(
        &self,
        mut resolved: HashMap<K, EntityMetadata>,
        batch: FetchBatch<K, EntityMetadata>,
        tombstone: fn() -> EntityMetadata,
    ) -> HashMap<K, EntityMetadata>
    where
        K: Copy + Eq + std::hash::Hash + Into<EntityId> + std::fmt::Display,
    {
        for (id, lookup) in batch.found {
            let metadata = match lookup {
                Lookup::Found(metadata) => metadata,
                Lookup::NotFound => tombstone(),
            };
            self.record(id, &metadata).await;
            resolved.insert(id, metadata);
        }
        resolved
    }
}

fn missing<K>(ids: &[K], cached: &HashMap<K, EntityMetadata>) -> Vec<K>
where
    K: Copy + Eq + std::hash::Hash,
{
    ids.iter()
        .copied()
        .filter(|id| !cached.contains_key(id))
        .collect()
}

impl std::fmt::Debug for EntityMetadataCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityMetadataCache")
            .field("fetcher", &self.fetcher)
            .finish_non_exhaustive()
    }
}
