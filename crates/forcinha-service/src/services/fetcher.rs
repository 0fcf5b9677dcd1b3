//! Batch lookups against EVE ESI through the shared worker pool

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use forcinha_core::traits::{AffiliationSource, EntityFactsSource};
use forcinha_core::{
    CharacterAffiliation, CharacterId, CorporationId, EntityMetadata, Lookup, UpstreamError,
    UpstreamResult,
};
use tracing::{debug, info, instrument, warn};

use super::pool::WorkerPool;
use super::retry::RetryPolicy;

/// Result of one batch
///
/// `found` holds every id that resolved, 404s included as [`Lookup::NotFound`].
/// Ids that exhausted their retries or failed permanently land in `failed`
/// and nowhere else.
#[derive(Debug, Clone)]
pub struct FetchBatch<K, V> {
    pub found: HashMap<K, Lookup<V>>,
    pub failed: HashMap<K, UpstreamError>,
}

impl<K: Eq + Hash, V> FetchBatch<K, V> {
    pub fn get(&self, id: &K) -> Option<&Lookup<V>> {
        self.found.get(id)
    }

    #[inline]
    pub fn requested(&self) -> usize {
        self.found.len() + self.failed.len()
    }

    /// Nothing resolved and every failure was transient
    pub fn is_total_transient_failure(&self) -> bool {
        self.found.is_empty()
            && !self.failed.is_empty()
            && self.failed.values().all(UpstreamError::is_transient)
    }
}

/// Batch fetcher for affiliations, character names and corporation tickers
#[derive(Clone)]
pub struct AffiliationFetcher {
    pool: WorkerPool,
    retry: RetryPolicy,
    affiliations: Arc<dyn AffiliationSource>,
    facts: Arc<dyn EntityFactsSource>,
}

impl AffiliationFetcher {
    pub fn new(
        pool: WorkerPool,
        retry: RetryPolicy,
        affiliations: Arc<dyn AffiliationSource>,
        facts: Arc<dyn EntityFactsSource>,
    ) -> Self {
        Self {
            pool,
            retry,
            affiliations,
            facts,
        }
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Current corporation and alliance of each character, with names when the source has them
    #[instrument(skip_all, fields(count = ids.len()))]
    pub async fn fetch_affiliations(
        &self,
        ids: &[CharacterId],
    ) -> FetchBatch<CharacterId, CharacterAffiliation> {
        self.fetch_batch("affiliation", ids, |id| {
            self.affiliations.fetch_affiliation(id)
        })
        .await
    }

    /// Character names
    #[instrument(skip_all, fields(count = ids.len()))]
    pub async fn fetch_characters(
        &self,
        ids: &[CharacterId],
    ) -> FetchBatch<CharacterId, EntityMetadata> {
        self.fetch_batch("character", ids, |id| self.facts.fetch_character(id))
            .await
    }

    /// Corporation names and tickers
    #[instrument(skip_all, fields(count = ids.len()))]
    pub async fn fetch_corporations(
        &self,
        ids: &[CorporationId],
    ) -> FetchBatch<CorporationId, EntityMetadata> {
        self.fetch_batch("corporation", ids, |id| self.facts.fetch_corporation(id))
            .await
    }

    async fn fetch_batch<K, V, F, Fut>(
        &self,
        kind: &'static str,
        ids: &[K],
        fetch: F,
    ) -> FetchBatch<K, V>
    where
        K: Copy + Ord + Hash + std::fmt::Display,
        F: Fn(K) -> Fut,
        Fut: Future<Output = UpstreamResult<Lookup<V>>>,
    {
        let unique: BTreeSet<K> = ids.iter().copied().collect();
        let fetch = &fetch;

        let outcomes = self
            .pool
            .map(unique, |id| async move { self.retry.run(kind, || fetch(id)).await })
            .await;

        let mut batch = FetchBatch {
            found: HashMap::with_capacity(outcomes.len()),
            failed: HashMap::new(),
        };
        for (id, outcome) in outcomes {
            match outcome {
                Ok(lookup) => {
                    if lookup.is_not_found() {
                        debug!(kind, id = %id, "Entity not found upstream");
                    }
                    batch.found.insert(id, lookup);
                }
                Err(err) => {
                    warn!(kind, id = %id, error = %err, "Lookup failed");
                    batch.failed.insert(id, err);
                }
            }
        }

        info!(
            kind,
            requested = batch.requested(),
            resolved = batch.found.len(),
            failed = batch.failed.len(),
            "Batch fetch complete"
        );
        batch
    }
}

impl std::fmt::Debug for AffiliationFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AffiliationFetcher")
            .field("pool", &self.pool)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
