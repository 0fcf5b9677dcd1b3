//! Service context - dependency container for services
//!
//! Holds the capability implementations, the guild policies, and the shared
//! fetch machinery (worker pool, retry policy, metadata cache).

use std::num::NonZeroU32;
use std::sync::Arc;

use forcinha_common::{EsiConfig, ReportLocale};
use forcinha_core::traits::{
    AffiliationSource, EntityFactsSource, LinkStore, MemberSource, MetadataStore, RoleSink,
};
use forcinha_core::{GuildPolicy, Snowflake};

use super::applier::ActionApplier;
use super::error::{ServiceError, ServiceResult};
use super::fetcher::AffiliationFetcher;
use super::metadata::EntityMetadataCache;
use super::pool::WorkerPool;
use super::retry::RetryPolicy;

/// Service context containing all dependencies
///
/// Cheap to clone; every component is reference counted. The worker pool
/// inside the fetcher is shared by every run made through the same context.
#[derive(Clone)]
pub struct ServiceContext {
    members: Arc<dyn MemberSource>,
    links: Arc<dyn LinkStore>,
    fetcher: AffiliationFetcher,
    metadata: EntityMetadataCache,
    applier: ActionApplier,
    policies: Arc<Vec<GuildPolicy>>,
    locale: ReportLocale,
}

impl ServiceContext {
    pub fn builder() -> ServiceContextBuilder {
        ServiceContextBuilder::new()
    }

    // === Discord ===

    pub fn members(&self) -> &dyn MemberSource {
        self.members.as_ref()
    }

    pub fn applier(&self) -> &ActionApplier {
        &self.applier
    }

    // === Storage ===

    pub fn links(&self) -> &dyn LinkStore {
        self.links.as_ref()
    }

    pub fn metadata(&self) -> &EntityMetadataCache {
        &self.metadata
    }

    // === ESI ===

    pub fn fetcher(&self) -> &AffiliationFetcher {
        &self.fetcher
    }

    // === Policies ===

    /// Configured guilds, in file order
    pub fn policies(&self) -> &[GuildPolicy] {
        &self.policies
    }

    pub fn policy(&self, guild_id: Snowflake) -> Option<&GuildPolicy> {
        self.policies.iter().find(|p| p.guild_id() == guild_id)
    }

    #[inline]
    pub fn locale(&self) -> ReportLocale {
        self.locale
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("guilds", &self.policies.len())
            .field("fetcher", &self.fetcher)
            .field("locale", &self.locale)
            .finish_non_exhaustive()
    }
}

/// Builder for creating ServiceContext
#[derive(Default)]
pub struct ServiceContextBuilder {
    member_source: Option<Arc<dyn MemberSource>>,
    role_sink: Option<Arc<dyn RoleSink>>,
    link_store: Option<Arc<dyn LinkStore>>,
    affiliation_source: Option<Arc<dyn AffiliationSource>>,
    entity_facts_source: Option<Arc<dyn EntityFactsSource>>,
    metadata_store: Option<Arc<dyn MetadataStore>>,
    policies: Vec<GuildPolicy>,
    esi: EsiConfig,
    locale: ReportLocale,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use one Discord client as both membership source and role sink
    pub fn discord<T>(mut self, client: Arc<T>) -> Self
    where
        T: MemberSource + RoleSink + 'static,
    {
        self.member_source = Some(client.clone());
        self.role_sink = Some(client);
        self
    }

    /// Use one ESI client for affiliations and entity facts
    pub fn esi<T>(mut self, client: Arc<T>) -> Self
    where
        T: AffiliationSource + EntityFactsSource + 'static,
    {
        self.affiliation_source = Some(client.clone());
        self.entity_facts_source = Some(client);
        self
    }

    pub fn member_source(mut self, source: Arc<dyn MemberSource>) -> Self {
        self.member_source = Some(source);
        self
    }

    pub fn role_sink(mut self, sink: Arc<dyn RoleSink>) -> Self {
        self.role_sink = Some(sink);
        self
    }

    pub fn link_store(mut self, store: Arc<dyn LinkStore>) -> Self {
        self.link_store = Some(store);
        self
    }

    pub fn affiliation_source(mut self, source: Arc<dyn AffiliationSource>) -> Self {
        self.affiliation_source = Some(source);
        self
    }

    pub fn entity_facts_source(mut self, source: Arc<dyn EntityFactsSource>) -> Self {
        self.entity_facts_source = Some(source);
        self
    }

    pub fn metadata_store(mut self, store: Arc<dyn MetadataStore>) -> Self {
        self.metadata_store = Some(store);
        self
    }

    pub fn policies(mut self, policies: impl IntoIterator<Item = GuildPolicy>) -> Self {
        self.policies.extend(policies);
        self
    }

    /// Concurrency, retry and timeout settings for ESI batches
    pub fn esi_config(mut self, config: EsiConfig) -> Self {
        self.esi = config;
        self
    }

    pub fn locale(mut self, locale: ReportLocale) -> Self {
        self.locale = locale;
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Internal` if any required dependency is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        let missing = |what: &str| ServiceError::internal(format!("{what} is required"));

        let mut pool = WorkerPool::new(self.esi.max_concurrency);
        if let Some(per_second) = self.esi.requests_per_second.and_then(NonZeroU32::new) {
            pool = pool.with_rate_limit(per_second);
        }

        let fetcher = AffiliationFetcher::new(
            pool,
            RetryPolicy::from_config(&self.esi),
            self.affiliation_source
                .ok_or_else(|| missing("affiliation_source"))?,
            self.entity_facts_source
                .ok_or_else(|| missing("entity_facts_source"))?,
        );
        let metadata = EntityMetadataCache::new(
            self.metadata_store.ok_or_else(|| missing("metadata_store"))?,
            fetcher.clone(),
        );

        Ok(ServiceContext {
            members: self.member_source.ok_or_else(|| missing("member_source"))?,
            links: self.link_store.ok_or_else(|| missing("link_store"))?,
            applier: ActionApplier::new(self.role_sink.ok_or_else(|| missing("role_sink"))?),
            fetcher,
            metadata,
            policies: Arc::new(self.policies),
            locale: self.locale,
        })
    }
}
