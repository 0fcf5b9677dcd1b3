//! In-process fakes of the capability traits for service tests

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use forcinha_core::traits::{
    AffiliationSource, EntityFactsSource, LinkStore, MemberSource, RoleSink,
};
use forcinha_core::{
    Affiliation, AllianceId, CharacterAffiliation, CharacterId, CharacterLink, CorporationId,
    DomainError, EntityMetadata, Lookup, MemberRecord, RepoResult, Snowflake, UpstreamError,
    UpstreamResult,
};
use parking_lot::Mutex;

// ============================================================================
// ESI
// ============================================================================

#[derive(Default)]
struct EsiState {
    characters: HashMap<i64, (String, Affiliation)>,
    corporations: HashMap<i64, EntityMetadata>,
    failing_characters: HashMap<i64, u16>,
    failing_corporations: HashMap<i64, u16>,
    character_calls: HashMap<i64, usize>,
    corporation_calls: HashMap<i64, usize>,
}

/// ESI double: unknown ids answer 404
///
/// Affiliation and name lookups share one per-character counter, like the
/// single `GET /characters/{id}` endpoint behind both.
#[derive(Default)]
pub struct FakeEsi {
    state: Mutex<EsiState>,
    latency: Duration,
    affiliation_only: bool,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeEsi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Affiliation answers carry no character name
    pub fn affiliation_only(mut self) -> Self {
        self.affiliation_only = true;
        self
    }

    pub fn character(&self, id: i64, name: &str, corporation: i64, alliance: Option<i64>) {
        let affiliation =
            Affiliation::new(CorporationId::new(corporation), alliance.map(AllianceId::new));
        self.state
            .lock()
            .characters
            .insert(id, (name.to_string(), affiliation));
    }

    pub fn remove_character(&self, id: i64) {
        self.state.lock().characters.remove(&id);
    }

    pub fn corporation(&self, id: i64, name: &str, ticker: &str) {
        self.state
            .lock()
            .corporations
            .insert(id, EntityMetadata::corporation(name, ticker));
    }

    pub fn fail_character(&self, id: i64, status: u16) {
        self.state.lock().failing_characters.insert(id, status);
    }

    pub fn heal_character(&self, id: i64) {
        self.state.lock().failing_characters.remove(&id);
    }

    pub fn character_calls(&self, id: i64) -> usize {
        self.state.lock().character_calls.get(&id).copied().unwrap_or(0)
    }

    pub fn corporation_calls(&self, id: i64) -> usize {
        self.state.lock().corporation_calls.get(&id).copied().unwrap_or(0)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    async fn enter(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl AffiliationSource for FakeEsi {
    async fn fetch_affiliation(
        &self,
        character_id: CharacterId,
    ) -> UpstreamResult<Lookup<CharacterAffiliation>> {
        self.enter().await;
        let id = character_id.into_inner();
        let mut state = self.state.lock();
        *state.character_calls.entry(id).or_default() += 1;
        if let Some(status) = state.failing_characters.get(&id) {
            return Err(UpstreamError::status(*status, "fake failure"));
        }
        Ok(state
            .characters
            .get(&id)
            .map_or(Lookup::NotFound, |(name, affiliation)| {
                let answer = CharacterAffiliation::new(*affiliation);
                if self.affiliation_only {
                    Lookup::Found(answer)
                } else {
                    Lookup::Found(answer.with_name(name.clone()))
                }
            }))
    }
}

#[async_trait]
impl EntityFactsSource for FakeEsi {
    async fn fetch_character(
        &self,
        character_id: CharacterId,
    ) -> UpstreamResult<Lookup<EntityMetadata>> {
        self.enter().await;
        let id = character_id.into_inner();
        let mut state = self.state.lock();
        *state.character_calls.entry(id).or_default() += 1;
        if let Some(status) = state.failing_characters.get(&id) {
            return Err(UpstreamError::status(*status, "fake failure"));
        }
        Ok(state.characters.get(&id).map_or(Lookup::NotFound, |(name, _)| {
            Lookup::Found(EntityMetadata::character(name.clone()))
        }))
    }

    async fn fetch_corporation(
        &self,
        corporation_id: CorporationId,
    ) -> UpstreamResult<Lookup<EntityMetadata>> {
        self.enter().await;
        let id = corporation_id.into_inner();
        let mut state = self.state.lock();
        *state.corporation_calls.entry(id).or_default() += 1;
        if let Some(status) = state.failing_corporations.get(&id) {
            return Err(UpstreamError::status(*status, "fake failure"));
        }
        Ok(state
            .corporations
            .get(&id)
            .cloned()
            .map_or(Lookup::NotFound, Lookup::Found))
    }
}

// ============================================================================
// Discord
// ============================================================================

#[derive(Default)]
struct DiscordState {
    members: BTreeMap<Snowflake, MemberRecord>,
    forbidden: Vec<Snowflake>,
    listing_error: Option<u16>,
    mutations: usize,
}

/// One guild whose members the role sink actually mutates
pub struct FakeDiscord {
    guild_id: Snowflake,
    state: Mutex<DiscordState>,
}

impl FakeDiscord {
    pub fn new(guild_id: Snowflake) -> Self {
        Self {
            guild_id,
            state: Mutex::new(DiscordState::default()),
        }
    }

    pub fn add_member(&self, member: MemberRecord) {
        self.state.lock().members.insert(member.user_id, member);
    }

    pub fn member(&self, user_id: Snowflake) -> Option<MemberRecord> {
        self.state.lock().members.get(&user_id).cloned()
    }

    /// Mutations on this member answer 403
    pub fn forbid(&self, user_id: Snowflake) {
        self.state.lock().forbidden.push(user_id);
    }

    pub fn fail_listing(&self, status: u16) {
        self.state.lock().listing_error = Some(status);
    }

    pub fn mutations(&self) -> usize {
        self.state.lock().mutations
    }

    fn mutate(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        change: impl FnOnce(&mut MemberRecord),
    ) -> UpstreamResult<()> {
        let mut state = self.state.lock();
        state.mutations += 1;
        if guild_id != self.guild_id {
            return Err(UpstreamError::status(404, "Unknown Guild"));
        }
        if state.forbidden.contains(&user_id) {
            return Err(UpstreamError::status(403, "Missing Permissions"));
        }
        let member = state
            .members
            .get_mut(&user_id)
            .ok_or_else(|| UpstreamError::status(404, "Unknown Member"))?;
        change(member);
        Ok(())
    }
}

#[async_trait]
impl MemberSource for FakeDiscord {
    async fn list_members(&self, guild_id: Snowflake) -> UpstreamResult<Vec<MemberRecord>> {
        let state = self.state.lock();
        if let Some(status) = state.listing_error {
            return Err(UpstreamError::status(status, "listing failed"));
        }
        if guild_id != self.guild_id {
            return Err(UpstreamError::status(404, "Unknown Guild"));
        }
        Ok(state.members.values().filter(|m| !m.bot).cloned().collect())
    }

    async fn get_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> UpstreamResult<Option<MemberRecord>> {
        if guild_id != self.guild_id {
            return Ok(None);
        }
        Ok(self.member(user_id))
    }
}

#[async_trait]
impl RoleSink for FakeDiscord {
    async fn add_role(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
    ) -> UpstreamResult<()> {
        self.mutate(guild_id, user_id, |m| {
            m.role_ids.insert(role_id);
        })
    }

    async fn remove_role(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
    ) -> UpstreamResult<()> {
        self.mutate(guild_id, user_id, |m| {
            m.role_ids.remove(&role_id);
        })
    }

    async fn set_nickname(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        nickname: Option<&str>,
    ) -> UpstreamResult<()> {
        let nickname = nickname.map(str::to_string);
        self.mutate(guild_id, user_id, |m| m.nickname = nickname)
    }
}

// ============================================================================
// Links
// ============================================================================

#[derive(Default)]
pub struct FakeLinks {
    links: Mutex<HashMap<Snowflake, CharacterLink>>,
    unavailable: AtomicBool,
}

impl FakeLinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn link(&self, user_id: Snowflake, character_id: i64) {
        self.links.lock().insert(
            user_id,
            CharacterLink::new(user_id, Some(CharacterId::new(character_id))),
        );
    }

    pub fn set_unavailable(&self) {
        self.unavailable.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> RepoResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DomainError::DatabaseError("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LinkStore for FakeLinks {
    async fn get_all_links(&self) -> RepoResult<Vec<CharacterLink>> {
        self.check()?;
        Ok(self.links.lock().values().cloned().collect())
    }

    async fn get_link(&self, discord_user_id: Snowflake) -> RepoResult<Option<CharacterLink>> {
        self.check()?;
        Ok(self.links.lock().get(&discord_user_id).cloned())
    }

    async fn upsert_link(
        &self,
        discord_user_id: Snowflake,
        character_id: Option<CharacterId>,
    ) -> RepoResult<CharacterLink> {
        self.check()?;
        let link = CharacterLink::new(discord_user_id, character_id);
        self.links.lock().insert(discord_user_id, link.clone());
        Ok(link)
    }
}
