//! Reconciliation engine
//!
//! One run per guild: fetch members, resolve characters, evaluate the policy,
//! diff, apply, report. Only missing membership, an unavailable link store, or
//! a wholesale affiliation outage abort a run; everything else ends up as a
//! line in the report.

use std::collections::{BTreeSet, HashMap};

use forcinha_core::reconcile::{build_auditee, diff};
use forcinha_core::{
    Affiliation, CharacterId, CharacterState, DomainError, EntityMetadata, GuildPolicy, Lookup,
    MemberRecord, ResolvedCharacter, Snowflake,
};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::context::ServiceContext;
use super::error::{FetchStage, ServiceError, ServiceResult};
use super::report::ReconciliationReport;

/// A guild whose run was aborted
#[derive(Debug, Clone, Serialize)]
pub struct GuildFailure {
    pub guild_id: Snowflake,
    pub guild_name: String,
    pub error: String,
}

/// Reports of a multi-guild run
#[derive(Debug, Clone, Serialize)]
pub struct AuditRun {
    pub run_id: Uuid,
    pub reports: Vec<ReconciliationReport>,
    pub failed_guilds: Vec<GuildFailure>,
}

impl AuditRun {
    fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            reports: Vec::new(),
            failed_guilds: Vec::new(),
        }
    }

    fn fail(&mut self, policy: &GuildPolicy, err: &ServiceError) {
        error!(guild_id = %policy.guild_id(), guild = policy.name(), error = %err, "Guild audit aborted");
        self.failed_guilds.push(GuildFailure {
            guild_id: policy.guild_id(),
            guild_name: policy.name().to_string(),
            error: err.to_string(),
        });
    }
}

/// Discord user id -> linked character
type LinkMap = HashMap<Snowflake, CharacterId>;

/// Reconciliation engine
pub struct ReconciliationEngine<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ReconciliationEngine<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Reconcile every member of one configured guild
    #[instrument(skip(self))]
    pub async fn run_guild(&self, guild_id: Snowflake) -> ServiceResult<ReconciliationReport> {
        let policy = self
            .ctx
            .policy(guild_id)
            .ok_or(DomainError::GuildNotConfigured(guild_id))?;

        let links = self.load_links().await?;
        self.run_policy(Uuid::new_v4(), policy, &links).await
    }

    /// Reconcile every configured guild
    ///
    /// A guild whose membership cannot be listed is reported in
    /// `failed_guilds` and the remaining guilds still run.
    #[instrument(skip(self))]
    pub async fn run_all(&self) -> ServiceResult<AuditRun> {
        let mut run = AuditRun::new(Uuid::new_v4());
        let links = self.load_links().await?;

        for policy in self.ctx.policies() {
            match self.run_policy(run.run_id, policy, &links).await {
                Ok(report) => run.reports.push(report),
                Err(e) => run.fail(policy, &e),
            }
        }
        Ok(run)
    }

    /// Reconcile one user in every configured guild they belong to
    #[instrument(skip(self))]
    pub async fn audit_user(&self, user_id: Snowflake) -> ServiceResult<AuditRun> {
        let mut run = AuditRun::new(Uuid::new_v4());

        let link = self
            .ctx
            .links()
            .get_link(user_id)
            .await
            .map_err(|e| ServiceError::fatal(FetchStage::Links, e.to_string()))?;
        let links: LinkMap = link
            .and_then(|l| l.character_id.map(|c| (l.discord_user_id, c)))
            .into_iter()
            .collect();

        for policy in self.ctx.policies() {
            let member = match self.ctx.members().get_member(policy.guild_id(), user_id).await {
                Ok(Some(member)) => member,
                Ok(None) => {
                    debug!(guild_id = %policy.guild_id(), "User is not a member, skipping guild");
                    continue;
                }
                Err(e) => {
                    run.fail(policy, &ServiceError::fatal(FetchStage::Members, e.to_string()));
                    continue;
                }
            };

            match self.reconcile(run.run_id, policy, vec![member], &links).await {
                Ok(report) => run.reports.push(report),
                Err(e) => run.fail(policy, &e),
            }
        }
        Ok(run)
    }

    async fn load_links(&self) -> ServiceResult<LinkMap> {
        let links = self
            .ctx
            .links()
            .get_all_links()
            .await
            .map_err(|e| ServiceError::fatal(FetchStage::Links, e.to_string()))?;

        Ok(links
            .into_iter()
            .filter_map(|link| link.character_id.map(|c| (link.discord_user_id, c)))
            .collect())
    }

    async fn run_policy(
        &self,
        run_id: Uuid,
        policy: &GuildPolicy,
        links: &LinkMap,
    ) -> ServiceResult<ReconciliationReport> {
        let members = self
            .ctx
            .members()
            .list_members(policy.guild_id())
            .await
            .map_err(|e| ServiceError::fatal(FetchStage::Members, e.to_string()))?;

        self.reconcile(run_id, policy, members, links).await
    }

    #[instrument(skip_all, fields(guild_id = %policy.guild_id(), members = members.len()))]
    async fn reconcile(
        &self,
        run_id: Uuid,
        policy: &GuildPolicy,
        members: Vec<MemberRecord>,
        links: &LinkMap,
    ) -> ServiceResult<ReconciliationReport> {
        let mut report = ReconciliationReport::start(run_id, policy);
        let audited = members.len();

        let character_ids: Vec<CharacterId> = members
            .iter()
            .filter_map(|m| links.get(&m.user_id).copied())
            .collect();
        let characters = self.resolve_characters(&character_ids).await?;

        for member in members {
            let character = match links.get(&member.user_id) {
                None => {
                    report.record_unregistered(&member);
                    CharacterState::Unlinked
                }
                Some(id) => characters.get(id).cloned().map_or(
                    CharacterState::Unresolved { character_id: *id },
                    CharacterState::Resolved,
                ),
            };

            let auditee = build_auditee(member, character, policy);
            let actions = diff(&auditee.desired, &auditee.member, policy.managed_roles());
            if actions.is_empty() {
                continue;
            }

            for result in self
                .ctx
                .applier()
                .apply(policy, &auditee.member, actions)
                .await
            {
                report.record(result);
            }
        }

        let report = report.finish(audited);
        info!(
            guild_id = %report.guild_id,
            members = report.members_audited,
            unregistered = report.unregistered.len(),
            roles_added = report.roles_added,
            roles_removed = report.roles_removed,
            nicknames_changed = report.nicknames_changed,
            failures = report.failures,
            "Guild audit complete"
        );
        Ok(report)
    }

    /// Affiliation, name and ticker for every character that resolved
    ///
    /// Characters already tombstoned in the metadata store are not looked up
    /// again and stay unresolved. Names that arrive with the affiliation are
    /// cached directly; only characters whose source sent no name go through
    /// the metadata cache.
    async fn resolve_characters(
        &self,
        ids: &[CharacterId],
    ) -> ServiceResult<HashMap<CharacterId, ResolvedCharacter>> {
        let metadata = self.ctx.metadata();
        let mut names = metadata.cached(ids).await;

        let live: Vec<CharacterId> = ids
            .iter()
            .copied()
            .filter(|id| !names.get(id).is_some_and(EntityMetadata::is_tombstone))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if live.is_empty() {
            return Ok(HashMap::new());
        }

        let affiliations = self.ctx.fetcher().fetch_affiliations(&live).await;
        if affiliations.is_total_transient_failure() {
            return Err(ServiceError::fatal(
                FetchStage::Affiliations,
                format!("all {} lookups failed", affiliations.failed.len()),
            ));
        }

        let mut usable: HashMap<CharacterId, Affiliation> = HashMap::new();
        for (id, lookup) in affiliations.found {
            let answer = match lookup {
                Lookup::Found(answer) => answer,
                Lookup::NotFound => {
                    warn!(character_id = %id, "Character no longer exists");
                    let tombstone = EntityMetadata::deleted_character();
                    metadata.record(id, &tombstone).await;
                    names.insert(id, tombstone);
                    continue;
                }
            };

            if let Some(name) = answer.name {
                let fresh = EntityMetadata::character(name);
                if names.get(&id) != Some(&fresh) {
                    metadata.record(id, &fresh).await;
                    names.insert(id, fresh);
                }
            }

            if answer.affiliation.is_usable() {
                usable.insert(id, answer.affiliation);
            } else {
                warn!(character_id = %id, "Character is in the graveyard corporation");
            }
        }

        let unnamed: Vec<CharacterId> = usable
            .keys()
            .copied()
            .filter(|id| !names.contains_key(id))
            .collect();
        let corporation_ids: Vec<_> = usable
            .values()
            .map(|a| a.corporation_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let (fetched_names, corporations) = tokio::join!(
            metadata.resolve_characters(&unnamed),
            metadata.resolve_corporations(&corporation_ids),
        );
        names.extend(fetched_names);

        Ok(usable
            .into_iter()
            .map(|(id, affiliation)| {
                let resolved = ResolvedCharacter {
                    character_id: id,
                    affiliation,
                    character_name: names.get(&id).map(|m| m.name().to_string()),
                    corporation_ticker: corporations
                        .get(&affiliation.corporation_id)
                        .and_then(|m| m.ticker())
                        .map(str::to_string),
                };
                (id, resolved)
            })
            .collect())
    }
}
