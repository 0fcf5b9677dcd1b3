//! Reconciliation reports
//!
//! The engine produces structured data; [`ReconciliationReport::lines`] renders
//! it for humans in Portuguese or English.

use chrono::{DateTime, Utc};
use forcinha_core::{ActionResult, GuildPolicy, MemberRecord, ReportLocale, ResultKind, Snowflake};
use serde::Serialize;
use uuid::Uuid;

/// A member without a usable character link
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnregisteredMember {
    pub user_id: Snowflake,
    pub name: String,
}

impl From<&MemberRecord> for UnregisteredMember {
    fn from(member: &MemberRecord) -> Self {
        Self {
            user_id: member.user_id,
            name: member.display_name().to_string(),
        }
    }
}

/// Outcome of reconciling one guild
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationReport {
    pub run_id: Uuid,
    pub guild_id: Snowflake,
    pub guild_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub members_audited: usize,
    pub unregistered: Vec<UnregisteredMember>,
    pub roles_added: usize,
    pub roles_removed: usize,
    pub nicknames_changed: usize,
    pub failures: usize,
    pub results: Vec<ActionResult>,
}

impl ReconciliationReport {
    pub fn start(run_id: Uuid, policy: &GuildPolicy) -> Self {
        let now = Utc::now();
        Self {
            run_id,
            guild_id: policy.guild_id(),
            guild_name: policy.name().to_string(),
            started_at: now,
            finished_at: now,
            members_audited: 0,
            unregistered: Vec::new(),
            roles_added: 0,
            roles_removed: 0,
            nicknames_changed: 0,
            failures: 0,
            results: Vec::new(),
        }
    }

    pub fn record_unregistered(&mut self, member: &MemberRecord) {
        self.unregistered.push(UnregisteredMember::from(member));
    }

    pub fn record(&mut self, result: ActionResult) {
        match result.kind() {
            ResultKind::RoleAdded => self.roles_added += 1,
            ResultKind::RoleRemoved => self.roles_removed += 1,
            ResultKind::NicknameChanged => self.nicknames_changed += 1,
            ResultKind::ActionFailed => self.failures += 1,
        }
        self.results.push(result);
    }

    pub fn finish(mut self, members_audited: usize) -> Self {
        self.members_audited = members_audited;
        self.finished_at = Utc::now();
        self
    }

    /// Number of actions attempted
    #[inline]
    pub fn action_count(&self) -> usize {
        self.results.len()
    }

    /// Nothing needed changing
    #[inline]
    pub fn is_converged(&self) -> bool {
        self.results.is_empty()
    }

    /// Summary line followed by one line per action
    pub fn lines(&self, locale: ReportLocale) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.results.len() + 1);
        lines.push(self.summary(locale));
        lines.extend(self.results.iter().map(|r| r.describe(locale)));
        lines
    }

    pub fn summary(&self, locale: ReportLocale) -> String {
        match locale {
            ReportLocale::Pt => format!(
                "Auditoria de '{}': {} membros auditados, {} sem registro, {} roles adicionadas, {} roles removidas, {} apelidos alterados, {} falhas",
                self.guild_name,
                self.members_audited,
                self.unregistered.len(),
                self.roles_added,
                self.roles_removed,
                self.nicknames_changed,
                self.failures,
            ),
            ReportLocale::En => format!(
                "Audit of '{}': {} members audited, {} unregistered, {} roles added, {} roles removed, {} nicknames changed, {} failures",
                self.guild_name,
                self.members_audited,
                self.unregistered.len(),
                self.roles_added,
                self.roles_removed,
                self.nicknames_changed,
                self.failures,
            ),
        }
    }
}
