//! Applies corrective actions to Discord, one call per action

use std::sync::Arc;

use forcinha_core::traits::RoleSink;
use forcinha_core::{Action, ActionOutcome, ActionResult, GuildPolicy, MemberRecord};
use tracing::{info, instrument, warn};

#[derive(Clone)]
pub struct ActionApplier {
    sink: Arc<dyn RoleSink>,
}

impl ActionApplier {
    pub fn new(sink: Arc<dyn RoleSink>) -> Self {
        Self { sink }
    }

    /// Apply every action in order. A failed call is recorded and the rest still run.
    #[instrument(skip_all, fields(guild_id = %policy.guild_id(), user_id = %member.user_id))]
    pub async fn apply(
        &self,
        policy: &GuildPolicy,
        member: &MemberRecord,
        actions: Vec<Action>,
    ) -> Vec<ActionResult> {
        let mut results = Vec::with_capacity(actions.len());
        for action in actions {
            results.push(self.apply_one(policy, member, action).await);
        }
        results
    }

    async fn apply_one(
        &self,
        policy: &GuildPolicy,
        member: &MemberRecord,
        action: Action,
    ) -> ActionResult {
        let guild_id = policy.guild_id();
        let user_id = member.user_id;

        let (subject, outcome) = match &action {
            Action::AddRole { role_id } => (
                role_label(policy, *role_id),
                self.sink.add_role(guild_id, user_id, *role_id).await,
            ),
            Action::RemoveRole { role_id } => (
                role_label(policy, *role_id),
                self.sink.remove_role(guild_id, user_id, *role_id).await,
            ),
            Action::SetNickname { nickname } => (
                nickname.clone().unwrap_or_default(),
                self.sink
                    .set_nickname(guild_id, user_id, nickname.as_deref())
                    .await,
            ),
        };

        let member_name = member.display_name().to_string();
        let outcome = match outcome {
            Ok(()) => {
                info!(action = ?action, member = %member_name, subject = %subject, "Action applied");
                ActionOutcome::Succeeded
            }
            Err(e) => {
                warn!(action = ?action, member = %member_name, error = %e, "Action failed");
                ActionOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        ActionResult {
            user_id,
            member_name,
            action,
            subject,
            outcome,
        }
    }
}

fn role_label(policy: &GuildPolicy, role_id: forcinha_core::Snowflake) -> String {
    policy
        .role_name(role_id)
        .map_or_else(|| role_id.to_string(), str::to_string)
}

impl std::fmt::Debug for ActionApplier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionApplier").finish_non_exhaustive()
    }
}
