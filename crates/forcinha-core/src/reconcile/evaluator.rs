//! Policy evaluation - character state + guild policy -> desired state

use std::collections::BTreeSet;

use crate::entities::{
    Auditee, CharacterState, DesiredState, GuildPolicy, MemberRecord, TemplateValues,
};

/// Discord rejects nicknames longer than this
pub const NICKNAME_MAX_CHARS: usize = 32;

/// Compute the roles and nickname a member should have
///
/// Unlinked and unresolved characters get no managed roles and no nickname.
/// The first matching role rule and the first matching nickname rule win.
pub fn evaluate(character: &CharacterState, policy: &GuildPolicy) -> DesiredState {
    let Some(resolved) = character.resolved() else {
        return DesiredState::default();
    };
    let affiliation = resolved.affiliation;

    let roles: BTreeSet<_> = policy
        .role_rules()
        .iter()
        .find(|rule| rule.matches(affiliation.corporation_id, affiliation.alliance_id))
        .map(|rule| rule.role_id)
        .into_iter()
        .collect();

    let rendered = policy
        .nicknames()
        .template_for(affiliation.corporation_id)
        .render(TemplateValues {
            character_name: resolved.character_name.as_deref(),
            corporation_ticker: resolved.corporation_ticker.as_deref(),
        });

    DesiredState {
        roles,
        nickname: normalize_nickname(&rendered),
    }
}

/// Join a member with their character state and evaluate the policy
pub fn build_auditee(
    member: MemberRecord,
    character: CharacterState,
    policy: &GuildPolicy,
) -> Auditee {
    let desired = evaluate(&character, policy);
    Auditee {
        member,
        character,
        desired,
    }
}

fn normalize_nickname(rendered: &str) -> Option<String> {
    let trimmed = rendered.trim();
    if trimmed.is_empty() {
        return None;
    }
    let truncated: String = trimmed.chars().take(NICKNAME_MAX_CHARS).collect();
    Some(truncated.trim_end().to_string())
}
