//! State diffing - desired vs observed member state -> ordered actions

use std::collections::BTreeSet;

use crate::entities::{Action, DesiredState, MemberRecord};
use crate::value_objects::Snowflake;

/// Compute the minimal action list that moves `member` to `desired`
///
/// Only roles in `managed` are considered. Output order: additions by
/// ascending role id, removals by ascending role id, then at most one
/// nickname change.
pub fn diff(
    desired: &DesiredState,
    member: &MemberRecord,
    managed: &BTreeSet<Snowflake>,
) -> Vec<Action> {
    let current = member.managed_roles(managed);
    let wanted: BTreeSet<_> = desired.roles.intersection(managed).copied().collect();

    let mut actions: Vec<Action> = wanted
        .difference(&current)
        .map(|&role_id| Action::AddRole { role_id })
        .collect();

    actions.extend(
        current
            .difference(&wanted)
            .map(|&role_id| Action::RemoveRole { role_id }),
    );

    if member.nickname != desired.nickname {
        actions.push(Action::SetNickname {
            nickname: desired.nickname.clone(),
        });
    }

    actions
}
