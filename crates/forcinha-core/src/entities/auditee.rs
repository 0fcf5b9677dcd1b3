//! Auditee - one member joined with everything known about their character

use std::collections::BTreeSet;

use crate::entities::{Affiliation, MemberRecord};
use crate::value_objects::{CharacterId, Snowflake};

/// What the run learned about a member's character
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CharacterState {
    /// No link on record
    Unlinked,
    /// Linked, but no usable affiliation (lookup failed, 404 or graveyard)
    Unresolved { character_id: CharacterId },
    Resolved(ResolvedCharacter),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCharacter {
    pub character_id: CharacterId,
    pub affiliation: Affiliation,
    pub character_name: Option<String>,
    pub corporation_ticker: Option<String>,
}

impl CharacterState {
    pub fn resolved(&self) -> Option<&ResolvedCharacter> {
        match self {
            Self::Resolved(character) => Some(character),
            _ => None,
        }
    }

    pub fn character_id(&self) -> Option<CharacterId> {
        match self {
            Self::Unlinked => None,
            Self::Unresolved { character_id } => Some(*character_id),
            Self::Resolved(character) => Some(character.character_id),
        }
    }
}

/// Target state computed from policy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesiredState {
    pub roles: BTreeSet<Snowflake>,
    pub nickname: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Auditee {
    pub member: MemberRecord,
    pub character: CharacterState,
    pub desired: DesiredState,
}

impl Auditee {
    #[inline]
    pub fn user_id(&self) -> Snowflake {
        self.member.user_id
    }

    #[inline]
    pub fn is_registered(&self) -> bool {
        !matches!(self.character, CharacterState::Unlinked)
    }
}
