//! Affiliation data and upstream lookup outcomes

use serde::{Deserialize, Serialize};

use crate::value_objects::{AllianceId, CorporationId};

/// Corporation and alliance a character currently belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affiliation {
    pub corporation_id: CorporationId,
    pub alliance_id: Option<AllianceId>,
}

impl Affiliation {
    pub fn new(corporation_id: CorporationId, alliance_id: Option<AllianceId>) -> Self {
        Self {
            corporation_id,
            alliance_id,
        }
    }

    /// Graveyard affiliation carries no usable data
    #[inline]
    pub fn is_usable(&self) -> bool {
        !self.corporation_id.is_graveyard()
    }
}

/// Affiliation lookup answer, with the character name when the source has it
///
/// ESI serves both from `GET /characters/{id}`, so carrying the name here
/// saves a second request per character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterAffiliation {
    pub affiliation: Affiliation,
    pub name: Option<String>,
}

impl CharacterAffiliation {
    pub fn new(affiliation: Affiliation) -> Self {
        Self {
            affiliation,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Result of a single upstream lookup that completed
///
/// `NotFound` is a definitive answer (HTTP 404), not a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Self::Found(value) => Lookup::Found(f(value)),
            Self::NotFound => Lookup::NotFound,
        }
    }

    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}
