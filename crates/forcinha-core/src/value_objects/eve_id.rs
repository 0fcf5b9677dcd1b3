//! EVE Online entity identifiers
//!
//! ESI ids are 32-bit in practice but exposed as `i64` in JSON. Every id type
//! converts into [`EntityId`], the key used by the entity metadata store. EVE ids
//! are unique across entity kinds, so one keyspace is enough.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Untyped EVE entity id (metadata store key)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(i64);

impl EntityId {
    #[inline]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn into_inner(self) -> i64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! eve_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            #[inline]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            #[inline]
            pub const fn into_inner(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for EntityId {
            fn from(id: $name) -> Self {
                EntityId(id.0)
            }
        }
    };
}

eve_id!(
    /// EVE character id
    CharacterId
);
eve_id!(
    /// EVE corporation id
    CorporationId
);
eve_id!(
    /// EVE alliance id
    AllianceId
);

impl CorporationId {
    /// NPC corporation that holds characters which have been biomassed or
    /// otherwise moved to the graveyard.
    pub const GRAVEYARD: Self = Self(1_000_001);

    /// Check whether this is the graveyard corporation
    #[inline]
    pub fn is_graveyard(self) -> bool {
        self == Self::GRAVEYARD
    }
}
