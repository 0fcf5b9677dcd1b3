//! Entity metadata - immutable public attributes of EVE characters and corporations

use serde::{Deserialize, Serialize};

/// Cached attributes of one EVE entity
///
/// Entries never change once written. A 404 from upstream is stored as a
/// tombstone so the id is not fetched again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityMetadata {
    Character {
        name: String,
    },
    Corporation {
        name: String,
        ticker: String,
    },
}

impl EntityMetadata {
    pub const DELETED_CHARACTER: &'static str = "Deleted Character";
    pub const DELETED_CORPORATION: &'static str = "Deleted Corporation";

    pub fn character(name: impl Into<String>) -> Self {
        Self::Character { name: name.into() }
    }

    pub fn corporation(name: impl Into<String>, ticker: impl Into<String>) -> Self {
        Self::Corporation {
            name: name.into(),
            ticker: ticker.into(),
        }
    }

    /// Tombstone for a character upstream no longer knows about
    pub fn deleted_character() -> Self {
        Self::character(Self::DELETED_CHARACTER)
    }

    /// Tombstone for a corporation upstream no longer knows about
    pub fn deleted_corporation() -> Self {
        Self::corporation(Self::DELETED_CORPORATION, Self::DELETED_CORPORATION)
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Character { name } | Self::Corporation { name, .. } => name,
        }
    }

    /// Corporation ticker; `None` for characters
    pub fn ticker(&self) -> Option<&str> {
        match self {
            Self::Character { .. } => None,
            Self::Corporation { ticker, .. } => Some(ticker),
        }
    }

    pub fn is_tombstone(&self) -> bool {
        match self {
            Self::Character { name } => name == Self::DELETED_CHARACTER,
            Self::Corporation { ticker, .. } => ticker == Self::DELETED_CORPORATION,
        }
    }
}
