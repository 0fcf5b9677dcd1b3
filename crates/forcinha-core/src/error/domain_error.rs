//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::Snowflake;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Guild not configured: {0}")]
    GuildNotConfigured(Snowflake),

    #[error("Member not found in guild")]
    MemberNotFound,

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Invalid guild policy: {0}")]
    InvalidPolicy(String),

    #[error("Role {role_id} is referenced by more than one rule")]
    DuplicateRole { role_id: Snowflake },

    #[error("Rule name '{0}' is used more than once")]
    DuplicateRuleName(String),

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::GuildNotConfigured(_) => "UNKNOWN_GUILD",
            Self::MemberNotFound => "UNKNOWN_MEMBER",

            Self::InvalidPolicy(_) => "INVALID_POLICY",
            Self::DuplicateRole { .. } => "DUPLICATE_ROLE",
            Self::DuplicateRuleName(_) => "DUPLICATE_RULE_NAME",

            Self::Upstream(_) => "UPSTREAM_ERROR",
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::CacheError(_) => "CACHE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::GuildNotConfigured(_) | Self::MemberNotFound)
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidPolicy(_) | Self::DuplicateRole { .. } | Self::DuplicateRuleName(_)
        )
    }
}
