//! # forcinha-core
//!
//! Domain layer: ids, guild policies, member and character state, the pure
//! reconciliation rules, and the capability traits infrastructure implements.
//! This crate has zero dependencies on infrastructure (database, HTTP, etc.).

pub mod entities;
pub mod error;
pub mod reconcile;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    Action, ActionOutcome, ActionResult, Affiliation, Auditee, CharacterAffiliation,
    CharacterLink, CharacterState, DesiredState, EntityMetadata, GuildPolicy, Lookup, MemberRecord, NicknamePolicy,
    NicknameRule, NicknameTemplate, ResolvedCharacter, ResultKind, RoleRule, TemplateValues,
};
pub use error::{DomainError, UpstreamError};
pub use traits::{
    AffiliationSource, EntityFactsSource, LinkStore, MemberSource, MetadataStore, RepoResult,
    RoleSink, UpstreamResult,
};
pub use value_objects::{
    AllianceId, CharacterId, CorporationId, EntityId, LocaleParseError, ReportLocale, Snowflake,
    SnowflakeParseError,
};
