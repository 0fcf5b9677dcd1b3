//! Domain entities - core business objects

mod action;
mod affiliation;
mod auditee;
mod link;
mod member;
mod metadata;
mod policy;
mod template;

pub use action::{Action, ActionOutcome, ActionResult, ResultKind};
pub use affiliation::{Affiliation, CharacterAffiliation, Lookup};
pub use auditee::{Auditee, CharacterState, DesiredState, ResolvedCharacter};
pub use link::CharacterLink;
pub use member::MemberRecord;
pub use metadata::EntityMetadata;
pub use policy::{GuildPolicy, NicknamePolicy, NicknameRule, RoleRule};
pub use template::{NicknameTemplate, TemplateValues};
