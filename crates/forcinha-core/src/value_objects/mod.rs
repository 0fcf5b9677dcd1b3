//! Value objects - immutable types that represent domain concepts

mod eve_id;
mod locale;
mod snowflake;

pub use eve_id::{AllianceId, CharacterId, CorporationId, EntityId};
pub use locale::{LocaleParseError, ReportLocale};
pub use snowflake::{Snowflake, SnowflakeParseError};
