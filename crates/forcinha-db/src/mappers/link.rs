//! CharacterLink entity <-> model mapper

use forcinha_core::{CharacterId, CharacterLink, Snowflake};

use crate::models::CharacterLinkModel;

impl From<CharacterLinkModel> for CharacterLink {
    fn from(model: CharacterLinkModel) -> Self {
        CharacterLink {
            discord_user_id: Snowflake::new(model.discord_user_id),
            character_id: model.character_id.map(CharacterId::new),
            updated_at: model.updated_at,
        }
    }
}
