//! ESI response bodies (only the fields we read).

use serde::Deserialize;

/// `GET /characters/{character_id}`
#[derive(Debug, Clone, Deserialize)]
pub struct CharacterResponse {
    pub name: String,
    pub corporation_id: i64,
    #[serde(default)]
    pub alliance_id: Option<i64>,
}

/// `GET /corporations/{corporation_id}`
#[derive(Debug, Clone, Deserialize)]
pub struct CorporationResponse {
    pub name: String,
    pub ticker: String,
}
