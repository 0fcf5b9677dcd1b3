//! HTTP client for the EVE Swagger Interface.
//!
//! Every request carries `X-Compatibility-Date`. The client makes exactly one
//! attempt per call; retries and the concurrency ceiling belong to the caller.

use std::time::Duration;

use async_trait::async_trait;
use forcinha_common::EsiConfig;
use forcinha_core::traits::{AffiliationSource, EntityFactsSource, UpstreamResult};
use forcinha_core::{
    Affiliation, AllianceId, CharacterAffiliation, CharacterId, CorporationId, EntityMetadata,
    Lookup,
};
use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::error::EsiError;
use crate::models::{CharacterResponse, CorporationResponse};

const COMPATIBILITY_DATE_HEADER: &str = "x-compatibility-date";

/// ESI's "error limited" status
const ENHANCE_YOUR_CALM: u16 = 420;

/// ESI client implementing the affiliation and entity-facts sources
#[derive(Debug, Clone)]
pub struct EsiClient {
    client: reqwest::Client,
    base_url: String,
}

impl EsiClient {
    /// Build a client from configuration
    pub fn new(config: &EsiConfig) -> Result<Self, EsiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            COMPATIBILITY_DATE_HEADER,
            HeaderValue::from_str(&config.compatibility_date)
                .map_err(|_| EsiError::Config("invalid compatibility date".into()))?,
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("forcinha/", env!("CARGO_PKG_VERSION"))),
        );

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| EsiError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// GET a JSON document; 404 becomes [`Lookup::NotFound`]
    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Lookup<T>, EsiError> {
        let url = format!("{}{endpoint}", self.base_url);
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| EsiError::Http {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            debug!(endpoint, "ESI entity not found");
            return Ok(Lookup::NotFound);
        }
        if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() == ENHANCE_YOUR_CALM {
            let retry_after = resp
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(EsiError::RateLimited {
                endpoint: endpoint.to_string(),
                retry_after,
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(EsiError::Api {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        // Body read failures (including a stalled body) stay transport errors
        let body = resp.bytes().await.map_err(|source| EsiError::Http {
            endpoint: endpoint.to_string(),
            source,
        })?;
        serde_json::from_slice::<T>(&body)
            .map(Lookup::Found)
            .map_err(|source| EsiError::Deserialization {
                endpoint: endpoint.to_string(),
                source,
            })
    }

    pub async fn get_character(
        &self,
        character_id: CharacterId,
    ) -> Result<Lookup<CharacterResponse>, EsiError> {
        self.get_json(&format!("/characters/{character_id}")).await
    }

    pub async fn get_corporation(
        &self,
        corporation_id: CorporationId,
    ) -> Result<Lookup<CorporationResponse>, EsiError> {
        self.get_json(&format!("/corporations/{corporation_id}")).await
    }
}

#[async_trait]
impl AffiliationSource for EsiClient {
    #[instrument(skip(self))]
    async fn fetch_affiliation(
        &self,
        character_id: CharacterId,
    ) -> UpstreamResult<Lookup<CharacterAffiliation>> {
        let lookup = self.get_character(character_id).await?;
        Ok(lookup.map(|character| {
            CharacterAffiliation::new(Affiliation::new(
                CorporationId::new(character.corporation_id),
                character.alliance_id.map(AllianceId::new),
            ))
            .with_name(character.name)
        }))
    }
}

#[async_trait]
impl EntityFactsSource for EsiClient {
    #[instrument(skip(self))]
    async fn fetch_character(
        &self,
        character_id: CharacterId,
    ) -> UpstreamResult<Lookup<EntityMetadata>> {
        let lookup = self.get_character(character_id).await?;
        Ok(lookup.map(|character| EntityMetadata::character(character.name)))
    }

    #[instrument(skip(self))]
    async fn fetch_corporation(
        &self,
        corporation_id: CorporationId,
    ) -> UpstreamResult<Lookup<EntityMetadata>> {
        let lookup = self.get_corporation(corporation_id).await?;
        Ok(lookup.map(|corp| EntityMetadata::corporation(corp.name, corp.ticker)))
    }
}
