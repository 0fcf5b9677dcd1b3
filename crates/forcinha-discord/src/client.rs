//! HTTP client for the Discord REST API (bot token auth).

use std::time::Duration;

use async_trait::async_trait;
use forcinha_common::DiscordConfig;
use forcinha_core::traits::{MemberSource, RoleSink, UpstreamResult};
use forcinha_core::{MemberRecord, Snowflake};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, RETRY_AFTER, USER_AGENT};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::error::DiscordError;
use crate::models::{MemberPayload, ModifyNickname, RateLimitPayload};

/// Page size for `GET /guilds/{guild_id}/members` (Discord's maximum)
pub const MEMBER_PAGE_LIMIT: usize = 1000;

/// Upper bound on how long we honour a 429 before giving up
const MAX_RATE_LIMIT_WAIT: Duration = Duration::from_secs(30);

const AUDIT_LOG_REASON_HEADER: &str = "x-audit-log-reason";
const AUDIT_LOG_REASON: &str = "Forcinha affiliation audit";

/// Discord REST client implementing the membership source and role sink
#[derive(Debug, Clone)]
pub struct DiscordClient {
    client: reqwest::Client,
    base_url: String,
}

impl DiscordClient {
    pub fn new(config: &DiscordConfig) -> Result<Self, DiscordError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bot {}", config.bot_token))
            .map_err(|_| DiscordError::Config("invalid bot token characters".into()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|_| DiscordError::Config("invalid user agent".into()))?,
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .default_headers(headers)
            .build()
            .map_err(|e| DiscordError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Send a request, retrying once when Discord answers 429
    async fn send<B: Serialize + Sync>(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<Response, DiscordError> {
        let url = format!("{}{endpoint}", self.base_url);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let mut request = self.client.request(method.clone(), &url).query(query);
            if method != Method::GET {
                request = request.header(AUDIT_LOG_REASON_HEADER, AUDIT_LOG_REASON);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            debug!(%method, endpoint, attempt, "Sending Discord request");
            let resp = request.send().await.map_err(|source| DiscordError::Http {
                endpoint: endpoint.to_string(),
                source,
            })?;

            if resp.status() != StatusCode::TOO_MANY_REQUESTS {
                return Ok(resp);
            }

            let retry_after = retry_after(resp).await;
            match retry_after {
                Some(wait) if attempt == 1 && wait <= MAX_RATE_LIMIT_WAIT => {
                    warn!(
                        endpoint,
                        wait_ms = wait.as_millis() as u64,
                        "Rate limited (429), waiting before retry"
                    );
                    tokio::time::sleep(wait).await;
                }
                _ => {
                    return Err(DiscordError::RateLimited {
                        endpoint: endpoint.to_string(),
                        retry_after,
                    })
                }
            }
        }
    }

    /// Turn a non-2xx response into an error
    async fn check(resp: Response, endpoint: &str) -> Result<Response, DiscordError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(DiscordError::Api {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body,
        })
    }

    /// Body read failures stay transport errors; only bad JSON is a decode error
    async fn decode<T: DeserializeOwned>(
        resp: Response,
        endpoint: &str,
    ) -> Result<T, DiscordError> {
        let body = resp.bytes().await.map_err(|source| DiscordError::Http {
            endpoint: endpoint.to_string(),
            source,
        })?;
        serde_json::from_slice(&body).map_err(|source| DiscordError::Deserialization {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    /// Fetch one page of members after `after`
    async fn member_page(
        &self,
        guild_id: Snowflake,
        after: Option<Snowflake>,
    ) -> Result<Vec<MemberPayload>, DiscordError> {
        let endpoint = format!("/guilds/{guild_id}/members");
        let mut query = vec![("limit", MEMBER_PAGE_LIMIT.to_string())];
        if let Some(after) = after {
            query.push(("after", after.to_string()));
        }

        let resp = self
            .send::<()>(Method::GET, &endpoint, &query, None)
            .await?;
        let resp = Self::check(resp, &endpoint).await?;
        Self::decode(resp, &endpoint).await
    }

    async fn mutate<B: Serialize + Sync>(
        &self,
        method: Method,
        endpoint: String,
        body: Option<&B>,
    ) -> Result<(), DiscordError> {
        let resp = self.send(method, &endpoint, &[], body).await?;
        Self::check(resp, &endpoint).await?;
        Ok(())
    }
}

/// Wait requested by a 429: JSON `retry_after` (fractional seconds), then the header
async fn retry_after(resp: Response) -> Option<Duration> {
    let header = resp
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<f64>().ok());
    let body = resp
        .json::<RateLimitPayload>()
        .await
        .ok()
        .map(|payload| payload.retry_after);

    body.or(header)
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(Duration::from_secs_f64)
}

#[async_trait]
impl MemberSource for DiscordClient {
    #[instrument(skip(self))]
    async fn list_members(&self, guild_id: Snowflake) -> UpstreamResult<Vec<MemberRecord>> {
        let mut members = Vec::new();
        let mut after = None;
        let mut bots = 0usize;

        loop {
            let page = self.member_page(guild_id, after).await?;
            let page_len = page.len();
            after = page.iter().map(|m| m.user.id).max();

            for payload in page {
                if payload.user.bot {
                    bots += 1;
                } else {
                    members.push(MemberRecord::from(payload));
                }
            }

            if page_len < MEMBER_PAGE_LIMIT || after.is_none() {
                break;
            }
        }

        info!(
            guild_id = %guild_id,
            members = members.len(),
            bots_skipped = bots,
            "Listed guild members"
        );
        Ok(members)
    }

    #[instrument(skip(self))]
    async fn get_member(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> UpstreamResult<Option<MemberRecord>> {
        let endpoint = format!("/guilds/{guild_id}/members/{user_id}");
        let resp = self
            .send::<()>(Method::GET, &endpoint, &[], None)
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = Self::check(resp, &endpoint).await?;
        let payload: MemberPayload = Self::decode(resp, &endpoint).await?;
        Ok(Some(MemberRecord::from(payload)))
    }
}

#[async_trait]
impl RoleSink for DiscordClient {
    #[instrument(skip(self))]
    async fn add_role(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
    ) -> UpstreamResult<()> {
        self.mutate::<()>(
            Method::PUT,
            format!("/guilds/{guild_id}/members/{user_id}/roles/{role_id}"),
            None,
        )
        .await
        .map_err(Into::into)
    }

    #[instrument(skip(self))]
    async fn remove_role(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
    ) -> UpstreamResult<()> {
        self.mutate::<()>(
            Method::DELETE,
            format!("/guilds/{guild_id}/members/{user_id}/roles/{role_id}"),
            None,
        )
        .await
        .map_err(Into::into)
    }

    #[instrument(skip(self))]
    async fn set_nickname(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        nickname: Option<&str>,
    ) -> UpstreamResult<()> {
        self.mutate(
            Method::PATCH,
            format!("/guilds/{guild_id}/members/{user_id}"),
            Some(&ModifyNickname { nick: nickname }),
        )
        .await
        .map_err(Into::into)
    }
}
