//! Test helpers for integration tests
//!
//! Provides the mocked upstream world, an in-memory link store, and a test
//! server that serves the real router over TCP.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use forcinha_api::{create_app, create_app_state, AppState};
use forcinha_cache::InMemoryMetadataStore;
use forcinha_common::{AppConfig, DiscordConfig, EsiConfig, ReportLocale};
use forcinha_core::traits::{LinkStore, RepoResult};
use forcinha_core::{CharacterId, CharacterLink, Snowflake};
use forcinha_discord::DiscordClient;
use forcinha_esi::EsiClient;
use forcinha_service::ServiceContext;
use parking_lot::Mutex;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::fixtures::{policies, GUILD};

/// Link store kept in memory
#[derive(Debug, Default)]
pub struct MemoryLinks {
    links: Mutex<BTreeMap<Snowflake, CharacterLink>>,
}

impl MemoryLinks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn link(&self, user_id: i64, character_id: i64) {
        let user = Snowflake::new(user_id);
        self.links
            .lock()
            .insert(user, CharacterLink::new(user, Some(CharacterId::new(character_id))));
    }

    /// A registration that never got a character attached
    pub fn register_without_character(&self, user_id: i64) {
        let user = Snowflake::new(user_id);
        self.links.lock().insert(user, CharacterLink::new(user, None));
    }
}

#[async_trait]
impl LinkStore for MemoryLinks {
    async fn get_all_links(&self) -> RepoResult<Vec<CharacterLink>> {
        Ok(self.links.lock().values().cloned().collect())
    }

    async fn get_link(&self, discord_user_id: Snowflake) -> RepoResult<Option<CharacterLink>> {
        Ok(self.links.lock().get(&discord_user_id).cloned())
    }

    async fn upsert_link(
        &self,
        discord_user_id: Snowflake,
        character_id: Option<CharacterId>,
    ) -> RepoResult<CharacterLink> {
        let link = CharacterLink::new(discord_user_id, character_id);
        self.links.lock().insert(discord_user_id, link.clone());
        Ok(link)
    }
}

/// Mocked Discord and ESI plus the in-memory stores behind one app
pub struct TestWorld {
    pub discord: MockServer,
    pub esi: MockServer,
    pub links: Arc<MemoryLinks>,
    pub metadata: Arc<InMemoryMetadataStore>,
}

impl TestWorld {
    pub async fn start() -> Self {
        Self {
            discord: MockServer::start().await,
            esi: MockServer::start().await,
            links: Arc::new(MemoryLinks::new()),
            metadata: Arc::new(InMemoryMetadataStore::new()),
        }
    }

    pub fn discord_config(&self) -> DiscordConfig {
        DiscordConfig {
            bot_token: "test-token".to_string(),
            api_base_url: self.discord.uri(),
            user_agent: "DiscordBot (forcinha-tests, 0.0.0)".to_string(),
        }
    }

    /// Fast retries so failure paths finish quickly
    pub fn esi_config(&self) -> EsiConfig {
        EsiConfig {
            base_url: self.esi.uri(),
            timeout_secs: 2,
            backoff_ms: 1,
            ..EsiConfig::default()
        }
    }

    /// Service context wired to the mocks, with ESI reached through `esi`
    pub fn context(&self, esi: EsiConfig) -> Result<ServiceContext> {
        let discord = DiscordClient::new(&self.discord_config())?;
        let client = EsiClient::new(&esi)?;

        ServiceContext::builder()
            .discord(Arc::new(discord))
            .esi(Arc::new(client))
            .link_store(self.links.clone())
            .metadata_store(self.metadata.clone())
            .policies(policies())
            .esi_config(esi)
            .locale(ReportLocale::Pt)
            .build()
            .map_err(|e| anyhow::anyhow!("{e}"))
    }

    pub fn app_state(&self) -> Result<AppState> {
        Ok(AppState::new(self.context(self.esi_config())?))
    }

    /// Requests ESI received for one path so far
    pub async fn esi_requests(&self, endpoint: &str) -> usize {
        self.esi
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == endpoint)
            .count()
    }

    pub async fn serve(&self) -> Result<TestServer> {
        TestServer::start(self.app_state()?).await
    }

    // === Discord ===

    pub async fn mount_members(&self, members: Vec<Value>) {
        Mock::given(method("GET"))
            .and(path(format!("/guilds/{GUILD}/members")))
            .respond_with(ResponseTemplate::new(200).set_body_json(members))
            .mount(&self.discord)
            .await;
    }

    pub async fn mount_members_status(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path(format!("/guilds/{GUILD}/members")))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "message": "Missing Access",
                "code": 50001
            })))
            .mount(&self.discord)
            .await;
    }

    pub async fn mount_member(&self, user_id: i64, member: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/guilds/{GUILD}/members/{user_id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(member))
            .mount(&self.discord)
            .await;
    }

    pub async fn expect_role_added(&self, user_id: i64, role_id: Snowflake, times: u64) {
        Mock::given(method("PUT"))
            .and(path(format!("/guilds/{GUILD}/members/{user_id}/roles/{role_id}")))
            .respond_with(ResponseTemplate::new(204))
            .expect(times)
            .mount(&self.discord)
            .await;
    }

    pub async fn expect_role_removed(&self, user_id: i64, role_id: Snowflake, times: u64) {
        Mock::given(method("DELETE"))
            .and(path(format!("/guilds/{GUILD}/members/{user_id}/roles/{role_id}")))
            .respond_with(ResponseTemplate::new(204))
            .expect(times)
            .mount(&self.discord)
            .await;
    }

    pub async fn expect_nickname(&self, user_id: i64, nick: Option<&str>, times: u64) {
        Mock::given(method("PATCH"))
            .and(path(format!("/guilds/{GUILD}/members/{user_id}")))
            .and(body_json(json!({ "nick": nick })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(times)
            .mount(&self.discord)
            .await;
    }

    /// No mutation of any kind may reach Discord
    pub async fn expect_no_mutations(&self) {
        for verb in ["PUT", "DELETE", "PATCH"] {
            Mock::given(method(verb))
                .respond_with(ResponseTemplate::new(204))
                .expect(0)
                .mount(&self.discord)
                .await;
        }
    }

    // === ESI ===

    pub async fn mount_character(&self, character_id: i64, body: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/characters/{character_id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.esi)
            .await;
    }

    pub async fn mount_character_status(&self, character_id: i64, status: u16) {
        Mock::given(method("GET"))
            .and(path(format!("/characters/{character_id}")))
            .respond_with(
                ResponseTemplate::new(status).set_body_json(json!({ "error": "Character not found" })),
            )
            .mount(&self.esi)
            .await;
    }

    pub async fn mount_corporation(&self, corporation_id: i64, body: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/corporations/{corporation_id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.esi)
            .await;
    }
}

/// ESI stand-in that answers `200` headers and part of a body, then stalls
pub struct StalledEsi {
    addr: SocketAddr,
    connections: Arc<AtomicUsize>,
    _handle: JoinHandle<()>,
}

impl StalledEsi {
    const RESPONSE: &'static [u8] = b"HTTP/1.1 200 OK\r\n\
        content-type: application/json\r\n\
        content-length: 96\r\n\r\n\
        {\"name\": \"Stalled";

    pub async fn start() -> Result<Self> {
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;
        let connections = Arc::new(AtomicUsize::new(0));

        let counter = connections.clone();
        let handle = tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let _ = socket.read(&mut buf).await;
                    let _ = socket.write_all(Self::RESPONSE).await;
                    tokio::time::sleep(Duration::from_secs(30)).await;
                });
            }
        });

        Ok(Self {
            addr,
            connections,
            _handle: handle,
        })
    }

    pub fn uri(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Connections accepted; a stalled connection is never reused
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Serve the router for `state` on an ephemeral port
    pub async fn start(state: AppState) -> Result<Self> {
        let app = create_app(state);

        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            addr,
            client,
            _handle: handle,
        })
    }

    /// Start against real PostgreSQL and Redis from the environment
    pub async fn start_with_config(config: AppConfig) -> Result<Self> {
        let state = create_app_state(&config).await?;
        Self::start(state).await
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    /// Make a POST request without a body
    pub async fn post(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.post(&url).send().await?)
    }
}

/// Load configuration for the real-stack tests
pub fn test_config() -> Result<AppConfig> {
    dotenvy::dotenv().ok();

    let mut config = AppConfig::from_env().map_err(|e| anyhow::anyhow!("Config error: {}", e))?;
    config.audit.policies_path = crate::fixtures::policies_path();

    Ok(config)
}

/// Helper to check if the real-stack environment is available
pub async fn check_test_env() -> bool {
    for var in ["DATABASE_URL", "REDIS_URL", "DISCORD_BOT_TOKEN", "API_PORT"] {
        if std::env::var(var).is_err() {
            eprintln!("Skipping test: {var} not set");
            return false;
        }
    }

    true
}

/// Assert response status and parse JSON body
pub async fn assert_json<T: DeserializeOwned>(response: Response, expected_status: StatusCode) -> Result<T> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(response.json().await?)
}

/// Assert response status without parsing body
pub async fn assert_status(response: Response, expected_status: StatusCode) -> Result<()> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(())
}
