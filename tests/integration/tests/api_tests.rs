//! API Integration Tests
//!
//! The app runs over TCP against wiremock Discord and ESI servers. The
//! real-stack tests at the bottom additionally need PostgreSQL, Redis and a
//! bot token in the environment and are skipped otherwise.
//!
//! Run with: cargo test -p forcinha-integration-tests --test api_tests

use std::time::Duration;

use forcinha_common::EsiConfig;
use forcinha_core::traits::MetadataStore;
use forcinha_core::{CharacterId, EntityId, UpstreamError};
use forcinha_integration_tests::{
    assert_json, assert_status, check_test_env, discord_bot, discord_member, esi_character,
    esi_corporation, test_config, ErrorBody, StalledEsi, TestServer, TestWorld, ALIADO,
    ALLIED_ALLIANCE, ALLIED_CORP, FORCA_CORP, GUILD, MEMBRO,
};
use reqwest::StatusCode;
use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

const PILOT_ONE: i64 = 2112000001;
const ALLY_PILOT: i64 = 2112000002;
const DELETED_PILOT: i64 = 2112000404;

async fn mount_universe(world: &TestWorld) {
    world
        .mount_character(PILOT_ONE, esi_character("Pilot One", FORCA_CORP, None))
        .await;
    world
        .mount_character(
            ALLY_PILOT,
            esi_character("Ally Pilot", ALLIED_CORP, Some(ALLIED_ALLIANCE)),
        )
        .await;
    world
        .mount_corporation(FORCA_CORP, esi_corporation("Forca Armada", "FORCA"))
        .await;
    world
        .mount_corporation(ALLIED_CORP, esi_corporation("Allied Industries", "ALLY"))
        .await;
}

fn lines(report: &Value) -> Vec<&str> {
    report["lines"]
        .as_array()
        .expect("lines")
        .iter()
        .filter_map(Value::as_str)
        .collect()
}

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let world = TestWorld::start().await;
    let server = world.serve().await.unwrap();

    let response = server.get("/health").await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
    let body: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_readiness_skips_unwired_stores() {
    let world = TestWorld::start().await;
    let server = world.serve().await.unwrap();

    let response = server.get("/health/ready").await.unwrap();
    let body: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"]["database"], "skipped");
    assert_eq!(body["checks"]["redis"], "skipped");
    assert_eq!(body["guilds"], 1);
}

// ============================================================================
// Guild Audit Tests
// ============================================================================

#[tokio::test]
async fn test_guild_audit_reconciles_every_member() {
    let world = TestWorld::start().await;
    mount_universe(&world).await;

    world.links.link(100, PILOT_ONE);
    world.links.link(200, ALLY_PILOT);

    let unmanaged = forcinha_core::Snowflake::new(555);
    world
        .mount_members(vec![
            discord_member(100, "pilot_one", None, &[]),
            discord_member(200, "ally_pilot", Some("old"), &[MEMBRO, unmanaged]),
            discord_member(300, "drifter", Some("drifter_nick"), &[ALIADO]),
            discord_bot(999, "forcinha"),
        ])
        .await;

    world.expect_role_added(100, MEMBRO, 1).await;
    world.expect_nickname(100, Some("Pilot One"), 1).await;

    world.expect_role_added(200, ALIADO, 1).await;
    world.expect_role_removed(200, MEMBRO, 1).await;
    world.expect_role_removed(200, unmanaged, 0).await;
    world.expect_nickname(200, Some("[ALLY] Ally Pilot"), 1).await;

    world.expect_role_removed(300, ALIADO, 1).await;
    world.expect_nickname(300, None, 1).await;

    let server = world.serve().await.unwrap();
    let response = server
        .post(&format!("/api/v1/guilds/{GUILD}/audit"))
        .await
        .unwrap();
    let report: Value = assert_json(response, StatusCode::OK).await.unwrap();

    assert_eq!(report["guild_id"], GUILD.to_string());
    assert_eq!(report["guild_name"], "FORCAS ARMADAS");
    assert_eq!(report["members_audited"], 3);
    assert_eq!(report["roles_added"], 2);
    assert_eq!(report["roles_removed"], 2);
    assert_eq!(report["nicknames_changed"], 3);
    assert_eq!(report["failures"], 0);
    assert_eq!(report["unregistered"][0]["user_id"], "300");

    let lines = lines(&report);
    assert_eq!(
        lines[0],
        "Auditoria de 'FORCAS ARMADAS': 3 membros auditados, 1 sem registro, 2 roles adicionadas, 2 roles removidas, 3 apelidos alterados, 0 falhas"
    );
    assert!(lines.contains(&"✅ Role 'Membro' adicionada a 'pilot_one'"));
    assert!(lines.contains(&"✅ Apelido de 'pilot_one' alterado para 'Pilot One'"));
    assert!(lines.contains(&"✅ Role 'Membro' removida de 'old'"));
    assert!(lines.contains(&"✅ Apelido de 'old' alterado para '[ALLY] Ally Pilot'"));
    assert!(lines.contains(&"✅ Role 'Aliado' removida de 'drifter_nick'"));
    assert!(lines.contains(&"✅ Apelido de 'drifter_nick' removido"));

    // Two character names and two corporations
    assert_eq!(world.metadata.len(), 4);
}

#[tokio::test]
async fn test_converged_guild_makes_no_changes() {
    let world = TestWorld::start().await;
    mount_universe(&world).await;
    world.links.link(100, PILOT_ONE);
    world
        .mount_members(vec![discord_member(100, "pilot_one", Some("Pilot One"), &[MEMBRO])])
        .await;
    world.expect_no_mutations().await;

    let server = world.serve().await.unwrap();
    let response = server
        .post(&format!("/api/v1/guilds/{GUILD}/audit"))
        .await
        .unwrap();
    let report: Value = assert_json(response, StatusCode::OK).await.unwrap();

    assert_eq!(report["results"].as_array().unwrap().len(), 0);
    assert_eq!(lines(&report).len(), 1);
}

#[tokio::test]
async fn test_deleted_character_is_stripped_and_tombstoned() {
    let world = TestWorld::start().await;
    world.mount_character_status(DELETED_PILOT, 404).await;
    world.links.link(400, DELETED_PILOT);
    world
        .mount_members(vec![discord_member(400, "ghost", Some("[FORCA] Ghost"), &[MEMBRO])])
        .await;
    world.expect_role_removed(400, MEMBRO, 1).await;
    world.expect_nickname(400, None, 1).await;

    let server = world.serve().await.unwrap();
    let response = server
        .post(&format!("/api/v1/guilds/{GUILD}/audit"))
        .await
        .unwrap();
    let report: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(report["roles_removed"], 1);
    assert_eq!(report["nicknames_changed"], 1);

    let stored = world
        .metadata
        .get(EntityId::new(DELETED_PILOT))
        .await
        .unwrap()
        .expect("tombstone stored");
    assert!(stored.is_tombstone());
}

#[tokio::test]
async fn test_tombstoned_character_is_not_fetched_again() {
    let world = TestWorld::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/characters/{DELETED_PILOT}")))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": "Character not found"
        })))
        .expect(1)
        .mount(&world.esi)
        .await;
    world.links.link(400, DELETED_PILOT);
    world
        .mount_members(vec![discord_member(400, "ghost", None, &[])])
        .await;
    world.expect_no_mutations().await;

    let server = world.serve().await.unwrap();
    for _ in 0..2 {
        let response = server
            .post(&format!("/api/v1/guilds/{GUILD}/audit"))
            .await
            .unwrap();
        assert_status(response, StatusCode::OK).await.unwrap();
    }

    let endpoint = format!("/characters/{DELETED_PILOT}");
    assert_eq!(world.esi_requests(&endpoint).await, 1);
}

#[tokio::test]
async fn test_first_run_reads_each_character_once() {
    let world = TestWorld::start().await;
    world
        .mount_character(PILOT_ONE, esi_character("Pilot One", FORCA_CORP, None))
        .await;
    world
        .mount_corporation(FORCA_CORP, esi_corporation("Forca Armada", "FORCA"))
        .await;
    world.links.link(100, PILOT_ONE);
    world
        .mount_members(vec![discord_member(100, "pilot_one", None, &[])])
        .await;
    world.expect_role_added(100, MEMBRO, 1).await;
    world.expect_nickname(100, Some("Pilot One"), 1).await;

    let server = world.serve().await.unwrap();
    let response = server
        .post(&format!("/api/v1/guilds/{GUILD}/audit"))
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();

    let endpoint = format!("/characters/{PILOT_ONE}");
    assert_eq!(world.esi_requests(&endpoint).await, 1);
    let stored = world
        .metadata
        .get(EntityId::new(PILOT_ONE))
        .await
        .unwrap()
        .expect("name cached");
    assert_eq!(stored.name(), "Pilot One");
}

#[tokio::test]
async fn test_stalled_esi_body_is_retried() {
    let world = TestWorld::start().await;
    let esi = StalledEsi::start().await.unwrap();
    let ctx = world
        .context(EsiConfig {
            base_url: esi.uri(),
            timeout_secs: 1,
            backoff_ms: 1,
            ..EsiConfig::default()
        })
        .unwrap();

    let id = CharacterId::new(PILOT_ONE);
    let batch = ctx.fetcher().fetch_affiliations(&[id]).await;

    assert!(batch.found.is_empty());
    assert_eq!(batch.failed.get(&id), Some(&UpstreamError::Timeout));
    assert!(batch.is_total_transient_failure());
    assert_eq!(esi.connections(), 3);
}

#[tokio::test]
async fn test_failed_mutation_is_reported_and_run_continues() {
    let world = TestWorld::start().await;
    mount_universe(&world).await;
    world.links.link(100, PILOT_ONE);
    world
        .mount_members(vec![discord_member(100, "pilot_one", None, &[])])
        .await;

    Mock::given(method("PUT"))
        .and(path(format!("/guilds/{GUILD}/members/100/roles/{MEMBRO}")))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "message": "Missing Permissions",
            "code": 50013
        })))
        .expect(1)
        .mount(&world.discord)
        .await;
    world.expect_nickname(100, Some("Pilot One"), 1).await;

    let server = world.serve().await.unwrap();
    let response = server
        .post(&format!("/api/v1/guilds/{GUILD}/audit"))
        .await
        .unwrap();
    let report: Value = assert_json(response, StatusCode::OK).await.unwrap();

    assert_eq!(report["failures"], 1);
    assert_eq!(report["nicknames_changed"], 1);
    assert!(lines(&report)
        .iter()
        .any(|l| l.starts_with("❌ Falha ao adicionar role 'Membro' a 'pilot_one'")));
}

#[tokio::test]
async fn test_forbidden_member_listing_aborts_guild() {
    let world = TestWorld::start().await;
    world.mount_members_status(403).await;
    world.expect_no_mutations().await;

    let server = world.serve().await.unwrap();
    let response = server
        .post(&format!("/api/v1/guilds/{GUILD}/audit"))
        .await
        .unwrap();
    let body: ErrorBody = assert_json(response, StatusCode::BAD_GATEWAY).await.unwrap();

    assert_eq!(body.error.code, "FATAL_FETCH");
    assert_eq!(
        body.error.details.unwrap()["stage"],
        "guild membership"
    );
}

#[tokio::test]
async fn test_esi_outage_aborts_guild() {
    let world = TestWorld::start().await;
    world.mount_character_status(PILOT_ONE, 503).await;
    world.links.link(100, PILOT_ONE);
    world
        .mount_members(vec![discord_member(100, "pilot_one", Some("Pilot One"), &[MEMBRO])])
        .await;
    world.expect_no_mutations().await;

    let server = world.serve().await.unwrap();
    let response = server
        .post(&format!("/api/v1/guilds/{GUILD}/audit"))
        .await
        .unwrap();
    let body: ErrorBody = assert_json(response, StatusCode::BAD_GATEWAY).await.unwrap();

    assert_eq!(body.error.code, "FATAL_FETCH");
    assert!(body.error.message.contains("character affiliations"));
}

#[tokio::test]
async fn test_unknown_guild_is_not_found() {
    let world = TestWorld::start().await;
    let server = world.serve().await.unwrap();

    let response = server.post("/api/v1/guilds/42/audit").await.unwrap();
    let body: ErrorBody = assert_json(response, StatusCode::NOT_FOUND).await.unwrap();
    assert_eq!(body.error.code, "UNKNOWN_GUILD");
}

#[tokio::test]
async fn test_malformed_guild_id_is_rejected() {
    let world = TestWorld::start().await;
    let server = world.serve().await.unwrap();

    let response = server.post("/api/v1/guilds/not-a-number/audit").await.unwrap();
    let body: ErrorBody = assert_json(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert_eq!(body.error.code, "INVALID_PATH_PARAMETER");
}

// ============================================================================
// Full Run Tests
// ============================================================================

#[tokio::test]
async fn test_full_run_collects_failed_guilds() {
    let world = TestWorld::start().await;
    world.mount_members_status(403).await;

    let server = world.serve().await.unwrap();
    let response = server.post("/api/v1/audits").await.unwrap();
    let run: Value = assert_json(response, StatusCode::OK).await.unwrap();

    assert!(run["run_id"].is_string());
    assert_eq!(run["reports"].as_array().unwrap().len(), 0);
    assert_eq!(run["failed_guilds"][0]["guild_name"], "FORCAS ARMADAS");
    assert!(run["failed_guilds"][0]["error"]
        .as_str()
        .unwrap()
        .contains("guild membership"));
}

#[tokio::test]
async fn test_full_run_returns_rendered_reports() {
    let world = TestWorld::start().await;
    mount_universe(&world).await;
    world.links.link(100, PILOT_ONE);
    world
        .mount_members(vec![discord_member(100, "pilot_one", None, &[])])
        .await;
    world.expect_role_added(100, MEMBRO, 1).await;
    world.expect_nickname(100, Some("Pilot One"), 1).await;

    let server = world.serve().await.unwrap();
    let response = server.post("/api/v1/audits").await.unwrap();
    let run: Value = assert_json(response, StatusCode::OK).await.unwrap();

    let report = &run["reports"][0];
    assert_eq!(report["run_id"], run["run_id"]);
    assert_eq!(report["roles_added"], 1);
    assert_eq!(lines(report).len(), 3);
}

#[tokio::test]
async fn test_concurrent_run_is_rejected() {
    let world = TestWorld::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/guilds/{GUILD}/members")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(Vec::<Value>::new())
                .set_delay(Duration::from_millis(800)),
        )
        .mount(&world.discord)
        .await;

    let server = world.serve().await.unwrap();
    let first = {
        let client = server.client.clone();
        let url = format!("{}/api/v1/audits", server.base_url());
        tokio::spawn(async move { client.post(url).send().await })
    };
    tokio::time::sleep(Duration::from_millis(200)).await;

    let second = server.post("/api/v1/audits").await.unwrap();
    let body: ErrorBody = assert_json(second, StatusCode::CONFLICT).await.unwrap();
    assert_eq!(body.error.code, "RUN_IN_PROGRESS");

    let first = first.await.unwrap().unwrap();
    assert_status(first, StatusCode::OK).await.unwrap();

    // Guard released once the first run finished
    let third = server.post("/api/v1/audits").await.unwrap();
    assert_status(third, StatusCode::OK).await.unwrap();
}

// ============================================================================
// User Audit Tests
// ============================================================================

#[tokio::test]
async fn test_user_audit_touches_only_that_user() {
    let world = TestWorld::start().await;
    mount_universe(&world).await;
    world.links.link(100, PILOT_ONE);
    world
        .mount_member(100, discord_member(100, "pilot_one", None, &[ALIADO]))
        .await;
    world.expect_role_added(100, MEMBRO, 1).await;
    world.expect_role_removed(100, ALIADO, 1).await;
    world.expect_nickname(100, Some("Pilot One"), 1).await;

    let server = world.serve().await.unwrap();
    let response = server.post("/api/v1/users/100/audit").await.unwrap();
    let run: Value = assert_json(response, StatusCode::OK).await.unwrap();

    let report = &run["reports"][0];
    assert_eq!(report["members_audited"], 1);
    assert_eq!(report["roles_added"], 1);
    assert_eq!(report["roles_removed"], 1);
}

#[tokio::test]
async fn test_user_outside_every_guild_yields_no_reports() {
    let world = TestWorld::start().await;
    world.expect_no_mutations().await;
    let server = world.serve().await.unwrap();

    // Unmatched wiremock requests answer 404, i.e. "Unknown Member"
    let response = server.post("/api/v1/users/12345/audit").await.unwrap();
    let run: Value = assert_json(response, StatusCode::OK).await.unwrap();

    assert_eq!(run["reports"].as_array().unwrap().len(), 0);
    assert_eq!(run["failed_guilds"].as_array().unwrap().len(), 0);
}

// ============================================================================
// Real Stack Tests
// ============================================================================

#[tokio::test]
async fn test_real_stack_readiness() {
    if !check_test_env().await {
        return;
    }

    let server = TestServer::start_with_config(test_config().unwrap())
        .await
        .expect("Failed to start server");
    let response = server.get("/health/ready").await.expect("Request failed");
    let body: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["checks"]["database"], "healthy");
    assert_eq!(body["checks"]["redis"], "healthy");
}
