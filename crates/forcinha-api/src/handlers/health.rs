//! Health check handlers
//!
//! Endpoints for liveness and readiness probes.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::state::AppState;

/// Liveness response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Readiness response
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub checks: HealthChecks,
    pub guilds: usize,
}

/// Status of each backing store; `skipped` when the store is not wired in
#[derive(Debug, Clone, Serialize)]
pub struct HealthChecks {
    pub database: String,
    pub redis: String,
}

fn check_label(check: Option<bool>) -> &'static str {
    match check {
        Some(true) => "healthy",
        Some(false) => "unhealthy",
        None => "skipped",
    }
}

impl ReadinessResponse {
    pub fn ready(database: Option<bool>, redis: Option<bool>, guilds: usize) -> Self {
        let all_healthy = database != Some(false) && redis != Some(false);
        Self {
            status: if all_healthy { "ready" } else { "not_ready" }.to_string(),
            timestamp: Utc::now(),
            checks: HealthChecks {
                database: check_label(database).to_string(),
                redis: check_label(redis).to_string(),
            },
            guilds,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == "ready"
    }
}

/// Basic health check (liveness probe)
///
/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Readiness check with dependency health
///
/// GET /health/ready
pub async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<ReadinessResponse>) {
    let database = match state.database() {
        Some(pool) => Some(
            forcinha_db::ping(pool)
                .await
                .inspect_err(|e| warn!(error = %e, "PostgreSQL readiness probe failed"))
                .is_ok(),
        ),
        None => None,
    };

    let redis = match state.redis() {
        Some(pool) => Some(
            pool.health_check()
                .await
                .inspect_err(|e| warn!(error = %e, "Redis readiness probe failed"))
                .is_ok(),
        ),
        None => None,
    };

    let response = ReadinessResponse::ready(database, redis, state.service_context().policies().len());
    let status = if response.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}
