//! Route definitions
//!
//! Audit endpoints are mounted under /api/v1; health probes sit at the root.

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{audits, health};
use crate::state::AppState;

/// Create the main API router (health routes are added separately)
pub fn create_router() -> Router<AppState> {
    Router::new().nest("/api/v1", api_v1_routes())
}

/// Health check routes (exported separately so audit timeouts do not apply)
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
}

/// API v1 routes
fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/audits", post(audits::audit_all))
        .route("/guilds/:guild_id/audit", post(audits::audit_guild))
        .route("/users/:user_id/audit", post(audits::audit_user))
}
