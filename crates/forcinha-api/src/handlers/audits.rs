//! Audit handlers
//!
//! Each request runs one reconciliation to completion and returns its report.
//! Runs are spawned so a dropped connection never cancels half-applied
//! changes, and only one run may be in flight at a time.

use std::future::Future;
use std::sync::Arc;

use axum::{extract::State, Json};
use forcinha_common::ReportLocale;
use forcinha_service::services::GuildFailure;
use forcinha_service::{
    AuditRun, ReconciliationEngine, ReconciliationReport, ServiceContext, ServiceResult,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::extractors::{GuildIdPath, SnowflakePath, UserIdPath};
use crate::response::{ApiError, ApiResult};
use crate::state::AppState;

/// A report together with its rendered lines
#[derive(Debug, Serialize)]
pub struct ReportView {
    #[serde(flatten)]
    pub report: ReconciliationReport,
    pub lines: Vec<String>,
}

impl ReportView {
    pub fn render(report: ReconciliationReport, locale: ReportLocale) -> Self {
        let lines = report.lines(locale);
        Self { report, lines }
    }
}

#[derive(Debug, Serialize)]
pub struct AuditRunView {
    pub run_id: Uuid,
    pub reports: Vec<ReportView>,
    pub failed_guilds: Vec<GuildFailure>,
}

impl AuditRunView {
    pub fn render(run: AuditRun, locale: ReportLocale) -> Self {
        Self {
            run_id: run.run_id,
            reports: run
                .reports
                .into_iter()
                .map(|r| ReportView::render(r, locale))
                .collect(),
            failed_guilds: run.failed_guilds,
        }
    }
}

/// Run `op` in its own task while holding the run guard
async fn run_exclusive<F, Fut, T>(state: &AppState, op: F) -> ApiResult<T>
where
    F: FnOnce(Arc<ServiceContext>) -> Fut,
    Fut: Future<Output = ServiceResult<T>> + Send + 'static,
    T: Send + 'static,
{
    let guard = state.try_begin_run()?;
    let run = op(state.shared_context());

    let outcome = tokio::spawn(async move {
        let _guard = guard;
        run.await
    })
    .await
    .map_err(ApiError::internal)?;

    Ok(outcome?)
}

/// Audit every configured guild
///
/// POST /api/v1/audits
pub async fn audit_all(State(state): State<AppState>) -> ApiResult<Json<AuditRunView>> {
    let run = run_exclusive(&state, |ctx| async move {
        ReconciliationEngine::new(&ctx).run_all().await
    })
    .await?;

    info!(
        run_id = %run.run_id,
        guilds = run.reports.len(),
        failed = run.failed_guilds.len(),
        "Audit finished"
    );
    Ok(Json(AuditRunView::render(run, state.service_context().locale())))
}

/// Audit one configured guild
///
/// POST /api/v1/guilds/:guild_id/audit
pub async fn audit_guild(
    State(state): State<AppState>,
    SnowflakePath(path): SnowflakePath<GuildIdPath>,
) -> ApiResult<Json<ReportView>> {
    let guild_id = path.guild_id()?;

    let report = run_exclusive(&state, move |ctx| async move {
        ReconciliationEngine::new(&ctx).run_guild(guild_id).await
    })
    .await?;

    info!(run_id = %report.run_id, guild_id = %guild_id, actions = report.action_count(), "Guild audit finished");
    Ok(Json(ReportView::render(report, state.service_context().locale())))
}

/// Audit one user in every configured guild they are a member of
///
/// POST /api/v1/users/:user_id/audit
pub async fn audit_user(
    State(state): State<AppState>,
    SnowflakePath(path): SnowflakePath<UserIdPath>,
) -> ApiResult<Json<AuditRunView>> {
    let user_id = path.user_id()?;

    let run = run_exclusive(&state, move |ctx| async move {
        ReconciliationEngine::new(&ctx).audit_user(user_id).await
    })
    .await?;

    info!(run_id = %run.run_id, user_id = %user_id, guilds = run.reports.len(), "User audit finished");
    Ok(Json(AuditRunView::render(run, state.service_context().locale())))
}
