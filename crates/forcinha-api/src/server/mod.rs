//! Server setup and initialization
//!
//! Provides the application builder, dependency wiring and the server runner.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use forcinha_cache::{RedisMetadataStore, RedisPool};
use forcinha_common::{load_guild_policies, AppConfig, AppError};
use forcinha_db::{create_pool, migrate, PgLinkRepository, PoolConfig};
use forcinha_discord::DiscordClient;
use forcinha_esi::EsiClient;
use forcinha_service::ServiceContext;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use crate::middleware::{apply_middleware, AUDIT_TIMEOUT, DEFAULT_TIMEOUT};
use crate::routes::{create_router, health_routes};
use crate::state::AppState;

/// Build the complete Axum application with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    apply_middleware(create_router(), AUDIT_TIMEOUT)
        .merge(apply_middleware(health_routes(), DEFAULT_TIMEOUT))
        .with_state(state)
}

/// Initialize all dependencies and create AppState
pub async fn create_app_state(config: &AppConfig) -> Result<AppState, AppError> {
    let policies = load_guild_policies(&config.audit.policies_path)?;
    info!(
        guilds = policies.len(),
        path = %config.audit.policies_path.display(),
        "Guild policies loaded"
    );

    info!("Connecting to PostgreSQL...");
    let pool = create_pool(&PoolConfig::from(&config.database))
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    migrate(&pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    info!("PostgreSQL connection established");

    info!("Connecting to Redis...");
    let redis_pool =
        RedisPool::from_config(&config.redis).map_err(|e| AppError::Cache(e.to_string()))?;
    info!("Redis pool ready");

    let discord =
        DiscordClient::new(&config.discord).map_err(|e| AppError::Config(e.to_string()))?;
    let esi = EsiClient::new(&config.esi).map_err(|e| AppError::Config(e.to_string()))?;

    let service_context = ServiceContext::builder()
        .discord(Arc::new(discord))
        .esi(Arc::new(esi))
        .link_store(Arc::new(PgLinkRepository::new(pool.clone())))
        .metadata_store(Arc::new(RedisMetadataStore::new(redis_pool.clone())))
        .policies(policies)
        .esi_config(config.esi.clone())
        .locale(config.audit.locale)
        .build()
        .map_err(|e| AppError::Config(e.to_string()))?;

    Ok(AppState::new(service_context)
        .with_database(pool)
        .with_redis(redis_pool))
}

/// Run the HTTP server until Ctrl+C or SIGTERM
pub async fn run_server(app: Router, addr: SocketAddr) -> Result<(), AppError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Config(format!("Server error: {e}")))?;

    info!("Server stopped");
    Ok(())
}

/// Run the complete server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr: SocketAddr = config
        .api
        .address()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid listen address: {e}")))?;

    let state = create_app_state(&config).await?;
    let app = create_app(state);

    run_server(app, addr).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
