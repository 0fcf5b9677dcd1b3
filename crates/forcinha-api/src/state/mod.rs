//! Application state
//!
//! Holds the service context, the single-run guard, and the storage pools
//! probed by the readiness check.

use std::sync::Arc;

use forcinha_cache::RedisPool;
use forcinha_db::PgPool;
use forcinha_service::{ServiceContext, ServiceError};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Held for the duration of an audit
pub type RunGuard = OwnedMutexGuard<()>;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    service_context: Arc<ServiceContext>,
    run_lock: Arc<Mutex<()>>,
    database: Option<PgPool>,
    redis: Option<RedisPool>,
}

impl AppState {
    pub fn new(service_context: ServiceContext) -> Self {
        Self {
            service_context: Arc::new(service_context),
            run_lock: Arc::new(Mutex::new(())),
            database: None,
            redis: None,
        }
    }

    /// Probe this pool on `/health/ready`
    pub fn with_database(mut self, pool: PgPool) -> Self {
        self.database = Some(pool);
        self
    }

    /// Probe this pool on `/health/ready`
    pub fn with_redis(mut self, pool: RedisPool) -> Self {
        self.redis = Some(pool);
        self
    }

    pub fn service_context(&self) -> &ServiceContext {
        &self.service_context
    }

    /// Shared handle for work that outlives the request
    pub fn shared_context(&self) -> Arc<ServiceContext> {
        Arc::clone(&self.service_context)
    }

    pub fn database(&self) -> Option<&PgPool> {
        self.database.as_ref()
    }

    pub fn redis(&self) -> Option<&RedisPool> {
        self.redis.as_ref()
    }

    /// Claim the right to run an audit
    ///
    /// # Errors
    /// Returns `ServiceError::Conflict` while another audit holds the guard
    pub fn try_begin_run(&self) -> Result<RunGuard, ServiceError> {
        Arc::clone(&self.run_lock)
            .try_lock_owned()
            .map_err(|_| ServiceError::conflict("An audit is already running"))
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("service_context", &self.service_context)
            .field("database", &self.database.is_some())
            .field("redis", &self.redis.is_some())
            .finish()
    }
}
