//! Reconciliation services
//!
//! Batch fetching, metadata caching, action application and the engine that
//! drives a run from membership listing to report.

pub mod applier;
pub mod context;
pub mod engine;
pub mod error;
pub mod fetcher;
pub mod metadata;
pub mod pool;
pub mod report;
pub mod retry;

#[cfg(test)]
pub(crate) mod fakes;

// Re-export all services for convenience
pub use applier::ActionApplier;
pub use context::{ServiceContext, ServiceContextBuilder};
pub use engine::{AuditRun, GuildFailure, ReconciliationEngine};
pub use error::{FetchStage, ServiceError, ServiceResult};
pub use fetcher::{AffiliationFetcher, FetchBatch};
pub use metadata::EntityMetadataCache;
pub use pool::{WorkerPool, DEFAULT_CONCURRENCY};
pub use report::{ReconciliationReport, UnregisteredMember};
pub use retry::RetryPolicy;
