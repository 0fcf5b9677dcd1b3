//! # forcinha-service
//!
//! Application layer: the reconciliation engine and the machinery it runs on.

pub mod services;

pub use services::{
    AuditRun, EntityMetadataCache, ReconciliationEngine, ReconciliationReport, ServiceContext,
    ServiceContextBuilder, ServiceError, ServiceResult,
};
