//! Service layer error types
//!
//! Only run-level failures surface here. Per-id fetch failures and per-action
//! failures are recorded in the report instead.

use forcinha_common::AppError;
use forcinha_core::DomainError;
use std::fmt;

/// Stage of a run that failed fatally
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    Members,
    Links,
    Affiliations,
}

impl fmt::Display for FetchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Members => "guild membership",
            Self::Links => "character links",
            Self::Affiliations => "character affiliations",
        })
    }
}

/// Service layer error type
#[derive(Debug)]
pub enum ServiceError {
    /// A run could not gather the data it needs and was aborted
    FatalFetch { stage: FetchStage, message: String },

    /// Domain rule violation or unknown guild
    Domain(DomainError),

    /// Another run is already in progress
    Conflict(String),

    /// Missing dependency or other internal failure
    Internal(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FatalFetch { stage, message } => {
                write!(f, "Failed to fetch {stage}: {message}")
            }
            Self::Domain(e) => write!(f, "{e}"),
            Self::Conflict(msg) => write!(f, "Conflict: {msg}"),
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Domain(e) => Some(e),
            _ => None,
        }
    }
}

impl ServiceError {
    pub fn fatal(stage: FetchStage, message: impl Into<String>) -> Self {
        Self::FatalFetch {
            stage,
            message: message.into(),
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    #[inline]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::FatalFetch { .. })
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::FatalFetch { .. } => 502,
            Self::Domain(e) => {
                if e.is_not_found() {
                    404
                } else if e.is_validation() {
                    400
                } else {
                    500
                }
            }
            Self::Conflict(_) => 409,
            Self::Internal(_) => 500,
        }
    }

    /// Get the error code for API responses
    pub fn error_code(&self) -> &str {
        match self {
            Self::FatalFetch { .. } => "FATAL_FETCH",
            Self::Domain(e) => e.code(),
            Self::Conflict(_) => "RUN_IN_PROGRESS",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::FatalFetch { .. } => AppError::ExternalService(err.to_string()),
            ServiceError::Domain(e) => AppError::Domain(e),
            ServiceError::Conflict(msg) => AppError::Conflict(msg),
            ServiceError::Internal(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
