//! ESI client error types.

use std::time::Duration;

use forcinha_core::UpstreamError;

/// Errors from ESI calls.
#[derive(Debug, thiserror::Error)]
pub enum EsiError {
    /// Transport failure (connect, TLS, timeout, body read).
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },

    /// ESI asked us to slow down (429, or 420 error-limited).
    #[error("ESI rate limited {endpoint}")]
    RateLimited {
        endpoint: String,
        retry_after: Option<Duration>,
    },

    /// ESI returned a non-2xx status other than 404.
    #[error("ESI {endpoint} returned {status}: {body}")]
    Api {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// Response body did not match the expected shape.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: serde_json::Error,
    },

    /// Client could not be built from configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<EsiError> for UpstreamError {
    fn from(err: EsiError) -> Self {
        match err {
            EsiError::Http { source, .. } if source.is_timeout() => Self::Timeout,
            EsiError::Http { source, .. } => Self::Transport(source.to_string()),
            EsiError::RateLimited { retry_after, .. } => Self::RateLimited { retry_after },
            EsiError::Api { status, body, .. } => Self::status(status, body),
            EsiError::Deserialization { source, .. } => Self::Decode(source.to_string()),
            EsiError::Config(msg) => Self::Transport(msg),
        }
    }
}
