//! Discord client error types.

use std::time::Duration;

use forcinha_core::UpstreamError;

/// Errors from Discord REST calls.
#[derive(Debug, thiserror::Error)]
pub enum DiscordError {
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },

    /// Still rate limited after the one retry we allow.
    #[error("Discord rate limited {endpoint}")]
    RateLimited {
        endpoint: String,
        retry_after: Option<Duration>,
    },

    #[error("Discord {endpoint} returned {status}: {body}")]
    Api {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: serde_json::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<DiscordError> for UpstreamError {
    fn from(err: DiscordError) -> Self {
        match err {
            DiscordError::Http { source, .. } if source.is_timeout() => Self::Timeout,
            DiscordError::Http { source, .. } => Self::Transport(source.to_string()),
            DiscordError::RateLimited { retry_after, .. } => Self::RateLimited { retry_after },
            DiscordError::Api { status, body, .. } => Self::status(status, body),
            DiscordError::Deserialization { source, .. } => Self::Decode(source.to_string()),
            DiscordError::Config(msg) => Self::Transport(msg),
        }
    }
}
