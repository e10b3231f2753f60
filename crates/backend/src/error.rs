//! Error types for calls to the study backend.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors emitted by backend adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BackendError {
    /// HTTP 429: the user's daily allowance is used up.
    #[error("daily limit reached{}", .detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default())]
    RateLimited { detail: Option<String> },

    #[error("request failed with status {status}{}", .detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default())]
    Status {
        status: StatusCode,
        detail: Option<String>,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("could not obtain an auth token: {0}")]
    Token(String),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("backend unavailable")]
    Unavailable,
}

impl BackendError {
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, BackendError::RateLimited { .. })
    }

    /// Server-provided `detail`, when there was one.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            BackendError::RateLimited { detail } | BackendError::Status { detail, .. } => {
                detail.as_deref()
            }
            _ => None,
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(value: serde_json::Error) -> Self {
        BackendError::Decode(value.to_string())
    }
}

/// Errors emitted while reading backend configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid API base URL: {0}")]
    InvalidApiUrl(String),

    #[error("invalid WebSocket base URL: {0}")]
    InvalidWsUrl(String),

    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_include_server_detail() {
        let err = BackendError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: Some("Failed to generate quiz".into()),
        };
        assert_eq!(
            err.to_string(),
            "request failed with status 500 Internal Server Error: Failed to generate quiz"
        );
        assert!(!err.is_rate_limited());

        let limited = BackendError::RateLimited { detail: None };
        assert_eq!(limited.to_string(), "daily limit reached");
        assert!(limited.is_rate_limited());
    }
}
