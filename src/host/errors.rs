//! Error types for content host calls
//!
//! `is_transient` decides what the committer retries: throttling, server
//! errors, timeouts, dropped connections and edit conflicts. Everything else
//! (validation errors, missing blocks, bad credentials) fails fast.

use std::time::Duration;
use thiserror::Error;

use crate::config::ConfigError;

/// Result type alias for host operations
pub type HostResult<T> = Result<T, HostError>;

#[derive(Debug, Error)]
pub enum HostError {
    /// HTTP 429
    #[error("Rate limited by host (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    /// HTTP 5xx
    #[error("Host server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Any other non-success status
    #[error("Host rejected request with {status} ({code}): {message}")]
    Rejected {
        status: u16,
        code: String,
        message: String,
    },

    /// The block or page addressed does not exist
    #[error("Block not found: {0}")]
    NotFound(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    /// Response body could not be understood
    #[error("Invalid host response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<reqwest::Error> for HostError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            HostError::Timeout
        } else if error.is_decode() {
            HostError::InvalidResponse(error.to_string())
        } else {
            HostError::Network(error.to_string())
        }
    }
}

impl From<serde_json::Error> for HostError {
    fn from(error: serde_json::Error) -> Self {
        HostError::InvalidResponse(error.to_string())
    }
}

impl HostError {
    /// Check if error is transient and the call should be retried
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            HostError::RateLimited { .. }
            | HostError::Server { .. }
            | HostError::Timeout
            | HostError::Network(_) => true,
            HostError::Rejected { status, .. } => *status == 409,
            HostError::NotFound(_) | HostError::InvalidResponse(_) | HostError::Config(_) => false,
        }
    }

    /// Delay requested by the host, when it gave one
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            HostError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(HostError::RateLimited { retry_after: None }.is_transient());
        assert!(HostError::Server { status: 502, message: String::new() }.is_transient());
        assert!(HostError::Timeout.is_transient());
        assert!(
            HostError::Rejected { status: 409, code: "conflict_error".into(), message: String::new() }
                .is_transient()
        );
        assert!(
            !HostError::Rejected { status: 400, code: "validation_error".into(), message: String::new() }
                .is_transient()
        );
        assert!(!HostError::NotFound("x".into()).is_transient());
    }
}
