//! Core configuration types
//!
//! `Config` bundles everything one document pipeline needs: how HTML is
//! converted, how blocks are committed, and how the host is reached.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::converter::ConversionOptions;
use crate::utils::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_MEDIA_CONCURRENCY, DEFAULT_RETRY_INITIAL_DELAY_MS,
    DEFAULT_RETRY_MAX_DELAY_MS, MAX_CHILDREN_PER_CALL,
};

/// Top-level configuration for a document pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub conversion: ConversionOptions,
    pub commit: CommitConfig,
}

/// Settings for chunked writes and relocation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitConfig {
    /// Blocks per create/append call, clamped to the host limit
    pub max_batch: usize,
    pub retry: RetryConfig,
    /// Re-scan the committed tree for leftover marker tokens
    pub final_sweep: bool,
    /// Concurrent image uploads per document
    pub media_concurrency: usize,
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            max_batch: MAX_CHILDREN_PER_CALL,
            retry: RetryConfig::default(),
            final_sweep: true,
            media_concurrency: DEFAULT_MEDIA_CONCURRENCY,
        }
    }
}

impl CommitConfig {
    /// Batch size actually used: at least 1, at most the host limit
    #[must_use]
    pub fn effective_batch(&self) -> usize {
        self.max_batch.clamp(1, MAX_CHILDREN_PER_CALL)
    }
}

/// Retry configuration for host writes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per call, first try included
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    /// Backoff multiplier for exponential backoff
    pub backoff_multiplier: f64,
    pub max_delay_ms: u64,
    /// Add up to 25% random jitter to each delay
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay_ms: DEFAULT_RETRY_INITIAL_DELAY_MS,
            backoff_multiplier: 2.0,
            max_delay_ms: DEFAULT_RETRY_MAX_DELAY_MS,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Retries with no waiting, for tests and local fakes
    #[must_use]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay_ms: 0,
            backoff_multiplier: 1.0,
            max_delay_ms: 0,
            jitter: false,
        }
    }

    /// Calculate delay before retry number `attempt` (1-based), capped at `max_delay_ms`
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16) as i32;
        let multiplier = self.backoff_multiplier.max(1.0).powi(exponent);
        let delay_ms = (self.initial_delay_ms as f64 * multiplier) as u64;
        Duration::from_millis(delay_ms.min(self.max_delay_ms))
    }
}

/// Connection settings for the content host
///
/// Built through [`HostConfig::builder`] so a token is always present.
#[derive(Clone, Serialize, Deserialize)]
pub struct HostConfig {
    pub(crate) api_base: String,
    pub(crate) token: String,
    pub(crate) notion_version: String,
    pub(crate) timeout_secs: u64,
}

impl std::fmt::Debug for HostConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostConfig")
            .field("api_base", &self.api_base)
            .field("token", &"<redacted>")
            .field("notion_version", &self.notion_version)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),

    #[error("Invalid API base URL '{url}': {reason}")]
    InvalidApiBase { url: String, reason: String },

    #[error("Invalid setting {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_caps() {
        let retry = RetryConfig {
            max_attempts: 5,
            initial_delay_ms: 100,
            backoff_multiplier: 2.0,
            max_delay_ms: 300,
            jitter: false,
        };

        assert_eq!(retry.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(retry.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(retry.delay_for_attempt(3), Duration::from_millis(300));
        assert_eq!(retry.delay_for_attempt(9), Duration::from_millis(300));
    }

    #[test]
    fn batch_size_is_clamped_to_host_limit() {
        let commit = CommitConfig { max_batch: 500, ..CommitConfig::default() };
        assert_eq!(commit.effective_batch(), 100);
        let commit = CommitConfig { max_batch: 0, ..CommitConfig::default() };
        assert_eq!(commit.effective_batch(), 1);
    }

    #[test]
    fn partial_config_deserializes_with_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "commit": { "max_batch": 50, "final_sweep": false } }"#)
                .unwrap();
        assert_eq!(config.commit.max_batch, 50);
        assert!(!config.commit.final_sweep);
        assert_eq!(config.commit.retry.max_attempts, DEFAULT_MAX_ATTEMPTS);
    }
}
