//! Type-safe builder for `HostConfig` using the typestate pattern
//!
//! The token is the one required field; `build()` only exists once it is set.

use std::marker::PhantomData;
use url::Url;

use super::types::{ConfigError, HostConfig};
use crate::utils::{DEFAULT_API_BASE, DEFAULT_NOTION_VERSION, DEFAULT_REQUEST_TIMEOUT_SECS};

// Type states for the builder
pub struct WithToken;

pub struct HostConfigBuilder<State = ()> {
    pub(crate) api_base: String,
    pub(crate) token: Option<String>,
    pub(crate) notion_version: String,
    pub(crate) timeout_secs: u64,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for HostConfigBuilder<()> {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            token: None,
            notion_version: DEFAULT_NOTION_VERSION.to_string(),
            timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            _phantom: PhantomData,
        }
    }
}

impl HostConfig {
    /// Create a builder for configuring a `HostConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> HostConfigBuilder<()> {
        HostConfigBuilder::default()
    }

    /// Read `NOTION_TOKEN`, and optionally `NOTION_API_BASE` / `NOTION_VERSION`
    pub fn from_env() -> Result<HostConfig, ConfigError> {
        let token = std::env::var("NOTION_TOKEN").map_err(|_| ConfigError::Missing("NOTION_TOKEN"))?;
        let mut builder = HostConfig::builder().token(token);
        if let Ok(base) = std::env::var("NOTION_API_BASE") {
            builder = builder.api_base(base);
        }
        if let Ok(version) = std::env::var("NOTION_VERSION") {
            builder = builder.notion_version(version);
        }
        builder.build()
    }
}

impl<State> HostConfigBuilder<State> {
    #[must_use]
    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    #[must_use]
    pub fn notion_version(mut self, version: impl Into<String>) -> Self {
        self.notion_version = version.into();
        self
    }

    #[must_use]
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl HostConfigBuilder<()> {
    pub fn token(self, token: impl Into<String>) -> HostConfigBuilder<WithToken> {
        HostConfigBuilder {
            api_base: self.api_base,
            token: Some(token.into()),
            notion_version: self.notion_version,
            timeout_secs: self.timeout_secs,
            _phantom: PhantomData,
        }
    }
}

impl HostConfigBuilder<WithToken> {
    /// Validate and build
    ///
    /// # Errors
    ///
    /// Returns an error for an empty token, a zero timeout, or an API base
    /// that is not an absolute http(s) URL.
    pub fn build(self) -> Result<HostConfig, ConfigError> {
        let token = self
            .token
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::Missing("token"))?;

        let parsed = Url::parse(&self.api_base).map_err(|e| ConfigError::InvalidApiBase {
            url: self.api_base.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidApiBase {
                url: self.api_base,
                reason: "scheme must be http or https".to_string(),
            });
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(HostConfig {
            api_base: self.api_base.trim_end_matches('/').to_string(),
            token,
            notion_version: self.notion_version,
            timeout_secs: self.timeout_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_defaults() {
        let config = HostConfig::builder().token("secret_abc").build().unwrap();
        assert_eq!(config.api_base(), DEFAULT_API_BASE);
        assert_eq!(config.notion_version(), DEFAULT_NOTION_VERSION);
        assert!(!format!("{config:?}").contains("secret_abc"));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let config = HostConfig::builder()
            .api_base("http://127.0.0.1:8080/")
            .token("t")
            .build()
            .unwrap();
        assert_eq!(config.api_base(), "http://127.0.0.1:8080");
    }

    #[test]
    fn rejects_blank_token_and_bad_base() {
        assert!(matches!(
            HostConfig::builder().token("  ").build(),
            Err(ConfigError::Missing("token"))
        ));
        assert!(matches!(
            HostConfig::builder().api_base("ftp://host").token("t").build(),
            Err(ConfigError::InvalidApiBase { .. })
        ));
    }
}
