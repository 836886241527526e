//! Getter methods for `HostConfig`

use std::time::Duration;

use super::types::HostConfig;

impl HostConfig {
    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    #[must_use]
    pub fn notion_version(&self) -> &str {
        &self.notion_version
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
