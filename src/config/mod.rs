//! Configuration module
//!
//! `Config` for conversion and commit behaviour, `HostConfig` (with its
//! type-safe builder) for reaching the content host.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod types;

// Re-exports for public API
pub use builder::{HostConfigBuilder, WithToken};
pub use types::{CommitConfig, Config, ConfigError, HostConfig, RetryConfig};
