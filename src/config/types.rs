//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::knowledge::RetryPolicy;

/// Top-level configuration, loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KnowledgeConfig {
    /// Root of the knowledge base tree.
    pub base_path: PathBuf,
    /// Download behaviour.
    pub fetch: FetchConfig,
    /// HTTP host surface.
    pub server: ServerConfig,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("./data"),
            fetch: FetchConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

/// Download settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FetchConfig {
    /// Total attempts per file, including the first.
    pub max_retries: u32,
    /// Base delay between attempts, in milliseconds.
    pub retry_delay_ms: u64,
    /// TCP connect timeout, in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout, in seconds.
    pub request_timeout_secs: u64,
    /// Downloads in flight at once. 0 means unbounded.
    pub max_concurrent_downloads: usize,
}

impl FetchConfig {
    /// Retry policy described by this configuration.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.retry_delay_ms))
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 1000,
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            max_concurrent_downloads: 8,
        }
    }
}

/// Default port for the HTTP host surface.
pub const DEFAULT_PORT: u16 = 3000;

/// HTTP host surface settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Whether to enable permissive CORS.
    pub cors_permissive: bool,
}

impl ServerConfig {
    /// The configured address as `host:port`.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            cors_permissive: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_defaults() {
        let config = FetchConfig::default();
        let policy = config.retry_policy();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.retry_delay, Duration::from_secs(1));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_server_address() {
        assert_eq!(ServerConfig::default().address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_knowledge_config_default_path() {
        assert_eq!(KnowledgeConfig::default().base_path, PathBuf::from("./data"));
    }
}
