//! Backend connection and cache tuning configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the backend clients and query cache.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the hosted backend (e.g., "https://abc.backend.co").
    pub base_url: String,

    /// Publishable anon key sent with every request.
    pub anon_key: String,

    /// Object-storage bucket for uploaded media.
    pub storage_bucket: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Staleness window for most cached queries (seconds).
    pub stale_secs: u64,

    /// Staleness window for count aggregates (seconds). Counts drift
    /// slowly, so they get double the default window.
    pub counts_stale_secs: u64,

    /// Unused cache entries are evicted after this many seconds.
    pub gc_secs: u64,

    /// Additional retry attempts after a failed fetch.
    pub retry_attempts: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.loreforge.app".to_string(),
            anon_key: String::new(),
            storage_bucket: "media".to_string(),
            request_timeout_secs: 30,
            stale_secs: 300,        // 5 minutes
            counts_stale_secs: 600, // 10 minutes
            gc_secs: 1800,          // 30 minutes
            retry_attempts: 2,
        }
    }
}

impl BackendConfig {
    pub fn stale_window(&self) -> Duration {
        Duration::from_secs(self.stale_secs)
    }

    pub fn counts_stale_window(&self) -> Duration {
        Duration::from_secs(self.counts_stale_secs)
    }

    pub fn gc_window(&self) -> Duration {
        Duration::from_secs(self.gc_secs)
    }

    /// Creates a config pointed at a local mock server.
    pub fn test(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            anon_key: "test-anon-key".to_string(),
            storage_bucket: "media".to_string(),
            request_timeout_secs: 5,
            stale_secs: 300,
            counts_stale_secs: 600,
            gc_secs: 1800,
            retry_attempts: 2,
        }
    }
}
