//! Sync driver configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the catalog sync driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Items requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Minimum delay between two successive page fetches (milliseconds).
    /// Protects the remote from overload; fetches are never concurrent.
    #[serde(default = "default_page_delay")]
    pub page_delay_ms: u64,

    /// Hard ceiling on the cumulative offset. Reaching it ends the sync
    /// with a warning.
    #[serde(default = "default_max_offset")]
    pub max_offset: u32,

    /// Retries per page on network errors, after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff before the first retry (milliseconds), doubled per retry.
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,
}

fn default_page_size() -> u32 {
    100
}

fn default_page_delay() -> u64 {
    1000 // 1 second
}

fn default_max_offset() -> u32 {
    10_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff() -> u64 {
    2000 // 2 seconds
}

impl SyncConfig {
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    /// Backoff before retry number `retry` (1-based).
    pub fn retry_backoff(&self, retry: u32) -> Duration {
        let factor = 1u64 << retry.saturating_sub(1).min(16);
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(factor))
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            page_delay_ms: default_page_delay(),
            max_offset: default_max_offset(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff(),
        }
    }
}
