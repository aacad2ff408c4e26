//! Paginated access to the external problem catalog.
//!
//! A [`CatalogSource`] returns one page of raw catalog items per call. The
//! caller drives pagination (see [`crate::sync`]); the source itself holds no
//! cursor state.

mod leetcode;
mod types;

pub use leetcode::{LeetCodeClient, LeetCodeConfig};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors returned by a catalog source.
#[derive(Debug, Clone, Error)]
pub enum CatalogSourceError {
    /// Transport-level failure. Retryable.
    #[error("Network error: {0}")]
    Network(String),

    /// The remote answered with an embedded error payload or a response that
    /// no longer matches the expected contract. Not retryable.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Client not configured.
    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

impl CatalogSourceError {
    /// Whether the same request may succeed if sent again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CatalogSourceError::Network(_))
    }
}

impl From<reqwest::Error> for CatalogSourceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            CatalogSourceError::Protocol(format!("Failed to decode response: {}", e))
        } else {
            CatalogSourceError::Network(e.to_string())
        }
    }
}

/// A paginated catalog source.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Short name used in logs and metrics.
    fn name(&self) -> &str;

    /// Fetch up to `page_size` items starting at `offset`.
    ///
    /// An empty page signals the end of the catalog.
    async fn fetch_page(
        &self,
        page_size: u32,
        offset: u32,
    ) -> Result<Vec<RawCatalogItem>, CatalogSourceError>;
}
