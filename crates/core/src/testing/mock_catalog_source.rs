//! Mock catalog source for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::catalog_source::{CatalogSource, CatalogSourceError, RawCatalogItem};

/// A recorded page fetch for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedFetch {
    pub page_size: u32,
    pub offset: u32,
    /// When the fetch started.
    pub at: Instant,
}

/// A scripted failure at one offset.
#[derive(Debug, Clone)]
struct ScriptedFailure {
    error: CatalogSourceError,
    remaining: u32,
}

/// Mock implementation of the CatalogSource trait.
///
/// Serves a flat list of items sliced into pages, like a real paginated
/// catalog. Provides controllable behavior for testing:
/// - Fail fetches at a given offset for a number of attempts
/// - Fail the next fetch, whatever its offset
/// - Record every fetch with its start time
///
/// # Example
///
/// ```rust,ignore
/// use drillbook_core::testing::{MockCatalogSource, fixtures};
///
/// let source = MockCatalogSource::new();
/// source.set_items(fixtures::catalog_items(250)).await;
/// source
///     .fail_at(200, CatalogSourceError::Network("reset".into()), 2)
///     .await;
/// ```
#[derive(Debug)]
pub struct MockCatalogSource {
    items: Arc<RwLock<Vec<RawCatalogItem>>>,
    failures: Arc<RwLock<HashMap<u32, ScriptedFailure>>>,
    calls: Arc<RwLock<Vec<RecordedFetch>>>,
    /// If set, the next fetch will fail with this error.
    next_error: Arc<RwLock<Option<CatalogSourceError>>>,
}

impl Default for MockCatalogSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCatalogSource {
    /// Create a new empty mock catalog source.
    pub fn new() -> Self {
        Self {
            items: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(RwLock::new(HashMap::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Replace the whole remote catalog.
    pub async fn set_items(&self, items: Vec<RawCatalogItem>) {
        *self.items.write().await = items;
    }

    /// Fail the next `attempts` fetches at `offset` with `error`.
    ///
    /// Use `u32::MAX` for a permanent failure.
    pub async fn fail_at(&self, offset: u32, error: CatalogSourceError, attempts: u32) {
        self.failures.write().await.insert(
            offset,
            ScriptedFailure {
                error,
                remaining: attempts,
            },
        );
    }

    /// Make the next fetch fail, whatever its offset.
    pub async fn set_next_error(&self, error: CatalogSourceError) {
        *self.next_error.write().await = Some(error);
    }

    /// Drop every scripted failure.
    pub async fn clear_failures(&self) {
        self.failures.write().await.clear();
        *self.next_error.write().await = None;
    }

    // =========================================================================
    // Assertions
    // =========================================================================

    /// All fetches so far, in call order.
    pub async fn recorded_calls(&self) -> Vec<RecordedFetch> {
        self.calls.read().await.clone()
    }

    /// Number of fetches so far.
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Forget recorded fetches.
    pub async fn clear_calls(&self) {
        self.calls.write().await.clear();
    }

    async fn take_failure(&self, offset: u32) -> Option<CatalogSourceError> {
        if let Some(error) = self.next_error.write().await.take() {
            return Some(error);
        }

        let mut failures = self.failures.write().await;
        let failure = failures.get_mut(&offset)?;
        if failure.remaining == 0 {
            return None;
        }
        failure.remaining -= 1;
        Some(failure.error.clone())
    }
}

#[async_trait]
impl CatalogSource for MockCatalogSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_page(
        &self,
        page_size: u32,
        offset: u32,
    ) -> Result<Vec<RawCatalogItem>, CatalogSourceError> {
        self.calls.write().await.push(RecordedFetch {
            page_size,
            offset,
            at: Instant::now(),
        });

        if let Some(error) = self.take_failure(offset).await {
            return Err(error);
        }

        let items = self.items.read().await;
        let start = (offset as usize).min(items.len());
        let end = start.saturating_add(page_size as usize).min(items.len());
        Ok(items[start..end].to_vec())
    }
}
