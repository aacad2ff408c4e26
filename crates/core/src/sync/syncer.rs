use std::sync::Arc;

use chrono::Utc;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use super::{SyncConfig, SyncError, SyncOutcome, SyncReport};
use crate::catalog::{CatalogEntry, CatalogStore};
use crate::catalog_source::{CatalogSource, CatalogSourceError, RawCatalogItem};
use crate::metrics;

/// Drives one catalog sync at a time.
///
/// Callers must not run two syncs against the same store concurrently.
pub struct CatalogSyncer {
    source: Arc<dyn CatalogSource>,
    store: Arc<dyn CatalogStore>,
    config: SyncConfig,
}

impl CatalogSyncer {
    pub fn new(
        source: Arc<dyn CatalogSource>,
        store: Arc<dyn CatalogStore>,
        config: SyncConfig,
    ) -> Self {
        Self {
            source,
            store,
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Run a full sync.
    ///
    /// Never fails outright: batch-level errors end the run with
    /// `SyncOutcome::Aborted` and are described in the report.
    pub async fn run(&self) -> SyncReport {
        let mut report = SyncReport::start();
        let page_size = self.config.page_size.max(1);

        info!(
            run_id = %report.run_id,
            source = self.source.name(),
            page_size,
            max_offset = self.config.max_offset,
            "Catalog sync started"
        );

        if let Err(e) = self.store.clear() {
            return self.finish(report, Some(e.into()));
        }

        let mut offset: u32 = 0;
        let mut last_fetch: Option<Instant> = None;

        loop {
            if offset >= self.config.max_offset {
                warn!(
                    run_id = %report.run_id,
                    offset,
                    "Offset ceiling reached before end of catalog, stopping sync"
                );
                report.outcome = SyncOutcome::CompletedWithWarning;
                report.reason = Some(format!(
                    "offset ceiling {} reached before an empty page",
                    self.config.max_offset
                ));
                break;
            }

            let items = match self
                .fetch_with_retry(page_size, offset, &mut last_fetch, &mut report)
                .await
            {
                Ok(items) => items,
                Err(e) => {
                    report.failed += 1;
                    return self.finish(report, Some(e));
                }
            };

            if items.is_empty() {
                debug!(run_id = %report.run_id, offset, "Empty page, catalog exhausted");
                break;
            }
            report.pages_fetched += 1;

            let entries = self.normalize_page(items, offset, &mut report);
            match self.store.append_batch(&entries) {
                Ok(written) => {
                    report.succeeded += written;
                    metrics::CATALOG_ENTRIES_WRITTEN.inc_by(written);
                    debug!(
                        run_id = %report.run_id,
                        offset,
                        written,
                        "Catalog page committed"
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    return self.finish(report, Some(e.into()));
                }
            }

            offset = offset.saturating_add(page_size);
        }

        self.finish(report, None)
    }

    /// Fetch one page, retrying network errors on the same offset.
    async fn fetch_with_retry(
        &self,
        page_size: u32,
        offset: u32,
        last_fetch: &mut Option<Instant>,
        report: &mut SyncReport,
    ) -> Result<Vec<RawCatalogItem>, SyncError> {
        let mut retry = 0;

        loop {
            self.wait_for_page_slot(*last_fetch).await;
            *last_fetch = Some(Instant::now());

            let timer = metrics::EXTERNAL_SERVICE_DURATION
                .with_label_values(&[self.source.name(), "fetch_page"])
                .start_timer();
            let result = self.source.fetch_page(page_size, offset).await;
            timer.observe_duration();

            match result {
                Ok(items) => {
                    metrics::SYNC_PAGES_FETCHED.inc();
                    return Ok(items);
                }
                Err(e) => {
                    metrics::SYNC_FETCH_ERRORS
                        .with_label_values(&[error_kind_label(&e)])
                        .inc();

                    if !e.is_retryable() {
                        error!(run_id = %report.run_id, offset, "Catalog fetch failed: {}", e);
                        return Err(SyncError::Source { offset, source: e });
                    }

                    if retry >= self.config.max_retries {
                        error!(
                            run_id = %report.run_id,
                            offset,
                            attempts = retry + 1,
                            "Catalog fetch failed, retries exhausted: {}",
                            e
                        );
                        return Err(SyncError::RetriesExhausted {
                            offset,
                            attempts: retry + 1,
                            source: e,
                        });
                    }

                    retry += 1;
                    report.retries += 1;
                    metrics::SYNC_FETCH_RETRIES.inc();

                    let backoff = self.config.retry_backoff(retry);
                    warn!(
                        run_id = %report.run_id,
                        offset,
                        retry,
                        max_retries = self.config.max_retries,
                        "Catalog fetch failed, retrying in {:?}: {}",
                        backoff,
                        e
                    );
                    sleep(backoff).await;
                }
            }
        }
    }

    /// Wait until the minimum inter-fetch delay has elapsed.
    async fn wait_for_page_slot(&self, last_fetch: Option<Instant>) {
        let delay = self.config.page_delay();
        if let Some(last) = last_fetch {
            let elapsed = last.elapsed();
            if elapsed < delay {
                let wait_time = delay - elapsed;
                debug!("Catalog page delay: waiting {:?}", wait_time);
                sleep(wait_time).await;
            }
        }
    }

    /// Turn raw items into catalog entries, counting the ones that can't be used.
    fn normalize_page(
        &self,
        items: Vec<RawCatalogItem>,
        offset: u32,
        report: &mut SyncReport,
    ) -> Vec<CatalogEntry> {
        let imported_at = Utc::now();
        let mut entries = Vec::with_capacity(items.len());

        for (index, item) in items.into_iter().enumerate() {
            let sequence_id = offset as u64 + index as u64;
            match CatalogEntry::from_raw(item, sequence_id, imported_at) {
                Ok(entry) => entries.push(entry),
                Err(reason) => {
                    warn!(
                        run_id = %report.run_id,
                        sequence_id,
                        "Skipping catalog item: {}",
                        reason
                    );
                    report.skipped += 1;
                    metrics::CATALOG_ITEMS_SKIPPED.inc();
                }
            }
        }

        entries
    }

    fn finish(&self, mut report: SyncReport, error: Option<SyncError>) -> SyncReport {
        if let Some(e) = error {
            report.outcome = SyncOutcome::Aborted;
            report.error_kind = Some(e.kind());
            report.reason = Some(e.to_string());
        }
        report.finished_at = Utc::now();

        metrics::SYNC_RUNS
            .with_label_values(&[report.outcome.as_str()])
            .inc();

        match report.outcome {
            SyncOutcome::Aborted => error!(
                run_id = %report.run_id,
                succeeded = report.succeeded,
                skipped = report.skipped,
                pages = report.pages_fetched,
                "Catalog sync aborted: {}",
                report.reason.as_deref().unwrap_or("unknown")
            ),
            _ => info!(
                run_id = %report.run_id,
                outcome = report.outcome.as_str(),
                succeeded = report.succeeded,
                skipped = report.skipped,
                pages = report.pages_fetched,
                retries = report.retries,
                "Catalog sync finished"
            ),
        }

        report
    }
}

fn error_kind_label(e: &CatalogSourceError) -> &'static str {
    match e {
        CatalogSourceError::Network(_) => "network",
        CatalogSourceError::Protocol(_) => "protocol",
        CatalogSourceError::NotConfigured(_) => "not_configured",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SqliteCatalogStore;
    use crate::sync::SyncErrorKind;
    use crate::testing::{fixtures, MockCatalogSource};

    fn fast_config(page_size: u32) -> SyncConfig {
        SyncConfig {
            page_size,
            page_delay_ms: 0,
            max_offset: 10_000,
            max_retries: 3,
            retry_backoff_ms: 1,
        }
    }

    fn harness(
        source: &Arc<MockCatalogSource>,
        config: SyncConfig,
    ) -> (CatalogSyncer, Arc<SqliteCatalogStore>) {
        let store = Arc::new(SqliteCatalogStore::in_memory().unwrap());
        let syncer = CatalogSyncer::new(
            Arc::clone(source) as Arc<dyn CatalogSource>,
            Arc::clone(&store) as Arc<dyn CatalogStore>,
            config,
        );
        (syncer, store)
    }

    #[tokio::test]
    async fn test_sync_until_empty_page() {
        let source = Arc::new(MockCatalogSource::new());
        source.set_items(fixtures::catalog_items(25)).await;
        let (syncer, store) = harness(&source, fast_config(10));

        let report = syncer.run().await;

        assert_eq!(report.outcome, SyncOutcome::Completed);
        assert_eq!(report.succeeded, 25);
        assert_eq!(report.pages_fetched, 3);
        assert_eq!(report.failed, 0);
        assert_eq!(store.count().unwrap(), 25);

        // 3 full/partial pages + 1 empty terminator
        let offsets: Vec<u32> = source.recorded_calls().await.iter().map(|c| c.offset).collect();
        assert_eq!(offsets, vec![0, 10, 20, 30]);
    }

    #[tokio::test]
    async fn test_sequence_ids_follow_fetch_order() {
        let source = Arc::new(MockCatalogSource::new());
        source.set_items(fixtures::catalog_items(5)).await;
        let (syncer, store) = harness(&source, fast_config(2));

        syncer.run().await;

        let ids: Vec<u64> = store
            .list(100, 0)
            .unwrap()
            .iter()
            .map(|e| e.sequence_id)
            .collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_offset_ceiling_completes_with_warning() {
        let source = Arc::new(MockCatalogSource::new());
        source.set_items(fixtures::catalog_items(50)).await;
        let config = SyncConfig {
            max_offset: 20,
            ..fast_config(10)
        };
        let (syncer, store) = harness(&source, config);

        let report = syncer.run().await;

        assert_eq!(report.outcome, SyncOutcome::CompletedWithWarning);
        assert!(report.is_complete());
        assert!(report.reason.as_deref().unwrap().contains("ceiling"));
        assert_eq!(store.count().unwrap(), 20);
        assert_eq!(source.call_count().await, 2);
    }

    #[tokio::test]
    async fn test_network_error_is_retried_on_same_offset() {
        let source = Arc::new(MockCatalogSource::new());
        source.set_items(fixtures::catalog_items(15)).await;
        source
            .fail_at(10, CatalogSourceError::Network("connection reset".to_string()), 2)
            .await;
        let (syncer, store) = harness(&source, fast_config(10));

        let report = syncer.run().await;

        assert_eq!(report.outcome, SyncOutcome::Completed);
        assert_eq!(report.retries, 2);
        assert_eq!(store.count().unwrap(), 15);

        let offsets: Vec<u32> = source.recorded_calls().await.iter().map(|c| c.offset).collect();
        assert_eq!(offsets, vec![0, 10, 10, 10, 20]);
    }

    #[tokio::test]
    async fn test_retries_exhausted_aborts_and_keeps_committed_pages() {
        let source = Arc::new(MockCatalogSource::new());
        source.set_items(fixtures::catalog_items(50)).await;
        source
            .fail_at(20, CatalogSourceError::Network("timeout".to_string()), u32::MAX)
            .await;
        let (syncer, store) = harness(&source, fast_config(10));

        let report = syncer.run().await;

        assert_eq!(report.outcome, SyncOutcome::Aborted);
        assert_eq!(report.error_kind, Some(SyncErrorKind::Network));
        assert_eq!(report.failed, 1);
        assert_eq!(report.retries, 3);
        assert_eq!(report.succeeded, 20);
        assert_eq!(store.count().unwrap(), 20);

        let calls_at_failing_offset = source
            .recorded_calls()
            .await
            .iter()
            .filter(|c| c.offset == 20)
            .count();
        assert_eq!(calls_at_failing_offset, 4);
    }

    #[tokio::test]
    async fn test_protocol_error_aborts_without_retry() {
        let source = Arc::new(MockCatalogSource::new());
        source.set_items(fixtures::catalog_items(30)).await;
        source
            .fail_at(10, CatalogSourceError::Protocol("field removed".to_string()), 1)
            .await;
        let (syncer, store) = harness(&source, fast_config(10));

        let report = syncer.run().await;

        assert_eq!(report.outcome, SyncOutcome::Aborted);
        assert_eq!(report.error_kind, Some(SyncErrorKind::Protocol));
        assert_eq!(report.retries, 0);
        assert_eq!(store.count().unwrap(), 10);
        assert_eq!(source.call_count().await, 2);
    }

    #[tokio::test]
    async fn test_duplicate_slug_aborts_with_consistency_error() {
        let source = Arc::new(MockCatalogSource::new());
        let mut items = fixtures::catalog_items(6);
        items[4].slug = items[1].slug.clone();
        source.set_items(items).await;
        let (syncer, store) = harness(&source, fast_config(3));

        let report = syncer.run().await;

        assert_eq!(report.outcome, SyncOutcome::Aborted);
        assert_eq!(report.error_kind, Some(SyncErrorKind::Consistency));
        assert_eq!(report.failed, 1);
        // First page committed, second page rejected entirely
        assert_eq!(store.count().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_invalid_items_are_skipped_and_counted() {
        let source = Arc::new(MockCatalogSource::new());
        let mut items = fixtures::catalog_items(4);
        items[1].slug = "   ".to_string();
        items[2].difficulty = "Impossible".to_string();
        source.set_items(items).await;
        let (syncer, store) = harness(&source, fast_config(10));

        let report = syncer.run().await;

        assert_eq!(report.outcome, SyncOutcome::Completed);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.skipped, 2);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_resync_replaces_catalog() {
        let source = Arc::new(MockCatalogSource::new());
        source.set_items(fixtures::catalog_items(10)).await;
        let (syncer, store) = harness(&source, fast_config(4));

        syncer.run().await;
        let first = store.list(100, 0).unwrap();

        source.set_items(fixtures::catalog_items(6)).await;
        let report = syncer.run().await;

        assert_eq!(report.succeeded, 6);
        let second = store.list(100, 0).unwrap();
        assert_eq!(second.len(), 6);
        assert_eq!(
            first[..6].iter().map(|e| &e.slug).collect::<Vec<_>>(),
            second.iter().map(|e| &e.slug).collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn test_page_delay_is_observed() {
        let source = Arc::new(MockCatalogSource::new());
        source.set_items(fixtures::catalog_items(6)).await;
        let config = SyncConfig {
            page_delay_ms: 30,
            ..fast_config(2)
        };
        let (syncer, _store) = harness(&source, config);

        syncer.run().await;

        let calls = source.recorded_calls().await;
        assert_eq!(calls.len(), 4);
        for pair in calls.windows(2) {
            let gap = pair[1].at.duration_since(pair[0].at);
            assert!(
                gap >= std::time::Duration::from_millis(30),
                "gap between fetches was {:?}",
                gap
            );
        }
    }
}
