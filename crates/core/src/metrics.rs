//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Catalog sync (pages, retries, fetch errors, run outcomes)
//! - Solved-set import (records imported/skipped/collapsed)
//! - Enrichment (records enriched/unmatched/failed)
//! - External catalog source latency

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Catalog Sync Metrics
// =============================================================================

/// Sync runs total by outcome.
pub static SYNC_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("drillbook_sync_runs_total", "Total catalog sync runs"),
        &["outcome"], // "completed", "completed_with_warning", "aborted"
    )
    .unwrap()
});

/// Catalog pages fetched successfully.
pub static SYNC_PAGES_FETCHED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "drillbook_sync_pages_fetched_total",
        "Total catalog pages fetched",
    )
    .unwrap()
});

/// Page fetch retries.
pub static SYNC_FETCH_RETRIES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "drillbook_sync_fetch_retries_total",
        "Total catalog page fetch retries",
    )
    .unwrap()
});

/// Page fetch errors by kind.
pub static SYNC_FETCH_ERRORS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "drillbook_sync_fetch_errors_total",
            "Total catalog page fetch errors",
        ),
        &["kind"], // "network", "protocol", "not_configured"
    )
    .unwrap()
});

/// Catalog entries written.
pub static CATALOG_ENTRIES_WRITTEN: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "drillbook_catalog_entries_written_total",
        "Total catalog entries written by syncs",
    )
    .unwrap()
});

/// Catalog items dropped during normalization.
pub static CATALOG_ITEMS_SKIPPED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "drillbook_catalog_items_skipped_total",
        "Total raw catalog items skipped as invalid",
    )
    .unwrap()
});

// =============================================================================
// Solved-set Metrics
// =============================================================================

/// Import runs by result.
pub static IMPORT_RUNS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("drillbook_import_runs_total", "Total solved-set imports"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Imported snapshot records by result.
pub static IMPORT_RECORDS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "drillbook_import_records_total",
            "Total snapshot records processed by imports",
        ),
        &["result"], // "imported", "skipped", "collapsed"
    )
    .unwrap()
});

/// Enrichment outcomes per record.
pub static ENRICHMENT_RECORDS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "drillbook_enrichment_records_total",
            "Total solved records processed by enrichment",
        ),
        &["result"], // "enriched", "unmatched", "failed"
    )
    .unwrap()
});

// =============================================================================
// External Service Metrics
// =============================================================================

/// External service request duration.
pub static EXTERNAL_SERVICE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "drillbook_external_service_duration_seconds",
            "Duration of external service calls",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["service", "operation"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Sync
        Box::new(SYNC_RUNS.clone()),
        Box::new(SYNC_PAGES_FETCHED.clone()),
        Box::new(SYNC_FETCH_RETRIES.clone()),
        Box::new(SYNC_FETCH_ERRORS.clone()),
        Box::new(CATALOG_ENTRIES_WRITTEN.clone()),
        Box::new(CATALOG_ITEMS_SKIPPED.clone()),
        // Solved set
        Box::new(IMPORT_RUNS.clone()),
        Box::new(IMPORT_RECORDS.clone()),
        Box::new(ENRICHMENT_RECORDS.clone()),
        // External services
        Box::new(EXTERNAL_SERVICE_DURATION.clone()),
    ]
}
