//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the drillbook server:
//! - HTTP request metrics (latency, counts, in flight)
//! - Catalog sync activity
//! - Catalog size (collected dynamically)
//!
//! Pipeline counters live in `drillbook_core::metrics` and are registered
//! into the same registry.

use once_cell::sync::Lazy;
use prometheus::{
    self, core::Collector, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec,
    IntGauge, Opts, Registry, TextEncoder,
};
use regex_lite::Regex;
use tracing::warn;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "drillbook_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 60.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("drillbook_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "drillbook_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Sync Metrics
// =============================================================================

/// Whether a catalog sync is running (1) or not (0).
pub static SYNC_IN_PROGRESS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "drillbook_sync_in_progress",
        "Whether a catalog sync is currently running",
    )
    .unwrap()
});

/// Sync requests rejected because another sync was running.
pub static SYNC_REJECTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "drillbook_sync_rejected_total",
        "Sync requests rejected while a sync was running",
    )
    .unwrap()
});

// =============================================================================
// Catalog Metrics (collected dynamically)
// =============================================================================

/// Catalog entries.
pub static CATALOG_ENTRIES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "drillbook_catalog_entries",
        "Number of entries in the local problem catalog",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register(registry: &Registry, metric: Box<dyn Collector>) {
    if let Err(e) = registry.register(metric) {
        warn!("Failed to register metric: {}", e);
    }
}

fn register_metrics(registry: &Registry) {
    // HTTP
    register(registry, Box::new(HTTP_REQUEST_DURATION.clone()));
    register(registry, Box::new(HTTP_REQUESTS_TOTAL.clone()));
    register(registry, Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()));

    // Sync
    register(registry, Box::new(SYNC_IN_PROGRESS.clone()));
    register(registry, Box::new(SYNC_REJECTED_TOTAL.clone()));

    // Catalog
    register(registry, Box::new(CATALOG_ENTRIES.clone()));

    // Core metrics (sync, import, enrichment, external services)
    for metric in drillbook_core::metrics::all_metrics() {
        register(registry, metric);
    }
}

/// Encode all metrics as Prometheus text format.
/// Increments a gauge and decrements it again when dropped.
///
/// Handler futures are dropped without completing when the client goes
/// away, so a plain `inc`/`dec` pair around an `.await` can leak.
pub struct GaugeGuard<'a>(&'a IntGauge);

impl<'a> GaugeGuard<'a> {
    pub fn enter(gauge: &'a IntGauge) -> Self {
        gauge.inc();
        Self(gauge)
    }
}

impl Drop for GaugeGuard<'_> {
    fn drop(&mut self) {
        self.0.dec();
    }
}

pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so gauges reflect current values.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    if let Ok(count) = state.catalog().count() {
        CATALOG_ENTRIES.set(count as i64);
    }
}

static CATALOG_ENTRY_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/api/v1/catalog/([^/]+)$").unwrap());
static OWNER_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^/api/v1/owners/[^/]+").unwrap());

/// Normalize a path for metric labels (replace slugs and owners with placeholders).
pub fn normalize_path(path: &str) -> String {
    if let Some(caps) = CATALOG_ENTRY_PATH.captures(path) {
        if !matches!(&caps[1], "stats" | "sync") {
            return "/api/v1/catalog/{slug}".to_string();
        }
    }
    OWNER_PATH.replace(path, "/api/v1/owners/{owner}").into_owned()
}
