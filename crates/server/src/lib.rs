//! HTTP admin surface for drillbook.
//!
//! Exposes catalog sync, solved-set import, enrichment and statistics as a
//! JSON API, plus Prometheus metrics.

pub mod api;
pub mod metrics;
pub mod state;
