//! Raw items as returned by a catalog source.

use serde::{Deserialize, Serialize};

/// One catalog item before normalization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawCatalogItem {
    /// Problem title.
    pub title: String,
    /// Slug as published by the source (not yet normalized).
    pub slug: String,
    /// Difficulty label, e.g. "Medium".
    pub difficulty: String,
    /// Topic tag names in source order.
    #[serde(default)]
    pub topic_tags: Vec<String>,
    /// Whether the problem requires a subscription.
    #[serde(default)]
    pub paid_only: bool,
    /// Acceptance rate, fraction or percentage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ac_rate: Option<f64>,
    /// Frontend problem number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frontend_id: Option<String>,
}
