//! Types for the local problem catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog_source::RawCatalogItem;
use crate::problem::{normalize_acceptance_rate, normalize_slug, Difficulty};

/// One problem as known to the external catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogEntry {
    /// Unique slug.
    pub slug: String,
    /// Problem title.
    pub title: String,
    /// Difficulty.
    pub difficulty: Difficulty,
    /// Topic tags in source order (may be empty).
    pub topic_tags: Vec<String>,
    /// Position in fetch order. Unique, not necessarily contiguous.
    pub sequence_id: u64,
    /// When the entry was written by a sync.
    pub imported_at: DateTime<Utc>,
    /// Whether the problem requires a subscription.
    #[serde(default)]
    pub paid_only: bool,
    /// Acceptance rate (0-1) when the source reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceptance_rate: Option<f64>,
    /// Frontend problem number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frontend_id: Option<String>,
}

impl CatalogEntry {
    /// Build an entry from a raw item.
    ///
    /// Fails with a human-readable reason if the slug or difficulty is unusable.
    pub fn from_raw(
        raw: RawCatalogItem,
        sequence_id: u64,
        imported_at: DateTime<Utc>,
    ) -> Result<Self, String> {
        let slug = normalize_slug(&raw.slug)
            .ok_or_else(|| format!("unusable slug '{}'", raw.slug))?;
        let difficulty = raw.difficulty.parse::<Difficulty>()?;
        let title = if raw.title.trim().is_empty() {
            slug.clone()
        } else {
            raw.title.trim().to_string()
        };

        Ok(Self {
            slug,
            title,
            difficulty,
            topic_tags: raw.topic_tags,
            sequence_id,
            imported_at,
            paid_only: raw.paid_only,
            acceptance_rate: raw.ac_rate.map(normalize_acceptance_rate),
            frontend_id: raw.frontend_id,
        })
    }
}

/// Errors for catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Duplicate slug in catalog: {slug}")]
    Consistency { slug: String },

    #[error("Internal error: {0}")]
    Internal(String),
}
