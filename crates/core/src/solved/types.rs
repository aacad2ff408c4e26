//! Solved-set types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::problem::Difficulty;

/// Canonical form of an owner id: surrounding whitespace removed.
///
/// Every path that keys on an owner (import, store reads and writes,
/// enrichment, the HTTP routes) goes through this, so `" alice"` and
/// `"alice"` name the same solved set. `None` for a blank id.
pub fn normalize_owner_id(raw: &str) -> Option<&str> {
    let owner = raw.trim();
    (!owner.is_empty()).then_some(owner)
}

/// A user's claim of having solved one problem.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SolvedRecord {
    pub slug: String,
    pub owner_id: String,
    pub title: String,
    pub difficulty: Difficulty,
    /// Submission status as captured in the snapshot ("ac" by default).
    pub status: String,
    /// Acceptance rate, 0-1.
    pub acceptance_rate: f64,
    pub is_paywalled: bool,
    pub solved_at: DateTime<Utc>,
    /// Absent until enrichment matched a catalog entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frontend_id: Option<String>,
}

impl SolvedRecord {
    pub fn is_enriched(&self) -> bool {
        self.topic_tags.is_some()
    }
}

/// One entry of a captured solved-set snapshot, as found on the wire.
///
/// Every field is optional so that a malformed record can be reported
/// individually instead of failing the whole snapshot. Exports often carry
/// a field under both its short and its LeetCode name (`slug` and
/// `titleSlug`), so each spelling gets its own field and the accessors pick
/// one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSolvedItem {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default, alias = "title_slug")]
    pub title_slug: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "acceptance_rate")]
    pub acceptance_rate: Option<f64>,
    #[serde(default)]
    pub ac_rate: Option<f64>,
    #[serde(default, alias = "paid_only")]
    pub paid_only: Option<bool>,
    #[serde(default)]
    pub is_paid_only: Option<bool>,
}

impl RawSolvedItem {
    /// Frontend id as a string, whether the snapshot stored it as a number or text.
    pub fn frontend_id(&self) -> Option<String> {
        match self.id.as_ref()? {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// `slug`, else `titleSlug`. Blank values count as absent.
    pub fn slug(&self) -> Option<&str> {
        [self.slug.as_deref(), self.title_slug.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
    }

    /// `acceptanceRate`, else `acRate`.
    pub fn acceptance_rate(&self) -> Option<f64> {
        self.acceptance_rate.or(self.ac_rate)
    }

    /// `paidOnly`, else `isPaidOnly`.
    pub fn paid_only(&self) -> Option<bool> {
        self.paid_only.or(self.is_paid_only)
    }
}

/// A snapshot record that was not imported.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkippedRecord {
    /// Position of the record in the snapshot.
    pub index: usize,
    pub reason: String,
}

/// Result of importing one snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub owner_id: String,
    /// Records written.
    pub succeeded: u64,
    /// Records rejected by validation.
    pub skipped: u64,
    /// Records whose shape could not be decoded at all.
    pub failed: u64,
    /// Duplicate slugs folded into a later record.
    pub collapsed: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default)]
    pub skipped_records: Vec<SkippedRecord>,
}

impl ImportReport {
    pub(crate) fn new(owner_id: &str) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            succeeded: 0,
            skipped: 0,
            failed: 0,
            collapsed: 0,
            reason: None,
            skipped_records: Vec::new(),
        }
    }
}

/// Errors for solved-record storage.
#[derive(Debug, Error)]
pub enum SolvedError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Solved record not found: {owner_id}/{slug}")]
    NotFound { owner_id: String, slug: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Fatal import failures. Record-level problems never surface here.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Snapshot parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Store(#[from] SolvedError),
}
